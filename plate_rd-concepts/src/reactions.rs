use crate::CalcError;

/// Reaction rule of a single species.
///
/// A behaviour receives the current time `t` together with an immutable snapshot `S` of every
/// species on the plate and returns the time derivative `D` of its own field.
/// Implementors must only read from the snapshot and should never rely on values cached
/// between calls.
///
/// Every closure of the form `Fn(F, &S) -> Result<D, CalcError>` is a behaviour.
/// ```
/// # use plate_rd_concepts::*;
/// let decay = |_t: f64, state: &f64| -> Result<f64, CalcError> { Ok(-0.5 * state) };
/// assert_eq!(decay.calculate_increment(0.0, &2.0), Ok(-1.0));
/// ```
pub trait Behaviour<F, S, D> {
    /// Calculates the increment of the associated species at time `t`.
    fn calculate_increment(&self, t: F, state: &S) -> Result<D, CalcError>;
}

impl<F, S, D, Func> Behaviour<F, S, D> for Func
where
    Func: Fn(F, &S) -> Result<D, CalcError>,
{
    fn calculate_increment(&self, t: F, state: &S) -> Result<D, CalcError> {
        self(t, state)
    }
}

/// Spatially resolved growth rate of the biomass.
///
/// The rate is queried with the same snapshot as every [Behaviour] and returns one value per
/// grid cell.
/// Restricting the growth to cells which actually carry biomass is the responsibility of the
/// caller.
pub trait GrowthRate<F, S, D> {
    /// Instantaneous growth rate at time `t`.
    fn growth_rate(&self, t: F, state: &S) -> D;
}

impl<F, S, D, Func> GrowthRate<F, S, D> for Func
where
    Func: Fn(F, &S) -> D,
{
    fn growth_rate(&self, t: F, state: &S) -> D {
        self(t, state)
    }
}

/// A sigmoidal growth curve of scalar time and its derivative.
///
/// Implementors should satisfy
/// 1. `rate(t) >= 0` for every `t`
/// 2. `rate(t) -> 0` for `t -> ±∞`
/// 3. `value(t1) - value(t0)` equals the integral of `rate` over `[t0, t1]`
pub trait GrowthCurve<F> {
    /// Value of the growth curve at time `t`.
    fn value(&self, t: F) -> F;
    /// Time derivative of the growth curve at time `t`.
    fn rate(&self, t: F) -> F;
}

/// Mathematical abstraction similar to the well-known `axpy` method.
///
/// Calculates `self * a + y`. This is the only operation required by the explicit solvers.
pub trait Xapy<F> {
    /// Calculates `self * a + y`
    fn xapy(&self, a: F, y: &Self) -> Self;
}

impl<F, X> Xapy<F> for X
where
    X: for<'a> core::ops::Add<&'a X, Output = X>,
    for<'a> &'a X: core::ops::Mul<F, Output = X>,
{
    fn xapy(&self, a: F, y: &Self) -> Self {
        self * a + y
    }
}
