//! Growth curves of the receiver strains and their use as growth rate providers.

use core::f64::consts::E;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use plate_rd_concepts::{ConfigurationError, GrowthCurve, GrowthRate};
use plate_rd_core::Fields;

/// Gompertz growth curve in the parametrization of Zwietering et al.
///
/// \\begin{equation}
///     y(t) = A \exp\left(-\exp\left(\frac{\mu_m e}{A}(\lambda - t) + 1\right)\right)
/// \\end{equation}
///
/// where $A$ is the asymptote, $\mu_m$ the maximum growth rate and $\lambda$ the lag time.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Gompertz {
    /// Asymptotic value $A$ of the curve (OD or $10^8$ cells per grid point)
    pub asymptote: f64,
    /// Maximum growth rate $\mu_m$ (per min)
    pub max_rate: f64,
    /// Lag time $\lambda$ (min)
    pub lag_time: f64,
}

impl Gompertz {
    /// Construct a new curve
    pub fn new(asymptote: f64, max_rate: f64, lag_time: f64) -> Self {
        Self {
            asymptote,
            max_rate,
            lag_time,
        }
    }

    /// Parses the curve from `[A, um, lam]`.
    pub fn from_slice(values: &[f64]) -> Result<Self, ConfigurationError> {
        match values {
            [asymptote, max_rate, lag_time] => Ok(Self::new(*asymptote, *max_rate, *lag_time)),
            _ => Err(ConfigurationError(format!(
                "growth curve requires 3 parameters but {} were given",
                values.len()
            ))),
        }
    }

    /// Returns `[A, um, lam]`
    pub fn to_array(&self) -> [f64; 3] {
        [self.asymptote, self.max_rate, self.lag_time]
    }

    fn exponent(&self, t: f64) -> f64 {
        self.max_rate * E / self.asymptote * (self.lag_time - t) + 1.0
    }
}

impl GrowthCurve<f64> for Gompertz {
    fn value(&self, t: f64) -> f64 {
        self.asymptote * (-self.exponent(t).exp()).exp()
    }

    fn rate(&self, t: f64) -> f64 {
        // Combine exponentials so that overflowing terms vanish instead of producing NaN
        let u = self.exponent(t);
        self.max_rate * (u + 1.0 - u.exp()).exp()
    }
}

/// Modified logistic growth curve with the same three parameters as [Gompertz].
///
/// \\begin{equation}
///     y(t) = \frac{A}{1 + \exp\left(\frac{4\mu_m}{A}(\lambda - t) + 2\right)}
/// \\end{equation}
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Logistic {
    /// Asymptotic value $A$ of the curve
    pub asymptote: f64,
    /// Maximum growth rate $\mu_m$
    pub max_rate: f64,
    /// Lag time $\lambda$
    pub lag_time: f64,
}

impl Logistic {
    fn exponent(&self, t: f64) -> f64 {
        4.0 * self.max_rate / self.asymptote * (self.lag_time - t) + 2.0
    }
}

impl GrowthCurve<f64> for Logistic {
    fn value(&self, t: f64) -> f64 {
        self.asymptote / (1.0 + self.exponent(t).exp())
    }

    fn rate(&self, t: f64) -> f64 {
        // e^w / (1 + e^w)^2 = 1 / (4 cosh^2(w/2))
        let c = (0.5 * self.exponent(t)).cosh();
        self.max_rate / (c * c)
    }
}

/// Spatially uniform growth rate given by the derivative of a [GrowthCurve].
///
/// The rate is broadcast to the shape of the fields in the snapshot.
/// Restriction to receiver cells happens during model assembly.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct UniformGrowth<C> {
    /// Underlying growth curve
    pub curve: C,
}

impl<C> UniformGrowth<C> {
    /// Construct from a growth curve
    pub fn new(curve: C) -> Self {
        Self { curve }
    }
}

impl<C> GrowthRate<f64, Fields<f64>, Array2<f64>> for UniformGrowth<C>
where
    C: GrowthCurve<f64>,
{
    fn growth_rate(&self, t: f64, state: &Fields<f64>) -> Array2<f64> {
        let shape = state.iter().next().map_or((0, 0), |(_, field)| field.dim());
        Array2::from_elem(shape, self.curve.rate(t))
    }
}
