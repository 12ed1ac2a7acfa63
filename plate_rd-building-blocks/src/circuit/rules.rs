use std::sync::Arc;

use ndarray::{Array2, Zip};

use plate_rd_concepts::{Behaviour, CalcError, GrowthRate};
use plate_rd_core::{laplacian, Boundary, Fields};

use crate::parameters::CircuitParameters;

use super::{INDUCER, POLYMERASE, REPORTER, REPRESSOR};

/// Shared growth rate provider
pub type SharedGrowthRate = Arc<dyn GrowthRate<f64, Fields<f64>, Array2<f64>> + Send + Sync>;

/// Indicator fields of the wells on the plate.
///
/// Cells with value `1.0` are part of the respective set, all other cells are `0.0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Masks {
    /// Wells containing receiver cells
    pub receivers: Array2<f64>,
    /// Wells into which inducer was pipetted
    pub inducer_sources: Array2<f64>,
}

/// Activating Hill function $x^n/(K^n + x^n)$.
///
/// Negative inputs are treated as zero and the result always lies in $[0, 1]$.
/// A Hill coefficient of zero gives the constant $1/2$.
pub fn hill_activation(x: f64, k: f64, n: f64) -> f64 {
    let x = x.max(0.0);
    if n == 0.0 {
        0.5
    } else if x == 0.0 {
        0.0
    } else if k <= 0.0 {
        1.0
    } else {
        1.0 / (1.0 + (k / x).powf(n))
    }
}

/// Repressing Hill function $K^n/(K^n + x^n)$.
pub fn hill_repression(x: f64, k: f64, n: f64) -> f64 {
    let x = x.max(0.0);
    if n == 0.0 {
        0.5
    } else if x == 0.0 {
        1.0
    } else if k <= 0.0 {
        0.0
    } else {
        1.0 / (1.0 + (x / k).powf(n))
    }
}

/// Fraction of maximal expression of a promoter which is repressed by LacI and released by
/// the inducer.
///
/// \\begin{equation}
///     \frac{1 + (A/K_I)^{n_I}}{1 + (A/K_I)^{n_I} + K_{lac}}
/// \\end{equation}
pub fn induced_fraction(a: f64, k_inducer: f64, n_inducer: f64, k_lac: f64) -> f64 {
    let a = a.max(0.0);
    let r = if a == 0.0 {
        0.0
    } else {
        (a / k_inducer).powf(n_inducer)
    };
    if r.is_infinite() {
        1.0
    } else {
        (1.0 + r) / (1.0 + r + k_lac)
    }
}

/// Growth rate restricted to receiver cells.
///
/// Outside of receiver cells the rate is exactly zero regardless of the values returned by the
/// underlying provider.
#[derive(Clone)]
pub struct ReceiverGrowth {
    growth: SharedGrowthRate,
    masks: Arc<Masks>,
}

impl core::fmt::Debug for ReceiverGrowth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReceiverGrowth")
            .field("masks", &self.masks)
            .finish_non_exhaustive()
    }
}

impl ReceiverGrowth {
    /// Restricts `growth` to the receiver cells of `masks`
    pub fn new(growth: SharedGrowthRate, masks: Arc<Masks>) -> Self {
        Self { growth, masks }
    }

    /// Growth rate $\mu$ at time `t`
    pub fn mu(&self, t: f64, state: &Fields<f64>) -> Result<Array2<f64>, CalcError> {
        let rate = self.growth.growth_rate(t, state);
        let receivers = &self.masks.receivers;
        if rate.dim() != receivers.dim() {
            return Err(CalcError(format!(
                "growth rate has shape {:?} but grid has shape {:?}",
                rate.dim(),
                receivers.dim()
            )));
        }
        Ok(Zip::from(&rate)
            .and(receivers)
            .map_collect(|&r, &m| if m > 0.0 { r } else { 0.0 }))
    }
}

/// Biomass follows the growth rate: $\dot X = \mu$.
#[derive(Clone, Debug)]
pub struct BiomassGrowth {
    /// Growth restricted to receivers
    pub growth: ReceiverGrowth,
}

impl Behaviour<f64, Fields<f64>, Array2<f64>> for BiomassGrowth {
    fn calculate_increment(&self, t: f64, state: &Fields<f64>) -> Result<Array2<f64>, CalcError> {
        self.growth.mu(t, state)
    }
}

/// Free diffusion of the inducer through the agar: $\dot A = D_A \Delta A$.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InducerDiffusion {
    /// Diffusion constant $D_A$
    pub diffusion_constant: f64,
    /// Grid spacing
    pub grid_spacing: f64,
    /// Treatment of the plate border
    pub boundary: Boundary,
}

impl Behaviour<f64, Fields<f64>, Array2<f64>> for InducerDiffusion {
    fn calculate_increment(&self, _t: f64, state: &Fields<f64>) -> Result<Array2<f64>, CalcError> {
        let a = state.clamped(INDUCER)?;
        Ok(laplacian(&a, self.grid_spacing, self.boundary) * self.diffusion_constant)
    }
}

/// Constants of an inducible promoter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Induction {
    /// Maximal induced expression
    pub alpha: f64,
    /// Basal expression
    pub beta: f64,
    /// Inducer concentration at half-maximal induction
    pub k_inducer: f64,
    /// Hill coefficient of the induction
    pub n_inducer: f64,
    /// Repression by LacI
    pub k_lac: f64,
}

impl Induction {
    /// Promoter of the polymerase T7
    pub fn polymerase(params: &CircuitParameters) -> Self {
        Self {
            alpha: params.alpha_t,
            beta: params.beta_t,
            k_inducer: params.k_it,
            n_inducer: params.n_it,
            k_lac: params.k_lac_t,
        }
    }

    /// Promoter of the repressor
    pub fn repressor(params: &CircuitParameters) -> Self {
        Self {
            alpha: params.alpha_r,
            beta: params.beta_r,
            k_inducer: params.k_ir,
            n_inducer: params.n_ir,
            k_lac: params.k_lac_r,
        }
    }
}

/// Growth-coupled expression of a protein from an inducible promoter.
///
/// \\begin{equation}
///     \dot P = \alpha\mu\frac{1 + (A/K_I)^{n_I}}{1 + (A/K_I)^{n_I} + K_{lac}} + \beta\mu - \mu P
/// \\end{equation}
///
/// The last term describes dilution by growth.
#[derive(Clone, Debug)]
pub struct InducedExpression {
    /// Name of the expressed species
    pub species: &'static str,
    /// Promoter constants
    pub induction: Induction,
    /// Growth restricted to receivers
    pub growth: ReceiverGrowth,
}

impl Behaviour<f64, Fields<f64>, Array2<f64>> for InducedExpression {
    fn calculate_increment(&self, t: f64, state: &Fields<f64>) -> Result<Array2<f64>, CalcError> {
        let a = state.clamped(INDUCER)?;
        let p = state.clamped(self.species)?;
        let mu = self.growth.mu(t, state)?;
        let Induction {
            alpha,
            beta,
            k_inducer,
            n_inducer,
            k_lac,
        } = self.induction;
        Ok(Zip::from(&a).and(&p).and(&mu).map_collect(|&a, &p, &mu| {
            alpha * mu * induced_fraction(a, k_inducer, n_inducer, k_lac) + beta * mu - mu * p
        }))
    }
}

/// Repression of the reporter in the bandpass circuit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repression {
    /// Repressor concentration at half-maximal repression
    pub k: f64,
    /// Hill coefficient
    pub n: f64,
}

/// Expression of the reporter activated by T7 and optionally repressed by R.
///
/// \\begin{equation}
///     \dot G = \alpha_G\mu\frac{T_7^{n_A}}{K_A^{n_A} + T_7^{n_A}}
///         \left[\frac{K_R^{n_R}}{K_R^{n_R} + R^{n_R}}\right] + \beta_G\mu - G_s\mu G
/// \\end{equation}
#[derive(Clone, Debug)]
pub struct Reporter {
    /// Maximal expression $\alpha_G$
    pub alpha: f64,
    /// Basal expression $\beta_G$
    pub beta: f64,
    /// T7 concentration at half-maximal activation
    pub k_activation: f64,
    /// Hill coefficient of activation
    pub n_activation: f64,
    /// Scaling of dilution $G_s$
    pub dilution: f64,
    /// Present only in the bandpass circuit
    pub repression: Option<Repression>,
    /// Growth restricted to receivers
    pub growth: ReceiverGrowth,
}

impl Reporter {
    /// Reporter with constants taken from `params`
    pub fn new(params: &CircuitParameters, repressed: bool, growth: ReceiverGrowth) -> Self {
        Self {
            alpha: params.alpha_g,
            beta: params.beta_g,
            k_activation: params.k_a,
            n_activation: params.n_a,
            dilution: params.g_s,
            repression: repressed.then_some(Repression {
                k: params.k_r,
                n: params.n_r,
            }),
            growth,
        }
    }
}

impl Behaviour<f64, Fields<f64>, Array2<f64>> for Reporter {
    fn calculate_increment(&self, t: f64, state: &Fields<f64>) -> Result<Array2<f64>, CalcError> {
        let t7 = state.clamped(POLYMERASE)?;
        let g = state.clamped(REPORTER)?;
        let mu = self.growth.mu(t, state)?;
        let mut expression = Zip::from(&t7).and(&mu).map_collect(|&t7, &mu| {
            self.alpha * mu * hill_activation(t7, self.k_activation, self.n_activation)
        });
        if let Some(Repression { k, n }) = self.repression {
            let r = state.clamped(REPRESSOR)?;
            Zip::from(&mut expression)
                .and(&r)
                .for_each(|e, &r| *e *= hill_repression(r, k, n));
        }
        Zip::from(&mut expression)
            .and(&g)
            .and(&mu)
            .for_each(|e, &g, &mu| *e += self.beta * mu - g * mu * self.dilution);
        Ok(expression)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parameters::default_parameters;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn constant_growth(rate: f64, receivers: Array2<f64>) -> ReceiverGrowth {
        let inducer_sources = Array2::zeros(receivers.dim());
        let growth = move |_t: f64, s: &Fields<f64>| {
            let shape = s.iter().next().map_or((0, 0), |(_, f)| f.dim());
            Array2::from_elem(shape, rate)
        };
        ReceiverGrowth::new(
            Arc::new(growth),
            Arc::new(Masks {
                receivers,
                inducer_sources,
            }),
        )
    }

    fn state(fields: &[(&str, Array2<f64>)]) -> Fields<f64> {
        let mut state = Fields::new();
        for (name, field) in fields {
            state.insert(*name, field.clone()).unwrap();
        }
        state
    }

    #[test]
    fn hill_functions_are_bounded() {
        for x in [-1e-9, 0.0, 1e-300, 1e-3, 1.0, 1e3, 1e300, f64::MAX] {
            for n in [0.7, 2.0, 20.0] {
                let a = hill_activation(x, 1.0, n);
                let r = hill_repression(x, 1.0, n);
                assert!((0.0..=1.0).contains(&a), "activation({x}, {n}) = {a}");
                assert!((0.0..=1.0).contains(&r), "repression({x}, {n}) = {r}");
            }
        }
        assert_eq!(hill_activation(-1e-9, 1.0, 2.0), 0.0);
        assert_eq!(hill_repression(-1e-9, 1.0, 2.0), 1.0);
        assert_relative_eq!(hill_activation(2.0, 2.0, 3.0), 0.5);
        assert_relative_eq!(hill_repression(2.0, 2.0, 3.0), 0.5);
        assert_relative_eq!(hill_activation(3.0, 1.5, 2.0), 9.0 / (2.25 + 9.0));
    }

    #[test]
    fn hill_functions_with_zero_coefficient() {
        for x in [-1.0, 0.0, 0.5, 1e3] {
            assert_eq!(hill_activation(x, 2.0, 0.0), 0.5);
            assert_eq!(hill_repression(x, 2.0, 0.0), 0.5);
        }
    }

    #[test]
    fn induced_fraction_limits() {
        assert_relative_eq!(induced_fraction(0.0, 1.0, 2.0, 9.0), 0.1);
        assert_relative_eq!(induced_fraction(-1e-9, 1.0, 2.0, 9.0), 0.1);
        assert_eq!(induced_fraction(1e300, 1e-5, 20.0, 9.0), 1.0);
        assert_relative_eq!(induced_fraction(2.0, 2.0, 1.0, 8.0), 0.2);
    }

    #[test]
    fn growth_vanishes_outside_receivers() {
        let growth = ReceiverGrowth::new(
            Arc::new(|_t: f64, _s: &Fields<f64>| array![[f64::NAN, 2.0], [f64::INFINITY, 3.0]]),
            Arc::new(Masks {
                receivers: array![[0.0, 1.0], [0.0, 1.0]],
                inducer_sources: Array2::zeros((2, 2)),
            }),
        );
        let mu = growth.mu(0.0, &Fields::new()).unwrap();
        assert_eq!(mu, array![[0.0, 2.0], [0.0, 3.0]]);
    }

    #[test]
    fn growth_shape_mismatch_is_an_error() {
        let growth = ReceiverGrowth::new(
            Arc::new(|_t: f64, _s: &Fields<f64>| Array2::<f64>::zeros((3, 3))),
            Arc::new(Masks {
                receivers: Array2::ones((2, 2)),
                inducer_sources: Array2::zeros((2, 2)),
            }),
        );
        assert!(growth.mu(0.0, &Fields::new()).is_err());
        let biomass = BiomassGrowth { growth };
        assert!(biomass.calculate_increment(0.0, &Fields::new()).is_err());
    }

    #[test]
    fn induced_expression_formula() {
        let params = default_parameters();
        let rule = InducedExpression {
            species: POLYMERASE,
            induction: Induction::polymerase(&params),
            growth: constant_growth(0.5, array![[1.0, 0.0]]),
        };
        let s = state(&[(INDUCER, array![[1e-3, 1e-3]]), (POLYMERASE, array![[2.0, 2.0]])]);
        let d = rule.calculate_increment(0.0, &s).unwrap();
        let r = (1e-3 / params.k_it).powf(params.n_it);
        let expected =
            params.alpha_t * 0.5 * (1.0 + r) / (1.0 + r + params.k_lac_t) + params.beta_t * 0.5
                - 0.5 * 2.0;
        assert_relative_eq!(d[[0, 0]], expected, max_relative = 1e-12);
        assert_eq!(d[[0, 1]], 0.0);
    }

    #[test]
    fn reporter_repression_only_in_bandpass() {
        let params = default_parameters();
        let growth = constant_growth(0.1, array![[1.0]]);
        let s = state(&[
            (POLYMERASE, array![[3000.0]]),
            (REPORTER, array![[10.0]]),
            (REPRESSOR, array![[987.0]]),
        ]);
        let threshold = Reporter::new(&params, false, growth.clone());
        let bandpass = Reporter::new(&params, true, growth);
        let d_threshold = threshold.calculate_increment(0.0, &s).unwrap()[[0, 0]];
        let d_bandpass = bandpass.calculate_increment(0.0, &s).unwrap()[[0, 0]];

        let activation = hill_activation(3000.0, params.k_a, params.n_a);
        let basal = params.beta_g * 0.1 - 10.0 * 0.1 * params.g_s;
        assert_relative_eq!(
            d_threshold,
            params.alpha_g * 0.1 * activation + basal,
            max_relative = 1e-12
        );
        // R equals K_R and halves the expression
        assert_relative_eq!(
            d_bandpass,
            params.alpha_g * 0.1 * activation * 0.5 + basal,
            max_relative = 1e-12
        );
    }

    #[test]
    fn diffusion_reads_clamped_inducer() {
        let rule = InducerDiffusion {
            diffusion_constant: 2.0,
            grid_spacing: 1.0,
            boundary: Boundary::Neumann,
        };
        let s = state(&[(INDUCER, array![[-1.0, 0.0, 0.0]])]);
        assert_eq!(
            rule.calculate_increment(0.0, &s).unwrap(),
            Array2::<f64>::zeros((1, 3))
        );
    }
}
