//! Kinetic constants of the circuit and the published parameter sets.
//!
//! The positional layout of [CircuitParameters] is fixed and documented by [PARAMETER_NAMES].
//! It is used whenever parameters are exchanged as plain vectors, for example with fitting
//! routines.

use serde::{Deserialize, Serialize};

use plate_rd_concepts::ConfigurationError;

use crate::circuit::Topology;
use crate::growth::Gompertz;

/// Number of entries of a positional parameter vector
pub const N_PARAMETERS: usize = 25;

/// Names of the positional parameters in order
pub const PARAMETER_NAMES: [&str; N_PARAMETERS] = [
    "D_N", "mu_max", "K_mu", "gamma", "D_A", "alpha_T", "beta_T", "K_IT", "n_IT", "K_lacT",
    "T7_0", "alpha_R", "beta_R", "K_IR", "n_IR", "K_lacR", "R_0", "alpha_G", "beta_G", "n_A",
    "K_A", "n_R", "K_R", "X_0", "G_s",
];

/// Kinetic constants of the inducer-responsive gene circuit.
///
/// Concentrations of the inducer are measured in mM, diffusion constants in mm²/min and
/// rates in 1/min.
/// Some constants (`d_n`, `mu_max`, `k_mu`, `gamma`) belong to a nutrient-limited growth model
/// and are carried along to keep the positional layout stable.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct CircuitParameters {
    /// Diffusion constant of nutrients
    pub d_n: f64,
    /// Maximum growth rate of the nutrient-limited model
    pub mu_max: f64,
    /// Monod constant of the nutrient-limited model
    pub k_mu: f64,
    /// Nutrient consumption per unit of biomass
    pub gamma: f64,
    /// Diffusion constant of the inducer
    pub d_a: f64,
    /// Maximal induced expression of T7
    pub alpha_t: f64,
    /// Basal expression of T7
    pub beta_t: f64,
    /// Inducer concentration at half-maximal induction of T7
    pub k_it: f64,
    /// Hill coefficient of the induction of T7
    pub n_it: f64,
    /// Repression of the T7 promoter by LacI
    pub k_lac_t: f64,
    /// Initial concentration of T7
    pub t7_0: f64,
    /// Maximal induced expression of the repressor
    pub alpha_r: f64,
    /// Basal expression of the repressor
    pub beta_r: f64,
    /// Inducer concentration at half-maximal induction of the repressor
    pub k_ir: f64,
    /// Hill coefficient of the induction of the repressor
    pub n_ir: f64,
    /// Repression of the repressor promoter by LacI
    pub k_lac_r: f64,
    /// Initial concentration of the repressor
    pub r_0: f64,
    /// Maximal expression of the reporter
    pub alpha_g: f64,
    /// Basal expression of the reporter
    pub beta_g: f64,
    /// Hill coefficient of the activation of the reporter by T7
    pub n_a: f64,
    /// T7 concentration at half-maximal activation of the reporter
    pub k_a: f64,
    /// Hill coefficient of the repression of the reporter
    pub n_r: f64,
    /// Repressor concentration at half-maximal repression of the reporter
    pub k_r: f64,
    /// Initial biomass in each receiver cell
    pub x_0: f64,
    /// Scaling of reporter dilution
    pub g_s: f64,
}

impl CircuitParameters {
    /// Parses parameters from a positional vector ordered as [PARAMETER_NAMES].
    pub fn from_slice(values: &[f64]) -> Result<Self, ConfigurationError> {
        let values: [f64; N_PARAMETERS] = values.try_into().map_err(|_| {
            ConfigurationError(format!(
                "expected {N_PARAMETERS} circuit parameters but {} were given",
                values.len()
            ))
        })?;
        let [
            d_n,
            mu_max,
            k_mu,
            gamma,
            d_a,
            alpha_t,
            beta_t,
            k_it,
            n_it,
            k_lac_t,
            t7_0,
            alpha_r,
            beta_r,
            k_ir,
            n_ir,
            k_lac_r,
            r_0,
            alpha_g,
            beta_g,
            n_a,
            k_a,
            n_r,
            k_r,
            x_0,
            g_s,
        ] = values;
        Ok(Self {
            d_n,
            mu_max,
            k_mu,
            gamma,
            d_a,
            alpha_t,
            beta_t,
            k_it,
            n_it,
            k_lac_t,
            t7_0,
            alpha_r,
            beta_r,
            k_ir,
            n_ir,
            k_lac_r,
            r_0,
            alpha_g,
            beta_g,
            n_a,
            k_a,
            n_r,
            k_r,
            x_0,
            g_s,
        })
    }

    /// Positional representation ordered as [PARAMETER_NAMES]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.d_n,
            self.mu_max,
            self.k_mu,
            self.gamma,
            self.d_a,
            self.alpha_t,
            self.beta_t,
            self.k_it,
            self.n_it,
            self.k_lac_t,
            self.t7_0,
            self.alpha_r,
            self.beta_r,
            self.k_ir,
            self.n_ir,
            self.k_lac_r,
            self.r_0,
            self.alpha_g,
            self.beta_g,
            self.n_a,
            self.k_a,
            self.n_r,
            self.k_r,
            self.x_0,
            self.g_s,
        ]
    }
}

impl Default for CircuitParameters {
    fn default() -> Self {
        default_parameters()
    }
}

/// Literature values of the circuit constants.
pub fn default_parameters() -> CircuitParameters {
    CircuitParameters {
        d_n: 1e-4,
        mu_max: 0.02,
        k_mu: 1.0,
        gamma: 1e4,
        d_a: 1e-4,
        alpha_t: 6223.0,
        beta_t: 12.8,
        k_it: 1.4e-3,
        n_it: 2.3,
        k_lac_t: 15719.0,
        t7_0: 0.0,
        alpha_r: 8025.0,
        beta_r: 30.6,
        k_ir: 1.2e-3,
        n_ir: 2.2,
        k_lac_r: 14088.0,
        r_0: 0.0,
        alpha_g: 16462.0,
        beta_g: 19.0,
        n_a: 1.34,
        k_a: 2532.0,
        n_r: 3.9,
        k_r: 987.0,
        // 0.3 OD spread over 10 wells on a 35x35 grid
        x_0: 0.3 * 10.0 / (35.0 * 35.0),
        g_s: 1.0,
    }
}

/// Gompertz growth curve measured for the receiver strain of the given topology
pub fn growth_curve(topology: Topology) -> Gompertz {
    match topology {
        Topology::Threshold => Gompertz::new(2.11394439e-01, 2.41594404e-04, 4.53552100e+02),
        Topology::Bandpass => Gompertz::new(1.92683259e-01, 2.64236032e-04, 4.32035143e+02),
    }
}

/// Constants fitted to plate measurements together with the matching growth curve.
///
/// Starts from [default_parameters] and replaces the fitted entries.
/// The initial biomass `x_0` keeps its default value.
pub fn fitted_parameters(topology: Topology) -> (CircuitParameters, Gompertz) {
    let params = CircuitParameters {
        d_a: 2.09718170e-02,
        alpha_t: 4.49362919e+04,
        beta_t: 2.34638872e-05,
        k_it: 4.45234986e-05,
        n_it: 7.11988626e-01,
        k_lac_t: 3.35441602e+04,
        t7_0: 3.55509735e-07,
        alpha_g: 8.58228897e+01,
        beta_g: 2.89591988e+00,
        n_a: 1.25306724e+01,
        k_a: 1.56052788e+00,
        g_s: 1.23855350e-01,
        alpha_r: 2.85879101e+04,
        beta_r: 6.09622809e-05,
        k_ir: 4.09154708e-03,
        n_ir: 2.0e1,
        k_lac_r: 8.84861563e+04,
        r_0: 1.03251547e+00,
        n_r: 1.06590408e+01,
        k_r: 8.19685211e-01,
        ..default_parameters()
    };
    (params, growth_curve(topology))
}

/// Named and versioned collections of circuit constants.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum ParameterSet {
    /// See [default_parameters]
    #[default]
    Literature,
    /// See [fitted_parameters]
    Fitted,
}

impl ParameterSet {
    /// Version of the stored constants.
    /// Incremented whenever any stored value changes.
    pub const VERSION: u32 = 2;

    /// Every available set
    pub const ALL: [ParameterSet; 2] = [ParameterSet::Literature, ParameterSet::Fitted];

    /// Identifier used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            ParameterSet::Literature => "literature",
            ParameterSet::Fitted => "fitted",
        }
    }

    /// Looks up a set by its [name](ParameterSet::name)
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        Self::ALL
            .into_iter()
            .find(|set| set.name() == name)
            .ok_or_else(|| ConfigurationError(format!("unknown parameter set {name}")))
    }

    /// Circuit constants and growth curve for the given topology
    pub fn load(&self, topology: Topology) -> (CircuitParameters, Gompertz) {
        match self {
            ParameterSet::Literature => (default_parameters(), growth_curve(topology)),
            ParameterSet::Fitted => fitted_parameters(topology),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn positional_layout() {
        let params = default_parameters();
        let values = params.to_vec();
        assert_eq!(values.len(), N_PARAMETERS);
        assert_eq!(values[4], params.d_a);
        assert_eq!(values[10], params.t7_0);
        assert_eq!(values[23], params.x_0);
        assert_eq!(values[24], params.g_s);
        assert_eq!(CircuitParameters::from_slice(&values).unwrap(), params);
        let index = |name: &str| PARAMETER_NAMES.iter().position(|n| *n == name).unwrap();
        assert_eq!(values[index("K_R")], 987.0);
        assert_eq!(values[index("n_A")], 1.34);
    }

    #[test]
    fn reject_wrong_length() {
        assert!(CircuitParameters::from_slice(&[1.0; 24]).is_err());
        assert!(CircuitParameters::from_slice(&[1.0; 26]).is_err());
    }

    #[test]
    fn fitted_keeps_unfitted_defaults() {
        let defaults = default_parameters();
        let (fitted, _) = fitted_parameters(Topology::Threshold);
        assert_eq!(fitted.x_0, defaults.x_0);
        assert_eq!(fitted.d_n, defaults.d_n);
        assert_eq!(fitted.mu_max, defaults.mu_max);
        assert_eq!(fitted.d_a, 2.09718170e-02);
        assert_eq!(fitted.n_ir, 20.0);
    }

    #[test]
    fn growth_curves_per_topology() {
        let (_, threshold) = fitted_parameters(Topology::Threshold);
        let (_, bandpass) = fitted_parameters(Topology::Bandpass);
        assert_eq!(threshold.lag_time, 4.53552100e+02);
        assert_eq!(bandpass.asymptote, 1.92683259e-01);
    }

    #[test]
    fn parameter_set_names() {
        for set in ParameterSet::ALL {
            assert_eq!(ParameterSet::from_name(set.name()).unwrap(), set);
        }
        assert!(ParameterSet::from_name("unknown").is_err());
        assert_eq!(
            ParameterSet::Fitted.load(Topology::Bandpass),
            fitted_parameters(Topology::Bandpass)
        );
    }

    #[test]
    fn serde_roundtrip() {
        let params = default_parameters();
        let json = serde_json::to_string(&params).unwrap();
        let parsed: CircuitParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }
}
