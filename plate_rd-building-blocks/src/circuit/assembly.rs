use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use plate_rd_concepts::{ConfigurationError, GrowthRate, PlateError};
use plate_rd_core::{Boundary, Fields, Plate, Species};

use crate::parameters::CircuitParameters;

use super::rules::*;
use super::{Topology, BIOMASS, INDUCER, POLYMERASE, REPORTER, REPRESSOR};

/// Thickness of the agar layer in mm
pub const AGAR_THICKNESS: f64 = 3.12;

/// Geometry and experimental conditions of a single plate.
///
/// ```
/// # use plate_rd_building_blocks::prelude::*;
/// let setup = PlateSetup::new(vec![[1, 1]], vec![[0, 0]], 5.0, (3, 3), 4.5)
///     .with_flags(true, false, false);
/// assert_eq!(setup.boundary, Boundary::Neumann);
/// assert_eq!(setup.topology, Topology::Threshold);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlateSetup {
    /// Grid points `[row, column]` which contain receiver cells
    pub receiver_coords: Vec<[usize; 2]>,
    /// Grid points `[row, column]` into which inducer is pipetted
    pub inducer_coords: Vec<[usize; 2]>,
    /// Concentration of the pipetted inducer in µM
    pub inducer_concentration: f64,
    /// Number of `(rows, columns)` of the grid
    pub shape: (usize, usize),
    /// Distance between neighbouring grid points in mm
    pub grid_spacing: f64,
    /// Treatment of the plate border
    pub boundary: Boundary,
    /// Wiring of the circuit
    pub topology: Topology,
    /// Split the inducer amount evenly between all source wells
    pub fitting: bool,
}

impl PlateSetup {
    /// Setup with [Boundary::Neumann], [Topology::Threshold] and without fitting
    pub fn new(
        receiver_coords: Vec<[usize; 2]>,
        inducer_coords: Vec<[usize; 2]>,
        inducer_concentration: f64,
        shape: (usize, usize),
        grid_spacing: f64,
    ) -> Self {
        Self {
            receiver_coords,
            inducer_coords,
            inducer_concentration,
            shape,
            grid_spacing,
            boundary: Boundary::default(),
            topology: Topology::default(),
            fitting: false,
        }
    }

    /// Sets boundary, topology and fitting mode from boolean flags.
    ///
    /// `laplace` selects [Boundary::Neumann] over [Boundary::Dirichlet] and `bandpass` selects
    /// [Topology::Bandpass] over [Topology::Threshold].
    pub fn with_flags(mut self, laplace: bool, bandpass: bool, fitting: bool) -> Self {
        self.boundary = if laplace {
            Boundary::Neumann
        } else {
            Boundary::Dirichlet
        };
        self.topology = Topology::from_bandpass_flag(bandpass);
        self.fitting = fitting;
        self
    }

    /// Checks that the setup describes a valid plate
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let (rows, cols) = self.shape;
        if rows == 0 || cols == 0 {
            return Err(ConfigurationError(format!(
                "grid shape {:?} contains no cells",
                self.shape
            )));
        }
        if !(self.grid_spacing > 0.0) || !self.grid_spacing.is_finite() {
            return Err(ConfigurationError(format!(
                "grid spacing needs to be positive and finite but is {}",
                self.grid_spacing
            )));
        }
        if !self.inducer_concentration.is_finite() {
            return Err(ConfigurationError(format!(
                "inducer concentration {} is not finite",
                self.inducer_concentration
            )));
        }
        for (kind, coords) in [
            ("receiver", &self.receiver_coords),
            ("inducer", &self.inducer_coords),
        ] {
            if let Some([i, j]) = coords.iter().find(|[i, j]| *i >= rows || *j >= cols) {
                return Err(ConfigurationError(format!(
                    "{kind} coordinate [{i}, {j}] lies outside of grid with shape {:?}",
                    self.shape
                )));
            }
        }
        if self.fitting && self.inducer_coords.is_empty() {
            return Err(ConfigurationError(
                "cannot split inducer between zero source wells".to_owned(),
            ));
        }
        Ok(())
    }

    /// Initial inducer concentration in every source well in mM.
    ///
    /// The pipetted amount in µM is spread over the agar volume below one grid cell
    /// $w^2 h$ with agar thickness $h$ = [AGAR_THICKNESS].
    /// In fitting mode the amount is divided between all source wells.
    pub fn initial_inducer_concentration(&self) -> Result<f64, ConfigurationError> {
        self.validate()?;
        let w = self.grid_spacing;
        let mut a_0 = self.inducer_concentration * 1e-6 / (w * w * AGAR_THICKNESS);
        if self.fitting {
            a_0 /= self.inducer_coords.len() as f64;
        }
        Ok(a_0 * 1e6)
    }

    /// Indicator fields of receivers and inducer sources
    pub fn masks(&self) -> Result<Masks, ConfigurationError> {
        self.validate()?;
        let indicator = |coords: &[[usize; 2]]| {
            let mut mask = Array2::<f64>::zeros(self.shape);
            for [i, j] in coords.iter() {
                mask[[*i, *j]] = 1.0;
            }
            mask
        };
        Ok(Masks {
            receivers: indicator(&self.receiver_coords),
            inducer_sources: indicator(&self.inducer_coords),
        })
    }
}

/// Builds the plate of the gene circuit.
///
/// Species are registered in the order `X, A, T7, G` followed by `R` for
/// [Topology::Bandpass].
/// Every reaction rule holds its own reference to the shared masks and the restricted growth
/// rate.
/// The circuit constants are copied into the rules so the returned plate does not depend on
/// `params` afterwards.
///
/// ```
/// # use plate_rd_building_blocks::prelude::*;
/// let setup = PlateSetup::new(vec![[1, 1]], vec![[0, 0]], 5.0, (3, 3), 4.5);
/// let (params, curve) = fitted_parameters(setup.topology);
/// let plate = make_plate(&setup, &params, UniformGrowth::new(curve))?;
/// assert_eq!(plate.species_names(), vec!["X", "A", "T7", "G"]);
/// let derivative = plate.derivative(600.0)?;
/// assert_eq!(derivative.len(), 4);
/// # Ok::<(), PlateError>(())
/// ```
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn make_plate<G>(
    setup: &PlateSetup,
    params: &CircuitParameters,
    growth: G,
) -> Result<Plate<f64>, PlateError>
where
    G: GrowthRate<f64, Fields<f64>, Array2<f64>> + Send + Sync + 'static,
{
    let masks = Arc::new(setup.masks()?);
    let a_0 = setup.initial_inducer_concentration()?;
    let growth = ReceiverGrowth::new(Arc::new(growth), masks.clone());
    let shape = setup.shape;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        ?shape,
        topology = ?setup.topology,
        boundary = ?setup.boundary,
        n_receivers = setup.receiver_coords.len(),
        n_sources = setup.inducer_coords.len(),
        a_0,
        "assembling plate"
    );

    let mut plate = Plate::new(shape)?;

    let mut biomass = Species::new(BIOMASS, &masks.receivers * params.x_0);
    biomass.set_behaviour(BiomassGrowth {
        growth: growth.clone(),
    })?;
    plate.add_species(biomass)?;

    let mut inducer = Species::new(INDUCER, &masks.inducer_sources * a_0);
    inducer.set_behaviour(InducerDiffusion {
        diffusion_constant: params.d_a,
        grid_spacing: setup.grid_spacing,
        boundary: setup.boundary,
    })?;
    plate.add_species(inducer)?;

    let mut polymerase = Species::new(POLYMERASE, Array2::from_elem(shape, params.t7_0));
    polymerase.set_behaviour(InducedExpression {
        species: POLYMERASE,
        induction: Induction::polymerase(params),
        growth: growth.clone(),
    })?;
    plate.add_species(polymerase)?;

    let repressed = setup.topology == Topology::Bandpass;
    let mut reporter = Species::new(REPORTER, Array2::<f64>::zeros(shape));
    reporter.set_behaviour(Reporter::new(params, repressed, growth.clone()))?;
    plate.add_species(reporter)?;

    match setup.topology {
        Topology::Threshold => (),
        Topology::Bandpass => {
            let mut repressor = Species::new(REPRESSOR, Array2::from_elem(shape, params.r_0));
            repressor.set_behaviour(InducedExpression {
                species: REPRESSOR,
                induction: Induction::repressor(params),
                growth,
            })?;
            plate.add_species(repressor)?;
        }
    }
    Ok(plate)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::growth::{Gompertz, UniformGrowth};
    use crate::parameters::default_parameters;
    use approx::assert_relative_eq;

    fn setup() -> PlateSetup {
        PlateSetup::new(vec![[1, 1], [2, 3]], vec![[0, 0], [3, 3]], 5.0, (4, 5), 4.5)
    }

    fn curve() -> UniformGrowth<Gompertz> {
        UniformGrowth::new(Gompertz::new(0.2, 2.5e-4, 450.0))
    }

    #[test]
    fn flags_select_modes() {
        let s = setup().with_flags(false, true, true);
        assert_eq!(s.boundary, Boundary::Dirichlet);
        assert_eq!(s.topology, Topology::Bandpass);
        assert!(s.fitting);
    }

    #[test]
    fn reject_invalid_setups() {
        let mut s = setup();
        s.receiver_coords.push([4, 0]);
        assert!(s.validate().is_err());

        let mut s = setup();
        s.inducer_coords.push([0, 5]);
        assert!(s.masks().is_err());

        let mut s = setup();
        s.grid_spacing = 0.0;
        assert!(s.initial_inducer_concentration().is_err());

        let mut s = setup().with_flags(true, false, true);
        s.inducer_coords.clear();
        assert!(matches!(
            make_plate(&s, &default_parameters(), curve()),
            Err(PlateError::ConfigurationError(_))
        ));
    }

    #[test]
    fn initial_inducer_scaling() {
        let s = setup();
        let a_0 = s.initial_inducer_concentration().unwrap();
        assert_relative_eq!(a_0, 5.0 / (4.5 * 4.5 * 3.12), max_relative = 1e-12);
        let fitted = s.clone().with_flags(true, false, true);
        assert_relative_eq!(
            fitted.initial_inducer_concentration().unwrap(),
            a_0 / 2.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn masks_mark_coordinates() {
        let masks = setup().masks().unwrap();
        assert_eq!(masks.receivers.sum(), 2.0);
        assert_eq!(masks.receivers[[2, 3]], 1.0);
        assert_eq!(masks.inducer_sources[[3, 3]], 1.0);
        assert_eq!(masks.inducer_sources[[1, 1]], 0.0);
    }

    #[test]
    fn initial_fields() {
        let params = default_parameters();
        let plate = make_plate(&setup(), &params, curve()).unwrap();
        let state = plate.state();
        let a_0 = setup().initial_inducer_concentration().unwrap();
        assert_eq!(state.get(BIOMASS).unwrap()[[1, 1]], params.x_0);
        assert_eq!(state.get(BIOMASS).unwrap()[[0, 0]], 0.0);
        assert_eq!(state.get(INDUCER).unwrap()[[0, 0]], a_0);
        assert_eq!(state.get(INDUCER).unwrap().sum(), 2.0 * a_0);
        assert!(state.get(REPORTER).unwrap().iter().all(|g| *g == 0.0));
        assert!(state.get(POLYMERASE).unwrap().iter().all(|t| *t == params.t7_0));
    }

    #[test]
    fn species_order_follows_topology() {
        let params = default_parameters();
        for bandpass in [false, true] {
            let s = setup().with_flags(true, bandpass, false);
            let plate = make_plate(&s, &params, curve()).unwrap();
            assert_eq!(plate.species_names(), s.topology.species_names().to_vec());
            assert!(plate.species().all(|sp| sp.has_behaviour()));
        }
    }

    #[test]
    fn setup_serde() {
        let s = setup().with_flags(false, true, false);
        let json = serde_json::to_string(&s).unwrap();
        let parsed: PlateSetup = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }
}
