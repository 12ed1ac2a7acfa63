use ndarray::Array2;

use plate_rd_concepts::{ConfigurationError, PlateError};

use crate::field::{Fields, Float};
use crate::species::Species;

/// The coupled system of all species which share one grid.
///
/// The plate is a pure right-hand-side provider.
/// It never advances time itself but returns the derivative of the joint state at a given time
/// point which can then be handed to any time-stepping scheme
/// (see [solvers](crate::solvers)).
///
/// ```
/// # use plate_rd_core::*;
/// # use plate_rd_concepts::CalcError;
/// # use ndarray::Array2;
/// let mut plate = Plate::new((3, 3))?;
/// let mut species = Species::new("N", Array2::from_elem((3, 3), 1.0));
/// species.set_behaviour(|_t: f64, s: &Fields<f64>| -> Result<Array2<f64>, CalcError> {
///     Ok(laplacian(&s.clamped("N")?, 1.0, Boundary::Neumann))
/// })?;
/// plate.add_species(species)?;
/// let derivative = plate.derivative(0.0)?;
/// assert_eq!(derivative.get("N")?, &Array2::<f64>::zeros((3, 3)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Plate<F> {
    shape: (usize, usize),
    species: Vec<Species<F>>,
}

impl<F: Float> Plate<F> {
    /// Creates an empty plate with fixed grid shape `(rows, columns)`.
    pub fn new(shape: (usize, usize)) -> Result<Self, ConfigurationError> {
        if shape.0 == 0 || shape.1 == 0 {
            return Err(ConfigurationError(format!(
                "grid shape {shape:?} contains no cells"
            )));
        }
        Ok(Self {
            shape,
            species: Vec::new(),
        })
    }

    /// Shape of the grid shared by every species
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Appends a species. Its name has to be unique and its field has to match the grid.
    pub fn add_species(&mut self, species: Species<F>) -> Result<(), ConfigurationError> {
        if self.contains(species.name()) {
            return Err(ConfigurationError(format!(
                "species {} is already present on the plate",
                species.name()
            )));
        }
        if species.shape() != self.shape {
            return Err(ConfigurationError(format!(
                "species {} has shape {:?} but plate has shape {:?}",
                species.name(),
                species.shape(),
                self.shape
            )));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(species = species.name(), "adding species to plate");
        self.species.push(species);
        Ok(())
    }

    /// Checks if a species with the given name is present
    pub fn contains(&self, name: &str) -> bool {
        self.species.iter().any(|s| s.name() == name)
    }

    /// Obtain a species by name
    pub fn get_species(&self, name: &str) -> Option<&Species<F>> {
        self.species.iter().find(|s| s.name() == name)
    }

    /// Iterate over all species in insertion order
    pub fn species(&self) -> impl Iterator<Item = &Species<F>> {
        self.species.iter()
    }

    /// Names of all species in insertion order
    pub fn species_names(&self) -> Vec<&str> {
        self.species.iter().map(|s| s.name()).collect()
    }

    /// Snapshot of the current state of all species
    pub fn state(&self) -> Fields<F> {
        let mut fields = Fields::new();
        for species in self.species.iter() {
            // Names are unique by construction
            let _ = fields.insert(species.name(), species.state().clone());
        }
        fields
    }

    /// Replaces the state of every species.
    ///
    /// The given fields need to contain exactly the species of this plate in the same order
    /// and with matching shapes.
    pub fn set_state(&mut self, state: Fields<F>) -> Result<(), ConfigurationError> {
        self.check_layout(&state)?;
        for (species, (_, field)) in self.species.iter_mut().zip(state.iter()) {
            species.set_state(field.clone());
        }
        Ok(())
    }

    /// Total number of scalar values of the joint state
    pub fn n_values(&self) -> usize {
        self.species.len() * self.shape.0 * self.shape.1
    }

    fn check_layout(&self, state: &Fields<F>) -> Result<(), ConfigurationError> {
        let names_match = state.len() == self.species.len()
            && state.n_values() == self.n_values()
            && state
                .names()
                .zip(self.species.iter())
                .all(|(n, s)| n == s.name());
        if !names_match {
            return Err(ConfigurationError(format!(
                "state with species {:?} does not match plate species {:?}",
                state.names().collect::<Vec<_>>(),
                self.species_names()
            )));
        }
        if let Some((name, field)) = state.iter().find(|(_, f)| f.dim() != self.shape) {
            return Err(ConfigurationError(format!(
                "field of species {name} has shape {:?} but plate has shape {:?}",
                field.dim(),
                self.shape
            )));
        }
        Ok(())
    }

    /// Derivative of the current state at time `t`.
    pub fn derivative(&self, t: F) -> Result<Fields<F>, PlateError> {
        self.derivative_of(t, &self.state())
    }

    /// Derivative of an arbitrary state at time `t`.
    ///
    /// Every behaviour reads the same frozen `state`.
    /// The order in which species are evaluated therefore does not influence the result.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn derivative_of(&self, t: F, state: &Fields<F>) -> Result<Fields<F>, PlateError> {
        self.check_layout(state)?;
        let mut derivative = Fields::new();
        for species in self.species.iter() {
            let increment: Array2<F> = species.evaluate(t, state)?;
            derivative.insert(species.name(), increment)?;
        }
        Ok(derivative)
    }

    /// Converts a concatenated state vector into [Fields] with the layout of this plate.
    pub fn state_from_flat(
        &self,
        flat: &nalgebra::DVector<F>,
    ) -> Result<Fields<F>, ConfigurationError> {
        self.state().with_flat_values(flat)
    }

    /// Derivative for solvers which operate on the concatenated state vector.
    ///
    /// The layout of the vector is given by [Fields::to_flat].
    pub fn derivative_flat(
        &self,
        t: F,
        flat: &nalgebra::DVector<F>,
    ) -> Result<nalgebra::DVector<F>, PlateError> {
        let state = self.state_from_flat(flat)?;
        Ok(self.derivative_of(t, &state)?.to_flat())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;
    use plate_rd_concepts::CalcError;

    fn logistic_plate() -> Plate<f64> {
        let mut plate = Plate::new((1, 2)).unwrap();
        let mut n = Species::new("N", array![[0.5, 0.1]]);
        n.set_behaviour(|_t: f64, s: &Fields<f64>| -> Result<Array2<f64>, CalcError> {
            let n = s.clamped("N")?;
            Ok(&n * &n.mapv(|x| 1.0 - x))
        })
        .unwrap();
        let mut m = Species::new("M", array![[0.0, 0.0]]);
        m.set_behaviour(|t: f64, s: &Fields<f64>| -> Result<Array2<f64>, CalcError> {
            Ok(s.clamped("N")? * t)
        })
        .unwrap();
        plate.add_species(n).unwrap();
        plate.add_species(m).unwrap();
        plate
    }

    #[test]
    fn reject_empty_grid() {
        assert!(Plate::<f64>::new((0, 3)).is_err());
    }

    #[test]
    fn reject_duplicate_and_mismatched_species() {
        let mut plate = logistic_plate();
        assert!(plate
            .add_species(Species::new("N", array![[0.0, 0.0]]))
            .is_err());
        assert!(plate
            .add_species(Species::new("K", array![[0.0], [0.0]]))
            .is_err());
        assert_eq!(plate.species_names(), vec!["N", "M"]);
    }

    #[test]
    fn derivative_reads_frozen_state() {
        let plate = logistic_plate();
        let d = plate.derivative(2.0).unwrap();
        assert_eq!(d.names().collect::<Vec<_>>(), vec!["N", "M"]);
        assert_eq!(d.get("N").unwrap(), &array![[0.25, 0.1 * 0.9]]);
        assert_eq!(d.get("M").unwrap(), &array![[1.0, 0.2]]);
    }

    #[test]
    fn derivative_is_idempotent() {
        let plate = logistic_plate();
        assert_eq!(plate.derivative(1.0).unwrap(), plate.derivative(1.0).unwrap());
    }

    #[test]
    fn set_state_checks_layout() {
        let mut plate = logistic_plate();
        let mut wrong = Fields::new();
        wrong.insert("M", array![[1.0, 1.0]]).unwrap();
        wrong.insert("N", array![[1.0, 1.0]]).unwrap();
        assert!(plate.set_state(wrong).is_err());

        let mut state = plate.state();
        state = &state * 2.0;
        plate.set_state(state.clone()).unwrap();
        assert_eq!(plate.state(), state);
    }

    #[test]
    fn set_state_from_json_checks_layout() {
        let mut plate = logistic_plate();
        let json = r#"{"names":["N","M"],"values":[{"v":1,"dim":[1,2],"data":[0.3,0.4]}]}"#;
        assert!(serde_json::from_str::<Fields<f64>>(json).is_err());

        let mut short = Fields::new();
        short.insert("N", array![[0.3, 0.4]]).unwrap();
        short.insert("M", array![[0.0]]).unwrap();
        assert!(plate.set_state(short).is_err());
        assert_eq!(plate.state().get("N").unwrap(), &array![[0.5, 0.1]]);
    }

    #[test]
    fn flat_derivative_matches_fields() {
        let plate = logistic_plate();
        let flat = plate.state().to_flat();
        assert_eq!(plate.n_values(), flat.len());
        let d_flat = plate.derivative_flat(2.0, &flat).unwrap();
        assert_eq!(d_flat, plate.derivative(2.0).unwrap().to_flat());
    }

    #[test]
    fn unbound_species_fails_evaluation() {
        let mut plate = Plate::new((1, 1)).unwrap();
        plate.add_species(Species::new("N", array![[1.0]])).unwrap();
        assert!(matches!(
            plate.derivative(0.0),
            Err(PlateError::ConfigurationError(_))
        ));
    }
}
