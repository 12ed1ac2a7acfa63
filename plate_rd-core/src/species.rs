use std::sync::Arc;

use ndarray::Array2;

use plate_rd_concepts::{Behaviour, CalcError, ConfigurationError, PlateError};

use crate::field::{Fields, Float};

/// Shared reaction rule of a [Species].
pub type SharedBehaviour<F> = Arc<dyn Behaviour<F, Fields<F>, Array2<F>> + Send + Sync>;

/// A named scalar field on the grid of a [Plate](crate::Plate) together with its reaction rule.
///
/// The species only holds its current value.
/// Its state is replaced by the integrator between steps while the rule is bound exactly once
/// during assembly.
#[derive(Clone)]
pub struct Species<F> {
    name: String,
    state: Array2<F>,
    behaviour: Option<SharedBehaviour<F>>,
}

impl<F: core::fmt::Debug> core::fmt::Debug for Species<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Species")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("behaviour_bound", &self.behaviour.is_some())
            .finish()
    }
}

impl<F: Float> Species<F> {
    /// Creates a new species with the given initial field and no behaviour.
    pub fn new(name: impl Into<String>, initial: Array2<F>) -> Self {
        Self {
            name: name.into(),
            state: initial,
            behaviour: None,
        }
    }

    /// Binds the reaction rule of this species. Can only be done once.
    pub fn set_behaviour<B>(&mut self, behaviour: B) -> Result<(), ConfigurationError>
    where
        B: Behaviour<F, Fields<F>, Array2<F>> + Send + Sync + 'static,
    {
        if self.behaviour.is_some() {
            return Err(ConfigurationError(format!(
                "behaviour of species {} was already set",
                self.name
            )));
        }
        self.behaviour = Some(Arc::new(behaviour));
        Ok(())
    }

    /// Name of the species
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current field
    pub fn state(&self) -> &Array2<F> {
        &self.state
    }

    /// Shape of the field `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        self.state.dim()
    }

    /// Checks if a reaction rule was bound
    pub fn has_behaviour(&self) -> bool {
        self.behaviour.is_some()
    }

    pub(crate) fn set_state(&mut self, state: Array2<F>) {
        self.state = state;
    }

    /// Evaluates the bound reaction rule on the given snapshot.
    pub fn evaluate(&self, t: F, snapshot: &Fields<F>) -> Result<Array2<F>, PlateError> {
        let behaviour = self.behaviour.as_ref().ok_or(ConfigurationError(format!(
            "species {} was evaluated before a behaviour was set",
            self.name
        )))?;
        let increment = behaviour.calculate_increment(t, snapshot)?;
        if increment.dim() != self.state.dim() {
            return Err(CalcError(format!(
                "behaviour of species {} returned field of shape {:?} instead of {:?}",
                self.name,
                increment.dim(),
                self.state.dim()
            ))
            .into());
        }
        Ok(increment)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    fn decay(_t: f64, state: &Fields<f64>) -> Result<Array2<f64>, CalcError> {
        Ok(state.get("N")? * -0.5)
    }

    #[test]
    fn evaluate_delegates_to_behaviour() {
        let mut species = Species::new("N", array![[2.0, 4.0]]);
        species.set_behaviour(decay).unwrap();
        let mut snapshot = Fields::new();
        snapshot.insert("N", species.state().clone()).unwrap();
        assert_eq!(
            species.evaluate(0.0, &snapshot).unwrap(),
            array![[-1.0, -2.0]]
        );
    }

    #[test]
    fn unbound_behaviour_is_configuration_error() {
        let species = Species::new("N", array![[2.0]]);
        let res = species.evaluate(0.0, &Fields::new());
        assert!(matches!(res, Err(PlateError::ConfigurationError(_))));
    }

    #[test]
    fn behaviour_can_only_be_bound_once() {
        let mut species = Species::new("N", array![[2.0]]);
        species.set_behaviour(decay).unwrap();
        assert!(species.set_behaviour(decay).is_err());
    }

    #[test]
    fn wrong_increment_shape_is_calc_error() {
        let mut species = Species::new("N", array![[2.0]]);
        species
            .set_behaviour(|_t: f64, _s: &Fields<f64>| Ok::<_, CalcError>(Array2::zeros((2, 2))))
            .unwrap();
        let res = species.evaluate(0.0, &Fields::new());
        assert!(matches!(res, Err(PlateError::CalcError(_))));
    }
}
