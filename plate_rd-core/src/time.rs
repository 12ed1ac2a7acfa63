//! Controls how the simulation time is advanced

use kdam::BarExt;
use serde::{Deserialize, Serialize};

use plate_rd_concepts::TimeError;

/// Represents the next time point which is returned by the [TimeStepper::advance] method.
#[derive(Clone, Debug, PartialEq)]
pub struct NextTimePoint<F> {
    /// Time increment $dt$
    pub increment: F,
    /// Time value $t$ after this step was taken
    pub time: F,
    /// Current iteration
    pub iteration: usize,
    /// The state reached after this step should be stored
    pub save: bool,
}

/// Increments time of the simulation
pub trait TimeStepper<F> {
    /// Advances the time stepper to the next time point.
    /// Returns [None] once the final time point was reached.
    #[must_use]
    fn advance(&mut self) -> Result<Option<NextTimePoint<F>>, TimeError>;

    /// Initial time point of the simulation
    fn initial_time(&self) -> F;

    /// Checks if the initial state should be stored
    fn save_initial(&self) -> bool;

    /// Creates a bar that tracks the simulation progress
    fn initialize_bar(&self) -> Result<kdam::Bar, TimeError>;

    /// Update a given bar to show the current simulation state
    fn update_bar(&self, bar: &mut kdam::Bar) -> Result<(), std::io::Error>;
}

/// Time stepping with a fixed time length
///
/// ```
/// # use plate_rd_core::time::FixedStepsize;
/// let t0 = 0.0;
/// let dt = 0.5;
/// let save_points = vec![60.0, 120.0, 600.0];
/// let time_stepper = FixedStepsize::from_save_points(t0, dt, save_points).unwrap();
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FixedStepsize<F> {
    dt: F,
    t0: F,
    // Iterations after which the state is stored
    save_iterations: Vec<usize>,
    current_iteration: usize,
    maximum_iterations: usize,
}

impl<F> FixedStepsize<F>
where
    F: num::Float + num::FromPrimitive,
{
    /// Construct the stepper from an initial time point, the time increment and
    /// the time points at which the simulation should be saved.
    pub fn from_save_points(t0: F, dt: F, save_points: Vec<F>) -> Result<Self, TimeError> {
        if !(dt > F::zero()) {
            return Err(TimeError("Time increment needs to be positive".to_owned()));
        }
        if save_points.iter().any(|x| t0 > *x || !x.is_finite()) {
            return Err(TimeError(
                "Invalid time configuration! Save point is before starting time point."
                    .to_owned(),
            ));
        }
        let mut save_iterations = save_points
            .into_iter()
            .map(|t_save| {
                ((t_save - t0) / dt).round().to_usize().ok_or(TimeError(
                    "An error in casting of float type to usize occurred".to_owned(),
                ))
            })
            .collect::<Result<Vec<_>, TimeError>>()?;
        save_iterations.sort();
        save_iterations.dedup();
        let maximum_iterations = *save_iterations.last().ok_or(TimeError(
            "No savepoints specified. Simulation will not save any results.".to_owned(),
        ))?;
        Ok(Self {
            dt,
            t0,
            save_iterations,
            current_iteration: 0,
            maximum_iterations,
        })
    }

    /// Integrates from `t0` to `t_max` and saves every `save_freq` iterations.
    /// The initial and the final state are always stored.
    pub fn from_save_freq(t0: F, dt: F, t_max: F, save_freq: usize) -> Result<Self, TimeError> {
        if !(dt > F::zero()) || t_max < t0 {
            return Err(TimeError(format!(
                "Cannot step from t0={:?} to t_max={:?} with dt={:?}",
                t0.to_f64(),
                t_max.to_f64(),
                dt.to_f64()
            )));
        }
        let max_iterations = ((t_max - t0) / dt)
            .round()
            .to_usize()
            .ok_or(TimeError("Could not round value to usize".to_owned()))?;
        let mut save_iterations: Vec<_> = (0..max_iterations).step_by(save_freq.max(1)).collect();
        save_iterations.push(max_iterations);
        save_iterations.dedup();
        Ok(Self {
            dt,
            t0,
            save_iterations,
            current_iteration: 0,
            maximum_iterations: max_iterations,
        })
    }

    /// Total number of steps which will be taken
    pub fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }
}

impl<F> TimeStepper<F> for FixedStepsize<F>
where
    F: num::Float + num::FromPrimitive,
{
    fn advance(&mut self) -> Result<Option<NextTimePoint<F>>, TimeError> {
        if self.current_iteration >= self.maximum_iterations {
            return Ok(None);
        }
        self.current_iteration += 1;
        // Multiplying instead of summing increments avoids accumulating rounding errors
        let time = F::from_usize(self.current_iteration).ok_or(TimeError(
            "Error when casting from usize to floating point value".to_owned(),
        ))? * self.dt
            + self.t0;
        Ok(Some(NextTimePoint {
            increment: self.dt,
            time,
            iteration: self.current_iteration,
            save: self
                .save_iterations
                .binary_search(&self.current_iteration)
                .is_ok(),
        }))
    }

    fn initial_time(&self) -> F {
        self.t0
    }

    fn save_initial(&self) -> bool {
        self.save_iterations.first() == Some(&0)
    }

    fn initialize_bar(&self) -> Result<kdam::Bar, TimeError> {
        let bar_format = "\
        {desc}{percentage:3.0}%|{animation}| \
        {count}/{total} \
        [{elapsed}, \
        {rate:.2}{unit}/s{postfix}]";
        Ok(kdam::BarBuilder::default()
            .total(self.maximum_iterations)
            .bar_format(bar_format)
            .dynamic_ncols(true)
            .build()?)
    }

    fn update_bar(&self, bar: &mut kdam::Bar) -> Result<(), std::io::Error> {
        let _ = bar.update(1)?;
        Ok(())
    }
}
