//! Explicit time-stepping schemes which drive a [Plate].
//!
//! The plate only provides the right-hand side of the coupled system.
//! The functions in this module advance the joint state and collect the trajectory.
//! Users who prefer adaptive or implicit solvers can instead use
//! [Plate::derivative_flat] together with an external ODE solver.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use plate_rd_concepts::{PlateError, TimeError, Xapy};

use crate::field::{Fields, Float};
use crate::plate::Plate;
use crate::time::{FixedStepsize, TimeStepper};

/// Time-stepping scheme used by [integrate]
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum Solver {
    /// Classical euler solver. Simple but only first order accurate.
    Euler,
    /// Classical Runge-Kutta method of 4th order.
    #[default]
    RungeKutta4,
    /// Three-step Adams-Bashforth method.
    ///
    /// Reuses the two previous increments and therefore requires only one evaluation of the
    /// plate per step. The first two steps are taken with lower-order Adams-Bashforth methods.
    AdamsBashforth3,
}

/// Settings of a simulation run
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Settings<F> {
    /// Determines step size and save points
    pub time: FixedStepsize<F>,
    /// See [Solver]
    pub solver: Solver,
    /// Display a progress bar while integrating
    pub show_progressbar: bool,
}

/// Stored states together with the time at which they were recorded.
pub type Trajectory<F> = Vec<(F, Fields<F>)>;

/// Single explicit euler step
/// \\begin{equation}
///     u(t+\Delta t) = u(t) + \Delta t \frac{du}{dt}(t)
/// \\end{equation}
pub fn euler_step<F: Float>(
    plate: &Plate<F>,
    state: &Fields<F>,
    t: F,
    dt: F,
) -> Result<Fields<F>, PlateError> {
    let du = plate.derivative_of(t, state)?;
    Ok(du.xapy(dt, state))
}

/// Single step of the classical Runge-Kutta method of 4th order.
pub fn runge_kutta_4th_step<F: Float>(
    plate: &Plate<F>,
    state: &Fields<F>,
    t: F,
    dt: F,
) -> Result<Fields<F>, PlateError> {
    let two = F::one() + F::one();
    let six = two + two + two;

    let du1 = plate.derivative_of(t, state)?;
    let du2 = plate.derivative_of(t + dt / two, &du1.xapy(dt / two, state))?;
    let du3 = plate.derivative_of(t + dt / two, &du2.xapy(dt / two, state))?;
    let du4 = plate.derivative_of(t + dt, &du3.xapy(dt, state))?;
    let du = du1.xapy(
        F::one() / six,
        &du2.xapy(two / six, &du3.xapy(two / six, &(&du4 * (F::one() / six)))),
    );
    Ok(du.xapy(dt, state))
}

/// Adams-Bashforth step given the current increment and up to two previous increments
/// (most recent first).
fn adams_bashforth_step<F: Float>(
    state: &Fields<F>,
    du: &Fields<F>,
    previous: &[Fields<F>],
    dt: F,
) -> Fields<F> {
    let f = |n: i32| <F as num::NumCast>::from(n).unwrap_or_else(F::zero);
    let du = match previous {
        [du1, du2, ..] => du.xapy(
            f(23) / f(12),
            &du1.xapy(-f(16) / f(12), &(du2 * (f(5) / f(12)))),
        ),
        [du1] => du.xapy(f(3) / f(2), &(du1 * (-F::one() / f(2)))),
        [] => du.clone(),
    };
    du.xapy(dt, state)
}

/// Integrates the plate with the given [Settings] and returns all stored states.
///
/// The state of the plate is updated in place and holds the final state afterwards.
#[cfg_attr(feature = "tracing", instrument(skip_all))]
pub fn integrate<F>(plate: &mut Plate<F>, settings: Settings<F>) -> Result<Trajectory<F>, PlateError>
where
    F: Float + num::FromPrimitive,
{
    let Settings {
        mut time,
        solver,
        show_progressbar,
    } = settings;
    let mut trajectory = Vec::new();
    let mut state = plate.state();
    let mut t = time.initial_time();
    if time.save_initial() {
        trajectory.push((t, state.clone()));
    }
    let mut bar = if show_progressbar {
        Some(time.initialize_bar()?)
    } else {
        None
    };
    let mut previous_increments: Vec<Fields<F>> = Vec::with_capacity(2);

    while let Some(next) = time.advance()? {
        let dt = next.increment;
        state = match solver {
            Solver::Euler => euler_step(plate, &state, t, dt)?,
            Solver::RungeKutta4 => runge_kutta_4th_step(plate, &state, t, dt)?,
            Solver::AdamsBashforth3 => {
                let du = plate.derivative_of(t, &state)?;
                let new_state = adams_bashforth_step(&state, &du, &previous_increments, dt);
                previous_increments.insert(0, du);
                previous_increments.truncate(2);
                new_state
            }
        };
        t = next.time;
        if next.save {
            #[cfg(feature = "tracing")]
            tracing::trace!(iteration = next.iteration, "storing state");
            trajectory.push((t, state.clone()));
        }
        if let Some(bar) = bar.as_mut() {
            time.update_bar(bar)
                .map_err(|e| TimeError(format!("could not update progress bar: {e}")))?;
        }
    }
    plate.set_state(state)?;
    Ok(trajectory)
}

/// Runs independent simulations in parallel.
///
/// Plates own their fields so no synchronization between runs is required.
/// The results are returned in the order of the given jobs.
pub fn run_batch<F>(jobs: Vec<(Plate<F>, Settings<F>)>) -> Vec<Result<Trajectory<F>, PlateError>>
where
    F: Float + num::FromPrimitive,
{
    #[cfg(feature = "tracing")]
    tracing::debug!(n_jobs = jobs.len(), "running batch of simulations");
    jobs.into_par_iter()
        .map(|(mut plate, settings)| integrate(&mut plate, settings))
        .collect()
}
