#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
//! [plate_rd](crate) simulates the spatio-temporal response of engineered receiver cells to a
//! diffusing inducer on an agar plate.
//!
//! Every chemical or biological quantity is a dense field on a rectangular grid.
//! A [Plate](core::Plate) couples these fields through their reaction rules and provides the
//! time derivative of the joint state, which is then integrated by the
//! [solvers](core::solvers).
//!
//! ```
//! use plate_rd::prelude::*;
//!
//! let setup = PlateSetup::new(vec![[2, 2]], vec![[0, 0]], 5.0, (5, 5), 4.5)
//!     .with_flags(true, true, false);
//! let (params, curve) = fitted_parameters(setup.topology);
//! let mut plate = make_plate(&setup, &params, UniformGrowth::new(curve))?;
//! let settings = Settings {
//!     time: FixedStepsize::from_save_freq(0.0, 0.5, 10.0, 10)?,
//!     solver: Solver::RungeKutta4,
//!     show_progressbar: false,
//! };
//! let trajectory = integrate(&mut plate, settings)?;
//! assert_eq!(trajectory.len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use plate_rd_building_blocks as building_blocks;

pub use plate_rd_concepts as concepts;

pub use plate_rd_core as core;

/// Re-exports the default simulation types and traits.
pub mod prelude;
