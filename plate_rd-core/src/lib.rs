#![deny(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
//! This crate collects the objects needed to define and integrate a coupled
//! reaction-diffusion system on a 2D grid.
//!
//! ## Fields
//! Every species is represented by a dense [ndarray::Array2] over the grid.
//! The [field] module provides the discrete [laplacian] with [Boundary] handling and
//! read-time clamping of negative concentrations.
//!
//! ## Plate
//! A [Plate] is an ordered collection of [Species] which share one grid.
//! It only provides the right-hand side of the system.
//!
//! ## Time stepping
//! The [time] and [solvers] modules advance the joint state with fixed step sizes.
//! Alternatively [Plate::derivative_flat] can be handed to any external ODE solver.

pub mod field;
mod plate;
pub mod solvers;
mod species;
pub mod time;

pub use field::{clamp_non_negative, laplacian, Boundary, Fields, Float};
pub use plate::*;
pub use species::*;

#[doc(hidden)]
pub use rayon;

#[cfg(feature = "tracing")]
#[doc(hidden)]
pub use tracing;
