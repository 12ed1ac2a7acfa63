#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
//! This crate encapsulates the concepts which govern a reaction-diffusion model specified by
//! [plate_rd](https://docs.rs/plate_rd).
//! Every species on a plate is driven by a [Behaviour] which reads an immutable snapshot of all
//! fields and returns the increment of its own field.
//! Growth of the biomass enters the model through an injected [GrowthRate].

mod errors;
mod reactions;

pub use errors::*;
pub use reactions::*;
