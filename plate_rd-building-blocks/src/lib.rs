#![deny(missing_docs)]
//! Concrete models built on top of [plate_rd_core].
//!
//! # Circuit
//! The [circuit] module contains the reaction rules of an inducer-responsive gene circuit and
//! [make_plate](circuit::make_plate) which assembles them into a
//! [Plate](plate_rd_core::Plate).
//!
//! # Growth
//! Sigmoidal [growth] curves whose derivative drives the biomass of receiver cells.
//!
//! # Parameters
//! Named [parameters] of the circuit together with measured and fitted values.

pub mod circuit;
pub mod growth;
pub mod parameters;

/// Commonly used items
pub mod prelude {
    pub use crate::circuit::*;
    pub use crate::growth::*;
    pub use crate::parameters::*;
    pub use plate_rd_concepts::*;
    pub use plate_rd_core::*;
}
