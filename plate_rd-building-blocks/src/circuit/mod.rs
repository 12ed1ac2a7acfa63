//! Inducer-responsive gene circuit expressed in receiver cells on an agar plate.
//!
//! An inducer (`A`) diffuses from source wells through the agar.
//! Receiver cells (`X`) grow only at their own grid points and express the polymerase `T7`
//! in response to the local inducer concentration.
//! `T7` activates the fluorescent reporter `G`.
//! In the [Topology::Bandpass] circuit a repressor `R` is induced as well and represses `G`
//! at high inducer concentrations.
//!
//! Use [make_plate] to assemble the corresponding [Plate](plate_rd_core::Plate).

mod assembly;
mod rules;

pub use assembly::*;
pub use rules::*;

use serde::{Deserialize, Serialize};

/// Name of the biomass field
pub const BIOMASS: &str = "X";
/// Name of the inducer field
pub const INDUCER: &str = "A";
/// Name of the polymerase field
pub const POLYMERASE: &str = "T7";
/// Name of the reporter field
pub const REPORTER: &str = "G";
/// Name of the repressor field
pub const REPRESSOR: &str = "R";

/// Wiring of the circuit
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum Topology {
    /// Reporter is expressed once the inducer exceeds a threshold
    #[default]
    Threshold,
    /// Reporter is expressed only in a band of intermediate inducer concentrations
    Bandpass,
}

impl Topology {
    /// `true` selects [Topology::Bandpass]
    pub fn from_bandpass_flag(bandpass: bool) -> Self {
        if bandpass {
            Topology::Bandpass
        } else {
            Topology::Threshold
        }
    }

    /// Names of the species present on a plate with this topology in registration order
    pub fn species_names(&self) -> &'static [&'static str] {
        match self {
            Topology::Threshold => &[BIOMASS, INDUCER, POLYMERASE, REPORTER],
            Topology::Bandpass => &[BIOMASS, INDUCER, POLYMERASE, REPORTER, REPRESSOR],
        }
    }
}
