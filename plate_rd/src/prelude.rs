pub use plate_rd_building_blocks::circuit::*;
pub use plate_rd_building_blocks::growth::*;
pub use plate_rd_building_blocks::parameters::*;
pub use plate_rd_concepts::*;

pub use plate_rd_core::solvers::*;
pub use plate_rd_core::time::*;
pub use plate_rd_core::*;
