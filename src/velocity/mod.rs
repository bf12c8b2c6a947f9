//! Velocity Module
//!
//! Interpolation engine turning a sparse layered model into velocity
//! polylines, vertical sections and dense Vp/Vs grids.

mod grid;
mod interp;
mod pois;
mod processor;
mod section;

pub use grid::VelocityGrid;
pub use interp::{interp1d, interp_block, interp_many, linspace, merge_breakpoints};
pub use pois::{clamp_ratio, parse_pois_str, LayerPois, PoisData, POIS_HALF_REPLACEMENT};
pub use processor::{ModelProcessor, NGRIDX, NGRIDY};
pub use section::{BandVelocityNodes, Polyline, SectionData};
