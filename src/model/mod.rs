//! Velocity Model Module
//!
//! In-memory representation of a rayinvr `v.in` file:
//! - TripleLine: x / value / flag arrays of one boundary or velocity line
//! - Layer: depth, top velocity and bottom velocity of one unit
//! - Model: the ordered layers plus the terminal lines
//! - NodeIndex: `(ilayer, ipart, inode)` address used by editing operations

mod layer;
mod node_index;
mod triple_line;
mod vmodel;

pub use layer::{Layer, Part};
pub use node_index::NodeIndex;
pub use triple_line::{Node, TripleLine, DEFAULT_INSERT_STEP, MAX_NODES_PER_ROW};
pub use vmodel::{Model, SINGLE_LAYER_THICKNESS};
