//! vin-core - rayinvr velocity model toolkit
//!
//! Reads, edits and writes rayinvr `v.in` velocity models and turns them into
//! velocity sections and grids.
//!
//! # Architecture
//!
//! - `model`: the layered document and its text format
//! - `velocity`: block-wise interpolation of velocities and Poisson ratios
//! - `editor`: selection and batch edits over an open model
//! - `cli`: command-line front end

pub mod cli;
pub mod editor;
pub mod error;
pub mod model;
pub mod velocity;

pub use error::{Result, VinError};
pub use model::{Layer, Model, Node, NodeIndex, Part, TripleLine};
pub use velocity::{ModelProcessor, PoisData, SectionData, VelocityGrid};
