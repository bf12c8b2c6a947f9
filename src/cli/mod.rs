//! CLI Module
//!
//! Command-line interface for inspecting and normalising v.in models.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vin-cli - rayinvr velocity model toolkit
#[derive(Parser, Debug)]
#[command(name = "vin-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarise a model: extent, layers and node counts
    #[command(name = "info")]
    Info {
        /// Path to the v.in file
        path: PathBuf,
    },

    /// Rewrite a model through parse and dump
    #[command(name = "format")]
    Format {
        /// Path to the v.in file
        path: PathBuf,

        /// Collapse fixed single-node parts
        #[arg(long)]
        shrink: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the vertical section at one x position as JSON
    #[command(name = "section")]
    Section {
        /// Path to the v.in file
        path: PathBuf,

        /// Horizontal position (km), clamped into the model extent
        #[arg(short, long, allow_negative_numbers = true)]
        x: f64,

        /// File holding the Poisson ratio string
        #[arg(long)]
        pois: Option<PathBuf>,

        /// Report depths below the top of this layer (0-based)
        #[arg(long)]
        mbsf_layer: Option<usize>,
    },

    /// Compute the velocity grid as JSON
    #[command(name = "contour")]
    Contour {
        /// Path to the v.in file
        path: PathBuf,

        /// Grid columns
        #[arg(long, default_value_t = crate::velocity::NGRIDX)]
        nx: usize,

        /// Grid rows
        #[arg(long, default_value_t = crate::velocity::NGRIDY)]
        ny: usize,

        /// File holding the Poisson ratio string
        #[arg(long)]
        pois: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print velocity node positions on the depth lines as JSON
    #[command(name = "vp-nodes")]
    VpNodes {
        /// Path to the v.in file
        path: PathBuf,
    },
}
