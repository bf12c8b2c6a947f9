//! vin-cli - rayinvr velocity model toolkit
//!
//! Command-line interface over the vin-core library.

use clap::Parser;
use env_logger::Env;
use log::debug;

use vin_core::cli::{commands, Cli, Commands};
use vin_core::Result;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("vin-cli v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("vin-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        if let Some(hint) = e.recovery_suggestion() {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Info { path } => commands::info(&path),
        Commands::Format {
            path,
            shrink,
            output,
        } => commands::format(&path, shrink, output.as_deref()),
        Commands::Section {
            path,
            x,
            pois,
            mbsf_layer,
        } => commands::section(&path, x, pois.as_deref(), mbsf_layer),
        Commands::Contour {
            path,
            nx,
            ny,
            pois,
            output,
        } => commands::contour(&path, nx, ny, pois.as_deref(), output.as_deref()),
        Commands::VpNodes { path } => commands::vp_nodes(&path),
    }
}
