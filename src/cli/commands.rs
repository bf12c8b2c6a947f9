//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;

use log::info;

use crate::error::{Result, VinError};
use crate::model::Model;
use crate::velocity::{parse_pois_str, ModelProcessor};

/// Print a summary of a model.
pub fn info(path: &Path) -> Result<()> {
    let model = Model::load(path)?;

    println!("Model: {}", path.display());
    println!("Layers: {}", model.nlayer());
    if let (Some(xlim), Some(ylim)) = (model.xlim(), model.ylim()) {
        println!("X range: {:.3} .. {:.3} km", xlim.0, xlim.1);
        println!("Y range: {:.3} .. {:.3} km", ylim.0, ylim.1);
    }
    println!("{:-<60}", "");
    println!(
        "{:>5} {:>8} {:>8} {:>8} {:>10}",
        "layer", "depth", "v_top", "v_bot", "thickness"
    );
    for (i, layer) in model.layers().iter().enumerate() {
        let thickness = model
            .get_thickness(i)
            .map_or_else(|| "-".to_string(), |t| format!("{:.3}", t));
        println!(
            "{:>5} {:>8} {:>8} {:>8} {:>10}",
            i + 1,
            layer.depth().len(),
            layer.v_top().len(),
            layer.v_bottom().len(),
            thickness
        );
    }
    println!("{:-<60}", "");

    Ok(())
}

/// Normalise a model file.
pub fn format(path: &Path, shrink: bool, output: Option<&Path>) -> Result<()> {
    let model = Model::load(path)?;
    match output {
        Some(output) => {
            model.dump_with(output, shrink)?;
            info!("Formatted {} into {}", path.display(), output.display());
        }
        None => print!("{}", model.dumps_with(shrink)),
    }
    Ok(())
}

/// Print the section at `x` as JSON.
pub fn section(
    path: &Path,
    x: f64,
    pois: Option<&Path>,
    mbsf_layer: Option<usize>,
) -> Result<()> {
    let model = Model::load(path)?;
    let mut processor = ModelProcessor::new(&model);
    bind_pois_file(&mut processor, pois)?;

    let x = processor.clamp_section_x(x);
    let mut data = processor.get_section_data(x);
    if let Some(ilayer) = mbsf_layer {
        data = data.flatten_by_layer(ilayer)?;
    }

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Compute the velocity grid and write it as JSON.
pub fn contour(
    path: &Path,
    nx: usize,
    ny: usize,
    pois: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let model = Model::load(path)?;
    let mut processor = ModelProcessor::new(&model);
    processor.set_resolution(nx, ny)?;
    bind_pois_file(&mut processor, pois)?;

    let grid = processor.get_v_contour()?;
    if let Some((vmin, vmax)) = grid.vp_range() {
        info!("Vp range {:.3} .. {:.3} km/s", vmin, vmax);
    }

    let json = serde_json::to_string(grid)?;
    match output {
        Some(output) => {
            fs::write(output, json).map_err(|e| VinError::FileWriteError {
                path: output.to_path_buf(),
                source: e,
            })?;
            println!("Grid written: {}", output.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Print velocity node positions per band as JSON.
pub fn vp_nodes(path: &Path) -> Result<()> {
    let model = Model::load(path)?;
    let processor = ModelProcessor::new(&model);
    let data = processor.get_vp_data();
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn bind_pois_file(processor: &mut ModelProcessor<'_>, pois: Option<&Path>) -> Result<()> {
    let Some(pois_path) = pois else {
        return Ok(());
    };
    let text = fs::read_to_string(pois_path).map_err(|e| VinError::FileReadError {
        path: pois_path.to_path_buf(),
        source: e,
    })?;
    let data = parse_pois_str(&text)?;
    processor.bind_pois(&data)?;
    info!("Bound Poisson ratios from {}", pois_path.display());
    Ok(())
}
