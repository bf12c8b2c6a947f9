//! Poisson ratio data
//!
//! The ratios come from the companion ray-tracing input (`r.in`) and are
//! pasted as either a single line
//!
//! ```text
//! pois=0.45,0.25,0.25,
//! ```
//!
//! or four lines adding block-level overrides:
//!
//! ```text
//! pois=0.45,0.25,
//! poisl=2,2,
//! poisb=1,3,
//! poisbl=0.30,0.28,
//! ```
//!
//! `poisl` is the 1-based layer, `poisb` the 1-based block within that layer
//! counted left to right, and `poisbl` the ratio that replaces the layer's
//! base value inside that block.

use log::warn;
use serde::{Deserialize, Serialize};

use super::interp::interp1d;
use crate::error::{Result, VinError};

/// Ratio of exactly 0.5 makes Vs undefined; it is nudged below
pub const POIS_HALF_REPLACEMENT: f64 = 0.49999;

/// Poisson ratio table parsed from an override string
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoisData {
    /// Base ratio per layer
    pub pois: Vec<f64>,
    /// 1-based layer of each override
    #[serde(default)]
    pub poisl: Vec<usize>,
    /// 1-based block of each override
    #[serde(default)]
    pub poisb: Vec<usize>,
    /// Override ratio
    #[serde(default)]
    pub poisbl: Vec<f64>,
}

impl PoisData {
    /// Uniform base ratios without overrides
    pub fn uniform(pois: Vec<f64>) -> Self {
        Self {
            pois,
            ..Default::default()
        }
    }

    /// Number of block-level overrides
    pub fn override_count(&self) -> usize {
        self.poisl.len()
    }
}

/// Parse a Poisson ratio string.
///
/// # Errors
/// Returns `InvalidPois` unless the text is exactly one `pois=` line or the
/// four `pois=`, `poisl=`, `poisb=`, `poisbl=` lines in that order, with the
/// three override arrays of equal length.
pub fn parse_pois_str(text: &str) -> Result<PoisData> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let data = match lines.as_slice() {
        [pois] => PoisData::uniform(parse_floats(pois, "pois")?),
        [pois, poisl, poisb, poisbl] => PoisData {
            pois: parse_floats(pois, "pois")?,
            poisl: parse_indices(poisl, "poisl")?,
            poisb: parse_indices(poisb, "poisb")?,
            poisbl: parse_floats(poisbl, "poisbl")?,
        },
        _ => {
            return Err(VinError::InvalidPois {
                reason: format!("expected 1 or 4 lines, got {}", lines.len()),
            })
        }
    };

    if data.pois.is_empty() {
        return Err(VinError::InvalidPois {
            reason: "pois must contain at least one value".to_string(),
        });
    }
    if data.poisb.len() != data.poisl.len() || data.poisbl.len() != data.poisl.len() {
        return Err(VinError::InvalidPois {
            reason: format!(
                "poisl, poisb and poisbl must have the same length, got {}, {} and {}",
                data.poisl.len(),
                data.poisb.len(),
                data.poisbl.len()
            ),
        });
    }
    Ok(data)
}

/// Split `key=v1,v2,...,` into its value fields
fn values<'a>(line: &'a str, key: &str) -> Result<impl Iterator<Item = &'a str>> {
    let (name, rest) = line.split_once('=').ok_or_else(|| VinError::InvalidPois {
        reason: format!("expected '{}=...', got '{}'", key, line),
    })?;
    if name.trim() != key {
        return Err(VinError::InvalidPois {
            reason: format!("expected key '{}', got '{}'", key, name.trim()),
        });
    }
    Ok(rest.split(',').map(str::trim).filter(|v| !v.is_empty()))
}

fn parse_floats(line: &str, key: &str) -> Result<Vec<f64>> {
    values(line, key)?
        .map(|v| {
            v.parse::<f64>().map_err(|_| VinError::InvalidPois {
                reason: format!("{}: expected a number, got '{}'", key, v),
            })
        })
        .collect()
}

fn parse_indices(line: &str, key: &str) -> Result<Vec<usize>> {
    values(line, key)?
        .map(|v| {
            v.parse::<usize>().map_err(|_| VinError::InvalidPois {
                reason: format!("{}: expected a positive integer, got '{}'", key, v),
            })
        })
        .collect()
}

/// Replace a ratio of exactly 0.5
pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio == 0.5 {
        POIS_HALF_REPLACEMENT
    } else {
        ratio
    }
}

/// Poisson ratio of one band as a step function of x
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPois {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl LayerPois {
    /// Build the step function over the band's block partition `x_all`.
    ///
    /// `overrides` holds `(block, ratio)` pairs with 0-based block indices.
    /// Blocks beyond the partition are skipped with a warning.
    pub fn build(x_all: &[f64], base: f64, overrides: &[(usize, f64)]) -> Self {
        let nblock = x_all.len().saturating_sub(1);
        let (first, last) = match (x_all.first(), x_all.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                return Self {
                    x: Vec::new(),
                    y: Vec::new(),
                }
            }
        };

        for &(iblk, _) in overrides.iter().filter(|(iblk, _)| *iblk >= nblock) {
            warn!(
                "Poisson override for block {} ignored, band has {} blocks",
                iblk + 1,
                nblock
            );
        }
        if overrides.iter().all(|(iblk, _)| *iblk >= nblock) {
            return Self {
                x: vec![first, last],
                y: vec![base, base],
            };
        }

        let mut x = Vec::with_capacity(2 * nblock);
        let mut y = Vec::with_capacity(2 * nblock);
        for iblk in 0..nblock {
            let ratio = overrides
                .iter()
                .rev()
                .find(|(b, _)| *b == iblk)
                .map_or(base, |&(_, ratio)| ratio);
            x.extend([x_all[iblk], x_all[iblk + 1]]);
            y.extend([ratio, ratio]);
        }
        Self { x, y }
    }

    /// Ratio at horizontal position `x`
    pub fn at(&self, x: f64) -> f64 {
        interp1d(x, &self.x, &self.y)
    }
}
