//! Vertical sections and velocity node overlays

use serde::{Deserialize, Serialize};

use crate::error::{Result, VinError};

/// One vertical profile through the model.
///
/// Every band contributes two entries: its top boundary then its bottom
/// boundary, so `depth[2 * i]` is the top of band `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionData {
    pub x: f64,
    pub depth: Vec<f64>,
    pub vp: Vec<f64>,
    pub vs: Option<Vec<f64>>,
    pub pois: Option<Vec<f64>>,
}

impl SectionData {
    /// Number of bands in the profile
    pub fn nband(&self) -> usize {
        self.depth.len() / 2
    }

    /// Depths re-expressed below the top boundary of band `ilayer` (mbsf)
    pub fn flatten_by_layer(&self, ilayer: usize) -> Result<SectionData> {
        let reference = *self
            .depth
            .get(2 * ilayer)
            .ok_or(VinError::LayerOutOfRange {
                ilayer,
                nlayer: self.nband(),
            })?;
        Ok(SectionData {
            depth: self.depth.iter().map(|d| d - reference).collect(),
            ..self.clone()
        })
    }
}

/// Sampled `(x, y)` polyline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Velocity nodes of one band drawn on its depth boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandVelocityNodes {
    /// Top velocity node positions on the band's top boundary
    pub top: Polyline,
    /// Bottom velocity node positions on the band's bottom boundary
    pub bottom: Polyline,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn section() -> SectionData {
        SectionData {
            x: 5.0,
            depth: vec![0.0, 1.5, 1.5, 4.0],
            vp: vec![1.5, 1.5, 2.0, 3.0],
            vs: None,
            pois: None,
        }
    }

    #[test]
    fn test_flatten_by_layer() {
        let flat = section().flatten_by_layer(1).unwrap();
        assert_eq!(flat.nband(), 2);
        assert_relative_eq!(flat.depth[0], -1.5);
        assert_relative_eq!(flat.depth[2], 0.0);
        assert_relative_eq!(flat.depth[3], 2.5);
        assert_eq!(flat.vp, section().vp);
    }

    #[test]
    fn test_flatten_out_of_range() {
        assert!(matches!(
            section().flatten_by_layer(2),
            Err(VinError::LayerOutOfRange { ilayer: 2, nlayer: 2 })
        ));
    }
}
