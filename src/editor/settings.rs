//! Editor settings
//!
//! Step sizes, pick tolerance, grid resolution and the Poisson ratio string,
//! persisted as pretty JSON.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VinError};
use crate::velocity::{parse_pois_str, PoisData, NGRIDX, NGRIDY};

/// Settings consumed by an [`EditSession`](super::EditSession)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSettings {
    /// Small horizontal step (km)
    pub dx_small: f64,
    /// Large horizontal step (km)
    pub dx_large: f64,
    /// Small vertical step
    pub dy_small: f64,
    /// Large vertical step
    pub dy_large: f64,
    /// Clicks closer than this to a node pick the node, else the whole line
    pub pick_tolerance: f64,
    pub grid_nx: usize,
    pub grid_ny: usize,
    /// Collapse fixed single-node parts when saving
    pub shrink_on_save: bool,
    /// Poisson ratio string, empty when unused
    pub pois: String,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            dx_small: 0.01,
            dx_large: 0.1,
            dy_small: 0.001,
            dy_large: 0.01,
            pick_tolerance: 0.15,
            grid_nx: NGRIDX,
            grid_ny: NGRIDY,
            shrink_on_save: false,
            pois: String::new(),
        }
    }
}

impl EditSettings {
    /// Load settings, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| VinError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: EditSettings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| VinError::FileWriteError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| VinError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Horizontal step for a move
    pub fn dx(&self, large: bool) -> f64 {
        if large {
            self.dx_large
        } else {
            self.dx_small
        }
    }

    /// Vertical step for a move
    pub fn dy(&self, large: bool) -> f64 {
        if large {
            self.dy_large
        } else {
            self.dy_small
        }
    }

    /// Parsed Poisson ratios, `None` when the string is blank
    pub fn pois_data(&self) -> Result<Option<PoisData>> {
        if self.pois.trim().is_empty() {
            return Ok(None);
        }
        parse_pois_str(&self.pois).map(Some)
    }
}
