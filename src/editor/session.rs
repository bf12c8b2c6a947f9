//! EditSession - one open model with its selection
//!
//! The session owns the model, remembers the text it was opened or last
//! saved with, and applies batch edits to the selected nodes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::settings::EditSettings;
use crate::error::{Result, VinError};
use crate::model::{Model, NodeIndex};
use crate::velocity::ModelProcessor;

/// Direction of a keyboard move. Up is towards smaller depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Outcome of an edit applied to several nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: Vec<NodeIndex>,
    pub failed: Vec<(NodeIndex, String)>,
}

impl BatchReport {
    /// True when no node failed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, idx: NodeIndex, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.succeeded.push(idx),
            Err(e) => {
                warn!("Edit of node {} failed: {}", idx, e);
                self.failed.push((idx, e.to_string()));
            }
        }
    }
}

/// An open v.in model
#[derive(Debug)]
pub struct EditSession {
    path: Option<PathBuf>,
    model: Model,
    snapshot: String,
    selected: BTreeSet<NodeIndex>,
    settings: EditSettings,
}

impl EditSession {
    /// Open a v.in file
    pub fn open(path: &Path, settings: EditSettings) -> Result<Self> {
        let model = Model::load(path)?;
        let mut session = Self::from_model(model, settings);
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    /// Start a session on an in-memory model with no file behind it
    pub fn from_model(model: Model, settings: EditSettings) -> Self {
        Self {
            path: None,
            snapshot: model.dumps(),
            model,
            selected: BTreeSet::new(),
            settings,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn settings(&self) -> &EditSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut EditSettings {
        &mut self.settings
    }

    fn bound_path(&self) -> Result<PathBuf> {
        self.path
            .clone()
            .ok_or_else(|| VinError::invariant("the session is not bound to a file"))
    }

    /// Re-read the bound file, dropping unsaved edits and the selection
    pub fn reload(&mut self) -> Result<()> {
        let path = self.bound_path()?;
        self.model = Model::load(&path)?;
        self.snapshot = self.model.dumps();
        self.selected.clear();
        Ok(())
    }

    /// Write the model back to its file
    pub fn save(&mut self) -> Result<()> {
        let path = self.bound_path()?;
        self.write(&path)
    }

    /// Write the model to `path` and bind the session to it
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.write(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write(&mut self, path: &Path) -> Result<()> {
        self.model.dump_with(path, self.settings.shrink_on_save)?;
        self.snapshot = self.model.dumps();
        Ok(())
    }

    /// True if the model differs from what was last opened or saved
    pub fn is_modified(&self) -> bool {
        self.model.dumps() != self.snapshot
    }

    /// Processor over the current model, configured from the settings
    pub fn processor(&self) -> Result<ModelProcessor<'_>> {
        let mut processor = ModelProcessor::new(&self.model);
        processor.set_resolution(self.settings.grid_nx, self.settings.grid_ny)?;
        if let Some(pois) = self.settings.pois_data()? {
            processor.bind_pois(&pois)?;
        }
        Ok(processor)
    }

    // Selection

    pub fn selected(&self) -> &BTreeSet<NodeIndex> {
        &self.selected
    }

    pub fn select(&mut self, idx: NodeIndex) {
        self.selected.insert(idx);
    }

    pub fn deselect(&mut self, idx: NodeIndex) -> bool {
        self.selected.remove(&idx)
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Pick on the depth line of layer `ilayer` at `(x, y)`.
    ///
    /// The nearest node is picked when it lies within the pick tolerance,
    /// otherwise every node of the line. With `accumulate`, the pick is added
    /// to the selection, or removed when all of it was already selected.
    pub fn pick(&mut self, ilayer: usize, x: f64, y: f64, accumulate: bool) -> Result<()> {
        let depth = self
            .model
            .get_layer(ilayer)
            .ok_or(VinError::LayerOutOfRange {
                ilayer,
                nlayer: self.model.nlayer(),
            })?
            .depth();

        let nearest = depth
            .nodes()
            .enumerate()
            .map(|(i, node)| (i, (x - node.x).hypot(y - node.y)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let picked: BTreeSet<NodeIndex> = match nearest {
            Some((inode, dist)) if dist <= self.settings.pick_tolerance => {
                BTreeSet::from([NodeIndex::new(ilayer, 0, inode)])
            }
            _ => (0..depth.len())
                .map(|inode| NodeIndex::new(ilayer, 0, inode))
                .collect(),
        };

        if !accumulate {
            self.selected.clear();
        }
        if accumulate && self.selected.is_superset(&picked) {
            self.selected.retain(|idx| !picked.contains(idx));
        } else {
            self.selected.extend(picked);
        }
        Ok(())
    }

    /// Step every selected node to the next node in traversal order
    pub fn select_next(&mut self, accumulate: bool) {
        let stepped = self
            .selected
            .iter()
            .map(|idx| idx.next(&self.model).unwrap_or(*idx))
            .collect();
        self.apply_step(stepped, accumulate);
    }

    /// Step every selected node to the previous node in traversal order
    pub fn select_previous(&mut self, accumulate: bool) {
        let stepped = self
            .selected
            .iter()
            .map(|idx| idx.previous(&self.model).unwrap_or(*idx))
            .collect();
        self.apply_step(stepped, accumulate);
    }

    /// An empty selection starts at the first node, if the model has one
    fn apply_step(&mut self, stepped: Vec<NodeIndex>, accumulate: bool) {
        if self.selected.is_empty() {
            let first = NodeIndex::default();
            if self.model.get_node(first).is_some() {
                self.selected.insert(first);
            }
            return;
        }
        if !accumulate {
            self.selected.clear();
        }
        self.selected.extend(stepped);
    }

    // Batch edits

    /// Move every selected node one step
    pub fn move_selected(&mut self, direction: Direction, large: bool) -> BatchReport {
        let (dx, dy) = match direction {
            Direction::Left => (-self.settings.dx(large), 0.0),
            Direction::Right => (self.settings.dx(large), 0.0),
            Direction::Up => (0.0, -self.settings.dy(large)),
            Direction::Down => (0.0, self.settings.dy(large)),
        };
        let mut report = BatchReport::default();
        for &idx in &self.selected {
            let outcome = self.model.move_node(idx, dx, dy).map(|_| ());
            report.record(idx, outcome);
        }
        report
    }

    /// Reject selections with two nodes in one layer
    fn check_one_per_layer(&self) -> Result<()> {
        let mut seen: BTreeMap<usize, NodeIndex> = BTreeMap::new();
        for &idx in &self.selected {
            if let Some(first) = seen.insert(idx.ilayer, idx) {
                return Err(VinError::BatchConflict {
                    ilayer: idx.ilayer,
                    first: first.to_string(),
                    second: idx.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Insert a node right of every selected node
    pub fn insert_nodes(&mut self) -> Result<BatchReport> {
        self.check_one_per_layer()?;
        let mut report = BatchReport::default();
        for &idx in &self.selected {
            let outcome = self.model.insert_node(idx, None).map(|_| ());
            report.record(idx, outcome);
        }
        self.selected.clear();
        debug!("Inserted {} nodes", report.succeeded.len());
        Ok(report)
    }

    /// Delete every selected node, deepest layer first
    pub fn delete_nodes(&mut self) -> Result<BatchReport> {
        self.check_one_per_layer()?;
        let mut report = BatchReport::default();
        for &idx in self.selected.iter().rev() {
            let outcome = self.model.delete_node(idx).map(|_| ());
            report.record(idx, outcome);
        }
        self.selected.clear();
        debug!("Deleted {} nodes", report.succeeded.len());
        Ok(report)
    }

    /// Insert a layer beneath the single selected layer; returns its index
    pub fn insert_layer(&mut self) -> Result<usize> {
        let layers = self.selected_layers();
        let ilayer = match layers.as_slice() {
            [ilayer] => *ilayer,
            [] => {
                return Err(VinError::InvalidSelection {
                    reason: "select a node of the layer to insert beneath".to_string(),
                })
            }
            _ => {
                return Err(VinError::InvalidSelection {
                    reason: format!(
                        "select nodes of one layer only, {} layers selected",
                        layers.len()
                    ),
                })
            }
        };
        self.model.insert_layer(ilayer)?;
        self.selected.clear();
        info!("Inserted layer {} beneath layer {}", ilayer + 2, ilayer + 1);
        Ok(ilayer + 1)
    }

    /// Delete every layer touched by the selection; returns how many went
    pub fn delete_layers(&mut self) -> Result<usize> {
        let layers = self.selected_layers();
        let nlayer = self.model.nlayer();
        if let Some(&ilayer) = layers.iter().find(|&&ilayer| ilayer >= nlayer) {
            return Err(VinError::LayerOutOfRange { ilayer, nlayer });
        }
        for &ilayer in layers.iter().rev() {
            self.model.delete_layer(ilayer)?;
        }
        self.selected.clear();
        info!("Deleted {} layers", layers.len());
        Ok(layers.len())
    }

    /// Distinct layers of the selection in ascending order
    fn selected_layers(&self) -> Vec<usize> {
        let layers: BTreeSet<usize> = self.selected.iter().map(|idx| idx.ilayer).collect();
        layers.into_iter().collect()
    }
}
