//! Model - the whole v.in document
//!
//! A model is an ordered list of layers (index 0 is the shallowest) followed
//! by two terminal lines that close the file. The terminal lines are kept
//! verbatim; only their leading layer number is rewritten on dump so that it
//! always reads `nlayer + 1`.

use std::fs;
use std::path::Path;

use log::{debug, info};

use super::layer::{Layer, Part};
use super::node_index::NodeIndex;
use super::triple_line::{block_lines, parse_stamp, Node, TripleLine};
use crate::error::{Result, VinError};

/// Thickness reported for a model with a single layer
pub const SINGLE_LAYER_THICKNESS: f64 = 0.1;

/// Horizontal moves smaller than this are treated as vertical-only
const HORIZONTAL_MOVE_EPS: f64 = 1e-6;

/// A layered velocity model, one per v.in file
#[derive(Debug, Clone)]
pub struct Model {
    layers: Vec<Layer>,
    end_layer: String,
}

impl Model {
    /// Assemble a model from layers and the two terminal lines
    pub fn new(layers: Vec<Layer>, end_layer: impl Into<String>) -> Self {
        let mut end_layer = end_layer.into();
        if !end_layer.ends_with('\n') {
            end_layer.push('\n');
        }
        Self { layers, end_layer }
    }

    /// Load a model from v.in text
    ///
    /// # Errors
    /// * `Parse` - If the first layer number is not 1, a row is malformed, or
    ///   a layer does not have exactly three parts
    /// * `Format` - If the file does not end with exactly 2 terminal lines
    pub fn loads(text: &str) -> Result<Self> {
        let lines = block_lines(text);
        if lines.is_empty() {
            return Err(VinError::format("the model text is empty"));
        }

        let first = parse_stamp(lines[0], 1)?;
        if first != 1 {
            return Err(VinError::parse(
                1,
                format!("The first layer number of a model should be 1, got {}", first),
            ));
        }
        if lines.len() % 3 != 2 {
            return Err(VinError::format(format!(
                "There should be 2 ending lines at the end of a v.in file ({} lines found)",
                lines.len()
            )));
        }

        let (body, tail) = lines.split_at(lines.len() - 2);
        if body.is_empty() {
            return Err(VinError::format("the model contains no layers"));
        }

        // Layers are grouped by their row stamp; a new layer starts whenever
        // the stamp changes.
        let mut layers = Vec::new();
        let mut start = 0;
        let mut current = first;
        for i in 0..body.len() / 3 {
            let stamp = parse_stamp(body[3 * i], 3 * i + 1)?;
            if stamp != current {
                layers.push(Layer::from_lines(&body[start..3 * i], start + 1)?);
                start = 3 * i;
                current = stamp;
            }
        }
        layers.push(Layer::from_lines(&body[start..], start + 1)?);

        debug!("Parsed {} layers", layers.len());
        let tail: Vec<&str> = tail.iter().map(|l| l.trim_end()).collect();
        Ok(Self::new(layers, tail.join("\n")))
    }

    /// Load a model from a v.in file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VinError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| VinError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let model = Self::loads(&text)?;
        info!("Loaded {} layers from {}", model.nlayer(), path.display());
        Ok(model)
    }

    /// Dump the model as v.in text, keeping fixed single-node parts expanded
    pub fn dumps(&self) -> String {
        self.dumps_with(false)
    }

    /// Dump the model as v.in text; `shrink` collapses fixed single-node parts
    pub fn dumps_with(&self, shrink: bool) -> String {
        let mut out: String = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, layer)| layer.dumps(i + 1, shrink))
            .collect();
        out.push_str(&self.end_layer());
        out
    }

    /// Write the model to a v.in file
    pub fn dump(&self, path: &Path) -> Result<()> {
        self.dump_with(path, false)
    }

    /// Write the model to a v.in file, optionally shrinking fixed parts
    pub fn dump_with(&self, path: &Path, shrink: bool) -> Result<()> {
        fs::write(path, self.dumps_with(shrink)).map_err(|e| VinError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("Saved {} layers to {}", self.nlayer(), path.display());
        Ok(())
    }

    /// Terminal lines with the leading layer number set to `nlayer + 1`,
    /// right-justified in the width of the original field.
    fn end_layer(&self) -> String {
        let text = &self.end_layer;
        let indent = text.len() - text.trim_start().len();
        let token_len = text[indent..]
            .find(char::is_whitespace)
            .unwrap_or(text.len() - indent);
        let width = indent + token_len;
        format!(
            "{:>width$}{}",
            self.nlayer() + 1,
            &text[width..],
            width = width
        )
    }

    /// Number of layers
    pub fn nlayer(&self) -> usize {
        self.layers.len()
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if every layer has been deleted
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers, shallowest first
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Horizontal extent: first and last depth x of the first layer
    pub fn xlim(&self) -> Option<(f64, f64)> {
        let x = self.layers.first()?.depth().x();
        Some((*x.first()?, *x.last()?))
    }

    /// Vertical extent: shallowest depth of the first layer to the deepest
    /// depth of the last layer
    pub fn ylim(&self) -> Option<(f64, f64)> {
        let top = self.layers.first()?.depth().y();
        let bottom = self.layers.last()?.depth().y();
        let ymin = top.iter().copied().fold(f64::INFINITY, f64::min);
        let ymax = bottom.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((ymin, ymax))
    }

    /// Get a layer, `None` when out of range
    pub fn get_layer(&self, ilayer: usize) -> Option<&Layer> {
        self.layers.get(ilayer)
    }

    /// Get the part addressed by `idx`, `None` when out of range
    pub fn get_tpl(&self, idx: NodeIndex) -> Option<&TripleLine> {
        self.layers.get(idx.ilayer)?.get_tpl(idx.ipart)
    }

    /// Get the node addressed by `idx`, `None` when out of range
    pub fn get_node(&self, idx: NodeIndex) -> Option<Node> {
        self.get_tpl(idx)?.node(idx.inode)
    }

    /// Move a node by `(dx, dy)` and return its new position.
    ///
    /// The first and last nodes of a part only move vertically.
    pub fn move_node(&mut self, idx: NodeIndex, dx: f64, dy: f64) -> Result<(f64, f64)> {
        let last = self.last_inode(idx)?;
        if dx.abs() > HORIZONTAL_MOVE_EPS {
            if idx.inode == 0 {
                return Err(VinError::invariant(
                    "Can not move the LEADING node of a layer horizontally",
                ));
            }
            if idx.inode == last {
                return Err(VinError::invariant(
                    "Can not move the ENDING node of a layer horizontally",
                ));
            }
        }
        self.tpl_mut(idx)?.move_node(idx.inode, dx, dy)
    }

    /// Insert a node right of `idx` and return it. See
    /// [`TripleLine::insert_node`] for how an omitted node is placed.
    pub fn insert_node(&mut self, idx: NodeIndex, new_node: Option<Node>) -> Result<Node> {
        let last = self.last_inode(idx)?;
        if idx.inode == last {
            return Err(VinError::invariant(
                "Can not insert node after the ENDING node of a layer",
            ));
        }
        if idx.inode > last {
            return Err(VinError::NodeOutOfRange { index: idx.inode });
        }
        self.tpl_mut(idx)?.insert_node(idx.inode, new_node)
    }

    /// Delete the node at `idx`.
    ///
    /// Returns true if the deletion emptied a depth line and the whole layer
    /// was removed.
    pub fn delete_node(&mut self, idx: NodeIndex) -> Result<bool> {
        if idx.inode == 0 {
            return Err(VinError::invariant(
                "Can not delete the LEADING node of a layer",
            ));
        }
        let last = self.last_inode(idx)?;
        if idx.inode == last {
            return Err(VinError::invariant(
                "Can not delete the ENDING node of a layer",
            ));
        }
        if idx.inode > last {
            return Err(VinError::NodeOutOfRange { index: idx.inode });
        }
        self.remove_node(idx)
    }

    /// Remove a node without the anchor checks.
    ///
    /// Emptying a depth line removes its layer; emptying a velocity line is
    /// refused before anything changes.
    fn remove_node(&mut self, idx: NodeIndex) -> Result<bool> {
        let part = self.part_of(idx)?;
        let tpl = self.tpl_mut(idx)?;
        if idx.inode >= tpl.len() {
            return Err(VinError::NodeOutOfRange { index: idx.inode });
        }
        if tpl.len() > 1 {
            tpl.delete_node(idx.inode)?;
            return Ok(false);
        }
        if part.is_velocity() {
            return Err(VinError::invariant(
                "Can not delete all the velocity nodes of a layer",
            ));
        }
        self.layers.remove(idx.ilayer);
        info!("Depth line emptied, removed layer {}", idx.ilayer + 1);
        Ok(true)
    }

    /// Thickness of a layer: depth of the first node of the next layer minus
    /// the depth of this layer's first node.
    ///
    /// The last layer reports the thickness of the one above it; a model with
    /// a single layer reports [`SINGLE_LAYER_THICKNESS`].
    pub fn get_thickness(&self, ilayer: usize) -> Option<f64> {
        if ilayer >= self.nlayer() {
            return None;
        }
        if self.nlayer() == 1 {
            return Some(SINGLE_LAYER_THICKNESS);
        }
        if ilayer == self.nlayer() - 1 {
            return self.get_thickness(ilayer - 1);
        }
        let depth1 = *self.layers[ilayer].depth().y().first()?;
        let depth2 = *self.layers[ilayer + 1].depth().y().first()?;
        Some(depth2 - depth1)
    }

    /// Insert a copy of layer `ilayer` beneath it.
    ///
    /// The copy is shifted down by half the layer thickness. Its top
    /// velocity becomes the mean of the original's first top and bottom
    /// velocity, and that value is then copied onto the original layer's
    /// top velocity. The two top-velocity lines are equal by value only.
    pub fn insert_layer(&mut self, ilayer: usize) -> Result<()> {
        let thickness = self
            .get_thickness(ilayer)
            .ok_or(VinError::LayerOutOfRange {
                ilayer,
                nlayer: self.nlayer(),
            })?;

        let current = &self.layers[ilayer];
        let v_top = match (current.v_top().y().first(), current.v_bottom().y().first()) {
            (Some(top), Some(bottom)) => (top + bottom) / 2.0,
            _ => return Err(VinError::invariant("layer has an empty velocity line")),
        };

        let mut new_layer = current.clone();
        new_layer.depth_mut().shift_y(thickness / 2.0);
        new_layer.v_top_mut().fill_y(v_top);

        let new_v_top = new_layer.v_top().y().to_vec();
        self.layers[ilayer].v_top_mut().set_y(new_v_top)?;
        self.layers.insert(ilayer + 1, new_layer);

        debug!(
            "Inserted layer {} at depth offset {:.3}, top velocity {:.3}",
            ilayer + 2,
            thickness / 2.0,
            v_top
        );
        Ok(())
    }

    /// Delete layer `ilayer` and return it
    pub fn delete_layer(&mut self, ilayer: usize) -> Result<Layer> {
        if ilayer >= self.nlayer() {
            return Err(VinError::LayerOutOfRange {
                ilayer,
                nlayer: self.nlayer(),
            });
        }
        debug!("Deleting layer {}", ilayer + 1);
        Ok(self.layers.remove(ilayer))
    }

    fn part_of(&self, idx: NodeIndex) -> Result<Part> {
        if idx.ilayer >= self.nlayer() {
            return Err(VinError::LayerOutOfRange {
                ilayer: idx.ilayer,
                nlayer: self.nlayer(),
            });
        }
        idx.part()
            .ok_or(VinError::PartOutOfRange { index: idx.ipart })
    }

    fn tpl_mut(&mut self, idx: NodeIndex) -> Result<&mut TripleLine> {
        let nlayer = self.nlayer();
        self.layers
            .get_mut(idx.ilayer)
            .ok_or(VinError::LayerOutOfRange {
                ilayer: idx.ilayer,
                nlayer,
            })?
            .get_tpl_mut(idx.ipart)
            .ok_or(VinError::PartOutOfRange { index: idx.ipart })
    }

    fn last_inode(&self, idx: NodeIndex) -> Result<usize> {
        let part = self.part_of(idx)?;
        self.layers[idx.ilayer]
            .part(part)
            .last_index()
            .ok_or_else(|| VinError::invariant("line has no nodes"))
    }
}

/// Models compare by their dumped text, not by structure
impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.dumps() == other.dumps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    const TWO_LAYERS: &str = " 1    0.000   4.000  10.000
 0    0.000   0.200   0.000
          0       1       0
 1    0.000  10.000
 0    1.500   1.500
          0       0
 1    0.000  10.000
 0    2.000   2.000
          0       0
 2    0.000  10.000
 0    1.000   1.000
          0       0
 2    0.000  10.000
 0    2.000   2.000
          0       0
 2    0.000  10.000
 0    2.500   2.500
          0       0
 3   10.000
 0   50.000
";

    fn model() -> Model {
        Model::loads(TWO_LAYERS).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(model().dumps(), TWO_LAYERS);
    }

    #[test]
    fn test_limits() {
        let model = model();
        assert_eq!(model.nlayer(), 2);
        assert_eq!(model.xlim(), Some((0.0, 10.0)));
        assert_eq!(model.ylim(), Some((0.0, 1.0)));
    }

    #[test]
    fn test_first_layer_must_be_one() {
        let text = TWO_LAYERS.replacen(" 1    0.000   4.000", " 2    0.000   4.000", 1);
        let err = Model::loads(&text).unwrap_err();
        assert!(matches!(err, VinError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_requires_two_terminal_lines() {
        let text = TWO_LAYERS.trim_end().trim_end_matches(" 0   50.000");
        let err = Model::loads(text).unwrap_err();
        assert!(matches!(err, VinError::Format { .. }));
    }

    #[test]
    fn test_terminal_number_follows_layer_count() {
        let mut model = model();
        model.delete_layer(1).unwrap();
        assert!(model.dumps().ends_with(" 2   10.000\n 0   50.000\n"));

        model.insert_layer(0).unwrap();
        model.insert_layer(0).unwrap();
        assert!(model.dumps().ends_with(" 4   10.000\n 0   50.000\n"));
    }

    #[test]
    fn test_terminal_rewrite_only_touches_leading_field() {
        let text = TWO_LAYERS.replace(" 3   10.000\n 0   50.000", " 9   39.000\n 0   33.000");
        let model = Model::loads(&text).unwrap();
        assert!(model.dumps().ends_with(" 3   39.000\n 0   33.000\n"));
    }

    #[test]
    fn test_get_node() {
        let model = model();
        assert_eq!(
            model.get_node(NodeIndex::new(0, 0, 1)),
            Some(Node::new(4.0, 0.2, 1))
        );
        assert_eq!(model.get_node(NodeIndex::new(0, 0, 3)), None);
        assert_eq!(model.get_node(NodeIndex::new(0, 3, 0)), None);
        assert_eq!(model.get_node(NodeIndex::new(2, 0, 0)), None);
        assert!(model.get_layer(1).is_some());
        assert!(model.get_layer(2).is_none());
    }

    #[test]
    fn test_move_node_pins_anchors_horizontally() {
        let mut model = model();
        let leading = NodeIndex::new(0, 0, 0);
        let ending = NodeIndex::new(0, 0, 2);

        assert!(model.move_node(leading, 0.5, 0.0).is_err());
        assert!(model.move_node(ending, -0.5, 0.0).is_err());

        let (x, y) = model.move_node(leading, 0.0, 0.25).unwrap();
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.25);

        let (x, _) = model.move_node(NodeIndex::new(0, 0, 1), 1.0, 0.0).unwrap();
        assert_relative_eq!(x, 5.0);
    }

    #[test]
    fn test_insert_node_after_ending_fails() {
        let mut model = model();
        let err = model
            .insert_node(NodeIndex::new(0, 0, 2), None)
            .unwrap_err();
        assert!(err.to_string().contains("ENDING"));

        let err = model
            .insert_node(NodeIndex::new(0, 4, 0), None)
            .unwrap_err();
        assert!(matches!(err, VinError::PartOutOfRange { index: 4 }));

        let node = model.insert_node(NodeIndex::new(0, 0, 0), None).unwrap();
        assert_relative_eq!(node.x, 2.0);
        assert_relative_eq!(node.y, 0.1);
        assert_eq!(model.get_tpl(NodeIndex::new(0, 0, 0)).unwrap().len(), 4);
    }

    #[test]
    fn test_delete_node() {
        let mut model = model();
        assert!(model.delete_node(NodeIndex::new(0, 0, 0)).is_err());
        assert!(model.delete_node(NodeIndex::new(0, 0, 2)).is_err());
        assert!(matches!(
            model.delete_node(NodeIndex::new(0, 0, 7)),
            Err(VinError::NodeOutOfRange { index: 7 })
        ));

        let removed_layer = model.delete_node(NodeIndex::new(0, 0, 1)).unwrap();
        assert!(!removed_layer);
        assert_eq!(model.get_tpl(NodeIndex::new(0, 0, 0)).unwrap().x(), &[0.0, 10.0]);
    }

    #[test]
    fn test_emptied_depth_line_removes_layer() {
        let single = TripleLine::new(vec![5.0], vec![0.5], vec![0]).unwrap();
        let flat = TripleLine::new(vec![0.0, 10.0], vec![1.0, 1.0], vec![0, 0]).unwrap();
        let mut model = model();
        model
            .layers
            .insert(1, Layer::new(single.clone(), flat.clone(), flat.clone()));
        assert_eq!(model.nlayer(), 3);

        let removed = model.remove_node(NodeIndex::new(1, 0, 0)).unwrap();
        assert!(removed);
        assert_eq!(model.nlayer(), 2);
        assert_eq!(model, Model::loads(TWO_LAYERS).unwrap());

        model
            .layers
            .insert(1, Layer::new(flat.clone(), single, flat));
        let err = model.remove_node(NodeIndex::new(1, 1, 0)).unwrap_err();
        assert!(err.to_string().contains("velocity"));
        assert_eq!(model.nlayer(), 3);
    }

    #[test]
    fn test_thickness() {
        let model = model();
        assert_relative_eq!(model.get_thickness(0).unwrap(), 1.0);
        // last layer borrows the thickness of the one above
        assert_relative_eq!(model.get_thickness(1).unwrap(), 1.0);
        assert_eq!(model.get_thickness(2), None);

        let mut single = model.clone();
        single.delete_layer(1).unwrap();
        assert_relative_eq!(single.get_thickness(0).unwrap(), SINGLE_LAYER_THICKNESS);
    }

    #[test]
    fn test_insert_layer_velocity_order() {
        let mut model = model();
        model.insert_layer(0).unwrap();
        assert_eq!(model.nlayer(), 3);

        let original = model.get_layer(0).unwrap();
        let inserted = model.get_layer(1).unwrap();

        // copy shifted down by half the thickness
        let shifted = inserted.depth().y();
        assert_eq!(shifted.len(), 3);
        for (got, want) in shifted.iter().zip([0.5, 0.7, 0.5]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        // new top velocity is the mean of the original top (1.5) and bottom (2.0)
        assert_eq!(inserted.v_top().y(), &[1.75, 1.75]);
        // and is then copied back onto the original layer's top velocity
        assert_eq!(original.v_top().y(), &[1.75, 1.75]);
        // bottom velocities are untouched
        assert_eq!(inserted.v_bottom().y(), &[2.0, 2.0]);
        assert_eq!(original.v_bottom().y(), &[2.0, 2.0]);
    }

    #[test]
    fn test_inserted_velocity_lines_are_independent() {
        let mut model = model();
        model.insert_layer(0).unwrap();
        model.move_node(NodeIndex::new(1, 1, 0), 0.0, 0.5).unwrap();
        assert_eq!(model.get_layer(0).unwrap().v_top().y(), &[1.75, 1.75]);
        assert_eq!(model.get_layer(1).unwrap().v_top().y(), &[2.25, 1.75]);
    }

    #[test]
    fn test_layer_index_errors() {
        let mut model = model();
        assert!(matches!(
            model.insert_layer(2),
            Err(VinError::LayerOutOfRange { ilayer: 2, nlayer: 2 })
        ));
        assert!(matches!(
            model.delete_layer(5),
            Err(VinError::LayerOutOfRange { ilayer: 5, nlayer: 2 })
        ));
    }

    #[test]
    fn test_equality_ignores_layer_stamps() {
        let restamped = TWO_LAYERS
            .replace("\n 2    0.000", "\n 7    0.000")
            .replacen(" 3   10.000", " 8   10.000", 1);
        let a = model();
        let b = Model::loads(&restamped).unwrap();
        assert_eq!(b.nlayer(), 2);
        assert_eq!(a, b);
    }
}
