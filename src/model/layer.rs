//! Layer - one stratigraphic unit of a v.in model
//!
//! Every layer has exactly three parts, each a [`TripleLine`]:
//! - depth nodes of the layer's top boundary
//! - velocity nodes at the top of the layer
//! - velocity nodes at the bottom of the layer
//!
//! A part with a single node means "constant along x". After loading, such
//! parts are expanded to two nodes so that plotting and interpolation always
//! see a line; dumping with `shrink` collapses them again.

use serde::{Deserialize, Serialize};

use super::triple_line::{block_lines, parse_stamp, TripleLine};
use crate::error::{Result, VinError};

/// Role of a TripleLine inside a layer.
///
/// The numeric value is the `ipart` used by [`NodeIndex`](super::NodeIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Part {
    Depth = 0,
    VTop = 1,
    VBottom = 2,
}

impl Part {
    /// All parts in file order
    pub const ALL: [Part; 3] = [Part::Depth, Part::VTop, Part::VBottom];

    /// Map a part index to its role
    pub fn from_index(ipart: usize) -> Option<Part> {
        Part::ALL.get(ipart).copied()
    }

    /// Velocity parts must never lose their last node
    pub fn is_velocity(self) -> bool {
        !matches!(self, Part::Depth)
    }
}

/// One layer of a v.in model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    depth: TripleLine,
    v_top: TripleLine,
    v_bottom: TripleLine,
}

impl Layer {
    /// Assemble a layer from its three parts, without fixing single nodes
    pub fn new(depth: TripleLine, v_top: TripleLine, v_bottom: TripleLine) -> Self {
        Self {
            depth,
            v_top,
            v_bottom,
        }
    }

    /// Load a layer from its text block
    pub fn loads(text: &str) -> Result<Self> {
        let lines = block_lines(text);
        Self::from_lines(&lines, 1)
    }

    /// Split the rows of one layer into its three parts.
    ///
    /// A part ends at the first row triple whose fold stamp is 0.
    pub(crate) fn from_lines(lines: &[&str], first_line: usize) -> Result<Self> {
        if lines.len() % 3 != 0 {
            return Err(VinError::parse(
                first_line,
                format!("a layer must contain 3N rows, got {} rows", lines.len()),
            ));
        }

        let mut parts = Vec::with_capacity(3);
        let mut start = 0;
        for i in 0..lines.len() / 3 {
            let line_no = first_line + 3 * i + 1;
            if parse_stamp(lines[3 * i + 1], line_no)? == 0 {
                let end = 3 * (i + 1);
                parts.push(TripleLine::from_lines(
                    &lines[start..end],
                    first_line + start,
                )?);
                start = end;
            }
        }
        if start != lines.len() {
            return Err(VinError::parse(
                first_line + start,
                "line is continued (fold stamp 1) but never terminated",
            ));
        }

        let count = parts.len();
        let [depth, v_top, v_bottom]: [TripleLine; 3] = parts.try_into().map_err(|_| {
            VinError::parse(
                first_line,
                format!(
                    "a layer must consist of THREE parts (depth, top velocity, bottom velocity), got {}",
                    count
                ),
            )
        })?;

        let mut layer = Self::new(depth, v_top, v_bottom);
        layer.fix();
        Ok(layer)
    }

    /// Dump the layer, stamping `idx` on every part.
    ///
    /// With `shrink`, fixed single-node parts are collapsed on a copy first;
    /// the layer itself is left untouched.
    pub fn dumps(&self, idx: usize, shrink: bool) -> String {
        if shrink {
            let mut copy = self.clone();
            copy.recover();
            return copy.dumps(idx, false);
        }
        Part::ALL
            .iter()
            .map(|&part| self.part(part).dumps(idx))
            .collect()
    }

    /// Expand every single-node part to two nodes
    pub fn fix(&mut self) {
        for part in Part::ALL {
            self.part_mut(part).fix();
        }
    }

    /// Collapse every two-node part with equal values to one node
    pub fn recover(&mut self) {
        for part in Part::ALL {
            self.part_mut(part).recover();
        }
    }

    /// Depth nodes
    pub fn depth(&self) -> &TripleLine {
        &self.depth
    }

    /// Depth nodes (mutable)
    pub fn depth_mut(&mut self) -> &mut TripleLine {
        &mut self.depth
    }

    /// Top velocity nodes
    pub fn v_top(&self) -> &TripleLine {
        &self.v_top
    }

    /// Top velocity nodes (mutable)
    pub fn v_top_mut(&mut self) -> &mut TripleLine {
        &mut self.v_top
    }

    /// Bottom velocity nodes
    pub fn v_bottom(&self) -> &TripleLine {
        &self.v_bottom
    }

    /// Bottom velocity nodes (mutable)
    pub fn v_bottom_mut(&mut self) -> &mut TripleLine {
        &mut self.v_bottom
    }

    /// Get a part by role
    pub fn part(&self, part: Part) -> &TripleLine {
        match part {
            Part::Depth => &self.depth,
            Part::VTop => &self.v_top,
            Part::VBottom => &self.v_bottom,
        }
    }

    /// Get a part by role (mutable)
    pub fn part_mut(&mut self, part: Part) -> &mut TripleLine {
        match part {
            Part::Depth => &mut self.depth,
            Part::VTop => &mut self.v_top,
            Part::VBottom => &mut self.v_bottom,
        }
    }

    /// Get a part by numeric index, `None` when out of range
    pub fn get_tpl(&self, ipart: usize) -> Option<&TripleLine> {
        Part::from_index(ipart).map(|part| self.part(part))
    }

    /// Get a part by numeric index (mutable)
    pub fn get_tpl_mut(&mut self, ipart: usize) -> Option<&mut TripleLine> {
        Part::from_index(ipart).map(move |part| self.part_mut(part))
    }
}
