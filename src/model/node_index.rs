//! NodeIndex - address of one node in a model
//!
//! A plain `(ilayer, ipart, inode)` coordinate. It holds no reference to the
//! model; traversal methods that need bounds take the model as an argument.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::layer::Part;
use super::vmodel::Model;

/// Address of a node: layer, part (0 depth, 1 top velocity, 2 bottom
/// velocity) and node position within the part.
///
/// Ordering is lexicographic, which matches top-to-bottom, left-to-right
/// traversal within one part.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct NodeIndex {
    pub ilayer: usize,
    pub ipart: usize,
    pub inode: usize,
}

impl NodeIndex {
    pub fn new(ilayer: usize, ipart: usize, inode: usize) -> Self {
        Self {
            ilayer,
            ipart,
            inode,
        }
    }

    /// Role of the addressed part, if the part index is valid
    pub fn part(&self) -> Option<Part> {
        Part::from_index(self.ipart)
    }

    /// Left neighbor, `None` at the first node
    pub fn left(&self) -> Option<NodeIndex> {
        let inode = self.inode.checked_sub(1)?;
        Some(NodeIndex::new(self.ilayer, self.ipart, inode))
    }

    /// Right neighbor; not checked against any model
    pub fn right(&self) -> NodeIndex {
        NodeIndex::new(self.ilayer, self.ipart, self.inode + 1)
    }

    /// Same node one layer up, `None` at the first layer
    pub fn up(&self) -> Option<NodeIndex> {
        let ilayer = self.ilayer.checked_sub(1)?;
        Some(NodeIndex::new(ilayer, self.ipart, self.inode))
    }

    /// Same node one layer down; not checked against any model
    pub fn down(&self) -> NodeIndex {
        NodeIndex::new(self.ilayer + 1, self.ipart, self.inode)
    }

    /// First node of the same part
    pub fn begin(&self) -> NodeIndex {
        NodeIndex::new(self.ilayer, self.ipart, 0)
    }

    /// Last node of the same part, `None` if the part does not exist
    pub fn end(&self, model: &Model) -> Option<NodeIndex> {
        let last = model.get_tpl(*self)?.last_index()?;
        Some(NodeIndex::new(self.ilayer, self.ipart, last))
    }

    /// True if this is the last node of its part
    pub fn is_end(&self, model: &Model) -> bool {
        self.end(model) == Some(*self)
    }

    /// Next node in traversal order: right along the part, then the first
    /// node of the same part one layer down.
    ///
    /// `None` if this index does not address a node or nothing follows.
    pub fn next(&self, model: &Model) -> Option<NodeIndex> {
        model.get_node(*self)?;
        let right = self.right();
        if model.get_node(right).is_some() {
            return Some(right);
        }
        let below = NodeIndex::new(self.ilayer + 1, self.ipart, 0);
        model.get_node(below).map(|_| below)
    }

    /// Previous node in traversal order: left along the part, then the last
    /// node of the same part one layer up.
    pub fn previous(&self, model: &Model) -> Option<NodeIndex> {
        if self.ilayer == 0 && self.inode == 0 {
            return None;
        }
        let prev = match self.left() {
            Some(left) => left,
            None => self.up()?.end(model)?,
        };
        model.get_node(prev).map(|_| prev)
    }
}

impl From<(usize, usize, usize)> for NodeIndex {
    fn from((ilayer, ipart, inode): (usize, usize, usize)) -> Self {
        NodeIndex::new(ilayer, ipart, inode)
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.ilayer, self.ipart, self.inode)
    }
}
