//! TripleLine - one part of a layer
//!
//! A TripleLine holds three parallel arrays: the x position of each node,
//! its depth or velocity, and the inversion flag. On disk every chunk of up
//! to ten nodes takes three rows:
//!
//! ```text
//!  1   0.000   5.000  10.000      <- layer number, x values (%8.3f)
//!  0   2.000   2.100   2.300      <- fold stamp, y values (%8.3f)
//!            0       1       0    <- 3 blank columns, flags (%8d)
//! ```
//!
//! A fold stamp of 1 means another chunk of the same line follows, 0 marks
//! the last chunk.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VinError};

/// Maximum number of nodes written on one row.
pub const MAX_NODES_PER_ROW: usize = 10;

/// Step used for the new x when inserting after the only node of a line (km).
pub const DEFAULT_INSERT_STEP: f64 = 1.0;

/// A single node of a TripleLine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Horizontal position (km)
    pub x: f64,
    /// Depth or velocity value
    pub y: f64,
    /// Inversion flag, 0 or 1
    pub vary: i32,
}

impl Node {
    /// Create a new node
    pub fn new(x: f64, y: f64, vary: i32) -> Self {
        Self { x, y, vary }
    }
}

/// Three parallel arrays describing one part of a layer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TripleLine {
    x: Vec<f64>,
    y: Vec<f64>,
    vary: Vec<i32>,
}

impl TripleLine {
    /// Build a TripleLine from its three arrays.
    ///
    /// # Errors
    /// Returns a format error if the arrays differ in length.
    pub fn new(x: Vec<f64>, y: Vec<f64>, vary: Vec<i32>) -> Result<Self> {
        if x.len() != y.len() || x.len() != vary.len() {
            return Err(VinError::format(format!(
                "the 3 rows of a line must have the same length, got {}, {} and {}",
                x.len(),
                y.len(),
                vary.len()
            )));
        }
        Ok(Self { x, y, vary })
    }

    /// Load a TripleLine from its text block
    pub fn loads(text: &str) -> Result<Self> {
        Self::from_lines(&block_lines(text), 1)
    }

    /// Parse a block of 3N rows; `first_line` is the 1-based line number of
    /// `lines[0]` in the enclosing file, used in error messages.
    pub(crate) fn from_lines(lines: &[&str], first_line: usize) -> Result<Self> {
        if lines.is_empty() {
            return Err(VinError::parse(first_line, "empty line block"));
        }
        if lines.len() % 3 != 0 {
            return Err(VinError::parse(
                first_line,
                format!(
                    "a line block must contain 3N rows, got {} rows",
                    lines.len()
                ),
            ));
        }

        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut vary = Vec::new();
        for (chunk_idx, rows) in lines.chunks(3).enumerate() {
            let line_no = first_line + chunk_idx * 3;
            x.extend(parse_floats(rows[0], line_no)?);
            y.extend(parse_floats(rows[1], line_no + 1)?);
            vary.extend(parse_flags(rows[2], line_no + 2)?);
        }

        if x.len() != y.len() || x.len() != vary.len() {
            return Err(VinError::parse(
                first_line,
                format!(
                    "the 3 rows must have the same length, got {}, {} and {} values",
                    x.len(),
                    y.len(),
                    vary.len()
                ),
            ));
        }
        if x.is_empty() {
            return Err(VinError::parse(first_line, "a line must contain at least 1 node"));
        }

        Ok(Self { x, y, vary })
    }

    /// Dump the line as text, stamping `idx` on the first row of every chunk
    pub fn dumps(&self, idx: usize) -> String {
        let mut out = String::new();
        let nchunks = self.len().div_ceil(MAX_NODES_PER_ROW).max(1);
        for chunk in 0..nchunks {
            let start = chunk * MAX_NODES_PER_ROW;
            let end = (start + MAX_NODES_PER_ROW).min(self.len());
            let fold = if chunk + 1 < nchunks { 1 } else { 0 };

            out.push_str(&format!("{:2} ", idx));
            for x in &self.x[start..end] {
                out.push_str(&format!("{:8.3}", x));
            }
            out.push('\n');

            out.push_str(&format!("{:2} ", fold));
            for y in &self.y[start..end] {
                out.push_str(&format!("{:8.3}", y));
            }
            out.push('\n');

            out.push_str("   ");
            for v in &self.vary[start..end] {
                out.push_str(&format!("{:8}", v));
            }
            out.push('\n');
        }
        out
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Check if the line has no nodes
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Horizontal positions
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Depth or velocity values
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Inversion flags
    pub fn vary(&self) -> &[i32] {
        &self.vary
    }

    /// Get the node at index `i`
    pub fn node(&self, i: usize) -> Option<Node> {
        if i >= self.len() {
            return None;
        }
        Some(Node::new(self.x[i], self.y[i], self.vary[i]))
    }

    /// Iterate over all nodes in order
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.vary)
            .map(|((&x, &y), &vary)| Node::new(x, y, vary))
    }

    /// Index of the last node
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Add `dy` to every y value
    pub fn shift_y(&mut self, dy: f64) {
        for y in &mut self.y {
            *y += dy;
        }
    }

    /// Set every y value to `value`
    pub fn fill_y(&mut self, value: f64) {
        for y in &mut self.y {
            *y = value;
        }
    }

    /// Replace the y values, keeping x and flags.
    ///
    /// # Errors
    /// Returns an invariant error if the length differs.
    pub fn set_y(&mut self, y: Vec<f64>) -> Result<()> {
        if y.len() != self.len() {
            return Err(VinError::invariant(format!(
                "expected {} y values, got {}",
                self.len(),
                y.len()
            )));
        }
        self.y = y;
        Ok(())
    }

    /// Move node `i` by `(dx, dy)` and return its new position.
    ///
    /// Which nodes may move is decided by the model, not here.
    pub fn move_node(&mut self, i: usize, dx: f64, dy: f64) -> Result<(f64, f64)> {
        if i >= self.len() {
            return Err(VinError::NodeOutOfRange { index: i });
        }
        self.x[i] += dx;
        self.y[i] += dy;
        Ok((self.x[i], self.y[i]))
    }

    /// Insert a node right of node `i` and return it.
    ///
    /// `i` past the end is clamped to the last node. Without an explicit
    /// node the new one sits halfway to the right neighbor, or one step
    /// further out when `i` is the last node.
    ///
    /// # Errors
    /// Returns an invariant error if an explicit node's x does not exceed
    /// `x[i]`.
    pub fn insert_node(&mut self, i: usize, new_node: Option<Node>) -> Result<Node> {
        let last = self
            .last_index()
            .ok_or_else(|| VinError::invariant("cannot insert into an empty line"))?;
        let i = i.min(last);

        let node = match new_node {
            None if i == last => {
                let step = if i > 0 {
                    self.x[i] - self.x[i - 1]
                } else {
                    DEFAULT_INSERT_STEP
                };
                Node::new(self.x[i] + step, self.y[i], self.vary[i])
            }
            None => Node::new(
                (self.x[i] + self.x[i + 1]) / 2.0,
                (self.y[i] + self.y[i + 1]) / 2.0,
                self.vary[i],
            ),
            Some(node) => {
                if node.x <= self.x[i] {
                    return Err(VinError::invariant(
                        "The x value of the node to insert must be larger than that of the left neighboring node",
                    ));
                }
                node
            }
        };

        self.x.insert(i + 1, node.x);
        self.y.insert(i + 1, node.y);
        self.vary.insert(i + 1, node.vary);
        Ok(node)
    }

    /// Delete node `i`. Returns true if the line is empty afterwards.
    pub fn delete_node(&mut self, i: usize) -> Result<bool> {
        if i >= self.len() {
            return Err(VinError::NodeOutOfRange { index: i });
        }
        self.x.remove(i);
        self.y.remove(i);
        self.vary.remove(i);
        Ok(self.is_empty())
    }

    /// Expand a single-node line to two nodes by adding a leading node at
    /// x = 0 with the same value and flag. Returns true if expanded.
    pub(crate) fn fix(&mut self) -> bool {
        if self.len() != 1 {
            return false;
        }
        self.x.insert(0, 0.0);
        self.y.insert(0, self.y[0]);
        self.vary.insert(0, self.vary[0]);
        true
    }

    /// Undo [`fix`](Self::fix): collapse two nodes with equal value back to
    /// one. Returns true if collapsed.
    pub(crate) fn recover(&mut self) -> bool {
        if self.len() != 2 || (self.y[0] - self.y[1]).abs() >= 1e-6 {
            return false;
        }
        self.x.remove(0);
        self.y.remove(0);
        self.vary.remove(0);
        true
    }
}

/// Width of the stamp field plus its separating blank
const STAMP_COLUMNS: usize = 3;

/// Width of one value field (`%8.3f` or `%8d`)
const FIELD_WIDTH: usize = 8;

/// Rows of a text block with blank leading and trailing lines dropped.
///
/// Leading blanks of the first row are kept since the stamp is read by column.
pub(crate) fn block_lines(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].to_vec(),
        _ => Vec::new(),
    }
}

/// Split the value columns of a row into trimmed 8-character fields
fn value_fields(row: &str, line_no: usize) -> Result<Vec<&str>> {
    let row = row.trim_end();
    if !row.is_ascii() {
        return Err(VinError::parse(line_no, "row contains non-ASCII characters"));
    }
    if row.len() <= STAMP_COLUMNS {
        return Ok(Vec::new());
    }
    if !row[..STAMP_COLUMNS].ends_with(' ') {
        return Err(VinError::parse(
            line_no,
            format!("expected a blank at column {}", STAMP_COLUMNS),
        ));
    }
    (STAMP_COLUMNS..row.len())
        .step_by(FIELD_WIDTH)
        .map(|start| {
            let field = row[start..row.len().min(start + FIELD_WIDTH)].trim();
            if field.is_empty() {
                Err(VinError::parse(
                    line_no,
                    format!("empty field at column {}", start + 1),
                ))
            } else {
                Ok(field)
            }
        })
        .collect()
}

/// Parse the numeric fields of an x or y row, skipping the leading stamp
fn parse_floats(row: &str, line_no: usize) -> Result<Vec<f64>> {
    value_fields(row, line_no)?
        .into_iter()
        .map(|field| {
            field.parse::<f64>().map_err(|_| {
                VinError::parse(line_no, format!("expected a number, got '{}'", field))
            })
        })
        .collect()
}

/// Parse a flag row, whose stamp columns are blank
fn parse_flags(row: &str, line_no: usize) -> Result<Vec<i32>> {
    if !row.bytes().take(STAMP_COLUMNS).all(|b| b == b' ') {
        return Err(VinError::parse(
            line_no,
            format!("a flag row starts with {} blank columns", STAMP_COLUMNS),
        ));
    }
    value_fields(row, line_no)?
        .into_iter()
        .map(|field| {
            field.parse::<i32>().map_err(|_| {
                VinError::parse(line_no, format!("expected an integer flag, got '{}'", field))
            })
        })
        .collect()
}

/// Read the stamp from the first two columns of a row
pub(crate) fn parse_stamp(row: &str, line_no: usize) -> Result<i64> {
    let field = row
        .get(..row.len().min(STAMP_COLUMNS - 1))
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| VinError::parse(line_no, "missing stamp in columns 1-2"))?;
    field
        .parse::<i64>()
        .map_err(|_| VinError::parse(line_no, format!("expected an integer stamp, got '{}'", field)))
}
