//! Dense velocity grid

use serde::{Deserialize, Serialize};

/// Velocity field sampled on a regular mesh.
///
/// Values are stored row-major: row `iy` holds every `x` at depth `y[iy]`.
/// Cells outside every band are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub vp: Vec<f64>,
    pub vs: Option<Vec<f64>>,
    pub pois: Option<Vec<f64>>,
}

impl VelocityGrid {
    /// Empty grid over the given axes, every cell NaN
    pub fn new(x: Vec<f64>, y: Vec<f64>, with_pois: bool) -> Self {
        let size = x.len() * y.len();
        let nan = || vec![f64::NAN; size];
        Self {
            vp: nan(),
            vs: with_pois.then(nan),
            pois: with_pois.then(nan),
            x,
            y,
        }
    }

    pub fn nx(&self) -> usize {
        self.x.len()
    }

    pub fn ny(&self) -> usize {
        self.y.len()
    }

    /// Flat index of cell `(ix, iy)`
    pub fn index(&self, ix: usize, iy: usize) -> Option<usize> {
        (ix < self.nx() && iy < self.ny()).then(|| iy * self.nx() + ix)
    }

    /// Vp at cell `(ix, iy)`
    pub fn vp_at(&self, ix: usize, iy: usize) -> Option<f64> {
        self.index(ix, iy).map(|i| self.vp[i])
    }

    /// Vs at cell `(ix, iy)`, if Poisson ratios were bound
    pub fn vs_at(&self, ix: usize, iy: usize) -> Option<f64> {
        let i = self.index(ix, iy)?;
        self.vs.as_ref().map(|vs| vs[i])
    }

    /// Poisson ratio at cell `(ix, iy)`, if bound
    pub fn pois_at(&self, ix: usize, iy: usize) -> Option<f64> {
        let i = self.index(ix, iy)?;
        self.pois.as_ref().map(|pois| pois[i])
    }

    /// Number of cells that received a velocity
    pub fn filled(&self) -> usize {
        self.vp.iter().filter(|v| !v.is_nan()).count()
    }

    /// Full coordinate arrays `(xx, yy)` in the same row-major layout
    pub fn meshgrid(&self) -> (Vec<f64>, Vec<f64>) {
        let size = self.nx() * self.ny();
        let mut xx = Vec::with_capacity(size);
        let mut yy = Vec::with_capacity(size);
        for &y in &self.y {
            xx.extend_from_slice(&self.x);
            yy.extend(std::iter::repeat(y).take(self.nx()));
        }
        (xx, yy)
    }

    /// Lower and upper Vp over filled cells
    pub fn vp_range(&self) -> Option<(f64, f64)> {
        self.vp
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
