//! ModelProcessor - velocity field synthesis
//!
//! The model is processed band by band. A band lies between the depth line
//! of layer `i` and the depth line of layer `i + 1`, carrying the top and
//! bottom velocity lines of layer `i`. The breakpoints of those four lines
//! split the band into vertically trapezoidal blocks, and velocity inside a
//! block varies linearly along both edges and in depth.

use log::{debug, warn};

use super::grid::VelocityGrid;
use super::interp::{interp1d, interp_block, interp_many, linspace, merge_breakpoints};
use super::pois::{clamp_ratio, LayerPois, PoisData};
use super::section::{BandVelocityNodes, Polyline, SectionData};
use crate::error::{Result, VinError};
use crate::model::{Layer, Model};

/// Default number of grid columns
pub const NGRIDX: usize = 500;
/// Default number of grid rows
pub const NGRIDY: usize = 1000;

/// Region between two consecutive depth lines
#[derive(Debug, Clone, Copy)]
struct Band<'a> {
    upper: &'a Layer,
    lower: &'a Layer,
}

impl<'a> Band<'a> {
    fn top_depth(&self, x: f64) -> f64 {
        let depth = self.upper.depth();
        interp1d(x, depth.x(), depth.y())
    }

    fn bottom_depth(&self, x: f64) -> f64 {
        let depth = self.lower.depth();
        interp1d(x, depth.x(), depth.y())
    }

    fn v_top(&self, x: f64) -> f64 {
        let v = self.upper.v_top();
        interp1d(x, v.x(), v.y())
    }

    fn v_bottom(&self, x: f64) -> f64 {
        let v = self.upper.v_bottom();
        interp1d(x, v.x(), v.y())
    }

    /// Block partition: every x where one of the four lines has a node
    fn breakpoints(&self) -> Vec<f64> {
        merge_breakpoints(&[
            self.upper.depth().x(),
            self.lower.depth().x(),
            self.upper.v_top().x(),
            self.upper.v_bottom().x(),
        ])
    }
}

/// Turns a model into velocity polylines, sections and grids
#[derive(Debug)]
pub struct ModelProcessor<'m> {
    model: &'m Model,
    pois: Option<Vec<LayerPois>>,
    nx: usize,
    ny: usize,
    contour: Option<VelocityGrid>,
}

impl<'m> ModelProcessor<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            pois: None,
            nx: NGRIDX,
            ny: NGRIDY,
            contour: None,
        }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    /// Convert Vp to Vs for Poisson ratio `nu`
    pub fn vp2vs(vp: f64, nu: f64) -> f64 {
        vp / (2.0 * (1.0 - nu) / (1.0 - 2.0 * nu)).sqrt()
    }

    fn bands(&self) -> impl Iterator<Item = Band<'m>> {
        let model: &'m Model = self.model;
        model.layers().windows(2).map(|pair| Band {
            upper: &pair[0],
            lower: &pair[1],
        })
    }

    /// Attach Poisson ratios.
    ///
    /// Base ratios shorter than the layer count are padded with their last
    /// value. Each band gets a step function over its blocks using the
    /// override where one is given, else the band's base ratio.
    ///
    /// # Errors
    /// Returns `InvalidPois` when there is no base ratio, when the override
    /// arrays differ in length, or when a layer or block index is 0.
    pub fn bind_pois(&mut self, data: &PoisData) -> Result<()> {
        let last = *data.pois.last().ok_or_else(|| VinError::InvalidPois {
            reason: "pois must contain at least one value".to_string(),
        })?;
        if data.poisb.len() != data.poisl.len() || data.poisbl.len() != data.poisl.len() {
            return Err(VinError::InvalidPois {
                reason: "poisl, poisb and poisbl must have the same length".to_string(),
            });
        }

        let mut base: Vec<f64> = data.pois.iter().map(|&p| clamp_ratio(p)).collect();
        if base.len() < self.model.nlayer() {
            base.resize(self.model.nlayer(), clamp_ratio(last));
        }

        let mut overrides = Vec::with_capacity(data.override_count());
        for ((&layer, &block), &ratio) in data.poisl.iter().zip(&data.poisb).zip(&data.poisbl) {
            if layer == 0 || block == 0 {
                return Err(VinError::InvalidPois {
                    reason: format!(
                        "layer and block numbers start at 1, got layer {} block {}",
                        layer, block
                    ),
                });
            }
            overrides.push((layer - 1, block - 1, clamp_ratio(ratio)));
        }

        let tables: Vec<LayerPois> = self
            .bands()
            .enumerate()
            .map(|(iband, band)| {
                let band_overrides: Vec<(usize, f64)> = overrides
                    .iter()
                    .filter(|(layer, _, _)| *layer == iband)
                    .map(|&(_, block, ratio)| (block, ratio))
                    .collect();
                LayerPois::build(&band.breakpoints(), base[iband], &band_overrides)
            })
            .collect();

        for (layer, _, _) in overrides.iter().filter(|(layer, _, _)| *layer >= tables.len()) {
            warn!(
                "Poisson override for layer {} ignored, model has {} bands",
                layer + 1,
                tables.len()
            );
        }

        debug!(
            "Bound Poisson ratios to {} bands ({} overrides)",
            tables.len(),
            overrides.len()
        );
        self.pois = Some(tables);
        self.contour = None;
        Ok(())
    }

    /// Drop bound Poisson ratios
    pub fn unbind_pois(&mut self) {
        if self.pois.take().is_some() {
            self.contour = None;
        }
    }

    pub fn has_pois(&self) -> bool {
        self.pois.is_some()
    }

    /// Poisson step function of band `iband`, if bound
    pub fn layer_pois(&self, iband: usize) -> Option<&LayerPois> {
        self.pois.as_ref()?.get(iband)
    }

    /// Grid resolution as `(nx, ny)`
    pub fn resolution(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Change the grid resolution; both axes need at least 2 samples
    pub fn set_resolution(&mut self, nx: usize, ny: usize) -> Result<()> {
        if nx < 2 || ny < 2 {
            return Err(VinError::invariant(format!(
                "grid needs at least 2 samples per axis, got {}x{}",
                nx, ny
            )));
        }
        if (nx, ny) != (self.nx, self.ny) {
            self.nx = nx;
            self.ny = ny;
            self.contour = None;
        }
        Ok(())
    }

    /// Velocity grid over `xlim x ylim`, computed on first use and cached
    /// until the resolution or Poisson data change.
    pub fn get_v_contour(&mut self) -> Result<&VelocityGrid> {
        if self.contour.is_none() {
            let grid = self.compute_contour()?;
            self.contour = Some(grid);
        } else {
            debug!("Reusing cached {}x{} velocity grid", self.nx, self.ny);
        }
        self.contour
            .as_ref()
            .ok_or_else(|| VinError::invariant("velocity grid was not computed"))
    }

    fn compute_contour(&self) -> Result<VelocityGrid> {
        let (xlim, ylim) = match (self.model.xlim(), self.model.ylim()) {
            (Some(xlim), Some(ylim)) => (xlim, ylim),
            _ => return Err(VinError::invariant("model has no layers")),
        };
        let mut grid = VelocityGrid::new(
            linspace(xlim.0, xlim.1, self.nx),
            linspace(ylim.0, ylim.1, self.ny),
            self.has_pois(),
        );
        let nx = grid.nx();

        for (iband, band) in self.bands().enumerate() {
            let x_all = band.breakpoints();
            let y_top_all: Vec<f64> = x_all.iter().map(|&x| band.top_depth(x)).collect();
            let y_bot_all: Vec<f64> = x_all.iter().map(|&x| band.bottom_depth(x)).collect();
            let v_top_all: Vec<f64> = x_all.iter().map(|&x| band.v_top(x)).collect();
            let v_bot_all: Vec<f64> = x_all.iter().map(|&x| band.v_bottom(x)).collect();
            let layer_pois = self.layer_pois(iband);

            let nblock = x_all.len().saturating_sub(1);
            for iblk in 0..nblock {
                let (x1, x2) = (x_all[iblk], x_all[iblk + 1]);
                let last_block = iblk + 1 == nblock;

                // Shared edges belong to the right-hand block
                let mut cells = Vec::new();
                let mut xx = Vec::new();
                let mut yy = Vec::new();
                for (ix, &x) in grid.x.iter().enumerate() {
                    if x < x1 || x > x2 || (x == x2 && !last_block) {
                        continue;
                    }
                    let (top, bottom) = (band.top_depth(x), band.bottom_depth(x));
                    for (iy, &y) in grid.y.iter().enumerate() {
                        if top <= y && y < bottom {
                            cells.push(iy * nx + ix);
                            xx.push(x);
                            yy.push(y);
                        }
                    }
                }
                if cells.is_empty() {
                    continue;
                }

                let vp = interp_block(
                    [x1, x2, x1, x2],
                    [y_top_all[iblk], y_top_all[iblk + 1], y_bot_all[iblk], y_bot_all[iblk + 1]],
                    [v_top_all[iblk], v_top_all[iblk + 1], v_bot_all[iblk], v_bot_all[iblk + 1]],
                    &xx,
                    &yy,
                )?;
                let ratio = layer_pois.map(|pois| pois.at((x1 + x2) / 2.0));

                for (&cell, &v) in cells.iter().zip(&vp) {
                    grid.vp[cell] = v;
                    if let Some(nu) = ratio {
                        if let Some(vs) = grid.vs.as_mut() {
                            vs[cell] = Self::vp2vs(v, nu);
                        }
                        if let Some(pois) = grid.pois.as_mut() {
                            pois[cell] = nu;
                        }
                    }
                }
            }
        }

        debug!(
            "Computed {}x{} velocity grid, {} cells filled",
            grid.nx(),
            grid.ny(),
            grid.filled()
        );
        Ok(grid)
    }

    /// Depths and velocities of every band boundary at `x`.
    ///
    /// Per band: top depth then bottom depth, and top velocity then bottom
    /// velocity.
    pub fn get_v_section(&self, x: f64) -> (Vec<f64>, Vec<f64>) {
        let mut depth = Vec::new();
        let mut vp = Vec::new();
        for band in self.bands() {
            depth.extend([band.top_depth(x), band.bottom_depth(x)]);
            vp.extend([band.v_top(x), band.v_bottom(x)]);
        }
        (depth, vp)
    }

    /// Section at `x` with Vs and Poisson ratio when bound
    pub fn get_section_data(&self, x: f64) -> SectionData {
        let (depth, vp) = self.get_v_section(x);
        let (vs, pois) = match &self.pois {
            Some(tables) => {
                let pois: Vec<f64> = vp
                    .iter()
                    .enumerate()
                    .map(|(i, _)| tables.get(i / 2).map_or(f64::NAN, |t| t.at(x)))
                    .collect();
                let vs = vp
                    .iter()
                    .zip(&pois)
                    .map(|(&v, &nu)| Self::vp2vs(v, nu))
                    .collect();
                (Some(vs), Some(pois))
            }
            None => (None, None),
        };
        SectionData {
            x,
            depth,
            vp,
            vs,
            pois,
        }
    }

    /// Velocity node positions of every band, placed on the depth lines:
    /// top velocity nodes on the band's top, bottom velocity nodes on its
    /// bottom.
    pub fn get_vp_data(&self) -> Vec<BandVelocityNodes> {
        self.bands()
            .map(|band| {
                let top_x = band.upper.v_top().x().to_vec();
                let bottom_x = band.upper.v_bottom().x().to_vec();
                let upper = band.upper.depth();
                let lower = band.lower.depth();
                BandVelocityNodes {
                    top: Polyline {
                        y: interp_many(&top_x, upper.x(), upper.y()),
                        x: top_x,
                    },
                    bottom: Polyline {
                        y: interp_many(&bottom_x, lower.x(), lower.y()),
                        x: bottom_x,
                    },
                }
            })
            .collect()
    }

    /// Clamp a section position into the model's horizontal extent
    pub fn clamp_section_x(&self, x: f64) -> f64 {
        match self.model.xlim() {
            Some((xmin, xmax)) if xmin <= xmax => x.clamp(xmin, xmax),
            _ => x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const END_SCENARIO: &str = "
 1    0.000  10.000
 0    0.000   0.000
          0       0
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
        Model::loads(END_SCENARIO).unwrap()
    }

    #[test]
    fn test_section_at_center() {
        let model = model();
        let proc = ModelProcessor::new(&model);
        let (depth, vp) = proc.get_v_section(5.0);
        assert_eq!(depth, vec![0.0, 1.0]);
        assert_eq!(vp, vec![1.5, 2.0]);
    }

    #[test]
    fn test_vp2vs() {
        assert_relative_eq!(
            ModelProcessor::vp2vs(3.0, 0.25),
            3.0 / 3f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_contour_interpolates_in_depth() {
        let model = model();
        let mut proc = ModelProcessor::new(&model);
        proc.set_resolution(11, 5).unwrap();
        let grid = proc.get_v_contour().unwrap();

        assert_eq!(grid.y, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        for ix in 0..grid.nx() {
            assert_relative_eq!(grid.vp_at(ix, 0).unwrap(), 1.5);
            assert_relative_eq!(grid.vp_at(ix, 2).unwrap(), 1.75);
            // bottom depth of the last band is excluded
            assert!(grid.vp_at(ix, 4).unwrap().is_nan());
        }
        assert!(grid.vs.is_none());
    }

    #[test]
    fn test_contour_resolution_change_recomputes() {
        let model = model();
        let mut proc = ModelProcessor::new(&model);
        proc.set_resolution(4, 3).unwrap();
        assert_eq!(proc.get_v_contour().unwrap().vp.len(), 12);
        proc.set_resolution(6, 3).unwrap();
        assert_eq!(proc.get_v_contour().unwrap().vp.len(), 18);
        assert!(proc.set_resolution(1, 3).is_err());
        assert_eq!(proc.resolution(), (6, 3));
    }

    #[test]
    fn test_bind_pois_adds_vs() {
        let model = model();
        let mut proc = ModelProcessor::new(&model);
        proc.set_resolution(3, 3).unwrap();
        proc.bind_pois(&PoisData::uniform(vec![0.25])).unwrap();
        assert!(proc.has_pois());

        let grid = proc.get_v_contour().unwrap().clone();
        let vp = grid.vp_at(1, 0).unwrap();
        assert_relative_eq!(grid.vs_at(1, 0).unwrap(), vp / 3f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(grid.pois_at(1, 0).unwrap(), 0.25);

        let section = proc.get_section_data(5.0);
        assert_eq!(section.pois, Some(vec![0.25, 0.25]));
        let vs = section.vs.unwrap();
        assert_relative_eq!(vs[1], 2.0 / 3f64.sqrt(), epsilon = 1e-12);

        proc.unbind_pois();
        assert!(!proc.has_pois());
        assert!(proc.get_v_contour().unwrap().vs.is_none());
        assert!(proc.get_section_data(5.0).vs.is_none());
    }

    #[test]
    fn test_bind_pois_rejects_zero_based_override() {
        let model = model();
        let mut proc = ModelProcessor::new(&model);
        let data = PoisData {
            pois: vec![0.25],
            poisl: vec![0],
            poisb: vec![1],
            poisbl: vec![0.3],
        };
        assert!(proc.bind_pois(&data).unwrap_err().is_format_error());
        assert!(proc.bind_pois(&PoisData::default()).is_err());
        assert!(!proc.has_pois());
    }

    #[test]
    fn test_half_ratio_is_clamped() {
        let model = model();
        let mut proc = ModelProcessor::new(&model);
        proc.bind_pois(&PoisData::uniform(vec![0.5])).unwrap();
        let section = proc.get_section_data(1.0);
        let vs = section.vs.unwrap();
        assert!(vs.iter().all(|v| v.is_finite() && *v > 0.0));
        assert_eq!(section.pois, Some(vec![0.49999, 0.49999]));
    }

    #[test]
    fn test_vp_data_sits_on_depth_lines() {
        let model = model();
        let proc = ModelProcessor::new(&model);
        let data = proc.get_vp_data();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].top.x, vec![0.0, 10.0]);
        assert_eq!(data[0].top.y, vec![0.0, 0.0]);
        assert_eq!(data[0].bottom.y, vec![1.0, 1.0]);
    }

    #[test]
    fn test_clamp_section_x() {
        let model = model();
        let proc = ModelProcessor::new(&model);
        assert_eq!(proc.clamp_section_x(-3.0), 0.0);
        assert_eq!(proc.clamp_section_x(4.0), 4.0);
        assert_eq!(proc.clamp_section_x(12.0), 10.0);
    }
}
