//! One facet of a subdivision mesh at one refinement level.

use std::sync::Arc;

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::trace;

use super::bicubic::BicubicPatch;
use super::bound::Bound;
use super::grid::MicroPolyGrid;
use super::motion::Motion;
use super::options::DiceOptions;
use crate::algo::subdivide::{
    can_use_patch, patch_control_vertices, refine_neighbourhood, refine_to_depth, subdivide_face,
};
use crate::attrib::TimeSlot;
use crate::error::{Result, SubdivError};
use crate::mesh::{LathId, MeshIndex, SharedTopology, Topology};

/// Parametric direction with the larger screen extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitDir {
    /// Along u (input edge `v0 -> v1`).
    #[default]
    U,
    /// Along v (input edge `v0 -> v3`).
    V,
}

/// Result of [`SubdivisionPatch::split`].
#[derive(Debug, Clone)]
pub enum Surface<I: MeshIndex = u32> {
    /// A finer facet still to be diced or split.
    Patch(SubdivisionPatch<I>),
    /// A regular neighbourhood converted to Bezier form, one per time sample.
    Bicubic(Motion<BicubicPatch>),
}

/// A facet of a shared topology, as seen by the tessellation scheduler.
///
/// A patch starts unrefined. [`diceable`](Self::diceable) decides whether it
/// can be diced directly; otherwise [`split`](Self::split) replaces it by
/// finer patches or a bicubic patch.
#[derive(Debug, Clone)]
pub struct SubdivisionPatch<I: MeshIndex = u32> {
    topology: SharedTopology<I>,
    face: LathId<I>,
    can_dice: bool,
    discard: bool,
    u_dice: u32,
    v_dice: u32,
    split_dir: SplitDir,
}

impl<I: MeshIndex> SubdivisionPatch<I> {
    /// Wrap the facet at `face`.
    pub fn new(topology: SharedTopology<I>, face: LathId<I>) -> Self {
        Self {
            topology,
            face,
            can_dice: true,
            discard: false,
            u_dice: 1,
            v_dice: 1,
            split_dir: SplitDir::U,
        }
    }

    /// The facet's representative lath.
    pub fn face(&self) -> LathId<I> {
        self.face
    }

    /// The shared topology.
    pub fn topology(&self) -> &SharedTopology<I> {
        &self.topology
    }

    /// Whether the last [`diceable`](Self::diceable) found a zero screen
    /// extent. Discarded patches produce nothing.
    pub fn is_discarded(&self) -> bool {
        self.discard
    }

    /// Direction of the larger screen extent, from the last
    /// [`diceable`](Self::diceable).
    pub fn split_dir(&self) -> SplitDir {
        self.split_dir
    }

    /// Dice resolution `(u, v)` computed by the last
    /// [`diceable`](Self::diceable).
    pub fn dice_size(&self) -> (u32, u32) {
        (self.u_dice, self.v_dice)
    }

    /// Mark whether an earlier visibility pass allows dicing this patch.
    pub fn set_diceable(&mut self, diceable: bool) {
        self.can_dice = diceable;
    }

    /// Subdivision level of the facet.
    pub fn level(&self) -> Result<u32> {
        let topo = self.topology.read()?;
        Ok(topo.lath(self.face)?.level())
    }

    /// Number of corners of the facet.
    pub fn corner_count(&self) -> Result<usize> {
        self.topology.read()?.corner_count(self.face)
    }

    /// Whether the facet's neighbourhood is regular enough for a bicubic
    /// patch.
    pub fn is_regular(&self) -> Result<bool> {
        let mut topo = self.topology.write()?;
        refine_neighbourhood(&mut topo, self.face)?;
        can_use_patch(&topo, self.face)
    }

    /// Bound of the facet's 1-ring over every time sample.
    ///
    /// The limit surface of a facet lies inside the hull of its neighbours,
    /// so the neighbourhood is refined first.
    pub fn bound(&self) -> Result<Bound> {
        let mut topo = self.topology.write()?;
        refine_neighbourhood(&mut topo, self.face)?;

        let mut bound = Bound::empty();
        for f in topo.qff(self.face)? {
            for v in topo.facet_vertices(f)? {
                for slot in 0..topo.time_count() {
                    let p = topo.points(slot)?.get(v.index()).ok_or_else(|| {
                        SubdivError::AttributeMismatch(format!("no position for vertex {}", v.index()))
                    })?;
                    bound.encapsulate(p);
                }
            }
        }
        Ok(bound)
    }

    /// Decide whether the patch can be diced at the current projection.
    ///
    /// Regular neighbourhoods and non-quads always split. Otherwise the u and
    /// v screen extents of the control hull set a power-of-two dice size;
    /// the patch splits when either exceeds `sqrt_grid_size`, and is
    /// discarded when either is zero.
    pub fn diceable(&mut self, options: &DiceOptions) -> Result<bool> {
        options.validate()?;
        if !self.can_dice {
            return Ok(false);
        }

        let corners = {
            let mut topo = self.topology.write()?;
            refine_neighbourhood(&mut topo, self.face)?;
            if can_use_patch(&topo, self.face)? {
                trace!(face = self.face.index(), "regular patch, not dicing");
                return Ok(false);
            }
            let ring = topo.facet_vertices(self.face)?;
            if ring.len() != 4 {
                return Ok(false);
            }
            let points = topo.points(0)?;
            let mut hull = [Point3::origin(); 4];
            for (slot, v) in hull.iter_mut().zip(&ring) {
                let p = points.get(v.index()).ok_or(SubdivError::InvalidVertexIndex {
                    face: usize::MAX,
                    vertex: v.index(),
                })?;
                *slot = options.raster_transform.transform_point(p);
            }
            hull
        };

        let len2 = |a: usize, b: usize| (corners[b].xy() - corners[a].xy()).norm_squared();
        let u_len = len2(0, 1).max(len2(3, 2));
        let v_len = len2(0, 3).max(len2(1, 2));
        let u_len = (u_len / options.shading_rate).sqrt();
        let v_len = (v_len / options.shading_rate).sqrt();

        self.split_dir = if u_len > v_len { SplitDir::U } else { SplitDir::V };

        if !(u_len >= f64::from(f32::EPSILON) && v_len >= f64::from(f32::EPSILON)) {
            self.discard = true;
            trace!(face = self.face.index(), "zero screen extent, discarding");
            return Ok(false);
        }

        self.u_dice = dice_size(u_len);
        self.v_dice = dice_size(v_len);
        let fits = self.u_dice <= options.sqrt_grid_size && self.v_dice <= options.sqrt_grid_size;
        trace!(
            face = self.face.index(),
            u = self.u_dice,
            v = self.v_dice,
            fits,
            "dice size"
        );
        Ok(fits)
    }

    /// Replace the patch by finer surfaces.
    ///
    /// A regular neighbourhood becomes one bicubic patch (motion-sampled if
    /// the topology has several time samples); anything else is subdivided
    /// once and yields one patch per child facet.
    pub fn split(&self, options: &DiceOptions) -> Result<Vec<Surface<I>>> {
        let mut topo = self.topology.write()?;
        refine_neighbourhood(&mut topo, self.face)?;

        if let Some(control) = patch_control_vertices(&topo, self.face)? {
            let control = control.map(|v| v.index());
            let facet = topo.lath(self.face)?.facet().index();
            let samples = topo
                .slots()
                .iter()
                .map(|slot| {
                    BicubicPatch::from_control_block(&slot.store, &control, facet, options.uses)
                        .map(|p| (slot.time, p))
                })
                .collect::<Result<Vec<_>>>()?;
            trace!(face = self.face.index(), "split into bicubic patch");
            return Motion::from_samples(samples)
                .map(|m| vec![Surface::Bicubic(m)])
                .ok_or(SubdivError::invalid_param("slots", 0, "no time samples"));
        }

        let children = subdivide_face(&mut topo, self.face)?;
        trace!(face = self.face.index(), children = children.len(), "split into child facets");
        Ok(children
            .into_iter()
            .map(|c| Surface::Patch(SubdivisionPatch::new(Arc::clone(&self.topology), c)))
            .collect())
    }

    /// Refine the facet to its dice size and extract a grid per time sample.
    ///
    /// The grid resolution is the larger of the u and v dice sizes, at least
    /// 2 and at most `sqrt_grid_size` rounded down to a power of two.
    pub fn dice(&self, options: &DiceOptions) -> Result<Motion<MicroPolyGrid>> {
        options.validate()?;
        let cap = prev_power_of_two(options.sqrt_grid_size);
        let size = self.u_dice.max(self.v_dice).clamp(2, cap);
        let depth = size.trailing_zeros();

        let finest = {
            let mut topo = self.topology.write()?;
            refine_to_depth(&mut topo, self.face, depth)?
        };
        let start = *finest.first().ok_or(SubdivError::InvalidLath(self.face.index()))?;

        let topo = self.topology.read()?;
        let indices = grid_indices(&topo, start, size as usize)?;
        let facet = topo.lath(self.face)?.facet().index();

        let gather = |slot: &TimeSlot| {
            MicroPolyGrid::gather(&slot.store, &indices, facet, size as usize, options)
                .map(|g| (slot.time, g))
        };
        let grids = if options.parallel {
            topo.slots().par_iter().map(gather).collect::<Result<Vec<_>>>()?
        } else {
            topo.slots().iter().map(gather).collect::<Result<Vec<_>>>()?
        };
        trace!(face = self.face.index(), size, samples = grids.len(), "diced");

        Motion::from_samples(grids).ok_or(SubdivError::invalid_param("slots", 0, "no time samples"))
    }
}

/// Nearest power of two of a screen extent, at least 1.
fn dice_size(len: f64) -> u32 {
    let rounded = len.round().clamp(1.0, f64::from(u32::MAX >> 1));
    (rounded as u32).next_power_of_two()
}

fn prev_power_of_two(n: u32) -> u32 {
    1 << (31 - n.leading_zeros())
}

fn cv<I: MeshIndex>(topo: &Topology<I>, lath: LathId<I>) -> Result<LathId<I>> {
    topo.cv(lath)?
        .ok_or(SubdivError::OpenVertexRing { lath: lath.index() })
}

fn ccv<I: MeshIndex>(topo: &Topology<I>, lath: LathId<I>) -> Result<LathId<I>> {
    topo.ccv(lath)?
        .ok_or(SubdivError::OpenVertexRing { lath: lath.index() })
}

/// Mesh vertex of every sample of a `size x size` grid, row-major.
///
/// `start` is the finest facet at the patch's first corner. Row 0 runs along
/// the facet's first input edge; each further row steps one facet inwards
/// and walks the same direction.
fn grid_indices<I: MeshIndex>(topo: &Topology<I>, start: LathId<I>, size: usize) -> Result<Vec<usize>> {
    let stride = size + 1;
    let mut out = vec![0usize; stride * stride];

    out[0] = topo.vertex_of(start)?.index();
    let mut p = topo.ccf(start)?;
    for c in 0..size {
        out[c + 1] = topo.vertex_of(p)?.index();
        if c + 1 < size {
            p = topo.ccf(cv(topo, p)?)?;
        }
    }

    let mut row = start;
    for r in 1..=size {
        let mut p = topo.cf(row)?;
        if r < size {
            row = ccv(topo, p)?;
        }
        let base = r * stride;
        out[base] = topo.vertex_of(p)?.index();
        p = topo.cf(p)?;
        for c in 0..size {
            out[base + c + 1] = topo.vertex_of(p)?.index();
            if c + 1 < size {
                p = topo.cf(ccv(topo, p)?)?;
            }
        }
    }
    Ok(out)
}
