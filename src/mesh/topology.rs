//! Lath-based multi-resolution topology.
//!
//! A [`Topology`] owns every lath of a subdivision mesh at every level, the
//! vertex adjacency table, the facet list and the sharpness tags. It also owns
//! the attribute stores (one per time sample) so that allocating a vertex
//! keeps every array in step.
//!
//! # Orientation
//!
//! Facets are supplied counter-clockwise and stored clockwise: following
//! [`cf`](Topology::cf) from a facet's first lath visits its input vertices in
//! reverse order. The edge "owned" by a lath `L` is the one joining
//! `ccf(L)` to `L`; its companion on the neighbouring facet is
//! [`ec(L)`](Topology::ec).
//!
//! # Traversal
//!
//! All derived relations are computed from `cf` and `cv` alone:
//!
//! - `ccf(L)` walks the facet ring until it reaches the predecessor of `L`.
//! - `ccv(L) = cf(cv(cf(L)))`.
//! - `ec(L) = cf(cv(L))`.
//! - [`qfv`](Topology::qfv), [`vertex_fan`](Topology::vertex_fan),
//!   [`qff`](Topology::qff) and [`qve`](Topology::qve) enumerate the corner
//!   ring, the facets around a vertex, the 1-ring of facets around a facet and
//!   the edges around a vertex.
//!
//! Vertex chains may be open (at a boundary, or lazily at a refinement level
//! whose neighbours have not been built yet). Traversals report that through
//! [`VertexFan::closed`] and `Option` links instead of assuming a cycle.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use nalgebra::Point3;

use super::index::{FacetId, LathId, MeshIndex, VertexId};
use super::lath::Lath;
use crate::algo::subdivide::catmull_clark;
use crate::attrib::{AttributeStore, Masks, TimeSlot};
use crate::error::{Result, SubdivError};

/// A topology shared between sibling patches.
///
/// Refinement takes the write lock; traversal and attribute gathering take
/// the read lock.
pub type SharedTopology<I = u32> = Arc<RwLock<Topology<I>>>;

/// The laths around one vertex, in clockwise order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexFan<I: MeshIndex = u32> {
    /// Laths at the vertex. When the fan is open, the first lath has no
    /// predecessor and the last has no `cv` link.
    pub laths: Vec<LathId<I>>,
    /// Whether the chain closes into a cycle.
    pub closed: bool,
}

impl<I: MeshIndex> VertexFan<I> {
    /// Number of laths (and facets) around the vertex.
    pub fn len(&self) -> usize {
        self.laths.len()
    }

    /// Whether the fan is empty.
    pub fn is_empty(&self) -> bool {
        self.laths.is_empty()
    }
}

/// Multi-resolution lath topology with its attribute stores.
#[derive(Debug, Clone)]
pub struct Topology<I: MeshIndex = u32> {
    pub(crate) laths: Vec<Lath<I>>,
    pub(crate) vertex_laths: Vec<Vec<LathId<I>>>,
    pub(crate) base_facets: Vec<LathId<I>>,
    pub(crate) facets: Vec<LathId<I>>,
    pub(crate) sharp_edges: HashMap<LathId<I>, f64>,
    pub(crate) sharp_corners: HashMap<LathId<I>, f64>,
    pub(crate) holes: HashSet<FacetId<I>>,
    pub(crate) slots: Vec<TimeSlot>,
    pub(crate) interpolate_boundary: bool,
    pub(crate) finalised: bool,
}

impl<I: MeshIndex> Topology<I> {
    /// Create an empty topology driven by one or more time samples.
    ///
    /// Slots are sorted by time. Every slot must hold a point-typed `P`.
    pub fn new(mut slots: Vec<TimeSlot>) -> Result<Self> {
        if slots.is_empty() {
            return Err(SubdivError::invalid_param(
                "slots",
                0,
                "at least one time slot is required",
            ));
        }
        for slot in &slots {
            slot.store.points()?;
        }
        slots.sort_by(|a, b| a.time.total_cmp(&b.time));

        Ok(Self {
            laths: Vec::new(),
            vertex_laths: Vec::new(),
            base_facets: Vec::new(),
            facets: Vec::new(),
            sharp_edges: HashMap::new(),
            sharp_corners: HashMap::new(),
            holes: HashSet::new(),
            slots,
            interpolate_boundary: false,
            finalised: false,
        })
    }

    /// Create a static topology from a single attribute store.
    pub fn with_store(store: AttributeStore) -> Result<Self> {
        Self::new(vec![TimeSlot::new(0.0, store)])
    }

    /// Wrap the topology for sharing between patches.
    pub fn into_shared(self) -> SharedTopology<I> {
        Arc::new(RwLock::new(self))
    }

    // ==================== Counts & accessors ====================

    /// Number of laths at all levels.
    #[inline]
    pub fn lath_count(&self) -> usize {
        self.laths.len()
    }

    /// Number of vertices at all levels.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_laths.len()
    }

    /// Number of base facets.
    #[inline]
    pub fn facet_count(&self) -> usize {
        self.base_facets.len()
    }

    /// Representative laths of every facet at every level, base facets first.
    pub fn facets(&self) -> &[LathId<I>] {
        &self.facets
    }

    /// Representative lath of a base facet.
    pub fn facet(&self, id: FacetId<I>) -> Result<LathId<I>> {
        self.base_facets
            .get(id.index())
            .copied()
            .ok_or(SubdivError::InvalidFacet(id.index()))
    }

    /// Whether [`finalise`](Self::finalise) has succeeded.
    #[inline]
    pub fn is_finalised(&self) -> bool {
        self.finalised
    }

    /// Whether boundary facets are rendered.
    #[inline]
    pub fn interpolate_boundary(&self) -> bool {
        self.interpolate_boundary
    }

    /// Set whether boundary facets are rendered.
    pub fn set_interpolate_boundary(&mut self, interpolate: bool) {
        self.interpolate_boundary = interpolate;
    }

    /// Borrow a lath.
    #[inline]
    pub fn lath(&self, id: LathId<I>) -> Result<&Lath<I>> {
        self.laths
            .get(id.index())
            .ok_or(SubdivError::InvalidLath(id.index()))
    }

    #[inline]
    pub(crate) fn lath_mut(&mut self, id: LathId<I>) -> Result<&mut Lath<I>> {
        self.laths
            .get_mut(id.index())
            .ok_or(SubdivError::InvalidLath(id.index()))
    }

    /// Laths referencing a vertex, in insertion order.
    pub fn vertex_laths(&self, v: VertexId<I>) -> Result<&[LathId<I>]> {
        self.vertex_laths
            .get(v.index())
            .map(|l| l.as_slice())
            .ok_or(SubdivError::InvalidVertexIndex {
                face: usize::MAX,
                vertex: v.index(),
            })
    }

    /// Time samples, sorted by time.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Number of time samples.
    #[inline]
    pub fn time_count(&self) -> usize {
        self.slots.len()
    }

    /// Attribute store of time sample `slot`.
    pub fn store(&self, slot: usize) -> Result<&AttributeStore> {
        self.slots
            .get(slot)
            .map(|s| &s.store)
            .ok_or_else(|| SubdivError::invalid_param("slot", slot, "no such time slot"))
    }

    /// Vertex positions of time sample `slot`.
    pub fn points(&self, slot: usize) -> Result<&[Point3<f64>]> {
        self.store(slot)?.points()
    }

    /// Check that every store matches the vertex and facet counts.
    pub fn validate_stores(&self) -> Result<()> {
        for slot in &self.slots {
            slot.store
                .validate(self.vertex_count(), self.facet_count())?;
        }
        Ok(())
    }

    // ==================== Construction ====================

    /// Size the adjacency table for `vertex_count` input vertices.
    pub fn prepare(&mut self, vertex_count: usize) -> Result<()> {
        if vertex_count > self.vertex_laths.len() {
            self.ensure_capacity(0, vertex_count - self.vertex_laths.len())?;
        }
        self.vertex_laths.resize_with(vertex_count, Vec::new);
        Ok(())
    }

    /// Add a facet given its vertex indices in counter-clockwise order.
    ///
    /// Returns the new facet's id. Facets cannot be added after the topology
    /// has been finalised.
    pub fn add_facet(&mut self, indices: &[usize]) -> Result<FacetId<I>> {
        let face = self.base_facets.len();
        if self.finalised {
            return Err(SubdivError::invalid_param(
                "facet",
                face,
                "topology already finalised",
            ));
        }
        if indices.len() < 3 {
            return Err(SubdivError::DegenerateFace { face });
        }
        for (k, &v) in indices.iter().enumerate() {
            if v >= self.vertex_laths.len() {
                return Err(SubdivError::InvalidVertexIndex { face, vertex: v });
            }
            if indices[..k].contains(&v) {
                return Err(SubdivError::DegenerateFace { face });
            }
        }

        self.ensure_capacity(indices.len(), 0)?;
        let id = FacetId::try_new(face).ok_or_else(|| overflow::<I>(face))?;
        let first = self.laths.len();
        for &v in indices {
            self.new_lath(VertexId::new(v), id, 0)?;
        }
        let n = indices.len();
        for k in 0..n {
            let prev = if k == 0 { first + n - 1 } else { first + k - 1 };
            self.laths[first + k].cf = LathId::new(prev);
        }

        let rep = LathId::new(first);
        self.base_facets.push(rep);
        self.facets.push(rep);
        Ok(id)
    }

    /// Allocate a lath and register it with its vertex.
    pub(crate) fn new_lath(
        &mut self,
        vertex: VertexId<I>,
        facet: FacetId<I>,
        level: u32,
    ) -> Result<LathId<I>> {
        let index = self.laths.len();
        let id = LathId::try_new(index).ok_or_else(|| overflow::<I>(index))?;
        self.laths.push(Lath::new(vertex, facet, level));
        self.vertex_laths[vertex.index()].push(id);
        Ok(id)
    }

    /// Append one vertex to every attribute store using `masks`.
    pub(crate) fn push_vertex(&mut self, masks: &Masks) -> Result<VertexId<I>> {
        let index = self.vertex_laths.len();
        let id = VertexId::try_new(index).ok_or_else(|| overflow::<I>(index))?;
        for slot in &mut self.slots {
            slot.store.append(masks)?;
        }
        self.vertex_laths.push(Vec::new());
        Ok(id)
    }

    /// Fail unless `laths` more laths and `vertices` more vertices fit in `I`.
    ///
    /// Checked before a facet is built so an overflow never leaves half a
    /// facet behind.
    pub(crate) fn ensure_capacity(&self, laths: usize, vertices: usize) -> Result<()> {
        let last_lath = self.laths.len() + laths;
        if last_lath > 0 && I::try_from_usize(last_lath - 1).is_none() {
            return Err(overflow::<I>(last_lath - 1));
        }
        let last_vertex = self.vertex_laths.len() + vertices;
        if last_vertex > 0 && I::try_from_usize(last_vertex - 1).is_none() {
            return Err(overflow::<I>(last_vertex - 1));
        }
        Ok(())
    }

    /// Add the refined position of the vertex at `lath` (corner mask).
    pub fn add_vertex(&mut self, lath: LathId<I>) -> Result<VertexId<I>> {
        let masks = catmull_clark::vertex_masks(self, lath)?;
        self.push_vertex(&masks)
    }

    /// Add the edge point of the edge owned by `lath` (edge mask).
    pub fn add_edge_vertex(&mut self, lath: LathId<I>) -> Result<VertexId<I>> {
        let masks = catmull_clark::edge_masks(self, lath)?;
        self.push_vertex(&masks)
    }

    /// Add the face point of the facet containing `lath` (centroid mask).
    pub fn add_face_vertex(&mut self, lath: LathId<I>) -> Result<VertexId<I>> {
        let masks = catmull_clark::face_masks(self, lath)?;
        self.push_vertex(&masks)
    }

    // ==================== Sharpness & holes ====================

    /// Tag the edge between two input vertices as sharp.
    pub fn add_sharp_edge(&mut self, v0: usize, v1: usize, weight: f64) -> Result<()> {
        let lath = self
            .find_edge(VertexId::new(v0), VertexId::new(v1))
            .ok_or(SubdivError::UnknownEdge { v0, v1 })?;
        self.set_edge_sharpness(lath, weight);
        Ok(())
    }

    /// Tag an input vertex as a sharp corner.
    pub fn add_sharp_corner(&mut self, v: usize, weight: f64) -> Result<()> {
        let lath = self
            .vertex_laths
            .get(v)
            .and_then(|l| l.first().copied())
            .ok_or(SubdivError::InvalidVertexIndex {
                face: usize::MAX,
                vertex: v,
            })?;
        self.set_corner_sharpness(lath, weight);
        Ok(())
    }

    /// Mark a base facet as a hole.
    pub fn add_hole(&mut self, facet: FacetId<I>) -> Result<()> {
        self.facet(facet)?;
        self.holes.insert(facet);
        Ok(())
    }

    /// Whether a base facet is a hole.
    pub fn is_hole(&self, facet: FacetId<I>) -> bool {
        self.holes.contains(&facet)
    }

    pub(crate) fn set_edge_sharpness(&mut self, lath: LathId<I>, weight: f64) {
        if weight > 0.0 {
            self.sharp_edges.insert(lath, weight);
        }
    }

    pub(crate) fn set_corner_sharpness(&mut self, lath: LathId<I>, weight: f64) {
        if weight > 0.0 {
            self.sharp_corners.insert(lath, weight);
        }
    }

    /// Sharpness of the edge owned by `lath`, from either side.
    pub fn edge_sharpness(&self, lath: LathId<I>) -> Result<f64> {
        let own = self.sharp_edges.get(&lath).copied().unwrap_or(0.0);
        let other = match self.ec(lath)? {
            Some(e) => self.sharp_edges.get(&e).copied().unwrap_or(0.0),
            None => 0.0,
        };
        Ok(own.max(other))
    }

    /// Sharpness of the vertex at `lath`, from any lath at that vertex.
    pub fn corner_sharpness(&self, lath: LathId<I>) -> Result<f64> {
        if self.sharp_corners.is_empty() {
            self.lath(lath)?;
            return Ok(0.0);
        }
        let v = self.vertex_of(lath)?;
        Ok(self
            .vertex_laths(v)?
            .iter()
            .filter_map(|l| self.sharp_corners.get(l))
            .fold(0.0, |acc: f64, &w| acc.max(w)))
    }

    /// Whether any edge or corner of the facet at `lath` is sharp.
    pub fn is_smooth_facet(&self, lath: LathId<I>) -> Result<bool> {
        for corner in self.qfv(lath)? {
            if self.edge_sharpness(corner)? != 0.0 || self.corner_sharpness(corner)? != 0.0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The lath owning the edge between `v0` and `v1`, if any facet has it.
    pub fn find_edge(&self, v0: VertexId<I>, v1: VertexId<I>) -> Option<LathId<I>> {
        let owner = |a: VertexId<I>, b: VertexId<I>| {
            self.vertex_laths.get(b.index())?.iter().copied().find(|&l| {
                self.ccf(l)
                    .and_then(|p| self.vertex_of(p))
                    .map_or(false, |pv| pv == a)
            })
        };
        owner(v0, v1).or_else(|| owner(v1, v0))
    }

    // ==================== Lath links ====================

    /// Vertex referenced by `lath`.
    #[inline]
    pub fn vertex_of(&self, lath: LathId<I>) -> Result<VertexId<I>> {
        Ok(self.lath(lath)?.vertex)
    }

    /// Next lath clockwise around the facet.
    #[inline]
    pub fn cf(&self, lath: LathId<I>) -> Result<LathId<I>> {
        Ok(self.lath(lath)?.cf)
    }

    /// Next lath clockwise around the vertex.
    #[inline]
    pub fn cv(&self, lath: LathId<I>) -> Result<Option<LathId<I>>> {
        Ok(self.lath(lath)?.cv.get())
    }

    /// Next lath counter-clockwise around the facet.
    pub fn ccf(&self, lath: LathId<I>) -> Result<LathId<I>> {
        let mut cur = lath;
        for _ in 0..=self.laths.len() {
            let next = self.cf(cur)?;
            if next == lath {
                return Ok(cur);
            }
            cur = next;
        }
        Err(SubdivError::InvalidLath(lath.index()))
    }

    /// Next lath counter-clockwise around the vertex.
    pub fn ccv(&self, lath: LathId<I>) -> Result<Option<LathId<I>>> {
        match self.cv(self.cf(lath)?)? {
            Some(l) => Ok(Some(self.cf(l)?)),
            None => Ok(None),
        }
    }

    /// The lath owning the same edge from the neighbouring facet.
    pub fn ec(&self, lath: LathId<I>) -> Result<Option<LathId<I>>> {
        match self.cv(lath)? {
            Some(l) => Ok(Some(self.cf(l)?)),
            None => Ok(None),
        }
    }

    /// The two vertices of the edge owned by `lath`, as `(ccf(L), L)`.
    pub fn edge_vertices(&self, lath: LathId<I>) -> Result<(VertexId<I>, VertexId<I>)> {
        Ok((self.vertex_of(self.ccf(lath)?)?, self.vertex_of(lath)?))
    }

    // ==================== Rings ====================

    /// Iterate the corners of the facet containing `lath`, starting at `lath`.
    pub fn face_laths(&self, lath: LathId<I>) -> FaceLathIter<'_, I> {
        FaceLathIter::new(self, lath)
    }

    /// Corner ring of a facet in clockwise order (Qfv).
    pub fn qfv(&self, lath: LathId<I>) -> Result<Vec<LathId<I>>> {
        self.lath(lath)?;
        let ring: Vec<LathId<I>> = self.face_laths(lath).collect();
        if ring.len() > self.laths.len() {
            return Err(SubdivError::InvalidLath(lath.index()));
        }
        Ok(ring)
    }

    /// Number of corners of the facet containing `lath`.
    pub fn corner_count(&self, lath: LathId<I>) -> Result<usize> {
        Ok(self.qfv(lath)?.len())
    }

    /// Laths around the vertex at `lath` (Qvf).
    ///
    /// A closed fan starts at `lath`. An open fan is walked forward along
    /// `cv` and backward along `ccv`, and starts at its first lath.
    pub fn vertex_fan(&self, lath: LathId<I>) -> Result<VertexFan<I>> {
        let limit = self.vertex_laths(self.vertex_of(lath)?)?.len();

        let mut forward = vec![lath];
        let mut cur = self.cv(lath)?;
        while let Some(next) = cur {
            if next == lath {
                return Ok(VertexFan {
                    laths: forward,
                    closed: true,
                });
            }
            if forward.len() >= limit {
                return Err(SubdivError::InvalidLath(lath.index()));
            }
            forward.push(next);
            cur = self.cv(next)?;
        }

        let mut backward = Vec::new();
        let mut cur = self.ccv(lath)?;
        while let Some(prev) = cur {
            if forward.len() + backward.len() >= limit {
                return Err(SubdivError::InvalidLath(lath.index()));
            }
            backward.push(prev);
            cur = self.ccv(prev)?;
        }
        backward.reverse();
        backward.extend(forward);

        Ok(VertexFan {
            laths: backward,
            closed: false,
        })
    }

    /// Laths of the facets around the vertex at `lath`.
    pub fn qvf(&self, lath: LathId<I>) -> Result<Vec<LathId<I>>> {
        Ok(self.vertex_fan(lath)?.laths)
    }

    /// Edges around the vertex at `lath`, each identified by its owning lath.
    pub fn qve(&self, lath: LathId<I>) -> Result<Vec<LathId<I>>> {
        let fan = self.vertex_fan(lath)?;
        let mut edges = fan.laths.clone();
        if !fan.closed {
            edges.push(self.cf(fan.laths[0])?);
        }
        Ok(edges)
    }

    /// Number of facets around the vertex at `lath`.
    pub fn valence(&self, lath: LathId<I>) -> Result<usize> {
        Ok(self.vertex_fan(lath)?.len())
    }

    /// Whether the vertex at `lath` has an open fan.
    pub fn is_boundary_vertex(&self, lath: LathId<I>) -> Result<bool> {
        Ok(!self.vertex_fan(lath)?.closed)
    }

    /// Whether any corner of the facet at `lath` is a boundary vertex.
    pub fn is_boundary_facet(&self, lath: LathId<I>) -> Result<bool> {
        for corner in self.qfv(lath)? {
            if self.is_boundary_vertex(corner)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Canonical lath of a facet: the smallest handle on its ring.
    pub fn facet_key(&self, lath: LathId<I>) -> Result<LathId<I>> {
        self.qfv(lath)?
            .into_iter()
            .min()
            .ok_or(SubdivError::InvalidLath(lath.index()))
    }

    /// Facets sharing a vertex with the facet at `lath`, itself included (Qff).
    ///
    /// Each facet is reported once, by its [`facet_key`](Self::facet_key).
    pub fn qff(&self, lath: LathId<I>) -> Result<Vec<LathId<I>>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for corner in self.qfv(lath)? {
            for around in self.vertex_fan(corner)?.laths {
                let key = self.facet_key(around)?;
                if seen.insert(key) {
                    out.push(key);
                }
            }
        }
        Ok(out)
    }

    /// Vertex indices of the facet at `lath`, in input (counter-clockwise) order.
    pub fn facet_vertices(&self, lath: LathId<I>) -> Result<Vec<VertexId<I>>> {
        let ring = self.qfv(lath)?;
        let mut out = Vec::with_capacity(ring.len());
        out.push(self.vertex_of(ring[0])?);
        for &l in ring[1..].iter().rev() {
            out.push(self.vertex_of(l)?);
        }
        Ok(out)
    }
}

fn overflow<I: MeshIndex>(index: usize) -> SubdivError {
    SubdivError::IndexOverflow {
        index,
        limit: I::MAX.to_usize(),
    }
}

/// Iterator over the laths of one facet.
pub struct FaceLathIter<'a, I: MeshIndex = u32> {
    topology: &'a Topology<I>,
    start: LathId<I>,
    current: LathId<I>,
    remaining: usize,
}

impl<'a, I: MeshIndex> FaceLathIter<'a, I> {
    fn new(topology: &'a Topology<I>, start: LathId<I>) -> Self {
        let valid = topology.lath(start).is_ok();
        Self {
            topology,
            start,
            current: start,
            // one past the arena size so a broken ring is detectable by the caller
            remaining: if valid { topology.lath_count() + 1 } else { 0 },
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceLathIter<'a, I> {
    type Item = LathId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let result = self.current;
        match self.topology.laths.get(result.index()) {
            Some(lath) if lath.cf != self.start => self.current = lath.cf,
            _ => self.remaining = 0,
        }
        Some(result)
    }
}
