//! The lath: one corner of one facet.
//!
//! A lath references a single vertex and carries two adjacency links:
//!
//! - `cf`: the next lath clockwise around the same facet. Following `cf`
//!   always returns to the start after visiting every corner of the facet.
//! - `cv`: the next lath clockwise around the same vertex, i.e. the corner
//!   of the facet across the edge joining this corner to its counter-clockwise
//!   predecessor. Set by finalisation or during refinement, and absent where
//!   that edge lies on a boundary.
//!
//! Everything else (counter-clockwise links, edge companions, rings) is
//! derived from these two links by [`Topology`](super::Topology).
//!
//! Refinement caches its results on the coarse laths: `child_vertex`,
//! `mid_vertex` and `face_vertex` point at laths of the next level, while
//! each new lath points back at the facet it was cut from via `parent_facet`.

use super::index::{FacetId, LathId, MeshIndex, VertexId};

/// One corner of one facet.
#[derive(Debug, Clone, Copy)]
pub struct Lath<I: MeshIndex = u32> {
    pub(crate) vertex: VertexId<I>,
    pub(crate) cf: LathId<I>,
    pub(crate) cv: LathId<I>,
    pub(crate) parent_facet: LathId<I>,
    pub(crate) child_vertex: LathId<I>,
    pub(crate) mid_vertex: LathId<I>,
    pub(crate) face_vertex: LathId<I>,
    pub(crate) facet: FacetId<I>,
    pub(crate) level: u32,
}

impl<I: MeshIndex> Lath<I> {
    /// Create an unlinked lath on `vertex` that belongs to base facet `facet`.
    pub fn new(vertex: VertexId<I>, facet: FacetId<I>, level: u32) -> Self {
        Self {
            vertex,
            cf: LathId::invalid(),
            cv: LathId::invalid(),
            parent_facet: LathId::invalid(),
            child_vertex: LathId::invalid(),
            mid_vertex: LathId::invalid(),
            face_vertex: LathId::invalid(),
            facet,
            level,
        }
    }

    /// The vertex this corner references.
    #[inline]
    pub fn vertex(&self) -> VertexId<I> {
        self.vertex
    }

    /// Next lath clockwise around the facet.
    #[inline]
    pub fn face_neighbor(&self) -> LathId<I> {
        self.cf
    }

    /// Next lath clockwise around the vertex, if linked.
    #[inline]
    pub fn vertex_neighbor(&self) -> Option<LathId<I>> {
        self.cv.get()
    }

    /// A lath of the facet this one was cut from.
    #[inline]
    pub fn parent_facet(&self) -> Option<LathId<I>> {
        self.parent_facet.get()
    }

    /// The corner lath of the next level that replaces this vertex.
    #[inline]
    pub fn child_vertex(&self) -> Option<LathId<I>> {
        self.child_vertex.get()
    }

    /// The lath of the next level sitting on the midpoint of this corner's edge.
    #[inline]
    pub fn mid_vertex(&self) -> Option<LathId<I>> {
        self.mid_vertex.get()
    }

    /// The lath of the next level sitting on this facet's face point.
    #[inline]
    pub fn face_vertex(&self) -> Option<LathId<I>> {
        self.face_vertex.get()
    }

    /// The base facet this lath descends from.
    #[inline]
    pub fn facet(&self) -> FacetId<I> {
        self.facet
    }

    /// Subdivision level; base facets are level 0.
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Whether the facet containing this lath has been refined.
    #[inline]
    pub fn is_refined(&self) -> bool {
        self.face_vertex.is_valid()
    }
}
