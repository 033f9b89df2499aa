//! Topology construction from polygon lists.
//!
//! [`MeshDescription`] gathers everything the scene layer supplies about a
//! subdivision mesh apart from its primitive variables: the facet index
//! lists, the boundary flag, sharpness tags and holes. [`build_topology`]
//! turns it into a finalised [`Topology`] driven by one or more time slots.

use nalgebra::Point3;
use tracing::debug;

use super::index::{FacetId, MeshIndex};
use super::topology::Topology;
use crate::attrib::{AttributeStore, TimeSlot};
use crate::error::{Result, SubdivError};

/// Connectivity and tags of a subdivision mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshDescription {
    /// Vertex indices of each facet, counter-clockwise.
    pub faces: Vec<Vec<usize>>,
    /// Whether facets touching the boundary are rendered.
    pub interpolate_boundary: bool,
    /// Sharp edges as `(v0, v1, weight)`.
    pub sharp_edges: Vec<(usize, usize, f64)>,
    /// Sharp corners as `(vertex, weight)`.
    pub sharp_corners: Vec<(usize, f64)>,
    /// Indices of facets that are holes.
    pub holes: Vec<usize>,
}

impl MeshDescription {
    /// Describe a mesh with the given facets and no tags.
    pub fn new<F: AsRef<[usize]>>(faces: &[F]) -> Self {
        Self {
            faces: faces.iter().map(|f| f.as_ref().to_vec()).collect(),
            ..Default::default()
        }
    }

    /// Set whether boundary facets are rendered.
    pub fn with_interpolate_boundary(mut self, interpolate: bool) -> Self {
        self.interpolate_boundary = interpolate;
        self
    }

    /// Add a sharp edge.
    pub fn with_sharp_edge(mut self, v0: usize, v1: usize, weight: f64) -> Self {
        self.sharp_edges.push((v0, v1, weight));
        self
    }

    /// Add a sharp corner.
    pub fn with_sharp_corner(mut self, v: usize, weight: f64) -> Self {
        self.sharp_corners.push((v, weight));
        self
    }

    /// Mark a facet as a hole.
    pub fn with_hole(mut self, facet: usize) -> Self {
        self.holes.push(facet);
        self
    }
}

/// Build and finalise a topology.
///
/// The vertex count is taken from `P` in the first slot; every slot must
/// agree with it.
pub fn build_topology<I: MeshIndex>(desc: &MeshDescription, slots: Vec<TimeSlot>) -> Result<Topology<I>> {
    if desc.faces.is_empty() {
        return Err(SubdivError::EmptyMesh);
    }
    for (w, name) in desc
        .sharp_edges
        .iter()
        .map(|e| (e.2, "sharp_edges"))
        .chain(desc.sharp_corners.iter().map(|c| (c.1, "sharp_corners")))
    {
        if !w.is_finite() || w < 0.0 {
            return Err(SubdivError::invalid_param(
                name,
                w,
                "weights must be finite and non-negative",
            ));
        }
    }

    let mut topo = Topology::new(slots)?;
    let vertex_count = topo.store(0)?.vertex_count();
    topo.prepare(vertex_count)?;
    topo.set_interpolate_boundary(desc.interpolate_boundary);

    for face in &desc.faces {
        topo.add_facet(face)?;
    }
    topo.finalise()?;

    for &(v0, v1, w) in &desc.sharp_edges {
        topo.add_sharp_edge(v0, v1, w)?;
    }
    for &(v, w) in &desc.sharp_corners {
        topo.add_sharp_corner(v, w)?;
    }
    for &h in &desc.holes {
        topo.add_hole(FacetId::new(h))?;
    }

    debug!(
        vertices = vertex_count,
        facets = topo.facet_count(),
        time_slots = topo.time_count(),
        sharp_edges = desc.sharp_edges.len(),
        sharp_corners = desc.sharp_corners.len(),
        holes = desc.holes.len(),
        "built subdivision topology"
    );
    Ok(topo)
}

/// Build a static, untagged topology from positions and polygons.
///
/// # Example
/// ```
/// use lathwork::mesh::{build_from_polygons, Topology};
/// use nalgebra::Point3;
///
/// let points = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let topo: Topology = build_from_polygons(&points, &[[0usize, 1, 2, 3]]).unwrap();
/// assert_eq!(topo.facet_count(), 1);
/// assert!(topo.is_finalised());
/// ```
pub fn build_from_polygons<I: MeshIndex, F: AsRef<[usize]>>(
    points: &[Point3<f64>],
    faces: &[F],
) -> Result<Topology<I>> {
    build_topology(
        &MeshDescription::new(faces),
        vec![TimeSlot::new(0.0, AttributeStore::new(points.to_vec()))],
    )
}

/// Row-major `nx` by `ny` grid of unit quads in the z = 0 plane.
#[cfg(test)]
pub(crate) fn grid_mesh(nx: usize, ny: usize) -> (Vec<Point3<f64>>, Vec<[usize; 4]>) {
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
    for y in 0..=ny {
        for x in 0..=nx {
            points.push(Point3::new(x as f64, y as f64, 0.0));
        }
    }
    let w = nx + 1;
    let mut faces = Vec::with_capacity(nx * ny);
    for y in 0..ny {
        for x in 0..nx {
            let a = y * w + x;
            faces.push([a, a + 1, a + 1 + w, a + w]);
        }
    }
    (points, faces)
}
