//! The top-level subdivision surface.

use std::sync::Arc;

use tracing::debug;

use super::bound::Bound;
use super::patch::SubdivisionPatch;
use crate::attrib::TimeSlot;
use crate::error::{Result, SubdivError};
use crate::mesh::{build_topology, FacetId, MeshDescription, MeshIndex, SharedTopology, Topology};

/// A subdivision mesh ready for tessellation.
///
/// Owns one finalised topology, shared with every patch split from it.
#[derive(Debug, Clone)]
pub struct SubdivisionMesh<I: MeshIndex = u32> {
    topology: SharedTopology<I>,
}

impl<I: MeshIndex> SubdivisionMesh<I> {
    /// Build the topology for `desc` driven by `slots`.
    ///
    /// Fails if the connectivity is not manifold.
    pub fn new(desc: &MeshDescription, slots: Vec<TimeSlot>) -> Result<Self> {
        let topo = build_topology(desc, slots)?;
        Ok(Self {
            topology: topo.into_shared(),
        })
    }

    /// Wrap an already finalised topology.
    pub fn from_topology(topology: Topology<I>) -> Result<Self> {
        if !topology.is_finalised() {
            return Err(SubdivError::NotFinalised);
        }
        Ok(Self {
            topology: topology.into_shared(),
        })
    }

    /// The shared topology.
    pub fn topology(&self) -> &SharedTopology<I> {
        &self.topology
    }

    /// Bound of every base facet over every time sample.
    pub fn bound(&self) -> Result<Bound> {
        let topo = self.topology.read()?;
        let mut bound = Bound::empty();
        for f in 0..topo.facet_count() {
            let face = topo.facet(FacetId::new(f))?;
            for v in topo.facet_vertices(face)? {
                for slot in 0..topo.time_count() {
                    if let Some(p) = topo.points(slot)?.get(v.index()) {
                        bound.encapsulate(p);
                    }
                }
            }
        }
        Ok(bound)
    }

    /// One patch per renderable base facet.
    ///
    /// Holes are skipped, and so are facets touching the boundary unless
    /// `interpolate_boundary` is set.
    pub fn split(&self) -> Result<Vec<SubdivisionPatch<I>>> {
        let topo = self.topology.read()?;
        let interpolate = topo.interpolate_boundary();
        let mut patches = Vec::with_capacity(topo.facet_count());
        let (mut holes, mut boundary) = (0usize, 0usize);

        for f in 0..topo.facet_count() {
            let id = FacetId::new(f);
            if topo.is_hole(id) {
                holes += 1;
                continue;
            }
            let face = topo.facet(id)?;
            if !interpolate && topo.is_boundary_facet(face)? {
                boundary += 1;
                continue;
            }
            patches.push(SubdivisionPatch::new(Arc::clone(&self.topology), face));
        }

        debug!(
            patches = patches.len(),
            holes,
            boundary_skipped = boundary,
            "split subdivision mesh"
        );
        Ok(patches)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;
    use crate::attrib::AttributeStore;
    use crate::mesh::grid_mesh;

    fn slots(points: Vec<Point3<f64>>) -> Vec<TimeSlot> {
        vec![TimeSlot::new(0.0, AttributeStore::new(points))]
    }

    #[test]
    fn test_split_skips_boundary_and_holes() {
        let (points, faces) = grid_mesh(3, 3);
        let mesh: SubdivisionMesh = SubdivisionMesh::new(&MeshDescription::new(&faces), slots(points.clone())).unwrap();
        assert_eq!(mesh.split().unwrap().len(), 1);

        let desc = MeshDescription::new(&faces)
            .with_interpolate_boundary(true)
            .with_hole(4)
            .with_hole(0);
        let mesh: SubdivisionMesh = SubdivisionMesh::new(&desc, slots(points)).unwrap();
        assert_eq!(mesh.split().unwrap().len(), 7);
    }

    #[test]
    fn test_bound() {
        let (points, faces) = grid_mesh(2, 3);
        let mesh: SubdivisionMesh = SubdivisionMesh::new(&MeshDescription::new(&faces), slots(points)).unwrap();
        let b = mesh.bound().unwrap();
        assert_eq!(b.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(b.max, Point3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn test_non_manifold_is_refused() {
        let points = vec![Point3::origin(); 5];
        let desc = MeshDescription::new(&[[0usize, 1, 2], [0, 3, 4]]);
        assert!(matches!(
            SubdivisionMesh::<u32>::new(&desc, slots(points)),
            Err(SubdivError::NonManifold { .. })
        ));
    }

    #[test]
    fn test_from_topology_requires_finalise() {
        let (points, _) = grid_mesh(1, 1);
        let mut topo = Topology::<u32>::with_store(AttributeStore::new(points)).unwrap();
        topo.prepare(4).unwrap();
        topo.add_facet(&[0, 1, 3, 2]).unwrap();
        assert!(matches!(
            SubdivisionMesh::from_topology(topo.clone()),
            Err(SubdivError::NotFinalised)
        ));
        topo.finalise().unwrap();
        assert!(SubdivisionMesh::from_topology(topo).is_ok());
    }
}
