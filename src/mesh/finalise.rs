//! Vertex-chain linking and manifold validation.
//!
//! After all facets are inserted only the facet rings (`cf`) exist. Finalising
//! links the laths around each vertex into rotational order through `cv`:
//!
//! 1. Starting from the vertex's first lath, walk forward. The successor of
//!    `L` is the unvisited lath `M` whose facet continues across the edge
//!    `L` owns, i.e. `cf(M)` references the vertex of `ccf(L)`. The walk
//!    stops when it returns to the start (an interior vertex) or when no
//!    match exists.
//! 2. If the forward chain stayed open the vertex lies on a boundary. Walk
//!    backward from the start, linking each unvisited lath `M` whose
//!    `ccf(M)` references the vertex of `cf(head)` so that `cv(M) = head`.
//!
//! Matching is done in adjacency-list order, so the result is deterministic
//! for a given insertion order. Every lath that ends up visited by neither
//! walk means the vertex has more than one fan (or an edge shared in the
//! wrong orientation) and the whole topology is rejected.

use tracing::{debug, warn};

use super::index::{LathId, MeshIndex, VertexId};
use super::topology::Topology;
use crate::error::{Result, SubdivError};

impl<I: MeshIndex> Topology<I> {
    /// Link every vertex chain and validate that each vertex is manifold.
    ///
    /// On failure the topology must not be used for rendering.
    pub fn finalise(&mut self) -> Result<()> {
        if self.base_facets.is_empty() {
            return Err(SubdivError::EmptyMesh);
        }
        self.validate_stores()?;

        let mut boundary = 0usize;
        for v in 0..self.vertex_laths.len() {
            match self.link_vertex(VertexId::new(v)) {
                Ok(true) => {}
                Ok(false) => boundary += 1,
                Err(e) => {
                    warn!(vertex = v, error = %e, "finalise failed");
                    return Err(e);
                }
            }
        }

        self.finalised = true;
        debug!(
            vertices = self.vertex_count(),
            facets = self.facet_count(),
            laths = self.lath_count(),
            boundary_vertices = boundary,
            "topology finalised"
        );
        Ok(())
    }

    /// Link the laths around one vertex. Returns whether the fan is closed.
    fn link_vertex(&mut self, v: VertexId<I>) -> Result<bool> {
        let laths: Vec<LathId<I>> = self.vertex_laths[v.index()].clone();
        let total = laths.len();
        if total == 0 {
            return Ok(true);
        }
        if total == 1 {
            return Ok(false);
        }

        // Vertices on either side of each lath, read once.
        let mut before = Vec::with_capacity(total);
        let mut after = Vec::with_capacity(total);
        for &l in &laths {
            before.push(self.vertex_of(self.ccf(l)?)?);
            after.push(self.vertex_of(self.cf(l)?)?);
        }

        let start = 0usize;
        let mut visited = vec![false; total];
        let mut cur = start;
        let mut closed = false;
        loop {
            let want = before[cur];
            let next = (0..total).find(|&j| j != cur && !visited[j] && after[j] == want);
            let Some(j) = next else { break };
            self.lath_mut(laths[cur])?.cv = laths[j];
            if cur != start {
                visited[cur] = true;
            }
            if j == start {
                closed = true;
                break;
            }
            cur = j;
        }
        visited[cur] = true;
        visited[start] = true;

        if !closed {
            let mut head = start;
            loop {
                let want = after[head];
                let next = (0..total).find(|&j| !visited[j] && before[j] == want);
                let Some(j) = next else { break };
                self.lath_mut(laths[j])?.cv = laths[head];
                visited[j] = true;
                head = j;
            }
        }

        let linked = visited.iter().filter(|&&b| b).count();
        if linked != total {
            return Err(SubdivError::NonManifold {
                vertex: v.index(),
                linked,
                total,
            });
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;
    use crate::attrib::AttributeStore;
    use crate::mesh::FacetId;

    fn topology(vertex_count: usize, faces: &[&[usize]]) -> Topology {
        let store = AttributeStore::new(vec![Point3::origin(); vertex_count]);
        let mut topo = Topology::with_store(store).unwrap();
        topo.prepare(vertex_count).unwrap();
        for f in faces {
            topo.add_facet(f).unwrap();
        }
        topo
    }

    fn cube() -> Topology {
        topology(
            8,
            &[
                &[0, 3, 2, 1],
                &[4, 5, 6, 7],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
            ],
        )
    }

    /// Every lath at every vertex is reached exactly once by its fan.
    fn assert_fans_cover(topo: &Topology) {
        for v in 0..topo.vertex_count() {
            let laths = topo.vertex_laths(VertexId::new(v)).unwrap();
            if laths.is_empty() {
                continue;
            }
            let mut fan = topo.vertex_fan(laths[0]).unwrap().laths;
            fan.sort();
            let mut expected = laths.to_vec();
            expected.sort();
            assert_eq!(fan, expected, "vertex {}", v);
        }
    }

    #[test]
    fn test_closed_cube() {
        let mut topo = cube();
        topo.finalise().unwrap();
        assert!(topo.is_finalised());
        assert_fans_cover(&topo);
        for i in 0..topo.lath_count() {
            let l = LathId::new(i);
            assert!(!topo.is_boundary_vertex(l).unwrap());
            assert_eq!(topo.valence(l).unwrap(), 3);
        }
    }

    #[test]
    fn test_open_grid() {
        let mut topo = topology(
            9,
            &[&[0, 1, 4, 3], &[1, 2, 5, 4], &[3, 4, 7, 6], &[4, 5, 8, 7]],
        );
        topo.finalise().unwrap();
        assert_fans_cover(&topo);

        let center = topo.vertex_laths(VertexId::new(4)).unwrap()[0];
        assert!(!topo.is_boundary_vertex(center).unwrap());
        let side = topo.vertex_laths(VertexId::new(1)).unwrap()[0];
        assert!(topo.is_boundary_vertex(side).unwrap());
    }

    #[test]
    fn test_boundary_fan_from_any_start() {
        // Insertion order puts the middle facet of the fan first.
        let mut topo = topology(
            6,
            &[&[0, 2, 3], &[0, 1, 2], &[0, 3, 4], &[0, 4, 5]],
        );
        topo.finalise().unwrap();
        assert_fans_cover(&topo);
        let hub = topo.vertex_laths(VertexId::new(0)).unwrap()[0];
        let fan = topo.vertex_fan(hub).unwrap();
        assert!(!fan.closed);
        assert_eq!(fan.len(), 4);
    }

    #[test]
    fn test_bowtie_is_rejected() {
        // Two triangles meeting only at vertex 0.
        let mut topo = topology(5, &[&[0, 1, 2], &[0, 3, 4]]);
        match topo.finalise() {
            Err(SubdivError::NonManifold {
                vertex,
                linked,
                total,
            }) => {
                assert_eq!(vertex, 0);
                assert_eq!(linked, 1);
                assert_eq!(total, 2);
            }
            other => panic!("expected NonManifold, got {:?}", other),
        }
        assert!(!topo.is_finalised());
    }

    #[test]
    fn test_closed_fan_with_stray_facet() {
        // A closed umbrella of four triangles around vertex 0 plus a
        // triangle hanging off the same vertex.
        let mut topo = topology(
            7,
            &[&[0, 1, 2], &[0, 2, 3], &[0, 3, 4], &[0, 4, 1], &[0, 5, 6]],
        );
        match topo.finalise() {
            Err(SubdivError::NonManifold { vertex, linked, total }) => {
                assert_eq!(vertex, 0);
                assert_eq!(linked, 4);
                assert_eq!(total, 5);
            }
            other => panic!("expected NonManifold, got {:?}", other),
        }
    }

    #[test]
    fn test_two_boundary_runs_are_rejected() {
        // Two separate fans at vertex 0, each with two facets.
        let mut topo = topology(
            7,
            &[&[0, 1, 2], &[0, 2, 3], &[0, 4, 5], &[0, 5, 6]],
        );
        assert!(matches!(
            topo.finalise(),
            Err(SubdivError::NonManifold { vertex: 0, linked: 2, total: 4 })
        ));
    }

    #[test]
    fn test_flipped_facet_is_rejected() {
        let mut topo = topology(6, &[&[0, 1, 4, 3], &[1, 4, 5, 2]]);
        assert!(matches!(
            topo.finalise(),
            Err(SubdivError::NonManifold { .. })
        ));
    }

    #[test]
    fn test_empty_and_refinalise() {
        let mut topo = topology(3, &[]);
        assert!(matches!(topo.finalise(), Err(SubdivError::EmptyMesh)));

        let mut topo = topology(3, &[&[0, 1, 2]]);
        topo.finalise().unwrap();
        assert!(topo.add_facet(&[0, 2, 1]).is_err());
        assert_eq!(topo.facet(FacetId::new(0)).unwrap(), LathId::new(0));
    }
}
