//! Lazy Catmull-Clark refinement of single facets.

use tracing::trace;

use crate::error::{Result, SubdivError};
use crate::mesh::{LathId, MeshIndex, Topology, VertexId};

/// Deepest level [`subdivide_face`] will create.
pub const MAX_SUBDIVISION_LEVEL: u32 = 16;

/// One child quad: corner child, next mid-edge, face point, this mid-edge.
#[derive(Debug, Clone, Copy)]
struct ChildQuad<I: MeshIndex> {
    a: LathId<I>,
    b: LathId<I>,
    c: LathId<I>,
    d: LathId<I>,
}

/// Refine one facet into quads, one per corner.
///
/// Returns the representative lath of each child facet, starting with the
/// child at `face`'s own corner and continuing clockwise. The child at corner
/// `i` has its corners in clockwise order at the refined corner vertex, the
/// midpoint of the edge towards the next corner, the face point and the
/// midpoint of the edge from the previous corner.
///
/// Refinement is cached on the parent laths: a second call returns the same
/// children without allocating anything. Before a facet below the base level
/// is refined, every facet in its parent's 1-ring is refined first, so the
/// new laths can be linked to every neighbour that exists at their level.
pub fn subdivide_face<I: MeshIndex>(topo: &mut Topology<I>, face: LathId<I>) -> Result<Vec<LathId<I>>> {
    if !topo.is_finalised() {
        return Err(SubdivError::NotFinalised);
    }

    let (level, facet, parent, cached) = {
        let lath = topo.lath(face)?;
        (lath.level, lath.facet, lath.parent_facet.get(), lath.face_vertex.get())
    };

    if let Some(start) = cached {
        return collect_children(topo, start);
    }
    if level + 1 > MAX_SUBDIVISION_LEVEL {
        return Err(SubdivError::DepthLimit {
            level: level + 1,
            limit: MAX_SUBDIVISION_LEVEL,
        });
    }

    if let Some(parent) = parent {
        for neighbour in topo.qff(parent)? {
            subdivide_face(topo, neighbour)?;
        }
    }

    let corners = topo.qfv(face)?;
    let n = corners.len();
    let child_level = level + 1;
    // four laths per child, at most a face point, n mids and n corner children
    topo.ensure_capacity(4 * n, 2 * n + 1)?;

    // New vertices: face point, edge points, corner children.
    let face_point = topo.add_face_vertex(face)?;

    let mut mids = Vec::with_capacity(n);
    for &corner in &corners {
        let shared = match topo.ec(corner)? {
            Some(other) => topo.lath(other)?.mid_vertex.get(),
            None => None,
        };
        let v = match shared {
            Some(mid) => topo.vertex_of(mid)?,
            None => topo.add_edge_vertex(corner)?,
        };
        mids.push(v);
    }

    let mut kids: Vec<VertexId<I>> = Vec::with_capacity(n);
    for &corner in &corners {
        let v = match topo.lath(corner)?.child_vertex.get() {
            Some(child) => topo.vertex_of(child)?,
            None => topo.add_vertex(corner)?,
        };
        kids.push(v);
    }

    // Child quads.
    let mut quads = Vec::with_capacity(n);
    for i in 0..n {
        let next = (i + 1) % n;
        let a = topo.new_lath(kids[i], facet, child_level)?;
        let b = topo.new_lath(mids[next], facet, child_level)?;
        let c = topo.new_lath(face_point, facet, child_level)?;
        let d = topo.new_lath(mids[i], facet, child_level)?;
        for (from, to) in [(a, b), (b, c), (c, d), (d, a)] {
            let lath = topo.lath_mut(from)?;
            lath.cf = to;
            lath.parent_facet = face;
        }

        let corner_vertex = topo.vertex_of(corners[i])?;
        for l in topo.vertex_laths(corner_vertex)?.to_vec() {
            topo.lath_mut(l)?.child_vertex = a;
        }
        topo.lath_mut(corners[i])?.mid_vertex = d;

        let edge_w = topo.edge_sharpness(corners[i])?;
        if edge_w > 0.0 {
            topo.set_edge_sharpness(a, edge_w * edge_w);
        }
        let next_w = topo.edge_sharpness(corners[next])?;
        if next_w > 0.0 {
            topo.set_edge_sharpness(b, next_w * next_w);
        }
        let corner_w = topo.corner_sharpness(corners[i])?;
        if corner_w > 0.0 {
            topo.set_corner_sharpness(a, corner_w);
        }

        quads.push(ChildQuad { a, b, c, d });
    }

    // First pass: face-point ring and the links around each corner child.
    for i in 0..n {
        let q = quads[i];
        let next = quads[(i + 1) % n];
        topo.lath_mut(corners[i])?.face_vertex = q.c;
        topo.lath_mut(next.d)?.cv = q.b;
        topo.lath_mut(q.c)?.cv = next.c;

        let d_vertex = topo.vertex_of(q.d)?;
        let b_vertex = topo.vertex_of(q.b)?;
        for it in topo.vertex_laths(topo.vertex_of(q.a)?)?.to_vec() {
            if topo.vertex_of(topo.cf(it)?)? == d_vertex {
                topo.lath_mut(q.a)?.cv = it;
            }
            if topo.vertex_of(topo.ccf(it)?)? == b_vertex {
                topo.lath_mut(it)?.cv = q.a;
            }
        }
    }

    // Second pass: links around the mid-edge laths.
    for q in &quads {
        let a_vertex = topo.vertex_of(q.a)?;
        for it in topo.vertex_laths(topo.vertex_of(q.b)?)?.to_vec() {
            if topo.vertex_of(topo.cf(it)?)? == a_vertex {
                topo.lath_mut(q.b)?.cv = it;
            }
        }
        for it in topo.vertex_laths(topo.vertex_of(q.d)?)?.to_vec() {
            if topo.vertex_of(topo.ccf(it)?)? == a_vertex {
                topo.lath_mut(it)?.cv = q.d;
            }
        }
    }

    let children: Vec<LathId<I>> = quads.iter().map(|q| q.a).collect();
    topo.facets.extend_from_slice(&children);

    trace!(
        face = face.index(),
        level = child_level,
        corners = n,
        vertices = topo.vertex_count(),
        "subdivided face"
    );
    Ok(children)
}

/// Walk the cached face-point ring back to the child facets.
fn collect_children<I: MeshIndex>(topo: &Topology<I>, start: LathId<I>) -> Result<Vec<LathId<I>>> {
    let mut children = Vec::new();
    let mut cur = start;
    loop {
        children.push(topo.cf(topo.cf(cur)?)?);
        match topo.cv(cur)? {
            Some(next) if next != start => cur = next,
            Some(_) => break,
            None => return Err(SubdivError::OpenVertexRing { lath: cur.index() }),
        }
        if children.len() > topo.lath_count() {
            return Err(SubdivError::InvalidLath(start.index()));
        }
    }
    Ok(children)
}

/// Refine the 1-ring of `face`'s parent so that `face`'s neighbours exist.
///
/// A no-op for base facets.
pub fn refine_neighbourhood<I: MeshIndex>(topo: &mut Topology<I>, face: LathId<I>) -> Result<()> {
    if let Some(parent) = topo.lath(face)?.parent_facet.get() {
        for neighbour in topo.qff(parent)? {
            subdivide_face(topo, neighbour)?;
        }
    }
    Ok(())
}

/// Refine `face` `depth` times and return its finest descendants.
///
/// The first entry is always the descendant at `face`'s own corner.
pub fn refine_to_depth<I: MeshIndex>(
    topo: &mut Topology<I>,
    face: LathId<I>,
    depth: u32,
) -> Result<Vec<LathId<I>>> {
    let mut current = vec![face];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(current.len() * 4);
        for f in current {
            next.extend(subdivide_face(topo, f)?);
        }
        current = next;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use super::*;
    use crate::mesh::{build_from_polygons, build_topology, grid_mesh, FacetId, MeshDescription};
    use crate::attrib::{AttributeStore, TimeSlot};

    fn grid(nx: usize, ny: usize) -> Topology {
        let (points, faces) = grid_mesh(nx, ny);
        build_from_polygons(&points, &faces).unwrap()
    }

    fn positions(topo: &Topology, face: LathId) -> Vec<Point3<f64>> {
        let p = topo.points(0).unwrap();
        topo.qfv(face)
            .unwrap()
            .into_iter()
            .map(|l| p[topo.vertex_of(l).unwrap().index()])
            .collect()
    }

    #[test]
    fn test_single_quad() {
        let mut topo = grid(1, 1);
        let face = topo.facet(FacetId::new(0)).unwrap();
        let children = subdivide_face(&mut topo, face).unwrap();

        assert_eq!(children.len(), 4);
        assert_eq!(topo.vertex_count(), 13);
        assert_eq!(topo.lath_count(), 4 + 16);
        assert_eq!(topo.facets().len(), 5);
        for &c in &children {
            assert_eq!(topo.corner_count(c).unwrap(), 4);
            assert_eq!(topo.lath(c).unwrap().level(), 1);
            assert_eq!(topo.lath(c).unwrap().parent_facet(), Some(face));
        }

        // Corners stay put, the face point sits in the middle.
        let first = positions(&topo, children[0]);
        assert_relative_eq!(first[0], Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(first[1], Point3::new(0.0, 0.5, 0.0));
        assert_relative_eq!(first[2], Point3::new(0.5, 0.5, 0.0));
        assert_relative_eq!(first[3], Point3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_idempotent() {
        let mut topo = grid(2, 2);
        let face = topo.facet(FacetId::new(3)).unwrap();
        let first = subdivide_face(&mut topo, face).unwrap();
        let (verts, laths, facets) = (topo.vertex_count(), topo.lath_count(), topo.facets().len());

        let second = subdivide_face(&mut topo, face).unwrap();
        assert_eq!(first, second);
        assert_eq!(topo.vertex_count(), verts);
        assert_eq!(topo.lath_count(), laths);
        assert_eq!(topo.facets().len(), facets);
    }

    #[test]
    fn test_shared_edge_point_is_reused() {
        let mut topo = grid(2, 1);
        let left = topo.facet(FacetId::new(0)).unwrap();
        let right = topo.facet(FacetId::new(1)).unwrap();

        subdivide_face(&mut topo, left).unwrap();
        assert_eq!(topo.vertex_count(), 6 + 9);
        subdivide_face(&mut topo, right).unwrap();
        // One face point, three new edge points, two new corner children.
        assert_eq!(topo.vertex_count(), 6 + 9 + 6);

        // Both sides of the shared edge agree on the mid-edge vertex.
        let owner = topo.find_edge(VertexId::new(1), VertexId::new(4)).unwrap();
        let other = topo.ec(owner).unwrap().unwrap();
        let m0 = topo.lath(owner).unwrap().mid_vertex().unwrap();
        let m1 = topo.lath(other).unwrap().mid_vertex().unwrap();
        assert_eq!(topo.vertex_of(m0).unwrap(), topo.vertex_of(m1).unwrap());
    }

    #[test]
    fn test_refined_fans_close() {
        let mut topo = grid(3, 3);
        let bases: Vec<LathId> = topo.facets().to_vec();
        let mut finest = Vec::new();
        for f in bases {
            finest.extend(refine_to_depth(&mut topo, f, 2).unwrap());
        }
        assert_eq!(finest.len(), 9 * 16);
        // Every level keeps its own vertices: 4x4, then 7x7, then 13x13.
        assert_eq!(topo.vertex_count(), 16 + 49 + 169);

        let p = topo.points(0).unwrap().to_vec();
        for &f in &finest {
            for corner in topo.qfv(f).unwrap() {
                let fan = topo.vertex_fan(corner).unwrap();
                let v = p[topo.vertex_of(corner).unwrap().index()];
                let on_rim = v.x.abs() < 1e-9
                    || (v.x - 3.0).abs() < 1e-9
                    || v.y.abs() < 1e-9
                    || (v.y - 3.0).abs() < 1e-9;
                assert_eq!(fan.closed, !on_rim, "vertex at {:?}", v);
            }
        }
    }

    #[test]
    fn test_lazy_refinement_builds_neighbours() {
        let mut topo = grid(3, 3);
        let center = topo.facet(FacetId::new(4)).unwrap();
        let children = subdivide_face(&mut topo, center).unwrap();
        assert_eq!(topo.facets().len(), 9 + 4);

        // Refining a child first refines the whole 1-ring of the center facet.
        subdivide_face(&mut topo, children[0]).unwrap();
        assert_eq!(topo.facets().len(), 9 + 9 * 4 + 4);

        // The corner child now sees a closed fan of four level-1 facets.
        let a = children[0];
        let fan = topo.vertex_fan(a).unwrap();
        assert!(fan.closed);
        assert_eq!(fan.len(), 4);
    }

    #[test]
    fn test_sharpness_propagation() {
        let (points, faces) = grid_mesh(3, 3);
        // Edge 5-6 bounds the top of facet 1 and the bottom of facet 4.
        let desc = MeshDescription::new(&faces)
            .with_sharp_edge(5, 6, 0.5)
            .with_sharp_corner(5, 1.0);
        let mut topo: Topology =
            build_topology(&desc, vec![TimeSlot::new(0.0, AttributeStore::new(points))]).unwrap();

        let center = topo.facet(FacetId::new(4)).unwrap();
        let children = subdivide_face(&mut topo, center).unwrap();

        // The child at vertex 5 keeps the corner weight.
        assert_eq!(topo.vertex_of(center).unwrap(), VertexId::new(5));
        assert_eq!(topo.corner_sharpness(children[0]).unwrap(), 1.0);

        // Both halves of edge 5-6 carry the squared weight.
        let halves: Vec<f64> = children
            .iter()
            .flat_map(|&c| topo.qfv(c).unwrap())
            .map(|l| topo.edge_sharpness(l).unwrap())
            .filter(|&w| w > 0.0)
            .collect();
        assert_eq!(halves.len(), 2);
        for w in halves {
            assert_relative_eq!(w, 0.25);
        }

        // One level further the weight squares again.
        let grand = subdivide_face(&mut topo, children[0]).unwrap();
        let weights: Vec<f64> = grand
            .iter()
            .flat_map(|&c| topo.qfv(c).unwrap())
            .map(|l| topo.edge_sharpness(l).unwrap())
            .filter(|&w| w > 0.0)
            .collect();
        assert!(!weights.is_empty());
        for w in weights {
            assert_relative_eq!(w, 0.0625);
        }
        assert_eq!(topo.corner_sharpness(grand[0]).unwrap(), 1.0);
    }

    #[test]
    fn test_requires_finalise() {
        let store = AttributeStore::new(vec![Point3::origin(); 3]);
        let mut topo = Topology::<u32>::with_store(store).unwrap();
        topo.prepare(3).unwrap();
        let f = topo.add_facet(&[0, 1, 2]).unwrap();
        let face = topo.facet(f).unwrap();
        assert!(matches!(
            subdivide_face(&mut topo, face),
            Err(SubdivError::NotFinalised)
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut topo = grid(1, 1);
        let mut face = topo.facet(FacetId::new(0)).unwrap();
        for _ in 0..MAX_SUBDIVISION_LEVEL {
            face = subdivide_face(&mut topo, face).unwrap()[0];
        }
        assert!(matches!(
            subdivide_face(&mut topo, face),
            Err(SubdivError::DepthLimit { .. })
        ));
    }

    #[test]
    fn test_u16_overflow_is_an_error() {
        let (points, faces) = grid_mesh(70, 70);
        let mut topo: Topology<u16> = build_from_polygons(&points, &faces).unwrap();
        let bases: Vec<LathId<u16>> = topo.facets().to_vec();

        let mut failed = None;
        for f in bases {
            if let Err(e) = subdivide_face(&mut topo, f) {
                failed = Some(e);
                break;
            }
        }
        assert!(matches!(
            failed,
            Some(SubdivError::IndexOverflow { limit: 65534, .. })
        ));

        // Nothing was half built: the arena stays below the sentinel and
        // every finished facet is still a closed ring.
        assert!(topo.lath_count() <= 65535);
        for &f in topo.facets() {
            assert!(topo.corner_count(f).unwrap() >= 3);
        }
    }

    #[test]
    fn test_triangle_becomes_quads() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut topo: Topology = build_from_polygons(&points, &[[0usize, 1, 2]]).unwrap();
        let face = topo.facet(FacetId::new(0)).unwrap();
        let children = subdivide_face(&mut topo, face).unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(topo.vertex_count(), 3 + 1 + 3 + 3);
        for c in children {
            assert_eq!(topo.corner_count(c).unwrap(), 4);
        }
    }
}
