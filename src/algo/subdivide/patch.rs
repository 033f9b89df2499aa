//! Regular-neighbourhood detection and B-spline control-point extraction.
//!
//! A quad whose four corners are smooth, closed and of valence 4, and whose
//! 1-ring is nine smooth quads, is exactly a uniform bicubic B-spline patch.
//! Such faces skip recursive refinement entirely.

use crate::error::{Result, SubdivError};
use crate::mesh::{LathId, MeshIndex, Topology, VertexId};

/// Whether the facet at `face` can be replaced by a bicubic patch.
///
/// Below the base level the answer depends on the neighbours at the same
/// level, so callers refine the neighbourhood first.
pub fn can_use_patch<I: MeshIndex>(topo: &Topology<I>, face: LathId<I>) -> Result<bool> {
    let corners = topo.qfv(face)?;
    if corners.len() != 4 {
        return Ok(false);
    }

    for &corner in &corners {
        let fan = topo.vertex_fan(corner)?;
        if !fan.closed || fan.len() != 4 {
            return Ok(false);
        }
        if topo.edge_sharpness(corner)? != 0.0 || topo.corner_sharpness(corner)? != 0.0 {
            return Ok(false);
        }
    }

    let ring = topo.qff(face)?;
    if ring.len() != 9 {
        return Ok(false);
    }
    for f in ring {
        if topo.corner_count(f)? != 4 || !topo.is_smooth_facet(f)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn cv<I: MeshIndex>(topo: &Topology<I>, lath: LathId<I>) -> Result<LathId<I>> {
    topo.cv(lath)?
        .ok_or(SubdivError::OpenVertexRing { lath: lath.index() })
}

fn ccv<I: MeshIndex>(topo: &Topology<I>, lath: LathId<I>) -> Result<LathId<I>> {
    topo.ccv(lath)?
        .ok_or(SubdivError::OpenVertexRing { lath: lath.index() })
}

/// The 16 B-spline control vertices around a regular facet, row by row.
///
/// Returns `None` when [`can_use_patch`] does not hold. The facet's own
/// corners are entries 5, 6, 9 and 10.
pub fn patch_control_vertices<I: MeshIndex>(
    topo: &Topology<I>,
    face: LathId<I>,
) -> Result<Option<[VertexId<I>; 16]>> {
    if !can_use_patch(topo, face)? {
        return Ok(None);
    }

    let mut out = [VertexId::invalid(); 16];
    let mut k = 0;
    let mut push = |l: LathId<I>| -> Result<()> {
        out[k] = topo.vertex_of(l)?;
        k += 1;
        Ok(())
    };

    // Top row runs counter-clockwise around the far corner's facets.
    let mut p = topo.cf(topo.cf(cv(topo, cv(topo, face)?)?)?)?;
    let mut row = p;
    push(p)?;
    p = topo.ccf(p)?;
    push(p)?;
    for _ in 0..2 {
        p = topo.ccf(cv(topo, p)?)?;
        push(p)?;
    }

    for r in 1..4 {
        p = if r == 1 {
            topo.cf(row)?
        } else {
            topo.cf(ccv(topo, row)?)?
        };
        row = p;
        push(p)?;
        p = topo.cf(p)?;
        push(p)?;
        for _ in 0..2 {
            p = topo.cf(ccv(topo, p)?)?;
            push(p)?;
        }
    }

    Ok(Some(out))
}
