//! Catmull-Clark masks with semi-sharp creases.
//!
//! Each function returns the [`Masks`] for one new vertex: the stencil that
//! vertex-class variables follow, and a linear stencil for varying ones.
//!
//! # Rules
//!
//! - **Face point**: centroid of the facet corners.
//! - **Edge point**: `(a + b + F1 + F2) / 4` for an interior edge, the
//!   midpoint on a boundary or when the edge weight is at least 1, and a
//!   blend of the two for weights in between.
//! - **Vertex point** (valence `n`, interior): `(Q + 2R + (n - 3)S) / n`
//!   where `Q` averages the adjacent face points, `R` the adjacent edge
//!   midpoints, `S` is the old position.
//!   - two sharp edges: crease rule `(a + b + 6S) / 8`, blended by the mean
//!     edge weight when it is below 1
//!   - more than two: corner rule (`S`), blended likewise
//!   - a tagged corner pulls the result towards `S` by its weight
//! - **Boundary vertex**: `(b0 + b1 + 6S) / 8` along the two boundary edges;
//!   a corner touched by a single facet stays fixed.

use crate::attrib::{Masks, Stencil};
use crate::error::Result;
use crate::mesh::{LathId, MeshIndex, Topology};

/// Move `rule` towards `sharp` by `weight`, clamped to `[0, 1]`.
fn sharpen(rule: Stencil, sharp: Stencil, weight: f64) -> Stencil {
    if weight >= 1.0 {
        sharp
    } else if weight > 0.0 {
        Stencil::lerp(&rule, &sharp, weight)
    } else {
        rule
    }
}

/// Centroid stencil of the facet containing `lath`.
fn centroid<I: MeshIndex>(topo: &Topology<I>, lath: LathId<I>) -> Result<Stencil> {
    let corners = topo
        .qfv(lath)?
        .into_iter()
        .map(|l| topo.vertex_of(l).map(|v| v.index()))
        .collect::<Result<Vec<_>>>()?;
    Ok(Stencil::average(corners))
}

/// Masks for the face point of the facet containing `lath`.
pub fn face_masks<I: MeshIndex>(topo: &Topology<I>, lath: LathId<I>) -> Result<Masks> {
    Ok(Masks::linear(centroid(topo, lath)?))
}

/// Masks for the edge point of the edge owned by `lath`.
pub fn edge_masks<I: MeshIndex>(topo: &Topology<I>, lath: LathId<I>) -> Result<Masks> {
    let (a, b) = topo.edge_vertices(lath)?;
    let midpoint = Stencil::average([a.index(), b.index()]);

    let vertex = match topo.ec(lath)? {
        None => midpoint.clone(),
        Some(other) => {
            let mut smooth = Stencil::new();
            smooth.add(a.index(), 0.25);
            smooth.add(b.index(), 0.25);
            smooth.add_scaled(&centroid(topo, lath)?, 0.25);
            smooth.add_scaled(&centroid(topo, other)?, 0.25);
            sharpen(smooth, midpoint.clone(), topo.edge_sharpness(lath)?)
        }
    };

    Ok(Masks {
        vertex,
        varying: midpoint,
    })
}

/// Masks for the refined position of the vertex at `lath`.
pub fn vertex_masks<I: MeshIndex>(topo: &Topology<I>, lath: LathId<I>) -> Result<Masks> {
    let v = topo.vertex_of(lath)?.index();
    let fan = topo.vertex_fan(lath)?;
    let n = fan.len();
    let keep = Stencil::single(v);

    let rule = if !fan.closed {
        boundary_rule(topo, &fan.laths, v)?
    } else {
        let mut q = Stencil::new();
        let mut r = Stencil::new();
        let mut creases: Vec<(usize, f64)> = Vec::new();
        let inv = 1.0 / n as f64;
        for &m in &fan.laths {
            let other = topo.vertex_of(topo.ccf(m)?)?.index();
            q.add_scaled(&centroid(topo, m)?, inv);
            r.add(v, 0.5 * inv);
            r.add(other, 0.5 * inv);
            let w = topo.edge_sharpness(m)?;
            if w > 0.0 {
                creases.push((other, w));
            }
        }

        let mut smooth = Stencil::new();
        smooth.add_scaled(&q, inv);
        smooth.add_scaled(&r, 2.0 * inv);
        smooth.add(v, (n as f64 - 3.0) * inv);

        let mean = creases.iter().map(|c| c.1).sum::<f64>() / creases.len().max(1) as f64;
        match creases.len() {
            0 | 1 => smooth,
            2 => {
                let mut crease = Stencil::new();
                crease.add(creases[0].0, 0.125);
                crease.add(creases[1].0, 0.125);
                crease.add(v, 0.75);
                sharpen(smooth, crease, mean)
            }
            _ => sharpen(smooth, keep.clone(), mean),
        }
    };

    let vertex = sharpen(rule, keep.clone(), topo.corner_sharpness(lath)?);
    Ok(Masks {
        vertex,
        varying: keep,
    })
}

/// `(b0 + b1 + 6S) / 8` along the two boundary edges of an open fan.
fn boundary_rule<I: MeshIndex>(topo: &Topology<I>, fan: &[LathId<I>], v: usize) -> Result<Stencil> {
    let (Some(&first), Some(&last)) = (fan.first(), fan.last()) else {
        return Ok(Stencil::single(v));
    };
    if fan.len() == 1 {
        return Ok(Stencil::single(v));
    }
    let b0 = topo.vertex_of(topo.ccf(last)?)?.index();
    let b1 = topo.vertex_of(topo.cf(first)?)?.index();

    let mut s = Stencil::new();
    s.add(b0, 0.125);
    s.add(b1, 0.125);
    s.add(v, 0.75);
    Ok(s)
}
