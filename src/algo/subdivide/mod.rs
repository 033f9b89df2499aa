//! Adaptive Catmull-Clark subdivision.
//!
//! Refinement is local: [`subdivide_face`] splits one facet into one quad per
//! corner, creating the new face point, reusing edge points and corner
//! children already made by neighbouring facets, and stitching the new laths
//! into every vertex ring that already exists at the new level. Faces are
//! refined only when a patch needs them, so a mesh ends up with different
//! depths in different places.
//!
//! # Catmull-Clark Rules
//!
//! Every new vertex is described by a stencil over the old vertices (see
//! [`catmull_clark`]):
//!
//! 1. A face point is the centroid of the facet
//! 2. An edge point averages the edge ends with the two adjacent face points
//!    (the midpoint on a boundary or a sharp edge)
//! 3. A vertex point is `(Q + 2R + (n - 3)S) / n` in the interior, with the
//!    crease and corner rules for tagged vertices and the `(a + 6S + b) / 8`
//!    rule on a boundary
//!
//! Sharp edge weights are squared at each level; corner weights carry over
//! unchanged.
//!
//! # Regular Patches
//!
//! [`can_use_patch`] recognises faces whose neighbourhood is a regular grid
//! of smooth quads. For those, [`patch_control_vertices`] returns the 16
//! control vertices of the equivalent bicubic B-spline patch.
//!
//! # Example
//!
//! ```
//! use lathwork::algo::subdivide::{refine_to_depth, subdivide_face};
//! use lathwork::mesh::{build_from_polygons, FacetId, Topology};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut topo: Topology = build_from_polygons(&points, &[[0usize, 1, 2, 3]]).unwrap();
//! let face = topo.facet(FacetId::new(0)).unwrap();
//!
//! let children = subdivide_face(&mut topo, face).unwrap();
//! assert_eq!(children.len(), 4);
//! assert_eq!(topo.vertex_count(), 13);
//!
//! let finest = refine_to_depth(&mut topo, face, 2).unwrap();
//! assert_eq!(finest.len(), 16);
//! ```
//!
//! # References
//!
//! - Catmull, E. & Clark, J. (1978). "Recursively generated B-spline surfaces
//!   on arbitrary topological meshes." Computer-Aided Design, 10(6), 350-355.
//! - DeRose, T., Kass, M. & Truong, T. (1998). "Subdivision Surfaces in
//!   Character Animation." SIGGRAPH '98.

pub mod catmull_clark;
mod patch;
mod refine;

pub use patch::{can_use_patch, patch_control_vertices};
pub use refine::{refine_neighbourhood, refine_to_depth, subdivide_face, MAX_SUBDIVISION_LEVEL};
