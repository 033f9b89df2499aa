//! Multi-resolution mesh topology.
//!
//! The mesh is represented with **laths**: one lath per corner of every
//! facet, at every subdivision level. Each lath knows its vertex, the next
//! corner clockwise around its facet, and the next corner clockwise around
//! its vertex. All other adjacency is derived from those two links.
//!
//! # Handles
//!
//! Elements are identified by typed handles over a [`MeshIndex`] integer:
//! - [`LathId`] - a lath in the topology arena
//! - [`VertexId`] - an index into the attribute arrays
//! - [`FacetId`] - a base (level 0) facet
//!
//! # Construction
//!
//! ```
//! use lathwork::mesh::{build_from_polygons, Topology, FacetId};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(2.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0usize, 1, 4, 3], [1, 2, 5, 4]];
//!
//! let topo: Topology = build_from_polygons(&points, &faces).unwrap();
//! let first = topo.facet(FacetId::new(0)).unwrap();
//! assert_eq!(topo.corner_count(first).unwrap(), 4);
//! assert!(topo.is_boundary_facet(first).unwrap());
//! ```

mod builder;
mod finalise;
mod index;
mod lath;
mod topology;

#[cfg(test)]
pub(crate) use builder::grid_mesh;
pub use builder::{build_from_polygons, build_topology, MeshDescription};
pub use index::{FacetId, LathId, MeshIndex, VertexId};
pub use lath::Lath;
pub use topology::{FaceLathIter, SharedTopology, Topology, VertexFan};
