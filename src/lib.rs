//! # Lathwork
//!
//! Adaptive Catmull-Clark subdivision surfaces for a micropolygon renderer.
//!
//! Lathwork keeps a control mesh in a lath topology, refines it lazily one
//! facet at a time, and turns each facet into either a diceable grid of
//! shading samples or a bicubic Bezier patch, depending on its projected size
//! and the regularity of its neighbourhood.
//!
//! ## Features
//!
//! - **Lath topology**: two links per facet corner, typed handles, 16/32/64-bit indices
//! - **Lazy refinement**: only the facets a renderer asks about are subdivided
//! - **Semi-sharp creases**: per-edge and per-corner sharpness, holes, boundary interpolation
//! - **Primitive variables**: every storage class and value type, interpolated alongside `P`
//! - **Motion blur**: any number of time samples sharing one topology
//! - **Split/dice**: screen-space dice sizes, bicubic conversion for regular patches
//!
//! ## Quick Start
//!
//! ```
//! use lathwork::prelude::*;
//! use nalgebra::{Matrix4, Point3};
//!
//! // A unit quad with its boundary interpolated
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let desc = MeshDescription::new(&[[0usize, 1, 2, 3]]).with_interpolate_boundary(true);
//! let slots = vec![TimeSlot::new(0.0, AttributeStore::new(points))];
//! let mesh: SubdivisionMesh = SubdivisionMesh::new(&desc, slots).unwrap();
//!
//! // Dice at 8 pixels across
//! let options = TessellateOptions::new(DiceOptions::new(Matrix4::new_scaling(8.0)));
//! let result = tessellate(&mesh, &options).unwrap();
//!
//! let grid = result.grids[0].first().unwrap();
//! assert_eq!(grid.u_size(), 8);
//! assert_eq!(grid.vertex_count(), 81);
//! ```
//!
//! ## Driving Patches by Hand
//!
//! A renderer usually splits and dices patches itself, interleaved with
//! bucketing and culling:
//!
//! ```
//! use lathwork::prelude::*;
//! use nalgebra::{Matrix4, Point3};
//!
//! # let points = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(1.0, 1.0, 0.0),
//! #     Point3::new(0.0, 1.0, 0.0),
//! # ];
//! # let desc = MeshDescription::new(&[[0usize, 1, 2, 3]]).with_interpolate_boundary(true);
//! # let slots = vec![TimeSlot::new(0.0, AttributeStore::new(points))];
//! let mesh: SubdivisionMesh = SubdivisionMesh::new(&desc, slots).unwrap();
//! let options = DiceOptions::new(Matrix4::new_scaling(64.0));
//!
//! let mut stack = mesh.split().unwrap();
//! let mut grids = 0;
//! while let Some(mut patch) = stack.pop() {
//!     if patch.diceable(&options).unwrap() {
//!         patch.dice(&options).unwrap();
//!         grids += 1;
//!     } else if !patch.is_discarded() {
//!         for part in patch.split(&options).unwrap() {
//!             if let Surface::Patch(child) = part {
//!                 stack.push(child);
//!             }
//!         }
//!     }
//! }
//! assert_eq!(grids, 16);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod attrib;
pub mod error;
pub mod io;
pub mod mesh;
pub mod surface;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use lathwork::prelude::*;
/// ```
pub mod prelude {
    pub use crate::attrib::{AttributeStore, PrimVar, TimeSlot, VarClass, VarData};
    pub use crate::error::{Result, SubdivError};
    pub use crate::mesh::{
        build_from_polygons, build_topology, FacetId, LathId, MeshDescription, MeshIndex,
        SharedTopology, Topology, VertexId,
    };
    pub use crate::surface::{
        tessellate, BicubicPatch, DiceOptions, MicroPolyGrid, Motion, SubdivisionMesh,
        SubdivisionPatch, Surface, TessellateOptions, Uses,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::{Matrix4, Point3};

    fn cube() -> (Vec<Point3<f64>>, Vec<[usize; 4]>) {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            [0, 3, 2, 1], // bottom
            [4, 5, 6, 7], // top
            [0, 1, 5, 4], // front
            [1, 2, 6, 5], // right
            [2, 3, 7, 6], // back
            [3, 0, 4, 7], // left
        ];
        (points, faces)
    }

    #[test]
    fn test_cube_end_to_end() {
        let (points, faces) = cube();
        let slots = vec![TimeSlot::new(0.0, AttributeStore::new(points))];
        let mesh: SubdivisionMesh = SubdivisionMesh::new(&MeshDescription::new(&faces), slots).unwrap();

        let bound = mesh.bound().unwrap();
        assert_eq!(bound.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bound.max, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(mesh.split().unwrap().len(), 6);

        // Looking down z, the four side faces project to lines.
        let options = TessellateOptions::new(DiceOptions::new(Matrix4::new_scaling(4.0)));
        let result = tessellate(&mesh, &options).unwrap();
        assert_eq!(result.grids.len(), 2);
        assert_eq!(result.discarded, 4);
        assert!(result.bicubics.is_empty());

        for grid in &result.grids {
            let grid = grid.first().unwrap();
            assert_eq!(grid.u_size(), 4);
            // the limit surface pulls away from the cube's faces
            for p in grid.points().unwrap() {
                assert!(p.z > 0.0 && p.z < 1.0);
            }
        }
    }
}
