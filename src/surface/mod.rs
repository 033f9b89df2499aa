//! Adaptive tessellation of subdivision surfaces.
//!
//! A [`SubdivisionMesh`] owns a finalised topology and splits into one
//! [`SubdivisionPatch`] per renderable base facet. Each patch is then either
//!
//! - **diced** into a [`MicroPolyGrid`] once its projected size fits the grid
//!   budget,
//! - **split** into its four (or n) child facets, refining the shared
//!   topology lazily,
//! - converted to a [`BicubicPatch`] when its neighbourhood is regular, or
//! - discarded when it projects to nothing.
//!
//! [`tessellate`] runs that loop over a whole mesh.
//!
//! Every output is wrapped in [`Motion`]: one value per time sample of the
//! mesh, collapsing to [`Motion::Static`] for a single sample.

mod bicubic;
mod bound;
mod grid;
mod mesh;
mod motion;
mod options;
mod patch;
mod scheduler;

pub use bicubic::BicubicPatch;
pub use bound::Bound;
pub use grid::MicroPolyGrid;
pub use mesh::SubdivisionMesh;
pub use motion::Motion;
pub use options::{DiceOptions, TessellateOptions, Uses};
pub use patch::{SplitDir, SubdivisionPatch, Surface};
pub use scheduler::{tessellate, tessellate_with_progress, Tessellation};
