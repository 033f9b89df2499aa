//! Primitive variables attached to a subdivision mesh.
//!
//! An [`AttributeStore`] holds every named variable for one time sample of
//! the mesh: the position `P` plus any user variables. Each variable has a
//! storage [`VarClass`] that decides how it grows when subdivision adds a
//! vertex:
//!
//! | Class      | Length        | On a new vertex                 |
//! |------------|---------------|---------------------------------|
//! | `Constant` | 1             | unchanged                       |
//! | `Uniform`  | base facets   | unchanged                       |
//! | `Varying`  | vertices      | linear interpolation            |
//! | `Vertex`   | vertices      | Catmull-Clark mask              |
//!
//! The topology never looks inside the arrays. It hands each store a pair of
//! [`Stencil`]s (see [`Masks`]) and every array applies them to its own type.
//!
//! # Example
//!
//! ```
//! use lathwork::attrib::{AttributeStore, PrimVar, VarClass, VarData};
//! use nalgebra::Point3;
//!
//! let mut store = AttributeStore::new(vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//! ]);
//! store.insert(PrimVar::new("s", VarClass::Varying, VarData::Float(vec![0.0, 1.0, 1.0])));
//!
//! assert_eq!(store.vertex_count(), 3);
//! assert!(store.get("s").is_some());
//! ```

mod data;
mod stencil;

pub use data::{VarData, VarType};
pub use stencil::{Masks, Stencil};

use nalgebra::Point3;

use crate::error::{Result, SubdivError};

/// Name of the position variable.
pub const POSITION: &str = "P";
/// Name of the surface colour variable.
pub const COLOR: &str = "Cs";
/// Name of the surface opacity variable.
pub const OPACITY: &str = "Os";
/// Name of the first texture coordinate.
pub const TEXTURE_S: &str = "s";
/// Name of the second texture coordinate.
pub const TEXTURE_T: &str = "t";
/// Name of the first surface parameter.
pub const PARAM_U: &str = "u";
/// Name of the second surface parameter.
pub const PARAM_V: &str = "v";

/// Storage class of a primitive variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarClass {
    /// One value for the whole mesh.
    Constant,
    /// One value per base facet.
    Uniform,
    /// One value per vertex, interpolated linearly.
    Varying,
    /// One value per vertex, interpolated by the subdivision rules.
    Vertex,
}

impl VarClass {
    /// Whether the variable has one value per vertex.
    pub fn is_per_vertex(self) -> bool {
        matches!(self, VarClass::Varying | VarClass::Vertex)
    }
}

/// A named, classed array of values.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimVar {
    /// Variable name.
    pub name: String,
    /// Storage class.
    pub class: VarClass,
    /// Values.
    pub data: VarData,
}

impl PrimVar {
    /// Create a variable.
    pub fn new(name: impl Into<String>, class: VarClass, data: VarData) -> Self {
        Self {
            name: name.into(),
            class,
            data,
        }
    }
}

/// All primitive variables for one time sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeStore {
    vars: Vec<PrimVar>,
}

impl AttributeStore {
    /// Create a store holding only the vertex positions.
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self {
            vars: vec![PrimVar::new(POSITION, VarClass::Vertex, VarData::Point(points))],
        }
    }

    /// Add a variable, replacing any existing one with the same name.
    pub fn insert(&mut self, var: PrimVar) {
        if let Some(slot) = self.vars.iter_mut().find(|v| v.name == var.name) {
            *slot = var;
        } else {
            self.vars.push(var);
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_var(mut self, var: PrimVar) -> Self {
        self.insert(var);
        self
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&PrimVar> {
        self.vars.iter().find(|v| v.name == name)
    }

    /// Whether a variable with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All variables in insertion order; `P` is first.
    pub fn vars(&self) -> &[PrimVar] {
        &self.vars
    }

    /// Vertex positions.
    pub fn points(&self) -> Result<&[Point3<f64>]> {
        match self.get(POSITION) {
            Some(PrimVar {
                data: VarData::Point(p),
                ..
            }) => Ok(p.as_slice()),
            _ => Err(SubdivError::AttributeMismatch(
                "store has no point-typed P".into(),
            )),
        }
    }

    /// Number of vertices, taken from `P`.
    pub fn vertex_count(&self) -> usize {
        self.points().map(|p| p.len()).unwrap_or(0)
    }

    /// Check every array length against the mesh.
    pub fn validate(&self, vertex_count: usize, facet_count: usize) -> Result<()> {
        self.points()?;
        for var in &self.vars {
            let expected = match var.class {
                VarClass::Constant => 1,
                VarClass::Uniform => facet_count,
                VarClass::Varying | VarClass::Vertex => vertex_count,
            };
            if var.data.len() != expected {
                return Err(SubdivError::AttributeMismatch(format!(
                    "{:?} variable '{}' has {} values, expected {}",
                    var.class,
                    var.name,
                    var.data.len(),
                    expected
                )));
            }
        }
        Ok(())
    }

    /// Append one vertex to every per-vertex array.
    pub fn append(&mut self, masks: &Masks) -> Result<()> {
        for var in &mut self.vars {
            match var.class {
                VarClass::Vertex => var.data.append(&masks.vertex)?,
                VarClass::Varying => var.data.append(&masks.varying)?,
                VarClass::Constant | VarClass::Uniform => {}
            }
        }
        Ok(())
    }
}

/// An attribute store tagged with its sample time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlot {
    /// Shutter time of the sample.
    pub time: f64,
    /// Variables at that time.
    pub store: AttributeStore,
}

impl TimeSlot {
    /// Create a time slot.
    pub fn new(time: f64, store: AttributeStore) -> Self {
        Self { time, store }
    }
}
