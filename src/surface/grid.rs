//! Micropolygon grids.

use nalgebra::{Point3, Vector3};

use super::options::{DiceOptions, Uses};
use crate::attrib::{
    AttributeStore, PrimVar, VarClass, VarData, COLOR, OPACITY, PARAM_U, PARAM_V, POSITION,
    TEXTURE_S, TEXTURE_T,
};
use crate::error::{Result, SubdivError};

/// A regular grid of `(u_size + 1) x (v_size + 1)` shading samples.
///
/// Samples are stored row-major: sample `(iu, iv)` is element
/// `iv * (u_size + 1) + iu` of every per-vertex variable. Per-vertex
/// variables carry [`VarClass::Varying`]; constant and uniform mesh
/// variables become [`VarClass::Constant`] with one value.
#[derive(Debug, Clone, PartialEq)]
pub struct MicroPolyGrid {
    u_size: usize,
    v_size: usize,
    vars: Vec<PrimVar>,
}

impl MicroPolyGrid {
    /// An empty grid of `u_size x v_size` micropolygons.
    pub fn new(u_size: usize, v_size: usize) -> Self {
        Self {
            u_size,
            v_size,
            vars: Vec::new(),
        }
    }

    /// Micropolygons along u.
    pub fn u_size(&self) -> usize {
        self.u_size
    }

    /// Micropolygons along v.
    pub fn v_size(&self) -> usize {
        self.v_size
    }

    /// Number of samples.
    pub fn vertex_count(&self) -> usize {
        (self.u_size + 1) * (self.v_size + 1)
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&PrimVar> {
        self.vars.iter().find(|v| v.name == name)
    }

    /// All variables.
    pub fn vars(&self) -> &[PrimVar] {
        &self.vars
    }

    /// Sample positions.
    pub fn points(&self) -> Result<&[Point3<f64>]> {
        match self.get(POSITION) {
            Some(PrimVar {
                data: VarData::Point(p),
                ..
            }) => Ok(p.as_slice()),
            _ => Err(SubdivError::AttributeMismatch("grid has no positions".into())),
        }
    }

    /// Add a variable, replacing any with the same name.
    pub fn insert(&mut self, var: PrimVar) {
        if let Some(slot) = self.vars.iter_mut().find(|v| v.name == var.name) {
            *slot = var;
        } else {
            self.vars.push(var);
        }
    }

    /// Fill a square grid from one time sample.
    ///
    /// `indices` holds the mesh vertex of every sample in row-major order and
    /// `facet` the base facet the grid came from.
    pub(crate) fn gather(
        store: &AttributeStore,
        indices: &[usize],
        facet: usize,
        size: usize,
        options: &DiceOptions,
    ) -> Result<Self> {
        let mut grid = Self::new(size, size);
        if indices.len() != grid.vertex_count() {
            return Err(SubdivError::AttributeMismatch(format!(
                "{} samples for a {}x{} grid",
                indices.len(),
                size,
                size
            )));
        }

        for var in store.vars() {
            let (class, data) = match var.class {
                VarClass::Vertex | VarClass::Varying => (VarClass::Varying, var.data.gather(indices)?),
                VarClass::Uniform => (VarClass::Constant, var.data.gather(&[facet])?),
                VarClass::Constant => (VarClass::Constant, var.data.clone()),
            };
            grid.insert(PrimVar::new(var.name.clone(), class, data));
        }

        grid.fill_defaults(store, options)?;
        Ok(grid)
    }

    fn fill_defaults(&mut self, store: &AttributeStore, options: &DiceOptions) -> Result<()> {
        let uses = options.uses;
        let n = self.vertex_count();
        let (xs, ys): (Vec<f64>, Vec<f64>) = self.points()?.iter().map(|p| (p.x, p.y)).unzip();

        if uses.contains(Uses::S) && !store.contains(TEXTURE_S) {
            self.insert(PrimVar::new(TEXTURE_S, VarClass::Varying, VarData::Float(xs)));
        }
        if uses.contains(Uses::T) && !store.contains(TEXTURE_T) {
            self.insert(PrimVar::new(TEXTURE_T, VarClass::Varying, VarData::Float(ys)));
        }

        let white = Vector3::new(1.0, 1.0, 1.0);
        if uses.contains(Uses::CS) && !store.contains(COLOR) {
            let c = options.color.unwrap_or(white);
            self.insert(PrimVar::new(COLOR, VarClass::Varying, VarData::Color(vec![c; n])));
        }
        if uses.contains(Uses::OS) && !store.contains(OPACITY) {
            let o = options.opacity.unwrap_or(white);
            self.insert(PrimVar::new(OPACITY, VarClass::Varying, VarData::Color(vec![o; n])));
        }

        let (nu, nv) = (self.u_size, self.v_size);
        let param = |f: &dyn Fn(usize, usize) -> f64| -> Vec<f64> {
            (0..=nv)
                .flat_map(|iv| (0..=nu).map(move |iu| (iu, iv)))
                .map(|(iu, iv)| f(iu, iv))
                .collect()
        };
        if uses.contains(Uses::U) && !store.contains(PARAM_U) {
            let u = param(&|iu, _| iu as f64 / nu.max(1) as f64);
            self.insert(PrimVar::new(PARAM_U, VarClass::Varying, VarData::Float(u)));
        }
        if uses.contains(Uses::V) && !store.contains(PARAM_V) {
            let v = param(&|_, iv| iv as f64 / nv.max(1) as f64);
            self.insert(PrimVar::new(PARAM_V, VarClass::Varying, VarData::Float(v)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AttributeStore {
        let points: Vec<Point3<f64>> = (0..9)
            .map(|i| Point3::new((i % 3) as f64, (i / 3) as f64, 0.0))
            .collect();
        AttributeStore::new(points)
            .with_var(PrimVar::new("id", VarClass::Uniform, VarData::Integer(vec![7, 8])))
            .with_var(PrimVar::new("k", VarClass::Constant, VarData::Float(vec![0.5])))
            .with_var(PrimVar::new(
                "w",
                VarClass::Varying,
                VarData::Float((0..9).map(|i| i as f64 * 10.0).collect()),
            ))
    }

    #[test]
    fn test_gather_by_class() {
        let indices: Vec<usize> = (0..9).rev().collect();
        let grid = MicroPolyGrid::gather(&store(), &indices, 1, 2, &DiceOptions::default()).unwrap();
        assert_eq!(grid.vertex_count(), 9);
        assert_eq!(grid.points().unwrap()[0], Point3::new(2.0, 2.0, 0.0));
        assert_eq!(grid.get("id").unwrap().data, VarData::Integer(vec![8]));
        assert_eq!(grid.get("id").unwrap().class, VarClass::Constant);
        assert_eq!(grid.get("k").unwrap().data, VarData::Float(vec![0.5]));
        match &grid.get("w").unwrap().data {
            VarData::Float(w) => assert_eq!(w[0], 80.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let indices: Vec<usize> = (0..9).collect();
        let opts = DiceOptions::default().with_color(Vector3::new(1.0, 0.0, 0.0));
        let grid = MicroPolyGrid::gather(&store(), &indices, 0, 2, &opts).unwrap();

        assert_eq!(
            grid.get(TEXTURE_S).unwrap().data,
            VarData::Float(vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0])
        );
        assert_eq!(
            grid.get(PARAM_U).unwrap().data,
            VarData::Float(vec![0.0, 0.5, 1.0, 0.0, 0.5, 1.0, 0.0, 0.5, 1.0])
        );
        assert_eq!(
            grid.get(PARAM_V).unwrap().data,
            VarData::Float(vec![0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0])
        );
        assert_eq!(
            grid.get(COLOR).unwrap().data,
            VarData::Color(vec![Vector3::new(1.0, 0.0, 0.0); 9])
        );
        assert_eq!(
            grid.get(OPACITY).unwrap().data,
            VarData::Color(vec![Vector3::new(1.0, 1.0, 1.0); 9])
        );
    }

    #[test]
    fn test_uses_limits_defaults() {
        let indices: Vec<usize> = (0..9).collect();
        let opts = DiceOptions::default().with_uses(Uses::P);
        let grid = MicroPolyGrid::gather(&store(), &indices, 0, 2, &opts).unwrap();
        assert!(grid.get(TEXTURE_S).is_none());
        assert!(grid.get(COLOR).is_none());
        assert!(grid.get(POSITION).is_some());
    }

    #[test]
    fn test_sample_count_mismatch() {
        let result = MicroPolyGrid::gather(&store(), &[0, 1, 2], 0, 2, &DiceOptions::default());
        assert!(matches!(result, Err(SubdivError::AttributeMismatch(_))));
    }
}
