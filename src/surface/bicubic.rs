//! Bicubic Bezier patches built from regular subdivision neighbourhoods.
//!
//! Away from extraordinary vertices and creases, Catmull-Clark converges to
//! the uniform bicubic B-spline over the 4x4 control block around a face.
//! The block is converted to Bezier form once, `B = M G Mᵀ`, with
//!
//! ```text
//!           | 1 4 1 0 |
//! M = 1/6 * | 0 4 2 0 |
//!           | 0 2 4 0 |
//!           | 0 1 4 1 |
//! ```
//!
//! The conversion is linear, so it is applied to every vertex-class variable
//! as a set of stencils over the 16 gathered values.

use nalgebra::{Point3, Vector3};

use super::options::Uses;
use crate::attrib::{
    AttributeStore, PrimVar, Stencil, VarClass, VarData, PARAM_U, PARAM_V, POSITION, TEXTURE_S,
    TEXTURE_T,
};
use crate::error::{Result, SubdivError};

const BSPLINE_TO_BEZIER: [[f64; 4]; 4] = [
    [1.0 / 6.0, 4.0 / 6.0, 1.0 / 6.0, 0.0],
    [0.0, 4.0 / 6.0, 2.0 / 6.0, 0.0],
    [0.0, 2.0 / 6.0, 4.0 / 6.0, 0.0],
    [0.0, 1.0 / 6.0, 4.0 / 6.0, 1.0 / 6.0],
];

/// Control-block entries that are the face's own corners, in parametric
/// order `(0,0) (1,0) (0,1) (1,1)`.
const FACE_CORNERS: [usize; 4] = [5, 6, 9, 10];

/// Stencils taking a row-major 4x4 B-spline block to Bezier form.
fn bezier_stencils() -> Vec<Stencil> {
    let mut out = Vec::with_capacity(16);
    for row in &BSPLINE_TO_BEZIER {
        for col in &BSPLINE_TO_BEZIER {
            let mut s = Stencil::new();
            for (k, &wr) in row.iter().enumerate() {
                for (l, &wc) in col.iter().enumerate() {
                    if wr != 0.0 && wc != 0.0 {
                        s.add(k * 4 + l, wr * wc);
                    }
                }
            }
            out.push(s);
        }
    }
    out
}

fn bernstein(t: f64) -> [f64; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

/// A bicubic Bezier patch with its primitive variables.
///
/// Vertex-class variables have 16 values in Bezier form, varying ones 4
/// (one per parametric corner), uniform and constant ones a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct BicubicPatch {
    vars: Vec<PrimVar>,
}

impl BicubicPatch {
    /// Build a patch from a B-spline control block of one time sample.
    ///
    /// `control` lists the 16 mesh vertices row by row and `facet` is the
    /// base facet the patch came from.
    pub fn from_control_block(
        store: &AttributeStore,
        control: &[usize; 16],
        facet: usize,
        uses: Uses,
    ) -> Result<Self> {
        let stencils = bezier_stencils();
        let mut vars = Vec::with_capacity(store.vars().len());
        for var in store.vars() {
            let data = match var.class {
                VarClass::Vertex => var.data.gather(control)?.resample(&stencils)?,
                VarClass::Varying => {
                    var.data.gather(&FACE_CORNERS.map(|i| control[i]))?
                }
                VarClass::Uniform => var.data.gather(&[facet])?,
                VarClass::Constant => var.data.clone(),
            };
            vars.push(PrimVar::new(var.name.clone(), var.class, data));
        }

        let mut patch = Self { vars };
        if uses.any_parametric() {
            patch.fill_defaults(store, uses)?;
        }
        Ok(patch)
    }

    fn fill_defaults(&mut self, store: &AttributeStore, uses: Uses) -> Result<()> {
        let p = self.control_points()?;
        let corners = [p[0], p[3], p[12], p[15]];
        let varying = |name: &str, values: [f64; 4]| {
            PrimVar::new(name, VarClass::Varying, VarData::Float(values.to_vec()))
        };

        let mut extra = Vec::new();
        if uses.contains(Uses::S) && !store.contains(TEXTURE_S) {
            extra.push(varying(TEXTURE_S, corners.map(|c| c.x)));
        }
        if uses.contains(Uses::T) && !store.contains(TEXTURE_T) {
            extra.push(varying(TEXTURE_T, corners.map(|c| c.y)));
        }
        if uses.contains(Uses::U) && !store.contains(PARAM_U) {
            extra.push(varying(PARAM_U, [0.0, 1.0, 0.0, 1.0]));
        }
        if uses.contains(Uses::V) && !store.contains(PARAM_V) {
            extra.push(varying(PARAM_V, [0.0, 0.0, 1.0, 1.0]));
        }
        self.vars.extend(extra);
        Ok(())
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&PrimVar> {
        self.vars.iter().find(|v| v.name == name)
    }

    /// All variables.
    pub fn vars(&self) -> &[PrimVar] {
        &self.vars
    }

    /// The 16 Bezier control points, row-major.
    pub fn control_points(&self) -> Result<&[Point3<f64>]> {
        match self.get(POSITION) {
            Some(PrimVar {
                data: VarData::Point(p),
                ..
            }) if p.len() == 16 => Ok(p.as_slice()),
            _ => Err(SubdivError::AttributeMismatch(
                "patch has no 16-point P".into(),
            )),
        }
    }

    /// Evaluate the surface at `(u, v)` in `[0, 1]²`.
    pub fn evaluate(&self, u: f64, v: f64) -> Result<Point3<f64>> {
        for (name, t) in [("u", u), ("v", v)] {
            if !(0.0..=1.0).contains(&t) {
                return Err(SubdivError::invalid_param(name, t, "must lie in [0, 1]"));
            }
        }
        let p = self.control_points()?;
        let (bu, bv) = (bernstein(u), bernstein(v));
        let mut acc = Vector3::zeros();
        for (i, wv) in bv.iter().enumerate() {
            for (j, wu) in bu.iter().enumerate() {
                acc += p[i * 4 + j].coords * (wv * wu);
            }
        }
        Ok(Point3::from(acc))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// A planar 4x4 block with unit spacing.
    fn block() -> AttributeStore {
        let points = (0..16)
            .map(|i| {
                let (x, y) = ((i % 4) as f64, (i / 4) as f64);
                Point3::new(x, y, 0.0)
            })
            .collect();
        AttributeStore::new(points)
            .with_var(PrimVar::new(
                "w",
                VarClass::Varying,
                VarData::Float((0..16).map(|i| i as f64).collect()),
            ))
            .with_var(PrimVar::new("id", VarClass::Uniform, VarData::Integer(vec![3, 4])))
    }

    fn control() -> [usize; 16] {
        std::array::from_fn(|i| i)
    }

    #[test]
    fn test_stencils_are_affine() {
        for s in bezier_stencils() {
            assert_relative_eq!(s.weight_sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_planar_block_is_linear() {
        let patch = BicubicPatch::from_control_block(&block(), &control(), 1, Uses::all()).unwrap();
        let p = patch.control_points().unwrap();
        // Bezier corners land on the face corners of the B-spline block
        assert_relative_eq!(p[0], Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(p[15], Point3::new(2.0, 2.0, 0.0), epsilon = 1e-12);

        let mid = patch.evaluate(0.5, 0.25).unwrap();
        assert_relative_eq!(mid, Point3::new(1.5, 1.25, 0.0), epsilon = 1e-12);
        assert!(patch.evaluate(1.5, 0.0).is_err());
    }

    #[test]
    fn test_variables_by_class() {
        let patch = BicubicPatch::from_control_block(&block(), &control(), 1, Uses::all()).unwrap();
        assert_eq!(
            patch.get("w").unwrap().data,
            VarData::Float(vec![5.0, 6.0, 9.0, 10.0])
        );
        assert_eq!(patch.get("id").unwrap().data, VarData::Integer(vec![4]));
        let floats = |name: &str| match &patch.get(name).unwrap().data {
            VarData::Float(v) => v.clone(),
            other => panic!("unexpected {:?}", other),
        };
        for (got, want) in floats(TEXTURE_S).iter().zip([1.0, 2.0, 1.0, 2.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        for (got, want) in floats(TEXTURE_T).iter().zip([1.0, 1.0, 2.0, 2.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        assert_eq!(
            patch.get(PARAM_U).unwrap().data,
            VarData::Float(vec![0.0, 1.0, 0.0, 1.0])
        );
        assert_eq!(
            patch.get(PARAM_V).unwrap().data,
            VarData::Float(vec![0.0, 0.0, 1.0, 1.0])
        );
    }

    #[test]
    fn test_no_parametric_defaults_without_uses() {
        let patch = BicubicPatch::from_control_block(&block(), &control(), 0, Uses::P).unwrap();
        assert!(patch.get(TEXTURE_S).is_none());
        assert!(patch.get(PARAM_U).is_none());
    }
}
