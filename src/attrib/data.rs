//! Typed value arrays.

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use super::Stencil;
use crate::error::{Result, SubdivError};

/// Element type of a primitive variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    /// Scalar float.
    Float,
    /// Integer; blended in floating point and truncated.
    Integer,
    /// Position.
    Point,
    /// Surface normal.
    Normal,
    /// Direction.
    Vector,
    /// RGB colour.
    Color,
    /// Homogeneous point.
    HPoint,
    /// String; carried, never blended.
    String,
    /// 4x4 matrix; carried, never blended.
    Matrix,
}

impl VarType {
    /// Whether values of this type are blended by subdivision.
    pub fn is_interpolated(self) -> bool {
        !matches!(self, VarType::String | VarType::Matrix)
    }
}

/// One array of values, tagged by element type.
#[derive(Debug, Clone, PartialEq)]
pub enum VarData {
    /// Scalar floats.
    Float(Vec<f64>),
    /// Integers.
    Integer(Vec<i64>),
    /// Positions.
    Point(Vec<Point3<f64>>),
    /// Normals.
    Normal(Vec<Vector3<f64>>),
    /// Directions.
    Vector(Vec<Vector3<f64>>),
    /// RGB colours.
    Color(Vec<Vector3<f64>>),
    /// Homogeneous points.
    HPoint(Vec<Vector4<f64>>),
    /// Strings.
    String(Vec<String>),
    /// Matrices.
    Matrix(Vec<Matrix4<f64>>),
}

fn blend_f64(values: &[f64], stencil: &Stencil) -> f64 {
    stencil.terms().iter().map(|&(i, w)| values[i] * w).sum()
}

fn blend_vec3(values: &[Vector3<f64>], stencil: &Stencil) -> Vector3<f64> {
    stencil
        .terms()
        .iter()
        .fold(Vector3::zeros(), |acc, &(i, w)| acc + values[i] * w)
}

fn project(h: &Vector4<f64>) -> Vector3<f64> {
    if h.w == 0.0 {
        h.xyz()
    } else {
        h.xyz() / h.w
    }
}

/// Homogeneous points blend in projected space and come back with `w = 1`.
fn blend_hpoint(values: &[Vector4<f64>], stencil: &Stencil) -> Vector4<f64> {
    if let [(i, w)] = stencil.terms() {
        if *w == 1.0 {
            return values[*i];
        }
    }
    stencil
        .terms()
        .iter()
        .fold(Vector3::zeros(), |acc, &(i, w)| acc + project(&values[i]) * w)
        .push(1.0)
}

fn blend_point(values: &[Point3<f64>], stencil: &Stencil) -> Point3<f64> {
    Point3::from(
        stencil
            .terms()
            .iter()
            .fold(Vector3::zeros(), |acc, &(i, w)| acc + values[i].coords * w),
    )
}

fn pick<T: Clone>(values: &[T], stencil: &Stencil) -> Result<T> {
    stencil
        .dominant()
        .map(|i| values[i].clone())
        .ok_or_else(|| SubdivError::AttributeMismatch("empty stencil".into()))
}

impl VarData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            VarData::Float(v) => v.len(),
            VarData::Integer(v) => v.len(),
            VarData::Point(v) => v.len(),
            VarData::Normal(v) | VarData::Vector(v) | VarData::Color(v) => v.len(),
            VarData::HPoint(v) => v.len(),
            VarData::String(v) => v.len(),
            VarData::Matrix(v) => v.len(),
        }
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type.
    pub fn var_type(&self) -> VarType {
        match self {
            VarData::Float(_) => VarType::Float,
            VarData::Integer(_) => VarType::Integer,
            VarData::Point(_) => VarType::Point,
            VarData::Normal(_) => VarType::Normal,
            VarData::Vector(_) => VarType::Vector,
            VarData::Color(_) => VarType::Color,
            VarData::HPoint(_) => VarType::HPoint,
            VarData::String(_) => VarType::String,
            VarData::Matrix(_) => VarType::Matrix,
        }
    }

    /// An empty array of the same type.
    pub fn empty_like(&self) -> VarData {
        match self {
            VarData::Float(_) => VarData::Float(Vec::new()),
            VarData::Integer(_) => VarData::Integer(Vec::new()),
            VarData::Point(_) => VarData::Point(Vec::new()),
            VarData::Normal(_) => VarData::Normal(Vec::new()),
            VarData::Vector(_) => VarData::Vector(Vec::new()),
            VarData::Color(_) => VarData::Color(Vec::new()),
            VarData::HPoint(_) => VarData::HPoint(Vec::new()),
            VarData::String(_) => VarData::String(Vec::new()),
            VarData::Matrix(_) => VarData::Matrix(Vec::new()),
        }
    }

    /// Build a new array with one element per stencil.
    ///
    /// The type is matched once for the whole array. Strings and matrices take
    /// the value of the dominant source.
    pub fn resample(&self, stencils: &[Stencil]) -> Result<VarData> {
        let len = self.len();
        for s in stencils {
            if let Some(max) = s.max_index() {
                if max >= len {
                    return Err(SubdivError::AttributeMismatch(format!(
                        "stencil references element {} of {}",
                        max, len
                    )));
                }
            }
        }

        Ok(match self {
            VarData::Float(v) => VarData::Float(stencils.iter().map(|s| blend_f64(v, s)).collect()),
            VarData::Integer(v) => {
                let as_f64: Vec<f64> = v.iter().map(|&x| x as f64).collect();
                VarData::Integer(
                    stencils
                        .iter()
                        .map(|s| blend_f64(&as_f64, s).trunc() as i64)
                        .collect(),
                )
            }
            VarData::Point(v) => VarData::Point(stencils.iter().map(|s| blend_point(v, s)).collect()),
            VarData::Normal(v) => VarData::Normal(stencils.iter().map(|s| blend_vec3(v, s)).collect()),
            VarData::Vector(v) => VarData::Vector(stencils.iter().map(|s| blend_vec3(v, s)).collect()),
            VarData::Color(v) => VarData::Color(stencils.iter().map(|s| blend_vec3(v, s)).collect()),
            VarData::HPoint(v) => VarData::HPoint(stencils.iter().map(|s| blend_hpoint(v, s)).collect()),
            VarData::String(v) => {
                VarData::String(stencils.iter().map(|s| pick(v, s)).collect::<Result<Vec<_>>>()?)
            }
            VarData::Matrix(v) => {
                VarData::Matrix(stencils.iter().map(|s| pick(v, s)).collect::<Result<Vec<_>>>()?)
            }
        })
    }

    /// Copy out the elements at `indices`.
    pub fn gather(&self, indices: &[usize]) -> Result<VarData> {
        let stencils: Vec<Stencil> = indices.iter().map(|&i| Stencil::single(i)).collect();
        self.resample(&stencils)
    }

    /// Append the elements of `other`, which must have the same type.
    pub fn extend(&mut self, other: VarData) -> Result<()> {
        match (self, other) {
            (VarData::Float(a), VarData::Float(b)) => a.extend(b),
            (VarData::Integer(a), VarData::Integer(b)) => a.extend(b),
            (VarData::Point(a), VarData::Point(b)) => a.extend(b),
            (VarData::Normal(a), VarData::Normal(b)) => a.extend(b),
            (VarData::Vector(a), VarData::Vector(b)) => a.extend(b),
            (VarData::Color(a), VarData::Color(b)) => a.extend(b),
            (VarData::HPoint(a), VarData::HPoint(b)) => a.extend(b),
            (VarData::String(a), VarData::String(b)) => a.extend(b),
            (VarData::Matrix(a), VarData::Matrix(b)) => a.extend(b),
            (a, b) => {
                return Err(SubdivError::AttributeMismatch(format!(
                    "cannot append {:?} values to {:?} array",
                    b.var_type(),
                    a.var_type()
                )))
            }
        }
        Ok(())
    }

    /// Append one element formed by applying `stencil` to this array.
    pub fn append(&mut self, stencil: &Stencil) -> Result<()> {
        let value = self.resample(std::slice::from_ref(stencil))?;
        self.extend(value)
    }

    /// Position of element `i` as a point, for point-like arrays.
    pub fn point_at(&self, i: usize) -> Option<Point3<f64>> {
        match self {
            VarData::Point(v) => v.get(i).copied(),
            VarData::Normal(v) | VarData::Vector(v) | VarData::Color(v) => {
                v.get(i).map(|x| Point3::from(*x))
            }
            VarData::HPoint(v) => v.get(i).map(|x| Point3::from(project(x))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resample_points() {
        let data = VarData::Point(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
        ]);
        let out = data.resample(&[Stencil::average([0, 1, 2])]).unwrap();
        let p = out.point_at(0).unwrap();
        assert_relative_eq!(p.x, 4.0 / 3.0);
        assert_relative_eq!(p.y, 2.0 / 3.0);
    }

    #[test]
    fn test_integer_truncates() {
        let mut data = VarData::Integer(vec![1, 2, -1, -2]);
        data.append(&Stencil::average([0, 1])).unwrap();
        data.append(&Stencil::average([2, 3])).unwrap();
        assert_eq!(data, VarData::Integer(vec![1, 2, -1, -2, 1, -1]));
    }

    #[test]
    fn test_hpoint_blends_projected() {
        // (2, 0, 0, 2) and (0, 4, 0, 2) project to (1, 0, 0) and (0, 2, 0)
        let mut data = VarData::HPoint(vec![
            Vector4::new(2.0, 0.0, 0.0, 2.0),
            Vector4::new(0.0, 4.0, 0.0, 2.0),
        ]);
        data.append(&Stencil::average([0, 1])).unwrap();
        let VarData::HPoint(v) = &data else {
            panic!("type changed");
        };
        assert_relative_eq!(v[2], Vector4::new(0.5, 1.0, 0.0, 1.0));
        // single-source copies keep their weight
        assert_eq!(
            data.gather(&[1]).unwrap(),
            VarData::HPoint(vec![Vector4::new(0.0, 4.0, 0.0, 2.0)])
        );
        assert_eq!(data.point_at(0), Some(Point3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_strings_take_dominant() {
        let mut data = VarData::String(vec!["a".into(), "b".into()]);
        let mut s = Stencil::new();
        s.add(0, 0.25);
        s.add(1, 0.75);
        data.append(&s).unwrap();
        assert_eq!(data, VarData::String(vec!["a".into(), "b".into(), "b".into()]));
        assert!(!data.var_type().is_interpolated());
    }

    #[test]
    fn test_out_of_range_stencil() {
        let data = VarData::Float(vec![1.0]);
        assert!(matches!(
            data.resample(&[Stencil::single(3)]),
            Err(SubdivError::AttributeMismatch(_))
        ));
    }

    #[test]
    fn test_extend_type_mismatch() {
        let mut data = VarData::Float(vec![1.0]);
        assert!(data.extend(VarData::Integer(vec![1])).is_err());
    }

    #[test]
    fn test_gather() {
        let data = VarData::Float(vec![10.0, 20.0, 30.0]);
        assert_eq!(data.gather(&[2, 0]).unwrap(), VarData::Float(vec![30.0, 10.0]));
    }
}
