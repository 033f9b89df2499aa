//! Axis-aligned bounds.

use nalgebra::Point3;

/// Axis-aligned bounding box in object space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Bound {
    /// Create a bound from its corners.
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// An inverted bound that any point expands.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Bound of a set of points; empty if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut b = Self::empty();
        for p in points {
            b.encapsulate(p);
        }
        b
    }

    /// Whether no point has been added.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include `p`.
    pub fn encapsulate(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Grow to include `other`.
    pub fn union(&mut self, other: &Bound) {
        if !other.is_empty() {
            self.encapsulate(&other.min);
            self.encapsulate(&other.max);
        }
    }

    /// Whether `p` lies inside or on the bound.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }
}

impl Default for Bound {
    fn default() -> Self {
        Self::empty()
    }
}
