//! Weighted vertex combinations.

/// A weighted combination of source vertices.
///
/// Subdivision expresses every new vertex as a stencil over existing ones:
/// the topology decides which vertices contribute and with what weight, and
/// each attribute array applies the same stencil to its own values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stencil {
    terms: Vec<(usize, f64)>,
}

impl Stencil {
    /// Create an empty stencil.
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// A stencil that copies one source value.
    pub fn single(index: usize) -> Self {
        Self {
            terms: vec![(index, 1.0)],
        }
    }

    /// Equal-weight average of the given sources. Repeated indices accumulate.
    pub fn average<It>(indices: It) -> Self
    where
        It: IntoIterator<Item = usize>,
    {
        let indices: Vec<usize> = indices.into_iter().collect();
        let mut stencil = Self::new();
        if indices.is_empty() {
            return stencil;
        }
        let w = 1.0 / indices.len() as f64;
        for i in indices {
            stencil.add(i, w);
        }
        stencil
    }

    /// Add `weight` to the contribution of `index`.
    pub fn add(&mut self, index: usize, weight: f64) {
        if let Some(term) = self.terms.iter_mut().find(|(i, _)| *i == index) {
            term.1 += weight;
        } else {
            self.terms.push((index, weight));
        }
    }

    /// Add every term of `other`, scaled by `scale`.
    pub fn add_scaled(&mut self, other: &Stencil, scale: f64) {
        for &(i, w) in &other.terms {
            self.add(i, w * scale);
        }
    }

    /// Linear blend: `a * (1 - t) + b * t`.
    pub fn lerp(a: &Stencil, b: &Stencil, t: f64) -> Self {
        let mut out = Self::new();
        out.add_scaled(a, 1.0 - t);
        out.add_scaled(b, t);
        out
    }

    /// The contributing `(index, weight)` pairs.
    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    /// Whether the stencil has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Sum of all weights; 1 for an affine combination.
    pub fn weight_sum(&self) -> f64 {
        self.terms.iter().map(|(_, w)| w).sum()
    }

    /// The source with the largest weight, first one on ties.
    ///
    /// Used for values that cannot be blended (strings, matrices).
    pub fn dominant(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &(i, w) in &self.terms {
            match best {
                Some((_, bw)) if w <= bw => {}
                _ => best = Some((i, w)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// The largest source index referenced.
    pub fn max_index(&self) -> Option<usize> {
        self.terms.iter().map(|(i, _)| *i).max()
    }
}

/// The pair of stencils describing one new vertex.
///
/// Vertex-class variables follow the Catmull-Clark rules; varying variables
/// are interpolated linearly across the parent face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Masks {
    /// Stencil for vertex-class variables.
    pub vertex: Stencil,
    /// Stencil for varying-class variables.
    pub varying: Stencil,
}

impl Masks {
    /// Masks for a vertex whose vertex and varying rules coincide.
    pub fn linear(stencil: Stencil) -> Self {
        Self {
            vertex: stencil.clone(),
            varying: stencil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_average_merges_repeats() {
        let s = Stencil::average([0, 1, 1, 2]);
        assert_eq!(s.terms().len(), 3);
        assert_relative_eq!(s.weight_sum(), 1.0);
        assert_eq!(s.dominant(), Some(1));
    }

    #[test]
    fn test_lerp() {
        let a = Stencil::single(0);
        let b = Stencil::average([1, 2]);
        let s = Stencil::lerp(&a, &b, 0.25);
        assert_relative_eq!(s.terms()[0].1, 0.75);
        assert_relative_eq!(s.terms()[1].1, 0.125);
        assert_relative_eq!(s.weight_sum(), 1.0);
    }

    #[test]
    fn test_empty_stencil() {
        let s = Stencil::average(Vec::<usize>::new());
        assert!(s.is_empty());
        assert_eq!(s.dominant(), None);
        assert_eq!(s.max_index(), None);
    }
}
