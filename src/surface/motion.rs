//! Time-sampled values.

/// A value that is either the same for the whole shutter interval or sampled
/// at several times.
#[derive(Debug, Clone, PartialEq)]
pub enum Motion<T> {
    /// A single sample.
    Static(T),
    /// Samples at increasing times.
    Deforming(Vec<(f64, T)>),
}

impl<T> Motion<T> {
    /// Wrap time samples, collapsing a single sample to [`Motion::Static`].
    ///
    /// Returns `None` if `samples` is empty.
    pub fn from_samples(mut samples: Vec<(f64, T)>) -> Option<Self> {
        match samples.len() {
            0 => None,
            1 => samples.pop().map(|(_, v)| Motion::Static(v)),
            _ => Some(Motion::Deforming(samples)),
        }
    }

    /// Number of time samples.
    pub fn len(&self) -> usize {
        match self {
            Motion::Static(_) => 1,
            Motion::Deforming(s) => s.len(),
        }
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether more than one sample is held.
    pub fn is_deforming(&self) -> bool {
        matches!(self, Motion::Deforming(_))
    }

    /// The earliest sample.
    pub fn first(&self) -> Option<&T> {
        match self {
            Motion::Static(v) => Some(v),
            Motion::Deforming(s) => s.first().map(|(_, v)| v),
        }
    }

    /// Iterate the samples in time order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (single, many) = match self {
            Motion::Static(v) => (Some(v), &[][..]),
            Motion::Deforming(s) => (None, s.as_slice()),
        };
        single.into_iter().chain(many.iter().map(|(_, v)| v))
    }
}
