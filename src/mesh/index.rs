//! Handle types for topology elements.
//!
//! Laths, vertices and facets are addressed by typed integer handles rather
//! than pointers. Every handle reserves the maximum value of its underlying
//! integer as the "none" sentinel, so optional links (a missing vertex
//! neighbour at a boundary, a face that has not been refined yet) cost no
//! more than a present one.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Integer types that can back a topology handle.
///
/// Implemented for `u16`, `u32` and `u64`. `u32` is the default everywhere.
pub trait MeshIndex:
    Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static
{
    /// The largest usable index.
    const MAX: Self;

    /// The sentinel value meaning "no element".
    const INVALID: Self;

    /// Convert from `usize`.
    ///
    /// # Panics
    /// Panics in debug builds if the value does not fit.
    fn from_usize(v: usize) -> Self;

    /// Convert from `usize`, or `None` if the value is past [`MeshIndex::MAX`].
    fn try_from_usize(v: usize) -> Option<Self>;

    /// Convert to `usize`.
    fn to_usize(self) -> usize;

    /// Whether this is a real index rather than the sentinel.
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

macro_rules! impl_mesh_index {
    ($ty:ty) => {
        impl MeshIndex for $ty {
            const MAX: Self = <$ty>::MAX - 1;
            const INVALID: Self = <$ty>::MAX;

            #[inline]
            fn from_usize(v: usize) -> Self {
                debug_assert!(
                    v <= Self::MAX as usize,
                    "index {} too large for {}",
                    v,
                    stringify!($ty)
                );
                v as $ty
            }

            #[inline]
            fn try_from_usize(v: usize) -> Option<Self> {
                if v <= Self::MAX as usize {
                    Some(v as $ty)
                } else {
                    None
                }
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    };
}

impl_mesh_index!(u16);
impl_mesh_index!(u32);
impl_mesh_index!(u64);

/// Handle of a lath in the topology arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct LathId<I: MeshIndex = u32>(I);

/// Index of a vertex in the attribute arrays.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Index of a facet in the topology's facet list.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FacetId<I: MeshIndex = u32>(I);

macro_rules! impl_handle {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a handle from a raw position.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// Create a handle, or `None` if `index` does not fit below the sentinel.
            #[inline]
            pub fn try_new(index: usize) -> Option<Self> {
                I::try_from_usize(index).map(Self)
            }

            /// The "none" handle.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Raw position as `usize`.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Underlying integer.
            #[inline]
            pub fn raw(self) -> I {
                self.0
            }

            /// Whether this handle refers to an element.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }

            /// `Some(self)` for a real handle, `None` for the sentinel.
            #[inline]
            pub fn get(self) -> Option<Self> {
                if self.is_valid() {
                    Some(self)
                } else {
                    None
                }
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $tag, self.index())
                } else {
                    write!(f, "{}(-)", $tag)
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }

        impl<I: MeshIndex> From<Option<$name<I>>> for $name<I> {
            fn from(v: Option<$name<I>>) -> Self {
                v.unwrap_or_else(Self::invalid)
            }
        }
    };
}

impl_handle!(LathId, "L");
impl_handle!(VertexId, "V");
impl_handle!(FacetId, "F");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_round_trip() {
        let none = LathId::<u32>::invalid();
        assert!(!none.is_valid());
        assert_eq!(none.get(), None);
        assert_eq!(LathId::<u32>::from(None), none);

        let some = LathId::<u32>::new(7);
        assert_eq!(some.get(), Some(some));
        assert_eq!(some.index(), 7);
    }

    #[test]
    fn test_small_indices() {
        let v = VertexId::<u16>::new(300);
        assert_eq!(v.raw(), 300u16);
        assert!(!VertexId::<u16>::invalid().is_valid());
        assert_eq!(format!("{:?}", FacetId::<u64>::new(3)), "F(3)");
        assert_eq!(format!("{:?}", FacetId::<u64>::invalid()), "F(-)");
    }

    #[test]
    fn test_checked_construction() {
        assert_eq!(LathId::<u16>::try_new(65534), Some(LathId::new(65534)));
        // 65535 is the sentinel, so it is not a usable index
        assert_eq!(LathId::<u16>::try_new(65535), None);
        assert_eq!(VertexId::<u16>::try_new(70_000), None);
        assert_eq!(<u32 as MeshIndex>::try_from_usize(1 << 20), Some(1 << 20));
    }
}
