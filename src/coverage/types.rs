use crate::device::Capability;
use std::fmt::Debug;

/// A type that generic conformance checks can be instantiated with.
///
/// Every type in a [`TypeList`](super::TypeList) must implement this trait,
/// so a check that cannot be instantiated for some type fails to compile.
pub trait CoverageType: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// Device capability needed to use this type, if any.
    const REQUIRES: Option<Capability> = None;

    /// Identity of [`combine`](Self::combine).
    fn zero() -> Self;

    /// Deterministic test value for position `index`.
    ///
    /// Values stay small so that sums of a few thousand samples are exact
    /// for every type, floats included.
    fn sample(index: usize) -> Self;

    /// Associative, commutative combination (wrapping add, add, or).
    fn combine(self, other: Self) -> Self;
}

macro_rules! impl_integer {
    ($($ty:ty => $req:expr),* $(,)?) => {
        $(
            impl CoverageType for $ty {
                const REQUIRES: Option<Capability> = $req;

                fn zero() -> Self {
                    0
                }

                fn sample(index: usize) -> Self {
                    (index % 7) as $ty
                }

                fn combine(self, other: Self) -> Self {
                    self.wrapping_add(other)
                }
            }
        )*
    };
}

impl_integer! {
    i8 => None,
    u8 => None,
    i16 => None,
    u16 => None,
    i32 => None,
    u32 => None,
    i64 => Some(Capability::Atomic64),
    u64 => Some(Capability::Atomic64),
}

macro_rules! impl_float {
    ($($ty:ty => $req:expr),* $(,)?) => {
        $(
            impl CoverageType for $ty {
                const REQUIRES: Option<Capability> = $req;

                fn zero() -> Self {
                    0.0
                }

                fn sample(index: usize) -> Self {
                    (index % 7) as $ty
                }

                fn combine(self, other: Self) -> Self {
                    self + other
                }
            }
        )*
    };
}

impl_float! {
    f32 => None,
    f64 => Some(Capability::Fp64),
}

impl CoverageType for bool {
    fn zero() -> Self {
        false
    }

    fn sample(index: usize) -> Self {
        index % 2 == 1
    }

    fn combine(self, other: Self) -> Self {
        self | other
    }
}

/// Fixed-width vectors of a covered element type.
impl<T: CoverageType, const N: usize> CoverageType for [T; N] {
    const REQUIRES: Option<Capability> = T::REQUIRES;

    fn zero() -> Self {
        [T::zero(); N]
    }

    fn sample(index: usize) -> Self {
        std::array::from_fn(|lane| T::sample(index + lane))
    }

    fn combine(self, other: Self) -> Self {
        std::array::from_fn(|lane| self[lane].combine(other[lane]))
    }
}
