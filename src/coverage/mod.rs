//! Type-coverage dispatch: run one generic check over many types.
//!
//! A check is written once as a [`TypeVisitor`], whose `visit::<T>` method is
//! generic over the covered type. [`for_all_types`] then instantiates it for
//! every type in a [`NamedTypePack`], in declaration order, passing the
//! type's label so failure messages name the offending type.
//!
//! ```
//! use cts_harness::coverage::{for_all_types, CoverageType, TypeVisitor};
//! use cts_harness::type_pack;
//!
//! struct Names(Vec<String>);
//!
//! impl TypeVisitor for Names {
//!     fn visit<T: CoverageType>(&mut self, type_name: &str) {
//!         self.0.push(type_name.to_string());
//!     }
//! }
//!
//! let mut names = Names(Vec::new());
//! for_all_types(&type_pack![i32, f32], &mut names);
//! assert_eq!(names.0, ["i32", "f32"]);
//! ```

mod types;

pub use types::CoverageType;

use crate::core::error::{Error, Result};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Vector widths visited by [`for_type_and_vectors`].
pub const VECTOR_WIDTHS: [usize; 6] = [1, 2, 3, 4, 8, 16];

/// A generic check applied once per covered type.
///
/// Shared arguments (logger, environment, ...) live in the implementing struct.
pub trait TypeVisitor {
    /// Run the check for `T`, labelled `type_name`.
    fn visit<T: CoverageType>(&mut self, type_name: &str);
}

/// A compile-time list of covered types, written as a tuple.
pub trait TypeList {
    /// Number of types in the list.
    const LEN: usize;

    /// Call `visitor.visit::<T>(label)` for each type, in order.
    ///
    /// `labels` must hold exactly [`LEN`](Self::LEN) entries.
    fn visit_each<V: TypeVisitor>(visitor: &mut V, labels: &[String]);
}

impl TypeList for () {
    const LEN: usize = 0;

    fn visit_each<V: TypeVisitor>(_visitor: &mut V, _labels: &[String]) {}
}

macro_rules! impl_type_list {
    ($len:expr; $($idx:tt $ty:ident),+) => {
        impl<$($ty: CoverageType),+> TypeList for ($($ty,)+) {
            const LEN: usize = $len;

            fn visit_each<V: TypeVisitor>(visitor: &mut V, labels: &[String]) {
                $( visitor.visit::<$ty>(&labels[$idx]); )+
            }
        }
    };
}

impl_type_list!(1; 0 A);
impl_type_list!(2; 0 A, 1 B);
impl_type_list!(3; 0 A, 1 B, 2 C);
impl_type_list!(4; 0 A, 1 B, 2 C, 3 D);
impl_type_list!(5; 0 A, 1 B, 2 C, 3 D, 4 E);
impl_type_list!(6; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_type_list!(7; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_type_list!(8; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);
impl_type_list!(9; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I);
impl_type_list!(10; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J);
impl_type_list!(11; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K);
impl_type_list!(12; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L);
impl_type_list!(13; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M);
impl_type_list!(14; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N);
impl_type_list!(15; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N, 14 O);
impl_type_list!(16; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N, 14 O, 15 P);

/// A [`TypeList`] paired with one human-readable label per type.
#[derive(Debug, Clone)]
pub struct NamedTypePack<L: TypeList> {
    labels: Vec<String>,
    _types: PhantomData<fn() -> L>,
}

impl<L: TypeList> NamedTypePack<L> {
    /// Pair the types of `L` with `labels`.
    ///
    /// Fails with [`Error::TypePack`] unless there is exactly one label per type.
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Result<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != L::LEN {
            return Err(Error::TypePack {
                expected: L::LEN,
                actual: labels.len(),
            });
        }
        Ok(Self {
            labels,
            _types: PhantomData,
        })
    }

    #[doc(hidden)]
    pub fn __stringified(labels: &[&str]) -> Self {
        debug_assert_eq!(labels.len(), L::LEN);
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            _types: PhantomData,
        }
    }

    /// Labels, in type order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        L::LEN
    }

    /// Whether the pack is empty.
    pub fn is_empty(&self) -> bool {
        L::LEN == 0
    }
}

/// Build a [`NamedTypePack`] labelled with each type's source spelling.
///
/// ```
/// let pack = cts_harness::type_pack![u8, [f32; 4]];
/// assert_eq!(pack.labels(), ["u8", "[f32; 4]"]);
/// ```
#[macro_export]
macro_rules! type_pack {
    ($($ty:ty),+ $(,)?) => {
        $crate::coverage::NamedTypePack::<($($ty,)+)>::__stringified(&[$(stringify!($ty)),+])
    };
}

/// Every scalar type the harness covers.
pub type ScalarTypes = (bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// The standard scalar pack.
pub fn scalar_types() -> NamedTypePack<ScalarTypes> {
    type_pack![bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64]
}

/// Invoke `visitor` once per type in `pack`, in declaration order.
pub fn for_all_types<L: TypeList, V: TypeVisitor>(pack: &NamedTypePack<L>, visitor: &mut V) {
    L::visit_each(visitor, &pack.labels);
}

/// Label of the `width`-lane vector of `element`.
pub fn vector_label(element: &str, width: usize) -> String {
    format!("vec<{element}, {width}>")
}

/// Invoke `visitor` for `T` and for every vector width of `T`.
pub fn for_type_and_vectors<T: CoverageType, V: TypeVisitor>(visitor: &mut V, label: &str) {
    visitor.visit::<T>(label);
    visitor.visit::<[T; 1]>(&vector_label(label, 1));
    visitor.visit::<[T; 2]>(&vector_label(label, 2));
    visitor.visit::<[T; 3]>(&vector_label(label, 3));
    visitor.visit::<[T; 4]>(&vector_label(label, 4));
    visitor.visit::<[T; 8]>(&vector_label(label, 8));
    visitor.visit::<[T; 16]>(&vector_label(label, 16));
}

struct VectorFanout<'a, V> {
    inner: &'a mut V,
}

impl<V: TypeVisitor> TypeVisitor for VectorFanout<'_, V> {
    fn visit<T: CoverageType>(&mut self, type_name: &str) {
        for_type_and_vectors::<T, V>(self.inner, type_name);
    }
}

/// Invoke `visitor` for every type in `pack` and all of its vector widths.
pub fn for_all_types_and_vectors<L: TypeList, V: TypeVisitor>(
    pack: &NamedTypePack<L>,
    visitor: &mut V,
) {
    for_all_types(pack, &mut VectorFanout { inner: visitor });
}

/// Invoke `f` once per value, in order, labelled with its `Debug` form.
pub fn for_all_values<T: Copy + Debug>(values: &[T], mut f: impl FnMut(T, &str)) {
    for &value in values {
        let label = format!("{value:?}");
        f(value, &label);
    }
}
