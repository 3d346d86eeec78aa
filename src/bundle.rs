//! Tuples of distinct types handled in one call.
//!
//! A [`Bundle`] is a tuple `(A, B, ...)` of up to eight `'static` types. It is
//! what lets [`TypeArray`] reserve, construct or fetch several types at once:
//!
//! ```
//! use sovran_typearray::TypeArray;
//!
//! let mut array = TypeArray::new();
//! let (a, b) = array.insert_bundle((7u8, 1.5f64));
//! *a += 1;
//! *b *= 2.0;
//!
//! let (a, b) = array.get_many::<(u8, f64)>();
//! assert_eq!((*a, *b), (8, 3.0));
//! ```
//!
//! The trait is sealed; it is implemented for tuples only.

use std::alloc::Layout;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::mem;

use smallvec::SmallVec;

use crate::arena::ARENA_ALIGN;
use crate::array::TypeArray;
use crate::error::StoreError;
use crate::type_key::TypeKey;

mod sealed {
    pub trait Sealed {}
}

struct AlignCheck<T>(PhantomData<T>);

impl<T> AlignCheck<T> {
    const OK: () = assert!(
        mem::align_of::<T>() <= ARENA_ALIGN,
        "type alignment exceeds the arena base alignment"
    );
}

/// Rejects, at compile time, types the arena cannot align.
#[inline(always)]
pub(crate) fn assert_storable<T>() {
    #[allow(clippy::let_unit_value)]
    let () = AlignCheck::<T>::OK;
}

/// A tuple of distinct types stored, fetched or dropped together.
pub trait Bundle: sealed::Sealed + Sized + 'static {
    /// Number of types in the tuple.
    const LEN: usize;

    /// One offset per type, in tuple order.
    type Offsets: Copy + Debug + PartialEq + AsRef<[usize]>;
    /// Shared references to each stored value.
    type Refs<'a>;
    /// Exclusive references to each stored value.
    type Muts<'a>;

    /// Type identifiers, in tuple order.
    fn keys() -> SmallVec<[TypeKey; 8]>;

    /// Memory layouts, in tuple order.
    fn layouts() -> SmallVec<[Layout; 8]>;

    /// Type names, in tuple order.
    fn type_names() -> SmallVec<[&'static str; 8]>;

    #[doc(hidden)]
    fn offsets_from(offsets: &[usize]) -> Self::Offsets;

    #[doc(hidden)]
    fn assert_storable();

    #[doc(hidden)]
    fn construct_each(self, array: &mut TypeArray, offsets: &[usize]);

    #[doc(hidden)]
    fn insert_each(self, array: &mut TypeArray);

    #[doc(hidden)]
    fn assign_each(self, array: &mut TypeArray);

    #[doc(hidden)]
    fn insert_or_assign_each(self, array: &mut TypeArray);

    #[doc(hidden)]
    fn destruct_each(array: &mut TypeArray);

    /// # Safety
    ///
    /// Every offset must hold a live value of the matching type.
    #[doc(hidden)]
    unsafe fn refs<'a>(array: &'a TypeArray, offsets: &[usize]) -> Self::Refs<'a>;

    /// # Safety
    ///
    /// Every offset must hold a live value of the matching type and the
    /// types must be pairwise distinct.
    #[doc(hidden)]
    unsafe fn muts<'a>(array: &'a mut TypeArray, offsets: &[usize]) -> Self::Muts<'a>;
}

/// Fails if any type appears twice.
pub(crate) fn check_distinct(
    keys: &[TypeKey],
    names: &[&'static str],
) -> Result<(), StoreError> {
    for (i, key) in keys.iter().enumerate() {
        if keys[..i].contains(key) {
            return Err(StoreError::DuplicateType(names[i]));
        }
    }
    Ok(())
}

macro_rules! impl_bundle {
    ($len:literal => $($name:ident $index:tt),+) => {
        impl<$($name: 'static),+> sealed::Sealed for ($($name,)+) {}

        impl<$($name: 'static),+> Bundle for ($($name,)+) {
            const LEN: usize = $len;

            type Offsets = [usize; $len];
            type Refs<'a> = ($(&'a $name,)+);
            type Muts<'a> = ($(&'a mut $name,)+);

            fn keys() -> SmallVec<[TypeKey; 8]> {
                SmallVec::from_slice(&[$(TypeKey::of::<$name>()),+])
            }

            fn layouts() -> SmallVec<[Layout; 8]> {
                SmallVec::from_slice(&[$(Layout::new::<$name>()),+])
            }

            fn type_names() -> SmallVec<[&'static str; 8]> {
                SmallVec::from_slice(&[$(std::any::type_name::<$name>()),+])
            }

            fn offsets_from(offsets: &[usize]) -> Self::Offsets {
                [$(offsets[$index]),+]
            }

            fn assert_storable() {
                $(assert_storable::<$name>();)+
            }

            fn construct_each(self, array: &mut TypeArray, offsets: &[usize]) {
                $(array.construct_at::<$name>(offsets[$index], self.$index);)+
            }

            fn insert_each(self, array: &mut TypeArray) {
                $(array.insert::<$name>(self.$index);)+
            }

            fn assign_each(self, array: &mut TypeArray) {
                $(array.assign::<$name>(self.$index);)+
            }

            fn insert_or_assign_each(self, array: &mut TypeArray) {
                $(array.insert_or_assign::<$name>(self.$index);)+
            }

            fn destruct_each(array: &mut TypeArray) {
                $(array.destruct::<$name>();)+
            }

            unsafe fn refs<'a>(array: &'a TypeArray, offsets: &[usize]) -> Self::Refs<'a> {
                ($(&*array.slot::<$name>(offsets[$index]).as_ptr(),)+)
            }

            unsafe fn muts<'a>(array: &'a mut TypeArray, offsets: &[usize]) -> Self::Muts<'a> {
                ($(&mut *array.slot::<$name>(offsets[$index]).as_ptr(),)+)
            }
        }
    };
}

impl_bundle!(1 => A 0);
impl_bundle!(2 => A 0, B 1);
impl_bundle!(3 => A 0, B 1, C 2);
impl_bundle!(4 => A 0, B 1, C 2, D 3);
impl_bundle!(5 => A 0, B 1, C 2, D 3, E 4);
impl_bundle!(6 => A 0, B 1, C 2, D 3, E 4, F 5);
impl_bundle!(7 => A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_bundle!(8 => A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
