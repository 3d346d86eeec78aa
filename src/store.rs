use crate::array::TypeArray;
use crate::boxed::BoxedTypeMap;
use crate::sparse::SparseTypeMap;

/// The one-value-per-type contract shared by every storage policy.
///
/// [`TypeArray`] packs values into one arena, [`BoxedTypeMap`] boxes each
/// value on its own, and [`SparseTypeMap`] keeps boxes in a dense vector
/// indexed through a sparse table. Code written against `TypeStore` works
/// with any of them.
///
/// The stores differ on inserting a type that is already present:
/// `TypeArray` panics for sized types, the boxed stores keep the value they
/// already hold. Use [`insert_or_assign`](TypeStore::insert_or_assign) to
/// overwrite.
///
/// # Examples
///
/// ```
/// use sovran_typearray::{BoxedTypeMap, SparseTypeMap, TypeArray, TypeStore};
///
/// fn bump_counter<S: TypeStore>(store: &mut S) -> u64 {
///     if !store.contains::<u64>() {
///         store.insert(0u64);
///     }
///     *store.get_mut::<u64>() += 1;
///     *store.get::<u64>()
/// }
///
/// let mut array = TypeArray::new();
/// let mut boxed = BoxedTypeMap::new();
/// let mut sparse = SparseTypeMap::new();
/// for _ in 0..3 {
///     bump_counter(&mut array);
///     bump_counter(&mut boxed);
///     bump_counter(&mut sparse);
/// }
/// assert_eq!(*array.get::<u64>(), 3);
/// assert_eq!(*boxed.get::<u64>(), 3);
/// assert_eq!(*sparse.get::<u64>(), 3);
/// ```
pub trait TypeStore {
    /// Stores `value` as the instance of `T` and returns it.
    fn insert<T: 'static>(&mut self, value: T) -> &mut T;

    /// Stores `value`, replacing any instance of `T` already present.
    fn insert_or_assign<T: 'static>(&mut self, value: T) -> &mut T;

    /// Returns the instance of `T`. Panics if there is none.
    fn get<T: 'static>(&self) -> &T;

    /// Returns the instance of `T` mutably. Panics if there is none.
    fn get_mut<T: 'static>(&mut self) -> &mut T;

    /// Returns the instance of `T`, if any.
    fn has<T: 'static>(&self) -> Option<&T>;

    /// Returns the instance of `T` mutably, if any.
    fn has_mut<T: 'static>(&mut self) -> Option<&mut T>;

    /// True if an instance of `T` is present.
    fn contains<T: 'static>(&self) -> bool;

    /// Number of instances present.
    fn len(&self) -> usize;

    /// True when no instance is present.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every instance.
    fn clear(&mut self);
}

macro_rules! forward_type_store {
    ($store:ty) => {
        impl TypeStore for $store {
            #[track_caller]
            fn insert<T: 'static>(&mut self, value: T) -> &mut T {
                <$store>::insert(self, value)
            }

            #[track_caller]
            fn insert_or_assign<T: 'static>(&mut self, value: T) -> &mut T {
                <$store>::insert_or_assign(self, value)
            }

            #[track_caller]
            fn get<T: 'static>(&self) -> &T {
                <$store>::get(self)
            }

            #[track_caller]
            fn get_mut<T: 'static>(&mut self) -> &mut T {
                <$store>::get_mut(self)
            }

            fn has<T: 'static>(&self) -> Option<&T> {
                <$store>::has(self)
            }

            fn has_mut<T: 'static>(&mut self) -> Option<&mut T> {
                <$store>::has_mut(self)
            }

            fn contains<T: 'static>(&self) -> bool {
                <$store>::contains::<T>(self)
            }

            fn len(&self) -> usize {
                <$store>::len(self)
            }

            fn is_empty(&self) -> bool {
                <$store>::is_empty(self)
            }

            fn clear(&mut self) {
                <$store>::clear(self)
            }
        }
    };
}

forward_type_store!(TypeArray);
forward_type_store!(BoxedTypeMap);
forward_type_store!(SparseTypeMap);
