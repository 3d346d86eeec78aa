use std::any::type_name;
use std::fmt;

use fxhash::FxHashMap;

use crate::any_value::AnyValue;
use crate::error::{enforce, StoreError};
use crate::type_key::TypeKey;

/// A one-value-per-type store that boxes every value on its own.
///
/// Unlike [`TypeArray`](crate::TypeArray) there is no packing and no
/// reservation step: each value lives in its own heap allocation, so
/// references stay put however many types are added. The price is one
/// allocation and one pointer chase per value.
///
/// Inserting a type that is already present keeps the stored value and
/// drops the new one; [`insert_or_assign`](Self::insert_or_assign) replaces it.
///
/// # Examples
///
/// ```
/// use sovran_typearray::BoxedTypeMap;
///
/// let mut map = BoxedTypeMap::new();
/// map.insert(String::from("settings"));
/// map.insert(vec![1, 2, 3]);
///
/// map.get_mut::<Vec<i32>>().push(4);
/// assert_eq!(map.get::<Vec<i32>>().len(), 4);
///
/// // Already present: the existing value wins.
/// assert_eq!(map.insert(String::from("ignored")), "settings");
/// assert_eq!(map.remove::<String>(), Some(String::from("settings")));
/// assert!(!map.contains::<String>());
/// ```
#[derive(Default)]
pub struct BoxedTypeMap {
    items: FxHashMap<TypeKey, AnyValue>,
}

impl BoxedTypeMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with room for `types` values.
    pub fn with_capacity(types: usize) -> Self {
        Self {
            items: FxHashMap::with_capacity_and_hasher(types, Default::default()),
        }
    }

    /// Makes room for `additional` more values.
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    /// Stores `value` unless a `T` is already present, and returns the
    /// stored `T`.
    pub fn insert<T: 'static>(&mut self, value: T) -> &mut T {
        let slot = self
            .items
            .entry(TypeKey::of::<T>())
            .or_insert_with(|| AnyValue::new(value));
        downcast_slot(slot)
    }

    /// Stores `value`, dropping any `T` already present.
    pub fn insert_or_assign<T: 'static>(&mut self, value: T) -> &mut T {
        let key = TypeKey::of::<T>();
        match self.items.get_mut(&key).and_then(AnyValue::downcast_mut::<T>) {
            Some(existing) => *existing = value,
            None => {
                self.items.insert(key, AnyValue::new(value));
            }
        }
        self.get_mut()
    }

    /// Returns the stored `T`.
    ///
    /// # Panics
    ///
    /// Panics if no `T` is present.
    #[track_caller]
    pub fn get<T: 'static>(&self) -> &T {
        enforce(self.try_get())
    }

    /// Fallible form of [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotConstructed` if no `T` is present.
    pub fn try_get<T: 'static>(&self) -> Result<&T, StoreError> {
        self.has().ok_or(StoreError::NotConstructed(type_name::<T>()))
    }

    /// Returns the stored `T` mutably.
    ///
    /// # Panics
    ///
    /// Panics if no `T` is present.
    #[track_caller]
    pub fn get_mut<T: 'static>(&mut self) -> &mut T {
        enforce(self.try_get_mut())
    }

    /// Fallible form of [`get_mut`](Self::get_mut).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotConstructed` if no `T` is present.
    pub fn try_get_mut<T: 'static>(&mut self) -> Result<&mut T, StoreError> {
        self.has_mut().ok_or(StoreError::NotConstructed(type_name::<T>()))
    }

    /// Returns the stored `T`, if any.
    pub fn has<T: 'static>(&self) -> Option<&T> {
        self.items
            .get(&TypeKey::of::<T>())
            .and_then(AnyValue::downcast_ref)
    }

    /// Returns the stored `T` mutably, if any.
    pub fn has_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.items
            .get_mut(&TypeKey::of::<T>())
            .and_then(AnyValue::downcast_mut)
    }

    /// True if a `T` is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.items.contains_key(&TypeKey::of::<T>())
    }

    /// Takes the stored `T` out of the map.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.items
            .remove(&TypeKey::of::<T>())
            .and_then(AnyValue::into_inner)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every stored value.
    pub fn clear(&mut self) {
        let dropped = self.items.len();
        self.items.clear();
        log::debug!("boxed type map cleared, {} values dropped", dropped);
    }
}

/// Reads back a slot that is known to hold a `T`.
#[track_caller]
pub(crate) fn downcast_slot<T: 'static>(slot: &mut AnyValue) -> &mut T {
    debug_assert!(slot.is_type::<T>());
    match slot.downcast_mut::<T>() {
        Some(value) => value,
        None => crate::error::violation(StoreError::NotConstructed(type_name::<T>())),
    }
}

impl fmt::Debug for BoxedTypeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<TypeKey> = self.items.keys().copied().collect();
        keys.sort();
        f.debug_struct("BoxedTypeMap").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_insert_keeps_existing_value() {
        let mut map = BoxedTypeMap::new();
        assert_eq!(*map.insert('a'), 'a');
        assert_eq!(*map.insert('b'), 'a');
        assert_eq!(*map.insert_or_assign('b'), 'b');
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_references_survive_other_inserts() {
        let mut map = BoxedTypeMap::with_capacity(1);
        map.insert(7u64);
        let before = map.get::<u64>() as *const u64;
        for i in 0..32u8 {
            map.insert_or_assign(i);
            map.insert(i as u16);
        }
        assert_eq!(map.get::<u64>() as *const u64, before);
    }

    #[test]
    fn test_clear_and_remove_drop_values() {
        let drops = Rc::new(Cell::new(0));
        let mut map = BoxedTypeMap::new();
        map.insert(Counted(drops.clone()));
        map.insert_or_assign(Counted(drops.clone()));
        assert_eq!(drops.get(), 1);

        map.clear();
        assert_eq!(drops.get(), 2);
        assert!(map.is_empty());

        map.insert(Counted(drops.clone()));
        let taken = map.remove::<Counted>();
        assert_eq!(drops.get(), 2);
        drop(taken);
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn test_try_get_missing() {
        let mut map = BoxedTypeMap::new();
        assert_eq!(
            map.try_get::<bool>().unwrap_err(),
            StoreError::NotConstructed("bool")
        );
        assert!(map.try_get_mut::<bool>().is_err());
        assert_eq!(map.has::<bool>(), None);
    }

    #[test]
    #[should_panic(expected = "contract violation: type `i16` is not constructed")]
    fn test_get_missing_panics() {
        BoxedTypeMap::new().get::<i16>();
    }
}
