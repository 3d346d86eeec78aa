use std::any::type_name;
use std::fmt;

use crate::any_value::AnyValue;
use crate::boxed::downcast_slot;
use crate::error::{enforce, StoreError};
use crate::type_key::TypeKey;

const VACANT: u32 = u32::MAX;

/// A one-value-per-type store laid out as a sparse set.
///
/// The sparse table is indexed directly by [`TypeKey`] ordinal and points
/// into a dense vector of boxed values. Lookups need no hashing, and
/// iterating the dense vector touches only live values. The sparse table
/// grows to the largest type key ever stored.
///
/// # Examples
///
/// ```
/// use sovran_typearray::SparseTypeMap;
///
/// let mut map = SparseTypeMap::new();
/// map.insert('a');
/// map.insert(1.0f64);
/// map.insert(true);
///
/// assert_eq!(map.remove::<char>(), Some('a'));
/// assert_eq!(map.len(), 2);
/// assert_eq!(*map.get::<bool>(), true);
/// assert_eq!(*map.get::<f64>(), 1.0);
/// ```
#[derive(Default)]
pub struct SparseTypeMap {
    sparse: Vec<u32>,
    dense: Vec<AnyValue>,
}

impl SparseTypeMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with room for `types` values.
    pub fn with_capacity(types: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(types),
            dense: Vec::with_capacity(types),
        }
    }

    /// Makes room for `additional` more values.
    pub fn reserve(&mut self, additional: usize) {
        self.sparse.reserve(additional);
        self.dense.reserve(additional);
    }

    /// Stores `value` unless a `T` is already present, and returns the
    /// stored `T`.
    pub fn insert<T: 'static>(&mut self, value: T) -> &mut T {
        let key = TypeKey::of::<T>();
        let index = match self.dense_index(key) {
            Some(index) => index,
            None => self.push(key, AnyValue::new(value)),
        };
        downcast_slot(&mut self.dense[index])
    }

    /// Stores `value`, dropping any `T` already present.
    pub fn insert_or_assign<T: 'static>(&mut self, value: T) -> &mut T {
        let key = TypeKey::of::<T>();
        match self.dense_index(key) {
            Some(index) => {
                let slot = downcast_slot(&mut self.dense[index]);
                *slot = value;
                slot
            }
            None => {
                let index = self.push(key, AnyValue::new(value));
                downcast_slot(&mut self.dense[index])
            }
        }
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
        let index = self.dense_index(TypeKey::of::<T>())?;
        self.dense[index].downcast_ref()
    }

    /// Returns the stored `T` mutably, if any.
    pub fn has_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let index = self.dense_index(TypeKey::of::<T>())?;
        self.dense[index].downcast_mut()
    }

    /// True if a `T` is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.dense_index(TypeKey::of::<T>()).is_some()
    }

    /// Takes the stored `T` out of the map.
    ///
    /// The last dense value moves into the freed position.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        let key = TypeKey::of::<T>();
        let index = self.dense_index(key)?;
        self.sparse[key.index()] = VACANT;
        let removed = self.dense.swap_remove(index);
        if let Some(moved) = self.dense.get(index) {
            self.sparse[moved.key.index()] = index as u32;
        }
        removed.into_inner()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Drops every stored value.
    pub fn clear(&mut self) {
        let dropped = self.dense.len();
        self.dense.clear();
        self.sparse.clear();
        log::debug!("sparse type map cleared, {} values dropped", dropped);
    }

    fn dense_index(&self, key: TypeKey) -> Option<usize> {
        match self.sparse.get(key.index()) {
            Some(&index) if index != VACANT => Some(index as usize),
            _ => None,
        }
    }

    fn push(&mut self, key: TypeKey, value: AnyValue) -> usize {
        if key.index() >= self.sparse.len() {
            self.sparse.resize(key.index() + 1, VACANT);
        }
        let index = self.dense.len();
        self.sparse[key.index()] = index as u32;
        self.dense.push(value);
        index
    }
}

impl fmt::Debug for SparseTypeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseTypeMap")
            .field("sparse_len", &self.sparse.len())
            .field("dense", &self.dense)
            .finish()
    }
}
