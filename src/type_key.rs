//! Process-wide type identifiers.
//!
//! Every distinct `'static` type gets a small integer the first time it is
//! seen. Identifiers are handed out in first-use order, are never reused,
//! and are only meaningful inside the running process.

use std::any::TypeId;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

use fxhash::FxHashMap;

/// A small, dense identifier for a stored value type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u32);

impl TypeKey {
    /// Returns the identifier of `T`, assigning one on first use.
    ///
    /// ```
    /// use sovran_typearray::TypeKey;
    ///
    /// assert_eq!(TypeKey::of::<u8>(), TypeKey::of::<u8>());
    /// assert_ne!(TypeKey::of::<u8>(), TypeKey::of::<i8>());
    /// ```
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        type_key::<T>()
    }

    /// The raw counter value.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// The counter value as an index, for tables keyed by type ordinal.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn registry() -> &'static RwLock<FxHashMap<TypeId, TypeKey>> {
    static REGISTRY: OnceLock<RwLock<FxHashMap<TypeId, TypeKey>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(FxHashMap::default()))
}

/// Returns the identifier of `T`, assigning one on first use.
pub fn type_key<T: ?Sized + 'static>() -> TypeKey {
    let id = TypeId::of::<T>();

    // The table is append-only, so a poisoned lock still holds consistent data.
    if let Some(key) = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return *key;
    }

    let mut table = registry().write().unwrap_or_else(PoisonError::into_inner);
    let next = table.len() as u32;
    *table.entry(id).or_insert_with(|| {
        log::trace!("assigned {} to `{}`", TypeKey(next), std::any::type_name::<T>());
        TypeKey(next)
    })
}

/// Number of identifiers handed out so far in this process.
pub fn registered_types() -> usize {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Local;
    struct Other;

    #[test]
    fn test_same_type_same_key() {
        let first = type_key::<Local>();
        for _ in 0..10 {
            assert_eq!(type_key::<Local>(), first);
        }
    }

    #[test]
    fn test_distinct_types_distinct_keys() {
        let keys: HashSet<TypeKey> = [
            type_key::<Local>(),
            type_key::<Other>(),
            type_key::<u8>(),
            type_key::<&'static u8>(),
            type_key::<Vec<u8>>(),
            type_key::<str>(),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn test_keys_are_dense() {
        struct Fresh;
        let key = type_key::<Fresh>();
        assert!(key.index() < registered_types());
    }

    #[test]
    fn test_concurrent_first_use_agrees() {
        struct Raced;
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(type_key::<Raced>))
            .collect();
        let keys: HashSet<TypeKey> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(keys.len(), 1);
    }
}
