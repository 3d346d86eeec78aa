use std::any::Any;
use std::fmt;

use crate::type_key::TypeKey;

/// A boxed, type-erased value that remembers its type key
pub(crate) struct AnyValue {
    pub(crate) key: TypeKey,
    value: Box<dyn Any>,
}

impl AnyValue {
    /// Box up a value of any `'static` type
    pub(crate) fn new<T: 'static>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value: Box::new(value),
        }
    }

    /// Check if the contained value is of type T
    pub(crate) fn is_type<T: 'static>(&self) -> bool {
        self.key == TypeKey::of::<T>()
    }

    /// Get a reference to the contained value if it is of type T
    pub(crate) fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Get a mutable reference to the contained value if it is of type T
    pub(crate) fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }

    /// Unbox the value if it is of type T
    pub(crate) fn into_inner<T: 'static>(self) -> Option<T> {
        self.value.downcast::<T>().ok().map(|boxed| *boxed)
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyValue").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcasts_only_to_own_type() {
        let mut value = AnyValue::new(String::from("slot"));
        assert!(value.is_type::<String>());
        assert!(!value.is_type::<&str>());
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("slot"));
        assert!(value.downcast_ref::<u32>().is_none());

        value.downcast_mut::<String>().unwrap().push('s');
        assert_eq!(value.into_inner::<String>(), Some("slots".to_string()));
    }

    #[test]
    fn test_into_inner_wrong_type() {
        assert_eq!(AnyValue::new(3u8).into_inner::<u16>(), None);
    }
}
