//! Type-erased destructors for values living in the arena.

use std::fmt;
use std::mem;
use std::ptr::NonNull;

/// Drops the value of one specific type stored at an address.
///
/// Built with [`Destructor::of`], which remembers the concrete type so the
/// store can run the right drop glue without knowing it later.
#[derive(Clone, Copy)]
pub(crate) struct Destructor {
    drop_fn: unsafe fn(NonNull<u8>),
    trivial: bool,
    type_name: &'static str,
}

impl Destructor {
    pub(crate) fn of<T: 'static>() -> Self {
        let trivial = !mem::needs_drop::<T>();
        let drop_fn: unsafe fn(NonNull<u8>) = if trivial { drop_nothing } else { drop_slot::<T> };
        Self {
            drop_fn,
            trivial,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Runs the drop glue on the value at `slot`.
    ///
    /// # Safety
    ///
    /// `slot` must point at a live, properly aligned value of the type this
    /// destructor was built for, and that value must not be used afterwards.
    #[inline]
    pub(crate) unsafe fn run(&self, slot: NonNull<u8>) {
        (self.drop_fn)(slot)
    }

    /// True when running this destructor does nothing.
    pub(crate) fn is_trivial(&self) -> bool {
        self.trivial
    }
}

impl fmt::Debug for Destructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destructor")
            .field("type_name", &self.type_name)
            .field("trivial", &self.is_trivial())
            .finish()
    }
}

unsafe fn drop_slot<T>(slot: NonNull<u8>) {
    if mem::size_of::<T>() == 0 {
        // Zero-sized values own no bytes; any aligned non-null pointer will do.
        std::ptr::drop_in_place(NonNull::<T>::dangling().as_ptr());
    } else {
        std::ptr::drop_in_place(slot.cast::<T>().as_ptr());
    }
}

unsafe fn drop_nothing(_: NonNull<u8>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::mem::ManuallyDrop;
    use std::rc::Rc;

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_trivial_types_get_noop() {
        assert!(Destructor::of::<u64>().is_trivial());
        assert!(Destructor::of::<()>().is_trivial());
        assert!(!Destructor::of::<String>().is_trivial());
    }

    #[test]
    fn test_runs_drop_glue() {
        let drops = Rc::new(Cell::new(0));
        let mut value = ManuallyDrop::new(Counted(drops.clone()));
        let slot = NonNull::from(&mut *value).cast::<u8>();

        unsafe { Destructor::of::<Counted>().run(slot) };
        assert_eq!(drops.get(), 1);
    }
}
