//! The byte arena every [`TypeArray`](crate::TypeArray) packs its values into.
//!
//! [`RawArena`] is a single growable allocation whose base address is always
//! aligned to [`ARENA_ALIGN`]. Space is handed out by bumping the length; no
//! interior range is ever freed until the whole arena is cleared.
//!
//! Growing the arena may move the allocation. Offsets stay valid across a
//! move, pointers obtained before it do not.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use smallvec::SmallVec;

use crate::error::StoreError;
use crate::packing::{self, padding_for};

/// Alignment of the arena's base address.
///
/// No type with a larger alignment can be stored.
pub const ARENA_ALIGN: usize = 64;

/// Smallest non-zero capacity the arena allocates.
const MIN_CAPACITY: usize = 64;

#[repr(C, align(64))]
struct CacheLine([u8; ARENA_ALIGN]);

/// A growable, `ARENA_ALIGN`-aligned byte buffer with bump allocation.
///
/// Bytes are never initialised by the arena itself; whoever writes a value
/// at an offset is responsible for reading it back as the same type.
pub struct RawArena {
    /// Base of the allocation, dangling while `capacity == 0`.
    ptr: NonNull<u8>,
    /// Bytes handed out so far.
    len: usize,
    /// Bytes allocated.
    capacity: usize,
}

impl RawArena {
    /// Creates an empty arena without allocating.
    pub fn new() -> Self {
        Self {
            ptr: NonNull::<CacheLine>::dangling().cast(),
            len: 0,
            capacity: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = Self::new();
        arena.reserve(capacity);
        arena
    }

    /// Bytes handed out so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been handed out.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes currently allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Base address of the arena.
    ///
    /// The pointer is invalidated by any call that grows the arena.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Pointer to the byte at `offset`.
    ///
    /// `offset` must not exceed the current length.
    #[inline]
    pub fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= self.len, "offset {} past arena end {}", offset, self.len);
        // SAFETY: offset is within the allocation (or zero for the dangling
        // base), so the result is in bounds and non-null.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    /// Makes sure at least `additional` more bytes fit without reallocating.
    pub fn reserve(&mut self, additional: usize) {
        match self.len.checked_add(additional) {
            Some(total) => self.grow_to(total),
            None => overflow(usize::MAX),
        }
    }

    /// Fallible form of [`reserve`](Self::reserve).
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), StoreError> {
        let total = self
            .len
            .checked_add(additional)
            .ok_or(StoreError::CapacityOverflow {
                requested: usize::MAX,
            })?;
        self.try_grow_to(total)
    }

    /// Bump-allocates a single layout and returns its offset.
    pub fn bump(&mut self, layout: Layout) -> usize {
        let padding = padding_for(self.len, layout.align());
        let offset = self.len + padding;
        self.set_len(offset + layout.size());
        offset
    }

    /// Places several layouts at once, growing the arena a single time.
    ///
    /// Offsets come back in the order of `layouts`.
    pub fn bump_batch(&mut self, layouts: &[Layout]) -> SmallVec<[usize; 8]> {
        let plan = packing::plan(self.len, layouts);
        log::trace!(
            "placing {} layouts at {:?}, arena {} -> {} bytes",
            layouts.len(),
            plan.offsets,
            self.len,
            plan.end
        );
        self.set_len(plan.end);
        plan.offsets
    }

    /// Forgets every allocation. Capacity is kept.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Releases the allocation if the arena is empty.
    pub fn shrink_to_fit(&mut self) {
        if self.len == 0 && self.capacity > 0 {
            self.release();
        }
    }

    fn set_len(&mut self, len: usize) {
        self.grow_to(len);
        self.len = len;
    }

    fn grow_to(&mut self, required: usize) {
        if let Err(err) = self.try_grow_to(required) {
            match err {
                StoreError::CapacityOverflow { requested } => overflow(requested),
                other => crate::error::violation(other),
            }
        }
    }

    fn try_grow_to(&mut self, required: usize) -> Result<(), StoreError> {
        if required <= self.capacity {
            return Ok(());
        }

        let doubled = required
            .max(self.capacity.saturating_mul(2))
            .max(MIN_CAPACITY);
        let new_layout = Layout::from_size_align(doubled, ARENA_ALIGN)
            .or_else(|_| Layout::from_size_align(required, ARENA_ALIGN))
            .map_err(|_| StoreError::CapacityOverflow { requested: required })?;
        let new_capacity = new_layout.size();

        let raw = if self.capacity == 0 {
            // SAFETY: new_layout has non-zero size.
            unsafe { alloc::alloc(new_layout) }
        } else {
            // SAFETY: ptr was allocated with current_layout(), and
            // new_capacity fits a valid layout at the same alignment.
            unsafe { alloc::realloc(self.ptr.as_ptr(), self.current_layout(), new_capacity) }
        };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(new_layout)
        };

        log::trace!(
            "arena grew {} -> {} bytes (moved: {})",
            self.capacity,
            new_capacity,
            ptr != self.ptr
        );
        self.ptr = ptr;
        self.capacity = new_capacity;
        Ok(())
    }

    fn current_layout(&self) -> Layout {
        // SAFETY: the same size/alignment pair passed Layout validation
        // when the allocation was made.
        unsafe { Layout::from_size_align_unchecked(self.capacity, ARENA_ALIGN) }
    }

    fn release(&mut self) {
        // SAFETY: capacity > 0 means ptr came from alloc/realloc with this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.current_layout()) };
        self.ptr = NonNull::<CacheLine>::dangling().cast();
        self.capacity = 0;
        self.len = 0;
    }
}

#[cold]
#[track_caller]
fn overflow(requested: usize) -> ! {
    crate::error::violation(StoreError::CapacityOverflow { requested })
}

impl Default for RawArena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RawArena {
    fn drop(&mut self) {
        if self.capacity > 0 {
            self.release();
        }
    }
}

impl std::fmt::Debug for RawArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawArena")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(size: usize, align: usize) -> Layout {
        Layout::from_size_align(size, align).unwrap()
    }

    #[test]
    fn test_new_arena_is_aligned_and_empty() {
        let arena = RawArena::new();
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.capacity(), 0);
        assert_eq!(arena.as_ptr() as usize % ARENA_ALIGN, 0);
    }

    #[test]
    fn test_bump_pads_to_alignment() {
        let mut arena = RawArena::new();
        assert_eq!(arena.bump(layout(1, 1)), 0);
        assert_eq!(arena.bump(layout(8, 8)), 8);
        assert_eq!(arena.bump(layout(2, 2)), 16);
        assert_eq!(arena.len(), 18);
        assert_eq!(arena.as_ptr() as usize % ARENA_ALIGN, 0);
    }

    #[test]
    fn test_bump_batch_grows_once_to_plan_end() {
        let mut arena = RawArena::new();
        arena.bump(layout(1, 1));
        let offsets = arena.bump_batch(&[layout(8, 4), layout(8, 8)]);
        // end=1: u32-aligned needs 3, u64-aligned needs 7.
        assert_eq!(offsets.as_slice(), &[4, 16]);
        assert_eq!(arena.len(), 24);
    }

    #[test]
    fn test_growth_preserves_bytes() {
        let mut arena = RawArena::new();
        let offset = arena.bump(layout(8, 8));
        unsafe { arena.ptr_at(offset).cast::<u64>().as_ptr().write(0xDEAD_BEEF) };

        for _ in 0..64 {
            arena.bump(layout(64, 64));
        }

        assert!(arena.capacity() >= 64 * 64 + 8);
        assert_eq!(arena.as_ptr() as usize % ARENA_ALIGN, 0);
        let value = unsafe { arena.ptr_at(offset).cast::<u64>().as_ptr().read() };
        assert_eq!(value, 0xDEAD_BEEF);
    }

    #[test]
    fn test_clear_keeps_capacity_shrink_releases() {
        let mut arena = RawArena::with_capacity(256);
        arena.bump(layout(32, 16));
        arena.clear();
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.capacity(), 256);

        arena.shrink_to_fit();
        assert_eq!(arena.capacity(), 0);
        assert_eq!(arena.bump(layout(4, 4)), 0);
    }

    #[test]
    fn test_try_reserve_reports_overflow() {
        let mut arena = RawArena::new();
        arena.bump(layout(1, 1));
        assert!(matches!(
            arena.try_reserve(usize::MAX),
            Err(StoreError::CapacityOverflow { .. })
        ));
    }
}
