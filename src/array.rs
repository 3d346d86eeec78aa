use std::alloc::Layout;
use std::any::type_name;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::arena::RawArena;
use crate::bundle::{assert_storable, check_distinct, Bundle};
use crate::config::ArrayConfig;
use crate::destructor::Destructor;
use crate::error::{enforce, StoreError};
use crate::type_key::TypeKey;

#[inline(always)]
fn is_zero_sized<T>() -> bool {
    mem::size_of::<T>() == 0
}

/// A heterogeneous container holding at most one value per type, packed
/// into a single aligned byte arena.
///
/// Values go through two stages. *Reserving* a type gives it a byte range
/// in the arena; *constructing* it moves a value into that range. `insert`
/// does both. Destructing a value ends its life but keeps its range, so the
/// same type can later be assigned back into the same place.
///
/// Misuse (reserving a sized type twice, reading a type that holds no value,
/// passing a stale offset, ...) is a programming error and panics. The
/// `try_*` methods return a [`StoreError`] instead.
///
/// Offsets are stable for the life of a reservation, but growing the arena
/// may move it. References handed out by `get` borrow the array, so the
/// compiler already forces a fresh lookup after any call that could grow it.
///
/// # Examples
///
/// ```
/// use sovran_typearray::TypeArray;
///
/// let mut array = TypeArray::new();
/// array.insert(5.634f64);
/// array.insert(218762532i32);
///
/// assert_eq!(array.offset_of::<i32>(), std::mem::size_of::<f64>());
/// assert_eq!(*array.get::<i32>(), 218762532);
/// assert_eq!(*array.get::<f64>(), 5.634);
///
/// *array.get_mut::<i32>() += 1;
/// assert_eq!(array.has::<i32>(), Some(&218762533));
/// assert_eq!(array.has::<u8>(), None);
/// ```
pub struct TypeArray {
    offsets: FxHashMap<TypeKey, usize>,
    arena: RawArena,
    destructors: FxHashMap<TypeKey, Destructor>,
}

impl TypeArray {
    /// Creates an empty array without allocating.
    pub fn new() -> Self {
        Self {
            offsets: FxHashMap::default(),
            arena: RawArena::new(),
            destructors: FxHashMap::default(),
        }
    }

    /// Creates an empty array with room for `bytes` of values and `types`
    /// distinct types.
    pub fn with_capacity(bytes: usize, types: usize) -> Self {
        let mut array = Self::new();
        array.reserve_capacity(bytes, types);
        array
    }

    /// Creates an empty array sized from `config`.
    pub fn with_config(config: ArrayConfig) -> Self {
        Self::with_capacity(config.initial_bytes, config.initial_types)
    }

    /// Makes room for `bytes` more arena bytes and `types` more types without
    /// reallocating. Reserves no type.
    pub fn reserve_capacity(&mut self, bytes: usize, types: usize) {
        self.arena.reserve(bytes);
        self.offsets.reserve(types);
        self.destructors.reserve(types);
    }

    /// Number of types holding a live value.
    pub fn len(&self) -> usize {
        self.destructors.len()
    }

    /// True when no type holds a live value.
    pub fn is_empty(&self) -> bool {
        self.destructors.is_empty()
    }

    /// Number of types with a reserved slot, constructed or not.
    pub fn reserved_len(&self) -> usize {
        self.offsets.len()
    }

    /// Bytes of arena in use, padding included.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Bytes of arena allocated.
    pub fn arena_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Base address of the arena.
    ///
    /// Only valid until the next call that reserves space.
    pub fn arena_ptr(&self) -> *const u8 {
        self.arena.as_ptr()
    }

    /// True if `T` has a reserved slot.
    pub fn is_reserved<T: 'static>(&self) -> bool {
        self.offsets.contains_key(&TypeKey::of::<T>())
    }

    /// True if `T` holds a live value.
    pub fn is_constructed<T: 'static>(&self) -> bool {
        self.destructors.contains_key(&TypeKey::of::<T>())
    }

    /// True if `T` holds a live value. Reserved-only types do not count.
    pub fn contains<T: 'static>(&self) -> bool {
        self.is_constructed::<T>()
    }

    /// True if every type in `B` holds a live value.
    pub fn contains_all<B: Bundle>(&self) -> bool {
        B::keys().iter().all(|key| self.destructors.contains_key(key))
    }

    /// Offset of `T` in the arena.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not reserved.
    #[track_caller]
    pub fn offset_of<T: 'static>(&self) -> usize {
        enforce(
            self.try_offset_of::<T>()
                .ok_or(StoreError::NotReserved(type_name::<T>())),
        )
    }

    /// Offset of `T` in the arena, if reserved.
    pub fn try_offset_of<T: 'static>(&self) -> Option<usize> {
        self.offsets.get(&TypeKey::of::<T>()).copied()
    }

    /// Offsets of every type in `B`, in tuple order.
    ///
    /// # Panics
    ///
    /// Panics if any type is not reserved.
    #[track_caller]
    pub fn offset_of_bundle<B: Bundle>(&self) -> B::Offsets {
        let offsets = enforce(self.reserved_offsets::<B>());
        B::offsets_from(&offsets)
    }

    /// Gives `T` a slot in the arena and returns its offset.
    ///
    /// Zero-sized types take no space; reserving one again is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `T` is sized and already reserved.
    #[track_caller]
    pub fn reserve<T: 'static>(&mut self) -> usize {
        enforce(self.try_reserve::<T>())
    }

    /// Fallible form of [`reserve`](Self::reserve).
    pub fn try_reserve<T: 'static>(&mut self) -> Result<usize, StoreError> {
        assert_storable::<T>();
        let key = TypeKey::of::<T>();
        if is_zero_sized::<T>() {
            return Ok(*self.offsets.entry(key).or_insert(0));
        }
        if self.offsets.contains_key(&key) {
            return Err(StoreError::AlreadyReserved(type_name::<T>()));
        }

        let layout = Layout::new::<T>();
        self.arena.try_reserve(layout.size() + layout.align() - 1)?;
        let offset = self.arena.bump(layout);
        self.offsets.insert(key, offset);
        Ok(offset)
    }

    /// Reserves every type in `B` at once, packing them to minimise padding.
    ///
    /// Offsets come back in tuple order, whatever order they were placed in.
    ///
    /// ```
    /// use sovran_typearray::TypeArray;
    ///
    /// let mut array = TypeArray::new();
    /// let [a, b, c] = array.reserve_bundle::<(u8, u16, u64)>();
    /// // The u64 is placed first, then the u16, then the u8: no padding at all.
    /// assert_eq!((a, b, c), (10, 8, 0));
    /// assert_eq!(array.arena_len(), 11);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if a type repeats, or a sized type is already reserved.
    #[track_caller]
    pub fn reserve_bundle<B: Bundle>(&mut self) -> B::Offsets {
        enforce(self.try_reserve_bundle::<B>())
    }

    /// Fallible form of [`reserve_bundle`](Self::reserve_bundle).
    pub fn try_reserve_bundle<B: Bundle>(&mut self) -> Result<B::Offsets, StoreError> {
        B::assert_storable();
        let keys = B::keys();
        let layouts = B::layouts();
        let names = B::type_names();
        check_distinct(&keys, &names)?;

        let mut sized: SmallVec<[usize; 8]> = SmallVec::new();
        let mut worst_case = 0usize;
        for (i, layout) in layouts.iter().enumerate() {
            if layout.size() == 0 {
                continue;
            }
            if self.offsets.contains_key(&keys[i]) {
                return Err(StoreError::AlreadyReserved(names[i]));
            }
            sized.push(i);
            worst_case += layout.size() + layout.align() - 1;
        }
        self.arena.try_reserve(worst_case)?;

        let sized_layouts: SmallVec<[Layout; 8]> = sized.iter().map(|&i| layouts[i]).collect();
        let placed = self.arena.bump_batch(&sized_layouts);

        // Zero-sized members keep offset 0.
        let mut offsets: SmallVec<[usize; 8]> = SmallVec::from_elem(0, keys.len());
        for (slot, &i) in sized.iter().enumerate() {
            offsets[i] = placed[slot];
        }
        for (key, &offset) in keys.iter().zip(&offsets) {
            self.offsets.entry(*key).or_insert(offset);
        }
        Ok(B::offsets_from(&offsets))
    }

    /// Moves `value` into the slot already reserved for `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not reserved or already holds a value.
    #[track_caller]
    pub fn construct<T: 'static>(&mut self, value: T) -> &mut T {
        enforce(self.try_construct(value))
    }

    /// Fallible form of [`construct`](Self::construct). On error `value` is dropped.
    pub fn try_construct<T: 'static>(&mut self, value: T) -> Result<&mut T, StoreError> {
        let key = TypeKey::of::<T>();
        let offset = *self
            .offsets
            .get(&key)
            .ok_or(StoreError::NotReserved(type_name::<T>()))?;
        if self.destructors.contains_key(&key) {
            return Err(StoreError::AlreadyConstructed(type_name::<T>()));
        }
        Ok(self.construct_at(offset, value))
    }

    /// Constructs every value of a bundle into its reserved slot.
    ///
    /// Nothing is constructed unless every slot is reserved and empty.
    ///
    /// # Panics
    ///
    /// Panics if a type repeats, is not reserved, or already holds a value.
    #[track_caller]
    pub fn construct_bundle<B: Bundle>(&mut self, values: B) -> B::Muts<'_> {
        let offsets = enforce(self.vacant_offsets::<B>());
        values.construct_each(self, &offsets);
        // SAFETY: every slot was just constructed, and the types are distinct.
        unsafe { B::muts(self, &offsets) }
    }

    /// Reserves a slot for `T` and moves `value` into it.
    ///
    /// Inserting a zero-sized type that is already present keeps the existing
    /// one and drops `value`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is sized and already reserved.
    #[track_caller]
    pub fn insert<T: 'static>(&mut self, value: T) -> &mut T {
        enforce(self.try_insert(value))
    }

    /// Fallible form of [`insert`](Self::insert). On error `value` is dropped.
    pub fn try_insert<T: 'static>(&mut self, value: T) -> Result<&mut T, StoreError> {
        if is_zero_sized::<T>() {
            let key = TypeKey::of::<T>();
            let offset = *self.offsets.entry(key).or_insert(0);
            if self.destructors.contains_key(&key) {
                drop(value);
                // SAFETY: a zero-sized value is live, any aligned pointer reads it.
                return Ok(unsafe { &mut *self.slot::<T>(offset).as_ptr() });
            }
            return Ok(self.construct_at(offset, value));
        }
        let offset = self.try_reserve::<T>()?;
        Ok(self.construct_at(offset, value))
    }

    /// Inserts several values of distinct types at once.
    ///
    /// Sized values are reserved together, so the arena grows once and
    /// padding is minimised across the whole bundle. The types must be all
    /// zero-sized or all sized.
    ///
    /// # Panics
    ///
    /// Panics if a type repeats, the bundle mixes zero-sized and sized types,
    /// or a sized type is already reserved.
    #[track_caller]
    pub fn insert_bundle<B: Bundle>(&mut self, values: B) -> B::Muts<'_> {
        let keys = B::keys();
        enforce(check_distinct(&keys, &B::type_names()));

        let zero_sized = B::layouts().iter().filter(|layout| layout.size() == 0).count();
        if zero_sized == B::LEN {
            values.insert_each(self);
        } else if zero_sized > 0 {
            crate::error::violation(StoreError::MixedBundle);
        } else {
            let offsets = self.reserve_bundle::<B>();
            values.construct_each(self, offsets.as_ref());
        }

        let offsets = enforce(self.reserved_offsets::<B>());
        // SAFETY: every type was just constructed, and the types are distinct.
        unsafe { B::muts(self, &offsets) }
    }

    /// Stores `value` in the slot reserved for `T`, dropping any value
    /// already there. The offset of `T` never changes.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not reserved.
    #[track_caller]
    pub fn assign<T: 'static>(&mut self, value: T) -> &mut T {
        let key = TypeKey::of::<T>();
        let offset = enforce(
            self.offsets
                .get(&key)
                .copied()
                .ok_or(StoreError::NotReserved(type_name::<T>())),
        );
        if !self.destructors.contains_key(&key) {
            return self.construct_at(offset, value);
        }
        // SAFETY: the slot holds a live T.
        let slot = unsafe { &mut *self.slot::<T>(offset).as_ptr() };
        *slot = value;
        slot
    }

    /// Assigns every value of a bundle into its reserved slot.
    ///
    /// # Panics
    ///
    /// Panics if a type repeats or is not reserved.
    #[track_caller]
    pub fn assign_bundle<B: Bundle>(&mut self, values: B) -> B::Muts<'_> {
        let offsets = enforce(self.reserved_offsets::<B>());
        enforce(check_distinct(&B::keys(), &B::type_names()));
        values.assign_each(self);
        // SAFETY: every slot holds a live value after assignment.
        unsafe { B::muts(self, &offsets) }
    }

    /// Inserts `value` if `T` has no slot yet, otherwise assigns it.
    #[track_caller]
    pub fn insert_or_assign<T: 'static>(&mut self, value: T) -> &mut T {
        if self.is_reserved::<T>() {
            self.assign(value)
        } else {
            self.insert(value)
        }
    }

    /// [`insert_or_assign`](Self::insert_or_assign) for each value of a bundle.
    ///
    /// # Panics
    ///
    /// Panics if a type repeats.
    #[track_caller]
    pub fn insert_or_assign_bundle<B: Bundle>(&mut self, values: B) -> B::Muts<'_> {
        enforce(check_distinct(&B::keys(), &B::type_names()));
        values.insert_or_assign_each(self);
        let offsets = enforce(self.reserved_offsets::<B>());
        // SAFETY: every slot holds a live value, and the types are distinct.
        unsafe { B::muts(self, &offsets) }
    }

    /// Returns the value of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` holds no value. Use [`has`](Self::has) when unsure.
    #[track_caller]
    pub fn get<T: 'static>(&self) -> &T {
        enforce(self.try_get())
    }

    /// Fallible form of [`get`](Self::get).
    pub fn try_get<T: 'static>(&self) -> Result<&T, StoreError> {
        let offset = self.live_offset::<T>()?;
        // SAFETY: live_offset only succeeds for constructed slots.
        Ok(unsafe { &*self.slot::<T>(offset).as_ptr() })
    }

    /// Returns the value of type `T` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `T` holds no value.
    #[track_caller]
    pub fn get_mut<T: 'static>(&mut self) -> &mut T {
        enforce(self.try_get_mut())
    }

    /// Fallible form of [`get_mut`](Self::get_mut).
    pub fn try_get_mut<T: 'static>(&mut self) -> Result<&mut T, StoreError> {
        let offset = self.live_offset::<T>()?;
        // SAFETY: live_offset only succeeds for constructed slots.
        Ok(unsafe { &mut *self.slot::<T>(offset).as_ptr() })
    }

    /// Returns the value of type `T` using an offset obtained earlier from
    /// [`offset_of`](Self::offset_of) or a reservation.
    ///
    /// The offset is checked against the recorded one.
    ///
    /// # Panics
    ///
    /// Panics if `T` holds no value or `offset` is not its offset.
    #[track_caller]
    pub fn get_at<T: 'static>(&self, offset: usize) -> &T {
        enforce(self.try_get_at(offset))
    }

    /// Fallible form of [`get_at`](Self::get_at).
    pub fn try_get_at<T: 'static>(&self, offset: usize) -> Result<&T, StoreError> {
        self.check_offset::<T>(offset)?;
        // SAFETY: check_offset confirmed a live T at this offset.
        Ok(unsafe { &*self.slot::<T>(offset).as_ptr() })
    }

    /// Mutable form of [`get_at`](Self::get_at).
    #[track_caller]
    pub fn get_at_mut<T: 'static>(&mut self, offset: usize) -> &mut T {
        enforce(self.check_offset::<T>(offset));
        // SAFETY: check_offset confirmed a live T at this offset.
        unsafe { &mut *self.slot::<T>(offset).as_ptr() }
    }

    /// Returns the value of type `T` at `offset` without any lookup.
    ///
    /// # Safety
    ///
    /// `T` must hold a live value and `offset` must be its offset, as
    /// returned by [`offset_of`](Self::offset_of) for this array.
    #[inline]
    pub unsafe fn get_unchecked<T: 'static>(&self, offset: usize) -> &T {
        debug_assert_eq!(self.try_offset_of::<T>(), Some(offset));
        &*self.slot::<T>(offset).as_ptr()
    }

    /// Returns the values of every type in `B`, in tuple order.
    ///
    /// # Panics
    ///
    /// Panics if any type holds no value.
    #[track_caller]
    pub fn get_many<B: Bundle>(&self) -> B::Refs<'_> {
        let offsets = enforce(self.live_offsets::<B>());
        // SAFETY: every offset holds a live value of its type.
        unsafe { B::refs(self, &offsets) }
    }

    /// Mutable form of [`get_many`](Self::get_many).
    ///
    /// # Panics
    ///
    /// Panics if a type repeats or holds no value.
    #[track_caller]
    pub fn get_many_mut<B: Bundle>(&mut self) -> B::Muts<'_> {
        enforce(check_distinct(&B::keys(), &B::type_names()));
        let offsets = enforce(self.live_offsets::<B>());
        // SAFETY: every offset holds a live value, and the types are distinct.
        unsafe { B::muts(self, &offsets) }
    }

    /// [`get_many`](Self::get_many) using offsets obtained earlier.
    ///
    /// # Panics
    ///
    /// Panics if any type holds no value or an offset does not match.
    #[track_caller]
    pub fn get_many_at<B: Bundle>(&self, offsets: B::Offsets) -> B::Refs<'_> {
        let live = enforce(self.live_offsets::<B>());
        let names = B::type_names();
        for ((&recorded, &supplied), &type_name) in live.iter().zip(offsets.as_ref()).zip(&names) {
            if recorded != supplied {
                crate::error::violation(StoreError::OffsetMismatch {
                    type_name,
                    recorded,
                    supplied,
                });
            }
        }
        // SAFETY: every offset holds a live value of its type.
        unsafe { B::refs(self, offsets.as_ref()) }
    }

    /// Returns the value of type `T` if there is one.
    pub fn has<T: 'static>(&self) -> Option<&T> {
        self.try_get().ok()
    }

    /// Returns the value of type `T` mutably if there is one.
    pub fn has_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.try_get_mut().ok()
    }

    /// Drops the value of type `T`. Its slot stays reserved.
    ///
    /// # Panics
    ///
    /// Panics if `T` holds no value.
    #[track_caller]
    pub fn destruct<T: 'static>(&mut self) {
        enforce(self.try_destruct::<T>())
    }

    /// Fallible form of [`destruct`](Self::destruct).
    pub fn try_destruct<T: 'static>(&mut self) -> Result<(), StoreError> {
        let key = TypeKey::of::<T>();
        let destructor = self
            .destructors
            .remove(&key)
            .ok_or(StoreError::NotConstructed(type_name::<T>()))?;
        let offset = self.offsets.get(&key).copied().unwrap_or(0);
        // SAFETY: the slot held a live T, and it is no longer registered.
        unsafe { destructor.run(self.arena.ptr_at(offset)) };
        Ok(())
    }

    /// Drops the value of every type in `B`.
    ///
    /// # Panics
    ///
    /// Panics if a type repeats or holds no value. Nothing is dropped then.
    #[track_caller]
    pub fn destruct_bundle<B: Bundle>(&mut self) {
        enforce(check_distinct(&B::keys(), &B::type_names()));
        enforce(self.live_offsets::<B>());
        B::destruct_each(self);
    }

    /// Drops every value and forgets every reservation.
    ///
    /// The arena keeps its allocation; see [`shrink_to_fit`](Self::shrink_to_fit).
    ///
    /// The store is left empty even if a destructor panics; the remaining
    /// destructors still run while the panic unwinds.
    pub fn clear(&mut self) {
        let pending = self.take_destructors();
        self.offsets.clear();
        self.arena.clear();
        let ran = pending.len();
        run_all(pending);
        log::debug!("type array cleared, {} destructors run", ran);
    }

    /// Releases unused table capacity, and the arena if nothing is reserved.
    pub fn shrink_to_fit(&mut self) {
        self.offsets.shrink_to_fit();
        self.destructors.shrink_to_fit();
        if self.offsets.is_empty() {
            self.arena.shrink_to_fit();
        }
    }

    /// Address of `T`'s slot at `offset`.
    #[inline]
    pub(crate) fn slot<T: 'static>(&self, offset: usize) -> NonNull<T> {
        if is_zero_sized::<T>() {
            NonNull::dangling()
        } else {
            self.arena.ptr_at(offset).cast()
        }
    }

    /// Writes `value` into a reserved, vacant slot and registers its destructor.
    pub(crate) fn construct_at<T: 'static>(&mut self, offset: usize, value: T) -> &mut T {
        assert_storable::<T>();
        let slot = self.slot::<T>(offset);
        // SAFETY: the slot is reserved for T, aligned, in bounds and vacant.
        unsafe { slot.as_ptr().write(value) };
        self.destructors.insert(TypeKey::of::<T>(), Destructor::of::<T>());
        // SAFETY: the slot now holds a live T.
        unsafe { &mut *slot.as_ptr() }
    }

    fn live_offset<T: 'static>(&self) -> Result<usize, StoreError> {
        let key = TypeKey::of::<T>();
        if !self.destructors.contains_key(&key) {
            return Err(StoreError::NotConstructed(type_name::<T>()));
        }
        self.offsets
            .get(&key)
            .copied()
            .ok_or(StoreError::NotReserved(type_name::<T>()))
    }

    fn check_offset<T: 'static>(&self, supplied: usize) -> Result<(), StoreError> {
        let recorded = self.live_offset::<T>()?;
        if recorded != supplied {
            return Err(StoreError::OffsetMismatch {
                type_name: type_name::<T>(),
                recorded,
                supplied,
            });
        }
        Ok(())
    }

    fn reserved_offsets<B: Bundle>(&self) -> Result<SmallVec<[usize; 8]>, StoreError> {
        let names = B::type_names();
        B::keys()
            .iter()
            .zip(&names)
            .map(|(key, &name)| {
                self.offsets
                    .get(key)
                    .copied()
                    .ok_or(StoreError::NotReserved(name))
            })
            .collect()
    }

    fn live_offsets<B: Bundle>(&self) -> Result<SmallVec<[usize; 8]>, StoreError> {
        let names = B::type_names();
        for (key, &name) in B::keys().iter().zip(&names) {
            if !self.destructors.contains_key(key) {
                return Err(StoreError::NotConstructed(name));
            }
        }
        self.reserved_offsets::<B>()
    }

    fn vacant_offsets<B: Bundle>(&self) -> Result<SmallVec<[usize; 8]>, StoreError> {
        let keys = B::keys();
        let names = B::type_names();
        check_distinct(&keys, &names)?;
        for (key, &name) in keys.iter().zip(&names) {
            if self.destructors.contains_key(key) {
                return Err(StoreError::AlreadyConstructed(name));
            }
        }
        self.reserved_offsets::<B>()
    }

    /// Unregisters every destructor, pairing the ones with work to do with
    /// the address of their value.
    fn take_destructors(&mut self) -> PendingDrops {
        let mut pending = PendingDrops::new();
        for (key, destructor) in self.destructors.drain() {
            if destructor.is_trivial() {
                continue;
            }
            let offset = self.offsets.get(&key).copied().unwrap_or(0);
            pending.push((self.arena.ptr_at(offset), destructor));
        }
        pending
    }
}

type PendingDrops = SmallVec<[(NonNull<u8>, Destructor); 8]>;

/// Finishes running destructors when one of them panics.
struct FinishDrops(smallvec::IntoIter<[(NonNull<u8>, Destructor); 8]>);

impl Drop for FinishDrops {
    fn drop(&mut self) {
        for (slot, destructor) in self.0.by_ref() {
            // SAFETY: see run_all.
            unsafe { destructor.run(slot) };
        }
    }
}

/// Runs every destructor taken from a store whose allocation is still live.
fn run_all(pending: PendingDrops) {
    let mut remaining = FinishDrops(pending.into_iter());
    for (slot, destructor) in remaining.0.by_ref() {
        // SAFETY: each pair was a registered destructor and the address of
        // its live value; taking it unregistered it, so it runs exactly once.
        unsafe { destructor.run(slot) };
    }
}

impl Default for TypeArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TypeArray {
    fn drop(&mut self) {
        run_all(self.take_destructors());
    }
}

impl fmt::Debug for TypeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeArray")
            .field("constructed", &self.destructors.len())
            .field("reserved", &self.offsets.len())
            .field("arena", &self.arena)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[derive(Debug, PartialEq)]
    struct Marker;

    #[test]
    fn test_reserve_then_construct() {
        let mut array = TypeArray::new();
        let offset = array.reserve::<u32>();
        assert!(array.is_reserved::<u32>());
        assert!(!array.contains::<u32>());
        assert_eq!(array.has::<u32>(), None);

        array.construct(9u32);
        assert_eq!(array.offset_of::<u32>(), offset);
        assert_eq!(*array.get::<u32>(), 9);
    }

    #[test]
    fn test_destruct_keeps_slot_for_assign() {
        let drops = Rc::new(Cell::new(0));
        let mut array = TypeArray::new();
        array.insert(Tracked(drops.clone()));
        let offset = array.offset_of::<Tracked>();

        array.destruct::<Tracked>();
        assert_eq!(drops.get(), 1);
        assert!(!array.contains::<Tracked>());
        assert!(array.is_reserved::<Tracked>());

        array.assign(Tracked(drops.clone()));
        assert_eq!(array.offset_of::<Tracked>(), offset);
        assert_eq!(drops.get(), 1);
        drop(array);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_zero_sized_takes_no_space() {
        let mut array = TypeArray::new();
        assert_eq!(array.insert(Marker), &Marker);
        array.insert(Marker);
        assert_eq!(array.reserved_len(), 1);
        assert_eq!(array.arena_len(), 0);
        assert_eq!(array.offset_of::<Marker>(), 0);
        assert_eq!(array.has::<Marker>(), Some(&Marker));
    }

    #[test]
    fn test_try_variants_report_errors() {
        let mut array = TypeArray::new();
        assert_eq!(
            array.try_get::<u8>().unwrap_err(),
            StoreError::NotConstructed("u8")
        );
        assert_eq!(
            array.try_construct(1u8).unwrap_err(),
            StoreError::NotReserved("u8")
        );
        array.insert(1u8);
        assert_eq!(
            array.try_insert(2u8).unwrap_err(),
            StoreError::AlreadyReserved("u8")
        );
        assert_eq!(
            array.try_get_at::<u8>(3).unwrap_err(),
            StoreError::OffsetMismatch {
                type_name: "u8",
                recorded: 0,
                supplied: 3
            }
        );
        assert!(array.try_destruct::<u8>().is_ok());
        assert_eq!(
            array.try_destruct::<u8>().unwrap_err(),
            StoreError::NotConstructed("u8")
        );
    }

    #[test]
    fn test_get_unchecked_matches_get() {
        let mut array = TypeArray::new();
        array.insert_bundle((1u16, 2u64));
        let offset = array.offset_of::<u64>();
        assert_eq!(unsafe { *array.get_unchecked::<u64>(offset) }, 2);
    }

    #[test]
    fn test_debug_output() {
        let mut array = TypeArray::new();
        array.reserve::<u8>();
        array.insert(2u16);
        let text = format!("{:?}", array);
        assert!(text.contains("constructed: 1"));
        assert!(text.contains("reserved: 2"));
    }
}
