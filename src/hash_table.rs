//! A closed-hashing hash table with linear probing.
//!
//! [`HashTable<K, V, P>`] stores key/value pairs in three parallel arrays:
//! a packed slot-state metadata array, a key array, and a value array. An
//! entry's hash, masked by the power-of-two capacity, selects its home slot;
//! collisions are resolved by walking the probe sequence `home, home + 1,
//! home + 2, …` with wrap-around. This is a low-level structure that takes
//! the hash value and closures for key equality and rehashing on each
//! operation; prefer the [`HashMap`] or [`HashSet`] wrappers unless you are
//! building your own map layer.
//!
//! ## Design
//!
//! Small tables live entirely inside the table value: an inline buffer sized
//! for [`DEFAULT_CAPACITY`] slots serves every capacity up to that bound, so
//! a freshly created table performs no heap allocation at all. The buffer is
//! addressed through a residency switch rather than stored pointers, which
//! keeps the table a plain movable value. The first growth migrates into a
//! single heap allocation laid out as `[ metadata | keys | values ]` with
//! per-region alignment padding, and the table never moves back.
//!
//! Probing reads slot states out of the packed metadata words. The walk
//! caches the current word, shifted so the low bits always describe the
//! current slot; stepping shifts the cache and reloads it only when the slot
//! index crosses a word boundary, which a single mask detects. Lookups stop
//! at the first empty slot or after a full revolution, so they terminate
//! even when deleted markers have consumed every remaining slot.
//!
//! Growth doubles the capacity and is triggered by insertion only, and only
//! when an insert actually collides while the table is more than half full.
//! A collision-free insert never resizes, so a table filled with perfectly
//! distributed keys can exceed half load. Migration re-inserts every live
//! entry into the new storage through a path that cannot recurse into
//! another resize; deleted markers are dropped wholesale.
//!
//! Erasure is delegated to the table's [`ErasePolicy`], which also fixes the
//! width of the per-slot state field. See the [`policy`] module for the two
//! strategies and their trade-offs.
//!
//! Iteration scans the metadata words directly: each word is masked down to
//! its occupied bits and consumed with a bit-scan, so runs of empty or
//! deleted slots cost one word load per [`ErasePolicy::SLOTS_PER_WORD`]
//! slots rather than one check per slot.
//!
//! [`HashMap`]: crate::hash_map::HashMap
//! [`HashSet`]: crate::hash_set::HashSet
//! [`policy`]: crate::policy

use alloc::alloc::handle_alloc_error;
use core::alloc::Layout;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use crate::policy::set_slot_state;
use crate::policy::slot_state;
use crate::policy::BackshiftErase;
use crate::policy::ErasePolicy;
use crate::policy::MetaWord;
use crate::policy::EMPTY;
use crate::policy::OCCUPIED;

/// Capacity, in slots, of the buffer embedded in every table value.
///
/// Tables constructed with a requested capacity at or below this bound start
/// out heap-free.
pub const DEFAULT_CAPACITY: usize = 32;

// Sized for the widest state encoding (two bits per slot) so the same
// buffer serves both erase policies.
const INLINE_META_WORDS: usize =
    (DEFAULT_CAPACITY * 2 + crate::policy::META_WORD_BITS - 1) / crate::policy::META_WORD_BITS;

/// Slot-scan sentinel: no further occupied slot.
const NO_SLOT: usize = usize::MAX;

#[inline(always)]
fn meta_words<P: ErasePolicy>(capacity: usize) -> usize {
    capacity.div_ceil(P::SLOTS_PER_WORD)
}

/// Storage embedded in the table value, used while the capacity stays at or
/// below [`DEFAULT_CAPACITY`].
#[repr(C)]
struct InlineBuffer<K, V> {
    meta: [MetaWord; INLINE_META_WORDS],
    keys: [MaybeUninit<K>; DEFAULT_CAPACITY],
    values: [MaybeUninit<V>; DEFAULT_CAPACITY],
}

impl<K, V> InlineBuffer<K, V> {
    fn new() -> Self {
        Self {
            meta: [0; INLINE_META_WORDS],
            keys: [const { MaybeUninit::uninit() }; DEFAULT_CAPACITY],
            values: [const { MaybeUninit::uninit() }; DEFAULT_CAPACITY],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DataLayout {
    layout: Layout,
    keys_offset: usize,
    values_offset: usize,
}

impl DataLayout {
    fn new<K, V>(capacity: usize, meta_words: usize) -> Self {
        let meta_layout = Layout::array::<MetaWord>(meta_words).expect("allocation size overflow");
        let keys_layout =
            Layout::array::<MaybeUninit<K>>(capacity).expect("allocation size overflow");
        let values_layout =
            Layout::array::<MaybeUninit<V>>(capacity).expect("allocation size overflow");

        let (layout, _) = Layout::new::<()>().extend(meta_layout).unwrap();
        let (layout, keys_offset) = layout.extend(keys_layout).unwrap();
        let (layout, values_offset) = layout.extend(values_layout).unwrap();

        DataLayout {
            layout,
            keys_offset,
            values_offset,
        }
    }
}

/// Owned heap block holding the three storage regions for one capacity.
///
/// Dropping the handle releases the block only; destroying the entries in
/// occupied slots is the table's job.
struct HeapAlloc {
    ptr: NonNull<u8>,
    layout: DataLayout,
}

impl HeapAlloc {
    fn allocate<K, V, P: ErasePolicy>(capacity: usize) -> Self {
        let layout = DataLayout::new::<K, V>(capacity, meta_words::<P>(capacity));

        // SAFETY: The layout always covers at least one metadata word, so
        // its size is non-zero. Allocation failure is handled, and zeroing
        // the metadata region marks every slot empty.
        let ptr = unsafe {
            let raw = alloc::alloc::alloc(layout.layout);
            if raw.is_null() {
                handle_alloc_error(layout.layout);
            }
            core::ptr::write_bytes(raw, 0, layout.keys_offset);
            NonNull::new_unchecked(raw)
        };

        HeapAlloc { ptr, layout }
    }

    fn parts<K, V>(&self) -> RawParts<K, V> {
        // SAFETY: The offsets were produced by `Layout::extend` for this
        // block, so the derived pointers are in bounds and aligned for
        // their region's element type.
        unsafe {
            RawParts {
                meta: self.ptr.cast(),
                keys: NonNull::new_unchecked(self.ptr.as_ptr().add(self.layout.keys_offset)).cast(),
                values: NonNull::new_unchecked(self.ptr.as_ptr().add(self.layout.values_offset))
                    .cast(),
            }
        }
    }
}

impl Drop for HeapAlloc {
    fn drop(&mut self) {
        // SAFETY: `ptr` was allocated with exactly this layout.
        unsafe {
            alloc::alloc::dealloc(self.ptr.as_ptr(), self.layout.layout);
        }
    }
}

/// Base pointers of the three storage regions, re-derived from the table on
/// each use so the table value stays freely movable.
struct RawParts<K, V> {
    meta: NonNull<MetaWord>,
    keys: NonNull<MaybeUninit<K>>,
    values: NonNull<MaybeUninit<V>>,
}

impl<K, V> Clone for RawParts<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for RawParts<K, V> {}

/// Walks the probe sequence of `hash` looking for a key matching `eq`.
///
/// Stops at the first empty slot or after a full revolution; deleted slots
/// continue the walk without being offered to `eq`.
///
/// # Safety
///
/// `parts` must describe a table of capacity `mask + 1` (a power of two)
/// whose occupied slots hold initialized keys.
#[inline]
unsafe fn probe_find<K, V, P: ErasePolicy>(
    parts: RawParts<K, V>,
    mask: usize,
    hash: u64,
    eq: impl Fn(&K) -> bool,
) -> Option<usize> {
    let spw = P::SLOTS_PER_WORD;
    let home = (hash as usize) & mask;
    let mut idx = home;
    // The cached word is kept shifted so its low bits describe `idx`.
    // SAFETY: `idx` is masked into bounds, so its word is readable.
    let mut word =
        unsafe { *parts.meta.as_ptr().add(idx / spw) } >> (P::META_BITS * (idx & (spw - 1)));

    loop {
        let state = word & P::STATE_MASK;
        if state == EMPTY {
            return None;
        }
        if state == OCCUPIED {
            // SAFETY: An occupied slot holds an initialized key.
            if eq(unsafe { (*parts.keys.as_ptr().add(idx)).assume_init_ref() }) {
                return Some(idx);
            }
        }

        idx = (idx + 1) & mask;
        if idx == home {
            return None;
        }
        word >>= P::META_BITS;
        if idx & (spw - 1) == 0 {
            // SAFETY: `idx` is masked into bounds, so its word is readable.
            word = unsafe { *parts.meta.as_ptr().add(idx / spw) };
        }
    }
}

/// Places an entry known to be absent, without any growth path.
///
/// Used to migrate entries into freshly allocated storage, which by
/// construction is at most half full and therefore always has a free slot.
///
/// # Safety
///
/// `parts` must describe storage of capacity `mask + 1` (a power of two)
/// with at least one slot not occupied.
unsafe fn push_new<K, V, P: ErasePolicy>(
    parts: RawParts<K, V>,
    mask: usize,
    hash: u64,
    key: K,
    value: V,
) {
    let mut idx = (hash as usize) & mask;
    loop {
        // SAFETY: `idx` is masked into bounds.
        if unsafe { slot_state::<P>(parts.meta, idx) } != OCCUPIED {
            // SAFETY: The slot is not occupied, so writing the entry and
            // marking it occupied cannot clobber a live entry.
            unsafe {
                set_slot_state::<P>(parts.meta, idx, OCCUPIED);
                (*parts.keys.as_ptr().add(idx)).write(key);
                (*parts.values.as_ptr().add(idx)).write(value);
            }
            return;
        }
        idx = (idx + 1) & mask;
    }
}

/// Finds the first occupied slot, scanning metadata words from the front.
///
/// # Safety
///
/// `meta` must hold the metadata words for `capacity` slots.
unsafe fn first_occupied<P: ErasePolicy>(meta: NonNull<MetaWord>, capacity: usize) -> usize {
    let words = meta_words::<P>(capacity);
    for w in 0..words {
        // SAFETY: `w` is below the word count for this capacity.
        let m = unsafe { *meta.as_ptr().add(w) } & P::OCCUPIED_SCAN_MASK;
        if m != 0 {
            return w * P::SLOTS_PER_WORD + m.trailing_zeros() as usize / P::META_BITS;
        }
    }
    NO_SLOT
}

/// Finds the next occupied slot strictly after `pos`.
///
/// # Safety
///
/// `meta` must hold the metadata words for `capacity` slots, and `pos` must
/// be a valid slot index.
unsafe fn next_occupied<P: ErasePolicy>(
    meta: NonNull<MetaWord>,
    capacity: usize,
    pos: usize,
) -> usize {
    let spw = P::SLOTS_PER_WORD;

    // Remaining slots in the current word. The double shift keeps each
    // shift amount below the word width even for the final slot.
    // SAFETY: `pos` is a valid slot, so its word is readable.
    let word = unsafe { *meta.as_ptr().add(pos / spw) };
    let m =
        word & ((MetaWord::MAX << (P::META_BITS * (pos & (spw - 1)))) << 1) & P::OCCUPIED_SCAN_MASK;
    if m != 0 {
        return (pos & !(spw - 1)) + m.trailing_zeros() as usize / P::META_BITS;
    }

    let words = meta_words::<P>(capacity);
    for w in pos / spw + 1..words {
        // SAFETY: `w` is below the word count for this capacity.
        let m = unsafe { *meta.as_ptr().add(w) } & P::OCCUPIED_SCAN_MASK;
        if m != 0 {
            return w * spw + m.trailing_zeros() as usize / P::META_BITS;
        }
    }
    NO_SLOT
}

/// A closed-hashing hash table mapping keys to values with linear probing.
///
/// The table does not hash or compare keys itself: every operation takes
/// the key's hash, and operations that inspect or rearrange entries take an
/// equality predicate and/or a `rehash` closure. The `rehash` closure must
/// return, for any key in the table, the same hash that was supplied when
/// the key was inserted.
///
/// The erase policy `P` selects the deletion strategy; see
/// [`BackshiftErase`] and [`TombstoneErase`](crate::policy::TombstoneErase).
///
/// Keys and values are relocated by plain byte moves during erasure and
/// growth; references into the table are invalidated by any operation that
/// may insert, grow, or erase.
pub struct HashTable<K, V, P: ErasePolicy = BackshiftErase> {
    inline: InlineBuffer<K, V>,
    heap: Option<HeapAlloc>,
    len: usize,
    mask: usize,
    _policy: PhantomData<P>,
}

// SAFETY: The table owns its entries outright; the raw pointers it hands
// around are all derived from storage it exclusively owns.
unsafe impl<K: Send, V: Send, P: ErasePolicy> Send for HashTable<K, V, P> {}
// SAFETY: Shared access only reads; all mutation goes through `&mut self`.
unsafe impl<K: Sync, V: Sync, P: ErasePolicy> Sync for HashTable<K, V, P> {}

impl<K, V, P: ErasePolicy> HashTable<K, V, P> {
    /// Creates an empty table with the default capacity, entirely inside
    /// the table value.
    pub fn new() -> Self {
        Self {
            inline: InlineBuffer::new(),
            heap: None,
            len: 0,
            mask: DEFAULT_CAPACITY - 1,
            _policy: PhantomData,
        }
    }

    /// Creates an empty table with at least the requested capacity, rounded
    /// up to the next power of two.
    ///
    /// Capacities up to [`DEFAULT_CAPACITY`] use the inline buffer; larger
    /// ones allocate immediately.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the rounded capacity overflows.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be non-zero");
        let capacity = capacity
            .checked_next_power_of_two()
            .expect("capacity overflow");

        let heap = if capacity <= DEFAULT_CAPACITY {
            None
        } else {
            Some(HeapAlloc::allocate::<K, V, P>(capacity))
        };

        Self {
            inline: InlineBuffer::new(),
            heap,
            len: 0,
            mask: capacity - 1,
            _policy: PhantomData,
        }
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots, always a power of two.
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    fn parts(&self) -> RawParts<K, V> {
        match &self.heap {
            Some(heap) => heap.parts(),
            None => RawParts {
                meta: NonNull::from(&self.inline.meta).cast(),
                keys: NonNull::from(&self.inline.keys).cast(),
                values: NonNull::from(&self.inline.values).cast(),
            },
        }
    }

    // Writes must go through pointers derived from a mutable borrow, so the
    // read-only accessor above cannot be reused here.
    fn parts_mut(&mut self) -> RawParts<K, V> {
        match &mut self.heap {
            Some(heap) => heap.parts(),
            None => RawParts {
                meta: NonNull::from(&mut self.inline.meta).cast(),
                keys: NonNull::from(&mut self.inline.keys).cast(),
                values: NonNull::from(&mut self.inline.values).cast(),
            },
        }
    }

    fn get_index(&self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<usize> {
        // SAFETY: `parts` and `mask` describe this table's live storage.
        unsafe { probe_find::<K, V, P>(self.parts(), self.mask, hash, eq) }
    }

    /// Looks up the entry for `hash` whose key satisfies `eq`.
    pub fn find(&self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<(&K, &V)> {
        let idx = self.get_index(hash, eq)?;
        let parts = self.parts();
        // SAFETY: `get_index` only returns occupied slots, whose entries
        // are initialized.
        unsafe {
            Some((
                (*parts.keys.as_ptr().add(idx)).assume_init_ref(),
                (*parts.values.as_ptr().add(idx)).assume_init_ref(),
            ))
        }
    }

    /// Looks up the entry for `hash` whose key satisfies `eq`, with mutable
    /// access to the value.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<(&K, &mut V)> {
        let idx = self.get_index(hash, eq)?;
        let parts = self.parts_mut();
        // SAFETY: `get_index` only returns occupied slots, whose entries
        // are initialized.
        unsafe {
            Some((
                (*parts.keys.as_ptr().add(idx)).assume_init_ref(),
                (*parts.values.as_ptr().add(idx)).assume_init_mut(),
            ))
        }
    }

    /// Inserts `key` and `value` if no present key satisfies `eq`.
    ///
    /// Returns `true` if the entry was stored, `false` if a matching key
    /// was already present, in which case the table is not modified and the
    /// given key and value are dropped.
    ///
    /// Insertion may grow the table, invalidating references and iterators.
    pub fn insert(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        eq: impl Fn(&K) -> bool,
        rehash: impl Fn(&K) -> u64,
    ) -> bool {
        if self.get_index(hash, eq).is_some() {
            return false;
        }
        self.add_new(hash, key, value, &rehash);
        true
    }

    /// Inserts an entry whose key is known to be absent, returning a
    /// reference to the stored value.
    ///
    /// The caller is responsible for having established absence (for
    /// example via [`find`](Self::find)); inserting a duplicate key this
    /// way leaves the table with two entries for the key, and which one
    /// later operations see is unspecified.
    pub fn insert_unique(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        rehash: impl Fn(&K) -> u64,
    ) -> &mut V {
        let idx = self.add_new(hash, key, value, &rehash);
        let parts = self.parts_mut();
        // SAFETY: `add_new` returns the occupied slot it just wrote.
        unsafe { (*parts.values.as_ptr().add(idx)).assume_init_mut() }
    }

    /// Returns the value for the key matching `eq`, inserting `default()`
    /// under `key` first if no such entry exists.
    pub fn get_or_insert_with(
        &mut self,
        hash: u64,
        key: K,
        eq: impl Fn(&K) -> bool,
        rehash: impl Fn(&K) -> u64,
        default: impl FnOnce() -> V,
    ) -> &mut V {
        if let Some(idx) = self.get_index(hash, &eq) {
            let parts = self.parts_mut();
            // SAFETY: `get_index` only returns occupied slots.
            return unsafe { (*parts.values.as_ptr().add(idx)).assume_init_mut() };
        }
        let idx = self.add_new(hash, key, default(), &rehash);
        let parts = self.parts_mut();
        // SAFETY: `add_new` returns the occupied slot it just wrote.
        unsafe { (*parts.values.as_ptr().add(idx)).assume_init_mut() }
    }

    /// Removes and returns the entry for `hash` whose key satisfies `eq`.
    ///
    /// Returns `None`, without side effects, if no key matches.
    pub fn remove(
        &mut self,
        hash: u64,
        eq: impl Fn(&K) -> bool,
        rehash: impl Fn(&K) -> u64,
    ) -> Option<(K, V)> {
        if self.len == 0 {
            return None;
        }

        let idx = self.get_index(hash, eq)?;
        let parts = self.parts_mut();
        // SAFETY: `idx` is an occupied slot. Reading the entry out is
        // paired with the policy fixup, which retires the slot before
        // anything else can observe it.
        unsafe {
            let key = (*parts.keys.as_ptr().add(idx)).assume_init_read();
            let value = (*parts.values.as_ptr().add(idx)).assume_init_read();
            P::erase_fixup(parts.meta, parts.keys, parts.values, self.mask, idx, &rehash);
            self.len -= 1;
            Some((key, value))
        }
    }

    /// Grows the table to hold at least `new_capacity` slots, rounded up to
    /// the next power of two. Requests at or below the current capacity do
    /// nothing; the table never shrinks.
    ///
    /// `rehash` must return each present key's original hash.
    pub fn reserve(&mut self, new_capacity: usize, rehash: impl Fn(&K) -> u64) {
        if new_capacity > self.capacity() {
            let new_capacity = new_capacity
                .checked_next_power_of_two()
                .expect("capacity overflow");
            self.grow(new_capacity, &rehash);
        }
    }

    /// Removes every entry, keeping the capacity and storage residency.
    pub fn clear(&mut self) {
        let capacity = self.capacity();
        let parts = self.parts_mut();

        // SAFETY: Occupied slots hold initialized entries; after they are
        // dropped, zeroing the metadata marks every slot empty so nothing
        // is dropped twice.
        unsafe {
            if (core::mem::needs_drop::<K>() || core::mem::needs_drop::<V>()) && self.len > 0 {
                let mut idx = first_occupied::<P>(parts.meta, capacity);
                while idx != NO_SLOT {
                    (*parts.keys.as_ptr().add(idx)).assume_init_drop();
                    (*parts.values.as_ptr().add(idx)).assume_init_drop();
                    idx = next_occupied::<P>(parts.meta, capacity, idx);
                }
            }
            core::ptr::write_bytes(parts.meta.as_ptr(), 0, meta_words::<P>(capacity));
        }

        self.len = 0;
    }

    /// Returns an iterator over the entries, yielding `(&K, &V)` in an
    /// unspecified order.
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        // SAFETY: The scan stays within this table's metadata words.
        let pos = unsafe { first_occupied::<P>(self.parts().meta, self.capacity()) };
        Iter {
            table: self,
            pos,
            remaining: self.len,
        }
    }

    /// Returns an iterator over the entries, yielding `(&K, &mut V)` in an
    /// unspecified order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, P> {
        let capacity = self.capacity();
        let parts = self.parts_mut();
        // SAFETY: The scan stays within this table's metadata words.
        let pos = unsafe { first_occupied::<P>(parts.meta, capacity) };
        IterMut {
            parts,
            capacity,
            pos,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Places a new entry, growing on collision when the table is more than
    /// half full. The key must not be present.
    fn add_new(&mut self, hash: u64, key: K, value: V, rehash: &dyn Fn(&K) -> u64) -> usize {
        let spw = P::SLOTS_PER_WORD;

        loop {
            let parts = self.parts_mut();
            let mask = self.mask;
            let home = (hash as usize) & mask;
            let mut idx = home;
            // SAFETY: `idx` is masked into bounds, so its word is readable.
            let mut word = unsafe { *parts.meta.as_ptr().add(idx / spw) }
                >> (P::META_BITS * (idx & (spw - 1)));

            loop {
                if word & P::STATE_MASK != OCCUPIED {
                    // SAFETY: The slot is empty or deleted, so claiming it
                    // and writing the entry cannot clobber a live entry.
                    unsafe {
                        set_slot_state::<P>(parts.meta, idx, OCCUPIED);
                        (*parts.keys.as_ptr().add(idx)).write(key);
                        (*parts.values.as_ptr().add(idx)).write(value);
                    }
                    self.len += 1;
                    return idx;
                }

                // The load factor is only consulted once an insert actually
                // collides; collision-free inserts never resize.
                if 2 * self.len > mask {
                    break;
                }

                idx = (idx + 1) & mask;
                if idx == home {
                    unreachable!("probe sequence wrapped without finding a free slot");
                }
                word >>= P::META_BITS;
                if idx & (spw - 1) == 0 {
                    // SAFETY: `idx` is masked into bounds.
                    word = unsafe { *parts.meta.as_ptr().add(idx / spw) };
                }
            }

            self.grow(2 * (mask + 1), rehash);
        }
    }

    /// Migrates every live entry into fresh heap storage of `new_capacity`
    /// slots. Deleted markers are not carried over.
    #[cold]
    #[inline(never)]
    fn grow(&mut self, new_capacity: usize, rehash: &dyn Fn(&K) -> u64) {
        debug_assert!(new_capacity.is_power_of_two());
        debug_assert!(new_capacity > self.capacity());

        let new_heap = HeapAlloc::allocate::<K, V, P>(new_capacity);
        let new_parts = new_heap.parts::<K, V>();
        let new_mask = new_capacity - 1;

        let old_parts = self.parts_mut();
        let old_capacity = self.capacity();

        // SAFETY: Each occupied slot's entry is moved out exactly once; the
        // old metadata is never consulted again once the heap handle is
        // swapped below. The destination has at least twice the old
        // capacity and at most half of it filled, so `push_new` always
        // finds a slot.
        unsafe {
            let mut idx = first_occupied::<P>(old_parts.meta, old_capacity);
            while idx != NO_SLOT {
                let key = (*old_parts.keys.as_ptr().add(idx)).assume_init_read();
                let value = (*old_parts.values.as_ptr().add(idx)).assume_init_read();
                let hash = rehash(&key);
                push_new::<K, V, P>(new_parts, new_mask, hash, key, value);
                idx = next_occupied::<P>(old_parts.meta, old_capacity, idx);
            }
        }

        // Entries were moved out above, so replacing the handle releases
        // only the old block itself.
        self.heap = Some(new_heap);
        self.mask = new_mask;
    }
}

impl<K, V, P: ErasePolicy> Default for HashTable<K, V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, P: ErasePolicy> Debug for HashTable<K, V, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("on_heap", &self.heap.is_some())
            .finish()
    }
}

impl<K, V, P> Clone for HashTable<K, V, P>
where
    K: Clone,
    V: Clone,
    P: ErasePolicy,
{
    fn clone(&self) -> Self {
        let mut new = Self::with_capacity(self.capacity());
        debug_assert_eq!(new.capacity(), self.capacity());

        let capacity = self.capacity();
        let src = self.parts();
        let dst = new.parts_mut();

        // SAFETY: Both tables have identical capacity, so slot indices and
        // metadata words transfer one-to-one. Entries are cloned into place
        // before the metadata is copied: if a clone unwinds, the new table
        // still presents as empty (leaking the finished clones rather than
        // exposing half-initialized slots). The verbatim metadata copy
        // preserves probe chains, deleted markers included.
        unsafe {
            let mut idx = first_occupied::<P>(src.meta, capacity);
            while idx != NO_SLOT {
                (*dst.keys.as_ptr().add(idx))
                    .write((*src.keys.as_ptr().add(idx)).assume_init_ref().clone());
                (*dst.values.as_ptr().add(idx))
                    .write((*src.values.as_ptr().add(idx)).assume_init_ref().clone());
                idx = next_occupied::<P>(src.meta, capacity, idx);
            }
            core::ptr::copy_nonoverlapping(
                src.meta.as_ptr(),
                dst.meta.as_ptr(),
                meta_words::<P>(capacity),
            );
        }

        new.len = self.len;
        new
    }
}

impl<K, V, P: ErasePolicy> Drop for HashTable<K, V, P> {
    fn drop(&mut self) {
        if (core::mem::needs_drop::<K>() || core::mem::needs_drop::<V>()) && self.len > 0 {
            let capacity = self.capacity();
            let parts = self.parts_mut();
            // SAFETY: Occupied slots hold initialized entries, each dropped
            // exactly once here; the heap block, if any, is released by the
            // `HeapAlloc` handle afterwards.
            unsafe {
                let mut idx = first_occupied::<P>(parts.meta, capacity);
                while idx != NO_SLOT {
                    (*parts.keys.as_ptr().add(idx)).assume_init_drop();
                    (*parts.values.as_ptr().add(idx)).assume_init_drop();
                    idx = next_occupied::<P>(parts.meta, capacity, idx);
                }
            }
        }
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// Created by [`HashTable::iter`]. Yields entries in slot order, which is
/// unspecified and changes as the table is modified.
pub struct Iter<'a, K, V, P: ErasePolicy> {
    table: &'a HashTable<K, V, P>,
    pos: usize,
    remaining: usize,
}

impl<'a, K, V, P: ErasePolicy> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos == NO_SLOT {
            return None;
        }
        let idx = self.pos;
        let parts = self.table.parts();
        // SAFETY: `pos` always holds an occupied slot index, established by
        // the occupied-slot scans, and occupied slots are initialized.
        unsafe {
            self.pos = next_occupied::<P>(parts.meta, self.table.capacity(), idx);
            self.remaining -= 1;
            Some((
                (*parts.keys.as_ptr().add(idx)).assume_init_ref(),
                (*parts.values.as_ptr().add(idx)).assume_init_ref(),
            ))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, P: ErasePolicy> ExactSizeIterator for Iter<'_, K, V, P> {}
impl<K, V, P: ErasePolicy> FusedIterator for Iter<'_, K, V, P> {}

/// A mutable iterator over the entries of a [`HashTable`].
///
/// Created by [`HashTable::iter_mut`]. Keys stay shared; values are
/// exclusive.
pub struct IterMut<'a, K, V, P: ErasePolicy> {
    parts: RawParts<K, V>,
    capacity: usize,
    pos: usize,
    remaining: usize,
    _marker: PhantomData<&'a mut HashTable<K, V, P>>,
}

impl<'a, K, V, P: ErasePolicy> Iterator for IterMut<'a, K, V, P> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos == NO_SLOT {
            return None;
        }
        let idx = self.pos;
        // SAFETY: `pos` always holds an occupied slot index; each slot is
        // yielded at most once, so the mutable borrows never overlap.
        unsafe {
            self.pos = next_occupied::<P>(self.parts.meta, self.capacity, idx);
            self.remaining -= 1;
            Some((
                (*self.parts.keys.as_ptr().add(idx)).assume_init_ref(),
                (*self.parts.values.as_ptr().add(idx)).assume_init_mut(),
            ))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, P: ErasePolicy> ExactSizeIterator for IterMut<'_, K, V, P> {}
impl<K, V, P: ErasePolicy> FusedIterator for IterMut<'_, K, V, P> {}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use core::hash::Hasher;

    use rand::rngs::OsRng;
    use rand::TryRngCore;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::policy::slot_state;
    use crate::policy::TombstoneErase;
    use crate::policy::DELETED;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn random() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn hash(&self, key: u64) -> u64 {
            let mut h = SipHasher::new_with_keys(self.k0, self.k1);
            h.write_u64(key);
            h.finish()
        }
    }

    /// Slot indices of the occupied entries, in iteration order. Pins the
    /// physical layout for the probing and erase tests.
    fn occupied_slots<K, V, P: ErasePolicy>(table: &HashTable<K, V, P>) -> Vec<usize> {
        let parts = table.parts();
        let mut slots = Vec::new();
        let mut idx = unsafe { first_occupied::<P>(parts.meta, table.capacity()) };
        while idx != NO_SLOT {
            slots.push(idx);
            idx = unsafe { next_occupied::<P>(parts.meta, table.capacity(), idx) };
        }
        slots
    }

    fn insert_all<P: ErasePolicy>(
        table: &mut HashTable<u64, u64, P>,
        state: &HashState,
        keys: core::ops::Range<u64>,
    ) {
        for k in keys {
            assert!(table.insert(state.hash(k), k, k * 2, |x| *x == k, |x| state.hash(*x)));
        }
    }

    fn run_insert_and_find<P: ErasePolicy>() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, P> = HashTable::new();

        insert_all(&mut table, &state, 0..200);
        assert_eq!(table.len(), 200);

        for k in 0..200u64 {
            let (fk, fv) = table.find(state.hash(k), |x| *x == k).expect("present key");
            assert_eq!((*fk, *fv), (k, k * 2));
        }
        assert!(table.find(state.hash(999), |x| *x == 999).is_none());
    }

    #[test]
    fn insert_and_find_backshift() {
        run_insert_and_find::<BackshiftErase>();
    }

    #[test]
    fn insert_and_find_tombstone() {
        run_insert_and_find::<TombstoneErase>();
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::new();

        assert!(table.insert(state.hash(7), 7, 1, |x| *x == 7, |x| state.hash(*x)));
        assert!(!table.insert(state.hash(7), 7, 2, |x| *x == 7, |x| state.hash(*x)));
        assert_eq!(table.len(), 1);
        let (_, v) = table.find(state.hash(7), |x| *x == 7).unwrap();
        assert_eq!(*v, 1);
    }

    fn run_remove<P: ErasePolicy>() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, P> = HashTable::new();
        insert_all(&mut table, &state, 0..64);

        assert!(table
            .remove(state.hash(500), |x| *x == 500, |x| state.hash(*x))
            .is_none());
        assert_eq!(table.len(), 64);

        for k in (0..64u64).step_by(2) {
            let (rk, rv) = table
                .remove(state.hash(k), |x| *x == k, |x| state.hash(*x))
                .expect("present key");
            assert_eq!((rk, rv), (k, k * 2));
        }
        assert_eq!(table.len(), 32);

        for k in 0..64u64 {
            let found = table.find(state.hash(k), |x| *x == k);
            assert_eq!(found.is_some(), k % 2 == 1, "key {k}");
        }
        assert_eq!(table.iter().count(), 32);
    }

    #[test]
    fn remove_backshift() {
        run_remove::<BackshiftErase>();
    }

    #[test]
    fn remove_tombstone() {
        run_remove::<TombstoneErase>();
    }

    // Erase tests below drive the table with explicit hashes so slot
    // positions are exact.

    #[test]
    fn backshift_repacks_cluster() {
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(8);
        // Three keys colliding on slot 0 occupy slots 0, 1, 2.
        for k in [10, 11, 12] {
            assert!(table.insert(0, k, k, |x| *x == k, |_| 0));
        }
        assert_eq!(occupied_slots(&table), [0, 1, 2]);

        table.remove(0, |x| *x == 10, |_| 0).unwrap();
        // Both survivors slide back one slot.
        assert_eq!(occupied_slots(&table), [0, 1]);
        let keys: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, [11, 12]);
        assert!(table.find(0, |x| *x == 11).is_some());
        assert!(table.find(0, |x| *x == 12).is_some());
    }

    #[test]
    fn backshift_shifts_across_wraparound() {
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(8);
        // Home slot 7; the cluster wraps to slots 7, 0, 1.
        for k in [20, 21, 22] {
            assert!(table.insert(7, k, k, |x| *x == k, |_| 7));
        }
        assert_eq!(occupied_slots(&table), [0, 1, 7]);

        table.remove(7, |x| *x == 20, |_| 7).unwrap();
        // 21 moves to 7, 22 follows to 0.
        let keys: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(occupied_slots(&table), [0, 7]);
        assert_eq!(keys, [22, 21]);
        assert!(table.find(7, |x| *x == 21).is_some());
        assert!(table.find(7, |x| *x == 22).is_some());
    }

    #[test]
    fn backshift_leaves_home_entries_pinned() {
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(8);
        assert!(table.insert(0, 30, 30, |x| *x == 30, |_| 0));
        assert!(table.insert(1, 31, 31, |x| *x == 31, |_| 1));

        table.remove(0, |x| *x == 30, |_| 0).unwrap();
        // 31 sits at its home slot and must not move into the hole.
        assert_eq!(occupied_slots(&table), [1]);
        assert!(table.find(1, |x| *x == 31).is_some());
    }

    #[test]
    fn backshift_restores_displaced_entry_to_home() {
        let rehash = |k: &u64| if *k == 42 { 1 } else { 0 };
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(8);
        assert!(table.insert(0, 40, 40, |x| *x == 40, rehash));
        assert!(table.insert(0, 41, 41, |x| *x == 41, rehash));
        // 42's home slot 1 is taken by 41, displacing it to slot 2.
        assert!(table.insert(1, 42, 42, |x| *x == 42, rehash));
        assert_eq!(occupied_slots(&table), [0, 1, 2]);

        table.remove(0, |x| *x == 40, rehash).unwrap();
        assert_eq!(occupied_slots(&table), [0, 1]);
        let keys: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, [41, 42]);
        assert!(table.find(1, |x| *x == 42).is_some());
    }

    #[test]
    fn tombstone_keeps_probe_chain_alive() {
        let mut table: HashTable<u64, u64, TombstoneErase> = HashTable::with_capacity(8);
        for k in [50, 51, 52] {
            assert!(table.insert(3, k, k, |x| *x == k, |_| 3));
        }
        assert_eq!(occupied_slots(&table), [3, 4, 5]);

        table.remove(3, |x| *x == 51, |_| 3).unwrap();
        // The probe for 52 must walk through the deleted slot 4.
        assert!(table.find(3, |x| *x == 52).is_some());
        assert_eq!(occupied_slots(&table), [3, 5]);

        // A fresh insert on the same chain reuses the deleted slot.
        assert!(table.insert(3, 53, 53, |x| *x == 53, |_| 3));
        assert_eq!(occupied_slots(&table), [3, 4, 5]);
        let keys: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, [50, 53, 52]);
    }

    #[test]
    fn tombstone_erase_then_reinsert_same_key() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, TombstoneErase> = HashTable::new();

        assert!(table.insert(state.hash(9), 9, 1, |x| *x == 9, |x| state.hash(*x)));
        table
            .remove(state.hash(9), |x| *x == 9, |x| state.hash(*x))
            .unwrap();
        assert!(table.insert(state.hash(9), 9, 2, |x| *x == 9, |x| state.hash(*x)));

        assert_eq!(table.len(), 1);
        let (_, v) = table.find(state.hash(9), |x| *x == 9).unwrap();
        assert_eq!(*v, 2);
    }

    #[test]
    fn growth_clears_tombstones() {
        let mut table: HashTable<u64, u64, TombstoneErase> = HashTable::with_capacity(8);
        for k in 0..4u64 {
            assert!(table.insert(k, k, k, |x| *x == k, |x| *x));
        }
        for k in 0..3u64 {
            table.remove(k, |x| *x == k, |x| *x).unwrap();
        }

        table.reserve(16, |x| *x);
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.len(), 1);

        let parts = table.parts();
        for idx in 0..table.capacity() {
            let state = unsafe { slot_state::<TombstoneErase>(parts.meta, idx) };
            assert_ne!(state, DELETED, "slot {idx} kept a deleted marker across growth");
        }
        assert!(table.find(3, |x| *x == 3).is_some());
    }

    #[test]
    fn capacity_one_grows_on_second_insert() {
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(1);
        assert_eq!(table.capacity(), 1);

        // A collision-free insert fills the only slot without resizing.
        assert!(table.insert(0, 0, 100, |x| *x == 0, |x| *x));
        assert_eq!(table.capacity(), 1);

        // The second insert collides at capacity 1, grows to 2, collides
        // again (2 & 1 == 0), and settles at capacity 4.
        assert!(table.insert(2, 2, 200, |x| *x == 2, |x| *x));
        assert_eq!(table.capacity(), 4);
        assert_eq!(*table.find(0, |x| *x == 0).unwrap().1, 100);
        assert_eq!(*table.find(2, |x| *x == 2).unwrap().1, 200);
    }

    #[test]
    fn home_slot_fill_defers_growth_to_first_collision() {
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(32);
        for k in 0..16u64 {
            assert!(table.insert(k, k, k, |x| *x == k, |x| *x));
        }
        // Sixteen distinct home slots: no collision, no growth.
        assert_eq!(table.capacity(), 32);
        assert_eq!(occupied_slots(&table), (0..16).collect::<Vec<_>>());

        // Key 32 collides with key 0 while the table is half full.
        assert!(table.insert(32, 32, 32, |x| *x == 32, |x| *x));
        assert_eq!(table.capacity(), 64);
        assert_eq!(table.len(), 17);
        for k in (0..16u64).chain([32]) {
            assert_eq!(*table.find(k, |x| *x == k).unwrap().1, k);
        }
    }

    #[test]
    fn reserve_rounds_to_next_power_of_two() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::new();
        insert_all(&mut table, &state, 0..10);

        table.reserve(3, |x| state.hash(*x));
        assert_eq!(table.capacity(), 32);
        table.reserve(33, |x| state.hash(*x));
        assert_eq!(table.capacity(), 64);
        table.reserve(1023, |x| state.hash(*x));
        assert_eq!(table.capacity(), 1024);

        assert_eq!(table.len(), 10);
        for k in 0..10u64 {
            assert_eq!(*table.find(state.hash(k), |x| *x == k).unwrap().1, k * 2);
        }
    }

    #[test]
    fn with_capacity_rounds_up() {
        let table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(5);
        assert_eq!(table.capacity(), 8);
        let table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(64);
        assert_eq!(table.capacity(), 64);
    }

    #[test]
    #[should_panic(expected = "capacity must be non-zero")]
    fn with_capacity_zero_panics() {
        let _table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(0);
    }

    fn run_clear<P: ErasePolicy>() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, P> = HashTable::new();
        insert_all(&mut table, &state, 0..100);
        let capacity = table.capacity();

        table.clear();
        assert_eq!(table.len(), 0);
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.iter().count(), 0);
        assert!(table.find(state.hash(0), |x| *x == 0).is_none());

        // The table remains usable after clearing.
        insert_all(&mut table, &state, 0..10);
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn clear_preserves_capacity_backshift() {
        run_clear::<BackshiftErase>();
    }

    #[test]
    fn clear_preserves_capacity_tombstone() {
        run_clear::<TombstoneErase>();
    }

    fn run_iteration_matches_len<P: ErasePolicy>() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, P> = HashTable::new();
        insert_all(&mut table, &state, 0..77);
        for k in (0..77u64).step_by(3) {
            table.remove(state.hash(k), |x| *x == k, |x| state.hash(*x));
        }

        let iter = table.iter();
        assert_eq!(iter.len(), table.len());
        let mut seen: Vec<u64> = iter.map(|(k, _)| *k).collect();
        assert_eq!(seen.len(), table.len());
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), table.len(), "an entry was visited twice");
    }

    #[test]
    fn iteration_matches_len_backshift() {
        run_iteration_matches_len::<BackshiftErase>();
    }

    #[test]
    fn iteration_matches_len_tombstone() {
        run_iteration_matches_len::<TombstoneErase>();
    }

    #[test]
    fn iter_mut_updates_values() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::new();
        insert_all(&mut table, &state, 0..20);

        for (_, v) in table.iter_mut() {
            *v += 1;
        }
        for k in 0..20u64 {
            assert_eq!(*table.find(state.hash(k), |x| *x == k).unwrap().1, k * 2 + 1);
        }
    }

    #[test]
    fn get_or_insert_with_inserts_once() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::new();

        let v = table.get_or_insert_with(state.hash(5), 5, |x| *x == 5, |x| state.hash(*x), || 0);
        assert_eq!(*v, 0);
        *v = 42;

        let v = table.get_or_insert_with(state.hash(5), 5, |x| *x == 5, |x| state.hash(*x), || {
            unreachable!("existing entry must be returned")
        });
        assert_eq!(*v, 42);
        assert_eq!(table.len(), 1);
    }

    fn run_clone<P: ErasePolicy>() {
        let state = HashState::random();
        let mut table: HashTable<u64, u64, P> = HashTable::new();
        insert_all(&mut table, &state, 0..50);
        for k in (0..50u64).step_by(4) {
            table.remove(state.hash(k), |x| *x == k, |x| state.hash(*x));
        }

        let clone = table.clone();
        assert_eq!(clone.len(), table.len());
        assert_eq!(clone.capacity(), table.capacity());
        for k in 0..50u64 {
            let original = table.find(state.hash(k), |x| *x == k).map(|(_, v)| *v);
            let cloned = clone.find(state.hash(k), |x| *x == k).map(|(_, v)| *v);
            assert_eq!(original, cloned, "key {k}");
        }
    }

    #[test]
    fn clone_backshift() {
        run_clone::<BackshiftErase>();
    }

    #[test]
    fn clone_tombstone() {
        run_clone::<TombstoneErase>();
    }

    // Cloning must also carry the deleted markers, or entries displaced
    // past them would become unreachable in the copy.
    #[test]
    fn clone_preserves_chains_through_tombstones() {
        let mut table: HashTable<u64, u64, TombstoneErase> = HashTable::with_capacity(8);
        for k in [60, 61, 62] {
            assert!(table.insert(2, k, k, |x| *x == k, |_| 2));
        }
        table.remove(2, |x| *x == 61, |_| 2).unwrap();

        let clone = table.clone();
        assert!(clone.find(2, |x| *x == 62).is_some());
        assert_eq!(clone.len(), 2);
    }

    #[derive(Clone)]
    struct Tracked {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn run_drop_discipline<P: ErasePolicy>() {
        let state = HashState::random();
        let drops = Rc::new(Cell::new(0));

        let mut table: HashTable<u64, Tracked, P> = HashTable::with_capacity(8);
        for k in 0..24u64 {
            let value = Tracked {
                drops: drops.clone(),
            };
            assert!(table.insert(state.hash(k), k, value, |x| *x == k, |x| state.hash(*x)));
        }
        // Growth relocates entries without running destructors.
        assert!(table.capacity() > 8);
        assert_eq!(drops.get(), 0);

        for k in 0..5u64 {
            let removed = table.remove(state.hash(k), |x| *x == k, |x| state.hash(*x));
            drop(removed);
        }
        assert_eq!(drops.get(), 5);

        table.clear();
        assert_eq!(drops.get(), 24);

        for k in 0..7u64 {
            let value = Tracked {
                drops: drops.clone(),
            };
            assert!(table.insert(state.hash(k), k, value, |x| *x == k, |x| state.hash(*x)));
        }
        drop(table);
        assert_eq!(drops.get(), 31);
    }

    #[test]
    fn drop_discipline_backshift() {
        run_drop_discipline::<BackshiftErase>();
    }

    #[test]
    fn drop_discipline_tombstone() {
        run_drop_discipline::<TombstoneErase>();
    }

    #[test]
    fn lookup_terminates_with_no_empty_slots() {
        // Fill capacity 4 with two entries, delete them, and fill again so
        // every slot is occupied or deleted; misses must still terminate.
        let mut table: HashTable<u64, u64, TombstoneErase> = HashTable::with_capacity(4);
        assert!(table.insert(0, 0, 0, |x| *x == 0, |x| *x));
        assert!(table.insert(1, 1, 1, |x| *x == 1, |x| *x));
        table.remove(0, |x| *x == 0, |x| *x).unwrap();
        table.remove(1, |x| *x == 1, |x| *x).unwrap();
        assert!(table.insert(2, 2, 2, |x| *x == 2, |x| *x));
        assert!(table.insert(3, 3, 3, |x| *x == 3, |x| *x));

        assert!(table.find(1, |x| *x == 77).is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn inline_tables_round_trip_without_heap() {
        let mut table: HashTable<u64, u64, BackshiftErase> = HashTable::with_capacity(4);
        assert!(table.heap.is_none());
        for k in 0..2u64 {
            assert!(table.insert(k, k, k, |x| *x == k, |x| *x));
        }
        assert!(table.heap.is_none(), "small fills must stay inline");

        table.reserve(64, |x| *x);
        assert!(table.heap.is_some());
        for k in 0..2u64 {
            assert_eq!(*table.find(k, |x| *x == k).unwrap().1, k);
        }
    }
}
