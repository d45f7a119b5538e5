//! Erase policies and the slot-state metadata encoding they define.
//!
//! Every slot of a [`HashTable`] carries a small state field packed into an
//! array of metadata words. How wide that field is and what happens to the
//! surrounding cluster when an entry is erased are decided by the table's
//! erase policy:
//!
//! - [`BackshiftErase`] uses a single bit per slot (empty/occupied). Erasing
//!   an entry re-packs the cluster that follows it by shifting entries
//!   backwards into the hole wherever doing so keeps them reachable from
//!   their home slot. Erase touches up to a whole cluster, but the table
//!   never accumulates dead slots, so later probes stay short.
//!
//! - [`TombstoneErase`] uses two bits per slot (empty/occupied/deleted).
//!   Erasing an entry just marks its slot deleted. Erase is O(1) and never
//!   moves entries, which suits keys and values that are expensive to hash
//!   or relocate, at the price of probe chains growing through the deleted
//!   markers until the next resize clears them out.
//!
//! Both policies share the probing protocol: a deleted slot continues a
//! probe chain exactly like an occupied one, and insertion may claim any
//! slot that is not occupied. The empty state is the all-zero bit pattern in
//! either encoding, so zeroed metadata is an empty table.
//!
//! [`HashTable`]: crate::hash_table::HashTable

use core::mem::MaybeUninit;
use core::ptr::NonNull;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "meta-word-64")] {
        /// Storage word for packed slot states.
        ///
        /// With the `meta-word-64` feature, state is packed into `u64` words
        /// so a single bit-scan covers twice as many slots.
        pub type MetaWord = u64;
    } else {
        /// Storage word for packed slot states.
        pub type MetaWord = u32;
    }
}

pub(crate) const META_WORD_BITS: usize = MetaWord::BITS as usize;

/// Slot state: no entry, terminates probe chains.
///
/// Must be zero in every encoding so that zero-filled metadata describes an
/// empty table.
pub(crate) const EMPTY: MetaWord = 0;
/// Slot state: holds a live key/value pair.
pub(crate) const OCCUPIED: MetaWord = 1;
/// Slot state: former entry under [`TombstoneErase`]. Continues a probe
/// chain but matches no key.
pub(crate) const DELETED: MetaWord = 2;

/// Reads the state of slot `idx` from the packed metadata array.
///
/// # Safety
///
/// `meta` must point to at least `ceil((idx + 1) / P::SLOTS_PER_WORD)`
/// readable metadata words.
#[inline(always)]
pub(crate) unsafe fn slot_state<P: ErasePolicy>(meta: NonNull<MetaWord>, idx: usize) -> MetaWord {
    // SAFETY: The caller guarantees the word holding `idx` is in bounds.
    let word = unsafe { *meta.as_ptr().add(idx / P::SLOTS_PER_WORD) };
    (word >> (P::META_BITS * (idx & (P::SLOTS_PER_WORD - 1)))) & P::STATE_MASK
}

/// Writes the state of slot `idx` into the packed metadata array.
///
/// # Safety
///
/// Same bounds requirement as [`slot_state`], with the word writable.
#[inline(always)]
pub(crate) unsafe fn set_slot_state<P: ErasePolicy>(
    meta: NonNull<MetaWord>,
    idx: usize,
    state: MetaWord,
) {
    debug_assert!(state <= P::STATE_MASK);
    let shift = P::META_BITS * (idx & (P::SLOTS_PER_WORD - 1));
    // SAFETY: The caller guarantees the word holding `idx` is in bounds, and
    // we hold the only live pointer into the metadata while mutating.
    unsafe {
        let word = meta.as_ptr().add(idx / P::SLOTS_PER_WORD);
        *word = (*word & !(P::STATE_MASK << shift)) | (state << shift);
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::BackshiftErase {}
    impl Sealed for super::TombstoneErase {}
}

/// Strategy for removing entries from a [`HashTable`].
///
/// The policy fixes the width of the per-slot state field and supplies the
/// cluster fixup run after an entry's key and value have been moved out of
/// their slot. This trait is sealed; the two implementations are
/// [`BackshiftErase`] and [`TombstoneErase`].
///
/// [`HashTable`]: crate::hash_table::HashTable
pub trait ErasePolicy: sealed::Sealed {
    /// Bits of metadata per slot.
    const META_BITS: usize;

    /// Mask extracting a single slot state from a word already shifted so
    /// the state sits in the low bits.
    const STATE_MASK: MetaWord = (1 << Self::META_BITS) - 1;

    /// Slot states packed into one metadata word.
    const SLOTS_PER_WORD: usize = META_WORD_BITS / Self::META_BITS;

    /// Word mask keeping only the occupied bit of every slot, used to scan
    /// for live entries during iteration.
    const OCCUPIED_SCAN_MASK: MetaWord;

    /// Repairs the table after the entry at `idx` has been read out of its
    /// slot. On return, `idx`'s former entry is no longer reachable and
    /// every other key still satisfies the probe-chain invariant.
    ///
    /// `rehash` must produce the same hash for a key that was used to place
    /// it.
    ///
    /// # Safety
    ///
    /// - `meta`, `keys` and `values` must describe the same table of
    ///   capacity `mask + 1` (a power of two), with `meta` holding one state
    ///   per slot in this policy's encoding.
    /// - Slot `idx` must be marked occupied, with its key and value already
    ///   moved out; every other occupied slot must hold initialized entries.
    unsafe fn erase_fixup<K, V>(
        meta: NonNull<MetaWord>,
        keys: NonNull<MaybeUninit<K>>,
        values: NonNull<MaybeUninit<V>>,
        mask: usize,
        idx: usize,
        rehash: &dyn Fn(&K) -> u64,
    );
}

/// Erase policy that re-packs the cluster following a removed entry.
///
/// One metadata bit per slot. After the hole is opened, each subsequent
/// entry in the cluster is moved back into it when the move keeps the entry
/// reachable from its home slot, and the hole advances to the vacated slot.
/// The scan stops at the first empty slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackshiftErase;

impl ErasePolicy for BackshiftErase {
    const META_BITS: usize = 1;
    const OCCUPIED_SCAN_MASK: MetaWord = MetaWord::MAX;

    unsafe fn erase_fixup<K, V>(
        meta: NonNull<MetaWord>,
        keys: NonNull<MaybeUninit<K>>,
        values: NonNull<MaybeUninit<V>>,
        mask: usize,
        idx: usize,
        rehash: &dyn Fn(&K) -> u64,
    ) {
        let mut hole = idx;
        let mut cursor = idx;

        loop {
            // SAFETY: `hole` is a valid slot index; its entry has been moved
            // out (initially by the caller, afterwards by the relocation
            // below), so clearing the state cannot orphan a live entry.
            unsafe { set_slot_state::<Self>(meta, hole, EMPTY) };

            // Scan the rest of the cluster for an entry allowed to move into
            // the hole. An entry is pinned while its home slot lies inside
            // the open interval (hole, cursor] on the ring; moving it would
            // put it before its home slot in probe order.
            loop {
                cursor = (cursor + 1) & mask;

                // SAFETY: `cursor` is masked into bounds.
                if unsafe { slot_state::<Self>(meta, cursor) } == EMPTY {
                    return;
                }

                // SAFETY: A non-empty slot under this policy is occupied, so
                // the key is initialized.
                let home = unsafe {
                    (rehash((*keys.as_ptr().add(cursor)).assume_init_ref()) as usize) & mask
                };

                let pinned = if hole <= cursor {
                    hole < home && home <= cursor
                } else {
                    hole < home || home <= cursor
                };
                if !pinned {
                    break;
                }
            }

            // SAFETY: `cursor` holds an initialized entry and `hole` has been
            // vacated; the slots are distinct, so the byte copies relocate
            // the entry without overlap. Marking `hole` occupied before
            // clearing `cursor` (at the top of the loop) keeps every live
            // entry covered by exactly one occupied state.
            unsafe {
                core::ptr::copy_nonoverlapping(
                    keys.as_ptr().add(cursor),
                    keys.as_ptr().add(hole),
                    1,
                );
                core::ptr::copy_nonoverlapping(
                    values.as_ptr().add(cursor),
                    values.as_ptr().add(hole),
                    1,
                );
                set_slot_state::<Self>(meta, hole, OCCUPIED);
            }

            hole = cursor;
        }
    }
}

/// Erase policy that marks removed slots with a deleted state.
///
/// Two metadata bits per slot. Erase never moves entries; deleted slots keep
/// probe chains intact and are reclaimed by insertion or dropped wholesale
/// when the table grows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TombstoneErase;

impl ErasePolicy for TombstoneErase {
    const META_BITS: usize = 2;
    // Occupied is 0b01 in every 2-bit state, so the low bit of each pair
    // selects live slots.
    const OCCUPIED_SCAN_MASK: MetaWord = MetaWord::MAX / 3;

    unsafe fn erase_fixup<K, V>(
        meta: NonNull<MetaWord>,
        _keys: NonNull<MaybeUninit<K>>,
        _values: NonNull<MaybeUninit<V>>,
        _mask: usize,
        idx: usize,
        _rehash: &dyn Fn(&K) -> u64,
    ) {
        // SAFETY: `idx` is a valid slot whose entry the caller moved out.
        unsafe { set_slot_state::<Self>(meta, idx, DELETED) };
    }
}
