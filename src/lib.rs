#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod hash_map;

pub mod hash_set;

pub mod hash_table;

pub mod policy;

pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
pub use policy::BackshiftErase;
pub use policy::ErasePolicy;
pub use policy::TombstoneErase;
