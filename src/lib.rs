#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;

/// An insertion-ordered hash map.
///
/// This module provides [`OrderedHashMap`], which wraps the `HashTable` and
/// provides a standard key-value map interface with configurable hashers.
pub mod hash_map;

/// An insertion-ordered hash set.
///
/// This module provides [`OrderedHashSet`], which wraps the `HashTable` and
/// provides a standard set interface with configurable hashers.
pub mod hash_set;

pub mod hash_table;

/// Order-preserving dumps of maps and sets, and restoring from them.
pub mod snapshot;

pub mod views;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is named.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is named.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder hasher builder for builds without a default hasher.
        ///
        /// It has no values, so a container using it cannot be created; name
        /// a hasher builder explicitly instead.
        pub enum DefaultHashBuilder {}
    }
}

pub use error::Error;
pub use hash_map::Entry;
pub use hash_map::InsertPolicy;
pub use hash_map::OrderedHashMap;
pub use hash_set::OrderedHashSet;
pub use hash_table::Cursor;
pub use hash_table::HashTable;
pub use snapshot::MapDump;
pub use snapshot::SetDump;
pub use views::KeysView;
pub use views::SetView;
pub use views::ValuesView;
