//! Views are small `Copy` handles that remember the version of the container
//! they were taken from. They hold no borrow, so the container stays free to
//! change; every operation takes the container back and first checks that it
//! has not changed since, failing with [`Error::StaleVersion`] if it has.
//!
//! ```rust
//! use ordered_hash::OrderedHashMap;
//!
//! let mut map = OrderedHashMap::new();
//! map.insert("a", 1);
//! map.insert("b", 2);
//!
//! let values = map.values_view();
//! assert_eq!(values.to_vec(&map), Ok(vec![1, 2]));
//!
//! map.remove("a");
//! assert!(values.to_vec(&map).is_err());
//! assert_eq!(map.values_view().to_vec(&map), Ok(vec![2]));
//! ```

use core::borrow::Borrow;
use core::hash::BuildHasher;
use core::hash::Hash;

use alloc::vec::Vec;

use crate::error::Error;
use crate::hash_map;
use crate::hash_map::OrderedHashMap;
use crate::hash_set;
use crate::hash_set::OrderedHashSet;

/// A detached view of a map's keys, in insertion order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeysView {
    version: u64,
}

impl KeysView {
    pub(crate) fn new(version: u64) -> Self {
        Self { version }
    }

    /// The map version this view was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of keys.
    pub fn len<K, V, S>(&self, map: &OrderedHashMap<K, V, S>) -> Result<usize, Error> {
        map.check_version(self.version)?;
        Ok(map.len())
    }

    /// Returns `true` if the map has no keys.
    pub fn is_empty<K, V, S>(&self, map: &OrderedHashMap<K, V, S>) -> Result<bool, Error> {
        map.check_version(self.version)?;
        Ok(map.is_empty())
    }

    /// Returns `true` if `key` is one of the map's keys.
    pub fn contains<K, V, S, Q>(&self, map: &OrderedHashMap<K, V, S>, key: &Q) -> Result<bool, Error>
    where
        K: Hash + Eq + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: BuildHasher,
    {
        map.check_version(self.version)?;
        Ok(map.contains_key(key))
    }

    /// Iterates the keys in insertion order.
    pub fn iter<'a, K, V, S>(
        &self,
        map: &'a OrderedHashMap<K, V, S>,
    ) -> Result<hash_map::Keys<'a, K, V>, Error> {
        map.check_version(self.version)?;
        Ok(map.keys())
    }

    /// Copies the keys into a vector, in insertion order.
    pub fn to_vec<K, V, S>(&self, map: &OrderedHashMap<K, V, S>) -> Result<Vec<K>, Error>
    where
        K: Clone,
    {
        Ok(self.iter(map)?.cloned().collect())
    }
}

/// A detached view of a map's values, in insertion order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ValuesView {
    version: u64,
}

impl ValuesView {
    pub(crate) fn new(version: u64) -> Self {
        Self { version }
    }

    /// The map version this view was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of values.
    pub fn len<K, V, S>(&self, map: &OrderedHashMap<K, V, S>) -> Result<usize, Error> {
        map.check_version(self.version)?;
        Ok(map.len())
    }

    /// Returns `true` if the map has no values.
    pub fn is_empty<K, V, S>(&self, map: &OrderedHashMap<K, V, S>) -> Result<bool, Error> {
        map.check_version(self.version)?;
        Ok(map.is_empty())
    }

    /// Returns `true` if some entry holds a value equal to `value`.
    ///
    /// Values are not indexed, so this scans the map.
    pub fn contains<K, V, S>(&self, map: &OrderedHashMap<K, V, S>, value: &V) -> Result<bool, Error>
    where
        V: PartialEq,
    {
        Ok(self.iter(map)?.any(|v| v == value))
    }

    /// Iterates the values in insertion order.
    pub fn iter<'a, K, V, S>(
        &self,
        map: &'a OrderedHashMap<K, V, S>,
    ) -> Result<hash_map::Values<'a, K, V>, Error> {
        map.check_version(self.version)?;
        Ok(map.values())
    }

    /// Copies the values into a vector, in insertion order.
    pub fn to_vec<K, V, S>(&self, map: &OrderedHashMap<K, V, S>) -> Result<Vec<V>, Error>
    where
        V: Clone,
    {
        Ok(self.iter(map)?.cloned().collect())
    }
}

/// A detached view of a set's values, in insertion order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SetView {
    version: u64,
}

impl SetView {
    pub(crate) fn new(version: u64) -> Self {
        Self { version }
    }

    /// The set version this view was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of values.
    pub fn len<T, S>(&self, set: &OrderedHashSet<T, S>) -> Result<usize, Error> {
        set.check_version(self.version)?;
        Ok(set.len())
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty<T, S>(&self, set: &OrderedHashSet<T, S>) -> Result<bool, Error> {
        set.check_version(self.version)?;
        Ok(set.is_empty())
    }

    /// Returns `true` if the set contains `value`.
    pub fn contains<T, S, Q>(&self, set: &OrderedHashSet<T, S>, value: &Q) -> Result<bool, Error>
    where
        T: Hash + Eq + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: BuildHasher,
    {
        set.check_version(self.version)?;
        Ok(set.contains(value))
    }

    /// Iterates the values in insertion order.
    pub fn iter<'a, T, S>(&self, set: &'a OrderedHashSet<T, S>) -> Result<hash_set::Iter<'a, T>, Error> {
        set.check_version(self.version)?;
        Ok(set.iter())
    }

    /// Copies the values into a vector, in insertion order.
    pub fn to_vec<T, S>(&self, set: &OrderedHashSet<T, S>) -> Result<Vec<T>, Error>
    where
        T: Clone,
    {
        Ok(self.iter(set)?.cloned().collect())
    }
}
