use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::ops::Index;

use alloc::vec::Vec;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::hash_table::Cursor;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::views::KeysView;
use crate::views::ValuesView;

/// What [`OrderedHashMap::insert_with_policy`] does when the key is already
/// present.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InsertPolicy {
    /// Leave the stored value alone and drop the new one.
    KeepExisting,
    /// Replace the stored value in place. The entry keeps its position.
    OverwriteExisting,
}

/// A hash map that iterates in insertion order, built on the ordered
/// [`HashTable`].
///
/// `OrderedHashMap<K, V, S>` stores key-value pairs where keys implement
/// `Hash + Eq` and uses a configurable hasher builder `S` to hash keys.
/// Iteration, [`dump`](Self::dump) and [`Debug`] output visit entries oldest
/// first. Overwriting a value keeps its entry where it is; removing a key and
/// inserting it again moves it to the end.
///
/// Every mutation bumps the map's [`version`](Self::version), which is what
/// detached [`Cursor`]s and views check before touching the map.
///
/// # Examples
///
/// ```rust
/// use ordered_hash::OrderedHashMap;
///
/// let mut map = OrderedHashMap::new();
/// map.insert("A", 1);
/// map.insert("B", 2);
/// map.insert("C", 3);
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["A", "B", "C"]);
///
/// map.remove("B");
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["A", "C"]);
///
/// map.insert("B", 4);
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["A", "C", "B"]);
/// ```
#[derive(Clone)]
pub struct OrderedHashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for OrderedHashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for OrderedHashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    /// Maps are equal when they hold the same pairs, in any order.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(k, v)| other.get(k).is_some_and(|other_v| v == other_v))
    }
}

impl<K, V, S> Eq for OrderedHashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K, V> OrderedHashMap<K, V, DefaultHashBuilder> {
    /// Creates an empty map using the default hasher builder.
    ///
    /// Does not allocate until the first insertion.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map with room for at least `capacity` entries, using
    /// the default hasher builder.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let map: OrderedHashMap<i32, String> = OrderedHashMap::with_capacity(100);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> OrderedHashMap<K, V, S> {
    /// Creates a new map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use ordered_hash::OrderedHashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: OrderedHashMap<i32, String, _> = OrderedHashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 0);
    /// ```
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Creates a new map with room for at least `capacity` entries.
    ///
    /// The capacity is rounded up to a power of two (at least 4).
    ///
    /// # Panics
    ///
    /// Panics if the capacity exceeds [`MAX_CAPACITY`].
    ///
    /// [`MAX_CAPACITY`]: crate::hash_table::MAX_CAPACITY
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Fallible version of
    /// [`with_capacity_and_hasher`](Self::with_capacity_and_hasher).
    pub fn try_with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self, Error> {
        Ok(Self {
            table: HashTable::try_with_capacity(capacity)?,
            hash_builder,
        })
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of entries the map can hold before it grows.
    ///
    /// Always `0` or a power of two. The map never shrinks on its own.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the map's mutation version.
    pub fn version(&self) -> u64 {
        self.table.version()
    }

    pub(crate) fn check_version(&self, expected: u64) -> Result<(), Error> {
        self.table.check_version(expected)
    }

    /// Returns the underlying table, for inspecting its layout statistics.
    #[cfg(feature = "stats")]
    pub fn table(&self) -> &HashTable<(K, V)> {
        &self.table
    }

    /// Removes all entries, keeping the allocated capacity.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map = OrderedHashMap::new();
    /// map.insert(1, "a");
    /// let capacity = map.capacity();
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), capacity);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the capacity to the smallest valid size that holds the
    /// current entries. Order is preserved.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more entries.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds [`MAX_CAPACITY`].
    ///
    /// [`MAX_CAPACITY`]: crate::hash_table::MAX_CAPACITY
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Fallible version of [`reserve`](Self::reserve).
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        self.table.try_reserve(additional)
    }

    /// Returns the oldest entry.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.table.first().map(|(k, v)| (k, v))
    }

    /// Returns the newest entry.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.table.last().map(|(k, v)| (k, v))
    }

    /// Removes and returns the oldest entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.table.pop_first()
    }

    /// Removes and returns the newest entry.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.table.pop_last()
    }

    /// Removes every entry for which `pred` returns `true` and returns how
    /// many were removed. Entries are visited oldest first.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map: OrderedHashMap<i32, i32> = (0..8).map(|i| (i, i * 10)).collect();
    /// assert_eq!(map.remove_where(|k, _| k % 2 == 0), 4);
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 3, 5, 7]);
    /// ```
    pub fn remove_where(&mut self, mut pred: impl FnMut(&K, &mut V) -> bool) -> usize {
        self.table.remove_where(|(k, v)| pred(k, v))
    }

    /// Retains only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) {
        self.table.remove_where(|(k, v)| !keep(k, v));
    }

    /// Returns an iterator over the entries in insertion order.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map = OrderedHashMap::new();
    /// map.insert("b", 2);
    /// map.insert("a", 1);
    ///
    /// let pairs: Vec<_> = map.iter().collect();
    /// assert_eq!(pairs, [(&"b", &2), (&"a", &1)]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the entries in insertion order with mutable
    /// values. Bumps the version.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in insertion order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable values in insertion order. Bumps the
    /// version.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Returns an iterator that removes and yields all entries in insertion
    /// order.
    ///
    /// After calling `drain()`, the map will be empty.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Creates a detached cursor positioned before the oldest entry.
    ///
    /// See [`advance`](Self::advance).
    pub fn cursor(&self) -> Cursor {
        self.table.cursor()
    }

    /// Steps `cursor` to the next entry.
    ///
    /// Fails with [`Error::StaleVersion`] if the map was modified after the
    /// cursor was created or last reset, including value overwrites.
    ///
    /// ```rust
    /// use ordered_hash::Error;
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map = OrderedHashMap::new();
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    ///
    /// let mut cursor = map.cursor();
    /// assert_eq!(map.advance(&mut cursor), Ok(Some((&"a", &1))));
    ///
    /// map.insert("a", 10);
    /// assert!(matches!(map.advance(&mut cursor), Err(Error::StaleVersion { .. })));
    /// ```
    pub fn advance<'a>(&'a self, cursor: &mut Cursor) -> Result<Option<(&'a K, &'a V)>, Error> {
        Ok(self.table.advance(cursor)?.map(|(k, v)| (k, v)))
    }

    /// Rewinds `cursor` to the oldest entry and re-captures the version.
    pub fn reset(&self, cursor: &mut Cursor) {
        self.table.reset(cursor);
    }

    /// Returns a detached view of the keys, valid until the next mutation.
    ///
    /// ```rust
    /// use ordered_hash::Error;
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map = OrderedHashMap::new();
    /// map.insert(1, "a");
    ///
    /// let keys = map.keys_view();
    /// assert_eq!(keys.len(&map), Ok(1));
    ///
    /// map.insert(2, "b");
    /// assert!(matches!(keys.len(&map), Err(Error::StaleVersion { .. })));
    /// ```
    pub fn keys_view(&self) -> KeysView {
        KeysView::new(self.version())
    }

    /// Returns a detached view of the values, valid until the next mutation.
    pub fn values_view(&self) -> ValuesView {
        ValuesView::new(self.version())
    }

    /// Copies all entries into a vector, in insertion order.
    pub fn to_vec(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K, V, S> OrderedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Builds a map from `pairs` with a default hasher builder,
    /// failing with [`Error::DuplicateKey`] on a repeat.
    pub fn try_from_iter<I>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
    {
        Self::try_from_iter_with_hasher(pairs, S::default())
    }

    /// Builds a map from `pairs`, failing with [`Error::DuplicateKey`] if a
    /// key appears twice.
    ///
    /// Unlike [`FromIterator`], which keeps the last value for a repeated key,
    /// a repeated key here is treated as malformed input.
    ///
    /// ```rust
    /// use ordered_hash::Error;
    /// use ordered_hash::OrderedHashMap;
    /// use ordered_hash::DefaultHashBuilder;
    ///
    /// let ok = OrderedHashMap::try_from_iter_with_hasher([(1, 'a'), (2, 'b')], DefaultHashBuilder::default());
    /// assert_eq!(ok.map(|m| m.len()), Ok(2));
    ///
    /// let dup = OrderedHashMap::try_from_iter_with_hasher([(1, 'a'), (1, 'b')], DefaultHashBuilder::default());
    /// assert_eq!(dup.map(|m| m.len()), Err(Error::DuplicateKey));
    /// ```
    pub fn try_from_iter_with_hasher<I>(pairs: I, hash_builder: S) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs = pairs.into_iter();
        let mut map = Self::try_with_capacity_and_hasher(pairs.size_hint().0, hash_builder)?;
        for (key, value) in pairs {
            map.try_insert(key, value)?;
        }
        Ok(map)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, the pair is appended to the
    /// iteration order and `None` is returned. Otherwise the value is
    /// replaced in place and the old value is returned.
    ///
    /// # Panics
    ///
    /// Panics if the map is full and cannot grow past
    /// [`MAX_CAPACITY`](crate::hash_table::MAX_CAPACITY) entries. Use
    /// [`try_insert`](Self::try_insert) to get an error instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map = OrderedHashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(mut entry) => {
                let old_value = core::mem::replace(&mut entry.get_mut().1, value);
                Some(old_value)
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                None
            }
        }
    }

    /// Inserts a key-value pair, resolving an existing key with `policy`.
    ///
    /// Returns `true` iff a new entry was created.
    ///
    /// # Panics
    ///
    /// Panics if the map is full and cannot grow past
    /// [`MAX_CAPACITY`](crate::hash_table::MAX_CAPACITY) entries. Use
    /// [`try_insert`](Self::try_insert) to get an error instead.
    ///
    /// ```rust
    /// use ordered_hash::InsertPolicy;
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map = OrderedHashMap::new();
    /// assert!(map.insert_with_policy("k", 1, InsertPolicy::KeepExisting));
    /// assert!(!map.insert_with_policy("k", 2, InsertPolicy::KeepExisting));
    /// assert_eq!(map["k"], 1);
    /// assert!(!map.insert_with_policy("k", 3, InsertPolicy::OverwriteExisting));
    /// assert_eq!(map["k"], 3);
    /// ```
    pub fn insert_with_policy(&mut self, key: K, value: V, policy: InsertPolicy) -> bool {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(mut entry) => {
                if policy == InsertPolicy::OverwriteExisting {
                    entry.get_mut().1 = value;
                }
                false
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                true
            }
        }
    }

    /// Inserts a key that must not be present yet.
    ///
    /// Fails with [`Error::DuplicateKey`] and leaves the map untouched if the
    /// key exists. Fails with [`Error::CapacityOverflow`] if the map is full
    /// and cannot grow.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<&mut V, Error> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(_) => Err(Error::DuplicateKey),
            TableEntry::Vacant(entry) => Ok(&mut entry.try_insert((key, value))?.1),
        }
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
            .map(|(k, v)| (k, v))
    }

    /// Returns the value corresponding to the key, or
    /// [`Error::KeyNotFound`].
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// A successful lookup bumps the version.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map = OrderedHashMap::new();
    /// map.insert(1, "a");
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Removes a key from the map, returning its value if it was present.
    ///
    /// The remaining entries keep their order.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |(k, _)| Borrow::<Q>::borrow(k) == key)
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut counts = OrderedHashMap::new();
    /// for word in ["b", "a", "b"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.iter().collect::<Vec<_>>(), [(&"b", &2), (&"a", &1)]);
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }
}

impl<K, V, S> Default for OrderedHashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, Q, V, S> Index<&Q> for OrderedHashMap<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("{}", Error::KeyNotFound),
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Collects pairs in order; a repeated key keeps its first position and
    /// its last value.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for OrderedHashMap<K, V, S>
where
    K: Hash + Eq + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(k, v)| (*k, *v)));
    }
}

impl<K, V, S> IntoIterator for OrderedHashMap<K, V, S> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedHashMap<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut OrderedHashMap<K, V, S> {
    type IntoIter = IterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`OrderedHashMap`].
///
/// [`entry`]: OrderedHashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Appends the entry to the map and returns a mutable reference to its
    /// value.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry. Bumps the version.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value. Bumps the
    /// version.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Replaces the value in place and returns the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the entries of an `OrderedHashMap` in insertion order.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of an `OrderedHashMap`.
pub struct IterMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (&*k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of an `OrderedHashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of an `OrderedHashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of an `OrderedHashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// A draining iterator over the entries of an `OrderedHashMap`.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (K, V)>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Drain<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

impl<K, V> FusedIterator for Drain<'_, K, V> {}

/// A consuming iterator over the entries of an `OrderedHashMap`.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    fn keys_of<K: Clone, V, S>(map: &OrderedHashMap<K, V, S>) -> Vec<K> {
        map.keys().cloned().collect()
    }

    /// Every hash lands in the same bucket, so each lookup walks one chain.
    #[derive(Clone, Default)]
    struct CollidingHashBuilder;

    struct CollidingHasher;

    impl core::hash::Hasher for CollidingHasher {
        fn finish(&self) -> u64 {
            7
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    impl BuildHasher for CollidingHashBuilder {
        type Hasher = CollidingHasher;

        fn build_hasher(&self) -> Self::Hasher {
            CollidingHasher
        }
    }

    /// Checks the table structure plus the one invariant the table cannot see
    /// on its own: no two live keys compare equal.
    fn check_invariants<K: Eq, V, S>(map: &OrderedHashMap<K, V, S>) {
        map.table.check_invariants();
        let keys: Vec<&K> = map.keys().collect();
        for (i, key) in keys.iter().enumerate() {
            assert!(
                keys[i + 1..].iter().all(|other| other != key),
                "key at position {i} appears twice"
            );
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: OrderedHashMap<i32, String, SipHashBuilder> = OrderedHashMap::default();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), 0);

        let map2 = OrderedHashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.len(), 0);
    }

    #[test]
    fn test_with_capacity() {
        let map =
            OrderedHashMap::<i32, String, _>::with_capacity_and_hasher(100, SipHashBuilder::default());
        assert_eq!(map.capacity(), 128);
        assert!(map.is_empty());

        let map2 =
            OrderedHashMap::<i32, String, _>::with_capacity_and_hasher(3, SipHashBuilder::default());
        assert_eq!(map2.capacity(), 4);

        assert!(matches!(
            OrderedHashMap::<i32, String, _>::try_with_capacity_and_hasher(
                usize::MAX,
                SipHashBuilder::default()
            ),
            Err(Error::CapacityOverflow)
        ));
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());

        assert_eq!(map.insert(1, "hello".to_string()), None);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);

        assert_eq!(
            map.insert(1, "world".to_string()),
            Some("hello".to_string())
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
    }

    #[test]
    fn test_insertion_order_scenario() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert("A", 1);
        map.insert("B", 2);
        map.insert("C", 3);
        assert_eq!(keys_of(&map), ["A", "B", "C"]);

        assert_eq!(map.remove("B"), Some(2));
        assert_eq!(keys_of(&map), ["A", "C"]);

        map.insert("B", 4);
        assert_eq!(keys_of(&map), ["A", "C", "B"]);

        map.insert("A", 5);
        assert_eq!(keys_of(&map), ["A", "C", "B"]);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), [5, 3, 4]);
    }

    #[test]
    fn test_resize_keeps_order() {
        let mut map = OrderedHashMap::with_capacity_and_hasher(4, SipHashBuilder::default());
        for key in ["e", "a", "d", "b", "c"] {
            map.insert(key, ());
        }
        assert_eq!(map.capacity(), 8);
        assert_eq!(keys_of(&map), ["e", "a", "d", "b", "c"]);
    }

    #[test]
    fn test_insert_with_policy() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        assert!(map.insert_with_policy(1, "a", InsertPolicy::KeepExisting));
        assert!(map.insert_with_policy(2, "b", InsertPolicy::OverwriteExisting));

        let version = map.version();
        assert!(!map.insert_with_policy(1, "x", InsertPolicy::KeepExisting));
        assert_eq!(map[&1], "a");
        assert_eq!(map.version(), version);

        assert!(!map.insert_with_policy(1, "y", InsertPolicy::OverwriteExisting));
        assert_eq!(map[&1], "y");
        assert_ne!(map.version(), version);
        assert_eq!(keys_of(&map), [1, 2]);
    }

    #[test]
    fn test_try_insert() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        *map.try_insert(1, 10).unwrap() += 1;
        assert_eq!(map.get(&1), Some(&11));

        let version = map.version();
        assert_eq!(map.try_insert(1, 20), Err(Error::DuplicateKey));
        assert_eq!(map.get(&1), Some(&11));
        assert_eq!(map.version(), version);
    }

    #[test]
    fn test_try_insert_grows_full_map() {
        let mut map = OrderedHashMap::with_capacity_and_hasher(4, SipHashBuilder::default());
        for i in 0..4 {
            map.try_insert(i, i * 10).unwrap();
        }
        assert_eq!(map.capacity(), 4);

        assert_eq!(map.try_insert(4, 40), Ok(&mut 40));
        assert_eq!(map.capacity(), 8);
        assert!(map.keys().copied().eq(0..5));
        check_invariants(&map);
    }

    #[test]
    fn test_single_chain_keeps_keys_unique() {
        let mut map = OrderedHashMap::with_hasher(CollidingHashBuilder);
        for round in 0..3 {
            for i in 0..40 {
                map.insert(i, i + round);
            }
            for i in (0..40).step_by(3) {
                map.remove(&i);
            }
            for i in 0..40 {
                if map.contains_key(&i) {
                    assert_eq!(map.try_insert(i, 0), Err(Error::DuplicateKey));
                }
            }
            check_invariants(&map);
        }
        assert_eq!(map.len(), 40 - (0..40).step_by(3).count());
    }

    #[test]
    fn test_try_get_and_index() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert("k".to_string(), 3);
        assert_eq!(map.try_get("k"), Ok(&3));
        assert_eq!(map.try_get("missing"), Err(Error::KeyNotFound));
        assert_eq!(map["k"], 3);
    }

    #[test]
    #[should_panic(expected = "key not present in the container")]
    fn test_index_missing_key_panics() {
        let map: OrderedHashMap<i32, i32, SipHashBuilder> = OrderedHashMap::default();
        let _ = map[&1];
    }

    #[test]
    fn test_get_mut() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), Some(&"hello world".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        assert!(!map.contains_key(&1));

        map.insert(1, "value".to_string());
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_remove() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());
        map.insert(2, "world".to_string());

        assert_eq!(map.remove(&1), Some("hello".to_string()));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));

        assert_eq!(map.remove(&1), None);
        assert_eq!(map.remove(&3), None);
    }

    #[test]
    fn test_remove_entry() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        assert_eq!(map.remove_entry(&1), Some((1, "hello".to_string())));
        assert_eq!(map.len(), 0);
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn test_remove_where_and_retain() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        for i in 0..10 {
            map.insert(i, i * 10);
        }
        assert_eq!(map.remove_where(|k, _| k % 3 == 0), 4);
        assert_eq!(keys_of(&map), [1, 2, 4, 5, 7, 8]);

        map.retain(|_, v| {
            *v += 1;
            *v > 50
        });
        assert_eq!(map.iter().collect::<Vec<_>>(), [(&5, &51), (&7, &71), (&8, &81)]);
    }

    #[test]
    fn test_clear() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());
        map.insert(2, "world".to_string());
        let capacity = map.capacity();

        assert_eq!(map.len(), 2);
        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert!(!map.contains_key(&1));
        assert!(!map.contains_key(&2));
        assert_eq!(map.capacity(), capacity);
    }

    #[test]
    fn test_reserve() {
        let mut map = OrderedHashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        let initial_capacity = map.capacity();

        map.reserve(1000);
        assert!(map.capacity() >= initial_capacity + 1000);
        assert!(map.capacity().is_power_of_two());
        assert_eq!(map.try_reserve(usize::MAX), Err(Error::CapacityOverflow));
    }

    #[test]
    fn test_shrink_to_fit_keeps_order() {
        let mut map = OrderedHashMap::with_capacity_and_hasher(256, SipHashBuilder::default());
        for i in (0..20).rev() {
            map.insert(i, i);
        }
        map.retain(|k, _| k % 4 == 0);
        map.shrink_to_fit();
        assert_eq!(map.capacity(), 8);
        assert_eq!(keys_of(&map), [16, 12, 8, 4, 0]);
    }

    #[test]
    fn test_entry_api() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());

        let value = map.entry(1).or_insert("hello".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        let value = map.entry(1).or_insert("world".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        map.entry(2).or_insert_with(|| "computed".to_string());
        assert_eq!(map.get(&2), Some(&"computed".to_string()));

        map.entry(1)
            .and_modify(|v| v.push_str(" world"))
            .or_insert("default".to_string());
        assert_eq!(map.get(&1), Some(&"hello world".to_string()));

        assert_eq!(map.entry(3).key(), &3);
        assert_eq!(keys_of(&map), [1, 2]);
    }

    #[test]
    fn test_entry_or_default() {
        let mut map: OrderedHashMap<i32, Vec<i32>, SipHashBuilder> =
            OrderedHashMap::with_hasher(SipHashBuilder::default());

        map.entry(1).or_default().push(42);
        assert_eq!(map.get(&1), Some(&vec![42]));

        map.entry(1).or_default().push(24);
        assert_eq!(map.get(&1), Some(&vec![42, 24]));
    }

    #[test]
    fn test_occupied_entry() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"hello".to_string());

                *entry.get_mut() = "world".to_string();
                assert_eq!(entry.get(), &"world".to_string());

                let old_value = entry.insert("new".to_string());
                assert_eq!(old_value, "world".to_string());
                assert_eq!(entry.get(), &"new".to_string());

                let (key, value) = entry.remove_entry();
                assert_eq!(key, 1);
                assert_eq!(value, "new".to_string());
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_vacant_entry() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);

                let value = entry.insert("hello".to_string());
                assert_eq!(value, &"hello".to_string());
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"hello".to_string()));

        match map.entry(2) {
            Entry::Vacant(entry) => assert_eq!(entry.into_key(), 2),
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_iterators() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(3, "three".to_string());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());

        let pairs: Vec<(i32, String)> = map.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(
            pairs,
            [
                (3, "three".to_string()),
                (1, "one".to_string()),
                (2, "two".to_string())
            ]
        );
        assert_eq!(map.iter().len(), 3);
        assert_eq!(keys_of(&map), [3, 1, 2]);
        assert_eq!(map.keys().rev().copied().collect::<Vec<_>>(), [2, 1, 3]);
        assert_eq!(
            map.values().cloned().collect::<Vec<_>>(),
            ["three", "one", "two"]
        );

        for value in map.values_mut() {
            value.make_ascii_uppercase();
        }
        for (k, v) in &mut map {
            v.push_str(&k.to_string());
        }
        assert_eq!(map.to_vec()[0], (3, "THREE3".to_string()));

        let owned: Vec<(i32, String)> = map.into_iter().collect();
        assert_eq!(
            owned,
            [
                (3, "THREE3".to_string()),
                (1, "ONE1".to_string()),
                (2, "TWO2".to_string())
            ]
        );
    }

    #[test]
    fn test_first_last_pop() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        assert_eq!(map.first(), None);
        for i in 1..=3 {
            map.insert(i, i * 100);
        }
        assert_eq!(map.first(), Some((&1, &100)));
        assert_eq!(map.last(), Some((&3, &300)));
        assert_eq!(map.pop_last(), Some((3, 300)));
        assert_eq!(map.pop_first(), Some((1, 100)));
        assert_eq!(keys_of(&map), [2]);
    }

    #[test]
    fn test_drain() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());

        let drained: Vec<(i32, String)> = map.drain().collect();
        assert!(map.is_empty());
        assert_eq!(
            drained,
            [
                (1, "one".to_string()),
                (2, "two".to_string()),
                (3, "three".to_string())
            ]
        );
    }

    #[test]
    fn test_cursor() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert('x', 1);
        map.insert('y', 2);

        let mut cursor = map.cursor();
        assert_eq!(map.advance(&mut cursor), Ok(Some((&'x', &1))));
        assert_eq!(map.advance(&mut cursor), Ok(Some((&'y', &2))));
        assert_eq!(map.advance(&mut cursor), Ok(None));

        map.reset(&mut cursor);
        map.remove(&'x');
        assert!(matches!(
            map.advance(&mut cursor),
            Err(Error::StaleVersion { .. })
        ));

        map.reset(&mut cursor);
        *map.get_mut(&'y').unwrap() = 5;
        assert!(map.advance(&mut cursor).is_err());

        map.reset(&mut cursor);
        assert_eq!(map.advance(&mut cursor), Ok(Some((&'y', &5))));
    }

    #[test]
    fn test_try_from_iter() {
        let map = OrderedHashMap::try_from_iter_with_hasher(
            [(3, 'c'), (1, 'a'), (2, 'b')],
            SipHashBuilder::default(),
        )
        .unwrap();
        assert_eq!(keys_of(&map), [3, 1, 2]);

        let err = OrderedHashMap::try_from_iter_with_hasher(
            [(3, 'c'), (1, 'a'), (3, 'z')],
            SipHashBuilder::default(),
        );
        assert_eq!(err.err(), Some(Error::DuplicateKey));

        let map = OrderedHashMap::<i32, char, SipHashBuilder>::try_from_iter([(1, 'a')]);
        assert_eq!(map.map(|m| m.len()), Ok(1));
    }

    #[test]
    fn test_from_iter_and_extend() {
        let mut map: OrderedHashMap<i32, i32, SipHashBuilder> =
            [(2, 20), (1, 10), (2, 21)].into_iter().collect();
        assert_eq!(map.iter().collect::<Vec<_>>(), [(&2, &21), (&1, &10)]);

        map.extend([(&5, &50), (&1, &11)]);
        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            [(&2, &21), (&1, &11), (&5, &50)]
        );
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut a = OrderedHashMap::with_hasher(SipHashBuilder::default());
        let mut b = OrderedHashMap::with_hasher(SipHashBuilder::default());
        a.insert(1, 'a');
        a.insert(2, 'b');
        b.insert(2, 'b');
        b.insert(1, 'a');
        assert_eq!(a, b);

        b.insert(1, 'z');
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_in_order() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(2, "b");
        map.insert(1, "a");
        assert_eq!(format!("{map:?}"), r#"{2: "b", 1: "a"}"#);
    }

    #[test]
    fn test_cardinality_bookkeeping() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        let mut created = 0usize;
        let mut removed = 0usize;
        for i in 0..300u32 {
            if map.insert_with_policy(i % 97, i, InsertPolicy::OverwriteExisting) {
                created += 1;
            }
            if i % 5 == 0 && map.remove(&(i % 89)).is_some() {
                removed += 1;
            }
            assert_eq!(map.len(), created - removed);
        }
        check_invariants(&map);
    }

    #[test]
    fn test_multiple_insertions() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());

        for i in 0..100 {
            map.insert(i, format!("value_{}", i));
        }

        assert_eq!(map.len(), 100);

        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&format!("value_{}", i)));
        }
        assert!(map.keys().copied().eq(0..100));
    }

    #[test]
    fn test_collision_handling() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());

        for i in 0..1000 {
            map.insert(i, i * 2);
        }

        assert_eq!(map.len(), 1000);

        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }

        for i in (0..1000).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * 2));
        }

        assert_eq!(map.len(), 500);

        for i in (1..1000).step_by(2) {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
        assert!(map.keys().copied().eq((1..1000).step_by(2)));
        check_invariants(&map);
    }

    #[test]
    fn test_string_keys() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());

        map.insert("hello".to_string(), 1);
        map.insert("world".to_string(), 2);
        map.insert("rust".to_string(), 3);

        assert_eq!(map.get("hello"), Some(&1));
        assert_eq!(map.get("world"), Some(&2));
        assert_eq!(map.get("rust"), Some(&3));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn test_complex_values() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());

        let vec1 = vec![1, 2, 3];
        let vec2 = vec![4, 5, 6];

        map.insert("first".to_string(), vec1.clone());
        map.insert("second".to_string(), vec2.clone());

        assert_eq!(map.get("first"), Some(&vec1));
        assert_eq!(map.get("second"), Some(&vec2));

        if let Some(v) = map.get_mut("first") {
            v.push(4);
        }

        assert_eq!(map.get("first"), Some(&vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut map = OrderedHashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, 1);
        map.insert(2, 2);
        let cloned = map.clone();
        map.remove(&1);
        assert_eq!(keys_of(&cloned), [1, 2]);
        assert_eq!(keys_of(&map), [2]);
    }
}
