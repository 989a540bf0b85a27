//! The insertion-ordered hash table shared by [`OrderedHashMap`] and
//! [`OrderedHashSet`].
//!
//! All state lives in two parallel arrays: a bucket table of chain heads and
//! an arena of slots. Every relationship between slots (bucket chains, the
//! insertion-order spine and the freelist) is an index into the arena, so
//! removal and reuse only patch integers.
//!
//! [`OrderedHashMap`]: crate::OrderedHashMap
//! [`OrderedHashSet`]: crate::OrderedHashSet

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::error::Error;

/// Largest number of slots a table will allocate.
///
/// Links are stored as `u32` with `u32::MAX` reserved as the "none" marker,
/// and capacities are powers of two, so `1 << 31` is the largest usable size.
pub const MAX_CAPACITY: usize = 1 << 31;

/// Capacity of the first allocation and the floor for every later one.
const MIN_CAPACITY: usize = 4;

/// An index into the slot arena, or [`Link::NONE`].
#[derive(Clone, Copy, PartialEq, Eq)]
struct Link(u32);

impl Link {
    const NONE: Link = Link(u32::MAX);

    #[inline(always)]
    fn at(index: usize) -> Self {
        debug_assert!(index < MAX_CAPACITY);
        Link(index as u32)
    }

    #[inline(always)]
    fn get(self) -> Option<usize> {
        if self == Self::NONE {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

impl Debug for Link {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.get() {
            Some(index) => write!(f, "{index}"),
            None => f.write_str("-"),
        }
    }
}

/// What precedes a slot in its bucket chain.
///
/// Removal patches exactly one of these, so the tag has to say which without
/// another lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChainPrev {
    /// The slot is the chain head of this bucket.
    Bucket(u32),
    /// The slot follows this slot in the chain.
    Slot(u32),
}

#[derive(Clone)]
struct Slot<T> {
    /// Next slot in the bucket chain, or next free slot when vacant.
    bucket_next: Link,
    bucket_prev: ChainPrev,
    iter_next: Link,
    iter_prev: Link,
    hash: u64,
    /// `None` iff the slot is on the freelist.
    value: Option<T>,
}

impl<T> Slot<T> {
    #[inline(always)]
    fn vacant(next_free: Link) -> Self {
        Slot {
            bucket_next: next_free,
            bucket_prev: ChainPrev::Bucket(u32::MAX),
            iter_next: Link::NONE,
            iter_prev: Link::NONE,
            hash: 0,
            value: None,
        }
    }
}

/// Rounds a requested slot count up to a valid table capacity.
///
/// Valid capacities are `0` and powers of two no smaller than
/// [`MIN_CAPACITY`].
fn capacity_for(requested: usize) -> Result<usize, Error> {
    if requested == 0 {
        return Ok(0);
    }
    let capacity = requested
        .checked_next_power_of_two()
        .ok_or(Error::CapacityOverflow)?
        .max(MIN_CAPACITY);
    if capacity > MAX_CAPACITY {
        return Err(Error::CapacityOverflow);
    }
    Ok(capacity)
}

/// The capacity a full table of `current` slots grows to.
fn grown_capacity(current: usize) -> Result<usize, Error> {
    capacity_for(current + 1)
}

/// Builds a fully vacant arena whose freelist runs `start..capacity` in
/// ascending order.
fn push_vacant<T>(slots: &mut Vec<Slot<T>>, start: usize, capacity: usize) {
    for index in start..capacity {
        let next = if index + 1 < capacity {
            Link::at(index + 1)
        } else {
            Link::NONE
        };
        slots.push(Slot::vacant(next));
    }
}

/// Debug statistics for hash table analysis.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries.
    pub populated: usize,
    /// Number of slots in the arena.
    pub capacity: usize,
    /// Number of slots on the freelist.
    pub free_slots: usize,
    /// Number of buckets whose chain is empty.
    pub empty_buckets: usize,
    /// Length of the longest bucket chain.
    pub longest_chain: usize,
    /// Load factor (populated / capacity).
    pub load_factor: f64,
    /// Total memory in bytes used by the bucket table and arena.
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Ordered Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!("Free slots: {}", self.free_slots);
        println!(
            "Buckets: {} empty, longest chain {}",
            self.empty_buckets, self.longest_chain
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// A hash table that iterates in insertion order.
///
/// `HashTable<T>` stores values of type `T`. Like other raw tables, it does
/// not hash anything itself: every operation takes the value's hash and an
/// equality predicate. The hash is cached per entry, so the table never asks
/// for it again, not even when it grows.
///
/// Iteration walks a doubly-linked spine through the live entries, oldest
/// first. Overwriting an entry in place keeps its position; removing it and
/// inserting it again moves it to the end.
///
/// Every mutation bumps a version counter. A [`Cursor`] remembers the version
/// it was created with and refuses to advance once the table has changed.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use ordered_hash::hash_table::Entry;
/// # use ordered_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_str(s: &str) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     s.hash(&mut hasher);
/// #     hasher.finish()
/// # }
/// #
/// let mut table = HashTable::with_capacity(4);
/// for name in ["carol", "alice", "bob"] {
///     match table.entry(hash_str(name), |s: &String| s == name) {
///         Entry::Vacant(entry) => {
///             entry.insert(name.to_string());
///         }
///         Entry::Occupied(_) => unreachable!(),
///     }
/// }
///
/// let names: Vec<&str> = table.iter().map(String::as_str).collect();
/// assert_eq!(names, ["carol", "alice", "bob"]);
/// ```
#[derive(Clone)]
pub struct HashTable<T> {
    buckets: Vec<Link>,
    slots: Vec<Slot<T>>,

    populated: usize,
    head: Link,
    tail: Link,
    free: Link,

    version: u64,
}

impl<T> Debug for HashTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let chains = (0..self.buckets.len())
            .map(|bucket| self.chain(bucket).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let spine = self.spine().collect::<Vec<_>>();

        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("capacity", &self.capacity())
            .field("version", &self.version)
            .field("chains", &chains)
            .field("spine", &spine)
            .field("free", &self.free)
            .finish()
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table without allocating.
    pub const fn new() -> Self {
        HashTable {
            buckets: Vec::new(),
            slots: Vec::new(),
            populated: 0,
            head: Link::NONE,
            tail: Link::NONE,
            free: Link::NONE,
            version: 0,
        }
    }

    /// Creates a new table able to hold at least `capacity` entries without
    /// growing.
    ///
    /// The capacity is rounded up to a power of two, and to at least 4 when
    /// non-zero.
    ///
    /// # Panics
    ///
    /// Panics if the rounded capacity exceeds [`MAX_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ordered_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    ///
    /// let table: HashTable<String> = HashTable::with_capacity(1);
    /// assert_eq!(table.capacity(), 4);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible version of [`with_capacity`](Self::with_capacity).
    pub fn try_with_capacity(capacity: usize) -> Result<Self, Error> {
        let capacity = capacity_for(capacity)?;
        let mut table = Self::new();
        if capacity > 0 {
            table.buckets = vec![Link::NONE; capacity];
            table.slots = Vec::with_capacity(capacity);
            push_vacant(&mut table.slots, 0, capacity);
            table.free = Link::at(0);
        }
        Ok(table)
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of slots in the arena.
    ///
    /// This is always `0` or a power of two no smaller than 4. It only grows
    /// on its own; use [`shrink_to_fit`](Self::shrink_to_fit) to release
    /// memory.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the current mutation version.
    ///
    /// The version changes on every insertion, removal, clear, resize and
    /// every mutable access to a stored value.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Fails with [`Error::StaleVersion`] unless `expected` is the current
    /// version.
    pub fn check_version(&self, expected: u64) -> Result<(), Error> {
        if self.version == expected {
            Ok(())
        } else {
            Err(Error::StaleVersion {
                expected,
                found: self.version,
            })
        }
    }

    fn value_at(&mut self, index: usize) -> &mut T {
        match self.slots[index].value.as_mut() {
            Some(value) => value,
            None => unreachable!("slot {index} was just filled"),
        }
    }

    #[inline(always)]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u64) -> usize {
        debug_assert!(self.buckets.len().is_power_of_two());
        hash as usize & (self.buckets.len() - 1)
    }

    /// Slot indices of one bucket chain, head first.
    fn chain(&self, bucket: usize) -> impl Iterator<Item = usize> + '_ {
        core::iter::successors(self.buckets[bucket].get(), move |&index| {
            self.slots[index].bucket_next.get()
        })
    }

    /// Slot indices of the iteration spine, oldest first.
    fn spine(&self) -> impl Iterator<Item = usize> + '_ {
        core::iter::successors(self.head.get(), move |&index| {
            self.slots[index].iter_next.get()
        })
    }

    fn find_index(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<usize> {
        if self.populated == 0 {
            return None;
        }

        let mut cursor = self.buckets[self.bucket_index(hash)];
        while let Some(index) = cursor.get() {
            let slot = &self.slots[index];
            if slot.hash == hash {
                if let Some(value) = &slot.value {
                    if eq(value) {
                        return Some(index);
                    }
                }
            }
            cursor = slot.bucket_next;
        }

        None
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use ordered_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// let hash = hash_str("key");
    /// table
    ///     .entry(hash, |s: &String| s == "key")
    ///     .or_insert("key".to_string());
    ///
    /// assert_eq!(table.find(hash, |s| s == "key"), Some(&"key".to_string()));
    /// assert_eq!(table.find(hash_str("missing"), |s| s == "missing"), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&T> {
        let index = self.find_index(hash, eq)?;
        self.slots[index].value.as_ref()
    }

    /// Finds a value by hash and equality predicate and returns a mutable
    /// reference to it.
    ///
    /// A successful lookup counts as a mutation and bumps the version.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&mut T> {
        let index = self.find_index(hash, eq)?;
        self.bump_version();
        self.slots[index].value.as_mut()
    }

    /// Gets the entry for a hash and equality predicate for in-place
    /// manipulation.
    ///
    /// Looking up an entry does not change the table; the version only moves
    /// once the entry is inserted, overwritten or removed.
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Entry<'_, T> {
        match self.find_index(hash, eq) {
            Some(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            None => Entry::Vacant(VacantEntry { table: self, hash }),
        }
    }

    /// Removes and returns the value matching the hash and predicate.
    ///
    /// The freed slot goes back on the freelist; the positions of all other
    /// entries are untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use ordered_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// for key in ["a", "b", "c"] {
    ///     table
    ///         .entry(hash_str(key), |s: &String| s == key)
    ///         .or_insert(key.to_string());
    /// }
    ///
    /// assert_eq!(table.remove(hash_str("b"), |s| s == "b"), Some("b".to_string()));
    /// assert_eq!(table.remove(hash_str("b"), |s| s == "b"), None);
    ///
    /// let rest: Vec<&str> = table.iter().map(String::as_str).collect();
    /// assert_eq!(rest, ["a", "c"]);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.find_index(hash, eq)?;
        Some(self.remove_index(index))
    }

    /// Removes every entry for which `pred` returns `true`, visiting entries
    /// in iteration order, and returns how many were removed.
    ///
    /// `pred` sees each value mutably, so a non-empty table always has its
    /// version bumped.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&mut T) -> bool) -> usize {
        if self.populated == 0 {
            return 0;
        }
        self.bump_version();

        let mut removed = 0;
        let mut cursor = self.head;
        while let Some(index) = cursor.get() {
            // The successor must be read before `index` is unlinked.
            cursor = self.slots[index].iter_next;
            let matched = match self.slots[index].value.as_mut() {
                Some(value) => pred(value),
                None => false,
            };
            if matched {
                drop(self.remove_index(index));
                removed += 1;
            }
        }
        removed
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        self.remove_where(|value| !keep(value));
    }

    /// Removes all entries while keeping the allocated capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ordered_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.entry(1, |v: &u32| *v == 1).or_insert(1);
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn clear(&mut self) {
        self.bump_version();
        if self.slots.is_empty() {
            return;
        }

        self.buckets.fill(Link::NONE);
        let capacity = self.slots.len();
        // Dropping the old slots here releases every stored value at once.
        self.slots.clear();
        push_vacant(&mut self.slots, 0, capacity);

        self.populated = 0;
        self.head = Link::NONE;
        self.tail = Link::NONE;
        self.free = Link::at(0);
    }

    /// Reserves room for at least `additional` more entries.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity would exceed [`MAX_CAPACITY`].
    pub fn reserve(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve(additional) {
            panic!("{err}");
        }
    }

    /// Fallible version of [`reserve`](Self::reserve).
    ///
    /// On error the table is left untouched.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        let required = self
            .populated
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow)?;
        if required <= self.capacity() {
            return Ok(());
        }

        let capacity = capacity_for(required)?;
        log::trace!(
            "reserving {additional} entries: {} -> {capacity} slots",
            self.capacity()
        );
        self.rehash(capacity);
        Ok(())
    }

    /// Shrinks the table to the smallest valid capacity that holds its
    /// entries, keeping their order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ordered_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(100);
    /// table.entry(1, |v: &u32| *v == 1).or_insert(1);
    /// table.shrink_to_fit();
    /// assert_eq!(table.capacity(), 4);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        let capacity = match capacity_for(self.populated) {
            Ok(capacity) => capacity,
            Err(_) => return,
        };
        if capacity < self.capacity() {
            log::trace!("shrinking: {} -> {capacity} slots", self.capacity());
            self.rehash(capacity);
        }
    }

    /// Returns the oldest entry.
    pub fn first(&self) -> Option<&T> {
        self.slots.get(self.head.get()?)?.value.as_ref()
    }

    /// Returns the newest entry.
    pub fn last(&self) -> Option<&T> {
        self.slots.get(self.tail.get()?)?.value.as_ref()
    }

    /// Removes and returns the oldest entry.
    pub fn pop_first(&mut self) -> Option<T> {
        let index = self.head.get()?;
        Some(self.remove_index(index))
    }

    /// Removes and returns the newest entry.
    pub fn pop_last(&mut self) -> Option<T> {
        let index = self.tail.get()?;
        Some(self.remove_index(index))
    }

    /// Returns an iterator over the values in insertion order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ordered_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(4);
    /// for v in [30u32, 10, 20] {
    ///     table.entry(v as u64, |x: &u32| *x == v).or_insert(v);
    /// }
    /// assert_eq!(table.iter().copied().collect::<Vec<_>>(), [30, 10, 20]);
    /// assert_eq!(table.iter().rev().copied().collect::<Vec<_>>(), [20, 10, 30]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
            remaining: self.populated,
        }
    }

    /// Returns an iterator yielding mutable references in insertion order.
    ///
    /// Bumps the version.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.bump_version();
        IterMut {
            slots: self.slots.as_mut_ptr(),
            front: self.head,
            back: self.tail,
            remaining: self.populated,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator that removes and yields all values in insertion
    /// order.
    ///
    /// After calling `drain()`, the table will be empty, even if the iterator
    /// is dropped before it is exhausted. The capacity is kept.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { table: self }
    }

    /// Creates a detached cursor positioned before the oldest entry.
    ///
    /// The cursor does not borrow the table. It can be advanced with
    /// [`advance`](Self::advance) for as long as the table is not modified;
    /// after any modification it fails with [`Error::StaleVersion`] until it
    /// is [`reset`](Self::reset).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ordered_hash::Error;
    /// # use ordered_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(4);
    /// table.entry(1, |v: &u32| *v == 1).or_insert(1);
    /// table.entry(2, |v: &u32| *v == 2).or_insert(2);
    ///
    /// let mut cursor = table.cursor();
    /// assert_eq!(table.advance(&mut cursor), Ok(Some(&1)));
    ///
    /// table.entry(3, |v: &u32| *v == 3).or_insert(3);
    /// assert!(matches!(
    ///     table.advance(&mut cursor),
    ///     Err(Error::StaleVersion { .. })
    /// ));
    ///
    /// table.reset(&mut cursor);
    /// assert_eq!(table.advance(&mut cursor), Ok(Some(&1)));
    /// ```
    pub fn cursor(&self) -> Cursor {
        Cursor {
            version: self.version,
            next: self.head,
        }
    }

    /// Steps `cursor` to the next entry in insertion order.
    ///
    /// Returns `Ok(None)` once every entry has been visited.
    pub fn advance<'a>(&'a self, cursor: &mut Cursor) -> Result<Option<&'a T>, Error> {
        self.check_version(cursor.version)?;
        let Some(index) = cursor.next.get() else {
            return Ok(None);
        };
        let Some(slot) = self.slots.get(index) else {
            return Ok(None);
        };
        cursor.next = slot.iter_next;
        Ok(slot.value.as_ref())
    }

    /// Rewinds `cursor` to the oldest entry and re-captures the version.
    pub fn reset(&self, cursor: &mut Cursor) {
        *cursor = self.cursor();
    }

    /// Links `value` as a new entry and returns its slot index.
    ///
    /// The caller guarantees no equal entry is present.
    ///
    /// # Panics
    ///
    /// Panics if the table is full and cannot grow past [`MAX_CAPACITY`].
    fn insert_new(&mut self, hash: u64, value: T) -> usize {
        match self.try_insert_new(hash, value) {
            Ok(index) => index,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like `insert_new`, but reports `CapacityOverflow` instead of
    /// panicking. The table is unchanged on error.
    fn try_insert_new(&mut self, hash: u64, value: T) -> Result<usize, Error> {
        let index = loop {
            match self.free.get() {
                Some(index) => break index,
                // Growing rebuilds every array, so the slot is looked up again
                // against the new freelist.
                None => self.try_grow()?,
            }
        };

        let bucket = self.bucket_index(hash);
        self.free = self.slots[index].bucket_next;

        let chain_head = self.buckets[bucket];
        if let Some(head) = chain_head.get() {
            self.slots[head].bucket_prev = ChainPrev::Slot(index as u32);
        }
        self.buckets[bucket] = Link::at(index);

        let tail = self.tail;
        match tail.get() {
            Some(tail) => self.slots[tail].iter_next = Link::at(index),
            None => self.head = Link::at(index),
        }
        self.tail = Link::at(index);

        self.slots[index] = Slot {
            bucket_next: chain_head,
            bucket_prev: ChainPrev::Bucket(bucket as u32),
            iter_next: Link::NONE,
            iter_prev: tail,
            hash,
            value: Some(value),
        };

        self.populated += 1;
        self.bump_version();
        Ok(index)
    }

    /// Unlinks a live slot from its chain and the spine, returns its value and
    /// pushes the slot onto the freelist.
    fn remove_index(&mut self, index: usize) -> T {
        let slot = core::mem::replace(&mut self.slots[index], Slot::vacant(self.free));
        self.free = Link::at(index);

        match slot.bucket_prev {
            ChainPrev::Bucket(bucket) => self.buckets[bucket as usize] = slot.bucket_next,
            ChainPrev::Slot(prev) => self.slots[prev as usize].bucket_next = slot.bucket_next,
        }
        if let Some(next) = slot.bucket_next.get() {
            self.slots[next].bucket_prev = slot.bucket_prev;
        }

        match slot.iter_prev.get() {
            Some(prev) => self.slots[prev].iter_next = slot.iter_next,
            None => self.head = slot.iter_next,
        }
        match slot.iter_next.get() {
            Some(next) => self.slots[next].iter_prev = slot.iter_prev,
            None => self.tail = slot.iter_prev,
        }

        self.populated -= 1;
        self.bump_version();

        match slot.value {
            Some(value) => value,
            None => unreachable!("slot {index} on the spine has no value"),
        }
    }

    #[cold]
    #[inline(never)]
    fn try_grow(&mut self) -> Result<(), Error> {
        let capacity = grown_capacity(self.capacity())?;
        log::trace!("growing: {} -> {capacity} slots", self.capacity());
        self.rehash(capacity);
        Ok(())
    }

    /// Rebuilds the table with `capacity` slots.
    ///
    /// Entries are moved in spine order to dense indices `0..len`, so the new
    /// spine is contiguous and iteration order is unchanged. The remaining
    /// slots form the new freelist.
    fn rehash(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.populated);
        debug_assert!(capacity == 0 || capacity.is_power_of_two());

        let mut old_slots = core::mem::take(&mut self.slots);
        let mut buckets = vec![Link::NONE; capacity];
        let mut slots: Vec<Slot<T>> = Vec::with_capacity(capacity);

        let mut cursor = self.head;
        while let Some(old_index) = cursor.get() {
            let old = core::mem::replace(&mut old_slots[old_index], Slot::vacant(Link::NONE));
            cursor = old.iter_next;

            let index = slots.len();
            let bucket = old.hash as usize & (capacity - 1);
            let chain_head = buckets[bucket];
            if let Some(head) = chain_head.get() {
                slots[head].bucket_prev = ChainPrev::Slot(index as u32);
            }
            buckets[bucket] = Link::at(index);

            let iter_prev = match index.checked_sub(1) {
                Some(prev) => {
                    slots[prev].iter_next = Link::at(index);
                    Link::at(prev)
                }
                None => Link::NONE,
            };

            slots.push(Slot {
                bucket_next: chain_head,
                bucket_prev: ChainPrev::Bucket(bucket as u32),
                iter_next: Link::NONE,
                iter_prev,
                hash: old.hash,
                value: old.value,
            });
        }

        let live = slots.len();
        debug_assert_eq!(live, self.populated);
        push_vacant(&mut slots, live, capacity);

        self.head = if live > 0 { Link::at(0) } else { Link::NONE };
        self.tail = if live > 0 {
            Link::at(live - 1)
        } else {
            Link::NONE
        };
        self.free = if live < capacity {
            Link::at(live)
        } else {
            Link::NONE
        };
        self.buckets = buckets;
        self.slots = slots;
        self.bump_version();
    }

    /// Returns a histogram of bucket chain lengths: entry `n` counts the
    /// buckets whose chain holds `n` entries.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_length_histogram(&self) -> Vec<usize> {
        let mut histogram = Vec::new();
        for bucket in 0..self.buckets.len() {
            let length = self.chain(bucket).count();
            if histogram.len() <= length {
                histogram.resize(length + 1, 0);
            }
            histogram[length] += 1;
        }
        histogram
    }

    /// Collects statistics about the table's layout.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.chain_length_histogram();
        let free_slots =
            core::iter::successors(self.free.get(), |&index| self.slots[index].bucket_next.get())
                .count();

        DebugStats {
            populated: self.populated,
            capacity: self.capacity(),
            free_slots,
            empty_buckets: histogram.first().copied().unwrap_or(0),
            longest_chain: histogram.len().saturating_sub(1),
            load_factor: if self.capacity() == 0 {
                0.0
            } else {
                self.populated as f64 / self.capacity() as f64
            },
            total_bytes: self.buckets.len() * core::mem::size_of::<Link>()
                + self.slots.len() * core::mem::size_of::<Slot<T>>(),
        }
    }

    /// Prints the chain length histogram.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        println!("=== Chain Length Histogram ===");
        for (length, count) in self.chain_length_histogram().iter().enumerate() {
            if *count > 0 {
                println!("{length:3}: {count}");
            }
        }
    }

    /// Walks every structure and panics if an invariant does not hold.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let capacity = self.capacity();
        assert_eq!(self.buckets.len(), capacity);
        assert!(capacity == 0 || (capacity.is_power_of_two() && capacity >= MIN_CAPACITY));

        let mut on_chain = vec![false; capacity];
        for bucket in 0..capacity {
            let mut expected_prev = ChainPrev::Bucket(bucket as u32);
            for index in self.chain(bucket) {
                let slot = &self.slots[index];
                assert!(slot.value.is_some(), "free slot {index} on chain {bucket}");
                assert_eq!(self.bucket_index(slot.hash), bucket);
                assert_eq!(slot.bucket_prev, expected_prev);
                assert!(!on_chain[index], "slot {index} on two chains");
                on_chain[index] = true;
                expected_prev = ChainPrev::Slot(index as u32);
            }
        }

        let mut on_spine = vec![false; capacity];
        let mut prev = Link::NONE;
        for index in self.spine() {
            assert!(!on_spine[index], "spine revisits slot {index}");
            on_spine[index] = true;
            assert_eq!(self.slots[index].iter_prev, prev);
            prev = Link::at(index);
        }
        assert_eq!(self.tail, prev);

        let spine_len = on_spine.iter().filter(|&&b| b).count();
        assert_eq!(spine_len, self.populated);
        assert_eq!(on_chain, on_spine);

        let mut free_len = 0;
        let mut cursor = self.free;
        while let Some(index) = cursor.get() {
            assert!(self.slots[index].value.is_none(), "live slot {index} is free");
            assert!(!on_spine[index]);
            free_len += 1;
            assert!(free_len <= capacity, "freelist cycle");
            cursor = self.slots[index].bucket_next;
        }
        assert_eq!(self.populated + free_len, capacity);
    }
}

/// A detached position in a table's iteration order.
///
/// Created by [`HashTable::cursor`] (or the map and set wrappers). Unlike
/// [`Iter`], a cursor holds no borrow, so the table can be modified while the
/// cursor exists; the cursor notices and reports [`Error::StaleVersion`]
/// instead of yielding stale data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    version: u64,
    next: Link,
}

impl Cursor {
    /// The table version this cursor was created or last reset with.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// A view into a single entry in a table, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, T> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, T>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the stored value.
    pub fn or_insert(self, default: T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the stored value.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Calls `f` on an occupied value and returns it; vacant entries yield
    /// `None`.
    pub fn and_modify(self, f: impl FnOnce(&mut T)) -> Option<&'a mut T> {
        match self {
            Entry::Occupied(entry) => {
                let value = entry.into_mut();
                f(value);
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Inserts `T::default()` if the entry is vacant.
    pub fn or_default(self) -> &'a mut T
    where
        T: Default,
    {
        self.or_insert_with(Default::default)
    }
}

/// A vacant entry of a [`HashTable`].
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    hash: u64,
}

impl<'a, T> VacantEntry<'a, T> {
    /// The hash this entry was looked up with.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Inserts `value` at the end of the iteration order and returns a
    /// mutable reference to it.
    ///
    /// Grows the table first if no slot is free.
    ///
    /// # Panics
    ///
    /// Panics if the table is full and cannot grow past [`MAX_CAPACITY`].
    pub fn insert(self, value: T) -> &'a mut T {
        let VacantEntry { table, hash } = self;
        let index = table.insert_new(hash, value);
        table.value_at(index)
    }

    /// Like [`VacantEntry::insert`], but returns
    /// [`Error::CapacityOverflow`] instead of panicking when the table
    /// cannot grow. The table is unchanged on error.
    pub fn try_insert(self, value: T) -> Result<&'a mut T, Error> {
        let VacantEntry { table, hash } = self;
        let index = table.try_insert_new(hash, value)?;
        Ok(table.value_at(index))
    }
}

/// An occupied entry of a [`HashTable`].
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    index: usize,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// Gets a reference to the stored value.
    pub fn get(&self) -> &T {
        match self.table.slots[self.index].value.as_ref() {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Gets a mutable reference to the stored value.
    ///
    /// Bumps the version; the entry keeps its position.
    pub fn get_mut(&mut self) -> &mut T {
        self.table.bump_version();
        match self.table.slots[self.index].value.as_mut() {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Converts the entry into a mutable reference with the table's lifetime.
    ///
    /// Bumps the version.
    pub fn into_mut(self) -> &'a mut T {
        self.table.bump_version();
        match self.table.slots[self.index].value.as_mut() {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Removes the entry from the table and returns its value.
    pub fn remove(self) -> T {
        self.table.remove_index(self.index)
    }
}

/// An iterator over the values of a [`HashTable`] in insertion order.
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, T> {
    slots: &'a [Slot<T>],
    front: Link,
    back: Link,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = &self.slots[self.front.get()?];
        self.front = slot.iter_next;
        self.remaining -= 1;
        slot.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = &self.slots[self.back.get()?];
        self.back = slot.iter_prev;
        self.remaining -= 1;
        slot.value.as_ref()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// A mutable iterator over the values of a [`HashTable`] in insertion order.
///
/// This struct is created by the [`iter_mut`] method on [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
pub struct IterMut<'a, T> {
    slots: *mut Slot<T>,
    front: Link,
    back: Link,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

// SAFETY: `IterMut` behaves like `&'a mut [Slot<T>]`.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
// SAFETY: `IterMut` behaves like `&'a mut [Slot<T>]`.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.front.get()?;
        // SAFETY: `index` comes from the spine of the table this iterator
        // mutably borrows, so it is in bounds. The spine is acyclic and
        // `remaining` stops both ends once they meet, so each slot is yielded
        // at most once and the returned references never alias.
        unsafe {
            let slot = self.slots.add(index);
            self.front = (*slot).iter_next;
            self.remaining -= 1;
            (*slot).value.as_mut()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.back.get()?;
        // SAFETY: see `next`.
        unsafe {
            let slot = self.slots.add(index);
            self.back = (*slot).iter_prev;
            self.remaining -= 1;
            (*slot).value.as_mut()
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
/// It yields owned values in insertion order and empties the table.
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, T> {
    table: &'a mut HashTable<T>,
}

impl<T> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        self.table.clear();
    }
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.table.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}

impl<T> DoubleEndedIterator for Drain<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.table.pop_last()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> FusedIterator for Drain<'_, T> {}

/// A consuming iterator over the values of a [`HashTable`] in insertion
/// order.
pub struct IntoIter<T> {
    slots: Vec<Slot<T>>,
    front: Link,
    back: Link,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = &mut self.slots[self.front.get()?];
        self.front = slot.iter_next;
        self.remaining -= 1;
        slot.value.take()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = &mut self.slots[self.back.get()?];
        self.back = slot.iter_prev;
        self.remaining -= 1;
        slot.value.take()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for HashTable<T> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots,
            front: self.head,
            back: self.tail,
            remaining: self.populated,
        }
    }
}

impl<'a, T> IntoIterator for &'a HashTable<T> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut HashTable<T> {
    type IntoIter = IterMut<'a, T>;
    type Item = &'a mut T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
