use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use alloc::vec::Vec;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::hash_table::Cursor;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::views::SetView;

/// A hash set that iterates in insertion order, built on the ordered
/// [`HashTable`].
///
/// `OrderedHashSet<T, S>` stores values of type `T` where `T` implements
/// `Hash + Eq` and uses a configurable hasher builder `S` to hash values.
/// Inserting a value that is already present does nothing and leaves it
/// where it is; removing a value and inserting it again moves it to the end.
///
/// # Examples
///
/// ```rust
/// use ordered_hash::OrderedHashSet;
///
/// let mut set = OrderedHashSet::new();
/// set.insert("c");
/// set.insert("a");
/// set.insert("c");
/// set.insert("b");
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), ["c", "a", "b"]);
/// ```
#[derive(Clone)]
pub struct OrderedHashSet<T, S = DefaultHashBuilder> {
    table: HashTable<T>,
    hash_builder: S,
}

impl<T, S> PartialEq for OrderedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Sets are equal when they hold the same values, in any order.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, S> Eq for OrderedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

impl<T, S> Debug for OrderedHashSet<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<T> OrderedHashSet<T, DefaultHashBuilder> {
    /// Creates an empty set using the default hasher builder.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashSet;
    ///
    /// let set: OrderedHashSet<i32> = OrderedHashSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty set with room for at least `capacity` values, using
    /// the default hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<T, S> OrderedHashSet<T, S> {
    /// Creates a new set with the given hasher builder.
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Creates a new set with room for at least `capacity` values.
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

    /// Returns a reference to the set's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of values in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of values the set can hold before it grows.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the set's mutation version.
    pub fn version(&self) -> u64 {
        self.table.version()
    }

    pub(crate) fn check_version(&self, expected: u64) -> Result<(), Error> {
        self.table.check_version(expected)
    }

    /// Removes all values, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the capacity as much as possible. Order is preserved.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more values.
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

    /// Returns the oldest value.
    pub fn first(&self) -> Option<&T> {
        self.table.first()
    }

    /// Returns the newest value.
    pub fn last(&self) -> Option<&T> {
        self.table.last()
    }

    /// Removes and returns the oldest value.
    pub fn pop_first(&mut self) -> Option<T> {
        self.table.pop_first()
    }

    /// Removes and returns the newest value.
    pub fn pop_last(&mut self) -> Option<T> {
        self.table.pop_last()
    }

    /// Removes every value for which `pred` returns `true` and returns how
    /// many were removed.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.table.remove_where(|v| pred(v))
    }

    /// Retains only the values for which `keep` returns `true`.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashSet;
    ///
    /// let mut set: OrderedHashSet<i32> = (1..=6).collect();
    /// set.retain(|&x| x % 2 == 0);
    /// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [2, 4, 6]);
    /// ```
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.table.remove_where(|v| !keep(v));
    }

    /// Returns an iterator over the values in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator that removes and yields all values in insertion
    /// order.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Creates a detached cursor positioned before the oldest value.
    pub fn cursor(&self) -> Cursor {
        self.table.cursor()
    }

    /// Steps `cursor` to the next value, failing with
    /// [`Error::StaleVersion`] once the set has been modified.
    pub fn advance<'a>(&'a self, cursor: &mut Cursor) -> Result<Option<&'a T>, Error> {
        self.table.advance(cursor)
    }

    /// Rewinds `cursor` to the oldest value and re-captures the version.
    pub fn reset(&self, cursor: &mut Cursor) {
        self.table.reset(cursor);
    }

    /// Returns a detached view of the values, valid until the next mutation.
    pub fn view(&self) -> SetView {
        SetView::new(self.version())
    }

    /// Copies all values into a vector, in insertion order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T, S> OrderedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Builds a set from `values` with a default hasher builder,
    /// failing with [`Error::DuplicateKey`] on a repeat.
    pub fn try_from_iter<I>(values: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
        S: Default,
    {
        Self::try_from_iter_with_hasher(values, S::default())
    }

    /// Builds a set from `values`, failing with [`Error::DuplicateKey`] if a
    /// value appears twice.
    pub fn try_from_iter_with_hasher<I>(values: I, hash_builder: S) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter();
        let mut set = Self::try_with_capacity_and_hasher(values.size_hint().0, hash_builder)?;
        for value in values {
            set.try_insert(value)?;
        }
        Ok(set)
    }

    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was not present. A value that is already
    /// present is left untouched and keeps its position.
    ///
    /// # Panics
    ///
    /// Panics if the set is full and cannot grow past
    /// [`MAX_CAPACITY`](crate::hash_table::MAX_CAPACITY) entries. Use
    /// [`try_insert`](Self::try_insert) to get an error instead.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashSet;
    ///
    /// let mut set = OrderedHashSet::new();
    /// assert!(set.insert(2));
    /// assert!(!set.insert(2));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value) {
            TableEntry::Occupied(_) => false,
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    /// Adds a value that must not be present yet.
    ///
    /// Fails with [`Error::DuplicateKey`] and leaves the set untouched if it
    /// is. Fails with [`Error::CapacityOverflow`] if the set is full and
    /// cannot grow.
    pub fn try_insert(&mut self, value: T) -> Result<(), Error> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value) {
            TableEntry::Occupied(_) => Err(Error::DuplicateKey),
            TableEntry::Vacant(entry) => {
                entry.try_insert(value)?;
                Ok(())
            }
        }
    }

    /// Adds a value, replacing an equal one in place and returning it.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value) {
            TableEntry::Occupied(mut entry) => Some(core::mem::replace(entry.get_mut(), value)),
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns `true` if the set contains the value.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(value).is_some()
    }

    /// Returns a reference to the stored value equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| Borrow::<Q>::borrow(v) == value)
    }

    /// Removes a value from the set. Returns whether it was present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the stored value equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |v| Borrow::<Q>::borrow(v) == value)
    }

    /// Returns `true` if `self` has no values in common with `other`.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if every value of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every value of `other` is in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Returns an iterator over the values of `self` followed by the values
    /// of `other` not in `self`, each in insertion order.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashSet;
    ///
    /// let a: OrderedHashSet<i32> = [3, 1].into_iter().collect();
    /// let b: OrderedHashSet<i32> = [2, 1, 4].into_iter().collect();
    /// assert_eq!(a.union(&b).copied().collect::<Vec<_>>(), [3, 1, 2, 4]);
    /// ```
    pub fn union<'a>(&'a self, other: &'a Self) -> Union<'a, T, S> {
        Union {
            iter: self.iter(),
            other_iter: other.iter(),
            first: self,
        }
    }

    /// Returns an iterator over the values of `self` that are also in
    /// `other`, in `self`'s order.
    pub fn intersection<'a>(&'a self, other: &'a Self) -> Intersection<'a, T, S> {
        Intersection {
            iter: self.iter(),
            other,
        }
    }

    /// Returns an iterator over the values of `self` that are not in
    /// `other`, in `self`'s order.
    pub fn difference<'a>(&'a self, other: &'a Self) -> Difference<'a, T, S> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Returns an iterator over the values in exactly one of the two sets:
    /// first those only in `self`, then those only in `other`.
    pub fn symmetric_difference<'a>(&'a self, other: &'a Self) -> SymmetricDifference<'a, T, S> {
        SymmetricDifference {
            iter: self.difference(other).chain(other.difference(self)),
        }
    }
}

impl<T, S> Default for OrderedHashSet<T, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> FromIterator<T> for OrderedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for OrderedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, S> Extend<&'a T> for OrderedHashSet<T, S>
where
    T: Hash + Eq + Copy + 'a,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, S> IntoIterator for OrderedHashSet<T, S> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a OrderedHashSet<T, S> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of an `OrderedHashSet`.
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// A draining iterator over the values of an `OrderedHashSet`.
pub struct Drain<'a, T> {
    inner: crate::hash_table::Drain<'a, T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Drain<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> FusedIterator for Drain<'_, T> {}

/// A consuming iterator over the values of an `OrderedHashSet`.
pub struct IntoIter<T> {
    inner: crate::hash_table::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

/// An iterator over the union of two sets.
pub struct Union<'a, T, S> {
    iter: Iter<'a, T>,
    other_iter: Iter<'a, T>,
    first: &'a OrderedHashSet<T, S>,
}

impl<'a, T, S> Iterator for Union<'a, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.iter.next() {
            return Some(v);
        }
        loop {
            let v = self.other_iter.next()?;
            if !self.first.contains(v) {
                return Some(v);
            }
        }
    }
}

impl<T, S> FusedIterator for Union<'_, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

/// An iterator over the intersection of two sets.
pub struct Intersection<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a OrderedHashSet<T, S>,
}

impl<'a, T, S> Iterator for Intersection<'a, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the difference of two sets.
pub struct Difference<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a OrderedHashSet<T, S>,
}

impl<'a, T, S> Iterator for Difference<'a, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if !self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the symmetric difference of two sets.
pub struct SymmetricDifference<'a, T, S> {
    iter: core::iter::Chain<Difference<'a, T, S>, Difference<'a, T, S>>,
}

impl<'a, T, S> Iterator for SymmetricDifference<'a, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}
