use core::hash::BuildHasher;
use core::hash::Hash;

use alloc::vec::Vec;

use crate::error::Error;
use crate::hash_map::OrderedHashMap;
use crate::hash_set::OrderedHashSet;

/// The contents of an [`OrderedHashMap`] as two parallel arrays, in
/// insertion order.
///
/// `keys[i]` belongs with `values[i]`. Restoring a dump rebuilds the map with
/// the same iteration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDump<K, V> {
    /// Keys, oldest first.
    pub keys: Vec<K>,
    /// Values, aligned with `keys`.
    pub values: Vec<V>,
}

impl<K, V> MapDump<K, V> {
    /// Creates a dump from parallel key and value arrays.
    pub fn new(keys: Vec<K>, values: Vec<V>) -> Self {
        Self { keys, values }
    }
}

/// The contents of an [`OrderedHashSet`], in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetDump<T> {
    /// Values, oldest first.
    pub keys: Vec<T>,
}

impl<T> SetDump<T> {
    /// Creates a dump from an array of values.
    pub fn new(keys: Vec<T>) -> Self {
        Self { keys }
    }
}

impl<K, V, S> OrderedHashMap<K, V, S> {
    /// Copies the map into a [`MapDump`], in insertion order.
    ///
    /// ```rust
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let mut map = OrderedHashMap::new();
    /// map.insert("b", 2);
    /// map.insert("a", 1);
    ///
    /// let dump = map.dump();
    /// assert_eq!(dump.keys, ["b", "a"]);
    /// assert_eq!(dump.values, [2, 1]);
    /// ```
    pub fn dump(&self) -> MapDump<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let mut keys = Vec::with_capacity(self.len());
        let mut values = Vec::with_capacity(self.len());
        for (k, v) in self.iter() {
            keys.push(k.clone());
            values.push(v.clone());
        }
        MapDump { keys, values }
    }

    /// Consumes the map into a [`MapDump`], in insertion order.
    pub fn into_dump(self) -> MapDump<K, V> {
        let (keys, values) = self.into_iter().unzip();
        MapDump { keys, values }
    }
}

impl<K, V, S> OrderedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Rebuilds a map from a dump using `hash_builder`.
    ///
    /// The map is sized for the dump up front and the pairs are inserted in
    /// array order. Fails with [`Error::LengthMismatch`] before inserting
    /// anything if the arrays differ in length, and with
    /// [`Error::DuplicateKey`] if a key repeats.
    pub fn restore_with_hasher(dump: MapDump<K, V>, hash_builder: S) -> Result<Self, Error> {
        let MapDump { keys, values } = dump;
        if keys.len() != values.len() {
            log::debug!(
                "rejecting map dump with {} keys and {} values",
                keys.len(),
                values.len()
            );
            return Err(Error::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }

        let mut map = Self::try_with_capacity_and_hasher(keys.len(), hash_builder)?;
        for (key, value) in keys.into_iter().zip(values) {
            map.try_insert(key, value)?;
        }
        Ok(map)
    }

    /// Rebuilds a map from a dump using a default hasher builder.
    ///
    /// ```rust
    /// use ordered_hash::Error;
    /// use ordered_hash::MapDump;
    /// use ordered_hash::OrderedHashMap;
    ///
    /// let dump = MapDump::new(vec!["x", "y"], vec![1, 2]);
    /// let map: OrderedHashMap<_, _> = OrderedHashMap::restore(dump).unwrap();
    /// assert_eq!(map.iter().collect::<Vec<_>>(), [(&"x", &1), (&"y", &2)]);
    ///
    /// let bad = MapDump::new(vec!["x", "y"], vec![1]);
    /// let err = OrderedHashMap::<_, _>::restore(bad).unwrap_err();
    /// assert_eq!(err, Error::LengthMismatch { keys: 2, values: 1 });
    /// ```
    pub fn restore(dump: MapDump<K, V>) -> Result<Self, Error>
    where
        S: Default,
    {
        Self::restore_with_hasher(dump, S::default())
    }
}

impl<T, S> OrderedHashSet<T, S> {
    /// Copies the set into a [`SetDump`], in insertion order.
    pub fn dump(&self) -> SetDump<T>
    where
        T: Clone,
    {
        SetDump { keys: self.to_vec() }
    }

    /// Consumes the set into a [`SetDump`], in insertion order.
    pub fn into_dump(self) -> SetDump<T> {
        SetDump {
            keys: self.into_iter().collect(),
        }
    }
}

impl<T, S> OrderedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Rebuilds a set from a dump using `hash_builder`, failing with
    /// [`Error::DuplicateKey`] if a value repeats.
    pub fn restore_with_hasher(dump: SetDump<T>, hash_builder: S) -> Result<Self, Error> {
        let mut set = Self::try_with_capacity_and_hasher(dump.keys.len(), hash_builder)?;
        for value in dump.keys {
            set.try_insert(value)?;
        }
        Ok(set)
    }

    /// Rebuilds a set from a dump using a default hasher builder.
    pub fn restore(dump: SetDump<T>) -> Result<Self, Error>
    where
        S: Default,
    {
        Self::restore_with_hasher(dump, S::default())
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use core::hash::BuildHasher;
    use core::hash::Hash;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serialize;
    use serde::Serializer;
    use serde::de;
    use serde::ser::SerializeStruct;

    use super::MapDump;
    use super::SetDump;
    use crate::hash_map::OrderedHashMap;
    use crate::hash_set::OrderedHashSet;

    /// Serializes a borrowed iterator as a sequence without collecting it.
    struct Sequence<I>(I);

    impl<I> Serialize for Sequence<I>
    where
        I: Iterator + Clone,
        I::Item: Serialize,
    {
        fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
            serializer.collect_seq(self.0.clone())
        }
    }

    impl<K, V, S> Serialize for OrderedHashMap<K, V, S>
    where
        K: Serialize,
        V: Serialize,
    {
        fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
            let mut state = serializer.serialize_struct("MapDump", 2)?;
            state.serialize_field("keys", &Sequence(self.keys()))?;
            state.serialize_field("values", &Sequence(self.values()))?;
            state.end()
        }
    }

    impl<'de, K, V, S> Deserialize<'de> for OrderedHashMap<K, V, S>
    where
        K: Deserialize<'de> + Hash + Eq,
        V: Deserialize<'de>,
        S: BuildHasher + Default,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let dump = MapDump::<K, V>::deserialize(deserializer)?;
            OrderedHashMap::restore_with_hasher(dump, S::default()).map_err(de::Error::custom)
        }
    }

    impl<T, S> Serialize for OrderedHashSet<T, S>
    where
        T: Serialize,
    {
        fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
            let mut state = serializer.serialize_struct("SetDump", 1)?;
            state.serialize_field("keys", &Sequence(self.iter()))?;
            state.end()
        }
    }

    impl<'de, T, S> Deserialize<'de> for OrderedHashSet<T, S>
    where
        T: Deserialize<'de> + Hash + Eq,
        S: BuildHasher + Default,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let dump = SetDump::<T>::deserialize(deserializer)?;
            OrderedHashSet::restore_with_hasher(dump, S::default()).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone, Default)]
    struct FixedSip;

    impl BuildHasher for FixedSip {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(0x5eed, 0xfeed)
        }
    }

    type Map<K, V> = OrderedHashMap<K, V, FixedSip>;
    type Set<T> = OrderedHashSet<T, FixedSip>;

    #[test]
    fn dump_is_in_insertion_order() {
        let mut map = Map::default();
        map.insert("A", 1);
        map.insert("B", 2);
        map.insert("C", 3);
        map.remove("B");
        map.insert("B", 4);

        let dump = map.dump();
        assert_eq!(dump, MapDump::new(vec!["A", "C", "B"], vec![1, 3, 4]));
        assert_eq!(map.into_dump(), dump);
    }

    #[test]
    fn restore_preserves_order_and_presizes() {
        let dump = MapDump::new(vec![5, 1, 4, 2, 3], vec!['e', 'a', 'd', 'b', 'c']);
        let map = Map::restore(dump.clone()).unwrap();
        assert_eq!(map.capacity(), 8);
        assert_eq!(map.dump(), dump);
        assert_eq!(map.get(&4), Some(&'d'));
    }

    #[test]
    fn restore_empty_dump() {
        let map = Map::<u8, u8>::restore(MapDump::default()).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 0);
    }

    #[test]
    fn length_mismatch_is_checked_first() {
        let dump = MapDump::new(vec![1, 1, 2], vec!["a"]);
        assert_eq!(
            Map::restore(dump).err(),
            Some(Error::LengthMismatch { keys: 3, values: 1 })
        );
    }

    #[test]
    fn duplicate_key_rejected() {
        let dump = MapDump::new(vec![1, 2, 1], vec!["a", "b", "c"]);
        assert_eq!(Map::restore(dump).err(), Some(Error::DuplicateKey));

        let dump = SetDump::new(vec![7, 7]);
        assert_eq!(Set::restore(dump).err(), Some(Error::DuplicateKey));
    }

    #[test]
    fn round_trip_after_churn() {
        let mut rng = SmallRng::seed_from_u64(0x0dd5);
        let mut map = Map::default();
        for _ in 0..2000 {
            let key: u32 = rng.random_range(0..400);
            if rng.random_range(0..3) == 0 {
                map.remove(&key);
            } else {
                map.insert(key, key.to_string());
            }
        }

        let expected: Vec<(u32, String)> = map.to_vec();
        let restored = Map::restore(map.dump()).unwrap();
        assert_eq!(restored.to_vec(), expected);
        assert_eq!(restored.len(), map.len());
        assert!(restored.capacity() <= map.capacity());
    }

    #[test]
    fn set_round_trip() {
        let set: Set<&str> = ["z", "a", "m"].into_iter().collect();
        let dump = set.dump();
        assert_eq!(dump.keys, ["z", "a", "m"]);
        let restored = Set::restore(dump).unwrap();
        assert_eq!(restored.to_vec(), ["z", "a", "m"]);
        assert_eq!(restored.into_dump(), SetDump::new(vec!["z", "a", "m"]));
    }

    #[cfg(feature = "serde")]
    mod serde_tokens {
        use serde_test::Token;
        use serde_test::assert_de_tokens;
        use serde_test::assert_de_tokens_error;
        use serde_test::assert_ser_tokens;

        use super::*;

        #[test]
        fn map_tokens() {
            let mut map = Map::default();
            map.insert('b', 2u8);
            map.insert('a', 1u8);

            let tokens = [
                Token::Struct {
                    name: "MapDump",
                    len: 2,
                },
                Token::Str("keys"),
                Token::Seq { len: Some(2) },
                Token::Char('b'),
                Token::Char('a'),
                Token::SeqEnd,
                Token::Str("values"),
                Token::Seq { len: Some(2) },
                Token::U8(2),
                Token::U8(1),
                Token::SeqEnd,
                Token::StructEnd,
            ];
            assert_ser_tokens(&map, &tokens);
            assert_de_tokens(&map, &tokens);
        }

        #[test]
        fn map_length_mismatch_error() {
            assert_de_tokens_error::<Map<char, u8>>(
                &[
                    Token::Struct {
                        name: "MapDump",
                        len: 2,
                    },
                    Token::Str("keys"),
                    Token::Seq { len: Some(2) },
                    Token::Char('b'),
                    Token::Char('a'),
                    Token::SeqEnd,
                    Token::Str("values"),
                    Token::Seq { len: Some(1) },
                    Token::U8(2),
                    Token::SeqEnd,
                    Token::StructEnd,
                ],
                "dump key count 2 does not match value count 1",
            );
        }

        #[test]
        fn set_tokens() {
            let set: Set<u16> = [30, 10, 20].into_iter().collect();
            let tokens = [
                Token::Struct {
                    name: "SetDump",
                    len: 1,
                },
                Token::Str("keys"),
                Token::Seq { len: Some(3) },
                Token::U16(30),
                Token::U16(10),
                Token::U16(20),
                Token::SeqEnd,
                Token::StructEnd,
            ];
            assert_ser_tokens(&set, &tokens);
            assert_de_tokens(&set, &tokens);
        }
    }
}
