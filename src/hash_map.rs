//! A key-value map over the linear-probing [`HashTable`].
//!
//! [`HashMap<K, V, S, P>`] pairs the table with a [`BuildHasher`] so keys
//! are hashed and compared automatically. The erase policy `P` is forwarded
//! to the table; see the [`policy`](crate::policy) module for choosing
//! between backward-shift and tombstone deletion.

use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::ops::Index;

use crate::hash_table;
use crate::hash_table::HashTable;
use crate::policy::BackshiftErase;
use crate::policy::ErasePolicy;

/// A hash map backed by a closed-hashing, linear-probing table.
///
/// Keys must implement `Hash + Eq`; the hasher builder `S` supplies the
/// hash function. Unlike the standard library map, [`insert`] never
/// replaces: inserting a present key leaves the map unchanged and reports
/// `false`. Use [`entry`] or [`get_mut`] to update values in place.
///
/// # Examples
///
/// ```rust
/// # use core::hash::BuildHasher;
/// # use siphasher::sip::SipHasher;
/// #
/// # use lp_hash::HashMap;
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
/// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
/// assert!(map.insert(1, "one"));
/// assert!(!map.insert(1, "uno"));
/// assert_eq!(map.get(&1), Some(&"one"));
/// ```
///
/// [`insert`]: HashMap::insert
/// [`entry`]: HashMap::entry
/// [`get_mut`]: HashMap::get_mut
#[derive(Clone)]
pub struct HashMap<K, V, S, P: ErasePolicy = BackshiftErase> {
    table: HashTable<K, V, P>,
    hash_builder: S,
}

impl<K, V, S, P> Debug for HashMap<K, V, S, P>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
    P: ErasePolicy,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S, P> HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: ErasePolicy,
{
    /// Creates an empty map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Creates an empty map with at least the requested capacity, rounded
    /// up to the next power of two.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// map.insert(1, "a");
    /// assert!(!map.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots, always a power of two. The map grows
    /// once inserts collide while more than half the slots are filled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.capacity(), 32);
    /// ```
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Inserts a key-value pair if the key is not already present.
    ///
    /// Returns `true` if the pair was stored. If the key is present, the
    /// map is unchanged, the given pair is dropped, and `false` is
    /// returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.insert(1, "one"));
    /// assert!(!map.insert(1, "uno"));
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.hash(&key);
        if self.table.find(hash, |k| k == &key).is_some() {
            return false;
        }
        let (table, builder) = (&mut self.table, &self.hash_builder);
        table.insert_unique(hash, key, value, |k| builder.hash_one(k));
        true
    }

    /// Returns a reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "one");
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.table.find(self.hash(key), |k| k == key).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, i32, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, 10);
    /// if let Some(v) = map.get_mut(&1) {
    ///     *v += 1;
    /// }
    /// assert_eq!(map.get(&1), Some(&11));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash(key);
        self.table.find_mut(hash, |k| k == key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.get_key_value(&1), Some((&1, &"a")));
    /// assert_eq!(map.get_key_value(&2), None);
    /// ```
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.table.find(self.hash(key), |k| k == key)
    }

    /// Returns `true` if the map contains `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "one");
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of entries matching `key`: `1` if present, `0`
    /// otherwise. Keys are unique, so no other count can occur.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(17, "seventeen");
    /// assert_eq!(map.count(&17), 1);
    /// assert_eq!(map.count(&42), 0);
    /// ```
    pub fn count(&self, key: &K) -> usize {
        self.contains_key(key) as usize
    }

    /// Removes `key` from the map, returning its value. Absent keys are a
    /// no-op returning `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key` from the map, returning the stored key and value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.remove_entry(&1), Some((1, "a")));
    /// assert_eq!(map.remove_entry(&1), None);
    /// ```
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash(key);
        let (table, builder) = (&mut self.table, &self.hash_builder);
        table.remove(hash, |k| k == key, |k| builder.hash_one(k))
    }

    /// Gets the entry for `key`, for in-place manipulation and
    /// insert-if-absent patterns.
    ///
    /// `map.entry(key).or_default()` is the indexing operation that
    /// inserts a default value on a miss.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<&str, i32, _> = HashMap::with_hasher(SimpleHasher);
    /// *map.entry("a").or_insert(0) += 1;
    /// *map.entry("a").or_insert(0) += 1;
    /// assert_eq!(map.get(&"a"), Some(&2));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S, P> {
        let hash = self.hash(&key);
        if self.table.find(hash, |k| k == &key).is_some() {
            Entry::Occupied(OccupiedEntry {
                map: self,
                hash,
                key,
            })
        } else {
            Entry::Vacant(VacantEntry {
                map: self,
                hash,
                key,
            })
        }
    }

    /// Grows the map to hold at least `new_capacity` slots, rounded up to
    /// the next power of two. Requests at or below the current capacity do
    /// nothing; the map never shrinks.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.capacity(), 32);
    /// map.reserve(33);
    /// assert_eq!(map.capacity(), 64);
    /// map.reserve(3);
    /// assert_eq!(map.capacity(), 64);
    /// ```
    pub fn reserve(&mut self, new_capacity: usize) {
        let (table, builder) = (&mut self.table, &self.hash_builder);
        table.reserve(new_capacity, |k| builder.hash_one(k));
    }

    /// Removes every entry, keeping the allocated capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "one");
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the entries, yielding `(&K, &V)` in an
    /// unspecified order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// for (key, value) in map.iter() {
    ///     println!("Key: {}, Value: {}", key, value);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the entries, yielding `(&K, &mut V)` in an
    /// unspecified order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, i32, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, 10);
    /// map.insert(2, 20);
    ///
    /// for (_, value) in map.iter_mut() {
    ///     *value += 1;
    /// }
    /// assert_eq!(map.get(&1), Some(&11));
    /// assert_eq!(map.get(&2), Some(&21));
    /// ```
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, P> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let keys: Vec<_> = map.keys().collect();
    /// assert_eq!(keys.len(), 2);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let values: Vec<_> = map.values().collect();
    /// assert_eq!(values.len(), 2);
    /// ```
    pub fn values(&self) -> Values<'_, K, V, P> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
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
    /// let mut map: HashMap<i32, i32, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, 10);
    /// for value in map.values_mut() {
    ///     *value *= 2;
    /// }
    /// assert_eq!(map.get(&1), Some(&20));
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, P> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, V, S, P> HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: ErasePolicy,
{
    /// Creates an empty map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, SimpleHasher> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty map with at least the requested capacity, using
    /// the default hasher builder.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use lp_hash::HashMap;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, SimpleHasher> = HashMap::with_capacity(100);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S, P> Default for HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: ErasePolicy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, P> Index<&K> for HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: ErasePolicy,
{
    type Output = V;

    /// Returns a reference to the value for `key`.
    ///
    /// Indexing a shared map cannot insert; use
    /// [`entry`](HashMap::entry)`.or_default()` for the inserting form.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: ErasePolicy,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a mut HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: ErasePolicy,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S, P> Extend<(K, V)> for HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: ErasePolicy,
{
    /// Inserts each pair in turn. Pairs whose key is already present are
    /// dropped, so the first occurrence of a key wins.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S, P> FromIterator<(K, V)> for HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: ErasePolicy,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// A view into a single map entry, which is either vacant or occupied.
///
/// Created by [`HashMap::entry`].
pub enum Entry<'a, K, V, S, P: ErasePolicy> {
    /// The key is present.
    Occupied(OccupiedEntry<'a, K, V, S, P>),
    /// The key is absent.
    Vacant(VacantEntry<'a, K, V, S, P>),
}

impl<'a, K, V, S, P> Entry<'a, K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: ErasePolicy,
{
    /// Returns the entry's value, inserting `default` if it was vacant.
    pub fn or_insert(self, default: V) -> &'a mut V {
        self.or_insert_with(|| default)
    }

    /// Returns the entry's value, inserting the result of `default` if it
    /// was vacant.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Returns the entry's value, inserting `V::default()` if it was
    /// vacant.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Applies `f` to the value if the entry is occupied, then returns the
    /// entry.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns the entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

/// A view into an occupied map entry.
pub struct OccupiedEntry<'a, K, V, S, P: ErasePolicy> {
    map: &'a mut HashMap<K, V, S, P>,
    hash: u64,
    key: K,
}

impl<'a, K, V, S, P> OccupiedEntry<'a, K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: ErasePolicy,
{
    /// Returns the entry's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns a reference to the value.
    pub fn get(&self) -> &V {
        match self.map.table.find(self.hash, |k| k == &self.key) {
            Some((_, v)) => v,
            None => unreachable!("occupied entry lost its key"),
        }
    }

    /// Returns a mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut V {
        match self.map.table.find_mut(self.hash, |k| k == &self.key) {
            Some((_, v)) => v,
            None => unreachable!("occupied entry lost its key"),
        }
    }

    /// Converts the entry into a mutable reference tied to the map.
    pub fn into_mut(self) -> &'a mut V {
        let OccupiedEntry { map, hash, key } = self;
        match map.table.find_mut(hash, |k| k == &key) {
            Some((_, v)) => v,
            None => unreachable!("occupied entry lost its key"),
        }
    }

    /// Replaces the value, returning the previous one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry, returning the stored key and value.
    pub fn remove_entry(self) -> (K, V) {
        let OccupiedEntry { map, hash, key } = self;
        let (table, builder) = (&mut map.table, &map.hash_builder);
        match table.remove(hash, |k| k == &key, |k| builder.hash_one(k)) {
            Some(entry) => entry,
            None => unreachable!("occupied entry lost its key"),
        }
    }
}

/// A view into a vacant map entry.
pub struct VacantEntry<'a, K, V, S, P: ErasePolicy> {
    map: &'a mut HashMap<K, V, S, P>,
    hash: u64,
    key: K,
}

impl<'a, K, V, S, P> VacantEntry<'a, K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: ErasePolicy,
{
    /// Returns the key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes the key back out of the entry.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value under the entry's key.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry { map, hash, key } = self;
        let (table, builder) = (&mut map.table, &map.hash_builder);
        table.insert_unique(hash, key, value, |k| builder.hash_one(k))
    }
}

/// An iterator over the entries of a [`HashMap`].
pub struct Iter<'a, K, V, P: ErasePolicy> {
    inner: hash_table::Iter<'a, K, V, P>,
}

impl<'a, K, V, P: ErasePolicy> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: ErasePolicy> ExactSizeIterator for Iter<'_, K, V, P> {}
impl<K, V, P: ErasePolicy> core::iter::FusedIterator for Iter<'_, K, V, P> {}

/// A mutable iterator over the entries of a [`HashMap`].
pub struct IterMut<'a, K, V, P: ErasePolicy> {
    inner: hash_table::IterMut<'a, K, V, P>,
}

impl<'a, K, V, P: ErasePolicy> Iterator for IterMut<'a, K, V, P> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: ErasePolicy> ExactSizeIterator for IterMut<'_, K, V, P> {}
impl<K, V, P: ErasePolicy> core::iter::FusedIterator for IterMut<'_, K, V, P> {}

/// An iterator over the keys of a [`HashMap`].
pub struct Keys<'a, K, V, P: ErasePolicy> {
    inner: Iter<'a, K, V, P>,
}

impl<'a, K, V, P: ErasePolicy> Iterator for Keys<'a, K, V, P> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: ErasePolicy> ExactSizeIterator for Keys<'_, K, V, P> {}
impl<K, V, P: ErasePolicy> core::iter::FusedIterator for Keys<'_, K, V, P> {}

/// An iterator over the values of a [`HashMap`].
pub struct Values<'a, K, V, P: ErasePolicy> {
    inner: Iter<'a, K, V, P>,
}

impl<'a, K, V, P: ErasePolicy> Iterator for Values<'a, K, V, P> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: ErasePolicy> ExactSizeIterator for Values<'_, K, V, P> {}
impl<K, V, P: ErasePolicy> core::iter::FusedIterator for Values<'_, K, V, P> {}

/// A mutable iterator over the values of a [`HashMap`].
pub struct ValuesMut<'a, K, V, P: ErasePolicy> {
    inner: IterMut<'a, K, V, P>,
}

impl<'a, K, V, P: ErasePolicy> Iterator for ValuesMut<'a, K, V, P> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: ErasePolicy> ExactSizeIterator for ValuesMut<'_, K, V, P> {}
impl<K, V, P: ErasePolicy> core::iter::FusedIterator for ValuesMut<'_, K, V, P> {}
