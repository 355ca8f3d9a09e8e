//! HashTable: separate chaining over a prime number of buckets.

use crate::bucket::{Bucket, Entry};
use crate::error::{SizingError, TableError};
use crate::prime::{grow_capacity, prime_below, DEFAULT_CAPACITY};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, BuildHasherDefault, Hash};
use core::str::FromStr;
use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Stateless, deterministic hasher builder. Every instance hashes a given key
/// to the same value, so bucket layout is reproducible between runs.
pub type FixedState = BuildHasherDefault<DefaultHasher>;

// Records which of the two execution phases the table is in. Relocation
// holds `&mut self` and never reaches `insert`, so this documents the phase
// and backs rehash's own entry check rather than guarding callers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Steady,
    Rehashing,
}

pub struct HashTable<K, V, S = FixedState> {
    hasher: S,
    buckets: Vec<Bucket<K, V>>,
    len: usize,
    phase: Phase,
}

impl<K, V> HashTable<K, V>
where
    K: Eq + Hash,
{
    /// Creates a table with [`DEFAULT_CAPACITY`] buckets.
    pub fn new() -> Self {
        Self::with_hasher(FixedState::default())
    }

    /// Creates a table with `prime_below(capacity)` buckets.
    pub fn with_capacity(capacity: usize) -> Result<Self, SizingError> {
        Self::with_capacity_and_hasher(capacity, FixedState::default())
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over entries in bucket order, then chain order within a bucket.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket<K, V>>,
    chain: Option<core::slice::Iter<'a, Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain.as_mut().and_then(|c| c.next()) {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            self.chain = Some(self.buckets.next()?.iter());
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates a table with [`DEFAULT_CAPACITY`] buckets that hashes keys
    /// with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        // DEFAULT_CAPACITY is prime, so no sizing is needed.
        Self::from_parts(DEFAULT_CAPACITY, hasher)
    }

    /// Creates a table with `prime_below(capacity)` buckets that hashes keys
    /// with `hasher`. Fails if `capacity` is outside `[2, MAX_PRIME]`.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, SizingError> {
        Ok(Self::from_parts(prime_below(capacity)?, hasher))
    }

    fn from_parts(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            buckets: empty_buckets(capacity),
            len: 0,
            phase: Phase::Steady,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    fn bucket_for<Q>(&self, q: &Q) -> &Bucket<K, V>
    where
        Q: ?Sized + Hash,
    {
        &self.buckets[self.bucket_index(self.make_hash(q))]
    }

    /// Number of entries. Same as [`HashTable::len`].
    pub fn size(&self) -> usize {
        self.len
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets. Always prime.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// True iff an entry with key `q` is present. Scans a single chain.
    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.bucket_for(q).find(q).is_some()
    }

    /// Value stored for `q`, if any.
    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.bucket_for(q).find(q).map(|e| &e.value)
    }

    /// Mutable access to the value stored for `q`, if any.
    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = self.bucket_index(self.make_hash(q));
        self.buckets[idx].find_mut(q).map(|e| &mut e.value)
    }

    /// True iff `q` is present and currently maps to `value`.
    pub fn matches<Q>(&self, q: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        self.get(q).is_some_and(|v| v == value)
    }

    /// Inserts or overwrites the value for `key`.
    ///
    /// Always returns `true`: an overwrite with an equal value still reports
    /// success. A new key that pushes `len` past `capacity` grows the table.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.make_hash(&key);
        let idx = self.bucket_index(hash);
        if let Some(e) = self.buckets[idx].find_mut(&key) {
            e.value = value;
            return true;
        }
        self.buckets[idx].push(Entry { key, value, hash });
        self.len += 1;
        if self.len > self.capacity() {
            self.rehash();
        }
        true
    }

    /// Removes `q`; returns false if it was absent.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = self.bucket_index(self.make_hash(q));
        match self.buckets[idx].remove(q) {
            Some(_) => {
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Drops every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.len,
        }
    }

    /// Chain length of every bucket, by bucket index.
    pub fn bucket_lens(&self) -> Vec<usize> {
        self.buckets.iter().map(Bucket::len).collect()
    }

    /// Renders the bucket layout, one `Bucket i: k:v k:v` line per bucket.
    pub fn dump(&self) -> Dump<'_, K, V, S> {
        Dump { table: self }
    }

    // Moves every entry into a freshly sized bucket array. Entries carry
    // their hash, so relocation only recomputes the modulus and never calls
    // back into `K: Hash`/`K: Eq` or `insert`.
    fn rehash(&mut self) {
        debug_assert_eq!(self.phase, Phase::Steady, "nested rehash");
        let old_capacity = self.capacity();
        let new_capacity = grow_capacity(old_capacity);
        if new_capacity == old_capacity {
            tracing::debug!(
                capacity = old_capacity,
                len = self.len,
                "table at maximum capacity; skipping rehash"
            );
            return;
        }

        self.phase = Phase::Rehashing;
        let mut old = core::mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        for bucket in &mut old {
            for entry in bucket.drain() {
                let idx = self.bucket_index(entry.hash);
                self.buckets[idx].push(entry);
            }
        }
        self.phase = Phase::Steady;

        debug_assert_eq!(self.bucket_lens().iter().sum::<usize>(), self.len);
        tracing::debug!(
            old_capacity,
            new_capacity,
            len = self.len,
            "rehashed table"
        );
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash + FromStr,
    V: FromStr,
    S: BuildHasher,
{
    /// Inserts every `key value` line of the file at `path`.
    ///
    /// Returns the number of pairs inserted. Failure to open the file is an
    /// error; a malformed line ends the load without one, keeping whatever
    /// was inserted before it.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, TableError> {
        let file = File::open(path.as_ref())?;
        self.load_from(BufReader::new(file))
    }

    /// Same as [`HashTable::load`], reading from any buffered source.
    pub fn load_from<R: BufRead>(&mut self, reader: R) -> Result<usize, TableError> {
        let mut loaded = 0;
        for (lineno, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    tracing::debug!(line = lineno + 1, "stopping load at undecodable line");
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_pair::<K, V>(&line) {
                Some((key, value)) => {
                    self.insert(key, value);
                    loaded += 1;
                }
                None => {
                    tracing::debug!(line = lineno + 1, loaded, "stopping load at unparsable line");
                    break;
                }
            }
        }
        Ok(loaded)
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash + fmt::Display,
    V: fmt::Display,
    S: BuildHasher,
{
    /// Writes one `key value` line per entry, creating or truncating `path`.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))
    }

    /// Same as [`HashTable::write_to_file`], writing to any sink.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<(), TableError> {
        for (k, v) in self.iter() {
            writeln!(out, "{k} {v}")?;
        }
        out.flush()?;
        Ok(())
    }
}

fn parse_pair<K: FromStr, V: FromStr>(line: &str) -> Option<(K, V)> {
    let mut tokens = line.split_whitespace();
    let (key, value) = (tokens.next()?, tokens.next()?);
    if tokens.next().is_some() {
        return None;
    }
    Some((key.parse().ok()?, value.parse().ok()?))
}

fn empty_buckets<K, V>(capacity: usize) -> Vec<Bucket<K, V>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, Bucket::default);
    buckets
}

/// Display adaptor returned by [`HashTable::dump`].
pub struct Dump<'a, K, V, S> {
    table: &'a HashTable<K, V, S>,
}

impl<K, V, S> fmt::Display for Dump<'_, K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bucket) in self.table.buckets.iter().enumerate() {
            write!(f, "Bucket {i}: ")?;
            for (n, e) in bucket.iter().enumerate() {
                if n > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}:{}", e.key, e.value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<K, V, S> fmt::Debug for HashTable<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prime::{is_prime, MAX_PRIME};
    use std::collections::BTreeMap;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in bucket 0
    }

    #[test]
    fn new_table_uses_default_prime_capacity() {
        let t: HashTable<String, i32> = HashTable::new();
        assert_eq!(t.capacity(), 101);
        assert_eq!(t.size(), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn with_capacity_rounds_down_to_prime() {
        let t: HashTable<u32, u32> = HashTable::with_capacity(18).unwrap();
        assert_eq!(t.capacity(), 17);
        let t: HashTable<u32, u32> = HashTable::with_capacity(2).unwrap();
        assert_eq!(t.capacity(), 2);
    }

    /// Invariant: no table is ever built with zero buckets.
    #[test]
    fn unsupported_capacity_is_a_sizing_error() {
        assert!(matches!(
            HashTable::<u32, u32>::with_capacity(1),
            Err(SizingError::TooSmall { requested: 1 })
        ));
        assert!(matches!(
            HashTable::<u32, u32>::with_capacity(MAX_PRIME + 1),
            Err(SizingError::TooLarge { .. })
        ));
    }

    /// Invariant: insert then contains/matches; a different value does not match.
    #[test]
    fn insert_contains_match() {
        let mut t = HashTable::new();
        assert!(t.insert("k".to_string(), 1));
        assert!(t.contains("k"));
        assert!(t.matches("k", &1));
        assert!(!t.matches("k", &2));
        assert!(!t.matches("missing", &1));
        assert_eq!(t.get("k"), Some(&1));
    }

    /// Invariant: upsert keeps size, replaces value, and still reports true
    /// when the value is unchanged.
    #[test]
    fn upsert_overwrites_in_place() {
        let mut t = HashTable::new();
        assert!(t.insert("k".to_string(), 1));
        assert!(t.insert("k".to_string(), 2));
        assert_eq!(t.size(), 1);
        assert!(t.matches("k", &2));
        assert!(!t.matches("k", &1));
        assert!(t.insert("k".to_string(), 2));
        assert_eq!(t.size(), 1);
    }

    #[test]
    fn remove_present_and_absent() {
        let mut t = HashTable::new();
        t.insert("a".to_string(), 1);
        t.insert("b".to_string(), 2);
        assert!(!t.remove("zzz"));
        assert_eq!(t.size(), 2);
        assert!(t.remove("a"));
        assert!(!t.contains("a"));
        assert!(!t.remove("a"));
        assert_eq!(t.size(), 1);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(11).unwrap();
        t.extend((0..30).map(|i| (i, i)));
        let cap = t.capacity();
        t.clear();
        assert_eq!(t.size(), 0);
        assert_eq!(t.capacity(), cap);
        assert!(t.bucket_lens().iter().all(|&n| n == 0));
        assert_eq!(t.iter().count(), 0);
    }

    /// Invariant: growth happens exactly when size exceeds capacity, and
    /// never on removal.
    #[test]
    fn rehash_triggers_only_past_capacity() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(7).unwrap();
        for i in 0..7 {
            t.insert(i, i);
        }
        assert_eq!(t.capacity(), 7);
        // Overwrites do not count toward growth.
        t.insert(0, 100);
        assert_eq!(t.capacity(), 7);

        t.insert(7, 7);
        assert_eq!(t.capacity(), 13);
        assert_eq!(t.size(), 8);

        for i in 0..8 {
            t.remove(&i);
        }
        assert_eq!(t.capacity(), 13);
    }

    #[test]
    fn rehash_preserves_membership_and_values() {
        let mut t: HashTable<u32, String> = HashTable::with_capacity(101).unwrap();
        for i in 0..150 {
            t.insert(i, format!("v{i}"));
        }
        assert_eq!(t.size(), 150);
        assert!(t.capacity() >= 150);
        assert!(is_prime(t.capacity()));
        for i in 0..150 {
            assert!(t.matches(&i, &format!("v{i}")), "lost key {i}");
        }
        assert_eq!(t.bucket_lens().iter().sum::<usize>(), 150);
    }

    /// Invariant: every rehash returns the table to the steady phase with
    /// each entry in the bucket its stored hash selects.
    #[test]
    fn rehash_leaves_table_steady_and_consistent() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(2).unwrap();
        for i in 0..200 {
            t.insert(i, i);
            assert_eq!(t.phase, Phase::Steady);
        }
        assert!(t.capacity() > 2);
        for (idx, bucket) in t.buckets.iter().enumerate() {
            for e in bucket.iter() {
                assert_eq!(t.bucket_index(e.hash), idx);
            }
        }
    }

    /// Invariant: lookups resolve by equality when every key collides.
    #[test]
    fn collision_handling_with_const_hasher() {
        let mut t: HashTable<String, i32, ConstBuildHasher> =
            HashTable::with_capacity_and_hasher(5, ConstBuildHasher).unwrap();
        for (i, k) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            t.insert((*k).to_string(), i as i32);
        }
        // Sixth insert grew the table, but every entry still chains in bucket 0.
        assert_eq!(t.capacity(), 7);
        assert_eq!(t.bucket_lens()[0], 6);
        assert!(t.matches("c", &2));
        assert!(t.remove("c"));
        assert!(!t.contains("c"));
        assert!(t.contains("d"));
        let order: Vec<&str> = t.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, ["a", "b", "d", "e", "f"]);
    }

    #[test]
    fn dump_lists_every_bucket_in_chain_order() {
        let mut t: HashTable<String, i32, ConstBuildHasher> =
            HashTable::with_capacity_and_hasher(3, ConstBuildHasher).unwrap();
        t.insert("x".to_string(), 1);
        t.insert("y".to_string(), 2);
        assert_eq!(t.dump().to_string(), "Bucket 0: x:1 y:2\nBucket 1: \nBucket 2: \n");
    }

    #[test]
    fn iter_is_exact_size_and_matches_contents() {
        let t: HashTable<u32, u32> = (0..40).map(|i| (i, i * 2)).collect();
        let it = t.iter();
        assert_eq!(it.len(), 40);
        let seen: BTreeMap<u32, u32> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: BTreeMap<u32, u32> = (0..40).map(|i| (i, i * 2)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn get_mut_updates_value() {
        let mut t = HashTable::new();
        t.insert("k".to_string(), 10);
        *t.get_mut("k").unwrap() += 5;
        assert!(t.matches("k", &15));
        assert!(t.get_mut("missing").is_none());
    }

    #[test]
    fn load_from_stops_at_first_bad_line() {
        let mut t: HashTable<String, u32> = HashTable::new();
        let input = "a 1\n\nb 2\nc notanumber\nd 4\n";
        let n = t.load_from(input.as_bytes()).unwrap();
        assert_eq!(n, 2);
        assert!(t.matches("a", &1));
        assert!(t.matches("b", &2));
        assert!(!t.contains("c"));
        assert!(!t.contains("d"));
    }

    #[test]
    fn load_from_rejects_lines_without_exactly_two_tokens() {
        let mut t: HashTable<String, String> = HashTable::new();
        assert_eq!(t.load_from("a 1\nlonely\nb 2\n".as_bytes()).unwrap(), 1);
        let mut t: HashTable<String, String> = HashTable::new();
        assert_eq!(t.load_from("a 1 extra\n".as_bytes()).unwrap(), 0);
    }

    #[test]
    fn write_to_emits_key_value_lines_in_iteration_order() {
        let mut t: HashTable<String, i32, ConstBuildHasher> =
            HashTable::with_capacity_and_hasher(3, ConstBuildHasher).unwrap();
        t.insert("x".to_string(), 1);
        t.insert("y".to_string(), 2);
        let mut out = Vec::new();
        t.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x 1\ny 2\n");
    }

    #[test]
    fn debug_renders_as_map() {
        let mut t: HashTable<String, i32> = HashTable::new();
        t.insert("only".to_string(), 7);
        assert_eq!(format!("{t:?}"), r#"{"only": 7}"#);
    }
}
