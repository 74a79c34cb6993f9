//! HashTable: unique-key map over separately chained buckets, with copyable
//! cursors resolved against the table.

use crate::buckets::{Buckets, Entry, DEFAULT_BUCKET_COUNT, DEFAULT_MAX_LOAD_FACTOR};
use crate::builder::HashTableBuilder;
use crate::chain::{ArenaIterMut, NodeKey};
use crate::error::{Error, InsertError};
use crate::reentrancy::ReentrancyCheck;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// Position of one entry in a [`HashTable`], or the end sentinel.
///
/// A cursor is a plain value: it borrows nothing and is resolved against
/// the table it came from (`key`, `value`, `value_mut`, `next`). Every end
/// cursor equals `Cursor::default()`. A cursor whose entry has been erased
/// resolves to `None` and advances to the end; it never aliases a later
/// entry.
///
/// Two cursors are equal when they name the same entry (or are both the
/// end), whichever directory generation they were produced in.
///
/// Inserting keys or rehashing while walking with cursors gives no
/// guarantee about which entries the walk still visits. The cursor returned
/// by [`HashTable::erase`] is always a valid successor.
#[derive(Copy, Clone, Debug, Default)]
pub struct Cursor {
    bucket: usize,
    node: Option<NodeKey>,
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Cursor {}

// `bucket` is only a position hint; identity is the node.
impl Hash for Cursor {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl Cursor {
    /// The end sentinel.
    pub const END: Cursor = Cursor {
        bucket: 0,
        node: None,
    };

    pub(crate) const fn at(bucket: usize, node: NodeKey) -> Self {
        Cursor {
            bucket,
            node: Some(node),
        }
    }

    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Bucket the entry was in when this cursor was produced.
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    pub(crate) fn node(&self) -> Option<NodeKey> {
        self.node
    }

    pub fn key<'a, K, V, S>(&self, table: &'a HashTable<K, V, S>) -> Option<&'a K> {
        table.buckets.entry(*self).map(|e| &e.key)
    }

    pub fn value<'a, K, V, S>(&self, table: &'a HashTable<K, V, S>) -> Option<&'a V> {
        table.buckets.entry(*self).map(|e| &e.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, table: &'a mut HashTable<K, V, S>) -> Option<&'a mut V> {
        table.buckets.entry_mut(*self).map(|e| &mut e.value)
    }

    pub fn entry<'a, K, V, S>(&self, table: &'a HashTable<K, V, S>) -> Option<(&'a K, &'a V)> {
        table.buckets.entry(*self).map(|e| (&e.key, &e.value))
    }

    /// The key stays shared: changing it would strand the entry in the
    /// wrong bucket.
    pub fn entry_mut<'a, K, V, S>(
        &self,
        table: &'a mut HashTable<K, V, S>,
    ) -> Option<(&'a K, &'a mut V)> {
        table.buckets.entry_mut(*self).map(|e| (&e.key, &mut e.value))
    }

    /// Following position in `table`.
    pub fn next<K, V, S>(self, table: &HashTable<K, V, S>) -> Cursor {
        table.advance(self)
    }
}

/// Unique-key map with separate chaining.
///
/// Buckets are chains in one node arena; growing the directory relinks
/// nodes into their new buckets and never clones, moves or drops an entry.
/// The table is single-threaded: it is `Send` when its contents are, but
/// not `Sync`.
pub struct HashTable<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: Buckets<K, V>,
    reentrancy: ReentrancyCheck,
}

impl<K, V> HashTable<K, V, DefaultHashBuilder> {
    /// Empty table with one bucket and a max load factor of 1.0.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Empty table with `bucket_count` buckets (zero is allowed).
    pub fn with_buckets(bucket_count: usize) -> Self {
        Self::with_buckets_and_hasher(bucket_count, DefaultHashBuilder::default())
    }
}

impl HashTable<(), (), DefaultHashBuilder> {
    pub fn builder() -> HashTableBuilder<DefaultHashBuilder> {
        HashTableBuilder::new()
    }
}

impl<K, V> Default for HashTable<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashTable<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_buckets_and_hasher(DEFAULT_BUCKET_COUNT, hasher)
    }

    pub fn with_buckets_and_hasher(bucket_count: usize, hasher: S) -> Self {
        Self::from_parts(bucket_count, DEFAULT_MAX_LOAD_FACTOR, hasher)
    }

    /// # Panics
    /// If `max_load_factor` is not finite and positive.
    pub(crate) fn from_parts(bucket_count: usize, max_load_factor: f32, hasher: S) -> Self {
        Self {
            hasher,
            buckets: Buckets::new(bucket_count, max_load_factor),
            reentrancy: ReentrancyCheck::new(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.bucket_count()
    }

    /// Number of entries in bucket `n`.
    ///
    /// # Panics
    /// If `n >= bucket_count()`.
    pub fn bucket_size(&self, n: usize) -> usize {
        self.buckets.bucket_size(n)
    }

    /// `len() / bucket_count()`, or 0 for a table without buckets.
    pub fn load_factor(&self) -> f32 {
        self.buckets.load_factor()
    }

    pub fn max_load_factor(&self) -> f32 {
        self.buckets.max_load_factor()
    }

    /// Change the load-factor policy; rehashes right away if the current
    /// load factor is above `lf`.
    ///
    /// # Panics
    /// If `lf` is not finite and positive.
    pub fn set_max_load_factor(&mut self, lf: f32) {
        let _s = self.reentrancy.enter("set_max_load_factor");
        self.buckets.set_max_load_factor(lf);
    }

    /// Rebuild the directory with `bucket_count` buckets, or with the smallest
    /// count that keeps `load_factor() <= max_load_factor()` if that is
    /// larger. Entries are relinked into their new buckets, not copied.
    /// Outstanding cursors other than erase results lose their walk position.
    pub fn rehash(&mut self, bucket_count: usize) {
        let _s = self.reentrancy.enter("rehash");
        self.buckets.relocate(bucket_count);
    }

    /// Size the directory for `items` entries: `rehash(ceil(items / max_load_factor))`.
    /// Like `rehash`, this can shrink the directory.
    pub fn reserve(&mut self, items: usize) {
        let _s = self.reentrancy.enter("reserve");
        self.buckets.reserve(items);
    }

    /// Drop every entry, keeping the bucket count.
    pub fn clear(&mut self) {
        let _s = self.reentrancy.enter("clear");
        self.buckets.clear();
    }

    /// Cursor to the first entry, or `Cursor::END` when empty.
    pub fn begin(&self) -> Cursor {
        self.buckets.begin()
    }

    pub fn end(&self) -> Cursor {
        Cursor::END
    }

    /// Following position: the next entry in the same bucket, else the head
    /// of the next non-empty bucket, else the end.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        self.buckets.advance(cursor)
    }

    /// Remove the entry at `cursor` and return the cursor that followed it.
    ///
    /// `erase(END)` is a no-op returning `END`. Feeding the result back in
    /// while walking removes entries in one pass without skipping or
    /// revisiting any.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        if cursor.is_end() {
            return Cursor::END;
        }
        let _s = self.reentrancy.enter("erase");
        self.buckets.erase(cursor)
    }

    /// Keep only the entries for which `f` returns `true`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.begin();
        while let Some((k, v)) = cursor.entry_mut(self) {
            cursor = if f(k, v) {
                self.advance(cursor)
            } else {
                self.erase(cursor)
            };
        }
    }

    /// Walk entries bucket by bucket, chain order within a bucket.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: &self.buckets,
            cursor: self.buckets.begin(),
            remaining: self.buckets.len(),
        }
    }

    /// Mutable access to every value. Visiting order is unspecified and may
    /// differ from [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.buckets.nodes_mut(),
        }
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Build a table from `(key, value)` pairs. The directory is sized from
    /// the iterator's lower size bound; later duplicates are discarded.
    pub fn from_iter_with_hasher<I>(iter: I, hasher: S) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let iter = iter.into_iter();
        let mut t = Self::with_hasher(hasher);
        let (lower, _) = iter.size_hint();
        if lower > 0 {
            t.reserve(lower);
        }
        t.extend(iter);
        t
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Bucket `q` hashes to, or `None` when the table has no buckets.
    pub fn bucket<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buckets.bucket_of(self.make_hash(q))
    }

    /// Cursor to the entry for `q`, or `Cursor::END`. Scans only the
    /// bucket `q` hashes to.
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _s = self.reentrancy.enter("find");
        let hash = self.make_hash(q);
        self.buckets.locate(hash, |k| k.borrow() == q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.find(q).is_end()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).value(self)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).value_mut(self)
    }

    /// Like [`get`](Self::get), but a missing key is an error.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(Error::NotFound)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(q).ok_or(Error::NotFound)
    }

    /// Insert `key -> value` unless `key` is already present.
    ///
    /// On a duplicate, the candidate pair is dropped, the stored value is
    /// left as is, and the error carries a cursor to the stored entry.
    pub fn insert(&mut self, key: K, value: V) -> Result<Cursor, InsertError> {
        self.insert_with(key, || value)
    }

    /// Insert `key -> default()` unless `key` is already present;
    /// `default` only runs when the entry is created.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> Result<Cursor, InsertError>
    where
        F: FnOnce() -> V,
    {
        let _s = self.reentrancy.enter("insert");
        let hash = self.make_hash(&key);
        let existing = self.buckets.locate(hash, |k| *k == key);
        if !existing.is_end() {
            return Err(InsertError::DuplicateKey(existing));
        }
        let value = default();
        Ok(self.buckets.insert(Entry { key, value, hash }))
    }

    /// Value for `key`, inserting `default()` first if absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let cursor = match self.insert_with(key, default) {
            Ok(c) => c,
            Err(InsertError::DuplicateKey(c)) => c,
        };
        cursor
            .value_mut(self)
            .expect("entry must exist immediately after insert")
    }

    /// Value for `key`, inserting `V::default()` first if absent.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Remove the entry for `q` and return its value.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let cursor = self.find(q);
        let _s = self.reentrancy.enter("remove");
        self.buckets.take(cursor).map(|e| (e.key, e.value))
    }
}

impl<K, Q, V, S> Index<&Q> for HashTable<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    /// If `key` is not present.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S> Clone for HashTable<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            buckets: self.buckets.clone(),
            reentrancy: ReentrancyCheck::new(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Same keys with equal values; bucket layout is irrelevant.
impl<K, V, S> PartialEq for HashTable<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for HashTable<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_with_hasher(iter, S::default())
    }
}

/// Duplicate keys are discarded, not overwritten.
impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Iterator over shared entries, following the cursor walk.
pub struct Iter<'a, K, V> {
    buckets: &'a Buckets<K, V>,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.buckets.entry(self.cursor)?;
        self.cursor = self.buckets.advance(self.cursor);
        self.remaining -= 1;
        Some((&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over mutable values.
pub struct IterMut<'a, K, V> {
    it: ArenaIterMut<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
