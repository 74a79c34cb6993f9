//! Buckets: the bucket directory, the node arena behind it, and the
//! load-factor policy.
//!
//! This layer never hashes and never compares keys itself. Callers pass the
//! precomputed 64-bit hash and, for lookups, an equality predicate. Each
//! entry keeps its hash, so relocating nodes into a differently sized
//! directory needs no call into `K: Hash`.

use crate::chain::{ArenaIterMut, Chain, NodeArena, NodeKey};
use crate::dynamic_array::DynamicArray;
use crate::hash_table::Cursor;

pub(crate) const DEFAULT_BUCKET_COUNT: usize = 1;
pub(crate) const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

pub(crate) struct Buckets<K, V> {
    directory: DynamicArray<Chain<Entry<K, V>>>,
    nodes: NodeArena<Entry<K, V>>,
    items: usize,
    max_load_factor: f32,
}

#[inline]
fn slot_for(hash: u64, bucket_count: usize) -> usize {
    debug_assert!(bucket_count > 0);
    (hash % bucket_count as u64) as usize
}

fn empty_directory<K, V>(bucket_count: usize) -> DynamicArray<Chain<Entry<K, V>>> {
    let mut d = DynamicArray::with_capacity(bucket_count);
    d.resize_with(bucket_count, Chain::new);
    d
}

pub(crate) fn check_max_load_factor(lf: f32) {
    assert!(
        lf.is_finite() && lf > 0.0,
        "max load factor must be finite and positive, got {lf}"
    );
}

impl<K, V> Buckets<K, V> {
    pub(crate) fn new(bucket_count: usize, max_load_factor: f32) -> Self {
        check_max_load_factor(max_load_factor);
        Self {
            directory: empty_directory(bucket_count),
            nodes: NodeArena::new(),
            items: 0,
            max_load_factor,
        }
    }

    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.items, self.nodes.len());
        self.items
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.directory.len()
    }

    pub(crate) fn bucket_size(&self, n: usize) -> usize {
        self.directory[n].len()
    }

    pub(crate) fn bucket_of(&self, hash: u64) -> Option<usize> {
        match self.bucket_count() {
            0 => None,
            n => Some(slot_for(hash, n)),
        }
    }

    pub(crate) fn load_factor(&self) -> f32 {
        match self.bucket_count() {
            0 => 0.0,
            n => (self.items as f64 / n as f64) as f32,
        }
    }

    pub(crate) fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    pub(crate) fn set_max_load_factor(&mut self, lf: f32) {
        check_max_load_factor(lf);
        self.max_load_factor = lf;
        if self.items as f64 > lf as f64 * self.bucket_count() as f64 {
            self.reserve(self.items);
        }
    }

    /// Smallest bucket count that holds `items` entries within the policy.
    fn min_bucket_count(&self, items: usize) -> usize {
        if items == 0 {
            return 0;
        }
        let lf = self.max_load_factor as f64;
        let mut n = (items as f64 / lf).ceil() as usize;
        while items as f64 > lf * n as f64 {
            n += 1;
        }
        n.max(1)
    }

    /// Resize the directory for an anticipated `items` entries.
    pub(crate) fn reserve(&mut self, items: usize) {
        self.relocate(self.min_bucket_count(items));
    }

    /// Rebuild the directory with `max(requested, min_bucket_count(len))`
    /// buckets, moving every node into its new bucket by relinking only.
    pub(crate) fn relocate(&mut self, requested: usize) {
        let target = requested.max(self.min_bucket_count(self.items));
        if target == self.bucket_count() {
            return;
        }

        #[cfg(feature = "logging")]
        log::debug!(
            "rehash: {} -> {} buckets ({} entries)",
            self.bucket_count(),
            target,
            self.items
        );

        let mut old = std::mem::replace(&mut self.directory, empty_directory(target));
        for chain in old.iter_mut() {
            while let Some(node) = chain.detach_front(&mut self.nodes) {
                let slot = slot_for(self.nodes.payload(&node).hash, target);
                self.directory[slot].append(&mut self.nodes, node);
            }
        }
    }

    /// Grow geometrically if holding `items` entries would break the policy.
    fn grow_for(&mut self, items: usize) {
        let count = self.bucket_count();
        if items as f64 <= self.max_load_factor as f64 * count as f64 {
            return;
        }
        let target = count
            .saturating_mul(2)
            .max(self.min_bucket_count(items))
            .max(1);

        #[cfg(feature = "logging")]
        log::trace!("growing bucket directory for {items} entries");

        self.relocate(target);
    }

    /// First entry in bucket `hash mod bucket_count` satisfying `eq`.
    pub(crate) fn locate<F>(&self, hash: u64, mut eq: F) -> Cursor
    where
        F: FnMut(&K) -> bool,
    {
        let Some(slot) = self.bucket_of(hash) else {
            return Cursor::END;
        };
        self.directory[slot]
            .iter(&self.nodes)
            .find(|(_, e)| e.hash == hash && eq(&e.key))
            .map_or(Cursor::END, |(k, _)| Cursor::at(slot, k))
    }

    /// Append a new entry to its bucket, growing the directory first when
    /// needed. The key must not be present yet.
    pub(crate) fn insert(&mut self, entry: Entry<K, V>) -> Cursor {
        self.grow_for(self.items + 1);
        let slot = slot_for(entry.hash, self.bucket_count());
        let key = self.directory[slot].push_back(&mut self.nodes, entry);
        self.items += 1;
        Cursor::at(slot, key)
    }

    /// Bucket the cursor's entry currently lives in, derived from its hash
    /// rather than trusted from the cursor.
    fn home(&self, cursor: Cursor) -> Option<(usize, NodeKey)> {
        let key = cursor.node()?;
        let e = self.nodes.get(key)?;
        Some((slot_for(e.hash, self.bucket_count()), key))
    }

    pub(crate) fn entry(&self, cursor: Cursor) -> Option<&Entry<K, V>> {
        self.nodes.get(cursor.node()?)
    }

    pub(crate) fn entry_mut(&mut self, cursor: Cursor) -> Option<&mut Entry<K, V>> {
        self.nodes.get_mut(cursor.node()?)
    }

    pub(crate) fn begin(&self) -> Cursor {
        self.first_from(0)
    }

    fn first_from(&self, start: usize) -> Cursor {
        (start..self.bucket_count())
            .find_map(|slot| self.directory[slot].head().map(|k| Cursor::at(slot, k)))
            .unwrap_or(Cursor::END)
    }

    /// Step to the next entry: along the chain, then across to the next
    /// non-empty bucket, then to the end.
    pub(crate) fn advance(&self, cursor: Cursor) -> Cursor {
        let Some((slot, key)) = self.home(cursor) else {
            return Cursor::END;
        };
        match self.directory[slot].next(&self.nodes, key) {
            Some(next) => Cursor::at(slot, next),
            None => self.first_from(slot + 1),
        }
    }

    /// Unlink and drop the entry at `cursor`, returning its successor.
    pub(crate) fn erase(&mut self, cursor: Cursor) -> Cursor {
        let next = self.advance(cursor);
        drop(self.take(cursor));
        next
    }

    /// Unlink the entry at `cursor` and hand it back.
    pub(crate) fn take(&mut self, cursor: Cursor) -> Option<Entry<K, V>> {
        let (slot, key) = self.home(cursor)?;
        let entry = self.directory[slot].remove(&mut self.nodes, key)?;
        self.items -= 1;
        Some(entry)
    }

    /// Drop every entry; the bucket count is kept.
    pub(crate) fn clear(&mut self) {
        for chain in self.directory.iter_mut() {
            *chain = Chain::new();
        }
        self.items = 0;
        self.nodes.clear();
    }

    pub(crate) fn nodes_mut(&mut self) -> ArenaIterMut<'_, Entry<K, V>> {
        self.nodes.iter_mut()
    }
}

impl<K: Clone, V: Clone> Clone for Buckets<K, V> {
    fn clone(&self) -> Self {
        let mut nodes = NodeArena::with_capacity(self.items);
        let directory = self
            .directory
            .iter()
            .map(|chain| chain.clone_in(&self.nodes, &mut nodes))
            .collect();
        Self {
            directory,
            nodes,
            items: self.items,
            max_load_factor: self.max_load_factor,
        }
    }
}
