use crate::buckets::{check_max_load_factor, DEFAULT_BUCKET_COUNT, DEFAULT_MAX_LOAD_FACTOR};
use crate::HashTable;
use hashbrown::hash_map::DefaultHashBuilder;

/// Builds a [`HashTable`] with a chosen initial bucket count, max load
/// factor and hasher.
///
/// ```
/// use chained_hashmap::HashTable;
///
/// let mut t: HashTable<&str, u32> = HashTable::builder()
///     .bucket_count(16)
///     .max_load_factor(0.75)
///     .build();
/// t.insert("a", 1).unwrap();
/// assert_eq!(t.bucket_count(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct HashTableBuilder<S> {
    bucket_count: usize,
    max_load_factor: f32,
    hasher: S,
}

impl HashTableBuilder<DefaultHashBuilder> {
    pub fn new() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            hasher: DefaultHashBuilder::default(),
        }
    }
}

impl Default for HashTableBuilder<DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> HashTableBuilder<S> {
    /// Initial number of buckets. Zero is allowed; the first insert grows it.
    pub fn bucket_count(self, bucket_count: usize) -> Self {
        Self {
            bucket_count,
            ..self
        }
    }

    /// # Panics
    ///
    /// Panics if `lf` is not finite and positive.
    pub fn max_load_factor(self, lf: f32) -> Self {
        check_max_load_factor(lf);
        Self {
            max_load_factor: lf,
            ..self
        }
    }

    pub fn hasher<T>(self, hasher: T) -> HashTableBuilder<T> {
        HashTableBuilder {
            bucket_count: self.bucket_count,
            max_load_factor: self.max_load_factor,
            hasher,
        }
    }

    pub fn build<K, V>(self) -> HashTable<K, V, S> {
        HashTable::from_parts(self.bucket_count, self.max_load_factor, self.hasher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    #[test]
    fn defaults_match_new() {
        let t: HashTable<u32, u32> = HashTableBuilder::new().build();
        assert_eq!(t.bucket_count(), 1);
        assert_eq!(t.max_load_factor(), 1.0);
        assert!(t.is_empty());
    }

    #[test]
    fn custom_settings_are_applied() {
        let mut t: HashTable<u32, u32, RandomState> = HashTable::builder()
            .bucket_count(0)
            .max_load_factor(2.0)
            .hasher(RandomState::new())
            .build();
        assert_eq!(t.bucket_count(), 0);
        assert_eq!(t.load_factor(), 0.0);
        t.insert(1, 1).unwrap();
        t.insert(2, 2).unwrap();
        assert_eq!(t.bucket_count(), 1);
        assert_eq!(t.load_factor(), 2.0);
    }

    #[test]
    #[should_panic(expected = "max load factor")]
    fn rejects_nan_load_factor() {
        let _ = HashTableBuilder::new().max_load_factor(f32::NAN);
    }
}
