//! chained-hashmap: a unique-key hash table with separate chaining, built
//! from a growable array and doubly linked chains.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build the table in small safe layers, each with its own
//!   contract.
//! - Layers:
//!   - DynamicArray<T>: owning contiguous sequence with an explicit
//!     capacity policy (doubling from 1 on push, exact on reserve).
//!   - Chain<T> + NodeArena<T>: doubly linked lists whose nodes live in a
//!     generational slot arena. A node can be detached from one chain and
//!     appended to another without touching its payload.
//!   - Buckets<K, V>: the bucket directory (a DynamicArray of chains), the
//!     shared node arena, and the load-factor policy. Hash-agnostic: it is
//!     driven by precomputed hashes and caller-supplied equality.
//!   - HashTable<K, V, S>: public API. Hashes keys, enforces uniqueness,
//!     hands out copyable `Cursor`s.
//!
//! Constraints
//! - Single-threaded: the table is `Send` when its contents are, never
//!   `Sync`.
//! - The library has no unsafe code.
//! - Unique keys; a duplicate insert fails and reports the stored entry.
//! - `find` scans only the bucket the key hashes to.
//! - Reentrancy: the table calls user code only through `K: Hash`,
//!   `K: Eq` and value constructors passed to `insert_with`. Re-entering
//!   the same table from there panics in debug builds.
//!
//! Load factor and rehashing
//! - `load_factor() = len() / bucket_count()`, or 0 with no buckets.
//! - Before an insert that would push the load factor above
//!   `max_load_factor()`, the directory grows to
//!   `max(2 * bucket_count, smallest count that fits, 1)`.
//! - `rehash(n)` clamps `n` up to the smallest count that keeps the load
//!   factor within the maximum and is a no-op if that equals the current
//!   count. `reserve(n)` is `rehash(ceil(n / max_load_factor))`.
//! - Each entry stores its 64-bit hash. Rehashing relinks nodes into their
//!   new buckets: no `K: Hash` calls, no clones, no drops, no payload moves.
//!
//! Cursors
//! - A `Cursor` names a bucket and a generational node key. It borrows
//!   nothing; resolve it with `key`/`value`/`value_mut` against the table.
//! - A cursor whose entry was erased resolves to `None`. The live bucket is
//!   recomputed from the stored hash, so cursors to surviving entries keep
//!   resolving after a rehash.
//! - `erase(cursor)` returns the following position, so entries can be
//!   removed in a single forward walk.
//!
//! Notes and non-goals
//! - No multi-key variant, no ordered iteration, no concurrent access.
//! - Keys are immutable once inserted; there is no `key_mut`.

mod buckets;
pub mod builder;
pub mod chain;
pub mod dynamic_array;
pub mod error;
pub mod hash_table;
mod hash_table_proptest;
mod reentrancy;

// Public surface
pub use builder::HashTableBuilder;
pub use chain::{Chain, Detached, NodeArena, NodeKey};
pub use dynamic_array::DynamicArray;
pub use error::{Error, InsertError};
pub use hash_table::{Cursor, HashTable, Iter, IterMut};
