//! Error kinds surfaced by the strict accessors and by insertion.

use crate::hash_table::Cursor;

/// Failure of a bounds- or presence-checked accessor.
///
/// Lookups that may legitimately miss (`find`, `get`, `contains_key`) never
/// produce this; they return an end cursor or `None` instead.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// [`HashTable::at`](crate::HashTable::at) was called with a key that is
    /// not present. The table is left untouched.
    #[error("no entry found for the requested key")]
    NotFound,

    /// [`DynamicArray::at`](crate::DynamicArray::at) was called with an index
    /// at or beyond the current length.
    #[error("index {index} is out of range for length {len}")]
    OutOfRange { index: usize, len: usize },
}

/// Rejected insertion.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// The key is already present. The candidate entry was dropped and the
    /// stored value was not overwritten; the cursor points at the stored entry.
    #[error("key is already present in the table")]
    DuplicateKey(Cursor),
}

impl InsertError {
    /// Cursor to the entry that blocked the insertion.
    pub fn existing(&self) -> Cursor {
        match *self {
            InsertError::DuplicateKey(c) => c,
        }
    }
}
