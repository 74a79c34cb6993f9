//! DynamicArray: owning, contiguous, growable sequence with an explicit
//! capacity policy.
//!
//! Storage is a `Vec<T>`; this type owns the growth policy on top of it.
//! `capacity()` reports the policy capacity (doubling from 1 on `push`,
//! exact on `reserve`), and the backing buffer is always at least that large.

use crate::error::Error;
use core::hash::{Hash, Hasher};
use core::ops::{Index, IndexMut};
use core::slice;

pub struct DynamicArray<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> DynamicArray<T> {
    /// Empty array with no storage.
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            capacity: 0,
        }
    }

    /// Empty array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut a = Self::new();
        a.reserve(capacity);
        a
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ensure room for at least `new_capacity` elements in total.
    ///
    /// No-op when `new_capacity <= capacity()`. Otherwise the storage is
    /// reallocated to exactly `new_capacity` slots and existing elements are
    /// moved over in order.
    pub fn reserve(&mut self, new_capacity: usize) {
        if new_capacity <= self.capacity {
            return;
        }
        self.items.reserve_exact(new_capacity - self.items.len());
        self.capacity = new_capacity;
    }

    /// Append `value`, doubling capacity when full.
    pub fn push(&mut self, value: T) {
        if self.items.len() == self.capacity {
            let grown = match self.capacity {
                0 => 1,
                c => c.checked_mul(2).unwrap_or(usize::MAX),
            };
            self.reserve(grown);
        }
        self.items.push(value);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Resize to exactly `new_len` elements, filling new slots with `f()` and
    /// dropping trailing elements when shrinking. Capacity never shrinks.
    pub fn resize_with<F>(&mut self, new_len: usize, f: F)
    where
        F: FnMut() -> T,
    {
        self.reserve(new_len);
        self.items.resize_with(new_len, f);
    }

    /// Drop every element; capacity is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T, Error> {
        let len = self.items.len();
        self.items.get(index).ok_or(Error::OutOfRange { index, len })
    }

    /// Bounds-checked mutable access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, Error> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Random-access iterator: supports `nth`, `nth_back`, `len` and
    /// reverse traversal.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T: Default> DynamicArray<T> {
    /// Resize to exactly `new_len`, value-initializing new slots.
    pub fn resize(&mut self, new_len: usize) {
        self.resize_with(new_len, T::default);
    }
}

/// The copy keeps the source's policy capacity and allocates for it.
impl<T: Clone> Clone for DynamicArray<T> {
    fn clone(&self) -> Self {
        let mut items = Vec::with_capacity(self.capacity);
        items.extend_from_slice(&self.items);
        Self {
            items,
            capacity: self.capacity,
        }
    }
}

/// Element-wise, like a slice; capacity is not part of the value.
impl<T: PartialEq> PartialEq for DynamicArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for DynamicArray<T> {}

impl<T: Hash> Hash for DynamicArray<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.items.hash(state);
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

/// Unchecked-style access: panics on an out-of-range index like a slice.
impl<T> Index<usize> for DynamicArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for DynamicArray<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut a = Self::new();
        a.extend(iter);
        a
    }
}

impl<T> Extend<T> for DynamicArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(self.len().saturating_add(lower));
        for v in iter {
            self.push(v);
        }
    }
}

impl<T> IntoIterator for DynamicArray<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DynamicArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicArray<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}
