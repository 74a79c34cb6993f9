//! Chain: doubly linked list over nodes stored in a shared `NodeArena`.
//!
//! Nodes live in a `SlotMap` and link to each other through generational
//! `NodeKey`s, so a chain is only a `{head, tail, len}` header. Moving a node
//! between two chains of the same arena is pure relinking: `detach` unlinks
//! it and hands back a `Detached` token, `append` links that token at the
//! tail of another chain. The payload is never cloned, moved or dropped on
//! the way.
//!
//! Every operation takes the arena explicitly. A chain must only ever be
//! used with the arena its nodes were allocated in.

use core::iter::FusedIterator;
use core::marker::PhantomData;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable identity of a node inside a [`NodeArena`]. Keys of freed nodes
    /// are never reused for later nodes.
    pub struct NodeKey;
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<NodeKey>,
    next: Option<NodeKey>,
}

/// Owns the storage of every node of one or more chains.
#[derive(Debug)]
pub struct NodeArena<T> {
    slots: SlotMap<NodeKey, Node<T>>,
}

/// Ownership of a node that is allocated but linked into no chain.
///
/// Produced by [`Chain::detach`] and consumed by [`Chain::append`] or
/// [`NodeArena::free`]. Dropping it leaves the node allocated until the
/// arena itself is dropped or cleared.
#[must_use = "a detached node must be appended to a chain or freed"]
#[derive(Debug, PartialEq, Eq)]
pub struct Detached(NodeKey);

impl Detached {
    pub fn key(&self) -> NodeKey {
        self.0
    }
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Number of allocated nodes, linked or detached.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn get(&self, key: NodeKey) -> Option<&T> {
        self.slots.get(key).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut T> {
        self.slots.get_mut(key).map(|n| &mut n.value)
    }

    /// Destroy a detached node and return its payload.
    pub fn free(&mut self, node: Detached) -> T {
        match self.slots.remove(node.0) {
            Some(n) => {
                debug_assert!(n.prev.is_none() && n.next.is_none());
                n.value
            }
            // A `Detached` is only minted for a live node and is consumed here.
            None => unreachable!("detached node missing from its arena"),
        }
    }

    /// Payload of a detached node, readable while it is between chains.
    pub fn payload(&self, node: &Detached) -> &T {
        &self.slots[node.0].value
    }

    /// Drop every node. Headers of chains over this arena become dangling
    /// and must be reset by the caller.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Mutable access to every payload in storage order.
    pub fn iter_mut(&mut self) -> ArenaIterMut<'_, T> {
        ArenaIterMut {
            it: self.slots.iter_mut(),
        }
    }

    fn alloc(&mut self, value: T) -> NodeKey {
        self.slots.insert(Node {
            value,
            prev: None,
            next: None,
        })
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(NodeKey, &mut T)` in arena storage order.
pub struct ArenaIterMut<'a, T> {
    it: slotmap::basic::IterMut<'a, NodeKey, Node<T>>,
}

impl<'a, T> Iterator for ArenaIterMut<'a, T> {
    type Item = (NodeKey, &'a mut T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, n)| (k, &mut n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> ExactSizeIterator for ArenaIterMut<'_, T> {}

/// Header of a doubly linked list whose nodes live in a [`NodeArena`].
#[derive(Debug)]
pub struct Chain<T> {
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Chain<T> {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<NodeKey> {
        self.head
    }

    pub fn tail(&self) -> Option<NodeKey> {
        self.tail
    }

    pub fn front<'a>(&self, arena: &'a NodeArena<T>) -> Option<&'a T> {
        self.head.and_then(|k| arena.get(k))
    }

    pub fn back<'a>(&self, arena: &'a NodeArena<T>) -> Option<&'a T> {
        self.tail.and_then(|k| arena.get(k))
    }

    /// Allocate a node holding `value` and link it at the tail.
    pub fn push_back(&mut self, arena: &mut NodeArena<T>, value: T) -> NodeKey {
        let key = arena.alloc(value);
        self.link_back(arena, key);
        key
    }

    /// Link an already allocated, detached node at the tail.
    pub fn append(&mut self, arena: &mut NodeArena<T>, node: Detached) -> NodeKey {
        let key = node.0;
        self.link_back(arena, key);
        key
    }

    /// Unlink `key` without destroying it.
    ///
    /// Returns `None` (and changes nothing) if the node no longer exists, if
    /// this chain is empty, or if `key` is an end node or a detached node
    /// that this chain does not start or end with. Membership of an interior
    /// node cannot be checked in O(1); passing one from another chain is a
    /// logic error.
    pub fn detach(&mut self, arena: &mut NodeArena<T>, key: NodeKey) -> Option<Detached> {
        let (prev, next) = {
            let n = arena.slots.get(key)?;
            (n.prev, n.next)
        };
        if self.len == 0
            || (prev.is_none() && self.head != Some(key))
            || (next.is_none() && self.tail != Some(key))
        {
            return None;
        }

        match prev {
            Some(p) => arena.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => arena.slots[n].prev = prev,
            None => self.tail = prev,
        }
        let n = &mut arena.slots[key];
        n.prev = None;
        n.next = None;
        self.len -= 1;
        Some(Detached(key))
    }

    /// Unlink the head without destroying it.
    pub fn detach_front(&mut self, arena: &mut NodeArena<T>) -> Option<Detached> {
        let head = self.head?;
        self.detach(arena, head)
    }

    /// Unlink and destroy `key`, returning the position that followed it
    /// (`None` past the tail or when `key` no longer exists).
    pub fn erase(&mut self, arena: &mut NodeArena<T>, key: NodeKey) -> Option<NodeKey> {
        let next = arena.slots.get(key)?.next;
        let node = self.detach(arena, key)?;
        drop(arena.free(node));
        next
    }

    /// Unlink and destroy `key`, returning its payload.
    pub fn remove(&mut self, arena: &mut NodeArena<T>, key: NodeKey) -> Option<T> {
        let node = self.detach(arena, key)?;
        Some(arena.free(node))
    }

    pub fn pop_front(&mut self, arena: &mut NodeArena<T>) -> Option<T> {
        let node = self.detach_front(arena)?;
        Some(arena.free(node))
    }

    /// Destroy every node of this chain; other chains in `arena` are untouched.
    pub fn clear(&mut self, arena: &mut NodeArena<T>) {
        while self.pop_front(arena).is_some() {}
    }

    /// Position after `key`, or `None` past the tail.
    pub fn next(&self, arena: &NodeArena<T>, key: NodeKey) -> Option<NodeKey> {
        arena.slots.get(key)?.next
    }

    /// Position before `key`, or `None` before the head.
    pub fn prev(&self, arena: &NodeArena<T>, key: NodeKey) -> Option<NodeKey> {
        arena.slots.get(key)?.prev
    }

    /// Iterate `(NodeKey, &T)` from head to tail; reversible.
    pub fn iter<'a>(&self, arena: &'a NodeArena<T>) -> Iter<'a, T> {
        Iter {
            arena,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Deep copy into freshly allocated nodes of `dst`, preserving order.
    pub fn clone_in(&self, src: &NodeArena<T>, dst: &mut NodeArena<T>) -> Chain<T>
    where
        T: Clone,
    {
        let mut out = Chain::new();
        for (_, v) in self.iter(src) {
            out.push_back(dst, v.clone());
        }
        out
    }

    fn link_back(&mut self, arena: &mut NodeArena<T>, key: NodeKey) {
        let old_tail = self.tail;
        {
            let n = &mut arena.slots[key];
            debug_assert!(n.prev.is_none() && n.next.is_none(), "node is still linked");
            n.prev = old_tail;
            n.next = None;
        }
        match old_tail {
            Some(t) => arena.slots[t].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.len += 1;
    }
}

/// Double-ended iterator over one chain.
pub struct Iter<'a, T> {
    arena: &'a NodeArena<T>,
    front: Option<NodeKey>,
    back: Option<NodeKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeKey, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.front?;
        let node = self.arena.slots.get(key)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.back?;
        let node = self.arena.slots.get(key)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((key, &node.value))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn values<T: Clone>(c: &Chain<T>, arena: &NodeArena<T>) -> Vec<T> {
        c.iter(arena).map(|(_, v)| v.clone()).collect()
    }

    /// Invariant: append keeps insertion order; head/tail/len track the ends.
    #[test]
    fn push_back_preserves_order() {
        let mut arena = NodeArena::new();
        let mut c = Chain::new();
        assert!(c.is_empty());
        assert_eq!(c.head(), None);
        let a = c.push_back(&mut arena, 1);
        c.push_back(&mut arena, 2);
        let z = c.push_back(&mut arena, 3);
        assert_eq!(values(&c, &arena), vec![1, 2, 3]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.head(), Some(a));
        assert_eq!(c.tail(), Some(z));
        assert_eq!(c.front(&arena), Some(&1));
        assert_eq!(c.back(&arena), Some(&3));
    }

    /// Invariant: traversal is bidirectional with `None` past either end.
    #[test]
    fn next_and_prev_reach_null_sentinels() {
        let mut arena = NodeArena::new();
        let mut c = Chain::new();
        let a = c.push_back(&mut arena, 'a');
        let b = c.push_back(&mut arena, 'b');
        assert_eq!(c.next(&arena, a), Some(b));
        assert_eq!(c.next(&arena, b), None);
        assert_eq!(c.prev(&arena, b), Some(a));
        assert_eq!(c.prev(&arena, a), None);
        let rev: Vec<char> = c.iter(&arena).rev().map(|(_, v)| *v).collect();
        assert_eq!(rev, vec!['b', 'a']);
    }

    /// Invariant: erase returns the following position and works at head, middle, tail.
    #[test]
    fn erase_returns_following_position() {
        let mut arena = NodeArena::new();
        let mut c = Chain::new();
        let keys: Vec<NodeKey> = (0..5).map(|i| c.push_back(&mut arena, i)).collect();

        assert_eq!(c.erase(&mut arena, keys[2]), Some(keys[3]));
        assert_eq!(c.erase(&mut arena, keys[0]), Some(keys[1]));
        assert_eq!(c.erase(&mut arena, keys[4]), None);
        assert_eq!(values(&c, &arena), vec![1, 3]);
        assert_eq!(c.head(), Some(keys[1]));
        assert_eq!(c.tail(), Some(keys[3]));
        assert_eq!(arena.len(), 2);

        // Erasing a destroyed node is a no-op.
        assert_eq!(c.erase(&mut arena, keys[2]), None);
        assert_eq!(c.len(), 2);
    }

    /// Invariant: detach + append relocates a node between chains without
    /// cloning or dropping its payload, and the key stays the same.
    #[test]
    fn relocation_moves_node_without_touching_payload() {
        struct Tracked(Rc<Cell<usize>>);
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let mut arena = NodeArena::new();
        let mut from = Chain::new();
        let mut to = Chain::new();
        let k1 = from.push_back(&mut arena, Tracked(drops.clone()));
        let k2 = from.push_back(&mut arena, Tracked(drops.clone()));

        while let Some(node) = from.detach_front(&mut arena) {
            to.append(&mut arena, node);
        }
        assert_eq!(drops.get(), 0);
        assert!(from.is_empty());
        assert_eq!(from.head(), None);
        assert_eq!(from.tail(), None);
        assert_eq!(to.iter(&arena).map(|(k, _)| k).collect::<Vec<_>>(), vec![k1, k2]);

        to.clear(&mut arena);
        assert_eq!(drops.get(), 2);
        assert!(arena.is_empty());
    }

    /// Invariant: a detached node can be destroyed explicitly via the arena.
    #[test]
    fn detached_node_can_be_freed() {
        let mut arena = NodeArena::new();
        let mut c = Chain::new();
        c.push_back(&mut arena, "a".to_string());
        let b = c.push_back(&mut arena, "b".to_string());
        let node = c.detach(&mut arena, b).expect("b is linked");
        assert_eq!(node.key(), b);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.free(node), "b");
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(b));
        assert_eq!(values(&c, &arena), vec!["a".to_string()]);
    }

    #[test]
    fn pop_front_and_remove() {
        let mut arena = NodeArena::new();
        let mut c = Chain::new();
        c.push_back(&mut arena, 10);
        let mid = c.push_back(&mut arena, 20);
        c.push_back(&mut arena, 30);
        assert_eq!(c.remove(&mut arena, mid), Some(20));
        assert_eq!(c.pop_front(&mut arena), Some(10));
        assert_eq!(c.pop_front(&mut arena), Some(30));
        assert_eq!(c.pop_front(&mut arena), None);
        assert!(arena.is_empty());
    }

    /// Invariant: clear destroys only this chain's nodes.
    #[test]
    fn clear_leaves_other_chains_alone() {
        let mut arena = NodeArena::new();
        let mut a = Chain::new();
        let mut b = Chain::new();
        a.push_back(&mut arena, 1);
        b.push_back(&mut arena, 2);
        a.push_back(&mut arena, 3);
        a.clear(&mut arena);
        assert!(a.is_empty());
        assert_eq!(values(&b, &arena), vec![2]);
        assert_eq!(arena.len(), 1);
    }

    /// Invariant: clone_in deep-copies into new nodes in the same order.
    #[test]
    fn clone_in_is_deep() {
        let mut src = NodeArena::new();
        let mut c = Chain::new();
        for s in ["x", "y", "z"] {
            c.push_back(&mut src, s.to_string());
        }
        let mut dst = NodeArena::new();
        let copy = c.clone_in(&src, &mut dst);
        if let Some(k) = copy.head() {
            dst.get_mut(k).unwrap().push('!');
        }
        assert_eq!(values(&c, &src), vec!["x", "y", "z"]);
        assert_eq!(values(&copy, &dst), vec!["x!", "y", "z"]);
        assert_eq!(dst.len(), 3);
    }

    /// Invariant: `mem::take` moves the header and leaves an empty chain behind.
    #[test]
    fn take_moves_header() {
        let mut arena = NodeArena::new();
        let mut c = Chain::new();
        c.push_back(&mut arena, 1u8);
        let moved = std::mem::take(&mut c);
        assert!(c.is_empty());
        assert_eq!(moved.len(), 1);
        assert_eq!(moved.front(&arena), Some(&1));
    }

    #[test]
    fn arena_iter_mut_visits_every_node() {
        let mut arena = NodeArena::new();
        let mut c = Chain::new();
        for i in 0..4 {
            c.push_back(&mut arena, i);
        }
        assert_eq!(arena.iter_mut().len(), 4);
        for (_, v) in arena.iter_mut() {
            *v *= 10;
        }
        assert_eq!(values(&c, &arena), vec![0, 10, 20, 30]);
    }

    /// Invariant: detaching a node that heads, ends or sits outside another
    /// chain is refused and leaves both headers intact.
    #[test]
    fn detach_rejects_foreign_end_nodes() {
        let mut arena = NodeArena::new();
        let mut a = Chain::new();
        let mut b = Chain::new();
        let a1 = a.push_back(&mut arena, 1);
        a.push_back(&mut arena, 2);
        let b1 = b.push_back(&mut arena, 10);
        let b2 = b.push_back(&mut arena, 20);
        let b3 = b.push_back(&mut arena, 30);

        assert!(a.detach(&mut arena, b1).is_none());
        assert!(a.detach(&mut arena, b3).is_none());
        assert_eq!(a.len(), 2);
        assert_eq!(a.head(), Some(a1));
        assert_eq!(values(&a, &arena), vec![1, 2]);
        assert_eq!(values(&b, &arena), vec![10, 20, 30]);

        let mut empty: Chain<i32> = Chain::new();
        assert!(empty.detach(&mut arena, b2).is_none());
        assert_eq!(empty.len(), 0);

        let loose = b.detach(&mut arena, b2).expect("b2 is linked in b");
        assert!(a.detach(&mut arena, loose.key()).is_none());
        assert_eq!(a.len(), 2);
        assert_eq!(b.append(&mut arena, loose), b2);
        assert_eq!(values(&b, &arena), vec![10, 30, 20]);
    }
}
