//  Copyright 2024 ordlist Project Authors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use std::{cmp::Ordering, fmt::Debug};

use ordlist_common::{assert::OptionExt, strict_assert, strict_assert_eq};

use crate::{
    alloc::{Allocator, SlabAllocator, Strategy},
    config::ListConfig,
    error::{Error, Result},
    token::NodeToken,
};

/// A node of the list. Owns one item and links to its neighbors.
///
/// Nodes are only reachable through the [`Allocator`] of the list that owns them.
pub struct Node<T> {
    prev: Option<NodeToken>,
    next: Option<NodeToken>,

    data: T,
}

impl<T> Node<T> {
    fn new(data: T) -> Self {
        Self {
            prev: None,
            next: None,
            data,
        }
    }

    /// Get the item of the node.
    pub fn data(&self) -> &T {
        &self.data
    }
}

impl<T: Debug> Debug for Node<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("prev", &self.prev)
            .field("next", &self.next)
            .field("data", &self.data)
            .finish()
    }
}

/// Ordering function stored with the list for callers that keep it sorted or search it.
///
/// The list itself never calls it.
pub type Comparator<T> = dyn Fn(&T, &T) -> Ordering + Send + Sync + 'static;

/// Index-addressable double linked list.
///
/// Nodes live in the allocation strategy `A` and link to each other with [`NodeToken`]s. Positional operations walk
/// from the head when the index lies in the first half of the list, and from the tail otherwise, so no lookup walks
/// more than `len / 2` links.
pub struct OrderedList<T, A = SlabAllocator<Node<T>>>
where
    A: Allocator<Node<T>>,
{
    head: Option<NodeToken>,
    tail: Option<NodeToken>,
    len: usize,

    allocator: A,
    comparator: Option<Box<Comparator<T>>>,
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedList<T> {
    /// Create an empty list with the default heap allocation strategy.
    pub fn new() -> Self {
        Self::with_allocator(SlabAllocator::new())
    }
}

impl<T> OrderedList<T, Strategy<Node<T>>> {
    /// Create an empty list with the allocation strategy described by `config`.
    pub fn with_config(config: &ListConfig) -> Result<Self> {
        let allocator = Strategy::new(&config.strategy)?;
        Ok(Self::with_allocator(allocator))
    }
}

impl<T, A> OrderedList<T, A>
where
    A: Allocator<Node<T>>,
{
    /// Create an empty list that obtains its nodes from `allocator`.
    ///
    /// # Panics
    ///
    /// Panics if `allocator` already holds live nodes. The list owns every node of its strategy.
    pub fn with_allocator(allocator: A) -> Self {
        assert!(allocator.is_empty(), "allocation strategy must be empty");
        Self {
            head: None,
            tail: None,
            len: 0,
            allocator,
            comparator: None,
        }
    }

    /// Get the length of the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the allocation strategy of the list.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Get the stored comparator, if any.
    pub fn comparator(&self) -> Option<&Comparator<T>> {
        self.comparator.as_deref()
    }

    /// Store a comparator for caller-driven ordering logic.
    pub fn set_comparator<F>(&mut self, comparator: F)
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Box::new(comparator));
    }

    /// Remove the stored comparator.
    pub fn clear_comparator(&mut self) {
        self.comparator = None;
    }

    /// Get the reference of the first item of the list.
    pub fn front(&self) -> Option<&T> {
        self.head.map(|token| &self.node(token).data)
    }

    /// Get the reference of the last item of the list.
    pub fn back(&self) -> Option<&T> {
        self.tail.map(|token| &self.node(token).data)
    }

    /// Insert `data` at position `index`.
    ///
    /// An `index` greater than the length is treated as the length, so the item is appended.
    ///
    /// The list is left untouched if the allocation strategy fails to provide a node.
    pub fn insert(&mut self, index: usize, data: T) -> Result<()> {
        let index = index.min(self.len);

        // A cursor on null inserts to the tail.
        let token = if index == self.len { None } else { Some(self.locate(index)) };
        let mut cursor = CursorMut { token, list: self };
        cursor.insert_before(data)?;

        tracing::trace!(index, len = self.len, "[ordlist]: insert");
        self.sanity();
        Ok(())
    }

    /// Append `data` to the tail of the list.
    pub fn append(&mut self, data: T) -> Result<()> {
        self.insert(self.len, data)
    }

    /// Push `data` to the head of the list.
    pub fn push_front(&mut self, data: T) -> Result<()> {
        self.insert(0, data)
    }

    /// Get the reference of the item at `index`.
    ///
    /// An `index` at or after the length is treated as the index of the last item.
    pub fn lookup(&self, index: usize) -> Result<&T> {
        let token = self.token_at(index)?;
        Ok(&self.node(token).data)
    }

    /// Get the mutable reference of the item at `index`.
    ///
    /// Clamps `index` the same way as [`OrderedList::lookup`].
    pub fn lookup_mut(&mut self, index: usize) -> Result<&mut T> {
        let token = self.token_at(index)?;
        Ok(&mut self.node_mut(token).data)
    }

    /// Get the token of the node at `index`.
    ///
    /// Clamps `index` the same way as [`OrderedList::lookup`]. The token stays valid until the node is erased, even if
    /// the node is moved by [`OrderedList::swap`].
    pub fn token_at(&self, index: usize) -> Result<NodeToken> {
        if self.is_empty() {
            tracing::debug!(index, "[ordlist]: lookup on empty list");
            return Err(Error::EmptyList);
        }
        Ok(self.locate(index.min(self.len - 1)))
    }

    /// Get the reference of the item of the node `token`.
    pub fn get(&self, token: NodeToken) -> Option<&T> {
        self.allocator.get(token).map(|node| &node.data)
    }

    /// Erase the items in `[start, end)`.
    ///
    /// If `start == end`, the item at `start` is erased. An `end` after the length is treated as the length.
    pub fn erase(&mut self, start: usize, end: usize) -> Result<()> {
        if self.is_empty() {
            tracing::debug!(start, end, "[ordlist]: erase on empty list");
            return Err(Error::EmptyList);
        }
        if start > end {
            tracing::debug!(start, end, "[ordlist]: erase with invalid range");
            return Err(Error::InvalidRange { start, end });
        }
        if start >= self.len {
            tracing::debug!(start, end, len = self.len, "[ordlist]: erase out of range");
            return Err(Error::IndexOutOfRange {
                index: start,
                len: self.len,
            });
        }

        let end = end.max(start + 1).min(self.len);
        let count = end - start;

        let token = self.locate(start);
        let mut cursor = CursorMut {
            token: Some(token),
            list: self,
        };
        for _ in 0..count {
            // Each removal leaves the list consistent.
            let data = cursor.remove();
            strict_assert!(data.is_some());
        }

        tracing::trace!(start, end, len = self.len, "[ordlist]: erase");
        self.sanity();
        Ok(())
    }

    /// Swap the positions of the nodes at `index0` and `index1`.
    ///
    /// Nodes are relinked, items are never moved, so tokens keep pointing at the same items.
    pub fn swap(&mut self, index0: usize, index1: usize) -> Result<()> {
        if self.is_empty() {
            tracing::debug!(index0, index1, "[ordlist]: swap on empty list");
            return Err(Error::EmptyList);
        }
        for index in [index0, index1] {
            if index >= self.len {
                tracing::debug!(index, len = self.len, "[ordlist]: swap out of range");
                return Err(Error::IndexOutOfRange { index, len: self.len });
            }
        }
        if index0 == index1 {
            return Ok(());
        }

        let (first, second) = if index0 < index1 { (index0, index1) } else { (index1, index0) };
        let a = self.locate(first);
        let b = self.locate(second);
        self.exchange(a, b);

        tracing::trace!(index0, index1, "[ordlist]: swap");
        self.sanity();
        Ok(())
    }

    /// Release all nodes and reset the list to empty.
    ///
    /// The list can be used again afterwards.
    pub fn destroy(&mut self) {
        let released = self.len;

        let mut token = self.head;
        while let Some(t) = token {
            token = self.release_node(t).next;
        }

        self.head = None;
        self.tail = None;
        self.len = 0;

        strict_assert_eq!(self.allocator.len(), 0);
        tracing::trace!(released, "[ordlist]: destroy");
    }

    /// Find the node at `index` by walking from the nearer end.
    fn locate(&self, index: usize) -> NodeToken {
        strict_assert!(index < self.len);

        let mut cursor = Cursor { token: None, list: self };
        if index <= self.len / 2 {
            cursor.front();
            for _ in 0..index {
                cursor.next();
            }
        } else {
            cursor.back();
            for _ in index + 1..self.len {
                cursor.prev();
            }
        }

        unsafe { cursor.token.strict_unwrap_unchecked() }
    }

    /// Exchange the positions of `a` and `b`. `a` MUST precede `b`.
    fn exchange(&mut self, a: NodeToken, b: NodeToken) {
        let (a_prev, a_next) = {
            let node = self.node(a);
            (node.prev, node.next)
        };
        let (b_prev, b_next) = {
            let node = self.node(b);
            (node.prev, node.next)
        };

        if a_next == Some(b) {
            // a_prev, a, b, b_next => a_prev, b, a, b_next
            let node = self.node_mut(b);
            node.prev = a_prev;
            node.next = Some(a);
            let node = self.node_mut(a);
            node.prev = Some(b);
            node.next = b_next;
        } else {
            // a_prev, a, a_next, .., b_prev, b, b_next => a_prev, b, a_next, .., b_prev, a, b_next
            let node = self.node_mut(b);
            node.prev = a_prev;
            node.next = a_next;
            let node = self.node_mut(a);
            node.prev = b_prev;
            node.next = b_next;
            if let Some(next) = a_next {
                self.node_mut(next).prev = Some(b);
            }
            if let Some(prev) = b_prev {
                self.node_mut(prev).next = Some(a);
            }
        }

        match a_prev {
            Some(prev) => self.node_mut(prev).next = Some(b),
            None => self.head = Some(b),
        }
        match b_next {
            Some(next) => self.node_mut(next).prev = Some(a),
            None => self.tail = Some(a),
        }
    }

    fn node(&self, token: NodeToken) -> &Node<T> {
        unsafe { self.allocator.get(token).strict_unwrap_unchecked() }
    }

    fn node_mut(&mut self, token: NodeToken) -> &mut Node<T> {
        unsafe { self.allocator.get_mut(token).strict_unwrap_unchecked() }
    }

    fn release_node(&mut self, token: NodeToken) -> Node<T> {
        unsafe { self.allocator.release(token).strict_unwrap_unchecked() }
    }

    fn sanity(&self) {
        #[cfg(feature = "sanity")]
        self.verify();
    }

    /// Walk the list in both directions and check every link.
    #[cfg_attr(not(any(test, feature = "sanity")), expect(dead_code))]
    fn verify(&self) {
        assert_eq!(self.len == 0, self.head.is_none());
        assert_eq!(self.len == 0, self.tail.is_none());
        assert_eq!(self.allocator.len(), self.len);

        let mut count = 0;
        let mut prev = None;
        let mut token = self.head;
        while let Some(t) = token {
            count += 1;
            assert!(count <= self.len, "cycle detected");
            let node = self.node(t);
            assert_eq!(node.prev, prev);
            prev = Some(t);
            token = node.next;
        }
        assert_eq!(count, self.len);
        assert_eq!(prev, self.tail);

        let mut count = 0;
        let mut token = self.tail;
        while let Some(t) = token {
            count += 1;
            token = self.node(t).prev;
        }
        assert_eq!(count, self.len);
    }
}

impl<T, A> Drop for OrderedList<T, A>
where
    A: Allocator<Node<T>>,
{
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<T, A> Debug for OrderedList<T, A>
where
    T: Debug,
    A: Allocator<Node<T>>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        let mut cursor = Cursor { token: None, list: self };
        cursor.front();
        while let Some(data) = cursor.data() {
            list.entry(data);
            cursor.next();
        }
        list.finish()
    }
}

/// Read-only position in the list.
///
/// `None` stands for the null position between the tail and the head.
struct Cursor<'a, T, A>
where
    A: Allocator<Node<T>>,
{
    token: Option<NodeToken>,
    list: &'a OrderedList<T, A>,
}

impl<'a, T, A> Cursor<'a, T, A>
where
    A: Allocator<Node<T>>,
{
    fn data(&self) -> Option<&'a T> {
        self.token.map(|token| &self.list.node(token).data)
    }

    /// Move to next.
    ///
    /// If cursor is on tail, move to null.
    /// If cursor is on null, move to head.
    fn next(&mut self) {
        match self.token {
            Some(token) => self.token = self.list.node(token).next,
            None => self.token = self.list.head,
        }
    }

    /// Move to prev.
    ///
    /// If cursor is on head, move to null.
    /// If cursor is on null, move to tail.
    fn prev(&mut self) {
        match self.token {
            Some(token) => self.token = self.list.node(token).prev,
            None => self.token = self.list.tail,
        }
    }

    fn front(&mut self) {
        self.token = self.list.head;
    }

    fn back(&mut self) {
        self.token = self.list.tail;
    }
}

/// Mutable position in the list, used to splice nodes in and out.
struct CursorMut<'a, T, A>
where
    A: Allocator<Node<T>>,
{
    token: Option<NodeToken>,
    list: &'a mut OrderedList<T, A>,
}

impl<T, A> CursorMut<'_, T, A>
where
    A: Allocator<Node<T>>,
{
    /// Remove the current node, release it and move next.
    fn remove(&mut self) -> Option<T> {
        let token = self.token?;

        let node = self.list.release_node(token);

        // fix head and tail if node is either of that
        let prev = node.prev;
        let next = node.next;
        if Some(token) == self.list.head {
            self.list.head = next;
        }
        if Some(token) == self.list.tail {
            self.list.tail = prev;
        }

        // fix the next and prev links of the nodes before and after this
        if let Some(prev) = prev {
            self.list.node_mut(prev).next = next;
        }
        if let Some(next) = next {
            self.list.node_mut(next).prev = prev;
        }

        self.list.len -= 1;
        self.token = next;

        Some(node.data)
    }

    /// Insert an item before the current one.
    ///
    /// If cursor is on null, insert to tail.
    fn insert_before(&mut self, data: T) -> Result<NodeToken> {
        let token_new = self.list.allocator.allocate(Node::new(data))?;

        match self.token {
            Some(token) => self.link_before(token_new, token),
            None => {
                self.link_between(token_new, self.list.tail, None);
                self.list.tail = Some(token_new);
            }
        }

        if self.list.head == self.token {
            self.list.head = Some(token_new);
        }

        self.list.len += 1;
        Ok(token_new)
    }

    fn link_before(&mut self, token: NodeToken, next: NodeToken) {
        self.link_between(token, self.list.node(next).prev, Some(next));
    }

    fn link_between(&mut self, token: NodeToken, prev: Option<NodeToken>, next: Option<NodeToken>) {
        if let Some(prev) = prev {
            self.list.node_mut(prev).next = Some(token);
        }
        if let Some(next) = next {
            self.list.node_mut(next).prev = Some(token);
        }

        let node = self.list.node_mut(token);
        node.prev = prev;
        node.next = next;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        sync::{
            atomic::{AtomicUsize, Ordering as AtomicOrdering},
            Arc,
        },
    };

    use itertools::Itertools;
    use parking_lot::Mutex;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::alloc::BoundedAllocator;

    fn items<T: Clone, A: Allocator<Node<T>>>(l: &OrderedList<T, A>) -> Vec<T> {
        (0..l.len()).map(|i| l.lookup(i).unwrap().clone()).collect_vec()
    }

    fn list_of(items: &[u64]) -> OrderedList<u64> {
        let mut l = OrderedList::new();
        for item in items {
            l.append(*item).unwrap();
        }
        l
    }

    #[test]
    fn test_append_lookup() {
        let mut l = OrderedList::new();
        assert!(l.is_empty());

        l.append(123).unwrap();
        l.append(45).unwrap();
        l.append(67).unwrap();

        assert_eq!(*l.lookup(0).unwrap(), 123);
        assert_eq!(*l.lookup(1).unwrap(), 45);
        assert_eq!(*l.lookup(2).unwrap(), 67);
        assert_eq!(l.len(), 3);
        assert!(!l.is_empty());
        l.verify();
    }

    #[test]
    fn test_lookup_empty() {
        let l = OrderedList::<u64>::new();
        assert_eq!(l.lookup(0), Err(Error::EmptyList));
        assert_eq!(l.token_at(3), Err(Error::EmptyList));
        assert_eq!(l.front(), None);
        assert_eq!(l.back(), None);
    }

    #[test]
    fn test_lookup_clamp() {
        let mut l = list_of(&[1, 2, 3]);
        assert_eq!(*l.lookup(3).unwrap(), 3);
        assert_eq!(*l.lookup(usize::MAX).unwrap(), 3);

        *l.lookup_mut(100).unwrap() = 30;
        *l.lookup_mut(0).unwrap() = 10;
        assert_eq!(items(&l), vec![10, 2, 30]);
        assert_eq!(l.front(), Some(&10));
        assert_eq!(l.back(), Some(&30));
    }

    #[test]
    fn test_insert_positions() {
        let mut l = OrderedList::new();
        l.insert(0, 2).unwrap();
        l.insert(0, 0).unwrap();
        l.insert(1, 1).unwrap();
        l.insert(3, 4).unwrap();
        l.insert(3, 3).unwrap();
        l.push_front(-1).unwrap();
        assert_eq!(items(&l), vec![-1, 0, 1, 2, 3, 4]);
        l.verify();
    }

    #[test]
    fn test_insert_clamp() {
        let mut l = list_of(&[1, 2, 3]);
        l.insert(10, 99).unwrap();
        assert_eq!(items(&l), vec![1, 2, 3, 99]);
        assert_eq!(l.back(), Some(&99));
        l.verify();

        let mut a = list_of(&[1, 2, 3]);
        let mut b = list_of(&[1, 2, 3]);
        a.insert(usize::MAX, 7).unwrap();
        b.append(7).unwrap();
        assert_eq!(items(&a), items(&b));
    }

    #[test]
    fn test_erase_range() {
        let mut l = list_of(&[10, 20, 30, 40, 50]);
        l.erase(1, 3).unwrap();
        assert_eq!(items(&l), vec![10, 40, 50]);
        assert_eq!(l.len(), 3);
        l.verify();
    }

    #[test]
    fn test_erase_single() {
        let mut a = list_of(&[10, 20, 30, 40, 50]);
        let mut b = list_of(&[10, 20, 30, 40, 50]);
        a.erase(2, 2).unwrap();
        b.erase(2, 3).unwrap();
        assert_eq!(items(&a), vec![10, 20, 40, 50]);
        assert_eq!(items(&a), items(&b));
    }

    #[test]
    fn test_erase_boundaries() {
        let mut l = list_of(&[1, 2, 3, 4, 5]);

        l.erase(0, 0).unwrap();
        assert_eq!(items(&l), vec![2, 3, 4, 5]);
        assert_eq!(l.front(), Some(&2));
        l.verify();

        l.erase(3, 3).unwrap();
        assert_eq!(items(&l), vec![2, 3, 4]);
        assert_eq!(l.back(), Some(&4));
        l.verify();

        l.erase(1, 100).unwrap();
        assert_eq!(items(&l), vec![2]);
        l.verify();

        l.erase(0, 1).unwrap();
        assert!(l.is_empty());
        l.verify();
    }

    #[test]
    fn test_erase_errors() {
        let mut l = OrderedList::<u64>::new();
        assert_eq!(l.erase(0, 1), Err(Error::EmptyList));

        let mut l = list_of(&[1, 2, 3]);
        assert_eq!(l.erase(2, 1), Err(Error::InvalidRange { start: 2, end: 1 }));
        assert_eq!(l.erase(3, 5), Err(Error::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(items(&l), vec![1, 2, 3]);
    }

    #[test]
    fn test_swap() {
        let mut l = list_of(&[1, 2, 3]);
        l.swap(0, 2).unwrap();
        assert_eq!(items(&l), vec![3, 2, 1]);
        assert_eq!(l.front(), Some(&3));
        assert_eq!(l.back(), Some(&1));
        l.verify();
    }

    #[test]
    fn test_swap_adjacent() {
        let mut l = list_of(&[1, 2, 3, 4]);

        l.swap(1, 2).unwrap();
        assert_eq!(items(&l), vec![1, 3, 2, 4]);
        l.verify();

        l.swap(1, 0).unwrap();
        assert_eq!(items(&l), vec![3, 1, 2, 4]);
        l.verify();

        l.swap(3, 2).unwrap();
        assert_eq!(items(&l), vec![3, 1, 4, 2]);
        l.verify();

        let mut l = list_of(&[1, 2]);
        l.swap(0, 1).unwrap();
        assert_eq!(items(&l), vec![2, 1]);
        l.verify();
    }

    #[test]
    fn test_swap_errors() {
        let mut l = OrderedList::<u64>::new();
        assert_eq!(l.swap(0, 0), Err(Error::EmptyList));

        let mut l = list_of(&[1, 2, 3]);
        assert_eq!(l.swap(0, 3), Err(Error::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(l.swap(5, 1), Err(Error::IndexOutOfRange { index: 5, len: 3 }));
        l.swap(1, 1).unwrap();
        assert_eq!(items(&l), vec![1, 2, 3]);
    }

    #[test]
    fn test_swap_keeps_tokens() {
        let mut l = list_of(&[1, 2, 3, 4, 5]);
        let t1 = l.token_at(1).unwrap();
        let t3 = l.token_at(3).unwrap();

        l.swap(1, 3).unwrap();

        assert_eq!(l.get(t1), Some(&2));
        assert_eq!(l.get(t3), Some(&4));
        assert_eq!(l.token_at(3).unwrap(), t1);
        assert_eq!(l.token_at(1).unwrap(), t3);
    }

    #[test]
    fn test_swap_self_inverse() {
        let origin: Vec<u64> = (0..9).collect();
        for i in 0..origin.len() {
            for j in 0..origin.len() {
                let mut l = list_of(&origin);
                l.swap(i, j).unwrap();
                l.swap(i, j).unwrap();
                assert_eq!(items(&l), origin);
                l.verify();
            }
        }
    }

    #[test]
    fn test_destroy_reuse() {
        let mut l = list_of(&[1, 2, 3]);
        l.destroy();
        assert!(l.is_empty());
        assert_eq!(l.len(), 0);
        assert!(l.allocator().is_empty());
        l.verify();

        l.insert(5, 42).unwrap();
        assert_eq!(items(&l), vec![42]);
        l.verify();
    }

    #[test]
    fn test_release_items() {
        struct Tracked(Arc<AtomicUsize>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, AtomicOrdering::Relaxed);
            }
        }

        let dropped = Arc::new(AtomicUsize::new(0));
        let mut l = OrderedList::new();
        for _ in 0..6 {
            l.append(Tracked(dropped.clone())).unwrap();
        }

        l.erase(1, 3).unwrap();
        assert_eq!(dropped.load(AtomicOrdering::Relaxed), 2);

        l.destroy();
        assert_eq!(dropped.load(AtomicOrdering::Relaxed), 6);

        l.append(Tracked(dropped.clone())).unwrap();
        drop(l);
        assert_eq!(dropped.load(AtomicOrdering::Relaxed), 7);
    }

    #[test]
    fn test_allocation_failure() {
        let mut l = OrderedList::with_allocator(BoundedAllocator::new(3));
        l.append(1).unwrap();
        l.append(2).unwrap();
        l.append(3).unwrap();

        assert_eq!(l.insert(1, 4), Err(Error::AllocationFailure { capacity: 3 }));
        assert_eq!(items(&l), vec![1, 2, 3]);
        l.verify();

        l.erase(0, 0).unwrap();
        l.insert(1, 4).unwrap();
        assert_eq!(items(&l), vec![2, 4, 3]);
        l.verify();
    }

    #[test]
    fn test_with_config() {
        let mut l = OrderedList::with_config(&ListConfig::bounded(1)).unwrap();
        l.append("a").unwrap();
        assert_eq!(l.append("b"), Err(Error::AllocationFailure { capacity: 1 }));

        let mut l = OrderedList::with_config(&ListConfig::default()).unwrap();
        for i in 0..100 {
            l.append(i).unwrap();
        }
        assert_eq!(l.len(), 100);
        assert_eq!(l.allocator().capacity(), None);

        let config = ListConfig {
            strategy: crate::config::StrategyConfig::Bounded { capacity: None },
        };
        assert!(matches!(
            OrderedList::<u64, _>::with_config(&config),
            Err(Error::MissingConfiguration(_))
        ));
    }

    /// Counts node resolutions to measure how many links a walk follows.
    struct CountingAllocator<N> {
        inner: SlabAllocator<N>,
        visits: Cell<usize>,
    }

    impl<N> CountingAllocator<N> {
        fn new() -> Self {
            Self {
                inner: SlabAllocator::new(),
                visits: Cell::new(0),
            }
        }

        fn take_visits(&self) -> usize {
            self.visits.replace(0)
        }
    }

    unsafe impl<N> Allocator<N> for CountingAllocator<N> {
        fn allocate(&mut self, node: N) -> Result<NodeToken> {
            self.inner.allocate(node)
        }

        fn release(&mut self, token: NodeToken) -> Option<N> {
            self.inner.release(token)
        }

        fn get(&self, token: NodeToken) -> Option<&N> {
            self.visits.set(self.visits.get() + 1);
            self.inner.get(token)
        }

        fn get_mut(&mut self, token: NodeToken) -> Option<&mut N> {
            self.visits.set(self.visits.get() + 1);
            self.inner.get_mut(token)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    #[test]
    fn test_walk_from_nearer_end() {
        for n in [1usize, 2, 3, 10, 11, 64, 65] {
            let mut l = OrderedList::with_allocator(CountingAllocator::new());
            for i in 0..n {
                l.append(i).unwrap();
            }

            for index in [0, n / 2, n / 2 + 1, n.saturating_sub(2), n - 1, n + 5] {
                l.allocator().take_visits();
                let data = *l.lookup(index).unwrap();
                let visits = l.allocator().take_visits();

                let i = index.min(n - 1);
                assert_eq!(data, i);
                // One resolution per hop plus the final read; the middle of an even list may take one extra hop.
                let bound = i.min(n - 1 - i) + 2;
                assert!(visits <= bound, "n: {n}, index: {index}, visits: {visits}, bound: {bound}");
                assert!(visits <= n / 2 + 1, "n: {n}, index: {index}, visits: {visits}");
            }

            let tail = l.token_at(n - 1).unwrap();
            assert_eq!(l.allocator().get(tail).map(Node::data), Some(&(n - 1)));
        }
    }

    #[test]
    #[should_panic]
    fn test_with_non_empty_allocator() {
        let mut allocator = SlabAllocator::new();
        allocator.allocate(Node::new(1u64)).unwrap();
        let _ = OrderedList::with_allocator(allocator);
    }

    #[test]
    fn test_comparator() {
        let mut l = list_of(&[3, 1, 2]);
        assert!(l.comparator().is_none());

        l.set_comparator(|a: &u64, b: &u64| a.cmp(b));
        let cmp = l.comparator().unwrap();
        assert_eq!(cmp(&1, &2), Ordering::Less);
        assert_eq!(cmp(&2, &2), Ordering::Equal);
        // Stored only, never applied.
        assert_eq!(items(&l), vec![3, 1, 2]);

        // Sorted insertion driven by the caller.
        let pos = (0..l.len())
            .find(|&i| cmp(l.lookup(i).unwrap(), &2) == Ordering::Greater)
            .unwrap_or(l.len());
        assert_eq!(pos, 0);

        l.clear_comparator();
        assert!(l.comparator().is_none());
    }

    #[test]
    fn test_debug() {
        let l = list_of(&[1, 2, 3]);
        assert_eq!(format!("{l:?}"), "[1, 2, 3]");
        assert_eq!(format!("{:?}", OrderedList::<u64>::new()), "[]");
    }

    #[test_log::test]
    fn test_fuzzy() {
        const OPS: usize = 10_000;

        let mut rng = SmallRng::seed_from_u64(114514);
        let mut l = OrderedList::new();
        let mut v: Vec<u64> = vec![];

        for i in 0..OPS as u64 {
            match rng.gen_range(0..10) {
                0..=4 => {
                    let index = rng.gen_range(0..=v.len() + 2);
                    l.insert(index, i).unwrap();
                    v.insert(index.min(v.len()), i);
                }
                5 | 6 if !v.is_empty() => {
                    let start = rng.gen_range(0..v.len());
                    let end = rng.gen_range(start..=(start + 3).min(v.len()));
                    l.erase(start, end).unwrap();
                    v.drain(start..end.max(start + 1));
                }
                7 | 8 if !v.is_empty() => {
                    let a = rng.gen_range(0..v.len());
                    let b = rng.gen_range(0..v.len());
                    l.swap(a, b).unwrap();
                    v.swap(a, b);
                }
                _ if !v.is_empty() => {
                    let index = rng.gen_range(0..v.len() + 2);
                    assert_eq!(*l.lookup(index).unwrap(), v[index.min(v.len() - 1)]);
                }
                _ => assert_eq!(l.lookup(0), Err(Error::EmptyList)),
            }
            assert_eq!(l.len(), v.len());
        }

        l.verify();
        assert_eq!(items(&l), v);
    }

    #[test]
    fn test_external_lock() {
        const THREADS: u64 = 4;
        const ITEMS: u64 = 250;

        let l = Arc::new(Mutex::new(OrderedList::new()));
        let handles = (0..THREADS)
            .map(|t| {
                let l = l.clone();
                std::thread::spawn(move || {
                    for i in 0..ITEMS {
                        let mut l = l.lock();
                        let index = l.len() / 2;
                        l.insert(index, t * ITEMS + i).unwrap();
                    }
                })
            })
            .collect_vec();
        for handle in handles {
            handle.join().unwrap();
        }

        let l = l.lock();
        assert_eq!(l.len() as u64, THREADS * ITEMS);
        let mut v = items(&*l);
        v.sort_unstable();
        assert_eq!(v, (0..THREADS * ITEMS).collect_vec());
        l.verify();
    }
}
