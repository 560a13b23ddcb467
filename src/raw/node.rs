use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::cmp::Ordering;

use super::handle::Handle;
use crate::comparator::Comparator;

/// The branching parameter `t` of a tree, with its derived key bounds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Degree(usize);

impl Degree {
    /// Callers validate `t >= 2` through `TreeConfig::validate`.
    pub(crate) const fn new(min_degree: usize) -> Self {
        debug_assert!(min_degree >= 2);
        Self(min_degree)
    }

    #[inline]
    pub(crate) const fn get(self) -> usize {
        self.0
    }

    /// `2t - 1`.
    #[inline]
    pub(crate) const fn max_keys(self) -> usize {
        2 * self.0 - 1
    }

    /// `t - 1`.
    #[inline]
    pub(crate) const fn min_keys(self) -> usize {
        self.0 - 1
    }
}

/// A B-tree node: sorted keys, the handles of their values, and for internal
/// nodes one more child handle than keys.
///
/// Keys and values live side by side in every node (this is not a B+tree), and
/// storage is reserved for a full node up front so in-place shifts never allocate.
pub(crate) struct Node<K> {
    keys: Vec<K>,
    values: Vec<Handle>,
    // Empty for leaves.
    children: Vec<Handle>,
}

/// Result of searching for a key in a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted, and the child to descend into.
    NotFound(usize),
}

impl<K> Node<K> {
    /// Creates an empty node with room for a full node's keys, values and children.
    pub(crate) fn try_with_degree(degree: Degree) -> Result<Self, TryReserveError> {
        let mut keys = Vec::new();
        keys.try_reserve_exact(degree.max_keys())?;
        let mut values = Vec::new();
        values.try_reserve_exact(degree.max_keys())?;
        let mut children = Vec::new();
        children.try_reserve_exact(degree.max_keys() + 1)?;
        Ok(Self { keys, values, children })
    }

    /// Returns true if this node has no children.
    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the number of keys in this node.
    #[inline]
    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns the number of children in this node.
    #[inline]
    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the node holds `2t - 1` keys and must be split before descending into it.
    #[inline]
    pub(crate) fn is_full(&self, degree: Degree) -> bool {
        self.keys.len() >= degree.max_keys()
    }

    /// Returns true if the node holds fewer keys than its position allows.
    ///
    /// The root's floor is one key, or zero when it is a leaf (the tree is empty).
    pub(crate) fn is_deficient(&self, degree: Degree, is_root: bool) -> bool {
        if is_root {
            !self.is_leaf() && self.keys.is_empty()
        } else {
            self.keys.len() < degree.min_keys()
        }
    }

    /// Returns true if the node can give up one key and still hold at least `t - 1`.
    #[inline]
    pub(crate) fn can_lend(&self, degree: Degree) -> bool {
        self.keys.len() > degree.min_keys()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> Handle {
        self.values[index]
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Searches the node's sorted keys.
    #[inline]
    pub(crate) fn search<C>(&self, key: &K, comparator: &C) -> SearchResult
    where
        C: Comparator<K>,
    {
        match self.keys.binary_search_by(|k| comparator.compare(k, key)) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::NotFound(idx),
        }
    }

    /// Like [`search`](Self::search), but an exact match reports the first index
    /// ordered at or after `key`, which is what range seeks need.
    pub(crate) fn lower_bound<C>(&self, key: &K, comparator: &C) -> usize
    where
        C: Comparator<K>,
    {
        self.keys.partition_point(|k| comparator.compare(k, key) == Ordering::Less)
    }

    /// Index of the first key strictly ordered after `key`.
    pub(crate) fn upper_bound<C>(&self, key: &K, comparator: &C) -> usize
    where
        C: Comparator<K>,
    {
        self.keys.partition_point(|k| comparator.compare(k, key) != Ordering::Greater)
    }

    /// Inserts an entry at `index`, shifting later entries right.
    pub(crate) fn insert_at(&mut self, index: usize, key: K, value: Handle) {
        debug_assert!(self.keys.len() < self.keys.capacity());
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    /// Removes the entry at `index`, shifting later entries left. Leaves only.
    pub(crate) fn remove_at(&mut self, index: usize) -> (K, Handle) {
        debug_assert!(self.is_leaf());
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        (key, value)
    }

    /// Swaps the entry at `index` for another, returning the old one.
    pub(crate) fn replace_entry(&mut self, index: usize, key: K, value: Handle) -> (K, Handle) {
        let key = core::mem::replace(&mut self.keys[index], key);
        let value = core::mem::replace(&mut self.values[index], value);
        (key, value)
    }

    /// Inserts a separator entry at `index` with `right` as the child that follows it.
    pub(crate) fn insert_separator(&mut self, index: usize, key: K, value: Handle, right: Handle) {
        self.insert_at(index, key, value);
        self.children.insert(index + 1, right);
    }

    /// Removes the separator at `index` together with the child to its right.
    pub(crate) fn remove_separator(&mut self, index: usize) -> (K, Handle, Handle) {
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        let right = self.children.remove(index + 1);
        (key, value, right)
    }

    /// Makes this empty node the parent of a single child (a fresh root).
    pub(crate) fn adopt_only_child(&mut self, child: Handle) {
        debug_assert!(self.keys.is_empty() && self.children.is_empty());
        self.children.push(child);
    }

    /// Removes the last entry and, for internal nodes, the last child.
    pub(crate) fn pop_last(&mut self) -> Option<(K, Handle, Option<Handle>)> {
        let key = self.keys.pop()?;
        let value = self.values.pop()?;
        Some((key, value, self.children.pop()))
    }

    /// Removes the first entry and, for internal nodes, the first child.
    pub(crate) fn pop_first(&mut self) -> Option<(K, Handle, Option<Handle>)> {
        if self.keys.is_empty() {
            return None;
        }
        let key = self.keys.remove(0);
        let value = self.values.remove(0);
        let child = (!self.children.is_empty()).then(|| self.children.remove(0));
        Some((key, value, child))
    }

    /// Prepends an entry and, for internal nodes, a new first child.
    pub(crate) fn push_front(&mut self, key: K, value: Handle, child: Option<Handle>) {
        self.insert_at(0, key, value);
        if let Some(child) = child {
            self.children.insert(0, child);
        }
    }

    /// Appends an entry and, for internal nodes, a new last child.
    pub(crate) fn push_back(&mut self, key: K, value: Handle, child: Option<Handle>) {
        debug_assert!(self.keys.len() < self.keys.capacity());
        self.keys.push(key);
        self.values.push(value);
        if let Some(child) = child {
            self.children.push(child);
        }
    }

    /// Splits a full node around its median.
    ///
    /// The upper `t - 1` entries (and upper `t` children) move into `right`, which
    /// must be empty; this node keeps the lower `t - 1`. Returns the median entry.
    pub(crate) fn split_into(&mut self, degree: Degree, right: &mut Node<K>) -> (K, Handle) {
        debug_assert_eq!(self.keys.len(), degree.max_keys());
        debug_assert!(right.keys.is_empty() && right.children.is_empty());
        let t = degree.get();

        right.keys.extend(self.keys.drain(t..));
        right.values.extend(self.values.drain(t..));
        if !self.children.is_empty() {
            right.children.extend(self.children.drain(t..));
        }

        match (self.keys.pop(), self.values.pop()) {
            (Some(key), Some(value)) => (key, value),
            _ => unreachable!("a full node always has a median"),
        }
    }

    /// Appends the separator from the parent and then every entry and child of `right`.
    pub(crate) fn merge_from(&mut self, key: K, value: Handle, right: &mut Node<K>) {
        debug_assert!(self.keys.len() + 1 + right.keys.len() <= self.keys.capacity());
        self.keys.push(key);
        self.values.push(value);
        self.keys.append(&mut right.keys);
        self.values.append(&mut right.values);
        self.children.append(&mut right.children);
    }

    /// Detaches the only child of a key-less internal node.
    pub(crate) fn take_only_child(&mut self) -> Option<Handle> {
        if self.keys.is_empty() && self.children.len() == 1 {
            self.children.pop()
        } else {
            None
        }
    }

    /// Empties the node but keeps its reserved storage.
    pub(crate) fn reset(&mut self) {
        self.keys.clear();
        self.values.clear();
        self.children.clear();
    }
}

impl<K: Clone> Clone for Node<K> {
    // `Vec::clone` trims capacity; a cloned node must keep room for a full node.
    fn clone(&self) -> Self {
        let mut keys = Vec::with_capacity(self.keys.capacity());
        keys.extend(self.keys.iter().cloned());
        let mut values = Vec::with_capacity(self.values.capacity());
        values.extend_from_slice(&self.values);
        let mut children = Vec::with_capacity(self.children.capacity());
        children.extend_from_slice(&self.children);
        Self { keys, values, children }
    }
}
