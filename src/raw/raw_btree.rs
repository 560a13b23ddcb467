use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::Bound;

use tracing::{debug, trace, warn};

use super::arena::Arena;
use super::handle::Handle;
use super::iter::Cursor;
use super::node::{Degree, Node, SearchResult};
use crate::comparator::Comparator;
use crate::config::TreeConfig;
use crate::error::Result;

/// The core B-tree implementation backing `BTree`.
///
/// Nodes and values live in separate arenas; a node refers to its children and to
/// its values by [`Handle`]. Every child handle is stored in exactly one parent, so
/// the node graph is a tree and dropping the arenas releases everything.
pub(crate) struct RawBTree<K, V, C> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K>>,
    /// Arena storing all values (separate from nodes so overwrites never touch nodes).
    values: Arena<V>,
    /// Empty nodes with full storage reserved, handed out by splits.
    spare: Vec<Node<K>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Total number of key-value pairs in the tree.
    len: usize,
    degree: Degree,
    comparator: C,
}

/// Outcome of the read-only probe that precedes every insert.
enum InsertPlan {
    /// The key is present; only its value changes.
    Overwrite(Handle),
    /// The key is absent; `splits` full nodes lie on the path to its leaf.
    Descend { splits: usize },
}

#[derive(Clone, Copy, Debug)]
enum Side {
    Min,
    Max,
}

impl<K, V, C> RawBTree<K, V, C> {
    /// Creates an empty tree without reserving any storage.
    pub(crate) const fn new(degree: Degree, comparator: C) -> Self {
        Self {
            nodes: Arena::new(),
            values: Arena::new(),
            spare: Vec::new(),
            root: None,
            len: 0,
            degree,
            comparator,
        }
    }

    /// Creates an empty tree with the configured capacity reserved.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or its capacity cannot be reserved.
    pub(crate) fn try_new(config: TreeConfig, comparator: C) -> Result<Self> {
        config.validate()?;
        let degree = Degree::new(config.min_degree());
        let mut tree = Self::new(degree, comparator);
        tree.nodes = Arena::try_with_capacity(config.capacity().div_ceil(degree.max_keys()))?;
        tree.values = Arena::try_with_capacity(config.capacity())?;
        debug!(
            min_degree = degree.get(),
            capacity = config.capacity(),
            "btree.create"
        );
        Ok(tree)
    }

    /// Returns the number of key-value pairs in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree contains no elements.
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn degree(&self) -> Degree {
        self.degree
    }

    pub(crate) const fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the number of entries the value arena can hold without reallocating.
    pub(crate) fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Returns the number of live nodes.
    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    #[cfg(test)]
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K> {
        self.nodes.get_mut(handle)
    }

    #[cfg(test)]
    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    /// Clears all elements from the tree.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.values.clear();
        self.spare.clear();
        self.root = None;
        self.len = 0;
        trace!("btree.clear");
    }

    /// Returns the number of levels; 0 for an empty tree, 1 for a lone leaf root.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            current = self.nodes.get(handle).children().first().copied();
        }
        height
    }

    /// Returns an in-order cursor over every entry.
    pub(crate) fn cursor(&self) -> Cursor<'_, K, V> {
        Cursor::first(&self.nodes, &self.values, self.root)
    }

    /// Returns the position of the smallest or largest entry.
    fn edge(&self, side: Side) -> Option<(Handle, usize)> {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                let index = match side {
                    Side::Min => 0,
                    Side::Max => node.key_count().checked_sub(1)?,
                };
                return Some((current, index));
            }
            current = match side {
                Side::Min => node.child(0),
                Side::Max => node.child(node.child_count() - 1),
            };
        }
    }

    fn entry_at(&self, handle: Handle, index: usize) -> (&K, &V) {
        let node = self.nodes.get(handle);
        (node.key(index), self.values.get(node.value(index)))
    }

    /// Returns the first key-value pair in the tree.
    pub(crate) fn first_key_value(&self) -> Option<(&K, &V)> {
        self.edge(Side::Min).map(|(handle, index)| self.entry_at(handle, index))
    }

    /// Returns the last key-value pair in the tree.
    pub(crate) fn last_key_value(&self) -> Option<(&K, &V)> {
        self.edge(Side::Max).map(|(handle, index)| self.entry_at(handle, index))
    }

    /// Reserves `nodes` ready-to-use nodes and `values` value slots, so the mutation
    /// that follows cannot fail halfway.
    fn reserve(&mut self, nodes: usize, values: usize) -> Result<()> {
        let result = self.reserve_nodes(nodes).and_then(|()| self.values.try_reserve(values));
        if let Err(err) = &result {
            warn!(nodes, values, error = %err, "btree.reserve.failed");
        }
        result
    }

    fn reserve_nodes(&mut self, count: usize) -> Result<()> {
        self.nodes.try_reserve(count)?;
        if self.spare.len() < count {
            self.spare.try_reserve(count - self.spare.len())?;
            while self.spare.len() < count {
                self.spare.push(Node::try_with_degree(self.degree)?);
            }
        }
        Ok(())
    }

    /// Takes an empty node set aside by [`reserve`](Self::reserve).
    fn take_spare(&mut self) -> Node<K> {
        let Some(node) = self.spare.pop() else {
            unreachable!("`RawBTree::take_spare()` - node allocated without a reservation!")
        };
        node
    }

    /// Keeps a released node's storage for the next split, if there is room to hold it.
    fn recycle(&mut self, mut node: Node<K>) {
        if self.spare.len() < self.spare.capacity() {
            node.reset();
            self.spare.push(node);
        }
    }
}

impl<K, V, C: Comparator<K>> RawBTree<K, V, C> {
    /// Searches for a key and returns the node handle and index if found.
    pub(crate) fn search(&self, key: &K) -> Option<(Handle, usize)> {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            match node.search(key, &self.comparator) {
                SearchResult::Found(index) => return Some((current, index)),
                SearchResult::NotFound(_) if node.is_leaf() => return None,
                SearchResult::NotFound(index) => current = node.child(index),
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the key-value pair corresponding to the key.
    pub(crate) fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let (handle, index) = self.search(key)?;
        Some(self.entry_at(handle, index))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (handle, index) = self.search(key)?;
        let value = self.nodes.get(handle).value(index);
        Some(self.values.get_mut(value))
    }

    /// Returns true if the tree contains the specified key.
    pub(crate) fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Returns a cursor positioned at the first entry satisfying `start`.
    pub(crate) fn seek(&self, start: Bound<&K>) -> Cursor<'_, K, V> {
        Cursor::seek(&self.nodes, &self.values, self.root, start, &self.comparator)
    }

    /// Returns up to `limit` entries with `min <= key <= max`, in key order.
    pub(crate) fn range_query(&self, min: &K, max: &K, limit: usize) -> Vec<(&K, &V)> {
        if limit == 0 || self.comparator.compare(min, max) == Ordering::Greater {
            return Vec::new();
        }
        self.seek(Bound::Included(min))
            .take_while(|(key, _)| self.comparator.compare(key, max) != Ordering::Greater)
            .take(limit)
            .collect()
    }

    /// Walks the insertion path without touching it, counting the splits an insert would make.
    fn plan_insert(&self, key: &K) -> InsertPlan {
        let mut splits = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            match node.search(key, &self.comparator) {
                SearchResult::Found(index) => return InsertPlan::Overwrite(node.value(index)),
                SearchResult::NotFound(index) => {
                    if node.is_full(self.degree) {
                        splits += 1;
                    }
                    current = (!node.is_leaf()).then(|| node.child(index));
                }
            }
        }
        InsertPlan::Descend { splits }
    }

    /// Inserts a key-value pair into the tree.
    /// Returns the old value if the key was already present.
    ///
    /// Every node and value slot the insert could need is reserved before the
    /// first split, so an error leaves the tree untouched.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let Some(root) = self.root else {
            self.reserve(1, 1)?;
            let value = self.values.alloc(value);
            let mut leaf = self.take_spare();
            leaf.push_back(key, value, None);
            self.root = Some(self.nodes.alloc(leaf));
            self.len = 1;
            return Ok(None);
        };

        let splits = match self.plan_insert(&key) {
            InsertPlan::Overwrite(value_handle) => {
                return Ok(Some(core::mem::replace(self.values.get_mut(value_handle), value)));
            }
            InsertPlan::Descend { splits } => splits,
        };
        // A full root needs a new parent as well as a sibling.
        let root_full = self.nodes.get(root).is_full(self.degree);
        self.reserve(splits + usize::from(root_full), 1)?;

        let mut current = if root_full { self.grow_root(root) } else { root };
        loop {
            let node = self.nodes.get(current);
            let index = match node.search(&key, &self.comparator) {
                SearchResult::Found(index) => {
                    let value_handle = node.value(index);
                    return Ok(Some(core::mem::replace(self.values.get_mut(value_handle), value)));
                }
                SearchResult::NotFound(index) => index,
            };

            if node.is_leaf() {
                let value = self.values.alloc(value);
                self.nodes.get_mut(current).insert_at(index, key, value);
                self.len += 1;
                return Ok(None);
            }

            let mut child = node.child(index);
            if self.nodes.get(child).is_full(self.degree) {
                let right = self.split_child(current, index);
                let parent = self.nodes.get(current);
                match self.comparator.compare(&key, parent.key(index)) {
                    Ordering::Less => {}
                    Ordering::Greater => child = right,
                    Ordering::Equal => {
                        let value_handle = parent.value(index);
                        return Ok(Some(core::mem::replace(self.values.get_mut(value_handle), value)));
                    }
                }
            }
            current = child;
        }
    }

    /// Wraps a full root in a fresh root and splits it, adding one level.
    fn grow_root(&mut self, old_root: Handle) -> Handle {
        let mut node = self.take_spare();
        node.adopt_only_child(old_root);
        let new_root = self.nodes.alloc(node);
        self.root = Some(new_root);
        self.split_child(new_root, 0);
        debug!(height = self.height(), "btree.root.grow");
        new_root
    }

    /// Splits the full child at `index` of `parent`, promoting its median into
    /// `parent`. Returns the new right sibling.
    fn split_child(&mut self, parent: Handle, index: usize) -> Handle {
        let child = self.nodes.get(parent).child(index);
        let mut sibling = self.take_spare();
        let (key, value) = self.nodes.get_mut(child).split_into(self.degree, &mut sibling);
        let right = self.nodes.alloc(sibling);
        self.nodes.get_mut(parent).insert_separator(index, key, value, right);
        trace!(
            parent = parent.index(),
            left = child.index(),
            right = right.index(),
            "btree.split"
        );
        right
    }

    /// Removes a key from the tree and returns the key-value pair.
    ///
    /// Absent keys are detected by a read-only probe, so a miss never restructures the tree.
    pub(crate) fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.search(key)?;
        let (key, value) = self.remove_from_root(key)?;
        Some(self.finish_removal(key, value))
    }

    /// Removes and returns the first key-value pair.
    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        let root = self.root?;
        let (key, value) = self.remove_extreme(root, Side::Min)?;
        Some(self.finish_removal(key, value))
    }

    /// Removes and returns the last key-value pair.
    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        let root = self.root?;
        let (key, value) = self.remove_extreme(root, Side::Max)?;
        Some(self.finish_removal(key, value))
    }

    fn finish_removal(&mut self, key: K, value: Handle) -> (K, V) {
        let value = self.values.take(value);
        self.len -= 1;
        if let Some(root) = self.root
            && self.nodes.get(root).key_count() == 0
        {
            // Merges collapse a key-less internal root immediately, so this is an empty leaf.
            self.nodes.free(root);
            self.root = None;
            debug!("btree.root.empty");
        }
        (key, value)
    }

    /// Descends from the root, topping up every child before entering it so that the
    /// node the key is finally removed from can afford to lose it.
    fn remove_from_root(&mut self, key: &K) -> Option<(K, Handle)> {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            match node.search(key, &self.comparator) {
                SearchResult::Found(index) if node.is_leaf() => {
                    return Some(self.nodes.get_mut(current).remove_at(index));
                }
                SearchResult::Found(index) => {
                    let left = node.child(index);
                    let right = node.child(index + 1);
                    // Replace the key with its predecessor or successor when a neighbour
                    // subtree can spare one; otherwise sink it into a merged child.
                    let replacement = if self.nodes.get(left).can_lend(self.degree) {
                        self.remove_extreme(left, Side::Max)
                    } else if self.nodes.get(right).can_lend(self.degree) {
                        self.remove_extreme(right, Side::Min)
                    } else {
                        current = self.merge_children(current, index);
                        continue;
                    };
                    let (key, value) = replacement?;
                    return Some(self.nodes.get_mut(current).replace_entry(index, key, value));
                }
                SearchResult::NotFound(_) if node.is_leaf() => return None,
                SearchResult::NotFound(index) => current = self.ensure_child_can_lend(current, index),
            }
        }
    }

    /// Removes the smallest or largest entry of the subtree rooted at `start`.
    ///
    /// `start` must be the root or hold at least `t` keys.
    fn remove_extreme(&mut self, start: Handle, side: Side) -> Option<(K, Handle)> {
        let mut current = start;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                let node = self.nodes.get_mut(current);
                let (key, value, _) = match side {
                    Side::Min => node.pop_first(),
                    Side::Max => node.pop_last(),
                }?;
                return Some((key, value));
            }
            let index = match side {
                Side::Min => 0,
                Side::Max => node.key_count(),
            };
            current = self.ensure_child_can_lend(current, index);
        }
    }
}

impl<K, V, C> RawBTree<K, V, C> {
    /// Makes sure the child at `index` of `parent` holds at least `t` keys, borrowing
    /// from a sibling (left first) or merging with one. Returns the node to descend into.
    fn ensure_child_can_lend(&mut self, parent: Handle, index: usize) -> Handle {
        let degree = self.degree;
        let node = self.nodes.get(parent);
        let child = node.child(index);
        if self.nodes.get(child).can_lend(degree) {
            return child;
        }

        let left = (index > 0).then(|| node.child(index - 1));
        let right = (index < node.key_count()).then(|| node.child(index + 1));
        let lends = |sibling: Option<Handle>| sibling.is_some_and(|s| self.nodes.get(s).can_lend(degree));

        if lends(left) {
            self.borrow_from_left(parent, index);
            child
        } else if lends(right) {
            self.borrow_from_right(parent, index);
            child
        } else if left.is_some() {
            self.merge_children(parent, index - 1)
        } else {
            self.merge_children(parent, index)
        }
    }

    /// Rotates the left sibling's last entry up into `parent` and the separator down
    /// into the front of the child at `index`.
    fn borrow_from_left(&mut self, parent: Handle, index: usize) {
        let (left, child) = {
            let node = self.nodes.get(parent);
            (node.child(index - 1), node.child(index))
        };
        let Some((key, value, moved)) = self.nodes.get_mut(left).pop_last() else {
            unreachable!("`RawBTree::borrow_from_left()` - left sibling is empty!")
        };
        let (separator, separator_value) = self.nodes.get_mut(parent).replace_entry(index - 1, key, value);
        self.nodes.get_mut(child).push_front(separator, separator_value, moved);
        trace!(parent = parent.index(), child = child.index(), "btree.borrow.left");
    }

    /// Rotates the right sibling's first entry up into `parent` and the separator down
    /// onto the end of the child at `index`.
    fn borrow_from_right(&mut self, parent: Handle, index: usize) {
        let (child, right) = {
            let node = self.nodes.get(parent);
            (node.child(index), node.child(index + 1))
        };
        let Some((key, value, moved)) = self.nodes.get_mut(right).pop_first() else {
            unreachable!("`RawBTree::borrow_from_right()` - right sibling is empty!")
        };
        let (separator, separator_value) = self.nodes.get_mut(parent).replace_entry(index, key, value);
        self.nodes.get_mut(child).push_back(separator, separator_value, moved);
        trace!(parent = parent.index(), child = child.index(), "btree.borrow.right");
    }

    /// Merges the children on either side of separator `index` of `parent`, pulling the
    /// separator down between them. Returns the merged node.
    ///
    /// If `parent` is the root and loses its last key, the merged node becomes the root.
    fn merge_children(&mut self, parent: Handle, index: usize) -> Handle {
        let (key, value, right) = self.nodes.get_mut(parent).remove_separator(index);
        let left = self.nodes.get(parent).child(index);
        let mut right_node = self.nodes.take(right);
        self.nodes.get_mut(left).merge_from(key, value, &mut right_node);
        self.recycle(right_node);
        trace!(
            parent = parent.index(),
            left = left.index(),
            right = right.index(),
            "btree.merge"
        );

        if self.root == Some(parent)
            && let Some(only_child) = self.nodes.get_mut(parent).take_only_child()
        {
            let old_root = self.nodes.take(parent);
            self.recycle(old_root);
            self.root = Some(only_child);
            debug!(height = self.height(), "btree.root.collapse");
        }
        left
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for RawBTree<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            values: self.values.clone(),
            spare: Vec::new(),
            root: self.root,
            len: self.len,
            degree: self.degree,
            comparator: self.comparator.clone(),
        }
    }
}
