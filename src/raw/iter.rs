use core::cmp::Ordering;
use core::iter::FusedIterator;
use core::ops::Bound;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;
use crate::comparator::Comparator;

/// A node on the cursor's stack and the index of the next entry it will yield.
///
/// Every child left of `index` has already been visited or skipped.
#[derive(Clone, Copy)]
struct Frame {
    node: Handle,
    index: usize,
}

/// In-order cursor over a tree's entries.
///
/// Holds the path from the root to the next entry, so each step is amortised O(1)
/// and never allocates for trees less than 16 levels deep.
pub(crate) struct Cursor<'a, K, V> {
    nodes: &'a Arena<Node<K>>,
    values: &'a Arena<V>,
    stack: SmallVec<[Frame; 16]>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// A cursor that yields nothing.
    pub(crate) fn empty(nodes: &'a Arena<Node<K>>, values: &'a Arena<V>) -> Self {
        Self {
            nodes,
            values,
            stack: SmallVec::new(),
        }
    }

    /// A cursor positioned at the smallest entry.
    pub(crate) fn first(nodes: &'a Arena<Node<K>>, values: &'a Arena<V>, root: Option<Handle>) -> Self {
        let mut cursor = Self::empty(nodes, values);
        if let Some(root) = root {
            cursor.descend_leftmost(root);
        }
        cursor
    }

    /// A cursor positioned at the first entry that satisfies `start`.
    pub(crate) fn seek<C>(
        nodes: &'a Arena<Node<K>>,
        values: &'a Arena<V>,
        root: Option<Handle>,
        start: Bound<&K>,
        comparator: &C,
    ) -> Self
    where
        C: Comparator<K>,
    {
        let key = match start {
            Bound::Unbounded => return Self::first(nodes, values, root),
            Bound::Included(key) | Bound::Excluded(key) => key,
        };

        let mut cursor = Self::empty(nodes, values);
        let mut current = root;
        while let Some(handle) = current {
            let node = nodes.get(handle);
            let index = match start {
                Bound::Excluded(_) => node.upper_bound(key, comparator),
                _ => node.lower_bound(key, comparator),
            };
            cursor.stack.push(Frame { node: handle, index });

            // An exact match for an inclusive start is the next entry; nothing below it qualifies.
            let exact = matches!(start, Bound::Included(_))
                && index < node.key_count()
                && comparator.compare(node.key(index), key) == Ordering::Equal;
            current = if exact || node.is_leaf() {
                None
            } else {
                Some(node.child(index))
            };
        }
        cursor
    }

    fn descend_leftmost(&mut self, mut handle: Handle) {
        let nodes = self.nodes;
        loop {
            self.stack.push(Frame { node: handle, index: 0 });
            let node = nodes.get(handle);
            if node.is_leaf() {
                return;
            }
            handle = node.child(0);
        }
    }
}

impl<'a, K, V> Iterator for Cursor<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        loop {
            let frame = self.stack.last_mut()?;
            let node = nodes.get(frame.node);
            if frame.index < node.key_count() {
                let index = frame.index;
                frame.index += 1;
                if !node.is_leaf() {
                    self.descend_leftmost(node.child(index + 1));
                }
                return Some((node.key(index), self.values.get(node.value(index))));
            }
            self.stack.pop();
        }
    }
}

impl<K, V> FusedIterator for Cursor<'_, K, V> {}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            values: self.values,
            stack: self.stack.clone(),
        }
    }
}
