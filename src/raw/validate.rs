use core::cmp::Ordering;

use super::handle::Handle;
use super::raw_btree::RawBTree;
use crate::comparator::Comparator;
use crate::error::Violation;

/// Exclusive key bounds a subtree must respect, fixed by the separators above it.
struct Bounds<'a, K> {
    lower: Option<&'a K>,
    upper: Option<&'a K>,
}

impl<K, V, C: Comparator<K>> RawBTree<K, V, C> {
    /// Checks every structural invariant and reports the first defect found.
    ///
    /// Nodes are visited depth-first, left to right, and each node's own shape is
    /// checked before its children.
    pub(crate) fn validate(&self) -> Result<(), Violation> {
        let counted = match self.root() {
            Some(root) => {
                let mut leaf_depth = None;
                let bounds = Bounds {
                    lower: None,
                    upper: None,
                };
                self.validate_subtree(root, 0, bounds, &mut leaf_depth)?
            }
            None => 0,
        };

        if counted == self.len() {
            Ok(())
        } else {
            Err(Violation::LengthMismatch {
                recorded: self.len(),
                counted,
            })
        }
    }

    /// Validates the subtree rooted at `handle` and returns the number of entries in it.
    fn validate_subtree<'a>(
        &'a self,
        handle: Handle,
        depth: usize,
        bounds: Bounds<'a, K>,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize, Violation> {
        let node = self.node(handle);
        let id = handle.index();
        let degree = self.degree();
        let is_root = self.root() == Some(handle);
        let count = node.key_count();

        if !node.is_leaf() && node.child_count() != count + 1 {
            return Err(Violation::ChildCount {
                node: id,
                keys: count,
                children: node.child_count(),
            });
        }

        // An empty tree has no root node, so a stored root always holds a key.
        if count == 0 || count > degree.max_keys() || node.is_deficient(degree, is_root) {
            return Err(Violation::KeyCount {
                node: id,
                count,
                min: if is_root { 1 } else { degree.min_keys() },
                max: degree.max_keys(),
            });
        }

        let comparator = self.comparator();
        let keys = node.keys();
        if let Some(index) = keys
            .windows(2)
            .position(|pair| comparator.compare(&pair[0], &pair[1]) != Ordering::Less)
        {
            return Err(Violation::Unordered { node: id, index });
        }

        // Keys are sorted at this point, so only the ends can escape the bounds.
        if let Some(lower) = bounds.lower
            && comparator.compare(&keys[0], lower) != Ordering::Greater
        {
            return Err(Violation::OutOfBounds { node: id, index: 0 });
        }
        if let Some(upper) = bounds.upper
            && comparator.compare(&keys[count - 1], upper) != Ordering::Less
        {
            return Err(Violation::OutOfBounds {
                node: id,
                index: count - 1,
            });
        }

        if node.is_leaf() {
            return match *leaf_depth {
                Some(expected) if expected != depth => Err(Violation::LeafDepth {
                    node: id,
                    expected,
                    found: depth,
                }),
                Some(_) => Ok(count),
                None => {
                    *leaf_depth = Some(depth);
                    Ok(count)
                }
            };
        }

        let mut total = count;
        for (index, &child) in node.children().iter().enumerate() {
            let child_bounds = Bounds {
                lower: if index == 0 { bounds.lower } else { Some(node.key(index - 1)) },
                upper: if index == count { bounds.upper } else { Some(node.key(index)) },
            };
            total += self.validate_subtree(child, depth + 1, child_bounds, leaf_depth)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::comparator::{NaturalOrder, Reversed};
    use crate::config::TreeConfig;

    type Tree = RawBTree<i32, i32, NaturalOrder>;

    fn tree(min_degree: usize, keys: impl IntoIterator<Item = i32>) -> Tree {
        let mut tree = RawBTree::try_new(TreeConfig::new(min_degree), NaturalOrder).unwrap();
        for key in keys {
            tree.insert(key, key).unwrap();
        }
        tree
    }

    fn root(tree: &Tree) -> Handle {
        tree.root().unwrap()
    }

    #[test]
    fn empty_tree_is_valid() {
        assert_eq!(tree(2, []).validate(), Ok(()));
    }

    #[test]
    fn reversed_order_is_valid() {
        let mut tree = RawBTree::try_new(TreeConfig::new(2), Reversed(NaturalOrder)).unwrap();
        for key in 0..40 {
            tree.insert(key, ()).unwrap();
        }
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn detects_length_mismatch() {
        let mut tree = tree(3, [1, 2, 3]);
        tree.set_len(5);
        assert_eq!(
            tree.validate(),
            Err(Violation::LengthMismatch {
                recorded: 5,
                counted: 3
            })
        );
    }

    #[test]
    fn detects_unordered_keys() {
        let mut tree = tree(3, [1, 2, 3]);
        let root = root(&tree);
        let value = tree.node(root).value(0);
        tree.node_mut(root).replace_entry(0, 5, value);
        assert_eq!(
            tree.validate(),
            Err(Violation::Unordered {
                node: root.index(),
                index: 0
            })
        );
    }

    #[test]
    fn detects_empty_leaf() {
        // Root [2] over leaves [1] and [3, 4].
        let mut tree = tree(2, 1..=4);
        let leaf = tree.node(root(&tree)).child(0);
        tree.node_mut(leaf).remove_at(0);
        assert_eq!(
            tree.validate(),
            Err(Violation::KeyCount {
                node: leaf.index(),
                count: 0,
                min: 1,
                max: 3
            })
        );
    }

    #[test]
    fn detects_key_outside_separator_bounds() {
        let mut tree = tree(2, 1..=4);
        let leaf = tree.node(root(&tree)).child(0);
        let value = tree.node(leaf).value(0);
        tree.node_mut(leaf).replace_entry(0, 7, value);
        assert_eq!(
            tree.validate(),
            Err(Violation::OutOfBounds {
                node: leaf.index(),
                index: 0
            })
        );
    }

    #[test]
    fn detects_missing_child() {
        let mut tree = tree(2, 1..=4);
        let root = root(&tree);
        let value = tree.node(root).value(0);
        tree.node_mut(root).insert_at(1, 9, value);
        assert_eq!(
            tree.validate(),
            Err(Violation::ChildCount {
                node: root.index(),
                keys: 2,
                children: 2
            })
        );
    }

    #[test]
    fn detects_uneven_leaf_depth() {
        // Root [4] over [2] and [6, 8]; lift the leaf [5] into the place of [6, 8].
        let mut tree = tree(2, 1..=10);
        assert_eq!(tree.height(), 3);
        let root = root(&tree);
        let right = tree.node(root).child(1);
        let leaf = tree.node(right).child(0);
        let (key, value, _) = tree.node_mut(root).remove_separator(0);
        tree.node_mut(root).insert_separator(0, key, value, leaf);
        assert_eq!(
            tree.validate(),
            Err(Violation::LeafDepth {
                node: leaf.index(),
                expected: 2,
                found: 1
            })
        );
    }
}
