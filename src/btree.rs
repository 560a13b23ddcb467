use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::{Bound, RangeBounds};

use tracing::trace;

use crate::comparator::{Comparator, NaturalOrder};
use crate::config::{DEFAULT_MIN_DEGREE, TreeConfig};
use crate::error::{Error, Result};
use crate::raw::{Cursor, Degree, RawBTree};

/// An ordered map based on a classic [B-Tree] with a runtime minimum degree.
///
/// Every node holds between `t - 1` and `2t - 1` entries (the root may hold as
/// few as one), internal nodes hold one more child than entries, and all leaves
/// sit at the same depth. Keys and values are stored in every node, not only in
/// the leaves.
///
/// Keys are ordered by a [`Comparator`] chosen at construction time. The default,
/// [`NaturalOrder`], uses the key type's [`Ord`] implementation.
///
/// Mutations that may allocate return a [`Result`]. All memory an insert could
/// need is reserved before the tree is touched, so a failed call leaves the tree
/// exactly as it was.
///
/// It is a logic error for a key to be modified in such a way that its ordering
/// relative to any other key, as determined by the comparator, changes while it is
/// in the tree. The behavior resulting from such a logic error is not specified,
/// but will be encapsulated to the `BTree` that observed it and will not result in
/// undefined behavior.
///
/// # Examples
///
/// ```
/// use multiway::BTree;
///
/// let mut tree = BTree::new(2).unwrap();
/// for key in [10, 20, 5, 6, 12, 30, 7, 17] {
///     tree.insert(key, key * 100).unwrap();
/// }
///
/// assert_eq!(tree.len(), 8);
/// assert_eq!(tree.min_key(), Some(&5));
/// assert_eq!(tree.max_key(), Some(&30));
/// assert_eq!(tree.get(&12), Some(&1200));
/// assert!(tree.validate().is_ok());
///
/// tree.delete(&6).unwrap();
/// tree.delete(&20).unwrap();
/// assert_eq!(tree.len(), 6);
/// assert!(tree.validate().is_ok());
///
/// // Inclusive bounds, at most three results.
/// let hits: Vec<_> = tree.range_query(&6, &30, 3).into_iter().map(|(k, _)| *k).collect();
/// assert_eq!(hits, [7, 10, 12]);
/// ```
///
/// [B-Tree]: https://en.wikipedia.org/wiki/B-tree
pub struct BTree<K, V, C = NaturalOrder> {
    raw: RawBTree<K, V, C>,
}

/// An iterator over the entries of a `BTree`, in key order.
///
/// This `struct` is created by the [`iter`] method on [`BTree`].
///
/// # Examples
///
/// ```
/// use multiway::BTree;
///
/// let mut tree = BTree::new(2).unwrap();
/// tree.insert(2, "b").unwrap();
/// tree.insert(1, "a").unwrap();
///
/// let mut iter = tree.iter();
/// assert_eq!(iter.len(), 2);
/// assert_eq!(iter.next(), Some((&1, &"a")));
/// assert_eq!(iter.next(), Some((&2, &"b")));
/// assert_eq!(iter.next(), None);
/// ```
///
/// [`iter`]: BTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    inner: Cursor<'a, K, V>,
    remaining: usize,
}

/// An iterator over the keys of a `BTree`.
///
/// This `struct` is created by the [`keys`] method on [`BTree`].
///
/// [`keys`]: BTree::keys
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of a `BTree`.
///
/// This `struct` is created by the [`values`] method on [`BTree`].
///
/// [`values`]: BTree::values
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over a sub-range of entries in a `BTree`.
///
/// This `struct` is created by the [`range`] method on [`BTree`].
///
/// [`range`]: BTree::range
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V, C> {
    // `None` once the end bound has been passed.
    inner: Option<Cursor<'a, K, V>>,
    end: Bound<K>,
    comparator: &'a C,
}

impl<K, V> BTree<K, V> {
    /// Makes a new, empty `BTree` ordered by [`Ord`] with minimum degree `min_degree`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `min_degree` is below 2.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::{BTree, Error};
    ///
    /// let mut tree = BTree::new(3).unwrap();
    /// tree.insert(1, "a").unwrap();
    ///
    /// assert!(matches!(BTree::<u8, u8>::new(1), Err(Error::InvalidArgument(_))));
    /// ```
    pub fn new(min_degree: usize) -> Result<Self> {
        Self::with_comparator(min_degree, NaturalOrder)
    }

    /// Makes a new, empty `BTree` with [`DEFAULT_MIN_DEGREE`].
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn new_default() -> Self {
        Self {
            raw: RawBTree::new(Degree::new(DEFAULT_MIN_DEGREE), NaturalOrder),
        }
    }
}

impl<K, V, C> BTree<K, V, C> {
    /// Makes a new, empty `BTree` ordered by `comparator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `min_degree` is below 2.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::with_comparator(4, |a: &i32, b: &i32| b.cmp(a)).unwrap();
    /// tree.insert(1, ()).unwrap();
    /// tree.insert(2, ()).unwrap();
    /// assert_eq!(tree.min_key(), Some(&2));
    /// ```
    pub fn with_comparator(min_degree: usize, comparator: C) -> Result<Self> {
        Self::with_config(TreeConfig::new(min_degree), comparator)
    }

    /// Makes a new, empty `BTree` from a [`TreeConfig`], reserving its capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an invalid configuration, or
    /// [`Error::AllocationFailure`] / [`Error::CapacityExceeded`] if the requested
    /// capacity cannot be reserved.
    pub fn with_config(config: TreeConfig, comparator: C) -> Result<Self> {
        Ok(Self {
            raw: RawBTree::try_new(config, comparator)?,
        })
    }

    /// Returns the number of entries in the tree.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut a = BTree::new(2).unwrap();
    /// assert_eq!(a.len(), 0);
    /// a.insert(1, "a").unwrap();
    /// assert_eq!(a.len(), 1);
    /// ```
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the minimum degree `t` the tree was built with.
    #[must_use]
    pub const fn min_degree(&self) -> usize {
        self.raw.degree().get()
    }

    /// Returns the comparator that orders the keys.
    #[must_use]
    pub const fn comparator(&self) -> &C {
        self.raw.comparator()
    }

    /// Returns the number of levels in the tree.
    ///
    /// An empty tree has height 0 and a tree whose root is a leaf has height 1.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// assert_eq!(tree.height(), 0);
    /// for k in 1..=3 {
    ///     tree.insert(k, ()).unwrap();
    /// }
    /// assert_eq!(tree.height(), 1);
    /// tree.insert(4, ()).unwrap();
    /// assert_eq!(tree.height(), 2);
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the number of nodes currently in use.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.raw.node_count()
    }

    /// Returns the number of entries the tree can hold before its value storage reallocates.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Clears the tree, removing all entries.
    ///
    /// # Complexity
    ///
    /// O(n)
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut a = BTree::new(2).unwrap();
    /// a.insert(1, "a").unwrap();
    /// a.clear();
    /// assert!(a.is_empty());
    /// assert_eq!(a.height(), 0);
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the smallest key in the tree.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn min_key(&self) -> Option<&K> {
        self.raw.first_key_value().map(|(k, _)| k)
    }

    /// Returns the largest key in the tree.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn max_key(&self) -> Option<&K> {
        self.raw.last_key_value().map(|(k, _)| k)
    }

    /// Returns the first key-value pair in the tree.
    /// The key in this pair is the minimum key in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// assert_eq!(tree.first_key_value(), None);
    /// tree.insert(1, "b").unwrap();
    /// tree.insert(2, "a").unwrap();
    /// assert_eq!(tree.first_key_value(), Some((&1, &"b")));
    /// ```
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the last key-value pair in the tree.
    /// The key in this pair is the maximum key in the tree.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Gets an iterator over the entries of the tree, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(3, "c").unwrap();
    /// tree.insert(2, "b").unwrap();
    /// tree.insert(1, "a").unwrap();
    ///
    /// for (key, value) in tree.iter() {
    ///     println!("{key}: {value}");
    /// }
    ///
    /// let (first_key, first_value) = tree.iter().next().unwrap();
    /// assert_eq!((*first_key, *first_value), (1, "a"));
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.raw.cursor(),
            remaining: self.raw.len(),
        }
    }

    /// Gets an iterator over the keys of the tree, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the tree, in order by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(1, "hello").unwrap();
    /// tree.insert(2, "goodbye").unwrap();
    ///
    /// let values: Vec<&str> = tree.values().cloned().collect();
    /// assert_eq!(values, ["hello", "goodbye"]);
    /// ```
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, C: Comparator<K>> BTree<K, V, C> {
    /// Inserts a key-value pair into the tree.
    ///
    /// If the tree did not have this key present, `None` is returned.
    ///
    /// If the tree did have this key present, the value is updated and the old
    /// value is returned; the tree's shape is left unchanged.
    ///
    /// Full nodes on the way down are split before they are entered, so the tree
    /// grows in height only at the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] or [`Error::CapacityExceeded`] if the
    /// nodes or value slot the insert needs cannot be reserved. The tree is left
    /// unchanged.
    ///
    /// # Complexity
    ///
    /// O(t log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// assert_eq!(tree.insert(37, "a").unwrap(), None);
    /// assert_eq!(tree.is_empty(), false);
    ///
    /// tree.insert(37, "b").unwrap();
    /// assert_eq!(tree.insert(37, "c").unwrap(), Some("b"));
    /// assert_eq!(tree.get(&37), Some(&"c"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.raw.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Complexity
    ///
    /// O(t log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(1, "a").unwrap();
    /// assert_eq!(tree.get(&1), Some(&"a"));
    /// assert_eq!(tree.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.raw.get(key)
    }

    /// Returns the stored key-value pair corresponding to the supplied key.
    ///
    /// Useful with comparators that consider non-identical keys equal.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
    /// let mut tree = BTree::with_comparator(2, by_len).unwrap();
    /// tree.insert("abc", 1).unwrap();
    /// assert_eq!(tree.get_key_value(&"xyz"), Some((&"abc", &1)));
    /// ```
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.raw.get_key_value(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(1, "a").unwrap();
    /// if let Some(x) = tree.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(tree.get(&1), Some(&"b"));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.raw.get_mut(key)
    }

    /// Returns `true` if the tree contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.contains_key(key)
    }

    /// Removes a key from the tree, returning its value.
    ///
    /// Every child is topped up to at least `t` keys before the descent enters it,
    /// borrowing from a sibling or merging with one, so the tree never has to walk
    /// back up. A key found in an internal node is replaced by its in-order
    /// predecessor or successor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the key is absent. The tree is not
    /// restructured in that case.
    ///
    /// # Complexity
    ///
    /// O(t log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::{BTree, Error};
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(1, "a").unwrap();
    /// assert_eq!(tree.delete(&1), Ok("a"));
    /// assert_eq!(tree.delete(&1), Err(Error::NotFound));
    /// ```
    pub fn delete(&mut self, key: &K) -> Result<V> {
        match self.raw.remove_entry(key) {
            Some((_, value)) => Ok(value),
            None => {
                trace!(len = self.raw.len(), "btree.delete.not_found");
                Err(Error::NotFound)
            }
        }
    }

    /// Removes a key from the tree, returning the value if the key was present.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(1, "a").unwrap();
    /// assert_eq!(tree.remove(&1), Some("a"));
    /// assert_eq!(tree.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.raw.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the tree, returning the stored key and value if the key
    /// was present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.raw.remove_entry(key)
    }

    /// Removes and returns the first element in the tree.
    /// The key of this element is the minimum key that was in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(1, "a").unwrap();
    /// tree.insert(2, "b").unwrap();
    /// while let Some((key, _val)) = tree.pop_first() {
    ///     assert!(tree.iter().all(|(k, _v)| *k > key));
    /// }
    /// assert!(tree.is_empty());
    /// ```
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.raw.pop_first()
    }

    /// Removes and returns the last element in the tree.
    /// The key of this element is the maximum key that was in the tree.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.raw.pop_last()
    }

    /// Returns up to `limit` entries whose keys lie in `min..=max`, in key order.
    ///
    /// Yields nothing when `min` sorts after `max` or `limit` is zero.
    ///
    /// # Complexity
    ///
    /// O(t log n + limit)
    ///
    /// # Examples
    ///
    /// ```
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// for k in 0..20 {
    ///     tree.insert(k, k * k).unwrap();
    /// }
    /// assert_eq!(tree.range_query(&3, &5, 10), [(&3, &9), (&4, &16), (&5, &25)]);
    /// assert_eq!(tree.range_query(&3, &5, 1), [(&3, &9)]);
    /// assert!(tree.range_query(&5, &3, 10).is_empty());
    /// ```
    pub fn range_query(&self, min: &K, max: &K, limit: usize) -> Vec<(&K, &V)> {
        self.raw.range_query(min, max, limit)
    }

    /// Constructs a double-bounded iterator over a sub-range of entries in the tree.
    ///
    /// # Panics
    ///
    /// Panics if range `start > end`, or if `start == end` and both bounds are `Excluded`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::ops::Bound::Included;
    /// use multiway::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(3, "a").unwrap();
    /// tree.insert(5, "b").unwrap();
    /// tree.insert(8, "c").unwrap();
    /// for (&key, &value) in tree.range((Included(&4), Included(&8))) {
    ///     println!("{key}: {value}");
    /// }
    /// assert_eq!(Some((&5, &"b")), tree.range(4..).next());
    /// ```
    pub fn range<R>(&self, range: R) -> Range<'_, K, V, C>
    where
        K: Clone,
        R: RangeBounds<K>,
    {
        self.validate_range_bounds(&range);
        Range {
            inner: Some(self.raw.seek(range.start_bound())),
            end: range.end_bound().cloned(),
            comparator: self.raw.comparator(),
        }
    }

    fn validate_range_bounds<R: RangeBounds<K>>(&self, range: &R) {
        if let (Bound::Included(start) | Bound::Excluded(start), Bound::Included(end) | Bound::Excluded(end)) =
            (range.start_bound(), range.end_bound())
        {
            let order = self.raw.comparator().compare(start, end);
            let valid =
                if matches!(range.start_bound(), Bound::Excluded(_)) && matches!(range.end_bound(), Bound::Excluded(_)) {
                    order == Ordering::Less
                } else {
                    order != Ordering::Greater
                };
            assert!(valid, "range start is greater than range end in BTree");
        }
    }

    /// Checks every structural invariant of the tree.
    ///
    /// Intended for tests: a correct tree always passes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] describing the first defect found.
    pub fn validate(&self) -> Result<()> {
        Ok(self.raw.validate()?)
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for BTree<K, V, C> {
    fn clone(&self) -> Self {
        Self { raw: self.raw.clone() }
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for BTree<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq, C> Eq for BTree<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for BTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self::new_default()
    }
}

impl<'a, K, V, C> IntoIterator for &'a BTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish()
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys").field("remaining", &self.inner.remaining).finish()
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Values").field("remaining", &self.inner.remaining).finish()
    }
}

impl<'a, K, V, C: Comparator<K>> Iterator for Range<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.inner.as_mut()?.next()?;
        let within = match &self.end {
            Bound::Unbounded => true,
            Bound::Included(end) => self.comparator.compare(key, end) != Ordering::Greater,
            Bound::Excluded(end) => self.comparator.compare(key, end) == Ordering::Less,
        };
        if within {
            Some((key, value))
        } else {
            self.inner = None;
            None
        }
    }
}

impl<K, V, C: Comparator<K>> FusedIterator for Range<'_, K, V, C> {}

impl<K: fmt::Debug, V, C> fmt::Debug for Range<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range")
            .field("end", &self.end)
            .field("exhausted", &self.inner.is_none())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::comparator::Reversed;
    use crate::error::Violation;
    use alloc::format;
    use alloc::vec;

    fn sample() -> BTree<i32, i32> {
        let mut tree = BTree::new(2).unwrap();
        for k in [10, 20, 5, 6, 12, 30, 7, 17] {
            tree.insert(k, k * 10).unwrap();
        }
        tree
    }

    #[test]
    fn rejects_small_degrees() {
        for min_degree in [0, 1] {
            assert_eq!(
                BTree::<i32, i32>::new(min_degree).err(),
                Some(Error::InvalidArgument("min_degree must be at least 2"))
            );
        }
    }

    #[test]
    fn default_uses_default_degree() {
        let tree: BTree<i32, i32> = BTree::default();
        assert_eq!(tree.min_degree(), DEFAULT_MIN_DEGREE);
        assert_eq!(tree.capacity(), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn with_config_reserves_capacity() {
        let tree: BTree<i32, i32> = BTree::with_config(TreeConfig::new(3).with_capacity(100), NaturalOrder).unwrap();
        assert!(tree.capacity() >= 100);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn with_config_reports_exhausted_handle_space() {
        let config = TreeConfig::new(2).with_capacity(usize::from(u16::MAX) + 1);
        let result: Result<BTree<u8, u8>> = BTree::with_config(config, NaturalOrder);
        assert!(matches!(result, Err(Error::CapacityExceeded { .. })));
    }

    #[test]
    fn delete_reports_not_found() {
        let mut tree = sample();
        assert_eq!(tree.delete(&11), Err(Error::NotFound));
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.delete(&12), Ok(120));
        assert_eq!(tree.delete(&12), Err(Error::NotFound));
    }

    #[test]
    fn validate_wraps_violation() {
        let mut tree = sample();
        assert_eq!(tree.validate(), Ok(()));
        tree.raw.set_len(3);
        assert_eq!(
            tree.validate(),
            Err(Error::InvariantViolation(Violation::LengthMismatch {
                recorded: 3,
                counted: 8
            }))
        );
    }

    #[test]
    fn range_honors_both_bounds() {
        let tree = sample();
        let keys = |r: Range<'_, i32, i32, NaturalOrder>| r.map(|(k, _)| *k).collect::<Vec<_>>();
        assert_eq!(keys(tree.range(6..12)), vec![6, 7, 10]);
        assert_eq!(keys(tree.range(6..=12)), vec![6, 7, 10, 12]);
        assert_eq!(keys(tree.range((Bound::Excluded(6), Bound::Unbounded))), vec![7, 10, 12, 17, 20, 30]);
        assert_eq!(keys(tree.range(..)), vec![5, 6, 7, 10, 12, 17, 20, 30]);
        assert_eq!(keys(tree.range(31..)), vec![]);
    }

    #[test]
    #[should_panic(expected = "range start is greater than range end in BTree")]
    fn range_rejects_inverted_bounds() {
        let tree = sample();
        let _ = tree.range(10..5);
    }

    #[test]
    fn range_follows_comparator() {
        let mut tree = BTree::with_comparator(2, Reversed(NaturalOrder)).unwrap();
        for k in 0..10 {
            tree.insert(k, ()).unwrap();
        }
        let keys: Vec<i32> = tree.range(7..=3).map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn iterators_report_exact_len() {
        let tree = sample();
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 8);
        iter.next();
        assert_eq!(iter.len(), 7);
        assert_eq!(tree.keys().len(), 8);
        assert_eq!(tree.values().copied().sum::<i32>(), 1070);
    }

    #[test]
    fn equality_ignores_shape() {
        let a = sample();
        let mut b = BTree::new(5).unwrap();
        for k in [30, 17, 12, 10, 7, 6, 5, 20] {
            b.insert(k, k * 10).unwrap();
        }
        assert_ne!(a.height(), b.height());
        assert_eq!(a, b);
        b.remove(&30);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_prints_entries_in_order() {
        let mut tree = BTree::new(2).unwrap();
        tree.insert(2, "b").unwrap();
        tree.insert(1, "a").unwrap();
        assert_eq!(format!("{tree:?}"), r#"{1: "a", 2: "b"}"#);
    }
}
