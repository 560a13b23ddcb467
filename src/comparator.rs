use core::cmp::Ordering;

/// A total order over keys, supplied by the caller.
///
/// The tree never inspects keys itself; every placement decision goes through
/// [`compare`](Comparator::compare). The order must be a strict total order
/// (consistent, antisymmetric and transitive). If it is not, the tree's contents
/// become unspecified, though it stays memory safe.
///
/// Closures and `fn` items of type `Fn(&K, &K) -> Ordering` implement this trait.
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use multiway::BTree;
///
/// // Case-insensitive string keys.
/// let by_lowercase = |a: &String, b: &String| a.to_lowercase().cmp(&b.to_lowercase());
/// let mut tree = BTree::with_comparator(2, by_lowercase).unwrap();
/// tree.insert("Apple".to_string(), 1).unwrap();
/// tree.insert("apple".to_string(), 2).unwrap();
///
/// assert_eq!(tree.len(), 1);
/// assert_eq!(tree.get(&"APPLE".to_string()), Some(&2));
/// ```
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct NaturalOrder;

impl<K: ?Sized + Ord> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Reverses another comparator.
///
/// # Examples
///
/// ```
/// use multiway::{BTree, NaturalOrder, Reversed};
///
/// let mut tree = BTree::with_comparator(2, Reversed(NaturalOrder)).unwrap();
/// for k in 1..=5 {
///     tree.insert(k, ()).unwrap();
/// }
/// assert_eq!(tree.min_key(), Some(&5));
/// assert_eq!(tree.max_key(), Some(&1));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Reversed<C>(pub C);

impl<K: ?Sized, C: Comparator<K>> Comparator<K> for Reversed<C> {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self.0.compare(b, a)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn by_abs(a: &i32, b: &i32) -> Ordering {
        a.abs().cmp(&b.abs())
    }

    #[test]
    fn natural_and_reversed() {
        assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
        assert_eq!(NaturalOrder.compare("b", "a"), Ordering::Greater);
        assert_eq!(Reversed(NaturalOrder).compare(&1, &2), Ordering::Greater);
        assert_eq!(Reversed(NaturalOrder).compare(&7, &7), Ordering::Equal);
    }

    #[test]
    fn functions_are_comparators() {
        assert_eq!(by_abs.compare(&-3, &2), Ordering::Greater);
        assert_eq!(by_abs.compare(&-3, &3), Ordering::Equal);

        let closure = |a: &u8, b: &u8| b.cmp(a);
        assert_eq!(closure.compare(&1, &2), Ordering::Greater);
    }
}
