use crate::error::{Error, Result};

/// Minimum degree used by [`TreeConfig::default`].
///
/// Matches the node width of the standard library's `BTreeMap` (at most 11 keys per node).
pub const DEFAULT_MIN_DEGREE: usize = 6;

/// Construction parameters for a [`BTree`](crate::BTree).
///
/// # Examples
///
/// ```
/// use multiway::{BTree, NaturalOrder, TreeConfig};
///
/// let config = TreeConfig::new(3).with_capacity(64);
/// assert_eq!(config.max_keys(), 5);
/// assert_eq!(config.min_keys(), 2);
///
/// let tree: BTree<u32, &str> = BTree::with_config(config, NaturalOrder).unwrap();
/// assert_eq!(tree.min_degree(), 3);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TreeConfig {
    min_degree: usize,
    capacity: usize,
}

impl TreeConfig {
    /// Creates a configuration with the given minimum degree `t` and no pre-reserved capacity.
    ///
    /// The degree is checked by [`validate`](Self::validate), not here.
    #[must_use]
    pub const fn new(min_degree: usize) -> Self {
        Self {
            min_degree,
            capacity: 0,
        }
    }

    /// Sets the number of entries to reserve room for up front.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Returns the minimum degree `t`.
    #[must_use]
    pub const fn min_degree(&self) -> usize {
        self.min_degree
    }

    /// Returns the requested up-front capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `2t - 1`, the most keys any node may hold.
    #[must_use]
    pub const fn max_keys(&self) -> usize {
        self.min_degree.saturating_mul(2).saturating_sub(1)
    }

    /// Returns `t - 1`, the fewest keys a non-root node may hold.
    #[must_use]
    pub const fn min_keys(&self) -> usize {
        self.min_degree.saturating_sub(1)
    }

    /// Checks that the configuration describes a legal tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the minimum degree is below 2, or so
    /// large that `2t` overflows.
    pub fn validate(&self) -> Result<()> {
        if self.min_degree < 2 {
            return Err(Error::InvalidArgument("min_degree must be at least 2"));
        }
        if self.min_degree.checked_mul(2).is_none() {
            return Err(Error::InvalidArgument("min_degree is too large"));
        }
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DEGREE)
    }
}
