use core::num::NonZero;

// Narrow in tests so running out of handles is cheap to exercise.
#[cfg(test)]
type Slot = u16;
#[cfg(not(test))]
type Slot = u32;

/// Position of a node or value in an [`Arena`](super::arena::Arena).
///
/// Stores `index + 1`, so `Option<Handle>` is the same size as `Handle`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<Slot>);

impl Handle {
    /// Number of distinct handles, and so the most slots an arena can address.
    pub(crate) const LIMIT: usize = Slot::MAX as usize;

    #[inline]
    pub(crate) const fn new(index: usize) -> Self {
        assert!(index < Self::LIMIT, "`Handle::new()` - `index` is beyond `Handle::LIMIT`!");
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((index + 1) as Slot) {
            Some(slot) => Self(slot),
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}
