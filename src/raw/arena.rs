use alloc::vec::Vec;

use super::handle::Handle;
use crate::error::{Error, Result};

/// Slot storage addressed by [`Handle`]s, with a free list for reuse.
///
/// After a successful [`try_reserve`](Arena::try_reserve) the free list can hold
/// every slot, so releasing slots never allocates.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Creates an arena with room for `capacity` elements.
    ///
    /// # Errors
    ///
    /// Fails if the backing storage cannot be reserved or `capacity` exceeds `Handle::LIMIT`.
    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self> {
        let mut arena = Self::new();
        arena.try_reserve(capacity)?;
        Ok(arena)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    #[cfg(test)]
    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Guarantees that the next `additional` calls to [`alloc`](Self::alloc) neither
    /// reallocate nor run out of handles.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let fresh = additional.saturating_sub(self.free.len());
        if fresh == 0 {
            return Ok(());
        }
        let total = self.slots.len().saturating_add(fresh);
        if total > Handle::LIMIT {
            return Err(Error::CapacityExceeded { max: Handle::LIMIT });
        }
        self.slots.try_reserve(fresh)?;
        self.free.try_reserve(total - self.free.len())?;
        Ok(())
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            // Reuse a free slot/handle.
            self.slots[h.index()] = Some(element);
            h
        } else {
            assert!(
                self.slots.len() < Handle::LIMIT,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::LIMIT
            );
            self.slots.push(Some(element));
            Handle::new(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T: Clone> Clone for Arena<T> {
    fn clone(&self) -> Self {
        let mut free = Vec::with_capacity(self.slots.len());
        free.extend_from_slice(&self.free);
        Self {
            slots: self.slots.clone(),
            free,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arena_capacity() {
        let arena: Arena<u32> = Arena::try_with_capacity(10).unwrap();
        assert!(arena.capacity() >= 10);
        assert!(arena.is_empty());
    }

    #[test]
    fn reserve_counts_free_slots() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        arena.free(a);
        arena.free(b);

        // Two free slots cover a reservation of two without touching `slots`.
        let before = arena.capacity();
        arena.try_reserve(2).unwrap();
        assert_eq!(arena.capacity(), before);

        let c = arena.alloc(3);
        let d = arena.alloc(4);
        assert_eq!(*arena.get(c), 3);
        assert_eq!(*arena.get(d), 4);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn reserve_covers_free_list() {
        let mut arena: Arena<u32> = Arena::new();
        arena.try_reserve(8).unwrap();
        let handles: Vec<Handle> = (0..8).map(|v| arena.alloc(v)).collect();
        let free_capacity = arena.free.capacity();
        for handle in handles {
            arena.free(handle);
        }
        assert_eq!(arena.free.capacity(), free_capacity);
        assert!(arena.is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.alloc(1);
        let mut copy = arena.clone();
        *copy.get_mut(a) = 2;
        assert_eq!(*arena.get(a), 1);
        assert_eq!(*copy.get(a), 2);
        assert!(copy.free.capacity() >= 1);
    }

    #[test]
    fn reserve_beyond_handle_space_fails() {
        let mut arena: Arena<u8> = Arena::new();
        assert_eq!(
            arena.try_reserve(Handle::LIMIT + 1).err(),
            Some(Error::CapacityExceeded { max: Handle::LIMIT })
        );
        assert!(arena.try_reserve(16).is_ok());
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, u32)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        arena.try_reserve(1).unwrap();
                        let handle = arena.alloc(value);
                        model.push((handle, value));
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        *arena.get_mut(handle) = value;
                        model[index].1 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        let value1 = arena.take(handle);
                        let (_, value2) = model.swap_remove(index);
                        prop_assert_eq!(value1, value2);
                    }
                    Operation::Clear => {
                        arena.clear();
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(handle, value) in &model {
                    prop_assert_eq!(*arena.get(handle), value);
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        GetMut(usize, u32),
        Take(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            8 => any::<usize>().prop_map(Operation::Take),
            1 => Just(Operation::Clear),
        ]
    }
}
