//! Fixed-capacity object pool with a free list.
//!
//! A [`Handle`] is only ever redeemed against the `Pool` that issued it, not
//! passed to untrusted callers, so use-after-release is a kernel-internal
//! bug rather than an externally reachable fault: it traps as an assertion
//! rather than surfacing as a typed error.

use crate::error::PoolError;

/// A handle to one element acquired from a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle(usize);

/// Fixed-capacity pool of `T`, each slot reused without being reconstructed
/// or zeroed between acquires.
pub struct Pool<T> {
    slots: Vec<T>,
    free_list: Vec<usize>,
    in_use: Vec<bool>,
    capacity: usize,
}

impl<T: Clone> Pool<T> {
    /// Create a pool of exactly `capacity` elements, each initialized to
    /// `template.clone()`. `capacity` must be non-zero.
    #[must_use]
    pub fn new(capacity: usize, template: T) -> Self {
        assert!(capacity > 0, "pool capacity must be non-zero");
        Self {
            slots: vec![template; capacity],
            free_list: (0..capacity).rev().collect(),
            in_use: vec![false; capacity],
            capacity,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Acquire exclusive use of one element.
    pub fn acquire(&mut self) -> Result<Handle, PoolError> {
        let idx = self.free_list.pop().ok_or(PoolError::PoolExhausted {
            capacity: self.capacity,
        })?;
        self.in_use[idx] = true;
        Ok(Handle(idx))
    }

    /// Return a previously acquired handle to the free list.
    ///
    /// Releasing a handle twice is an invariant violation: it traps in debug
    /// builds via `assert!` and is unchecked (but will not create aliasing
    /// `&mut` access through this API) in release builds.
    pub fn release(&mut self, handle: Handle) {
        debug_assert!(
            self.in_use[handle.0],
            "double-release of pool handle {}",
            handle.0
        );
        self.in_use[handle.0] = false;
        self.free_list.push(handle.0);
    }

    #[must_use]
    pub fn get(&self, handle: Handle) -> &T {
        &self.slots[handle.0]
    }

    #[must_use]
    pub fn get_mut(&mut self, handle: Handle) -> &mut T {
        &mut self.slots[handle.0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.capacity - self.free_list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the currently acquired elements, in slot order (not
    /// acquisition order).
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.in_use
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
            .map(|(idx, _)| (Handle(idx), &self.slots[idx]))
    }

    /// Iterate the currently acquired elements mutably, in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.in_use
            .iter()
            .zip(self.slots.iter_mut())
            .enumerate()
            .filter(|(_, (used, _))| **used)
            .map(|(idx, (_, slot))| (Handle(idx), slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_cycle() {
        let mut pool: Pool<u32> = Pool::new(4, 0);
        let h = pool.acquire().unwrap();
        assert_eq!(pool.free_count(), 3);
        pool.release(h);
        assert_eq!(pool.free_count(), 4);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut pool: Pool<u32> = Pool::new(2, 0);
        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert_eq!(
            pool.acquire(),
            Err(PoolError::PoolExhausted { capacity: 2 })
        );
    }

    #[test]
    fn free_count_never_exceeds_capacity() {
        let mut pool: Pool<u32> = Pool::new(3, 0);
        let handles: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
        assert_eq!(pool.free_count(), 0);
        for h in handles {
            pool.release(h);
        }
        assert_eq!(pool.free_count(), 3);
        assert!(pool.free_count() <= pool.capacity());
    }

    #[test]
    fn elements_are_not_reconstructed_between_uses() {
        let mut pool: Pool<u32> = Pool::new(1, 0);
        let h = pool.acquire().unwrap();
        *pool.get_mut(h) = 99;
        pool.release(h);
        let h2 = pool.acquire().unwrap();
        assert_eq!(*pool.get(h2), 99);
    }

    #[test]
    #[should_panic(expected = "double-release")]
    fn double_release_traps_in_debug() {
        let mut pool: Pool<u32> = Pool::new(1, 0);
        let h = pool.acquire().unwrap();
        pool.release(h);
        pool.release(h);
    }

    #[test]
    fn iter_only_visits_acquired_slots() {
        let mut pool: Pool<u32> = Pool::new(4, 0);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        *pool.get_mut(a) = 10;
        *pool.get_mut(b) = 20;
        assert_eq!(pool.len(), 2);
        let mut values: Vec<u32> = pool.iter().map(|(_, v)| *v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![10, 20]);

        pool.release(a);
        assert_eq!(pool.len(), 1);
        let values: Vec<u32> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![20]);
    }

    #[test]
    fn iter_mut_allows_updating_in_place() {
        let mut pool: Pool<u32> = Pool::new(2, 0);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        for (_, v) in pool.iter_mut() {
            *v += 1;
        }
        assert_eq!(*pool.get(a), 1);
        assert_eq!(*pool.get(b), 1);
    }
}
