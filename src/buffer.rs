//! Shared typed storage.
//!
//! A [`Buffer`] is a handle to one flat allocation. Cloning the handle aliases the allocation:
//! a dataset and all of its views hold handles to the same storage, and the storage lives as
//! long as the longest-lived handle.
//!
//! Every write through any handle bumps a version counter shared by all handles. Cached
//! statistics remember the version they were computed at, so a mutation through a view makes
//! the base's cache stale as well.
//!
//! Access is serialized by a `parking_lot::RwLock`. Holding a read guard while asking for a write
//! guard on an alias of the same buffer deadlocks, so bulk operations snapshot their source
//! before writing.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{element::Element, error::AllocationError};

pub struct Buffer<T> {
    data: Arc<RwLock<Vec<T>>>,
    version: Arc<AtomicU64>,
}

impl<T> Clone for Buffer<T> {
    /// Returns another handle to the same storage.
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            version: Arc::clone(&self.version),
        }
    }
}

impl<T> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.data.read().len())
            .field("version", &self.version())
            .field("handles", &Arc::strong_count(&self.data))
            .finish()
    }
}

impl<T: Element> Buffer<T> {
    /// Allocate `len` zero-valued elements in a single allocation.
    ///
    /// # Errors
    /// - [`AllocationError::TooLarge`] when the byte size overflows the addressable space.
    /// - [`AllocationError::OutOfMemory`] when the allocator refuses the request.
    pub fn allocate(len: usize) -> Result<Self, AllocationError> {
        let width = std::mem::size_of::<T>();
        let too_large = AllocationError::TooLarge {
            elements: len,
            width,
        };
        let bytes = len.checked_mul(width).ok_or_else(|| too_large.clone())?;
        if bytes > isize::MAX as usize {
            tracing::error!(
                elements = len,
                width,
                "requested dataset exceeds the addressable index space"
            );
            return Err(too_large);
        }

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            tracing::error!(
                elements = len,
                "the dataset being created is too large and there is not enough memory to hold it"
            );
            return Err(AllocationError::OutOfMemory { elements: len });
        }
        data.resize(len, T::zero());
        Ok(Self::from_vec(data))
    }
}

impl<T> Buffer<T> {
    /// Take ownership of existing storage without copying.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.data.read()
    }

    /// Lock the storage for writing and mark every alias as modified.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        let guard = self.data.write();
        self.version.fetch_add(1, Ordering::AcqRel);
        guard
    }

    /// Current mutation version shared by all handles.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Whether both handles alias the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live handles (base plus views).
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_zero_fills() {
        let buffer = Buffer::<i32>::allocate(5).unwrap();
        assert_eq!(buffer.read().as_slice(), &[0; 5]);
        assert_eq!(buffer.version(), 0);
    }

    #[test]
    fn allocate_rejects_oversized_requests() {
        let err = Buffer::<u64>::allocate(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, AllocationError::TooLarge { width: 8, .. }));
    }

    #[test]
    fn clones_alias_and_share_version() {
        let a = Buffer::<u8>::allocate(3).unwrap();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.handle_count(), 2);

        b.write()[1] = 9;
        assert_eq!(a.read()[1], 9);
        assert_eq!(a.version(), 1);
    }
}
