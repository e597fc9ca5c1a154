use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::element::Element;
use crate::error::{Result, TensorError};

/// Shared, lock-protected element buffer.
///
/// Cloning a `Storage` aliases the same buffer: views such as a transpose
/// hold a clone and see every write made through any other handle.
#[derive(Debug)]
pub struct Storage<T> {
    data: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for Storage<T> {
    fn clone(&self) -> Self {
        Storage {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Element> Storage<T> {
    /// Wrap an owned vector.
    pub fn from_vec(data: Vec<T>) -> Self {
        Storage {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Create zero-filled storage with `n` elements.
    pub fn zeros(n: usize) -> Self {
        Self::from_vec(vec![T::zero(); n])
    }

    /// Number of elements in this storage.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Acquire shared read access.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, Vec<T>>> {
        self.data.read().map_err(|_| TensorError::StoragePoisoned)
    }

    /// Acquire exclusive write access.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<T>>> {
        self.data.write().map_err(|_| TensorError::StoragePoisoned)
    }

    /// Returns true if both handles refer to the same buffer.
    pub fn same_buffer(&self, other: &Storage<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live handles to this buffer.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}
