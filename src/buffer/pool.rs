//! Fixed-capacity buffer pool with LIFO reuse.
//!
//! The pool pre-allocates `slice_count` arrays of `slice_size` bytes each.
//! `acquire` pops from a free stack so the most recently released slice is
//! handed out first, keeping recently-used memory warm. Once every slice is
//! outstanding, `acquire` fails immediately with `PoolExhausted` - there is
//! no waiting.
//!
//! # Example
//!
//! ```
//! use stompwire::buffer::BufferPool;
//!
//! let pool = BufferPool::new(1024, 2);
//! let a = pool.acquire().unwrap();
//! let b = pool.acquire().unwrap();
//! assert!(pool.acquire().is_err());
//! pool.release(a);
//! assert!(pool.acquire().is_ok());
//! # drop(b);
//! ```

use parking_lot::Mutex;

use super::BufferSegment;
use crate::error::{Result, StompwireError};

/// Fixed-capacity allocator of equally-sized byte-array slices.
///
/// Safe to call from every connection task; the free stack sits behind a
/// single mutex that is held only for the push/pop.
pub struct BufferPool {
    /// Free slices, top of the stack reused first.
    free: Mutex<Vec<Vec<u8>>>,
    /// Size of each slice in bytes.
    slice_size: usize,
    /// Total number of slices the pool owns.
    slice_count: usize,
}

impl BufferPool {
    /// Create a pool with `slice_count` slices of `slice_size` bytes each.
    ///
    /// All slices are allocated up front.
    pub fn new(slice_size: usize, slice_count: usize) -> Self {
        let free = (0..slice_count).map(|_| vec![0u8; slice_size]).collect();
        Self {
            free: Mutex::new(free),
            slice_size,
            slice_count,
        }
    }

    /// Check a segment out of the pool.
    ///
    /// # Errors
    ///
    /// `PoolExhausted` once every slice is outstanding. Never blocks.
    pub fn acquire(&self) -> Result<BufferSegment> {
        let buffer = self
            .free
            .lock()
            .pop()
            .ok_or(StompwireError::PoolExhausted)?;
        Ok(BufferSegment::from_buffer(buffer))
    }

    /// Return a previously-acquired segment to the pool.
    ///
    /// Releasing a segment twice is a caller contract violation and is not
    /// detected. Segments whose capacity does not match the pool's slice
    /// size (standalone segments) are dropped rather than pooled.
    pub fn release(&self, segment: BufferSegment) {
        let buffer = segment.into_buffer();
        debug_assert_eq!(buffer.len(), self.slice_size);
        if buffer.len() == self.slice_size {
            self.free.lock().push(buffer);
        }
    }

    /// Number of slices currently available.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Size of each slice in bytes.
    #[inline]
    pub fn slice_size(&self) -> usize {
        self.slice_size
    }

    /// Total number of slices the pool owns.
    #[inline]
    pub fn slice_count(&self) -> usize {
        self.slice_count
    }
}
