//! Bounded view over a byte buffer, the unit of socket I/O.
//!
//! A segment owns its backing array exclusively while checked out of the
//! pool. `offset` and `count` bound the valid region; the invariant
//! `offset + count <= capacity` holds at all times.
//!
//! # Example
//!
//! ```
//! use stompwire::buffer::BufferSegment;
//!
//! let mut segment = BufferSegment::standalone(16);
//! segment.writable()[..5].copy_from_slice(b"hello");
//! segment.set_view(0, 5).unwrap();
//! assert_eq!(segment.as_slice(), b"hello");
//! ```

use crate::error::{Result, StompwireError};

/// A bounded view (offset/count/capacity) over an owned byte array.
#[derive(Debug)]
pub struct BufferSegment {
    /// Backing array, exclusively owned while the segment is live.
    buffer: Vec<u8>,
    /// Start of the valid region.
    offset: usize,
    /// Length of the valid region.
    count: usize,
}

impl BufferSegment {
    /// Create a standalone segment for one-off encodes, not tied to a pool.
    pub fn standalone(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity],
            offset: 0,
            count: 0,
        }
    }

    /// Wrap an existing buffer. Used by the pool when handing out slices.
    pub(crate) fn from_buffer(buffer: Vec<u8>) -> Self {
        Self {
            buffer,
            offset: 0,
            count: 0,
        }
    }

    /// Total capacity of the backing array.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Start of the valid region.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the valid region.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Set the valid region.
    ///
    /// Fails with `InvalidArgument` if `offset + count` exceeds capacity.
    pub fn set_view(&mut self, offset: usize, count: usize) -> Result<()> {
        if offset
            .checked_add(count)
            .map_or(true, |end| end > self.buffer.len())
        {
            return Err(StompwireError::InvalidArgument(format!(
                "segment view {}+{} exceeds capacity {}",
                offset,
                count,
                self.buffer.len()
            )));
        }
        self.offset = offset;
        self.count = count;
        Ok(())
    }

    /// The valid region as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[self.offset..self.offset + self.count]
    }

    /// The whole backing array from `offset` onward, for socket reads.
    #[inline]
    pub fn writable(&mut self) -> &mut [u8] {
        let offset = self.offset;
        &mut self.buffer[offset..]
    }

    /// Reset the view to empty at offset zero.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.count = 0;
    }

    /// Give the backing array back, consuming the segment.
    pub(crate) fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }
}
