// vim: tw=80
//! Aligned memory buffers for direct I/O.
//!
//! `O_DIRECT` requires the buffer address, the file offset, and the transfer
//! length to all be aligned.  `Vec<u8>` only guarantees 1-byte alignment, so
//! allocate through `std::alloc` with an explicit `Layout`.

use std::{
    alloc::{self, Layout},
    fmt,
    ops::{Deref, DerefMut},
    ptr::NonNull,
    slice,
};
use crate::types::*;

/// A heap buffer whose address is aligned to a caller-chosen power of two.
///
/// The memory is released when the buffer is dropped.
pub struct AlignedBuf {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBuf {
    /// Allocate a zeroed buffer of `size` bytes aligned to `align` bytes.
    ///
    /// `align` must be a power of two and `size` must be nonzero.
    pub fn new(size: usize, align: usize) -> Result<Self> {
        let err = Error::AllocationFailed{size, align};
        if size == 0 {
            return Err(err);
        }
        let layout = Layout::from_size_align(size, align)
            .map_err(|_| err.clone())?;
        // SAFETY: layout has a nonzero size
        let p = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(p).ok_or(err)?;
        Ok(AlignedBuf { ptr, layout })
    }

    /// Allocate a buffer of `size` bytes, aligned to its own size, and fill it
    /// with `byte`.
    pub fn pattern(size: usize, byte: u8) -> Result<Self> {
        let mut buf = AlignedBuf::new(size, size)?;
        buf.fill(byte);
        Ok(buf)
    }

    pub fn align(&self) -> usize {
        self.layout.align()
    }
}

impl Deref for AlignedBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: ptr points to layout.size() initialized bytes, owned by self
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl DerefMut for AlignedBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access
        unsafe {
            slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size())
        }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl fmt::Debug for AlignedBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuf")
            .field("ptr", &self.ptr)
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

// LCOV_EXCL_STOP
