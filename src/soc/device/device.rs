//! Defines the `PhysMemory` trait implemented by physical-memory backings. A backing hands
//! out mapped windows over a physical byte range and takes them back again; the window
//! mapper on the bus side guarantees at most one window is outstanding at a time.
use std::ptr::NonNull;

use super::error::DeviceResult;

/// A live mapping of `len()` bytes of physical address space starting at `base()`.
///
/// # Safety
/// `as_ptr()` must point at `len()` bytes that stay valid for volatile reads and writes
/// until the window is handed back to [`PhysMemory::unmap`] or dropped.
pub unsafe trait MappedWindow {
    /// Physical address of the first mapped byte.
    fn base(&self) -> u64;
    fn len(&self) -> usize;
    fn as_ptr(&self) -> NonNull<u8>;

    #[inline(always)]
    fn contains(&self, address: u64) -> bool {
        address >= self.base() && address - self.base() < self.len() as u64
    }
}

pub trait PhysMemory {
    type Window: MappedWindow;

    fn name(&self) -> &str;

    /// Map `[base, base + len)`. `base` is already aligned by the caller.
    fn map(&mut self, base: u64, len: usize) -> DeviceResult<Self::Window>;

    /// Release a window previously returned by `map`.
    fn unmap(&mut self, window: Self::Window) -> DeviceResult<()>;
}
