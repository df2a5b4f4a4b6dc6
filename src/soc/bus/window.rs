//! WindowedMapper keeps a single fixed-size, aligned window of physical address space
//! mapped and turns physical addresses into `WindowHandle`s. Consecutive accesses that land
//! in the same window reuse the mapping; anything else unmaps the old window and maps the
//! new one before the handle is returned.
use std::path::Path;

use crate::soc::device::{DevMem, MappedWindow, PhysMemory};

use super::{error::BusResult, handle::WindowHandle};

/// Size of a mapping window in bytes. Always a power of two of at least 4 bytes, so a
/// naturally aligned 8/16/32-bit access never straddles two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize(usize);

impl WindowSize {
    pub const DEFAULT: Self = Self(4096);
    pub const MIN: usize = 4;

    pub const fn new(bytes: usize) -> Option<Self> {
        if bytes >= Self::MIN && bytes.is_power_of_two() {
            Some(Self(bytes))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn bytes(self) -> usize {
        self.0
    }

    #[inline(always)]
    pub const fn mask(self) -> u64 {
        self.0 as u64 - 1
    }

    /// Window base covering `address`.
    #[inline(always)]
    pub const fn base_of(self, address: u64) -> u64 {
        address & !self.mask()
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub struct WindowedMapper<M: PhysMemory> {
    memory: M,
    size: WindowSize,
    window: Option<M::Window>,
}

impl WindowedMapper<DevMem> {
    /// Open the physical memory device at `path`. No window is mapped until the first
    /// `resolve`.
    pub fn open(path: impl AsRef<Path>, size: WindowSize) -> BusResult<Self> {
        let memory = DevMem::open(path)?;
        Ok(Self::new(memory, size))
    }
}

impl<M: PhysMemory> WindowedMapper<M> {
    pub fn new(memory: M, size: WindowSize) -> Self {
        Self {
            memory,
            size,
            window: None,
        }
    }

    #[inline(always)]
    pub fn window_size(&self) -> WindowSize {
        self.size
    }

    /// Base of the window currently mapped, if any.
    pub fn active_base(&self) -> Option<u64> {
        self.window.as_ref().map(MappedWindow::base)
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn resolve(&mut self, address: u64) -> BusResult<WindowHandle<'_>> {
        let base = self.size.base_of(address);
        // The slot stays empty until the replacement is mapped, so a failure part way
        // through never leaves a released window behind as the active one.
        let window = match self.window.take() {
            Some(window) if window.base() == base => window,
            stale => {
                if let Some(old) = stale {
                    let old_base = old.base();
                    self.memory.unmap(old)?;
                    tracing::debug!(device = self.memory.name(), "unmapped window 0x{old_base:08X}");
                }
                let window = self.memory.map(base, self.size.bytes())?;
                tracing::debug!(
                    device = self.memory.name(),
                    "mapped window 0x{base:08X}+0x{:X} for 0x{address:08X}",
                    self.size.bytes()
                );
                window
            }
        };
        let window = self.window.insert(window);
        Ok(WindowHandle::new(window, address))
    }

    /// Unmap the active window and hand the backing back to the caller.
    pub fn release(mut self) -> BusResult<M> {
        if let Some(window) = self.window.take() {
            let base = window.base();
            self.memory.unmap(window)?;
            tracing::debug!(device = self.memory.name(), "unmapped window 0x{base:08X}");
        }
        Ok(self.memory)
    }

    /// Unmap the active window and drop the backing, closing the device.
    pub fn close(self) -> BusResult<()> {
        self.release().map(drop)
    }
}
