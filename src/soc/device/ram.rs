//! Heap-backed stand-in for physical memory. It covers `[origin, origin + len)`, hands out
//! at most one window at a time and counts every map/unmap so callers can check how a
//! mapper drives the backing.
use std::{cell::Cell, ops::Range, ptr::NonNull};

use super::{DeviceError, DeviceResult, MappedWindow, PhysMemory};

pub struct RamMemory {
    name: String,
    origin: u64,
    // Cell so mapped windows and peek/poke can alias the same bytes.
    bytes: Box<[Cell<u8>]>,
    active: Option<u64>,
    maps: usize,
    unmaps: usize,
}

impl RamMemory {
    pub fn new(name: impl Into<String>, origin: u64, len: usize) -> Self {
        Self {
            name: name.into(),
            origin,
            bytes: (0..len).map(|_| Cell::new(0)).collect(),
            active: None,
            maps: 0,
            unmaps: 0,
        }
    }

    #[inline(always)]
    pub fn span(&self) -> Range<u64> {
        self.origin..self.origin + self.bytes.len() as u64
    }

    /// Number of successful `map` calls so far.
    pub fn map_count(&self) -> usize {
        self.maps
    }

    pub fn unmap_count(&self) -> usize {
        self.unmaps
    }

    /// Base of the window currently handed out, if any.
    pub fn active_window(&self) -> Option<u64> {
        self.active
    }

    pub fn peek(&self, address: u64, len: usize) -> DeviceResult<Vec<u8>> {
        let cells = self.cells(address, len)?;
        Ok(cells.iter().map(Cell::get).collect())
    }

    pub fn poke(&self, address: u64, data: &[u8]) -> DeviceResult<()> {
        let cells = self.cells(address, data.len())?;
        for (cell, byte) in cells.iter().zip(data) {
            cell.set(*byte);
        }
        Ok(())
    }

    fn cells(&self, address: u64, len: usize) -> DeviceResult<&[Cell<u8>]> {
        let span = self.span();
        let out_of_range = || DeviceError::OutOfRange {
            device: self.name.clone(),
            base: address,
            len,
            start: span.start,
            end: span.end,
        };
        if address < span.start {
            return Err(out_of_range());
        }
        let start = usize::try_from(address - span.start).map_err(|_| out_of_range())?;
        let end = start.checked_add(len).ok_or_else(out_of_range)?;
        self.bytes.get(start..end).ok_or_else(out_of_range)
    }
}

impl PhysMemory for RamMemory {
    type Window = RamWindow;

    fn name(&self) -> &str {
        &self.name
    }

    fn map(&mut self, base: u64, len: usize) -> DeviceResult<RamWindow> {
        if let Some(active) = self.active {
            return Err(DeviceError::Busy {
                device: self.name.clone(),
                active,
            });
        }
        let cells = self.cells(base, len)?;
        let ptr = NonNull::from(cells).cast::<u8>();
        self.active = Some(base);
        self.maps += 1;
        Ok(RamWindow { base, len, ptr })
    }

    fn unmap(&mut self, window: RamWindow) -> DeviceResult<()> {
        if self.active != Some(window.base) {
            return Err(DeviceError::NotMapped {
                device: self.name.clone(),
                base: window.base,
            });
        }
        self.active = None;
        self.unmaps += 1;
        Ok(())
    }
}

pub struct RamWindow {
    base: u64,
    len: usize,
    ptr: NonNull<u8>,
}

unsafe impl MappedWindow for RamWindow {
    #[inline(always)]
    fn base(&self) -> u64 {
        self.base
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }
}
