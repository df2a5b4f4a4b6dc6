//! `WindowHandle` is the location `WindowedMapper::resolve` hands back: one address inside
//! the active window plus typed volatile load/store at 8, 16 or 32 bits.
//!
//! The handle borrows the mapper mutably, so it cannot be kept across another `resolve`
//! and can never point into a window that has since been unmapped.
use std::{marker::PhantomData, ptr::NonNull};

use crate::soc::device::MappedWindow;

use super::{
    error::{BusError, BusResult},
    width::Width,
};

pub struct WindowHandle<'w> {
    start: NonNull<u8>,
    len: usize,
    offset: usize,
    address: u64,
    _window: PhantomData<&'w mut ()>,
}

impl<'w> WindowHandle<'w> {
    pub(crate) fn new<W: MappedWindow>(window: &'w mut W, address: u64) -> Self {
        debug_assert!(window.contains(address));
        Self {
            start: window.as_ptr(),
            len: window.len(),
            offset: (address - window.base()) as usize,
            address,
            _window: PhantomData,
        }
    }

    /// Physical address this handle refers to.
    #[inline(always)]
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Offset of the address from the start of its window.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Load `width` bits and zero-extend them to 32. Addresses that are not a multiple of
    /// the width are read through a byte array, which has no alignment requirement.
    pub fn load(&self, width: Width) -> BusResult<u32> {
        let ptr = self.checked_ptr(width)?;
        let aligned = self.is_aligned(width);
        let value = unsafe {
            match width {
                Width::W8 => ptr.read_volatile() as u32,
                Width::W16 if aligned => ptr.cast::<u16>().read_volatile() as u32,
                Width::W16 => u16::from_ne_bytes(ptr.cast::<[u8; 2]>().read_volatile()) as u32,
                Width::W32 if aligned => ptr.cast::<u32>().read_volatile(),
                Width::W32 => u32::from_ne_bytes(ptr.cast::<[u8; 4]>().read_volatile()),
            }
        };
        Ok(value)
    }

    /// Store the low `width` bits of `value`.
    pub fn store(&self, width: Width, value: u32) -> BusResult<()> {
        let ptr = self.checked_ptr(width)?;
        let aligned = self.is_aligned(width);
        unsafe {
            match width {
                Width::W8 => ptr.write_volatile(value as u8),
                Width::W16 if aligned => ptr.cast::<u16>().write_volatile(value as u16),
                Width::W16 => ptr.cast::<[u8; 2]>().write_volatile((value as u16).to_ne_bytes()),
                Width::W32 if aligned => ptr.cast::<u32>().write_volatile(value),
                Width::W32 => ptr.cast::<[u8; 4]>().write_volatile(value.to_ne_bytes()),
            }
        }
        Ok(())
    }

    #[inline(always)]
    fn is_aligned(&self, width: Width) -> bool {
        self.address % width.bytes() as u64 == 0
    }

    fn checked_ptr(&self, width: Width) -> BusResult<*mut u8> {
        if self.offset + width.bytes() > self.len {
            return Err(BusError::OutOfWindow {
                address: self.address,
                width,
                end: self.address - self.offset as u64 + self.len as u64,
            });
        }
        Ok(unsafe { self.start.as_ptr().add(self.offset) })
    }
}
