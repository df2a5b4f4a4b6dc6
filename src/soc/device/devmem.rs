//! `/dev/mem` backing. The device file is opened once for synchronous read/write access and
//! windows are carved out of it with `mmap(MAP_SHARED)`. Any regular file can stand in for
//! the device, which is how the integration tests run without privileges.
use std::{
    fs::{File, OpenOptions},
    io,
    mem::ManuallyDrop,
    os::unix::{fs::OpenOptionsExt, io::AsRawFd},
    path::Path,
    ptr::{self, NonNull},
};

use super::{DeviceError, DeviceResult, MappedWindow, PhysMemory};

pub const DEFAULT_DEVICE: &str = "/dev/mem";

pub struct DevMem {
    name: String,
    file: File,
}

impl DevMem {
    pub fn open(path: impl AsRef<Path>) -> DeviceResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)
            .map_err(|source| DeviceError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(device = %path.display(), "opened physical memory device");
        Ok(Self {
            name: path.display().to_string(),
            file,
        })
    }

    /// Host page size; mmap offsets must be a multiple of it.
    pub fn page_size() -> usize {
        let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        usize::try_from(raw).unwrap_or(4096)
    }

    fn map_error(&self, base: u64, len: usize, source: io::Error) -> DeviceError {
        DeviceError::Map {
            device: self.name.clone(),
            base,
            len,
            source,
        }
    }
}

impl PhysMemory for DevMem {
    type Window = MmapWindow;

    fn name(&self) -> &str {
        &self.name
    }

    fn map(&mut self, base: u64, len: usize) -> DeviceResult<MmapWindow> {
        let offset = libc::off_t::try_from(base)
            .map_err(|_| self.map_error(base, len, io::Error::from(io::ErrorKind::InvalidInput)))?;
        let raw = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                self.file.as_raw_fd(),
                offset,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(self.map_error(base, len, io::Error::last_os_error()));
        }
        let ptr = NonNull::new(raw.cast::<u8>())
            .ok_or_else(|| self.map_error(base, len, io::Error::from(io::ErrorKind::AddrNotAvailable)))?;
        Ok(MmapWindow { base, len, ptr })
    }

    fn unmap(&mut self, window: MmapWindow) -> DeviceResult<()> {
        // The explicit munmap below replaces the Drop impl.
        let window = ManuallyDrop::new(window);
        let rc = unsafe { libc::munmap(window.ptr.as_ptr().cast(), window.len) };
        if rc != 0 {
            return Err(DeviceError::Unmap {
                device: self.name.clone(),
                base: window.base,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

/// One `mmap` of the device. Dropping it unmaps on a best-effort basis; the mapper uses
/// `PhysMemory::unmap` instead so failures are reported.
pub struct MmapWindow {
    base: u64,
    len: usize,
    ptr: NonNull<u8>,
}

unsafe impl MappedWindow for MmapWindow {
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

impl Drop for MmapWindow {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), self.len);
        }
    }
}
