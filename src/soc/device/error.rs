use std::{io, path::PathBuf};

use thiserror::Error;

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Failures raised by a physical-memory backing. OS errors are kept as the `source` so the
/// top-level report can print the whole chain.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to open physical memory device {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to map 0x{base:08X}+0x{len:X} from {device}")]
    Map {
        device: String,
        base: u64,
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to unmap window at 0x{base:08X} from {device}")]
    Unmap {
        device: String,
        base: u64,
        #[source]
        source: io::Error,
    },

    #[error("range 0x{base:08X}+0x{len:X} lies outside {device} (0x{start:08X}..0x{end:08X})")]
    OutOfRange {
        device: String,
        base: u64,
        len: usize,
        start: u64,
        end: u64,
    },

    #[error("{device} already has a window mapped at 0x{active:08X}")]
    Busy { device: String, active: u64 },

    #[error("{device} has no window mapped at 0x{base:08X}")]
    NotMapped { device: String, base: u64 },
}
