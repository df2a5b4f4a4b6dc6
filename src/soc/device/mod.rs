#[path = "device.rs"]
mod device_trait;
pub mod devmem;
pub mod error;
pub mod ram;

pub use device_trait::{MappedWindow, PhysMemory};
pub use devmem::{DevMem, MmapWindow};
pub use error::{DeviceError, DeviceResult};
pub use ram::{RamMemory, RamWindow};
