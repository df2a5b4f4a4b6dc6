use thiserror::Error;

use crate::soc::device::DeviceError;

use super::width::Width;

pub type BusResult<T> = Result<T, BusError>;

#[derive(Debug, Error)]
pub enum BusError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("{width}-bit access at 0x{address:08X} runs past window end 0x{end:08X}")]
    OutOfWindow { address: u64, width: Width, end: u64 },
}
