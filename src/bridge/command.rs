//! Wire codec for the bridge protocol. Both records are packed and use host byte order:
//!
//! ```text
//! command  (10 bytes): [0] op (0 = read, 1 = write) [1] width in bits
//!                      [2..6] address               [6..10] value (writes only)
//! response  (4 bytes): [0..4] value read, zero-extended to 32 bits
//! ```
use crate::soc::bus::Width;

use super::error::ProtocolError;

pub const COMMAND_LEN: usize = 10;
pub const RESPONSE_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Op {
    Read = 0,
    Write = 1,
}

impl TryFrom<u8> for Op {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, ProtocolError> {
        match code {
            0 => Ok(Op::Read),
            1 => Ok(Op::Write),
            other => Err(ProtocolError::BadCommand(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub op: Op,
    pub width: Width,
    pub address: u32,
    /// Ignored for reads.
    pub value: u32,
}

impl Command {
    pub fn read(width: Width, address: u32) -> Self {
        Self {
            op: Op::Read,
            width,
            address,
            value: 0,
        }
    }

    pub fn write(width: Width, address: u32, value: u32) -> Self {
        Self {
            op: Op::Write,
            width,
            address,
            value,
        }
    }

    pub fn decode(bytes: &[u8; COMMAND_LEN]) -> Result<Self, ProtocolError> {
        let op = Op::try_from(bytes[0])?;
        let width = Width::try_from(bytes[1]).map_err(ProtocolError::BadWidth)?;
        let address = u32::from_ne_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        let value = u32::from_ne_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        Ok(Self {
            op,
            width,
            address,
            value,
        })
    }

    pub fn encode(&self) -> [u8; COMMAND_LEN] {
        let mut out = [0u8; COMMAND_LEN];
        out[0] = self.op as u8;
        out[1] = self.width.bits();
        out[2..6].copy_from_slice(&self.address.to_ne_bytes());
        out[6..10].copy_from_slice(&self.value.to_ne_bytes());
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub value: u32,
}

impl Response {
    pub fn encode(&self) -> [u8; RESPONSE_LEN] {
        self.value.to_ne_bytes()
    }
}
