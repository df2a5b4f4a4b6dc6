use std::io;

use thiserror::Error;

use crate::soc::bus::BusError;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Malformed command records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown command code {0}")]
    BadCommand(u8),

    #[error("unsupported access width {0} (expected 8, 16 or 32)")]
    BadWidth(u8),
}

/// Everything that stops the dispatch loop. None of these are recoverable.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("command stream closed after {received} of {expected} bytes")]
    Eof { received: usize, expected: usize },

    #[error("failed to read command stream")]
    Read(#[source] io::Error),

    #[error("failed to write response stream")]
    Write(#[source] io::Error),

    #[error("response stream accepted no bytes")]
    WriteZero,

    #[error("protocol violation")]
    Protocol(#[from] ProtocolError),

    #[error("register access failed")]
    Bus(#[from] BusError),
}
