//! Fixed-length record framing over blocking byte streams. Short reads and writes are
//! accumulated until the whole record has moved.
use std::io::{ErrorKind, Read, Write};

use super::error::{BridgeError, BridgeResult};

/// Read exactly `N` bytes. End of stream before the record is complete is an error, even
/// at a record boundary, since the protocol has no shutdown message.
pub fn read_record<R: Read, const N: usize>(input: &mut R) -> BridgeResult<[u8; N]> {
    let mut buf = [0u8; N];
    let mut filled = 0;
    while filled < N {
        match input.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(BridgeError::Eof {
                    received: filled,
                    expected: N,
                });
            }
            Ok(count) => {
                filled += count;
                if filled < N {
                    tracing::trace!("short read: {filled} of {N} bytes");
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(BridgeError::Read(err)),
        }
    }
    Ok(buf)
}

/// Write all of `record` and flush it so the peer sees it immediately.
pub fn write_record<W: Write>(output: &mut W, record: &[u8]) -> BridgeResult<()> {
    let mut sent = 0;
    while sent < record.len() {
        match output.write(&record[sent..]) {
            Ok(0) => return Err(BridgeError::WriteZero),
            Ok(count) => sent += count,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(BridgeError::Write(err)),
        }
    }
    output.flush().map_err(BridgeError::Write)
}
