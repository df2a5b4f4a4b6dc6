//! Command-stream side of the bridge: the wire codec, record framing and the dispatch loop
//! that drives a `WindowedMapper`.
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod transport;

pub use command::{COMMAND_LEN, Command, Op, RESPONSE_LEN, Response};
pub use dispatcher::Dispatcher;
pub use error::{BridgeError, BridgeResult, ProtocolError};
