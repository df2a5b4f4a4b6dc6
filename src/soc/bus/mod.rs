pub mod error;
pub mod handle;
pub mod width;
pub mod window;

pub use error::{BusError, BusResult};
pub use handle::WindowHandle;
pub use width::Width;
pub use window::{WindowSize, WindowedMapper};
