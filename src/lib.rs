//! Register-access bridge: fixed-size binary commands in, physical memory loads and stores
//! through a single sliding `/dev/mem` window, fixed-size responses out.
pub mod bridge;
pub mod config;
pub mod soc;
