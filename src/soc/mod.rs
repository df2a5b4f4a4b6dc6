pub mod bus;
pub mod device;
