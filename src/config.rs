//! Command-line and environment configuration for the bridge binary.
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::soc::{
    bus::WindowSize,
    device::{DevMem, devmem::DEFAULT_DEVICE},
};

#[derive(Debug, Parser)]
#[command(
    name = "regbridge",
    version,
    about = "Serve register read/write commands from stdin against a physical memory device"
)]
pub struct Args {
    /// Physical memory device to map windows from.
    #[arg(long, env = "REGBRIDGE_DEVICE", default_value = DEFAULT_DEVICE)]
    pub device: PathBuf,

    /// Mapping window size in bytes. Must be a power of two and a multiple of the page size.
    #[arg(long, env = "REGBRIDGE_WINDOW_SIZE", default_value_t = DevMem::page_size())]
    pub window_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window size {0} is not a power of two of at least 4 bytes")]
    WindowSize(usize),

    #[error("window size {size} is not a multiple of the {page}-byte page size")]
    PageMultiple { size: usize, page: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub device: PathBuf,
    pub window_size: WindowSize,
}

impl Args {
    pub fn into_config(self) -> Result<BridgeConfig, ConfigError> {
        BridgeConfig::new(self.device, self.window_size, DevMem::page_size())
    }
}

impl BridgeConfig {
    pub fn new(device: PathBuf, window_size: usize, page: usize) -> Result<Self, ConfigError> {
        let size = WindowSize::new(window_size).ok_or(ConfigError::WindowSize(window_size))?;
        if size.bytes() % page != 0 {
            return Err(ConfigError::PageMultiple {
                size: window_size,
                page,
            });
        }
        Ok(Self {
            device,
            window_size: size,
        })
    }
}
