use std::{
    convert::Infallible,
    io::{self, IsTerminal},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use regbridge::{bridge::Dispatcher, config::Args, soc::bus::WindowedMapper};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries protocol bytes; every diagnostic goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    match run(Args::parse()) {
        Ok(never) => match never {},
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<Infallible> {
    let config = args.into_config().context("invalid configuration")?;
    let mapper = WindowedMapper::open(&config.device, config.window_size)
        .context("cannot open physical memory")?;
    tracing::info!(
        "register bridge ready on {} ({}-byte windows)",
        config.device.display(),
        mapper.window_size().bytes()
    );

    let mut dispatcher = Dispatcher::new(mapper, io::stdin().lock(), io::stdout().lock());
    let err = match dispatcher.run() {
        Ok(never) => match never {},
        Err(err) => err,
    };
    let handled = dispatcher.commands_handled();
    let (mapper, _, _) = dispatcher.into_parts();
    if let Err(close_err) = mapper.close() {
        tracing::warn!("failed to release mapping: {close_err:#}");
    }
    Err(err).with_context(|| format!("bridge stopped after {handled} commands"))
}
