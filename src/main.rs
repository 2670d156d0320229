use std::time::Duration;

use clap::Parser;
use cli::Cli;
use color_eyre::eyre::{Result, WrapErr};
use futures::executor;
use tokio::sync::mpsc;

use crate::{app::App, config::Config};

mod action;
mod advisory;
mod app;
mod cli;
mod commands;
mod components;
mod config;
mod errors;
mod export;
mod layout;
mod logging;
mod notify;
mod persist;
mod remote;
mod streak;
mod sync;
mod tui;

fn main() -> Result<()> {
    bootstrap(|| {
        let mut args = Cli::parse();
        let config = Config::new()?;

        if let Some(cmd) = args.command.take() {
            return commands::run(cmd, &config);
        }

        let (persist_tx, cmd_rx) = mpsc::unbounded_channel();
        let (evt_tx, persisted_rx) = mpsc::unbounded_channel();
        persist::start_async(cmd_rx, evt_tx, config.clone())?;

        let app = App::new(
            args.role(),
            args.tick_rate,
            args.frame_rate,
            config,
            persist_tx,
            persisted_rx,
        )?;
        executor::block_on(app.run())?;

        Ok(())
    })
}

fn bootstrap(fn_do_run: fn() -> Result<()>) -> Result<()> {
    crate::errors::init()?;
    crate::logging::init()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err_with(|| "Failed to start Tokio runtime")?;
    let _guard = runtime.enter();

    let result = fn_do_run();
    runtime.shutdown_timeout(Duration::from_secs(5));

    result
}
