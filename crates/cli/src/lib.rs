#![deny(rust_2018_idioms)]
#![allow(clippy::missing_const_for_fn, clippy::future_not_send)]

use std::path::Path;

use golr::{signal, Coordinator};
use miette::Result;
use tracing::{debug, info};

use crate::args::Args;

pub mod args;
mod config;

async fn run_golr(args: Args, log_file: Option<&Path>) -> Result<()> {
	info!(version=%env!("CARGO_PKG_VERSION"), "constructing golr from CLI");

	let config = config::make_config(&args, log_file)?;
	let coordinator = Coordinator::new(&config)?;

	debug!("installing signal listeners");
	let signals = signal::listen()?;

	info!("running main loop");
	coordinator.run(signals).await;

	info!("done with main loop");
	Ok(())
}

pub async fn run() -> Result<()> {
	let (args, logging) = args::get_args().await?;
	debug!(?args, "arguments");
	run_golr(args, logging.as_ref().and_then(|log| log.file.as_deref())).await
}
