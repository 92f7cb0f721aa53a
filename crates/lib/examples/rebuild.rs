use std::{env::args, time::Duration};

use golr::{config::resolve_path, signal, Config, Coordinator};
use miette::Result;

// Run with: `cargo run --example rebuild -- main.go`,
// then edit main.go and watch it be rebuilt and restarted.
#[tokio::main]
async fn main() -> Result<()> {
	// golr logs a fair amount at debug level and below,
	// so filter it with RUST_LOG if you want to see it.
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let sources = args()
		.skip(1)
		.map(resolve_path)
		.collect::<Result<Vec<_>, _>>()?;

	let config = Config::new(sources, resolve_path("lr-bin")?)
		.poll_interval(Duration::from_millis(500))
		.kill_on_exit(true);

	let signals = signal::listen()?;
	Coordinator::new(&config)?.run(signals).await;
	Ok(())
}
