use golr::signal;
use miette::Result;

// Run with: `env RUST_LOG=debug cargo run --example signal`,
// then issue some signals to the printed PID, or hit e.g. Ctrl-C.
// Send a SIGTERM (unix) or Ctrl-Break (windows) to exit.
#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt::init();

	tracing::info!("PID is {}", std::process::id());
	let mut signals = signal::listen()?;
	while let Some(sig) = signals.recv().await {
		tracing::info!("signal: {sig}");
		if sig == signal::Signal::Terminate {
			break;
		}
	}

	Ok(())
}
