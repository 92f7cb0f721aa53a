//! The main loop.

use std::{iter, time::Duration};

use tokio::{select, sync::mpsc, time::sleep};
use tracing::{debug, error, info, trace, warn};

use crate::{
	builder::Builder,
	config::Config,
	error::CriticalError,
	scanner::ChangeScanner,
	signal::Signal,
	state::SupervisorState,
	supervisor::{Completion, ProcessSupervisor},
};

/// Ties change detection, building, and process supervision together.
///
/// The coordinator is driven from a single task and is the only owner of the state, the scanner's
/// baseline, and the child handle, so nothing here is locked.
///
/// Note that there is no timeout on a kill: a child which doesn't die keeps the coordinator in
/// [`Killing`](SupervisorState::Killing) until a signal arrives.
#[derive(Debug)]
pub struct Coordinator {
	scanner: ChangeScanner,
	builder: Builder,
	supervisor: ProcessSupervisor,
	state: SupervisorState,
	poll_interval: Duration,
	kill_on_exit: bool,
}

impl Coordinator {
	/// Set up the components from the config.
	///
	/// The change baseline is taken now.
	pub fn new(config: &Config) -> Result<Self, CriticalError> {
		config.validate()?;

		Ok(Self {
			scanner: ChangeScanner::new(config.sources.clone(), config.watch_dirs.clone()).ignore(
				iter::once(config.output.clone()).chain(config.ignored.iter().cloned()),
			),
			builder: Builder::new(
				config.compiler.clone(),
				config.output.clone(),
				config.sources.clone(),
			),
			supervisor: ProcessSupervisor::new(
				config.output.clone(),
				config.child_args.clone(),
				config.workdir.clone(),
			),
			state: SupervisorState::default(),
			poll_interval: config.poll_interval,
			kill_on_exit: config.kill_on_exit,
		})
	}

	/// The current state.
	pub const fn state(&self) -> SupervisorState {
		self.state
	}

	/// Run until a signal arrives, or until the artifact exits without being asked to.
	///
	/// With [`kill_on_exit`](Config::kill_on_exit), a live artifact is killed and reaped before
	/// this returns.
	///
	/// `signals` is usually from [`signal::listen()`](crate::signal::listen). If it closes, the
	/// loop carries on without it.
	pub async fn run(mut self, mut signals: mpsc::Receiver<Signal>) {
		info!(state=?self.state, "starting main loop");

		while self.state != SupervisorState::Exiting {
			trace!(state=?self.state, "main loop iteration");
			if self.state.is_waiting() {
				self.wait(&mut signals).await;
			} else {
				self.build().await;
				self.state = self.state.built();
			}
		}

		if self.kill_on_exit && self.supervisor.kill() {
			debug!("killing process on the way out");
			report(&self.supervisor.wait().await);
		}

		info!("main loop done");
		eprintln!("Done running");
	}

	async fn build(&mut self) {
		let sources = self
			.builder
			.sources()
			.iter()
			.map(|path| path.display().to_string())
			.collect::<Vec<_>>();
		eprintln!("Building: [{}]", sources.join(" "));
		debug!(?sources, "building");

		let outcome = self.builder.build().await;
		if !outcome.success {
			warn!(elapsed=?outcome.elapsed, "build failed");
			eprintln!("Build failed:\n{}", outcome.output_lossy());
			return;
		}

		eprintln!("Build done: {:?}", outcome.elapsed);
		eprintln!("Starting {}", self.supervisor.program().display());
		if let Err(err) = self.supervisor.spawn() {
			error!(%err, "while spawning process");
			eprintln!("*** Error: {err}");
		}
	}

	async fn wait(&mut self, signals: &mut mpsc::Receiver<Signal>) {
		if self.scanner.detect() {
			if self.state == SupervisorState::Running {
				let killed = self.supervisor.kill();
				self.state = self.state.changed(killed);
				debug!(?killed, state=?self.state, "change handled");
				if self.state == SupervisorState::Building {
					return;
				}
			} else {
				debug!(state=?self.state, "change ignored");
			}
		}

		select! {
			end = self.supervisor.wait() => {
				report(&end);
				self.state = self.state.exited();
			}
			Some(sig) = signals.recv() => {
				debug!(?sig, "received signal");
				eprintln!("Signal: {sig}");
				self.state = self.state.signalled();
			}
			() = sleep(self.poll_interval) => {}
		}
	}
}

fn report(end: &Completion) {
	debug!(pid=?end.pid, killed=%end.killed, status=?end.status, "process ended");
	match &end.status {
		Ok(status) => eprintln!("Process exited: {status}"),
		Err(err) => {
			error!(%err, "while waiting on process");
			eprintln!("Process exited: {err}");
		}
	}
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
	use std::{
		fs::{write, File},
		path::Path,
		time::SystemTime,
	};

	use tokio::time::timeout;

	use super::*;

	fn touch_ahead(path: &Path, secs: u64) {
		File::options()
			.write(true)
			.open(path)
			.unwrap()
			.set_modified(SystemTime::now() + Duration::from_secs(secs))
			.unwrap();
	}

	#[tokio::test]
	async fn changes_while_killing_are_consumed_but_ignored() {
		let dir = tempfile::tempdir().unwrap();
		let source = dir.path().join("main.go");
		write(&source, "package main").unwrap();
		let config = Config::new([source.clone()], dir.path().join("lr-bin"))
			.poll_interval(Duration::from_millis(20));
		let mut coordinator = Coordinator::new(&config).unwrap();

		// a child which takes a while to go away after the kill request
		coordinator.supervisor =
			ProcessSupervisor::new("/bin/sh", vec!["-c".into(), "sleep 1".into()], None);
		coordinator.supervisor.spawn().unwrap();
		coordinator.state = SupervisorState::Killing;
		let (_tx, mut signals) = mpsc::channel(1);

		touch_ahead(&source, 2);
		coordinator.wait(&mut signals).await;
		assert_eq!(coordinator.state(), SupervisorState::Killing);
		let first = coordinator.scanner.baseline();
		assert!(first > SystemTime::now());

		touch_ahead(&source, 3);
		coordinator.wait(&mut signals).await;
		assert_eq!(coordinator.state(), SupervisorState::Killing);
		assert!(coordinator.scanner.baseline() > first);

		timeout(Duration::from_secs(10), async {
			while coordinator.state() == SupervisorState::Killing {
				coordinator.wait(&mut signals).await;
			}
		})
		.await
		.expect("child should end");

		assert_eq!(coordinator.state(), SupervisorState::Building);
		assert!(!coordinator.scanner.detect());
	}
}
