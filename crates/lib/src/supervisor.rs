//! Supervision of the single running artifact.
//!
//! The [`ProcessSupervisor`] never waits on the process itself. Each spawn starts a waiter task
//! which owns the OS child handle, and which is the only thing that ever calls `wait()` on it.
//! The supervisor keeps a one-shot channel to that task to request a kill. When the process ends,
//! for whatever reason, the waiter publishes exactly one [`Completion`] on the completion channel.

use std::{
	path::{Path, PathBuf},
	process::ExitStatus,
};

use tokio::{
	process::Command,
	select, spawn,
	sync::{mpsc, oneshot},
};
use tracing::{debug, error, trace};

use crate::error::RuntimeError;

/// The end of a supervised process, as reported by its waiter.
#[derive(Debug)]
pub struct Completion {
	/// The OS process ID, if it was known at spawn time.
	pub pid: Option<u32>,

	/// Whether a kill request reached the waiter before the process ended.
	pub killed: bool,

	/// The exit status, or the error which occurred while waiting.
	pub status: Result<ExitStatus, RuntimeError>,
}

impl Completion {
	/// Whether the process exited successfully.
	pub fn success(&self) -> bool {
		self.status.as_ref().map_or(false, ExitStatus::success)
	}
}

#[derive(Debug)]
struct ChildHandle {
	pid: Option<u32>,
	kill: oneshot::Sender<()>,
}

/// Starts, kills, and reports on the build artifact.
///
/// There is at most one tracked child, and so at most one waiter task, at any time.
#[derive(Debug)]
pub struct ProcessSupervisor {
	program: PathBuf,
	args: Vec<String>,
	workdir: Option<PathBuf>,
	child: Option<ChildHandle>,
	completions_tx: mpsc::Sender<Completion>,
	completions_rx: mpsc::Receiver<Completion>,
}

impl ProcessSupervisor {
	/// A supervisor for `program`, which will be started with `args` every time.
	pub fn new(program: impl Into<PathBuf>, args: Vec<String>, workdir: Option<PathBuf>) -> Self {
		let (completions_tx, completions_rx) = mpsc::channel(1);
		Self {
			program: program.into(),
			args,
			workdir,
			child: None,
			completions_tx,
			completions_rx,
		}
	}

	/// The program this supervisor starts.
	pub fn program(&self) -> &Path {
		&self.program
	}

	/// Whether a child is tracked.
	///
	/// This stays true after the process has ended until its completion has been received with
	/// [`wait()`](Self::wait), or until [`kill()`](Self::kill) is called.
	pub const fn is_running(&self) -> bool {
		self.child.is_some()
	}

	/// The process ID of the tracked child, if any.
	pub fn pid(&self) -> Option<u32> {
		self.child.as_ref().and_then(|child| child.pid)
	}

	/// Start the program and its waiter.
	///
	/// Standard input, output, and error are inherited. On error, nothing is tracked.
	pub fn spawn(&mut self) -> Result<(), RuntimeError> {
		if self.child.is_some() {
			return Err(RuntimeError::AlreadyRunning);
		}

		let mut command = Command::new(&self.program);
		command.args(&self.args);
		if let Some(dir) = &self.workdir {
			command.current_dir(dir);
		}

		debug!(?command, "spawning process");
		let mut child = command.spawn().map_err(|err| RuntimeError::Spawn {
			path: self.program.clone(),
			err,
		})?;

		let pid = child.id();
		let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
		let completions = self.completions_tx.clone();

		spawn(async move {
			trace!(?pid, "waiting on process");
			let mut killed = false;
			let mut kill_open = true;

			let status = loop {
				select! {
					status = child.wait() => break status,
					req = &mut kill_rx, if kill_open => {
						kill_open = false;
						if req.is_ok() {
							debug!(?pid, "killing process");
							killed = true;
							if let Err(err) = child.start_kill() {
								error!(?pid, %err, "while killing process");
							}
						}
					}
				}
			};

			let status = status.map_err(|err| RuntimeError::Wait { err });
			trace!(?pid, ?status, "process ended");
			if completions
				.send(Completion {
					pid,
					killed,
					status,
				})
				.await
				.is_err()
			{
				trace!(?pid, "completion channel closed");
			}
		});

		self.child = Some(ChildHandle { pid, kill: kill_tx });
		Ok(())
	}

	/// Request the tracked child be killed, and stop tracking it.
	///
	/// Returns false if there was no child. This does not wait: the end of the process is reported
	/// through [`wait()`](Self::wait) like any other.
	pub fn kill(&mut self) -> bool {
		let Some(child) = self.child.take() else {
			return false;
		};

		if child.kill.send(()).is_err() {
			trace!(pid=?child.pid, "process already ended, nothing to kill");
		}

		true
	}

	/// Wait for the next completion, and stop tracking its child.
	///
	/// If there's no child, this never resolves. It is cancel-safe.
	pub async fn wait(&mut self) -> Completion {
		let Some(completion) = self.completions_rx.recv().await else {
			// we hold a sender ourselves, so the channel never closes
			return std::future::pending().await;
		};

		self.child = None;
		completion
	}

	/// Return a completion if one is ready, without waiting.
	pub fn try_wait(&mut self) -> Option<Completion> {
		let completion = self.completions_rx.try_recv().ok()?;
		self.child = None;
		Some(completion)
	}
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
	use std::time::Duration;

	use tokio::time::{sleep, timeout};

	use super::*;

	fn sh(script: &str) -> ProcessSupervisor {
		ProcessSupervisor::new("/bin/sh", vec!["-c".into(), script.into()], None)
	}

	#[tokio::test]
	async fn kill_without_child_is_a_noop() {
		let mut supervisor = sh("exit 0");
		assert!(!supervisor.kill());
		assert!(!supervisor.is_running());
		assert!(supervisor.try_wait().is_none());
	}

	#[tokio::test]
	async fn natural_exit_completes_once() {
		let mut supervisor = sh("exit 3");
		supervisor.spawn().unwrap();
		assert!(supervisor.is_running());

		let end = timeout(Duration::from_secs(10), supervisor.wait())
			.await
			.expect("process should exit");
		assert!(!end.killed);
		assert_eq!(end.status.unwrap().code(), Some(3));
		assert!(!supervisor.is_running());

		sleep(Duration::from_millis(100)).await;
		assert!(supervisor.try_wait().is_none());
	}

	#[tokio::test]
	async fn kill_clears_handle_and_completes_once() {
		let mut supervisor = sh("sleep 30");
		supervisor.spawn().unwrap();
		assert!(supervisor.pid().is_some());

		assert!(supervisor.kill());
		assert!(!supervisor.is_running());
		assert!(supervisor.pid().is_none());
		assert!(!supervisor.kill());

		let end = timeout(Duration::from_secs(10), supervisor.wait())
			.await
			.expect("process should die");
		assert!(end.killed);
		assert!(!end.success());

		sleep(Duration::from_millis(100)).await;
		assert!(supervisor.try_wait().is_none());
	}

	#[tokio::test]
	async fn second_spawn_is_refused() {
		let mut supervisor = sh("sleep 30");
		supervisor.spawn().unwrap();
		assert!(matches!(
			supervisor.spawn(),
			Err(RuntimeError::AlreadyRunning)
		));

		supervisor.kill();
		timeout(Duration::from_secs(10), supervisor.wait())
			.await
			.expect("process should die");
	}

	#[tokio::test]
	async fn spawn_failure_tracks_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let mut supervisor = ProcessSupervisor::new(dir.path().join("lr-bin"), Vec::new(), None);
		assert!(matches!(
			supervisor.spawn(),
			Err(RuntimeError::Spawn { .. })
		));
		assert!(!supervisor.is_running());
		assert!(!supervisor.kill());
	}

	#[tokio::test]
	async fn args_and_workdir_are_forwarded() {
		let dir = tempfile::tempdir().unwrap();
		let mut supervisor = ProcessSupervisor::new(
			"/bin/sh",
			vec!["-c".into(), r#"echo "$0 $1" > seen"#.into(), "one".into(), "two".into()],
			Some(dir.path().into()),
		);
		supervisor.spawn().unwrap();
		let end = timeout(Duration::from_secs(10), supervisor.wait())
			.await
			.expect("process should exit");
		assert!(end.success());

		let seen = std::fs::read_to_string(dir.path().join("seen")).unwrap();
		assert_eq!(seen, "one two\n");
	}
}
