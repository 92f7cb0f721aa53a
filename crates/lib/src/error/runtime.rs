use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors which only affect the current run, and should be reported to the user, but will not
/// stop golr.
///
/// After any of these the loop carries on without a live child, and the next detected change
/// triggers a fresh build.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum RuntimeError {
	/// The build artifact could not be started.
	#[error("cannot start {path:?}: {err}")]
	#[diagnostic(
		code(golr::runtime::spawn),
		help("check that the output path is executable")
	)]
	Spawn {
		/// The artifact that failed to start.
		path: PathBuf,

		/// The underlying error.
		#[source]
		err: std::io::Error,
	},

	/// A spawn was requested while a child is still tracked.
	#[error("a process is already running")]
	#[diagnostic(code(golr::runtime::already_running))]
	AlreadyRunning,

	/// Waiting on the child failed.
	#[error("while waiting on process: {err}")]
	#[diagnostic(code(golr::runtime::wait))]
	Wait {
		/// The underlying error.
		#[source]
		err: std::io::Error,
	},
}
