use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors which are not recoverable and stop golr before or during the main loop.
///
/// The configuration variants are all raised before the loop starts, so that a bad invocation
/// never builds or spawns anything.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum CriticalError {
	/// No source files were given.
	#[error("no source files")]
	#[diagnostic(
		code(golr::critical::no_sources),
		help("pass at least one source file to build and watch")
	)]
	NoSources,

	/// The output path is empty.
	#[error("no output path")]
	#[diagnostic(code(golr::critical::no_output))]
	NoOutput,

	/// The compiler command is empty.
	#[error("no compiler program")]
	#[diagnostic(
		code(golr::critical::no_compiler),
		help("the compiler is given as a command line, e.g. `go build`")
	)]
	NoCompiler,

	/// A path given on the command line could not be made absolute.
	#[error("cannot resolve path {path:?}")]
	#[diagnostic(code(golr::critical::path_resolution))]
	PathResolution {
		/// The path as given.
		path: PathBuf,

		/// The underlying error.
		#[source]
		err: std::io::Error,
	},

	/// A critical I/O error occurred.
	#[error("io({about}): {err}")]
	#[diagnostic(code(golr::critical::io_error))]
	IoError {
		/// What it was about.
		about: &'static str,

		/// The I/O error which occurred.
		#[source]
		err: std::io::Error,
	},
}
