//! Configuration for the [`Coordinator`][crate::Coordinator].
//!
//! A [`Config`] is built once at startup and is then only ever read. The setter methods each call
//! `debug!` on the new value, which gives a quick insight into what the application sets.

use std::{
	env,
	path::{Path, PathBuf},
	str::FromStr,
	time::Duration,
};

use normalize_path::NormalizePath;
use tracing::debug;

use crate::error::CriticalError;

/// The default output path, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "lr-bin";

/// The default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The external compiler: a program and the arguments which go before `-o`.
///
/// The full invocation is `<program> <args...> -o <output> <sources...>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Compiler {
	/// Path or name of the program.
	pub program: String,

	/// Leading arguments, like `build` for `go build`.
	pub args: Vec<String>,
}

impl Default for Compiler {
	fn default() -> Self {
		Self {
			program: "go".into(),
			args: vec!["build".into()],
		}
	}
}

impl FromStr for Compiler {
	type Err = CriticalError;

	/// Parse a command line: the first word is the program, the rest are leading arguments.
	///
	/// The split is on whitespace only; there is no quoting.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut words = s.split_whitespace().map(ToOwned::to_owned);
		let program = words.next().ok_or(CriticalError::NoCompiler)?;
		Ok(Self {
			program,
			args: words.collect(),
		})
	}
}

/// Everything the coordinator needs, fixed for the lifetime of the process.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
	/// Source files to build and watch, in order.
	pub sources: Vec<PathBuf>,

	/// Directories whose files are also watched (but not passed to the compiler).
	pub watch_dirs: Vec<PathBuf>,

	/// Files under the watch directories which never count as changes.
	///
	/// The output is always ignored on top of these.
	pub ignored: Vec<PathBuf>,

	/// The build artifact, overwritten by each successful build.
	pub output: PathBuf,

	/// The compiler to invoke.
	pub compiler: Compiler,

	/// Arguments forwarded to the artifact on every start.
	pub child_args: Vec<String>,

	/// Working directory for the artifact. Inherited if `None`.
	pub workdir: Option<PathBuf>,

	/// Delay between two polls of the watched files.
	pub poll_interval: Duration,

	/// Whether to kill the running artifact when exiting because of a signal.
	pub kill_on_exit: bool,
}

impl Config {
	/// A config with the given sources and output, and defaults for everything else.
	///
	/// Paths are taken as given; use [`resolve_path`] beforehand to make them absolute.
	pub fn new(
		sources: impl IntoIterator<Item = impl Into<PathBuf>>,
		output: impl Into<PathBuf>,
	) -> Self {
		Self {
			sources: sources.into_iter().map(Into::into).collect(),
			watch_dirs: Vec::new(),
			ignored: Vec::new(),
			output: output.into(),
			compiler: Compiler::default(),
			child_args: Vec::new(),
			workdir: None,
			poll_interval: DEFAULT_POLL_INTERVAL,
			kill_on_exit: false,
		}
	}

	/// Set the watch directories.
	pub fn watch_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
		self.watch_dirs = dirs.into_iter().map(Into::into).collect();
		debug!(dirs=?self.watch_dirs, "Config: watch_dirs");
		self
	}

	/// Set files to leave out of change detection, like a log file inside a watch directory.
	pub fn ignore_paths(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
		self.ignored = paths.into_iter().map(Into::into).collect();
		debug!(paths=?self.ignored, "Config: ignore_paths");
		self
	}

	/// Set the compiler.
	pub fn compiler(mut self, compiler: Compiler) -> Self {
		debug!(?compiler, "Config: compiler");
		self.compiler = compiler;
		self
	}

	/// Set the arguments forwarded to the artifact.
	pub fn child_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.child_args = args.into_iter().map(Into::into).collect();
		debug!(args=?self.child_args, "Config: child_args");
		self
	}

	/// Set the working directory of the artifact.
	pub fn workdir(mut self, dir: Option<PathBuf>) -> Self {
		debug!(?dir, "Config: workdir");
		self.workdir = dir;
		self
	}

	/// Set the polling interval.
	pub fn poll_interval(mut self, interval: Duration) -> Self {
		debug!(?interval, "Config: poll_interval");
		self.poll_interval = interval;
		self
	}

	/// Set whether the artifact is killed on a signal-triggered exit.
	pub fn kill_on_exit(mut self, kill: bool) -> Self {
		debug!(?kill, "Config: kill_on_exit");
		self.kill_on_exit = kill;
		self
	}

	/// Check the config can drive a coordinator.
	pub fn validate(&self) -> Result<(), CriticalError> {
		if self.sources.is_empty() {
			return Err(CriticalError::NoSources);
		}

		if self.output.as_os_str().is_empty() {
			return Err(CriticalError::NoOutput);
		}

		if self.compiler.program.is_empty() {
			return Err(CriticalError::NoCompiler);
		}

		Ok(())
	}
}

/// Make a path absolute against the current directory, and normalise it.
///
/// The path doesn't need to exist: the output path usually won't before the first build.
pub fn resolve_path(path: impl AsRef<Path>) -> Result<PathBuf, CriticalError> {
	let path = path.as_ref();
	if path.as_os_str().is_empty() {
		return Err(CriticalError::PathResolution {
			path: path.into(),
			err: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty path"),
		});
	}

	if path.is_absolute() {
		return Ok(path.normalize());
	}

	let cwd = env::current_dir().map_err(|err| CriticalError::PathResolution {
		path: path.into(),
		err,
	})?;
	Ok(cwd.join(path).normalize())
}
