use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Parser, ValueHint};
use golr::{
	config::{DEFAULT_OUTPUT, DEFAULT_POLL_INTERVAL},
	Compiler,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{debug, info, warn};

pub mod logging;

const OPTSET_BUILD: &str = "Build options";
const OPTSET_WATCHING: &str = "Watching options";
const OPTSET_RUNNING: &str = "Running options";
const OPTSET_DEBUGGING: &str = "Debugging options";

/// Rebuild and restart a program when its sources change.
///
/// Golr builds the SOURCEs with the compiler, starts the result, and polls the SOURCEs (and any
/// watched directories) for modifications. When one changes, the program is killed, rebuilt, and
/// started again. A failed build is reported and waits for the next change.
///
/// Golr exits when it receives SIGINT, SIGTERM, SIGHUP, or SIGQUIT, or when the program exits on
/// its own.
///
/// Arguments after '--' are passed to the program every time it's started:
///
/// $ golr main.go server.go -- --port 8080
#[derive(Debug, Clone, Parser)]
#[command(
	name = "golr",
	bin_name = "golr",
	author,
	version,
	long_about = None,
	after_help = "Want more detail? Try the long '--help' flag!",
	after_long_help = "Use @argfile as first argument to load arguments from the file 'argfile' (one argument per line) which will be inserted in place of the @argfile (further arguments on the CLI will override or add onto those in the file).",
)]
#[cfg_attr(debug_assertions, command(before_help = "⚠ DEBUG BUILD ⚠"))]
pub struct Args {
	/// Source files to build and watch
	///
	/// These are passed to the compiler in the order given, after the output flag. They are also
	/// the first files checked for changes.
	#[arg(
		required = true,
		num_args = 1..,
		value_hint = ValueHint::FilePath,
		value_name = "SOURCE",
	)]
	pub sources: Vec<PathBuf>,

	/// Arguments to pass to the program
	#[arg(
		last = true,
		help_heading = OPTSET_RUNNING,
		value_name = "ARGS",
	)]
	pub child_args: Vec<String>,

	/// Path of the built program
	///
	/// This is where the compiler is told to write its output, and what is started after each
	/// successful build. A relative path is resolved against the current directory, not against
	/// '--root'.
	#[arg(
		short,
		long,
		help_heading = OPTSET_BUILD,
		default_value = DEFAULT_OUTPUT,
		value_hint = ValueHint::FilePath,
		value_name = "PATH",
	)]
	pub output: PathBuf,

	/// Compiler to build with
	///
	/// This is a command line split on whitespace: the first word is the program, and the rest are
	/// arguments which go before '-o <OUTPUT> <SOURCE>...'. There is no quoting.
	#[arg(
		long,
		help_heading = OPTSET_BUILD,
		env = "GOLR_COMPILER",
		default_value = "go build",
		value_name = "COMMAND",
	)]
	pub compiler: Compiler,

	/// Also watch a directory for changes
	///
	/// Files in the directory and its subdirectories trigger a rebuild when they change, but are
	/// not passed to the compiler. Hidden files and directories are skipped. Use multiple times to
	/// watch more directories.
	#[arg(
		short = 'd',
		long = "dir",
		help_heading = OPTSET_WATCHING,
		value_hint = ValueHint::DirPath,
		value_name = "DIR",
	)]
	pub dirs: Vec<PathBuf>,

	/// Interval between checks for changes
	///
	/// Takes a unit-less value in milliseconds, or a time span value such as "1s 500ms".
	#[arg(
		long,
		help_heading = OPTSET_WATCHING,
		default_value = "250ms",
		value_name = "TIMESPAN",
	)]
	pub poll: TimeSpan,

	/// Working directory of the program
	///
	/// By default, the program runs in the current directory.
	#[arg(
		short,
		long,
		help_heading = OPTSET_RUNNING,
		value_hint = ValueHint::DirPath,
		value_name = "DIR",
	)]
	pub root: Option<PathBuf>,

	/// Kill the program when golr is signalled to exit
	///
	/// By default, golr exits without touching the program when it receives a signal. If the
	/// signal came from a terminal, the program will usually have received it as well.
	#[arg(
		long,
		help_heading = OPTSET_RUNNING,
	)]
	pub kill_on_exit: bool,

	#[command(flatten)]
	pub logging: logging::LoggingArgs,
}

/// A duration, parsed as milliseconds if unit-less, or as a [humantime] span otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSpan(pub Duration);

impl Default for TimeSpan {
	fn default() -> Self {
		Self(DEFAULT_POLL_INTERVAL)
	}
}

impl FromStr for TimeSpan {
	type Err = humantime::DurationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse::<u64>().map_or_else(
			|_| humantime::parse_duration(s).map(Self),
			|ms| Ok(Self(Duration::from_millis(ms))),
		)
	}
}

pub async fn get_args() -> Result<(Args, Option<logging::Logging>)> {
	let prearg_logs = logging::preargs();
	if prearg_logs {
		warn!("⚠ RUST_LOG environment variable set, logging options have no effect");
	}

	debug!("expanding @argfile arguments if any");
	let args = argfile::expand_args(argfile::parse_fromfile, argfile::PREFIX)
		.into_diagnostic()
		.wrap_err("expanding @argfile arguments")?;

	debug!("parsing arguments");
	let args = Args::parse_from(args);

	let logging = if prearg_logs {
		None
	} else {
		logging::postargs(&args.logging).await?
	};

	info!(?args, "got arguments");
	Ok((args, logging))
}
