use std::{
	env::var,
	io::stderr,
	path::{Path, PathBuf},
};

use clap::{ArgAction, Parser, ValueHint};
use golr::config::resolve_path;
use miette::{bail, Result};
use tokio::fs::metadata;
use tracing::{info, warn};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Debug, Clone, Parser)]
pub struct LoggingArgs {
	/// Log what golr is doing
	///
	/// Without this, golr only prints its status lines ('Changed: ...', 'Building: ...', and so
	/// on). Diagnostic logs show each poll, compiler invocation, spawn, and kill, which helps
	/// when a change isn't picked up or the program isn't restarted. Repeat for more detail:
	/// '-v' for warnings, '-vv' for info, '-vvv' for debug with span timings, '-vvvv' for
	/// everything, pretty-printed.
	///
	/// Logs go to standard error, interleaved with the program's own output unless '--log-file'
	/// is used.
	///
	/// $RUST_LOG, if set, replaces this and '--log-file' entirely, and also covers argument
	/// parsing.
	#[arg(
		long,
		short,
		help_heading = super::OPTSET_DEBUGGING,
		action = ArgAction::Count,
		default_value = "0",
		num_args = 0,
	)]
	pub verbose: u8,

	/// Write logs to a file as JSON
	///
	/// Implies '-vvv' unless '-v' is given. Without a PATH, the file goes in the current
	/// directory. When PATH is a directory, the file is named 'golr.<UTC timestamp>.log'.
	///
	/// The log file is never treated as a change, even inside a directory watched with '--dir'.
	#[arg(
		long,
		help_heading = super::OPTSET_DEBUGGING,
		num_args = 0..=1,
		default_missing_value = ".",
		value_hint = ValueHint::AnyPath,
		value_name = "PATH",
	)]
	pub log_file: Option<PathBuf>,
}

impl LoggingArgs {
	/// The verbosity to log at, if logging at all.
	pub fn level(&self) -> Option<u8> {
		match (self.verbose, &self.log_file) {
			(0, None) => None,
			(0, Some(_)) => Some(3),
			(n, _) => Some(n),
		}
	}
}

/// Keeps the log writer flushing, and says where it writes.
#[derive(Debug)]
pub struct Logging {
	/// The absolute path of the log file, if logging to one.
	pub file: Option<PathBuf>,
	_guard: WorkerGuard,
}

/// Set up logging from `$RUST_LOG`, before arguments are parsed.
///
/// Returns whether that happened, in which case the logging arguments are ignored.
pub fn preargs() -> bool {
	if var("RUST_LOG").is_err() {
		return false;
	}

	match tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(stderr)
		.try_init()
	{
		Ok(()) => {
			warn!(RUST_LOG=?var("RUST_LOG").ok(), "logging configured from RUST_LOG");
			true
		}
		Err(err) => {
			eprintln!("Failed to initialise logging with RUST_LOG, falling back\n{err}");
			false
		}
	}
}

/// Set up logging from the arguments.
pub async fn postargs(args: &LoggingArgs) -> Result<Option<Logging>> {
	let Some(verbosity) = args.level() else {
		return Ok(None);
	};

	let filter = match verbosity {
		1 => "warn",
		2 => "info",
		3 => "debug",
		_ => "trace",
	};
	let spans = if verbosity > 2 {
		FmtSpan::NEW | FmtSpan::CLOSE
	} else {
		FmtSpan::NONE
	};
	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_span_events(spans);

	let (file, init) = if let Some(given) = &args.log_file {
		let is_dir = metadata(given).await.map_or(false, |info| info.is_dir());
		let (dir, filename) = log_file_location(given, is_dir)?;
		let file = resolve_path(dir.join(&filename))?;
		let (writer, guard) = non_blocking(rolling::never(dir, filename));
		(Some(file), (builder.json().with_writer(writer).try_init(), guard))
	} else {
		let (writer, guard) = non_blocking(stderr());
		let init = if verbosity > 3 {
			builder.pretty().with_writer(writer).try_init()
		} else {
			builder.with_writer(writer).try_init()
		};
		(None, (init, guard))
	};

	let (result, guard) = init;
	match result {
		Ok(()) => info!(?file, "logging initialised"),
		Err(err) => eprintln!("Failed to initialise logging, continuing with none\n{err}"),
	}

	Ok(Some(Logging {
		file,
		_guard: guard,
	}))
}

fn log_file_location(file: &Path, is_dir: bool) -> Result<(PathBuf, PathBuf)> {
	if is_dir {
		return Ok((
			file.to_owned(),
			PathBuf::from(format!(
				"golr.{}.log",
				chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ")
			)),
		));
	}

	match (file.parent(), file.file_name()) {
		(Some(parent), Some(file_name)) => Ok((parent.into(), PathBuf::from(file_name))),
		_ => bail!("Failed to determine log file name"),
	}
}
