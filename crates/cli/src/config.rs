use std::path::Path;

use golr::{config::resolve_path, Config};
use miette::Result;
use tracing::{debug_span, info};

use crate::args::Args;

/// Build the core config from the arguments. A log file is kept out of change detection.
pub fn make_config(args: &Args, log_file: Option<&Path>) -> Result<Config> {
	let _span = debug_span!("args-config").entered();

	let sources = args
		.sources
		.iter()
		.map(resolve_path)
		.collect::<Result<Vec<_>, _>>()?;
	let dirs = args
		.dirs
		.iter()
		.map(resolve_path)
		.collect::<Result<Vec<_>, _>>()?;
	let workdir = args.root.as_ref().map(resolve_path).transpose()?;

	let config = Config::new(sources, resolve_path(&args.output)?)
		.watch_dirs(dirs)
		.compiler(args.compiler.clone())
		.child_args(args.child_args.iter().cloned())
		.workdir(workdir)
		.poll_interval(args.poll.0)
		.kill_on_exit(args.kill_on_exit)
		.ignore_paths(log_file.map(resolve_path).transpose()?);

	config.validate()?;
	info!(?config, "made config");
	Ok(config)
}
