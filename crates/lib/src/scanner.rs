//! Change detection by polling modification times.

use std::{
	fs::metadata,
	path::{Path, PathBuf},
	time::SystemTime,
};

use tracing::{debug, trace};
use walkdir::WalkDir;

/// Polls the watched files and reports when one was modified after the baseline.
///
/// The baseline starts at the time of construction and only ever moves forward. There is no
/// aggregation: the first file found to be newer than the baseline wins, and the others will be
/// compared against the new baseline on the next call.
///
/// Files found under the watch directories can be [ignored](Self::ignore); the coordinator always
/// ignores the build artifact, which is rewritten by every build.
#[derive(Clone, Debug)]
pub struct ChangeScanner {
	sources: Vec<PathBuf>,
	dirs: Vec<PathBuf>,
	ignored: Vec<PathBuf>,
	baseline: SystemTime,
}

impl ChangeScanner {
	/// A scanner with the baseline set to now.
	pub fn new(sources: Vec<PathBuf>, dirs: Vec<PathBuf>) -> Self {
		Self::with_baseline(sources, dirs, SystemTime::now())
	}

	/// A scanner with an explicit starting baseline.
	pub fn with_baseline(sources: Vec<PathBuf>, dirs: Vec<PathBuf>, baseline: SystemTime) -> Self {
		Self {
			sources,
			dirs,
			ignored: Vec::new(),
			baseline,
		}
	}

	/// Leave these files out of the directory walk.
	///
	/// Paths are compared as-is with the walked paths, so they should be absolute like the watch
	/// directories. Source files are always checked.
	#[must_use]
	pub fn ignore(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
		self.ignored.extend(paths);
		self
	}

	/// The current baseline.
	pub const fn baseline(&self) -> SystemTime {
		self.baseline
	}

	/// Check the watched files once.
	///
	/// Source files are checked in order, then files found under the watch directories. Paths which
	/// can't be stat'ed are skipped. Returns the path which tripped the check, after moving the
	/// baseline to its modification time.
	pub fn scan(&mut self) -> Option<PathBuf> {
		for source in &self.sources {
			if let Some(mtime) = newer_than(source, self.baseline) {
				self.baseline = mtime;
				return Some(source.clone());
			}
		}

		let ignored = &self.ignored;
		for dir in &self.dirs {
			let files = WalkDir::new(dir)
				.follow_links(true)
				.into_iter()
				.filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()))
				.filter_map(Result::ok)
				.filter(|entry| entry.file_type().is_file())
				.filter(|entry| !ignored.iter().any(|path| path == entry.path()));

			for entry in files {
				if let Some(mtime) = newer_than(entry.path(), self.baseline) {
					self.baseline = mtime;
					return Some(entry.into_path());
				}
			}
		}

		None
	}

	/// Check the watched files once, and say whether anything changed.
	pub fn detect(&mut self) -> bool {
		if let Some(path) = self.scan() {
			debug!(?path, baseline=?self.baseline, "change detected");
			eprintln!("Changed: {}", path.display());
			true
		} else {
			false
		}
	}
}

fn newer_than(path: &Path, baseline: SystemTime) -> Option<SystemTime> {
	match metadata(path).and_then(|meta| meta.modified()) {
		Ok(mtime) if mtime > baseline => Some(mtime),
		Ok(_) => None,
		Err(err) => {
			trace!(?path, %err, "cannot stat watched path, skipping");
			None
		}
	}
}

fn is_hidden(path: &Path) -> bool {
	path.file_name()
		.and_then(|name| name.to_str())
		.map_or(false, |name| name.starts_with('.'))
}
