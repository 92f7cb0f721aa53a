//! Invoking the external compiler.

use std::{
	path::PathBuf,
	process::Stdio,
	time::{Duration, Instant},
};

use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::Compiler;

/// The result of one compiler invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOutcome {
	/// Whether the compiler exited successfully.
	pub success: bool,

	/// Everything the compiler printed: standard output, then standard error.
	///
	/// This is only meant to be shown to the user, and is never parsed.
	pub output: Vec<u8>,

	/// How long the invocation took.
	pub elapsed: Duration,
}

impl BuildOutcome {
	/// The output, lossily decoded for display.
	pub fn output_lossy(&self) -> String {
		String::from_utf8_lossy(&self.output).into_owned()
	}
}

/// Runs the compiler over the sources to produce the artifact.
#[derive(Clone, Debug)]
pub struct Builder {
	compiler: Compiler,
	output: PathBuf,
	sources: Vec<PathBuf>,
}

impl Builder {
	/// A builder for the given compiler, artifact path, and sources.
	pub const fn new(compiler: Compiler, output: PathBuf, sources: Vec<PathBuf>) -> Self {
		Self {
			compiler,
			output,
			sources,
		}
	}

	/// The sources passed to the compiler.
	pub fn sources(&self) -> &[PathBuf] {
		&self.sources
	}

	/// The full command that [`build()`](Self::build) runs.
	pub fn command(&self) -> Command {
		let mut command = Command::new(&self.compiler.program);
		command
			.args(&self.compiler.args)
			.arg("-o")
			.arg(&self.output)
			.args(&self.sources)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());
		command
	}

	/// Run the compiler once and wait for it to finish.
	///
	/// A compiler which can't be launched at all is reported as a failed build, with the launch
	/// error as its output.
	pub async fn build(&self) -> BuildOutcome {
		let mut command = self.command();
		debug!(?command, "running compiler");

		let started = Instant::now();
		let result = command.output().await;
		let elapsed = started.elapsed();

		match result {
			Ok(out) => {
				trace!(status=?out.status, stdout=out.stdout.len(), stderr=out.stderr.len(), "compiler finished");
				let mut output = out.stdout;
				output.extend(out.stderr);
				BuildOutcome {
					success: out.status.success(),
					output,
					elapsed,
				}
			}
			Err(err) => {
				debug!(%err, "compiler could not be launched");
				BuildOutcome {
					success: false,
					output: format!("cannot run {}: {err}\n", self.compiler.program).into_bytes(),
					elapsed,
				}
			}
		}
	}
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
	use std::{fs, path::Path};

	use super::*;

	// run through sh so the script is only ever read, never exec'd
	fn fake_compiler(dir: &Path, body: &str) -> Compiler {
		let path = dir.join("fakec");
		fs::write(&path, format!("{body}\n")).unwrap();
		Compiler {
			program: "sh".into(),
			args: vec![path.to_string_lossy().into_owned(), "build".into()],
		}
	}

	#[tokio::test]
	async fn passes_output_then_sources() {
		let dir = tempfile::tempdir().unwrap();
		let out = dir.path().join("lr-bin");
		let builder = Builder::new(
			fake_compiler(dir.path(), r#"printf '%s\n' "$@""#),
			out.clone(),
			vec![dir.path().join("a.go"), dir.path().join("b.go")],
		);

		let outcome = builder.build().await;
		assert!(outcome.success);
		assert_eq!(
			outcome.output_lossy(),
			format!(
				"build\n-o\n{}\n{}\n{}\n",
				out.display(),
				dir.path().join("a.go").display(),
				dir.path().join("b.go").display()
			)
		);
	}

	#[tokio::test]
	async fn failure_captures_both_streams() {
		let dir = tempfile::tempdir().unwrap();
		let builder = Builder::new(
			fake_compiler(
				dir.path(),
				"echo 'compiling'\necho './a.go:3:1: syntax error' >&2\nexit 2",
			),
			dir.path().join("lr-bin"),
			vec![dir.path().join("a.go")],
		);

		let outcome = builder.build().await;
		assert!(!outcome.success);
		assert_eq!(outcome.output_lossy(), "compiling\n./a.go:3:1: syntax error\n");
	}

	#[tokio::test]
	async fn missing_compiler_is_a_failed_build() {
		let dir = tempfile::tempdir().unwrap();
		let builder = Builder::new(
			Compiler {
				program: dir.path().join("no-such-compiler").to_string_lossy().into_owned(),
				args: Vec::new(),
			},
			dir.path().join("lr-bin"),
			vec![dir.path().join("a.go")],
		);

		let outcome = builder.build().await;
		assert!(!outcome.success);
		assert!(outcome.output_lossy().starts_with("cannot run "));
	}
}
