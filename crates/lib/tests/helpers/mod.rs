#![allow(dead_code)]

use std::{
	fs::{read_to_string, write, File},
	path::PathBuf,
	process::{Command, Stdio},
	time::{Duration, SystemTime},
};

use golr::{Compiler, Config};
use tempfile::TempDir;
use tokio::time::sleep;

// Concatenates the sources into a shell script, after logging the sources it was given next to
// itself. Refuses sources containing FAIL.
const FAKE_COMPILER: &str = r#"
out="$2"
shift 2
echo "$*" >> "$(dirname "$0")/builds.log"
if grep -q FAIL "$@"; then
	echo "$1: FAIL found" >&2
	exit 1
fi
{ echo '#!/bin/sh'; cat "$@"; } > "$out"
chmod +x "$out"
"#;

pub struct Project {
	pub dir: TempDir,
}

impl Project {
	pub fn new() -> Self {
		tracing_init();
		let dir = tempfile::tempdir().expect("creating project dir");
		write(dir.path().join("fakec"), FAKE_COMPILER).expect("writing fake compiler");
		Self { dir }
	}

	pub fn path(&self, name: &str) -> PathBuf {
		self.dir.path().join(name)
	}

	pub fn output(&self) -> PathBuf {
		self.path("lr-bin")
	}

	pub fn write(&self, name: &str, content: &str) -> PathBuf {
		let path = self.path(name);
		write(&path, content).expect("writing source");
		path
	}

	// Rewrites with a modification time safely after anything the scanner has seen so far.
	pub fn change(&self, name: &str, content: &str, ahead: u64) -> PathBuf {
		let path = self.write(name, content);
		File::options()
			.write(true)
			.open(&path)
			.and_then(|file| file.set_modified(SystemTime::now() + Duration::from_secs(ahead)))
			.expect("setting mtime");
		path
	}

	pub fn config(&self, sources: &[&str]) -> Config {
		Config::new(sources.iter().map(|name| self.path(name)), self.output())
			.compiler(Compiler {
				// run through sh so the script is only ever read, never exec'd
				program: "sh".into(),
				args: vec![self.path("fakec").to_string_lossy().into_owned()],
			})
			.workdir(Some(self.dir.path().into()))
			.poll_interval(Duration::from_millis(50))
	}

	pub fn builds(&self) -> Vec<String> {
		read_to_string(self.path("builds.log"))
			.unwrap_or_default()
			.lines()
			.map(String::from)
			.collect()
	}

	pub fn alive(&self, pid: &str) -> bool {
		Command::new("kill")
			.args(["-0", pid.trim()])
			.stderr(Stdio::null())
			.status()
			.expect("running kill")
			.success()
	}

	pub async fn wait_for(&self, name: &str) -> String {
		let path = self.path(name);
		for _ in 0..500 {
			if let Ok(content) = read_to_string(&path) {
				if !content.is_empty() {
					return content;
				}
			}
			sleep(Duration::from_millis(20)).await;
		}
		panic!("timed out waiting for {name}");
	}
}

fn tracing_init() {
	use tracing_subscriber::{
		fmt::{format::FmtSpan, Subscriber},
		util::SubscriberInitExt,
		EnvFilter,
	};
	Subscriber::builder()
		.pretty()
		.with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
		.with_env_filter(EnvFilter::from_default_env())
		.finish()
		.try_init()
		.ok();
}
