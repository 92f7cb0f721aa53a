use std::{fs::write, time::Duration};

use assert_cmd::Command;

fn golr() -> Command {
	let mut cmd = Command::cargo_bin("golr").expect("golr binary");
	cmd.env_remove("RUST_LOG")
		.env_remove("GOLR_COMPILER")
		.timeout(Duration::from_secs(30));
	cmd
}

#[test]
fn help_lists_options() {
	let assert = golr().arg("--help").assert().success();
	let help = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
	for needle in ["<SOURCE>...", "--output", "--dir", "--root", "--compiler", "--poll"] {
		assert!(help.contains(needle), "missing {needle} in:\n{help}");
	}
}

#[test]
fn sources_are_required() {
	golr().assert().failure().code(2);
}

#[test]
fn empty_compiler_is_refused() {
	golr()
		.args(["--compiler", "", "main.go"])
		.assert()
		.failure()
		.code(2);
}

#[test]
#[cfg(unix)]
fn builds_runs_and_exits_with_the_program() {
	let dir = tempfile::tempdir().unwrap();
	let fakec = dir.path().join("fakec");
	write(
		&fakec,
		"out=\"$2\"\nshift 2\n{ echo '#!/bin/sh'; cat \"$@\"; } > \"$out\"\nchmod +x \"$out\"\n",
	)
	.unwrap();
	write(dir.path().join("main.sh"), "echo \"hello $1\"\nexit 0\n").unwrap();

	let assert = golr()
		.current_dir(dir.path())
		.arg("--compiler")
		.arg(format!("sh {}", fakec.display()))
		.args(["main.sh", "--", "world"])
		.assert()
		.success();

	let output = assert.get_output();
	assert_eq!(String::from_utf8_lossy(&output.stdout), "hello world\n");

	let status = String::from_utf8_lossy(&output.stderr).into_owned();
	for line in ["Building: [", "Build done: ", "Starting ", "Process exited: ", "Done running"] {
		assert!(status.contains(line), "missing {line:?} in:\n{status}");
	}
	assert!(dir.path().join("lr-bin").exists());
}
