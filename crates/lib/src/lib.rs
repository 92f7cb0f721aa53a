//! golr: rebuild and restart a program whenever its sources change.
//!
//! Also see the CLI tool, `golr-cli`.
//!
//! This library is powered by [Tokio](https://tokio.rs).
//!
//! The main way to use this crate is to describe the program with a [`Config`], construct a
//! [`Coordinator`] from it, and run it with a channel of termination [signals](signal::listen).
//! The coordinator builds the program with the configured compiler, starts it, and then polls the
//! sources: when one changes, the running program is killed, rebuilt, and started again. It returns
//! when golr is signalled, or when the program exits without having been asked to.
//!
//! ```no_run
//! use golr::{signal, Config, Coordinator};
//! use miette::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::new(["main.go", "util.go"], "lr-bin").child_args(["--port", "8080"]);
//!
//!     let signals = signal::listen()?;
//!     Coordinator::new(&config)?.run(signals).await;
//!     Ok(())
//! }
//! ```
//!
//! The modules are usable on their own as well, for example to [scan](scanner) for changes with
//! different timing, or to [supervise](supervisor) something which isn't built by a compiler.
//!
//! Note that the library logs a fair amount with [tracing], mostly at debug and trace levels.
//! Status lines meant for the operator (`Building: [...]`, `Process exited: ...`, etc) are written
//! directly to standard error.

#![warn(clippy::unwrap_used, missing_docs)]
#![deny(rust_2018_idioms)]

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod scanner;
pub mod signal;
pub mod state;
pub mod supervisor;

#[doc(inline)]
pub use crate::{
	builder::{BuildOutcome, Builder},
	config::{Compiler, Config},
	coordinator::Coordinator,
	scanner::ChangeScanner,
	state::SupervisorState,
	supervisor::{Completion, ProcessSupervisor},
};
