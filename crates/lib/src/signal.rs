//! Termination signals sent to golr itself.

use std::fmt;

use tokio::{select, spawn, sync::mpsc};
use tracing::{debug, trace};

use crate::error::CriticalError;

/// A signal which ends the main loop.
///
/// On Windows, ctrl-c maps to `Interrupt` and ctrl-break to `Terminate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
	/// `SIGHUP`, unix only.
	Hangup,

	/// `SIGINT`, or ctrl-c.
	Interrupt,

	/// `SIGQUIT`, unix only.
	Quit,

	/// `SIGTERM`, or ctrl-break.
	Terminate,
}

impl fmt::Display for Signal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Hangup => "hangup",
			Self::Interrupt => "interrupt",
			Self::Quit => "quit",
			Self::Terminate => "terminated",
		})
	}
}

/// Start listening for termination signals.
///
/// Listeners are installed before this returns, so a setup failure is reported here rather than
/// lost in the background. Each received signal is forwarded once on the returned channel; a signal
/// arriving while one is still unread is dropped.
///
/// Must be called from within a Tokio runtime.
pub fn listen() -> Result<mpsc::Receiver<Signal>, CriticalError> {
	let (tx, rx) = mpsc::channel(1);
	imp_listen(tx)?;
	Ok(rx)
}

fn forward(tx: &mpsc::Sender<Signal>, sig: Signal) -> bool {
	match tx.try_send(sig) {
		Ok(()) => true,
		Err(mpsc::error::TrySendError::Full(_)) => {
			trace!(?sig, "signal already pending, dropping");
			true
		}
		Err(mpsc::error::TrySendError::Closed(_)) => false,
	}
}

#[cfg(unix)]
fn imp_listen(tx: mpsc::Sender<Signal>) -> Result<(), CriticalError> {
	use tokio::signal::unix::{signal, SignalKind};

	debug!("launching unix signal listener");

	macro_rules! listen {
		($sig:ident) => {{
			trace!(kind=%stringify!($sig), "listening for unix signal");
			signal(SignalKind::$sig()).map_err(|err| CriticalError::IoError {
				about: concat!("setting ", stringify!($sig), " signal listener"),
				err,
			})?
		}};
	}

	let mut s_hangup = listen!(hangup);
	let mut s_interrupt = listen!(interrupt);
	let mut s_quit = listen!(quit);
	let mut s_terminate = listen!(terminate);

	spawn(async move {
		loop {
			let sig = select!(
				_ = s_hangup.recv() => Signal::Hangup,
				_ = s_interrupt.recv() => Signal::Interrupt,
				_ = s_quit.recv() => Signal::Quit,
				_ = s_terminate.recv() => Signal::Terminate,
			);

			debug!(?sig, "received unix signal");
			if !forward(&tx, sig) {
				trace!("signal channel closed, stopping listener");
				break;
			}
		}
	});

	Ok(())
}

#[cfg(windows)]
fn imp_listen(tx: mpsc::Sender<Signal>) -> Result<(), CriticalError> {
	use tokio::signal::windows::{ctrl_break, ctrl_c};

	debug!("launching windows signal listener");

	macro_rules! listen {
		($sig:ident) => {{
			trace!(kind=%stringify!($sig), "listening for windows process notification");
			$sig().map_err(|err| CriticalError::IoError {
				about: concat!("setting ", stringify!($sig), " signal listener"),
				err,
			})?
		}};
	}

	let mut sigint = listen!(ctrl_c);
	let mut sigbreak = listen!(ctrl_break);

	spawn(async move {
		loop {
			let sig = select!(
				_ = sigint.recv() => Signal::Interrupt,
				_ = sigbreak.recv() => Signal::Terminate,
			);

			debug!(?sig, "received windows process notification");
			if !forward(&tx, sig) {
				trace!("signal channel closed, stopping listener");
				break;
			}
		}
	});

	Ok(())
}
