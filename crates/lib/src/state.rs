//! The coordinator's states and the transitions between them.
//!
//! Transitions are pure: the side effects (building, spawning, killing) are done by the
//! [`Coordinator`](crate::Coordinator), which feeds their results back in here.

/// Where the coordinator is in the build-run-restart cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SupervisorState {
	/// About to build and, if that works, start the artifact.
	#[default]
	Building,

	/// Watching for changes, with or without a live child.
	Running,

	/// A kill was requested; waiting for the child to be reported gone.
	Killing,

	/// Terminal.
	Exiting,
}

impl SupervisorState {
	/// After a build, whatever its outcome.
	///
	/// A failed build doesn't retry: the next change will.
	#[must_use]
	pub const fn built(self) -> Self {
		match self {
			Self::Building => Self::Running,
			other => other,
		}
	}

	/// After a change was detected. `killed` is whether a live child was just killed.
	///
	/// Only `Running` reacts; a change while `Killing` is ignored as teardown is already underway.
	#[must_use]
	pub const fn changed(self, killed: bool) -> Self {
		match self {
			Self::Running if killed => Self::Killing,
			Self::Running => Self::Building,
			other => other,
		}
	}

	/// After the child was reported gone.
	///
	/// An exit that was asked for restarts the cycle; one that wasn't ends it.
	#[must_use]
	pub const fn exited(self) -> Self {
		match self {
			Self::Running => Self::Exiting,
			Self::Killing => Self::Building,
			other => other,
		}
	}

	/// After a termination signal.
	#[must_use]
	pub const fn signalled(self) -> Self {
		Self::Exiting
	}

	/// Whether the loop should wait on events in this state.
	pub const fn is_waiting(self) -> bool {
		matches!(self, Self::Running | Self::Killing)
	}
}
