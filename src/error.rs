//! Error types used by the collection pipeline, its probes and the shell.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`]: fatal failures of the pipeline itself (the only class that aborts a run).
//! - [`ProbeError`]: failures of a single probe; absorbed by the task group.
//! - [`ExecError`]: failures of one external command run through [`Shell`](crate::Shell).
//!
//! All types provide `as_label` for logs, the probe-side types also `as_message`.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the pipeline runtime.
///
/// These abort the run and surface as a non-zero exit code.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// OS signal handlers could not be registered.
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] io::Error),

    /// The output stream was unusable before any fact was written.
    #[error("output stream unavailable: {0}")]
    Output(#[source] io::Error),

    /// The serializer task panicked or was aborted.
    #[error("serializer task failed: {reason}")]
    Join {
        /// Panic or abort description.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use promptline::RuntimeError;
    ///
    /// let err = RuntimeError::Join { reason: "boom".into() };
    /// assert_eq!(err.as_label(), "runtime_join");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::Output(_) => "runtime_output",
            RuntimeError::Join { .. } => "runtime_join",
        }
    }
}

/// # Errors produced by running an external command.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started (usually: not installed).
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Reading output or waiting for the child failed.
    #[error("i/o error while running {program}: {source}")]
    Io {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("{program} exited with status {code:?}")]
    Status {
        /// Program name.
        program: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
    },

    /// The per-call deadline elapsed; the child was killed and reaped.
    #[error("{program} timed out after {timeout:?}")]
    Timeout {
        /// Program name.
        program: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The run was cancelled; the child was killed and reaped.
    #[error("{program} cancelled")]
    Canceled {
        /// Program name.
        program: String,
    },
}

impl ExecError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecError::Spawn { .. } => "exec_spawn",
            ExecError::Io { .. } => "exec_io",
            ExecError::Status { .. } => "exec_status",
            ExecError::Timeout { .. } => "exec_timeout",
            ExecError::Canceled { .. } => "exec_canceled",
        }
    }

    /// Indicates whether the command was interrupted rather than failing on its own.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ExecError::Timeout { .. } | ExecError::Canceled { .. })
    }
}

/// # Errors produced by a probe.
///
/// A probe error never reaches the output stream; the task group logs it and
/// treats the probe as having produced whatever it emitted so far.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProbeError {
    /// An external command failed.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The process table could not answer for `pid`.
    #[error("process {pid}: {reason}")]
    Process {
        /// Queried process id.
        pid: u32,
        /// Lookup failure description.
        reason: String,
    },

    /// Command output did not have the expected shape.
    #[error("unexpected {what} output: {input:?}")]
    Parse {
        /// What was being parsed.
        what: &'static str,
        /// Offending input.
        input: String,
    },

    /// Local filesystem access failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The probe observed cancellation and stopped early.
    #[error("context cancelled")]
    Canceled,
}

impl ProbeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use promptline::ProbeError;
    ///
    /// let err = ProbeError::Parse { what: "rev-list", input: "x".into() };
    /// assert_eq!(err.as_label(), "probe_parse");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeError::Exec(e) => e.as_label(),
            ProbeError::Process { .. } => "probe_process",
            ProbeError::Parse { .. } => "probe_parse",
            ProbeError::Io(_) => "probe_io",
            ProbeError::Canceled => "probe_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ProbeError::Exec(e) => format!("exec: {e}"),
            ProbeError::Process { pid, reason } => format!("process {pid}: {reason}"),
            ProbeError::Parse { what, input } => format!("parse {what}: {input:?}"),
            ProbeError::Io(e) => format!("io: {e}"),
            ProbeError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the probe stopped because of cancellation or a deadline.
    pub fn is_interrupted(&self) -> bool {
        match self {
            ProbeError::Canceled => true,
            ProbeError::Exec(e) => e.is_interrupted(),
            _ => false,
        }
    }
}
