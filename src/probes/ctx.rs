//! # Probe execution context.
//!
//! [`ProbeCtx`] is passed by value into every probe run. It bundles:
//! - the cancellation token of the enclosing group,
//! - the [`FactSink`] to emit onto,
//! - the [`Shell`] for external commands,
//! - the [`ProcessTable`](crate::ProcessTable) for ancestry lookups.
//!
//! Cloning is cheap (reference counted handles only).

use std::borrow::Cow;

use tokio_util::sync::CancellationToken;

use crate::core::TaskGroup;
use crate::error::{ExecError, ProbeError};
use crate::facts::{FactSink, FactValue};
use crate::ps::{ProcInfo, ProcessTableRef};
use crate::shell::Shell;

/// Everything a probe may touch while it runs.
#[derive(Clone)]
pub struct ProbeCtx {
    token: CancellationToken,
    sink: FactSink,
    shell: Shell,
    ps: ProcessTableRef,
}

impl ProbeCtx {
    /// Creates a root context.
    pub fn new(
        token: CancellationToken,
        sink: FactSink,
        shell: Shell,
        ps: ProcessTableRef,
    ) -> Self {
        Self {
            token,
            sink,
            shell,
            ps,
        }
    }

    /// Derives a context whose token is a child of this one.
    ///
    /// Cancelling the child does not affect the parent.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            ..self.clone()
        }
    }

    /// Opens a child [`TaskGroup`] scoped to this probe.
    ///
    /// The probe must `join` it before returning.
    pub fn group(&self) -> TaskGroup {
        TaskGroup::new(self.child())
    }

    /// Emits one fact. Silently dropped once the run is over.
    pub fn emit(&self, name: impl Into<Cow<'static, str>>, value: impl Into<FactValue>) {
        self.sink.emit(name, value);
    }

    /// Cancellation token of this context.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once the run (or the enclosing group) was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns `Err(Canceled)` when cancelled, for use with `?` between steps.
    pub fn check(&self) -> Result<(), ProbeError> {
        if self.is_cancelled() {
            Err(ProbeError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Fact sink shared by the run.
    pub fn sink(&self) -> &FactSink {
        &self.sink
    }

    /// Shell used for external commands.
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Runs an external command bound to this context's token and the shell deadline.
    pub async fn exec(&self, program: &str, args: &[&str]) -> Result<String, ExecError> {
        self.shell.output(&self.token, program, args).await
    }

    /// Runs an external command whose failure only means "not applicable here".
    ///
    /// Returns `Ok(None)` on any failure except cancellation, which stays an error
    /// so the probe stops early.
    pub async fn try_exec(
        &self,
        program: &str,
        args: &[&str],
    ) -> Result<Option<String>, ProbeError> {
        match self.exec(program, args).await {
            Ok(out) => Ok(Some(out)),
            Err(e) if e.is_interrupted() => Err(e.into()),
            Err(e) => {
                tracing::trace!(program, label = e.as_label(), "command not applicable");
                Ok(None)
            }
        }
    }

    /// Looks up a process in the process table.
    pub async fn process(&self, pid: u32) -> Result<ProcInfo, ProbeError> {
        self.ps.lookup(&self.token, pid).await
    }
}
