//! # Task group: structured fan-out / fan-in of probes.
//!
//! A [`TaskGroup`] launches probes concurrently and exposes one join point.
//! Groups nest: a probe may open a child group through
//! [`ProbeCtx::group`](crate::ProbeCtx::group), dispatch sub-probes into it and
//! join it before returning.
//!
//! ## Architecture
//! ```text
//! root group (token)
//!   ├─► session probe
//!   ├─► process probe
//!   ├─► git probe ──► child group (child token)
//!   │                   ├─► branch
//!   │                   ├─► status
//!   │                   └─► ahead/behind
//!   └─► sapling probe ──► child group ...
//!
//! root.join() returns once every box above has returned.
//! ```
//!
//! ## Rules
//! - `dispatch()` returns immediately; each probe runs as its own tokio task.
//! - `join()` waits for every dispatched probe, including probes dispatched by
//!   running probes after `join()` started (they are counted before the
//!   dispatching probe finishes, so the group cannot drain early).
//! - A probe error is logged and absorbed.
//! - A probe panic is caught at the dispatch boundary, logged, reported as a
//!   `debug_probe_panic` fact, and never hangs `join()`.

use std::any::Any;
use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::probes::{ProbeCtx, ProbeFn, ProbeRef};

/// Name of the diagnostic fact emitted when a probe panics.
pub const PANIC_FACT: &str = "debug_probe_panic";

/// Structured-concurrency scope tracking a set of concurrently running probes.
///
/// Cloning yields another handle to the same group.
#[derive(Clone)]
pub struct TaskGroup {
    ctx: ProbeCtx,
    tracker: TaskTracker,
}

impl TaskGroup {
    /// Creates a group whose probes all receive clones of `ctx`.
    pub fn new(ctx: ProbeCtx) -> Self {
        Self {
            ctx,
            tracker: TaskTracker::new(),
        }
    }

    /// Schedules `probe` to run concurrently and returns immediately.
    pub fn dispatch(&self, probe: ProbeRef) {
        let ctx = self.ctx.clone();
        self.tracker.spawn(run_guarded(probe, ctx));
    }

    /// Shorthand for dispatching a [`ProbeFn`].
    pub fn spawn<F, Fut>(&self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: Fn(ProbeCtx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
    {
        self.dispatch(ProbeFn::arc(name, f));
    }

    /// Context handed to probes of this group.
    pub fn ctx(&self) -> &ProbeCtx {
        &self.ctx
    }

    /// Number of probes still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    /// True when no probe is running.
    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Waits until every probe dispatched into this group has returned.
    ///
    /// Calling `join` on several handles of the same group is allowed; all of them
    /// complete together.
    pub async fn join(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// Runs one probe, absorbing its error or panic.
async fn run_guarded(probe: ProbeRef, ctx: ProbeCtx) {
    let sink = ctx.sink().clone();
    let name = probe.name().to_string();

    match AssertUnwindSafe(probe.run(ctx)).catch_unwind().await {
        Ok(Ok(())) => debug!(probe = %name, "probe finished"),
        Ok(Err(e)) if e.is_interrupted() => {
            debug!(probe = %name, label = e.as_label(), "probe interrupted");
        }
        Ok(Err(e)) => {
            debug!(probe = %name, label = e.as_label(), error = %e.as_message(), "probe failed");
        }
        Err(panic) => {
            let info = panic_message(panic.as_ref());
            warn!(probe = %name, info = %info, "probe panicked");
            sink.emit(PANIC_FACT, format!("{name}: {info}"));
        }
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
