//! # Probe abstraction.
//!
//! A [`Probe`] is an asynchronous, cancelable unit of information gathering. It
//! receives a [`ProbeCtx`] carrying the cancellation token, the fact sink and the
//! external collaborators, emits zero or more facts and returns.
//!
//! Returning `Err` is not an output: the task group logs it and moves on. Facts
//! emitted before the error stay emitted.

use std::sync::Arc;

use async_trait::async_trait;

use super::ctx::ProbeCtx;
use crate::error::ProbeError;

/// # Shared handle to a probe object.
pub type ProbeRef = Arc<dyn Probe>;

/// # Asynchronous, cancelable information gatherer.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use promptline::{Probe, ProbeCtx, ProbeError};
///
/// struct Shell;
///
/// #[async_trait]
/// impl Probe for Shell {
///     fn name(&self) -> &str { "shell" }
///
///     async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError> {
///         if let Ok(shell) = std::env::var("SHELL") {
///             ctx.emit("shell", shell);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Returns a stable, human-readable probe name (used in logs and panic diagnostics).
    fn name(&self) -> &str;

    /// Gathers facts until done or cancelled.
    ///
    /// Implementations should check `ctx.is_cancelled()` between external calls.
    async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError>;
}
