//! # Function-backed probe (`ProbeFn`)
//!
//! [`ProbeFn`] wraps a closure `F: Fn(ProbeCtx) -> Fut`, producing a fresh future
//! per run. Everything the closure needs arrives through the [`ProbeCtx`]
//! argument, so nothing has to be captured from surrounding loops.
//!
//! ## Example
//! ```rust
//! use promptline::{Probe, ProbeCtx, ProbeError, ProbeFn, ProbeRef};
//!
//! let p: ProbeRef = ProbeFn::arc("os", |ctx: ProbeCtx| async move {
//!     ctx.emit("os_name", std::env::consts::OS);
//!     Ok::<_, ProbeError>(())
//! });
//!
//! assert_eq!(p.name(), "os");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::ctx::ProbeCtx;
use super::probe::Probe;
use crate::error::ProbeError;

/// Function-backed probe implementation.
#[derive(Debug)]
pub struct ProbeFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ProbeFn<F> {
    /// Creates a new function-backed probe.
    ///
    /// Prefer [`ProbeFn::arc`] when you immediately need a [`ProbeRef`](super::ProbeRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the probe and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Probe for ProbeFn<F>
where
    F: Fn(ProbeCtx) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError> {
        (self.f)(ctx).await
    }
}
