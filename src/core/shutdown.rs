//! # Cross-platform OS signal handling.
//!
//! Provides [`ShutdownSignals`], registered once before probes start so that a
//! registration failure surfaces as a setup error instead of mid-run.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C, or the shell abandoning the prompt)
//! - `SIGTERM` (default kill signal)
//! - `SIGQUIT` (quit signal)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

/// Registered termination signal listeners.
#[cfg(unix)]
pub struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Registers the listeners. Returns `Err` if signal registration fails.
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Completes when any termination signal is received.
    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv()  => {},
            _ = self.sigterm.recv() => {},
            _ = self.sigquit.recv() => {},
        }
    }
}

/// Registered termination signal listeners.
#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    /// Nothing to register up front on this platform.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    /// Completes on Ctrl-C. Never completes if the handler cannot be installed.
    pub async fn recv(&mut self) {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
