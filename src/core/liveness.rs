//! # Consumer liveness watchdog.
//!
//! The renderer reads our stdout through a pipe. When the shell abandons a
//! prompt it closes its end and may never signal us, so the lifecycle polls
//! stdout every `liveness_interval` and treats a closed or hung-up descriptor
//! as "consumer gone".

use std::future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Predicate answering "is anyone still reading our output?".
pub type ConsumerCheck = fn() -> bool;

/// Default check: stdout is open and its reader has not hung up.
#[cfg(unix)]
pub fn stdout_alive() -> bool {
    use std::os::fd::AsFd;

    fd_alive(std::io::stdout().as_fd())
}

/// Polls `fd` without waiting; `POLLERR`, `POLLHUP` or `POLLNVAL` mean the peer is gone.
///
/// A pipe writer whose reader exited still passes `fstat`, but reports
/// `POLLERR` (Linux) or `POLLHUP` (BSD) here.
#[cfg(unix)]
pub(crate) fn fd_alive(fd: std::os::fd::BorrowedFd<'_>) -> bool {
    use nix::errno::Errno;
    use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

    let mut fds = [PollFd::new(fd, PollFlags::empty())];
    match poll(&mut fds, PollTimeout::ZERO) {
        Ok(0) => true,
        Ok(_) => {
            let gone = PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL;
            !fds[0].revents().is_some_and(|ev| ev.intersects(gone))
        }
        Err(Errno::EBADF) => false,
        Err(e) => {
            debug!(error = %e, "liveness poll failed");
            true
        }
    }
}

/// Default check: always alive where descriptors cannot be inspected.
#[cfg(not(unix))]
pub fn stdout_alive() -> bool {
    true
}

/// Completes once `check` reports the consumer gone.
///
/// With `interval = None` it never completes.
pub async fn consumer_gone(interval: Option<Duration>, check: ConsumerCheck) {
    let Some(interval) = interval else {
        return future::pending().await;
    };

    let mut tick = time::interval(interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tick.tick().await;
        if !check() {
            debug!("consumer gone");
            return;
        }
    }
}
