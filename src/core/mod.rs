//! Pipeline core: scheduling, output pacing and run lifecycle.
//!
//! The public API from this module is [`TaskGroup`], [`StaggeredPrinter`] and
//! [`Lifecycle`]; the rest is wiring.
//!
//! Internal modules:
//! - [`group`]: structured fan-out/fan-in of probes with panic isolation;
//! - [`printer`]: batching writer, the only writer of the output stream;
//! - [`lifecycle`]: root token, deadline, signals and terminal outcome;
//! - [`liveness`]: detects a consumer that went away;
//! - [`shutdown`]: cross-platform termination signals.

mod group;
mod lifecycle;
mod liveness;
mod printer;
mod shutdown;

pub use group::{PANIC_FACT, TaskGroup};
pub use lifecycle::Lifecycle;
pub use liveness::{ConsumerCheck, stdout_alive};
pub use printer::{PrintStats, StaggeredPrinter};
