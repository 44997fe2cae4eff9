//! # promptline
//!
//! **Promptline** collects the facts a shell prompt shows (working directory,
//! process ancestry, VCS state, ...) with many concurrent probes, and streams
//! them to the prompt renderer as soon as they are known.
//!
//! The renderer reads a line protocol (`name<TAB>value`, a blank line after every
//! batch) and may redraw after each batch; the last fact of a run is always
//! `done<TAB>ok|timeout|interrupted`, unless the reader itself went away.
//!
//! ## Architecture
//! ```text
//!     ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐
//!     │  session  │ │  process  │ │    git    │ │  sapling  │ ...
//!     │   probe   │ │   probe   │ │   probe   │ │   probe   │
//!     └─────┬─────┘ └─────┬─────┘ └──┬──┬──┬──┘ └─────┬─────┘
//!           │             │    child group: branch / status / ahead-behind
//!           ▼             ▼          ▼  ▼  ▼          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  FactSink (unbounded MPSC, closed exactly once)             │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                ▼
//!                   ┌─────────────────────────┐
//!                   │    StaggeredPrinter     │  first batch after 20ms,
//!                   │   (single consumer)     │  then every 100ms
//!                   └────────────┬────────────┘
//!                                ▼
//!                              stdout
//!
//! Lifecycle: owns the root token and the deadline, watches signals and the
//! consumer, emits `done`, closes the sink, waits for the printer.
//! ```
//!
//! ## Features
//! | Area            | Description                                               | Key types                                  |
//! |-----------------|-----------------------------------------------------------|--------------------------------------------|
//! | **Facts**       | Named values, the shared sink and the wire format.        | [`Fact`], [`FactSink`], [`wire`]           |
//! | **Probes**      | Async cancelable producers, closure or struct based.      | [`Probe`], [`ProbeFn`], [`ProbeCtx`]       |
//! | **Concurrency** | Nested fan-out with a single join point.                  | [`TaskGroup`]                              |
//! | **Output**      | Time-batched single writer.                               | [`StaggeredPrinter`]                       |
//! | **Lifecycle**   | Deadline, signals, consumer liveness, terminal fact.      | [`Lifecycle`], [`Outcome`]                 |
//! | **Commands**    | Deadline-bounded external commands, process table.        | [`Shell`], [`ProcessTable`]                |
//! | **Errors**      | Typed errors for setup, commands and probes.              | [`RuntimeError`], [`ExecError`], [`ProbeError`] |
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use promptline::{Config, Lifecycle, Outcome, ProbeCtx, ProbeError, ProbeFn, ProbeRef};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         timeout: Duration::from_millis(500),
//!         ..Config::default()
//!     };
//!
//!     let hello: ProbeRef = ProbeFn::arc("hello", |ctx: ProbeCtx| async move {
//!         ctx.emit("greeting", "hello");
//!         Ok::<_, ProbeError>(())
//!     });
//!
//!     let outcome = Lifecycle::new(cfg).run(vec![hello], tokio::io::stdout()).await?;
//!     assert_eq!(outcome, Outcome::Ok);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod facts;
mod probes;
mod ps;
mod shell;

// ---- Public re-exports ----

pub use config::{Config, parse_duration};
pub use crate::core::{
    ConsumerCheck, Lifecycle, PANIC_FACT, PrintStats, StaggeredPrinter, TaskGroup, stdout_alive,
};
pub use error::{ExecError, ProbeError, RuntimeError};
pub use facts::{DONE, Fact, FactSink, FactStream, FactValue, Outcome, wire};
pub use probes::{
    GitProbe, Probe, ProbeCtx, ProbeFn, ProbeRef, ProcessProbe, QueryArgs, SaplingProbe,
    SessionProbe, StgitProbe, WorkdirProbe, standard,
};
#[cfg(target_os = "linux")]
pub use ps::ProcFs;
pub use ps::{ProcInfo, ProcessTable, ProcessTableRef, PsCommand, system};
pub use shell::Shell;
