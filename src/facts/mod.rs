//! Facts: the data model, the sink probes emit onto, and the wire encoding.
//!
//! ## Contents
//! - [`Fact`], [`FactValue`] one named, typed unit of collected information
//! - [`FactSink`] multi-producer handle shared by every probe
//! - [`wire`] line protocol helpers (`name<TAB>value`, blank line between batches)
//!
//! ## Quick reference
//! - **Producers**: every probe (through [`ProbeCtx::emit`](crate::ProbeCtx::emit)),
//!   the task group (panic diagnostics), the lifecycle (terminal `done`).
//! - **Consumer**: the staggered printer, exactly one per run.

mod fact;
mod sink;
pub mod wire;

pub use fact::{DONE, Fact, FactValue, Outcome};
pub use sink::{FactSink, FactStream};
