//! # Probes: the producers of facts.
//!
//! This module provides the probe abstractions and the built-in probe set:
//! - [`Probe`] trait for async cancelable probes, [`ProbeRef`] shared handle
//! - [`ProbeFn`] closure-backed probe
//! - [`ProbeCtx`] per-run context (token, sink, shell, process table)
//! - [`QueryArgs`] inputs the built-in probes read from the command line
//! - [`standard`] the built-in probe list, one entry per probe family
//!
//! ## Built-in families
//! ```text
//! session  pid, ts, st, os_name
//! workdir  wd, wd_trim, session_username, session_hostname, ds
//! process  pid_chain_length, pid_shell*, pid_parent*, pid_remote*, pid_chain
//! git      vcs=git, vcs_br, vcs_dirty, vcs_git_idx_*, vcs_log_*, vcs_git_rebase_*
//! sapling  vcs=sapling, vcs_sapling_*, vcs_dirty
//! stgit    vcs_git_stg*, vcs_git_stg_q*
//! ```
//! Families run in parallel; VCS families emit nothing outside a repository.

mod ctx;
mod git;
mod probe;
mod probe_fn;
mod process;
mod sapling;
mod session;
mod stgit;
mod workdir;

use std::sync::Arc;

pub use ctx::ProbeCtx;
pub use git::GitProbe;
pub use probe::{Probe, ProbeRef};
pub use probe_fn::ProbeFn;
pub use process::ProcessProbe;
pub use sapling::SaplingProbe;
pub use session::SessionProbe;
pub use stgit::StgitProbe;
pub use workdir::WorkdirProbe;

/// Inputs the built-in probes take from the invoking shell.
#[derive(Clone, Debug, Default)]
pub struct QueryArgs {
    /// Exit status of the previous command, reported as `st` unless `"0"`.
    pub cmd_status: String,
    /// Unix timestamp (seconds) taken before the previous command ran; `"0"` = unknown.
    pub preexec_ts: String,
    /// Ancestors to skip before picking the shell and its parent.
    pub pid_parent_skip: usize,
    /// Also report the whole ancestry chain as JSON.
    pub pid_chain: bool,
}

/// Builds the built-in probe list.
pub fn standard(args: &QueryArgs) -> Vec<ProbeRef> {
    vec![
        Arc::new(SessionProbe::new(args.cmd_status.clone())),
        Arc::new(WorkdirProbe::new(args.preexec_ts.clone())),
        Arc::new(ProcessProbe::new(args.pid_parent_skip, args.pid_chain)),
        Arc::new(SaplingProbe),
        Arc::new(GitProbe),
        Arc::new(StgitProbe),
    ]
}
