//! # Process table lookups.
//!
//! [`ProcessTable`] answers "what is process `pid` and who is its parent", which is
//! all the ancestry probe needs to walk from this process up to init.
//!
//! - On Linux, [`ProcFs`] reads `/proc/<pid>/{stat,cmdline}` through the `procfs` crate.
//! - [`PsCommand`] asks `ps(1)` through a [`Shell`]; the default where there is no `/proc`.
//!
//! [`system`] picks the right one for the current platform.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::shell::Shell;

/// One row of the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcInfo {
    /// Process id.
    pub pid: u32,
    /// Parent process id (`0` at the root).
    pub ppid: u32,
    /// Short executable name as the kernel reports it.
    pub name: String,
    /// Full argument vector; may be empty for kernel threads or hidden processes.
    pub cmdline: Vec<String>,
}

/// Shared handle to a process table.
pub type ProcessTableRef = Arc<dyn ProcessTable>;

/// Source of process information.
#[async_trait]
pub trait ProcessTable: Send + Sync + 'static {
    /// Looks up a single process.
    async fn lookup(&self, token: &CancellationToken, pid: u32) -> Result<ProcInfo, ProbeError>;
}

/// Returns the process table for this platform.
pub fn system(shell: &Shell) -> ProcessTableRef {
    #[cfg(target_os = "linux")]
    {
        let _ = shell;
        Arc::new(ProcFs)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(PsCommand::new(shell.clone()))
    }
}

/// `/proc` backed table.
#[cfg(target_os = "linux")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcFs;

#[cfg(target_os = "linux")]
#[async_trait]
impl ProcessTable for ProcFs {
    async fn lookup(&self, _token: &CancellationToken, pid: u32) -> Result<ProcInfo, ProbeError> {
        let fail = |e: procfs::ProcError| ProbeError::Process {
            pid,
            reason: e.to_string(),
        };
        let proc = procfs::process::Process::new(pid as i32).map_err(fail)?;
        let stat = proc.stat().map_err(fail)?;
        let cmdline = proc.cmdline().unwrap_or_default();
        Ok(ProcInfo {
            pid,
            ppid: stat.ppid.max(0) as u32,
            name: stat.comm,
            cmdline,
        })
    }
}

/// `ps(1)` backed table for platforms without `/proc`.
#[derive(Debug, Clone)]
pub struct PsCommand {
    shell: Shell,
}

impl PsCommand {
    /// Creates a table that runs `ps` through `shell`.
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

#[async_trait]
impl ProcessTable for PsCommand {
    async fn lookup(&self, token: &CancellationToken, pid: u32) -> Result<ProcInfo, ProbeError> {
        let pid_arg = pid.to_string();
        let row = self
            .shell
            .output(token, "ps", &["-o", "ppid=,comm=", "-p", &pid_arg])
            .await?;
        let (ppid, name) = parse_ps_row(&row).ok_or_else(|| ProbeError::Parse {
            what: "ps",
            input: row.clone(),
        })?;
        let args = self
            .shell
            .output(token, "ps", &["-o", "args=", "-p", &pid_arg])
            .await
            .unwrap_or_default();
        Ok(ProcInfo {
            pid,
            ppid,
            name,
            cmdline: args.split_whitespace().map(str::to_string).collect(),
        })
    }
}

/// Parses `"  123 /bin/zsh"` into `(123, "zsh")`.
fn parse_ps_row(row: &str) -> Option<(u32, String)> {
    let row = row.trim();
    let (ppid, comm) = row.split_once(char::is_whitespace)?;
    let ppid = ppid.parse().ok()?;
    let comm = comm.trim();
    let name = comm.rsplit('/').next().unwrap_or(comm);
    Some((ppid, name.to_string()))
}
