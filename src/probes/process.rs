//! Process ancestry probe.
//!
//! Walks from this process up to init and reports the interesting ancestors:
//! ```text
//! chain[0]            direct parent (usually the prompt hook's subshell)
//! chain[1 + skip]     the interactive shell        → pid_shell*
//! chain[2 + skip]     whatever launched the shell  → pid_parent*
//! first "ssh" entry   remote session marker        → pid_remote*
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{Probe, ProbeCtx};
use crate::error::ProbeError;
use crate::ps::ProcInfo;

/// Hard stop for pathological (cyclic) parent links.
const MAX_DEPTH: usize = 128;

/// Emits the `pid_*` facts.
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    skip: usize,
    chain_json: bool,
}

impl ProcessProbe {
    /// `skip` ancestors are ignored before the shell; `chain_json` adds `pid_chain`.
    pub fn new(skip: usize, chain_json: bool) -> Self {
        Self { skip, chain_json }
    }
}

#[derive(Debug, Serialize)]
struct ChainEntry<'a> {
    name: &'a str,
    pid: u32,
    cmdline: &'a [String],
    exec: String,
    app: String,
}

#[async_trait]
impl Probe for ProcessProbe {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError> {
        let chain = ancestors(&ctx).await?;
        ctx.emit("pid_chain_length", chain.len());

        let darwin = cfg!(target_os = "macos");
        let mut remote: Option<&ProcInfo> = None;
        let mut entries = Vec::with_capacity(chain.len());

        for (idx, proc) in chain.iter().enumerate() {
            if remote.is_none() && proc.name.contains("ssh") {
                remote = Some(proc);
            }

            let (exec, app) = exec_and_app(proc.cmdline.first().map(String::as_str), darwin);
            let prefix = match idx.checked_sub(self.skip) {
                Some(1) => Some("pid_shell"),
                Some(2) => Some("pid_parent"),
                _ => None,
            };
            if let Some(prefix) = prefix {
                ctx.emit(prefix, proc.pid);
                ctx.emit(format!("{prefix}_exec"), exec.as_str());
                ctx.emit(format!("{prefix}_app"), app.as_str());
                ctx.emit(format!("{prefix}_args"), proc.name.as_str());
            }

            entries.push(ChainEntry {
                name: &proc.name,
                pid: proc.pid,
                cmdline: &proc.cmdline,
                exec,
                app,
            });
        }

        if let Some(remote) = remote {
            let exec = remote.name.split(' ').next().unwrap_or_default();
            ctx.emit("pid_remote", remote.pid);
            ctx.emit("pid_remote_exec", exec.to_string());
        }

        if self.chain_json {
            match serde_json::to_string(&entries) {
                Ok(json) => ctx.emit("pid_chain", json),
                Err(e) => debug!(error = %e, "pid chain not serializable"),
            }
        }
        Ok(())
    }
}

/// Parents of this process, nearest first, ending at the process whose parent is 0.
///
/// A failed lookup is reported as `debug_ps_error` and truncates the chain.
async fn ancestors(ctx: &ProbeCtx) -> Result<Vec<ProcInfo>, ProbeError> {
    let mut chain = Vec::new();
    let mut current = match ctx.process(std::process::id()).await {
        Ok(me) => me,
        Err(e) if e.is_interrupted() => return Err(e),
        Err(e) => {
            ctx.emit("debug_ps_error", e.to_string());
            return Ok(chain);
        }
    };

    while current.ppid != 0 && chain.len() < MAX_DEPTH {
        ctx.check()?;
        match ctx.process(current.ppid).await {
            Ok(parent) => {
                chain.push(parent.clone());
                current = parent;
            }
            Err(e) if e.is_interrupted() => return Err(e),
            Err(e) => {
                ctx.emit("debug_ps_error", e.to_string());
                break;
            }
        }
    }
    Ok(chain)
}

/// Executable base name and application name of a command line's `argv[0]`.
///
/// On macOS the application is the `*.app` bundle the executable lives in,
/// and the executable is the last path component.
pub(crate) fn exec_and_app(argv0: Option<&str>, darwin: bool) -> (String, String) {
    let Some(argv0) = argv0 else {
        return (String::new(), String::new());
    };
    let exec = Path::new(argv0)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if darwin {
        let parts: Vec<&str> = argv0.split('/').collect();
        if let Some((last, dirs)) = parts.split_last()
            && let Some(bundle) = dirs.iter().find(|p| p.ends_with(".app"))
        {
            return ((*last).to_string(), (*bundle).to_string());
        }
    }
    (exec.clone(), exec)
}
