//! Session probe: facts known without touching the outside world.

use async_trait::async_trait;

use super::{Probe, ProbeCtx};
use crate::error::ProbeError;

/// Emits `pid`, `ts`, `st` and `os_name`.
#[derive(Debug, Clone)]
pub struct SessionProbe {
    cmd_status: String,
}

impl SessionProbe {
    /// `cmd_status` is the previous command's exit status as passed by the shell.
    pub fn new(cmd_status: impl Into<String>) -> Self {
        Self {
            cmd_status: cmd_status.into(),
        }
    }
}

#[async_trait]
impl Probe for SessionProbe {
    fn name(&self) -> &str {
        "session"
    }

    async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError> {
        ctx.emit("pid", std::process::id());
        ctx.emit("ts", chrono::Local::now().format("%H:%M:%S %m/%d/%y").to_string());

        let status = self.cmd_status.trim();
        if !status.is_empty() && status != "0" {
            ctx.emit("st", status.to_string());
        }

        ctx.emit("os_name", std::env::consts::OS);
        Ok(())
    }
}
