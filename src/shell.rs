//! # External command execution.
//!
//! [`Shell`] runs one program per call and returns its trimmed stdout.
//!
//! ## Rules
//! - Every call is bounded by [`Shell::timeout`]; on expiry the child is killed.
//! - Cancelling the caller's token kills the child as well.
//! - A killed child is always waited on (reaped) before the call returns.
//! - stdin is `/dev/null`, stderr is discarded.
//! - Environment overrides are added on top of the inherited environment;
//!   `GIT_OPTIONAL_LOCKS=0` is set by default so status queries never take the index lock.
//!
//! ## Flow
//! ```text
//! output(token, program, args)
//!   ├─► spawn (Spawn error when missing)
//!   └─► select!
//!         ├─ read stdout + wait ──► Ok(stdout) / Status error
//!         ├─ deadline           ──► kill + reap ──► Timeout
//!         └─ token cancelled    ──► kill + reap ──► Canceled
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ExecError;

/// Why a command was stopped before it finished on its own.
enum Interrupt {
    Deadline,
    Cancelled,
}

/// Runner for external commands with a per-call deadline.
///
/// Cheap to clone; probes share one instance through their context.
#[derive(Clone, Debug)]
pub struct Shell {
    timeout: Duration,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl Shell {
    /// Creates a shell with the given per-call deadline and the default overrides.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            env: vec![("GIT_OPTIONAL_LOCKS".to_string(), "0".to_string())],
            cwd: None,
        }
    }

    /// Returns a shell running commands in `dir` instead of the process working directory.
    pub fn with_cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Returns a shell with one more environment override.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Working directory override, if any.
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Runs `program` with `args` and returns stdout with surrounding newlines trimmed.
    ///
    /// Non-zero exit is an error; its output is discarded.
    pub async fn output(
        &self,
        token: &CancellationToken,
        program: &str,
        args: &[&str],
    ) -> Result<String, ExecError> {
        if token.is_cancelled() {
            return Err(ExecError::Canceled {
                program: program.to_string(),
            });
        }

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.to_string(),
            source,
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| ExecError::Io {
            program: program.to_string(),
            source: std::io::Error::other("stdout not captured"),
        })?;

        let finished = {
            let run = async {
                let mut buf = Vec::new();
                let (read, status) = tokio::join!(stdout.read_to_end(&mut buf), child.wait());
                read?;
                Ok::<_, std::io::Error>((buf, status?))
            };
            tokio::select! {
                res = run => Ok(res),
                _ = tokio::time::sleep(self.timeout) => Err(Interrupt::Deadline),
                _ = token.cancelled() => Err(Interrupt::Cancelled),
            }
        };

        match finished {
            Ok(Ok((buf, status))) => {
                if status.success() {
                    Ok(trim(&String::from_utf8_lossy(&buf)).to_string())
                } else {
                    Err(ExecError::Status {
                        program: program.to_string(),
                        code: status.code(),
                    })
                }
            }
            Ok(Err(source)) => Err(ExecError::Io {
                program: program.to_string(),
                source,
            }),
            Err(why) => {
                // kill() also waits, so the child never lingers as a zombie.
                if let Err(e) = child.kill().await {
                    debug!(program, error = %e, "failed to kill child");
                }
                match why {
                    Interrupt::Deadline => Err(ExecError::Timeout {
                        program: program.to_string(),
                        timeout: self.timeout,
                    }),
                    Interrupt::Cancelled => Err(ExecError::Canceled {
                        program: program.to_string(),
                    }),
                }
            }
        }
    }
}

impl Default for Shell {
    /// Shell with the default 10s per-call deadline.
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Strips leading and trailing newlines, keeping other whitespace.
pub(crate) fn trim(s: &str) -> &str {
    s.trim_matches(['\n', '\r'])
}
