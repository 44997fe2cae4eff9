//! Working directory and session identity probe.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use super::{Probe, ProbeCtx};
use crate::error::ProbeError;

const HOSTNAME_FILE: &str = "/proc/sys/kernel/hostname";

/// Emits `wd`, `wd_trim`, `session_username`, `session_hostname` and `ds`.
#[derive(Debug, Clone)]
pub struct WorkdirProbe {
    preexec_ts: String,
}

impl WorkdirProbe {
    /// `preexec_ts` is the unix timestamp taken before the previous command; `"0"` disables `ds`.
    pub fn new(preexec_ts: impl Into<String>) -> Self {
        Self {
            preexec_ts: preexec_ts.into(),
        }
    }
}

#[async_trait]
impl Probe for WorkdirProbe {
    fn name(&self) -> &str {
        "workdir"
    }

    async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError> {
        let now = SystemTime::now();

        if let Some(wd) = working_dir(&ctx) {
            let home = std::env::var("HOME").unwrap_or_default();
            let wd = home_relative(&wd.to_string_lossy(), &home);
            ctx.emit("wd_trim", trim_path(&wd));
            ctx.emit("wd", wd);
        }

        if let Some(user) = username(&ctx).await {
            ctx.emit("session_username", user);
        }
        ctx.check()?;
        if let Some(host) = hostname(&ctx).await {
            ctx.emit("session_hostname", host);
        }

        if let Some(ds) = elapsed_since(&self.preexec_ts, now) {
            ctx.emit("ds", ds);
        }
        Ok(())
    }
}

fn working_dir(ctx: &ProbeCtx) -> Option<PathBuf> {
    match ctx.shell().cwd() {
        Some(dir) => Some(dir.to_path_buf()),
        None => std::env::current_dir().ok(),
    }
}

async fn username(ctx: &ProbeCtx) -> Option<String> {
    for key in ["USER", "LOGNAME"] {
        if let Ok(user) = std::env::var(key)
            && !user.is_empty()
        {
            return Some(user);
        }
    }
    ctx.exec("id", &["-un"]).await.ok().filter(|u| !u.is_empty())
}

async fn hostname(ctx: &ProbeCtx) -> Option<String> {
    if let Ok(raw) = tokio::fs::read_to_string(HOSTNAME_FILE).await {
        let host = raw.trim();
        if !host.is_empty() {
            return Some(host.to_string());
        }
    }
    ctx.exec("hostname", &[]).await.ok().filter(|h| !h.is_empty())
}

/// Replaces the first occurrence of `home` in `wd` with `~`.
pub(crate) fn home_relative(wd: &str, home: &str) -> String {
    if home.is_empty() {
        return wd.to_string();
    }
    wd.replacen(home, "~", 1)
}

/// Shortens every path component but the last to its first character.
///
/// `~/src/github.com/promptline` → `~/s/g/promptline`.
pub(crate) fn trim_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    let last = parts.len().saturating_sub(1);
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == last {
                (*part).to_string()
            } else {
                part.chars().take(1).collect()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Time since `preexec_ts`, rounded to whole seconds; `None` when unknown or under a second.
pub(crate) fn elapsed_since(preexec_ts: &str, now: SystemTime) -> Option<Duration> {
    let raw = preexec_ts.trim();
    if raw.is_empty() || raw == "0" {
        return None;
    }
    let ts: u64 = raw.parse().ok()?;
    let started = UNIX_EPOCH + Duration::from_secs(ts);
    let diff = now.duration_since(started).ok()?;
    let secs = (diff.as_millis() + 500) / 1000;
    (secs > 0).then(|| Duration::from_secs(secs as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_relative() {
        assert_eq!(home_relative("/home/ana/src", "/home/ana"), "~/src");
        assert_eq!(home_relative("/home/ana", "/home/ana"), "~");
        assert_eq!(home_relative("/srv/data", "/home/ana"), "/srv/data");
        assert_eq!(home_relative("/srv/data", ""), "/srv/data");
    }

    #[test]
    fn test_trim_path_keeps_last_component() {
        assert_eq!(trim_path("~/src/github.com/promptline"), "~/s/g/promptline");
        assert_eq!(trim_path("/usr/local/bin"), "/u/l/bin");
        assert_eq!(trim_path("~"), "~");
        assert_eq!(trim_path("/"), "/");
        assert_eq!(trim_path("~/ünï/x"), "~/ü/x");
    }

    #[test]
    fn test_elapsed_since() {
        let now = UNIX_EPOCH + Duration::from_millis(1_000_000_400);
        assert_eq!(elapsed_since("0", now), None);
        assert_eq!(elapsed_since("", now), None);
        assert_eq!(elapsed_since("yesterday", now), None);
        assert_eq!(elapsed_since("1000000", now), None);
        assert_eq!(elapsed_since("999995", now), Some(Duration::from_secs(5)));
        assert_eq!(elapsed_since(" 999000\n", now), Some(Duration::from_secs(1000)));
        // in the future
        assert_eq!(elapsed_since("2000000", now), None);
    }
}
