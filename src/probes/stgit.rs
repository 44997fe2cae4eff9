//! StGit patch stack probe.

use async_trait::async_trait;

use super::{Probe, ProbeCtx};
use crate::error::ProbeError;

/// Emits `vcs_git_stg=1` and the patch queue facts when StGit manages the branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct StgitProbe;

#[async_trait]
impl Probe for StgitProbe {
    fn name(&self) -> &str {
        "stgit"
    }

    async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError> {
        let Some(qlen) = ctx.try_exec("stg", &["series", "-c"]).await? else {
            return Ok(());
        };
        ctx.emit("vcs_git_stg", "1");
        ctx.emit("vcs_git_stg_qlen", qlen);

        let group = ctx.group();
        group.spawn("stgit-qpos", |ctx: ProbeCtx| async move {
            if let Some(qpos) = ctx.try_exec("stg", &["series", "-cA"]).await? {
                ctx.emit("vcs_git_stg_qpos", qpos);
            }
            Ok::<(), ProbeError>(())
        });

        // No applied patch: nothing on top to compare against.
        if let Some(top) = ctx.try_exec("stg", &["top"]).await? {
            ctx.emit("vcs_git_stg_top", top.as_str());
            group.spawn("stgit-dirty", move |ctx: ProbeCtx| {
                let top = top.clone();
                async move {
                    let head = ctx.try_exec("stg", &["id"]).await?.unwrap_or_default();
                    let patch = ctx.try_exec("stg", &["id", &top]).await?.unwrap_or_default();
                    ctx.emit("vcs_git_stg_dirty", i64::from(head != patch));
                    Ok::<(), ProbeError>(())
                }
            });
        }

        group.join().await;
        Ok(())
    }
}
