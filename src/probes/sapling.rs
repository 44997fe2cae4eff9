//! Sapling (`sl`) probe.

use async_trait::async_trait;

use super::{Probe, ProbeCtx};
use crate::error::ProbeError;

/// `rev`, `node`, remote bookmarks, bookmarks, active bookmark, tab separated.
const LOG_TEMPLATE: &str = "{rev}\\t{node}\\t{join(remotenames, \"#\")}\\t{join(bookmarks, \"#\")}\\t{activebookmark}\\t{ifcontains(rev, revset(\".\"), \"@\")}\\n";

/// Emits `vcs=sapling` and the sapling sub-facts inside a sapling checkout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaplingProbe;

#[async_trait]
impl Probe for SaplingProbe {
    fn name(&self) -> &str {
        "sapling"
    }

    async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError> {
        if ctx.try_exec("sl", &["root"]).await?.is_none() {
            return Ok(());
        }
        ctx.emit("vcs", "sapling");

        let group = ctx.group();
        group.spawn("sapling-log", log);
        group.spawn("sapling-status", status);
        group.join().await;
        Ok(())
    }
}

async fn log(ctx: ProbeCtx) -> Result<(), ProbeError> {
    let args = ["log", "-r", ".", "--template", LOG_TEMPLATE];
    let Some(raw) = ctx.try_exec("sl", &args).await? else {
        return Ok(());
    };
    let rev = RevInfo::parse(&raw)?;

    ctx.emit("vcs_sapling_rev", rev.rev);
    ctx.emit("vcs_sapling_node", rev.node);
    ctx.emit("vcs_sapling_bookmarks", rev.bookmarks);
    ctx.emit(
        "vcs_sapling_bookmarks_active",
        if rev.active.is_empty() { "@" } else { rev.active },
    );
    ctx.emit("vcs_sapling_bookmarks_remote", rev.remote);
    Ok(())
}

async fn status(ctx: ProbeCtx) -> Result<(), ProbeError> {
    if let Some(out) = ctx.try_exec("sl", &["status"]).await? {
        ctx.emit("vcs_dirty", i64::from(!out.is_empty()));
    }
    Ok(())
}

/// One line of [`LOG_TEMPLATE`] output.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RevInfo<'a> {
    pub rev: &'a str,
    pub node: &'a str,
    pub remote: &'a str,
    pub bookmarks: &'a str,
    pub active: &'a str,
}

impl<'a> RevInfo<'a> {
    pub(crate) fn parse(raw: &'a str) -> Result<Self, ProbeError> {
        let fields: Vec<&str> = raw.split('\t').collect();
        let [rev, node, remote, bookmarks, active, ..] = fields[..] else {
            return Err(ProbeError::Parse {
                what: "sl log",
                input: raw.to_string(),
            });
        };
        Ok(Self {
            rev,
            node,
            remote,
            bookmarks,
            active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rev_info_fields() {
        let info = RevInfo::parse("12\tabcdef\tremote/main\tfeat#wip\tfeat\t@").expect("parse");
        assert_eq!(
            info,
            RevInfo {
                rev: "12",
                node: "abcdef",
                remote: "remote/main",
                bookmarks: "feat#wip",
                active: "feat",
            }
        );
    }

    #[test]
    fn test_rev_info_short_output_is_parse_error() {
        let err = RevInfo::parse("12\tabcdef").unwrap_err();
        assert_eq!(err.as_label(), "probe_parse");
    }
}
