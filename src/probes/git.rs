//! # Git probe.
//!
//! ```text
//! git rev-parse --show-toplevel      (fails outside a work tree → no facts)
//!   └─► vcs=git
//!       child group
//!         ├─► branch        vcs_br, vcs_git_rebase_op, vcs_git_rebase_op_left
//!         ├─► status        vcs_dirty, vcs_git_idx_{total,incl,excl}
//!         └─► ahead/behind  vcs_log_ahead, vcs_log_behind
//! ```
//! Each sub-probe fails on its own; a missing upstream only drops the log facts.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Probe, ProbeCtx};
use crate::error::ProbeError;
use crate::shell;

/// Emits `vcs=git` and the git sub-facts inside a git work tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitProbe;

#[async_trait]
impl Probe for GitProbe {
    fn name(&self) -> &str {
        "git"
    }

    async fn run(&self, ctx: ProbeCtx) -> Result<(), ProbeError> {
        if ctx.try_exec("git", &["rev-parse", "--show-toplevel"]).await?.is_none() {
            return Ok(());
        }
        ctx.emit("vcs", "git");

        let git_dir = ctx
            .try_exec("git", &["rev-parse", "--path-format=absolute", "--git-dir"])
            .await?
            .map(|dir| resolve(&ctx, &dir))
            .unwrap_or_default();

        let group = ctx.group();
        group.spawn("git-branch", move |ctx: ProbeCtx| branch(ctx, git_dir.clone()));
        group.spawn("git-status", status);
        group.spawn("git-ahead-behind", ahead_behind);
        group.join().await;
        Ok(())
    }
}

fn resolve(ctx: &ProbeCtx, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    match ctx.shell().cwd() {
        Some(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    }
}

/// In-progress history rewrite, detected from marker files in the git dir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RebaseOp {
    Cherry,
    Merge,
    Rebase,
}

impl RebaseOp {
    fn as_str(self) -> &'static str {
        match self {
            RebaseOp::Cherry => "cherry",
            RebaseOp::Merge => "merge",
            RebaseOp::Rebase => "rebase",
        }
    }
}

async fn branch(ctx: ProbeCtx, git_dir: PathBuf) -> Result<(), ProbeError> {
    let markers = [
        (RebaseOp::Cherry, git_dir.join("CHERRY_PICK_HEAD")),
        (RebaseOp::Merge, git_dir.join("MERGE_HEAD")),
        (RebaseOp::Rebase, git_dir.join("rebase-merge").join("orig-head")),
    ];

    let mut head_ref = None;
    for (op, path) in markers {
        if let Some(rev) = read_marker(&path).await? {
            ctx.emit("vcs_git_rebase_op", op.as_str());
            if op == RebaseOp::Rebase {
                let todo_path = git_dir.join("rebase-merge").join("git-rebase-todo");
                let todo = read_optional(&todo_path).await?;
                ctx.emit("vcs_git_rebase_op_left", rebase_steps_left(todo.as_deref()));
            }
            head_ref = Some(rev);
            break;
        }
    }

    let name = match &head_ref {
        Some(rev) => ctx.try_exec("git", &["name-rev", "--name-only", rev]).await?,
        None => ctx.try_exec("git", &["branch", "--show-current"]).await?,
    };
    ctx.emit("vcs_br", name.unwrap_or_default());
    Ok(())
}

/// Contents of a git dir file; a missing file is `None`, other failures are errors.
async fn read_optional(path: &Path) -> Result<Option<String>, ProbeError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Revision stored in a marker file such as `MERGE_HEAD`; empty counts as absent.
async fn read_marker(path: &Path) -> Result<Option<String>, ProbeError> {
    let Some(raw) = read_optional(path).await? else {
        return Ok(None);
    };
    let rev = shell::trim(&raw);
    Ok((!rev.is_empty()).then(|| rev.to_string()))
}

/// Steps left in an interactive rebase, counting the one being applied.
fn rebase_steps_left(todo: Option<&str>) -> usize {
    match todo.map(shell::trim) {
        None | Some("") => 1,
        Some(todo) => todo.split('\n').count() + 1,
    }
}

async fn status(ctx: ProbeCtx) -> Result<(), ProbeError> {
    let Some(porcelain) = ctx.try_exec("git", &["status", "--porcelain"]).await? else {
        return Ok(());
    };

    match parse_porcelain(&porcelain) {
        None => ctx.emit("vcs_dirty", 0),
        Some(counts) => {
            ctx.emit("vcs_dirty", 1);
            ctx.emit("vcs_git_idx_total", counts.total);
            ctx.emit("vcs_git_idx_incl", counts.staged);
            ctx.emit("vcs_git_idx_excl", counts.unstaged);
        }
    }
    Ok(())
}

/// File counts from `git status --porcelain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StatusCounts {
    pub total: usize,
    /// Entries whose first column is not blank.
    pub staged: usize,
    /// Entries whose second column is not blank. Untracked (`??`) entries count in both.
    pub unstaged: usize,
}

/// Counts porcelain entries; `None` for a clean tree.
pub(crate) fn parse_porcelain(porcelain: &str) -> Option<StatusCounts> {
    if porcelain.is_empty() {
        return None;
    }
    let mut counts = StatusCounts::default();
    for line in porcelain.lines() {
        let mut cols = line.chars();
        let (Some(index), Some(tree)) = (cols.next(), cols.next()) else {
            continue;
        };
        if index != ' ' {
            counts.staged += 1;
        }
        if tree != ' ' {
            counts.unstaged += 1;
        }
        counts.total += 1;
    }
    Some(counts)
}

async fn ahead_behind(ctx: ProbeCtx) -> Result<(), ProbeError> {
    let Some(counts) = ctx
        .try_exec("git", &["rev-list", "--left-right", "--count", "HEAD...@{u}"])
        .await?
    else {
        return Ok(());
    };

    let (ahead, behind) = parse_left_right(&counts)?;
    ctx.emit("vcs_log_ahead", ahead);
    ctx.emit("vcs_log_behind", behind);
    Ok(())
}

/// Parses `"<ahead>\t<behind>"`; output without a tab counts as `(0, 0)`.
pub(crate) fn parse_left_right(raw: &str) -> Result<(i64, i64), ProbeError> {
    let Some((left, right)) = raw.split_once('\t') else {
        return Ok((0, 0));
    };
    let parse = |field: &str| {
        field.trim().parse::<i64>().map_err(|_| ProbeError::Parse {
            what: "rev-list --left-right",
            input: raw.to_string(),
        })
    };
    Ok((parse(left)?, parse(right)?))
}
