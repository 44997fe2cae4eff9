//! Runs the `promptline` binary.

use assert_cmd::Command;

use promptline::wire::Snapshot;

fn promptline() -> Command {
    let mut cmd = Command::cargo_bin("promptline").expect("binary is built");
    cmd.env_remove("PROMPTLINE_LOG");
    cmd
}

#[test]
fn test_query_streams_facts_and_exits_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = promptline()
        .args(["query", "--cmd-status", "3", "--timeout", "20s", "--pid-chain"])
        .current_dir(dir.path())
        .env("GIT_CEILING_DIRECTORIES", dir.path().parent().unwrap_or(dir.path()))
        .output()
        .expect("binary runs");

    assert!(out.status.success(), "status {:?}", out.status);
    let text = String::from_utf8(out.stdout).expect("utf8");
    assert!(text.ends_with("done\tok\n\n"), "{text}");

    let snap = Snapshot::parse(&text);
    assert_eq!(snap.get("st"), Some("3"));
    assert_eq!(snap.get("os_name"), Some(std::env::consts::OS));
    assert!(snap.get("pid").is_some_and(|pid| pid.parse::<u32>().is_ok()));
    assert!(snap.get("pid_chain").is_some_and(|chain| chain.starts_with('[')));
    assert!(!snap.contains("vcs"));
    assert!(out.stderr.is_empty(), "logging is off by default");
}

#[test]
fn test_bad_duration_is_rejected() {
    let out = promptline()
        .args(["query", "--timeout", "soon"])
        .output()
        .expect("binary runs");
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

#[cfg(unix)]
#[test]
fn test_timeout_exits_nonzero_with_done_timeout() {
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, Instant};

    let stubs = tempfile::tempdir().expect("tempdir");
    let git = stubs.path().join("git");
    std::fs::write(&git, "#!/bin/sh\nexec sleep 3\n").expect("write stub");
    std::fs::set_permissions(&git, std::fs::Permissions::from_mode(0o755)).expect("chmod");

    let system_path = std::env::var_os("PATH").unwrap_or_default();
    let path = std::env::join_paths(
        std::iter::once(stubs.path().to_path_buf()).chain(std::env::split_paths(&system_path)),
    )
    .expect("PATH");

    let work = tempfile::tempdir().expect("tempdir");
    let started = Instant::now();
    let out = promptline()
        .args(["query", "--timeout", "50ms"])
        .current_dir(work.path())
        .env("PATH", path)
        .output()
        .expect("binary runs");
    let elapsed = started.elapsed();

    assert!(!out.status.success(), "timeout must exit non-zero");
    assert_eq!(out.status.code(), Some(1));
    let text = String::from_utf8(out.stdout).expect("utf8");
    assert!(text.ends_with("done\ttimeout\n\n"), "{text}");
    assert_eq!(Snapshot::parse(&text).outcome(), Some("timeout"));
    assert!(!text.contains("vcs\t"));

    assert!(elapsed >= Duration::from_millis(50), "returned before the deadline: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "stub git was waited for: {elapsed:?}");
}
