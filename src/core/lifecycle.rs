//! # Lifecycle: one collection run from first probe to terminal fact.
//!
//! The [`Lifecycle`] owns the root cancellation token, the optional run
//! deadline and the set-once [`Outcome`]. It wires the fact sink, the printer
//! and the root [`TaskGroup`] together and decides how the run ends.
//!
//! ## High-level architecture
//! ```text
//! run(probes, out):
//!   install signal handlers            (failure → RuntimeError::Signal)
//!   FactSink::channel() ─► spawn StaggeredPrinter::run(stream, out)
//!   root TaskGroup ─► dispatch(probe) for every probe
//!
//!   select!
//!     ├─ root.join()          → Ok           (announce done=ok)
//!     ├─ deadline elapsed     → Timeout      (announce done=timeout)
//!     ├─ SIGINT/SIGTERM/QUIT  → Interrupted  (announce done=interrupted)
//!     ├─ token cancelled      → Interrupted  (announce done=interrupted)
//!     ├─ consumer gone        → Interrupted  (silent)
//!     └─ printer failed       → Interrupted  (silent)
//!
//!   token.cancel()            → every probe and shell call sees it
//!   sink.finish(done)         → last fact of the run, sink closed atomically
//!                               (sink.close() instead when done is not announced)
//!                             → printer performs its final flush
//!   await printer             (bounded by cfg.grace unless Ok)
//! ```
//!
//! ## Rules
//! - Cancellation is cooperative: probes still running after cancellation are abandoned,
//!   their shell calls are killed by the shell itself.
//! - `done` is emitted at most once and nothing is accepted after it.
//! - Only setup failures and a panicking printer produce `Err`; everything else is an [`Outcome`].

use std::future;
use std::sync::OnceLock;

use tokio::io::AsyncWrite;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::group::TaskGroup;
use crate::core::liveness::{self, ConsumerCheck};
use crate::core::printer::StaggeredPrinter;
use crate::core::shutdown::ShutdownSignals;
use crate::error::RuntimeError;
use crate::facts::{Fact, FactSink, Outcome};
use crate::probes::{ProbeCtx, ProbeRef};
use crate::ps::{self, ProcessTableRef};
use crate::shell::Shell;

/// Drives one collection run.
pub struct Lifecycle {
    cfg: Config,
    token: CancellationToken,
    outcome: OnceLock<Outcome>,
    shell: Shell,
    ps: ProcessTableRef,
    consumer: ConsumerCheck,
}

impl Lifecycle {
    /// Creates a lifecycle with the system shell, process table and stdout liveness check.
    pub fn new(cfg: Config) -> Self {
        let shell = Shell::new(cfg.exec_timeout);
        let ps = ps::system(&shell);
        Self {
            cfg,
            token: CancellationToken::new(),
            outcome: OnceLock::new(),
            shell,
            ps,
            consumer: liveness::stdout_alive,
        }
    }

    /// Replaces the shell handed to probes (e.g. to pin a working directory).
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Replaces the process table handed to probes.
    pub fn with_process_table(mut self, ps: ProcessTableRef) -> Self {
        self.ps = ps;
        self
    }

    /// Replaces the consumer liveness predicate.
    pub fn with_consumer_check(mut self, check: ConsumerCheck) -> Self {
        self.consumer = check;
        self
    }

    /// Root cancellation token. Cancelling it ends the run as `Interrupted`.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Requests an early end of the run.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Outcome of the finished run; `None` while pending.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome.get().copied()
    }

    /// Runs `probes` concurrently and streams their facts to `out`.
    pub async fn run<W>(&self, probes: Vec<ProbeRef>, out: W) -> Result<Outcome, RuntimeError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut signals = ShutdownSignals::install().map_err(RuntimeError::Signal)?;

        let (sink, stream) = FactSink::channel();
        let mut printer = tokio::spawn(StaggeredPrinter::from_config(&self.cfg).run(stream, out));

        let ctx = ProbeCtx::new(
            self.token.child_token(),
            sink.clone(),
            self.shell.clone(),
            self.ps.clone(),
        );
        let root = TaskGroup::new(ctx);
        debug!(probes = probes.len(), "run: start");
        for probe in probes {
            root.dispatch(probe);
        }

        let deadline = self.cfg.deadline();
        let expired = async {
            match deadline {
                Some(d) => time::sleep(d).await,
                None => future::pending().await,
            }
        };
        let consumer_gone = liveness::consumer_gone(self.cfg.liveness(), self.consumer);

        let mut printed = None;
        let (mut outcome, announce) = tokio::select! {
            _ = root.join() => (Outcome::Ok, true),
            _ = expired => {
                debug!(timeout = ?deadline, "run: deadline elapsed");
                (Outcome::Timeout, true)
            }
            _ = signals.recv() => {
                debug!("run: termination signal");
                (Outcome::Interrupted, true)
            }
            _ = self.token.cancelled() => (Outcome::Interrupted, true),
            _ = consumer_gone => (Outcome::Interrupted, false),
            res = &mut printer => {
                printed = Some(res);
                (Outcome::Interrupted, false)
            }
        };

        self.token.cancel();
        if announce {
            sink.finish(Fact::done(outcome));
        } else {
            sink.close();
        }

        let printed = match printed {
            Some(res) => res,
            None if outcome.is_ok() => printer.await,
            None => match time::timeout(self.cfg.grace, &mut printer).await {
                Ok(res) => res,
                Err(_) => {
                    warn!(grace = ?self.cfg.grace, "run: printer did not finish within grace");
                    printer.abort();
                    return Ok(self.settle(outcome));
                }
            },
        };

        match printed {
            Ok(Ok(stats)) => {
                debug!(batches = stats.batches, facts = stats.facts, "run: printer done");
            }
            Ok(Err(e)) => {
                debug!(error = %e, "run: output stream failed");
                outcome = Outcome::Interrupted;
            }
            Err(join) => {
                return Err(RuntimeError::Join {
                    reason: join.to_string(),
                });
            }
        }

        Ok(self.settle(outcome))
    }

    /// Records the outcome once; later calls keep the first value.
    fn settle(&self, outcome: Outcome) -> Outcome {
        *self.outcome.get_or_init(|| outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use tokio::io::AsyncReadExt;

    use crate::error::ProbeError;
    use crate::facts::wire::{self, Snapshot};
    use crate::probes::{ProbeCtx, ProbeFn};

    fn cfg() -> Config {
        Config {
            first_flush: Duration::from_millis(10),
            flush_interval: Duration::from_millis(20),
            liveness_interval: Duration::ZERO,
            ..Config::default()
        }
    }

    async fn read_all(mut reader: tokio::io::DuplexStream) -> String {
        let mut text = String::new();
        reader.read_to_string(&mut text).await.expect("read");
        text
    }

    fn emitter(name: &'static str, value: i64) -> ProbeRef {
        ProbeFn::arc(name, move |ctx: ProbeCtx| async move {
            ctx.emit(name, value);
            Ok::<(), ProbeError>(())
        })
    }

    fn sleeper(ms: u64) -> ProbeRef {
        ProbeFn::arc("sleeper", move |_ctx: ProbeCtx| async move {
            // ignores cancellation on purpose
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<(), ProbeError>(())
        })
    }

    #[tokio::test]
    async fn test_ok_run_ends_with_done_ok() {
        let life = Lifecycle::new(cfg());
        let (writer, reader) = tokio::io::duplex(1 << 16);

        let outcome = life
            .run(vec![emitter("a", 1), emitter("b", 2)], writer)
            .await
            .expect("run");
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(life.outcome(), Some(Outcome::Ok));

        let text = read_all(reader).await;
        let pairs = wire::parse(&text);
        assert_eq!(pairs.last(), Some(&("done", "ok")));
        assert_eq!(pairs.len(), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_bounded_and_announced() {
        let life = Lifecycle::new(Config {
            timeout: Duration::from_millis(50),
            ..cfg()
        });
        let (writer, reader) = tokio::io::duplex(1 << 16);

        let started = Instant::now();
        let outcome = life
            .run(vec![emitter("fast", 1), sleeper(500)], writer)
            .await
            .expect("run");
        let elapsed = started.elapsed();

        assert_eq!(outcome, Outcome::Timeout);
        assert!(elapsed < Duration::from_millis(300), "took {elapsed:?}");
        assert!(life.token().is_cancelled());

        let snap = Snapshot::parse(&read_all(reader).await);
        assert_eq!(snap.outcome(), Some("timeout"));
        assert_eq!(snap.get("fast"), Some("1"));
    }

    #[tokio::test]
    async fn test_external_cancel_interrupts() {
        let life = std::sync::Arc::new(Lifecycle::new(cfg()));
        let (writer, reader) = tokio::io::duplex(1 << 16);

        let canceller = life.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            canceller.cancel();
        });

        let outcome = life.run(vec![sleeper(2_000)], writer).await.expect("run");
        assert_eq!(outcome, Outcome::Interrupted);

        let text = read_all(reader).await;
        assert_eq!(wire::parse(&text).last(), Some(&("done", "interrupted")));
    }

    #[tokio::test]
    async fn test_consumer_gone_interrupts_silently() {
        let life = Lifecycle::new(Config {
            liveness_interval: Duration::from_millis(10),
            ..cfg()
        })
        .with_consumer_check(|| false);
        let (writer, reader) = tokio::io::duplex(1 << 16);

        let outcome = life.run(vec![sleeper(2_000)], writer).await.expect("run");
        assert_eq!(outcome, Outcome::Interrupted);

        let snap = Snapshot::parse(&read_all(reader).await);
        assert!(!snap.is_complete());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_done_is_last_even_with_stragglers() {
        for _ in 0..25 {
            let life = Lifecycle::new(Config {
                timeout: Duration::from_millis(5),
                grace: Duration::from_secs(5),
                ..cfg()
            });
            let (writer, reader) = tokio::io::duplex(1 << 22);

            // ignore cancellation and keep emitting until the sink refuses
            let probes: Vec<ProbeRef> = (0..6)
                .map(|_| {
                    ProbeFn::arc("chatty", |ctx: ProbeCtx| async move {
                        let mut i = 0i64;
                        while ctx.sink().emit("tick", i) && i < 20_000 {
                            i += 1;
                            if i % 32 == 0 {
                                tokio::task::yield_now().await;
                            }
                        }
                        Ok::<(), ProbeError>(())
                    }) as ProbeRef
                })
                .collect();

            let reading = tokio::spawn(read_all(reader));
            let outcome = life.run(probes, writer).await.expect("run");
            assert_eq!(outcome, Outcome::Timeout);

            let text = reading.await.expect("reader");
            let pairs = wire::parse(&text);
            assert_eq!(pairs.last(), Some(&("done", "timeout")));
            assert_eq!(pairs.iter().filter(|(k, _)| *k == "done").count(), 1);
        }
    }
}
