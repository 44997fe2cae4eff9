//! # Staggered printer: the only writer of the output stream.
//!
//! Drains the [`FactStream`] and writes facts in batches so the renderer sees
//! a steadily growing picture without one write per fact.
//!
//! ## State machine
//! ```text
//!            fact                    timer fired
//!   Idle ─────────────► Buffering ─────────────► Flushing ──► Idle
//!    │ ▲                  │  ▲ fact                 (one write + flush)
//!    │ └──── timer fired ─┘  └──┘
//!    │        (Idle: nothing written, timer re-armed)
//!    │
//!    └─ stream closed (any state) ──► final flush ──► done
//! ```
//!
//! ## Rules
//! - The first timer fires after `first_flush`, every later one after `flush_interval`.
//! - A timer firing while Idle writes nothing: no empty batches.
//! - The final flush runs exactly once, when the stream closes, even if nothing is buffered.
//! - A batch is written with a single `write_all` followed by `flush`, so batches never interleave.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{self, Instant};
use tracing::debug;

use crate::config::Config;
use crate::facts::{Fact, FactStream, wire};

/// Printer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing buffered.
    Idle,
    /// At least one fact waiting for the next timer.
    Buffering,
    /// A batch was taken and is being written.
    Flushing,
}

/// Buffer plus phase; kept free of I/O so the transitions are easy to check.
#[derive(Debug)]
struct Batcher {
    phase: Phase,
    buf: Vec<Fact>,
}

impl Batcher {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            buf: Vec::new(),
        }
    }

    fn push(&mut self, fact: Fact) {
        self.buf.push(fact);
        self.phase = Phase::Buffering;
    }

    /// Timer fired: hands out the pending batch, or `None` while Idle.
    fn on_timer(&mut self) -> Option<Vec<Fact>> {
        match self.phase {
            Phase::Idle | Phase::Flushing => None,
            Phase::Buffering => {
                self.phase = Phase::Flushing;
                Some(std::mem::take(&mut self.buf))
            }
        }
    }

    /// The taken batch hit the stream.
    fn flushed(&mut self) {
        self.phase = if self.buf.is_empty() {
            Phase::Idle
        } else {
            Phase::Buffering
        };
    }

    /// Stream closed: whatever is left, possibly nothing.
    fn finish(&mut self) -> Vec<Fact> {
        self.phase = Phase::Idle;
        std::mem::take(&mut self.buf)
    }
}

/// Counters reported when the printer stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PrintStats {
    /// Non-empty batches written, the final one included.
    pub batches: usize,
    /// Facts written.
    pub facts: usize,
}

/// Batching consumer of the fact stream.
#[derive(Debug, Clone, Copy)]
pub struct StaggeredPrinter {
    first_flush: Duration,
    flush_interval: Duration,
}

impl StaggeredPrinter {
    /// Creates a printer with explicit pacing.
    pub fn new(first_flush: Duration, flush_interval: Duration) -> Self {
        Self {
            first_flush,
            flush_interval,
        }
    }

    /// Creates a printer paced by `cfg.first_flush` / `cfg.flush_interval`.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.first_flush, cfg.flush_interval)
    }

    /// Drains `stream` into `out` until the stream closes.
    ///
    /// Returns the first write error; facts still in flight are then dropped.
    pub async fn run<W>(self, mut stream: FactStream, mut out: W) -> io::Result<PrintStats>
    where
        W: AsyncWrite + Unpin,
    {
        let mut batcher = Batcher::new();
        let mut stats = PrintStats::default();

        let timer = time::sleep(self.first_flush);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                msg = stream.recv() => match msg {
                    Some(fact) => batcher.push(fact),
                    None => break,
                },
                () = &mut timer => {
                    if let Some(batch) = batcher.on_timer() {
                        write_batch(&mut out, &batch, &mut stats).await?;
                        batcher.flushed();
                    }
                    timer.as_mut().reset(Instant::now() + self.flush_interval);
                }
            }
        }

        let rest = batcher.finish();
        write_batch(&mut out, &rest, &mut stats).await?;
        debug!(batches = stats.batches, facts = stats.facts, "printer stopped");
        Ok(stats)
    }
}

async fn write_batch<W>(out: &mut W, batch: &[Fact], stats: &mut PrintStats) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !batch.is_empty() {
        out.write_all(wire::encode_batch(batch).as_bytes()).await?;
        stats.batches += 1;
        stats.facts += batch.len();
    }
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::AsyncReadExt;

    use crate::facts::FactSink;

    fn fast() -> StaggeredPrinter {
        StaggeredPrinter::new(Duration::from_millis(20), Duration::from_millis(40))
    }

    #[test]
    fn test_batcher_never_hands_out_empty_batch() {
        let mut b = Batcher::new();
        assert_eq!(b.on_timer(), None);
        assert_eq!(b.phase, Phase::Idle);

        b.push(Fact::new("a", 1));
        assert_eq!(b.phase, Phase::Buffering);
        assert_eq!(b.on_timer(), Some(vec![Fact::new("a", 1)]));
        assert_eq!(b.phase, Phase::Flushing);
        b.flushed();
        assert_eq!(b.phase, Phase::Idle);
        assert_eq!(b.on_timer(), None);
        assert!(b.finish().is_empty());
    }

    #[tokio::test]
    async fn test_quick_close_yields_single_final_batch() {
        let (sink, stream) = FactSink::channel();
        let (writer, mut reader) = tokio::io::duplex(4096);

        sink.emit("a", 1);
        sink.emit("b", "x");
        sink.close();

        let stats = fast().run(stream, writer).await.expect("printer");
        assert_eq!(stats, PrintStats { batches: 1, facts: 2 });

        let mut text = String::new();
        reader.read_to_string(&mut text).await.expect("read");
        assert_eq!(text, "a\t1\nb\tx\n\n");
    }

    #[tokio::test]
    async fn test_idle_timers_write_nothing() {
        let (sink, stream) = FactSink::channel();
        let (writer, mut reader) = tokio::io::duplex(4096);

        let printer = tokio::spawn(fast().run(stream, writer));
        time::sleep(Duration::from_millis(150)).await;
        sink.close();

        let stats = printer.await.expect("join").expect("printer");
        assert_eq!(stats, PrintStats::default());

        let mut text = String::new();
        reader.read_to_string(&mut text).await.expect("read");
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_facts_are_batched_by_timer() {
        let (sink, stream) = FactSink::channel();
        let (writer, mut reader) = tokio::io::duplex(4096);
        let printer = tokio::spawn(fast().run(stream, writer));

        sink.emit("first", 1);
        time::sleep(Duration::from_millis(120)).await;
        sink.emit("second", 2);
        sink.emit("third", 3);
        sink.close();

        let stats = printer.await.expect("join").expect("printer");
        assert_eq!(stats, PrintStats { batches: 2, facts: 3 });

        let mut text = String::new();
        reader.read_to_string(&mut text).await.expect("read");
        assert_eq!(text, "first\t1\n\nsecond\t2\nthird\t3\n\n");
    }

    #[tokio::test]
    async fn test_no_fact_lost_under_bursty_producers() {
        let (sink, stream) = FactSink::channel();
        let (writer, mut reader) = tokio::io::duplex(1 << 20);
        let printer = tokio::spawn(fast().run(stream, writer));

        let mut producers = Vec::new();
        for p in 0..5 {
            let sink = sink.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..40 {
                    sink.emit(format!("p{p}"), i);
                    if i % 10 == 0 {
                        time::sleep(Duration::from_millis(15)).await;
                    }
                }
            }));
        }
        for p in producers {
            p.await.expect("producer");
        }
        sink.close();

        let stats = printer.await.expect("join").expect("printer");
        assert_eq!(stats.facts, 200);

        let mut text = String::new();
        reader.read_to_string(&mut text).await.expect("read");
        let pairs = wire::parse(&text);
        assert_eq!(pairs.len(), 200);
        assert!(!text.contains("\n\n\n"), "empty batch written");
    }

    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let (sink, stream) = FactSink::channel();
        sink.emit("a", 1);
        sink.close();

        let err = fast().run(stream, BrokenPipe).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
