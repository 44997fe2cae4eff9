//! # Fact sink shared by all probes.
//!
//! [`FactSink`] is a thin wrapper around an unbounded [`tokio::sync::mpsc`] channel
//! that supports an explicit [`close`](FactSink::close).
//!
//! ## Architecture
//! ```text
//! Producers (many):                  Consumer (one):
//!   probe 1 ──┐
//!   probe 2 ──┼──────► FactSink ─────► FactStream ────► Printer
//!   probe N ──┤     (mpsc, unbounded)
//!   group   ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking emit**: `emit()` never waits on the consumer.
//! - **Per-producer FIFO**: facts from one producer arrive in call order.
//! - **Closed is final**: after `close()`, `emit()` is a silent no-op and the
//!   stream yields every fact accepted before closure, then `None`.
//! - [`finish`](FactSink::finish) sends its fact and closes under one write lock,
//!   so no concurrent `emit()` can land after that fact.

use std::borrow::Cow;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use super::fact::{Fact, FactValue};

/// Cloneable emitting end of the fact channel.
///
/// All clones share one sender; closing through any clone closes all of them.
#[derive(Clone, Debug)]
pub struct FactSink {
    tx: Arc<RwLock<Option<mpsc::UnboundedSender<Fact>>>>,
}

/// Receiving end of the fact channel, owned by the printer.
#[derive(Debug)]
pub struct FactStream {
    rx: mpsc::UnboundedReceiver<Fact>,
}

impl FactSink {
    /// Creates a connected sink/stream pair.
    pub fn channel() -> (FactSink, FactStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = FactSink {
            tx: Arc::new(RwLock::new(Some(tx))),
        };
        (sink, FactStream { rx })
    }

    /// Emits one fact. Returns `false` when the sink is closed or the consumer is gone.
    pub fn emit(&self, name: impl Into<Cow<'static, str>>, value: impl Into<FactValue>) -> bool {
        self.send(Fact::new(name, value))
    }

    /// Emits a pre-built fact.
    pub fn send(&self, fact: Fact) -> bool {
        let guard = self.tx.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(tx) => tx.send(fact).is_ok(),
            None => false,
        }
    }

    /// Closes the sink. Idempotent.
    ///
    /// Waits for in-flight `emit` calls, so nothing is accepted after this returns.
    pub fn close(&self) {
        let mut guard = self.tx.write().unwrap_or_else(|e| e.into_inner());
        guard.take();
    }

    /// Sends `fact` as the very last fact and closes the sink.
    ///
    /// Concurrent `emit` calls either complete before `fact` is queued or are
    /// rejected. Returns `false` if the sink was already closed.
    pub fn finish(&self, fact: Fact) -> bool {
        let mut guard = self.tx.write().unwrap_or_else(|e| e.into_inner());
        match guard.take() {
            Some(tx) => tx.send(fact).is_ok(),
            None => false,
        }
    }

    /// True once [`close`](Self::close) was called or the consumer dropped its stream.
    pub fn is_closed(&self) -> bool {
        let guard = self.tx.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().is_none_or(|tx| tx.is_closed())
    }
}

impl FactStream {
    /// Receives the next fact, `None` once the sink is closed and drained.
    pub async fn recv(&mut self) -> Option<Fact> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let (sink, mut stream) = FactSink::channel();
        assert!(sink.emit("a", 1));
        assert!(sink.emit("b", "two"));
        sink.close();

        assert_eq!(stream.recv().await, Some(Fact::new("a", 1)));
        assert_eq!(stream.recv().await, Some(Fact::new("b", "two")));
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn test_emit_after_close_is_noop() {
        let (sink, mut stream) = FactSink::channel();
        let clone = sink.clone();
        sink.close();
        sink.close();

        assert!(!clone.emit("late", 1));
        assert!(clone.is_closed());
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_finish_is_last_despite_busy_producers() {
        for _ in 0..50 {
            let (sink, mut stream) = FactSink::channel();
            let mut handles = Vec::new();
            for p in 0..4 {
                let sink = sink.clone();
                handles.push(tokio::spawn(async move {
                    let mut i = 0i64;
                    while sink.emit(format!("p{p}"), i) {
                        i += 1;
                        if i % 64 == 0 {
                            tokio::task::yield_now().await;
                        }
                    }
                }));
            }
            tokio::task::yield_now().await;

            assert!(sink.finish(Fact::done(crate::facts::Outcome::Timeout)));
            assert!(!sink.finish(Fact::done(crate::facts::Outcome::Ok)));
            for h in handles {
                h.await.expect("producer panicked");
            }

            let mut last = None;
            while let Some(fact) = stream.recv().await {
                last = Some(fact);
            }
            assert_eq!(last, Some(Fact::done(crate::facts::Outcome::Timeout)));
        }
    }

    #[tokio::test]
    async fn test_emit_after_consumer_dropped() {
        let (sink, stream) = FactSink::channel();
        drop(stream);
        assert!(!sink.emit("orphan", 1));
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn test_concurrent_producers_keep_per_producer_order() {
        let (sink, mut stream) = FactSink::channel();
        let mut handles = Vec::new();
        for p in 0..4 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    sink.emit(format!("p{p}"), i);
                    tokio::task::yield_now().await;
                }
            }));
        }
        for h in handles {
            h.await.expect("producer panicked");
        }
        sink.close();

        let mut last = [-1i64; 4];
        let mut total = 0;
        while let Some(fact) = stream.recv().await {
            let p: usize = fact.name()[1..].parse().expect("producer index");
            let FactValue::Int(i) = fact.value() else {
                panic!("unexpected value {:?}", fact.value());
            };
            assert!(*i > last[p], "producer {p} out of order");
            last[p] = *i;
            total += 1;
        }
        assert_eq!(total, 200);
    }
}
