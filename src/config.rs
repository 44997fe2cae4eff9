//! # Pipeline configuration.
//!
//! Provides [`Config`] centralized settings for one collection run.
//!
//! Config is used by:
//! 1. **Lifecycle**: `Lifecycle::new(config)` (deadline, grace, liveness cadence)
//! 2. **Serializer**: first-flush and steady flush intervals
//! 3. **Shell**: per-call deadline of every external command
//!
//! ## Sentinel values
//! - `timeout = 0s` → no run deadline
//! - `liveness_interval = 0s` → consumer liveness is not checked

use std::time::Duration;

/// Runtime configuration for a collection run.
///
/// ## Field semantics
/// - `first_flush`: delay before the first batch is written
/// - `flush_interval`: delay between subsequent batches
/// - `timeout`: whole-run deadline (`0s` = none)
/// - `grace`: how long the serializer may take for its final flush after cancellation
/// - `exec_timeout`: per external command deadline
/// - `liveness_interval`: how often stdout is checked for a vanished consumer (`0s` = never)
#[derive(Clone, Debug)]
pub struct Config {
    /// Delay before the first flush. Kept short so the prompt fills in quickly.
    pub first_flush: Duration,

    /// Delay between flushes after the first one.
    pub flush_interval: Duration,

    /// Whole-run deadline.
    ///
    /// When it elapses the root token is cancelled, `done=timeout` is emitted and
    /// the run ends with a non-zero exit, regardless of probes still running.
    pub timeout: Duration,

    /// Upper bound on waiting for the serializer's final flush once the run is over.
    pub grace: Duration,

    /// Deadline applied to every external command.
    pub exec_timeout: Duration,

    /// Period of the consumer liveness check.
    pub liveness_interval: Duration,
}

impl Config {
    /// Returns the run deadline as an `Option`.
    ///
    /// - `None` → run until every probe finishes
    /// - `Some(d)` → give up after `d`
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the liveness check period as an `Option`.
    #[inline]
    pub fn liveness(&self) -> Option<Duration> {
        if self.liveness_interval == Duration::ZERO {
            None
        } else {
            Some(self.liveness_interval)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `first_flush = 20ms`
    /// - `flush_interval = 100ms`
    /// - `timeout = 0s` (no deadline)
    /// - `grace = 50ms`
    /// - `exec_timeout = 10s`
    /// - `liveness_interval = 100ms`
    fn default() -> Self {
        Self {
            first_flush: Duration::from_millis(20),
            flush_interval: Duration::from_millis(100),
            timeout: Duration::ZERO,
            grace: Duration::from_millis(50),
            exec_timeout: Duration::from_secs(10),
            liveness_interval: Duration::from_millis(100),
        }
    }
}

/// Parses a duration flag value.
///
/// Accepts `<n>ms`, `<n>s`, `<n>m`, `<n>h` or a bare integer of milliseconds.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use promptline::parse_duration;
///
/// assert_eq!(parse_duration("50ms"), Ok(Duration::from_millis(50)));
/// assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
/// assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
/// ```
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let n: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration {raw:?}"))?;

    match unit {
        "" | "ms" => Ok(Duration::from_millis(n)),
        "s" => Ok(Duration::from_secs(n)),
        "m" => Ok(Duration::from_secs(n.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(n.saturating_mul(3600))),
        _ => Err(format!("invalid duration unit {unit:?} in {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_means_no_deadline() {
        let cfg = Config::default();
        assert_eq!(cfg.deadline(), None);

        let cfg = Config {
            timeout: Duration::from_millis(50),
            ..Config::default()
        };
        assert_eq!(cfg.deadline(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_zero_liveness_disables_check() {
        let cfg = Config {
            liveness_interval: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.liveness(), None);
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("150"), Ok(Duration::from_millis(150)));
        assert_eq!(parse_duration("3m"), Ok(Duration::from_secs(180)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("").is_err());
    }
}
