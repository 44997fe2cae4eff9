//! # Facts and their values.
//!
//! A [`Fact`] is immutable once built. Names are not unique: two facts with the
//! same name are both forwarded, consumers keep the last one.
//!
//! ## Value constraint
//! Values are written verbatim after a single tab and must not contain tabs or
//! line breaks. String values are normalized on construction (those characters
//! become spaces), so every encoded fact is exactly one line. Names get the
//! same treatment with `_` as the replacement.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// Name of the terminal fact carrying the run [`Outcome`].
pub const DONE: &str = "done";

/// Typed fact payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactValue {
    /// Free-form text.
    Str(String),
    /// Signed integer (counts, pids, flags).
    Int(i64),
    /// Elapsed time, rendered as `1h2m3s` / `4s` / `150ms`.
    Duration(Duration),
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Str(s) => f.write_str(s),
            FactValue::Int(n) => write!(f, "{n}"),
            FactValue::Duration(d) => fmt_duration(*d, f),
        }
    }
}

fn fmt_duration(d: Duration, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let secs = d.as_secs();
    if secs == 0 {
        return write!(f, "{}ms", d.subsec_millis());
    }
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        write!(f, "{h}h{m}m{s}s")
    } else if m > 0 {
        write!(f, "{m}m{s}s")
    } else {
        write!(f, "{s}s")
    }
}

fn normalize_name(name: Cow<'static, str>) -> Cow<'static, str> {
    if name.is_empty() {
        Cow::Borrowed("_")
    } else if name.contains(['\t', '\n', '\r']) {
        Cow::Owned(name.replace(['\t', '\n', '\r'], "_"))
    } else {
        name
    }
}

fn normalize(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

impl From<&str> for FactValue {
    fn from(s: &str) -> Self {
        FactValue::Str(normalize(s))
    }
}

impl From<String> for FactValue {
    fn from(s: String) -> Self {
        if s.contains(['\t', '\n', '\r']) {
            FactValue::Str(normalize(&s))
        } else {
            FactValue::Str(s)
        }
    }
}

impl From<&String> for FactValue {
    fn from(s: &String) -> Self {
        FactValue::from(s.as_str())
    }
}

impl From<Duration> for FactValue {
    fn from(d: Duration) -> Self {
        FactValue::Duration(d)
    }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(impl From<$t> for FactValue {
            fn from(n: $t) -> Self {
                FactValue::Int(n as i64)
            }
        })*
    };
}

int_value!(i32, i64, u32, usize);

/// One named, typed unit of collected information.
///
/// # Example
/// ```
/// use promptline::Fact;
///
/// let fact = Fact::new("vcs_br", "main");
/// assert_eq!(fact.to_string(), "vcs_br\tmain");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    name: Cow<'static, str>,
    value: FactValue,
}

impl Fact {
    /// Builds a fact.
    ///
    /// Tabs and line breaks in `name` become `_`, and an empty name is written as `_`,
    /// so the encoded fact always splits back into the same name and value.
    pub fn new(name: impl Into<Cow<'static, str>>, value: impl Into<FactValue>) -> Self {
        Self {
            name: normalize_name(name.into()),
            value: value.into(),
        }
    }

    /// Builds the terminal `done` fact.
    pub fn done(outcome: Outcome) -> Self {
        Self::new(DONE, outcome.as_str())
    }

    /// Fact name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fact value.
    pub fn value(&self) -> &FactValue {
        &self.value
    }

    /// True for the terminal `done` fact.
    pub fn is_done(&self) -> bool {
        self.name == DONE
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.value)
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every probe finished before any deadline or signal.
    Ok,
    /// The run deadline elapsed first.
    Timeout,
    /// A termination signal arrived, the consumer went away, or output failed.
    Interrupted,
}

impl Outcome {
    /// Wire value of the `done` fact.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Timeout => "timeout",
            Outcome::Interrupted => "interrupted",
        }
    }

    /// True only for [`Outcome::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_rendering() {
        let render = |d: Duration| FactValue::from(d).to_string();
        assert_eq!(render(Duration::from_millis(150)), "150ms");
        assert_eq!(render(Duration::from_secs(4)), "4s");
        assert_eq!(render(Duration::from_secs(65)), "1m5s");
        assert_eq!(render(Duration::from_secs(3723)), "1h2m3s");
        assert_eq!(render(Duration::from_secs(120)), "2m0s");
    }

    #[test]
    fn test_string_values_are_single_line() {
        let fact = Fact::new("vcs_br", "feat\tx\nmore");
        assert_eq!(fact.to_string(), "vcs_br\tfeat x more");

        let fact = Fact::new("wd", String::from("~/src"));
        assert_eq!(fact.value(), &FactValue::Str("~/src".into()));
    }

    #[test]
    fn test_names_are_single_token() {
        let fact = Fact::new("bad\tname\n", "v");
        assert_eq!(fact.name(), "bad_name_");
        assert_eq!(fact.to_string(), "bad_name_\tv");

        let fact = Fact::new(String::new(), 1);
        assert_eq!(fact.to_string(), "_\t1");

        let fact = Fact::new("vcs", "git");
        assert!(matches!(fact.name, Cow::Borrowed("vcs")));
    }

    #[test]
    fn test_int_values() {
        assert_eq!(Fact::new("pid", 42u32).to_string(), "pid\t42");
        assert_eq!(Fact::new("vcs_dirty", 0).to_string(), "vcs_dirty\t0");
        assert_eq!(Fact::new("n", 3usize).value(), &FactValue::Int(3));
    }

    #[test]
    fn test_done_fact() {
        let fact = Fact::done(Outcome::Timeout);
        assert!(fact.is_done());
        assert_eq!(fact.to_string(), "done\ttimeout");
        assert!(!Fact::new("vcs", "git").is_done());
    }
}
