//! # Line protocol between the printer and a prompt renderer.
//!
//! ```text
//! pid<TAB>4242
//! vcs<TAB>git
//! <blank line: end of batch>
//! vcs_br<TAB>main
//! done<TAB>ok
//! <blank line: end of batch>
//! ```
//!
//! Each line parses back into one `(name, value)` pair by splitting on the first
//! tab. Batch boundaries only pace the output; a reader may parse a partial
//! stream and treat later values of the same name as overriding earlier ones.

use std::collections::HashMap;

use super::fact::{DONE, Fact};

/// Encodes one batch: every fact on its own line, then one blank line.
///
/// Returns an empty string for an empty batch.
pub fn encode_batch(facts: &[Fact]) -> String {
    if facts.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(facts.len() * 24);
    for fact in facts {
        out.push_str(&fact.to_string());
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Splits one protocol line on its first tab.
///
/// Blank lines (batch terminators) and lines without a tab yield `None`.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    line.split_once('\t')
}

/// Parses a whole (possibly partial) stream into `(name, value)` pairs in order.
pub fn parse(stream: &str) -> Vec<(&str, &str)> {
    stream.lines().filter_map(parse_line).collect()
}

/// Last-value-wins view of a protocol stream, as a renderer would keep it.
///
/// # Example
/// ```
/// use promptline::wire::Snapshot;
///
/// let snap = Snapshot::parse("vcs\tgit\nvcs_br\tmain\n\ndone\tok\n\n");
/// assert_eq!(snap.get("vcs_br"), Some("main"));
/// assert_eq!(snap.outcome(), Some("ok"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    values: HashMap<String, String>,
}

impl Snapshot {
    /// Builds a snapshot from raw protocol text.
    pub fn parse(stream: &str) -> Self {
        let values = parse(stream)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { values }
    }

    /// Latest value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// True when `name` was reported at least once.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Value of the terminal `done` fact, if the stream got that far.
    pub fn outcome(&self) -> Option<&str> {
        self.get(DONE)
    }

    /// True once the terminal fact was seen.
    pub fn is_complete(&self) -> bool {
        self.contains(DONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_encode_batch_layout() {
        let batch = vec![Fact::new("vcs", "git"), Fact::new("vcs_dirty", 1)];
        assert_eq!(encode_batch(&batch), "vcs\tgit\nvcs_dirty\t1\n\n");
        assert_eq!(encode_batch(&[]), "");
    }

    #[test]
    fn test_every_line_parses_back() {
        let batch = vec![
            Fact::new("wd", "~/src/my project"),
            Fact::new("ds", Duration::from_secs(61)),
            Fact::new("pid_chain", r#"[{"name":"zsh"}]"#),
            Fact::new("odd", "a\tb"),
        ];
        let text = encode_batch(&batch);
        let pairs = parse(&text);
        assert_eq!(pairs.len(), batch.len());
        for (fact, (name, value)) in batch.iter().zip(pairs) {
            assert_eq!(fact.name(), name);
            assert_eq!(fact.value().to_string(), value);
        }
    }

    #[test]
    fn test_snapshot_last_value_wins() {
        let snap = Snapshot::parse("vcs_dirty\t0\n\nvcs_dirty\t1\n\n");
        assert_eq!(snap.get("vcs_dirty"), Some("1"));
        assert!(!snap.is_complete());
        assert_eq!(snap.get("missing"), None);
    }

    #[test]
    fn test_partial_stream_is_usable() {
        let snap = Snapshot::parse("vcs\tgit\nvcs_b");
        assert_eq!(snap.get("vcs"), Some("git"));
        assert!(!snap.contains("vcs_b"));
    }
}
