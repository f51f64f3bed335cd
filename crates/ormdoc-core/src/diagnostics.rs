//! Advisory diagnostics collected while processing and checking a model.
//!
//! Soft failures never stop processing. Each one is recorded here and
//! handed back to the caller together with the successful result.

use serde::Serialize;

/// A single warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Name of the rule that produced the warning (e.g. `field.length`).
    pub rule: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// Collected warnings of one processing or checking pass.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    echo: bool,
}

impl Diagnostics {
    /// Create an empty collection that also logs every warning.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            echo: true,
        }
    }

    /// Create an empty collection that only logs at debug level.
    pub fn quiet() -> Self {
        Self {
            entries: Vec::new(),
            echo: false,
        }
    }

    /// Record a warning.
    pub fn warn(&mut self, rule: &'static str, message: impl Into<String>) {
        let message = message.into();
        if self.echo {
            tracing::warn!(rule, "{}", message);
        } else {
            tracing::debug!(rule, "{}", message);
        }
        self.entries.push(Diagnostic { rule, message });
    }

    /// All recorded warnings in order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Warnings produced by one rule.
    pub fn by_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.rule == rule)
    }

    /// Check if any warning mentions the given text.
    pub fn mentions(&self, text: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(text))
    }

    /// Number of warnings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no warning was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append the warnings of another pass.
    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_and_filter() {
        let mut diagnostics = Diagnostics::quiet();
        diagnostics.warn("field.length", "The field name in class A has no length");
        diagnostics.warn("class.primarykey", "The class A has no primary key");

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.by_rule("field.length").count(), 1);
        assert!(diagnostics.mentions("no primary key"));
        assert!(!diagnostics.mentions("locking"));
    }

    #[test]
    fn test_merge() {
        let mut first = Diagnostics::quiet();
        first.warn("a", "one");
        let mut second = Diagnostics::quiet();
        second.warn("b", "two");

        first.merge(second);
        let rules: Vec<_> = first.entries().iter().map(|d| d.rule).collect();
        assert_eq!(rules, vec!["a", "b"]);
    }
}
