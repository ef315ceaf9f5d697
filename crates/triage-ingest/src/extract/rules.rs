//! Ordered first-match rule chains.
//!
//! Each extractor is a list of named pure functions tried in order; the first
//! one that returns a value decides the field.

use tracing::trace;

/// A single extraction rule.
pub type Rule<T> = fn(&str) -> Option<T>;

pub struct RuleChain<T> {
    field: &'static str,
    rules: Vec<(&'static str, Rule<T>)>,
}

impl<T> RuleChain<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            rules: Vec::new(),
        }
    }

    /// Append a rule. Earlier rules take priority.
    pub fn rule(mut self, name: &'static str, rule: Rule<T>) -> Self {
        self.rules.push((name, rule));
        self
    }

    /// Run rules in order, returning the winning rule's name and value.
    pub fn first_match(&self, text: &str) -> Option<(&'static str, T)> {
        for (name, rule) in &self.rules {
            if let Some(value) = rule(text) {
                trace!("{}: matched rule '{}'", self.field, name);
                return Some((*name, value));
            }
        }
        trace!("{}: no rule matched", self.field);
        None
    }

    pub fn resolve(&self, text: &str) -> Option<T> {
        self.first_match(text).map(|(_, value)| value)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(name, _)| *name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(text: &str) -> Option<u32> {
        text.split_whitespace().find_map(|w| w.parse().ok())
    }

    fn length(text: &str) -> Option<u32> {
        Some(text.len() as u32)
    }

    #[test]
    fn test_first_match_wins() {
        let chain = RuleChain::new("n").rule("digits", digits).rule("length", length);
        assert_eq!(chain.first_match("ward 12"), Some(("digits", 12)));
        assert_eq!(chain.first_match("no numbers"), Some(("length", 10)));
        assert_eq!(chain.rule_names(), vec!["digits", "length"]);
    }

    #[test]
    fn test_empty_chain() {
        let chain: RuleChain<u32> = RuleChain::new("n");
        assert_eq!(chain.resolve("anything"), None);
    }
}
