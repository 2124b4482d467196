use serde::{Deserialize, Serialize};

/// One suspicious-command rule: a human-readable description of the harm
/// and the regex variations that detect it. Rule order is priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaliciousRule {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub variations: Vec<String>,
}

/// Ordered collection of rules. Empty means scanning is disabled and
/// every command passes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<MaliciousRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<MaliciousRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[MaliciousRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append `other` after the existing rules, keeping priority with the
    /// rules already present.
    pub fn extend(&mut self, other: RuleSet) {
        self.rules.extend(other.rules);
    }
}

impl FromIterator<MaliciousRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = MaliciousRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
