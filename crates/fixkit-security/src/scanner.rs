use crate::rules::RuleSet;
use fixkit_plugins::PluginDescriptor;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Result of scanning one command on behalf of a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    /// `statement` is the exact candidate that matched, which may be a
    /// fragment of the command or a line from a referenced script.
    Flagged {
        statement: String,
        description: String,
    },
}

struct CompiledRule {
    description: String,
    variations: Vec<Regex>,
}

/// Pattern-matches plugin commands against the malicious rule set before
/// they are allowed to run.
///
/// This is a heuristic tripwire over literal text, not a sandbox: it
/// inspects the command string and any `.sh`/`.bash` scripts the command
/// references inside the plugin directory. Rules are compiled once at
/// construction; variations that fail to compile are logged and dropped,
/// never aborting a scan.
pub struct CommandScanner {
    rules: Vec<CompiledRule>,
    script_reference: Regex,
}

impl CommandScanner {
    pub fn new(rules: &RuleSet) -> Self {
        let compiled = rules
            .rules()
            .iter()
            .map(|rule| CompiledRule {
                description: rule.description.clone(),
                variations: rule
                    .variations
                    .iter()
                    .filter_map(|pattern| match Regex::new(pattern) {
                        Ok(regex) => Some(regex),
                        Err(e) => {
                            warn!("skipping malformed scan pattern '{pattern}': {e}");
                            None
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            rules: compiled,
            script_reference: Regex::new(r"\S+\.(sh|bash)").expect("script reference pattern"),
        }
    }

    /// Scan `command` as `plugin` would run it. Rule order is priority
    /// order; the first variation to match any candidate decides the
    /// verdict.
    pub fn scan(&self, plugin: &PluginDescriptor, command: &str) -> ScanVerdict {
        let candidates = self.collect_candidates(&plugin.path, command);

        for rule in &self.rules {
            for variation in &rule.variations {
                for candidate in &candidates {
                    if variation.is_match(candidate) {
                        return ScanVerdict::Flagged {
                            statement: candidate.clone(),
                            description: rule.description.clone(),
                        };
                    }
                }
            }
        }

        ScanVerdict::Clean
    }

    /// Build the candidate list: each `;`-separated piece, the whole
    /// command, then every line of every referenced script, normalized
    /// (trimmed, comments and near-empty lines dropped, first-seen order
    /// deduplicated).
    fn collect_candidates(&self, plugin_dir: &Path, command: &str) -> Vec<String> {
        let mut raw: Vec<String> = command.split(';').map(str::to_string).collect();
        raw.push(command.to_string());

        for reference in self.script_reference.find_iter(command) {
            let script = plugin_dir.join(reference.as_str());
            match std::fs::read_to_string(&script) {
                Ok(content) => raw.extend(content.lines().map(str::to_string)),
                Err(e) => {
                    debug!("script reference {} not scanned: {e}", script.display());
                }
            }
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for part in &raw {
            let trimmed = part.trim();
            if trimmed.starts_with('#') || trimmed.chars().count() < 2 {
                continue;
            }
            if seen.insert(trimmed.to_string()) {
                candidates.push(trimmed.to_string());
            }
        }

        candidates
    }
}
