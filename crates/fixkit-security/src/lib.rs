pub mod rules;
pub mod scanner;

pub use rules::{MaliciousRule, RuleSet};
pub use scanner::{CommandScanner, ScanVerdict};
