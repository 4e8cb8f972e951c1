//! Violations and the aggregated report. Ordering is part of the contract:
//! evaluating the same input twice yields byte-identical reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deny blocks the pipeline; warn is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Deny,
    Warn,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Deny => write!(f, "deny"),
            Severity::Warn => write!(f, "warn"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub severity: Severity,
    pub address: String,
    pub message: String,
}

impl Violation {
    pub fn deny(rule: &str, address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: Severity::Deny,
            address: address.into(),
            message: message.into(),
        }
    }

    pub fn warn(rule: &str, address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: Severity::Warn,
            address: address.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Deny,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub violations: Vec<Violation>,
}

impl Report {
    /// Sorts by severity, then address, then rule, then message, and drops
    /// exact duplicates.
    pub fn from_violations(mut violations: Vec<Violation>) -> Self {
        violations.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then_with(|| a.address.cmp(&b.address))
                .then_with(|| a.rule.cmp(&b.rule))
                .then_with(|| a.message.cmp(&b.message))
        });
        violations.dedup();
        Self { violations }
    }

    pub fn verdict(&self) -> Verdict {
        if self.violations.iter().any(|v| v.severity == Severity::Deny) {
            Verdict::Deny
        } else if self.violations.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Warn
        }
    }

    pub fn denials(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity == Severity::Deny)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity == Severity::Warn)
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Merge two reports, re-establishing order and uniqueness.
    pub fn merged(self, other: Report) -> Report {
        let mut all = self.violations;
        all.extend(other.violations);
        Report::from_violations(all)
    }
}
