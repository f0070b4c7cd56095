use std::collections::BTreeMap;

use colored::Colorize;

use crate::severity::Severity;

/// What a check hands back: everything except the location, which the
/// dispatcher fills in from the node and the per-file metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub check_id: String,
    pub message: String,
}

impl Finding {
    pub fn new(severity: Severity, check_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            check_id: check_id.into(),
            message: message.into(),
        }
    }
}

/// A finding pinned to a file and line, ready to print.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindingRecord {
    pub filename: String,
    pub lineno: u32,
    pub severity: Severity,
    pub check_id: String,
    pub message: String,
}

impl FindingRecord {
    pub fn print(&self) {
        let letter = match self.severity {
            Severity::Convention => "C".blue(),
            Severity::Style => "S".cyan(),
            Severity::Warning => "W".yellow(),
            Severity::Error => "E".red(),
            Severity::Fatal => "F".red().bold(),
        };
        println!(
            "{}:{}: ({}): {} [{}]",
            self.filename, self.lineno, letter, self.message, self.check_id
        );
    }
}

/// Per-check issue counts for the end-of-run summary.
#[derive(Debug, Default)]
pub struct IssueCounts {
    counts: BTreeMap<String, usize>,
}

impl IssueCounts {
    pub fn record(&mut self, check_id: &str) {
        *self.counts.entry(check_id.to_owned()).or_insert(0) += 1;
    }

    pub fn count(&self, check_id: &str) -> usize {
        self.counts.get(check_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn display_summary(&self) {
        println!("Found the following issue counts:");
        for (check_id, count) in &self.counts {
            println!("\t{check_id}: {count}");
        }
    }
}
