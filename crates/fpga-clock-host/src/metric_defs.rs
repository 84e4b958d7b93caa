//! Metric declarations.
//!
//! No exporter is installed by the binary; without a recorder the counters
//! are no-ops. Embedders that install one get named, described counters.

use metrics::{describe_counter, Unit};

/// A counter declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Metric name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            description: "",
            labels: &[],
        }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        describe_counter!(self.name, Unit::Count, self.description);
    }
}

/// Replies written to the board.
pub const REPLIES: Metric = Metric::counter("fpga_clock.replies")
    .with_description("Replies written to the board")
    .with_labels(&["kind"]);

/// Command bytes outside the known set.
pub const UNKNOWN_COMMANDS: Metric = Metric::counter("fpga_clock.unknown_commands")
    .with_description("Command bytes that were not answered");

/// Link faults that ended a session.
pub const LINK_FAULTS: Metric = Metric::counter("fpga_clock.link_faults")
    .with_description("Serial link faults that ended the session");

/// All metric declarations.
pub const ALL: &[Metric] = &[REPLIES, UNKNOWN_COMMANDS, LINK_FAULTS];

/// Describe every metric. Call once at startup.
pub fn describe_metrics() {
    for metric in ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_unique() {
        let names: HashSet<_> = ALL.iter().map(|m| m.name).collect();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_all_described() {
        for metric in ALL {
            assert!(!metric.description.is_empty(), "{} has no description", metric.name);
        }
    }

    #[test]
    fn test_metric_names() {
        let names: Vec<_> = ALL.iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            [
                "fpga_clock.replies",
                "fpga_clock.unknown_commands",
                "fpga_clock.link_faults",
            ]
        );
    }

    #[test]
    fn test_only_replies_are_labelled() {
        assert_eq!(REPLIES.labels, ["kind"]);
        assert!(UNKNOWN_COMMANDS.labels.is_empty());
        assert!(LINK_FAULTS.labels.is_empty());
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
