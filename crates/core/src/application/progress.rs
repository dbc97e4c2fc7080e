// Free-Text Progress Triggers
//
// The worker's unstructured stdout is matched against this table to infer
// the current phase. The mapping is data, not control flow: adding a trigger
// is a table edit, and the table is testable on its own.

use crate::domain::JobStatus;

/// One (substring -> phase) mapping
#[derive(Debug)]
pub struct ProgressTrigger {
    /// Substring looked for in the raw stdout line
    pub needle: &'static str,
    /// Phase the job moves into when the trigger fires
    pub phase: JobStatus,
    /// Human-readable message shown to polling clients
    pub message: &'static str,
}

/// Trigger table, checked in order; first match wins
pub const PROGRESS_TRIGGERS: &[ProgressTrigger] = &[
    ProgressTrigger {
        needle: "Launching browser",
        phase: JobStatus::LaunchingBrowser,
        message: "Launching browser",
    },
    ProgressTrigger {
        needle: "Logging in",
        phase: JobStatus::LoggingIn,
        message: "Logging in to the wholesale site",
    },
    ProgressTrigger {
        needle: "Processing item",
        phase: JobStatus::ProcessingItem,
        message: "Processing order items",
    },
    ProgressTrigger {
        needle: "Adding item",
        phase: JobStatus::ProcessingItem,
        message: "Processing order items",
    },
    ProgressTrigger {
        needle: "Calculating shipping",
        phase: JobStatus::CalculatingShipping,
        message: "Calculating shipping",
    },
    ProgressTrigger {
        needle: "Submitting order",
        phase: JobStatus::Completing,
        message: "Submitting order",
    },
];

/// Find the first trigger whose needle occurs in `line`
pub fn match_trigger(line: &str) -> Option<&'static ProgressTrigger> {
    PROGRESS_TRIGGERS.iter().find(|t| line.contains(t.needle))
}
