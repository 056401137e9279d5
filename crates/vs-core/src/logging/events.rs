//! Structured event definitions for logging.
//!
//! Every event carries the run ID, the command being run and the pipeline
//! stage, so JSONL output can be grouped per run.

use serde::{Deserialize, Serialize};

/// Pipeline stages of a votescope command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Dataset query.
    Load,
    /// Release dates to elapsed time.
    Normalize,
    /// Rate and parameter estimation.
    Estimate,
    /// Density / PMF evaluation.
    Evaluate,
    /// Figure drawing.
    Render,
    /// Report output.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Estimate => "estimate",
            Stage::Evaluate => "evaluate",
            Stage::Render => "render",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    // Load stage
    pub const DATASET_OPENED: &str = "dataset.opened";
    pub const DATASET_LOADED: &str = "dataset.loaded";

    pub const NORMALIZE_FINISHED: &str = "normalize.finished";
    pub const ESTIMATE_FINISHED: &str = "estimate.finished";
    pub const EVALUATE_FINISHED: &str = "evaluate.finished";

    // Render stage
    pub const RENDER_WRITTEN: &str = "render.written";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation data attached to every event of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Subcommand name (`exponential`, `rates`, ...).
    pub command: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, command: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            command: command.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Load.to_string(), "load");
        assert_eq!(Stage::Normalize.to_string(), "normalize");
        assert_eq!(Stage::Render.to_string(), "render");
    }

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Estimate).unwrap(), "\"estimate\"");
        assert_eq!(serde_json::to_string(&Stage::Init).unwrap(), "\"init\"");
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::RUN_STARTED, "run.started");
        assert_eq!(event_names::DATASET_LOADED, "dataset.loaded");
        assert_eq!(event_names::RENDER_WRITTEN, "render.written");
    }

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new("run-abc", "rates");
        assert_eq!(ctx.run_id, "run-abc");
        assert_eq!(ctx.command, "rates");
    }
}
