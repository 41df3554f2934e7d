use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage that originated an error. Surfaced to callers so a
/// failure always names where it happened.
///
/// Data-integrity problems (a submission whose problem cannot be
/// resolved) are deliberately NOT errors: the aggregator logs a warning,
/// bumps a metric and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CacheLookup,
    Aggregating,
    Deciding,
    Selecting,
    Persisting,
    Sync,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::CacheLookup => "cache_lookup",
            Stage::Aggregating => "aggregating",
            Stage::Deciding => "deciding",
            Stage::Selecting => "selecting",
            Stage::Persisting => "persisting",
            Stage::Sync => "sync",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unified error type for the plan-generation engine.
///
/// Save conflicts and invalid model output never surface here: the
/// storage boundary reports conflicts through `SaveOutcome` and the
/// decision/selection stages repair or degrade internally.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Failure of an external collaborator (the submission source, or
    /// the reasoning service on a non-degradable path).
    #[error("[{stage}] external service error: {message}")]
    ExternalService { stage: Stage, message: String },

    /// Unexpected internal inconsistency (storage unavailable, corrupt
    /// state). Surfaced to the caller; no partial plan is written.
    #[error("[{stage}] {message}")]
    Fatal { stage: Stage, message: String },

    /// Sync requested before the minimum interval elapsed.
    #[error("sync allowed once every {min_interval_secs}s; try again in {wait_secs}s")]
    RateLimited { min_interval_secs: u64, wait_secs: u64 },
}

impl PlanError {
    pub fn external<S: Into<String>>(stage: Stage, message: S) -> Self {
        PlanError::ExternalService {
            stage,
            message: message.into(),
        }
    }

    pub fn fatal<S: Into<String>>(stage: Stage, message: S) -> Self {
        PlanError::Fatal {
            stage,
            message: message.into(),
        }
    }

    /// The stage this error originated from, if it has one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PlanError::ExternalService { stage, .. } | PlanError::Fatal { stage, .. } => {
                Some(*stage)
            }
            PlanError::RateLimited { .. } => None,
        }
    }
}
