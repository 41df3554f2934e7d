//! Daily study-plan engine for coding practice. Aggregates submission
//! history into per-topic recency stats, asks a reasoning service to
//! pick today's focus, validates its problem picks against the local
//! catalog, and persists exactly one plan per calendar date.

pub mod analytics;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod plan;
pub mod problems;
pub mod storage;
pub mod sync;

pub use error::{PlanError, Stage};
pub use plan::orchestrator::PlanOrchestrator;
pub use plan::{DailyPlan, PlanRequest, PlanResponse, ProblemRecommendation};
