pub mod decision;
pub mod orchestrator;
pub mod prompts;
pub mod selection;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::problems::problem::Difficulty;

/// One recommended problem inside a daily plan. Difficulty and URL are
/// always taken from the catalog, never from model output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemRecommendation {
    pub number: u32,
    pub title: String,
    pub difficulty: Difficulty,
    pub reason: String,
    /// Baseline 15/25/40 by difficulty, overridable within ±50%.
    pub estimated_minutes: u32,
    pub url: String,
}

/// The persisted, date-keyed output of the generation workflow.
/// Exactly one plan exists per calendar date; immutable after creation
/// unless regeneration is explicitly requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyPlan {
    pub date: NaiveDate,
    pub time_minutes: u32,
    pub focus_topic: String,
    pub recommendations: Vec<ProblemRecommendation>,
    pub rationale: String,
    pub created_at: DateTime<Utc>,
}

impl DailyPlan {
    pub fn total_estimated_minutes(&self) -> u32 {
        self.recommendations.iter().map(|r| r.estimated_minutes).sum()
    }
}

/// A caller-facing daily-plan request.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    /// Defaults to today (UTC) when absent.
    pub date: Option<NaiveDate>,
    pub time_minutes: u32,
    pub custom_instructions: Option<String>,
}

/// A plan plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResponse {
    pub plan: DailyPlan,
    /// True when served from the cache-hit path.
    pub is_cached: bool,
}
