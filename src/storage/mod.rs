pub mod json;
pub mod memory;

use chrono::NaiveDate;

use crate::error::PlanError;
use crate::plan::DailyPlan;
use crate::problems::problem::Problem;
use crate::problems::submission::Submission;

/// Result of a plan write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// A plan already existed for the date and overwrite was not set.
    /// The one-plan-per-date invariant is enforced here, at the
    /// boundary, not by caller discipline.
    Conflict,
}

/// Persistent storage collaborator. The engine only ever reads the
/// problem catalog and submission history; plans are written exactly
/// once per date through the compare-and-insert `save_plan`.
///
/// Implementations must make `save_plan` atomic with respect to
/// concurrent writers for the same date: of two racing first writes,
/// exactly one may observe `Saved`.
pub trait Storage: Send + Sync {
    fn list_problems(&self) -> Result<Vec<Problem>, PlanError>;

    fn list_submissions(&self) -> Result<Vec<Submission>, PlanError>;

    fn get_plan(&self, date: NaiveDate) -> Result<Option<DailyPlan>, PlanError>;

    /// Compare-and-insert. Refuses with `Conflict` when a plan already
    /// exists for `plan.date`, unless `overwrite` is set (explicit
    /// regeneration).
    fn save_plan(&self, plan: &DailyPlan, overwrite: bool) -> Result<SaveOutcome, PlanError>;

    /// Insert or refresh a catalog problem. Returns true when the
    /// problem number was not previously known.
    fn upsert_problem(&self, problem: &Problem) -> Result<bool, PlanError>;

    /// Insert a submission unless one already exists for the same
    /// (problem, solved_date). Returns true when inserted.
    fn insert_submission(&self, submission: &Submission) -> Result<bool, PlanError>;
}
