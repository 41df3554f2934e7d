use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::error::PlanError;
use crate::plan::DailyPlan;
use crate::problems::problem::Problem;
use crate::problems::submission::Submission;
use crate::storage::{SaveOutcome, Storage};

#[derive(Default)]
struct Inner {
    problems: BTreeMap<u32, Problem>,
    submissions: Vec<Submission>,
    plans: HashMap<NaiveDate, DailyPlan>,
}

/// In-memory storage backend, used by tests and embedders. A single
/// mutex over all tables makes the `save_plan` check-and-insert atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed helper: bulk-load a catalog and history.
    pub fn with_data(problems: Vec<Problem>, submissions: Vec<Submission>) -> Self {
        let store = MemoryStore::new();
        {
            let mut inner = store.inner.lock();
            for problem in problems {
                inner.problems.insert(problem.number, problem);
            }
            inner.submissions = submissions;
        }
        store
    }
}

impl Storage for MemoryStore {
    fn list_problems(&self) -> Result<Vec<Problem>, PlanError> {
        Ok(self.inner.lock().problems.values().cloned().collect())
    }

    fn list_submissions(&self) -> Result<Vec<Submission>, PlanError> {
        Ok(self.inner.lock().submissions.clone())
    }

    fn get_plan(&self, date: NaiveDate) -> Result<Option<DailyPlan>, PlanError> {
        Ok(self.inner.lock().plans.get(&date).cloned())
    }

    fn save_plan(&self, plan: &DailyPlan, overwrite: bool) -> Result<SaveOutcome, PlanError> {
        let mut inner = self.inner.lock();
        if !overwrite && inner.plans.contains_key(&plan.date) {
            return Ok(SaveOutcome::Conflict);
        }
        inner.plans.insert(plan.date, plan.clone());
        Ok(SaveOutcome::Saved)
    }

    fn upsert_problem(&self, problem: &Problem) -> Result<bool, PlanError> {
        let mut inner = self.inner.lock();
        let is_new = !inner.problems.contains_key(&problem.number);
        inner.problems.insert(problem.number, problem.clone());
        Ok(is_new)
    }

    fn insert_submission(&self, submission: &Submission) -> Result<bool, PlanError> {
        let mut inner = self.inner.lock();
        let exists = inner.submissions.iter().any(|s| {
            s.problem_number == submission.problem_number && s.solved_date == submission.solved_date
        });
        if exists {
            return Ok(false);
        }
        inner.submissions.push(submission.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn plan_for(date: NaiveDate) -> DailyPlan {
        DailyPlan {
            date,
            time_minutes: 60,
            focus_topic: "Array".to_string(),
            recommendations: vec![],
            rationale: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn save_plan_refuses_second_write() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(store.save_plan(&plan_for(date), false).unwrap(), SaveOutcome::Saved);
        assert_eq!(
            store.save_plan(&plan_for(date), false).unwrap(),
            SaveOutcome::Conflict
        );
        // Explicit regeneration goes through.
        assert_eq!(store.save_plan(&plan_for(date), true).unwrap(), SaveOutcome::Saved);
    }

    #[test]
    fn submissions_dedupe_on_problem_and_date() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert!(store.insert_submission(&Submission::new(1, date)).unwrap());
        assert!(!store.insert_submission(&Submission::new(1, date)).unwrap());
        let next = date.succ_opt().unwrap();
        assert!(store.insert_submission(&Submission::new(1, next)).unwrap());
        assert_eq!(store.list_submissions().unwrap().len(), 2);
    }
}
