use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::error::{PlanError, Stage};
use crate::plan::DailyPlan;
use crate::problems::problem::Problem;
use crate::problems::submission::Submission;
use crate::storage::{SaveOutcome, Storage};

/// JSON-file storage backend. Layout under the data dir:
///
/// ```text
/// <data_dir>/problems.json          catalog, array of Problem
/// <data_dir>/submissions.json       history, array of Submission
/// <data_dir>/plans/plan_<date>.json one file per daily plan
/// ```
///
/// A process-wide mutex serializes `save_plan`'s exists-check and write,
/// which is what makes the conflict check atomic for concurrent requests
/// inside one process.
pub struct JsonStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        JsonStore {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn problems_path(&self) -> PathBuf {
        self.data_dir.join("problems.json")
    }

    fn submissions_path(&self) -> PathBuf {
        self.data_dir.join("submissions.json")
    }

    fn plan_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join("plans")
            .join(format!("plan_{}.json", date.format("%Y-%m-%d")))
    }

    fn read_list<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
        stage: Stage,
    ) -> Result<Vec<T>, PlanError> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                PlanError::fatal(stage, format!("corrupt store file {:?}: {e}", path))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(PlanError::fatal(
                stage,
                format!("failed to read {:?}: {e}", path),
            )),
        }
    }

    fn write_json<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
        stage: Stage,
    ) -> Result<(), PlanError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PlanError::fatal(stage, format!("failed to create {:?}: {e}", parent))
            })?;
        }
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| PlanError::fatal(stage, format!("failed to serialize: {e}")))?;
        fs::write(path, json)
            .map_err(|e| PlanError::fatal(stage, format!("failed to write {:?}: {e}", path)))
    }
}

impl Storage for JsonStore {
    fn list_problems(&self) -> Result<Vec<Problem>, PlanError> {
        self.read_list(&self.problems_path(), Stage::Aggregating)
    }

    fn list_submissions(&self) -> Result<Vec<Submission>, PlanError> {
        self.read_list(&self.submissions_path(), Stage::Aggregating)
    }

    fn get_plan(&self, date: NaiveDate) -> Result<Option<DailyPlan>, PlanError> {
        let path = self.plan_path(date);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
                PlanError::fatal(
                    Stage::CacheLookup,
                    format!("corrupt plan file {:?}: {e}", path),
                )
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PlanError::fatal(
                Stage::CacheLookup,
                format!("failed to read {:?}: {e}", path),
            )),
        }
    }

    fn save_plan(&self, plan: &DailyPlan, overwrite: bool) -> Result<SaveOutcome, PlanError> {
        let _guard = self.write_lock.lock();
        let path = self.plan_path(plan.date);
        if !overwrite && path.exists() {
            return Ok(SaveOutcome::Conflict);
        }
        self.write_json(&path, plan, Stage::Persisting)?;
        Ok(SaveOutcome::Saved)
    }

    fn upsert_problem(&self, problem: &Problem) -> Result<bool, PlanError> {
        let _guard = self.write_lock.lock();
        let mut problems: Vec<Problem> = self.read_list(&self.problems_path(), Stage::Sync)?;
        let is_new = match problems.iter_mut().find(|p| p.number == problem.number) {
            Some(existing) => {
                *existing = problem.clone();
                false
            }
            None => {
                problems.push(problem.clone());
                true
            }
        };
        self.write_json(&self.problems_path(), &problems, Stage::Sync)?;
        Ok(is_new)
    }

    fn insert_submission(&self, submission: &Submission) -> Result<bool, PlanError> {
        let _guard = self.write_lock.lock();
        let mut submissions: Vec<Submission> =
            self.read_list(&self.submissions_path(), Stage::Sync)?;
        let exists = submissions.iter().any(|s| {
            s.problem_number == submission.problem_number && s.solved_date == submission.solved_date
        });
        if exists {
            return Ok(false);
        }
        submissions.push(submission.clone());
        self.write_json(&self.submissions_path(), &submissions, Stage::Sync)?;
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
            time_minutes: 45,
            focus_topic: "Binary Search".to_string(),
            recommendations: vec![],
            rationale: "test".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn plans_round_trip_and_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        assert!(store.get_plan(date).unwrap().is_none());
        assert_eq!(store.save_plan(&plan_for(date), false).unwrap(), SaveOutcome::Saved);
        let loaded = store.get_plan(date).unwrap().unwrap();
        assert_eq!(loaded.focus_topic, "Binary Search");
        assert_eq!(
            store.save_plan(&plan_for(date), false).unwrap(),
            SaveOutcome::Conflict
        );
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        assert!(store.list_problems().unwrap().is_empty());
        assert!(store.list_submissions().unwrap().is_empty());
    }
}
