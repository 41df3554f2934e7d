//! Submission sync: pull recent solves from an external source and
//! fold them into local storage. Upstream calls are rate limited by a
//! process-local gate; dry runs report what would change without
//! writing or consuming the gate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::error::PlanError;
use crate::problems::problem::{Difficulty, Problem};
use crate::problems::submission::Submission;
use crate::storage::Storage;

/// One accepted submission as reported by the upstream source, carrying
/// enough catalog context to register unseen problems on the fly.
#[derive(Debug, Clone)]
pub struct FetchedSubmission {
    pub problem_number: u32,
    pub title: String,
    pub difficulty: String,
    pub topics: Vec<String>,
    pub url: String,
    pub solved_date: NaiveDate,
    pub attempts: u32,
}

/// Upstream submission source. An implementation wraps whatever API the
/// practice platform exposes.
#[async_trait]
pub trait SubmissionFetcher: Send + Sync {
    async fn fetch_recent(&self, limit: u32) -> Result<Vec<FetchedSubmission>, PlanError>;
}

#[derive(Default)]
struct GateState {
    last: Option<Instant>,
    prev: Option<Instant>,
}

/// Minimum-interval gate on upstream syncs. Shared per process so that
/// every caller path competes for the same quota.
pub struct SyncGate {
    min_interval: Duration,
    state: Mutex<GateState>,
}

impl SyncGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Check and reserve the next sync slot in one step, so concurrent
    /// callers inside the interval cannot both pass. Fails with
    /// `RateLimited` while the previous sync is still inside the
    /// minimum interval; call `release` to hand the slot back when the
    /// sync does not count (dry run, failed fetch).
    pub fn try_acquire(&self) -> Result<(), PlanError> {
        let mut state = self.state.lock();
        if let Some(at) = state.last {
            let elapsed = at.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                return Err(PlanError::RateLimited {
                    min_interval_secs: self.min_interval.as_secs(),
                    wait_secs: wait.as_secs().max(1),
                });
            }
        }
        state.prev = state.last;
        state.last = Some(Instant::now());
        Ok(())
    }

    /// Restore the timestamp from before the matching `try_acquire`.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.last = state.prev.take();
    }
}

/// What a sync changed, or would change for a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub new_problems: usize,
    pub new_submissions: usize,
    pub dry_run: bool,
}

/// Fetch recent submissions and merge them into storage. Problems not
/// yet in the catalog are registered from the fetched metadata;
/// submissions are deduplicated per (problem, date). A dry run performs
/// the fetch and counts the deltas without writing and without
/// consuming the gate.
pub async fn sync_submissions(
    store: &dyn Storage,
    fetcher: &dyn SubmissionFetcher,
    gate: &SyncGate,
    limit: u32,
    dry_run: bool,
) -> Result<SyncReport, PlanError> {
    gate.try_acquire()?;

    let fetched = match fetcher.fetch_recent(limit).await {
        Ok(fetched) => fetched,
        Err(e) => {
            // A fetch that never produced data does not count against
            // the interval.
            gate.release();
            return Err(e);
        }
    };
    tracing::info!(count = fetched.len(), dry_run, "Fetched recent submissions");

    if dry_run {
        gate.release();
        let problems = store.list_problems()?;
        let submissions = store.list_submissions()?;
        let known: std::collections::HashSet<u32> =
            problems.iter().map(|p| p.number).collect();
        let existing: std::collections::HashSet<(u32, NaiveDate)> = submissions
            .iter()
            .map(|s| (s.problem_number, s.solved_date))
            .collect();

        let mut would_add_problems = std::collections::HashSet::new();
        let mut would_add_submissions = std::collections::HashSet::new();
        for item in &fetched {
            if !known.contains(&item.problem_number) {
                would_add_problems.insert(item.problem_number);
            }
            let key = (item.problem_number, item.solved_date);
            if !existing.contains(&key) {
                would_add_submissions.insert(key);
            }
        }
        return Ok(SyncReport {
            new_problems: would_add_problems.len(),
            new_submissions: would_add_submissions.len(),
            dry_run: true,
        });
    }

    let mut new_problems = 0;
    let mut new_submissions = 0;
    for item in fetched {
        let problem = Problem {
            number: item.problem_number,
            title: item.title,
            difficulty: Difficulty::parse_lenient(&item.difficulty),
            topics: item.topics,
            url: item.url,
        };
        if store.upsert_problem(&problem)? {
            new_problems += 1;
        }
        let mut submission = Submission::new(item.problem_number, item.solved_date);
        submission.attempts = item.attempts.max(1);
        if store.insert_submission(&submission)? {
            new_submissions += 1;
        }
    }

    tracing::info!(new_problems, new_submissions, "Sync complete");
    Ok(SyncReport {
        new_problems,
        new_submissions,
        dry_run: false,
    })
}
