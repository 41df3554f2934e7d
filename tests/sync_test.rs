//! Submission sync tests: merge semantics, dedupe, the rate-limit
//! gate, and dry runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use leetplan::error::PlanError;
use leetplan::problems::problem::Difficulty;
use leetplan::storage::memory::MemoryStore;
use leetplan::storage::Storage;
use leetplan::sync::{sync_submissions, FetchedSubmission, SubmissionFetcher, SyncGate};

struct StubFetcher {
    items: Vec<FetchedSubmission>,
    calls: AtomicU32,
}

impl StubFetcher {
    fn new(items: Vec<FetchedSubmission>) -> Self {
        StubFetcher {
            items,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl SubmissionFetcher for StubFetcher {
    async fn fetch_recent(&self, _limit: u32) -> Result<Vec<FetchedSubmission>, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.clone())
    }
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn fetched(number: u32, title: &str, difficulty: &str, date: &str) -> FetchedSubmission {
    FetchedSubmission {
        problem_number: number,
        title: title.to_string(),
        difficulty: difficulty.to_string(),
        topics: vec!["Array".to_string()],
        url: String::new(),
        solved_date: d(date),
        attempts: 1,
    }
}

fn open_gate() -> SyncGate {
    SyncGate::new(Duration::from_secs(0))
}

#[tokio::test]
async fn sync_registers_new_problems_and_submissions() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = StubFetcher::new(vec![
        fetched(1, "Two Sum", "Easy", "2026-08-29"),
        fetched(121, "Best Time to Buy and Sell Stock", "EASY", "2026-08-30"),
    ]);
    let gate = open_gate();

    let report = sync_submissions(store.as_ref(), &fetcher, &gate, 20, false)
        .await
        .unwrap();
    assert_eq!(report.new_problems, 2);
    assert_eq!(report.new_submissions, 2);
    assert!(!report.dry_run);

    let problems = store.list_problems().unwrap();
    assert_eq!(problems.len(), 2);
    assert!(problems.iter().all(|p| p.difficulty == Difficulty::Easy));
}

#[tokio::test]
async fn resync_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = StubFetcher::new(vec![fetched(1, "Two Sum", "easy", "2026-08-29")]);
    let gate = open_gate();

    let first = sync_submissions(store.as_ref(), &fetcher, &gate, 20, false)
        .await
        .unwrap();
    assert_eq!(first.new_submissions, 1);

    let second = sync_submissions(store.as_ref(), &fetcher, &gate, 20, false)
        .await
        .unwrap();
    assert_eq!(second.new_problems, 0);
    assert_eq!(second.new_submissions, 0);
    assert_eq!(store.list_submissions().unwrap().len(), 1);
}

#[tokio::test]
async fn second_sync_inside_the_interval_is_rate_limited() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = StubFetcher::new(vec![fetched(1, "Two Sum", "easy", "2026-08-29")]);
    let gate = SyncGate::new(Duration::from_secs(60));

    sync_submissions(store.as_ref(), &fetcher, &gate, 20, false)
        .await
        .unwrap();

    let err = sync_submissions(store.as_ref(), &fetcher, &gate, 20, false)
        .await
        .unwrap_err();
    match err {
        PlanError::RateLimited {
            min_interval_secs,
            wait_secs,
        } => {
            assert_eq!(min_interval_secs, 60);
            assert!(wait_secs >= 1);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    // The fetcher was never hit the second time.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn acquiring_the_gate_reserves_the_slot_immediately() {
    // Concurrent callers race on try_acquire alone; the second one must
    // lose even before the first sync finishes.
    let gate = SyncGate::new(Duration::from_secs(60));
    gate.try_acquire().unwrap();
    assert!(matches!(
        gate.try_acquire(),
        Err(PlanError::RateLimited { .. })
    ));

    // Handing the slot back reopens the gate.
    gate.release();
    gate.try_acquire().unwrap();
}

struct FailingFetcher;

#[async_trait]
impl SubmissionFetcher for FailingFetcher {
    async fn fetch_recent(&self, _limit: u32) -> Result<Vec<FetchedSubmission>, PlanError> {
        Err(PlanError::external(
            leetplan::Stage::Sync,
            "upstream returned 503",
        ))
    }
}

#[tokio::test]
async fn failed_fetch_surfaces_the_error_and_returns_the_slot() {
    let store = Arc::new(MemoryStore::new());
    let gate = SyncGate::new(Duration::from_secs(60));

    let err = sync_submissions(store.as_ref(), &FailingFetcher, &gate, 20, false)
        .await
        .unwrap_err();
    match err {
        PlanError::ExternalService { stage, message } => {
            assert_eq!(stage, leetplan::Stage::Sync);
            assert!(message.contains("503"));
        }
        other => panic!("expected ExternalService, got {other:?}"),
    }

    // The failed attempt must not count against the interval.
    let fetcher = StubFetcher::new(vec![fetched(1, "Two Sum", "easy", "2026-08-29")]);
    let real = sync_submissions(store.as_ref(), &fetcher, &gate, 20, false)
        .await
        .unwrap();
    assert_eq!(real.new_submissions, 1);
}

#[tokio::test]
async fn dry_run_counts_without_writing_or_consuming_the_gate() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = StubFetcher::new(vec![
        fetched(1, "Two Sum", "easy", "2026-08-29"),
        fetched(2, "Add Two Numbers", "medium", "2026-08-30"),
    ]);
    let gate = SyncGate::new(Duration::from_secs(60));

    let report = sync_submissions(store.as_ref(), &fetcher, &gate, 20, true)
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.new_problems, 2);
    assert_eq!(report.new_submissions, 2);
    assert!(store.list_problems().unwrap().is_empty());
    assert!(store.list_submissions().unwrap().is_empty());

    // A real sync right after the dry run is still allowed.
    let real = sync_submissions(store.as_ref(), &fetcher, &gate, 20, false)
        .await
        .unwrap();
    assert_eq!(real.new_submissions, 2);
}
