use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the plan-generation pipeline.
/// All metrics are atomic for thread-safety; cloning shares the counters.
#[derive(Clone, Default)]
pub struct Metrics {
    /// Plan served straight from the cache
    pub cache_hit_count: Arc<AtomicU64>,
    /// Plan had to be generated
    pub cache_miss_count: Arc<AtomicU64>,
    /// Concurrent writers lost the compare-and-insert race
    pub cache_conflict_count: Arc<AtomicU64>,
    /// Reasoning-service calls retried after a transient failure
    pub llm_retry_count: Arc<AtomicU64>,
    /// Stage degraded to its deterministic fallback
    pub fallback_count: Arc<AtomicU64>,
    /// Recommendations stripped by post-validation
    pub validation_reject_count: Arc<AtomicU64>,
    /// Submissions skipped because their problem could not be resolved
    pub integrity_warning_count: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters, for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_conflicts: u64,
    pub llm_retries: u64,
    pub fallbacks: u64,
    pub validation_rejects: u64,
    pub integrity_warnings: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hit_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_miss_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_conflict(&self) {
        self.cache_conflict_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_llm_retry(&self) {
        self.llm_retry_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_reject(&self) {
        self.validation_reject_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_integrity_warning(&self) {
        self.integrity_warning_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hit_count.load(Ordering::Relaxed),
            cache_misses: self.cache_miss_count.load(Ordering::Relaxed),
            cache_conflicts: self.cache_conflict_count.load(Ordering::Relaxed),
            llm_retries: self.llm_retry_count.load(Ordering::Relaxed),
            fallbacks: self.fallback_count.load(Ordering::Relaxed),
            validation_rejects: self.validation_reject_count.load(Ordering::Relaxed),
            integrity_warnings: self.integrity_warning_count.load(Ordering::Relaxed),
        }
    }
}
