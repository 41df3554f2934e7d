//! Plan generation workflow. A linear state machine over the stages of
//! producing one daily plan: cache lookup, stats aggregation, topic
//! decision, problem selection, persistence. Failures carry the stage
//! they originated in; a save conflict is resolved by re-reading the
//! winning plan and is never surfaced to the caller.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::analytics::compute_topic_stats;
use crate::config::EngineConfig;
use crate::error::{PlanError, Stage};
use crate::llm::ReasoningService;
use crate::metrics::Metrics;
use crate::plan::{decision, selection, DailyPlan, PlanRequest, PlanResponse};
use crate::storage::{SaveOutcome, Storage};

const DEFAULT_TIME_MINUTES: u32 = 60;

pub struct PlanOrchestrator {
    store: Arc<dyn Storage>,
    reasoner: Arc<dyn ReasoningService>,
    config: EngineConfig,
    metrics: Metrics,
}

impl PlanOrchestrator {
    pub fn new(
        store: Arc<dyn Storage>,
        reasoner: Arc<dyn ReasoningService>,
        config: EngineConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            reasoner,
            config,
            metrics,
        }
    }

    /// Orchestrator wired to the process-wide engine config (TOML file
    /// or defaults) and fresh counters.
    pub fn with_default_config(
        store: Arc<dyn Storage>,
        reasoner: Arc<dyn ReasoningService>,
    ) -> Self {
        Self::new(
            store,
            reasoner,
            crate::config::get_engine_config().clone(),
            Metrics::new(),
        )
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Serve the plan for the requested date, generating it on a cache
    /// miss. Idempotent: repeated calls for the same date return the
    /// same plan with `is_cached` set.
    pub async fn daily_plan(&self, request: PlanRequest) -> Result<PlanResponse, PlanError> {
        self.run(request, false).await
    }

    /// Explicit regeneration: skips the cache-hit path and overwrites
    /// any existing plan for the date.
    pub async fn regenerate(&self, request: PlanRequest) -> Result<PlanResponse, PlanError> {
        self.run(request, true).await
    }

    async fn run(&self, request: PlanRequest, overwrite: bool) -> Result<PlanResponse, PlanError> {
        let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
        let time_minutes = if request.time_minutes == 0 {
            DEFAULT_TIME_MINUTES
        } else {
            request.time_minutes
        };

        tracing::info!(%date, time_minutes, overwrite, stage = Stage::CacheLookup.label(), "Plan workflow started");
        if !overwrite {
            if let Some(plan) = self.store.get_plan(date)? {
                self.metrics.record_cache_hit();
                tracing::info!(%date, "Cache hit, serving stored plan");
                return Ok(PlanResponse {
                    plan,
                    is_cached: true,
                });
            }
        }
        self.metrics.record_cache_miss();

        let plan = self
            .generate(date, time_minutes, request.custom_instructions.as_deref())
            .await?;

        tracing::info!(%date, stage = Stage::Persisting.label(), "Persisting plan");
        match self.store.save_plan(&plan, overwrite)? {
            SaveOutcome::Saved => Ok(PlanResponse {
                plan,
                is_cached: false,
            }),
            SaveOutcome::Conflict => {
                // A concurrent writer won the race. Their plan is the
                // plan of record for the date; ours is discarded.
                self.metrics.record_cache_conflict();
                tracing::info!(%date, "Save conflict, re-reading winning plan");
                let winner = self.store.get_plan(date)?.ok_or_else(|| {
                    PlanError::fatal(
                        Stage::Persisting,
                        format!("plan for {date} vanished between conflict and re-read"),
                    )
                })?;
                Ok(PlanResponse {
                    plan: winner,
                    is_cached: true,
                })
            }
        }
    }

    async fn generate(
        &self,
        date: NaiveDate,
        time_minutes: u32,
        custom_instructions: Option<&str>,
    ) -> Result<DailyPlan, PlanError> {
        tracing::info!(%date, stage = Stage::Aggregating.label(), "Aggregating topic stats");
        let problems = self.store.list_problems()?;
        let submissions = self.store.list_submissions()?;
        let now = Utc::now().date_naive();
        let stats = compute_topic_stats(&problems, &submissions, now, &self.metrics);

        tracing::info!(%date, stage = Stage::Deciding.label(), topics = stats.len(), "Deciding focus topic");
        let decision = decision::decide_topics(
            self.reasoner.as_ref(),
            &stats,
            now,
            date,
            time_minutes,
            custom_instructions,
            &self.config,
            &self.metrics,
        )
        .await;

        tracing::info!(
            %date,
            stage = Stage::Selecting.label(),
            new_topic = %decision.new_topic,
            review = decision.review_topics.len(),
            "Selecting problems"
        );
        let (recommendations, rationale) = selection::select_problems(
            self.reasoner.as_ref(),
            &decision,
            &problems,
            &submissions,
            now,
            time_minutes,
            custom_instructions,
            &self.config,
            &self.metrics,
        )
        .await;

        Ok(DailyPlan {
            date,
            time_minutes,
            focus_topic: decision.new_topic,
            recommendations,
            rationale,
            created_at: Utc::now(),
        })
    }
}
