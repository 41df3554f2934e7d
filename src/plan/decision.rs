//! Topic decision stage: first reasoning call. Given aggregated topic
//! stats, decide one new topic to introduce and up to four review
//! topics from the fading band. The model's answer is validated against
//! the stats and re-ranked deterministically whenever it is invalid,
//! unparsable, or the service is unavailable — this stage never fails
//! the plan request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::TopicStats;
use crate::config::EngineConfig;
use crate::llm::{complete_with_retry, json::extract_json, ReasoningService};
use crate::metrics::Metrics;
use crate::plan::prompts;

/// Review topics must have been last solved inside this band (days).
pub const REVIEW_BAND_MIN_DAYS: i64 = 7;
pub const REVIEW_BAND_MAX_DAYS: i64 = 28;

/// A topic counts as "just practiced" when solved within this window.
const FRESH_DAYS: i64 = 3;

const MAX_REVIEW_TOPICS: usize = 4;

/// Topic used when there is no history at all to pick from.
const DEFAULT_NEW_TOPIC: &str = "Arrays";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicDecision {
    pub new_topic: String,
    #[serde(default)]
    pub review_topics: Vec<String>,
    #[serde(default)]
    pub rationale: String,
}

fn in_review_band(stats: &TopicStats, now: NaiveDate) -> bool {
    let age = stats.age_days(now);
    (REVIEW_BAND_MIN_DAYS..=REVIEW_BAND_MAX_DAYS).contains(&age)
}

fn solved_recently(stats: &[TopicStats], topic: &str, now: NaiveDate) -> bool {
    stats
        .iter()
        .any(|t| t.topic.eq_ignore_ascii_case(topic) && t.age_days(now) <= FRESH_DAYS)
}

/// The stats' spelling of a topic, matched case-insensitively. Keeps
/// downstream catalog lookups exact even when the model changes case.
fn canonical_topic(stats: &[TopicStats], topic: &str) -> Option<String> {
    stats
        .iter()
        .find(|t| t.topic.eq_ignore_ascii_case(topic))
        .map(|t| t.topic.clone())
}

/// Deterministic re-rank used whenever the model's answer cannot be
/// trusted. New topic: the oldest last-solved topic in the 7-28 day
/// band, else the lowest-scored topic not solved in the last 3 days,
/// else a fixed default. Review topics: oldest-first from the band,
/// excluding the new topic.
pub fn deterministic_decision(stats: &[TopicStats], now: NaiveDate, date: NaiveDate) -> TopicDecision {
    let mut banded: Vec<&TopicStats> = stats.iter().filter(|t| in_review_band(t, now)).collect();
    banded.sort_by(|a, b| {
        a.last_solved
            .cmp(&b.last_solved)
            .then_with(|| a.topic.cmp(&b.topic))
    });

    let new_topic = banded
        .first()
        .map(|t| t.topic.clone())
        .or_else(|| {
            // Nothing fading: take the weakest topic that isn't fresh.
            let mut stale: Vec<&TopicStats> = stats
                .iter()
                .filter(|t| t.age_days(now) > FRESH_DAYS)
                .collect();
            stale.sort_by(|a, b| {
                a.weighted_score
                    .partial_cmp(&b.weighted_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.topic.cmp(&b.topic))
            });
            stale.first().map(|t| t.topic.clone())
        })
        .unwrap_or_else(|| DEFAULT_NEW_TOPIC.to_string());

    let review_topics: Vec<String> = banded
        .iter()
        .map(|t| t.topic.clone())
        .filter(|t| *t != new_topic)
        .take(2)
        .collect();

    let rationale = prompts::fallback_decision_rationale(&new_topic, date);
    TopicDecision {
        new_topic,
        review_topics,
        rationale,
    }
}

/// Check the model's answer against the stats. Review topics that fall
/// outside the fading band are dropped (server-side re-rank rather than
/// trusting the model); an unusable new_topic rejects the whole answer.
fn validate_decision(
    mut decision: TopicDecision,
    stats: &[TopicStats],
    now: NaiveDate,
) -> Result<TopicDecision, String> {
    let new_topic = decision.new_topic.trim().to_string();
    if new_topic.is_empty() {
        return Err("new_topic is empty".to_string());
    }
    if solved_recently(stats, &new_topic, now) {
        return Err(format!("new_topic \"{new_topic}\" was solved within the last 3 days"));
    }
    // A brand-new topic has no stats entry and keeps the model's
    // spelling; known topics take the stats' spelling.
    decision.new_topic = canonical_topic(stats, &new_topic).unwrap_or(new_topic);

    let before = decision.review_topics.len();
    decision.review_topics = decision
        .review_topics
        .iter()
        .filter_map(|t| canonical_topic(stats, t.trim()))
        .filter(|t| !t.eq_ignore_ascii_case(&decision.new_topic))
        .filter(|t| {
            stats
                .iter()
                .any(|s| s.topic == *t && in_review_band(s, now))
        })
        .take(MAX_REVIEW_TOPICS)
        .collect();
    if decision.review_topics.len() != before {
        tracing::debug!(
            kept = decision.review_topics.len(),
            proposed = before,
            "Dropped review topics outside the 7-28 day band"
        );
    }
    Ok(decision)
}

/// Run the decision stage. Infallible by design: transport failures and
/// invalid output both degrade to [`deterministic_decision`].
pub async fn decide_topics(
    service: &dyn ReasoningService,
    stats: &[TopicStats],
    now: NaiveDate,
    date: NaiveDate,
    time_minutes: u32,
    custom_instructions: Option<&str>,
    config: &EngineConfig,
    metrics: &Metrics,
) -> TopicDecision {
    let prompt = prompts::build_topic_decision_prompt(stats, time_minutes, custom_instructions);

    let raw = match complete_with_retry(
        service,
        &prompt,
        config.max_tokens,
        config.retry_budget,
        metrics,
    )
    .await
    {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Decision stage unavailable, using deterministic fallback");
            metrics.record_fallback();
            return deterministic_decision(stats, now, date);
        }
    };

    let parsed: Result<TopicDecision, String> = extract_json(&raw)
        .map_err(|e| e.to_string())
        .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()))
        .and_then(|decision| validate_decision(decision, stats, now));

    match parsed {
        Ok(decision) => {
            tracing::info!(
                new_topic = %decision.new_topic,
                review_topics = ?decision.review_topics,
                "Topic decision accepted"
            );
            decision
        }
        Err(reason) => {
            tracing::warn!(reason = %reason, "Rejected topic decision, using deterministic fallback");
            metrics.record_fallback();
            deterministic_decision(stats, now, date)
        }
    }
}
