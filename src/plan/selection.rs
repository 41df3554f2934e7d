//! Problem selection stage: second reasoning call. Given the decided
//! topics, offer the model a bounded candidate pool and post-validate
//! everything it returns: unknown problem numbers are rejected,
//! difficulty is overwritten from the catalog, estimates are clamped to
//! the baseline band, and the list is trimmed to the time budget. If
//! validation strips everything the stage retries once with a tightened
//! prompt, then degrades to an empty plan rather than failing.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::config::EngineConfig;
use crate::llm::{complete_with_retry, json::extract_json, ReasoningService};
use crate::metrics::Metrics;
use crate::plan::decision::TopicDecision;
use crate::plan::prompts;
use crate::plan::ProblemRecommendation;
use crate::problems::problem::Problem;
use crate::problems::submission::Submission;

/// Review-topic candidates must have been solved within this many days.
const REVIEW_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    #[serde(alias = "leetcode_number", alias = "problem_number")]
    number: u32,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    estimated_minutes: u32,
}

#[derive(Debug, Default, Deserialize)]
struct RawSelection {
    #[serde(default)]
    recommendations: Vec<RawRecommendation>,
    #[serde(default)]
    rationale: String,
}

/// Candidate pool handed to the model plus the recently-solved numbers
/// quoted in the prompt.
pub struct CandidatePool {
    pub problems: Vec<Problem>,
    pub solved_recently: Vec<u32>,
}

fn has_topic(problem: &Problem, topic: &str) -> bool {
    problem.topics.iter().any(|t| t.trim() == topic)
}

/// Build the pool: problems carrying the new topic, unsolved ones
/// first, then review-topic problems solved within the last 30 days.
pub fn build_candidate_pool(
    problems: &[Problem],
    submissions: &[Submission],
    decision: &TopicDecision,
    now: NaiveDate,
) -> CandidatePool {
    let solved_numbers: HashSet<u32> = submissions.iter().map(|s| s.problem_number).collect();
    let cutoff = now - Duration::days(REVIEW_LOOKBACK_DAYS);
    let recent_numbers: HashSet<u32> = submissions
        .iter()
        .filter(|s| s.solved_date >= cutoff)
        .map(|s| s.problem_number)
        .collect();

    let mut pool: Vec<Problem> = Vec::new();
    let mut seen: HashSet<u32> = HashSet::new();

    let mut new_topic_problems: Vec<&Problem> = problems
        .iter()
        .filter(|p| has_topic(p, &decision.new_topic))
        .collect();
    // Unsolved biased: unsolved first, then by number for stable output.
    new_topic_problems.sort_by_key(|p| (solved_numbers.contains(&p.number), p.number));
    for problem in new_topic_problems {
        if seen.insert(problem.number) {
            pool.push(problem.clone());
        }
    }

    for problem in problems {
        if !recent_numbers.contains(&problem.number) {
            continue;
        }
        if decision.review_topics.iter().any(|t| has_topic(problem, t)) && seen.insert(problem.number)
        {
            pool.push(problem.clone());
        }
    }

    let mut solved_recently: Vec<u32> = recent_numbers.into_iter().collect();
    solved_recently.sort_unstable();

    CandidatePool {
        problems: pool,
        solved_recently,
    }
}

/// Re-derive every field of the model's recommendations from the
/// catalog and trim to the time budget (at most one problem's worth of
/// overflow past the available time).
fn validate_recommendations(
    raw: Vec<RawRecommendation>,
    catalog: &HashMap<u32, &Problem>,
    time_minutes: u32,
    metrics: &Metrics,
) -> Vec<ProblemRecommendation> {
    let mut out: Vec<ProblemRecommendation> = Vec::new();
    let mut seen: HashSet<u32> = HashSet::new();
    let mut spent: u32 = 0;

    for rec in raw {
        let problem = match catalog.get(&rec.number) {
            Some(p) => *p,
            None => {
                tracing::warn!(number = rec.number, "Recommended problem not in catalog; rejected");
                metrics.record_validation_reject();
                continue;
            }
        };
        if !seen.insert(rec.number) {
            metrics.record_validation_reject();
            continue;
        }

        // Difficulty comes from the catalog, never from the model.
        if let Some(claimed) = &rec.difficulty {
            if !claimed.eq_ignore_ascii_case(&problem.difficulty.to_string()) {
                tracing::debug!(
                    number = rec.number,
                    claimed = %claimed,
                    actual = %problem.difficulty,
                    "Model difficulty disagrees with catalog; overwriting"
                );
            }
        }

        if spent >= time_minutes {
            // Budget already met; the previous problem was the one
            // allowed overflow.
            break;
        }

        let minutes = problem.difficulty.clamp_minutes(rec.estimated_minutes);
        spent += minutes;
        out.push(ProblemRecommendation {
            number: problem.number,
            title: problem.title.clone(),
            difficulty: problem.difficulty,
            reason: rec.reason,
            estimated_minutes: minutes,
            url: problem.canonical_url(),
        });
    }
    out
}

fn parse_selection(raw: &str) -> Option<RawSelection> {
    let json = match extract_json(raw) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "Selection output is not JSON");
            return None;
        }
    };
    match serde_json::from_str::<RawSelection>(&json) {
        Ok(selection) => Some(selection),
        Err(e) => {
            tracing::warn!(error = %e, "Selection output does not match schema");
            None
        }
    }
}

/// Run the selection stage. Infallible by design: after one tightened
/// retry an unusable answer degrades to zero recommendations with an
/// explanatory rationale.
#[allow(clippy::too_many_arguments)]
pub async fn select_problems(
    service: &dyn ReasoningService,
    decision: &TopicDecision,
    problems: &[Problem],
    submissions: &[Submission],
    now: NaiveDate,
    time_minutes: u32,
    custom_instructions: Option<&str>,
    config: &EngineConfig,
    metrics: &Metrics,
) -> (Vec<ProblemRecommendation>, String) {
    let pool = build_candidate_pool(problems, submissions, decision, now);
    let catalog: HashMap<u32, &Problem> = problems.iter().map(|p| (p.number, p)).collect();

    for tightened in [false, true] {
        let prompt = prompts::build_selection_prompt(
            decision,
            &pool.problems,
            &pool.solved_recently,
            time_minutes,
            custom_instructions,
            tightened,
        );

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
                tracing::warn!(error = %e, tightened, "Selection stage call failed");
                continue;
            }
        };

        let Some(selection) = parse_selection(&raw) else {
            continue;
        };
        let recommendations =
            validate_recommendations(selection.recommendations, &catalog, time_minutes, metrics);
        if recommendations.is_empty() {
            tracing::warn!(tightened, "Validation stripped all recommendations");
            continue;
        }

        let rationale = if selection.rationale.trim().is_empty() {
            format!("Focus on {} with review of recent topics.", decision.new_topic)
        } else {
            selection.rationale
        };
        return (recommendations, rationale);
    }

    metrics.record_fallback();
    let rationale = format!(
        "No valid recommendations could be produced for \"{}\" today; \
         the reasoning service returned unusable output. Try regenerating later.",
        decision.new_topic
    );
    (Vec::new(), rationale)
}
