//! Prompt builders for the two plan-generation stages. Both demand
//! strict JSON; the callers still run the output through the repair
//! pipeline and re-derive every field they persist.

use chrono::NaiveDate;
use std::fmt::Write;

use crate::analytics::windows::RecencyWindow;
use crate::analytics::TopicStats;
use crate::plan::decision::TopicDecision;
use crate::problems::problem::Problem;

fn activity_line(stats: &TopicStats, window: RecencyWindow) -> String {
    let cell = stats.window(window);
    format!("{}E/{}M/{}H", cell.easy, cell.medium, cell.hard)
}

/// Prompt 1: decide which topic to introduce and which to review.
pub fn build_topic_decision_prompt(
    stats: &[TopicStats],
    time_minutes: u32,
    custom_instructions: Option<&str>,
) -> String {
    let mut activity = String::new();
    for topic in stats {
        let _ = writeln!(
            activity,
            "- {} | last_solved: {} | 3d: {} | 7d: {} | 14d: {} | 28d+: {} | weighted_score: {}",
            topic.topic,
            topic.last_solved,
            activity_line(topic, RecencyWindow::Days3),
            activity_line(topic, RecencyWindow::Days7),
            activity_line(topic, RecencyWindow::Days14),
            activity_line(topic, RecencyWindow::Older),
            topic.weighted_score,
        );
    }
    if activity.is_empty() {
        activity.push_str("(no solved problems yet)\n");
    }

    let extra = custom_instructions
        .map(|c| format!("\nADDITIONAL: {c}\n"))
        .unwrap_or_default();

    format!(
        r#"You are a coding-practice study assistant. Choose today's topics
from the user's recent activity and available time.

1. Pick ONE new_topic the user has not practiced in the last 3 days
2. Pick up to FOUR review_topics last solved between 7 and 28 days ago
3. Prefer under-practiced topics (low weighted_score)

OUTPUT FORMAT (STRICT JSON, nothing else):
{{
  "new_topic": "topic name",
  "review_topics": ["topic name"],
  "rationale": "one short paragraph"
}}

Available time today: {time_minutes} minutes

RECENT ACTIVITY (per topic, counts are easy/medium/hard):
{activity}{extra}"#
    )
}

/// Prompt 2: pick concrete problems for the decided topics.
pub fn build_selection_prompt(
    decision: &TopicDecision,
    candidates: &[Problem],
    solved_recently: &[u32],
    time_minutes: u32,
    custom_instructions: Option<&str>,
    tightened: bool,
) -> String {
    let mut pool = String::new();
    for problem in candidates {
        let _ = writeln!(
            pool,
            "- #{} \"{}\" ({}) topics: {}",
            problem.number,
            problem.title,
            problem.difficulty,
            problem.topics.join(", "),
        );
    }
    if pool.is_empty() {
        pool.push_str("(no candidates available)\n");
    }

    let extra = custom_instructions
        .map(|c| format!("\nADDITIONAL: {c}\n"))
        .unwrap_or_default();

    let strictness = if tightened {
        "\nIMPORTANT: your previous answer was rejected. Use ONLY problem \
         numbers that appear in CANDIDATES above; do not invent numbers.\n"
    } else {
        ""
    };

    format!(
        r#"You are a coding-practice study assistant. Build today's problem
list from the candidate pool below.

1. Spend about half the time on problems for new_topic "{new_topic}"
2. Fill the rest from review topics: {review}
3. Prefer medium difficulty; include 1 hard problem only if time allows
4. Estimate 15 min for easy, 25 for medium, 40 for hard
5. Total estimated minutes must fit the available time
6. Choose problem numbers ONLY from CANDIDATES; do not invent any

OUTPUT FORMAT (STRICT JSON, nothing else):
{{
  "recommendations": [
    {{"number": 123, "title": "...", "difficulty": "medium",
      "reason": "...", "estimated_minutes": 25}}
  ],
  "rationale": "one short paragraph"
}}

Available time today: {time_minutes} minutes

CANDIDATES:
{pool}
Problem numbers solved in the last 30 days (prefer fresh ones for review): {solved:?}
{extra}{strictness}"#,
        new_topic = decision.new_topic,
        review = decision.review_topics.join(", "),
        solved = solved_recently,
    )
}

/// Deterministic rationale used when the decision stage degrades.
pub fn fallback_decision_rationale(new_topic: &str, date: NaiveDate) -> String {
    format!(
        "Deterministic pick for {date}: \"{new_topic}\" is the least recently \
         practiced topic in range; review topics are the oldest in the 7-28 day band."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::problem::Difficulty;

    fn decision() -> TopicDecision {
        TopicDecision {
            new_topic: "Graph".to_string(),
            review_topics: vec!["DP".to_string()],
            rationale: String::new(),
        }
    }

    fn candidates() -> Vec<Problem> {
        vec![Problem {
            number: 200,
            title: "Number of Islands".to_string(),
            difficulty: Difficulty::Medium,
            topics: vec!["Graph".to_string()],
            url: String::new(),
        }]
    }

    #[test]
    fn selection_prompt_states_difficulty_distribution() {
        let prompt =
            build_selection_prompt(&decision(), &candidates(), &[], 60, None, false);
        assert!(prompt.contains("Prefer medium difficulty"));
        assert!(prompt.contains("include 1 hard problem only if time allows"));
    }

    #[test]
    fn tightened_retry_adds_the_candidates_only_warning() {
        let relaxed =
            build_selection_prompt(&decision(), &candidates(), &[], 60, None, false);
        let tightened =
            build_selection_prompt(&decision(), &candidates(), &[], 60, None, true);
        assert!(!relaxed.contains("previous answer was rejected"));
        assert!(tightened.contains("previous answer was rejected"));
        assert!(tightened.contains("ONLY problem"));
    }

    #[test]
    fn decision_prompt_lists_per_topic_activity() {
        use crate::analytics::{TopicStats, WindowCount};
        let now = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let stats = vec![TopicStats {
            topic: "Array".to_string(),
            counts: [WindowCount::default(); 4],
            last_solved: now,
            weighted_score: 2.5,
        }];
        let prompt = build_topic_decision_prompt(&stats, 45, Some("focus on fundamentals"));
        assert!(prompt.contains("- Array |"));
        assert!(prompt.contains("weighted_score: 2.5"));
        assert!(prompt.contains("45 minutes"));
        assert!(prompt.contains("ADDITIONAL: focus on fundamentals"));
    }
}
