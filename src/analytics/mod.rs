pub mod windows;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;
use crate::problems::problem::{Difficulty, Problem};
use crate::problems::submission::Submission;
use windows::RecencyWindow;

/// Per-difficulty solve counts inside one recency window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCount {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl WindowCount {
    fn bump(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Hard => self.hard += 1,
        }
    }

    pub fn get(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    pub fn total(&self) -> u32 {
        self.easy + self.medium + self.hard
    }
}

/// Derived per-topic proficiency signal. Computed fresh on every request
/// so it always reflects the latest submissions; only finished plans are
/// ever cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicStats {
    pub topic: String,
    /// One cell per recency window, indexed by [`RecencyWindow::index`].
    pub counts: [WindowCount; 4],
    /// Most recent solved date among events tagged with this topic.
    /// Always present: a topic only exists here once it has a solve.
    pub last_solved: NaiveDate,
    pub weighted_score: f64,
}

impl TopicStats {
    pub fn count(&self, window: RecencyWindow, difficulty: Difficulty) -> u32 {
        self.counts[window.index()].get(difficulty)
    }

    pub fn window(&self, window: RecencyWindow) -> &WindowCount {
        &self.counts[window.index()]
    }

    pub fn total_solved(&self) -> u32 {
        self.counts.iter().map(WindowCount::total).sum()
    }

    /// Whole days since the topic was last solved, floored at zero.
    pub fn age_days(&self, now: NaiveDate) -> i64 {
        (now - self.last_solved).num_days().max(0)
    }
}

fn weighted_score(counts: &[WindowCount; 4]) -> f64 {
    let mut score = 0.0;
    for window in RecencyWindow::ALL {
        let cell = &counts[window.index()];
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            score += f64::from(cell.get(difficulty))
                * difficulty.weight()
                * window.recency_multiplier();
        }
    }
    // Two decimal places, matching the stored representation.
    (score * 100.0).round() / 100.0
}

/// Aggregate all (problem, submission) pairs into one `TopicStats` per
/// topic that has at least one solved event.
///
/// Each submission event is counted independently: a re-solve adds one
/// count to the cell for its own age and difficulty. A submission whose
/// problem number is missing from the catalog is skipped and reported as
/// a data-integrity warning; it never fails the whole computation.
pub fn compute_topic_stats(
    problems: &[Problem],
    submissions: &[Submission],
    now: NaiveDate,
    metrics: &Metrics,
) -> Vec<TopicStats> {
    let by_number: HashMap<u32, &Problem> = problems.iter().map(|p| (p.number, p)).collect();

    let mut counts: HashMap<String, [WindowCount; 4]> = HashMap::new();
    let mut last_solved: HashMap<String, NaiveDate> = HashMap::new();

    for submission in submissions {
        let problem = match by_number.get(&submission.problem_number) {
            Some(p) => *p,
            None => {
                tracing::warn!(
                    problem_number = submission.problem_number,
                    solved_date = %submission.solved_date,
                    "Submission references unknown problem; skipping"
                );
                metrics.record_integrity_warning();
                continue;
            }
        };

        let window = RecencyWindow::bucket(now, submission.solved_date);
        for topic in &problem.topics {
            let topic = topic.trim();
            if topic.is_empty() {
                continue;
            }
            counts.entry(topic.to_string()).or_default()[window.index()].bump(problem.difficulty);
            last_solved
                .entry(topic.to_string())
                .and_modify(|d| {
                    if submission.solved_date > *d {
                        *d = submission.solved_date;
                    }
                })
                .or_insert(submission.solved_date);
        }
    }

    let mut stats: Vec<TopicStats> = counts
        .into_iter()
        .map(|(topic, cells)| {
            let last = last_solved[&topic];
            let score = weighted_score(&cells);
            TopicStats {
                topic,
                counts: cells,
                last_solved: last,
                weighted_score: score,
            }
        })
        .collect();

    // Highest score first; topic name breaks ties so output is stable.
    stats.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.topic.cmp(&b.topic))
    });
    stats
}

/// Stats for one topic by name, if it has any solves.
pub fn topic_stats_by_name<'a>(stats: &'a [TopicStats], topic: &str) -> Option<&'a TopicStats> {
    stats.iter().find(|t| t.topic == topic)
}

/// Whole-history roll-up shown alongside plans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_problems_solved: u32,
    pub total_attempts: u32,
    pub easy_solved: u32,
    pub medium_solved: u32,
    pub hard_solved: u32,
    pub unique_topics_practiced: u32,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub average_attempts_per_problem: f64,
}

pub fn compute_overall_stats(
    problems: &[Problem],
    submissions: &[Submission],
    today: NaiveDate,
) -> OverallStats {
    let by_number: HashMap<u32, &Problem> = problems.iter().map(|p| (p.number, p)).collect();

    let mut stats = OverallStats::default();
    let mut topics: HashSet<&str> = HashSet::new();
    let mut dates: HashSet<NaiveDate> = HashSet::new();

    for submission in submissions {
        let problem = match by_number.get(&submission.problem_number) {
            Some(p) => *p,
            None => continue,
        };
        stats.total_problems_solved += 1;
        stats.total_attempts += submission.attempts.max(1);
        match problem.difficulty {
            Difficulty::Easy => stats.easy_solved += 1,
            Difficulty::Medium => stats.medium_solved += 1,
            Difficulty::Hard => stats.hard_solved += 1,
        }
        for topic in &problem.topics {
            let topic = topic.trim();
            if !topic.is_empty() {
                topics.insert(topic);
            }
        }
        dates.insert(submission.solved_date);
    }

    stats.unique_topics_practiced = topics.len() as u32;
    let (current, longest) = compute_streaks(&dates, today);
    stats.current_streak_days = current;
    stats.longest_streak_days = longest;
    if stats.total_problems_solved > 0 {
        let avg = f64::from(stats.total_attempts) / f64::from(stats.total_problems_solved);
        stats.average_attempts_per_problem = (avg * 100.0).round() / 100.0;
    }
    stats
}

/// (current streak ending today, longest streak anywhere in history).
fn compute_streaks(dates: &HashSet<NaiveDate>, today: NaiveDate) -> (u32, u32) {
    if dates.is_empty() {
        return (0, 0);
    }

    let mut sorted: Vec<NaiveDate> = dates.iter().copied().collect();
    sorted.sort();

    let mut longest = 1u32;
    let mut run = 1u32;
    for pair in sorted.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            run += 1;
        } else {
            longest = longest.max(run);
            run = 1;
        }
    }
    longest = longest.max(run);

    let mut current = 0u32;
    let mut day = today;
    while dates.contains(&day) {
        current += 1;
        day = match day.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }

    (current, longest)
}
