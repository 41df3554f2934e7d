use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_attempts() -> u32 {
    1
}

/// One solved-date event for a problem. Multiple submissions may exist
/// for the same problem (re-solves); each is a distinct event. Never
/// mutated or deleted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub problem_number: u32,
    /// Calendar date only; the judge feed has no useful time component.
    pub solved_date: NaiveDate,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

impl Submission {
    pub fn new(problem_number: u32, solved_date: NaiveDate) -> Self {
        Submission {
            problem_number,
            solved_date,
            attempts: 1,
        }
    }
}
