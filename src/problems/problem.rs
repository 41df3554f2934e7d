use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty tier of a catalog problem. Stored lowercase everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Weight used by the topic-stats weighted score.
    pub fn weight(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 2.0,
            Difficulty::Hard => 3.0,
        }
    }

    /// Per-difficulty time estimate baseline in minutes.
    pub fn baseline_minutes(self) -> u32 {
        match self {
            Difficulty::Easy => 15,
            Difficulty::Medium => 25,
            Difficulty::Hard => 40,
        }
    }

    /// Clamp a model-provided estimate into the ±50% band around the
    /// baseline. Zero (missing) falls back to the baseline itself.
    pub fn clamp_minutes(self, requested: u32) -> u32 {
        let base = self.baseline_minutes();
        if requested == 0 {
            return base;
        }
        let half = base / 2;
        requested.clamp(base - half, base + half)
    }

    /// Lenient parse for data coming from outside the catalog.
    /// Unknown values degrade to Medium, matching the import behavior
    /// of the original data set.
    pub fn parse_lenient(raw: &str) -> Difficulty {
        match raw.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

/// A catalog problem. Identity is the external problem number; the
/// engine treats the catalog as read-only reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Problem {
    pub number: u32,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub url: String,
}

impl Problem {
    /// Stored URL, or one derived from the title slug when the catalog
    /// entry has none.
    pub fn canonical_url(&self) -> String {
        if !self.url.is_empty() {
            return self.url.clone();
        }
        format!("https://leetcode.com/problems/{}/", title_slug(&self.title))
    }
}

/// Lowercase-hyphenate a problem title the way the judge site does.
pub fn title_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if ch.is_whitespace() || ch == '-' {
            if !last_was_hyphen {
                slug.push('-');
                last_was_hyphen = true;
            }
        }
        // Punctuation is dropped entirely.
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
