use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "top_10")]
    Top10,
    #[serde(rename = "top_25")]
    Top25,
    #[serde(rename = "top_50")]
    Top50,
    #[serde(rename = "bottom_50")]
    Bottom50,
}

impl Tier {
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile >= 90.0 {
            Self::Top10
        } else if percentile >= 75.0 {
            Self::Top25
        } else if percentile >= 50.0 {
            Self::Top50
        } else {
            Self::Bottom50
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top10 => "top_10",
            Self::Top25 => "top_25",
            Self::Top50 => "top_50",
            Self::Bottom50 => "bottom_50",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub rank: usize,
    pub total: usize,
    pub percentile: f64,
    pub tier: Tier,
}

/// Descending by score; equal scores keep their input order.
pub fn sort_descending<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|left, right| {
        score(right)
            .partial_cmp(&score(left))
            .unwrap_or(Ordering::Equal)
    });
}

/// Ranks each score against the whole set. Ties share the better rank.
pub fn rank_scores(scores: &[f64]) -> Vec<Ranking> {
    let total = scores.len();
    scores
        .iter()
        .map(|score| {
            let rank = 1 + scores.iter().filter(|other| **other > *score).count();
            let percentile = (total - rank + 1) as f64 / total as f64 * 100.0;
            Ranking {
                rank,
                total,
                percentile: round_to(percentile, 1),
                tier: Tier::from_percentile(percentile),
            }
        })
        .collect()
}
