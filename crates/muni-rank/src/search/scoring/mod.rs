//! Per-category scorers and the weighted aggregate built on top of them.

mod rules;
mod weights;

pub use rules::commute_score;
pub use weights::WeightTable;

use serde::{Deserialize, Serialize};

use super::commute::CommuteAnnotations;
use super::criteria::SearchCriteria;
use super::domain::{round_to, Candidate, Category};
use super::model::ScoringModel;
use super::stats::DatasetStatistics;

/// Result of one category scorer.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Score(f64),
    NotApplicable,
    Failed(String),
}

impl ScoreOutcome {
    /// Clamps into `[0, 100]` and rounds; non-finite input becomes `Failed`.
    pub(crate) fn checked(category: Category, raw: f64) -> Self {
        if raw.is_finite() {
            Self::Score(round_to(raw.clamp(0.0, 100.0), 2))
        } else {
            Self::Failed(format!("{} produced a non-finite value", category.key()))
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Score(value) => Some(*value),
            Self::NotApplicable | Self::Failed(_) => None,
        }
    }
}

/// The six category scores of a result; `None` means not applicable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub affordability: Option<f64>,
    pub market_activity: Option<f64>,
    pub population_vitality: Option<f64>,
    pub healthcare: Option<f64>,
    pub commute: Option<f64>,
    pub housing_diversity: Option<f64>,
}

impl CategoryScores {
    pub fn get(&self, category: Category) -> Option<f64> {
        match category {
            Category::Affordability => self.affordability,
            Category::MarketActivity => self.market_activity,
            Category::PopulationVitality => self.population_vitality,
            Category::Healthcare => self.healthcare,
            Category::Commute => self.commute,
            Category::HousingDiversity => self.housing_diversity,
        }
    }

    pub fn set(&mut self, category: Category, score: Option<f64>) {
        let slot = match category {
            Category::Affordability => &mut self.affordability,
            Category::MarketActivity => &mut self.market_activity,
            Category::PopulationVitality => &mut self.population_vitality,
            Category::Healthcare => &mut self.healthcare,
            Category::Commute => &mut self.commute,
            Category::HousingDiversity => &mut self.housing_diversity,
        };
        *slot = score;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Option<f64>)> + '_ {
        Category::ordered()
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }
}

/// A category scorer could not produce a number for this candidate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} scoring failed: {reason}", .category.key())]
pub struct ScoringFailure {
    pub category: Category,
    pub reason: String,
}

/// Everything a scorer may look at besides the candidate itself.
pub struct ScoringContext<'a> {
    pub criteria: &'a SearchCriteria,
    pub model: &'a ScoringModel,
    pub stats: &'a DatasetStatistics,
    pub commutes: &'a CommuteAnnotations,
    pub workplace_resolved: bool,
}

impl ScoringContext<'_> {
    pub fn score(&self, category: Category, candidate: &Candidate) -> ScoreOutcome {
        match category {
            Category::Affordability => rules::affordability(candidate, self),
            Category::MarketActivity => rules::market_activity(candidate, self),
            Category::PopulationVitality => rules::population_vitality(candidate, self),
            Category::Healthcare => rules::healthcare(candidate, self),
            Category::Commute => rules::commute(candidate, self),
            Category::HousingDiversity => rules::housing_diversity(candidate, self),
        }
    }

    /// Scores every category, stopping at the first failure.
    pub fn score_all(&self, candidate: &Candidate) -> Result<CategoryScores, ScoringFailure> {
        let mut scores = CategoryScores::default();
        for category in Category::ordered() {
            match self.score(category, candidate) {
                ScoreOutcome::Score(value) => scores.set(category, Some(value)),
                ScoreOutcome::NotApplicable => scores.set(category, None),
                ScoreOutcome::Failed(reason) => return Err(ScoringFailure { category, reason }),
            }
        }
        Ok(scores)
    }
}
