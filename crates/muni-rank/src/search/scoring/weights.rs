use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::criteria::SearchCriteria;
use super::super::domain::{round_to, Category};
use super::super::model::ScoringModel;
use super::CategoryScores;

/// Category weights. Missing categories weigh 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<Category, f64>);

impl WeightTable {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Category, f64)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn get(&self, category: Category) -> f64 {
        self.0.get(&category).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, category: Category, weight: f64) {
        self.0.insert(category, weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.0.iter().map(|(category, weight)| (*category, *weight))
    }

    /// Defaults, then life-stage priorities, then request overrides. The commute weight
    /// is pinned last: raised to the policy floor with a workplace, zeroed without one.
    pub fn effective(
        model: &ScoringModel,
        criteria: &SearchCriteria,
        workplace_resolved: bool,
    ) -> Self {
        let mut table = model.default_weights.clone();

        if let Some(profile) = criteria.life_stage.and_then(|stage| model.life_stage(stage)) {
            for (category, weight) in &profile.priority_weights {
                table.set(*category, *weight);
            }
        }

        for (category, weight) in &criteria.weight_overrides {
            table.set(*category, *weight);
        }

        let commute = if workplace_resolved {
            table.get(Category::Commute).max(model.commute.minimum_weight)
        } else {
            0.0
        };
        table.set(Category::Commute, commute);
        table
    }

    /// Weighted mean over present scores with positive weight; 0 when nothing contributes.
    ///
    /// Weights are scaled by the largest contributing weight first, so huge but finite
    /// weights cannot overflow the sums.
    pub fn weighted_mean(&self, scores: &CategoryScores) -> f64 {
        let contributing: Vec<(f64, f64)> = scores
            .iter()
            .filter_map(|(category, score)| {
                let weight = self.get(category);
                score
                    .filter(|_| weight > 0.0 && weight.is_finite())
                    .map(|score| (score, weight))
            })
            .collect();
        let scale = contributing
            .iter()
            .map(|(_, weight)| *weight)
            .fold(0.0, f64::max);
        if scale <= 0.0 {
            return 0.0;
        }

        let (sum, total) = contributing
            .iter()
            .fold((0.0, 0.0), |(sum, total), (score, weight)| {
                let weight = weight / scale;
                (sum + score * weight, total + weight)
            });
        let mean = sum / total;
        if mean.is_finite() {
            round_to(mean.clamp(0.0, 100.0), 2)
        } else {
            0.0
        }
    }
}
