//! The search-and-rank pipeline.
//!
//! Filter, statistics, scoring, weighted aggregate, threshold gate, ranking, routed
//! refinement of the leaders, truncation, then suggestions and chart data. A search is
//! one synchronous call; only the commute cache inside the estimator outlives it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::chart::{self, RadarChart};
use super::commute::{
    CallBudget, CommuteDetail, CommuteEstimator, CommuteSource, DistanceMatrixClient,
    RoutingService, TravelMode,
};
use super::criteria::SearchCriteria;
use super::domain::{round_to, Candidate, CandidateCode, Category, DemographicShares};
use super::filter::{self, FilterRejections};
use super::model::ScoringModel;
use super::ranking::{rank_scores, sort_descending, Ranking};
use super::scoring::{commute_score, CategoryScores, ScoringContext, WeightTable};
use super::stats::DatasetStatistics;
use super::suggestions;
use crate::config::RoutingConfig;

/// Per-search routing allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingLimits {
    pub calls_per_search: u32,
    pub call_delay: Duration,
}

impl Default for RoutingLimits {
    fn default() -> Self {
        Self {
            calls_per_search: 10,
            call_delay: Duration::from_millis(100),
        }
    }
}

impl From<&RoutingConfig> for RoutingLimits {
    fn from(config: &RoutingConfig) -> Self {
        Self {
            calls_per_search: config.calls_per_search,
            call_delay: config.call_delay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub candidate: Candidate,
    pub scores: CategoryScores,
    pub final_score: f64,
    pub ranking: Ranking,
    pub commute: Option<CommuteDetail>,
    pub demographics: Option<DemographicShares>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkplaceSummary {
    pub code: CandidateCode,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub input_count: usize,
    pub filtered_count: usize,
    pub scored_count: usize,
    pub skipped_count: usize,
    pub ranked_count: usize,
    pub returned_count: usize,
    pub filter_rejections: FilterRejections,
    pub threshold_rejections: BTreeMap<Category, usize>,
    pub applied_thresholds: BTreeMap<Category, f64>,
    pub effective_weights: WeightTable,
    pub workplace: Option<WorkplaceSummary>,
    pub external_calls: u32,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<ScoredResult>,
    pub diagnostics: Diagnostics,
    pub suggestions: Vec<String>,
    pub chart: RadarChart,
}

struct Scored<'a> {
    candidate: &'a Candidate,
    scores: CategoryScores,
    final_score: f64,
}

/// Stateless apart from the commute cache; share one instance across requests.
#[derive(Clone)]
pub struct SearchEngine {
    model: Arc<ScoringModel>,
    estimator: CommuteEstimator,
    limits: RoutingLimits,
}

impl SearchEngine {
    pub fn new(model: ScoringModel) -> Self {
        let model = Arc::new(model);
        let estimator = CommuteEstimator::new(Arc::clone(&model), None);
        Self {
            model,
            estimator,
            limits: RoutingLimits::default(),
        }
    }

    pub fn with_routing(
        model: ScoringModel,
        routing: Arc<dyn RoutingService>,
        limits: RoutingLimits,
    ) -> Self {
        let model = Arc::new(model);
        let estimator = CommuteEstimator::new(Arc::clone(&model), Some(routing));
        Self {
            model,
            estimator,
            limits,
        }
    }

    /// Wires the Distance Matrix client when an API key is configured.
    pub fn from_config(model: ScoringModel, config: &RoutingConfig) -> Self {
        match DistanceMatrixClient::from_config(config) {
            Some(client) => {
                info!(base_url = %config.base_url, "routing service enabled");
                Self::with_routing(model, Arc::new(client), RoutingLimits::from(config))
            }
            None => {
                info!("routing service disabled, commutes use the heuristic estimate");
                Self::new(model)
            }
        }
    }

    pub fn model(&self) -> &ScoringModel {
        &self.model
    }

    pub fn estimator(&self) -> &CommuteEstimator {
        &self.estimator
    }

    pub fn search_and_rank(
        &self,
        candidates: &[Candidate],
        criteria: &SearchCriteria,
    ) -> SearchOutcome {
        info!(candidates = candidates.len(), "starting search");
        let mut budget = CallBudget::new(self.limits.calls_per_search, self.limits.call_delay);
        let mode = TravelMode::from_has_car(criteria.has_car);

        let workplace = criteria.workplace.as_ref().and_then(|code| {
            let found = candidates.iter().find(|candidate| &candidate.code == code);
            match found {
                Some(workplace) => {
                    info!(code = %code, name = %workplace.name, "workplace resolved")
                }
                None => warn!(code = %code, "workplace code not present in candidate list"),
            }
            found
        });

        let filtered = filter::apply(candidates, criteria, workplace, &self.estimator);
        info!(
            passed = filtered.passed.len(),
            rejected = filtered.rejections.total(),
            "hard filter applied"
        );

        let mut commutes = filtered.commutes;
        if let Some(workplace) = workplace {
            for candidate in filtered.passed.iter().copied() {
                if !commutes.contains(&candidate.code) {
                    let detail = self.estimator.resolve(candidate, workplace, mode, None);
                    commutes.insert(candidate.code.clone(), detail);
                }
            }
        }

        let stats = DatasetStatistics::collect(filtered.passed.iter().copied(), &commutes);
        let weights = WeightTable::effective(&self.model, criteria, workplace.is_some());
        let context = ScoringContext {
            criteria,
            model: &self.model,
            stats: &stats,
            commutes: &commutes,
            workplace_resolved: workplace.is_some(),
        };

        let mut skipped_count = 0;
        let mut scored = Vec::with_capacity(filtered.passed.len());
        for candidate in filtered.passed.iter().copied() {
            match context.score_all(candidate) {
                Ok(scores) => scored.push(Scored {
                    candidate,
                    final_score: weights.weighted_mean(&scores),
                    scores,
                }),
                Err(failure) => {
                    warn!(code = %candidate.code, %failure, "skipping candidate");
                    skipped_count += 1;
                }
            }
        }
        let scored_count = scored.len();

        let applied_thresholds: BTreeMap<Category, f64> = criteria
            .min_scores
            .iter()
            .filter(|(_, minimum)| **minimum > 0.0)
            .map(|(category, minimum)| (*category, *minimum))
            .collect();
        let mut threshold_rejections: BTreeMap<Category, usize> = BTreeMap::new();
        scored.retain(|result| {
            let mut passes = true;
            for (category, minimum) in &applied_thresholds {
                if result
                    .scores
                    .get(*category)
                    .is_some_and(|score| score < *minimum)
                {
                    *threshold_rejections.entry(*category).or_default() += 1;
                    passes = false;
                }
            }
            passes
        });

        sort_descending(&mut scored, |result| result.final_score);
        let finals: Vec<f64> = scored.iter().map(|result| result.final_score).collect();
        let mut results: Vec<ScoredResult> = scored
            .into_iter()
            .zip(rank_scores(&finals))
            .map(|(result, ranking)| ScoredResult {
                candidate: result.candidate.clone(),
                scores: result.scores,
                final_score: result.final_score,
                ranking,
                commute: commutes.get(&result.candidate.code).cloned(),
                demographics: result.candidate.population.shares(),
            })
            .collect();
        let ranked_count = results.len();

        if let Some(workplace) = workplace {
            for result in results.iter_mut().take(self.model.commute.refine_top) {
                let candidate = &result.candidate;
                let detail = self
                    .estimator
                    .resolve(candidate, workplace, mode, Some(&mut budget));
                if detail.source == CommuteSource::RoutingService {
                    debug!(code = %candidate.code, "commute refined by routing service");
                    let score = round_to(commute_score(detail.one_way_minutes), 2);
                    result.scores.commute = Some(score);
                    result.commute = Some(detail);
                }
            }
        }

        results.truncate(criteria.limit);

        let diagnostics = Diagnostics {
            input_count: candidates.len(),
            filtered_count: filtered.passed.len(),
            scored_count,
            skipped_count,
            ranked_count,
            returned_count: results.len(),
            filter_rejections: filtered.rejections,
            threshold_rejections,
            applied_thresholds,
            effective_weights: weights,
            workplace: workplace.map(|workplace| WorkplaceSummary {
                code: workplace.code.clone(),
                name: workplace.name.clone(),
            }),
            external_calls: budget.used(),
            generated_at: Utc::now(),
        };

        let suggestions = if results.is_empty() {
            suggestions::generate(&diagnostics, criteria)
        } else {
            Vec::new()
        };
        let chart = chart::build(&results, chart::MAX_SERIES);

        info!(
            returned = diagnostics.returned_count,
            external_calls = diagnostics.external_calls,
            "search finished"
        );

        SearchOutcome {
            results,
            diagnostics,
            suggestions,
            chart,
        }
    }
}
