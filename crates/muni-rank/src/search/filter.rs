//! Hard constraints applied before any scoring.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::commute::{CommuteAnnotations, CommuteEstimator, TravelMode};
use super::criteria::SearchCriteria;
use super::domain::Candidate;

/// How many candidates each constraint removed. A candidate counts once, against the
/// first rule it failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRejections {
    pub budget: usize,
    pub commute: usize,
    pub population: usize,
    pub region: usize,
}

impl FilterRejections {
    pub fn total(&self) -> usize {
        self.budget + self.commute + self.population + self.region
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Budget,
    Commute,
    Population,
    Region,
}

#[derive(Debug)]
pub struct FilterOutcome<'a> {
    pub passed: Vec<&'a Candidate>,
    pub rejections: FilterRejections,
    pub commutes: CommuteAnnotations,
}

/// Runs budget, commute, population and region checks in that order.
///
/// `workplace` must already be resolved against the candidate list. Routing calls are
/// never made here.
pub fn apply<'a>(
    candidates: &'a [Candidate],
    criteria: &SearchCriteria,
    workplace: Option<&Candidate>,
    estimator: &CommuteEstimator,
) -> FilterOutcome<'a> {
    let mut outcome = FilterOutcome {
        passed: Vec::with_capacity(candidates.len()),
        rejections: FilterRejections::default(),
        commutes: CommuteAnnotations::default(),
    };
    let commute_ceiling = workplace.zip(criteria.max_commute_minutes);
    let mode = TravelMode::from_has_car(criteria.has_car);

    for candidate in candidates {
        let verdict = check_budget(candidate, criteria)
            .or_else(|| {
                commute_ceiling.and_then(|(workplace, ceiling)| {
                    let detail = estimator.resolve(candidate, workplace, mode, None);
                    if detail.is_default_estimate() {
                        return None;
                    }
                    if !detail.same_city && detail.one_way_minutes > ceiling {
                        return Some(Rejection::Commute);
                    }
                    outcome.commutes.insert(candidate.code.clone(), detail);
                    None
                })
            })
            .or_else(|| check_population(candidate, criteria))
            .or_else(|| check_region(candidate, criteria));

        match verdict {
            None => outcome.passed.push(candidate),
            Some(rejection) => {
                debug!(code = %candidate.code, ?rejection, "candidate rejected by hard filter");
                let counter = match rejection {
                    Rejection::Budget => &mut outcome.rejections.budget,
                    Rejection::Commute => &mut outcome.rejections.commute,
                    Rejection::Population => &mut outcome.rejections.population,
                    Rejection::Region => &mut outcome.rejections.region,
                };
                *counter += 1;
            }
        }
    }

    outcome
}

fn check_budget(candidate: &Candidate, criteria: &SearchCriteria) -> Option<Rejection> {
    let price = candidate.unit_price(criteria.mode, criteria.property_kind)?;
    let budget = criteria.budget?;
    (criteria.total_cost(price) > budget).then_some(Rejection::Budget)
}

fn check_population(candidate: &Candidate, criteria: &SearchCriteria) -> Option<Rejection> {
    let floor = criteria.min_population?;
    if !candidate.population.is_measured() {
        return None;
    }
    ((candidate.population.total() as f64) < floor).then_some(Rejection::Population)
}

fn check_region(candidate: &Candidate, criteria: &SearchCriteria) -> Option<Rejection> {
    let allowed = criteria.regions.as_ref()?;
    let region = candidate
        .region
        .as_deref()
        .map(|region| region.trim().to_lowercase())
        .filter(|region| !region.is_empty())?;
    (!allowed.contains(&region)).then_some(Rejection::Region)
}
