use std::collections::BTreeSet;

use super::common::*;
use crate::search::commute::CommuteSource;
use crate::search::criteria::SearchCriteria;
use crate::search::domain::{CandidateCode, Category, Coordinates};
use crate::search::engine::SearchEngine;
use crate::search::model::ScoringModel;
use crate::search::ranking::Tier;

fn engine() -> SearchEngine {
    SearchEngine::new(ScoringModel::default())
}

fn commuting_to_ljubljana() -> SearchCriteria {
    SearchCriteria {
        workplace: Some(CandidateCode::new(LJUBLJANA)),
        ..SearchCriteria::default()
    }
}

#[test]
fn results_are_ranked_best_first() {
    let candidates = municipalities();
    let outcome = engine().search_and_rank(&candidates, &SearchCriteria::default());

    assert_eq!(outcome.results.len(), candidates.len());
    for pair in outcome.results.windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
        assert!(pair[0].ranking.rank <= pair[1].ranking.rank);
    }
    let leader = &outcome.results[0];
    assert_eq!(leader.ranking.rank, 1);
    assert_eq!(leader.ranking.percentile, 100.0);
    assert_eq!(leader.ranking.tier, Tier::Top10);
    assert!(outcome.suggestions.is_empty());
}

#[test]
fn identical_candidates_share_a_rank() {
    let base = municipalities();
    let mut twin = find(&base, CELJE).clone();
    twin.code = CandidateCode::new("912");
    twin.name = "Celje twin".to_string();
    let candidates = vec![
        find(&base, CELJE).clone(),
        twin,
        find(&base, LJUBLJANA).clone(),
    ];

    let outcome = engine().search_and_rank(&candidates, &SearchCriteria::default());
    let ranking_of = |code: &str| {
        outcome
            .results
            .iter()
            .find(|result| result.candidate.code.as_str() == code)
            .map(|result| (result.final_score, result.ranking))
            .expect("ranked")
    };
    let (original_score, original) = ranking_of(CELJE);
    let (twin_score, twin) = ranking_of("912");
    assert_eq!(original_score, twin_score);
    assert_eq!(original, twin);
    assert!(outcome
        .results
        .iter()
        .all(|result| result.ranking.rank != 2 || original.rank == 2));
    assert_eq!(outcome.results[0].ranking.rank, 1);
}

#[test]
fn limit_truncates_after_ranking() {
    let candidates = municipalities();
    let criteria = SearchCriteria {
        limit: 2,
        ..SearchCriteria::default()
    };

    let outcome = engine().search_and_rank(&candidates, &criteria);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.diagnostics.ranked_count, candidates.len());
    assert_eq!(outcome.diagnostics.returned_count, 2);
    assert_eq!(outcome.results[1].ranking.total, candidates.len());
}

#[test]
fn threshold_gate_counts_every_failing_category() {
    let candidates = municipalities();
    let mut criteria = SearchCriteria::default();
    criteria.min_scores.insert(Category::Affordability, 50.0);
    criteria.min_scores.insert(Category::Healthcare, 75.0);

    let outcome = engine().search_and_rank(&candidates, &criteria);
    let rejections = &outcome.diagnostics.threshold_rejections;
    assert_eq!(rejections.get(&Category::Affordability), Some(&3));
    assert_eq!(rejections.get(&Category::Healthcare), Some(&3));
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].candidate.code.as_str(), MARIBOR);
    for result in &outcome.results {
        assert!(result.scores.affordability.unwrap() >= 50.0);
        assert!(result.scores.healthcare.unwrap() >= 75.0);
    }
}

#[test]
fn not_applicable_categories_never_fail_a_threshold() {
    let candidates = municipalities();
    let mut criteria = SearchCriteria::default();
    criteria.min_scores.insert(Category::Commute, 90.0);

    let outcome = engine().search_and_rank(&candidates, &criteria);
    assert_eq!(outcome.results.len(), candidates.len());
    assert!(outcome.diagnostics.threshold_rejections.is_empty());
    assert_eq!(
        outcome.diagnostics.applied_thresholds.get(&Category::Commute),
        Some(&90.0)
    );
}

#[test]
fn leaders_get_routed_commutes() {
    let routing = StubRouting::answering(25_000.0, 1_200.0);
    let engine = routed_engine(std::sync::Arc::clone(&routing), 10);
    let candidates = municipalities();

    let outcome = engine.search_and_rank(&candidates, &commuting_to_ljubljana());
    assert_eq!(outcome.diagnostics.external_calls, routing.calls());
    assert!(routing.calls() <= 5);

    for result in outcome.results.iter().take(5) {
        let commute = result.commute.as_ref().expect("workplace resolved");
        if commute.same_city {
            assert_eq!(commute.source, CommuteSource::SameCity);
            continue;
        }
        assert_eq!(commute.source, CommuteSource::RoutingService);
        assert_eq!(commute.one_way_minutes, 22.0);
        assert_eq!(result.scores.commute, Some(80.67));
    }
    if let Some(trailing) = outcome.results.get(5) {
        let commute = trailing.commute.as_ref().expect("workplace resolved");
        assert_ne!(commute.source, CommuteSource::RoutingService);
    }
}

#[test]
fn routing_calls_respect_the_per_search_budget() {
    let routing = StubRouting::answering(25_000.0, 1_200.0);
    let engine = routed_engine(std::sync::Arc::clone(&routing), 2);
    let candidates = municipalities();

    let outcome = engine.search_and_rank(&candidates, &commuting_to_ljubljana());
    assert_eq!(outcome.diagnostics.external_calls, 2);
    assert_eq!(routing.calls(), 2);
}

#[test]
fn routed_commutes_are_reused_by_later_searches() {
    let routing = StubRouting::answering(25_000.0, 1_200.0);
    let engine = routed_engine(std::sync::Arc::clone(&routing), 10);
    let candidates = municipalities();

    let first = engine.search_and_rank(&candidates, &commuting_to_ljubljana());
    let second = engine.search_and_rank(&candidates, &commuting_to_ljubljana());
    assert!(first.diagnostics.external_calls > 0);
    assert_eq!(second.diagnostics.external_calls, 0);
    assert_eq!(routing.calls(), first.diagnostics.external_calls);
}

#[test]
fn chart_plots_leaders_and_adds_commute_axis_with_a_workplace() {
    let candidates = municipalities();

    let plain = engine().search_and_rank(&candidates, &SearchCriteria::default());
    assert_eq!(plain.chart.datasets.len(), 5);
    assert_eq!(plain.chart.labels.len(), 5);
    assert!(!plain.chart.labels.iter().any(|label| label == "Commute"));

    let commuting = engine().search_and_rank(&candidates, &commuting_to_ljubljana());
    assert_eq!(commuting.chart.labels.last().map(String::as_str), Some("Commute"));
    assert_eq!(commuting.chart.datasets[0].label, commuting.results[0].candidate.name);
    assert_eq!(commuting.chart.datasets[0].data.len(), 6);
}

#[test]
fn unscorable_candidates_are_skipped_and_explained() {
    let mut candidates = municipalities();
    let mut broken = find(&candidates, MARIBOR).clone();
    broken.code = CandidateCode::new("998");
    broken.name = "Neznano".to_string();
    broken.region = Some("Nikjer".to_string());
    broken.coordinates = Some(Coordinates {
        latitude: f64::NAN,
        longitude: 15.6,
    });
    candidates.push(broken);

    let criteria = SearchCriteria {
        regions: Some(BTreeSet::from(["nikjer".to_string()])),
        ..commuting_to_ljubljana()
    };
    let outcome = engine().search_and_rank(&candidates, &criteria);

    assert!(outcome.results.is_empty());
    let diagnostics = &outcome.diagnostics;
    assert_eq!(diagnostics.filtered_count, 1);
    assert_eq!(diagnostics.skipped_count, 1);
    assert_eq!(diagnostics.scored_count, 0);
    assert_eq!(outcome.suggestions.len(), 1);
    assert!(outcome.suggestions[0].contains("too little data"));
}
