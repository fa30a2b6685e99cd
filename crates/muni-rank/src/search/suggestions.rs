//! Relaxation hints for searches that came back empty.

use super::criteria::SearchCriteria;
use super::domain::{Category, SearchMode};
use super::engine::Diagnostics;

const MAX_THRESHOLD_HINTS: usize = 3;

pub fn generate(diagnostics: &Diagnostics, criteria: &SearchCriteria) -> Vec<String> {
    if diagnostics.filtered_count == 0 {
        return filter_hints(diagnostics, criteria);
    }
    if diagnostics.scored_count == 0 && diagnostics.skipped_count > 0 {
        return vec![
            "The remaining municipalities have too little data to score; try widening your \
             region or population filters."
                .to_string(),
        ];
    }
    threshold_hints(diagnostics)
}

fn filter_hints(diagnostics: &Diagnostics, criteria: &SearchCriteria) -> Vec<String> {
    let rejections = diagnostics.filter_rejections;
    let mut counted: Vec<(usize, String)> = Vec::new();

    if rejections.budget > 0 {
        let budget_label = match criteria.mode {
            SearchMode::Rent => "monthly rent budget",
            SearchMode::Purchase => "purchase budget",
        };
        counted.push((
            rejections.budget,
            format!(
                "Raise your {budget_label} or reduce the desired area ({} m²): {} municipalities \
                 are over budget.",
                criteria.desired_area_m2, rejections.budget
            ),
        ));
    }
    if rejections.commute > 0 {
        let ceiling = criteria.max_commute_minutes.unwrap_or_default();
        counted.push((
            rejections.commute,
            format!(
                "Allow a longer commute than {ceiling} minutes: {} municipalities are too far \
                 from your workplace.",
                rejections.commute
            ),
        ));
    }
    if rejections.population > 0 {
        let floor = criteria.min_population.unwrap_or_default();
        counted.push((
            rejections.population,
            format!(
                "Lower the minimum population of {floor}: {} municipalities are smaller.",
                rejections.population
            ),
        ));
    }
    if rejections.region > 0 {
        counted.push((
            rejections.region,
            format!(
                "Include more regions: {} municipalities lie outside the selected ones.",
                rejections.region
            ),
        ));
    }

    counted.sort_by(|left, right| right.0.cmp(&left.0));
    let mut hints: Vec<String> = counted.into_iter().map(|(_, hint)| hint).collect();

    if rejections.budget == 0 && rejections.commute == 0 {
        hints.push("Try raising your budget or allowing a longer commute.".to_string());
    }
    hints
}

fn threshold_hints(diagnostics: &Diagnostics) -> Vec<String> {
    let mut ranked: Vec<(Category, usize)> = diagnostics
        .threshold_rejections
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(category, count)| (*category, *count))
        .collect();
    ranked.sort_by(|left, right| right.1.cmp(&left.1));

    ranked
        .into_iter()
        .take(MAX_THRESHOLD_HINTS)
        .map(|(category, count)| {
            let minimum = diagnostics
                .applied_thresholds
                .get(&category)
                .copied()
                .unwrap_or_default();
            format!(
                "Lower the minimum {} score (currently {minimum}): it excluded {count} \
                 municipalities.",
                category.label().to_lowercase()
            )
        })
        .collect()
}
