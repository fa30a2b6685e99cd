use super::super::domain::{positive, Candidate, Category, PropertyKind, SearchMode};
use super::super::stats::Metric;
use super::{ScoreOutcome, ScoringContext};

pub(crate) fn affordability(candidate: &Candidate, ctx: &ScoringContext<'_>) -> ScoreOutcome {
    let criteria = ctx.criteria;
    let Some(price) = candidate.unit_price(criteria.mode, criteria.property_kind) else {
        return ScoreOutcome::NotApplicable;
    };

    let metric = match (criteria.mode, criteria.property_kind) {
        (SearchMode::Rent, _) => Metric::RentPerM2,
        (SearchMode::Purchase, PropertyKind::Apartment) => Metric::ApartmentPerM2,
        (SearchMode::Purchase, PropertyKind::House) => Metric::HousePerM2,
    };
    let series = ctx.stats.series(metric);
    if series.is_empty() {
        return ScoreOutcome::NotApplicable;
    }

    let mut score = series.inverse_percentile(price);
    if let Some(budget) = criteria.budget {
        let cost = criteria.total_cost(price);
        if cost <= budget {
            let bonus = (1.0 - cost / budget) * ctx.model.scoring.budget_bonus_max;
            score = (score + bonus).min(100.0);
        }
    }
    ScoreOutcome::checked(Category::Affordability, score)
}

/// Unmeasured deal counts are not applicable; a measured zero is the floor.
pub(crate) fn market_activity(candidate: &Candidate, ctx: &ScoringContext<'_>) -> ScoreOutcome {
    match candidate.total_deals() {
        None => ScoreOutcome::NotApplicable,
        Some(0) => ScoreOutcome::Score(0.0),
        Some(deals) => {
            let series = ctx.stats.series(Metric::TotalDeals);
            ScoreOutcome::checked(Category::MarketActivity, series.percentile(deals as f64))
        }
    }
}

pub(crate) fn population_vitality(
    candidate: &Candidate,
    ctx: &ScoringContext<'_>,
) -> ScoreOutcome {
    let Some(shares) = candidate.population.shares() else {
        return ScoreOutcome::NotApplicable;
    };
    let policy = &ctx.model.scoring;

    let series = ctx.stats.series(Metric::WorkingShare);
    let mut score = if series.has_variance() {
        series.percentile(shares.working_pct)
    } else {
        let span = policy.working_share_ceiling - policy.working_share_floor;
        ((shares.working_pct - policy.working_share_floor) / span * 100.0).clamp(0.0, 100.0)
    };

    if let Some(profile) = ctx
        .criteria
        .life_stage
        .and_then(|stage| ctx.model.life_stage(stage))
    {
        let distance = (shares.young_pct / 100.0 - profile.ideal.young).abs()
            + (shares.working_pct / 100.0 - profile.ideal.working).abs()
            + (shares.old_pct / 100.0 - profile.ideal.old).abs();
        let bonus = (1.0 - distance / 2.0) * policy.life_stage_bonus_max;
        score = (score + bonus).min(100.0);
    }

    ScoreOutcome::checked(Category::PopulationVitality, score)
}

/// Physician coverage when reported, otherwise community size as a proxy.
pub(crate) fn healthcare(candidate: &Candidate, ctx: &ScoringContext<'_>) -> ScoreOutcome {
    if let Some(coverage) = candidate.healthcare_coverage() {
        return ScoreOutcome::checked(Category::Healthcare, coverage * 100.0);
    }

    let population = candidate.population.total();
    let series = ctx.stats.series(Metric::Population);
    if population > 0 && !series.is_empty() {
        return ScoreOutcome::checked(Category::Healthcare, series.percentile(population as f64));
    }
    ScoreOutcome::NotApplicable
}

pub(crate) fn commute(candidate: &Candidate, ctx: &ScoringContext<'_>) -> ScoreOutcome {
    if !ctx.workplace_resolved {
        return ScoreOutcome::NotApplicable;
    }
    match ctx.commutes.get(&candidate.code) {
        Some(detail) => {
            ScoreOutcome::checked(Category::Commute, commute_score(detail.one_way_minutes))
        }
        None => ScoreOutcome::NotApplicable,
    }
}

/// Piecewise-linear commute score: 100 at zero minutes, 90/70/40/10 at 15/30/45/60
/// minutes, reaching 0 at 90 minutes. NaN minutes stay NaN.
pub fn commute_score(minutes: f64) -> f64 {
    if minutes.is_nan() {
        return f64::NAN;
    }
    let minutes = minutes.max(0.0);
    let score = if minutes <= 15.0 {
        100.0 - (minutes / 15.0) * 10.0
    } else if minutes <= 30.0 {
        90.0 - ((minutes - 15.0) / 15.0) * 20.0
    } else if minutes <= 45.0 {
        70.0 - ((minutes - 30.0) / 15.0) * 30.0
    } else if minutes <= 60.0 {
        40.0 - ((minutes - 45.0) / 15.0) * 30.0
    } else {
        (10.0 - ((minutes - 60.0) / 30.0) * 10.0).max(0.0)
    };
    score.clamp(0.0, 100.0)
}

pub(crate) fn housing_diversity(
    candidate: &Candidate,
    ctx: &ScoringContext<'_>,
) -> ScoreOutcome {
    let policy = &ctx.model.scoring;
    let kinds = [
        candidate.apartment_sale.price_per_m2,
        candidate.house_sale.price_per_m2,
        candidate.rent.price_per_m2,
    ]
    .into_iter()
    .filter(|price| positive(*price).is_some())
    .count();

    let mut score = kinds as f64 * policy.diversity_points_per_kind;
    if candidate
        .total_deals()
        .is_some_and(|deals| deals >= policy.diversity_liquidity_deals)
    {
        score += policy.diversity_liquidity_points;
    }
    ScoreOutcome::checked(Category::HousingDiversity, score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commute_bands_meet_at_their_boundaries() {
        assert_eq!(commute_score(0.0), 100.0);
        assert_eq!(commute_score(15.0), 90.0);
        assert_eq!(commute_score(30.0), 70.0);
        assert_eq!(commute_score(45.0), 40.0);
        assert_eq!(commute_score(60.0), 10.0);
        assert_eq!(commute_score(90.0), 0.0);
        assert_eq!(commute_score(240.0), 0.0);
        assert!(commute_score(f64::NAN).is_nan());
    }

    #[test]
    fn commute_score_never_increases_with_minutes() {
        let mut previous = commute_score(0.0);
        for step in 1..=1200 {
            let current = commute_score(step as f64 * 0.1);
            assert!(current <= previous, "score rose at {} minutes", step as f64 * 0.1);
            previous = current;
        }
    }
}
