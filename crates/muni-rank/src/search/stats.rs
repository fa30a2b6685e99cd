//! Dataset-relative statistics over the filtered candidate set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::commute::CommuteAnnotations;
use super::domain::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    RentPerM2,
    ApartmentPerM2,
    HousePerM2,
    TotalDeals,
    Population,
    WorkingShare,
    HealthcareRatio,
    CommuteMinutes,
}

/// Sorted positive values of one metric with their summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    values: Vec<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

impl MetricSeries {
    /// Keeps finite, strictly positive values only.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut values: Vec<f64> = values
            .into_iter()
            .filter(|value| value.is_finite() && *value > 0.0)
            .collect();
        values.sort_by(f64::total_cmp);

        let min = values.first().copied();
        let max = values.last().copied();
        let avg = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
        Self {
            values,
            min,
            max,
            avg,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_variance(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if max > min)
    }

    /// Share of series values `<= value`, times 100. Degenerate series sit at the midpoint.
    pub fn percentile(&self, value: f64) -> f64 {
        if !self.has_variance() {
            return 50.0;
        }
        let at_or_below = self.values.partition_point(|candidate| *candidate <= value);
        at_or_below as f64 / self.values.len() as f64 * 100.0
    }

    /// Percentile for metrics where lower is better.
    pub fn inverse_percentile(&self, value: f64) -> f64 {
        if !self.has_variance() {
            return 50.0;
        }
        100.0 - self.percentile(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    series: BTreeMap<Metric, MetricSeries>,
}

impl DatasetStatistics {
    /// Collects every metric over `candidates`. Default-estimate commutes stay out of the
    /// commute series.
    pub fn collect<'a>(
        candidates: impl IntoIterator<Item = &'a Candidate>,
        commutes: &CommuteAnnotations,
    ) -> Self {
        let mut raw: BTreeMap<Metric, Vec<f64>> = BTreeMap::new();
        let mut push = |metric: Metric, value: Option<f64>| {
            if let Some(value) = value {
                raw.entry(metric).or_default().push(value);
            }
        };

        for candidate in candidates {
            push(Metric::RentPerM2, candidate.rent.price_per_m2);
            push(Metric::ApartmentPerM2, candidate.apartment_sale.price_per_m2);
            push(Metric::HousePerM2, candidate.house_sale.price_per_m2);
            push(
                Metric::TotalDeals,
                candidate.total_deals().map(|deals| deals as f64),
            );

            let population = candidate.population.total();
            if population > 0 {
                push(Metric::Population, Some(population as f64));
                push(
                    Metric::WorkingShare,
                    candidate.population.shares().map(|shares| shares.working_pct),
                );
            }

            push(Metric::HealthcareRatio, candidate.healthcare_coverage());

            let commute = commutes
                .get(&candidate.code)
                .filter(|detail| !detail.is_default_estimate())
                .map(|detail| detail.one_way_minutes);
            push(Metric::CommuteMinutes, commute);
        }

        let series = raw
            .into_iter()
            .map(|(metric, values)| (metric, MetricSeries::from_values(values)))
            .collect();
        Self { series }
    }

    /// Empty series for metrics nobody reported.
    pub fn series(&self, metric: Metric) -> &MetricSeries {
        static EMPTY: MetricSeries = MetricSeries {
            values: Vec::new(),
            min: None,
            max: None,
            avg: None,
        };
        self.series.get(&metric).unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_values_are_excluded() {
        let series = MetricSeries::from_values([0.0, -3.0, 12.0, f64::NAN, 8.0]);
        assert_eq!(series.values(), &[8.0, 12.0]);
        assert_eq!(series.min, Some(8.0));
        assert_eq!(series.avg, Some(10.0));
    }

    #[test]
    fn percentile_counts_values_at_or_below() {
        let series = MetricSeries::from_values([10.0, 20.0, 30.0, 40.0]);
        assert_eq!(series.percentile(20.0), 50.0);
        assert_eq!(series.percentile(40.0), 100.0);
        assert_eq!(series.percentile(5.0), 0.0);
        assert_eq!(series.inverse_percentile(10.0), 75.0);
    }

    #[test]
    fn flat_and_empty_series_yield_midpoint() {
        let flat = MetricSeries::from_values([14.0, 14.0, 14.0]);
        assert_eq!(flat.percentile(14.0), 50.0);
        assert_eq!(flat.inverse_percentile(14.0), 50.0);
        assert_eq!(MetricSeries::default().percentile(3.0), 50.0);
    }

    #[test]
    fn collect_skips_unmeasured_fields() {
        let mut priced = Candidate::new("1", "Ajdovščina");
        priced.rent.price_per_m2 = Some(9.5);
        priced.rent.deals = Some(0);
        let bare = Candidate::new("2", "Beltinci");

        let stats = DatasetStatistics::collect([&priced, &bare], &CommuteAnnotations::default());
        assert_eq!(stats.series(Metric::RentPerM2).len(), 1);
        assert!(stats.series(Metric::TotalDeals).is_empty());
        assert!(stats.series(Metric::Population).is_empty());
        assert!(stats.series(Metric::CommuteMinutes).is_empty());
    }
}
