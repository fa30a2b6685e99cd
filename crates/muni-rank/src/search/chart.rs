//! Radar chart series for the leading results.

use serde::{Deserialize, Serialize};

use super::domain::Category;
use super::engine::ScoredResult;

pub const MAX_SERIES: usize = 5;
pub const PALETTE: [&str; 5] = ["#10B981", "#3B82F6", "#F59E0B", "#8B5CF6", "#EC4899"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarChart {
    pub labels: Vec<String>,
    pub datasets: Vec<RadarDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub color: String,
}

/// Commute is appended as the last axis only when one of the plotted results has it.
pub fn build(results: &[ScoredResult], max_series: usize) -> RadarChart {
    let leaders = &results[..results.len().min(max_series)];
    let mut axes = vec![
        Category::Affordability,
        Category::MarketActivity,
        Category::PopulationVitality,
        Category::Healthcare,
        Category::HousingDiversity,
    ];
    if leaders.iter().any(|result| result.scores.commute.is_some()) {
        axes.push(Category::Commute);
    }

    let datasets = leaders
        .iter()
        .enumerate()
        .map(|(index, result)| RadarDataset {
            label: result.candidate.name.clone(),
            data: axes
                .iter()
                .map(|axis| result.scores.get(*axis).unwrap_or(0.0))
                .collect(),
            color: PALETTE[index % PALETTE.len()].to_string(),
        })
        .collect();

    RadarChart {
        labels: axes.iter().map(|axis| axis.label().to_string()).collect(),
        datasets,
    }
}
