//! Immutable scoring configuration handed to the engine at construction time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Category, Coordinates, LifeStage};
use super::scoring::WeightTable;

/// Ideal young/working/old population split for a life stage, as fractions summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeSplit {
    pub young: f64,
    pub working: f64,
    pub old: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeStageProfile {
    pub ideal: AgeSplit,
    /// Layered over the default weights before request overrides apply.
    pub priority_weights: BTreeMap<Category, f64>,
}

/// Well-known city used to recover coordinates for records that lack them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorCity {
    pub name: String,
    pub coordinates: Coordinates,
}

/// Commute resolution constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommutePolicy {
    pub same_city_minutes: f64,
    pub heuristic_rush_hour: f64,
    pub routed_rush_hour_car: f64,
    pub routed_rush_hour_transit: f64,
    pub default_distance_km: f64,
    pub default_minutes_car: f64,
    pub default_minutes_transit: f64,
    /// Minimum commute weight once a workplace resolves.
    pub minimum_weight: f64,
    /// How many top results get a routed refinement.
    pub refine_top: usize,
}

impl Default for CommutePolicy {
    fn default() -> Self {
        Self {
            same_city_minutes: 5.0,
            heuristic_rush_hour: 1.35,
            routed_rush_hour_car: 1.15,
            routed_rush_hour_transit: 1.10,
            default_distance_km: 30.0,
            default_minutes_car: 35.0,
            default_minutes_transit: 55.0,
            minimum_weight: 20.0,
            refine_top: 5,
        }
    }
}

/// Scorer tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub budget_bonus_max: f64,
    pub life_stage_bonus_max: f64,
    /// Working-age share range used when the dataset has nothing to compare against.
    pub working_share_floor: f64,
    pub working_share_ceiling: f64,
    pub diversity_points_per_kind: f64,
    pub diversity_liquidity_points: f64,
    pub diversity_liquidity_deals: u64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            budget_bonus_max: 20.0,
            life_stage_bonus_max: 15.0,
            working_share_floor: 45.0,
            working_share_ceiling: 75.0,
            diversity_points_per_kind: 30.0,
            diversity_liquidity_points: 10.0,
            diversity_liquidity_deals: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringModel {
    pub default_weights: WeightTable,
    pub life_stages: BTreeMap<LifeStage, LifeStageProfile>,
    pub major_cities: Vec<MajorCity>,
    pub commute: CommutePolicy,
    pub scoring: ScoringPolicy,
}

impl ScoringModel {
    pub fn life_stage(&self, stage: LifeStage) -> Option<&LifeStageProfile> {
        self.life_stages.get(&stage)
    }

    /// Case-insensitive lookup in the major-city table.
    pub fn major_city(&self, name: &str) -> Option<Coordinates> {
        let wanted = name.trim().to_lowercase();
        self.major_cities
            .iter()
            .find(|city| city.name.to_lowercase() == wanted)
            .map(|city| city.coordinates)
    }
}

impl Default for ScoringModel {
    fn default() -> Self {
        let default_weights = WeightTable::from_pairs([
            (Category::Affordability, 25.0),
            (Category::MarketActivity, 15.0),
            (Category::PopulationVitality, 10.0),
            (Category::Healthcare, 15.0),
            (Category::Commute, 20.0),
            (Category::HousingDiversity, 15.0),
        ]);

        let life_stages = [
            (LifeStage::Student, (0.20, 0.70, 0.10), (15.0, 5.0, 3.0)),
            (LifeStage::YoungProfessional, (0.15, 0.70, 0.15), (10.0, 8.0, 5.0)),
            (LifeStage::YoungFamily, (0.20, 0.65, 0.15), (8.0, 7.0, 10.0)),
            (LifeStage::EstablishedFamily, (0.18, 0.60, 0.22), (6.0, 6.0, 8.0)),
            (LifeStage::Retiree, (0.10, 0.50, 0.40), (8.0, 4.0, 15.0)),
        ]
        .into_iter()
        .map(|(stage, (young, working, old), (afford, market, health))| {
            let profile = LifeStageProfile {
                ideal: AgeSplit {
                    young,
                    working,
                    old,
                },
                priority_weights: BTreeMap::from([
                    (Category::Affordability, afford),
                    (Category::MarketActivity, market),
                    (Category::Healthcare, health),
                ]),
            };
            (stage, profile)
        })
        .collect();

        let major_cities = [
            ("Ljubljana", 46.0569, 14.5058),
            ("Maribor", 46.5547, 15.6459),
            ("Celje", 46.2397, 15.2677),
            ("Kranj", 46.2428, 14.3555),
            ("Koper", 45.5480, 13.7302),
            ("Novo mesto", 45.8011, 15.1710),
            ("Nova Gorica", 45.9550, 13.6493),
            ("Murska Sobota", 46.6581, 16.1610),
        ]
        .into_iter()
        .filter_map(|(name, latitude, longitude)| {
            Coordinates::new(latitude, longitude).map(|coordinates| MajorCity {
                name: name.to_string(),
                coordinates,
            })
        })
        .collect();

        Self {
            default_weights,
            life_stages,
            major_cities,
            commute: CommutePolicy::default(),
            scoring: ScoringPolicy::default(),
        }
    }
}
