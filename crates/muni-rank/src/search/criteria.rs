//! Criteria intake: the loosely-typed request clients send and the validated
//! [`SearchCriteria`] the engine consumes.
//!
//! Malformed values are coerced rather than rejected: a non-numeric weight becomes 0,
//! the limit is clamped, unknown category names are dropped.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use super::domain::{CandidateCode, Category, LifeStage, PropertyKind, SearchMode};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;
/// Upper bound for a single category weight.
pub const MAX_WEIGHT: f64 = 1000.0;

/// Wire shape of a search request. Field names follow the public API.
///
/// Every field tolerates the wrong JSON type: nulls, scalars where a list is expected and
/// string booleans all deserialize, and the coercion happens in
/// [`SearchCriteria::from_request`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub search_type: Option<String>,
    #[serde(default)]
    pub desired_m2: Option<Value>,
    #[serde(default)]
    pub max_monthly_rent: Option<Value>,
    #[serde(default)]
    pub max_purchase_price: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub property_type: Option<String>,
    #[serde(default)]
    pub workplace_city_code: Option<Value>,
    #[serde(default)]
    pub max_commute_minutes: Option<Value>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub has_car: Option<bool>,
    #[serde(default)]
    pub min_population: Option<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub regions: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub life_stage: Option<String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub weights: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub min_scores: BTreeMap<String, Value>,
    #[serde(default)]
    pub limit: Option<Value>,
}

/// Validated, typed search criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub mode: SearchMode,
    pub desired_area_m2: f64,
    pub budget: Option<f64>,
    pub property_kind: PropertyKind,
    pub workplace: Option<CandidateCode>,
    pub max_commute_minutes: Option<f64>,
    pub has_car: bool,
    pub min_population: Option<f64>,
    pub regions: Option<BTreeSet<String>>,
    pub life_stage: Option<LifeStage>,
    pub weight_overrides: BTreeMap<Category, f64>,
    pub min_scores: BTreeMap<Category, f64>,
    pub limit: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            mode: SearchMode::Rent,
            desired_area_m2: SearchMode::Rent.default_area_m2(),
            budget: None,
            property_kind: PropertyKind::Apartment,
            workplace: None,
            max_commute_minutes: None,
            has_car: false,
            min_population: None,
            regions: None,
            life_stage: None,
            weight_overrides: BTreeMap::new(),
            min_scores: BTreeMap::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchCriteria {
    pub fn from_request(request: &SearchRequest) -> Self {
        let mode = match request
            .search_type
            .as_deref()
            .map(|value| value.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("purchase") | Some("buy") => SearchMode::Purchase,
            _ => SearchMode::Rent,
        };

        let desired_area_m2 = request
            .desired_m2
            .as_ref()
            .and_then(positive_number)
            .unwrap_or_else(|| mode.default_area_m2());

        let budget = match mode {
            SearchMode::Rent => request.max_monthly_rent.as_ref(),
            SearchMode::Purchase => request.max_purchase_price.as_ref(),
        }
        .and_then(positive_number);

        let property_kind = match request
            .property_type
            .as_deref()
            .map(|value| value.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("house") => PropertyKind::House,
            _ => PropertyKind::Apartment,
        };

        let workplace = request.workplace_city_code.as_ref().and_then(|value| match value {
            Value::String(raw) => CandidateCode::parse(raw),
            Value::Number(number) => CandidateCode::parse(&number.to_string()),
            _ => None,
        });

        let regions = request.regions.as_ref().and_then(|regions| {
            let normalized: BTreeSet<String> = regions
                .iter()
                .map(|region| region.trim().to_lowercase())
                .filter(|region| !region.is_empty())
                .collect();
            (!normalized.is_empty()).then_some(normalized)
        });

        let life_stage = request.life_stage.as_deref().and_then(|tag| {
            let stage = LifeStage::from_tag(tag);
            if stage.is_none() && !tag.trim().is_empty() {
                debug!(tag, "ignoring unknown life stage");
            }
            stage
        });

        Self {
            mode,
            desired_area_m2,
            budget,
            property_kind,
            workplace,
            max_commute_minutes: request.max_commute_minutes.as_ref().and_then(positive_number),
            has_car: request.has_car.unwrap_or(false),
            min_population: request.min_population.as_ref().and_then(positive_number),
            regions,
            life_stage,
            weight_overrides: category_map(&request.weights, |value| {
                lenient_number(value)
                    .filter(|weight| weight.is_finite())
                    .unwrap_or(0.0)
                    .clamp(0.0, MAX_WEIGHT)
            }),
            min_scores: category_map(&request.min_scores, |value| {
                lenient_number(value)
                    .filter(|score| score.is_finite())
                    .unwrap_or(0.0)
                    .clamp(0.0, 100.0)
            }),
            limit: clamp_limit(request.limit.as_ref()),
        }
    }

    /// Total cost of the desired area at the given unit price.
    pub fn total_cost(&self, unit_price: f64) -> f64 {
        unit_price * self.desired_area_m2
    }
}

fn category_map(
    raw: &BTreeMap<String, Value>,
    coerce: impl Fn(&Value) -> f64,
) -> BTreeMap<Category, f64> {
    let mut resolved = BTreeMap::new();
    for (name, value) in raw {
        match Category::from_key(name) {
            Some(category) => {
                resolved.insert(category, coerce(value));
            }
            None => debug!(name = name.as_str(), "ignoring unknown scoring category"),
        }
    }
    resolved
}

/// Accepts JSON numbers and numeric strings.
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// Truthy strings and non-zero numbers count as `true`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Bool(flag) => Some(flag),
        Value::Number(number) => Some(number.as_f64().is_some_and(|value| value != 0.0)),
        Value::String(raw) => Some(matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "on"
        )),
        _ => Some(false),
    })
}

/// A bare string is a one-element list; non-string entries are dropped.
fn lenient_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(single) => Some(vec![single]),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

fn lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

fn positive_number(value: &Value) -> Option<f64> {
    lenient_number(value).filter(|number| number.is_finite() && *number > 0.0)
}

fn clamp_limit(value: Option<&Value>) -> usize {
    match value.and_then(lenient_number) {
        Some(limit) if limit.is_finite() => limit.trunc().clamp(1.0, MAX_LIMIT as f64) as usize,
        _ => DEFAULT_LIMIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> SearchRequest {
        serde_json::from_value(value).expect("valid request shape")
    }

    #[test]
    fn defaults_apply_to_empty_request() {
        let criteria = SearchCriteria::from_request(&SearchRequest::default());
        assert_eq!(criteria, SearchCriteria::default());
    }

    #[test]
    fn budget_follows_search_mode() {
        let criteria = SearchCriteria::from_request(&request(json!({
            "search_type": "purchase",
            "max_monthly_rent": 900,
            "max_purchase_price": 250000,
            "property_type": "house"
        })));
        assert_eq!(criteria.mode, SearchMode::Purchase);
        assert_eq!(criteria.budget, Some(250000.0));
        assert_eq!(criteria.property_kind, PropertyKind::House);
        assert_eq!(criteria.desired_area_m2, 70.0);
    }

    #[test]
    fn limit_is_clamped_and_garbage_falls_back() {
        let high = SearchCriteria::from_request(&request(json!({ "limit": 500 })));
        assert_eq!(high.limit, MAX_LIMIT);
        let low = SearchCriteria::from_request(&request(json!({ "limit": -3 })));
        assert_eq!(low.limit, 1);
        let garbage = SearchCriteria::from_request(&request(json!({ "limit": "lots" })));
        assert_eq!(garbage.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn weights_resolve_aliases_and_coerce_garbage() {
        let criteria = SearchCriteria::from_request(&request(json!({
            "weights": {
                "demographics": 12,
                "transportation": "7.5",
                "healthcare": "plenty",
                "weather": 3
            }
        })));
        assert_eq!(
            criteria.weight_overrides.get(&Category::PopulationVitality),
            Some(&12.0)
        );
        assert_eq!(criteria.weight_overrides.get(&Category::Commute), Some(&7.5));
        assert_eq!(criteria.weight_overrides.get(&Category::Healthcare), Some(&0.0));
        assert_eq!(criteria.weight_overrides.len(), 3);
    }

    #[test]
    fn weights_are_bounded() {
        let criteria = SearchCriteria::from_request(&request(json!({
            "weights": { "affordability": 1e308, "healthcare": -4 }
        })));
        assert_eq!(
            criteria.weight_overrides.get(&Category::Affordability),
            Some(&MAX_WEIGHT)
        );
        assert_eq!(criteria.weight_overrides.get(&Category::Healthcare), Some(&0.0));
    }

    #[test]
    fn mistyped_fields_are_coerced_instead_of_rejected() {
        let criteria = SearchCriteria::from_request(&request(json!({
            "search_type": 7,
            "property_type": ["house"],
            "has_car": "yes",
            "regions": "Gorenjska",
            "life_stage": false,
            "weights": null,
            "min_scores": "high"
        })));
        assert_eq!(criteria.mode, SearchMode::Rent);
        assert_eq!(criteria.property_kind, PropertyKind::Apartment);
        assert!(criteria.has_car);
        assert_eq!(
            criteria.regions,
            Some(BTreeSet::from(["gorenjska".to_string()]))
        );
        assert!(criteria.life_stage.is_none());
        assert!(criteria.weight_overrides.is_empty());
        assert!(criteria.min_scores.is_empty());
    }

    #[test]
    fn car_flag_accepts_numbers_and_strings() {
        let flag = |value: Value| {
            SearchCriteria::from_request(&request(json!({ "has_car": value }))).has_car
        };
        assert!(flag(json!(1)));
        assert!(flag(json!("TRUE")));
        assert!(!flag(json!(0)));
        assert!(!flag(json!("no")));
        assert!(!flag(Value::Null));
    }

    #[test]
    fn workplace_codes_are_normalized() {
        let numeric = SearchCriteria::from_request(&request(json!({ "workplace_city_code": 61 })));
        assert_eq!(numeric.workplace, Some(CandidateCode::new("061")));
        let blank = SearchCriteria::from_request(&request(json!({ "workplace_city_code": "" })));
        assert!(blank.workplace.is_none());
    }

    #[test]
    fn min_scores_are_clamped() {
        let criteria = SearchCriteria::from_request(&request(json!({
            "min_scores": { "affordability": 140, "market_liquidity": -5 }
        })));
        assert_eq!(criteria.min_scores.get(&Category::Affordability), Some(&100.0));
        assert_eq!(criteria.min_scores.get(&Category::MarketActivity), Some(&0.0));
    }

    #[test]
    fn regions_are_lowercased_and_blank_lists_ignored() {
        let criteria = SearchCriteria::from_request(&request(json!({
            "regions": ["Gorenjska", " osrednjeslovenska "],
            "life_stage": "Young Family"
        })));
        let regions = criteria.regions.expect("regions kept");
        assert!(regions.contains("gorenjska"));
        assert!(regions.contains("osrednjeslovenska"));
        assert_eq!(criteria.life_stage, Some(LifeStage::YoungFamily));

        let blank = SearchCriteria::from_request(&request(json!({ "regions": ["  "] })));
        assert!(blank.regions.is_none());
    }
}
