use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed-width municipality identifier (`"61"` and `"061"` are the same code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CandidateCode(String);

impl CandidateCode {
    pub const WIDTH: usize = 3;

    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        Self(format!("{trimmed:0>width$}", width = Self::WIDTH))
    }

    /// Normalizes optional user input; blank strings yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self::new(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CandidateCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<CandidateCode> for String {
    fn from(value: CandidateCode) -> Self {
        value.0
    }
}

impl fmt::Display for CandidateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Both components must be finite and inside the WGS84 ranges.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// Population split across the three age bands. Absent bands count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationBands {
    pub young: Option<u32>,
    pub working: Option<u32>,
    pub old: Option<u32>,
}

impl PopulationBands {
    pub fn is_measured(&self) -> bool {
        self.young.is_some() || self.working.is_some() || self.old.is_some()
    }

    pub fn total(&self) -> u64 {
        [self.young, self.working, self.old]
            .into_iter()
            .map(|band| u64::from(band.unwrap_or(0)))
            .sum()
    }

    /// Young/working/old percentages rounded to one decimal, `None` for an empty population.
    pub fn shares(&self) -> Option<DemographicShares> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let pct =
            |band: Option<u32>| round_to(f64::from(band.unwrap_or(0)) / total as f64 * 100.0, 1);
        Some(DemographicShares {
            young_pct: pct(self.young),
            working_pct: pct(self.working),
            old_pct: pct(self.old),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemographicShares {
    pub young_pct: f64,
    pub working_pct: f64,
    pub old_pct: f64,
}

/// Average price per square metre with the number of transactions behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub price_per_m2: Option<f64>,
    pub deals: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    #[default]
    Apartment,
    House,
}

impl PropertyKind {
    pub const fn label(self) -> &'static str {
        match self {
            PropertyKind::Apartment => "apartment",
            PropertyKind::House => "house",
        }
    }
}

/// One rankable municipality as assembled by the ingestion side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub code: CandidateCode,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub population: PopulationBands,
    #[serde(default)]
    pub apartment_sale: MarketQuote,
    #[serde(default)]
    pub house_sale: MarketQuote,
    #[serde(default)]
    pub rent: MarketQuote,
    #[serde(default)]
    pub healthcare_ratio: Option<f64>,
}

impl Candidate {
    pub fn new(code: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self {
            code: CandidateCode::new(code),
            name: name.into(),
            region: None,
            coordinates: None,
            population: PopulationBands::default(),
            apartment_sale: MarketQuote::default(),
            house_sale: MarketQuote::default(),
            rent: MarketQuote::default(),
            healthcare_ratio: None,
        }
    }

    pub fn sale(&self, kind: PropertyKind) -> &MarketQuote {
        match kind {
            PropertyKind::Apartment => &self.apartment_sale,
            PropertyKind::House => &self.house_sale,
        }
    }

    /// Positive unit price relevant to the search mode, if measured.
    pub fn unit_price(&self, mode: SearchMode, kind: PropertyKind) -> Option<f64> {
        let quote = match mode {
            SearchMode::Rent => &self.rent,
            SearchMode::Purchase => self.sale(kind),
        };
        positive(quote.price_per_m2)
    }

    /// Sum of rent and both sale deal counts; `None` when none of them was measured.
    pub fn total_deals(&self) -> Option<u64> {
        let counts = [self.rent.deals, self.apartment_sale.deals, self.house_sale.deals];
        if counts.iter().all(Option::is_none) {
            return None;
        }
        Some(counts.into_iter().map(|count| u64::from(count.unwrap_or(0))).sum())
    }

    /// Coverage ratio clamped into `[0, 1]`.
    pub fn healthcare_coverage(&self) -> Option<f64> {
        self.healthcare_ratio
            .filter(|ratio| ratio.is_finite())
            .map(|ratio| ratio.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Rent,
    Purchase,
}

impl SearchMode {
    pub const fn default_area_m2(self) -> f64 {
        match self {
            SearchMode::Rent => 60.0,
            SearchMode::Purchase => 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Student,
    YoungProfessional,
    YoungFamily,
    EstablishedFamily,
    Retiree,
}

impl LifeStage {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "student" => Some(Self::Student),
            "young_professional" => Some(Self::YoungProfessional),
            "young_family" => Some(Self::YoungFamily),
            "established_family" => Some(Self::EstablishedFamily),
            "retiree" => Some(Self::Retiree),
            _ => None,
        }
    }
}

/// The six scoring categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Affordability,
    MarketActivity,
    PopulationVitality,
    Healthcare,
    Commute,
    HousingDiversity,
}

impl Category {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Affordability,
            Self::MarketActivity,
            Self::PopulationVitality,
            Self::Healthcare,
            Self::Commute,
            Self::HousingDiversity,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Affordability => "affordability",
            Self::MarketActivity => "market_activity",
            Self::PopulationVitality => "population_vitality",
            Self::Healthcare => "healthcare",
            Self::Commute => "commute",
            Self::HousingDiversity => "housing_diversity",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Affordability => "Affordability",
            Self::MarketActivity => "Market Activity",
            Self::PopulationVitality => "Population Vitality",
            Self::Healthcare => "Healthcare",
            Self::Commute => "Commute",
            Self::HousingDiversity => "Housing Diversity",
        }
    }

    /// Resolves canonical keys and the legacy names older clients still send.
    pub fn from_key(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase();
        let canonical = Self::ordered()
            .into_iter()
            .find(|category| category.key() == key);
        canonical.or_else(|| {
            CATEGORY_ALIASES
                .iter()
                .find(|(alias, _)| *alias == key)
                .map(|(_, category)| *category)
        })
    }
}

const CATEGORY_ALIASES: [(&str, Category); 4] = [
    ("demographics", Category::PopulationVitality),
    ("transportation", Category::Commute),
    ("price_diversity", Category::HousingDiversity),
    ("market_liquidity", Category::MarketActivity),
];

pub(crate) fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite() && *value > 0.0)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
