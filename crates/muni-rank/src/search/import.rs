//! CSV intake for the merged municipality table.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use super::domain::{Candidate, CandidateCode, Coordinates, MarketQuote, PopulationBands};

#[derive(Debug)]
pub enum CandidateImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for CandidateImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateImportError::Io(err) => {
                write!(f, "failed to read municipality table: {}", err)
            }
            CandidateImportError::Csv(err) => {
                write!(f, "invalid municipality CSV data: {}", err)
            }
        }
    }
}

impl std::error::Error for CandidateImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CandidateImportError::Io(err) => Some(err),
            CandidateImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CandidateImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CandidateImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct CandidateImporter;

impl CandidateImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Candidate>, CandidateImportError> {
        let file = std::fs::File::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "importing municipality table");
        Self::from_reader(file)
    }

    /// Later rows replace earlier rows with the same code.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Candidate>, CandidateImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut positions: HashMap<CandidateCode, usize> = HashMap::new();

        for record in csv_reader.deserialize::<CandidateRow>() {
            let candidate = record?.into_candidate();
            match positions.get(&candidate.code) {
                Some(&index) => {
                    warn!(code = %candidate.code, "duplicate municipality code, keeping last row");
                    candidates[index] = candidate;
                }
                None => {
                    positions.insert(candidate.code.clone(), candidates.len());
                    candidates.push(candidate);
                }
            }
        }

        Ok(candidates)
    }
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    code: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    region: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    latitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    longitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    population_young: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    population_working: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    population_old: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    avg_price_m2_apartment: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    deals_sale_apartment: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    avg_price_m2_house: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    deals_sale_house: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    avg_rent_m2: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    deals_rent: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    ioz_ratio: Option<String>,
}

impl CandidateRow {
    fn into_candidate(self) -> Candidate {
        let mut candidate = Candidate::new(&self.code, self.name.trim());
        let code = candidate.code.clone();
        let decimal = |column: &'static str, value: &Option<String>| number(&code, column, value);
        let count = |column: &'static str, value: &Option<String>| {
            number(&code, column, value).and_then(|value| {
                let whole = value.round();
                (whole >= 0.0 && whole <= f64::from(u32::MAX)).then_some(whole as u32)
            })
        };

        candidate.region = self.region.clone();
        candidate.coordinates = match (
            decimal("latitude", &self.latitude),
            decimal("longitude", &self.longitude),
        ) {
            (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude),
            _ => None,
        };
        candidate.population = PopulationBands {
            young: count("population_young", &self.population_young),
            working: count("population_working", &self.population_working),
            old: count("population_old", &self.population_old),
        };
        candidate.apartment_sale = MarketQuote {
            price_per_m2: decimal("avg_price_m2_apartment", &self.avg_price_m2_apartment),
            deals: count("deals_sale_apartment", &self.deals_sale_apartment),
        };
        candidate.house_sale = MarketQuote {
            price_per_m2: decimal("avg_price_m2_house", &self.avg_price_m2_house),
            deals: count("deals_sale_house", &self.deals_sale_house),
        };
        candidate.rent = MarketQuote {
            price_per_m2: decimal("avg_rent_m2", &self.avg_rent_m2),
            deals: count("deals_rent", &self.deals_rent),
        };
        candidate.healthcare_ratio =
            decimal("ioz_ratio", &self.ioz_ratio).map(|ratio| ratio.clamp(0.0, 1.0));
        candidate
    }
}

/// Finite numbers only; anything else is logged and treated as absent.
fn number(code: &CandidateCode, column: &'static str, value: &Option<String>) -> Option<f64> {
    let raw = value.as_deref()?;
    match raw.replace(',', ".").parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => {
            warn!(%code, column, value = raw, "ignoring unusable numeric cell");
            None
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
