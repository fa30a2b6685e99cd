//! Municipality search and ranking.
//!
//! A search takes the full candidate table plus one set of criteria and returns the
//! ranked, explained result list. Hard filters drop candidates outright; the survivors
//! are scored per category against statistics of the surviving set, aggregated with
//! effective weights, gated by per-category minimums and ranked. Commute times come
//! from a tiered estimator whose routing tier is budgeted per search.

pub(crate) mod chart;
pub mod commute;
pub mod criteria;
pub mod domain;
pub mod engine;
pub(crate) mod filter;
pub mod geo;
pub mod import;
pub mod model;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod stats;
pub(crate) mod suggestions;

#[cfg(test)]
mod tests;

pub use chart::{RadarChart, RadarDataset};
pub use commute::{
    CommuteDetail, CommuteEstimator, CommuteSource, DistanceMatrixClient, RouteLeg, RouteRequest,
    RoutingError, RoutingService, TravelMode,
};
pub use criteria::{SearchCriteria, SearchRequest};
pub use domain::{
    Candidate, CandidateCode, Category, Coordinates, DemographicShares, LifeStage, MarketQuote,
    PopulationBands, PropertyKind, SearchMode,
};
pub use engine::{
    Diagnostics, RoutingLimits, ScoredResult, SearchEngine, SearchOutcome, WorkplaceSummary,
};
pub use filter::FilterRejections;
pub use import::{CandidateImportError, CandidateImporter};
pub use model::ScoringModel;
pub use ranking::{Ranking, Tier};
pub use repository::{CandidateRepository, RepositoryError};
pub use router::search_router;
pub use scoring::{CategoryScores, WeightTable};
pub use service::{MunicipalitySearchService, SearchServiceError};
