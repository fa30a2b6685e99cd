use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::criteria::{SearchCriteria, SearchRequest};
use super::domain::{Candidate, CandidateCode};
use super::engine::{SearchEngine, SearchOutcome};
use super::repository::{CandidateRepository, RepositoryError};

/// Service composing the candidate repository with the ranking engine.
pub struct MunicipalitySearchService<R> {
    repository: Arc<R>,
    engine: Arc<SearchEngine>,
}

impl<R> MunicipalitySearchService<R>
where
    R: CandidateRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: SearchEngine) -> Self {
        Self {
            repository,
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Coerces the raw request and ranks the full candidate set. Blocks while routing.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchServiceError> {
        let criteria = SearchCriteria::from_request(request);
        debug!(?criteria, "search criteria resolved");
        self.search_with(&criteria)
    }

    pub fn search_with(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<SearchOutcome, SearchServiceError> {
        let candidates = self.repository.all()?;
        Ok(self.engine.search_and_rank(&candidates, criteria))
    }

    pub fn municipalities(&self) -> Result<Vec<Candidate>, SearchServiceError> {
        Ok(self.repository.all()?)
    }

    /// Region label keyed by municipality code; records without a region are left out.
    pub fn regions(&self) -> Result<BTreeMap<String, String>, SearchServiceError> {
        let regions = self
            .repository
            .all()?
            .into_iter()
            .filter_map(|Candidate { code, region, .. }| {
                let region = region.filter(|region| !region.trim().is_empty())?;
                Some((String::from(code), region))
            })
            .collect();
        Ok(regions)
    }

    /// Codes are zero-padded before lookup, so `"61"` finds `"061"`.
    pub fn municipality(&self, code: &str) -> Result<Candidate, SearchServiceError> {
        let code = CandidateCode::parse(code).ok_or(RepositoryError::NotFound)?;
        let candidate = self
            .repository
            .fetch(&code)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(candidate)
    }
}

/// Error raised by the search service.
#[derive(Debug, thiserror::Error)]
pub enum SearchServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("search worker failed: {0}")]
    Worker(String),
}
