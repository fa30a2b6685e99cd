use metrics_exporter_prometheus::PrometheusHandle;
use muni_rank::config::DatasetConfig;
use muni_rank::search::{
    Candidate, CandidateCode, CandidateImportError, CandidateImporter, CandidateRepository,
    RepositoryError,
};
use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

const SAMPLE_MUNICIPALITIES: &str = include_str!("../data/sample_municipalities.csv");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Read-only candidate table loaded once at startup.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCandidateRepository {
    candidates: Arc<Vec<Candidate>>,
}

impl InMemoryCandidateRepository {
    pub(crate) fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates: Arc::new(candidates),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }
}

impl CandidateRepository for InMemoryCandidateRepository {
    fn all(&self) -> Result<Vec<Candidate>, RepositoryError> {
        Ok(self.candidates.as_ref().clone())
    }

    fn fetch(&self, code: &CandidateCode) -> Result<Option<Candidate>, RepositoryError> {
        Ok(self
            .candidates
            .iter()
            .find(|candidate| &candidate.code == code)
            .cloned())
    }
}

/// Loads the configured table, or the bundled sample when none is configured.
pub(crate) fn load_candidates(
    dataset: &DatasetConfig,
) -> Result<Vec<Candidate>, CandidateImportError> {
    let candidates = match &dataset.candidates_csv {
        Some(path) => CandidateImporter::from_path(path)?,
        None => sample_candidates()?,
    };
    info!(count = candidates.len(), "municipality table loaded");
    Ok(candidates)
}

pub(crate) fn sample_candidates() -> Result<Vec<Candidate>, CandidateImportError> {
    CandidateImporter::from_reader(Cursor::new(SAMPLE_MUNICIPALITIES))
}
