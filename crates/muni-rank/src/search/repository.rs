use super::domain::{Candidate, CandidateCode};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait CandidateRepository: Send + Sync {
    fn all(&self) -> Result<Vec<Candidate>, RepositoryError>;
    fn fetch(&self, code: &CandidateCode) -> Result<Option<Candidate>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
