use super::domain::{DiagnosisResult, UsageRecord};

/// Storage failure. Callers treat persistence as best-effort: read
/// failures degrade to "nothing stored" and write failures are logged,
/// never surfaced to the end user.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode record: {0}")]
    Serialization(String),
}

/// Single-slot persistence for the most recent diagnosis result.
///
/// `save` overwrites the slot; the persisted layout is an array of at
/// most one result. Absent or corrupt data loads as `None`.
pub trait ResultRepository: Send + Sync {
    fn save(&self, result: &DiagnosisResult) -> Result<(), RepositoryError>;
    fn load(&self) -> Result<Option<DiagnosisResult>, RepositoryError>;
    fn clear(&self) -> Result<(), RepositoryError>;
}

/// Persistence for the daily usage counter.
pub trait UsageRepository: Send + Sync {
    fn fetch(&self) -> Result<Option<UsageRecord>, RepositoryError>;
    fn store(&self, record: UsageRecord) -> Result<(), RepositoryError>;
}
