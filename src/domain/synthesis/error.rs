use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum SynthesisServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("audio is still being generated")]
    NotReady,
    #[error("audio not found: {0}")]
    NotFound(String),
    #[error("no valid audio was produced after {attempts} attempt(s)")]
    NoValidSegments { attempts: u32 },
    #[error("failed to write audio file: {0}")]
    ArtifactWrite(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SynthesisServiceError> for AppError {
    fn from(err: SynthesisServiceError) -> Self {
        match err {
            SynthesisServiceError::InvalidInput(msg) => AppError::BadRequest(msg),
            SynthesisServiceError::NotReady => {
                AppError::Conflict("Audio is still being generated".to_string())
            }
            SynthesisServiceError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}
