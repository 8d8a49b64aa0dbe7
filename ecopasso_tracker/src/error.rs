use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("config error: {0}")]
    Config(String),
    #[error("pending queue storage error: {0}")]
    Storage(String),
    #[error("submission failed: {0}")]
    Submission(String),
    #[error("tracker session error: {0}")]
    Session(String),
    #[error(transparent)]
    InvalidCoordinate(#[from] ecopasso_lib::location_point::InvalidCoordinate),
}
