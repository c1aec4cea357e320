//! Error types for setting up and running a following session.

/// Errors that abort a session operation.
///
/// Per-sample decoding problems and low confidence detections never show up
/// here, they are absorbed by the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Score contains no notes")]
    EmptyScore,

    #[error("No score has been set")]
    MissingScore,

    #[error("Pitch estimator unavailable: {0}")]
    EstimatorUnavailable(String),

    #[error("Failed to read score: {0}")]
    Score(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MIDI error: {0}")]
    Midi(#[from] midly::Error),

    #[error("Follower thread has stopped")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, Error>;
