use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PadhaiError {
    #[error("Class and subject are required before a summary can be requested")]
    MissingCurriculumContext,

    #[error("Malformed video reference {token:?}: {reason}")]
    MalformedVideoReference { token: String, reason: String },

    #[error("Not a recognizable YouTube video URL: {url}")]
    VideoUrlNotRecognized { url: String },

    #[error("Summary request failed with status {status}: {reason}")]
    RequestFailed { status: u16, reason: String },

    #[error("Summary stream stalled: no data received for {}s", .idle.as_secs())]
    StreamStalled { idle: Duration },

    #[error("Summary generation failed: {reason}")]
    GenerationFailed { reason: String },

    #[error("Could not extract a JSON array from the model response: {reason}")]
    GenerationParseError { reason: String },

    #[error("Model returned an empty answer")]
    EmptyModelAnswer,

    #[error("Invalid chapter id {id:?}: expected a 24-character hex identifier")]
    InvalidChapterId { id: String },

    #[error("Chapter not found: {id}")]
    ChapterNotFound { id: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PadhaiError>;
