use thiserror::Error;

/// Errors that stop a run before or while sheets are processed.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("required column mapping missing: {}", .0.join(", "))]
    MissingMapping(Vec<&'static str>),

    #[error("YouTube API key is not configured")]
    MissingApiKey,

    #[error("no sheets selected")]
    NoSheetsSelected,

    #[error("sheet '{0}' not found in roster")]
    UnknownSheet(String),

    #[error("failed while processing sheet '{sheet}': {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Failure of a single metadata request (one chunk).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}
