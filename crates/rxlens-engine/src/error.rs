use thiserror::Error;

/// Fatal outcomes of one analysis. An undecodable model answer is not in this
/// list: it degrades to a raw-text result instead.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to read image: {0}")]
    Encoding(#[source] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{message}")]
    ApiRequest { status: u16, message: String },

    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Stable snake_case name used in journal entries and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "encoding",
            Self::Transport(_) => "transport",
            Self::ApiRequest { .. } => "api_request",
            Self::UnexpectedResponse(_) => "unexpected_response",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Checks the acquisition side runs before handing a blob to the pipeline.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Please upload an image file (got {0})")]
    NotAnImage(String),

    #[error("File size should be less than 5MB ({size} bytes, limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}
