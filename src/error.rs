use thiserror::Error;

/// Ways a chat round trip can fail. None of these reach the user verbatim.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned HTTP {0}")]
    Status(u16),

    #[error("response body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("response body has no `response` field")]
    MissingResponse,

    #[error("endpoint reported an error: {0}")]
    Remote(String),

    #[error("request task ended without a result")]
    Dropped,
}
