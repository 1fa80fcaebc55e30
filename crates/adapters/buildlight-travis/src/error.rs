use reqwest::StatusCode;

/// Failures talking to the Travis API.
#[derive(Debug, thiserror::Error)]
pub enum TravisError {
    #[error("no repository configured")]
    MissingRepository,

    #[error("applet has not been configured")]
    NotConfigured,

    #[error("api key is not a valid header value")]
    InvalidCredential,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GET {path} returned {status}")]
    Status { path: String, status: StatusCode },

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
