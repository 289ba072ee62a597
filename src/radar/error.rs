use thiserror::Error;

/// Errors surfaced by the Radar API client.
#[derive(Debug, Error)]
pub enum RadarError {
    #[error("Failed to read private key {path}: {source}")]
    KeyRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse private key {path}: {source}")]
    KeyParse {
        path: String,
        source: jsonwebtoken::errors::Error,
    },

    #[error("Failed to sign assertion: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("No assertion signer configured for live token requests")]
    MissingSigner,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
