use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    /// The API answered `success: false`.
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Json conversion(Serde) error: {0}")]
    Serde(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Serde(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
