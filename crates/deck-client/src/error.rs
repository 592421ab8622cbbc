use std::time::Duration;

use podium_deck_interface::InterfaceError;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("presenter credential rejected")]
    Unauthorized,

    #[error("rate limited, retry in {0:?}")]
    RateLimited(Duration),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transient network error: {0}")]
    Transient(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Interface(#[from] InterfaceError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transient(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
