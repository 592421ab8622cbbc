mod deck;
mod event;
mod http;

pub use deck::*;
pub use event::*;
pub use http::*;

#[macro_export]
macro_rules! common_derives {
    ($item:item) => {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        $item
    };
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("invalid deck id {0:?}: expected 1-{MAX_DECK_ID_LEN} characters of [A-Za-z0-9_-]")]
    InvalidDeckId(String),
    #[error("invalid emoji: {0}")]
    InvalidEmoji(&'static str),
}

pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
