pub(crate) mod control;
pub(crate) mod reaction;
pub(crate) mod status;
pub(crate) mod stream;

use axum::{
    Router,
    http::{HeaderMap, header::AUTHORIZATION},
    routing::{get, post},
};

use podium_deck_interface::Role;

use crate::config::DeckChannelConfig;
use crate::error::{DeckError, Result};
use crate::registry::DeckRegistry;

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: DeckChannelConfig,
    pub registry: DeckRegistry,
}

impl AppState {
    /// Presenter when the request carries the configured control token.
    pub fn role_from_headers(&self, headers: &HeaderMap) -> Role {
        match (&self.config.control_token, bearer_token(headers)) {
            (Some(expected), Some(given)) if token_eq(expected, given) => Role::Presenter,
            _ => Role::Viewer,
        }
    }

    pub fn authorize(&self, requested: Role, headers: &HeaderMap) -> Result<Role> {
        match requested {
            Role::Viewer => Ok(Role::Viewer),
            Role::Presenter if self.role_from_headers(headers) == Role::Presenter => {
                Ok(Role::Presenter)
            }
            Role::Presenter => Err(DeckError::Unauthorized),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

// Runs in time independent of where the tokens first differ.
fn token_eq(expected: &str, given: &str) -> bool {
    let (expected, given) = (expected.as_bytes(), given.as_bytes());
    if expected.len() != given.len() {
        return false;
    }
    let diff = expected
        .iter()
        .zip(given)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    std::hint::black_box(diff) == 0
}

fn make_state(config: DeckChannelConfig) -> AppState {
    if config.control_token.is_none() {
        tracing::warn!("deck_control_token_missing_presenter_disabled");
    }

    AppState {
        registry: config.registry().clone(),
        config,
    }
}

pub fn router(config: DeckChannelConfig) -> Router {
    let state = make_state(config);

    Router::new()
        .route("/decks/{deck_id}", get(status::deck_status))
        .route("/decks/{deck_id}/ws", get(stream::websocket))
        .route("/decks/{deck_id}/events", get(stream::sse))
        .route("/decks/{deck_id}/slide", post(control::publish_slide))
        .route("/decks/{deck_id}/reactions", post(reaction::send_reaction))
        .with_state(state)
}
