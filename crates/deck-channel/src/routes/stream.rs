use axum::{
    extract::{Path, Query, State, ws::WebSocketUpgrade},
    http::HeaderMap,
    response::{
        IntoResponse, Response,
        sse::{KeepAlive, Sse},
    },
};
use serde::Deserialize;

use podium_deck_interface::{DeckId, ErrorResponse, Role, StreamEvent};

use super::AppState;
use crate::error::Result;
use crate::session;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamParams {
    /// `presenter` requires the control token.
    #[serde(default)]
    pub role: Role,
}

#[utoipa::path(
    get,
    path = "/decks/{deck_id}/ws",
    params(("deck_id" = String, Path, description = "Deck identifier"), StreamParams),
    responses(
        (status = 101, description = "WebSocket upgrade; text frames carry `StreamEvent` JSON, `init` first"),
        (status = 400, description = "Malformed deck id", body = ErrorResponse),
        (status = 401, description = "Presenter role without a valid token", body = ErrorResponse),
    ),
    tag = "deck",
)]
pub async fn websocket(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let deck_id = DeckId::new(deck_id)?;
    let role = state.authorize(params.role, &headers)?;

    // Subscribing before the upgrade pins the Init slide to request time.
    let subscription = state.registry.subscribe(&deck_id, role);
    let keepalive = state.config.sse_keepalive;

    Ok(ws
        .on_upgrade(move |socket| session::handle_websocket(socket, subscription, keepalive))
        .into_response())
}

#[utoipa::path(
    get,
    path = "/decks/{deck_id}/events",
    params(("deck_id" = String, Path, description = "Deck identifier"), StreamParams),
    responses(
        (status = 200, description = "Server-sent events named by `StreamEvent` type, `init` first", content_type = "text/event-stream", body = StreamEvent),
        (status = 400, description = "Malformed deck id", body = ErrorResponse),
        (status = 401, description = "Presenter role without a valid token", body = ErrorResponse),
    ),
    tag = "deck",
)]
pub async fn sse(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
) -> Result<Response> {
    let deck_id = DeckId::new(deck_id)?;
    let role = state.authorize(params.role, &headers)?;
    let subscription = state.registry.subscribe(&deck_id, role);

    Ok(Sse::new(session::sse_events(subscription))
        .keep_alive(KeepAlive::new().interval(state.config.sse_keepalive))
        .into_response())
}
