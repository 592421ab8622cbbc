use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use podium_deck_interface::{DeckId, ErrorResponse, Reaction, ReactionRequest};

use super::AppState;
use crate::error::Result;

#[utoipa::path(
    post,
    path = "/decks/{deck_id}/reactions",
    params(("deck_id" = String, Path, description = "Deck identifier")),
    request_body = ReactionRequest,
    responses(
        (status = 202, description = "Reaction broadcast", body = Reaction),
        (status = 400, description = "Malformed deck id or emoji", body = ErrorResponse),
    ),
    tag = "deck",
)]
pub async fn send_reaction(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Json(payload): Json<ReactionRequest>,
) -> Result<(StatusCode, Json<Reaction>)> {
    let deck_id = DeckId::new(deck_id)?;
    let reaction = state.registry.publish_reaction(&deck_id, &payload.emoji)?;

    tracing::debug!(deck_id = %deck_id, reaction_id = %reaction.id, "reaction_published");
    Ok((StatusCode::ACCEPTED, Json(reaction)))
}
