use axum::{
    Json,
    extract::{Path, State},
};

use podium_deck_interface::{DeckId, DeckSnapshot, ErrorResponse};

use super::AppState;
use crate::error::{DeckError, Result};

#[utoipa::path(
    get,
    path = "/decks/{deck_id}",
    params(("deck_id" = String, Path, description = "Deck identifier")),
    responses(
        (status = 200, description = "Current slide and connection counts", body = DeckSnapshot),
        (status = 404, description = "Deck has never been joined or driven", body = ErrorResponse),
    ),
    tag = "deck",
)]
pub async fn deck_status(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> Result<Json<DeckSnapshot>> {
    let deck_id = DeckId::new(deck_id)?;
    state
        .registry
        .snapshot(&deck_id)
        .map(Json)
        .ok_or_else(|| DeckError::NotFound(deck_id.to_string()))
}
