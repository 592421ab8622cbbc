use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};

use podium_deck_interface::{DeckId, ErrorResponse, SlideRequest, SlideResponse};

use super::AppState;
use crate::error::Result;

#[utoipa::path(
    post,
    path = "/decks/{deck_id}/slide",
    params(("deck_id" = String, Path, description = "Deck identifier")),
    request_body = SlideRequest,
    responses(
        (status = 200, description = "Slide broadcast to every subscriber", body = SlideResponse),
        (status = 400, description = "Malformed deck id or slide index out of range", body = ErrorResponse),
        (status = 401, description = "Missing or wrong presenter token", body = ErrorResponse),
        (status = 422, description = "Malformed body"),
    ),
    security(("bearer_auth" = [])),
    tag = "deck",
)]
pub async fn publish_slide(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SlideRequest>,
) -> Result<Json<SlideResponse>> {
    let deck_id = DeckId::new(deck_id)?;
    let role = state.role_from_headers(&headers);

    state
        .registry
        .publish_slide(&deck_id, role, payload.slide)
        .inspect_err(|e| tracing::info!(deck_id = %deck_id, error = %e, "slide_publish_rejected"))?;

    tracing::info!(deck_id = %deck_id, slide = payload.slide, "slide_published");
    Ok(Json(SlideResponse {
        slide: payload.slide,
    }))
}
