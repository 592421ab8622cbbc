use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::control::publish_slide,
        crate::routes::reaction::send_reaction,
        crate::routes::status::deck_status,
        crate::routes::stream::websocket,
        crate::routes::stream::sse,
    ),
    components(
        schemas(
            podium_deck_interface::SlideRequest,
            podium_deck_interface::SlideResponse,
            podium_deck_interface::ReactionRequest,
            podium_deck_interface::Reaction,
            podium_deck_interface::DeckSnapshot,
            podium_deck_interface::ErrorResponse,
            podium_deck_interface::ErrorDetails,
            podium_deck_interface::Role,
            podium_deck_interface::StreamEvent,
        )
    ),
    tags(
        (name = "deck", description = "Slide sync control and reactions")
    )
)]
struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        insta::assert_debug_snapshot!(paths, @r#"
        [
            "/decks/{deck_id}",
            "/decks/{deck_id}/events",
            "/decks/{deck_id}/reactions",
            "/decks/{deck_id}/slide",
            "/decks/{deck_id}/ws",
        ]
        "#);
    }
}
