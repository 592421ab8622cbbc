use crate::{DeckId, common_derives};

common_derives! {
    pub struct SlideRequest {
        pub slide: u32,
    }
}

common_derives! {
    pub struct SlideResponse {
        pub slide: u32,
    }
}

common_derives! {
    pub struct ReactionRequest {
        pub emoji: String,
    }
}

common_derives! {
    pub struct DeckSnapshot {
        #[cfg_attr(feature = "openapi", schema(value_type = String))]
        pub deck_id: DeckId,
        pub slide: u32,
        pub viewers: usize,
        pub presenters: usize,
    }
}

common_derives! {
    pub struct ErrorDetails {
        pub code: String,
        pub message: String,
    }
}

common_derives! {
    pub struct ErrorResponse {
        pub error: ErrorDetails,
    }
}
