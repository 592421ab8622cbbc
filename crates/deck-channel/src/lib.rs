mod config;
mod env;
mod error;
mod openapi;
mod registry;
mod routes;
mod session;

pub use config::DeckChannelConfig;
pub use env::{Env, filter_empty};
pub use error::{DeckError, Result};
pub use openapi::openapi;
pub use registry::{ConnectionHandle, DeckRegistry, Subscription};
pub use routes::router;

pub use podium_deck_interface::{DeckId, DeckSnapshot, Reaction, Role, StreamEvent};
