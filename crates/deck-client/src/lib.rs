mod backoff;
mod config;
mod consumer;
mod endpoint;
mod error;
mod follower;
mod publisher;
mod reactions;

pub use backoff::ReconnectPolicy;
pub use config::ClientConfig;
pub use consumer::{ConnectionStatus, EventLog, StreamConsumer, StreamTarget};
pub use endpoint::{ControlEndpoint, HttpControlEndpoint, HttpReactionEndpoint, ReactionEndpoint};
pub use error::{ClientError, Result};
pub use follower::{FollowerView, ViewerFollower};
pub use publisher::{PresenterPublisher, PublishStatus};
pub use reactions::{ReactionAggregator, ReactionSender, ReceivedReaction};

pub use podium_deck_interface::{DeckId, Reaction, Role, StreamEvent};
