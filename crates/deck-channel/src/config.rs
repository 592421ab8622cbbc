use std::time::Duration;

use crate::env::Env;
use crate::registry::DeckRegistry;

#[derive(Clone)]
pub struct DeckChannelConfig {
    pub control_token: Option<String>,
    pub sse_keepalive: Duration,
    registry: DeckRegistry,
}

impl DeckChannelConfig {
    pub fn new(env: &Env) -> Self {
        Self {
            control_token: env.deck_control_token.clone(),
            sse_keepalive: Duration::from_secs(env.deck_sse_keepalive_secs.max(1)),
            registry: DeckRegistry::new(env.deck_subscriber_buffer, env.deck_max_slides),
        }
    }

    pub fn with_control_token(mut self, token: impl Into<String>) -> Self {
        self.control_token = Some(token.into());
        self
    }

    pub fn with_sse_keepalive(mut self, interval: Duration) -> Self {
        self.sse_keepalive = interval;
        self
    }

    pub fn with_registry(mut self, registry: DeckRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &DeckRegistry {
        &self.registry
    }
}
