use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use podium_deck_interface::{DeckId, Role};

use crate::backoff::{ReconnectPolicy, millis};
use crate::consumer::StreamTarget;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub deck_id: DeckId,
    #[serde(default)]
    pub control_token: Option<String>,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
    #[serde(default = "default_publish_debounce", with = "millis")]
    pub publish_debounce: Duration,
    #[serde(default = "default_reaction_window", with = "millis")]
    pub reaction_window: Duration,
    #[serde(default = "default_reaction_ttl", with = "millis")]
    pub reaction_ttl: Duration,
    #[serde(default = "default_sweep_interval", with = "millis")]
    pub sweep_interval: Duration,
}

fn default_publish_debounce() -> Duration {
    Duration::from_millis(50)
}

fn default_reaction_window() -> Duration {
    Duration::from_millis(400)
}

fn default_reaction_ttl() -> Duration {
    Duration::from_secs(10)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(5)
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, deck_id: DeckId) -> Self {
        Self {
            base_url: base_url.into(),
            deck_id,
            control_token: None,
            reconnect: ReconnectPolicy::default(),
            publish_debounce: default_publish_debounce(),
            reaction_window: default_reaction_window(),
            reaction_ttl: default_reaction_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }

    pub fn with_control_token(mut self, token: impl Into<String>) -> Self {
        self.control_token = Some(token.into());
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn with_publish_debounce(mut self, debounce: Duration) -> Self {
        self.publish_debounce = debounce;
        self
    }

    pub fn with_reaction_window(mut self, window: Duration) -> Self {
        self.reaction_window = window;
        self
    }

    pub fn with_reaction_ttl(mut self, ttl: Duration) -> Self {
        self.reaction_ttl = ttl;
        self
    }

    fn deck_url(&self, suffix: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["decks", self.deck_id.as_str()]);
        if !suffix.is_empty() {
            url.path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
                .push(suffix);
        }
        Ok(url)
    }

    pub fn stream_url(&self, role: Role) -> Result<Url> {
        let mut url = self.deck_url("ws")?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(ClientError::InvalidUrl(format!("unsupported scheme {other}"))),
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?;
        url.query_pairs_mut().append_pair("role", role.as_str());
        Ok(url)
    }

    pub fn control_url(&self) -> Result<Url> {
        self.deck_url("slide")
    }

    pub fn reactions_url(&self) -> Result<Url> {
        self.deck_url("reactions")
    }

    pub fn status_url(&self) -> Result<Url> {
        self.deck_url("")
    }

    /// Presenter streams carry the control token.
    pub fn stream_target(&self, role: Role) -> Result<StreamTarget> {
        let target = StreamTarget::new(self.stream_url(role)?);
        Ok(match (role, &self.control_token) {
            (Role::Presenter, Some(token)) => target.with_bearer(token.clone()),
            _ => target,
        })
    }
}
