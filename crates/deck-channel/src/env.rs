use serde::{Deserialize, Deserializer};

pub(crate) const DEFAULT_MAX_SLIDES: u32 = 1000;
pub(crate) const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;
pub(crate) const DEFAULT_SSE_KEEPALIVE_SECS: u64 = 15;

#[derive(Debug, Clone, Deserialize)]
pub struct Env {
    #[serde(default, deserialize_with = "filter_empty")]
    pub deck_control_token: Option<String>,
    #[serde(default = "default_max_slides")]
    pub deck_max_slides: u32,
    #[serde(default = "default_subscriber_buffer")]
    pub deck_subscriber_buffer: usize,
    #[serde(default = "default_sse_keepalive_secs")]
    pub deck_sse_keepalive_secs: u64,
}

impl Default for Env {
    fn default() -> Self {
        Self {
            deck_control_token: None,
            deck_max_slides: DEFAULT_MAX_SLIDES,
            deck_subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            deck_sse_keepalive_secs: DEFAULT_SSE_KEEPALIVE_SECS,
        }
    }
}

fn default_max_slides() -> u32 {
    DEFAULT_MAX_SLIDES
}

fn default_subscriber_buffer() -> usize {
    DEFAULT_SUBSCRIBER_BUFFER
}

fn default_sse_keepalive_secs() -> u64 {
    DEFAULT_SSE_KEEPALIVE_SECS
}

pub fn filter_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
