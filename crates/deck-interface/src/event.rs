use crate::{InterfaceError, common_derives, unix_millis};

pub const MAX_EMOJI_BYTES: usize = 32;

common_derives! {
    /// One message on a deck stream.
    ///
    /// `Init` is only ever produced by the server, as the first event a new
    /// subscriber sees. Everything after it arrives in publish order.
    #[serde(tag = "type", rename_all = "lowercase")]
    pub enum StreamEvent {
        Init {
            slide: u32,
        },
        #[serde(rename = "slide")]
        SlideChange {
            slide: u32,
        },
        Reaction {
            id: String,
            emoji: String,
            /// Milliseconds since the Unix epoch.
            ts: u64,
        },
    }
}

impl Eq for StreamEvent {}

impl StreamEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Init { .. } => "init",
            StreamEvent::SlideChange { .. } => "slide",
            StreamEvent::Reaction { .. } => "reaction",
        }
    }

    pub fn slide(&self) -> Option<u32> {
        match self {
            StreamEvent::Init { slide } | StreamEvent::SlideChange { slide } => Some(*slide),
            StreamEvent::Reaction { .. } => None,
        }
    }
}

common_derives! {
    pub struct Reaction {
        pub id: String,
        pub emoji: String,
        pub ts: u64,
    }
}

impl Reaction {
    pub fn new(id: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            emoji: emoji.into(),
            ts: unix_millis(),
        }
    }
}

impl From<Reaction> for StreamEvent {
    fn from(r: Reaction) -> Self {
        StreamEvent::Reaction {
            id: r.id,
            emoji: r.emoji,
            ts: r.ts,
        }
    }
}

pub fn validate_emoji(emoji: &str) -> Result<(), InterfaceError> {
    if emoji.is_empty() {
        return Err(InterfaceError::InvalidEmoji("empty"));
    }
    if emoji.len() > MAX_EMOJI_BYTES {
        return Err(InterfaceError::InvalidEmoji("too long"));
    }
    if emoji.chars().any(char::is_control) {
        return Err(InterfaceError::InvalidEmoji("contains control characters"));
    }
    Ok(())
}
