#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AutopilotError {
    #[error("speech service is not connected")]
    SpeechDisconnected,

    #[error("threshold must be within (0, 1), got {0}")]
    InvalidThreshold(f64),

    #[error("narration unavailable: {0}")]
    Narration(String),

    #[error("autopilot actor unavailable: {0}")]
    Actor(String),
}
