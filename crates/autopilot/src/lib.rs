mod actor;
mod confidence;
mod config;
mod error;
mod keywords;
mod machine;
mod narration;
mod scoring;

pub use actor::{AutopilotActor, AutopilotArgs, AutopilotMsg, AutopilotRuntime, spawn_autopilot};
pub use confidence::ConfidenceSample;
pub use config::AutopilotConfig;
pub use error::AutopilotError;
pub use keywords::{KeywordSet, extract, normalize, tokenize};
pub use machine::{AutoAdvance, AutopilotSnapshot, Effect, Phase};
pub use narration::{NarrationProvider, StaticNarration};
pub use scoring::TranscriptScorer;
