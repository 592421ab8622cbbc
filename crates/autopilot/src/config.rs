use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AutopilotError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutopilotConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_grace_ms", rename = "grace_ms", with = "grace_ms")]
    pub grace: Duration,
}

fn default_threshold() -> f64 {
    0.55
}

fn default_grace_ms() -> Duration {
    Duration::from_millis(1500)
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            grace: default_grace_ms(),
        }
    }
}

impl AutopilotConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn validate(&self) -> Result<(), AutopilotError> {
        validate_threshold(self.threshold)
    }
}

/// Thresholds live in the open interval (0, 1).
pub(crate) fn validate_threshold(threshold: f64) -> Result<(), AutopilotError> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(AutopilotError::InvalidThreshold(threshold))
    }
}

mod grace_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
