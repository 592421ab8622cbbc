use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_MS: u64 = 500;
const DEFAULT_MAX_MS: u64 = 30_000;

/// Reconnect delays: `min(base * 2^attempt, max)`, no jitter, unbounded retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    #[serde(with = "millis", rename = "base_ms")]
    pub base: Duration,
    #[serde(with = "millis", rename = "max_ms")]
    pub max: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(DEFAULT_BASE_MS),
            max: Duration::from_millis(DEFAULT_MAX_MS),
        }
    }
}

impl ReconnectPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    /// Fresh delay sequence. Build a new one after every successful connect.
    ///
    /// backon scales delays in `f32`; each step is rounded back to whole
    /// milliseconds so `100ms` doubles to exactly `200ms`.
    pub fn backoff(&self) -> impl Iterator<Item = Duration> + Send + 'static {
        ExponentialBuilder::default()
            .with_min_delay(self.base)
            .with_max_delay(self.max.max(self.base))
            .with_factor(2.0)
            .without_max_times()
            .build()
            .map(round_to_millis)
    }
}

fn round_to_millis(delay: Duration) -> Duration {
    Duration::from_millis((delay.as_secs_f64() * 1000.0).round() as u64)
}

pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
