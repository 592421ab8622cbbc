use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::confidence::ConfidenceSample;
use crate::config::{AutopilotConfig, validate_threshold};
use crate::error::AutopilotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Disabled,
    Idle,
    Countdown,
    /// Terminal until the active slide changes.
    Advanced,
    /// Re-arms once confidence drops below the threshold.
    Cancelled,
}

/// Side effects the driver must carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartCountdown { generation: u64, duration: Duration },
    CancelCountdown { generation: u64 },
    Advance { from_slide: u32 },
    DisconnectSpeech,
}

#[derive(Debug, Clone, Copy)]
struct Countdown {
    generation: u64,
    started_at: Instant,
    duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutopilotSnapshot {
    pub phase: Phase,
    pub slide: u32,
    pub threshold: f64,
    pub speech_connected: bool,
    pub deterministic: Option<f64>,
    pub external: Option<f64>,
    pub combined: f64,
    pub countdown_remaining_ms: Option<u64>,
}

/// Auto-advance decision state for one presenting session.
///
/// Pure: time comes in through `now`, timers go out as [`Effect`]s.
/// Countdowns carry a generation so a timer that fires after being
/// invalidated is ignored.
#[derive(Debug)]
pub struct AutoAdvance {
    phase: Phase,
    threshold: f64,
    grace: Duration,
    slide: u32,
    sample: ConfidenceSample,
    countdown: Option<Countdown>,
    generation: u64,
}

impl AutoAdvance {
    pub fn new(config: &AutopilotConfig, slide: u32) -> Self {
        Self {
            phase: Phase::Disabled,
            threshold: config.threshold,
            grace: config.grace,
            slide,
            sample: ConfidenceSample::default(),
            countdown: None,
            generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.phase != Phase::Disabled
    }

    pub fn slide(&self) -> u32 {
        self.slide
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn sample(&self) -> ConfidenceSample {
        self.sample
    }

    pub fn countdown_remaining(&self, now: Instant) -> Option<Duration> {
        self.countdown
            .map(|c| c.duration.saturating_sub(now.saturating_duration_since(c.started_at)))
    }

    pub fn snapshot(&self, speech_connected: bool, now: Instant) -> AutopilotSnapshot {
        AutopilotSnapshot {
            phase: self.phase,
            slide: self.slide,
            threshold: self.threshold,
            speech_connected,
            deterministic: self.sample.deterministic,
            external: self.sample.external,
            combined: self.sample.combined(),
            countdown_remaining_ms: self
                .countdown_remaining(now)
                .map(|d| d.as_millis() as u64),
        }
    }

    pub fn enable(&mut self, now: Instant) -> Vec<Effect> {
        if self.phase != Phase::Disabled {
            return Vec::new();
        }
        self.phase = Phase::Idle;
        tracing::info!(slide = self.slide, "autopilot_enabled");
        self.evaluate(now)
    }

    pub fn disable(&mut self) -> Vec<Effect> {
        if self.phase == Phase::Disabled {
            return Vec::new();
        }
        let mut effects = self.invalidate_countdown();
        self.phase = Phase::Disabled;
        effects.push(Effect::DisconnectSpeech);
        tracing::info!(slide = self.slide, "autopilot_disabled");
        effects
    }

    /// Applies to the next evaluation; does not re-evaluate by itself.
    pub fn set_threshold(&mut self, threshold: f64) -> Result<(), AutopilotError> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    pub fn update_sample(&mut self, sample: ConfidenceSample, now: Instant) -> Vec<Effect> {
        self.sample = sample;
        self.evaluate(now)
    }

    /// Explicit user cancel. A no-op outside `Idle` and `Countdown`.
    pub fn cancel(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Idle | Phase::Countdown => {
                let effects = self.invalidate_countdown();
                self.phase = Phase::Cancelled;
                tracing::info!(slide = self.slide, "autopilot_cancelled");
                effects
            }
            _ => Vec::new(),
        }
    }

    /// Any change of the active slide, including one this machine caused.
    pub fn slide_changed(&mut self, slide: u32) -> Vec<Effect> {
        let effects = self.invalidate_countdown();
        self.slide = slide;
        self.sample = ConfidenceSample::default();
        if self.phase != Phase::Disabled {
            self.phase = Phase::Idle;
        }
        effects
    }

    pub fn countdown_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        match (self.phase, self.countdown) {
            (Phase::Countdown, Some(countdown)) if countdown.generation == generation => {
                self.countdown = None;
                self.phase = Phase::Advanced;
                tracing::info!(slide = self.slide, generation, "autopilot_advance");
                vec![Effect::Advance {
                    from_slide: self.slide,
                }]
            }
            _ => {
                tracing::debug!(generation, "autopilot_stale_countdown_ignored");
                Vec::new()
            }
        }
    }

    fn evaluate(&mut self, now: Instant) -> Vec<Effect> {
        let crossed = self.sample.combined() >= self.threshold;

        match (self.phase, crossed) {
            (Phase::Idle, true) => {
                self.generation += 1;
                let countdown = Countdown {
                    generation: self.generation,
                    started_at: now,
                    duration: self.grace,
                };
                self.countdown = Some(countdown);
                self.phase = Phase::Countdown;
                tracing::info!(
                    slide = self.slide,
                    combined = self.sample.combined(),
                    threshold = self.threshold,
                    "autopilot_countdown_started"
                );
                vec![Effect::StartCountdown {
                    generation: countdown.generation,
                    duration: countdown.duration,
                }]
            }
            (Phase::Countdown, false) => {
                let effects = self.invalidate_countdown();
                self.phase = Phase::Idle;
                tracing::info!(slide = self.slide, "autopilot_countdown_aborted");
                effects
            }
            (Phase::Cancelled, false) => {
                self.phase = Phase::Idle;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn invalidate_countdown(&mut self) -> Vec<Effect> {
        match self.countdown.take() {
            Some(countdown) => vec![Effect::CancelCountdown {
                generation: countdown.generation,
            }],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_millis(1500);

    fn machine() -> AutoAdvance {
        AutoAdvance::new(&AutopilotConfig::default(), 0)
    }

    fn sample(deterministic: f64, external: Option<f64>) -> ConfidenceSample {
        ConfidenceSample::new(Some(deterministic), external)
    }

    #[test]
    fn external_score_starts_countdown_immediately() {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);

        assert!(m.update_sample(sample(0.5, None), now).is_empty());
        assert_eq!(m.phase(), Phase::Idle);

        let effects = m.update_sample(sample(0.5, Some(0.7)), now);
        assert_eq!(
            effects,
            vec![Effect::StartCountdown {
                generation: 1,
                duration: GRACE
            }]
        );
        assert_eq!(m.phase(), Phase::Countdown);
        assert_eq!(m.sample().combined(), 0.7);
    }

    #[test]
    fn elapsed_countdown_advances_exactly_once() {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);
        m.update_sample(sample(0.6, None), now);

        assert_eq!(
            m.countdown_elapsed(1),
            vec![Effect::Advance { from_slide: 0 }]
        );
        assert_eq!(m.phase(), Phase::Advanced);
        assert!(m.countdown_elapsed(1).is_empty());

        // Still above threshold, but advanced is terminal for this slide.
        assert!(m.update_sample(sample(0.9, None), now).is_empty());
        assert_eq!(m.phase(), Phase::Advanced);

        assert!(m.slide_changed(1).is_empty());
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(m.sample(), ConfidenceSample::default());
    }

    #[test]
    fn dropping_below_threshold_aborts_countdown() {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);
        m.update_sample(sample(0.2, Some(0.8)), now);

        let effects = m.update_sample(sample(0.2, Some(0.3)), now);
        assert_eq!(effects, vec![Effect::CancelCountdown { generation: 1 }]);
        assert_eq!(m.phase(), Phase::Idle);

        // The old timer firing late does nothing.
        assert!(m.countdown_elapsed(1).is_empty());
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn recrossing_uses_a_new_generation() {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);
        m.update_sample(sample(0.8, None), now);
        m.update_sample(sample(0.1, None), now);

        let effects = m.update_sample(sample(0.8, None), now);
        assert_eq!(
            effects,
            vec![Effect::StartCountdown {
                generation: 2,
                duration: GRACE
            }]
        );
        assert!(m.countdown_elapsed(1).is_empty());
        assert_eq!(
            m.countdown_elapsed(2),
            vec![Effect::Advance { from_slide: 0 }]
        );
    }

    #[test]
    fn cancel_holds_until_confidence_falls() {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);
        m.update_sample(sample(0.9, None), now);

        assert_eq!(m.cancel(), vec![Effect::CancelCountdown { generation: 1 }]);
        assert_eq!(m.phase(), Phase::Cancelled);
        assert!(m.cancel().is_empty());

        assert!(m.update_sample(sample(0.95, None), now).is_empty());
        assert_eq!(m.phase(), Phase::Cancelled);

        m.update_sample(sample(0.1, None), now);
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn slide_change_invalidates_pending_countdown() {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);
        m.update_sample(sample(0.9, None), now);

        assert_eq!(
            m.slide_changed(2),
            vec![Effect::CancelCountdown { generation: 1 }]
        );
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(m.slide(), 2);
        assert!(m.countdown_elapsed(1).is_empty());
    }

    #[test]
    fn disable_cancels_and_disconnects() {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);
        m.update_sample(sample(0.9, None), now);

        assert_eq!(
            m.disable(),
            vec![
                Effect::CancelCountdown { generation: 1 },
                Effect::DisconnectSpeech
            ]
        );
        assert_eq!(m.phase(), Phase::Disabled);
        assert!(m.disable().is_empty());
        assert!(m.update_sample(sample(1.0, None), now).is_empty());
    }

    #[test]
    fn enabling_above_threshold_starts_countdown() {
        let now = Instant::now();
        let mut m = machine();
        m.update_sample(sample(0.9, None), now);
        assert_eq!(m.phase(), Phase::Disabled);

        assert_eq!(
            m.enable(now),
            vec![Effect::StartCountdown {
                generation: 1,
                duration: GRACE
            }]
        );
    }

    #[test]
    fn threshold_change_applies_on_next_sample() {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);
        m.update_sample(sample(0.5, None), now);

        m.set_threshold(0.4).unwrap();
        assert_eq!(m.phase(), Phase::Idle);

        m.update_sample(sample(0.5, None), now);
        assert_eq!(m.phase(), Phase::Countdown);

        assert!(m.set_threshold(1.5).is_err());
        assert_eq!(m.threshold(), 0.4);
    }

    #[test]
    fn countdown_remaining_counts_down() {
        let t0 = Instant::now();
        let mut m = machine();
        m.enable(t0);
        m.update_sample(sample(0.9, None), t0);

        assert_eq!(m.countdown_remaining(t0), Some(GRACE));
        assert_eq!(
            m.countdown_remaining(t0 + Duration::from_millis(500)),
            Some(Duration::from_millis(1000))
        );
        assert_eq!(
            m.countdown_remaining(t0 + Duration::from_secs(5)),
            Some(Duration::ZERO)
        );

        let snapshot = m.snapshot(true, t0 + Duration::from_millis(500));
        insta::assert_snapshot!(
            serde_json::to_string(&snapshot).unwrap(),
            @r#"{"phase":"countdown","slide":0,"threshold":0.55,"speech_connected":true,"deterministic":0.9,"external":null,"combined":0.9,"countdown_remaining_ms":1000}"#
        );
    }

    #[quickcheck_macros::quickcheck]
    fn prop_advance_fires_at_most_once_per_slide(scores: Vec<u8>) -> bool {
        let now = Instant::now();
        let mut m = machine();
        m.enable(now);

        let mut advances = 0;
        for score in scores {
            for effect in m.update_sample(sample(f64::from(score) / 255.0, None), now) {
                if let Effect::StartCountdown { generation, .. } = effect {
                    for effect in m.countdown_elapsed(generation) {
                        if matches!(effect, Effect::Advance { .. }) {
                            advances += 1;
                        }
                    }
                }
            }
        }
        advances <= 1
    }
}
