use std::sync::Arc;

use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorProcessingErr, ActorRef, MessagingErr, RpcReplyPort};
use tokio::time::Instant;

use crate::confidence::ConfidenceSample;
use crate::config::AutopilotConfig;
use crate::error::AutopilotError;
use crate::keywords::extract;
use crate::machine::{AutoAdvance, AutopilotSnapshot, Effect};
use crate::narration::NarrationProvider;
use crate::scoring::TranscriptScorer;

/// Host integration: navigation, the speech connection and UI updates.
pub trait AutopilotRuntime: Send + Sync + 'static {
    fn advance(&self, from_slide: u32);
    fn disconnect_speech(&self);
    fn emit(&self, snapshot: AutopilotSnapshot);
}

pub enum AutopilotMsg {
    Transcript { text: String, is_final: bool },
    ExternalScore(Option<f64>),
    SlideChanged(u32),
    SpeechStatus(bool),
    Enable(RpcReplyPort<Result<(), AutopilotError>>),
    Disable,
    Cancel,
    SetThreshold(f64, RpcReplyPort<Result<(), AutopilotError>>),
    CountdownElapsed(u64),
    GetSnapshot(RpcReplyPort<AutopilotSnapshot>),
}

pub struct AutopilotArgs {
    pub runtime: Arc<dyn AutopilotRuntime>,
    pub narration: Arc<dyn NarrationProvider>,
    pub config: AutopilotConfig,
    pub initial_slide: u32,
}

pub struct AutopilotState {
    runtime: Arc<dyn AutopilotRuntime>,
    narration: Arc<dyn NarrationProvider>,
    machine: AutoAdvance,
    scorer: TranscriptScorer,
    speech_connected: bool,
    external: Option<f64>,
    timer: Option<JoinHandle<Result<(), MessagingErr<AutopilotMsg>>>>,
}

impl AutopilotState {
    fn activate_slide(&mut self, slide: u32) {
        let keywords = match self.narration.narration(slide) {
            Some(text) => extract(&text),
            None => {
                tracing::warn!(slide, "autopilot_narration_missing");
                Default::default()
            }
        };
        if keywords.is_empty() {
            tracing::info!(slide, "autopilot_nothing_to_match");
        }
        self.scorer.activate(keywords);
    }

    fn sample(&self) -> ConfidenceSample {
        ConfidenceSample::new(self.scorer.coverage(), self.external)
    }

    fn apply(&mut self, myself: &ActorRef<AutopilotMsg>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartCountdown {
                    generation,
                    duration,
                } => {
                    self.abort_timer();
                    self.timer = Some(
                        myself.send_after(duration, move || {
                            AutopilotMsg::CountdownElapsed(generation)
                        }),
                    );
                }
                Effect::CancelCountdown { .. } => self.abort_timer(),
                Effect::Advance { from_slide } => {
                    self.timer = None;
                    self.runtime.advance(from_slide);
                }
                Effect::DisconnectSpeech => {
                    self.speech_connected = false;
                    self.external = None;
                    self.runtime.disconnect_speech();
                }
            }
        }
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn snapshot(&self) -> AutopilotSnapshot {
        self.machine.snapshot(self.speech_connected, Instant::now())
    }
}

pub struct AutopilotActor;

impl AutopilotActor {
    pub fn name() -> ractor::ActorName {
        "autopilot_actor".into()
    }
}

#[ractor::async_trait]
impl Actor for AutopilotActor {
    type Msg = AutopilotMsg;
    type State = AutopilotState;
    type Arguments = AutopilotArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        args.config.validate()?;

        let mut state = AutopilotState {
            runtime: args.runtime,
            narration: args.narration,
            machine: AutoAdvance::new(&args.config, args.initial_slide),
            scorer: TranscriptScorer::default(),
            speech_connected: false,
            external: None,
            timer: None,
        };
        state.activate_slide(args.initial_slide);
        Ok(state)
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.abort_timer();
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let now = Instant::now();

        let effects = match message {
            AutopilotMsg::Transcript { text, is_final } => {
                state.scorer.push(&text, is_final);
                state.machine.update_sample(state.sample(), now)
            }
            AutopilotMsg::ExternalScore(score) => {
                state.external = score;
                state.machine.update_sample(state.sample(), now)
            }
            AutopilotMsg::SlideChanged(slide) => {
                if slide == state.machine.slide() {
                    return Ok(());
                }
                state.external = None;
                state.activate_slide(slide);
                let mut effects = state.machine.slide_changed(slide);
                effects.extend(state.machine.update_sample(state.sample(), now));
                effects
            }
            AutopilotMsg::SpeechStatus(connected) => {
                state.speech_connected = connected;
                if !connected {
                    // Fall back to lexical progress only.
                    tracing::warn!("autopilot_speech_disconnected");
                    state.external = None;
                    state.machine.update_sample(state.sample(), now)
                } else {
                    Vec::new()
                }
            }
            AutopilotMsg::Enable(reply) => {
                if !state.speech_connected {
                    let _ = reply.send(Err(AutopilotError::SpeechDisconnected));
                    return Ok(());
                }
                let effects = state.machine.enable(now);
                let _ = reply.send(Ok(()));
                effects
            }
            AutopilotMsg::Disable => state.machine.disable(),
            AutopilotMsg::Cancel => state.machine.cancel(),
            AutopilotMsg::SetThreshold(threshold, reply) => {
                let _ = reply.send(state.machine.set_threshold(threshold));
                Vec::new()
            }
            AutopilotMsg::CountdownElapsed(generation) => state.machine.countdown_elapsed(generation),
            AutopilotMsg::GetSnapshot(reply) => {
                let _ = reply.send(state.snapshot());
                return Ok(());
            }
        };

        state.apply(&myself, effects);
        state.runtime.emit(state.snapshot());
        Ok(())
    }
}

pub async fn spawn_autopilot(args: AutopilotArgs) -> Result<ActorRef<AutopilotMsg>, AutopilotError> {
    let (actor, _handle) = Actor::spawn(Some(AutopilotActor::name()), AutopilotActor, args)
        .await
        .map_err(|e| AutopilotError::Actor(e.to_string()))?;
    Ok(actor)
}
