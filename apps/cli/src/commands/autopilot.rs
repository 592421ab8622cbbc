use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ractor::ActorRef;
use tokio::io::{AsyncBufReadExt, BufReader};

use podium_autopilot::{
    AutopilotArgs, AutopilotConfig, AutopilotMsg, AutopilotSnapshot, StaticNarration,
    spawn_autopilot,
};
use podium_deck_client::{ClientConfig, HttpControlEndpoint, PresenterPublisher, Role};

use crate::runtime::{AutopilotEvent, CliRuntime};

pub struct Args {
    pub config: ClientConfig,
    pub narration: PathBuf,
    pub start: u32,
    pub total_slides: u32,
    pub threshold: f64,
    pub grace: Duration,
}

/// One stdin line. Anything that is not a command counts as final speech.
pub enum Input {
    Score(Option<f64>),
    Cancel,
    Enable,
    Disable,
    Next,
    Speech(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "cancel" => return Self::Cancel,
            "on" => return Self::Enable,
            "off" => return Self::Disable,
            "next" => return Self::Next,
            "score" => return Self::Score(None),
            _ => {}
        }
        if let Some(score) = line.strip_prefix("score ")
            && let Ok(score) = score.trim().parse()
        {
            return Self::Score(Some(score));
        }
        Self::Speech(line.to_string())
    }
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let narration = StaticNarration::from_path(&args.narration)?;
    let autopilot_config = AutopilotConfig::default()
        .with_threshold(args.threshold)
        .with_grace(args.grace);
    autopilot_config.validate()?;

    let control = HttpControlEndpoint::from_config(reqwest::Client::new(), &args.config)?;
    let publisher =
        PresenterPublisher::spawn(Role::Presenter, control, args.config.publish_debounce);

    let last = args.total_slides.saturating_sub(1);
    let mut slide = args.start.min(last);
    publisher.set_slide(slide);

    let (event_tx, mut events) = tokio::sync::mpsc::unbounded_channel();
    let actor = spawn_autopilot(AutopilotArgs {
        runtime: Arc::new(CliRuntime::new(event_tx)),
        narration: Arc::new(narration),
        config: autopilot_config,
        initial_slide: slide,
    })
    .await?;

    // stdin is the speech source for the whole session.
    cast(&actor, AutopilotMsg::SpeechStatus(true));
    enable(&actor).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(AutopilotEvent::Advance(from)) => {
                    if from >= last {
                        eprintln!("autopilot: already on the last slide");
                        continue;
                    }
                    slide = from + 1;
                    println!("slide {slide}");
                    publisher.set_slide(slide);
                    cast(&actor, AutopilotMsg::SlideChanged(slide));
                }
                Some(AutopilotEvent::SpeechDisconnected) => {
                    eprintln!("autopilot: speech disconnected");
                }
                Some(AutopilotEvent::Snapshot(snapshot)) => print_snapshot(&snapshot),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(&line) {
                    Input::Score(score) => cast(&actor, AutopilotMsg::ExternalScore(score)),
                    Input::Cancel => cast(&actor, AutopilotMsg::Cancel),
                    Input::Disable => cast(&actor, AutopilotMsg::Disable),
                    Input::Enable => {
                        cast(&actor, AutopilotMsg::SpeechStatus(true));
                        if let Err(e) = enable(&actor).await {
                            eprintln!("autopilot: {e}");
                        }
                    }
                    Input::Next => {
                        if slide < last {
                            slide += 1;
                            println!("slide {slide}");
                            publisher.set_slide(slide);
                            cast(&actor, AutopilotMsg::SlideChanged(slide));
                        }
                    }
                    Input::Speech(text) => cast(
                        &actor,
                        AutopilotMsg::Transcript {
                            text,
                            is_final: true,
                        },
                    ),
                }
            }
        }
    }

    actor.stop(None);
    publisher.shutdown().await;
    Ok(())
}

fn cast(actor: &ActorRef<AutopilotMsg>, msg: AutopilotMsg) {
    if actor.cast(msg).is_err() {
        tracing::warn!("autopilot_actor_unavailable");
    }
}

async fn enable(actor: &ActorRef<AutopilotMsg>) -> anyhow::Result<()> {
    ractor::call!(actor, AutopilotMsg::Enable)
        .map_err(|_| anyhow::anyhow!("autopilot actor unavailable"))??;
    Ok(())
}

fn print_snapshot(snapshot: &AutopilotSnapshot) {
    let countdown = snapshot
        .countdown_remaining_ms
        .map(|ms| format!(" advancing in {ms}ms"))
        .unwrap_or_default();
    eprintln!(
        "autopilot: {:?} confidence {:.2}/{:.2}{countdown}",
        snapshot.phase, snapshot.combined, snapshot.threshold
    );
}
