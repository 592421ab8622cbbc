use tokio::sync::mpsc;

use podium_autopilot::{AutopilotRuntime, AutopilotSnapshot};

pub enum AutopilotEvent {
    Advance(u32),
    SpeechDisconnected,
    Snapshot(AutopilotSnapshot),
}

/// Forwards autopilot callbacks to the command loop, which owns navigation.
pub struct CliRuntime {
    tx: mpsc::UnboundedSender<AutopilotEvent>,
}

impl CliRuntime {
    pub fn new(tx: mpsc::UnboundedSender<AutopilotEvent>) -> Self {
        Self { tx }
    }
}

impl AutopilotRuntime for CliRuntime {
    fn advance(&self, from_slide: u32) {
        let _ = self.tx.send(AutopilotEvent::Advance(from_slide));
    }

    fn disconnect_speech(&self) {
        let _ = self.tx.send(AutopilotEvent::SpeechDisconnected);
    }

    fn emit(&self, snapshot: AutopilotSnapshot) {
        let _ = self.tx.send(AutopilotEvent::Snapshot(snapshot));
    }
}
