use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use podium_deck_interface::StreamEvent;

use crate::consumer::{EventLog, StreamConsumer};
use crate::reactions::{ReactionAggregator, ReceivedReaction};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FollowerView {
    pub slide: Option<u32>,
    pub following: bool,
    pub reactions: Vec<ReceivedReaction>,
}

/// Local mirror of a deck for a viewer: current slide plus live reactions.
#[derive(Debug)]
pub struct ViewerFollower {
    total_slides: u32,
    slide: Option<u32>,
    reactions: ReactionAggregator,
}

impl ViewerFollower {
    pub fn new(total_slides: u32, reaction_ttl: Duration) -> Self {
        Self {
            total_slides,
            slide: None,
            reactions: ReactionAggregator::new(reaction_ttl),
        }
    }

    pub fn slide(&self) -> Option<u32> {
        self.slide
    }

    pub fn reactions(&self) -> &ReactionAggregator {
        &self.reactions
    }

    /// Returns whether the event changed what a viewer would see.
    pub fn apply(&mut self, event: &StreamEvent, now: Instant) -> bool {
        match event {
            StreamEvent::Init { slide } | StreamEvent::SlideChange { slide } => {
                if *slide >= self.total_slides {
                    tracing::warn!(
                        slide,
                        total_slides = self.total_slides,
                        "slide_out_of_range_dropped"
                    );
                    return false;
                }
                let changed = self.slide != Some(*slide);
                self.slide = Some(*slide);
                changed
            }
            StreamEvent::Reaction { id, emoji, ts } => self.reactions.ingest(id, emoji, *ts, now),
        }
    }

    /// Applies every log entry from `cursor` on and returns the new cursor.
    pub fn drain(&mut self, log: &EventLog, cursor: usize, now: Instant) -> usize {
        let events = log.since(cursor);
        for event in &events {
            self.apply(event, now);
        }
        cursor + events.len()
    }

    pub fn sweep(&mut self, now: Instant) -> usize {
        self.reactions.sweep(now)
    }

    pub fn view(&self, following: bool) -> FollowerView {
        FollowerView {
            slide: self.slide,
            following,
            reactions: self.reactions.active().cloned().collect(),
        }
    }

    /// Follows `consumer` in the background until its listener stops.
    pub fn run(
        mut self,
        consumer: &StreamConsumer,
        sweep_interval: Duration,
    ) -> (watch::Receiver<FollowerView>, JoinHandle<()>) {
        let log = consumer.events().clone();
        let mut status = consumer.watch_status();
        let (view_tx, view_rx) = watch::channel(self.view(consumer.is_connected()));

        let handle = tokio::spawn(async move {
            let mut cursor = 0;
            let mut sweep =
                tokio::time::interval_at(Instant::now() + sweep_interval, sweep_interval);

            loop {
                cursor = self.drain(&log, cursor, Instant::now());
                let following = matches!(
                    *status.borrow_and_update(),
                    crate::ConnectionStatus::Connected
                );
                view_tx.send_if_modified(|view| {
                    let next = self.view(following);
                    let modified = *view != next;
                    *view = next;
                    modified
                });

                tokio::select! {
                    _ = log.changed(cursor) => {}
                    _ = sweep.tick() => {
                        self.sweep(Instant::now());
                    }
                    changed = status.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            view_tx.send_modify(|view| view.following = false);
        });

        (view_rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(id: &str) -> StreamEvent {
        StreamEvent::Reaction {
            id: id.to_string(),
            emoji: "👏".to_string(),
            ts: 0,
        }
    }

    #[test]
    fn follows_init_and_slide_changes() {
        let mut follower = ViewerFollower::new(3, Duration::from_secs(10));
        let now = Instant::now();

        assert!(follower.apply(&StreamEvent::Init { slide: 0 }, now));
        assert!(follower.apply(&StreamEvent::SlideChange { slide: 1 }, now));
        assert!(!follower.apply(&StreamEvent::SlideChange { slide: 1 }, now));
        assert_eq!(follower.slide(), Some(1));
    }

    #[test]
    fn out_of_range_slide_is_ignored() {
        let mut follower = ViewerFollower::new(3, Duration::from_secs(10));
        let now = Instant::now();

        follower.apply(&StreamEvent::Init { slide: 2 }, now);
        assert!(!follower.apply(&StreamEvent::SlideChange { slide: 3 }, now));
        assert_eq!(follower.slide(), Some(2));
    }

    #[test]
    fn drain_advances_cursor_and_dedups_redelivery() {
        let log = EventLog::default();
        let mut follower = ViewerFollower::new(5, Duration::from_secs(10));
        let now = Instant::now();

        log.push(StreamEvent::Init { slide: 0 });
        log.push(reaction("r1"));
        let cursor = follower.drain(&log, 0, now);
        assert_eq!(cursor, 2);

        // Reconnect: fresh Init, the same reaction delivered again.
        log.push(StreamEvent::Init { slide: 2 });
        log.push(reaction("r1"));
        let cursor = follower.drain(&log, cursor, now);
        assert_eq!(cursor, 4);

        assert_eq!(follower.slide(), Some(2));
        assert_eq!(follower.reactions().len(), 1);
        assert_eq!(follower.drain(&log, cursor, now), cursor);
    }

    #[test]
    fn sweep_drops_expired_reactions_from_view() {
        let mut follower = ViewerFollower::new(5, Duration::from_secs(10));
        let t0 = Instant::now();

        follower.apply(&reaction("r1"), t0);
        assert_eq!(follower.view(true).reactions.len(), 1);

        follower.sweep(t0 + Duration::from_secs(10));
        let view = follower.view(true);
        assert!(view.reactions.is_empty());
        assert!(view.following);
    }
}
