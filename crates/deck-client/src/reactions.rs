use std::collections::{BTreeMap, HashMap, VecDeque};
use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::time::Instant;

use podium_deck_interface::{Reaction, validate_emoji};

use crate::endpoint::ReactionEndpoint;
use crate::error::{ClientError, Result};

type DirectLimiter<C> = RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Sends reactions, allowing at most one per `window`.
///
/// A rejected attempt never reaches the endpoint.
pub struct ReactionSender<E, C: Clock + Clone = DefaultClock> {
    endpoint: E,
    limiter: Option<DirectLimiter<C>>,
    clock: C,
}

impl<E: ReactionEndpoint> ReactionSender<E> {
    pub fn new(endpoint: E, window: Duration) -> Self {
        Self::with_clock(endpoint, window, DefaultClock::default())
    }
}

impl<E: ReactionEndpoint, C: Clock + Clone> ReactionSender<E, C> {
    /// A zero `window` disables rate limiting.
    pub fn with_clock(endpoint: E, window: Duration, clock: C) -> Self {
        let limiter = Quota::with_period(window).map(|quota| {
            RateLimiter::direct_with_clock(quota.allow_burst(NonZeroU32::MIN), clock.clone())
        });

        Self {
            endpoint,
            limiter,
            clock,
        }
    }

    pub async fn send(&self, emoji: &str) -> Result<Reaction> {
        validate_emoji(emoji)?;

        if let Some(limiter) = &self.limiter
            && let Err(not_until) = limiter.check()
        {
            let retry_after = not_until.wait_time_from(self.clock.now());
            tracing::debug!(retry_after_ms = retry_after.as_millis() as u64, "reaction_rate_limited");
            return Err(ClientError::RateLimited(retry_after));
        }

        self.endpoint.send_reaction(emoji).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedReaction {
    pub id: String,
    pub emoji: String,
    pub ts: u64,
    pub received_at: Instant,
}

/// Consumer-side reaction state: dedup by id, expire after `ttl`.
#[derive(Debug)]
pub struct ReactionAggregator {
    ttl: Duration,
    seen: HashMap<String, Instant>,
    active: VecDeque<ReceivedReaction>,
}

impl ReactionAggregator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: HashMap::new(),
            active: VecDeque::new(),
        }
    }

    /// Returns false for an id already seen within the ttl.
    pub fn ingest(&mut self, id: &str, emoji: &str, ts: u64, now: Instant) -> bool {
        if self.seen.contains_key(id) {
            tracing::trace!(reaction_id = %id, "reaction_duplicate_dropped");
            return false;
        }

        self.seen.insert(id.to_string(), now);
        self.active.push_back(ReceivedReaction {
            id: id.to_string(),
            emoji: emoji.to_string(),
            ts,
            received_at: now,
        });
        true
    }

    /// Forgets everything received more than `ttl` before `now`.
    /// Returns how many active reactions were expired.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let expired = |at: &Instant| now.saturating_duration_since(*at) >= ttl;

        self.seen.retain(|_, at| !expired(at));

        let before = self.active.len();
        self.active.retain(|r| !expired(&r.received_at));
        before - self.active.len()
    }

    pub fn active(&self) -> impl Iterator<Item = &ReceivedReaction> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for reaction in &self.active {
            *counts.entry(reaction.emoji.clone()).or_insert(0) += 1;
        }
        counts
    }
}
