use std::collections::{ HashMap, HashSet };
use std::time::{ Duration, Instant };

use crate::types::{ CallsignKey, FlightPlanSnapshot };

/// Last-known flight plan per callsign. Last write wins, no expiry.
#[derive(Debug, Default)]
pub struct FlightPlanCache {
    plans: HashMap<CallsignKey, FlightPlanSnapshot>,
}

impl FlightPlanCache {
    pub fn upsert(&mut self, snapshot: FlightPlanSnapshot) {
        self.plans.insert(snapshot.callsign.clone(), snapshot);
    }

    pub fn get(&self, callsign: &CallsignKey) -> Option<&FlightPlanSnapshot> {
        self.plans.get(callsign)
    }

    pub fn remove(&mut self, callsign: &CallsignKey) -> Option<FlightPlanSnapshot> {
        self.plans.remove(callsign)
    }

}

/// Callsigns that had a clearance delivered this session.
///
/// Display only: a flagged callsign can still be sent again.
#[derive(Debug, Default)]
pub struct FlagState {
    flagged: HashSet<CallsignKey>,
}

impl FlagState {
    pub fn is_flagged(&self, callsign: &CallsignKey) -> bool {
        self.flagged.contains(callsign)
    }

    pub fn mark_flagged(&mut self, callsign: CallsignKey) {
        self.flagged.insert(callsign);
    }

    pub fn clear(&mut self, callsign: &CallsignKey) {
        self.flagged.remove(callsign);
    }
}

/// Most recently rendered callsign, used when a click cannot be attributed
#[derive(Debug, Clone)]
pub struct LastRenderedHint {
    pub callsign: CallsignKey,
    pub rendered_at: Instant,
}

impl LastRenderedHint {
    /// Hint is usable while strictly less than `window` has elapsed
    pub fn fresh_at(&self, now: Instant, window: Duration) -> Option<&CallsignKey> {
        let elapsed = now.saturating_duration_since(self.rendered_at);
        (elapsed < window).then_some(&self.callsign)
    }
}

/// All per-session plugin state, created on activation and dropped on
/// deactivation
#[derive(Debug, Default)]
pub struct SessionState {
    pub cache: FlightPlanCache,
    pub flags: FlagState,
    last_rendered: Option<LastRenderedHint>,
    /// Bumped each time a callsign is forgotten, so work started before a
    /// disconnect can tell that its flight plan is gone
    generations: HashMap<CallsignKey, u64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_render(&mut self, callsign: CallsignKey, now: Instant) {
        self.last_rendered = Some(LastRenderedHint { callsign, rendered_at: now });
    }

    /// Callsign from the last render if it is still inside `window`
    pub fn recent_render(&self, now: Instant, window: Duration) -> Option<CallsignKey> {
        self.last_rendered
            .as_ref()
            .and_then(|hint| hint.fresh_at(now, window))
            .cloned()
    }

    /// Flight plan left the session: drop cache entry and flag together
    pub fn forget(&mut self, callsign: &CallsignKey) {
        self.cache.remove(callsign);
        self.flags.clear(callsign);
        *self.generations.entry(callsign.clone()).or_default() += 1;
    }

    pub fn generation(&self, callsign: &CallsignKey) -> u64 {
        self.generations.get(callsign).copied().unwrap_or_default()
    }

    /// Flag `callsign` unless it was forgotten since `generation` was read.
    /// Returns whether the flag was set.
    pub fn flag_if_current(&mut self, callsign: &CallsignKey, generation: u64) -> bool {
        if self.generation(callsign) != generation || self.cache.get(callsign).is_none() {
            return false;
        }
        self.flags.mark_flagged(callsign.clone());
        true
    }
}
