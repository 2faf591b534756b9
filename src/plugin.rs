use parking_lot::Mutex;
use thiserror::Error;

use crate::clearance;
use crate::config::{ PdcConfig, PluginConfig };
use crate::host::{ Clock, FlightPlanEvent, FlightPlanHost, MessageLevel, SystemClock };
use crate::identifier;
use crate::network::{ BridgeClient, BridgeTransport, TransportError };
use crate::state::SessionState;
use crate::types::{ BridgeMessage, CallsignKey, ClearanceMessage, FlightPlanSnapshot, TagCell, TagColor };

/// Cell glyph once a clearance went out
pub const DONE_GLYPH: char = 'X';

/// Cell glyph while no clearance has been sent
pub const PENDING_GLYPH: char = '.';

/// Separates the glyph from the callsign in the cell text
pub const CELL_SEPARATOR: char = '|';

/// Host tag cells hold 15 characters plus a terminator
pub const TAG_TEXT_MAX: usize = 15;

const ACTIVATION_HINT: &str =
    "Loaded. Departure list: add a column with tag item 'PDC Flag' and function 'Generate PDC (bridge)', \
     set its width to 1-2 characters, and start pdc-bridge first.";

/// Per-click failures. The display text is what the operator sees.
#[derive(Debug, Error)]
pub enum ClickError {
    #[error(
        "Could not determine callsign from click. Click directly on the PDC cell (not the header), or make sure the PDC column is visible."
    )]
    UnresolvedCallsign,

    #[error("No flight plan found for {0}")]
    FlightPlanNotFound(CallsignKey),

    #[error("No cached data yet for {0}. Wait a second and click again.")]
    CacheMiss(CallsignKey),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Tag render and click controller.
///
/// Handlers take `&self`; all session state sits behind one lock, which is
/// released while the clearance is written to the bridge.
pub struct PdcPlugin {
    session: Mutex<SessionState>,
    transport: Box<dyn BridgeTransport>,
    clock: Box<dyn Clock>,
    config: PluginConfig,
}

impl PdcPlugin {
    pub fn new(config: PluginConfig, transport: Box<dyn BridgeTransport>, clock: Box<dyn Clock>) -> Self {
        Self {
            session: Mutex::new(SessionState::new()),
            transport,
            clock,
            config,
        }
    }

    /// Plugin talking to the bridge channel named in `config`
    pub fn with_bridge(config: &PdcConfig) -> Self {
        let client = BridgeClient::new(config.channel.endpoint());
        Self::new(config.plugin.clone(), Box::new(client), Box::new(SystemClock))
    }

    pub fn on_activate(&self, host: &dyn FlightPlanHost) {
        host.display_message(MessageLevel::Ok, ACTIVATION_HINT);
    }

    /// Render the PDC cell for a flight plan
    pub fn on_render_tag_cell(&self, host: &dyn FlightPlanHost, raw_callsign: &str) -> TagCell {
        let Some(callsign) = CallsignKey::normalize(raw_callsign) else {
            return TagCell::empty();
        };

        let fields = host.flight_plan_fields(&callsign);

        let mut session = self.session.lock();
        if let Some(fields) = fields {
            session.cache.upsert(FlightPlanSnapshot::from_fields(callsign.clone(), &fields));
        }
        session.record_render(callsign.clone(), self.clock.now_instant());

        let flagged = session.flags.is_flagged(&callsign);
        let color = if flagged {
            let [r, g, b] = self.config.flagged_color;
            TagColor::Rgb(r, g, b)
        } else {
            TagColor::Default
        };

        TagCell {
            text: cell_text(flagged, &callsign),
            color,
        }
    }

    /// Generate and send a clearance for the clicked cell. Every outcome is
    /// also reported to the operator through the host.
    pub fn on_function_invoked(
        &self,
        host: &dyn FlightPlanHost,
        cell_text: &str
    ) -> Result<ClearanceMessage, ClickError> {
        match self.issue_clearance(host, cell_text) {
            Ok(message) => {
                tracing::info!("PDC {} sent for {}", message.identifier, message.callsign);
                host.display_message(
                    MessageLevel::Ok,
                    &format!(
                        "PDC prepared for {} (ID {}). Bridge will open private chat and paste.",
                        message.callsign,
                        message.identifier
                    )
                );
                Ok(message)
            }
            Err(e) => {
                tracing::warn!("PDC click failed: {}", e);
                host.display_message(MessageLevel::Error, &e.to_string());
                Err(e)
            }
        }
    }

    pub fn on_flight_plan_event(&self, host: &dyn FlightPlanHost, event: &FlightPlanEvent) {
        match event {
            FlightPlanEvent::DataUpdated(raw) | FlightPlanEvent::AssignedDataUpdated(raw) => {
                if let Some(callsign) = CallsignKey::normalize(raw) {
                    self.refresh(host, &callsign);
                }
            }
            FlightPlanEvent::Disconnected(raw) => {
                if let Some(callsign) = CallsignKey::normalize(raw) {
                    self.session.lock().forget(&callsign);
                    tracing::debug!("Forgot {}", callsign);
                }
            }
            FlightPlanEvent::CallsignChanged { from, to } => {
                if let Some(old) = CallsignKey::normalize(from) {
                    self.session.lock().forget(&old);
                }
                if let Some(new) = CallsignKey::normalize(to) {
                    self.refresh(host, &new);
                }
            }
        }
    }

    pub fn is_flagged(&self, raw_callsign: &str) -> bool {
        CallsignKey::normalize(raw_callsign).is_some_and(|callsign| {
            self.session.lock().flags.is_flagged(&callsign)
        })
    }

    pub fn cached(&self, raw_callsign: &str) -> Option<FlightPlanSnapshot> {
        let callsign = CallsignKey::normalize(raw_callsign)?;
        self.session.lock().cache.get(&callsign).cloned()
    }

    /// Callsign a click refers to: cell text, then host selection, then the
    /// last rendered callsign if it is recent enough
    pub fn resolve_callsign(
        &self,
        host: &dyn FlightPlanHost,
        cell_text: &str
    ) -> Result<CallsignKey, ClickError> {
        if let Some(callsign) = parse_cell_callsign(cell_text) {
            return Ok(callsign);
        }

        if let Some(callsign) = host.selected_flight_plan().as_deref().and_then(CallsignKey::normalize) {
            return Ok(callsign);
        }

        self.session
            .lock()
            .recent_render(self.clock.now_instant(), self.config.hint_window())
            .ok_or(ClickError::UnresolvedCallsign)
    }

    fn issue_clearance(
        &self,
        host: &dyn FlightPlanHost,
        cell_text: &str
    ) -> Result<ClearanceMessage, ClickError> {
        let callsign = self.resolve_callsign(host, cell_text)?;

        if !host.has_flight_plan(&callsign) {
            return Err(ClickError::FlightPlanNotFound(callsign));
        }

        let (snapshot, generation) = {
            let mut session = self.session.lock();
            if session.cache.get(&callsign).is_none() {
                if let Some(fields) = host.flight_plan_fields(&callsign) {
                    session.cache.upsert(FlightPlanSnapshot::from_fields(callsign.clone(), &fields));
                }
            }
            (session.cache.get(&callsign).cloned(), session.generation(&callsign))
        };
        let Some(snapshot) = snapshot else {
            return Err(ClickError::CacheMiss(callsign));
        };

        let now = self.clock.now_utc();
        let identifier = identifier::generate(callsign.as_str(), now);
        let text = clearance::format(&snapshot, &identifier, now);

        host.set_scratch_pad(&callsign, &identifier);

        let message = ClearanceMessage { callsign, identifier, text };
        self.transport.send(&BridgeMessage::from(&message))?;

        // The lock was released for the write; a disconnect in between wins
        if !self.session.lock().flag_if_current(&message.callsign, generation) {
            tracing::debug!("{} left the session while its PDC was sent, not flagging", message.callsign);
        }
        Ok(message)
    }

    fn refresh(&self, host: &dyn FlightPlanHost, callsign: &CallsignKey) {
        if let Some(fields) = host.flight_plan_fields(callsign) {
            self.session.lock().cache.upsert(FlightPlanSnapshot::from_fields(callsign.clone(), &fields));
            tracing::debug!("Cached flight plan for {}", callsign);
        }
    }
}

/// Glyph, separator and callsign, cut to the host cell width.
///
/// Callsigns longer than `TAG_TEXT_MAX - 2` lose their tail here, so a click
/// on such a cell parses the cut callsign and the host will not know it.
/// Selecting the aircraft first does not help: cell text is tried first.
pub fn cell_text(flagged: bool, callsign: &CallsignKey) -> String {
    let glyph = if flagged { DONE_GLYPH } else { PENDING_GLYPH };
    format!("{glyph}{CELL_SEPARATOR}{callsign}").chars().take(TAG_TEXT_MAX).collect()
}

/// Callsign after the separator of a previously rendered cell, if any
pub fn parse_cell_callsign(cell_text: &str) -> Option<CallsignKey> {
    let (_, suffix) = cell_text.split_once(CELL_SEPARATOR)?;
    CallsignKey::normalize(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlightPlanFields;
    use chrono::{ DateTime, TimeZone, Utc };
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{ Arc, Barrier };
    use std::thread;
    use std::time::{ Duration, Instant };

    #[derive(Default)]
    struct FakeHost {
        /// callsign -> fields (None while the host has not populated them)
        plans: RefCell<HashMap<String, Option<FlightPlanFields>>>,
        selected: RefCell<Option<String>>,
        scratch_pads: RefCell<HashMap<String, String>>,
        messages: RefCell<Vec<(MessageLevel, String)>>,
    }

    impl FakeHost {
        fn with_plan(callsign: &str, fields: FlightPlanFields) -> Self {
            let host = Self::default();
            host.plans.borrow_mut().insert(callsign.to_string(), Some(fields));
            host
        }

        fn last_message(&self) -> (MessageLevel, String) {
            self.messages.borrow().last().cloned().unwrap()
        }
    }

    impl FlightPlanHost for FakeHost {
        fn has_flight_plan(&self, callsign: &CallsignKey) -> bool {
            self.plans.borrow().contains_key(callsign.as_str())
        }

        fn flight_plan_fields(&self, callsign: &CallsignKey) -> Option<FlightPlanFields> {
            self.plans.borrow().get(callsign.as_str()).cloned().flatten()
        }

        fn selected_flight_plan(&self) -> Option<String> {
            self.selected.borrow().clone()
        }

        fn set_scratch_pad(&self, callsign: &CallsignKey, text: &str) {
            self.scratch_pads.borrow_mut().insert(callsign.to_string(), text.to_string());
        }

        fn display_message(&self, level: MessageLevel, text: &str) {
            self.messages.borrow_mut().push((level, text.to_string()));
        }
    }

    #[derive(Clone, Default)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<BridgeMessage>>>,
        offline: Arc<Mutex<bool>>,
    }

    impl BridgeTransport for RecordingTransport {
        fn send(&self, message: &BridgeMessage) -> Result<(), TransportError> {
            if *self.offline.lock() {
                return Err(TransportError::Unreachable(io::ErrorKind::NotFound.into()));
            }
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }

    /// Holds each send between two barriers so another thread can act while
    /// the write is in flight
    struct GatedTransport {
        entered: Arc<Barrier>,
        release: Arc<Barrier>,
        sent: Arc<Mutex<Vec<BridgeMessage>>>,
    }

    impl BridgeTransport for GatedTransport {
        fn send(&self, message: &BridgeMessage) -> Result<(), TransportError> {
            self.entered.wait();
            self.release.wait();
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }

    #[derive(Clone)]
    struct ManualClock {
        wall: DateTime<Utc>,
        base: Instant,
        elapsed: Arc<Mutex<Duration>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                wall: Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 0).unwrap(),
                base: Instant::now(),
                elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        fn advance(&self, by: Duration) {
            *self.elapsed.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now_utc(&self) -> DateTime<Utc> {
            self.wall + chrono::Duration::from_std(*self.elapsed.lock()).unwrap()
        }

        fn now_instant(&self) -> Instant {
            self.base + *self.elapsed.lock()
        }
    }

    fn baw123_fields() -> FlightPlanFields {
        FlightPlanFields {
            origin: "EGLL".into(),
            destination: "LFPG".into(),
            sid_name: "NONE".into(),
            departure_runway: "27L".into(),
            squawk: "2000".into(),
            aircraft_type: "A320".into(),
            final_altitude_feet: 24_000,
            route: "DVR".into(),
        }
    }

    fn plugin() -> (PdcPlugin, RecordingTransport, ManualClock) {
        let transport = RecordingTransport::default();
        let clock = ManualClock::new();
        let plugin = PdcPlugin::new(
            PluginConfig::default(),
            Box::new(transport.clone()),
            Box::new(clock.clone())
        );
        (plugin, transport, clock)
    }

    #[test]
    fn test_render_unflagged_cell_is_idempotent() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());

        let first = plugin.on_render_tag_cell(&host, "BAW123");
        let second = plugin.on_render_tag_cell(&host, "BAW123");

        assert_eq!(first, TagCell { text: ".|BAW123".into(), color: TagColor::Default });
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_refreshes_cache() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());

        plugin.on_render_tag_cell(&host, "baw123");

        assert_eq!(plugin.cached("BAW123").unwrap().filed_altitude, "FL240");
    }

    #[test]
    fn test_render_empty_callsign_changes_nothing() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::default();

        assert_eq!(plugin.on_render_tag_cell(&host, "  "), TagCell::empty());
        assert!(matches!(
            plugin.on_function_invoked(&host, ""),
            Err(ClickError::UnresolvedCallsign)
        ));
    }

    #[test]
    fn test_click_sends_clearance_and_flags_callsign() {
        let (plugin, transport, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());

        let cell = plugin.on_render_tag_cell(&host, "BAW123");
        let message = plugin.on_function_invoked(&host, &cell.text).unwrap();

        assert!(message.text.contains(
            "FLT BAW123 EGLL A320 FILED FL240 XPRD 2000 USE SID NONE DEPARTURE RUNWAY 27L DESTINATION LFPG"
        ));
        assert!(message.text.ends_with("DVR END"));
        assert!(message.text.contains(&format!("IDENTIFIER {}", message.identifier)));

        let sent = transport.sent.lock().clone();
        assert_eq!(sent, vec![BridgeMessage { callsign: "BAW123".into(), pdc: message.text.clone() }]);

        assert_eq!(host.scratch_pads.borrow().get("BAW123"), Some(&message.identifier));
        assert_eq!(host.last_message().0, MessageLevel::Ok);
        assert!(host.last_message().1.starts_with("PDC prepared for BAW123"));

        assert!(plugin.is_flagged("BAW123"));
        let cell = plugin.on_render_tag_cell(&host, "BAW123");
        assert_eq!(cell, TagCell { text: "X|BAW123".into(), color: TagColor::Rgb(0, 200, 0) });
    }

    #[test]
    fn test_flag_does_not_block_resend() {
        let (plugin, transport, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());

        plugin.on_function_invoked(&host, ".|BAW123").unwrap();
        plugin.on_function_invoked(&host, "X|BAW123").unwrap();

        assert_eq!(transport.sent.lock().len(), 2);
        assert!(plugin.is_flagged("BAW123"));
    }

    #[test]
    fn test_unreachable_bridge_leaves_flag_unset() {
        let (plugin, transport, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());
        *transport.offline.lock() = true;

        let err = plugin.on_function_invoked(&host, ".|BAW123").unwrap_err();

        assert!(matches!(err, ClickError::Transport(TransportError::Unreachable(_))));
        assert!(!plugin.is_flagged("BAW123"));
        assert_eq!(
            host.last_message(),
            (MessageLevel::Error, "Could not connect to PDC bridge (is it running?)".to_string())
        );
        assert_eq!(plugin.on_render_tag_cell(&host, "BAW123").text, ".|BAW123");
    }

    #[test]
    fn test_cell_suffix_beats_selection_and_hint() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::default();
        *host.selected.borrow_mut() = Some("EZY45".into());
        plugin.on_render_tag_cell(&host, "DLH9");

        let resolved = plugin.resolve_callsign(&host, ".|baw123").unwrap();
        assert_eq!(resolved.as_str(), "BAW123");
    }

    #[test]
    fn test_selection_beats_hint() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::default();
        *host.selected.borrow_mut() = Some("ezy45".into());
        plugin.on_render_tag_cell(&host, "DLH9");

        assert_eq!(plugin.resolve_callsign(&host, "").unwrap().as_str(), "EZY45");
        assert_eq!(plugin.resolve_callsign(&host, "X|").unwrap().as_str(), "EZY45");
    }

    #[test]
    fn test_hint_fallback_expires() {
        let (plugin, _, clock) = plugin();
        let host = FakeHost::default();
        plugin.on_render_tag_cell(&host, "DLH9");

        clock.advance(Duration::from_millis(1499));
        assert_eq!(plugin.resolve_callsign(&host, "").unwrap().as_str(), "DLH9");

        clock.advance(Duration::from_millis(2));
        assert!(matches!(plugin.resolve_callsign(&host, ""), Err(ClickError::UnresolvedCallsign)));
    }

    #[test]
    fn test_unknown_flight_plan_is_reported() {
        let (plugin, transport, _) = plugin();
        let host = FakeHost::default();

        let err = plugin.on_function_invoked(&host, ".|BAW123").unwrap_err();

        assert!(matches!(err, ClickError::FlightPlanNotFound(ref cs) if cs.as_str() == "BAW123"));
        assert_eq!(host.last_message().1, "No flight plan found for BAW123");
        assert!(transport.sent.lock().is_empty());
    }

    #[test]
    fn test_cache_miss_when_host_has_no_fields_yet() {
        let (plugin, transport, _) = plugin();
        let host = FakeHost::default();
        host.plans.borrow_mut().insert("BAW123".into(), None);

        let err = plugin.on_function_invoked(&host, ".|BAW123").unwrap_err();

        assert!(matches!(err, ClickError::CacheMiss(_)));
        assert!(host.last_message().1.contains("Wait a second and click again"));
        assert!(transport.sent.lock().is_empty());
        assert!(host.scratch_pads.borrow().is_empty());
    }

    #[test]
    fn test_click_populates_missing_cache_entry() {
        let (plugin, transport, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());
        assert!(plugin.cached("BAW123").is_none());

        plugin.on_function_invoked(&host, ".|BAW123").unwrap();

        assert!(plugin.cached("BAW123").is_some());
        assert_eq!(transport.sent.lock().len(), 1);
    }

    #[test]
    fn test_events_refresh_cache() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());
        plugin.on_flight_plan_event(&host, &FlightPlanEvent::DataUpdated("BAW123".into()));
        assert_eq!(plugin.cached("BAW123").unwrap().departure_runway, "27L");

        let mut amended = baw123_fields();
        amended.departure_runway = "09r".into();
        host.plans.borrow_mut().insert("BAW123".into(), Some(amended));
        plugin.on_flight_plan_event(&host, &FlightPlanEvent::AssignedDataUpdated("BAW123".into()));

        assert_eq!(plugin.cached("BAW123").unwrap().departure_runway, "09R");
    }

    #[test]
    fn test_disconnect_clears_flag_and_cache() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());
        plugin.on_function_invoked(&host, ".|BAW123").unwrap();
        assert!(plugin.is_flagged("BAW123"));

        host.plans.borrow_mut().clear();
        plugin.on_flight_plan_event(&host, &FlightPlanEvent::Disconnected("BAW123".into()));

        assert!(!plugin.is_flagged("BAW123"));
        assert!(plugin.cached("BAW123").is_none());

        // Stale frame still asking for the old cell
        assert_eq!(plugin.on_render_tag_cell(&host, "BAW123").text, ".|BAW123");

        // A new flight plan reusing the callsign starts unflagged
        host.plans.borrow_mut().insert("BAW123".into(), Some(baw123_fields()));
        plugin.on_flight_plan_event(&host, &FlightPlanEvent::DataUpdated("BAW123".into()));
        assert!(!plugin.is_flagged("BAW123"));
        assert_eq!(plugin.on_render_tag_cell(&host, "BAW123").color, TagColor::Default);
    }

    #[test]
    fn test_callsign_change_is_disconnect_plus_new_plan() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::with_plan("BAW123", baw123_fields());
        plugin.on_function_invoked(&host, ".|BAW123").unwrap();

        host.plans.borrow_mut().insert("BAW123A".into(), Some(baw123_fields()));
        plugin.on_flight_plan_event(
            &host,
            &FlightPlanEvent::CallsignChanged { from: "BAW123".into(), to: "BAW123A".into() }
        );

        assert!(!plugin.is_flagged("BAW123"));
        assert!(plugin.cached("BAW123").is_none());
        assert!(!plugin.is_flagged("BAW123A"));
        assert_eq!(plugin.cached("BAW123A").unwrap().callsign.as_str(), "BAW123A");
    }

    #[test]
    fn test_long_callsign_is_cut_to_cell_width() {
        let key = CallsignKey::normalize("ABCDEFGHIJKLMNOP").unwrap();
        let text = cell_text(false, &key);

        assert_eq!(text.chars().count(), TAG_TEXT_MAX);
        assert_eq!(text, ".|ABCDEFGHIJKLM");
    }

    #[test]
    fn test_disconnect_during_send_leaves_flag_unset() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let plugin = PdcPlugin::new(
            PluginConfig::default(),
            Box::new(GatedTransport {
                entered: entered.clone(),
                release: release.clone(),
                sent: sent.clone(),
            }),
            Box::new(ManualClock::new())
        );

        thread::scope(|scope| {
            let click = scope.spawn(|| {
                let host = FakeHost::with_plan("BAW123", baw123_fields());
                plugin.on_function_invoked(&host, ".|BAW123").map(|message| message.callsign)
            });

            entered.wait();
            let host = FakeHost::default();
            plugin.on_flight_plan_event(&host, &FlightPlanEvent::Disconnected("BAW123".into()));
            release.wait();

            // The write itself succeeded
            assert_eq!(click.join().unwrap().unwrap().as_str(), "BAW123");
        });

        assert_eq!(sent.lock().len(), 1);
        assert!(!plugin.is_flagged("BAW123"));
        assert!(plugin.cached("BAW123").is_none());

        // A new flight plan reusing the callsign starts unflagged
        let host = FakeHost::with_plan("BAW123", baw123_fields());
        plugin.on_flight_plan_event(&host, &FlightPlanEvent::DataUpdated("BAW123".into()));
        assert!(!plugin.is_flagged("BAW123"));
        assert_eq!(plugin.on_render_tag_cell(&host, "BAW123").text, ".|BAW123");
    }

    #[test]
    fn test_click_on_cut_cell_misses_long_callsign() {
        let (plugin, transport, _) = plugin();
        let host = FakeHost::with_plan("ABCDEFGHIJKLMNOP", baw123_fields());
        *host.selected.borrow_mut() = Some("ABCDEFGHIJKLMNOP".into());

        let cell = plugin.on_render_tag_cell(&host, "ABCDEFGHIJKLMNOP");
        assert_eq!(plugin.resolve_callsign(&host, &cell.text).unwrap().as_str(), "ABCDEFGHIJKLM");

        let err = plugin.on_function_invoked(&host, &cell.text).unwrap_err();
        assert!(matches!(err, ClickError::FlightPlanNotFound(ref cs) if cs.as_str() == "ABCDEFGHIJKLM"));
        assert!(transport.sent.lock().is_empty());

        // Reachable through the selection when the cell text carries no callsign
        assert!(plugin.on_function_invoked(&host, "").is_ok());
        assert!(plugin.is_flagged("ABCDEFGHIJKLMNOP"));
    }

    #[test]
    fn test_parse_cell_callsign() {
        assert_eq!(parse_cell_callsign("X|baw123").unwrap().as_str(), "BAW123");
        assert!(parse_cell_callsign("X|").is_none());
        assert!(parse_cell_callsign("BAW123").is_none());
        assert!(parse_cell_callsign("").is_none());
    }

    #[test]
    fn test_activation_posts_setup_hint() {
        let (plugin, _, _) = plugin();
        let host = FakeHost::default();
        plugin.on_activate(&host);

        assert!(host.last_message().1.contains("pdc-bridge"));
    }
}
