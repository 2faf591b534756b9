use chrono::{ DateTime, Utc };
use std::time::Instant;

use crate::types::{ CallsignKey, FlightPlanFields };

/// Severity of an operator notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Ok,
    Error,
}

/// What the plugin core needs from the host ATC client.
///
/// An adapter implements this over the concrete host API; the core never sees
/// host types.
pub trait FlightPlanHost {
    /// Whether the host currently knows a flight plan for this callsign
    fn has_flight_plan(&self, callsign: &CallsignKey) -> bool;

    /// Flight plan fields, or `None` while the host has not populated them
    fn flight_plan_fields(&self, callsign: &CallsignKey) -> Option<FlightPlanFields>;

    /// Callsign of the flight plan currently selected in the host UI
    fn selected_flight_plan(&self) -> Option<String>;

    /// Write the shared per-flight-plan scratch field
    fn set_scratch_pad(&self, callsign: &CallsignKey, text: &str);

    /// Show a short notification to the operator
    fn display_message(&self, level: MessageLevel, text: &str);
}

/// Flight plan notifications forwarded by the host adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightPlanEvent {
    /// Filed flight plan data changed
    DataUpdated(String),

    /// Controller-assigned data (squawk, SID, runway, ...) changed
    AssignedDataUpdated(String),

    /// Flight plan left the session
    Disconnected(String),

    /// Callsign of an existing flight plan was amended
    CallsignChanged { from: String, to: String },
}

/// Time source for the plugin: wall clock for texts, monotonic for the
/// render hint window
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    fn now_instant(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_instant(&self) -> Instant {
        Instant::now()
    }
}
