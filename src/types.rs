use std::fmt;

/// Altitudes above this are filed as flight levels
pub const TRANSITION_ALTITUDE_FT: i32 = 18_000;

/// Normalized callsign used as the key for all per-flight state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallsignKey(String);

impl CallsignKey {
    /// Trim and upper-case a raw callsign. Returns `None` when nothing is left.
    pub fn normalize(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() { None } else { Some(Self(normalized)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallsignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CallsignKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Flight plan fields as reported by the host client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightPlanFields {
    /// Departure airport ICAO
    pub origin: String,

    /// Arrival airport ICAO
    pub destination: String,

    /// Assigned SID name
    pub sid_name: String,

    /// Departure runway designator (e.g., "27L")
    pub departure_runway: String,

    /// Assigned transponder code
    pub squawk: String,

    /// Filed aircraft type (e.g., "A320")
    pub aircraft_type: String,

    /// Final (filed) altitude in feet
    pub final_altitude_feet: i32,

    /// Filed route string
    pub route: String,
}

/// Last-known flight plan for one callsign, as held by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightPlanSnapshot {
    pub callsign: CallsignKey,
    pub origin: String,
    pub destination: String,
    pub departure_procedure: String,
    pub departure_runway: String,
    pub squawk: String,
    pub aircraft_type: String,

    /// Altitude already rendered as text ("FL240" or "5000")
    pub filed_altitude: String,

    pub route: String,
}

impl FlightPlanSnapshot {
    /// Build a snapshot from host fields. Airport, procedure, runway and type
    /// codes are upper-cased; squawk and route are kept as filed.
    pub fn from_fields(callsign: CallsignKey, fields: &FlightPlanFields) -> Self {
        Self {
            callsign,
            origin: fields.origin.to_uppercase(),
            destination: fields.destination.to_uppercase(),
            departure_procedure: fields.sid_name.to_uppercase(),
            departure_runway: fields.departure_runway.to_uppercase(),
            squawk: fields.squawk.clone(),
            aircraft_type: fields.aircraft_type.to_uppercase(),
            filed_altitude: format_altitude(fields.final_altitude_feet),
            route: fields.route.clone(),
        }
    }
}

/// Render a filed altitude: flight level above transition, plain feet otherwise
pub fn format_altitude(feet: i32) -> String {
    if feet > TRANSITION_ALTITUDE_FT {
        format!("FL{}", feet / 100)
    } else {
        feet.to_string()
    }
}

/// A clearance built for one click; never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearanceMessage {
    pub callsign: CallsignKey,
    pub identifier: String,
    pub text: String,
}

/// Payload carried over the bridge channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeMessage {
    pub callsign: String,
    pub pdc: String,
}

impl From<&ClearanceMessage> for BridgeMessage {
    fn from(message: &ClearanceMessage) -> Self {
        Self {
            callsign: message.callsign.to_string(),
            pdc: message.text.clone(),
        }
    }
}

/// Colour directive for a rendered tag cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagColor {
    /// Host default colour
    Default,

    /// Explicit RGB colour
    Rgb(u8, u8, u8),
}

/// Result of rendering one tag cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCell {
    pub text: String,
    pub color: TagColor,
}

impl TagCell {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            color: TagColor::Default,
        }
    }
}
