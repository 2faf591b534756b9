use chrono::{ DateTime, Utc };

use crate::types::FlightPlanSnapshot;

/// Render the clearance text for a cached flight plan.
///
/// The output is one line with literal tokens in a fixed order. Empty fields
/// stay as empty tokens so the surrounding keywords never move.
pub fn format(snapshot: &FlightPlanSnapshot, identifier: &str, now: DateTime<Utc>) -> String {
    format!(
        "TIMESTAMP {timestamp} *PRE-DEPARTURE CLEARANCE* \
         FLT {callsign} {origin} {aircraft} FILED {altitude} \
         XPRD {squawk} USE SID {sid} \
         DEPARTURE RUNWAY {runway} DESTINATION {destination} \
         *** ADVISE ATC IF RUNUP REQUIRED *** \
         CONTACT CLEARANCE WITH IDENTIFIER {identifier} \
         {route} END",
        timestamp = timestamp(now),
        callsign = snapshot.callsign,
        origin = snapshot.origin,
        aircraft = snapshot.aircraft_type,
        altitude = snapshot.filed_altitude,
        squawk = snapshot.squawk,
        sid = snapshot.departure_procedure,
        runway = snapshot.departure_runway,
        destination = snapshot.destination,
        identifier = identifier,
        route = snapshot.route,
    )
}

/// `DDMonYY HHMM` in UTC with an upper-case month, e.g. `05MAR24 0930`
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%d%b%y %H%M").to_string().to_uppercase()
}
