//! Pre-departure clearance flag for ATC clients.
//!
//! The plugin side (`plugin`, `state`, `clearance`, `identifier`) runs inside
//! the host ATC client through a small adapter implementing
//! [`host::FlightPlanHost`]. Clearances leave through a local channel
//! (`network::BridgeClient`) to the `pdc-bridge` process, which replays them
//! into the focused window (`network::BridgeServer`, `automation`).

pub mod automation;
pub mod clearance;
pub mod config;
pub mod host;
pub mod identifier;
pub mod network;
pub mod plugin;
pub mod state;
pub mod types;
pub mod wire;

pub use host::{ Clock, FlightPlanEvent, FlightPlanHost, MessageLevel, SystemClock };
pub use network::{ BridgeClient, BridgeServer, BridgeTransport, Outcome, TransportError };
pub use plugin::{ ClickError, PdcPlugin };
pub use types::{ BridgeMessage, CallsignKey, ClearanceMessage, FlightPlanFields, FlightPlanSnapshot, TagCell, TagColor };
