//! Route table, authorization gate and navigation state.

mod routes;
mod gate;
mod navigator;

pub use routes::{Access, Route};
pub use gate::{GateDecision, GateState, RoleLookup, RouteGate};
pub use navigator::{Direction, Navigation, Navigator};
