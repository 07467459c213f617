//! Simulation Module
//!
//! The pod-racing world and the server loop that advances it one tick at a
//! time. Presenters read snapshots or the borrow-returning views; nothing
//! outside this module mutates simulation state.

pub mod entity;
pub mod event;
pub mod race;
pub mod racer;
pub mod server;

pub use entity::{Obstacle, SpeedGate};
pub use event::{EventKind, EventSpec, EVENT_TABLE};
pub use race::{Race, RaceConfig, RaceResult, RaceSnapshot, RaceStatus};
pub use racer::{ActiveEvent, Racer, RacerFlags, RacerSnapshot, RacerState};
pub use server::{create_shared_server, GameState, RaceServer, ServerStats, SharedRaceServer};
