//! Pod Race Simulator - Simulation Core
//!
//! A deterministic, single-threaded pod-racing simulation: racers advance
//! along a scalar track, dodging obstacles and chasing speed gates that
//! scroll toward them, while random timed events and a health/explosion
//! state machine thin the field. Rendering, audio, and UI live in an
//! external presenter that drives [`RaceServer::tick`] at its own cadence
//! and only ever reads the returned state.
//!
//! ```no_run
//! use pod_race_sim::{RaceConfig, RaceServer};
//!
//! # fn main() -> pod_race_sim::Result<()> {
//! let mut server = RaceServer::new();
//! server.init_race(RaceConfig::default())?;
//! server.start_race();
//! while server.is_running() {
//!     let snapshot = server.tick();
//!     // hand the snapshot to the presenter
//!     # let _ = snapshot;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod sim;

pub use error::{Result, SimError};
pub use sim::{
    create_shared_server, ActiveEvent, EventKind, EventSpec, GameState, Obstacle, Race,
    RaceConfig, RaceResult, RaceServer, RaceSnapshot, RaceStatus, Racer, RacerSnapshot,
    RacerState, ServerStats, SharedRaceServer, SpeedGate, EVENT_TABLE,
};
