//! Server - Main simulation host and loop
//!
//! Manages the host-facing state machine, handles tick updates, and
//! provides the interface a presenter drives at its own cadence.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::race::{Race, RaceConfig, RaceResult, RaceSnapshot, RaceStatus};

/// Host-facing state of the simulation server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Idle,
    Loading,
    Ready,
    Racing,
    Results,
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub avg_tick_time_ms: f32,
    pub racer_count: u32,
    pub game_state: GameState,
}

/// Main simulation server
pub struct RaceServer {
    /// Current host state
    state: GameState,
    /// Active race (if any)
    race: Option<Race>,
    /// Accumulated tick times for averaging
    tick_times: Vec<f32>,
    /// Whether the server is running
    running: bool,
}

impl RaceServer {
    /// Create a new race server
    pub fn new() -> Self {
        Self {
            state: GameState::Idle,
            race: None,
            tick_times: Vec::with_capacity(60),
            running: false,
        }
    }

    /// Initialize a new race with given config
    pub fn init_race(&mut self, config: RaceConfig) -> Result<()> {
        self.state = GameState::Loading;

        let race = Race::new(config)?;
        self.race = Some(race);
        self.state = GameState::Ready;
        Ok(())
    }

    /// Start the race countdown
    pub fn start_race(&mut self) {
        if let Some(race) = &mut self.race {
            race.start_countdown();
            self.state = GameState::Racing;
            self.running = true;
        }
    }

    /// Perform a single simulation tick
    pub fn tick(&mut self) -> Option<RaceSnapshot> {
        if !self.running {
            return self.race.as_ref().map(|r| r.get_snapshot());
        }

        // Track tick timing
        let tick_start = Instant::now();

        // Update race
        if let Some(race) = &mut self.race {
            race.tick();

            // Check for state transitions
            if race.status == RaceStatus::Finished {
                self.state = GameState::Results;
                self.running = false;
            }
        }

        // Record tick time
        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > 60 {
            self.tick_times.remove(0);
        }

        self.race.as_ref().map(|r| r.get_snapshot())
    }

    /// Get current race snapshot without advancing the simulation
    pub fn get_snapshot(&self) -> Option<RaceSnapshot> {
        self.race.as_ref().map(|r| r.get_snapshot())
    }

    /// Get race results
    pub fn get_results(&self) -> Option<Vec<RaceResult>> {
        self.race.as_ref().map(|r| r.finish_order.clone())
    }

    /// Borrow the active race, if any
    pub fn race(&self) -> Option<&Race> {
        self.race.as_ref()
    }

    /// Get server statistics
    pub fn get_stats(&self) -> ServerStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        ServerStats {
            avg_tick_time_ms: avg_tick_time,
            racer_count: self.race.as_ref().map(|r| r.racers.len() as u32).unwrap_or(0),
            game_state: self.state,
        }
    }

    /// Get current host state
    pub fn get_state(&self) -> GameState {
        self.state
    }

    /// Reset to idle state
    pub fn reset(&mut self) {
        self.state = GameState::Idle;
        self.race = None;
        self.running = false;
        self.tick_times.clear();
    }

    /// Pause the simulation
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume the simulation
    pub fn resume(&mut self) {
        if self.state == GameState::Racing {
            self.running = true;
        }
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for RaceServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe server wrapper for embedding in a host application
pub type SharedRaceServer = Arc<RwLock<RaceServer>>;

/// Create a new shared race server
pub fn create_shared_server() -> SharedRaceServer {
    Arc::new(RwLock::new(RaceServer::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_walks_through_states() {
        let mut server = RaceServer::new();
        assert_eq!(server.get_state(), GameState::Idle);

        let config = RaceConfig {
            distance: 200.0,
            track_span: 200.0,
            racer_count: 2,
            countdown_ticks: 0,
            obstacle_spawn_rate: 0.0,
            gate_spawn_rate: 0.0,
            seed: 11,
            ..RaceConfig::default()
        };
        server.init_race(config).unwrap();
        assert_eq!(server.get_state(), GameState::Ready);
        assert!(!server.is_running());

        server.start_race();
        assert_eq!(server.get_state(), GameState::Racing);

        let mut guard = 0;
        while server.get_state() == GameState::Racing {
            server.tick();
            guard += 1;
            assert!(guard < 10_000, "race never finished");
        }
        assert_eq!(server.get_state(), GameState::Results);
        assert!(!server.is_running());
        let results = server.get_results().unwrap();
        assert!(!results.is_empty());

        server.reset();
        assert_eq!(server.get_state(), GameState::Idle);
        assert!(server.get_snapshot().is_none());
    }

    #[test]
    fn pause_stops_ticking() {
        let mut server = RaceServer::new();
        server
            .init_race(RaceConfig {
                countdown_ticks: 0,
                seed: 5,
                ..RaceConfig::default()
            })
            .unwrap();
        server.start_race();
        server.tick();
        let before = server.get_snapshot().unwrap().tick;

        server.pause();
        server.tick();
        server.tick();
        assert_eq!(server.get_snapshot().unwrap().tick, before);

        server.resume();
        server.tick();
        assert_eq!(server.get_snapshot().unwrap().tick, before + 1);
    }

    #[test]
    fn invalid_config_leaves_no_race() {
        let mut server = RaceServer::new();
        let result = server.init_race(RaceConfig {
            distance: -5.0,
            ..RaceConfig::default()
        });
        assert!(result.is_err());
        assert!(server.get_snapshot().is_none());
    }
}
