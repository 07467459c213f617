//! Entity - Obstacles and speed gates
//!
//! Passive track furniture that scrolls toward the start line at a fixed
//! speed and is pruned once fully off the visible track.

use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis speed at which obstacles and gates approach the start line, per tick.
pub const SCROLL_SPEED: f32 = 15.0;

/// Lateral slot values are scaled by this to get world lateral offsets.
pub const LATERAL_SCALE: f32 = 60.0;

/// Scale from a slot value to the lateral offset racers steer toward.
pub const STEER_TARGET_SCALE: f32 = 40.0;

/// Lateral slots an obstacle may occupy within its lane.
const OBSTACLE_SLOTS: [f32; 5] = [-0.6, -0.3, 0.0, 0.3, 0.6];

/// Lateral slots a gate may occupy; less extreme than obstacles.
const GATE_SLOTS: [f32; 3] = [-0.3, 0.0, 0.3];

const OBSTACLE_MIN_SIZE: f32 = 20.0;
const OBSTACLE_MAX_SIZE: f32 = 35.0;
const GATE_SIZE: f32 = 30.0;

/// A damaging obstacle in a single lane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    /// Lane the obstacle belongs to (matches a racer index).
    pub lane: usize,
    /// Position along the track axis; counts down toward the start line.
    pub axis_pos: f32,
    /// Collision size; also the off-track removal margin.
    pub size: f32,
    /// Lateral slot within the lane, in [-0.6, 0.6].
    pub lateral_slot: f32,
}

impl Obstacle {
    /// Spawn a fresh obstacle at the spawn edge of the given lane.
    pub fn spawn(lane: usize, spawn_edge: f32, rng: &mut SmallRng) -> Self {
        Self {
            lane,
            axis_pos: spawn_edge,
            size: rng.gen_range(OBSTACLE_MIN_SIZE..=OBSTACLE_MAX_SIZE),
            lateral_slot: OBSTACLE_SLOTS[rng.gen_range(0..OBSTACLE_SLOTS.len())],
        }
    }

    /// Move one tick toward the start line.
    pub fn advance(&mut self) {
        self.axis_pos -= SCROLL_SPEED;
    }

    /// False once the obstacle has passed the trailing edge by its own size.
    pub fn is_on_track(&self) -> bool {
        self.axis_pos > -self.size
    }

    /// Lateral offset in world units.
    pub fn lateral(&self) -> f32 {
        self.lateral_slot * LATERAL_SCALE
    }

    /// Lateral offset a racer should steer toward to dodge this obstacle.
    pub fn dodge_target(&self) -> f32 {
        -self.lateral_slot * STEER_TARGET_SCALE
    }
}

/// A one-shot boost gate in a single lane.
///
/// Same lifecycle as an obstacle, plus the `activated` latch: the first racer
/// to cross the gate consumes it for everyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedGate {
    pub lane: usize,
    pub axis_pos: f32,
    pub size: f32,
    pub lateral_slot: f32,
    pub activated: bool,
}

impl SpeedGate {
    pub fn spawn(lane: usize, spawn_edge: f32, rng: &mut SmallRng) -> Self {
        Self {
            lane,
            axis_pos: spawn_edge,
            size: GATE_SIZE,
            lateral_slot: GATE_SLOTS[rng.gen_range(0..GATE_SLOTS.len())],
            activated: false,
        }
    }

    pub fn advance(&mut self) {
        self.axis_pos -= SCROLL_SPEED;
    }

    pub fn is_on_track(&self) -> bool {
        self.axis_pos > -self.size
    }

    pub fn lateral(&self) -> f32 {
        self.lateral_slot * LATERAL_SCALE
    }

    /// Lateral offset a racer should steer toward to line up with this gate.
    pub fn approach_target(&self) -> f32 {
        self.lateral_slot * STEER_TARGET_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn obstacle_scrolls_off_track() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut obs = Obstacle::spawn(0, 100.0, &mut rng);
        assert!(obs.is_on_track());
        while obs.is_on_track() {
            obs.advance();
        }
        assert!(obs.axis_pos <= -obs.size);
    }

    #[test]
    fn gate_spawns_unactivated() {
        let mut rng = SmallRng::seed_from_u64(2);
        let gate = SpeedGate::spawn(3, 500.0, &mut rng);
        assert!(!gate.activated);
        assert_eq!(gate.lane, 3);
        assert!(GATE_SLOTS.contains(&gate.lateral_slot));
    }
}
