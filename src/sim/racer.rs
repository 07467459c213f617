//! Racer - Individual pod state and behavior
//!
//! Each racer has track position, a lateral offset inside its lane, a stack
//! of speed effects, and a health/explosion state machine. The simulation
//! updates all racers each tick.

use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::event::EventKind;
use crate::sim::race::RaceConfig;

/// A racer's copy of an applied event: the kind plus the fields that matter
/// while it runs. At most one event is active per racer at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub kind: EventKind,
    pub speed_modifier: f32,
    /// Remaining ticks; the slot is cleared the tick after this reaches zero,
    /// so an event with duration N modifies exactly N position updates.
    pub remaining: u32,
}

/// Racer status flags. `finished` and `destroyed` are one-way.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RacerFlags {
    pub finished: bool,
    pub destroyed: bool,
    pub exploding: bool,
}

/// Complete state for a single racer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacerState {
    /// Unique racer ID (also the lane index).
    pub id: u32,
    /// Racer name
    pub name: String,
    /// Distance traveled along the track
    pub position: f32,
    /// Position at the end of the previous tick, for gate-crossing detection
    pub prev_position: f32,
    /// Lateral offset from the lane center
    pub lateral: f32,
    /// Speed the racer reverts to when all effects expire
    pub base_speed: f32,
    /// Current speed, never below `Racer::MIN_SPEED`
    pub speed: f32,
    /// Boost channel: multiplier applied on top of `speed`
    pub boost_multiplier: f32,
    pub boost_timer: u32,
    /// Slowdown channel: restores `base_speed` on expiry
    pub slowdown_timer: u32,
    /// Gate-boost / obstacle-penalty channel
    pub speed_effect_timer: u32,
    /// Speed stored at effect-application time, restored exactly on expiry
    pub normal_speed: f32,
    /// Scales lateral acceleration and top steering speed
    pub agility: f32,
    pub max_health: f32,
    pub health: f32,
    /// Ticks since last damage; regeneration starts past the config delay
    pub regen_timer: u32,
    /// Current steering direction (-1, 0, or 1)
    pub steer_direction: i8,
    /// Current lateral movement speed
    pub steer_speed: f32,
    /// Active event, if any
    pub active_event: Option<ActiveEvent>,
    /// Status flags
    pub flags: RacerFlags,
    /// Explosion animation frame; gates the Destroyed transition
    pub explosion_frame: u32,
    /// Boost animation countdown (cosmetic)
    pub boost_animation_frames: u32,
}

impl RacerState {
    /// Create a new racer with stats drawn from the config ranges.
    pub fn new(id: u32, name: String, config: &RaceConfig, rng: &mut SmallRng) -> Self {
        let base_speed = sample_range(rng, config.base_speed_range);
        let max_health = sample_range(rng, config.health_range);
        Self {
            id,
            name,
            position: 0.0,
            prev_position: 0.0,
            lateral: 0.0,
            base_speed,
            speed: base_speed,
            boost_multiplier: 1.0,
            boost_timer: 0,
            slowdown_timer: 0,
            speed_effect_timer: 0,
            normal_speed: base_speed,
            agility: sample_range(rng, config.agility_range),
            max_health,
            health: max_health,
            regen_timer: 0,
            steer_direction: 0,
            steer_speed: 0.0,
            active_event: None,
            flags: RacerFlags::default(),
            explosion_frame: 0,
            boost_animation_frames: 0,
        }
    }

    /// True while the racer still participates in the race (it may be
    /// exploding, but its lane stays live until the transition completes).
    pub fn is_active(&self) -> bool {
        !self.flags.finished && !self.flags.destroyed
    }

    /// True while the racer races normally: active and not mid-explosion.
    pub fn is_racing(&self) -> bool {
        self.is_active() && !self.flags.exploding
    }
}

fn sample_range(rng: &mut SmallRng, (lo, hi): (f32, f32)) -> f32 {
    if lo >= hi {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

/// Racer simulation logic
pub struct Racer;

impl Racer {
    /// Constants
    pub const MIN_SPEED: f32 = 0.05;
    pub const MAX_LATERAL: f32 = 25.0;
    pub const BASE_STEER_SPEED: f32 = 1.0;
    pub const MAX_STEER_SPEED: f32 = 4.0;
    pub const STEER_ACCELERATION: f32 = 0.2;
    pub const MAX_EXPLOSION_FRAMES: u32 = 30;
    pub const MAX_BOOST_ANIMATION_FRAMES: u32 = 20;
    const FLAT_BOOST_MULTIPLIER: f32 = 2.0;
    const FLAT_BOOST_TICKS: u32 = 45;
    const SLOWDOWN_FACTOR: f32 = 0.8;
    const SLOWDOWN_TICKS: u32 = 60;

    /// Steer toward a target lateral offset with acceleration, resetting the
    /// steering speed whenever the direction flips.
    pub fn steer(state: &mut RacerState, target: Option<f32>) {
        let target = target.unwrap_or(state.lateral);
        let diff = target - state.lateral;
        let new_direction: i8 = if diff.abs() > 0.1 {
            if diff > 0.0 {
                1
            } else {
                -1
            }
        } else {
            0
        };

        if new_direction != state.steer_direction {
            state.steer_speed = Self::BASE_STEER_SPEED;
            state.steer_direction = new_direction;
        } else {
            state.steer_speed = (state.steer_speed + Self::STEER_ACCELERATION * state.agility)
                .min(Self::MAX_STEER_SPEED * state.agility);
        }

        if state.steer_direction != 0 {
            state.lateral += state.steer_speed * f32::from(state.steer_direction);
        }
        state.lateral = state.lateral.clamp(-Self::MAX_LATERAL, Self::MAX_LATERAL);
    }

    /// Apply the speed-gate boost. While a speed effect is already running
    /// the stored pre-effect speed is kept, so effects never compound.
    pub fn apply_speed_boost(state: &mut RacerState, config: &RaceConfig) {
        if state.speed_effect_timer == 0 {
            state.normal_speed = state.speed;
        }
        state.speed = (state.normal_speed * config.boost_amount).max(Self::MIN_SPEED);
        state.speed_effect_timer = config.speed_effect_duration;
        state.boost_animation_frames = Self::MAX_BOOST_ANIMATION_FRAMES;
    }

    /// Apply the obstacle speed penalty; same single-slot rules as the boost.
    pub fn apply_speed_penalty(state: &mut RacerState, config: &RaceConfig) {
        if state.speed_effect_timer == 0 {
            state.normal_speed = state.speed;
        }
        state.speed = (state.normal_speed * config.penalty_amount).max(Self::MIN_SPEED);
        state.speed_effect_timer = config.speed_effect_duration;
    }

    /// Temporary flat boost on the multiplier channel.
    pub fn apply_boost(state: &mut RacerState) {
        state.boost_multiplier = Self::FLAT_BOOST_MULTIPLIER;
        state.boost_timer = Self::FLAT_BOOST_TICKS;
    }

    /// Temporary slowdown that restores `base_speed` when it runs out.
    pub fn apply_slowdown(state: &mut RacerState) {
        state.speed = (state.speed * Self::SLOWDOWN_FACTOR).max(Self::MIN_SPEED);
        state.slowdown_timer = Self::SLOWDOWN_TICKS;
    }

    /// Subtract damage, floored at zero health. Hitting zero starts the
    /// explosion sequence; the racer is only destroyed once it finishes.
    pub fn apply_damage(state: &mut RacerState, amount: f32) {
        state.health = (state.health - amount).max(0.0);
        state.regen_timer = 0;
        if state.health <= 0.0 && !state.flags.exploding {
            Self::start_explosion(state);
        }
    }

    /// Force the explosion sequence (zero health or a lethal event).
    pub fn start_explosion(state: &mut RacerState) {
        state.flags.exploding = true;
        state.explosion_frame = 0;
    }

    /// Tick down every speed effect and the active event; on expiry each
    /// channel restores the exact value stored when the effect was applied.
    pub fn tick_speed_effects(state: &mut RacerState) {
        if state.speed_effect_timer > 0 {
            state.speed_effect_timer -= 1;
            if state.speed_effect_timer == 0 {
                state.speed = state.normal_speed.max(Self::MIN_SPEED);
            }
        }

        if state.slowdown_timer > 0 {
            state.slowdown_timer -= 1;
            if state.slowdown_timer == 0 {
                state.speed = state.base_speed.max(Self::MIN_SPEED);
            }
        }

        if state.boost_timer > 0 {
            state.boost_timer -= 1;
            if state.boost_timer == 0 {
                state.boost_multiplier = 1.0;
            }
        }

        if let Some(event) = &mut state.active_event {
            if event.remaining == 0 {
                state.active_event = None;
            } else {
                event.remaining -= 1;
            }
        }
    }

    /// Health regeneration: a delay counter since the last damage, then a
    /// fixed per-tick regain capped at max health.
    pub fn tick_health(state: &mut RacerState, config: &RaceConfig) {
        if state.regen_timer < config.health_regen_delay {
            state.regen_timer += 1;
        } else if state.health < state.max_health {
            state.health = (state.health + config.health_regen_rate).min(state.max_health);
        }
    }

    /// Advance along the track. Returns true if the racer crossed the finish
    /// line this tick (first time only).
    pub fn advance_position(state: &mut RacerState, distance: f32, rng: &mut SmallRng) -> bool {
        state.prev_position = state.position;

        let mut step = rng.gen_range(1.0..2.0) * state.speed * state.boost_multiplier;
        if let Some(event) = &state.active_event {
            step *= event.speed_modifier;
        }

        state.position += step;
        if state.position >= distance && !state.flags.finished {
            state.position = distance;
            state.flags.finished = true;
            return true;
        }
        false
    }

    /// Advance the explosion animation; at the last frame the racer becomes
    /// destroyed and counts as finished without a placing.
    pub fn tick_explosion(state: &mut RacerState) {
        if !state.flags.exploding {
            return;
        }
        state.explosion_frame += 1;
        if state.explosion_frame >= Self::MAX_EXPLOSION_FRAMES {
            state.flags.exploding = false;
            state.flags.destroyed = true;
            state.flags.finished = true;
        }
    }
}

/// Compact racer state for presenter transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacerSnapshot {
    pub id: u32,
    pub position: f32,
    pub lateral: f32,
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub active_event: Option<EventKind>,
    pub finished: bool,
    pub destroyed: bool,
    pub exploding: bool,
    pub explosion_frame: u32,
    pub boost_animation_frames: u32,
}

impl From<&RacerState> for RacerSnapshot {
    fn from(state: &RacerState) -> Self {
        Self {
            id: state.id,
            position: state.position,
            lateral: state.lateral,
            speed: state.speed,
            health: state.health,
            max_health: state.max_health,
            active_event: state.active_event.map(|e| e.kind),
            finished: state.flags.finished,
            destroyed: state.flags.destroyed,
            exploding: state.flags.exploding,
            explosion_frame: state.explosion_frame,
            boost_animation_frames: state.boost_animation_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn test_racer() -> RacerState {
        let config = RaceConfig {
            base_speed_range: (1.2, 1.2),
            agility_range: (1.0, 1.0),
            health_range: (100.0, 100.0),
            ..RaceConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        RacerState::new(0, "Pod 1".to_string(), &config, &mut rng)
    }

    #[test]
    fn speed_effect_restores_exact_pre_effect_speed() {
        let config = RaceConfig::default();
        let mut racer = test_racer();
        let before = racer.speed;

        Racer::apply_speed_penalty(&mut racer, &config);
        assert!(racer.speed < before);

        // A second hit mid-effect must not compound the penalty.
        Racer::apply_speed_penalty(&mut racer, &config);
        assert!((racer.speed - before * config.penalty_amount).abs() < f32::EPSILON);

        for _ in 0..config.speed_effect_duration {
            Racer::tick_speed_effects(&mut racer);
        }
        assert!((racer.speed - before).abs() < f32::EPSILON);
    }

    #[test]
    fn boost_then_penalty_swaps_multiplier_without_stacking() {
        let config = RaceConfig::default();
        let mut racer = test_racer();
        let before = racer.speed;

        Racer::apply_speed_boost(&mut racer, &config);
        Racer::apply_speed_penalty(&mut racer, &config);
        assert!((racer.speed - before * config.penalty_amount).abs() < f32::EPSILON);
        assert!((racer.normal_speed - before).abs() < f32::EPSILON);
    }

    #[test]
    fn damage_floors_at_zero_and_starts_explosion() {
        let mut racer = test_racer();
        let lethal = racer.max_health + 500.0;
        Racer::apply_damage(&mut racer, lethal);
        assert_eq!(racer.health, 0.0);
        assert!(racer.flags.exploding);
        assert!(!racer.flags.destroyed);
    }

    #[test]
    fn regen_waits_for_the_delay() {
        let config = RaceConfig {
            health_regen_delay: 10,
            health_regen_rate: 1.0,
            ..RaceConfig::default()
        };
        let mut racer = test_racer();
        Racer::apply_damage(&mut racer, 5.0);
        let damaged = racer.health;

        for _ in 0..10 {
            Racer::tick_health(&mut racer, &config);
        }
        assert_eq!(racer.health, damaged);

        Racer::tick_health(&mut racer, &config);
        assert!(racer.health > damaged);

        for _ in 0..100 {
            Racer::tick_health(&mut racer, &config);
        }
        assert_eq!(racer.health, racer.max_health);
    }

    #[test]
    fn boost_and_slowdown_channels_decay_to_their_baselines() {
        let mut racer = test_racer();

        Racer::apply_boost(&mut racer);
        assert_eq!(racer.boost_multiplier, 2.0);
        for _ in 0..45 {
            Racer::tick_speed_effects(&mut racer);
        }
        assert_eq!(racer.boost_multiplier, 1.0);

        Racer::apply_slowdown(&mut racer);
        assert!(racer.speed < racer.base_speed);
        for _ in 0..60 {
            Racer::tick_speed_effects(&mut racer);
        }
        assert_eq!(racer.speed, racer.base_speed);
    }

    #[test]
    fn steering_resets_acceleration_on_direction_change() {
        let mut racer = test_racer();
        Racer::steer(&mut racer, Some(20.0));
        Racer::steer(&mut racer, Some(20.0));
        assert!(racer.steer_speed > Racer::BASE_STEER_SPEED);

        Racer::steer(&mut racer, Some(-20.0));
        assert_eq!(racer.steer_speed, Racer::BASE_STEER_SPEED);
        assert_eq!(racer.steer_direction, -1);
    }
}
