//! Race - Race configuration and state management
//!
//! Owns the racers, the obstacle and gate lists, the event table, and the
//! RNG, and advances all of them one discrete tick at a time. The tick runs
//! fixed phases in order: spawn, entity advance, steering, collisions,
//! event rolls, effect decay, health regen, position advance, explosions.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::sim::entity::{Obstacle, SpeedGate, SCROLL_SPEED};
use crate::sim::event::{EventSpec, EVENT_TABLE};
use crate::sim::racer::{ActiveEvent, Racer, RacerSnapshot, RacerState};

/// Race configuration, fixed for the length of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Total race distance
    pub distance: f32,
    /// Number of racers (one lane each)
    pub racer_count: usize,
    /// Length of the visible track axis; obstacles and gates spawn here
    pub track_span: f32,
    /// Probability per tick per active lane of spawning an obstacle
    pub obstacle_spawn_rate: f64,
    /// Probability per tick per active lane of spawning a speed gate
    pub gate_spawn_rate: f64,
    /// Minimum axis distance from the spawn edge to the nearest same-lane obstacle
    pub min_obstacle_spacing: f32,
    /// Minimum axis distance from the spawn edge to the nearest same-lane gate
    pub min_gate_spacing: f32,
    /// Obstacle detection range (takes priority over gate seeking)
    pub avoid_range: f32,
    /// Gate detection range
    pub seek_range: f32,
    /// Ticks without damage before health regeneration starts
    pub health_regen_delay: u32,
    /// Health regained per tick once regeneration is running
    pub health_regen_rate: f32,
    /// Speed multiplier applied by a gate boost
    pub boost_amount: f32,
    /// Speed multiplier applied by an obstacle hit
    pub penalty_amount: f32,
    /// Shared duration of gate boosts and obstacle penalties, in ticks
    pub speed_effect_duration: u32,
    /// Per-racer base speed draw range (set both ends equal for fixed stats)
    pub base_speed_range: (f32, f32),
    /// Per-racer agility draw range
    pub agility_range: (f32, f32),
    /// Per-racer max health draw range
    pub health_range: (f32, f32),
    /// Countdown length before racing starts, in ticks
    pub countdown_ticks: u32,
    /// RNG seed; a fixed seed and config reproduce the run exactly
    pub seed: u64,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            distance: 25_000.0,
            racer_count: 6,
            track_span: 1500.0,
            obstacle_spawn_rate: 0.015,
            gate_spawn_rate: 0.006,
            min_obstacle_spacing: 150.0,
            min_gate_spacing: 400.0,
            avoid_range: 300.0,
            seek_range: 400.0,
            health_regen_delay: 500,
            health_regen_rate: 0.2,
            boost_amount: 1.5,
            penalty_amount: 0.6,
            speed_effect_duration: 45,
            base_speed_range: (1.0, 1.4),
            agility_range: (0.8, 1.5),
            health_range: (80.0, 150.0),
            countdown_ticks: 3,
            seed: 0,
        }
    }
}

impl RaceConfig {
    /// Reject configurations that would make the simulation misbehave.
    pub fn validate(&self) -> Result<()> {
        fn bad(msg: impl Into<String>) -> Result<()> {
            Err(SimError::InvalidConfiguration(msg.into()))
        }

        if !(self.distance > 0.0) {
            return bad(format!("distance must be > 0, got {}", self.distance));
        }
        if self.racer_count == 0 {
            return bad("racer_count must be > 0");
        }
        if !(self.track_span > 0.0) {
            return bad(format!("track_span must be > 0, got {}", self.track_span));
        }
        for (name, p) in [
            ("obstacle_spawn_rate", self.obstacle_spawn_rate),
            ("gate_spawn_rate", self.gate_spawn_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return bad(format!("{name} must be within [0, 1], got {p}"));
            }
        }
        for (name, s) in [
            ("min_obstacle_spacing", self.min_obstacle_spacing),
            ("min_gate_spacing", self.min_gate_spacing),
            ("avoid_range", self.avoid_range),
            ("seek_range", self.seek_range),
            ("health_regen_rate", self.health_regen_rate),
        ] {
            if !(s >= 0.0) {
                return bad(format!("{name} must be >= 0, got {s}"));
            }
        }
        for (name, f) in [
            ("boost_amount", self.boost_amount),
            ("penalty_amount", self.penalty_amount),
        ] {
            if !(f > 0.0) {
                return bad(format!("{name} must be > 0, got {f}"));
            }
        }
        for (name, (lo, hi)) in [
            ("base_speed_range", self.base_speed_range),
            ("agility_range", self.agility_range),
            ("health_range", self.health_range),
        ] {
            if !(lo > 0.0) || lo > hi {
                return bad(format!("{name} must satisfy 0 < low <= high, got ({lo}, {hi})"));
            }
        }
        Ok(())
    }
}

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    NotStarted,
    Countdown,
    Racing,
    Finished,
}

/// One entry in the finish order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceResult {
    pub racer_id: u32,
    pub racer_name: String,
    pub finish_tick: u64,
    pub placing: u32,
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct Race {
    /// Race configuration
    pub config: RaceConfig,
    /// Current race status
    pub status: RaceStatus,
    /// All racers, indexed by lane
    pub racers: Vec<RacerState>,
    /// Active obstacles
    pub obstacles: Vec<Obstacle>,
    /// Active speed gates
    pub speed_gates: Vec<SpeedGate>,
    /// Event table rolled each tick, in order (first match wins)
    pub events: Vec<EventSpec>,
    /// Ticks elapsed since racing began
    pub tick_count: u64,
    /// Countdown ticks remaining
    pub countdown: u32,
    /// Racers in the order they finished (destroyed racers never enter)
    pub finish_order: Vec<RaceResult>,
    rng: SmallRng,
}

impl Race {
    /// Create a new race with the given configuration.
    pub fn new(config: RaceConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = SmallRng::seed_from_u64(config.seed);
        let racers = (0..config.racer_count)
            .map(|i| RacerState::new(i as u32, format!("Pod {}", i + 1), &config, &mut rng))
            .collect();

        log::info!("Race initialized with {} racers", config.racer_count);
        Ok(Self {
            config,
            status: RaceStatus::NotStarted,
            racers,
            obstacles: Vec::new(),
            speed_gates: Vec::new(),
            events: EVENT_TABLE.to_vec(),
            tick_count: 0,
            countdown: 0,
            finish_order: Vec::new(),
            rng,
        })
    }

    /// Start the countdown (or racing directly if the countdown is zero).
    pub fn start_countdown(&mut self) {
        if self.config.countdown_ticks == 0 {
            self.status = RaceStatus::Racing;
        } else {
            self.countdown = self.config.countdown_ticks;
            self.status = RaceStatus::Countdown;
        }
    }

    /// Advance the whole world by one discrete tick.
    pub fn tick(&mut self) {
        match self.status {
            RaceStatus::NotStarted => {}

            RaceStatus::Countdown => {
                self.countdown = self.countdown.saturating_sub(1);
                if self.countdown == 0 {
                    self.status = RaceStatus::Racing;
                    log::info!("Race started");
                }
            }

            RaceStatus::Racing => {
                self.tick_count += 1;
                self.spawn_entities();
                self.advance_entities();
                self.steer_racers();
                self.resolve_collisions();
                self.roll_events();
                self.advance_racers();
                self.tick_explosions();

                if self.racers.iter().all(|r| r.flags.finished) {
                    self.status = RaceStatus::Finished;
                    log::info!(
                        "Race finished after {} ticks, {} placing finishers",
                        self.tick_count,
                        self.finish_order.len()
                    );
                }
            }

            RaceStatus::Finished => {
                // Cosmetic timers keep decaying for the results screen.
                for racer in &mut self.racers {
                    racer.boost_animation_frames = racer.boost_animation_frames.saturating_sub(1);
                }
            }
        }
    }

    /// A lane spawns entities while its racer is still in the race.
    fn lane_active(&self, lane: usize) -> bool {
        self.racers[lane].is_active()
    }

    /// Map a racer's race position onto the track axis entities scroll along.
    fn axis_pos(config: &RaceConfig, position: f32) -> f32 {
        position / config.distance * config.track_span
    }

    /// Phase 1: per active lane, roll for an obstacle and a gate, subject to
    /// the minimum spacing against the spawn edge.
    fn spawn_entities(&mut self) {
        let span = self.config.track_span;
        for lane in 0..self.racers.len() {
            if !self.lane_active(lane) {
                continue;
            }

            if self.rng.gen_bool(self.config.obstacle_spawn_rate) {
                let blocked = self.obstacles.iter().any(|o| {
                    o.lane == lane && o.axis_pos > span - self.config.min_obstacle_spacing
                });
                if !blocked {
                    self.obstacles.push(Obstacle::spawn(lane, span, &mut self.rng));
                }
            }

            if self.rng.gen_bool(self.config.gate_spawn_rate) {
                let blocked = self
                    .speed_gates
                    .iter()
                    .any(|g| g.lane == lane && g.axis_pos > span - self.config.min_gate_spacing);
                if !blocked {
                    self.speed_gates.push(SpeedGate::spawn(lane, span, &mut self.rng));
                }
            }
        }
    }

    /// Phase 2: scroll everything toward the start line and prune entities
    /// fully off the track.
    fn advance_entities(&mut self) {
        for obstacle in &mut self.obstacles {
            obstacle.advance();
        }
        self.obstacles.retain(Obstacle::is_on_track);

        for gate in &mut self.speed_gates {
            gate.advance();
        }
        self.speed_gates.retain(SpeedGate::is_on_track);
    }

    /// Phase 3: each racer dodges its nearest upcoming obstacle, or lines up
    /// with its nearest unactivated gate. Obstacles take priority.
    fn steer_racers(&mut self) {
        let config = &self.config;
        for racer in self.racers.iter_mut().filter(|r| r.is_racing()) {
            let lane = racer.id as usize;
            let x = Self::axis_pos(config, racer.position);

            let nearest_obstacle = self
                .obstacles
                .iter()
                .filter(|o| o.lane == lane)
                .map(|o| (o, o.axis_pos - x))
                .filter(|(_, d)| *d > 0.0)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            let nearest_gate = self
                .speed_gates
                .iter()
                .filter(|g| g.lane == lane && !g.activated)
                .map(|g| (g, g.axis_pos - x))
                .filter(|(_, d)| *d > 0.0)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            let target = match (nearest_obstacle, nearest_gate) {
                (Some((obstacle, dist)), _) if dist < config.avoid_range => {
                    Some(obstacle.dodge_target())
                }
                (_, Some((gate, dist))) if dist < config.seek_range => {
                    Some(gate.approach_target())
                }
                _ => None,
            };
            Racer::steer(racer, target);
        }
    }

    /// Phase 4: obstacle hits and near-misses, then gate crossings.
    fn resolve_collisions(&mut self) {
        let Race {
            config,
            racers,
            obstacles,
            speed_gates,
            rng,
            ..
        } = self;

        for racer in racers.iter_mut().filter(|r| r.is_racing()) {
            let lane = racer.id as usize;
            let x = Self::axis_pos(config, racer.position);
            let prev_x = Self::axis_pos(config, racer.prev_position);

            for obstacle in obstacles.iter().filter(|o| o.lane == lane) {
                let half = obstacle.size / 2.0;
                if x < obstacle.axis_pos - half || x > obstacle.axis_pos + half {
                    continue;
                }
                if (racer.lateral - obstacle.lateral()).abs() < obstacle.size {
                    // Direct hit: damage scales with how fast the pod came in.
                    let damage = rng.gen_range(20.0..45.0) * racer.speed * racer.boost_multiplier;
                    Racer::apply_damage(racer, damage);
                    Racer::apply_speed_penalty(racer, config);
                    log::debug!("{} hit an obstacle for {:.0} damage", racer.name, damage);
                } else {
                    // Near miss: clipped turbulence, no hull damage.
                    Racer::apply_speed_penalty(racer, config);
                }
            }

            if !racer.is_racing() {
                // Exploded on impact; no gate can help now.
                continue;
            }

            for gate in speed_gates
                .iter_mut()
                .filter(|g| g.lane == lane && !g.activated)
            {
                let half = gate.size / 2.0;
                let leading = gate.axis_pos - half;
                // The gate scrolled once this tick, so its previous-tick edge
                // sits one scroll step further down the track.
                let prev_leading = leading + SCROLL_SPEED;
                let crossed = prev_x < prev_leading
                    && x >= leading
                    && x <= gate.axis_pos + half
                    && (racer.lateral - gate.lateral()).abs() < half;
                if crossed {
                    gate.activated = true;
                    Racer::apply_speed_boost(racer, config);
                    log::info!("{} catches a speed gate", racer.name);
                }
            }
        }
    }

    /// Phase 5: racers with an empty event slot roll the table in order;
    /// the first successful draw wins.
    fn roll_events(&mut self) {
        let Race {
            racers,
            events,
            rng,
            ..
        } = self;

        for racer in racers
            .iter_mut()
            .filter(|r| r.is_racing() && r.active_event.is_none())
        {
            for spec in events.iter() {
                if rng.gen::<f64>() < spec.probability {
                    racer.active_event = Some(ActiveEvent {
                        kind: spec.kind,
                        speed_modifier: spec.speed_modifier,
                        remaining: spec.duration_ticks,
                    });
                    log::info!("{}: {}", racer.name, spec.kind.label());
                    if spec.lethal {
                        Racer::start_explosion(racer);
                    }
                    break;
                }
            }
        }
    }

    /// Phases 6-8: effect decay, health regeneration, position advance.
    fn advance_racers(&mut self) {
        let Race {
            config,
            racers,
            finish_order,
            tick_count,
            rng,
            ..
        } = self;

        for racer in racers.iter_mut().filter(|r| r.is_racing()) {
            Racer::tick_speed_effects(racer);
            Racer::tick_health(racer, config);
            debug_assert!(
                racer.health >= 0.0 && racer.health <= racer.max_health,
                "health out of bounds for {}",
                racer.name
            );

            if Racer::advance_position(racer, config.distance, rng) {
                let placing = (finish_order.len() + 1) as u32;
                finish_order.push(RaceResult {
                    racer_id: racer.id,
                    racer_name: racer.name.clone(),
                    finish_tick: *tick_count,
                    placing,
                });
                log::info!("{} finishes in position {}", racer.name, placing);
            }
        }
    }

    /// Phase 9: explosion animation frames, then cosmetic timer decay.
    fn tick_explosions(&mut self) {
        for racer in &mut self.racers {
            if racer.flags.exploding && !racer.flags.destroyed {
                Racer::tick_explosion(racer);
                if racer.flags.destroyed {
                    log::info!("{} is destroyed", racer.name);
                }
            }
            racer.boost_animation_frames = racer.boost_animation_frames.saturating_sub(1);
        }
    }

    /// Read-only view of the racers, in lane order.
    pub fn racers(&self) -> &[RacerState] {
        &self.racers
    }

    /// Read-only view of the active obstacles.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Read-only view of the active speed gates.
    pub fn speed_gates(&self) -> &[SpeedGate] {
        &self.speed_gates
    }

    /// Racers in the order they finished.
    pub fn finish_order(&self) -> &[RaceResult] {
        &self.finish_order
    }

    /// True once every racer is finished or destroyed.
    pub fn is_race_finished(&self) -> bool {
        self.racers.iter().all(|r| r.flags.finished)
    }

    /// Get compact snapshot for presenter transfer
    pub fn get_snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            status: self.status,
            tick: self.tick_count,
            countdown: self.countdown,
            racers: self.racers.iter().map(RacerSnapshot::from).collect(),
            obstacles: self.obstacles.clone(),
            speed_gates: self.speed_gates.clone(),
            finisher_count: self.finish_order.len() as u32,
        }
    }

    /// Get current leader
    pub fn get_leader(&self) -> Option<&RacerState> {
        self.racers
            .iter()
            .max_by(|a, b| a.position.total_cmp(&b.position))
    }

    /// Get racer by ID
    pub fn get_racer(&self, id: u32) -> Option<&RacerState> {
        self.racers.iter().find(|r| r.id == id)
    }
}

/// Compact race snapshot for presenter transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub tick: u64,
    pub countdown: u32,
    pub racers: Vec<RacerSnapshot>,
    pub obstacles: Vec<Obstacle>,
    pub speed_gates: Vec<SpeedGate>,
    pub finisher_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RaceConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad = [
            RaceConfig {
                distance: 0.0,
                ..RaceConfig::default()
            },
            RaceConfig {
                racer_count: 0,
                ..RaceConfig::default()
            },
            RaceConfig {
                obstacle_spawn_rate: 1.5,
                ..RaceConfig::default()
            },
            RaceConfig {
                gate_spawn_rate: -0.1,
                ..RaceConfig::default()
            },
            RaceConfig {
                min_gate_spacing: -1.0,
                ..RaceConfig::default()
            },
            RaceConfig {
                base_speed_range: (1.4, 1.0),
                ..RaceConfig::default()
            },
        ];
        for config in bad {
            assert!(Race::new(config).is_err());
        }
    }

    #[test]
    fn countdown_runs_before_racing() {
        let config = RaceConfig {
            countdown_ticks: 3,
            ..RaceConfig::default()
        };
        let mut race = Race::new(config).unwrap();
        race.start_countdown();
        assert_eq!(race.status, RaceStatus::Countdown);

        race.tick();
        race.tick();
        assert_eq!(race.status, RaceStatus::Countdown);
        race.tick();
        assert_eq!(race.status, RaceStatus::Racing);
        assert_eq!(race.tick_count, 0);
    }
}
