//! Event - Random timed status effects
//!
//! Static descriptors rolled once per tick for racers with an empty event
//! slot. The presenter maps `EventKind` to whatever sound or visual it wants;
//! the core only cares about the speed modifier and the lethality flag.

use serde::{Deserialize, Serialize};

/// Kind of random event that can strike a racer mid-race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    EngineTrouble,
    SandStorm,
    DebrisHit,
    CriticalFailure,
}

impl EventKind {
    /// Human-readable label, for logs and HUD text.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::EngineTrouble => "Engine Trouble",
            EventKind::SandStorm => "Sand Storm",
            EventKind::DebrisHit => "Debris Hit",
            EventKind::CriticalFailure => "Critical Failure",
        }
    }
}

/// Immutable descriptor of a random event.
///
/// Entries are never mutated; racers hold a copy of the fields they need
/// while an event is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventSpec {
    pub kind: EventKind,
    /// Trigger probability per tick per racer.
    pub probability: f64,
    /// How many ticks the speed modifier stays active.
    pub duration_ticks: u32,
    /// Multiplier applied to the racer's per-tick movement while active.
    pub speed_modifier: f32,
    /// A lethal event forces the explosion sequence regardless of health.
    pub lethal: bool,
}

/// The canonical event table, in roll order.
///
/// Order matters: the roll short-circuits on the first successful draw, so
/// earlier entries shadow later ones.
pub const EVENT_TABLE: [EventSpec; 4] = [
    EventSpec {
        kind: EventKind::EngineTrouble,
        probability: 0.005,
        duration_ticks: 50,
        speed_modifier: 0.5,
        lethal: false,
    },
    EventSpec {
        kind: EventKind::SandStorm,
        probability: 0.002,
        duration_ticks: 100,
        speed_modifier: 0.7,
        lethal: false,
    },
    EventSpec {
        kind: EventKind::DebrisHit,
        probability: 0.003,
        duration_ticks: 30,
        speed_modifier: 0.6,
        lethal: false,
    },
    EventSpec {
        kind: EventKind::CriticalFailure,
        probability: 0.0005,
        duration_ticks: 1,
        speed_modifier: 0.0,
        lethal: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_is_stable() {
        let kinds: Vec<EventKind> = EVENT_TABLE.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::EngineTrouble,
                EventKind::SandStorm,
                EventKind::DebrisHit,
                EventKind::CriticalFailure,
            ]
        );
    }

    #[test]
    fn only_critical_failure_is_lethal() {
        for spec in &EVENT_TABLE {
            assert_eq!(spec.lethal, spec.kind == EventKind::CriticalFailure);
            assert!((0.0..=1.0).contains(&spec.probability));
        }
    }
}
