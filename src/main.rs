//! Headless race runner
//!
//! Drives the simulation from the terminal with no graphical presenter:
//! ASCII progress while racing, final standings at the end.

use std::time::{SystemTime, UNIX_EPOCH};

use pod_race_sim::{RaceConfig, RaceServer, Result};

const PROGRESS_COLS: usize = 20;
const STATUS_EVERY_TICKS: u64 = 200;

fn print_status(server: &RaceServer, distance: f32) {
    let Some(race) = server.race() else { return };
    println!("{}", "=".repeat(60));
    if let Some(leader) = race.get_leader() {
        println!("leader: {} at {:.1}m", leader.name, leader.position);
    }
    for racer in race.racers() {
        let filled = (((racer.position / distance) * PROGRESS_COLS as f32) as usize).min(PROGRESS_COLS);
        let status = if racer.flags.destroyed {
            " [DESTROYED]"
        } else if racer.flags.finished {
            " [FINISHED]"
        } else {
            ""
        };
        println!(
            "{:>6}: {}{} {:.1}m{}",
            racer.name,
            "#".repeat(filled),
            "-".repeat(PROGRESS_COLS - filled),
            racer.position,
            status
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let config = RaceConfig {
        distance: 2_000.0,
        seed,
        ..RaceConfig::default()
    };
    let distance = config.distance;

    let mut server = RaceServer::new();
    server.init_race(config)?;
    server.start_race();

    while server.is_running() {
        let snapshot = server.tick();
        if let Some(snapshot) = snapshot {
            if snapshot.tick > 0 && snapshot.tick % STATUS_EVERY_TICKS == 0 {
                print_status(&server, distance);
            }
        }
    }

    print_status(&server, distance);
    println!("\nRace finished!");
    if let Some(results) = server.get_results() {
        for result in &results {
            println!("{}. {}", result.placing, result.racer_name);
        }
        if results.is_empty() {
            println!("No pod survived to the finish line.");
        }
    }
    let stats = server.get_stats();
    log::info!("avg tick time: {:.3} ms", stats.avg_tick_time_ms);

    Ok(())
}
