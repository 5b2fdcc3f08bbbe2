use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::biome::BiomeConfig;
use crate::config::simulation::SimulationConfig;
use crate::game::challenge::{Challenge, ChallengeOutcome};
use crate::game::population::Population;
use crate::scene::Scene;
use crate::server::protocol::{self, CommandReply};
use crate::server::{self, ServerState};
use crate::statistics::{simulate_run, RunStatistics};
use crate::steering::agent::AgentPhase;
use crate::steering::Frame;
use crate::world::content::BiomeContent;
use crate::world::scenarios;

/// Serve one scene over WebSocket until Ctrl-C. A custom biome table
/// replaces the preset named in `config`.
pub async fn run_server(config: &SimulationConfig, biome: Option<BiomeConfig>) -> Result<(), String> {
    let scene = match biome {
        Some(biome) => Scene::with_biome(config, biome),
        None => Scene::new(config),
    };
    let mut scene = scene.map_err(|e| e.to_string())?;

    let (state, mut commands) = ServerState::new(
        protocol::frame_json(&scene.frame()),
        scene.id().to_string(),
        scene.biome().name.clone(),
    );
    let state = Arc::new(state);

    let addr: SocketAddr = format!("{}:{}", config.websocket_bind, config.websocket_port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    let server_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state, addr).await {
            tracing::error!("Server error: {}", e);
        }
    });

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let tick_interval = std::time::Duration::from_secs_f32(1.0 / config.tick_rate_hz);
    let clock = Instant::now();
    let mut last_elapsed = 0.0_f32;

    info!(
        session = %scene.id(),
        biome = %scene.biome().name,
        seed = scene.seed(),
        tick_rate_hz = config.tick_rate_hz,
        "Scene running"
    );

    loop {
        let tick_start = Instant::now();

        // Commands apply between frames, in arrival order.
        while let Ok(request) = commands.try_recv() {
            let result = scene.handle(request.command);
            if let Err(e) = &result {
                warn!(error = %e, "Command rejected");
            }
            let _ = request
                .reply
                .send(protocol::reply_json(&CommandReply::from_result(&result)));
        }

        let elapsed = clock.elapsed().as_secs_f32();
        scene.tick(Frame {
            elapsed,
            delta: elapsed - last_elapsed,
        });
        last_elapsed = elapsed;

        let active = scene
            .engine()
            .agents()
            .iter()
            .filter(|a| a.phase() == AgentPhase::Active)
            .count();
        state
            .on_tick(
                protocol::frame_json(&scene.frame()),
                scene.tick_count(),
                scene.mode(),
                active,
                tick_start.elapsed().as_secs_f32() * 1000.0,
            )
            .await;

        if scene.tick_count() % 3600 == 0 {
            info!(
                tick = scene.tick_count(),
                mode = ?scene.mode(),
                active,
                clients = state.client_count(),
                "Tick milestone"
            );
        }

        let spent = tick_start.elapsed();
        if spent < tick_interval {
            tokio::select! {
                _ = tokio::time::sleep(tick_interval - spent) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        } else {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = tokio::task::yield_now() => {}
            }
        }
    }

    info!(tick = scene.tick_count(), "Scene stopped");
    Ok(())
}

/// Headless runs over `runs` consecutive seeds, in parallel.
pub fn simulate(
    biome: &BiomeConfig,
    base_seed: u64,
    runs: u32,
    seconds: f32,
    dt: f32,
) -> Result<Vec<RunStatistics>, String> {
    biome.validate()?;
    if dt <= 0.0 || seconds < 0.0 {
        return Err(format!(
            "seconds must be >= 0 and dt > 0, got seconds={} dt={}",
            seconds, dt
        ));
    }
    let seeds: Vec<u64> = (0..runs as u64).map(|i| base_seed.wrapping_add(i)).collect();
    let results: Vec<RunStatistics> = seeds
        .par_iter()
        .map(|&seed| simulate_run(biome, seed, seconds, dt))
        .collect();

    let violations: u32 = results.iter().map(|r| r.containment_violations).sum();
    if violations > 0 {
        warn!(violations, "Active agents observed outside the despawn envelope");
    }
    info!(runs = results.len(), biome = %biome.name, "Simulation finished");
    Ok(results)
}

pub fn print_run_report(results: &[RunStatistics]) {
    println!(
        "{:>10} {:>8} {:>10} {:>10} {:>10} {:>9} {:>10}",
        "Seed", "Ticks", "Departed", "Respawned", "Active %", "Excurs.", "ms/tick"
    );
    println!("{}", "-".repeat(74));
    for r in results {
        println!(
            "{:>10} {:>8} {:>10} {:>10} {:>9.1}% {:>9.3} {:>10.4}",
            r.seed,
            r.ticks,
            r.total_departures(),
            r.total_respawns(),
            r.mean_active_fraction * 100.0,
            r.max_excursion,
            r.tick_duration_ms
        );
    }

    if let Some(first) = results.first() {
        println!();
        println!("--- Per species (seed {}) ---", first.seed);
        for (id, s) in &first.species {
            println!(
                "  {:<12} appeared {:>2}  departed {:>4}  respawned {:>4}  active ticks {:>8}",
                id, s.appearances, s.departures, s.respawns, s.active_ticks
            );
        }
    }
}

/// Play a challenge script non-interactively with the given option indices.
pub fn play_challenge(biome: &str, choices: &[usize]) -> Result<ChallengeOutcome, String> {
    let content = BiomeContent::preset(biome).ok_or_else(|| format!("Unknown biome '{}'", biome))?;
    let mut challenge = Challenge::new(content.challenge);
    challenge.start();

    for &choice in choices {
        let Some(step) = challenge.current_step() else {
            break;
        };
        println!("== {} ==", step.title);
        println!("{}", step.prompt);
        for (i, option) in step.options.iter().enumerate() {
            println!("  [{}] {}", i, option.label);
        }
        let result = challenge.choose(choice).map_err(|e| e.to_string())?;
        println!("> {}", result.flash.text);
        println!("  {} (level {})", result.explain, result.level);
        println!();
    }

    match challenge.outcome() {
        ChallengeOutcome::None => println!(
            "Challenge incomplete: step {}/{}, level {}",
            challenge.step_index() + 1,
            challenge.script().len(),
            challenge.level()
        ),
        ChallengeOutcome::Win => println!("Ecosystem restored! Final level {}", challenge.level()),
        ChallengeOutcome::Fail => println!("Pollution spread. Final level {}", challenge.level()),
    }
    Ok(challenge.outcome())
}

/// Apply named scenarios in order and print the resulting population state.
pub fn run_population(keys: &[String]) -> Result<Population, String> {
    let mut population = Population::new();
    for key in keys {
        let scenario = scenarios::find(key).ok_or_else(|| {
            let known: Vec<String> = scenarios::catalog().into_iter().map(|s| s.id).collect();
            format!("Unknown scenario '{}' (known: {})", key, known.join(", "))
        })?;
        if !population.can_apply() {
            println!("Population is extinct; skipping {}", scenario.name);
            continue;
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        let pct = population.apply(&scenario, now);
        println!("{:<22} {:>+4} -> {:>3}%", scenario.name, scenario.effect, pct);
    }

    let status = population.status();
    println!();
    println!(
        "Population: {}% ({:?} bar) | {}: {}",
        population.percentage(),
        population.bar(),
        status.label(),
        status.description()
    );
    Ok(population)
}

pub fn list_species(biome: &BiomeConfig) {
    let content = BiomeContent::preset(&biome.name);
    println!("=== Biome: {} ===", biome.name);
    println!(
        "Bounds: x ±{} z ±{} y [{}, {}] margin {}",
        biome.bounds.x, biome.bounds.z, biome.bounds.y_bottom, biome.bounds.y_top, biome.despawn_margin
    );
    println!();
    for s in &biome.species {
        println!("--- {} ({}) ---", s.label, s.id);
        println!("  Motion: {:?}  base y {:.2}  scale {:.2}", s.motion, s.base_y, s.scale);
        println!("  Speed: {:.2}..{:.2}  jitter {:.2}", s.min_speed, s.max_speed, s.turn_jitter);
        println!("  Bob: amp {:.3} freq {:.2}", s.bob_amp, s.bob_freq);
        match s.spawn_delay {
            Some(d) => println!("  Spawn delay: {:.1}s", d),
            None => println!("  Spawn delay: random"),
        }
        let entries: Vec<String> = s
            .entry_weights
            .iter()
            .map(|w| format!("{:?}={}", w.direction, w.weight))
            .collect();
        println!("  Entries: {}", entries.join(", "));
        if let Some(info) = content.as_ref().and_then(|c| c.info.get(&s.id)) {
            println!("  {} [{}, {:?}]", info.title, info.status, info.badge());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::biome::ocean;

    #[test]
    fn simulate_runs_each_seed() {
        let results = simulate(&ocean(), 100, 4, 10.0, 1.0 / 30.0).unwrap();
        let seeds: Vec<u64> = results.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
        assert!(results.iter().all(|r| r.containment_violations == 0));
    }

    #[test]
    fn simulate_rejects_bad_timestep() {
        assert!(simulate(&ocean(), 1, 1, 10.0, 0.0).is_err());
    }

    #[test]
    fn best_choices_win_ocean_challenge() {
        assert_eq!(play_challenge("ocean", &[0, 0, 0]).unwrap(), ChallengeOutcome::Win);
        assert_eq!(play_challenge("ocean", &[1, 1, 1]).unwrap(), ChallengeOutcome::Fail);
        assert_eq!(play_challenge("temperate", &[0]).unwrap(), ChallengeOutcome::None);
        assert!(play_challenge("ocean", &[7]).is_err());
        assert!(play_challenge("desert", &[0]).is_err());
    }

    #[test]
    fn population_command_applies_in_order() {
        let pop = run_population(&["poaching".to_string(), "Conservation Efforts".to_string()]).unwrap();
        assert_eq!(pop.percentage(), 100);
        assert_eq!(pop.history().count(), 2);
        assert!(run_population(&["meteor".to_string()]).is_err());
    }
}
