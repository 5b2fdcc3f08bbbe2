use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::biome::BiomeConfig;
use crate::steering::agent::{AgentEvent, AgentPhase};
use crate::steering::{Frame, SteeringEngine};

/// Lifecycle counts for one species over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeciesStatistics {
    pub appearances: u32,
    pub respawns: u32,
    pub departures: u32,
    /// Ticks spent in the active phase.
    pub active_ticks: u64,
}

/// Aggregate metrics for one headless run of the steering engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatistics {
    pub seed: u64,
    pub biome: String,
    pub ticks: u64,
    pub simulated_seconds: f32,
    pub species: BTreeMap<String, SpeciesStatistics>,
    /// Mean share of agents that were active per tick, 0..1.
    pub mean_active_fraction: f32,
    /// Largest horizontal distance reached by an active agent, as a
    /// fraction of the despawn limit.
    pub max_excursion: f32,
    /// Active agents found past the despawn envelope after a tick. Always 0 for a sound engine.
    pub containment_violations: u32,
    pub tick_duration_ms: f32,
}

impl RunStatistics {
    pub fn total_departures(&self) -> u32 {
        self.species.values().map(|s| s.departures).sum()
    }

    pub fn total_respawns(&self) -> u32 {
        self.species.values().map(|s| s.respawns).sum()
    }
}

/// Accumulates per-tick observations of an engine.
#[derive(Debug, Clone)]
pub struct RunRecorder {
    seed: u64,
    biome: String,
    ticks: u64,
    last_elapsed: f32,
    species: BTreeMap<String, SpeciesStatistics>,
    active_fraction_sum: f64,
    max_excursion: f32,
    containment_violations: u32,
}

impl RunRecorder {
    pub fn new(biome: &BiomeConfig, seed: u64) -> Self {
        RunRecorder {
            seed,
            biome: biome.name.clone(),
            ticks: 0,
            last_elapsed: 0.0,
            species: biome
                .species
                .iter()
                .map(|s| (s.id.clone(), SpeciesStatistics::default()))
                .collect(),
            active_fraction_sum: 0.0,
            max_excursion: 0.0,
            containment_violations: 0,
        }
    }

    pub fn record(&mut self, engine: &SteeringEngine, frame: Frame, events: &[(usize, AgentEvent)]) {
        self.ticks += 1;
        self.last_elapsed = frame.elapsed;
        let agents = engine.agents();

        for (index, event) in events {
            let Some(agent) = agents.get(*index) else {
                continue;
            };
            let entry = self.species.entry(agent.species_id().to_string()).or_default();
            match event {
                AgentEvent::Appeared => entry.appearances += 1,
                AgentEvent::Respawned => entry.respawns += 1,
                AgentEvent::Departed { .. } => entry.departures += 1,
            }
        }

        let arena = engine.arena();
        let mut active = 0usize;
        for agent in agents.iter().filter(|a| a.phase() == AgentPhase::Active) {
            active += 1;
            if let Some(entry) = self.species.get_mut(agent.species_id()) {
                entry.active_ticks += 1;
            }
            let p = agent.position();
            let excursion = (p.x.abs() / arena.limit_x()).max(p.z.abs() / arena.limit_z());
            self.max_excursion = self.max_excursion.max(excursion);
            if arena.is_outside(p, agent.species().motion) {
                self.containment_violations += 1;
            }
        }
        if !agents.is_empty() {
            self.active_fraction_sum += active as f64 / agents.len() as f64;
        }
    }

    pub fn finish(self, tick_duration_ms: f32) -> RunStatistics {
        let mean_active_fraction = if self.ticks == 0 {
            0.0
        } else {
            (self.active_fraction_sum / self.ticks as f64) as f32
        };
        RunStatistics {
            seed: self.seed,
            biome: self.biome,
            ticks: self.ticks,
            simulated_seconds: self.last_elapsed,
            species: self.species,
            mean_active_fraction,
            max_excursion: self.max_excursion,
            containment_violations: self.containment_violations,
            tick_duration_ms,
        }
    }
}

/// Run the steering engine alone for `seconds` at a fixed `dt`.
pub fn simulate_run(biome: &BiomeConfig, seed: u64, seconds: f32, dt: f32) -> RunStatistics {
    let start = std::time::Instant::now();
    let mut engine = SteeringEngine::new(biome, seed);
    let mut recorder = RunRecorder::new(biome, seed);
    let steps = if dt > 0.0 { (seconds / dt).round() as u64 } else { 0 };

    for i in 1..=steps {
        let frame = Frame {
            elapsed: i as f32 * dt,
            delta: dt,
        };
        let events = engine.tick(frame);
        recorder.record(&engine, frame, &events);
    }

    let per_tick_ms = if steps == 0 {
        0.0
    } else {
        start.elapsed().as_secs_f32() * 1000.0 / steps as f32
    };
    recorder.finish(per_tick_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::biome::{ocean, temperate};

    #[test]
    fn run_keeps_agents_contained() {
        for biome in [ocean(), temperate()] {
            let stats = simulate_run(&biome, 11, 120.0, 1.0 / 30.0);
            assert_eq!(stats.containment_violations, 0, "{}", biome.name);
            assert!(stats.max_excursion <= 1.0);
            assert_eq!(stats.ticks, 3600);
        }
    }

    #[test]
    fn every_species_appears_once() {
        let biome = ocean();
        let stats = simulate_run(&biome, 3, 20.0, 1.0 / 30.0);
        for s in &biome.species {
            assert_eq!(stats.species[&s.id].appearances, 1, "{}", s.id);
        }
        assert!(stats.mean_active_fraction > 0.0);
    }

    #[test]
    fn respawns_never_exceed_departures() {
        let stats = simulate_run(&temperate(), 5, 300.0, 1.0 / 20.0);
        for (id, s) in &stats.species {
            assert!(s.respawns <= s.departures, "{}", id);
        }
    }

    #[test]
    fn same_seed_same_statistics() {
        let a = simulate_run(&ocean(), 42, 60.0, 1.0 / 30.0);
        let b = simulate_run(&ocean(), 42, 60.0, 1.0 / 30.0);
        assert_eq!(a.species, b.species);
        assert_eq!(a.max_excursion, b.max_excursion);
    }

    #[test]
    fn zero_length_run() {
        let stats = simulate_run(&ocean(), 1, 0.0, 1.0 / 60.0);
        assert_eq!(stats.ticks, 0);
        assert_eq!(stats.mean_active_fraction, 0.0);
    }
}
