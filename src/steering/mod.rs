pub mod agent;
pub mod motion;
pub mod spawn;

use glam::Vec3;
use tracing::debug;

use crate::config::biome::{BiomeConfig, WorldBounds};
use agent::{Agent, AgentEvent, AgentSnapshot};
use motion::MotionClass;

/// One clock reading from the frame driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Seconds since the scene was mounted.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

/// World extents plus the despawn margin agents may overshoot before leaving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub bounds: WorldBounds,
    pub despawn_margin: f32,
}

impl Arena {
    pub fn from_config(config: &BiomeConfig) -> Self {
        Arena {
            bounds: config.bounds,
            despawn_margin: config.despawn_margin,
        }
    }

    pub fn limit_x(&self) -> f32 {
        self.bounds.x + self.despawn_margin
    }

    pub fn limit_z(&self) -> f32 {
        self.bounds.z + self.despawn_margin
    }

    /// True once `position` is past the despawn envelope for a mover of `class`.
    pub fn is_outside(&self, position: Vec3, class: MotionClass) -> bool {
        if position.x.abs() > self.limit_x() || position.z.abs() > self.limit_z() {
            return true;
        }
        match class.vertical_slack() {
            Some(slack) => {
                position.y > self.bounds.y_top + slack || position.y < self.bounds.y_bottom - slack
            }
            None => false,
        }
    }
}

/// Derive a per-agent RNG seed so agents never share random state.
pub fn agent_seed(scene_seed: u64, index: usize) -> u64 {
    scene_seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(index as u64)
        .wrapping_mul(1442695040888963407)
}

/// All wandering agents of one scene. Each agent owns its own state and RNG;
/// the engine only fans the frame out and forwards picks.
#[derive(Debug, Clone)]
pub struct SteeringEngine {
    arena: Arena,
    agents: Vec<Agent>,
}

impl SteeringEngine {
    pub fn new(config: &BiomeConfig, seed: u64) -> Self {
        let agents = config
            .species
            .iter()
            .enumerate()
            .map(|(i, species)| Agent::new(species.clone(), agent_seed(seed, i)))
            .collect();
        SteeringEngine {
            arena: Arena::from_config(config),
            agents,
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Advance every agent by one frame and return the lifecycle events, tagged by agent index.
    pub fn tick(&mut self, frame: Frame) -> Vec<(usize, AgentEvent)> {
        let arena = self.arena;
        let mut events = Vec::new();
        for (i, agent) in self.agents.iter_mut().enumerate() {
            if let Some(event) = agent.tick(frame, &arena) {
                match event {
                    AgentEvent::Departed { resume_at } => {
                        debug!(agent = i, species = agent.species_id(), resume_at, "Agent left arena");
                    }
                    AgentEvent::Respawned | AgentEvent::Appeared => {
                        debug!(agent = i, species = agent.species_id(), ?event, "Agent entered arena");
                    }
                }
                events.push((i, event));
            }
        }
        events
    }

    /// Species id of the agent at `index` if it is active and can be picked.
    pub fn select(&self, index: usize) -> Option<&str> {
        self.agents.get(index).and_then(Agent::select)
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(Agent::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::biome::{ocean, temperate};

    #[test]
    fn engine_creates_one_agent_per_species() {
        let engine = SteeringEngine::new(&ocean(), 1);
        let ids: Vec<&str> = engine.agents().iter().map(|a| a.species_id()).collect();
        assert_eq!(ids, vec!["turtle", "shark", "clownfish", "manta"]);
    }

    #[test]
    fn agent_seeds_differ_per_index() {
        assert_ne!(agent_seed(5, 0), agent_seed(5, 1));
        assert_ne!(agent_seed(5, 0), agent_seed(6, 0));
    }

    #[test]
    fn walkers_ignore_vertical_extent() {
        let arena = Arena::from_config(&temperate());
        let underground = Vec3::new(0.0, -50.0, 0.0);
        assert!(!arena.is_outside(underground, MotionClass::Walk));
        assert!(arena.is_outside(underground, MotionClass::Glide));
    }

    #[test]
    fn swimmer_vertical_slack_applied() {
        let arena = Arena::from_config(&ocean());
        assert!(!arena.is_outside(Vec3::new(0.0, 13.9, 0.0), MotionClass::Swim));
        assert!(arena.is_outside(Vec3::new(0.0, 14.1, 0.0), MotionClass::Swim));
        assert!(arena.is_outside(Vec3::new(54.1, 0.0, 0.0), MotionClass::Swim));
        assert!(!arena.is_outside(Vec3::new(54.0, 0.0, 0.0), MotionClass::Swim));
    }

    #[test]
    fn select_only_active_agents() {
        let mut engine = SteeringEngine::new(&ocean(), 3);
        assert_eq!(engine.select(0), None);
        engine.tick(Frame { elapsed: 0.1, delta: 0.1 });
        // Turtle has no spawn delay, shark waits four seconds.
        assert_eq!(engine.select(0), Some("turtle"));
        assert_eq!(engine.select(1), None);
        assert_eq!(engine.select(99), None);
    }

    #[test]
    fn tick_reports_appearances() {
        let mut engine = SteeringEngine::new(&ocean(), 3);
        let events = engine.tick(Frame { elapsed: 12.0, delta: 1.0 / 60.0 });
        let appeared = events
            .iter()
            .filter(|(_, e)| *e == AgentEvent::Appeared)
            .count();
        assert_eq!(appeared, 4);
        assert!(engine.snapshots().iter().all(|s| s.visible));
    }
}
