use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::biome::SpeciesConfig;
use crate::steering::motion::{integrate, Kinematics};
use crate::steering::spawn::{choose_direction, spawn_from_direction};
use crate::steering::{Arena, Frame};

/// Default window for agents without a configured spawn delay.
const DEFAULT_START_WINDOW: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    /// Not yet shown; waiting for its activation time.
    PendingStart,
    Active,
    /// Left the arena; frozen until its resume time.
    OffscreenWaiting,
}

/// Lifecycle transitions reported by [`Agent::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentEvent {
    Appeared,
    Respawned,
    Departed { resume_at: f32 },
}

/// One procedurally animated animal.
#[derive(Debug, Clone)]
pub struct Agent {
    species: SpeciesConfig,
    body: Kinematics,
    phase: AgentPhase,
    start_at: f32,
    resume_at: f32,
    rng: ChaCha8Rng,
}

/// Render-facing view of an agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub species: String,
    pub phase: AgentPhase,
    pub visible: bool,
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
    pub scale: f32,
}

impl Agent {
    pub fn new(species: SpeciesConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let start_at = species
            .spawn_delay
            .unwrap_or_else(|| rng.gen_range(0.0..DEFAULT_START_WINDOW));
        Agent {
            species,
            body: Kinematics {
                position: Vec3::ZERO,
                velocity: Vec3::X,
                orientation: Quat::IDENTITY,
            },
            phase: AgentPhase::PendingStart,
            start_at,
            resume_at: 0.0,
            rng,
        }
    }

    pub fn species_id(&self) -> &str {
        &self.species.id
    }

    pub fn species(&self) -> &SpeciesConfig {
        &self.species
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    pub fn orientation(&self) -> Quat {
        self.body.orientation
    }

    pub fn start_at(&self) -> f32 {
        self.start_at
    }

    /// Resume time of the current offscreen wait, if any.
    pub fn resume_at(&self) -> Option<f32> {
        (self.phase == AgentPhase::OffscreenWaiting).then_some(self.resume_at)
    }

    /// Advance the agent by one frame.
    pub fn tick(&mut self, frame: Frame, arena: &Arena) -> Option<AgentEvent> {
        let t = frame.elapsed;

        let mut event = None;
        match self.phase {
            AgentPhase::PendingStart => {
                if t < self.start_at {
                    return None;
                }
                self.enter(arena);
                event = Some(AgentEvent::Appeared);
            }
            AgentPhase::OffscreenWaiting => {
                if t < self.resume_at {
                    return None;
                }
                self.enter(arena);
                event = Some(AgentEvent::Respawned);
            }
            AgentPhase::Active => {}
        }

        integrate(&mut self.body, &self.species, &arena.bounds, t, frame.delta);

        if arena.is_outside(self.body.position, self.species.motion) {
            let (lo, hi) = self.species.motion.resume_delay();
            self.resume_at = t + self.rng.gen_range(lo..hi);
            self.phase = AgentPhase::OffscreenWaiting;
            return Some(AgentEvent::Departed {
                resume_at: self.resume_at,
            });
        }

        event
    }

    /// Pick an entry direction and place the agent at the scene edge.
    fn enter(&mut self, arena: &Arena) {
        let direction = choose_direction(&self.species.entry_weights, &mut self.rng);
        let spawn = spawn_from_direction(
            direction,
            self.species.base_y,
            &arena.bounds,
            arena.despawn_margin,
            self.species.motion.is_planar(),
            &mut self.rng,
        );
        let speed = if self.species.min_speed < self.species.max_speed {
            self.rng.gen_range(self.species.min_speed..self.species.max_speed)
        } else {
            self.species.min_speed
        };
        self.body.position = spawn.position;
        self.body.velocity = spawn.direction * speed;
        self.phase = AgentPhase::Active;
    }

    /// Species id if the agent can currently be picked.
    pub fn select(&self) -> Option<&str> {
        (self.phase == AgentPhase::Active).then_some(self.species.id.as_str())
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            species: self.species.id.clone(),
            phase: self.phase,
            visible: self.phase != AgentPhase::PendingStart,
            position: self.body.position,
            velocity: self.body.velocity,
            orientation: self.body.orientation,
            scale: self.species.scale,
        }
    }
}
