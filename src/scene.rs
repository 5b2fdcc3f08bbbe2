//! One immersive biome: wandering agents plus the discovery and challenge games layered on top.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::biome::BiomeConfig;
use crate::config::simulation::SimulationConfig;
use crate::game::challenge::{self, ChallengeError, ChallengeSnapshot, ChoiceResult, ImpactFlash, LevelBand};
use crate::game::minigame::{MiniGame, MiniGameSnapshot, Report};
use crate::game::quiz::QuizAnswer;
use crate::game::timer::{Toast, ToastSnapshot};
use crate::game::Challenge;
use crate::steering::agent::{AgentEvent, AgentSnapshot};
use crate::steering::{Frame, SteeringEngine};
use crate::world::content::BiomeContent;
use crate::world::species::{SpeciesInfo, StatusBadge};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    UnknownBiome(String),
    Config(String),
    Challenge(ChallengeError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::UnknownBiome(name) => write!(
                f,
                "unknown biome '{}' (expected one of: {})",
                name,
                BiomeConfig::preset_names().join(", ")
            ),
            SceneError::Config(msg) => write!(f, "invalid configuration:\n{}", msg),
            SceneError::Challenge(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SceneError {}

impl From<ChallengeError> for SceneError {
    fn from(e: ChallengeError) -> Self {
        SceneError::Challenge(e)
    }
}

/// Input from the UI boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneCommand {
    /// The user clicked the agent at this index.
    Select { agent: usize },
    /// A species was discovered by some other means.
    Discover { species: String },
    StartGame,
    ResetGame,
    StopGame,
    AnswerQuiz { option: String },
    DismissQuiz,
    DismissInfo,
    StartChallenge,
    ResetChallenge,
    ExitChallenge,
    Choose { option: usize },
}

/// Result of one command, returned to whoever sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    None,
    Discovered { species: String, quiz_opened: bool, completed: bool },
    Quiz { result: QuizAnswer, score: u32 },
    Choice(ChoiceResult),
}

/// Facts card with its badge resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoCard {
    pub species: String,
    #[serde(flatten)]
    pub info: SpeciesInfo,
    pub badge: StatusBadge,
}

/// Overlay values derived from the challenge level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChallengeHud {
    pub band: LevelBand,
    pub water_tint: f32,
    pub haze: f32,
    pub particles: u32,
}

impl ChallengeHud {
    pub fn for_level(level: i32) -> Self {
        ChallengeHud {
            band: challenge::level_band(level),
            water_tint: challenge::water_tint_alpha(level),
            haze: challenge::haze_alpha(level),
            particles: challenge::pollution_particle_count(level),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    Explore,
    MiniGame,
    Challenge,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct SceneFrame {
    pub message_type: &'static str,
    pub session: Uuid,
    pub biome: String,
    pub tick: u64,
    pub elapsed: f32,
    pub mode: SceneMode,
    pub agents: Vec<AgentSnapshot>,
    pub minigame: MiniGameSnapshot,
    pub challenge: ChallengeSnapshot,
    pub hud: ChallengeHud,
    pub info_card: Option<ToastSnapshot<InfoCard>>,
    pub flash: Option<ToastSnapshot<ImpactFlash>>,
}

/// Knobs that are not part of the biome tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneOptions {
    /// 0 draws a random seed.
    pub seed: u64,
    pub info_toast_seconds: f64,
    pub impact_flash_seconds: f64,
}

impl Default for SceneOptions {
    fn default() -> Self {
        SceneOptions {
            seed: 0,
            info_toast_seconds: 6.0,
            impact_flash_seconds: 0.9,
        }
    }
}

impl From<&SimulationConfig> for SceneOptions {
    fn from(config: &SimulationConfig) -> Self {
        SceneOptions {
            seed: config.seed,
            info_toast_seconds: config.info_toast_seconds as f64,
            impact_flash_seconds: config.impact_flash_seconds as f64,
        }
    }
}

pub struct Scene {
    id: Uuid,
    biome: BiomeConfig,
    content: BiomeContent,
    seed: u64,
    engine: SteeringEngine,
    minigame: MiniGame,
    challenge: Challenge,
    info_card: Toast<InfoCard>,
    flash: Toast<ImpactFlash>,
    tick: u64,
    elapsed: f32,
}

impl Scene {
    /// Build the preset biome named in `config`.
    pub fn new(config: &SimulationConfig) -> Result<Self, SceneError> {
        config.validate().map_err(SceneError::Config)?;
        let biome = BiomeConfig::preset(&config.biome)
            .ok_or_else(|| SceneError::UnknownBiome(config.biome.clone()))?;
        let content = BiomeContent::preset(&config.biome)
            .ok_or_else(|| SceneError::UnknownBiome(config.biome.clone()))?;
        Self::from_parts(biome, content, SceneOptions::from(config))
    }

    /// Build a scene around an explicit biome table. Content falls back to
    /// the preset of the same name, or to none.
    pub fn with_biome(config: &SimulationConfig, biome: BiomeConfig) -> Result<Self, SceneError> {
        config.validate().map_err(SceneError::Config)?;
        let content = BiomeContent::preset(&biome.name).unwrap_or_default();
        Self::from_parts(biome, content, SceneOptions::from(config))
    }

    pub fn from_parts(
        biome: BiomeConfig,
        content: BiomeContent,
        options: SceneOptions,
    ) -> Result<Self, SceneError> {
        biome.validate().map_err(SceneError::Config)?;
        let seed = if options.seed == 0 {
            rand::random::<u64>()
        } else {
            options.seed
        };
        let targets = biome
            .species
            .iter()
            .map(|s| (s.id.clone(), s.label.clone()));
        let minigame = MiniGame::new(targets, content.quiz.clone());
        let challenge = Challenge::new(content.challenge.clone());
        let engine = SteeringEngine::new(&biome, seed);

        let id = Uuid::new_v4();
        info!(session = %id, biome = %biome.name, seed, agents = engine.agents().len(), "Scene created");

        Ok(Scene {
            id,
            biome,
            content,
            seed,
            engine,
            minigame,
            challenge,
            info_card: Toast::new(options.info_toast_seconds),
            flash: Toast::new(options.impact_flash_seconds),
            tick: 0,
            elapsed: 0.0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn biome(&self) -> &BiomeConfig {
        &self.biome
    }

    pub fn engine(&self) -> &SteeringEngine {
        &self.engine
    }

    pub fn minigame(&self) -> &MiniGame {
        &self.minigame
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn info_card(&self) -> Option<&InfoCard> {
        self.info_card.current()
    }

    pub fn flash(&self) -> Option<&ImpactFlash> {
        self.flash.current()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn mode(&self) -> SceneMode {
        if self.challenge.is_active() {
            SceneMode::Challenge
        } else if self.minigame.is_active() {
            SceneMode::MiniGame
        } else {
            SceneMode::Explore
        }
    }

    fn now(&self) -> f64 {
        self.elapsed as f64
    }

    /// Advance agents and expire toasts.
    pub fn tick(&mut self, frame: Frame) -> Vec<(usize, AgentEvent)> {
        self.elapsed = frame.elapsed;
        self.tick += 1;
        let events = self.engine.tick(frame);
        let now = self.now();
        if self.info_card.poll(now) {
            debug!(tick = self.tick, "Info card expired");
        }
        self.flash.poll(now);
        events
    }

    pub fn handle(&mut self, command: SceneCommand) -> Result<Feedback, SceneError> {
        let now = self.now();
        let feedback = match command {
            SceneCommand::Select { agent } => match self.engine.select(agent) {
                Some(species) => {
                    let species = species.to_string();
                    self.discover(&species)
                }
                None => Feedback::None,
            },
            SceneCommand::Discover { species } => self.discover(&species),
            SceneCommand::StartGame => {
                self.leave_challenge();
                self.minigame.start(now);
                info!(session = %self.id, targets = self.minigame.total(), "Mini-game started");
                Feedback::None
            }
            SceneCommand::ResetGame => {
                self.leave_challenge();
                self.minigame.reset(now);
                debug!(session = %self.id, "Mini-game reset");
                Feedback::None
            }
            SceneCommand::StopGame => {
                self.minigame.stop();
                Feedback::None
            }
            SceneCommand::AnswerQuiz { option } => match self.minigame.answer(&option) {
                Some(result) => Feedback::Quiz {
                    result,
                    score: self.minigame.score(),
                },
                None => Feedback::None,
            },
            SceneCommand::DismissQuiz => {
                self.minigame.dismiss_quiz();
                Feedback::None
            }
            SceneCommand::DismissInfo => {
                self.info_card.dismiss();
                Feedback::None
            }
            SceneCommand::StartChallenge | SceneCommand::ResetChallenge => {
                self.minigame.stop();
                self.flash.dismiss();
                self.challenge.start();
                info!(session = %self.id, steps = self.challenge.script().len(), "Challenge started");
                Feedback::None
            }
            SceneCommand::ExitChallenge => {
                self.leave_challenge();
                Feedback::None
            }
            SceneCommand::Choose { option } => {
                let result = self.challenge.choose(option)?;
                self.flash.show(result.flash.clone(), now);
                Feedback::Choice(result)
            }
        };
        Ok(feedback)
    }

    fn leave_challenge(&mut self) {
        if self.challenge.is_active() {
            self.challenge.exit();
            self.flash.dismiss();
        }
    }

    /// Open the facts card if there is one, then let the mini-game count the find.
    fn discover(&mut self, species: &str) -> Feedback {
        let now = self.now();
        if let Some(info) = self.content.info.get(species) {
            self.info_card.show(
                InfoCard {
                    species: species.to_string(),
                    info: info.clone(),
                    badge: info.badge(),
                },
                now,
            );
        }
        match self.minigame.report(species, now) {
            Report::Found {
                quiz_opened,
                completed,
            } => Feedback::Discovered {
                species: species.to_string(),
                quiz_opened,
                completed,
            },
            Report::Inactive | Report::Unknown | Report::AlreadyFound => Feedback::None,
        }
    }

    pub fn frame(&self) -> SceneFrame {
        let now = self.now();
        SceneFrame {
            message_type: "SceneFrame",
            session: self.id,
            biome: self.biome.name.clone(),
            tick: self.tick,
            elapsed: self.elapsed,
            mode: self.mode(),
            agents: self.engine.snapshots(),
            minigame: self.minigame.snapshot(now),
            challenge: self.challenge.snapshot(),
            hud: ChallengeHud::for_level(self.challenge.level()),
            info_card: self.info_card.snapshot(),
            flash: self.flash.snapshot(),
        }
    }
}
