pub mod challenge;
pub mod minigame;
pub mod population;
pub mod quiz;
pub mod timer;

pub use challenge::{Challenge, ChallengeError, ChallengeOutcome};
pub use minigame::MiniGame;
pub use population::Population;
pub use quiz::QuizGate;
pub use timer::{Timer, Toast};
