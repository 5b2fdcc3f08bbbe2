use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

pub const LEVEL_BASELINE: i32 = 0;
/// A finished run wins when the level is at or below this.
pub const WIN_THRESHOLD: i32 = -2;
/// Only drives the HUD band; a run never ends on it.
pub const FAIL_THRESHOLD: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeOption {
    pub label: String,
    /// Negative reduces pollution.
    pub impact: i32,
    pub explain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeStep {
    pub id: String,
    pub title: String,
    pub prompt: String,
    pub options: Vec<ChallengeOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeScript {
    steps: Vec<ChallengeStep>,
}

impl ChallengeScript {
    pub fn new(steps: Vec<ChallengeStep>) -> Self {
        ChallengeScript { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&ChallengeStep> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[ChallengeStep] {
        &self.steps
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeOutcome {
    #[default]
    None,
    Win,
    Fail,
}

impl ChallengeOutcome {
    pub fn is_terminal(self) -> bool {
        self != ChallengeOutcome::None
    }
}

/// Final classification of an accumulated level.
pub fn classify(level: i32) -> ChallengeOutcome {
    if level <= WIN_THRESHOLD {
        ChallengeOutcome::Win
    } else {
        ChallengeOutcome::Fail
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelBand {
    Clean,
    Moderate,
    Polluted,
}

pub fn level_band(level: i32) -> LevelBand {
    if level <= WIN_THRESHOLD {
        LevelBand::Clean
    } else if level >= FAIL_THRESHOLD {
        LevelBand::Polluted
    } else {
        LevelBand::Moderate
    }
}

/// Opacity of the murky water overlay in the ocean scene.
pub fn water_tint_alpha(level: i32) -> f32 {
    (level as f32 * 0.12).clamp(0.0, 0.45)
}

/// Opacity of the smog layer in the forest scene.
pub fn haze_alpha(level: i32) -> f32 {
    if level <= 0 {
        0.0
    } else {
        (level as f32 * 0.1).min(0.35)
    }
}

pub fn pollution_particle_count(level: i32) -> u32 {
    20_i64
        .saturating_add(i64::from(level) * 20)
        .clamp(10, 120) as u32
}

/// Short-lived feedback shown after each choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactFlash {
    pub text: String,
    pub good: bool,
}

impl ImpactFlash {
    pub fn for_option(option: &ChallengeOption) -> Self {
        let verdict = if option.impact <= 0 {
            "Good action: "
        } else {
            "Harmful action: "
        };
        let delta = if option.impact < 0 {
            format!(" (-{})", option.impact.unsigned_abs())
        } else {
            format!(" (+{})", option.impact)
        };
        ImpactFlash {
            text: format!("{verdict}{}{delta}", option.label),
            good: option.impact < 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeError {
    Inactive,
    Finished,
    UnknownOption(usize),
}

impl fmt::Display for ChallengeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengeError::Inactive => write!(f, "challenge mode is not active"),
            ChallengeError::Finished => write!(f, "challenge already finished; reset to play again"),
            ChallengeError::UnknownOption(i) => write!(f, "no option {} on this step", i),
        }
    }
}

impl std::error::Error for ChallengeError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceResult {
    pub flash: ImpactFlash,
    pub explain: String,
    pub level: i32,
    pub outcome: ChallengeOutcome,
}

/// Linear scripted decision sequence.
#[derive(Debug, Clone)]
pub struct Challenge {
    script: ChallengeScript,
    active: bool,
    step: usize,
    level: i32,
    outcome: ChallengeOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeSnapshot {
    pub active: bool,
    pub step: usize,
    pub steps: usize,
    pub level: i32,
    pub band: LevelBand,
    pub outcome: ChallengeOutcome,
    pub current: Option<ChallengeStep>,
}

impl Challenge {
    pub fn new(script: ChallengeScript) -> Self {
        Challenge {
            script,
            active: false,
            step: 0,
            level: LEVEL_BASELINE,
            outcome: ChallengeOutcome::None,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
        self.step = 0;
        self.level = LEVEL_BASELINE;
        self.outcome = ChallengeOutcome::None;
    }

    pub fn reset(&mut self) {
        self.start();
    }

    /// Leave challenge mode. Nothing is recorded for an unfinished run.
    pub fn exit(&mut self) {
        self.active = false;
        self.outcome = ChallengeOutcome::None;
    }

    pub fn choose(&mut self, option_index: usize) -> Result<ChoiceResult, ChallengeError> {
        if !self.active {
            return Err(ChallengeError::Inactive);
        }
        if self.outcome.is_terminal() {
            return Err(ChallengeError::Finished);
        }
        let step = self
            .script
            .step(self.step)
            .ok_or(ChallengeError::Finished)?;
        let option = step
            .options
            .get(option_index)
            .ok_or(ChallengeError::UnknownOption(option_index))?;

        self.level += option.impact;
        let flash = ImpactFlash::for_option(option);
        let explain = option.explain.clone();

        if self.step + 1 >= self.script.len() {
            self.outcome = classify(self.level);
            info!(level = self.level, outcome = ?self.outcome, "Challenge finished");
        } else {
            self.step += 1;
        }

        Ok(ChoiceResult {
            flash,
            explain,
            level: self.level,
            outcome: self.outcome,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn outcome(&self) -> ChallengeOutcome {
        self.outcome
    }

    pub fn script(&self) -> &ChallengeScript {
        &self.script
    }

    /// The step awaiting a choice, if any.
    pub fn current_step(&self) -> Option<&ChallengeStep> {
        if !self.active || self.outcome.is_terminal() {
            return None;
        }
        self.script.step(self.step)
    }

    pub fn snapshot(&self) -> ChallengeSnapshot {
        ChallengeSnapshot {
            active: self.active,
            step: self.step,
            steps: self.script.len(),
            level: self.level,
            band: level_band(self.level),
            outcome: self.outcome,
            current: self.current_step().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(impacts: &[[i32; 2]]) -> ChallengeScript {
        ChallengeScript::new(
            impacts
                .iter()
                .enumerate()
                .map(|(i, pair)| ChallengeStep {
                    id: format!("s{i}"),
                    title: format!("Step {i}"),
                    prompt: String::new(),
                    options: pair
                        .iter()
                        .map(|&impact| ChallengeOption {
                            label: format!("impact {impact}"),
                            impact,
                            explain: String::new(),
                        })
                        .collect(),
                })
                .collect(),
        )
    }

    #[test]
    fn cumulative_minus_three_wins() {
        let mut c = Challenge::new(script(&[[-1, 1], [-1, 1], [-1, 1]]));
        c.start();
        assert_eq!(c.choose(0).unwrap().outcome, ChallengeOutcome::None);
        assert_eq!(c.choose(0).unwrap().outcome, ChallengeOutcome::None);
        let last = c.choose(0).unwrap();
        assert_eq!(last.level, -3);
        assert_eq!(last.outcome, ChallengeOutcome::Win);
    }

    #[test]
    fn cumulative_plus_four_fails() {
        let mut c = Challenge::new(script(&[[-2, 1], [-1, 1], [-2, 2]]));
        c.start();
        c.choose(1).unwrap();
        c.choose(1).unwrap();
        let last = c.choose(1).unwrap();
        assert_eq!(last.level, 4);
        assert_eq!(last.outcome, ChallengeOutcome::Fail);
    }

    #[test]
    fn between_thresholds_still_fails() {
        let mut c = Challenge::new(script(&[[-1, 1], [-1, 1], [-1, 1]]));
        c.start();
        c.choose(0).unwrap();
        c.choose(1).unwrap();
        assert_eq!(c.choose(1).unwrap().outcome, ChallengeOutcome::Fail);
        assert_eq!(c.level(), 1);
    }

    #[test]
    fn choose_after_finish_rejected_without_change() {
        let mut c = Challenge::new(script(&[[-2, 1]]));
        c.start();
        c.choose(0).unwrap();
        assert_eq!(c.choose(0), Err(ChallengeError::Finished));
        assert_eq!(c.level(), -2);
        assert_eq!(c.step_index(), 0);
        assert_eq!(c.outcome(), ChallengeOutcome::Win);
    }

    #[test]
    fn rejects_when_inactive_or_bad_option() {
        let mut c = Challenge::new(script(&[[-2, 1], [-1, 1]]));
        assert_eq!(c.choose(0), Err(ChallengeError::Inactive));
        c.start();
        assert_eq!(c.choose(5), Err(ChallengeError::UnknownOption(5)));
        assert_eq!(c.step_index(), 0);
        assert_eq!(c.level(), 0);
    }

    #[test]
    fn reset_and_exit() {
        let mut c = Challenge::new(script(&[[-2, 1], [-1, 1]]));
        c.start();
        c.choose(1).unwrap();
        c.reset();
        assert_eq!((c.step_index(), c.level(), c.outcome()), (0, 0, ChallengeOutcome::None));
        c.exit();
        assert!(!c.is_active());
        assert!(c.current_step().is_none());
    }

    #[test]
    fn flash_text_and_sign() {
        let good = ChallengeOption {
            label: "Deploy booms & skimmers".into(),
            impact: -2,
            explain: String::new(),
        };
        let flash = ImpactFlash::for_option(&good);
        assert_eq!(flash.text, "Good action: Deploy booms & skimmers (-2)");
        assert!(flash.good);

        let bad = ChallengeOption {
            label: "Issue advisory only".into(),
            impact: 2,
            explain: String::new(),
        };
        let flash = ImpactFlash::for_option(&bad);
        assert_eq!(flash.text, "Harmful action: Issue advisory only (+2)");
        assert!(!flash.good);
    }

    #[test]
    fn display_bands_saturate() {
        assert_eq!(level_band(-5), LevelBand::Clean);
        assert_eq!(level_band(0), LevelBand::Moderate);
        assert_eq!(level_band(3), LevelBand::Polluted);
        assert_eq!(water_tint_alpha(-10), 0.0);
        assert_eq!(water_tint_alpha(100), 0.45);
        assert_eq!(haze_alpha(0), 0.0);
        assert_eq!(haze_alpha(50), 0.35);
        assert_eq!(pollution_particle_count(i32::MIN), 10);
        assert_eq!(pollution_particle_count(0), 20);
        assert_eq!(pollution_particle_count(i32::MAX), 120);
    }
}
