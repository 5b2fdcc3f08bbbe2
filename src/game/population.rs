use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const BASELINE: i32 = 100;

/// A named pressure with a fixed signed effect on population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub effect: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub scenario: String,
    pub effect: i32,
    pub at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationStatus {
    Extinct,
    Critical,
    Endangered,
    Vulnerable,
    Stable,
}

impl PopulationStatus {
    pub fn from_percentage(percentage: i32) -> Self {
        match percentage {
            p if p <= 0 => PopulationStatus::Extinct,
            p if p < 20 => PopulationStatus::Critical,
            p if p < 40 => PopulationStatus::Endangered,
            p if p < 70 => PopulationStatus::Vulnerable,
            _ => PopulationStatus::Stable,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PopulationStatus::Extinct => "Extinct",
            PopulationStatus::Critical => "Critical",
            PopulationStatus::Endangered => "Endangered",
            PopulationStatus::Vulnerable => "Vulnerable",
            PopulationStatus::Stable => "Stable",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PopulationStatus::Extinct => "The population has been wiped out.",
            PopulationStatus::Critical => "Immediate intervention is needed to prevent extinction.",
            PopulationStatus::Endangered => "The population is at serious risk.",
            PopulationStatus::Vulnerable => "The population faces ongoing pressure.",
            PopulationStatus::Stable => "The population is healthy.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBar {
    Green,
    Yellow,
    Orange,
    Red,
}

impl HealthBar {
    pub fn from_percentage(percentage: i32) -> Self {
        match percentage {
            p if p > 70 => HealthBar::Green,
            p if p > 40 => HealthBar::Yellow,
            p if p > 20 => HealthBar::Orange,
            _ => HealthBar::Red,
        }
    }
}

/// Percentage of a species' healthy population, adjusted by scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    percentage: i32,
    history: VecDeque<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulationSnapshot {
    pub percentage: i32,
    pub status: PopulationStatus,
    pub bar: HealthBar,
    pub can_apply: bool,
    pub history: Vec<HistoryEntry>,
}

impl Default for Population {
    fn default() -> Self {
        Population {
            percentage: BASELINE,
            history: VecDeque::new(),
        }
    }
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `scenario` at time `now`, returning the clamped percentage.
    pub fn apply(&mut self, scenario: &Scenario, now: f64) -> i32 {
        self.percentage = self.percentage.saturating_add(scenario.effect).clamp(0, 100);
        self.history.push_front(HistoryEntry {
            scenario: scenario.name.clone(),
            effect: scenario.effect,
            at: now,
        });
        self.percentage
    }

    pub fn reset(&mut self) {
        self.percentage = BASELINE;
        self.history.clear();
    }

    pub fn percentage(&self) -> i32 {
        self.percentage
    }

    /// Newest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn status(&self) -> PopulationStatus {
        PopulationStatus::from_percentage(self.percentage)
    }

    pub fn bar(&self) -> HealthBar {
        HealthBar::from_percentage(self.percentage)
    }

    /// Presentation policy: nothing left to pressure once extinct.
    pub fn can_apply(&self) -> bool {
        self.percentage > 0
    }

    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            percentage: self.percentage,
            status: self.status(),
            bar: self.bar(),
            can_apply: self.can_apply(),
            history: self.history.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::scenarios;

    #[test]
    fn poaching_then_conservation() {
        let mut pop = Population::new();
        let poaching = scenarios::find("poaching").unwrap();
        let conservation = scenarios::find("conservation").unwrap();
        assert_eq!(pop.apply(&poaching, 1.0), 85);
        assert_eq!(pop.apply(&conservation, 2.0), 100);

        let history: Vec<_> = pop.history().collect();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].scenario, "Conservation Efforts");
        assert_eq!(history[0].effect, 25);
        assert_eq!(history[0].at, 2.0);
        assert_eq!(history[1].scenario, "Poaching");
        assert_eq!(history[1].effect, -15);
    }

    #[test]
    fn stays_within_range_and_reset_restores() {
        let mut pop = Population::new();
        let catalog = scenarios::catalog();
        for (i, s) in catalog.iter().cycle().take(40).enumerate() {
            let p = pop.apply(s, i as f64);
            assert!((0..=100).contains(&p));
        }
        let disease = scenarios::find("disease").unwrap();
        for _ in 0..6 {
            pop.apply(&disease, 0.0);
        }
        assert_eq!(pop.percentage(), 0);
        assert!(!pop.can_apply());

        pop.reset();
        assert_eq!(pop.percentage(), 100);
        assert_eq!(pop.history().count(), 0);
    }

    #[test]
    fn extreme_effects_saturate() {
        let mut pop = Population::new();
        let meteor = Scenario {
            id: "x".into(),
            name: "X".into(),
            description: String::new(),
            effect: i32::MIN,
        };
        assert_eq!(pop.apply(&meteor, 0.0), 0);
    }

    #[test]
    fn status_and_bar_bands() {
        use PopulationStatus::*;
        let cases = [(0, Extinct), (-5, Extinct), (19, Critical), (20, Endangered), (39, Endangered), (40, Vulnerable), (69, Vulnerable), (70, Stable), (100, Stable)];
        for (p, expected) in cases {
            assert_eq!(PopulationStatus::from_percentage(p), expected, "{p}");
        }
        assert_eq!(HealthBar::from_percentage(71), HealthBar::Green);
        assert_eq!(HealthBar::from_percentage(70), HealthBar::Yellow);
        assert_eq!(HealthBar::from_percentage(41), HealthBar::Yellow);
        assert_eq!(HealthBar::from_percentage(21), HealthBar::Orange);
        assert_eq!(HealthBar::from_percentage(20), HealthBar::Red);
    }
}
