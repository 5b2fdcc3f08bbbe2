use serde::Serialize;
use tracing::info;

use crate::game::quiz::{Quiz, QuizAnswer, QuizBank, QuizGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Hidden,
    Found,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    pub id: String,
    pub label: String,
    pub status: TargetStatus,
}

/// What happened when a species was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Tracking is off; nothing changed.
    Inactive,
    /// Not one of this session's targets.
    Unknown,
    AlreadyFound,
    Found { quiz_opened: bool, completed: bool },
}

/// Find-the-species tracker. Targets only move hidden -> found within a session.
#[derive(Debug, Clone)]
pub struct MiniGame {
    targets: Vec<Target>,
    active: bool,
    started_at: Option<f64>,
    finished_at: Option<f64>,
    score: u32,
    questions: QuizBank,
    quiz: QuizGate,
}

#[derive(Debug, Clone, Serialize)]
pub struct MiniGameSnapshot {
    pub active: bool,
    pub targets: Vec<Target>,
    pub found: usize,
    pub total: usize,
    pub score: u32,
    pub complete: bool,
    pub elapsed: Option<f64>,
    pub quiz: Option<Quiz>,
}

impl MiniGame {
    pub fn new<I>(targets: I, questions: QuizBank) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        MiniGame {
            targets: targets
                .into_iter()
                .map(|(id, label)| Target {
                    id,
                    label,
                    status: TargetStatus::Hidden,
                })
                .collect(),
            active: false,
            started_at: None,
            finished_at: None,
            score: 0,
            questions,
            quiz: QuizGate::default(),
        }
    }

    pub fn start(&mut self, now: f64) {
        for target in &mut self.targets {
            target.status = TargetStatus::Hidden;
        }
        self.started_at = Some(now);
        self.finished_at = None;
        self.score = 0;
        self.quiz.dismiss();
        self.active = true;
    }

    pub fn reset(&mut self, now: f64) {
        self.start(now);
    }

    /// Stop tracking. Target statuses survive until the next start.
    pub fn stop(&mut self) {
        self.active = false;
        self.quiz.dismiss();
    }

    pub fn report(&mut self, species: &str, now: f64) -> Report {
        if !self.active {
            return Report::Inactive;
        }
        let Some(target) = self.targets.iter_mut().find(|t| t.id == species) else {
            return Report::Unknown;
        };
        if target.status == TargetStatus::Found {
            return Report::AlreadyFound;
        }
        target.status = TargetStatus::Found;

        let quiz_opened = match self.questions.get(species) {
            Some(question) => {
                self.quiz.open(species, question);
                true
            }
            None => false,
        };

        let completed = self.is_all_found() && self.finished_at.is_none();
        if completed {
            self.finished_at = Some(now);
            info!(
                found = self.targets.len(),
                elapsed = self.elapsed(now).unwrap_or_default(),
                "Mini-game complete"
            );
        }
        Report::Found {
            quiz_opened,
            completed,
        }
    }

    /// Grade the open quiz; a correct answer adds one point.
    pub fn answer(&mut self, selected: &str) -> Option<QuizAnswer> {
        let result = self.quiz.answer(selected)?;
        if result == QuizAnswer::Correct {
            self.score += 1;
        }
        Some(result)
    }

    pub fn dismiss_quiz(&mut self) -> bool {
        self.quiz.dismiss()
    }

    fn is_all_found(&self) -> bool {
        self.targets.iter().all(|t| t.status == TargetStatus::Found)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_complete(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn found_count(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| t.status == TargetStatus::Found)
            .count()
    }

    pub fn total(&self) -> usize {
        self.targets.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.current()
    }

    pub fn finished_at(&self) -> Option<f64> {
        self.finished_at
    }

    /// Seconds since start, frozen at completion.
    pub fn elapsed(&self, now: f64) -> Option<f64> {
        let start = self.started_at?;
        Some(self.finished_at.unwrap_or(now) - start)
    }

    pub fn snapshot(&self, now: f64) -> MiniGameSnapshot {
        MiniGameSnapshot {
            active: self.active,
            targets: self.targets.clone(),
            found: self.found_count(),
            total: self.total(),
            score: self.score,
            complete: self.is_complete(),
            elapsed: self.elapsed(now),
            quiz: self.quiz.current().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::content;

    fn ocean_game() -> MiniGame {
        let content = content::ocean();
        MiniGame::new(
            [
                ("turtle", "Sea Turtle"),
                ("shark", "Reef Shark"),
                ("clownfish", "Clownfish"),
                ("manta", "Manta Ray"),
            ]
            .map(|(id, label)| (id.to_string(), label.to_string())),
            content.quiz,
        )
    }

    #[test]
    fn report_ignored_when_inactive() {
        let mut game = ocean_game();
        assert_eq!(game.report("turtle", 1.0), Report::Inactive);
        assert_eq!(game.found_count(), 0);
        assert!(game.quiz().is_none());
    }

    #[test]
    fn unknown_species_is_noop() {
        let mut game = ocean_game();
        game.start(0.0);
        assert_eq!(game.report("kraken", 1.0), Report::Unknown);
        assert_eq!(game.found_count(), 0);
    }

    #[test]
    fn found_opens_quiz_and_rereport_does_not() {
        let mut game = ocean_game();
        game.start(0.0);
        assert_eq!(
            game.report("turtle", 1.0),
            Report::Found {
                quiz_opened: true,
                completed: false
            }
        );
        assert_eq!(game.quiz().unwrap().species, "turtle");
        game.dismiss_quiz();
        assert_eq!(game.report("turtle", 2.0), Report::AlreadyFound);
        assert!(game.quiz().is_none());
        assert_eq!(game.found_count(), 1);
    }

    #[test]
    fn completion_recorded_once() {
        let mut game = ocean_game();
        game.start(10.0);
        for (i, id) in ["turtle", "shark", "clownfish"].iter().enumerate() {
            game.report(id, 11.0 + i as f64);
        }
        assert!(!game.is_complete());
        let last = game.report("manta", 20.0);
        assert_eq!(
            last,
            Report::Found {
                quiz_opened: true,
                completed: true
            }
        );
        assert_eq!(game.finished_at(), Some(20.0));
        assert_eq!(game.elapsed(99.0), Some(10.0));

        game.report("manta", 30.0);
        game.report("turtle", 31.0);
        assert_eq!(game.finished_at(), Some(20.0));
        assert_eq!(game.found_count(), 4);
    }

    #[test]
    fn quiz_scoring() {
        let mut game = ocean_game();
        game.start(0.0);
        game.report("turtle", 1.0);
        assert_eq!(game.answer("Herbivore"), Some(QuizAnswer::Correct));
        assert_eq!(game.score(), 1);
        assert!(game.quiz().is_none());

        game.report("shark", 2.0);
        assert_eq!(game.answer("Endangered"), Some(QuizAnswer::Incorrect));
        assert_eq!(game.score(), 1);
        assert!(game.quiz().is_none());

        assert_eq!(game.answer("Herbivore"), None);
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn stop_keeps_statuses_and_start_clears() {
        let mut game = ocean_game();
        game.start(0.0);
        game.report("turtle", 1.0);
        game.answer("Herbivore");
        game.stop();
        assert!(!game.is_active());
        assert_eq!(game.found_count(), 1);
        assert_eq!(game.report("shark", 2.0), Report::Inactive);

        game.reset(5.0);
        assert!(game.is_active());
        assert_eq!(game.found_count(), 0);
        assert_eq!(game.score(), 0);
        assert!(!game.is_complete());
        assert_eq!(game.elapsed(7.0), Some(2.0));
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut game = ocean_game();
        game.start(0.0);
        game.report("clownfish", 3.0);
        let snap = game.snapshot(4.0);
        assert_eq!(snap.found, 1);
        assert_eq!(snap.total, 4);
        assert_eq!(snap.targets[2].status, TargetStatus::Found);
        assert_eq!(snap.quiz.as_ref().unwrap().species, "clownfish");
        assert_eq!(snap.elapsed, Some(4.0));
    }
}
