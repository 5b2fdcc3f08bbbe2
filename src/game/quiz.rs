use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single multiple-choice check tied to one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: String,
}

/// Questions keyed by species id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizBank {
    questions: BTreeMap<String, QuizQuestion>,
}

impl QuizBank {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, QuizQuestion)>,
        K: Into<String>,
    {
        QuizBank {
            questions: entries.into_iter().map(|(k, q)| (k.into(), q)).collect(),
        }
    }

    pub fn get(&self, species: &str) -> Option<&QuizQuestion> {
        self.questions.get(species)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QuizQuestion)> {
        self.questions.iter()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// The currently open question. The answer stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quiz {
    pub species: String,
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip)]
    correct: String,
}

impl Quiz {
    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.correct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizAnswer {
    Correct,
    Incorrect,
}

/// Holds at most one open quiz.
#[derive(Debug, Clone, Default)]
pub struct QuizGate {
    open: Option<Quiz>,
}

impl QuizGate {
    /// Open `question` for `species`, discarding any unanswered quiz.
    pub fn open(&mut self, species: &str, question: &QuizQuestion) {
        self.open = Some(Quiz {
            species: species.to_string(),
            question: question.question.clone(),
            options: question.options.clone(),
            correct: question.correct.clone(),
        });
    }

    /// Grade `selected` and close the quiz. `None` when no quiz is open.
    /// Anything other than the stored answer, including text outside the
    /// option list, is incorrect.
    pub fn answer(&mut self, selected: &str) -> Option<QuizAnswer> {
        let quiz = self.open.take()?;
        Some(if quiz.is_correct(selected) {
            QuizAnswer::Correct
        } else {
            QuizAnswer::Incorrect
        })
    }

    /// Close without grading. Returns whether a quiz was open.
    pub fn dismiss(&mut self) -> bool {
        self.open.take().is_some()
    }

    pub fn current(&self) -> Option<&Quiz> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diet() -> QuizQuestion {
        QuizQuestion {
            question: "Diet?".to_string(),
            options: vec!["Herbivore".into(), "Omnivore".into(), "Carnivore".into()],
            correct: "Herbivore".to_string(),
        }
    }

    #[test]
    fn correct_answer_graded_and_closes() {
        let mut gate = QuizGate::default();
        gate.open("turtle", &diet());
        assert_eq!(gate.current().unwrap().species, "turtle");
        assert_eq!(gate.answer("Herbivore"), Some(QuizAnswer::Correct));
        assert!(!gate.is_open());
    }

    #[test]
    fn wrong_or_unlisted_answer_incorrect() {
        let mut gate = QuizGate::default();
        gate.open("turtle", &diet());
        assert_eq!(gate.answer("Carnivore"), Some(QuizAnswer::Incorrect));
        gate.open("turtle", &diet());
        assert_eq!(gate.answer("Plankton"), Some(QuizAnswer::Incorrect));
    }

    #[test]
    fn answer_without_open_quiz_is_none() {
        let mut gate = QuizGate::default();
        assert_eq!(gate.answer("Herbivore"), None);
        assert!(!gate.dismiss());
    }

    #[test]
    fn opening_replaces_previous_quiz() {
        let mut gate = QuizGate::default();
        gate.open("turtle", &diet());
        let other = QuizQuestion {
            question: "Lives with…".to_string(),
            options: vec!["Coral".into(), "Anemones".into()],
            correct: "Anemones".to_string(),
        };
        gate.open("clownfish", &other);
        assert_eq!(gate.current().unwrap().species, "clownfish");
        assert_eq!(gate.answer("Herbivore"), Some(QuizAnswer::Incorrect));
    }

    #[test]
    fn serialized_quiz_hides_answer() {
        let mut gate = QuizGate::default();
        gate.open("turtle", &diet());
        let json = serde_json::to_value(gate.current().unwrap()).unwrap();
        assert!(json.get("correct").is_none());
        assert_eq!(json["options"].as_array().unwrap().len(), 3);
    }
}
