//! Question-set resolution: authored quizzes looked up by display name, with a
//! templated fallback built from the topic's concepts.

use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::domain::{Concept, QuestionKind, QuizQuestion};

/// One authored quiz, keyed by a canonical key and matched on `display_name`.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthoredQuiz {
  pub key: String,
  pub display_name: String,
  #[serde(default)]
  pub questions: Vec<QuizQuestion>,
}

/// Static table of authored quizzes, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct QuizBank {
  entries: Vec<AuthoredQuiz>,
}

impl QuizBank {
  /// Builds the bank. Later entries replace earlier ones with the same key;
  /// entries containing a malformed question are skipped.
  pub fn new(entries: impl IntoIterator<Item = AuthoredQuiz>) -> Self {
    let mut bank = Self::default();
    for entry in entries {
      if let Some(reason) = entry.questions.iter().find_map(|q| q.validate().err()) {
        error!(target: "quiz", key = %entry.key, %reason, "Skipping authored quiz");
        continue;
      }
      match bank.entries.iter_mut().find(|e| e.key == entry.key) {
        Some(slot) => *slot = entry,
        None => bank.entries.push(entry),
      }
    }
    bank
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Case-insensitive match on display name.
  pub fn find(&self, topic_name: &str) -> Option<&AuthoredQuiz> {
    let wanted = topic_name.to_lowercase();
    self.entries.iter().find(|e| e.display_name.to_lowercase() == wanted)
  }

  pub fn display_names(&self) -> Vec<String> {
    self.entries.iter().map(|e| e.display_name.clone()).collect()
  }

  /// Ordered question set for a session, optionally focused on one concept.
  ///
  /// An authored match wins unless the focus selects none of its questions, in
  /// which case the synthesized set is used instead of returning nothing.
  #[instrument(level = "debug", skip(self, concepts), fields(concepts = concepts.len()))]
  pub fn load_quiz(&self, topic_name: &str, concepts: &[Concept], focus_concept_id: Option<&str>) -> Vec<QuizQuestion> {
    if let Some(entry) = self.find(topic_name) {
      match focus_concept_id {
        None => return entry.questions.clone(),
        Some(focus) => {
          let focused: Vec<QuizQuestion> =
            entry.questions.iter().filter(|q| q.concept_id == focus).cloned().collect();
          if !focused.is_empty() {
            return focused;
          }
          debug!(target: "quiz", %topic_name, %focus, "Focus matched no authored question; synthesizing");
        }
      }
    }
    synthesize(concepts, focus_concept_id)
  }
}

/// Two questions per concept (an mcq, then a card). When the focus names one of
/// the concepts only that concept is used. Ids depend on the concept index only.
pub fn synthesize(concepts: &[Concept], focus_concept_id: Option<&str>) -> Vec<QuizQuestion> {
  let focus = focus_concept_id.filter(|f| concepts.iter().any(|c| c.id == *f));
  concepts
    .iter()
    .enumerate()
    .filter(|(_, c)| focus.map_or(true, |f| c.id == f))
    .flat_map(|(i, c)| [synth_mcq(i, c), synth_card(i, c)])
    .collect()
}

fn synth_mcq(index: usize, concept: &Concept) -> QuizQuestion {
  let text = &concept.text;
  let correct = format!("Basic idea of {}", text);
  QuizQuestion {
    id: format!("mock-mcq-{}", index),
    concept_id: concept.id.clone(),
    kind: QuestionKind::Mcq,
    question: format!("What do you know about \"{}\"?", text),
    options: Some(vec![
      correct.clone(),
      "It is the Batman of this codebase (dark, necessary, misunderstood".to_string(),
      format!("but Thanos snapped half the {} away", text),
      "It is someone whose origin story never got a sequel".to_string(),
    ]),
    correct_answer: correct,
    explanation: format!("This is a mock question about {}", text),
  }
}

fn synth_card(index: usize, concept: &Concept) -> QuizQuestion {
  let text = &concept.text;
  QuizQuestion {
    id: format!("mock-card-{}", index),
    concept_id: concept.id.clone(),
    kind: QuestionKind::Card,
    question: format!("Explain \"{}\" in your own words.", text),
    options: None,
    correct_answer: format!("This is a sample answer for {}", text),
    explanation: format!("This is a mock card question about {}", text),
  }
}
