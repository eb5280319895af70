//! One quiz session for one topic: `Review -> Quiz -> Result`, no way back.
//!
//! Each phase owns exactly the data it needs, so e.g. a session in review can
//! never carry a result. Abandoning a session is just dropping it; only a
//! finished quiz reaches the store.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{QuestionKind, QuizQuestion, QuizResult, Topic};
use crate::error::SessionError;
use crate::quiz::QuizBank;
use crate::store::TopicStore;

/// Self-grade values accepted for card questions.
pub const SELF_GRADE_CORRECT: &str = "correct";
pub const SELF_GRADE_INCORRECT: &str = "incorrect";

/// Points added to the running tally per correct answer. Display only.
const TALLY_STEP: u32 = 10;

#[derive(Debug)]
pub enum Phase {
  Review { questions: Vec<QuizQuestion>, focus: Option<String> },
  Quiz(QuizRun),
  Result { result: QuizResult, tally: u32 },
}

impl Phase {
  pub fn name(&self) -> &'static str {
    match self {
      Phase::Review { .. } => "review",
      Phase::Quiz(_) => "quiz",
      Phase::Result { .. } => "result",
    }
  }
}

/// In-flight quiz state.
#[derive(Debug)]
pub struct QuizRun {
  questions: Vec<QuizQuestion>,
  index: usize,
  answers: HashMap<String, String>,
  tally: u32,
  correct: u32,
  weak: BTreeSet<String>,
  // Cards whose reference answer has been shown.
  revealed: HashSet<String>,
}

impl QuizRun {
  fn new(questions: Vec<QuizQuestion>) -> Self {
    Self {
      questions,
      index: 0,
      answers: HashMap::new(),
      tally: 0,
      correct: 0,
      weak: BTreeSet::new(),
      revealed: HashSet::new(),
    }
  }

  fn current(&self) -> Option<&QuizQuestion> {
    self.questions.get(self.index)
  }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
  pub index: usize,
  pub total: usize,
  pub percent: u8,
}

/// What the caller shows right after an answer is submitted.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
  pub question_id: String,
  pub correct: bool,
  pub correct_answer: String,
  pub selected: String,
  pub explanation: String,
  pub tally: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Advance {
  Next { index: usize },
  Finished(QuizResult),
}

pub struct Session {
  topic: Topic,
  bank: Arc<QuizBank>,
  phase: Phase,
}

impl Session {
  /// Opens in review with the unfocused question set.
  pub fn open(topic: Topic, bank: Arc<QuizBank>) -> Self {
    let questions = bank.load_quiz(&topic.name, &topic.concepts, None);
    debug!(target: "quiz", topic_id = %topic.id, questions = questions.len(), "Session opened");
    Self { topic, bank, phase: Phase::Review { questions, focus: None } }
  }

  pub fn topic(&self) -> &Topic {
    &self.topic
  }

  pub fn phase(&self) -> &Phase {
    &self.phase
  }

  /// The resolved question set; empty once the session has finished.
  pub fn questions(&self) -> &[QuizQuestion] {
    match &self.phase {
      Phase::Review { questions, .. } => questions.as_slice(),
      Phase::Quiz(run) => run.questions.as_slice(),
      Phase::Result { .. } => &[],
    }
  }

  /// Re-derives the question set for one concept, or for all when `None`.
  #[instrument(level = "debug", skip(self), fields(topic_id = %self.topic.id))]
  pub fn focus(&mut self, concept_id: Option<&str>) -> Result<&[QuizQuestion], SessionError> {
    if let Some(id) = concept_id {
      if self.topic.concept(id).is_none() {
        return Err(SessionError::UnknownConcept(id.to_string()));
      }
    }
    let actual = self.phase.name();
    let Phase::Review { questions, focus } = &mut self.phase else {
      return Err(SessionError::WrongPhase { expected: "review", actual });
    };
    *questions = self.bank.load_quiz(&self.topic.name, &self.topic.concepts, concept_id);
    *focus = concept_id.map(str::to_string);
    Ok(questions.as_slice())
  }

  /// Leaves review. Refused when there is nothing to ask.
  #[instrument(level = "info", skip(self), fields(topic_id = %self.topic.id))]
  pub fn start(&mut self) -> Result<&QuizQuestion, SessionError> {
    let actual = self.phase.name();
    let Phase::Review { questions, .. } = &mut self.phase else {
      return Err(SessionError::WrongPhase { expected: "review", actual });
    };
    if questions.is_empty() {
      return Err(SessionError::EmptyQuestionSet);
    }
    let questions = std::mem::take(questions);
    info!(target: "quiz", topic_id = %self.topic.id, total = questions.len(), "Quiz started");
    self.phase = Phase::Quiz(QuizRun::new(questions));
    self.current().ok_or(SessionError::NoCurrentQuestion)
  }

  /// `None` outside the quiz phase or when the index fell off the list.
  pub fn current(&self) -> Option<&QuizQuestion> {
    match &self.phase {
      Phase::Quiz(run) => run.current(),
      _ => None,
    }
  }

  pub fn progress(&self) -> Option<Progress> {
    let Phase::Quiz(run) = &self.phase else { return None };
    let total = run.questions.len();
    if total == 0 {
      return None;
    }
    let percent = (100.0 * run.index as f64 / total as f64).round() as u8;
    Some(Progress { index: run.index, total, percent })
  }

  /// Running "+10 per correct" tally. Never what gets persisted.
  pub fn tally(&self) -> u32 {
    match &self.phase {
      Phase::Review { .. } => 0,
      Phase::Quiz(run) => run.tally,
      Phase::Result { tally, .. } => *tally,
    }
  }

  /// Reference answer of the current question: any time for a card (which
  /// unlocks self-grading), only after answering for an mcq.
  pub fn reveal(&mut self) -> Result<&str, SessionError> {
    let actual = self.phase.name();
    let Phase::Quiz(run) = &mut self.phase else {
      return Err(SessionError::WrongPhase { expected: "quiz", actual });
    };
    let q = run.questions.get(run.index).ok_or(SessionError::NoCurrentQuestion)?;
    match q.kind {
      QuestionKind::Mcq if !run.answers.contains_key(&q.id) => {
        return Err(SessionError::NotAnswered(q.id.clone()));
      }
      QuestionKind::Mcq => {}
      QuestionKind::Card => {
        run.revealed.insert(q.id.clone());
      }
    }
    Ok(q.correct_answer.as_str())
  }

  /// Records the answer to the current question, once.
  #[instrument(level = "debug", skip(self, answer), fields(topic_id = %self.topic.id))]
  pub fn answer(&mut self, answer: &str) -> Result<Feedback, SessionError> {
    let actual = self.phase.name();
    let Phase::Quiz(run) = &mut self.phase else {
      return Err(SessionError::WrongPhase { expected: "quiz", actual });
    };
    let q = run.questions.get(run.index).ok_or(SessionError::NoCurrentQuestion)?;
    if run.answers.contains_key(&q.id) {
      return Err(SessionError::AlreadyAnswered(q.id.clone()));
    }
    let correct = match q.kind {
      QuestionKind::Mcq => answer == q.correct_answer,
      QuestionKind::Card if !run.revealed.contains(&q.id) => {
        return Err(SessionError::NotRevealed(q.id.clone()));
      }
      QuestionKind::Card => match answer {
        SELF_GRADE_CORRECT => true,
        SELF_GRADE_INCORRECT => false,
        other => return Err(SessionError::InvalidSelfGrade(other.to_string())),
      },
    };

    if correct {
      run.tally += TALLY_STEP;
      run.correct += 1;
    } else {
      run.weak.insert(q.concept_id.clone());
    }
    run.answers.insert(q.id.clone(), answer.to_string());
    debug!(target: "quiz", question_id = %q.id, correct, "Answer recorded");

    Ok(Feedback {
      question_id: q.id.clone(),
      correct,
      correct_answer: q.correct_answer.clone(),
      selected: answer.to_string(),
      explanation: q.explanation.clone(),
      tally: run.tally,
    })
  }

  /// Moves past an answered question. Past the last one the result is
  /// persisted through `store` and the session becomes terminal; if the store
  /// fails the session stays on the last question.
  #[instrument(level = "info", skip(self, store), fields(topic_id = %self.topic.id))]
  pub fn advance(&mut self, store: &TopicStore) -> Result<Advance, SessionError> {
    let actual = self.phase.name();
    let Phase::Quiz(run) = &mut self.phase else {
      return Err(SessionError::WrongPhase { expected: "quiz", actual });
    };
    let q = run.current().ok_or(SessionError::NoCurrentQuestion)?;
    if !run.answers.contains_key(&q.id) {
      return Err(SessionError::NotAnswered(q.id.clone()));
    }
    if run.index + 1 < run.questions.len() {
      run.index += 1;
      return Ok(Advance::Next { index: run.index });
    }

    let total = run.questions.len() as u32;
    if total == 0 {
      return Err(SessionError::EmptyQuestionSet);
    }
    let score = (100.0 * f64::from(run.correct) / f64::from(total)).round() as u8;
    let result = QuizResult {
      topic_id: self.topic.id.clone(),
      score,
      correct_count: run.correct,
      total_count: total,
      weak_concepts: run.weak.clone(),
    };
    let tally = run.tally;

    if let Some(updated) = store.update_topic_after_quiz(&self.topic.id, &result)? {
      self.topic = updated;
    }
    info!(target: "quiz", topic_id = %self.topic.id, score, correct = result.correct_count, total, "Quiz finished");
    self.phase = Phase::Result { result: result.clone(), tally };
    Ok(Advance::Finished(result))
  }

  /// What was submitted for a question of the running quiz, if anything.
  pub fn recorded_answer(&self, question_id: &str) -> Option<&str> {
    match &self.phase {
      Phase::Quiz(run) => run.answers.get(question_id).map(String::as_str),
      _ => None,
    }
  }

  pub fn result(&self) -> Option<&QuizResult> {
    match &self.phase {
      Phase::Result { result, .. } => Some(result),
      _ => None,
    }
  }
}
