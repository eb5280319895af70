//! Domain models: topics, their concepts, quiz questions and the result of one session.
//!
//! Field names serialize in camelCase; this is the layout of the persisted blob.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How well the learner knows a concept, as of the last finished quiz.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConceptStatus {
  Strong,
  Weak,
  #[default]
  Neutral,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
  pub id: String,
  pub text: String,
  #[serde(default)]
  pub status: ConceptStatus,
}

/// A named subject of study and its review schedule.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub concepts: Vec<Concept>,
  /// 0..=100, cumulative average of all finished quiz scores.
  pub memory_score: u8,
  pub last_practiced: DateTime<Utc>,
  pub next_review_date: DateTime<Utc>,
  pub total_attempts: u32,
}

impl Topic {
  /// Due once the review date has been reached.
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_review_date <= now
  }

  pub fn concept(&self, concept_id: &str) -> Option<&Concept> {
    self.concepts.iter().find(|c| c.id == concept_id)
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
  /// Multiple choice, graded by exact string match.
  Mcq,
  /// Free recall, self-graded with "correct" / "incorrect".
  Card,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub id: String,
  pub concept_id: String,
  #[serde(rename = "type")]
  pub kind: QuestionKind,
  pub question: String,
  // Only present on mcq questions.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  pub correct_answer: String,
  #[serde(default)]
  pub explanation: String,
}

impl QuizQuestion {
  /// Structural check for authored content. Returns the reason when invalid.
  pub fn validate(&self) -> Result<(), String> {
    if self.concept_id.trim().is_empty() {
      return Err(format!("question '{}' has no concept id", self.id));
    }
    match (self.kind, &self.options) {
      (QuestionKind::Mcq, None) => Err(format!("mcq '{}' has no options", self.id)),
      (QuestionKind::Mcq, Some(opts)) if !opts.contains(&self.correct_answer) => {
        Err(format!("mcq '{}' correct answer is not among its options", self.id))
      }
      (QuestionKind::Card, Some(_)) => Err(format!("card '{}' must not carry options", self.id)),
      _ => Ok(()),
    }
  }
}

/// Output of one completed session. Never persisted as its own entity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  pub topic_id: String,
  /// 0..=100, `round(100 * correct_count / total_count)`.
  pub score: u8,
  pub correct_count: u32,
  pub total_count: u32,
  #[serde(default)]
  pub weak_concepts: BTreeSet<String>,
}
