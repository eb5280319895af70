//! Seed data and default content.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{Concept, ConceptStatus, QuestionKind, QuizQuestion, Topic};
use crate::quiz::AuthoredQuiz;

/// The example topic written to an empty store so the app is useful on first launch.
pub fn seed_topics(now: DateTime<Utc>) -> Vec<Topic> {
  vec![Topic {
    id: "topic-1".into(),
    name: "Photosynthesis".into(),
    concepts: vec![
      concept("c-1", "Light-dependent reactions", ConceptStatus::Strong),
      concept("c-2", "Calvin cycle", ConceptStatus::Weak),
      concept("c-3", "Chloroplast structure", ConceptStatus::Neutral),
    ],
    memory_score: 65,
    last_practiced: now - Duration::days(2),
    // already due
    next_review_date: now - Duration::hours(2),
    total_attempts: 3,
  }]
}

/// Three neutral placeholder concepts for a freshly named topic.
pub fn placeholder_concepts(name: &str) -> Vec<Concept> {
  [
    format!("Basic principles of {}", name),
    format!("Advanced application of {}", name),
    format!("Common pitfalls in {}", name),
  ]
  .into_iter()
  .map(|text| Concept { id: Uuid::new_v4().to_string(), text, status: ConceptStatus::Neutral })
  .collect()
}

/// Built-in authored quizzes. Config can add to or override these by key.
pub fn builtin_quizzes() -> Vec<AuthoredQuiz> {
  vec![
    AuthoredQuiz {
      key: "photosynthesis".into(),
      display_name: "Photosynthesis".into(),
      questions: vec![
        mcq(
          "ps-1",
          "c-1",
          "Where do the light-dependent reactions take place?",
          &["Thylakoid membranes", "Stroma", "Mitochondrial matrix", "Cell wall"],
          "Thylakoid membranes",
          "Photosystems I and II sit in the thylakoid membranes.",
        ),
        card(
          "ps-2",
          "c-1",
          "What do the light-dependent reactions produce for the Calvin cycle?",
          "ATP and NADPH (oxygen is released as a by-product).",
          "Water is split; the energy carriers feed carbon fixation.",
        ),
        mcq(
          "ps-3",
          "c-2",
          "Which enzyme fixes CO2 in the Calvin cycle?",
          &["RuBisCO", "ATP synthase", "Amylase", "Helicase"],
          "RuBisCO",
          "RuBisCO attaches CO2 to ribulose bisphosphate.",
        ),
        card(
          "ps-4",
          "c-2",
          "Summarise the three phases of the Calvin cycle.",
          "Carbon fixation, reduction, regeneration of RuBP.",
          "Three turns of the cycle export one G3P molecule.",
        ),
        mcq(
          "ps-5",
          "c-3",
          "What are stacks of thylakoids called?",
          &["Grana", "Cristae", "Vacuoles", "Ribosomes"],
          "Grana",
          "A single stack is a granum.",
        ),
      ],
    },
    AuthoredQuiz {
      key: "newtons-laws".into(),
      display_name: "Newton's Laws".into(),
      questions: vec![
        mcq(
          "nl-1",
          "nl-inertia",
          "An object at rest stays at rest unless acted on by...",
          &["A net external force", "Gravity only", "Friction only", "Its own mass"],
          "A net external force",
          "First law: inertia.",
        ),
        mcq(
          "nl-2",
          "nl-force",
          "Which equation states Newton's second law?",
          &["F = ma", "E = mc^2", "p = mv^2", "V = IR"],
          "F = ma",
          "Net force equals mass times acceleration.",
        ),
        card(
          "nl-3",
          "nl-reaction",
          "State Newton's third law.",
          "For every action there is an equal and opposite reaction.",
          "Forces come in pairs acting on different bodies.",
        ),
      ],
    },
  ]
}

fn concept(id: &str, text: &str, status: ConceptStatus) -> Concept {
  Concept { id: id.into(), text: text.into(), status }
}

fn mcq(id: &str, concept_id: &str, question: &str, options: &[&str], correct: &str, explanation: &str) -> QuizQuestion {
  QuizQuestion {
    id: id.into(),
    concept_id: concept_id.into(),
    kind: QuestionKind::Mcq,
    question: question.into(),
    options: Some(options.iter().map(|s| s.to_string()).collect()),
    correct_answer: correct.into(),
    explanation: explanation.into(),
  }
}

fn card(id: &str, concept_id: &str, question: &str, answer: &str, explanation: &str) -> QuizQuestion {
  QuizQuestion {
    id: id.into(),
    concept_id: concept_id.into(),
    kind: QuestionKind::Card,
    question: question.into(),
    options: None,
    correct_answer: answer.into(),
    explanation: explanation.into(),
  }
}
