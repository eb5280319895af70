//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{QuestionKind, QuizQuestion, QuizResult, Topic};
use crate::insights::ScoreBand;
use crate::session::{Feedback, Progress};

/// Messages the client can send over WebSocket. One connection drives one session.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Open {
        #[serde(rename = "topicId")]
        topic_id: String,
    },
    Focus {
        #[serde(default, rename = "conceptId")]
        concept_id: Option<String>,
    },
    Start,
    Reveal,
    Answer {
        answer: String,
    },
    Advance,
    Abandon,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Review {
        topic: TopicOut,
        #[serde(rename = "questionCount")]
        question_count: usize,
        #[serde(rename = "focusConceptId")]
        focus_concept_id: Option<String>,
    },
    Question {
        question: QuestionOut,
        progress: Progress,
        answered: Option<String>,
    },
    Card {
        reference: String,
    },
    Feedback {
        feedback: Feedback,
    },
    Result {
        result: QuizResult,
        topic: TopicOut,
        tally: u32,
    },
    Abandoned,
    Error {
        message: String,
    },
}

/// A question as shown before it is answered: no answer, no explanation.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    pub concept_id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

pub fn question_out(q: &QuizQuestion) -> QuestionOut {
    QuestionOut {
        id: q.id.clone(),
        concept_id: q.concept_id.clone(),
        kind: q.kind,
        question: q.question.clone(),
        options: q.options.clone(),
    }
}

/// Topic plus the derived fields the dashboard renders.
#[derive(Debug, Serialize)]
pub struct TopicOut {
    #[serde(flatten)]
    pub topic: Topic,
    pub band: ScoreBand,
    pub due: bool,
}

pub fn topic_out(topic: Topic, now: DateTime<Utc>) -> TopicOut {
    TopicOut {
        band: ScoreBand::from_score(topic.memory_score),
        due: topic.is_due(now),
        topic,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct TopicsQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTopicIn {
    pub name: String,
}

/// A finished session reported by a client that ran the quiz itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultIn {
    pub score: u8,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub weak_concepts: BTreeSet<String>,
}

impl QuizResultIn {
    pub fn into_result(self, topic_id: String) -> QuizResult {
        QuizResult {
            topic_id,
            score: self.score,
            correct_count: self.correct_count,
            total_count: self.total_count,
            weak_concepts: self.weak_concepts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuizQuery {
    #[serde(rename = "topicId")]
    pub topic_id: String,
    #[serde(rename = "focusConceptId")]
    pub focus_concept_id: Option<String>,
}

#[derive(Serialize)]
pub struct QuizTopicsOut {
    pub topics: Vec<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}
