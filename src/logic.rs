//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Topic listing/creation/deletion through the store
//!   - Applying quiz results reported by clients
//!   - Dashboard queries (due, recent, stats)
//!   - Resolving question sets and opening sessions

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::domain::{QuizQuestion, QuizResult, Topic};
use crate::error::StoreError;
use crate::insights::{due_topics, recent_topics, search, Stats};
use crate::session::Session;
use crate::state::AppState;

/// Reads under the shared guard; only the first-ever access, which seeds and
/// therefore writes, takes the exclusive one.
async fn read_topics(state: &AppState) -> Result<Vec<Topic>, StoreError> {
  let existing = state.store.read().await.load_topics()?;
  match existing {
    Some(topics) => Ok(topics),
    None => state.store.write().await.get_topics(),
  }
}

#[instrument(level = "debug", skip(state))]
pub async fn list_topics(state: &AppState, query: Option<&str>) -> Result<Vec<Topic>, StoreError> {
  let topics = read_topics(state).await?;
  Ok(match query {
    Some(q) if !q.trim().is_empty() => search(&topics, q),
    _ => topics,
  })
}

pub async fn get_topic(state: &AppState, id: &str) -> Result<Option<Topic>, StoreError> {
  Ok(read_topics(state).await?.into_iter().find(|t| t.id == id))
}

#[instrument(level = "info", skip(state))]
pub async fn create_topic(state: &AppState, name: &str) -> Result<Topic, StoreError> {
  state.store.write().await.create_topic(name)
}

#[instrument(level = "info", skip(state))]
pub async fn delete_topic(state: &AppState, id: &str) -> Result<bool, StoreError> {
  state.store.write().await.delete_topic(id)
}

/// Applies a result computed elsewhere. Unknown topics are ignored.
#[instrument(level = "info", skip(state, result), fields(score = result.score))]
pub async fn record_result(state: &AppState, topic_id: &str, result: &QuizResult) -> Result<Option<Topic>, StoreError> {
  state.store.write().await.update_topic_after_quiz(topic_id, result)
}

pub async fn due(state: &AppState) -> Result<Vec<Topic>, StoreError> {
  let topics = read_topics(state).await?;
  Ok(due_topics(&topics, Utc::now()))
}

pub async fn recent(state: &AppState, limit: usize) -> Result<Vec<Topic>, StoreError> {
  let topics = read_topics(state).await?;
  Ok(recent_topics(&topics, limit))
}

pub async fn stats(state: &AppState) -> Result<Stats, StoreError> {
  let topics = read_topics(state).await?;
  Ok(Stats::from_topics(&topics, Utc::now()))
}

/// Question set for a stored topic; `None` when the topic does not exist.
#[instrument(level = "debug", skip(state))]
pub async fn quiz_for_topic(
  state: &AppState,
  topic_id: &str,
  focus_concept_id: Option<&str>,
) -> Result<Option<Vec<QuizQuestion>>, StoreError> {
  let Some(topic) = get_topic(state, topic_id).await? else {
    return Ok(None);
  };
  let questions = state.bank.load_quiz(&topic.name, &topic.concepts, focus_concept_id);
  debug!(target: "quiz", %topic_id, count = questions.len(), "Question set resolved");
  Ok(Some(questions))
}

#[instrument(level = "info", skip(state))]
pub async fn open_session(state: &AppState, topic_id: &str) -> Result<Option<Session>, StoreError> {
  Ok(get_topic(state, topic_id).await?.map(|t| Session::open(t, state.bank.clone())))
}

#[instrument(level = "info", skip(state))]
pub async fn reset_store(state: &AppState) -> Result<Vec<Topic>, StoreError> {
  let topics = state.store.write().await.reset()?;
  info!(target: "retention_backend", count = topics.len(), "Store reset requested");
  Ok(topics)
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::quiz::QuizBank;
  use crate::seeds::builtin_quizzes;
  use crate::storage::{FileStorage, MemoryStorage};
  use crate::store::TopicStore;

  fn state() -> AppState {
    AppState::with_store(TopicStore::new(MemoryStorage::new()), QuizBank::new(builtin_quizzes()))
  }

  #[tokio::test]
  async fn created_topics_show_up_in_search_and_due() {
    let st = state();
    create_topic(&st, "Mitosis").await.unwrap();
    assert_eq!(list_topics(&st, None).await.unwrap().len(), 2);
    assert_eq!(list_topics(&st, Some("mito")).await.unwrap().len(), 1);
    // both the seed and a fresh topic are due
    assert_eq!(due(&st).await.unwrap().len(), 2);
    assert_eq!(stats(&st).await.unwrap().total_topics, 2);
  }

  #[tokio::test]
  async fn recorded_result_reschedules_topic() {
    let st = state();
    let result = QuizResult {
      topic_id: "topic-1".into(),
      score: 100,
      correct_count: 5,
      total_count: 5,
      weak_concepts: BTreeSet::new(),
    };
    let t = record_result(&st, "topic-1", &result).await.unwrap().unwrap();
    assert_eq!(t.total_attempts, 4);
    assert!(due(&st).await.unwrap().is_empty());
    assert_eq!(recent(&st, 4).await.unwrap()[0].id, "topic-1");
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_first_reads_seed_once_without_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topics.json");
    let st = AppState::with_store(TopicStore::new(FileStorage::new(&path)), QuizBank::new(builtin_quizzes()));

    let handles: Vec<_> = (0..8)
      .map(|_| {
        let st = st.clone();
        tokio::spawn(async move { list_topics(&st, None).await.map(|t| t.len()) })
      })
      .collect();
    for h in handles {
      assert_eq!(h.await.unwrap().unwrap(), 1);
    }
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
  }

  #[tokio::test]
  async fn quiz_for_unknown_topic_is_none() {
    let st = state();
    assert!(quiz_for_topic(&st, "nope", None).await.unwrap().is_none());
    assert_eq!(quiz_for_topic(&st, "topic-1", None).await.unwrap().unwrap().len(), 5);
    assert!(open_session(&st, "nope").await.unwrap().is_none());
  }
}
