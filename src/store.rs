//! Topic store: the only owner of durable topic state.
//!
//! Every read decodes the whole blob and every mutation rewrites it. There is a
//! single writer (the shared state serializes access), so no conflict policy.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{ConceptStatus, QuizResult, Topic};
use crate::error::StoreError;
use crate::seeds::{placeholder_concepts, seed_topics};
use crate::storage::BlobStorage;

/// Hours until the next review for a given session score.
pub fn interval_hours(score: u8) -> i64 {
  if score > 80 {
    72
  } else if score > 60 {
    24
  } else {
    4
  }
}

/// Cumulative average: every past session weighs the same regardless of age.
pub fn next_memory_score(old_score: u8, old_attempts: u32, session_score: u8) -> u8 {
  let total = f64::from(old_score) * f64::from(old_attempts) + f64::from(session_score);
  let avg = (total / (f64::from(old_attempts) + 1.0)).round();
  avg.clamp(0.0, 100.0) as u8
}

pub struct TopicStore {
  storage: Box<dyn BlobStorage>,
}

impl TopicStore {
  pub fn new(storage: impl BlobStorage + 'static) -> Self {
    Self { storage: Box::new(storage) }
  }

  /// All topics in stored order. Seeds and persists the example topic on first access.
  #[instrument(level = "debug", skip(self))]
  pub fn get_topics(&self) -> Result<Vec<Topic>, StoreError> {
    self.get_topics_at(Utc::now())
  }

  fn get_topics_at(&self, now: DateTime<Utc>) -> Result<Vec<Topic>, StoreError> {
    match self.storage.load()? {
      Some(blob) => serde_json::from_str(&blob).map_err(StoreError::Corrupt),
      None => {
        let seeded = seed_topics(now);
        self.persist(&seeded)?;
        info!(target: "topic_store", count = seeded.len(), "Seeded empty store");
        Ok(seeded)
      }
    }
  }

  /// Stored topics without seeding; `None` when nothing has been written yet.
  /// Never writes, so it is safe under a shared guard.
  pub fn load_topics(&self) -> Result<Option<Vec<Topic>>, StoreError> {
    match self.storage.load()? {
      Some(blob) => serde_json::from_str(&blob).map(Some).map_err(StoreError::Corrupt),
      None => Ok(None),
    }
  }

  pub fn get_topic(&self, id: &str) -> Result<Option<Topic>, StoreError> {
    Ok(self.get_topics()?.into_iter().find(|t| t.id == id))
  }

  /// Upsert by id: replace in place, otherwise append.
  #[instrument(level = "debug", skip(self, topic), fields(id = %topic.id))]
  pub fn save_topic(&self, topic: Topic) -> Result<(), StoreError> {
    let mut topics = self.get_topics()?;
    match topics.iter_mut().find(|t| t.id == topic.id) {
      Some(slot) => *slot = topic,
      None => topics.push(topic),
    }
    self.persist(&topics)
  }

  #[instrument(level = "info", skip(self))]
  pub fn create_topic(&self, name: &str) -> Result<Topic, StoreError> {
    self.create_topic_at(name, Utc::now())
  }

  fn create_topic_at(&self, name: &str, now: DateTime<Utc>) -> Result<Topic, StoreError> {
    let name = name.trim();
    if name.is_empty() {
      return Err(StoreError::Validation("topic name must not be blank".into()));
    }
    let topic = Topic {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      concepts: placeholder_concepts(name),
      memory_score: 0,
      last_practiced: now,
      // due immediately
      next_review_date: now,
      total_attempts: 0,
    };
    self.save_topic(topic.clone())?;
    info!(target: "topic_store", id = %topic.id, name = %topic.name, "Topic created");
    Ok(topic)
  }

  /// Folds a finished session into the topic. Unknown ids are a silent no-op (`Ok(None)`).
  #[instrument(level = "info", skip(self, result), fields(score = result.score))]
  pub fn update_topic_after_quiz(&self, topic_id: &str, result: &QuizResult) -> Result<Option<Topic>, StoreError> {
    self.update_topic_after_quiz_at(topic_id, result, Utc::now())
  }

  pub fn update_topic_after_quiz_at(
    &self,
    topic_id: &str,
    result: &QuizResult,
    now: DateTime<Utc>,
  ) -> Result<Option<Topic>, StoreError> {
    let Some(mut topic) = self.get_topics_at(now)?.into_iter().find(|t| t.id == topic_id) else {
      debug!(target: "topic_store", %topic_id, "Quiz result for unknown topic ignored");
      return Ok(None);
    };

    topic.memory_score = next_memory_score(topic.memory_score, topic.total_attempts, result.score);
    topic.total_attempts += 1;
    topic.last_practiced = now;
    topic.next_review_date = now + Duration::hours(interval_hours(result.score));
    // Concepts the session never touched are reclassified as strong too.
    for c in &mut topic.concepts {
      c.status = if result.weak_concepts.contains(&c.id) {
        ConceptStatus::Weak
      } else {
        ConceptStatus::Strong
      };
    }

    self.save_topic(topic.clone())?;
    info!(
      target: "topic_store",
      %topic_id,
      memory_score = topic.memory_score,
      attempts = topic.total_attempts,
      next_review = %topic.next_review_date,
      "Topic updated after quiz"
    );
    Ok(Some(topic))
  }

  /// Returns whether anything was removed.
  #[instrument(level = "info", skip(self))]
  pub fn delete_topic(&self, id: &str) -> Result<bool, StoreError> {
    let mut topics = self.get_topics()?;
    let before = topics.len();
    topics.retain(|t| t.id != id);
    if topics.len() == before {
      debug!(target: "topic_store", %id, "Delete of unknown topic ignored");
      return Ok(false);
    }
    self.persist(&topics)?;
    Ok(true)
  }

  /// Overwrites whatever is stored with the seed set. Recovery path for a corrupt blob.
  #[instrument(level = "info", skip(self))]
  pub fn reset(&self) -> Result<Vec<Topic>, StoreError> {
    let seeded = seed_topics(Utc::now());
    self.persist(&seeded)?;
    warn!(target: "topic_store", "Store reset to seed data");
    Ok(seeded)
  }

  fn persist(&self, topics: &[Topic]) -> Result<(), StoreError> {
    let blob = serde_json::to_string(topics).map_err(StoreError::Encode)?;
    self.storage.save(&blob)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::storage::MemoryStorage;

  fn store() -> TopicStore {
    TopicStore::new(MemoryStorage::new())
  }

  fn result(topic_id: &str, score: u8, weak: &[&str]) -> QuizResult {
    QuizResult {
      topic_id: topic_id.into(),
      score,
      correct_count: 0,
      total_count: 0,
      weak_concepts: weak.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
    }
  }

  #[test]
  fn fresh_store_seeds_once() {
    let s = store();
    let first = s.get_topics().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name, "Photosynthesis");
    assert_eq!(first[0].memory_score, 65);
    assert_eq!(first[0].total_attempts, 3);
    // Second read decodes the persisted seed rather than reseeding.
    assert_eq!(s.get_topics().unwrap(), first);
  }

  #[test]
  fn load_topics_does_not_seed() {
    let s = store();
    assert!(s.load_topics().unwrap().is_none());
    assert!(s.load_topics().unwrap().is_none());
    let seeded = s.get_topics().unwrap();
    assert_eq!(s.load_topics().unwrap(), Some(seeded));
  }

  #[test]
  fn create_topic_builds_three_neutral_concepts() {
    let s = store();
    let t = s.create_topic("Mitosis").unwrap();
    assert_eq!(t.concepts.len(), 3);
    assert!(t.concepts.iter().all(|c| c.status == ConceptStatus::Neutral));
    assert_eq!(t.memory_score, 0);
    assert_eq!(t.total_attempts, 0);
    assert_eq!(t.last_practiced, t.next_review_date);
    assert_eq!(s.get_topics().unwrap().len(), 2);
  }

  #[test]
  fn create_topic_rejects_blank_name() {
    let s = store();
    assert!(matches!(s.create_topic("   "), Err(StoreError::Validation(_))));
    assert_eq!(s.get_topics().unwrap().len(), 1);
  }

  #[test]
  fn save_topic_upserts_by_id() {
    let s = store();
    let mut t = s.get_topics().unwrap().remove(0);
    t.name = "Photosynthesis II".into();
    s.save_topic(t.clone()).unwrap();
    let topics = s.get_topics().unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].name, "Photosynthesis II");
  }

  #[test]
  fn update_after_quiz_applies_average_interval_and_statuses() {
    let s = store();
    let t = s.create_topic("Mitosis").unwrap();
    let weak_id = t.concepts[1].id.clone();
    let now = Utc::now();

    let updated = s
      .update_topic_after_quiz_at(&t.id, &result(&t.id, 80, &[&weak_id]), now)
      .unwrap()
      .unwrap();
    assert_eq!(updated.memory_score, 80);
    assert_eq!(updated.total_attempts, 1);
    assert_eq!(updated.last_practiced, now);
    // 80 is not above 80
    assert_eq!(updated.next_review_date - updated.last_practiced, Duration::hours(24));
    for c in &updated.concepts {
      let expected = if c.id == weak_id { ConceptStatus::Weak } else { ConceptStatus::Strong };
      assert_eq!(c.status, expected);
    }
    assert_eq!(s.get_topic(&t.id).unwrap(), Some(updated));
  }

  #[test]
  fn memory_score_is_cumulative_average() {
    let s = store();
    // seed: 65 over 3 attempts
    let updated = s.update_topic_after_quiz("topic-1", &result("topic-1", 100, &[])).unwrap().unwrap();
    assert_eq!(updated.memory_score, 74); // (195 + 100) / 4 = 73.75
    assert_eq!(updated.total_attempts, 4);
    assert_eq!(next_memory_score(0, 0, 37), 37);
    assert_eq!(next_memory_score(50, 1, 51), 51); // 50.5 rounds up
  }

  #[test]
  fn interval_buckets() {
    assert_eq!(interval_hours(100), 72);
    assert_eq!(interval_hours(81), 72);
    assert_eq!(interval_hours(80), 24);
    assert_eq!(interval_hours(61), 24);
    assert_eq!(interval_hours(60), 4);
    assert_eq!(interval_hours(0), 4);
  }

  #[test]
  fn update_for_unknown_topic_leaves_store_unchanged() {
    let s = store();
    let before = s.get_topics().unwrap();
    assert!(s.update_topic_after_quiz("nope", &result("nope", 90, &[])).unwrap().is_none());
    assert_eq!(s.get_topics().unwrap(), before);
  }

  #[test]
  fn delete_topic_is_noop_when_absent() {
    let s = store();
    let t = s.create_topic("Mitosis").unwrap();
    assert!(!s.delete_topic("nope").unwrap());
    assert!(s.delete_topic(&t.id).unwrap());
    assert_eq!(s.get_topics().unwrap().len(), 1);
  }

  #[test]
  fn corrupt_blob_fails_loudly_and_reset_recovers() {
    let s = TopicStore::new(MemoryStorage::with_blob("{not json"));
    assert!(matches!(s.get_topics(), Err(StoreError::Corrupt(_))));
    let seeded = s.reset().unwrap();
    assert_eq!(s.get_topics().unwrap(), seeded);
  }
}
