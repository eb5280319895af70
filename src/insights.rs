//! Read-only views over the topic list for the dashboard: due, recent, search, stats.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Topic;

/// How many topics the "recent" strip shows by default.
pub const RECENT_DEFAULT: usize = 4;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Average,
    Weak,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            ScoreBand::Strong
        } else if score >= 60 {
            ScoreBand::Average
        } else {
            ScoreBand::Weak
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_topics: usize,
    pub average_memory: u8,
    pub due_count: usize,
    pub total_attempts: u64,
}

impl Stats {
    pub fn from_topics(topics: &[Topic], now: DateTime<Utc>) -> Self {
        let total_memory: u64 = topics.iter().map(|t| u64::from(t.memory_score)).sum();
        let average_memory = if topics.is_empty() {
            0
        } else {
            (total_memory as f64 / topics.len() as f64).round() as u8
        };
        Self {
            total_topics: topics.len(),
            average_memory,
            due_count: topics.iter().filter(|t| t.is_due(now)).count(),
            total_attempts: topics.iter().map(|t| u64::from(t.total_attempts)).sum(),
        }
    }
}

/// Topics whose review date has been reached, in stored order.
pub fn due_topics(topics: &[Topic], now: DateTime<Utc>) -> Vec<Topic> {
    topics.iter().filter(|t| t.is_due(now)).cloned().collect()
}

/// Most recently practiced first.
pub fn recent_topics(topics: &[Topic], limit: usize) -> Vec<Topic> {
    let mut sorted = topics.to_vec();
    sorted.sort_by(|a, b| b.last_practiced.cmp(&a.last_practiced));
    sorted.truncate(limit);
    sorted
}

/// Case-insensitive substring match on the name. An empty query matches everything.
pub fn search(topics: &[Topic], query: &str) -> Vec<Topic> {
    let needle = query.trim().to_lowercase();
    topics
        .iter()
        .filter(|t| t.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn topic(name: &str, score: u8, attempts: u32, practiced_h_ago: i64, due_in_h: i64, now: DateTime<Utc>) -> Topic {
        Topic {
            id: name.to_lowercase(),
            name: name.into(),
            concepts: vec![],
            memory_score: score,
            last_practiced: now - Duration::hours(practiced_h_ago),
            next_review_date: now + Duration::hours(due_in_h),
            total_attempts: attempts,
        }
    }

    fn sample(now: DateTime<Utc>) -> Vec<Topic> {
        vec![
            topic("Photosynthesis", 65, 3, 48, -2, now),
            topic("Mitosis", 80, 1, 1, 24, now),
            topic("Newton's Laws", 90, 2, 5, 0, now),
        ]
    }

    #[test]
    fn due_includes_review_date_equal_to_now() {
        let now = Utc::now();
        let due: Vec<_> = due_topics(&sample(now), now).into_iter().map(|t| t.name).collect();
        assert_eq!(due, ["Photosynthesis", "Newton's Laws"]);
    }

    #[test]
    fn recent_sorts_descending_and_truncates() {
        let now = Utc::now();
        let recent: Vec<_> = recent_topics(&sample(now), 2).into_iter().map(|t| t.name).collect();
        assert_eq!(recent, ["Mitosis", "Newton's Laws"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let now = Utc::now();
        assert_eq!(search(&sample(now), "SYN").len(), 1);
        assert_eq!(search(&sample(now), "").len(), 3);
    }

    #[test]
    fn stats_round_average_and_handle_empty() {
        let now = Utc::now();
        let stats = Stats::from_topics(&sample(now), now);
        assert_eq!(stats.total_topics, 3);
        assert_eq!(stats.average_memory, 78); // 235 / 3 = 78.3
        assert_eq!(stats.due_count, 2);
        assert_eq!(stats.total_attempts, 6);
        assert_eq!(Stats::from_topics(&[], now).average_memory, 0);
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::from_score(80), ScoreBand::Strong);
        assert_eq!(ScoreBand::from_score(79), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(60), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(59), ScoreBand::Weak);
    }
}
