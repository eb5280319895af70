//! Application state: the topic store and the authored quiz bank.
//!
//! The store sits behind a single lock; every read-modify-write of the blob
//! happens under the write guard, which keeps the one-writer assumption true
//! even with concurrent requests.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::load_app_config_from_env;
use crate::quiz::QuizBank;
use crate::seeds::builtin_quizzes;
use crate::storage::FileStorage;
use crate::store::TopicStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<TopicStore>>,
    pub bank: Arc<QuizBank>,
}

impl AppState {
    /// Build state from env: load config, merge authored quizzes, open the file store.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_app_config_from_env().unwrap_or_default();

        // Built-ins first so config entries can replace them by key.
        let bank = QuizBank::new(builtin_quizzes().into_iter().chain(cfg.quizzes.clone()));
        info!(target: "quiz", authored = bank.len(), "Quiz bank ready");

        let storage = FileStorage::new(cfg.resolved_data_path());
        info!(target: "topic_store", path = %storage.path().display(), "Using file storage");

        Self::with_store(TopicStore::new(storage), bank)
    }

    pub fn with_store(store: TopicStore, bank: QuizBank) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            bank: Arc::new(bank),
        }
    }
}
