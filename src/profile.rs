// src/profile.rs
// User profiles, append-only session log, and per-user search contexts.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::agents::AgentError;
use crate::models::{PreferencesUpdate, SearchContext, SessionRecord, UserPreferences, UserProfile};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: String,
    #[serde(flatten)]
    pub record: SessionRecord,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile, lazily creating a default one for unknown users.
    async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, AgentError>;

    /// Merge-update preferences; unset fields keep their stored value.
    async fn update_preferences(
        &self,
        user_id: &str,
        update: &PreferencesUpdate,
    ) -> Result<UserProfile, AgentError>;

    /// Append one session record; returns its id. Records are never updated
    /// or deleted.
    async fn save_session(&self, record: SessionRecord) -> Result<String, AgentError>;

    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredSession>, AgentError>;

    async fn get_search_context(&self, user_id: &str)
        -> Result<Option<SearchContext>, AgentError>;

    async fn save_search_context(
        &self,
        user_id: &str,
        context: SearchContext,
    ) -> Result<(), AgentError>;
}

#[derive(Default)]
struct ProfileState {
    profiles: HashMap<String, UserProfile>,
    sessions: Vec<StoredSession>,
    contexts: HashMap<String, SearchContext>,
}

/// In-process profile store standing in for the hosted database.
pub struct InMemoryProfileStore {
    state: RwLock<ProfileState>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        info!("Profile store initialized (mock mode)");
        Self {
            state: RwLock::new(ProfileState::default()),
        }
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, AgentError> {
        let mut state = self.state.write().await;
        if let Some(profile) = state.profiles.get(user_id) {
            return Ok(profile.clone());
        }

        info!(user_id, "Creating default user profile");
        let now = Utc::now().to_rfc3339();
        let profile = UserProfile {
            user_id: user_id.to_string(),
            preferences: UserPreferences::default(),
            created_at: now.clone(),
            updated_at: now,
        };
        state.profiles.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    async fn update_preferences(
        &self,
        user_id: &str,
        update: &PreferencesUpdate,
    ) -> Result<UserProfile, AgentError> {
        let mut state = self.state.write().await;
        let now = Utc::now().to_rfc3339();
        let profile = state
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile {
                user_id: user_id.to_string(),
                preferences: UserPreferences::default(),
                created_at: now.clone(),
                updated_at: now.clone(),
            });
        profile.preferences.apply(update);
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn save_session(&self, record: SessionRecord) -> Result<String, AgentError> {
        let mut state = self.state.write().await;
        let id = format!("session_{}", state.sessions.len() + 1);
        state.sessions.push(StoredSession {
            id: id.clone(),
            record,
        });
        Ok(id)
    }

    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredSession>, AgentError> {
        let state = self.state.read().await;
        let mut sessions: Vec<StoredSession> = state
            .sessions
            .iter()
            .filter(|s| s.record.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn get_search_context(
        &self,
        user_id: &str,
    ) -> Result<Option<SearchContext>, AgentError> {
        let state = self.state.read().await;
        Ok(state.contexts.get(user_id).cloned())
    }

    async fn save_search_context(
        &self,
        user_id: &str,
        context: SearchContext,
    ) -> Result<(), AgentError> {
        let mut state = self.state.write().await;
        state.contexts.insert(user_id.to_string(), context);
        Ok(())
    }
}
