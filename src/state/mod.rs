//! Session persistence layer
//!
//! Responsible for storing and loading conversation state between turns.
//! Currently uses in-memory; can be replaced with a shared cache.

use crate::models::SessionState;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// Trait for session persistence
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// State for the session; `Idle` when nothing usable is stored
    async fn load(&self, session_id: Uuid) -> Result<SessionState>;
    async fn save(&self, session_id: Uuid, state: &SessionState) -> Result<()>;
}

/// Decode a stored blob, treating anything unreadable as no active flow
pub fn decode_session(session_id: Uuid, stored: Option<&Value>) -> SessionState {
    let Some(value) = stored else {
        return SessionState::Idle;
    };

    match serde_json::from_value(value.clone()) {
        Ok(state) => state,
        Err(e) => {
            warn!(%session_id, "Discarding malformed session state: {}", e);
            SessionState::Idle
        }
    }
}

/// In-memory session store for development
///
/// Keeps the serialized form so a store backed by cookies or a cache
/// behaves the same on load.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Value>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Overwrite the raw stored value for a session
    pub async fn put_raw(&self, session_id: Uuid, value: Value) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, value);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {

    async fn load(&self, session_id: Uuid) -> Result<SessionState> {
        let sessions = self.sessions.read().await;
        Ok(decode_session(session_id, sessions.get(&session_id)))
    }

    async fn save(&self, session_id: Uuid, state: &SessionState) -> Result<()> {
        let mut sessions = self.sessions.write().await;

        // Idle sessions carry nothing worth keeping
        if state.is_idle() {
            sessions.remove(&session_id);
        } else {
            sessions.insert(session_id, serde_json::to_value(state)?);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoanType, Stage};
    use serde_json::json;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_unknown_session_is_idle() {
        let store = InMemorySessionStore::new();
        let state = assert_ok!(store.load(Uuid::new_v4()).await);
        assert_eq!(state, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemorySessionStore::new();
        let id = Uuid::new_v4();
        let state = SessionState::Collecting {
            loan_type: LoanType::Mortgage,
            stage: Stage::AwaitingAmount {
                income: 90000,
                debts: 5000,
            },
        };

        assert_ok!(store.save(id, &state).await);
        assert_eq!(assert_ok!(store.load(id).await), state);
        assert_eq!(
            assert_ok!(store.load(Uuid::new_v4()).await),
            SessionState::Idle
        );
    }

    #[tokio::test]
    async fn test_saving_idle_clears_entry() {
        let store = InMemorySessionStore::new();
        let id = Uuid::new_v4();

        assert_ok!(store.save(id, &SessionState::start(LoanType::Auto)).await);
        assert_eq!(store.len().await, 1);

        assert_ok!(store.save(id, &SessionState::Idle).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_state_is_idle() {
        let store = InMemorySessionStore::new();
        let cases = vec![
            json!("garbage"),
            json!({"status": "collecting", "loan_type": "boat", "stage": {"stage": "awaiting_income"}}),
            json!({"status": "collecting", "loan_type": "auto"}),
            json!({"status": "collecting", "loan_type": "auto", "stage": {"stage": "awaiting_debts"}}),
            json!({"loan": "personal", "state": "income"}),
        ];

        for value in cases {
            let id = Uuid::new_v4();
            store.put_raw(id, value.clone()).await;
            assert_eq!(
                assert_ok!(store.load(id).await),
                SessionState::Idle,
                "{}",
                value
            );
        }
    }
}
