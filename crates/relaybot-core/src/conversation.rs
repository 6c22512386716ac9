//! Per-user conversation state.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::UserId;

/// Where a user stands in their conversation with the relay.
///
/// `first_confirmation_sent` implies `started`: only `ConversationStore`
/// builds these, and it only sets the flag on started users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversationState {
    started: bool,
    first_confirmation_sent: bool,
}

impl ConversationState {
    pub fn started(&self) -> bool {
        self.started
    }

    pub fn first_confirmation_sent(&self) -> bool {
        self.first_confirmation_sent
    }
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    inner: RwLock<HashMap<UserId, ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or restart) a conversation; the next message is a first message again.
    pub async fn start(&self, user: UserId) {
        self.inner.write().await.insert(
            user,
            ConversationState {
                started: true,
                first_confirmation_sent: false,
            },
        );
    }

    /// Current state, or the zero state for unknown users.
    pub async fn state(&self, user: UserId) -> ConversationState {
        self.inner
            .read()
            .await
            .get(&user)
            .copied()
            .unwrap_or_default()
    }

    pub async fn mark_first_confirmation_sent(&self, user: UserId) {
        if let Some(st) = self.inner.write().await.get_mut(&user) {
            if st.started {
                st.first_confirmation_sent = true;
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_user_reads_zero_state_without_creating_it() {
        let store = ConversationStore::new();
        let st = store.state(UserId(7)).await;
        assert!(!st.started());
        assert!(!st.first_confirmation_sent());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn start_then_mark() {
        let store = ConversationStore::new();
        let u = UserId(1);

        store.start(u).await;
        assert!(store.state(u).await.started());
        assert!(!store.state(u).await.first_confirmation_sent());

        store.mark_first_confirmation_sent(u).await;
        assert!(store.state(u).await.first_confirmation_sent());
    }

    #[tokio::test]
    async fn restart_resets_confirmation_flag() {
        let store = ConversationStore::new();
        let u = UserId(1);

        store.start(u).await;
        store.mark_first_confirmation_sent(u).await;
        store.start(u).await;

        let st = store.state(u).await;
        assert!(st.started());
        assert!(!st.first_confirmation_sent());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn marking_unknown_user_is_a_noop() {
        let store = ConversationStore::new();
        store.mark_first_confirmation_sent(UserId(3)).await;
        assert!(store.is_empty().await);
        assert_eq!(store.state(UserId(3)).await, ConversationState::default());
    }
}
