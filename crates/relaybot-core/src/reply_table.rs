//! Reply resolution: operator-side message ids back to the user they came from.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::{ChatId, MessageId, UserId};

#[derive(Debug, Default)]
struct Maps {
    scoped: HashMap<(ChatId, MessageId), UserId>,
    legacy: HashMap<MessageId, UserId>,
}

/// Maps `(operator session, forwarded message id)` to the originating user.
///
/// Records are never removed; the table lives as long as the process. The
/// unscoped `legacy` index resolves message ids regardless of session and is
/// only maintained when enabled. It is off by default: message ids are
/// numbered per chat, so an unscoped hit can name another session's user.
#[derive(Debug)]
pub struct ReplyTable {
    legacy_fallback: bool,
    maps: RwLock<Maps>,
}

impl Default for ReplyTable {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ReplyTable {
    pub fn new(legacy_fallback: bool) -> Self {
        Self {
            legacy_fallback,
            maps: RwLock::new(Maps::default()),
        }
    }

    pub async fn record(&self, session: ChatId, message_id: MessageId, user: UserId) {
        let mut maps = self.maps.write().await;
        maps.scoped.insert((session, message_id), user);
        if self.legacy_fallback {
            maps.legacy.insert(message_id, user);
        }
    }

    pub async fn resolve(&self, session: ChatId, message_id: MessageId) -> Option<UserId> {
        let maps = self.maps.read().await;
        if let Some(user) = maps.scoped.get(&(session, message_id)) {
            return Some(*user);
        }
        if !self.legacy_fallback {
            return None;
        }
        maps.legacy.get(&message_id).copied()
    }

    /// Number of session-scoped records.
    pub async fn len(&self) -> usize {
        self.maps.read().await.scoped.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.maps.read().await.scoped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn recorded_keys_resolve_and_others_miss() {
        let table = ReplyTable::new(true);
        table.record(ChatId(10), MessageId(1), UserId(100)).await;
        table.record(ChatId(20), MessageId(5), UserId(200)).await;

        assert_eq!(
            table.resolve(ChatId(10), MessageId(1)).await,
            Some(UserId(100))
        );
        assert_eq!(
            table.resolve(ChatId(20), MessageId(5)).await,
            Some(UserId(200))
        );
        assert_eq!(table.resolve(ChatId(10), MessageId(2)).await, None);
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn default_table_never_resolves_across_sessions() {
        let table = ReplyTable::default();
        table.record(ChatId(2), MessageId(4), UserId(500)).await;

        assert_eq!(table.resolve(ChatId(2), MessageId(4)).await, Some(UserId(500)));
        assert_eq!(table.resolve(ChatId(1), MessageId(4)).await, None);
    }

    #[tokio::test]
    async fn scoped_key_wins_over_legacy_index() {
        let table = ReplyTable::new(true);
        // Same message id in two sessions: the legacy index keeps the last one.
        table.record(ChatId(10), MessageId(7), UserId(1)).await;
        table.record(ChatId(20), MessageId(7), UserId(2)).await;

        assert_eq!(table.resolve(ChatId(10), MessageId(7)).await, Some(UserId(1)));
        assert_eq!(table.resolve(ChatId(20), MessageId(7)).await, Some(UserId(2)));
        // Unknown session falls back to the unscoped key.
        assert_eq!(table.resolve(ChatId(30), MessageId(7)).await, Some(UserId(2)));
    }

    #[tokio::test]
    async fn disabled_legacy_fallback_stays_scoped() {
        let table = ReplyTable::new(false);
        table.record(ChatId(10), MessageId(7), UserId(1)).await;

        assert_eq!(table.resolve(ChatId(10), MessageId(7)).await, Some(UserId(1)));
        assert_eq!(table.resolve(ChatId(30), MessageId(7)).await, None);
    }

    #[tokio::test]
    async fn concurrent_inserts_are_all_visible() {
        let table = Arc::new(ReplyTable::default());
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let table = table.clone();
            tasks.spawn(async move {
                table
                    .record(ChatId(i % 4), MessageId(i as i32), UserId(1000 + i))
                    .await;
            });
        }
        while tasks.join_next().await.is_some() {}

        assert_eq!(table.len().await, 32);
        for i in 0..32 {
            assert_eq!(
                table.resolve(ChatId(i % 4), MessageId(i as i32)).await,
                Some(UserId(1000 + i))
            );
        }
    }
}
