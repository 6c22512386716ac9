use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::UserId;

/// Per-user async mutexes serializing one user's messages.
///
/// Entries are created on first use and kept for the process lifetime, like
/// the rest of the in-memory state.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub async fn lock_user(&self, user: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(user)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_user_waits_other_users_do_not() {
        let locks = Arc::new(UserLocks::default());
        let guard = locks.lock_user(UserId(1)).await;

        // Another user is not blocked.
        let _other = tokio::time::timeout(Duration::from_millis(100), locks.lock_user(UserId(2)))
            .await
            .expect("other user should lock immediately");

        // The same user is.
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), locks.lock_user(UserId(1))).await;
        assert!(blocked.is_err());

        drop(guard);
        let _again = tokio::time::timeout(Duration::from_millis(100), locks.lock_user(UserId(1)))
            .await
            .expect("lock released");
    }
}
