use crate::utils::types::UserId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-user async locks, so events of one user are handled strictly one after
/// another while different users don't wait on each other.
///
/// An entry lives only while some event of that user holds or waits for it.
#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

/// Held while an event of `user` is handled
pub struct UserLockGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    user: UserId,
    locks: &'a UserLocks,
}

impl UserLocks {
    pub fn new() -> Self {
        UserLocks::default()
    }

    pub async fn lock(&self, user: UserId) -> UserLockGuard<'_> {
        // the map shard guard must be released before awaiting
        let lock = self.locks.entry(user).or_default().value().clone();
        UserLockGuard {
            guard: Some(lock.lock_owned().await),
            user,
            locks: self,
        }
    }

    /// Number of users with a live lock entry
    pub fn tracked_users(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // clones are only made under the shard lock, so a count of 1 means
        // nobody else holds or waits for this user's lock
        self.locks
            .locks
            .remove_if(&self.user, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.lock(1).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.tracked_users(), 0);
    }

    #[tokio::test]
    async fn other_users_are_not_blocked() {
        let locks = UserLocks::new();
        let _first = locks.lock(1).await;
        let _second = locks.lock(2).await;
        assert_eq!(locks.tracked_users(), 2);
    }

    #[tokio::test]
    async fn entry_is_kept_while_someone_waits() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.lock(7).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(7).await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(locks.tracked_users(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.tracked_users(), 0);
    }

    #[tokio::test]
    async fn released_entries_are_removed() {
        let locks = UserLocks::new();
        for user in 0..100 {
            let _guard = locks.lock(user).await;
        }
        assert_eq!(locks.tracked_users(), 0);
    }
}
