// =============================================================================
// StudyQuest Engine - Per-Account Serialization
// =============================================================================
// Every mutating engine operation is a multi-step read-modify-write; two
// concurrent calls for the same account must not interleave. One async
// mutex per account id serializes them while distinct accounts proceed
// concurrently.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

/// Registry of per-account async mutexes.
#[derive(Default)]
pub struct AccountLocks {
    inner: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for an account, creating it on first touch. The returned
    /// handle is awaited outside the registry mutex.
    pub fn lock_for(&self, account_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().expect("lock registry poisoned");
        map.entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_account_serializes() {
        let locks = Arc::new(AccountLocks::new());
        let counter = Arc::new(StdMutex::new(0i64));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let lock = locks.lock_for("a1");
                let _guard = lock.lock().await;
                // Read-modify-write with a yield in the middle; only the
                // lock keeps this from losing updates
                let read = *counter.lock().unwrap();
                tokio::task::yield_now().await;
                *counter.lock().unwrap() = read + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*counter.lock().unwrap(), 8);
    }

    #[tokio::test]
    async fn test_distinct_accounts_use_distinct_locks() {
        let locks = AccountLocks::new();
        let a = locks.lock_for("a1");
        let b = locks.lock_for("a2");

        // Holding a1 must not block a2
        let _guard_a = a.lock().await;
        let guard_b = b.try_lock();
        assert!(guard_b.is_ok());

        // Same account returns the same underlying mutex
        let a_again = locks.lock_for("a1");
        assert!(a_again.try_lock().is_err());
    }
}
