use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// At most one holder per key; different keys never contend.
#[derive(Default)]
pub struct KeyedLock {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

pub struct KeyedGuard<'a> {
    owner: &'a KeyedLock,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.to_string()).or_default())
        };
        let guard = slot.lock_owned().await;
        KeyedGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on.
    pub fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self
            .owner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map still references the slot: nobody holds or waits on it.
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn same_key_is_serialized() {
        let lock = Arc::new(KeyedLock::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let lock = Arc::clone(&lock);
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let _g = lock.lock("geth").await;
                order.lock().unwrap().push("first:start");
                tokio::time::sleep(Duration::from_secs(1)).await;
                order.lock().unwrap().push("first:end");
            })
        };
        tokio::task::yield_now().await;

        let second = {
            let lock = Arc::clone(&lock);
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let _g = lock.lock("geth").await;
                order.lock().unwrap().push("second");
            })
        };

        first.await.unwrap();
        second.await.unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["first:start", "first:end", "second"]
        );
        assert_eq!(lock.active_keys(), 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let lock = KeyedLock::new();
        let _a = lock.lock("geth").await;
        let _b = lock.lock("lighthouse").await;
        assert_eq!(lock.active_keys(), 2);
    }
}
