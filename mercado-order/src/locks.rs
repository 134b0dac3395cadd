use std::collections::HashMap;
use std::sync::{Arc, Mutex as MapMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-order mutual exclusion. The lifecycle manager holds an order's lock for
/// the whole read-current -> decide -> mutate-stock -> persist span, so two
/// concurrent updates on the same order cannot both observe the pre-update
/// state and double-restore stock.
///
/// Locks for different orders are independent. An entry lives only while some
/// task holds or waits on it: the guard evicts the map entry on release once
/// it is the last reference, so the registry does not grow with every order
/// the process has ever touched.
#[derive(Default)]
pub struct OrderLockRegistry {
    locks: Arc<MapMutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

/// Holds the order's lock until dropped.
pub struct OrderLockGuard {
    registry: Arc<MapMutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
    order_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        // Release the mutex first so our own Arc (inside the owned guard) is
        // gone before the count check.
        self.guard.take();

        let mut locks = self.registry.lock().unwrap();
        if let Some(entry) = locks.get(&self.order_id) {
            // Clones are only taken under the map lock, so a count of one
            // means nobody holds or waits on this entry but the map itself.
            if Arc::strong_count(entry) == 1 {
                locks.remove(&self.order_id);
            }
        }
    }
}

impl OrderLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, order_id: Uuid) -> OrderLockGuard {
        let entry = {
            let registry = self.registry();
            let mut locks = registry.lock().unwrap();
            locks
                .entry(order_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = entry.lock_owned().await;
        OrderLockGuard {
            registry: self.registry(),
            order_id,
            guard: Some(guard),
        }
    }

    fn registry(&self) -> Arc<MapMutex<HashMap<Uuid, Arc<Mutex<()>>>>> {
        self.locks.clone()
    }
}
