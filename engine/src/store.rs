use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::snapshot::WindowKey;
use crate::state::WindowState;

/// In-memory `WindowState` per key.
///
/// Every key has its own async mutex, so evaluations of different keys never
/// contend while a guard from [`WindowStateStore::lock`] makes a
/// read-fetch-write cycle on one key exclusive, even across `.await` points.
#[derive(Clone, Default)]
pub struct WindowStateStore {
    slots: Arc<RwLock<HashMap<WindowKey, Arc<Mutex<WindowState>>>>>,
}

impl WindowStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-creates resting state for a fixed key set.
    pub fn with_keys(keys: impl IntoIterator<Item = WindowKey>) -> Self {
        let store = Self::new();
        {
            let mut slots = store.slots.write();
            for key in keys {
                slots.entry(key).or_default();
            }
        }
        store
    }

    fn slot(&self, key: &WindowKey) -> Arc<Mutex<WindowState>> {
        if let Some(slot) = self.slots.read().get(key) {
            return slot.clone();
        }
        self.slots.write().entry(key.clone()).or_default().clone()
    }

    /// Exclusive access to one key's state, created at rest if absent.
    pub async fn lock(&self, key: &WindowKey) -> OwnedMutexGuard<WindowState> {
        self.slot(key).lock_owned().await
    }

    /// Copy of the key's current state.
    pub async fn get(&self, key: &WindowKey) -> WindowState {
        self.lock(key).await.clone()
    }

    /// Replaces the key's state. Other keys are untouched.
    pub async fn put(&self, key: &WindowKey, state: WindowState) {
        *self.lock(key).await = state;
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}
