use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::application::WarmUp;
use crate::domain::{CacheKey, DomainError};

/// Result of a [`HandleRegistry::warm_up`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmUpOutcome {
    Warmed,
    AlreadyWarm,
    /// The round trip failed. The handle stays registered and usable.
    Failed,
}

struct Slot<H: ?Sized> {
    handle: OnceCell<Arc<H>>,
    warm_lock: Mutex<()>,
    warmed: AtomicBool,
}

impl<H: ?Sized> Slot<H> {
    fn new() -> Self {
        Self {
            handle: OnceCell::new(),
            warm_lock: Mutex::new(()),
            warmed: AtomicBool::new(false),
        }
    }
}

/// Keyed registry of reusable handles.
///
/// Construction and warm-up are serialized per key; different keys never
/// wait on each other. `get_or_create` and `clear` are the only mutation points
/// of the key table.
pub struct HandleRegistry<H: ?Sized> {
    kind: &'static str,
    slots: RwLock<HashMap<CacheKey, Arc<Slot<H>>>>,
}

impl<H: ?Sized + WarmUp> HandleRegistry<H> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &CacheKey) -> Option<Arc<Slot<H>>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn slot_or_insert(&self, key: &CacheKey) -> Arc<Slot<H>> {
        if let Some(slot) = self.slot(key) {
            return slot;
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    /// Returns the handle registered under `key`, constructing it with `create`
    /// on first use. Concurrent callers for the same key share one construction.
    /// A failed construction registers nothing.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: &CacheKey,
        create: F,
    ) -> Result<Arc<H>, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<H>, DomainError>>,
    {
        let slot = self.slot_or_insert(key);

        if let Some(handle) = slot.handle.get() {
            debug!("Reusing cached {} for {}", self.kind, key);
            return Ok(Arc::clone(handle));
        }

        let created = slot
            .handle
            .get_or_try_init(|| async move {
                info!("Creating {} for {}", self.kind, key);
                create().await
            })
            .await;

        match created {
            Ok(handle) => Ok(Arc::clone(handle)),
            Err(e) => {
                self.discard_if_empty(key, &slot);
                Err(e)
            }
        }
    }

    /// Drops `slot` from the table when it is still the registered one, holds
    /// no handle, and no other caller is waiting on it. Slots are only cloned
    /// under the table lock, so the count cannot grow while it is held.
    fn discard_if_empty(&self, key: &CacheKey, slot: &Arc<Slot<H>>) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let registered = slots.get(key).is_some_and(|current| Arc::ptr_eq(current, slot));
        // one reference in the table, one held by this caller
        if registered && !slot.handle.initialized() && Arc::strong_count(slot) == 2 {
            slots.remove(key);
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<H>> {
        self.slot(key)
            .and_then(|slot| slot.handle.get().map(Arc::clone))
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    pub fn is_warmed(&self, key: &CacheKey) -> bool {
        self.slot(key)
            .map(|slot| slot.warmed.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Performs the warm-up round trip for the handle under `key` once.
    pub async fn warm_up(&self, key: &CacheKey) -> Result<WarmUpOutcome, DomainError> {
        let slot = self
            .slot(key)
            .ok_or_else(|| DomainError::not_found(format!("No cached {} for {}", self.kind, key)))?;
        let handle = slot
            .handle
            .get()
            .map(Arc::clone)
            .ok_or_else(|| DomainError::not_found(format!("No cached {} for {}", self.kind, key)))?;

        if slot.warmed.load(Ordering::Acquire) {
            debug!("{} {} already warmed up, skipping", self.kind, key);
            return Ok(WarmUpOutcome::AlreadyWarm);
        }

        let _guard = slot.warm_lock.lock().await;
        if slot.warmed.load(Ordering::Acquire) {
            return Ok(WarmUpOutcome::AlreadyWarm);
        }

        match handle.warm_up().await {
            Ok(()) => {
                slot.warmed.store(true, Ordering::Release);
                info!("{} {} warmed up", self.kind, key);
                Ok(WarmUpOutcome::Warmed)
            }
            Err(e) => {
                warn!("{} {} warm-up failed: {}", self.kind, key, e);
                Ok(WarmUpOutcome::Failed)
            }
        }
    }

    /// Drops every handle and warm-up marker.
    pub fn clear(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let count = slots.len();
        slots.clear();
        debug!("Cleared {} cached {} entries", count, self.kind);
    }

    /// Keys with a constructed handle, sorted.
    pub fn keys(&self) -> Vec<CacheKey> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<CacheKey> = slots
            .iter()
            .filter(|(_, slot)| slot.handle.initialized())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn warmed_keys(&self) -> Vec<CacheKey> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<CacheKey> = slots
            .iter()
            .filter(|(_, slot)| slot.warmed.load(Ordering::Acquire))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
