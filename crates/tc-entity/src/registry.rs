//! Thread-safe keyed storage for live entities.
//!
//! `Registry<K, T>` maps ids to `Shared<T>` handles.  The map itself sits
//! behind an `RwLock`; each entity has its own `Mutex`, so a tick loop
//! refreshing vehicle `a` never blocks a command updating vehicle `b`.
//!
//! Iteration ([`values`][Registry::values], [`entries`][Registry::entries])
//! returns a snapshot taken under the read lock and ordered by key.  The
//! caller may then add or remove entries while walking the snapshot; a
//! removed entity stays alive only as long as the snapshot holds it.
//!
//! Poisoned locks are recovered: a panic in one holder must not take every
//! later reader down with it.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tc_core::{RouteId, StationId, VehicleId};

use crate::{ParkingArea, Route, TrafficLight, Vehicle};

/// A registry-owned entity handle.
pub type Shared<T> = Arc<Mutex<T>>;

/// Lock one entity, recovering from a poisoned mutex.
pub fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Registry ──────────────────────────────────────────────────────────────────

pub struct Registry<K, T> {
    map: RwLock<BTreeMap<K, Shared<T>>>,
}

impl<K: Ord + Clone, T> Default for Registry<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, T> Registry<K, T> {
    pub fn new() -> Self {
        Self { map: RwLock::new(BTreeMap::new()) }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<K, Shared<T>>> {
        self.map.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<K, Shared<T>>> {
        self.map.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or replace.  Returns the new handle.
    pub fn put(&self, key: K, value: T) -> Shared<T> {
        let shared = Arc::new(Mutex::new(value));
        self.write().insert(key, Arc::clone(&shared));
        shared
    }

    /// Insert a batch under a single write lock.
    pub fn put_all(&self, items: impl IntoIterator<Item = (K, T)>) {
        let mut map = self.write();
        for (key, value) in items {
            map.insert(key, Arc::new(Mutex::new(value)));
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<Shared<T>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.read().get(key).cloned()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.read().contains_key(key)
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<Shared<T>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.write().remove(key)
    }

    /// Remove every listed key under a single write lock.  Returns how many
    /// were actually present.
    pub fn remove_all<'a, Q>(&self, keys: impl IntoIterator<Item = &'a Q>) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized + 'a,
    {
        let mut map = self.write();
        keys.into_iter().filter(|k| map.remove(*k).is_some()).count()
    }

    /// Snapshot of all handles, ordered by key.
    pub fn values(&self) -> Vec<Shared<T>> {
        self.read().values().cloned().collect()
    }

    /// Snapshot of all `(key, handle)` pairs, ordered by key.
    pub fn entries(&self) -> Vec<(K, Shared<T>)> {
        self.read().iter().map(|(k, v)| (k.clone(), Arc::clone(v))).collect()
    }

    pub fn ids(&self) -> Vec<K> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Return the entry for `key`, creating it with `create` if absent.
    ///
    /// The write lock is held across `create`, so two racing callers never
    /// both create the same entry.
    pub fn get_or_try_insert_with<Err>(
        &self,
        key:    K,
        create: impl FnOnce() -> Result<T, Err>,
    ) -> Result<Shared<T>, Err> {
        let mut map = self.write();
        if let Some(existing) = map.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let shared = Arc::new(Mutex::new(create()?));
        map.insert(key, Arc::clone(&shared));
        Ok(shared)
    }

    /// Run `f` on the entity under its lock.  `None` if the key is absent.
    pub fn with<Q, R>(&self, key: &Q, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let shared = self.get(key)?;
        let mut guard = lock(&shared);
        Some(f(&mut guard))
    }
}

// ── EntityRegistry ────────────────────────────────────────────────────────────

/// Every live entity, one registry per kind.
///
/// Routes, lights, and stations are bulk-loaded at import time through
/// [`Registry::put_all`].  Lights are keyed by alias (`tl_0`, `tl_1`, ...), not by engine id.
#[derive(Default)]
pub struct EntityRegistry {
    pub vehicles: Registry<VehicleId, Vehicle>,
    pub lights:   Registry<String, TrafficLight>,
    pub routes:   Registry<RouteId, Route>,
    pub stations: Registry<StationId, ParkingArea>,
    admission:    Mutex<()>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialises vehicle admission with arrival reconciliation.
    ///
    /// Hold it from the engine-side insert until the vehicle is registered,
    /// and from the engine step until its arrivals are removed.  Otherwise a
    /// vehicle could arrive before it is registered and stay registered for
    /// good.
    pub fn admission(&self) -> MutexGuard<'_, ()> {
        self.admission.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a vehicle under its own id, replacing any previous entry.
    pub fn add_vehicle(&self, vehicle: Vehicle) -> Shared<Vehicle> {
        self.vehicles.put(vehicle.id().clone(), vehicle)
    }

    pub fn add_vehicles(&self, vehicles: impl IntoIterator<Item = Vehicle>) {
        self.vehicles.put_all(vehicles.into_iter().map(|v| (v.id().clone(), v)));
    }
}
