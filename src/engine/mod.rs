mod availability;
mod conflict;
mod error;
mod mutations;
mod policy;
mod queries;
mod store;

pub use availability::{merge_overlapping, subtract_intervals};
pub use error::{Entity, Error};
pub use policy::Action;
pub use store::{InMemoryStore, LaboratoryStore, ReservationStore, UserStore};

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::auth::{AuthConfig, CredentialHasher, TokenIssuer};
use crate::lookup::AddressLookup;
use crate::model::LaboratoryId;
use crate::notify::NotificationSender;

/// One advisory-lock key: all writes touching this laboratory on this day
/// serialize on it.
type SlotKey = (LaboratoryId, NaiveDate);

/// Collaborator bundle the engine is wired from.
pub struct Registry {
    pub laboratories: Arc<dyn LaboratoryStore>,
    pub users: Arc<dyn UserStore>,
    pub reservations: Arc<dyn ReservationStore>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub address_lookup: Arc<dyn AddressLookup>,
    pub notifier: Arc<dyn NotificationSender>,
}

/// The booking workflow orchestrator: composes the conflict checker, the
/// authorization policy and the reservation state machine over abstract
/// store collaborators.
pub struct Engine {
    pub(crate) laboratories: Arc<dyn LaboratoryStore>,
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) reservations: Arc<dyn ReservationStore>,
    pub(crate) tokens: Arc<dyn TokenIssuer>,
    pub(crate) hasher: Arc<dyn CredentialHasher>,
    pub(crate) address_lookup: Arc<dyn AddressLookup>,
    pub(crate) notifier: Arc<dyn NotificationSender>,
    pub(crate) auth: AuthConfig,
    /// Advisory locks closing the check-then-write race: the conflict check
    /// and the store write for a given (laboratory, date) happen under the
    /// same guard, so two concurrent overlapping bookings cannot both pass.
    slot_locks: DashMap<SlotKey, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(registry: Registry, auth: AuthConfig) -> Self {
        Self {
            laboratories: registry.laboratories,
            users: registry.users,
            reservations: registry.reservations,
            tokens: registry.tokens,
            hasher: registry.hasher,
            address_lookup: registry.address_lookup,
            notifier: registry.notifier,
            auth,
            slot_locks: DashMap::new(),
        }
    }

    fn slot_lock(&self, key: SlotKey) -> Arc<Mutex<()>> {
        self.slot_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the advisory locks for one or two slot keys. Keys are locked
    /// in sorted order so an update moving a reservation between two
    /// laboratory/day buckets cannot deadlock against another writer.
    pub(crate) async fn lock_slots(
        &self,
        primary: SlotKey,
        secondary: Option<SlotKey>,
    ) -> Vec<OwnedMutexGuard<()>> {
        let mut keys = vec![primary];
        if let Some(key) = secondary
            && key != primary
        {
            keys.push(key);
        }
        keys.sort();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.slot_lock(key).lock_owned().await);
        }
        guards
    }
}
