//! # Abonnements GENA
//!
//! Cycle de vie : `SUBSCRIBE` crée un abonnement actif, `SUBSCRIBE` avec SID
//! le renouvelle, `UNSUBSCRIBE` ou l'expiration le détruisent.
//!
//! Le [`SubscriptionManager`] est partagé par tous les services d'un device :
//! il alloue les SID (compteur atomique, jamais réutilisé), borne les durées
//! et ouvre la file de livraison de chaque abonnement. Chaque service garde
//! ses propres abonnements dans un [`SubscriptionSet`].

mod errors;
mod headers;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc::{self, Sender, error::TrySendError};
use tracing::{debug, warn};
use url::Url;

use crate::events::{EventTransport, Notification, spawn_delivery_worker};

pub use errors::SubscriptionError;
pub use headers::{GenaRequest, parse_callback, parse_sid, parse_timeout};

pub const DEFAULT_SUBSCRIPTION_TIMEOUT: u64 = 3600;
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_millis(5000);
/// Notifications en attente par abonné
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Abonnement actif d'un point de contrôle à un service
#[derive(Debug)]
pub struct Subscription {
    id: String,
    service: String,
    callback: Url,
    sequence: u32,
    expires_at: DateTime<Utc>,
    sender: Sender<Notification>,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn callback(&self) -> &Url {
        &self.callback
    }

    /// SEQ de la prochaine notification
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Met une notification en file et consomme un numéro de séquence,
    /// que la livraison aboutisse ou non.
    ///
    /// File pleine : la notification est abandonnée. Après `u32::MAX` la
    /// séquence repart à 1, 0 étant réservé à l'évènement initial.
    pub fn enqueue(&mut self, body: Arc<str>) -> u32 {
        let seq = self.sequence;
        let notification = Notification {
            sid: self.id.clone(),
            seq,
            callback: self.callback.clone(),
            body,
        };

        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("⚠️ Delivery queue full for {}, dropping SEQ {}", self.id, seq)
            }
            Err(TrySendError::Closed(_)) => warn!("❌ Delivery queue closed for {}", self.id),
        }
        self.sequence = self.sequence.checked_add(1).unwrap_or(1);
        seq
    }
}

/// Allocation des SID et ouverture des files de livraison, partagée par
/// les services d'un device.
pub struct SubscriptionManager {
    device_id: String,
    counter: AtomicU64,
    max_timeout: u64,
    notify_timeout: Duration,
    queue_capacity: usize,
    transport: Arc<dyn EventTransport>,
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("device_id", &self.device_id)
            .field("counter", &self.counter)
            .field("max_timeout", &self.max_timeout)
            .field("notify_timeout", &self.notify_timeout)
            .field("queue_capacity", &self.queue_capacity)
            .finish_non_exhaustive()
    }
}

impl SubscriptionManager {
    pub fn new(device_id: impl Into<String>, transport: Arc<dyn EventTransport>) -> Self {
        Self {
            device_id: device_id.into(),
            counter: AtomicU64::new(0),
            max_timeout: DEFAULT_SUBSCRIPTION_TIMEOUT,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            transport,
        }
    }

    /// Durée maximale (et par défaut) d'un abonnement, en secondes.
    pub fn with_max_timeout(mut self, secs: u64) -> Self {
        self.max_timeout = secs.max(1);
        self
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn max_timeout(&self) -> u64 {
        self.max_timeout
    }

    /// Prochain SID : `{device_id}_sub{compteur sur 10 chiffres}`.
    pub fn next_sid(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}_sub{:010}", self.device_id, n)
    }

    /// Durée accordée : la demande bornée au maximum configuré ; absente ou
    /// infinie, le maximum.
    pub fn grant_timeout(&self, requested: Option<u64>) -> u64 {
        requested
            .filter(|&secs| secs > 0)
            .map_or(self.max_timeout, |secs| secs.min(self.max_timeout))
    }

    /// Crée un abonnement et démarre sa tâche de livraison.
    ///
    /// Doit être appelé depuis un runtime tokio.
    pub fn open(
        &self,
        service: &str,
        callback: Url,
        granted: u64,
        now: DateTime<Utc>,
    ) -> Subscription {
        let (sender, rx) = mpsc::channel(self.queue_capacity);
        spawn_delivery_worker(self.transport.clone(), self.notify_timeout, rx);

        let id = self.next_sid();
        debug!("📡 New subscription {} on {} -> {}", id, service, callback);

        Subscription {
            id,
            service: service.to_string(),
            callback,
            sequence: 0,
            expires_at: expiry(now, granted),
            sender,
        }
    }
}

fn expiry(now: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
    TimeDelta::try_seconds(secs)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Abonnements d'un service, indexés par SID (ordre de création).
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: BTreeMap<String, Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subscription: Subscription) -> &mut Subscription {
        let id = subscription.id.clone();
        self.subscriptions.entry(id).or_insert(subscription)
    }

    /// Repousse l'expiration ; la séquence est conservée.
    pub fn renew(
        &mut self,
        sid: &str,
        granted: u64,
        now: DateTime<Utc>,
    ) -> Result<&Subscription, SubscriptionError> {
        self.sweep_expired(now);
        let subscription = self
            .subscriptions
            .get_mut(sid)
            .ok_or_else(|| SubscriptionError::NoSuchSubscription(sid.to_string()))?;
        subscription.expires_at = expiry(now, granted);
        Ok(subscription)
    }

    /// Retire l'abonnement ; les notifications déjà en file partent quand même.
    pub fn remove(&mut self, sid: &str) -> Result<Subscription, SubscriptionError> {
        self.subscriptions
            .remove(sid)
            .ok_or_else(|| SubscriptionError::NoSuchSubscription(sid.to_string()))
    }

    /// Supprime les abonnements expirés et retourne leur nombre.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sid, s| {
            let keep = !s.is_expired(now);
            if !keep {
                debug!("♻️ Subscription {} expired", sid);
            }
            keep
        });
        before - self.subscriptions.len()
    }

    pub fn get(&self, sid: &str) -> Option<&Subscription> {
        self.subscriptions.get(sid)
    }

    /// Abonnements non expirés à `now`
    pub fn live_mut(&mut self, now: DateTime<Utc>) -> impl Iterator<Item = &mut Subscription> {
        self.subscriptions
            .values_mut()
            .filter(move |s| !s.is_expired(now))
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
