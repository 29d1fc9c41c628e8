//! In-process event broadcaster
//!
//! A [`Broadcaster`] fans a named event out to every registered subscriber.
//! Subscribers are usually server-sent event streams: each open connection
//! registers an [`Emitter`] under a connection-scoped [`SubscriberId`] and
//! is removed again when the connection goes away.
//!
//! Delivery is best effort. A subscriber that fails to accept an event is
//! logged and skipped; the remaining subscribers still receive it, and
//! [`Broadcaster::broadcast`] reports how many deliveries succeeded.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{debug, info, warn};

use crate::error::{BroadcastError, EmitError};

/// Name of the broadcaster carrying application-wide events
pub const MAIN_CHANNEL: &str = "main";

/// Unique identifier for a subscriber (one per push connection)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SubscriberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receives a pre-serialized event for one subscriber
pub trait Emitter: Send + Sync {
    fn emit(&self, event: &str, data: &str) -> Result<(), EmitError>;
}

impl<F> Emitter for F
where
    F: Fn(&str, &str) -> Result<(), EmitError> + Send + Sync,
{
    fn emit(&self, event: &str, data: &str) -> Result<(), EmitError> {
        self(event, data)
    }
}

/// Payload of a QR badge scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrScan {
    pub student_id: String,
}

/// Events known to the broadcaster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A student badge was scanned at a kiosk
    QrCode(QrScan),
}

impl ServerEvent {
    /// Channel name delivered with the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::QrCode(_) => "qrcode",
        }
    }

    /// JSON body delivered with the event
    pub fn payload(&self) -> Result<String, serde_json::Error> {
        match self {
            ServerEvent::QrCode(scan) => serde_json::to_string(scan),
        }
    }
}

/// Registry of live subscribers for one logical event class
pub struct Broadcaster {
    name: String,
    emitters: DashMap<SubscriberId, Arc<dyn Emitter>>,
}

impl Broadcaster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emitters: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.emitters.len()
    }

    /// Register an emitter under `id`. A later registration with the same id
    /// replaces the earlier one.
    pub fn register(&self, id: SubscriberId, emitter: impl Emitter + 'static) {
        debug!("Registering subscriber {} on {}", id, self.name);
        self.emitters.insert(id, Arc::new(emitter));
    }

    /// Remove the emitter registered under `id`, if any
    pub fn unregister(&self, id: &SubscriberId) {
        if self.emitters.remove(id).is_some() {
            debug!("Unregistered subscriber {} from {}", id, self.name);
        }
    }

    /// Register under a fresh id and return a guard that unregisters on drop
    pub fn subscribe(self: &Arc<Self>, emitter: impl Emitter + 'static) -> Subscription {
        let id = SubscriberId::new();
        self.register(id.clone(), emitter);
        info!("Subscriber {} connected to {}", id, self.name);

        Subscription {
            id,
            broadcaster: Arc::clone(self),
        }
    }

    /// Deliver `event` to every subscriber, returning the number that accepted it
    pub fn broadcast(&self, event: &ServerEvent) -> Result<usize, BroadcastError> {
        let payload = event.payload()?;
        Ok(self.emit_all(event.name(), &payload))
    }

    fn emit_all(&self, event: &str, payload: &str) -> usize {
        // Snapshot so no shard lock is held while emitting
        let targets: Vec<(SubscriberId, Arc<dyn Emitter>)> = self
            .emitters
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut delivered = 0;
        for (id, emitter) in targets {
            match emitter.emit(event, payload) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to deliver {} to subscriber {}: {}", event, id, e),
            }
        }

        debug!(
            "Broadcast {} on {} reached {} subscriber(s)",
            event, self.name, delivered
        );
        delivered
    }
}

/// Registration that lives as long as one push connection
pub struct Subscription {
    id: SubscriberId,
    broadcaster: Arc<Broadcaster>,
}

impl Subscription {
    pub fn id(&self) -> &SubscriberId {
        &self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unregister(&self.id);
        info!(
            "Subscriber {} disconnected from {}",
            self.id,
            self.broadcaster.name()
        );
    }
}
