//! Per-job publish/subscribe fan-out for live status notifications.
//!
//! Subscribers register an unbounded channel sink against one job id.
//! Publication happens under the subscriber-map lock, so every observer of a
//! job sees the same relative event order. Delivery is best-effort: there is
//! no backlog for late subscribers, and a sink whose channel has closed is
//! pruned as a side effect of the failed send.

use crate::types::{Event, EventPayload, EventType};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

struct Subscriber {
    id: Uuid,
    tx: mpsc::UnboundedSender<Event>,
}

/// Multiplexed event bus, one subscriber set per job.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<Uuid, Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live sink for `job_id`. Returns the subscriber id (used to
    /// unsubscribe) and the receiving half of the channel.
    pub fn subscribe(&self, job_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers
            .write()
            .entry(job_id)
            .or_default()
            .push(Subscriber { id, tx });
        tracing::debug!(%job_id, subscriber = %id, "subscriber connected");
        (id, rx)
    }

    /// Remove one sink; the job's subscriber set is dropped entirely once
    /// empty.
    pub fn unsubscribe(&self, job_id: Uuid, subscriber_id: Uuid) {
        let mut map = self.subscribers.write();
        if let Some(subs) = map.get_mut(&job_id) {
            subs.retain(|s| s.id != subscriber_id);
            if subs.is_empty() {
                map.remove(&job_id);
            }
        }
        tracing::debug!(%job_id, subscriber = %subscriber_id, "subscriber disconnected");
    }

    /// Publish an event to every subscriber currently registered for
    /// `job_id`. Sinks that fail to accept the event are unsubscribed.
    pub fn publish(&self, job_id: Uuid, event_type: EventType, payload: EventPayload) {
        let event = Event {
            job_id,
            event_type,
            payload,
            timestamp: Utc::now(),
        };

        let mut map = self.subscribers.write();
        let Some(subs) = map.get_mut(&job_id) else {
            return;
        };

        subs.retain(|s| {
            if s.tx.send(event.clone()).is_ok() {
                true
            } else {
                tracing::debug!(%job_id, subscriber = %s.id, "pruning dead subscriber");
                false
            }
        });
        if subs.is_empty() {
            map.remove(&job_id);
        }
    }

    /// Number of live subscribers for a job.
    pub fn subscriber_count(&self, job_id: Uuid) -> usize {
        self.subscribers
            .read()
            .get(&job_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}
