use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::entities::console::{self, ConsoleStatus};

/// A single unit changing status.
#[derive(Debug, Clone, Serialize)]
pub struct UnitStatusChange {
    pub console_id: Uuid,
    pub unit_id: String,
    pub category: String,
    pub status: ConsoleStatus,
    pub changed_at: DateTime<Utc>,
}

impl From<&console::Model> for UnitStatusChange {
    fn from(unit: &console::Model) -> Self {
        Self {
            console_id: unit.id,
            unit_id: unit.unit_id.clone(),
            category: unit.category.clone(),
            status: unit.status,
            changed_at: Utc::now(),
        }
    }
}

/// Process-wide fan-out of unit status changes.
///
/// Each subscriber owns its receiver; dropping it ends the subscription.
/// Slow subscribers lag and skip rather than block publishers.
#[derive(Debug, Clone)]
pub struct UnitStatusFeed {
    sender: broadcast::Sender<UnitStatusChange>,
}

impl UnitStatusFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, change: UnitStatusChange) {
        // Err only means nobody is listening.
        if self.sender.send(change).is_err() {
            debug!("no stock feed subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UnitStatusChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(status: ConsoleStatus) -> UnitStatusChange {
        UnitStatusChange {
            console_id: Uuid::new_v4(),
            unit_id: "PS5-001".into(),
            category: "PS5".into(),
            status,
            changed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_changes() {
        let feed = UnitStatusFeed::new(8);
        let mut rx = feed.subscribe();
        feed.publish(change(ConsoleStatus::Rented));
        let got = rx.recv().await.unwrap();
        assert_eq!(got.status, ConsoleStatus::Rented);
    }

    #[test]
    fn dropping_receiver_ends_subscription() {
        let feed = UnitStatusFeed::new(8);
        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        drop(rx);
        assert_eq!(feed.subscriber_count(), 0);
        feed.publish(change(ConsoleStatus::Active));
    }
}
