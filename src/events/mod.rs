use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::entities::{notification, profile};

pub mod stock_feed;

pub use stock_feed::{UnitStatusChange, UnitStatusFeed};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Queues without waiting; a full or closed channel drops the event.
    pub fn send_or_log(&self, event: Event) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "side-effect queue full; dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                warn!(?event, "side-effect worker stopped; dropping event");
            }
        }
    }
}

/// Side effects that run after the request has been answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RentalBooked {
        rental_id: Uuid,
        user_id: String,
        console_id: Uuid,
        category: String,
    },
    RentalStatusChanged {
        rental_id: Uuid,
        user_id: String,
        status: String,
    },
    KycReviewed {
        user_id: String,
        status: String,
    },
}

/// Settings the worker needs from configuration.
#[derive(Debug, Clone, Copy)]
pub struct EventWorkerConfig {
    pub loyalty_points_per_booking: i32,
}

/// Drains the channel until every sender is dropped. Handler failures are logged only.
pub async fn process_events(
    mut rx: mpsc::Receiver<Event>,
    db: Arc<DatabaseConnection>,
    config: EventWorkerConfig,
) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::RentalBooked {
                rental_id,
                user_id,
                console_id,
                category,
            } => {
                info!(%rental_id, %console_id, user_id = %user_id, "processing booking side effects");

                if let Err(e) =
                    credit_booking(&db, &user_id, config.loyalty_points_per_booking).await
                {
                    error!(
                        "Failed to credit loyalty points: user_id={}, error={}",
                        user_id, e
                    );
                }

                let message = format!(
                    "Your {} rental request has been received and is awaiting approval.",
                    category
                );
                if let Err(e) = notify(&db, &user_id, "Booking received", &message).await {
                    error!(
                        "Failed to store booking notification: rental_id={}, error={}",
                        rental_id, e
                    );
                }
            }
            Event::RentalStatusChanged {
                rental_id,
                user_id,
                status,
            } => {
                let message = format!("Your rental {} is now {}.", rental_id, status);
                if let Err(e) = notify(&db, &user_id, "Rental updated", &message).await {
                    error!(
                        "Failed to store rental notification: rental_id={}, error={}",
                        rental_id, e
                    );
                }
            }
            Event::KycReviewed { user_id, status } => {
                let message = format!("Your identity verification status is {}.", status);
                if let Err(e) = notify(&db, &user_id, "Verification update", &message).await {
                    error!(
                        "Failed to store verification notification: user_id={}, error={}",
                        user_id, e
                    );
                }
            }
        }
    }

    warn!("Event processing loop has ended");
}

/// Adds loyalty points and bumps the booking counter in one statement.
async fn credit_booking(
    db: &DatabaseConnection,
    user_id: &str,
    points: i32,
) -> Result<(), sea_orm::DbErr> {
    let result = profile::Entity::update_many()
        .col_expr(profile::Column::Xp, Expr::col(profile::Column::Xp).add(points))
        .col_expr(
            profile::Column::TotalBookings,
            Expr::col(profile::Column::TotalBookings).add(1),
        )
        .col_expr(profile::Column::UpdatedAt, Expr::value(Some(Utc::now())))
        .filter(profile::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!(user_id = %user_id, "no profile to credit loyalty points to");
    }
    Ok(())
}

async fn notify(
    db: &DatabaseConnection,
    user_id: &str,
    title: &str,
    message: &str,
) -> Result<(), sea_orm::DbErr> {
    notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id.to_string()),
        title: Set(title.to_string()),
        message: Set(message.to_string()),
        read: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kyc_event(user_id: &str) -> Event {
        Event::KycReviewed {
            user_id: user_id.into(),
            status: "APPROVED".into(),
        }
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_waiting() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);

        sender.send_or_log(kyc_event("user-1"));
        // returns immediately even though nobody is draining
        sender.send_or_log(kyc_event("user-2"));

        match rx.recv().await {
            Some(Event::KycReviewed { user_id, .. }) => assert_eq!(user_id, "user-1"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_worker_is_tolerated() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        EventSender::new(tx).send_or_log(kyc_event("user-1"));
    }
}
