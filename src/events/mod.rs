use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events emitted by the services. Delivery is best-effort; handlers only
/// observe, they never participate in the emitting transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Account events
    UserRegistered(Uuid),
    UserLoggedIn(Uuid),

    // Catalog events
    ProgramCreated(Uuid),
    ProgramUpdated(Uuid),
    ProgramDeleted(Uuid),

    // Cart events
    CartReplaced {
        cart_id: Uuid,
        user_id: Uuid,
        total_items: i32,
    },
    CartCleared(Uuid),

    // Checkout events
    PaymentOrderCreated {
        user_id: Uuid,
        provider_order_id: String,
        amount: Decimal,
    },
    PaymentVerified {
        payment_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
    },
    PaymentRejected {
        user_id: Uuid,
        reason: String,
    },
    ProgramsGranted {
        user_id: Uuid,
        payment_id: Uuid,
        count: usize,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event and logs instead of failing when the channel is down.
    /// Domain writes never abort because the event loop is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

/// Drain the event channel, logging each event. The loop runs for the life
/// of the process and exits when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::UserRegistered(user_id) => {
                info!("User registered: {}", user_id);
            }
            Event::UserLoggedIn(user_id) => {
                info!("User logged in: {}", user_id);
            }
            Event::ProgramCreated(id) | Event::ProgramUpdated(id) => {
                info!("Catalog change for program: {}", id);
            }
            Event::ProgramDeleted(id) => {
                info!("Program deleted: {}", id);
            }
            Event::CartReplaced {
                cart_id,
                user_id,
                total_items,
            } => {
                info!(
                    "Cart {} replaced for user {} ({} items)",
                    cart_id, user_id, total_items
                );
            }
            Event::CartCleared(cart_id) => {
                info!("Cart cleared: {}", cart_id);
            }
            Event::PaymentOrderCreated {
                user_id,
                provider_order_id,
                amount,
            } => {
                info!(
                    "Payment order {} created for user {} (amount {})",
                    provider_order_id, user_id, amount
                );
            }
            Event::PaymentVerified {
                payment_id,
                user_id,
                amount,
            } => {
                info!(
                    "Payment {} verified for user {} (amount {})",
                    payment_id, user_id, amount
                );
            }
            Event::PaymentRejected { user_id, reason } => {
                warn!("Payment rejected for user {}: {}", user_id, reason);
            }
            Event::ProgramsGranted {
                user_id,
                payment_id,
                count,
            } => {
                info!(
                    "Granted {} programs to user {} from payment {}",
                    count, user_id, payment_id
                );
            }
            Event::Generic { message, .. } => {
                info!("Event: {}", message);
            }
        }
    }

    info!("Event processing loop stopped");
}
