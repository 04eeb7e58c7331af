use crate::{
    entities::{cart, cart_item, payment, purchased_program, Cart, CartItem, Payment},
    errors::ServiceError,
    events::{Event, EventSender},
    services::razorpay::RazorpayClient,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Checkout flow: provider order creation and payment verification.
///
/// Verification is the trust boundary. A callback is accepted only when its
/// HMAC signature matches, and acceptance atomically records the payment,
/// grants one purchase per cart line, and empties the cart. The unique
/// (order_id, payment_id) index makes redelivered callbacks a no-op success
/// instead of a second grant.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    razorpay: Arc<RazorpayClient>,
    currency: String,
}

/// Provider order handed back to the client for the hosted widget
#[derive(Debug, Serialize)]
pub struct PaymentOrder {
    pub order_id: String,
    /// Minor currency units, as the provider expects
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

/// Callback fields forwarded by the client after the hosted checkout
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentInput {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Result of a verification attempt that did not fail
#[derive(Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Payment recorded and purchases granted
    Verified { payment_id: Uuid, granted: usize },
    /// This (order, payment) pair was already processed; nothing changed
    AlreadyProcessed,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        razorpay: Arc<RazorpayClient>,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            razorpay,
            currency,
        }
    }

    /// Create a provider order for the user's current cart total.
    ///
    /// The amount comes from the server-side cart, not the request: the
    /// client is expected to sync before checking out, and whatever is
    /// persisted here is what gets charged.
    #[instrument(skip(self))]
    pub async fn create_payment_order(&self, user_id: Uuid) -> Result<PaymentOrder, ServiceError> {
        let cart = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InvalidOperation("Cart is empty".to_string()))?;

        if cart.total_items == 0 {
            return Err(ServiceError::InvalidOperation("Cart is empty".to_string()));
        }

        let payable = cart.total_amount - cart.discount_amount;
        let receipt = format!("cart-{}", cart.id);
        let order = self
            .razorpay
            .create_order(payable, &self.currency, &receipt)
            .await?;

        self.event_sender
            .send_or_log(Event::PaymentOrderCreated {
                user_id,
                provider_order_id: order.id.clone(),
                amount: payable,
            })
            .await;

        Ok(PaymentOrder {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key_id: self.razorpay.key_id().to_string(),
        })
    }

    /// Verify a payment callback and, on success, persist its effects.
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn verify_payment(
        &self,
        user_id: Uuid,
        input: VerifyPaymentInput,
    ) -> Result<VerificationOutcome, ServiceError> {
        if !self.razorpay.verify_checkout_signature(
            &input.order_id,
            &input.payment_id,
            &input.signature,
        ) {
            warn!("Signature mismatch for order {}", input.order_id);
            self.event_sender
                .send_or_log(Event::PaymentRejected {
                    user_id,
                    reason: "signature mismatch".to_string(),
                })
                .await;
            return Err(ServiceError::PaymentFailed(
                "Payment signature verification failed".to_string(),
            ));
        }

        // A redelivered callback must not double-grant.
        let already = Payment::find()
            .filter(payment::Column::OrderId.eq(input.order_id.clone()))
            .filter(payment::Column::PaymentId.eq(input.payment_id.clone()))
            .one(&*self.db)
            .await?;
        if already.is_some() {
            info!(
                "Payment callback for order {} already processed",
                input.order_id
            );
            return Ok(VerificationOutcome::AlreadyProcessed);
        }

        let cart = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::PaymentFailed(
                    "Cannot reconcile a payment to an empty cart".to_string(),
                )
            })?;

        let items = cart.find_related(CartItem).all(&*self.db).await?;
        if items.is_empty() {
            return Err(ServiceError::PaymentFailed(
                "Cannot reconcile a payment to an empty cart".to_string(),
            ));
        }

        let charged = cart.total_amount - cart.discount_amount;
        let now = Utc::now();
        let payment_id = Uuid::new_v4();
        let granted = items.len();

        // Payment record, grants, and cart reset commit or roll back as one.
        let txn = self.db.begin().await?;

        let inserted = payment::ActiveModel {
            id: Set(payment_id),
            user_id: Set(user_id),
            order_id: Set(input.order_id.clone()),
            payment_id: Set(input.payment_id.clone()),
            signature: Set(input.signature.clone()),
            amount: Set(charged),
            created_at: Set(now),
        }
        .insert(&txn)
        .await;

        if let Err(err) = inserted {
            // Two callbacks racing past the pre-check: the unique index
            // decides, and the loser reports already-processed.
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                info!(
                    "Concurrent duplicate callback for order {}",
                    input.order_id
                );
                return Ok(VerificationOutcome::AlreadyProcessed);
            }
            return Err(err.into());
        }

        for item in &items {
            purchased_program::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                program_id: Set(item.program_id),
                payment_id: Set(payment_id),
                granted_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        let cart_id = cart.id;
        let mut active: cart::ActiveModel = cart.into();
        active.total_items = Set(0);
        active.total_amount = Set(Decimal::ZERO);
        active.applied_promo = Set(None);
        active.discount_amount = Set(Decimal::ZERO);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentVerified {
                payment_id,
                user_id,
                amount: charged,
            })
            .await;
        self.event_sender
            .send_or_log(Event::ProgramsGranted {
                user_id,
                payment_id,
                count: granted,
            })
            .await;
        self.event_sender.send_or_log(Event::CartCleared(cart_id)).await;

        info!(
            "Payment {} verified for user {}: {} programs granted",
            payment_id, user_id, granted
        );
        Ok(VerificationOutcome::Verified {
            payment_id,
            granted,
        })
    }
}
