use crate::{
    entities::{cart, cart_item, Cart, CartItem, CartItemModel, CartModel, Program, User},
    errors::{PriceMismatch, ServiceError},
    events::{Event, EventSender},
    models::{CartLine, CartState},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shopping cart persistence.
///
/// The client's cart is a working copy; this service owns the durable one.
/// Sync is a wholesale replacement: the submitted line set becomes the cart,
/// provided every declared price matches the catalog exactly. Aggregates are
/// recomputed here from the verified lines; the client's declared totals
/// are schema-checked but never stored.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// One submitted cart line
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineInput {
    pub program_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub duration: String,
    pub instructor: String,
    pub image_url: Option<String>,
    pub category: String,
    pub quantity: i32,
}

/// Full cart submission
#[derive(Debug, Deserialize)]
pub struct CartSyncInput {
    pub items: Vec<CartLineInput>,
    pub applied_promo: Option<String>,
}

/// Persisted cart together with its line items
#[derive(Debug, Serialize)]
pub struct CartWithItems {
    pub cart: CartModel,
    pub items: Vec<CartItemModel>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Fetch the user's cart with items; `None` when the user has never
    /// synced a cart.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<Option<CartWithItems>, ServiceError> {
        let Some(cart) = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let items = cart.find_related(CartItem).all(&*self.db).await?;
        Ok(Some(CartWithItems { cart, items }))
    }

    /// Replace the user's entire cart with the submitted line set.
    ///
    /// Every declared unit price is checked against the catalog; if any line
    /// mismatches (or names an unknown program) the whole request is
    /// rejected with the itemized list and nothing is persisted. On success
    /// the delete-and-insert and the aggregate update happen in a single
    /// transaction, so no reader ever observes a half-replaced cart.
    #[instrument(skip(self, input), fields(lines = input.items.len()))]
    pub async fn replace_cart(
        &self,
        user_id: Uuid,
        input: CartSyncInput,
    ) -> Result<CartWithItems, ServiceError> {
        self.check_line_shapes(&input.items)?;

        let verified = self.verify_prices(&input.items).await?;
        let state = CartState::from_lines(verified, input.applied_promo.as_deref());

        let txn = self.db.begin().await?;

        User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        let now = Utc::now();
        let cart_model = match Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
        {
            Some(existing) => existing,
            None => {
                cart::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    total_items: Set(0),
                    total_amount: Set(Decimal::ZERO),
                    applied_promo: Set(None),
                    discount_amount: Set(Decimal::ZERO),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };
        let cart_id = cart_model.id;

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&txn)
            .await?;

        for line in state.lines() {
            cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart_id),
                program_id: Set(line.program_id),
                title: Set(line.title.clone()),
                unit_price: Set(line.unit_price),
                original_price: Set(line.original_price),
                duration: Set(line.duration.clone()),
                instructor: Set(line.instructor.clone()),
                image_url: Set(line.image_url.clone()),
                category: Set(line.category.clone()),
                quantity: Set(line.quantity),
                line_total: Set(line.line_total()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        let mut active: cart::ActiveModel = cart_model.into();
        active.total_items = Set(state.total_items());
        active.total_amount = Set(state.total_amount());
        active.applied_promo = Set(state.applied_promo().map(str::to_string));
        active.discount_amount = Set(state.discount_amount());
        active.updated_at = Set(now);
        let cart = active.update(&txn).await?;

        let items = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .all(&txn)
            .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartReplaced {
                cart_id,
                user_id,
                total_items: cart.total_items,
            })
            .await;

        info!(
            "Replaced cart {} for user {}: {} items, total {}",
            cart_id, user_id, cart.total_items, cart.total_amount
        );
        Ok(CartWithItems { cart, items })
    }

    // Shape checks the derive-based validator cannot express for Decimal.
    fn check_line_shapes(&self, items: &[CartLineInput]) -> Result<(), ServiceError> {
        for item in items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "quantity for program {} must be a positive integer",
                    item.program_id
                )));
            }
            if item.price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "price for program {} must be non-negative",
                    item.program_id
                )));
            }
            if item.original_price.is_some_and(|p| p < Decimal::ZERO) {
                return Err(ServiceError::ValidationError(format!(
                    "original price for program {} must be non-negative",
                    item.program_id
                )));
            }
        }
        Ok(())
    }

    /// Compare every declared price against the catalog. All-or-nothing: one
    /// bad line rejects the entire submission.
    async fn verify_prices(
        &self,
        items: &[CartLineInput],
    ) -> Result<Vec<CartLine>, ServiceError> {
        let ids: Vec<Uuid> = items.iter().map(|i| i.program_id).collect();
        let programs: HashMap<Uuid, Decimal> = Program::find()
            .filter(crate::entities::program::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.price))
            .collect();

        let mut mismatches = Vec::new();
        let mut verified = Vec::new();

        for item in items {
            match programs.get(&item.program_id) {
                Some(authoritative) if *authoritative == item.price => {
                    verified.push(CartLine {
                        program_id: item.program_id,
                        title: item.title.clone(),
                        unit_price: item.price,
                        original_price: item.original_price.unwrap_or(item.price),
                        duration: item.duration.clone(),
                        instructor: item.instructor.clone(),
                        image_url: item.image_url.clone(),
                        category: item.category.clone(),
                        quantity: item.quantity,
                    });
                }
                Some(authoritative) => mismatches.push(PriceMismatch {
                    program_id: item.program_id,
                    submitted: item.price,
                    expected: Some(*authoritative),
                }),
                None => mismatches.push(PriceMismatch {
                    program_id: item.program_id,
                    submitted: item.price,
                    expected: None,
                }),
            }
        }

        if !mismatches.is_empty() {
            return Err(ServiceError::PriceMismatch(mismatches));
        }
        Ok(verified)
    }
}
