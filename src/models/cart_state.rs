use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Codes the storefront accepts. Each grants the same flat discount on the
/// cart total. Unknown codes are ignored without surfacing an error.
pub const PROMO_CODES: &[&str] = &["FITNESS10", "SAVE10", "WELCOME10"];

const PROMO_DISCOUNT_RATE: Decimal = dec!(0.10);

/// One line of a cart: a program plus the quantity selected.
///
/// `unit_price` is the price actually charged; `original_price` is the
/// display-only list price and defaults to `unit_price` when not supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub program_id: Uuid,
    pub title: String,
    pub unit_price: Decimal,
    pub original_price: Decimal,
    pub duration: String,
    pub instructor: String,
    pub image_url: Option<String>,
    pub category: String,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// In-memory cart aggregate.
///
/// Every mutating operation recomputes the derived totals before returning,
/// so `total_items` and `total_amount` are always equal to the fold over
/// `lines` and `discount_amount` to the promo rule applied to `total_amount`.
/// Operations are infallible; the only fallible cart work is persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    lines: Vec<CartLine>,
    total_items: i32,
    total_amount: Decimal,
    applied_promo: Option<String>,
    discount_amount: Decimal,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from raw lines, merging duplicate program ids by
    /// summing quantities and dropping non-positive quantities, then apply
    /// the promo (if recognized).
    pub fn from_lines<I>(lines: I, promo: Option<&str>) -> Self
    where
        I: IntoIterator<Item = CartLine>,
    {
        let mut state = Self::new();
        for line in lines {
            if line.quantity <= 0 {
                continue;
            }
            match state
                .lines
                .iter_mut()
                .find(|l| l.program_id == line.program_id)
            {
                Some(existing) => existing.quantity += line.quantity,
                None => state.lines.push(line),
            }
        }
        state.recompute();
        if let Some(code) = promo {
            state.apply_promo(code);
        }
        state
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_items(&self) -> i32 {
        self.total_items
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn applied_promo(&self) -> Option<&str> {
        self.applied_promo.as_deref()
    }

    pub fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    /// Amount actually charged at checkout.
    pub fn payable_amount(&self) -> Decimal {
        self.total_amount - self.discount_amount
    }

    /// Add a program to the cart. An already-present program id increments
    /// its quantity by one; a new one is appended with quantity 1.
    pub fn add_item(&mut self, item: CartLine) {
        match self
            .lines
            .iter_mut()
            .find(|l| l.program_id == item.program_id)
        {
            Some(existing) => existing.quantity += 1,
            None => self.lines.push(CartLine {
                quantity: 1,
                ..item
            }),
        }
        self.recompute();
    }

    pub fn remove_item(&mut self, program_id: Uuid) {
        self.lines.retain(|l| l.program_id != program_id);
        self.recompute();
    }

    /// Set a line's quantity. Zero or negative removes the line entirely;
    /// a stored quantity is never ≤ 0.
    pub fn set_quantity(&mut self, program_id: Uuid, quantity: i32) {
        if quantity <= 0 {
            self.remove_item(program_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.program_id == program_id) {
            line.quantity = quantity;
        }
        self.recompute();
    }

    /// Reset items, totals, and promo state.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.applied_promo = None;
        self.recompute();
    }

    /// Apply a promo code. The code is uppercase-normalized; codes outside
    /// the allow-list leave the state untouched.
    pub fn apply_promo(&mut self, code: &str) {
        let normalized = code.trim().to_uppercase();
        if PROMO_CODES.contains(&normalized.as_str()) {
            self.applied_promo = Some(normalized);
            self.recompute();
        }
    }

    pub fn remove_promo(&mut self) {
        self.applied_promo = None;
        self.recompute();
    }

    // Invariant: rerun after every structural mutation.
    fn recompute(&mut self) {
        self.total_items = self.lines.iter().map(|l| l.quantity).sum();
        self.total_amount = self.lines.iter().map(CartLine::line_total).sum();
        self.discount_amount = if self.applied_promo.is_some() {
            self.total_amount * PROMO_DISCOUNT_RATE
        } else {
            Decimal::ZERO
        };
    }
}
