//! Order records and their read-side projections.
//!
//! [`NewOrder`] is what a source hands to the engine; [`Order`] is the stored
//! record the allocator and state machine mutate; [`OrderSummary`] is what a
//! caller sees in their queue.

use crate::disposition::Disposition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of purchase the order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Cash-on-delivery order awaiting confirmation
    #[default]
    CashOnDelivery,
    /// Checkout abandoned before payment
    AbandonedCart,
}

/// Customer contact details used by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// One purchased product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    /// Unit price in minor currency units (e.g. cents, paise)
    pub unit_price: u64,
}

/// Canonical order record delivered by a source.
///
/// Storefront-specific field mapping happens before this point; the engine
/// only sees the normalized shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Globally unique order identifier
    pub order_id: String,
    /// Identifier of the store the order came from
    pub source_id: String,
    #[serde(default)]
    pub kind: OrderKind,
    pub customer: CustomerContact,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Order total in minor currency units
    pub total: u64,
    #[serde(default)]
    pub currency: Option<String>,
    /// When the customer placed the order on the storefront
    #[serde(default)]
    pub placed_at: Option<DateTime<Utc>>,
}

/// A stored order.
///
/// Assignment fields (`assigned_caller`, `assigned_at`, `previous_caller`,
/// `follow_up_at`) are only written by the allocator and the engine through a
/// versioned commit; `version` increases by one with every committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub source_id: String,
    pub kind: OrderKind,
    pub customer: CustomerContact,
    pub line_items: Vec<LineItem>,
    pub total: u64,
    pub currency: Option<String>,
    pub placed_at: Option<DateTime<Utc>>,
    pub disposition: Disposition,
    pub assigned_caller: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    /// Caller most recently released from this order
    pub previous_caller: Option<String>,
    /// When a PENDING_ACTION order becomes due for reassignment
    pub follow_up_at: Option<DateTime<Utc>>,
    /// Accepted disposition updates so far
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl Order {
    /// Create a fresh, unassigned order in NEW.
    pub fn from_new(order: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id: order.order_id,
            source_id: order.source_id,
            kind: order.kind,
            customer: order.customer,
            line_items: order.line_items,
            total: order.total,
            currency: order.currency,
            placed_at: order.placed_at,
            disposition: Disposition::New,
            assigned_caller: None,
            assigned_at: None,
            previous_caller: None,
            follow_up_at: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
            closed_at: None,
            version: 0,
        }
    }

    /// Whether the storefront-provided fields differ from `incoming`.
    pub fn content_differs(&self, incoming: &NewOrder) -> bool {
        self.source_id != incoming.source_id
            || self.kind != incoming.kind
            || self.customer != incoming.customer
            || self.line_items != incoming.line_items
            || self.total != incoming.total
            || self.currency != incoming.currency
            || self.placed_at != incoming.placed_at
    }

    /// Overwrite the storefront-provided fields from a re-delivered order.
    pub fn refresh_content(&mut self, incoming: NewOrder) {
        self.source_id = incoming.source_id;
        self.kind = incoming.kind;
        self.customer = incoming.customer;
        self.line_items = incoming.line_items;
        self.total = incoming.total;
        self.currency = incoming.currency;
        self.placed_at = incoming.placed_at;
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    /// Total number of units across all line items.
    pub fn total_quantity(&self) -> u32 {
        self.line_items.iter().map(|item| item.quantity).sum()
    }

    /// Short product description for queue display.
    pub fn product_description(&self) -> String {
        match self.line_items.as_slice() {
            [] => String::new(),
            [only] => only.name.clone(),
            [first, rest @ ..] => format!("{} (+{} more)", first.name, rest.len()),
        }
    }
}

/// Queue entry as shown to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub source_id: String,
    pub customer_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub product: String,
    pub quantity: u32,
    pub total: u64,
    pub currency: Option<String>,
    pub attempts: u32,
    pub disposition: Disposition,
    pub assigned_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            source_id: order.source_id.clone(),
            customer_name: order.customer.name.clone(),
            phone: order.customer.phone.clone(),
            address: order.customer.address.clone(),
            postal_code: order.customer.postal_code.clone(),
            product: order.product_description(),
            quantity: order.total_quantity(),
            total: order.total,
            currency: order.currency.clone(),
            attempts: order.attempts,
            disposition: order.disposition,
            assigned_at: order.assigned_at,
        }
    }
}

/// Timing of the call behind a disposition update, as the dialer saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallTiming {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

impl CallTiming {
    pub fn new(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        Self {
            call_started_at: Some(started_at),
            call_ended_at: Some(ended_at),
            duration_seconds: None,
        }
    }

    /// Fill in the duration from start and end when it was not reported.
    pub fn normalized(mut self) -> Self {
        if self.duration_seconds.is_none() {
            if let (Some(start), Some(end)) = (self.call_started_at, self.call_ended_at) {
                self.duration_seconds = u64::try_from((end - start).num_seconds()).ok();
            }
        }
        self
    }
}

/// Immutable record of one accepted disposition change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub entry_id: uuid::Uuid,
    /// 1-based position within the order's history
    pub sequence: u64,
    pub order_id: String,
    pub caller_id: String,
    /// Number dialed for this call
    pub phone: String,
    pub from: Disposition,
    pub to: Disposition,
    pub note: Option<String>,
    #[serde(flatten)]
    pub timing: CallTiming,
    pub recorded_at: DateTime<Utc>,
}
