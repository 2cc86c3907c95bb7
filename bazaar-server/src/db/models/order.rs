//! Order model
//!
//! One record per checkout transaction. Item quantities and prices are fixed
//! at creation; everything that changes afterwards is the payment sub-record,
//! the status (+ history), tracking info, and an optional return/exchange
//! sub-record.
//!
//! Invariants:
//! - exactly one of `user_id` / `guest_session_id` is set
//! - `total = subtotal - discount`
//! - the `status` field and the last history entry are written together

use serde::{Deserialize, Serialize};
use shared::{
    DiscountType, OrderStatus, PaymentMethod, PaymentStatus, RefundStatus, ReturnKind,
    ReturnStatus, StatusHistoryEntry,
};
use surrealdb::sql::Thing;

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<Thing>,
    /// Stable external reference, also used as the gateway order id
    pub order_number: String,
    pub user_id: Option<String>,
    pub guest_session_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub tracking: TrackingInfo,
    pub payment: PaymentRecord,
    pub coupon: Option<CouponSnapshot>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub total_gst: f64,
    pub status: OrderStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub return_request: Option<ReturnRequest>,
    pub created_at: i64,
}

impl Order {
    /// Owner check: registered user or the guest session that created it
    pub fn is_owned_by(&self, user_id: Option<&str>, guest_session_id: Option<&str>) -> bool {
        match (&self.user_id, user_id) {
            (Some(owner), Some(caller)) if owner == caller => return true,
            _ => {}
        }
        matches!(
            (&self.guest_session_id, guest_session_id),
            (Some(owner), Some(caller)) if owner == caller
        )
    }

    /// Quantity ordered for a given SKU (0 when the SKU is not on the order)
    pub fn ordered_quantity(&self, sku: &str) -> i32 {
        self.items
            .iter()
            .filter(|i| i.variant_sku == sku)
            .map(|i| i.quantity)
            .sum()
    }
}

/// Order line item, priced from the variant at creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Record link to product
    pub product: Thing,
    pub product_name: String,
    pub variant_sku: String,
    pub quantity: i32,
    /// Unit price snapshot from the variant, never client-supplied
    pub unit_price: f64,
    /// GST percent, price-inclusive
    pub gst_rate: i32,
    /// GST portion of `line_total`
    pub gst_amount: f64,
    pub line_total: f64,
}

/// Shipping address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub email: Option<String>,
}

fn default_country() -> String {
    "IN".to_string()
}

/// Shipment tracking info, filled in after payment confirmation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackingInfo {
    pub shipment_id: Option<String>,
    pub tracking_code: Option<String>,
}

/// Payment sub-record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Gateway-side session/order reference for online payments
    pub gateway_order_id: Option<String>,
    /// Gateway transaction id, recorded on verified success
    pub transaction_id: Option<String>,
    pub refund: Option<RefundRecord>,
}

impl PaymentRecord {
    pub fn new(method: PaymentMethod) -> Self {
        Self {
            method,
            status: PaymentStatus::Pending,
            gateway_order_id: None,
            transaction_id: None,
            refund: None,
        }
    }
}

/// Refund sub-record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub status: RefundStatus,
    pub amount: f64,
    pub reference: Option<String>,
    pub initiated_at: i64,
}

/// Applied coupon snapshot, frozen at order creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponSnapshot {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount: f64,
}

/// Return/exchange sub-record, embedded in the order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub kind: ReturnKind,
    pub reason: String,
    pub items: Vec<ReturnItem>,
    pub status: ReturnStatus,
    /// Order status at request time, restored verbatim on rejection
    pub previous_status: OrderStatus,
    pub refund_amount: Option<f64>,
    pub history: Vec<StatusHistoryEntry>,
    pub requested_at: i64,
}

/// Item requested for return/exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnItem {
    pub variant_sku: String,
    pub quantity: i32,
}

// ========== Request payloads ==========

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub items: Vec<OrderItemInput>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    /// Guest checkout session; ignored when the request is authenticated
    pub guest_session_id: Option<String>,
}

/// Requested order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    /// Product id as "product:xyz" string
    pub product_id: String,
    pub variant_sku: Option<String>,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}
