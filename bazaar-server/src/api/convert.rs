//! Response view models
//!
//! Database models carry SurrealDB `Thing` ids; the API renders them as
//! plain `table:id` strings. These views are the only place that
//! conversion happens.

use serde::Serialize;

use crate::db::models as db;
use crate::gateway::PaymentSession;
use crate::orders::CreatedOrder;
use shared::{
    DiscountType, OrderStatus, PaymentMethod, PaymentStatus, ReturnKind, ReturnStatus,
    StatusHistoryEntry,
};

pub fn thing_to_string(thing: &surrealdb::sql::Thing) -> String {
    thing.to_string()
}

pub fn option_thing_to_string(thing: &Option<surrealdb::sql::Thing>) -> Option<String> {
    thing.as_ref().map(thing_to_string)
}

// ============ Catalog ============

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub id: Option<String>,
    pub name: String,
    pub sort_order: i32,
    pub is_active: bool,
}

impl From<db::Category> for CategoryView {
    fn from(c: db::Category) -> Self {
        Self {
            id: option_thing_to_string(&c.id),
            name: c.name,
            sort_order: c.sort_order,
            is_active: c.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VariantView {
    pub id: Option<String>,
    pub sku: String,
    pub selling_price: f64,
    pub mrp: f64,
    pub stock: i32,
    pub attributes: std::collections::BTreeMap<String, String>,
    pub is_active: bool,
}

impl From<db::Variant> for VariantView {
    fn from(v: db::Variant) -> Self {
        Self {
            id: option_thing_to_string(&v.id),
            sku: v.sku,
            selling_price: v.selling_price,
            mrp: v.mrp,
            stock: v.stock,
            attributes: v.attributes,
            is_active: v.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub images: Vec<String>,
    pub gst_rate: i32,
    pub is_active: bool,
    pub created_at: Option<i64>,
}

impl From<db::Product> for ProductView {
    fn from(p: db::Product) -> Self {
        Self {
            id: option_thing_to_string(&p.id),
            name: p.name,
            description: p.description,
            category: thing_to_string(&p.category),
            images: p.images,
            gst_rate: p.gst_rate,
            is_active: p.is_active,
            created_at: p.created_at,
        }
    }
}

/// Product with its variants, as served by the detail endpoint.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductView,
    pub variants: Vec<VariantView>,
}

// ============ Coupons / promotions ============

#[derive(Debug, Serialize)]
pub struct CouponView {
    pub id: Option<String>,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub max_discount: Option<f64>,
    pub min_order_value: f64,
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub promotion: Option<String>,
    pub is_active: bool,
}

impl From<db::Coupon> for CouponView {
    fn from(c: db::Coupon) -> Self {
        Self {
            id: option_thing_to_string(&c.id),
            code: c.code,
            discount_type: c.discount_type,
            value: c.value,
            max_discount: c.max_discount,
            min_order_value: c.min_order_value,
            usage_limit: c.usage_limit,
            used_count: c.used_count,
            valid_from: c.valid_from,
            valid_until: c.valid_until,
            promotion: option_thing_to_string(&c.promotion),
            is_active: c.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PromotionView {
    pub id: Option<String>,
    pub name: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub max_discount: Option<f64>,
    pub min_order_value: f64,
    pub usage_limit: Option<i64>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub code_prefix: String,
    pub is_active: bool,
}

impl From<db::Promotion> for PromotionView {
    fn from(p: db::Promotion) -> Self {
        Self {
            id: option_thing_to_string(&p.id),
            name: p.name,
            discount_type: p.discount_type,
            value: p.value,
            max_discount: p.max_discount,
            min_order_value: p.min_order_value,
            usage_limit: p.usage_limit,
            valid_from: p.valid_from,
            valid_until: p.valid_until,
            code_prefix: p.code_prefix,
            is_active: p.is_active,
        }
    }
}

// ============ Orders ============

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub product: String,
    pub product_name: String,
    pub variant_sku: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub gst_rate: i32,
    pub gst_amount: f64,
    pub line_total: f64,
}

impl From<db::OrderItem> for OrderItemView {
    fn from(i: db::OrderItem) -> Self {
        Self {
            product: thing_to_string(&i.product),
            product_name: i.product_name,
            variant_sku: i.variant_sku,
            quantity: i.quantity,
            unit_price: i.unit_price,
            gst_rate: i.gst_rate,
            gst_amount: i.gst_amount,
            line_total: i.line_total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub refund: Option<db::RefundRecord>,
}

#[derive(Debug, Serialize)]
pub struct ReturnRequestView {
    pub kind: ReturnKind,
    pub reason: String,
    pub items: Vec<db::ReturnItem>,
    pub status: ReturnStatus,
    pub refund_amount: Option<f64>,
    pub requested_at: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: Option<String>,
    pub order_number: String,
    pub user_id: Option<String>,
    pub guest_session_id: Option<String>,
    pub items: Vec<OrderItemView>,
    pub shipping_address: db::ShippingAddress,
    pub tracking: db::TrackingInfo,
    pub payment: PaymentView,
    pub coupon: Option<db::CouponSnapshot>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub total_gst: f64,
    pub status: OrderStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub return_request: Option<ReturnRequestView>,
    pub created_at: i64,
}

impl From<db::Order> for OrderView {
    fn from(o: db::Order) -> Self {
        Self {
            id: option_thing_to_string(&o.id),
            order_number: o.order_number,
            user_id: o.user_id,
            guest_session_id: o.guest_session_id,
            items: o.items.into_iter().map(Into::into).collect(),
            shipping_address: o.shipping_address,
            tracking: o.tracking,
            payment: PaymentView {
                method: o.payment.method,
                status: o.payment.status,
                gateway_order_id: o.payment.gateway_order_id,
                transaction_id: o.payment.transaction_id,
                refund: o.payment.refund,
            },
            coupon: o.coupon,
            subtotal: o.subtotal,
            discount: o.discount,
            total: o.total,
            total_gst: o.total_gst,
            status: o.status,
            status_history: o.status_history,
            return_request: o.return_request.map(|r| ReturnRequestView {
                kind: r.kind,
                reason: r.reason,
                items: r.items,
                status: r.status,
                refund_amount: r.refund_amount,
                requested_at: r.requested_at,
            }),
            created_at: o.created_at,
        }
    }
}

/// Creation response: order plus checkout session for online payments.
#[derive(Debug, Serialize)]
pub struct CreatedOrderView {
    pub order: OrderView,
    pub payment_session: Option<PaymentSession>,
}

impl From<CreatedOrder> for CreatedOrderView {
    fn from(c: CreatedOrder) -> Self {
        Self {
            order: c.order.into(),
            payment_session: c.payment_session,
        }
    }
}
