//! Database models
//!
//! Records stored in SurrealDB plus their create/update payloads. IDs are
//! SurrealDB `Thing`s internally; handlers convert them to `table:id`
//! strings at the API boundary (see `api::convert`).

pub mod cart;
pub mod category;
pub mod coupon;
pub mod order;
pub mod product;
pub mod promotion;

pub use cart::{Cart, CartItem, CartItemInput};
pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use coupon::{Coupon, CouponCreate, CouponUpdate};
pub use order::{
    CouponSnapshot, Order, OrderCreate, OrderItem, OrderItemInput, PaymentRecord, RefundRecord,
    ReturnItem, ReturnRequest, ShippingAddress, TrackingInfo,
};
pub use product::{
    Product, ProductCreate, ProductUpdate, Variant, VariantCreate, VariantUpdate,
};
pub use promotion::{GenerateCoupons, Promotion, PromotionCreate, PromotionUpdate};

fn default_true() -> bool {
    true
}
