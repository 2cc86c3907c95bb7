//! Order creation
//!
//! Pricing always comes from the variant's current selling price;
//! client-supplied prices are never read. Stock is reserved per line
//! with a conditional decrement, and every already-reserved line is
//! restored if any later step fails, so a half-created order never
//! leaks reservations.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use shared::{OrderStatus, PaymentMethod, StatusHistoryEntry};

use crate::cart::owner_key;
use crate::db::models::{
    CartItemInput, CouponSnapshot, Order, OrderCreate, OrderItem, OrderItemInput, PaymentRecord,
};
use crate::gateway::PaymentSession;
use crate::notify::Recipient;
use crate::utils::money::{round_money, to_decimal, to_f64};
use crate::utils::time::now_millis;
use crate::utils::{AppError, AppResult};

use super::manager::{Actor, OrderManager};

/// Creation result: the persisted order plus, for online payments, the
/// checkout session the client opens next.
#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub payment_session: Option<PaymentSession>,
}

/// GST portion of a price-inclusive line total:
/// `line_total * rate / (100 + rate)`.
fn gst_portion(line_total: Decimal, gst_rate: i32) -> Decimal {
    if gst_rate <= 0 {
        return Decimal::ZERO;
    }
    let rate = Decimal::from(gst_rate);
    line_total * rate / (Decimal::from(100) + rate)
}

impl OrderManager {
    pub async fn create_order(
        &self,
        actor: &Actor,
        mut input: OrderCreate,
    ) -> AppResult<CreatedOrder> {
        let (user_id, guest_session_id) = Self::resolve_identity(actor, &input)?;

        // An empty item list means "order my cart": hydrate the lines
        // (and any previewed coupon) from the caller's cart, which is
        // cleared once the order persists.
        let mut cart_owner = None;
        if input.items.is_empty() {
            let owner = owner_key(user_id.as_deref(), guest_session_id.as_deref())?;
            let view = self.cart_service.get_cart(&owner).await?;
            input.items = view
                .items
                .iter()
                .map(|item| OrderItemInput {
                    product_id: item.product.to_string(),
                    variant_sku: Some(item.variant_sku.clone()),
                    quantity: item.quantity,
                    size: None,
                    color: None,
                })
                .collect();
            if input.coupon_code.is_none() {
                input.coupon_code = view.coupon_code;
            }
            cart_owner = Some(owner);
        }
        Self::validate_input(&input)?;

        // Price every line from the live variant before touching stock.
        let mut items = Vec::with_capacity(input.items.len());
        let mut subtotal = Decimal::ZERO;
        let mut total_gst = Decimal::ZERO;
        for line in &input.items {
            let item = self.price_line(line).await?;
            subtotal += to_decimal(item.line_total);
            total_gst += to_decimal(item.gst_amount);
            items.push(item);
        }
        let subtotal = round_money(to_f64(subtotal));

        // Coupon quote against the subtotal; usage is consumed below,
        // after stock reservation succeeds.
        let coupon_quote = match &input.coupon_code {
            Some(code) => Some(self.coupons.validate(code, subtotal).await?.1),
            None => None,
        };
        let discount = coupon_quote.as_ref().map(|q| q.discount).unwrap_or(0.0);
        let total = round_money(to_f64(to_decimal(subtotal) - to_decimal(discount)));

        self.reserve_stock(&items).await?;

        if let Some(quote) = &coupon_quote {
            if let Err(e) = self.coupons.redeem(&quote.code).await {
                self.release_stock(&items).await;
                return Err(e);
            }
        }

        let order_number = Self::next_order_number();
        let order = Order {
            id: None,
            order_number: order_number.clone(),
            user_id,
            guest_session_id,
            items,
            shipping_address: input.shipping_address,
            tracking: Default::default(),
            payment: PaymentRecord::new(input.payment_method),
            coupon: coupon_quote.map(|q| CouponSnapshot {
                code: q.code,
                discount_type: q.discount_type,
                discount: q.discount,
            }),
            subtotal,
            discount,
            total,
            total_gst: round_money(to_f64(total_gst)),
            status: OrderStatus::Created,
            status_history: vec![StatusHistoryEntry::new(
                OrderStatus::Created,
                Some("Order created".to_string()),
            )],
            return_request: None,
            created_at: now_millis(),
        };

        let reserved_items = order.items.clone();
        let order = match self.orders.create(order).await {
            Ok(order) => order,
            Err(e) => {
                error!(order_number, error = %e, "Order persist failed, releasing reservations");
                self.release_stock(&reserved_items).await;
                return Err(e.into());
            }
        };
        info!(order_number = %order.order_number, total = order.total, "Order created");

        if let Some(owner) = cart_owner
            && let Err(e) = self.cart_service.clear(&owner).await
        {
            warn!(order_number = %order.order_number, error = %e, "Cart clear after checkout failed");
        }

        match order.payment.method {
            PaymentMethod::Cod => self.confirm_cod(order).await,
            PaymentMethod::Online => self.open_payment_session(order).await,
        }
    }

    fn resolve_identity(
        actor: &Actor,
        input: &OrderCreate,
    ) -> AppResult<(Option<String>, Option<String>)> {
        // An authenticated user always owns the order; the payload's
        // guest session only counts for anonymous checkouts.
        if let Some(user) = &actor.user_id {
            return Ok((Some(user.clone()), None));
        }
        let guest = actor
            .guest_session_id
            .clone()
            .or_else(|| input.guest_session_id.clone());
        match guest {
            Some(session) if !session.is_empty() => Ok((None, Some(session))),
            _ => Err(AppError::validation(
                "A user identity or guest session is required to place an order",
            )),
        }
    }

    fn validate_input(input: &OrderCreate) -> AppResult<()> {
        if input.items.is_empty() {
            return Err(AppError::validation("Order must contain at least one item"));
        }
        if input.items.iter().any(|i| i.quantity < 1) {
            return Err(AppError::validation("Item quantity must be at least 1"));
        }
        if input.shipping_address.name.trim().is_empty()
            || input.shipping_address.phone.trim().is_empty()
            || input.shipping_address.pincode.trim().is_empty()
        {
            return Err(AppError::validation(
                "Shipping address requires name, phone and pincode",
            ));
        }
        Ok(())
    }

    async fn price_line(&self, line: &OrderItemInput) -> AppResult<OrderItem> {
        let variant = self
            .cart_service
            .resolve_variant(&CartItemInput {
                product_id: line.product_id.clone(),
                variant_sku: line.variant_sku.clone(),
                quantity: line.quantity,
                size: line.size.clone(),
                color: line.color.clone(),
            })
            .await?;

        let product = self.cart_service.load_product(&variant).await?;

        let unit_price = to_decimal(variant.selling_price);
        let line_total = unit_price * Decimal::from(line.quantity);
        let gst_amount = gst_portion(line_total, product.gst_rate);

        Ok(OrderItem {
            product: variant.product.clone(),
            product_name: product.name,
            variant_sku: variant.sku,
            quantity: line.quantity,
            unit_price: variant.selling_price,
            gst_rate: product.gst_rate,
            gst_amount: round_money(to_f64(gst_amount)),
            line_total: round_money(to_f64(line_total)),
        })
    }

    /// Conditionally decrement stock for every line; on the first line
    /// that cannot be satisfied, restore all prior reservations and
    /// fail the whole order.
    async fn reserve_stock(&self, items: &[OrderItem]) -> AppResult<()> {
        let mut reserved: Vec<&OrderItem> = Vec::with_capacity(items.len());
        for item in items {
            match self
                .variants
                .try_decrement_stock(&item.variant_sku, item.quantity)
                .await
            {
                Ok(true) => reserved.push(item),
                Ok(false) => {
                    for prior in reserved {
                        if let Err(e) = self
                            .variants
                            .restore_stock(&prior.variant_sku, prior.quantity)
                            .await
                        {
                            error!(sku = %prior.variant_sku, error = %e, "Failed to restore stock after reservation abort");
                        }
                    }
                    return Err(AppError::validation(format!(
                        "Insufficient stock for {}",
                        item.variant_sku
                    )));
                }
                Err(e) => {
                    for prior in reserved {
                        if let Err(e) = self
                            .variants
                            .restore_stock(&prior.variant_sku, prior.quantity)
                            .await
                        {
                            error!(sku = %prior.variant_sku, error = %e, "Failed to restore stock after reservation abort");
                        }
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    async fn release_stock(&self, items: &[OrderItem]) {
        for item in items {
            if let Err(e) = self
                .variants
                .restore_stock(&item.variant_sku, item.quantity)
                .await
            {
                error!(sku = %item.variant_sku, error = %e, "Failed to release reserved stock");
            }
        }
    }

    async fn confirm_cod(&self, order: Order) -> AppResult<CreatedOrder> {
        let confirmed = self
            .orders
            .transition(
                &order.order_number,
                OrderStatus::Created,
                OrderStatus::Confirmed,
                Some("Order confirmed (cash on delivery)".to_string()),
            )
            .await?
            .unwrap_or(order);

        let recipient = Recipient::from_order(&confirmed);
        if let Err(e) = self
            .notify
            .send_order_confirmation(&recipient, &confirmed)
            .await
        {
            warn!(order_number = %confirmed.order_number, error = %e, "Confirmation notification failed");
        }

        Ok(CreatedOrder {
            order: confirmed,
            payment_session: None,
        })
    }

    /// Online payments: create the gateway checkout session. This is
    /// the one integration call whose failure is fatal to the request;
    /// the order stays CREATED/PENDING and can be cleaned up through
    /// delete_order.
    async fn open_payment_session(&self, order: Order) -> AppResult<CreatedOrder> {
        let session = match self
            .gateway
            .create_session(
                &order.order_number,
                order.total,
                &order.shipping_address.phone,
            )
            .await
        {
            Ok(session) => session,
            Err(e) => {
                error!(order_number = %order.order_number, error = %e, "Gateway session creation failed");
                return Err(AppError::internal("Failed to create payment order"));
            }
        };

        self.orders
            .set_gateway_order_id(&order.order_number, &session.gateway_order_id)
            .await?;
        let mut order = order;
        order.payment.gateway_order_id = Some(session.gateway_order_id.clone());

        Ok(CreatedOrder {
            order,
            payment_session: Some(session),
        })
    }
}
