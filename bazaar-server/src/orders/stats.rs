//! Order statistics
//!
//! Read-only reporting over the order table. Status counts and revenue
//! come from database aggregates; payment-method and top-product
//! breakdowns are folded in memory because the line items live inside
//! the order documents.

use std::collections::HashMap;

use serde::Serialize;

use shared::{PaymentMethod, PaymentStatus};

use crate::utils::money::{round_money, to_decimal, to_f64};
use crate::utils::AppResult;

use super::manager::OrderManager;

#[derive(Debug, Serialize)]
pub struct TopProduct {
    pub variant_sku: String,
    pub product_name: String,
    pub quantity_sold: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderStats {
    pub total_orders: u64,
    /// Revenue over orders whose payment completed
    pub revenue: f64,
    pub by_status: HashMap<String, u64>,
    pub by_payment_method: HashMap<String, u64>,
    pub top_products: Vec<TopProduct>,
}

impl OrderManager {
    pub async fn order_stats(&self, top_n: usize) -> AppResult<OrderStats> {
        let status_counts = self.orders.count_by_status().await?;
        let mut by_status = HashMap::new();
        let mut total_orders = 0u64;
        for row in status_counts {
            total_orders += row.count;
            by_status.insert(row.status.to_string(), row.count);
        }

        let orders = self.orders.find_all().await?;

        let mut revenue = rust_decimal::Decimal::ZERO;
        let mut by_payment_method: HashMap<String, u64> = HashMap::new();
        let mut quantities: HashMap<String, (String, i64)> = HashMap::new();
        for order in &orders {
            let method = match order.payment.method {
                PaymentMethod::Cod => "COD",
                PaymentMethod::Online => "ONLINE",
            };
            *by_payment_method.entry(method.to_string()).or_default() += 1;

            if order.payment.status == PaymentStatus::Paid {
                revenue += to_decimal(order.total);
            }
            for item in &order.items {
                let entry = quantities
                    .entry(item.variant_sku.clone())
                    .or_insert_with(|| (item.product_name.clone(), 0));
                entry.1 += i64::from(item.quantity);
            }
        }

        let mut top_products: Vec<TopProduct> = quantities
            .into_iter()
            .map(|(sku, (name, qty))| TopProduct {
                variant_sku: sku,
                product_name: name,
                quantity_sold: qty,
            })
            .collect();
        top_products.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
        top_products.truncate(top_n);

        Ok(OrderStats {
            total_orders,
            revenue: round_money(to_f64(revenue)),
            by_status,
            by_payment_method,
            top_products,
        })
    }
}
