//! Order Repository
//!
//! Table is named shop_order because ORDER is a SurrealQL keyword.
//! Status changes go through single conditional UPDATE statements that
//! set the canonical status field and append to status_history in one
//! shot, so a concurrent writer can never split the two.

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{Order, ReturnRequest, TrackingInfo};
use shared::{OrderStatus, PaymentStatus, RefundStatus, ReturnStatus, StatusHistoryEntry};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const ORDER_TABLE: &str = "shop_order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

#[derive(Debug, Default, Clone)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub user_id: Option<String>,
    pub guest_session_id: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

/// Aggregates for the admin dashboard, computed by the database.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let pure_id = strip_table_prefix(ORDER_TABLE, id);
        let order: Option<Order> = self.base.db().select((ORDER_TABLE, pure_id)).await?;
        Ok(order)
    }

    pub async fn find_by_order_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM shop_order WHERE order_number = $order_number")
            .bind(("order_number", order_number.to_string()))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    pub async fn list(&self, filter: &OrderQuery) -> RepoResult<(Vec<Order>, u64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }
        if filter.guest_session_id.is_some() {
            conditions.push("guest_session_id = $guest_session_id");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let per_page = filter.per_page.max(1);
        let start = filter.page.saturating_sub(1) * per_page;

        let list_query = format!(
            "SELECT * FROM shop_order{} ORDER BY created_at DESC LIMIT $limit START $start",
            where_clause
        );
        let count_query = format!("SELECT count() FROM shop_order{} GROUP ALL", where_clause);

        let mut query = self
            .base
            .db()
            .query(&list_query)
            .query(&count_query)
            .bind(("limit", per_page as i64))
            .bind(("start", start as i64));
        if let Some(status) = filter.status {
            query = query.bind(("status", status));
        }
        if let Some(user_id) = &filter.user_id {
            query = query.bind(("user_id", user_id.clone()));
        }
        if let Some(guest) = &filter.guest_session_id {
            query = query.bind(("guest_session_id", guest.clone()));
        }

        let mut response = query.await?;
        let orders: Vec<Order> = response.take(0)?;

        #[derive(serde::Deserialize)]
        struct CountRow {
            count: u64,
        }
        let count: Option<CountRow> = response.take(1)?;
        Ok((orders, count.map(|c| c.count).unwrap_or(0)))
    }

    /// Move an order to a new status, guarded by the expected current
    /// status. Returns the updated order, or None when the order was no
    /// longer in the expected state.
    pub async fn transition(
        &self,
        order_number: &str,
        from: OrderStatus,
        to: OrderStatus,
        note: Option<String>,
    ) -> RepoResult<Option<Order>> {
        let entry = StatusHistoryEntry::new(to, note);
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE shop_order SET status = $to, status_history += $entry \
                 WHERE order_number = $order_number AND status = $from \
                 RETURN AFTER",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Confirm payment exactly once. The payment.status guard makes the
    /// operation idempotent under duplicate callbacks and webhooks, and
    /// the status guard admits only CREATED and the FAILED -> PAID
    /// recovery path, so a late success can never pull an order out of
    /// CANCELLED or any other settled state.
    pub async fn mark_paid(
        &self,
        order_number: &str,
        transaction_id: &str,
    ) -> RepoResult<Option<Order>> {
        let entry = StatusHistoryEntry::new(OrderStatus::Confirmed, Some("Payment received".to_string()));
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE shop_order SET \
                   payment.status = $paid, \
                   payment.transaction_id = $transaction_id, \
                   status = $confirmed, \
                   status_history += $entry \
                 WHERE order_number = $order_number AND payment.status != $paid \
                   AND status IN [$from_created, $from_failed] \
                 RETURN AFTER",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("paid", PaymentStatus::Paid))
            .bind(("confirmed", OrderStatus::Confirmed))
            .bind(("from_created", OrderStatus::Created))
            .bind(("from_failed", OrderStatus::PaymentFailed))
            .bind(("transaction_id", transaction_id.to_string()))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Record a payment failure. Never overwrites a PAID record, and
    /// only fires while the order is still CREATED so a late failure
    /// event cannot touch a cancelled order.
    pub async fn mark_payment_failed(
        &self,
        order_number: &str,
        reason: Option<String>,
    ) -> RepoResult<Option<Order>> {
        let entry = StatusHistoryEntry::new(OrderStatus::PaymentFailed, reason);
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE shop_order SET \
                   payment.status = $failed, \
                   status = $payment_failed, \
                   status_history += $entry \
                 WHERE order_number = $order_number AND payment.status = $pending \
                   AND status = $created \
                 RETURN AFTER",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("failed", PaymentStatus::Failed))
            .bind(("pending", PaymentStatus::Pending))
            .bind(("payment_failed", OrderStatus::PaymentFailed))
            .bind(("created", OrderStatus::Created))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    pub async fn set_gateway_order_id(
        &self,
        order_number: &str,
        gateway_order_id: &str,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query(
                "UPDATE shop_order SET payment.gateway_order_id = $gateway_order_id \
                 WHERE order_number = $order_number",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("gateway_order_id", gateway_order_id.to_string()))
            .await?;
        Ok(())
    }

    pub async fn set_tracking(
        &self,
        order_number: &str,
        tracking: TrackingInfo,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE shop_order SET tracking = $tracking \
                 WHERE order_number = $order_number RETURN AFTER",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("tracking", tracking))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    pub async fn mark_cancelled(
        &self,
        order_number: &str,
        note: Option<String>,
    ) -> RepoResult<Option<Order>> {
        let entry = StatusHistoryEntry::new(OrderStatus::Cancelled, note);
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE shop_order SET status = $cancelled, status_history += $entry \
                 WHERE order_number = $order_number AND status IN $cancellable \
                 RETURN AFTER",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("cancelled", OrderStatus::Cancelled))
            .bind((
                "cancellable",
                vec![
                    OrderStatus::Created,
                    OrderStatus::Confirmed,
                    OrderStatus::Processing,
                    OrderStatus::PaymentFailed,
                ],
            ))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    pub async fn set_refund(
        &self,
        order_number: &str,
        status: RefundStatus,
        amount: f64,
        reference: Option<String>,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query(
                "UPDATE shop_order SET payment.refund = { \
                   status: $status, amount: $amount, reference: $reference, initiated_at: $at \
                 } WHERE order_number = $order_number",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("status", status))
            .bind(("amount", amount))
            .bind(("reference", reference))
            .bind(("at", crate::utils::time::now_millis()))
            .await?;
        Ok(())
    }

    /// Attach a return or exchange request. Only one open request per
    /// order; the guard rejects a second while one is pending/approved.
    pub async fn set_return_request(
        &self,
        order_number: &str,
        request: ReturnRequest,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE shop_order SET return_request = $request \
                 WHERE order_number = $order_number \
                 AND (return_request = NONE OR return_request.status IN $closed) \
                 RETURN AFTER",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("request", request))
            .bind((
                "closed",
                vec![ReturnStatus::Rejected, ReturnStatus::Completed],
            ))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    pub async fn update_return_status(
        &self,
        order_number: &str,
        from: ReturnStatus,
        to: ReturnStatus,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE shop_order SET return_request.status = $to \
                 WHERE order_number = $order_number AND return_request.status = $from \
                 RETURN AFTER",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    pub async fn append_history(
        &self,
        order_number: &str,
        entry: StatusHistoryEntry,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query(
                "UPDATE shop_order SET status = $status, status_history += $entry \
                 WHERE order_number = $order_number",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("status", entry.status))
            .bind(("entry", entry))
            .await?;
        Ok(())
    }

    /// Move guest orders onto a user account after login.
    pub async fn reassign_guest_orders(
        &self,
        guest_session_id: &str,
        user_id: &str,
    ) -> RepoResult<u64> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE shop_order SET user_id = $user_id, guest_session_id = NONE \
                 WHERE guest_session_id = $guest_session_id AND user_id = NONE \
                 RETURN AFTER",
            )
            .bind(("guest_session_id", guest_session_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(updated.len() as u64)
    }

    pub async fn delete(&self, order_number: &str) -> RepoResult<()> {
        let deleted: Vec<Order> = self
            .base
            .db()
            .query("DELETE shop_order WHERE order_number = $order_number RETURN BEFORE")
            .bind(("order_number", order_number.to_string()))
            .await?
            .take(0)?;
        if deleted.is_empty() {
            return Err(RepoError::NotFound(format!(
                "Order {} not found",
                order_number
            )));
        }
        Ok(())
    }

    /// Full scan used by the statistics report.
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM shop_order ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn count_by_status(&self) -> RepoResult<Vec<StatusCount>> {
        let rows: Vec<StatusCount> = self
            .base
            .db()
            .query("SELECT status, count() AS count FROM shop_order GROUP BY status")
            .await?
            .take(0)?;
        Ok(rows)
    }
}
