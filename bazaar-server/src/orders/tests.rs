//! Order lifecycle tests: creation, reconciliation, transitions,
//! cancellation, returns, delete, reassignment and stats.

use shared::{
    CouponRejection, DiscountType, OrderStatus, PaymentMethod, PaymentStatus, ReturnKind,
    ReturnStatus,
};

use crate::db::models::{CouponCreate, Order, ReturnItem};
use crate::db::repository::{CouponRepository, OrderQuery, VariantRepository};
use crate::gateway::mock::MockGateway;
use crate::gateway::{CallbackData, GatewayPaymentStatus};
use crate::utils::AppError;

use super::manager::Actor;
use super::returns::{ProcessReturnAction, ReturnRequestInput};
use super::test_support::{order_input, rig, rig_with_gateway};

fn event_for(order: &Order) -> CallbackData {
    CallbackData {
        order_id: order.order_number.clone(),
        claimed_status: Some("SUCCESS".to_string()),
        reference_id: Some("cf_1".to_string()),
    }
}

async fn stock_of(rig: &super::test_support::TestRig, sku: &str) -> i32 {
    VariantRepository::new(rig.db.clone())
        .find_by_sku(sku)
        .await
        .unwrap()
        .unwrap()
        .stock
}

#[tokio::test]
async fn cod_order_confirms_immediately() {
    let rig = rig().await;
    let actor = Actor::user("u1");

    let created = rig
        .manager
        .create_order(&actor, order_input(&rig.product_id, "KUR-M", 2, PaymentMethod::Cod))
        .await
        .unwrap();

    let order = created.order;
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.payment.status, PaymentStatus::Pending);
    assert!(created.payment_session.is_none());
    assert_eq!(order.subtotal, 1000.0);
    assert_eq!(order.total, 1000.0);
    // 12% GST, price-inclusive: 1000 * 12 / 112
    assert_eq!(order.total_gst, 107.14);
    assert_eq!(order.status_history.len(), 2);

    assert_eq!(stock_of(&rig, "KUR-M").await, 8);
    assert_eq!(rig.notify.confirmations_sent(), 1);
}

#[tokio::test]
async fn online_order_returns_session_and_stays_created() {
    let rig = rig().await;
    let created = rig
        .manager
        .create_order(
            &Actor::guest("g1"),
            order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Online),
        )
        .await
        .unwrap();

    assert_eq!(created.order.status, OrderStatus::Created);
    let session = created.payment_session.unwrap();
    assert_eq!(session.gateway_order_id, format!("cf_{}", created.order.order_number));
    assert_eq!(
        created.order.payment.gateway_order_id.as_deref(),
        Some(session.gateway_order_id.as_str())
    );
    assert_eq!(rig.notify.confirmations_sent(), 0);
}

#[tokio::test]
async fn insufficient_stock_rejects_and_compensates() {
    let rig = rig().await;
    let actor = Actor::user("u1");

    // Single line over stock.
    let err = rig
        .manager
        .create_order(&actor, order_input(&rig.product_id, "KUR-L", 3, PaymentMethod::Cod))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(stock_of(&rig, "KUR-L").await, 2);

    // Two lines: the first reserves, the second fails, the first is restored.
    let mut input = order_input(&rig.product_id, "KUR-M", 5, PaymentMethod::Cod);
    input.items.push(crate::db::models::OrderItemInput {
        product_id: rig.product_id.clone(),
        variant_sku: Some("KUR-L".to_string()),
        quantity: 3,
        size: None,
        color: None,
    });
    let err = rig.manager.create_order(&actor, input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(stock_of(&rig, "KUR-M").await, 10);
    assert_eq!(stock_of(&rig, "KUR-L").await, 2);
}

#[tokio::test]
async fn empty_item_list_orders_the_cart() {
    let rig = rig().await;
    let cart = crate::cart::CartService::new(rig.db.clone());
    cart.add_item(
        "user:u1",
        crate::db::models::CartItemInput {
            product_id: rig.product_id.clone(),
            variant_sku: Some("KUR-M".to_string()),
            quantity: 2,
            size: None,
            color: None,
        },
    )
    .await
    .unwrap();

    let mut input = order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Cod);
    input.items.clear();
    let created = rig
        .manager
        .create_order(&Actor::user("u1"), input.clone())
        .await
        .unwrap();
    assert_eq!(created.order.items.len(), 1);
    assert_eq!(created.order.items[0].quantity, 2);
    assert_eq!(created.order.subtotal, 1000.0);

    // Checkout consumed the cart; an empty cart cannot be ordered again.
    assert!(cart.get_cart("user:u1").await.unwrap().items.is_empty());
    let err = rig
        .manager
        .create_order(&Actor::user("u1"), input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn order_creation_requires_an_identity() {
    let rig = rig().await;
    let err = rig
        .manager
        .create_order(
            &Actor::default(),
            order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Cod),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn coupon_is_consumed_at_creation_and_limits_hold() {
    let rig = rig().await;
    let coupons = CouponRepository::new(rig.db.clone());
    coupons
        .create(&CouponCreate {
            code: "ONCE".to_string(),
            discount_type: DiscountType::Fixed,
            value: 100.0,
            max_discount: None,
            min_order_value: None,
            usage_limit: Some(1),
            valid_from: None,
            valid_until: None,
        })
        .await
        .unwrap();

    let mut input = order_input(&rig.product_id, "KUR-M", 2, PaymentMethod::Cod);
    input.coupon_code = Some("ONCE".to_string());
    let created = rig
        .manager
        .create_order(&Actor::user("u1"), input.clone())
        .await
        .unwrap();
    assert_eq!(created.order.discount, 100.0);
    assert_eq!(created.order.total, 900.0);
    assert_eq!(created.order.coupon.as_ref().unwrap().code, "ONCE");
    assert_eq!(coupons.find_by_code("ONCE").await.unwrap().unwrap().used_count, 1);

    // Second use fails before any stock is touched.
    let err = rig
        .manager
        .create_order(&Actor::user("u2"), input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Coupon(CouponRejection::UsageExceeded)));
    assert_eq!(stock_of(&rig, "KUR-M").await, 8);
}

#[tokio::test]
async fn payment_events_settle_once_and_are_idempotent() {
    let rig = rig_with_gateway(MockGateway::paying("txn_77")).await;
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Online),
        )
        .await
        .unwrap();
    let event = event_for(&created.order);

    let outcome = rig.manager.reconcile_payment(&event).await.unwrap();
    let order = match outcome {
        super::ReconcileOutcome::Confirmed(o) => o,
        other => panic!("expected Confirmed, got {other:?}"),
    };
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.payment.status, PaymentStatus::Paid);
    assert_eq!(order.payment.transaction_id.as_deref(), Some("txn_77"));
    assert!(order.tracking.shipment_id.is_some());
    assert_eq!(rig.notify.confirmations_sent(), 1);

    // Duplicate event: no second notification, no gateway re-query.
    let queries_before = rig.gateway.status_queries.load(std::sync::atomic::Ordering::SeqCst);
    let outcome = rig.manager.reconcile_payment(&event).await.unwrap();
    assert!(matches!(outcome, super::ReconcileOutcome::AlreadyPaid(_)));
    assert_eq!(rig.notify.confirmations_sent(), 1);
    assert_eq!(
        rig.gateway.status_queries.load(std::sync::atomic::Ordering::SeqCst),
        queries_before
    );
}

#[tokio::test]
async fn forged_success_payload_does_not_confirm() {
    // Gateway says pending regardless of what the payload claims.
    let rig = rig_with_gateway(MockGateway::pending()).await;
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Online),
        )
        .await
        .unwrap();

    let outcome = rig.manager.reconcile_payment(&event_for(&created.order)).await.unwrap();
    assert!(matches!(outcome, super::ReconcileOutcome::Pending(_)));
    let order = rig.manager.get_order(&created.order.order_number).await.unwrap();
    assert_eq!(order.payment.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn failed_payment_can_recover_to_paid() {
    let rig = rig_with_gateway(MockGateway::failing("card declined")).await;
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Online),
        )
        .await
        .unwrap();
    let event = event_for(&created.order);

    let outcome = rig.manager.reconcile_payment(&event).await.unwrap();
    assert!(matches!(outcome, super::ReconcileOutcome::Failed(_)));
    let order = rig.manager.get_order(&created.order.order_number).await.unwrap();
    assert_eq!(order.status, OrderStatus::PaymentFailed);
    assert_eq!(order.payment.status, PaymentStatus::Failed);

    // Gateway later reports success for the same order.
    rig.gateway.set_status(GatewayPaymentStatus::Paid {
        transaction_id: "txn_retry".to_string(),
    });
    let outcome = rig.manager.reconcile_payment(&event).await.unwrap();
    assert!(matches!(outcome, super::ReconcileOutcome::Confirmed(_)));
    let order = rig.manager.get_order(&created.order.order_number).await.unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.payment.status, PaymentStatus::Paid);
}

#[tokio::test]
async fn late_success_event_cannot_resurrect_a_cancelled_order() {
    let rig = rig_with_gateway(MockGateway::pending()).await;
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 2, PaymentMethod::Online),
        )
        .await
        .unwrap();
    let number = created.order.order_number.clone();

    rig.manager
        .cancel_order(&number, &Actor::user("u1"), None)
        .await
        .unwrap();
    assert_eq!(stock_of(&rig, "KUR-M").await, 10);

    // The gateway settles the payment after the cancellation.
    rig.gateway.set_status(GatewayPaymentStatus::Paid {
        transaction_id: "txn_late".to_string(),
    });
    let outcome = rig.manager.reconcile_payment(&event_for(&created.order)).await.unwrap();
    assert!(matches!(outcome, super::ReconcileOutcome::PaidAfterCancel(_)));

    // Cancelled stays terminal: no confirmation, no shipment, no stock
    // movement, and the captured money is refunded.
    let order = rig.manager.get_order(&number).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.payment.status, PaymentStatus::Pending);
    assert_eq!(rig.gateway.refunds.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(rig.notify.confirmations_sent(), 0);
    assert!(order.tracking.shipment_id.is_none());
    assert_eq!(stock_of(&rig, "KUR-M").await, 10);

    // A late failure event cannot touch the cancelled order either.
    rig.gateway.set_status(GatewayPaymentStatus::Failed {
        reason: "expired".to_string(),
    });
    rig.manager.reconcile_payment(&event_for(&created.order)).await.unwrap();
    let order = rig.manager.get_order(&number).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn deleting_a_cancelled_order_does_not_restore_stock_twice() {
    let rig = rig().await;
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 2, PaymentMethod::Online),
        )
        .await
        .unwrap();
    let number = created.order.order_number.clone();
    assert_eq!(stock_of(&rig, "KUR-M").await, 8);

    rig.manager
        .cancel_order(&number, &Actor::user("u1"), None)
        .await
        .unwrap();
    assert_eq!(stock_of(&rig, "KUR-M").await, 10);

    // Payment is still PENDING so the delete is allowed, but the
    // cancellation already returned the stock.
    rig.manager.delete_order(&number).await.unwrap();
    assert_eq!(stock_of(&rig, "KUR-M").await, 10);
    assert!(matches!(
        rig.manager.get_order(&number).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn unknown_order_event_is_absorbed() {
    let rig = rig().await;
    let outcome = rig
        .manager
        .reconcile_payment(&CallbackData {
            order_id: "ORD-nope".to_string(),
            claimed_status: Some("SUCCESS".to_string()),
            reference_id: None,
        })
        .await
        .unwrap();
    assert!(matches!(outcome, super::ReconcileOutcome::UnknownOrder));
}

#[tokio::test]
async fn fulfillment_walks_the_state_machine() {
    let rig = rig().await;
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Cod),
        )
        .await
        .unwrap();
    let number = created.order.order_number;

    rig.manager.mark_processing(&number).await.unwrap();
    rig.manager.mark_shipped(&number, None).await.unwrap();
    rig.manager.mark_out_for_delivery(&number).await.unwrap();
    let order = rig.manager.mark_delivered(&number).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    // CREATED + CONFIRMED + 4 transitions
    assert_eq!(order.status_history.len(), 6);
    assert_eq!(rig.notify.shipping_updates_sent(), 3);

    // Delivered is not shippable; error names the valid prior states.
    let err = rig.manager.mark_shipped(&number, None).await.unwrap_err();
    match err {
        AppError::StateConflict(msg) => {
            assert!(msg.contains("CONFIRMED"));
            assert!(msg.contains("PROCESSING"));
        }
        other => panic!("expected StateConflict, got {other:?}"),
    }
}

#[tokio::test]
async fn cancel_restores_stock_and_respects_authorization() {
    let rig = rig_with_gateway(MockGateway::paying("txn_1")).await;
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 2, PaymentMethod::Online),
        )
        .await
        .unwrap();
    let number = created.order.order_number.clone();
    assert_eq!(stock_of(&rig, "KUR-M").await, 8);

    // A stranger cannot cancel.
    let err = rig
        .manager
        .cancel_order(&number, &Actor::user("intruder"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Pay, then cancel as owner: stock back, refund initiated.
    rig.manager.reconcile_payment(&event_for(&created.order)).await.unwrap();
    let cancelled = rig
        .manager
        .cancel_order(&number, &Actor::user("u1"), Some("changed my mind".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&rig, "KUR-M").await, 10);
    assert_eq!(rig.gateway.refunds.load(std::sync::atomic::Ordering::SeqCst), 1);
    let refund = cancelled.payment.refund.unwrap();
    assert_eq!(refund.amount, 1000.0);

    // Terminal orders cannot be cancelled again.
    let err = rig
        .manager
        .cancel_order(&number, &Actor::admin(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));
}

#[tokio::test]
async fn delete_only_while_payment_pending() {
    let rig = rig_with_gateway(MockGateway::paying("txn_1")).await;
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Online),
        )
        .await
        .unwrap();
    let number = created.order.order_number.clone();

    rig.manager.delete_order(&number).await.unwrap();
    assert_eq!(stock_of(&rig, "KUR-M").await, 10);
    assert!(matches!(
        rig.manager.get_order(&number).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    // A paid order refuses deletion.
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Online),
        )
        .await
        .unwrap();
    rig.manager.reconcile_payment(&event_for(&created.order)).await.unwrap();
    let err = rig
        .manager
        .delete_order(&created.order.order_number)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));
}

async fn delivered_paid_order(rig: &super::test_support::TestRig) -> Order {
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 2, PaymentMethod::Online),
        )
        .await
        .unwrap();
    rig.manager.reconcile_payment(&event_for(&created.order)).await.unwrap();
    let number = &created.order.order_number;
    rig.manager.mark_processing(number).await.unwrap();
    rig.manager.mark_shipped(number, None).await.unwrap();
    rig.manager.mark_delivered(number).await.unwrap()
}

#[tokio::test]
async fn return_flow_refunds_and_restores_stock() {
    let rig = rig_with_gateway(MockGateway::paying("txn_1")).await;
    let order = delivered_paid_order(&rig).await;
    let number = order.order_number.clone();
    let owner = Actor::user("u1");

    let request = ReturnRequestInput {
        kind: ReturnKind::Return,
        reason: "Wrong size".to_string(),
        items: vec![ReturnItem {
            variant_sku: "KUR-M".to_string(),
            quantity: 1,
        }],
        refund_amount: None,
    };

    // Over-quantity is rejected up front.
    let mut over = request.clone();
    over.items[0].quantity = 5;
    assert!(matches!(
        rig.manager.request_return_exchange(&number, &owner, over).await.unwrap_err(),
        AppError::Validation(_)
    ));

    let order = rig
        .manager
        .request_return_exchange(&number, &owner, request.clone())
        .await
        .unwrap();
    assert_eq!(order.return_request.as_ref().unwrap().status, ReturnStatus::Pending);

    // Only one open request at a time.
    assert!(matches!(
        rig.manager
            .request_return_exchange(&number, &owner, request)
            .await
            .unwrap_err(),
        AppError::StateConflict(_)
    ));

    // Owner cannot process; admin approves then completes.
    assert!(matches!(
        rig.manager
            .process_return_exchange(&number, &owner, ProcessReturnAction::Approve)
            .await
            .unwrap_err(),
        AppError::Forbidden(_)
    ));
    let order = rig
        .manager
        .process_return_exchange(&number, &Actor::admin(), ProcessReturnAction::Approve)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::ReturnApproved);

    let stock_before = stock_of(&rig, "KUR-M").await;
    let order = rig
        .manager
        .process_return_exchange(&number, &Actor::admin(), ProcessReturnAction::Complete)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Returned);
    assert_eq!(stock_of(&rig, "KUR-M").await, stock_before + 1);
    // Refund computed from the returned line: 1 x 500.
    assert_eq!(rig.gateway.refunds.load(std::sync::atomic::Ordering::SeqCst), 1);
    let refund = order.payment.refund.unwrap();
    assert_eq!(refund.amount, 500.0);
}

#[tokio::test]
async fn rejected_request_restores_previous_status() {
    let rig = rig_with_gateway(MockGateway::paying("txn_1")).await;
    let order = delivered_paid_order(&rig).await;
    let number = order.order_number.clone();

    rig.manager
        .request_return_exchange(
            &number,
            &Actor::user("u1"),
            ReturnRequestInput {
                kind: ReturnKind::Exchange,
                reason: "Color mismatch".to_string(),
                items: vec![ReturnItem {
                    variant_sku: "KUR-M".to_string(),
                    quantity: 1,
                }],
                refund_amount: None,
            },
        )
        .await
        .unwrap();

    let order = rig
        .manager
        .process_return_exchange(&number, &Actor::admin(), ProcessReturnAction::Reject)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.return_request.unwrap().status, ReturnStatus::Rejected);

    // A closed request allows filing a new one.
    rig.manager
        .request_return_exchange(
            &number,
            &Actor::user("u1"),
            ReturnRequestInput {
                kind: ReturnKind::Return,
                reason: "Second thoughts".to_string(),
                items: vec![ReturnItem {
                    variant_sku: "KUR-M".to_string(),
                    quantity: 1,
                }],
                refund_amount: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn guest_orders_can_be_claimed_after_login() {
    let rig = rig().await;
    let mut input = order_input(&rig.product_id, "KUR-M", 1, PaymentMethod::Cod);
    input.guest_session_id = Some("sess-42".to_string());
    rig.manager.create_order(&Actor::default(), input).await.unwrap();

    let moved = rig.manager.claim_guest_orders("sess-42", "u9").await.unwrap();
    assert_eq!(moved, 1);

    let (orders, total) = rig
        .manager
        .list_orders(&OrderQuery {
            user_id: Some("u9".to_string()),
            page: 1,
            per_page: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert!(orders[0].guest_session_id.is_none());

    // Claiming again is a no-op.
    assert_eq!(rig.manager.claim_guest_orders("sess-42", "u9").await.unwrap(), 0);
}

#[tokio::test]
async fn stats_aggregate_revenue_and_top_products() {
    let rig = rig_with_gateway(MockGateway::paying("txn_1")).await;

    // One paid online order (2 x KUR-M) and one unpaid COD order (1 x KUR-L).
    let created = rig
        .manager
        .create_order(
            &Actor::user("u1"),
            order_input(&rig.product_id, "KUR-M", 2, PaymentMethod::Online),
        )
        .await
        .unwrap();
    rig.manager.reconcile_payment(&event_for(&created.order)).await.unwrap();
    rig.manager
        .create_order(
            &Actor::user("u2"),
            order_input(&rig.product_id, "KUR-L", 1, PaymentMethod::Cod),
        )
        .await
        .unwrap();

    let stats = rig.manager.order_stats(5).await.unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.revenue, 1000.0);
    assert_eq!(stats.by_payment_method.get("COD"), Some(&1));
    assert_eq!(stats.by_payment_method.get("ONLINE"), Some(&1));
    assert_eq!(stats.by_status.get("CONFIRMED"), Some(&2));
    assert_eq!(stats.top_products[0].variant_sku, "KUR-M");
    assert_eq!(stats.top_products[0].quantity_sold, 2);
}
