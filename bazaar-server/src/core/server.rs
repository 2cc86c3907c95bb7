//! HTTP server assembly

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api;
use crate::auth::JwtService;
use crate::gateway::{HttpPaymentGateway, PaymentGateway};
use crate::notify::{LogNotificationSink, NotificationSink};
use crate::shipping::{HttpShippingProvider, NoopShippingProvider, ShippingProvider};
use crate::utils::{AppError, AppResult};

use super::config::Config;
use super::state::ServerState;

/// Wire adapters from config, open the database and serve until the
/// process is stopped.
pub async fn run(config: Config) -> AppResult<()> {
    let db = crate::db::connect(&config.work_dir).await?;

    let gateway: Arc<dyn PaymentGateway> = match &config.gateway {
        Some(gw) => Arc::new(
            HttpPaymentGateway::new(gw.base_url.clone(), gw.app_id.clone(), gw.secret.clone())
                .map_err(|e| AppError::internal(format!("Gateway client setup failed: {e}")))?,
        ),
        None => {
            warn!("PAYMENT_GATEWAY_URL not set; online payments will fail at session creation");
            Arc::new(UnconfiguredGateway)
        }
    };

    let shipping: Arc<dyn ShippingProvider> = match &config.shipping {
        Some(sh) => Arc::new(
            HttpShippingProvider::new(sh.base_url.clone(), sh.api_key.clone())
                .map_err(|e| AppError::internal(format!("Shipping client setup failed: {e}")))?,
        ),
        None => Arc::new(NoopShippingProvider),
    };

    let notify: Arc<dyn NotificationSink> = Arc::new(LogNotificationSink);

    let state = ServerState::new(db, JwtService::new(config.jwt.clone()), gateway, shipping, notify);

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install ctrl-c handler");
        return;
    }
    info!("Shutdown signal received, draining connections");
}

/// Placeholder gateway when no credentials are configured; session
/// creation fails cleanly, COD orders keep working.
struct UnconfiguredGateway;

#[async_trait::async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_session(
        &self,
        _order_number: &str,
        _amount: f64,
        _customer_phone: &str,
    ) -> Result<crate::gateway::PaymentSession, crate::gateway::GatewayError> {
        Err(crate::gateway::GatewayError::Request(
            "payment gateway not configured".to_string(),
        ))
    }

    async fn fetch_status(
        &self,
        _order_number: &str,
    ) -> Result<crate::gateway::GatewayPaymentStatus, crate::gateway::GatewayError> {
        Err(crate::gateway::GatewayError::Request(
            "payment gateway not configured".to_string(),
        ))
    }

    async fn initiate_refund(
        &self,
        _order_number: &str,
        _amount: f64,
        _reason: &str,
    ) -> Result<String, crate::gateway::GatewayError> {
        Err(crate::gateway::GatewayError::Request(
            "payment gateway not configured".to_string(),
        ))
    }
}
