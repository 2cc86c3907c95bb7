//! Server configuration
//!
//! Everything comes from environment variables (a `.env` file is loaded
//! first when present).
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | ./data-dir | Database and log directory |
//! | HTTP_PORT | 3000 | HTTP listen port |
//! | JWT_SECRET | (required) | Token signing secret, >= 32 chars |
//! | JWT_EXPIRATION_MINUTES | 1440 | Token lifetime |
//! | PAYMENT_GATEWAY_URL | (unset) | Gateway base URL; unset = no online payments |
//! | PAYMENT_GATEWAY_APP_ID | | Gateway client id |
//! | PAYMENT_GATEWAY_SECRET | | Gateway client secret |
//! | SHIPPING_API_URL | (unset) | Shipping aggregator URL; unset = noop provider |
//! | SHIPPING_API_KEY | | Shipping API key |
//! | LOG_TO_FILE | false | Also write daily-rolled log files under WORK_DIR/logs |

use crate::auth::{JwtConfig, JwtError};

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub app_id: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct ShippingConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub jwt: JwtConfig,
    pub gateway: Option<GatewayConfig>,
    pub shipping: Option<ShippingConfig>,
    pub log_to_file: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, JwtError> {
        dotenv::dotenv().ok();

        let gateway = match std::env::var("PAYMENT_GATEWAY_URL") {
            Ok(base_url) if !base_url.is_empty() => Some(GatewayConfig {
                base_url,
                app_id: std::env::var("PAYMENT_GATEWAY_APP_ID").unwrap_or_default(),
                secret: std::env::var("PAYMENT_GATEWAY_SECRET").unwrap_or_default(),
            }),
            _ => None,
        };

        let shipping = match std::env::var("SHIPPING_API_URL") {
            Ok(base_url) if !base_url.is_empty() => Some(ShippingConfig {
                base_url,
                api_key: std::env::var("SHIPPING_API_KEY").unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data-dir".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::from_env()?,
            gateway,
            shipping,
            log_to_file: std::env::var("LOG_TO_FILE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}
