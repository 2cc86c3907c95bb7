//! JWT extractors
//!
//! [`CurrentUser`] rejects unauthenticated requests; [`OptionalUser`]
//! yields `None` for anonymous callers so guest checkout and carts can
//! share handlers with authenticated users.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => return Err(AppError::Unauthorized),
        };

        match state.jwt().validate_token(token) {
            Ok(claims) => {
                let user = CurrentUser::from(claims);
                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(JwtError::ExpiredToken) => Err(AppError::TokenExpired),
            Err(_) => Err(AppError::invalid_token("Invalid token")),
        }
    }
}

/// Optional variant: missing header means anonymous, a present but
/// invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<CurrentUser>);

impl FromRequestParts<ServerState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let has_header = parts.headers.contains_key(header::AUTHORIZATION);
        if !has_header {
            return Ok(OptionalUser(None));
        }
        CurrentUser::from_request_parts(parts, state)
            .await
            .map(|user| OptionalUser(Some(user)))
    }
}

/// Admin gate used by management handlers.
pub fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin access required"))
    }
}
