//! Authentication module
//!
//! JWT bearer auth. Admin endpoints require a token with an admin or
//! sub-admin role; cart and checkout accept either a token or a guest
//! session id carried in the payload.

pub mod extractor;
pub mod jwt;

pub use extractor::{OptionalUser, require_admin};
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
