//! Order lifecycle manager
//!
//! One [`OrderManager`] owns every order operation: creation, payment
//! reconciliation, fulfillment transitions, cancellation, returns and
//! reporting. Each operation lives in its own file; the manager struct
//! and cross-cutting helpers live in `manager.rs`.

pub mod cancel;
pub mod create;
pub mod manager;
pub mod reconcile;
pub mod returns;
pub mod stats;
pub mod transitions;

pub use create::CreatedOrder;
pub use manager::{Actor, OrderManager};
pub use reconcile::ReconcileOutcome;
pub use returns::{ProcessReturnAction, ReturnRequestInput};
pub use stats::OrderStats;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests;
