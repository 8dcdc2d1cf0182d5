//! `loomtrade-auth`: who is acting, and may they touch this order.
//!
//! Decoupled from HTTP and storage: the API resolves an [`Actor`] once from a
//! verified token and passes it explicitly into every core operation.

pub mod actor;
pub mod authorize;
pub mod claims;

pub use actor::{Actor, ActorKind};
pub use authorize::{AuthzError, OrderScope, authorize_order_access};
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
