use thiserror::Error;

use loomtrade_core::{DomainError, SalesmanId, TenantId};

use crate::Actor;

/// The facts about an order that access decisions depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderScope {
    pub tenant_id: TenantId,
    pub order_ref: String,
    pub creator: Actor,
    /// Salesman the order's client is currently assigned to, if any.
    pub client_salesman: Option<SalesmanId>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("salesman {salesman} neither created order {order_ref} nor owns its client")]
    NotOrderOwner {
        salesman: SalesmanId,
        order_ref: String,
    },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::forbidden(value.to_string())
    }
}

/// Decide whether `actor` may act on (record payments against, cancel, view)
/// the order described by `scope`.
///
/// Managers may act on any order of their own tenant. A salesman may act only
/// on orders they created or whose client is assigned to them.
pub fn authorize_order_access(
    actor: &Actor,
    actor_tenant: TenantId,
    scope: &OrderScope,
) -> Result<(), AuthzError> {
    if actor_tenant != scope.tenant_id {
        return Err(AuthzError::TenantMismatch);
    }

    match actor {
        Actor::Manager(_) => Ok(()),
        Actor::Salesman(id) => {
            let created_it = scope.creator == *actor;
            let owns_client = scope.client_salesman == Some(*id);
            if created_it || owns_client {
                Ok(())
            } else {
                Err(AuthzError::NotOrderOwner {
                    salesman: *id,
                    order_ref: scope.order_ref.clone(),
                })
            }
        }
    }
}
