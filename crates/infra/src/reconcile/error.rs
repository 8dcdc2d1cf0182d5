use thiserror::Error;

use loomtrade_auth::AuthzError;
use loomtrade_core::DomainError;
use loomtrade_invoicing::RenderError;
use loomtrade_payments::GatewayError;

use crate::command_dispatcher::DispatchError;
use crate::stores::StoreError;

/// Failure of a reconciliation operation.
///
/// Post-commit actions (invoice generation, wallet credit) never produce
/// one of these for the payment caller; their failures are reported in the
/// receipt instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Security event: the checkout confirmation was not signed with our key.
    #[error("gateway signature mismatch")]
    GatewaySignatureMismatch,

    #[error("payment gateway: {0}")]
    Gateway(GatewayError),

    #[error("invoice {invoice_id} could not be rendered: {source}")]
    Render {
        invoice_id: String,
        #[source]
        source: RenderError,
    },

    #[error("artifact {locator} of invoice {invoice_id} is missing from storage")]
    ArtifactMissing { invoice_id: String, locator: String },

    #[error("concurrent updates to {entity} {id}; try again")]
    Conflict { entity: &'static str, id: String },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl ReconcileError {
    pub(crate) fn from_dispatch(entity: &'static str, id: impl ToString, err: DispatchError) -> Self {
        match err {
            DispatchError::Domain(e) => ReconcileError::Domain(e),
            DispatchError::Concurrency { .. } => ReconcileError::Conflict {
                entity,
                id: id.to_string(),
            },
            other => ReconcileError::Storage(other.to_string()),
        }
    }
}

impl From<GatewayError> for ReconcileError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::SignatureMismatch => ReconcileError::GatewaySignatureMismatch,
            other => ReconcileError::Gateway(other),
        }
    }
}

impl From<AuthzError> for ReconcileError {
    fn from(value: AuthzError) -> Self {
        ReconcileError::Domain(value.into())
    }
}

impl From<StoreError> for ReconcileError {
    fn from(value: StoreError) -> Self {
        ReconcileError::Storage(value.to_string())
    }
}
