use std::sync::Arc;

use serde::{Deserialize, Serialize};

use loomtrade_core::{ClientId, CompanyId, ManagerId, SalesmanId, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Display details frozen onto an invoice at issue time.
///
/// Later edits to the client or company never reach an issued invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySnapshot {
    pub name: String,
    pub address: Option<String>,
    pub gstin: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: ClientId,
    pub tenant_id: TenantId,
    pub company_id: CompanyId,
    pub name: String,
    pub contact: ContactInfo,
    pub gstin: Option<String>,
    pub assigned_salesman: Option<SalesmanId>,
    pub status: PartyStatus,
}

impl ClientProfile {
    /// Suspended clients cannot place orders.
    pub fn can_transact(&self) -> bool {
        self.status == PartyStatus::Active
    }

    pub fn snapshot(&self) -> PartySnapshot {
        PartySnapshot {
            name: self.name.clone(),
            address: self.contact.address.clone(),
            gstin: self.gstin.clone(),
            phone: self.contact.phone.clone(),
            email: self.contact.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesmanProfile {
    pub id: SalesmanId,
    pub tenant_id: TenantId,
    pub manager_id: ManagerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: CompanyId,
    pub tenant_id: TenantId,
    pub name: String,
    pub contact: ContactInfo,
    pub gstin: Option<String>,
}

impl CompanyProfile {
    pub fn snapshot(&self) -> PartySnapshot {
        PartySnapshot {
            name: self.name.clone(),
            address: self.contact.address.clone(),
            gstin: self.gstin.clone(),
            phone: self.contact.phone.clone(),
            email: self.contact.email.clone(),
        }
    }
}

/// Tenant-scoped reference resolution.
pub trait Directory: Send + Sync {
    fn client(&self, tenant_id: TenantId, id: ClientId) -> Option<ClientProfile>;
    fn salesman(&self, tenant_id: TenantId, id: SalesmanId) -> Option<SalesmanProfile>;
    fn company(&self, tenant_id: TenantId, id: CompanyId) -> Option<CompanyProfile>;
}

impl<D> Directory for Arc<D>
where
    D: Directory + ?Sized,
{
    fn client(&self, tenant_id: TenantId, id: ClientId) -> Option<ClientProfile> {
        (**self).client(tenant_id, id)
    }

    fn salesman(&self, tenant_id: TenantId, id: SalesmanId) -> Option<SalesmanProfile> {
        (**self).salesman(tenant_id, id)
    }

    fn company(&self, tenant_id: TenantId, id: CompanyId) -> Option<CompanyProfile> {
        (**self).company(tenant_id, id)
    }
}
