use std::collections::HashMap;
use std::sync::RwLock;

use loomtrade_core::{ClientId, CompanyId, SalesmanId, TenantId};
use loomtrade_parties::{ClientProfile, CompanyProfile, Directory, SalesmanProfile};

#[derive(Debug, Default)]
struct Parties {
    clients: HashMap<(TenantId, ClientId), ClientProfile>,
    salesmen: HashMap<(TenantId, SalesmanId), SalesmanProfile>,
    companies: HashMap<(TenantId, CompanyId), CompanyProfile>,
}

/// Directory seeded in-process; lookups never cross tenants.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Parties>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_client(&self, client: ClientProfile) {
        if let Ok(mut parties) = self.inner.write() {
            parties.clients.insert((client.tenant_id, client.id), client);
        }
    }

    pub fn upsert_salesman(&self, salesman: SalesmanProfile) {
        if let Ok(mut parties) = self.inner.write() {
            parties
                .salesmen
                .insert((salesman.tenant_id, salesman.id), salesman);
        }
    }

    pub fn upsert_company(&self, company: CompanyProfile) {
        if let Ok(mut parties) = self.inner.write() {
            parties
                .companies
                .insert((company.tenant_id, company.id), company);
        }
    }
}

impl Directory for InMemoryDirectory {
    fn client(&self, tenant_id: TenantId, id: ClientId) -> Option<ClientProfile> {
        let parties = self.inner.read().ok()?;
        parties.clients.get(&(tenant_id, id)).cloned()
    }

    fn salesman(&self, tenant_id: TenantId, id: SalesmanId) -> Option<SalesmanProfile> {
        let parties = self.inner.read().ok()?;
        parties.salesmen.get(&(tenant_id, id)).cloned()
    }

    fn company(&self, tenant_id: TenantId, id: CompanyId) -> Option<CompanyProfile> {
        let parties = self.inner.read().ok()?;
        parties.companies.get(&(tenant_id, id)).cloned()
    }
}
