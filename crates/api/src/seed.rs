//! Directory and stock fixtures for a development server.
//!
//! The directory and stock ledger are owned by other systems; this loads a
//! JSON snapshot of them into the in-memory backend so the API is usable
//! on its own.

use serde::Deserialize;
use thiserror::Error;

use loomtrade_core::{DomainError, TenantId};
use loomtrade_infra::InMemoryBackend;
use loomtrade_inventory::{ProductId, ProductInfo};
use loomtrade_parties::{ClientProfile, CompanyProfile, SalesmanProfile};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cannot read seed file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("product {product_id}: {source}")]
    Product {
        product_id: ProductId,
        #[source]
        source: DomainError,
    },
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub tenant_id: TenantId,
    pub id: ProductId,
    pub info: ProductInfo,
    pub on_hand: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub companies: Vec<CompanyProfile>,
    pub salesmen: Vec<SalesmanProfile>,
    pub clients: Vec<ClientProfile>,
    pub products: Vec<SeedProduct>,
}

impl Seed {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: &str) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn apply(self, backend: &InMemoryBackend) -> Result<(), SeedError> {
        let counts = (
            self.companies.len(),
            self.salesmen.len(),
            self.clients.len(),
            self.products.len(),
        );

        for company in self.companies {
            backend.directory.upsert_company(company);
        }
        for salesman in self.salesmen {
            backend.directory.upsert_salesman(salesman);
        }
        for client in self.clients {
            backend.directory.upsert_client(client);
        }
        for p in self.products {
            backend
                .stock
                .put_product(p.tenant_id, p.id, p.info, p.on_hand)
                .map_err(|source| SeedError::Product {
                    product_id: p.id,
                    source,
                })?;
        }

        tracing::info!(
            companies = counts.0,
            salesmen = counts.1,
            clients = counts.2,
            products = counts.3,
            "seed data loaded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomtrade_core::AggregateId;
    use loomtrade_inventory::StockLedger;

    #[test]
    fn products_land_in_the_stock_ledger() {
        let tenant = TenantId::new();
        let product = ProductId::new(AggregateId::new());
        let raw = serde_json::json!({
            "products": [{
                "tenant_id": tenant,
                "id": product,
                "info": { "name": "Georgette", "hsn": null, "unit_price": 12_500 },
                "on_hand": 40
            }]
        })
        .to_string();

        let backend = InMemoryBackend::new();
        Seed::from_json(&raw).unwrap().apply(&backend).unwrap();

        assert_eq!(backend.stock.on_hand(tenant, product), Some(40));
        assert!(backend.stock.describe(tenant, product).is_some());
    }

    #[test]
    fn negative_stock_is_rejected() {
        let raw = serde_json::json!({
            "products": [{
                "tenant_id": TenantId::new(),
                "id": ProductId::new(AggregateId::new()),
                "info": { "name": "Voile", "hsn": null, "unit_price": 100 },
                "on_hand": -1
            }]
        })
        .to_string();

        let backend = InMemoryBackend::new();
        let err = Seed::from_json(&raw).unwrap().apply(&backend).unwrap_err();
        assert!(matches!(err, SeedError::Product { .. }));
    }
}
