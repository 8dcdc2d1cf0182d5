use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use loomtrade_auth::{ActorKind, JwtClaims};
use loomtrade_core::{AggregateId, ClientId, CompanyId, ManagerId, Money, SalesmanId, TenantId};
use loomtrade_infra::{InMemoryBackend, ReconciliationConfig};
use loomtrade_inventory::{ProductId, ProductInfo};
use loomtrade_parties::{ClientProfile, CompanyProfile, ContactInfo, PartyStatus, SalesmanProfile};
use loomtrade_payments::{GatewayNotes, GatewayOrder, checkout_signature};

const JWT_SECRET: &str = "test-secret";
const GATEWAY_SECRET: &str = "gateway-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(backend: InMemoryBackend) -> Self {
        let config = ReconciliationConfig {
            gateway_key_secret: Some(GATEWAY_SECRET.to_string()),
            ..ReconciliationConfig::default()
        };
        // Same router as prod, bound to an ephemeral port.
        let app = loomtrade_api::app::build_app_with(JWT_SECRET.to_string(), backend, config);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(tenant_id: TenantId, role: ActorKind, sub: Uuid) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        tenant_id,
        role,
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// One tenant with a manager, their salesman, a client assigned to the
/// salesman and one product priced at 50.00 with 100 in stock.
struct Shop {
    backend: InMemoryBackend,
    tenant: TenantId,
    manager_token: String,
    salesman_token: String,
    client_id: ClientId,
    product_id: ProductId,
}

fn seed_shop() -> Shop {
    let backend = InMemoryBackend::new();
    let tenant = TenantId::new();
    let manager_id = ManagerId::new();
    let salesman_id = SalesmanId::new();
    let company_id = CompanyId::new();
    let client_id = ClientId::new();
    let product_id = ProductId::new(AggregateId::new());

    backend.directory.upsert_company(CompanyProfile {
        id: company_id,
        tenant_id: tenant,
        name: "Loom Works".to_string(),
        contact: ContactInfo::default(),
        gstin: None,
    });
    backend.directory.upsert_salesman(SalesmanProfile {
        id: salesman_id,
        tenant_id: tenant,
        manager_id,
        name: "Ravi".to_string(),
    });
    backend.directory.upsert_client(ClientProfile {
        id: client_id,
        tenant_id: tenant,
        company_id,
        name: "Shree Textiles".to_string(),
        contact: ContactInfo::default(),
        gstin: None,
        assigned_salesman: Some(salesman_id),
        status: PartyStatus::Active,
    });
    backend
        .stock
        .put_product(
            tenant,
            product_id,
            ProductInfo {
                name: "Cotton poplin".to_string(),
                hsn: Some("5208".to_string()),
                unit_price: Money::from_paise(5_000),
            },
            100,
        )
        .unwrap();

    Shop {
        manager_token: mint_jwt(tenant, ActorKind::Manager, *manager_id.as_uuid()),
        salesman_token: mint_jwt(tenant, ActorKind::Salesman, *salesman_id.as_uuid()),
        backend,
        tenant,
        client_id,
        product_id,
    }
}

async fn place_order(client: &reqwest::Client, srv: &TestServer, shop: &Shop) -> String {
    let res = client
        .post(srv.url("/orders"))
        .bearer_auth(&shop.salesman_token)
        .json(&json!({
            "client_id": shop.client_id.to_string(),
            "lines": [{ "product_id": shop.product_id.to_string(), "quantity": 10 }],
        }))
        .send()
        .await
        .unwrap();
    if res.status() != StatusCode::CREATED {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        panic!("expected 201 from create order, got {status} body={body}");
    }
    let order: serde_json::Value = res.json().await.unwrap();
    assert_eq!(order["total_amount"], "500.00");
    assert_eq!(order["payment_status"], "unpaid");
    order["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn(InMemoryBackend::new()).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn actor_and_tenant_come_from_the_token() {
    let srv = TestServer::spawn(InMemoryBackend::new()).await;
    let tenant_id = TenantId::new();
    let sub = Uuid::now_v7();
    let token = mint_jwt(tenant_id, ActorKind::Salesman, sub);

    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["tenant_id"].as_str().unwrap(), tenant_id.to_string());
    assert_eq!(body["actor"]["kind"], "salesman");
    assert_eq!(body["actor"]["id"].as_str().unwrap(), sub.to_string());
}

#[tokio::test]
async fn partial_payment_issues_invoice_and_overpayment_is_rejected() {
    let shop = seed_shop();
    let srv = TestServer::spawn(shop.backend.clone()).await;
    let client = reqwest::Client::new();
    let order_id = place_order(&client, &srv, &shop).await;

    let res = client
        .post(srv.url(&format!("/orders/{order_id}/payments")))
        .bearer_auth(&shop.salesman_token)
        .json(&json!({ "amount": "200", "method": "upi", "reference": "UTR-77" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let receipt: serde_json::Value = res.json().await.unwrap();
    assert_eq!(receipt["order"]["paid_amount"], "200.00");
    assert_eq!(receipt["order"]["due_amount"], "300.00");
    assert_eq!(receipt["order"]["payment_status"], "partial");
    assert_eq!(receipt["payment"]["status"], "confirmed");
    assert_eq!(receipt["invoice"]["status"], "completed");
    assert_eq!(receipt["invoice"]["result"]["total_amount"], "200.00");
    assert_eq!(receipt["invoice"]["result"]["lines"][0]["quantity"], 4);
    assert_eq!(receipt["wallet"]["status"], "skipped");
    let invoice_id = receipt["invoice"]["result"]["id"].as_str().unwrap().to_string();

    // More than the 300.00 still due.
    let res = client
        .post(srv.url(&format!("/orders/{order_id}/payments")))
        .bearer_auth(&shop.salesman_token)
        .json(&json!({ "amount": 400.5, "method": "cash" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "overpayment_rejected");

    let res = client
        .get(srv.url(&format!("/orders/{order_id}/payments")))
        .bearer_auth(&shop.manager_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url(&format!("/orders/{order_id}/invoices")))
        .bearer_auth(&shop.manager_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"][0]["id"].as_str().unwrap(), invoice_id);

    let res = client
        .get(srv.url(&format!("/invoices/{invoice_id}/download")))
        .bearer_auth(&shop.salesman_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[reqwest::header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment"));
    assert!(!res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn other_tenants_cannot_see_or_pay_an_order() {
    let shop = seed_shop();
    let srv = TestServer::spawn(shop.backend.clone()).await;
    let client = reqwest::Client::new();
    let order_id = place_order(&client, &srv, &shop).await;

    let outsider = mint_jwt(TenantId::new(), ActorKind::Manager, Uuid::now_v7());

    let res = client
        .get(srv.url(&format!("/orders/{order_id}")))
        .bearer_auth(&outsider)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url(&format!("/orders/{order_id}/payments")))
        .bearer_auth(&outsider)
        .json(&json!({ "amount": "10", "method": "cash" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // A salesman of the same tenant who neither created the order nor owns its client.
    let stranger = mint_jwt(shop.tenant, ActorKind::Salesman, Uuid::now_v7());
    let res = client
        .get(srv.url(&format!("/orders/{order_id}")))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn gateway_confirmation_settles_once_and_credits_the_manager() {
    let shop = seed_shop();
    let srv = TestServer::spawn(shop.backend.clone()).await;
    let client = reqwest::Client::new();
    let order_id = place_order(&client, &srv, &shop).await;

    shop.backend.gateway.register_order(GatewayOrder {
        id: "order_gw1".to_string(),
        amount_paise: 50_000,
        currency: "INR".to_string(),
        notes: GatewayNotes {
            internal_order_id: Some(order_id.clone()),
        },
    });

    let forged = json!({
        "gateway_order_id": "order_gw1",
        "gateway_payment_id": "pay_gw1",
        "signature": "00",
    });
    let res = client
        .post(srv.url("/payments/gateway/verify"))
        .bearer_auth(&shop.salesman_token)
        .json(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let confirmation = json!({
        "gateway_order_id": "order_gw1",
        "gateway_payment_id": "pay_gw1",
        "signature": checkout_signature(GATEWAY_SECRET, "order_gw1", "pay_gw1").unwrap(),
    });
    let res = client
        .post(srv.url("/payments/gateway/verify"))
        .bearer_auth(&shop.salesman_token)
        .json(&confirmation)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let receipt: serde_json::Value = res.json().await.unwrap();
    assert_eq!(receipt["duplicate"], false);
    assert_eq!(receipt["order"]["payment_status"], "paid");
    assert_eq!(receipt["order"]["status"], "completed");
    assert_eq!(receipt["wallet"]["result"]["coins"], 500);

    let res = client
        .post(srv.url("/payments/gateway/verify"))
        .bearer_auth(&shop.salesman_token)
        .json(&confirmation)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let again: serde_json::Value = res.json().await.unwrap();
    assert_eq!(again["duplicate"], true);
    assert_eq!(again["payment"]["id"], receipt["payment"]["id"]);

    let res = client
        .get(srv.url("/wallet"))
        .bearer_auth(&shop.manager_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let wallet: serde_json::Value = res.json().await.unwrap();
    assert_eq!(wallet["balance"], 500);
    assert_eq!(wallet["entries"].as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url("/wallet"))
        .bearer_auth(&shop.salesman_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cancelling_returns_stock_and_status_only_moves_forward() {
    let shop = seed_shop();
    let srv = TestServer::spawn(shop.backend.clone()).await;
    let client = reqwest::Client::new();
    let order_id = place_order(&client, &srv, &shop).await;
    assert_eq!(shop.backend.stock.on_hand(shop.tenant, shop.product_id), Some(90));

    let res = client
        .post(srv.url(&format!("/orders/{order_id}/status")))
        .bearer_auth(&shop.manager_token)
        .json(&json!({ "status": "processing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url(&format!("/orders/{order_id}/status")))
        .bearer_auth(&shop.manager_token)
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .post(srv.url(&format!("/orders/{order_id}/cancel")))
        .bearer_auth(&shop.manager_token)
        .json(&json!({ "reason": "client withdrew" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let order: serde_json::Value = res.json().await.unwrap();
    assert_eq!(order["status"], "cancelled");
    assert_eq!(shop.backend.stock.on_hand(shop.tenant, shop.product_id), Some(100));
}
