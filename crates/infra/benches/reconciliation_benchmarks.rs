use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use loomtrade_auth::Actor;
use loomtrade_core::{AggregateId, ClientId, CompanyId, ManagerId, Money, SalesmanId, TenantId};
use loomtrade_infra::command_dispatcher::CommandDispatcher;
use loomtrade_infra::event_store::InMemoryEventStore;
use loomtrade_infra::reconcile::{Coordinator, ManualPayment, NewOrder, WALLET_AGGREGATE};
use loomtrade_infra::{InMemoryBackend, ReconciliationConfig};
use loomtrade_inventory::{ProductId, ProductInfo};
use loomtrade_parties::{ClientProfile, CompanyProfile, ContactInfo, PartyStatus, SalesmanProfile};
use loomtrade_payments::PaymentMethod;
use loomtrade_sales::{LineDraft, OrderId};
use loomtrade_wallet::{CoinRate, CreditWallet, Wallet, WalletCommand, WalletId};
use std::sync::Arc;

struct Shop {
    coordinator: Coordinator<Arc<InMemoryEventStore>>,
    tenant: TenantId,
    salesman: Actor,
    client_id: ClientId,
    product: ProductId,
}

fn setup_shop() -> Shop {
    let backend = InMemoryBackend::new();
    let coordinator = backend.coordinator(ReconciliationConfig::default());

    let tenant = TenantId::new();
    let manager_id = ManagerId::new();
    let salesman_id = SalesmanId::new();
    let company_id = CompanyId::new();
    let client_id = ClientId::new();

    backend.directory.upsert_salesman(SalesmanProfile {
        id: salesman_id,
        tenant_id: tenant,
        manager_id,
        name: "Bench".to_string(),
    });
    backend.directory.upsert_company(CompanyProfile {
        id: company_id,
        tenant_id: tenant,
        name: "Bench Mills".to_string(),
        contact: ContactInfo::default(),
        gstin: None,
    });
    backend.directory.upsert_client(ClientProfile {
        id: client_id,
        tenant_id: tenant,
        company_id,
        name: "Bench Client".to_string(),
        contact: ContactInfo::default(),
        gstin: None,
        assigned_salesman: Some(salesman_id),
        status: PartyStatus::Active,
    });

    let product = ProductId::new(AggregateId::new());
    backend
        .stock
        .put_product(
            tenant,
            product,
            ProductInfo {
                name: "Rayon".to_string(),
                hsn: None,
                unit_price: Money::from_paise(10_000),
            },
            i64::MAX / 2,
        )
        .unwrap();

    Shop {
        coordinator,
        tenant,
        salesman: Actor::Salesman(salesman_id),
        client_id,
        product,
    }
}

impl Shop {
    fn place(&self, quantity: i64) -> OrderId {
        self.coordinator
            .create_order(
                &self.salesman,
                self.tenant,
                NewOrder {
                    client_id: self.client_id,
                    lines: vec![LineDraft {
                        product_id: self.product,
                        quantity,
                        unit_price: None,
                    }],
                },
            )
            .unwrap()
            .id_typed()
    }

    fn pay(&self, order_id: OrderId, paise: u64) {
        self.coordinator
            .record_payment(
                &self.salesman,
                self.tenant,
                ManualPayment {
                    order_id,
                    amount: Money::from_paise(paise),
                    method: PaymentMethod::Cash,
                    reference: None,
                    note: None,
                },
            )
            .unwrap();
    }
}

fn bench_order_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_placement");
    group.throughput(Throughput::Elements(1));

    group.bench_function("create_order_single_line", |b| {
        let shop = setup_shop();
        b.iter(|| black_box(shop.place(black_box(3))));
    });

    group.finish();
}

/// Full unit: order update, invoice issue and render.
fn bench_payment_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("payment_recording");
    group.throughput(Throughput::Elements(1));

    group.bench_function("full_payment_with_invoice", |b| {
        let shop = setup_shop();
        b.iter(|| {
            let order_id = shop.place(1);
            shop.pay(order_id, black_box(10_000));
        });
    });

    // Later payments rehydrate a longer order stream.
    for prior in [1usize, 10, 50] {
        group.bench_with_input(
            BenchmarkId::new("installment_after_prior_payments", prior),
            &prior,
            |b, &prior| {
                let shop = setup_shop();
                b.iter_batched(
                    || {
                        let order_id = shop.place(prior as i64 + 1);
                        for _ in 0..prior {
                            shop.pay(order_id, 10_000);
                        }
                        order_id
                    },
                    |order_id| shop.pay(order_id, 10_000),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_wallet_rehydration(c: &mut Criterion) {
    let mut group = c.benchmark_group("wallet_rehydration");

    for credits in [10usize, 100, 1_000] {
        let store = Arc::new(InMemoryEventStore::new());
        let dispatcher = CommandDispatcher::new(store);
        let tenant_id = TenantId::new();
        let manager_id = ManagerId::new();
        let wallet_id = WalletId::for_manager(manager_id);

        for n in 0..credits {
            let command = WalletCommand::CreditWallet(CreditWallet {
                tenant_id,
                wallet_id,
                manager_id,
                source_reference: format!("pay_{n}"),
                amount: Money::from_paise(50_000),
                rate: CoinRate::default(),
                occurred_at: Utc::now(),
            });
            dispatcher
                .dispatch(tenant_id, wallet_id.0, WALLET_AGGREGATE, &command, |_, id| {
                    Wallet::empty(WalletId(id))
                })
                .unwrap();
        }

        group.throughput(Throughput::Elements(credits as u64));
        group.bench_with_input(BenchmarkId::from_parameter(credits), &credits, |b, _| {
            b.iter(|| {
                let wallet = dispatcher
                    .load(tenant_id, wallet_id.0, |_, id| Wallet::empty(WalletId(id)))
                    .unwrap();
                black_box(wallet.balance())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_order_placement,
    bench_payment_recording,
    bench_wallet_rehydration
);
criterion_main!(benches);
