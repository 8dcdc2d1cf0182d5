use std::sync::Arc;

use chrono::Utc;

use loomtrade_auth::{Actor, OrderScope, authorize_order_access};
use loomtrade_core::{AggregateId, DomainError, Money, PaymentId, TenantId};
use loomtrade_inventory::{StockLedger, StockRequest};
use loomtrade_invoicing::{
    Invoice, InvoiceId, InvoiceRenderer, derive_invoice, format_invoice_number,
};
use loomtrade_parties::Directory;
use loomtrade_payments::{
    CheckoutConfirmation, GatewayError, NewPayment, Payment, PaymentGateway, PaymentMethod,
    ReceivedBy, verify_checkout_signature,
};
use loomtrade_sales::{
    ApplyPayment, CancelOrder, ChangeStatus, Order, OrderCommand, OrderId, OrderLine, OrderStatus,
    PlaceOrder, price_lines,
};
use loomtrade_wallet::{CreditWallet, Wallet, WalletCommand, WalletId};

use crate::command_dispatcher::CommandDispatcher;
use crate::config::ReconciliationConfig;
use crate::event_store::EventStore;
use crate::stores::{ArtifactStore, InvoiceStore, PaymentInsert, PaymentStore};

use super::error::ReconcileError;
use super::outcome::{ActionOutcome, InvoiceDownload, PaymentReceipt, WalletCredit, WalletView};
use super::requests::{GatewayPayment, ManualPayment, NewOrder};

pub const ORDER_AGGREGATE: &str = "sales.order";
pub const WALLET_AGGREGATE: &str = "wallet.manager";

const GATEWAY_CURRENCY: &str = "INR";

/// Everything the coordinator talks to besides the event store.
#[derive(Clone)]
pub struct Collaborators {
    pub stock: Arc<dyn StockLedger>,
    pub directory: Arc<dyn Directory>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub renderer: Arc<dyn InvoiceRenderer>,
    pub payments: Arc<dyn PaymentStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

/// Runs "record payment, update order, issue invoice, credit wallet" as one
/// logical unit.
///
/// The order update is the only critical write. Invoice generation and the
/// wallet credit run after it commits, each inside its own failure boundary;
/// their outcomes are returned in the [`PaymentReceipt`] and never turn a
/// committed payment into an error.
pub struct Coordinator<S> {
    dispatcher: CommandDispatcher<S>,
    ports: Collaborators,
    config: ReconciliationConfig,
}

impl<S> Coordinator<S>
where
    S: EventStore,
{
    pub fn new(store: S, ports: Collaborators, config: ReconciliationConfig) -> Self {
        let dispatcher =
            CommandDispatcher::new(store).with_max_attempts(config.max_dispatch_attempts);
        Self {
            dispatcher,
            ports,
            config,
        }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Price the lines, reserve stock for all of them and place the order.
    ///
    /// Nothing is reserved unless every line fits; if the order cannot be
    /// persisted after reserving, the reservation is handed back.
    pub fn create_order(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        request: NewOrder,
    ) -> Result<Order, ReconcileError> {
        let client = self
            .ports
            .directory
            .client(tenant_id, request.client_id)
            .ok_or_else(|| DomainError::not_found("client", request.client_id))?;
        if !client.can_transact() {
            return Err(DomainError::validation(format!("client {} is suspended", client.id)).into());
        }

        let manager_id = match actor {
            Actor::Manager(id) => *id,
            Actor::Salesman(id) => {
                if client.assigned_salesman != Some(*id) {
                    return Err(DomainError::forbidden(format!(
                        "client {} is not assigned to salesman {id}",
                        client.id
                    ))
                    .into());
                }
                self.ports
                    .directory
                    .salesman(tenant_id, *id)
                    .ok_or_else(|| DomainError::not_found("salesman", id))?
                    .manager_id
            }
        };

        let lines = price_lines(&request.lines, |p| self.ports.stock.unit_price(tenant_id, p))?;
        let requests: Vec<StockRequest> = lines.iter().map(OrderLine::stock_request).collect();
        self.ports.stock.reserve(tenant_id, &requests)?;

        let order_id = OrderId::new(AggregateId::new());
        let command = OrderCommand::PlaceOrder(PlaceOrder {
            tenant_id,
            order_id,
            client_id: client.id,
            company_id: client.company_id,
            manager_id,
            creator: *actor,
            lines,
            occurred_at: Utc::now(),
        });

        match self.dispatch_order(tenant_id, order_id, &command) {
            Ok(order) => {
                tracing::info!(
                    %order_id,
                    client_id = %client.id,
                    total = %order.total_amount(),
                    lines = order.lines().len(),
                    "order placed"
                );
                Ok(order)
            }
            Err(err) => {
                if let Err(release_err) = self.ports.stock.release(tenant_id, &requests) {
                    tracing::error!(%order_id, "stock release after failed placement failed: {release_err}");
                }
                Err(err)
            }
        }
    }

    pub fn get_order(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Order, ReconcileError> {
        let order = self.load_order(tenant_id, order_id)?;
        self.authorize(actor, tenant_id, &order)?;
        Ok(order)
    }

    /// Forward status move (pending, confirmed, processing, completed).
    pub fn change_status(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<Order, ReconcileError> {
        let order = self.load_order(tenant_id, order_id)?;
        self.authorize(actor, tenant_id, &order)?;

        let command = OrderCommand::ChangeStatus(ChangeStatus {
            tenant_id,
            order_id,
            target,
            occurred_at: Utc::now(),
        });
        let order = self.dispatch_order(tenant_id, order_id, &command)?;
        tracing::info!(%order_id, status = %order.status(), "order status changed");
        Ok(order)
    }

    /// Cancel an unpaid order and hand its stock back.
    pub fn cancel_order(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<Order, ReconcileError> {
        let order = self.load_order(tenant_id, order_id)?;
        self.authorize(actor, tenant_id, &order)?;

        let command = OrderCommand::CancelOrder(CancelOrder {
            tenant_id,
            order_id,
            reason,
            occurred_at: Utc::now(),
        });
        let order = self.dispatch_order(tenant_id, order_id, &command)?;

        if let Err(err) = self.ports.stock.release(tenant_id, &order.stock_requests()) {
            tracing::warn!(%order_id, "stock release after cancellation failed: {err}");
        }
        tracing::info!(%order_id, "order cancelled");
        Ok(order)
    }

    /// Record a payment taken by a manager or salesman.
    pub fn record_payment(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        request: ManualPayment,
    ) -> Result<PaymentReceipt, ReconcileError> {
        let order = self.load_order(tenant_id, request.order_id)?;
        self.authorize(actor, tenant_id, &order)?;

        if request.amount.is_zero() {
            return Err(DomainError::validation("payment amount must be > 0").into());
        }
        if request.method == PaymentMethod::Gateway {
            return Err(DomainError::validation(
                "gateway payments are recorded through checkout verification",
            )
            .into());
        }
        order.apply_payment(request.amount)?;

        let payment = Payment::pending(NewPayment {
            tenant_id,
            order_id: request.order_id,
            client_id: client_of(&order)?,
            amount: request.amount,
            method: request.method,
            reference: request.reference,
            note: request.note,
            received_by: ReceivedBy::from(*actor),
            occurred_at: Utc::now(),
        })?;

        let payment = match self.ports.payments.insert(payment)? {
            PaymentInsert::Inserted(p) => p,
            PaymentInsert::Duplicate(existing) => {
                return Err(DomainError::conflict(format!(
                    "payment {} already holds this record",
                    existing.id
                ))
                .into());
            }
        };

        let (payment, order) = self.settle(payment)?;
        let invoice = self.generate_invoice(&order, &payment);

        Ok(PaymentReceipt {
            payment,
            order,
            duplicate: false,
            invoice,
            wallet: ActionOutcome::skipped("manual payments earn no wallet credit"),
        })
    }

    /// Record a gateway-proven payment, at most once per gateway reference.
    pub fn record_gateway_payment(
        &self,
        tenant_id: TenantId,
        request: GatewayPayment,
    ) -> Result<PaymentReceipt, ReconcileError> {
        if request.amount.is_zero() {
            return Err(DomainError::validation("payment amount must be > 0").into());
        }
        let reference = request.reference.trim();
        if reference.is_empty() {
            return Err(DomainError::validation("gateway reference is required").into());
        }

        // A failed attempt is not returned here; the insert below replaces it.
        if let Some(existing) = self.ports.payments.find_by_gateway_reference(reference)? {
            return self.duplicate_receipt(tenant_id, existing);
        }

        let order = self.load_order(tenant_id, request.order_id)?;
        order.apply_payment(request.amount)?;

        let payment = Payment::pending(NewPayment {
            tenant_id,
            order_id: request.order_id,
            client_id: client_of(&order)?,
            amount: request.amount,
            method: PaymentMethod::Gateway,
            reference: Some(reference.to_string()),
            note: None,
            received_by: ReceivedBy::Gateway,
            occurred_at: Utc::now(),
        })?;

        // Lost the race with a concurrent confirmation of the same payment.
        let payment = match self.ports.payments.insert(payment)? {
            PaymentInsert::Inserted(p) => p,
            PaymentInsert::Duplicate(existing) => return self.duplicate_receipt(tenant_id, existing),
        };

        let (payment, order) = self.settle(payment)?;
        let invoice = self.generate_invoice(&order, &payment);
        let wallet = self.credit_wallet(&order, &payment);

        Ok(PaymentReceipt {
            payment,
            order,
            duplicate: false,
            invoice,
            wallet,
        })
    }

    /// Checkout callback: prove the confirmation, read the gateway's view of
    /// the order and record the payment.
    ///
    /// Signature and fetch failures return before anything is written.
    pub fn verify_gateway_payment(
        &self,
        tenant_id: TenantId,
        confirmation: &CheckoutConfirmation,
    ) -> Result<PaymentReceipt, ReconcileError> {
        let secret = self.config.gateway_key_secret.as_deref().ok_or_else(|| {
            GatewayError::InvalidKey("GATEWAY_KEY_SECRET is not configured".to_string())
        })?;

        if let Err(err) = verify_checkout_signature(secret, confirmation) {
            tracing::warn!(
                %tenant_id,
                gateway_order_id = %confirmation.gateway_order_id,
                "rejected gateway confirmation: {err}"
            );
            return Err(err.into());
        }

        let gateway_order = self
            .ports
            .gateway
            .fetch_order(&confirmation.gateway_order_id)?;

        if !gateway_order.currency.eq_ignore_ascii_case(GATEWAY_CURRENCY) {
            return Err(DomainError::validation(format!(
                "gateway order {} is in {}, expected {GATEWAY_CURRENCY}",
                gateway_order.id, gateway_order.currency
            ))
            .into());
        }

        let order_id: OrderId = gateway_order
            .notes
            .internal_order_id
            .as_deref()
            .ok_or_else(|| GatewayError::MissingInternalOrder(gateway_order.id.clone()))?
            .parse()?;

        self.record_gateway_payment(
            tenant_id,
            GatewayPayment {
                order_id,
                amount: Money::from_paise(gateway_order.amount_paise),
                reference: confirmation.gateway_payment_id.clone(),
            },
        )
    }

    pub fn list_payments(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, ReconcileError> {
        let order = self.load_order(tenant_id, order_id)?;
        self.authorize(actor, tenant_id, &order)?;
        Ok(self.ports.payments.list_for_order(tenant_id, order_id)?)
    }

    pub fn get_payment(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Payment, ReconcileError> {
        let payment = self
            .ports
            .payments
            .get(tenant_id, payment_id)?
            .ok_or_else(|| DomainError::not_found("payment", payment_id))?;
        let order = self.load_order(tenant_id, payment.order_id)?;
        self.authorize(actor, tenant_id, &order)?;
        Ok(payment)
    }

    pub fn get_invoice(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<Invoice, ReconcileError> {
        let invoice = self
            .ports
            .invoices
            .get(tenant_id, invoice_id)?
            .ok_or_else(|| DomainError::not_found("invoice", invoice_id))?;
        let order = self.load_order(tenant_id, invoice.order_id)?;
        self.authorize(actor, tenant_id, &order)?;
        Ok(invoice)
    }

    pub fn invoices_for_order(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Invoice>, ReconcileError> {
        let order = self.load_order(tenant_id, order_id)?;
        self.authorize(actor, tenant_id, &order)?;
        Ok(self.ports.invoices.list_for_order(tenant_id, order_id)?)
    }

    /// Rendered invoice bytes. An invoice whose earlier render failed is
    /// rendered now and the outcome recorded; one marked generated whose
    /// blob is gone is `ArtifactMissing`.
    pub fn download_invoice_artifact(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceDownload, ReconcileError> {
        let mut invoice = self.get_invoice(actor, tenant_id, invoice_id)?;

        if let Some(locator) = invoice.locator() {
            let stored = self.ports.artifacts.get(locator)?.ok_or_else(|| {
                ReconcileError::ArtifactMissing {
                    invoice_id: invoice.id.to_string(),
                    locator: locator.to_string(),
                }
            })?;
            return Ok(InvoiceDownload {
                file_name: file_name_of(locator),
                content_type: stored.content_type,
                bytes: stored.bytes,
            });
        }

        let rendered = self.render_and_store(&mut invoice);
        self.ports.invoices.update(&invoice)?;
        rendered
    }

    /// Coin balance of the acting manager.
    pub fn wallet_balance(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
    ) -> Result<WalletView, ReconcileError> {
        let manager_id = actor
            .as_manager()
            .ok_or_else(|| DomainError::forbidden("only managers hold wallets"))?;
        let wallet_id = WalletId::for_manager(manager_id);

        let wallet = self
            .dispatcher
            .load(tenant_id, wallet_id.0, |_, id| Wallet::empty(WalletId(id)))
            .map_err(|e| ReconcileError::from_dispatch("wallet", wallet_id, e))?;

        Ok(WalletView {
            manager_id,
            balance: wallet.balance(),
            entries: wallet.entries().to_vec(),
        })
    }

    fn load_order(&self, tenant_id: TenantId, order_id: OrderId) -> Result<Order, ReconcileError> {
        let order = self
            .dispatcher
            .load(tenant_id, order_id.0, |_, id| Order::empty(OrderId(id)))
            .map_err(|e| ReconcileError::from_dispatch("order", order_id, e))?;
        if !order.exists() {
            return Err(DomainError::not_found("order", order_id).into());
        }
        Ok(order)
    }

    fn dispatch_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        command: &OrderCommand,
    ) -> Result<Order, ReconcileError> {
        self.dispatcher
            .dispatch(tenant_id, order_id.0, ORDER_AGGREGATE, command, |_, id| {
                Order::empty(OrderId(id))
            })
            .map(|committed| committed.aggregate)
            .map_err(|e| ReconcileError::from_dispatch("order", order_id, e))
    }

    fn authorize(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        order: &Order,
    ) -> Result<(), ReconcileError> {
        let (Some(order_tenant), Some(creator), Some(client_id)) =
            (order.tenant_id(), order.creator(), order.client_id())
        else {
            return Err(DomainError::not_found("order", order.id_typed()).into());
        };

        let client_salesman = self
            .ports
            .directory
            .client(order_tenant, client_id)
            .and_then(|c| c.assigned_salesman);

        let scope = OrderScope {
            tenant_id: order_tenant,
            order_ref: order.id_typed().to_string(),
            creator,
            client_salesman,
        };
        authorize_order_access(actor, tenant_id, &scope)?;
        Ok(())
    }

    /// Apply a pending payment to its order and finalize the record.
    fn settle(&self, mut payment: Payment) -> Result<(Payment, Order), ReconcileError> {
        let command = OrderCommand::ApplyPayment(ApplyPayment {
            tenant_id: payment.tenant_id,
            order_id: payment.order_id,
            payment_id: payment.id,
            amount: payment.amount,
            occurred_at: payment.occurred_at,
        });

        let order = match self.dispatch_order(payment.tenant_id, payment.order_id, &command) {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(
                    payment_id = %payment.id,
                    order_id = %payment.order_id,
                    amount = %payment.amount,
                    "payment rejected by order: {err}"
                );
                payment.fail(err.to_string())?;
                if let Err(store_err) = self.ports.payments.update(&payment) {
                    tracing::error!(payment_id = %payment.id, "could not mark payment failed: {store_err}");
                }
                return Err(err);
            }
        };

        payment.confirm()?;
        if let Err(store_err) = self.ports.payments.update(&payment) {
            // The order already carries the payment; the record stays pending.
            tracing::error!(payment_id = %payment.id, "could not confirm payment record: {store_err}");
        }

        tracing::info!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            method = %payment.method,
            reference = payment.reference.as_deref().unwrap_or(""),
            paid = %order.paid_amount(),
            due = %order.due_amount(),
            "payment applied"
        );
        Ok((payment, order))
    }

    fn duplicate_receipt(
        &self,
        tenant_id: TenantId,
        existing: Payment,
    ) -> Result<PaymentReceipt, ReconcileError> {
        if existing.tenant_id != tenant_id {
            return Err(DomainError::conflict(format!(
                "gateway reference {} belongs to another account",
                existing.reference.as_deref().unwrap_or("")
            ))
            .into());
        }

        tracing::info!(
            payment_id = %existing.id,
            reference = existing.reference.as_deref().unwrap_or(""),
            state = %existing.state,
            "duplicate gateway confirmation"
        );

        let order = self.load_order(tenant_id, existing.order_id)?;
        let invoice = match self.ports.invoices.for_payment(tenant_id, existing.id)? {
            Some(invoice) => ActionOutcome::Completed { result: invoice },
            None => ActionOutcome::skipped("duplicate confirmation"),
        };

        Ok(PaymentReceipt {
            payment: existing,
            order,
            duplicate: true,
            invoice,
            wallet: ActionOutcome::skipped("duplicate confirmation"),
        })
    }

    fn generate_invoice(&self, order: &Order, payment: &Payment) -> ActionOutcome<Invoice> {
        match self.issue_invoice(order, payment) {
            Ok(invoice) => ActionOutcome::Completed { result: invoice },
            Err(err) => {
                tracing::warn!(
                    order_id = %payment.order_id,
                    payment_id = %payment.id,
                    "invoice generation failed: {err}"
                );
                ActionOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    fn issue_invoice(&self, order: &Order, payment: &Payment) -> Result<Invoice, ReconcileError> {
        let tenant_id = payment.tenant_id;
        if let Some(existing) = self.ports.invoices.for_payment(tenant_id, payment.id)? {
            return Ok(existing);
        }

        let client_id = client_of(order)?;
        let company_id = order
            .company_id()
            .ok_or_else(|| DomainError::not_found("order", order.id_typed()))?;
        let client = self
            .ports
            .directory
            .client(tenant_id, client_id)
            .ok_or_else(|| DomainError::not_found("client", client_id))?;
        let company = self
            .ports
            .directory
            .company(tenant_id, company_id)
            .ok_or_else(|| DomainError::not_found("company", company_id))?;

        let draft = derive_invoice(
            order,
            payment,
            |p| self.ports.stock.describe(tenant_id, p),
            client.snapshot(),
            company.snapshot(),
            self.config.tax_rate,
        )?;
        if !draft.skipped_lines.is_empty() {
            tracing::warn!(
                order_id = %payment.order_id,
                skipped = ?draft.skipped_lines,
                "invoice lines skipped: product no longer resolves"
            );
        }

        let sequence = self.ports.invoices.next_sequence(tenant_id)?;
        let mut invoice = Invoice::issue(
            InvoiceId::new(AggregateId::new()),
            tenant_id,
            format_invoice_number(&self.config.invoice_prefix, sequence),
            payment.order_id,
            payment.id,
            client_id,
            company_id,
            draft,
            Utc::now(),
        );
        self.ports.invoices.insert(invoice.clone())?;

        if let Err(err) = self.render_and_store(&mut invoice) {
            tracing::warn!(invoice_id = %invoice.id, number = %invoice.number, "invoice render failed: {err}");
        }
        self.ports.invoices.update(&invoice)?;

        tracing::info!(
            invoice_id = %invoice.id,
            number = %invoice.number,
            payment_id = %payment.id,
            total = %invoice.total_amount,
            "invoice issued"
        );
        Ok(invoice)
    }

    /// Render, store the blob and record the outcome on `invoice`. The caller
    /// persists the invoice.
    fn render_and_store(&self, invoice: &mut Invoice) -> Result<InvoiceDownload, ReconcileError> {
        let rendered = match self.ports.renderer.render(&invoice.snapshot()) {
            Ok(rendered) => rendered,
            Err(source) => {
                invoice.mark_render_failed(source.to_string());
                return Err(ReconcileError::Render {
                    invoice_id: invoice.id.to_string(),
                    source,
                });
            }
        };

        let locator = format!("invoices/{}/{}", invoice.tenant_id, rendered.file_name);
        if let Err(err) =
            self.ports
                .artifacts
                .put(&locator, &rendered.content_type, rendered.bytes.clone())
        {
            invoice.mark_render_failed(err.to_string());
            return Err(err.into());
        }

        invoice.mark_rendered(locator);
        Ok(InvoiceDownload {
            file_name: rendered.file_name,
            content_type: rendered.content_type,
            bytes: rendered.bytes,
        })
    }

    fn credit_wallet(&self, order: &Order, payment: &Payment) -> ActionOutcome<WalletCredit> {
        let Some(manager_id) = order.manager_id() else {
            return ActionOutcome::Failed {
                error: format!("order {} has no owning manager", payment.order_id),
            };
        };
        let wallet_id = WalletId::for_manager(manager_id);
        let source_reference = payment
            .reference
            .clone()
            .unwrap_or_else(|| payment.id.to_string());

        let command = WalletCommand::CreditWallet(CreditWallet {
            tenant_id: payment.tenant_id,
            wallet_id,
            manager_id,
            source_reference,
            amount: payment.amount,
            rate: self.config.coin_rate,
            occurred_at: payment.occurred_at,
        });

        let committed = self.dispatcher.dispatch(
            payment.tenant_id,
            wallet_id.0,
            WALLET_AGGREGATE,
            &command,
            |_, id| Wallet::empty(WalletId(id)),
        );

        match committed {
            Ok(c) if c.events.is_empty() => ActionOutcome::skipped("source already credited"),
            Ok(c) => {
                let coins = c.aggregate.entries().last().map(|e| e.coins).unwrap_or(0);
                tracing::info!(%manager_id, coins, balance = c.aggregate.balance(), "wallet credited");
                ActionOutcome::Completed {
                    result: WalletCredit {
                        manager_id,
                        coins,
                        balance: c.aggregate.balance(),
                    },
                }
            }
            Err(err) => {
                tracing::warn!(%manager_id, payment_id = %payment.id, "wallet credit failed: {err}");
                ActionOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

fn client_of(order: &Order) -> Result<loomtrade_core::ClientId, ReconcileError> {
    order
        .client_id()
        .ok_or_else(|| DomainError::not_found("order", order.id_typed()).into())
}

fn file_name_of(locator: &str) -> String {
    locator.rsplit('/').next().unwrap_or(locator).to_string()
}
