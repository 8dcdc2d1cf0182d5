use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loomtrade_auth::Actor;
use loomtrade_core::{
    Aggregate, AggregateId, AggregateRoot, ClientId, CompanyId, DomainError, Event, ManagerId,
    Money, PaymentId, TenantId,
};
use loomtrade_inventory::{ProductId, StockRequest};

/// Order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for OrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

/// Fulfilment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Processing => 2,
            OrderStatus::Completed => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement state, always derived from `paid` and `due`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Nothing paid is `Unpaid` even when nothing is due, so a zero-total
    /// order is never born settled.
    pub fn derive(paid: Money, due: Money) -> Self {
        if paid.is_zero() {
            PaymentStatus::Unpaid
        } else if due.is_zero() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

/// Order line as requested, before pricing.
///
/// `unit_price: None` means "use the catalog price".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Option<Money>,
}

/// Priced order line. `line_total = quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl OrderLine {
    pub fn stock_request(&self) -> StockRequest {
        StockRequest {
            line_no: self.line_no,
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }
}

/// Validate drafts and fix their prices.
///
/// Lines are numbered from 1 in input order. A draft without an explicit
/// price takes `catalog_price`; a product with neither is an invalid line.
pub fn price_lines<F>(drafts: &[LineDraft], catalog_price: F) -> Result<Vec<OrderLine>, DomainError>
where
    F: Fn(ProductId) -> Option<Money>,
{
    if drafts.is_empty() {
        return Err(DomainError::validation("order must have at least one line"));
    }

    drafts
        .iter()
        .enumerate()
        .map(|(idx, draft)| {
            let line_no = idx as u32 + 1;
            let invalid = |reason: &str| DomainError::InvalidLineItem {
                line_no,
                reason: reason.to_string(),
            };

            if draft.quantity <= 0 {
                return Err(invalid("quantity must be > 0"));
            }

            let unit_price = draft
                .unit_price
                .or_else(|| catalog_price(draft.product_id))
                .ok_or_else(|| invalid("no unit price given and product has no catalog price"))?;

            let line_total = unit_price
                .checked_mul(draft.quantity as u64)
                .ok_or_else(|| invalid("line total overflows"))?;

            Ok(OrderLine {
                line_no,
                product_id: draft.product_id,
                quantity: draft.quantity,
                unit_price,
                line_total,
            })
        })
        .collect()
}

pub fn order_total(lines: &[OrderLine]) -> Result<Money, DomainError> {
    lines.iter().try_fold(Money::ZERO, |acc, line| {
        acc.checked_add(line.line_total)
            .ok_or_else(|| DomainError::validation("order total overflows"))
    })
}

/// Outcome of applying one payment, computed before any event is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub paid_amount: Money,
    pub due_amount: Money,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    tenant_id: Option<TenantId>,
    client_id: Option<ClientId>,
    company_id: Option<CompanyId>,
    manager_id: Option<ManagerId>,
    creator: Option<Actor>,
    lines: Vec<OrderLine>,
    total_amount: Money,
    paid_amount: Money,
    status: OrderStatus,
    payment_refs: Vec<PaymentId>,
    placed_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            client_id: None,
            company_id: None,
            manager_id: None,
            creator: None,
            lines: Vec::new(),
            total_amount: Money::ZERO,
            paid_amount: Money::ZERO,
            status: OrderStatus::Pending,
            payment_refs: Vec::new(),
            placed_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn exists(&self) -> bool {
        self.created
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        self.company_id
    }

    pub fn manager_id(&self) -> Option<ManagerId> {
        self.manager_id
    }

    pub fn creator(&self) -> Option<Actor> {
        self.creator
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn paid_amount(&self) -> Money {
        self.paid_amount
    }

    pub fn due_amount(&self) -> Money {
        self.total_amount.saturating_sub(self.paid_amount)
    }

    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::derive(self.paid_amount, self.due_amount())
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_refs(&self) -> &[PaymentId] {
        &self.payment_refs
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    pub fn stock_requests(&self) -> Vec<StockRequest> {
        self.lines.iter().map(OrderLine::stock_request).collect()
    }

    /// Decide the effect of a payment of `amount` against current state.
    ///
    /// Rejects a zero amount, a cancelled order and anything above the due
    /// amount. Never mutates.
    pub fn apply_payment(&self, amount: Money) -> Result<PaymentApplication, DomainError> {
        if !self.created {
            return Err(DomainError::not_found("order", self.id));
        }
        if amount.is_zero() {
            return Err(DomainError::validation("payment amount must be > 0"));
        }
        if self.status == OrderStatus::Cancelled {
            return Err(DomainError::OrderNotPayable {
                order_id: self.id.to_string(),
                status: self.status.to_string(),
            });
        }

        let due = self.due_amount();
        if amount > due {
            return Err(DomainError::OverpaymentRejected {
                order_id: self.id.to_string(),
                amount,
                due,
            });
        }

        let paid_amount = self
            .paid_amount
            .checked_add(amount)
            .ok_or_else(|| DomainError::invariant("paid amount overflows"))?;
        let due_amount = self.total_amount.saturating_sub(paid_amount);
        let payment_status = PaymentStatus::derive(paid_amount, due_amount);
        let status = if payment_status == PaymentStatus::Paid {
            OrderStatus::Completed
        } else {
            self.status
        };

        Ok(PaymentApplication {
            paid_amount,
            due_amount,
            payment_status,
            status,
        })
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder. Lines arrive already priced and numbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub company_id: CompanyId,
    pub manager_id: ManagerId,
    pub creator: Actor,
    pub lines: Vec<OrderLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApplyPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyPayment {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus. Forward moves only; cancelling has its own command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub target: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    ApplyPayment(ApplyPayment),
    ChangeStatus(ChangeStatus),
    CancelOrder(CancelOrder),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub company_id: CompanyId,
    pub manager_id: ManagerId,
    pub creator: Actor,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentApplied. Carries the resulting aggregates for read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApplied {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub paid_amount: Money,
    pub due_amount: Money,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    PaymentApplied(PaymentApplied),
    StatusChanged(StatusChanged),
    OrderCancelled(OrderCancelled),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "sales.order.placed",
            OrderEvent::PaymentApplied(_) => "sales.order.payment_applied",
            OrderEvent::StatusChanged(_) => "sales.order.status_changed",
            OrderEvent::OrderCancelled(_) => "sales.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::PaymentApplied(e) => e.occurred_at,
            OrderEvent::StatusChanged(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.client_id = Some(e.client_id);
                self.company_id = Some(e.company_id);
                self.manager_id = Some(e.manager_id);
                self.creator = Some(e.creator);
                self.lines = e.lines.clone();
                self.total_amount = e.total_amount;
                self.paid_amount = Money::ZERO;
                self.status = OrderStatus::Pending;
                self.payment_refs.clear();
                self.placed_at = Some(e.occurred_at);
                self.created = true;
            }
            OrderEvent::PaymentApplied(e) => {
                self.paid_amount = e.paid_amount;
                self.status = e.status;
                self.payment_refs.push(e.payment_id);
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
            }
            OrderEvent::OrderCancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::ApplyPayment(cmd) => self.handle_apply_payment(cmd),
            OrderCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
            OrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Order {
    fn ensure_exists(&self, tenant_id: TenantId, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("order", order_id));
        }
        if self.tenant_id != Some(tenant_id) {
            // Other tenants' orders are indistinguishable from absent ones.
            return Err(DomainError::not_found("order", order_id));
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line"));
        }

        for (idx, line) in cmd.lines.iter().enumerate() {
            let expected_no = idx as u32 + 1;
            if line.line_no != expected_no {
                return Err(DomainError::invariant(format!(
                    "line numbers must be contiguous from 1 (found {} at position {expected_no})",
                    line.line_no
                )));
            }
            if line.quantity <= 0 {
                return Err(DomainError::InvalidLineItem {
                    line_no: line.line_no,
                    reason: "quantity must be > 0".to_string(),
                });
            }
            if line.unit_price.checked_mul(line.quantity as u64) != Some(line.line_total) {
                return Err(DomainError::InvalidLineItem {
                    line_no: line.line_no,
                    reason: "line total must equal quantity * unit price".to_string(),
                });
            }
        }

        let total_amount = order_total(&cmd.lines)?;

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            client_id: cmd.client_id,
            company_id: cmd.company_id,
            manager_id: cmd.manager_id,
            creator: cmd.creator,
            lines: cmd.lines.clone(),
            total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_apply_payment(&self, cmd: &ApplyPayment) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        if self.payment_refs.contains(&cmd.payment_id) {
            return Err(DomainError::conflict(format!(
                "payment {} already applied to order {}",
                cmd.payment_id, cmd.order_id
            )));
        }

        let outcome = self.apply_payment(cmd.amount)?;

        Ok(vec![OrderEvent::PaymentApplied(PaymentApplied {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            payment_id: cmd.payment_id,
            amount: cmd.amount,
            paid_amount: outcome.paid_amount,
            due_amount: outcome.due_amount,
            payment_status: outcome.payment_status,
            status: outcome.status,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeStatus) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        if cmd.target == OrderStatus::Cancelled {
            return Err(DomainError::validation(
                "use cancel to move an order to cancelled",
            ));
        }
        if self.status.is_terminal() || cmd.target.rank() <= self.status.rank() {
            return Err(DomainError::invalid_transition(self.status, cmd.target));
        }

        Ok(vec![OrderEvent::StatusChanged(StatusChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            from: self.status,
            to: cmd.target,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                self.status,
                OrderStatus::Cancelled,
            ));
        }
        if !self.paid_amount.is_zero() {
            return Err(DomainError::invariant(format!(
                "order {} has {} paid and cannot be cancelled",
                self.id, self.paid_amount
            )));
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
