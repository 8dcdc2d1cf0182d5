use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use loomtrade_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, Event, ManagerId, Money, TenantId,
};

/// Wallet identifier. One wallet per manager, sharing the manager's uuid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(pub AggregateId);

impl WalletId {
    pub fn for_manager(manager_id: ManagerId) -> Self {
        Self(AggregateId::from_uuid(*manager_id.as_uuid()))
    }
}

impl core::fmt::Display for WalletId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Coins granted per whole rupee paid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinRate(u64);

impl CoinRate {
    pub const fn per_rupee(coins: u64) -> Self {
        Self(coins)
    }

    pub fn coins_per_rupee(self) -> u64 {
        self.0
    }

    /// Paise fractions earn nothing.
    pub fn coins_for(self, amount: Money) -> Option<u64> {
        amount.whole_rupees().checked_mul(self.0)
    }
}

impl Default for CoinRate {
    fn default() -> Self {
        Self(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub entry_id: Uuid,
    pub source_reference: String,
    pub amount: Money,
    pub coins: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate root: Wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    id: WalletId,
    tenant_id: Option<TenantId>,
    manager_id: Option<ManagerId>,
    entries: Vec<WalletEntry>,
    sources: HashSet<String>,
    balance: u64,
    version: u64,
}

impl Wallet {
    /// Create an empty aggregate instance for rehydration.
    pub fn empty(id: WalletId) -> Self {
        Self {
            id,
            tenant_id: None,
            manager_id: None,
            entries: Vec::new(),
            sources: HashSet::new(),
            balance: 0,
            version: 0,
        }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn manager_id(&self) -> Option<ManagerId> {
        self.manager_id
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn entries(&self) -> &[WalletEntry] {
        &self.entries
    }

    pub fn has_credit_from(&self, source_reference: &str) -> bool {
        self.sources.contains(source_reference)
    }
}

impl AggregateRoot for Wallet {
    type Id = WalletId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreditWallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditWallet {
    pub tenant_id: TenantId,
    pub wallet_id: WalletId,
    pub manager_id: ManagerId,
    pub source_reference: String,
    pub amount: Money,
    pub rate: CoinRate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletCommand {
    CreditWallet(CreditWallet),
}

/// Event: WalletCredited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCredited {
    pub tenant_id: TenantId,
    pub wallet_id: WalletId,
    pub manager_id: ManagerId,
    pub entry_id: Uuid,
    pub source_reference: String,
    pub amount: Money,
    pub coins: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEvent {
    WalletCredited(WalletCredited),
}

impl Event for WalletEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WalletEvent::WalletCredited(_) => "wallet.credited",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WalletEvent::WalletCredited(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Wallet {
    type Command = WalletCommand;
    type Event = WalletEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            WalletEvent::WalletCredited(e) => {
                self.tenant_id = Some(e.tenant_id);
                self.manager_id = Some(e.manager_id);
                self.balance = self.balance.saturating_add(e.coins);
                self.sources.insert(e.source_reference.clone());
                self.entries.push(WalletEntry {
                    entry_id: e.entry_id,
                    source_reference: e.source_reference.clone(),
                    amount: e.amount,
                    coins: e.coins,
                    occurred_at: e.occurred_at,
                });
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            WalletCommand::CreditWallet(cmd) => self.handle_credit(cmd),
        }
    }
}

impl Wallet {
    fn handle_credit(&self, cmd: &CreditWallet) -> Result<Vec<WalletEvent>, DomainError> {
        if self.id != cmd.wallet_id {
            return Err(DomainError::invariant("wallet_id mismatch"));
        }
        if let Some(tenant) = self.tenant_id {
            if tenant != cmd.tenant_id {
                return Err(DomainError::invariant("tenant mismatch"));
            }
        }
        if cmd.source_reference.trim().is_empty() {
            return Err(DomainError::validation("credit needs a source reference"));
        }

        // Replayed source: already credited, nothing to emit.
        if self.has_credit_from(&cmd.source_reference) {
            return Ok(Vec::new());
        }

        let coins = cmd
            .rate
            .coins_for(cmd.amount)
            .ok_or_else(|| DomainError::validation("coin amount overflows"))?;
        self.balance
            .checked_add(coins)
            .ok_or_else(|| DomainError::invariant("wallet balance overflows"))?;

        Ok(vec![WalletEvent::WalletCredited(WalletCredited {
            tenant_id: cmd.tenant_id,
            wallet_id: cmd.wallet_id,
            manager_id: cmd.manager_id,
            entry_id: Uuid::now_v7(),
            source_reference: cmd.source_reference.clone(),
            amount: cmd.amount,
            coins,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn credit(wallet: &Wallet, tenant_id: TenantId, reference: &str, paise: u64) -> WalletCommand {
        WalletCommand::CreditWallet(CreditWallet {
            tenant_id,
            wallet_id: *wallet.id(),
            manager_id: ManagerId::from_uuid(*wallet.id().0.as_uuid()),
            source_reference: reference.to_string(),
            amount: Money::from_paise(paise),
            rate: CoinRate::default(),
            occurred_at: Utc::now(),
        })
    }

    fn run(wallet: &mut Wallet, cmd: &WalletCommand) -> usize {
        let events = wallet.handle(cmd).unwrap();
        for e in &events {
            wallet.apply(e);
        }
        events.len()
    }

    #[test]
    fn wallet_id_follows_manager() {
        let manager = ManagerId::new();
        assert_eq!(
            WalletId::for_manager(manager).0.as_uuid(),
            manager.as_uuid()
        );
    }

    #[test]
    fn credit_converts_whole_rupees() {
        let tenant = TenantId::new();
        let mut wallet = Wallet::empty(WalletId::for_manager(ManagerId::new()));

        let cmd = credit(&wallet, tenant, "pay_1", 50_099);
        assert_eq!(run(&mut wallet, &cmd), 1);
        assert_eq!(wallet.balance(), 500);
        assert_eq!(wallet.entries()[0].amount, Money::from_paise(50_099));
        assert_eq!(wallet.version(), 1);
    }

    #[test]
    fn same_source_credits_once() {
        let tenant = TenantId::new();
        let mut wallet = Wallet::empty(WalletId::for_manager(ManagerId::new()));

        let cmd = credit(&wallet, tenant, "pay_1", 10_000);
        run(&mut wallet, &cmd);
        assert_eq!(run(&mut wallet, &cmd), 0);

        assert_eq!(wallet.balance(), 100);
        assert_eq!(wallet.entries().len(), 1);
        assert_eq!(wallet.version(), 1);
    }

    #[test]
    fn custom_rate_multiplies() {
        assert_eq!(CoinRate::per_rupee(3).coins_for(Money::from_paise(1_000)), Some(30));
        assert_eq!(CoinRate::per_rupee(3).coins_for(Money::from_paise(99)), Some(0));
    }

    #[test]
    fn other_tenant_cannot_credit() {
        let mut wallet = Wallet::empty(WalletId::for_manager(ManagerId::new()));
        let cmd = credit(&wallet, TenantId::new(), "a", 100);
        run(&mut wallet, &cmd);

        let err = wallet
            .handle(&credit(&wallet, TenantId::new(), "b", 100))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    proptest! {
        #[test]
        fn balance_is_sum_of_distinct_sources(
            credits in proptest::collection::vec((0u8..6, 0u64..1_000_000), 1..20)
        ) {
            let tenant = TenantId::new();
            let mut wallet = Wallet::empty(WalletId::for_manager(ManagerId::new()));
            let mut expected = std::collections::HashMap::new();

            for (src, paise) in credits {
                let reference = format!("pay_{src}");
                let cmd = credit(&wallet, tenant, &reference, paise);
                run(&mut wallet, &cmd);
                expected.entry(reference).or_insert(paise / 100);
            }

            prop_assert_eq!(wallet.balance(), expected.values().sum::<u64>());
            prop_assert_eq!(wallet.entries().len(), expected.len());
        }
    }
}
