//! Manager wallet (coin ledger, event-sourced).
//!
//! Append-only credits keyed by their source reference; the balance is only
//! ever derived by folding the stream. Pure domain logic only.

pub mod wallet;

pub use wallet::{
    CoinRate, CreditWallet, Wallet, WalletCommand, WalletCredited, WalletEntry, WalletEvent,
    WalletId,
};
