//! Reconciliation settings read from the environment.

use loomtrade_core::TaxRate;
use loomtrade_wallet::CoinRate;

use crate::command_dispatcher::DEFAULT_MAX_ATTEMPTS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationConfig {
    /// Tax added on top of each invoice subtotal.
    pub tax_rate: TaxRate,
    pub invoice_prefix: String,
    pub coin_rate: CoinRate,
    /// Dispatch attempts before a version conflict is reported.
    pub max_dispatch_attempts: u32,
    /// Checkout signatures cannot be verified without it.
    pub gateway_key_secret: Option<String>,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            tax_rate: TaxRate::ZERO,
            invoice_prefix: "INV".to_string(),
            coin_rate: CoinRate::default(),
            max_dispatch_attempts: DEFAULT_MAX_ATTEMPTS,
            gateway_key_secret: None,
        }
    }
}

impl ReconciliationConfig {
    /// `INVOICE_TAX_RATE_BPS`, `INVOICE_NUMBER_PREFIX`, `WALLET_COINS_PER_RUPEE`,
    /// `PAYMENT_MAX_ATTEMPTS`, `GATEWAY_KEY_SECRET`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let tax_rate = parse_or(&lookup, "INVOICE_TAX_RATE_BPS", defaults.tax_rate.bps())
            .map(TaxRate::from_bps)
            .unwrap_or(defaults.tax_rate);

        let invoice_prefix = lookup("INVOICE_NUMBER_PREFIX")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.invoice_prefix);

        let coin_rate = parse_or(
            &lookup,
            "WALLET_COINS_PER_RUPEE",
            defaults.coin_rate.coins_per_rupee(),
        )
        .map(CoinRate::per_rupee)
        .unwrap_or(defaults.coin_rate);

        let max_dispatch_attempts =
            parse_or(&lookup, "PAYMENT_MAX_ATTEMPTS", defaults.max_dispatch_attempts)
                .map(|n| n.max(1))
                .unwrap_or(defaults.max_dispatch_attempts);

        let gateway_key_secret = lookup("GATEWAY_KEY_SECRET").filter(|s| !s.trim().is_empty());
        if gateway_key_secret.is_none() {
            tracing::warn!("GATEWAY_KEY_SECRET not set; gateway payments cannot be verified");
        }

        Self {
            tax_rate,
            invoice_prefix,
            coin_rate,
            max_dispatch_attempts,
            gateway_key_secret,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Option<T>
where
    T: core::str::FromStr + core::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Some(default);
    };
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, %default, "invalid setting; using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> ReconciliationConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ReconciliationConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(from(&[]), ReconciliationConfig::default());
    }

    #[test]
    fn values_are_read() {
        let cfg = from(&[
            ("INVOICE_TAX_RATE_BPS", "1800"),
            ("INVOICE_NUMBER_PREFIX", "LT"),
            ("WALLET_COINS_PER_RUPEE", "2"),
            ("PAYMENT_MAX_ATTEMPTS", "0"),
            ("GATEWAY_KEY_SECRET", "s3cret"),
        ]);
        assert_eq!(cfg.tax_rate, TaxRate::from_bps(1_800));
        assert_eq!(cfg.invoice_prefix, "LT");
        assert_eq!(cfg.coin_rate, CoinRate::per_rupee(2));
        assert_eq!(cfg.max_dispatch_attempts, 1);
        assert_eq!(cfg.gateway_key_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn garbage_falls_back() {
        let cfg = from(&[("INVOICE_TAX_RATE_BPS", "eighteen"), ("GATEWAY_KEY_SECRET", " ")]);
        assert_eq!(cfg.tax_rate, TaxRate::ZERO);
        assert_eq!(cfg.gateway_key_secret, None);
    }
}
