//! Whale transaction synthesis

use crate::generator::SeededRng;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Transactions above this USD amount are flagged as alerts
pub const WHALE_ALERT_THRESHOLD_USD: f64 = 10_000_000.0;

const MIN_AMOUNT_USD: f64 = 1_000_000.0;
const MAX_AMOUNT_USD: f64 = 50_000_000.0;
const LOOKBACK_MS: f64 = 3.0 * 86_400_000.0;
const MAX_REDRAWS: usize = 32;

const WHALE_LABELS: [&str; 10] = [
    "Binance",
    "Coinbase",
    "Kraken",
    "OKX",
    "Unknown Wallet",
    "Jump Trading",
    "Wintermute",
    "Alameda Legacy",
    "a16z",
    "Paradigm",
];

const TX_KINDS: [TxKind; 3] = [
    TxKind::Transfer,
    TxKind::ExchangeDeposit,
    TxKind::ExchangeWithdrawal,
];

/// Classification of a whale transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Transfer,
    ExchangeDeposit,
    ExchangeWithdrawal,
}

/// A single large on-chain transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleTransaction {
    pub id: String,
    /// Abbreviated transaction hash
    pub hash: String,
    pub amount_usd: f64,
    pub kind: TxKind,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
    /// Amount above [`WHALE_ALERT_THRESHOLD_USD`]
    pub is_alert: bool,
}

/// Synthesize `count` whale transactions in the 72h before `anchor`
///
/// Output is sorted newest first.
pub fn whale_transactions(
    symbol: &str,
    count: usize,
    anchor: DateTime<Utc>,
    rng: &mut SeededRng,
) -> Vec<WhaleTransaction> {
    let mut txs: Vec<WhaleTransaction> = (0..count)
        .map(|i| {
            let amount_usd = rng.range(MIN_AMOUNT_USD, MAX_AMOUNT_USD);
            let kind = rng.pick(&TX_KINDS).copied().unwrap_or(TxKind::Transfer);
            let from_idx = rng.index(WHALE_LABELS.len());
            let to_idx = draw_counterparty(from_idx, rng);
            let hash = format!("0x{}...", rng.hex_digits(8));
            let age_ms = (rng.next_f64() * LOOKBACK_MS) as i64;

            WhaleTransaction {
                id: format!("tx-{}-{}", symbol, i),
                hash,
                amount_usd,
                kind,
                from: WHALE_LABELS[from_idx].to_string(),
                to: WHALE_LABELS[to_idx].to_string(),
                timestamp: anchor - Duration::milliseconds(age_ms),
                is_alert: amount_usd > WHALE_ALERT_THRESHOLD_USD,
            }
        })
        .collect();

    txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    txs
}

/// Redraw until the counterparty differs from the sender
fn draw_counterparty(from_idx: usize, rng: &mut SeededRng) -> usize {
    for _ in 0..MAX_REDRAWS {
        let to_idx = rng.index(WHALE_LABELS.len());
        if to_idx != from_idx {
            return to_idx;
        }
    }
    (from_idx + 1) % WHALE_LABELS.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 11, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_whale_count_and_bounds() {
        let mut rng = SeededRng::for_symbol("BTC", 0);
        let txs = whale_transactions("BTC", 15, anchor(), &mut rng);
        assert_eq!(txs.len(), 15);

        for tx in &txs {
            assert!(tx.amount_usd >= MIN_AMOUNT_USD && tx.amount_usd < MAX_AMOUNT_USD);
            assert_eq!(tx.is_alert, tx.amount_usd > WHALE_ALERT_THRESHOLD_USD);
            assert_ne!(tx.from, tx.to);
            assert!(tx.timestamp <= anchor());
            assert!(tx.timestamp >= anchor() - Duration::hours(72));
            assert!(tx.hash.starts_with("0x"));
        }
    }

    #[test]
    fn test_whales_sorted_newest_first() {
        let mut rng = SeededRng::for_symbol("ETH", 3);
        let txs = whale_transactions("ETH", 25, anchor(), &mut rng);
        assert!(txs.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_whales_deterministic() {
        let mut a = SeededRng::for_symbol("BTC", 17);
        let mut b = SeededRng::for_symbol("BTC", 17);
        assert_eq!(
            whale_transactions("BTC", 15, anchor(), &mut a),
            whale_transactions("BTC", 15, anchor(), &mut b)
        );
    }

    #[test]
    fn test_whale_ids_carry_symbol() {
        let mut rng = SeededRng::for_symbol("SOL", 0);
        let txs = whale_transactions("SOL", 3, anchor(), &mut rng);
        assert!(txs.iter().all(|tx| tx.id.starts_with("tx-SOL-")));
    }

    #[test]
    fn test_zero_count() {
        let mut rng = SeededRng::new(1);
        assert!(whale_transactions("BTC", 0, anchor(), &mut rng).is_empty());
    }

    #[test]
    fn test_counterparty_never_equal() {
        let mut rng = SeededRng::new(0);
        for from in 0..WHALE_LABELS.len() {
            assert_ne!(draw_counterparty(from, &mut rng), from);
        }
    }
}
