use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of implied fractional digits in every alkane amount.
pub const ALKANE_DECIMALS: u8 = 8;

/// Identifies an alkane token type by its `(block, tx)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlkaneId {
    pub block: String,
    pub tx: String,
}

impl AlkaneId {
    pub fn new(block: impl Into<String>, tx: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            tx: tx.into(),
        }
    }

    /// Aggregation key, `block:tx`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.block, self.tx)
    }
}

impl fmt::Display for AlkaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.tx)
    }
}

/// One balance entry as returned by the data provider, usually one per UTXO.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBalanceRecord {
    pub token_id: Option<AlkaneId>,
    pub name: String,
    pub symbol: Option<String>,
    pub amount: u128,
}

/// Balance per distinct token after merging all of its records.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregatedBalance {
    pub token_id: AlkaneId,
    pub name: String,
    pub symbol: String,
    #[serde(serialize_with = "serialize_u128_as_string")]
    pub raw_amount: u128,
    pub amount: f64,
    pub formatted_amount: String,
}

impl AggregatedBalance {
    pub fn new(token_id: AlkaneId, name: String, symbol: String, raw_amount: u128) -> Self {
        Self {
            token_id,
            name,
            symbol,
            raw_amount,
            amount: display_amount(raw_amount),
            formatted_amount: format_units(raw_amount, ALKANE_DECIMALS),
        }
    }
}

/// `raw / 10^8` as a float, for display only.
pub fn display_amount(raw_amount: u128) -> f64 {
    raw_amount as f64 / 10f64.powi(ALKANE_DECIMALS as i32)
}

/// Exact decimal rendering of `amount / 10^decimals` with trailing zeros trimmed.
pub fn format_units(amount: u128, decimals: u8) -> String {
    let decimals = decimals as usize;
    let mut amount_str = amount.to_string();

    if amount_str.len() <= decimals {
        amount_str.insert_str(0, &"0".repeat(decimals - amount_str.len() + 1));
    }

    let digits = amount_str.len();
    amount_str.insert(digits - decimals, '.');

    let trimmed = amount_str.trim_end_matches('0').trim_end_matches('.');

    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

// JSON numbers lose precision past 2^53, so raw amounts travel as strings.
fn serialize_u128_as_string<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_block_and_tx() {
        assert_eq!(AlkaneId::new("2", "0").key(), "2:0");
    }

    #[test]
    fn format_units_trims_trailing_zeros() {
        assert_eq!(format_units(200_000_000, 8), "2");
        assert_eq!(format_units(150_000_000, 8), "1.5");
        assert_eq!(format_units(1, 8), "0.00000001");
        assert_eq!(format_units(0, 8), "0");
        assert_eq!(format_units(123_456_789_012, 8), "1234.56789012");
    }

    #[test]
    fn amount_follows_raw_amount() {
        let balance = AggregatedBalance::new(
            AlkaneId::new("1", "a"),
            "Token".to_string(),
            "TKN".to_string(),
            200_000_000,
        );
        assert_eq!(balance.amount, 2.0);
        assert_eq!(balance.formatted_amount, "2");
    }

    #[test]
    fn raw_amount_serializes_as_string() {
        let balance = AggregatedBalance::new(
            AlkaneId::new("2", "16"),
            "DIESEL".to_string(),
            "DIESEL".to_string(),
            u128::MAX,
        );
        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(json["raw_amount"], u128::MAX.to_string());
    }
}
