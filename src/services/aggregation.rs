use std::collections::HashMap;

use crate::models::alkane::{AggregatedBalance, AlkaneId, RawBalanceRecord};

const MISSING_SYMBOL: &str = "-";

struct Accumulator<'a> {
    token_id: &'a AlkaneId,
    name: &'a str,
    symbol: Option<&'a str>,
    raw_amount: u128,
}

/// Merge per-UTXO records into one balance per token, in first-seen order.
///
/// Records without a token id are dropped. Name and symbol come from the
/// first record seen for a token. Sums saturate at `u128::MAX` instead of
/// wrapping.
pub fn aggregate(records: &[RawBalanceRecord]) -> Vec<AggregatedBalance> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Accumulator<'_>> = Vec::new();

    for record in records {
        let Some(token_id) = record.token_id.as_ref() else {
            continue;
        };

        let key = token_id.key();
        match index.get(&key).copied() {
            Some(position) => {
                let group = &mut groups[position];
                match group.raw_amount.checked_add(record.amount) {
                    Some(sum) => group.raw_amount = sum,
                    None => {
                        log::warn!("Balance of alkane {} saturated while aggregating", token_id);
                        group.raw_amount = u128::MAX;
                    }
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(Accumulator {
                    token_id,
                    name: &record.name,
                    symbol: record.symbol.as_deref(),
                    raw_amount: record.amount,
                });
            }
        }
    }

    groups
        .into_iter()
        .map(|group| {
            AggregatedBalance::new(
                group.token_id.clone(),
                group.name.to_string(),
                group.symbol.unwrap_or(MISSING_SYMBOL).to_string(),
                group.raw_amount,
            )
        })
        .collect()
}
