use crate::models::{Address, TimeWindow, Transaction};
use std::collections::HashSet;

/// Every distinct account key seen in in-window transactions, minus the
/// subject itself.
pub fn aggregate_interactions(
    transactions: &[Transaction],
    subject: &Address,
    window: &TimeWindow,
) -> HashSet<Address> {
    transactions
        .iter()
        .filter(|tx| window.contains(tx.block_time))
        .flat_map(|tx| tx.account_keys.iter())
        .filter(|key| *key != subject)
        .cloned()
        .collect()
}
