use crate::models::{Address, PurchaseEvent, TimeWindow, Transaction};

/// One event per instruction addressed to `program_filter` in an in-window
/// transaction, in transaction then instruction order.
///
/// This is a program-identity heuristic. Direction of the transfer is not
/// inspected, so sends and receives both count.
pub fn detect_purchases(
    transactions: &[Transaction],
    _subject: &Address,
    window: &TimeWindow,
    program_filter: &Address,
) -> Vec<PurchaseEvent> {
    let mut purchases = Vec::new();

    for tx in transactions {
        let Some(block_time) = tx.block_time.filter(|&t| window.contains(Some(t))) else {
            continue;
        };

        for ix in tx.instructions.iter().filter(|ix| &ix.program_id == program_filter) {
            purchases.push(PurchaseEvent {
                signature: tx.signature.clone(),
                block_time,
                instruction: ix.clone(),
            });
        }
    }

    purchases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instruction, TOKEN_PROGRAM_ID};
    use chrono::{Duration, Utc};

    const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const SYSTEM: &str = "11111111111111111111111111111111";

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn ix(program: &str, data: u8) -> Instruction {
        Instruction {
            program_id: addr(program),
            accounts: vec![addr(WALLET)],
            data: vec![data],
        }
    }

    fn tx(signature: &str, block_time: Option<i64>, instructions: Vec<Instruction>) -> Transaction {
        Transaction {
            signature: signature.to_string(),
            slot: 1,
            block_time,
            confirmation_status: None,
            err: None,
            account_keys: vec![addr(WALLET)],
            instructions,
        }
    }

    #[test]
    fn only_matching_instruction_is_reported() {
        let now = Utc::now();
        let history = vec![tx(
            "tx1",
            Some(now.timestamp()),
            vec![ix(SYSTEM, 2), ix(TOKEN_PROGRAM_ID, 3)],
        )];

        let events = detect_purchases(
            &history,
            &addr(WALLET),
            &TimeWindow::ending_at(now, 40),
            &Address::token_program(),
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].signature, "tx1");
        assert_eq!(events[0].instruction.data, vec![3]);
    }

    #[test]
    fn count_matches_in_window_instructions_exactly() {
        let now = Utc::now();
        let recent = Some((now - Duration::days(3)).timestamp());
        let stale = Some((now - Duration::days(90)).timestamp());
        let history = vec![
            tx("a", recent, vec![ix(TOKEN_PROGRAM_ID, 1), ix(TOKEN_PROGRAM_ID, 2), ix(SYSTEM, 0)]),
            tx("b", stale, vec![ix(TOKEN_PROGRAM_ID, 9)]),
            tx("c", None, vec![ix(TOKEN_PROGRAM_ID, 9)]),
            tx("d", recent, vec![ix(TOKEN_PROGRAM_ID, 4)]),
        ];

        let events = detect_purchases(
            &history,
            &addr(WALLET),
            &TimeWindow::ending_at(now, 40),
            &Address::token_program(),
        );

        // same signature may repeat, order follows history then instruction order
        let seen: Vec<(&str, u8)> = events
            .iter()
            .map(|e| (e.signature.as_str(), e.instruction.data[0]))
            .collect();
        assert_eq!(seen, [("a", 1), ("a", 2), ("d", 4)]);
    }

    #[test]
    fn no_matches_gives_empty_sequence() {
        let now = Utc::now();
        let history = vec![tx("tx1", Some(now.timestamp()), vec![ix(SYSTEM, 2)])];

        let events = detect_purchases(
            &history,
            &addr(WALLET),
            &TimeWindow::ending_at(now, 7),
            &Address::token_program(),
        );
        assert!(events.is_empty());
        assert!(detect_purchases(&[], &addr(WALLET), &TimeWindow::last_days(7), &Address::token_program()).is_empty());
    }
}
