mod common;

use common::*;
use explorer::aggregator::{ChainService, QueryLimits};
use explorer::error::ExplorerError;
use explorer::models::{AccountInfo, BlockInfo};
use std::collections::HashSet;
use std::sync::Arc;

fn service(chain: FakeChain) -> (Arc<FakeChain>, ChainService) {
    let chain = Arc::new(chain);
    let service = ChainService::new(chain.clone(), 4, QueryLimits::default());
    (chain, service)
}

#[tokio::test]
async fn empty_history_yields_empty_results() {
    let (_, service) = service(FakeChain::default());

    assert!(service.aggregate_interactions(WALLET, 7).await.unwrap().is_empty());
    assert!(service.detect_purchases(WALLET, 40).await.unwrap().is_empty());
    assert!(service.fetch_history(WALLET, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn interactions_respect_the_window() {
    let (_, service) = service(FakeChain::with_history(vec![
        tx("tx1", days_ago(0), &[WALLET, TOKEN, SYSTEM], vec![]),
        tx("tx2", days_ago(100), &[WALLET, CLOCK], vec![]),
    ]));

    let found = service.aggregate_interactions(WALLET, 7).await.unwrap();
    assert_eq!(found, HashSet::from([addr(TOKEN), addr(SYSTEM)]));
}

#[tokio::test]
async fn subject_and_unknown_times_never_leak() {
    let (_, service) = service(FakeChain::with_history(vec![
        tx("a", days_ago(1), &[WALLET, RENT, WALLET], vec![ix(TOKEN, &[WALLET])]),
        tx("b", None, &[WALLET, ATA], vec![ix(TOKEN, &[WALLET])]),
    ]));

    let found = service.aggregate_interactions(WALLET, 365).await.unwrap();
    assert!(!found.contains(&addr(WALLET)));
    assert!(!found.contains(&addr(ATA)));
    assert_eq!(found.len(), 1);

    let purchases = service.detect_purchases(WALLET, 365).await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].signature, "a");
}

#[tokio::test]
async fn purchases_are_one_per_matching_instruction() {
    let (_, service) = service(FakeChain::with_history(vec![tx(
        "swap",
        days_ago(2),
        &[WALLET, TOKEN, SYSTEM],
        vec![ix(SYSTEM, &[WALLET]), ix(TOKEN, &[WALLET])],
    )]));

    let purchases = service.detect_purchases(WALLET, 40).await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].instruction.program_id, addr(TOKEN));

    // a custom filter selects the other instruction instead
    let system = service.detect_purchases_with(WALLET, 40, Some(SYSTEM)).await.unwrap();
    assert_eq!(system.len(), 1);
    assert_eq!(system[0].instruction.program_id, addr(SYSTEM));
}

#[tokio::test]
async fn unresolvable_transactions_are_dropped() {
    let history: Vec<_> = (0..10)
        .map(|i| tx(&format!("sig{}", i), days_ago(1), &[WALLET], vec![]))
        .collect();
    let (chain, service) = service(FakeChain {
        history,
        unresolvable: vec!["sig2".into(), "sig6".into()],
        ..Default::default()
    });

    let txs = service.fetch_history(WALLET, 10).await.unwrap();
    assert_eq!(txs.len(), 8);
    assert!(txs.iter().all(|t| t.signature != "sig2" && t.signature != "sig6"));
    assert_eq!(chain.resolved.lock().unwrap().len(), 10);
}

#[tokio::test]
async fn validation_happens_before_io() {
    let (chain, service) = service(FakeChain::default());

    assert!(matches!(
        service.aggregate_interactions("nope", 7).await,
        Err(ExplorerError::InvalidAddress(_))
    ));
    assert!(matches!(
        service.aggregate_interactions(WALLET, 0).await,
        Err(ExplorerError::UnsupportedFilter(_))
    ));
    assert!(matches!(
        service.detect_purchases(WALLET, 366).await,
        Err(ExplorerError::UnsupportedFilter(_))
    ));
    assert!(matches!(
        service.detect_purchases_with(WALLET, 7, Some("spl-token")).await,
        Err(ExplorerError::UnsupportedFilter(_))
    ));
    assert_eq!(chain.list_calls(), 0);
}

#[tokio::test]
async fn listing_failure_is_chain_unavailable() {
    let (_, service) = service(FakeChain {
        list_fails: true,
        ..Default::default()
    });

    let err = service.aggregate_interactions(WALLET, 7).await.unwrap_err();
    assert!(matches!(err, ExplorerError::ChainUnavailable(_)));
}

#[tokio::test]
async fn total_resolution_failure_is_not_an_empty_answer() {
    let history: Vec<_> = (0..10)
        .map(|i| tx(&format!("sig{}", i), days_ago(1), &[WALLET, TOKEN], vec![ix(TOKEN, &[WALLET])]))
        .collect();
    let (_, service) = service(FakeChain {
        history,
        resolve_fails: true,
        ..Default::default()
    });

    assert!(matches!(
        service.aggregate_interactions(WALLET, 7).await,
        Err(ExplorerError::ChainUnavailable(_))
    ));
    assert!(matches!(
        service.detect_purchases(WALLET, 40).await,
        Err(ExplorerError::ChainUnavailable(_))
    ));
}

#[tokio::test]
async fn missing_account_is_not_found() {
    let mut chain = FakeChain::default();
    chain.accounts.insert(
        WALLET.to_string(),
        AccountInfo {
            address: addr(WALLET),
            lamports: 42,
            owner: SYSTEM.to_string(),
            executable: false,
            rent_epoch: u64::MAX,
            data_len: 0,
        },
    );
    let (_, service) = service(chain);

    assert_eq!(service.account_info(WALLET).await.unwrap().lamports, 42);
    assert!(matches!(
        service.account_info(CLOCK).await,
        Err(ExplorerError::NotFound(_))
    ));
}

#[tokio::test]
async fn recent_blocks_skip_empty_slots() {
    let mut chain = FakeChain {
        tip: 500,
        ..Default::default()
    };
    for slot in [500u64, 498, 497] {
        chain.blocks.insert(
            slot,
            BlockInfo {
                slot,
                block_time: Some(1_700_000_000 + slot as i64),
                transaction_count: 7,
                parent_slot: slot - 1,
            },
        );
    }
    let (_, service) = service(chain);

    let blocks = service.recent_blocks(4).await.unwrap();
    let slots: Vec<u64> = blocks.iter().map(|b| b.slot).collect();
    assert_eq!(slots, [500, 498, 497]);

    assert!(service.recent_blocks(0).await.unwrap().is_empty());
}
