use crate::error::{ExplorerError, ExplorerResult};
use crate::models::rpc_model::{AccountValue, BlockResult, KeyedTokenAccount, SignatureInfo, TransactionResult};
use crate::models::{AccountInfo, Address, BlockInfo, Instruction, SignatureRecord, TokenAccount, Transaction};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Turn a `json` encoded transaction into a domain [`Transaction`].
///
/// Instruction indices refer to the static keys followed by the writable and
/// then readonly keys loaded from lookup tables, which is the order the
/// runtime uses.
pub fn parse_transaction(signature: &str, tx: TransactionResult) -> ExplorerResult<Transaction> {
    let mut raw_keys = tx.transaction.message.account_keys;
    let err = tx.meta.as_ref().and_then(|m| m.err.clone()).filter(|e| !e.is_null());

    if let Some(loaded) = tx.meta.and_then(|m| m.loaded_addresses) {
        raw_keys.extend(loaded.writable);
        raw_keys.extend(loaded.readonly);
    }

    let account_keys = raw_keys
        .iter()
        .map(|k| Address::parse(k))
        .collect::<ExplorerResult<Vec<_>>>()
        .map_err(|e| malformed(signature, &e.to_string()))?;

    let lookup = |index: usize| -> ExplorerResult<Address> {
        account_keys
            .get(index)
            .cloned()
            .ok_or_else(|| malformed(signature, &format!("account index {} out of range", index)))
    };

    let mut instructions = Vec::with_capacity(tx.transaction.message.instructions.len());
    for ix in tx.transaction.message.instructions {
        let program_id = lookup(ix.program_id_index)?;
        let accounts = ix
            .accounts
            .iter()
            .map(|&i| lookup(i))
            .collect::<ExplorerResult<Vec<_>>>()?;
        let data = bs58::decode(&ix.data)
            .into_vec()
            .map_err(|e| malformed(signature, &format!("instruction data: {}", e)))?;

        instructions.push(Instruction {
            program_id,
            accounts,
            data,
        });
    }

    Ok(Transaction {
        signature: signature.to_string(),
        slot: tx.slot,
        block_time: tx.block_time,
        confirmation_status: None,
        err,
        account_keys,
        instructions,
    })
}

pub fn parse_signature(info: SignatureInfo) -> ExplorerResult<SignatureRecord> {
    let mut record = SignatureRecord::new(info.signature, info.slot)?.with_block_time(info.block_time);
    record.confirmation_status = info.confirmation_status;
    record.err = info.err.filter(|e| !e.is_null());
    Ok(record)
}

pub fn parse_account(address: &Address, value: AccountValue) -> AccountInfo {
    let (payload, _encoding) = &value.data;
    let data_len = STANDARD.decode(payload).map(|b| b.len()).unwrap_or(0);

    AccountInfo {
        address: address.clone(),
        lamports: value.lamports,
        owner: value.owner,
        executable: value.executable,
        rent_epoch: value.rent_epoch,
        data_len,
    }
}

pub fn parse_block(slot: u64, block: BlockResult) -> BlockInfo {
    BlockInfo {
        slot,
        block_time: block.block_time,
        transaction_count: block.signatures.len(),
        parent_slot: block.parent_slot,
    }
}

pub fn parse_token_account(keyed: KeyedTokenAccount) -> ExplorerResult<TokenAccount> {
    let info = keyed.account.data.parsed.info;
    let amount = Decimal::from_str(&info.token_amount.ui_amount_string).map_err(|e| {
        ExplorerError::ChainUnavailable(format!(
            "token account {} has unreadable amount: {}",
            keyed.pubkey, e
        ))
    })?;

    Ok(TokenAccount {
        address: keyed.pubkey,
        mint: info.mint,
        owner: info.owner,
        amount,
        decimals: info.token_amount.decimals,
    })
}

fn malformed(signature: &str, reason: &str) -> ExplorerError {
    ExplorerError::ChainUnavailable(format!("malformed transaction {}: {}", signature, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TOKEN_PROGRAM_ID;
    use serde_json::json;

    const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const SYSTEM: &str = "11111111111111111111111111111111";
    const LOOKUP_KEY: &str = "SysvarC1ock11111111111111111111111111111111";

    fn fixture() -> TransactionResult {
        serde_json::from_value(json!({
            "slot": 250000000u64,
            "blockTime": 1717200000i64,
            "transaction": {
                "signatures": ["5sig"],
                "message": {
                    "accountKeys": [WALLET, TOKEN_PROGRAM_ID, SYSTEM],
                    "instructions": [
                        { "programIdIndex": 1, "accounts": [0, 3], "data": "3Bxs4h24hBtQy9rw", "stackHeight": null },
                        { "programIdIndex": 2, "accounts": [0], "data": "" }
                    ],
                    "recentBlockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N"
                }
            },
            "meta": {
                "err": null,
                "fee": 5000,
                "loadedAddresses": { "writable": [], "readonly": [LOOKUP_KEY] }
            },
            "version": 0
        }))
        .unwrap()
    }

    #[test]
    fn resolves_indices_through_loaded_addresses() {
        let tx = parse_transaction("5sig", fixture()).unwrap();

        assert_eq!(tx.account_keys.len(), 4);
        assert_eq!(tx.account_keys[3], *LOOKUP_KEY);
        assert_eq!(tx.instructions.len(), 2);
        assert_eq!(tx.instructions[0].program_id, *TOKEN_PROGRAM_ID);
        assert_eq!(tx.instructions[0].accounts[1], *LOOKUP_KEY);
        assert!(tx.instructions[1].data.is_empty());
        assert!(tx.is_success());
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let mut raw = fixture();
        raw.meta = None;
        let result = parse_transaction("5sig", raw);
        assert!(matches!(result, Err(ExplorerError::ChainUnavailable(_))));
    }

    #[test]
    fn token_amount_is_decimal() {
        let keyed: KeyedTokenAccount = serde_json::from_value(json!({
            "pubkey": "Acct1111111111111111111111111111111111111111",
            "account": {
                "data": {
                    "parsed": {
                        "info": {
                            "mint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                            "owner": WALLET,
                            "tokenAmount": {
                                "amount": "1500000",
                                "decimals": 6,
                                "uiAmount": 1.5,
                                "uiAmountString": "1.5"
                            }
                        },
                        "type": "account"
                    },
                    "program": "spl-token",
                    "space": 165
                }
            }
        }))
        .unwrap();

        let token = parse_token_account(keyed).unwrap();
        assert_eq!(token.amount, Decimal::new(15, 1));
        assert_eq!(token.decimals, 6);
    }
}
