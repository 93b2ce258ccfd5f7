use base64::{engine::general_purpose::STANDARD, Engine};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, CompiledInstruction, Instruction},
    message::Message,
    packet::PACKET_DATA_SIZE,
    pubkey,
    pubkey::Pubkey,
    system_instruction,
    system_program::ID as SYSTEM_PROGRAM_ID,
    transaction::Transaction,
};

use crate::error::{Result, SdkError};

/// SPL Memo program (v2).
pub const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// Memo instruction carrying `memo` as its data; every signer is attached as a
/// writable signer account.
pub fn memo_instruction(memo: &str, signers: &[Pubkey]) -> Instruction {
    Instruction {
        program_id: MEMO_PROGRAM_ID,
        accounts: signers
            .iter()
            .map(|signer| AccountMeta::new(*signer, true))
            .collect(),
        data: memo.as_bytes().to_vec(),
    }
}

/// Unsigned legacy transaction: a zero-lamport transfer `payer -> recipient` followed by
/// the encrypted memo. `payer` is the fee payer and the only required signer.
pub fn build_report_transaction(
    payer: &Pubkey,
    recipient: &Pubkey,
    memo_ciphertext: &str,
    recent_blockhash: Hash,
) -> Transaction {
    let instructions = [
        system_instruction::transfer(payer, recipient, 0),
        memo_instruction(memo_ciphertext, &[*payer]),
    ];
    let message = Message::new_with_blockhash(&instructions, Some(payer), &recent_blockhash);
    Transaction::new_unsigned(message)
}

/// Wire-encode a transaction as base64, rejecting anything that won't fit in one packet.
pub fn serialize_transaction(transaction: &Transaction) -> Result<String> {
    let bytes =
        bincode::serialize(transaction).map_err(|e| SdkError::Serialization(e.to_string()))?;
    if bytes.len() > PACKET_DATA_SIZE {
        return Err(SdkError::Transaction(format!(
            "transaction is {} bytes, limit is {}",
            bytes.len(),
            PACKET_DATA_SIZE
        )));
    }
    Ok(STANDARD.encode(bytes))
}

pub fn deserialize_transaction(encoded: &str) -> Result<Transaction> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| SdkError::Serialization(format!("invalid base64: {}", e)))?;
    bincode::deserialize(&bytes).map_err(|e| SdkError::Serialization(e.to_string()))
}

/// UTF-8 data of the first memo instruction, if any.
pub fn find_memo(account_keys: &[Pubkey], instructions: &[CompiledInstruction]) -> Option<String> {
    instructions
        .iter()
        .find(|ix| account_keys.get(ix.program_id_index as usize) == Some(&MEMO_PROGRAM_ID))
        .and_then(|ix| String::from_utf8(ix.data.clone()).ok())
}

/// Destination account of the first system program instruction, if any.
pub fn find_transfer_recipient(
    account_keys: &[Pubkey],
    instructions: &[CompiledInstruction],
) -> Option<Pubkey> {
    instructions
        .iter()
        .find(|ix| account_keys.get(ix.program_id_index as usize) == Some(&SYSTEM_PROGRAM_ID))
        .and_then(|ix| ix.accounts.get(1))
        .and_then(|&index| account_keys.get(index as usize).copied())
}

pub fn extract_memo(transaction: &Transaction) -> Option<String> {
    find_memo(
        &transaction.message.account_keys,
        &transaction.message.instructions,
    )
}
