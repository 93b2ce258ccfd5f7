use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ihbar_sdk::crypto::decrypt_any_memo;
use ihbar_sdk::transaction::{deserialize_transaction, find_memo, find_transfer_recipient};
use ihbar_sdk::{keypair_from_str, ServerSecret};
use solana_client::{rpc_client::RpcClient, rpc_config::RpcTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, instruction::CompiledInstruction, pubkey::Pubkey,
    signature::Signature,
};
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;

#[derive(Debug, Clone)]
struct ReportInfo {
    fee_payer: Option<Pubkey>,
    recipient: Option<Pubkey>,
    memo: String,
    block_time: Option<DateTime<Utc>>,
}

fn read_report(
    account_keys: &[Pubkey],
    instructions: &[CompiledInstruction],
    secret: &ServerSecret,
) -> Result<ReportInfo> {
    let ciphertext = find_memo(account_keys, instructions)
        .ok_or_else(|| anyhow!("Transaction has no memo instruction"))?;
    let memo = decrypt_any_memo(&ciphertext, secret)?;

    Ok(ReportInfo {
        fee_payer: account_keys.first().copied(),
        recipient: find_transfer_recipient(account_keys, instructions),
        memo,
        block_time: None,
    })
}

/// Decode the `transaction` field of an action POST response.
fn read_encoded_transaction(encoded: &str, secret: &ServerSecret) -> Result<ReportInfo> {
    let tx = deserialize_transaction(encoded)?;
    read_report(&tx.message.account_keys, &tx.message.instructions, secret)
}

struct MemoReader {
    client: RpcClient,
    secret: ServerSecret,
}

impl MemoReader {
    fn new(rpc_url: &str, secret: ServerSecret) -> Self {
        Self {
            client: RpcClient::new_with_commitment(
                rpc_url.to_string(),
                CommitmentConfig::confirmed(),
            ),
            secret,
        }
    }

    fn fetch(&self, signature: &Signature) -> Result<ReportInfo> {
        let tx = self
            .client
            .get_transaction_with_config(
                signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Base64),
                    commitment: Some(CommitmentConfig::confirmed()),
                    max_supported_transaction_version: Some(0),
                },
            )
            .map_err(|e| anyhow!("Failed to fetch transaction {}: {}", signature, e))?;

        let versioned = tx
            .transaction
            .transaction
            .decode()
            .ok_or_else(|| anyhow!("Could not decode transaction {}", signature))?;

        let mut report = read_report(
            versioned.message.static_account_keys(),
            versioned.message.instructions(),
            &self.secret,
        )?;
        report.block_time = tx.block_time.and_then(|ts| DateTime::from_timestamp(ts, 0));
        Ok(report)
    }
}

fn print_report(report: &ReportInfo) {
    let show = |key: Option<Pubkey>| {
        key.map(|k| k.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };

    println!();
    println!("  Reporter (fee payer): {}", show(report.fee_payer));
    println!("  Recipient:            {}", show(report.recipient));
    if let Some(time) = report.block_time {
        println!("  Block time:           {}", time.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Memo:                 {}", report.memo);
    println!();
}

#[derive(Parser, Debug)]
#[command(name = "memo-reader")]
#[command(about = "Decrypt anonymous report memos with the server SECRET_KEY")]
struct Args {
    /// Keypair (JSON byte array or base58); defaults to the SECRET_KEY environment variable
    #[arg(short, long)]
    secret_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decrypt a memo ciphertext
    Decrypt {
        #[arg(value_name = "CIPHERTEXT")]
        ciphertext: String,
    },
    /// Decrypt the memo of a base64 transaction returned by an action POST
    Decode {
        #[arg(value_name = "TRANSACTION")]
        transaction: String,
    },
    /// Fetch a confirmed transaction and decrypt its memo
    Fetch {
        #[arg(value_name = "SIGNATURE")]
        signature: String,

        #[arg(short, long, default_value = "https://api.devnet.solana.com")]
        rpc: String,
    },
}

fn load_secret(arg: Option<String>) -> Result<ServerSecret> {
    let value = match arg {
        Some(value) => value,
        None => std::env::var("SECRET_KEY")
            .map_err(|_| anyhow!("Pass --secret-key or set SECRET_KEY"))?,
    };
    let keypair = keypair_from_str(&value)?;
    Ok(ServerSecret::from_keypair(&keypair))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let secret = load_secret(args.secret_key)?;

    match args.command {
        Command::Decrypt { ciphertext } => {
            println!("{}", decrypt_any_memo(&ciphertext, &secret)?);
        }
        Command::Decode { transaction } => {
            print_report(&read_encoded_transaction(&transaction, &secret)?);
        }
        Command::Fetch { signature, rpc } => {
            let signature = Signature::from_str(&signature)
                .map_err(|e| anyhow!("Invalid signature: {}", e))?;
            println!("  RPC: {}", rpc);
            let reader = MemoReader::new(&rpc, secret);
            print_report(&reader.fetch(&signature)?);
        }
    }

    Ok(())
}
