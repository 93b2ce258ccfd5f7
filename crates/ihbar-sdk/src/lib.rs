//! Building blocks for the anonymous report ("ihbar") Solana Actions.
//!
//! A POST to an action runs one pipeline: query parameters are resolved against the
//! variant's field schema, rendered into a memo, encrypted with the server secret and
//! attached to an unsigned zero-lamport transfer that the caller signs locally.
//!
//! ```rust,no_run
//! use ihbar_sdk::{crypto, ActionVariant, ServerSecret};
//! use solana_sdk::{hash::Hash, pubkey::Pubkey};
//!
//! # fn main() -> ihbar_sdk::Result<()> {
//! let variant = ActionVariant::benim_hayatim(Pubkey::new_unique())?;
//! let secret = ServerSecret::from_passphrase("0badc0de")?;
//!
//! let params = vec![("suclu".to_string(), "Alice".to_string())];
//! let memo = variant.compose_memo(&params)?;
//! let ciphertext = crypto::encrypt_memo(&memo, &secret)?;
//! let response = variant.post_response(&Pubkey::new_unique(), &ciphertext, Hash::default())?;
//! println!("{}", response.transaction);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod crypto;
pub mod error;
pub mod fields;
pub mod memo;
pub mod transaction;
pub mod variant;

pub use action::{ActionGetResponse, ActionPostRequest, ActionPostResponse, ActionsJson};
pub use crypto::{keypair_from_str, ServerSecret};
pub use error::{Result, SdkError};
pub use fields::{FieldSpec, ValidatedFields};
pub use memo::MemoTemplate;
pub use variant::ActionVariant;
