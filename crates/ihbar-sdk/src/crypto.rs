use std::fmt;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use hkdf::Hkdf;
use md5::{Digest, Md5};
use rand::RngCore;
use sha2::Sha256;
use solana_sdk::signature::Keypair;

use crate::error::{Result, SdkError};

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_INFO: &[u8] = b"ihbar-memo-v1";

/// OpenSSL envelope header, `"Salted__"` followed by an 8-byte salt.
const OPENSSL_MAGIC: &[u8] = b"Salted__";
const OPENSSL_SALT_LEN: usize = 8;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Passphrase the memo cipher keys are derived from.
///
/// Deployments derive it from the hex encoding of a keypair's 64 secret bytes. The
/// value never leaves this type: `Debug` is redacted and there is no `Display`.
#[derive(Clone)]
pub struct ServerSecret(String);

impl ServerSecret {
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self(hex::encode(keypair.to_bytes()))
    }

    pub fn from_passphrase(passphrase: impl Into<String>) -> Result<Self> {
        let passphrase = passphrase.into();
        if passphrase.is_empty() {
            return Err(SdkError::InvalidSecret("passphrase must not be empty".into()));
        }
        Ok(Self(passphrase))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSecret(<redacted>)")
    }
}

/// Parse a keypair given either as a JSON byte array (`[12,34,...]`, the Solana CLI
/// file format) or as a base58 string.
pub fn keypair_from_str(value: &str) -> Result<Keypair> {
    let value = value.trim();
    let bytes: Vec<u8> = if value.starts_with('[') {
        serde_json::from_str(value)
            .map_err(|e| SdkError::InvalidSecret(format!("invalid JSON byte array: {}", e)))?
    } else {
        bs58::decode(value)
            .into_vec()
            .map_err(|e| SdkError::InvalidSecret(format!("invalid base58: {}", e)))?
    };

    Keypair::try_from(&bytes[..])
        .map_err(|e| SdkError::InvalidSecret(format!("invalid keypair bytes: {}", e)))
}

fn memo_cipher(secret: &ServerSecret, salt: &[u8]) -> Result<Aes256Gcm> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), secret.as_bytes());
    let mut key = [0u8; 32];
    hkdf.expand(KEY_INFO, &mut key)
        .map_err(|e| SdkError::Crypto(format!("Key derivation failed: {}", e)))?;
    Aes256Gcm::new_from_slice(&key).map_err(|_| SdkError::Crypto("Invalid key length".into()))
}

/// Encrypt a memo: base64(salt ‖ nonce ‖ AES-256-GCM ciphertext).
///
/// Salt and nonce are random per call, so encrypting the same memo twice yields
/// different ciphertexts.
pub fn encrypt_memo(plaintext: &str, secret: &ServerSecret) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce_bytes);

    let cipher = memo_cipher(secret, &salt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|_| SdkError::Crypto("Encryption failed".into()))?;

    let mut envelope = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(envelope))
}

pub fn decrypt_memo(ciphertext: &str, secret: &ServerSecret) -> Result<String> {
    let envelope = STANDARD
        .decode(ciphertext.trim())
        .map_err(|_| SdkError::Crypto("Ciphertext is not valid base64".into()))?;
    if envelope.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(SdkError::Crypto(format!(
            "Ciphertext too short: {} bytes",
            envelope.len()
        )));
    }

    let (salt, rest) = envelope.split_at(SALT_LEN);
    let (nonce, body) = rest.split_at(NONCE_LEN);

    let cipher = memo_cipher(secret, salt)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), body)
        .map_err(|_| {
            SdkError::Crypto("Decryption failed - wrong secret or corrupted ciphertext".into())
        })?;

    String::from_utf8(plaintext)
        .map_err(|_| SdkError::Crypto("Decrypted memo is not valid UTF-8".into()))
}

/// EVP_BytesToKey with MD5 and one round: 32-byte key followed by a 16-byte IV.
fn openssl_key_iv(passphrase: &[u8], salt: &[u8]) -> ([u8; 32], [u8; 16]) {
    let mut derived = Vec::with_capacity(48);
    let mut block: Vec<u8> = Vec::new();
    while derived.len() < 48 {
        let mut hasher = Md5::new();
        hasher.update(&block);
        hasher.update(passphrase);
        hasher.update(salt);
        block = hasher.finalize().to_vec();
        derived.extend_from_slice(&block);
    }

    let mut key = [0u8; 32];
    let mut iv = [0u8; 16];
    key.copy_from_slice(&derived[..32]);
    iv.copy_from_slice(&derived[32..48]);
    (key, iv)
}

/// Decrypt a memo written by the CryptoJS deployment (`CryptoJS.AES.encrypt(memo, secret)`):
/// base64 of `"Salted__" ‖ salt ‖ AES-256-CBC ciphertext`.
///
/// Decryption only; new memos are always written with [`encrypt_memo`].
pub fn decrypt_cryptojs_memo(ciphertext: &str, secret: &ServerSecret) -> Result<String> {
    let envelope = STANDARD
        .decode(ciphertext.trim())
        .map_err(|_| SdkError::Crypto("Ciphertext is not valid base64".into()))?;
    let header_len = OPENSSL_MAGIC.len() + OPENSSL_SALT_LEN;
    if envelope.len() <= header_len || !envelope.starts_with(OPENSSL_MAGIC) {
        return Err(SdkError::Crypto("Ciphertext is not a salted OpenSSL envelope".into()));
    }

    let salt = &envelope[OPENSSL_MAGIC.len()..header_len];
    let (key, iv) = openssl_key_iv(secret.as_bytes(), salt);
    let cipher = Aes256CbcDec::new_from_slices(&key, &iv)
        .map_err(|_| SdkError::Crypto("Invalid key length".into()))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&envelope[header_len..])
        .map_err(|_| {
            SdkError::Crypto("Decryption failed - wrong secret or corrupted ciphertext".into())
        })?;

    String::from_utf8(plaintext)
        .map_err(|_| SdkError::Crypto("Decrypted memo is not valid UTF-8".into()))
}

/// Decrypt a memo in either format, picking the CryptoJS path when the envelope
/// carries the OpenSSL header.
pub fn decrypt_any_memo(ciphertext: &str, secret: &ServerSecret) -> Result<String> {
    let is_openssl = STANDARD
        .decode(ciphertext.trim())
        .map(|bytes| bytes.starts_with(OPENSSL_MAGIC))
        .unwrap_or(false);

    if is_openssl {
        decrypt_cryptojs_memo(ciphertext, secret)
    } else {
        decrypt_memo(ciphertext, secret)
    }
}
