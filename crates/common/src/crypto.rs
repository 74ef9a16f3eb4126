//! Cryptographic helpers.
//!
//! RSA key pairs back the `ActivityPub` actor documents served by the
//! federation resolver; SHA-256 digests let access tokens be stored without
//! keeping the bearer secret itself.
//!
//! ```
//! use fedblog_common::crypto::{generate_rsa_keypair, parse_public_key};
//!
//! let keypair = generate_rsa_keypair().expect("Failed to generate keypair");
//! assert!(keypair.public_key_pem.contains("BEGIN PUBLIC KEY"));
//! let _public = parse_public_key(&keypair.public_key_pem).expect("Failed to parse");
//! ```

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AppError, AppResult};

/// RSA key pair in PEM format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaKeypair {
    /// Public key in PEM format (SPKI encoding).
    pub public_key_pem: String,
    /// Private key in PEM format (PKCS#8 encoding).
    pub private_key_pem: String,
}

const RSA_KEY_SIZE: usize = 2048;

/// Generate a new 2048-bit RSA key pair.
pub fn generate_rsa_keypair() -> AppResult<RsaKeypair> {
    let mut rng = rand::thread_rng();

    let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_SIZE)
        .map_err(|e| AppError::Internal(format!("Failed to generate RSA key: {e}")))?;

    let public_key = RsaPublicKey::from(&private_key);

    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| AppError::Internal(format!("Failed to encode private key: {e}")))?
        .to_string();

    let public_key_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| AppError::Internal(format!("Failed to encode public key: {e}")))?;

    Ok(RsaKeypair {
        public_key_pem,
        private_key_pem,
    })
}

/// Parse an RSA public key from PEM format.
pub fn parse_public_key(pem: &str) -> AppResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| AppError::Internal(format!("Failed to parse public key: {e}")))
}

/// Hash an access token secret for storage (hex-encoded SHA-256).
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
