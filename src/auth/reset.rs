use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

pub const RESET_TOKEN_TTL: time::Duration = time::Duration::minutes(10);

/// Split-representation reset credential. `plaintext` goes to the user once,
/// by email, and is never persisted; the store keeps only `hash` + expiry.
pub struct ResetToken {
    pub plaintext: String,
    pub hash: String,
    pub expires_at: OffsetDateTime,
}

impl ResetToken {
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        let plaintext = hex::encode(secret);
        Self {
            hash: hash_reset_token(&plaintext),
            expires_at: OffsetDateTime::now_utc() + RESET_TOKEN_TTL,
            plaintext,
        }
    }
}

/// Fast deterministic digest of the presented token. Recomputed on every
/// redemption attempt, so this is SHA-256 and not the password KDF.
pub fn hash_reset_token(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
