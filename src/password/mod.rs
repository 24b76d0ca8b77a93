use anyhow::{Context, Result};

pub use bcrypt::DEFAULT_COST;

/// Hash a plaintext password with bcrypt (random salt per call)
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).with_context(|| format!("bcrypt hashing failed (cost {})", cost))
}

/// Check a plaintext password against a stored bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::error!("Password verification error: {}", e);
            false
        }
    }
}
