use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use crate::domain::repository::PasswordHashPort;
use crate::error::UsersServiceError;

/// Argon2id with default parameters and a random per-password salt.
/// Output is a PHC string (`$argon2id$v=19$...`).
#[derive(Clone, Default)]
pub struct Argon2Hasher;

impl PasswordHashPort for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, UsersServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("hash password: {e}"))?
            .to_string();
        Ok(hash)
    }
}
