use pbkdf2::pbkdf2;
use rand::Rng;

use crate::{HmacSha256, PBKDF2_ITERATIONS, SALT_BYTES};

/// Function to generate a random salt for PBKDF2
fn generate_random_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..SALT_BYTES).map(|_| rng.gen()).collect()
}

/// Function to derive a 32-byte key from the password using PBKDF2
fn derive_key(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut key = vec![0u8; 32];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Hash a plaintext password with a fresh random salt. The result is stored
/// as `hex(salt):hex(hash)`; the plaintext is never persisted.
pub fn hash_password(password: &str) -> String {
    let salt = generate_random_salt();
    let hash = derive_key(password, &salt);
    format!("{}:{}", hex::encode(&salt), hex::encode(hash))
}

/// Verify a plaintext password against a stored `hex(salt):hex(hash)` value.
/// Malformed stored values verify false rather than erroring.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split(':').collect();
    if parts.len() != 2 {
        return false;
    }
    let salt = match hex::decode(parts[0]) {
        Ok(salt) => salt,
        Err(_) => return false,
    };
    hex::encode(derive_key(password, &salt)) == parts[1]
}
