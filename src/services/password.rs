use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = 32;
const ITERATIONS: u32 = 100_000;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    #[error("Failed to generate salt")]
    SaltGeneration,

    #[error("Invalid password hash format")]
    InvalidFormat,
}

/// Hashes a password with PBKDF2-HMAC-SHA256.
///
/// Storage format: `<hex salt>$<hex derived key>`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| PasswordError::SaltGeneration)?;

    let mut derived = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        ALGORITHM,
        NonZeroU32::new(ITERATIONS).unwrap(),
        &salt,
        password.as_bytes(),
        &mut derived,
    );

    Ok(format!("{}${}", hex::encode(salt), hex::encode(derived)))
}

/// Verifies a password against a stored hash. Comparison happens inside
/// ring's constant-time `pbkdf2::verify`.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let (salt_hex, derived_hex) = stored.split_once('$').ok_or(PasswordError::InvalidFormat)?;

    let salt = hex::decode(salt_hex).map_err(|_| PasswordError::InvalidFormat)?;
    let derived = hex::decode(derived_hex).map_err(|_| PasswordError::InvalidFormat)?;

    if salt.len() != SALT_LEN || derived.len() != CREDENTIAL_LEN {
        return Err(PasswordError::InvalidFormat);
    }

    Ok(pbkdf2::verify(
        ALGORITHM,
        NonZeroU32::new(ITERATIONS).unwrap(),
        &salt,
        password.as_bytes(),
        &derived,
    )
    .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_hashing_is_salted() {
        let h1 = hash_password("same-password").unwrap();
        let h2 = hash_password("same-password").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_invalid_stored_format() {
        assert!(matches!(
            verify_password("x", "not-a-valid-hash"),
            Err(PasswordError::InvalidFormat)
        ));
        assert!(matches!(
            verify_password("x", "abcd$zzzz"),
            Err(PasswordError::InvalidFormat)
        ));
    }
}
