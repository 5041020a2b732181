use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

const TOKEN_LEN: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("Failed to generate token material")]
    Generation,
}

/// A freshly minted bearer token. Only the digest is ever stored; the raw
/// token goes to the client once and cannot be recovered.
pub struct MintedToken {
    pub token: String,
    pub digest: String,
}

pub fn mint_token() -> Result<MintedToken, TokenError> {
    let rng = SystemRandom::new();

    let mut bytes = [0u8; TOKEN_LEN];
    rng.fill(&mut bytes).map_err(|_| TokenError::Generation)?;

    let token = hex::encode(bytes);
    let digest = digest_token(&token);

    Ok(MintedToken { token, digest })
}

/// SHA-256 hex digest of a raw token, for storage and lookup.
pub fn digest_token(token: &str) -> String {
    hex::encode(digest::digest(&digest::SHA256, token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_token_matches_digest() {
        let minted = mint_token().unwrap();
        assert_eq!(digest_token(&minted.token), minted.digest);
        assert_eq!(minted.token.len(), TOKEN_LEN * 2);
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = mint_token().unwrap();
        let b = mint_token().unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(digest_token("abc"), digest_token("abc"));
        assert_ne!(digest_token("abc"), digest_token("abd"));
    }
}
