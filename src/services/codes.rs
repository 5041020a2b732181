use ring::rand::{SecureRandom, SystemRandom};

/// Alphabet without 0/O, 1/I/L to keep codes readable over the phone.
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

const KEY_GROUPS: usize = 4;
const KEY_GROUP_LEN: usize = 4;
const REFERRAL_CODE_LEN: usize = 8;

#[derive(thiserror::Error, Debug)]
pub enum CodeError {
    #[error("Failed to generate random material")]
    Generation,
}

fn random_chars(len: usize) -> Result<String, CodeError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes).map_err(|_| CodeError::Generation)?;

    Ok(bytes
        .iter()
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect())
}

/// Generates an access key code, e.g. `EH-XXXX-XXXX-XXXX-XXXX`. Uniqueness
/// is enforced by the database constraint; collisions at this entropy are
/// not expected.
pub fn generate_key_code() -> Result<String, CodeError> {
    let mut parts = Vec::with_capacity(KEY_GROUPS + 1);
    parts.push("EH".to_string());
    for _ in 0..KEY_GROUPS {
        parts.push(random_chars(KEY_GROUP_LEN)?);
    }
    Ok(parts.join("-"))
}

/// Generates a short referral code for signup links.
pub fn generate_referral_code() -> Result<String, CodeError> {
    random_chars(REFERRAL_CODE_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_code_shape() {
        let code = generate_key_code().unwrap();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), KEY_GROUPS + 1);
        assert_eq!(parts[0], "EH");
        for group in &parts[1..] {
            assert_eq!(group.len(), KEY_GROUP_LEN);
            assert!(group.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_no_ambiguous_characters() {
        let code = generate_referral_code().unwrap();
        for c in ['0', 'O', '1', 'I', 'L'] {
            assert!(!code.contains(c));
        }
    }

    #[test]
    fn test_codes_differ() {
        assert_ne!(generate_key_code().unwrap(), generate_key_code().unwrap());
    }
}
