use anyhow::{anyhow, bail, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::{Key, Nonce, XSalsa20Poly1305};

const NONCE_LEN: usize = 24;

fn cipher(secret: &str) -> XSalsa20Poly1305 {
    let key = blake3::hash(secret.as_bytes());
    XSalsa20Poly1305::new(Key::from_slice(key.as_bytes()))
}

/// Seals `plaintext` under a key derived from `secret`. Output is url-safe base64 of nonce || ciphertext.
pub fn encrypt(plaintext: &str, secret: &str) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::fill(&mut nonce[..]);

    let sealed = cipher(secret)
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| anyhow!("failed to seal payload"))?;

    let mut out = nonce.to_vec();
    out.extend(sealed);
    Ok(URL_SAFE_NO_PAD.encode(out))
}

pub fn decrypt(token: &str, secret: &str) -> Result<String> {
    let raw = URL_SAFE_NO_PAD.decode(token)?;
    if raw.len() <= NONCE_LEN {
        bail!("sealed payload too short");
    }

    let (nonce, sealed) = raw.split_at(NONCE_LEN);
    let opened = cipher(secret)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| anyhow!("failed to open sealed payload"))?;
    Ok(String::from_utf8(opened)?)
}

/// Argon2id with default parameters, stored as a PHC string (`$argon2id$v=19$...`).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// False for a wrong password and for anything that is not a PHC string.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_payload_opens_with_same_secret_only() {
        let token = encrypt(r#"{"user_id":"abc"}"#, "salt-one").unwrap();
        assert_eq!(decrypt(&token, "salt-one").unwrap(), r#"{"user_id":"abc"}"#);
        assert!(decrypt(&token, "salt-two").is_err());
        assert!(decrypt("bm9wZQ", "salt-one").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let stored = hash_password("surf's up").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("surf's up", &stored));
        assert!(!verify_password("surfs up", &stored));
        assert!(!verify_password("surf's up", "not-a-phc-string"));

        // fresh salt every time
        assert_ne!(stored, hash_password("surf's up").unwrap());
    }

    #[test]
    fn fast_digests_are_not_accepted() {
        let digest = blake3::hash(b"surf's up").to_hex().to_string();
        assert!(!verify_password("surf's up", &digest));
        assert!(!verify_password("surf's up", &format!("00ff${}", digest)));
    }
}
