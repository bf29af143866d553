use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    BadSignature,
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::BadSignature => write!(f, "token signature mismatch"),
            TokenError::Expired => write!(f, "token expired"),
        }
    }
}

// Stored in PHC string form, e.g. `$argon2id$v=19$m=...$salt$hash`.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| anyhow!("failed to build password salt: {e}"))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// 64 hex characters, single use.
pub fn generate_verification_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

// `base64(user_id:expires_at).base64(hmac)`
pub fn issue_token(secret: &str, user_id: &str, ttl_hours: i64) -> anyhow::Result<String> {
    let expires_at = ttl_hours
        .checked_mul(3600)
        .and_then(|ttl| Utc::now().timestamp().checked_add(ttl))
        .ok_or_else(|| anyhow!("token lifetime of {ttl_hours}h is out of range"))?;
    let payload = URL_SAFE_NO_PAD.encode(format!("{user_id}:{expires_at}"));
    let signature = sign(secret, &payload)?;
    Ok(format!("{payload}.{signature}"))
}

pub fn verify_token(secret: &str, token: &str) -> Result<String, TokenError> {
    verify_token_at(secret, token, Utc::now().timestamp())
}

fn verify_token_at(secret: &str, token: &str, now: i64) -> Result<String, TokenError> {
    let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;

    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::BadSignature)?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Malformed)?;
    let (user_id, expires_at) = decoded.rsplit_once(':').ok_or(TokenError::Malformed)?;
    let expires_at: i64 = expires_at.parse().map_err(|_| TokenError::Malformed)?;

    if expires_at <= now {
        return Err(TokenError::Expired);
    }
    Ok(user_id.to_string())
}

fn sign(secret: &str, payload: &str) -> anyhow::Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|_| anyhow!("invalid auth secret"))?;
    mac.update(payload.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let stored = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn test_password_hash_is_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_password_hash_is_argon2_phc() {
        let stored = hash_password("hunter22").unwrap();
        assert!(stored.starts_with("$argon2id$"), "{stored}");
        assert!(!stored.contains("hunter22"));
        assert!(PasswordHash::new(&stored).is_ok());
    }

    #[test]
    fn test_verify_password_rejects_garbage() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "salt$%%%not-base64"));
        // Older salt$hmac digests no longer verify.
        assert!(!verify_password("x", "0123abcd$q9r8s7t6u5v4w3x2y1z0AbCdEfG="));
    }

    #[test]
    fn test_token_round_trip() {
        let token = issue_token("secret", "user-1", 1).unwrap();
        assert_eq!(verify_token("secret", &token).unwrap(), "user-1");
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = issue_token("secret", "user-1", 1).unwrap();
        assert_eq!(verify_token("other", &token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_token_tampered_payload() {
        let token = issue_token("secret", "user-1", 1).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!(
            "{}.{signature}",
            URL_SAFE_NO_PAD.encode("user-2:9999999999")
        );
        assert_eq!(verify_token("secret", &forged), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_token_expired() {
        let token = issue_token("secret", "user-1", 1).unwrap();
        let later = Utc::now().timestamp() + 2 * 3600;
        assert_eq!(verify_token_at("secret", &token, later), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_lifetime_overflow_is_an_error() {
        assert!(issue_token("secret", "user-1", i64::MAX).is_err());
        assert!(issue_token("secret", "user-1", i64::MAX / 3600).is_err());
    }

    #[test]
    fn test_token_malformed() {
        assert_eq!(verify_token("secret", "not-a-token"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_verification_tokens_are_unique() {
        let a = generate_verification_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, generate_verification_token());
    }
}
