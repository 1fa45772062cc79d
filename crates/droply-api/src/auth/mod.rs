//! API-key authentication.
//!
//! Session handling proper is delegated to the hosted auth frontend; the
//! API authenticates with bearer keys of the form `dk_live_<40 hex>`. Keys
//! are stored hashed (argon2) with a plaintext prefix for lookup, so
//! verification is: match candidates by prefix, verify the full key
//! against each candidate's hash.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use droply_core::models::PlanTier;
use droply_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::state::AppState;

/// Length of the lookup prefix stored in plaintext.
const KEY_PREFIX_LEN: usize = 16;

/// Generate a new API key: `dk_live_<40 hex chars>`.
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..20).map(|_| rng.random()).collect();
    format!("dk_live_{}", hex::encode(random_bytes))
}

/// Hash a secret (API key or share password) for storage.
pub fn hash_secret(secret: &str) -> Result<String, AppError> {
    use argon2::{
        password_hash::{PasswordHasher, SaltString},
        Argon2,
    };
    use rand_core::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash secret: {}", e)))
}

/// Verify a secret against a stored argon2 hash.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, AppError> {
    use argon2::{
        password_hash::{PasswordHash, PasswordVerifier},
        Argon2,
    };

    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Plaintext prefix used for key lookup.
pub fn extract_key_prefix(key: &str) -> String {
    if key.len() > KEY_PREFIX_LEN {
        key[..KEY_PREFIX_LEN].to_string()
    } else {
        key.to_string()
    }
}

/// The authenticated account making the request.
#[derive(Debug, Clone)]
pub struct Owner {
    pub user_id: Uuid,
    pub email: String,
    pub plan: PlanTier,
}

impl FromRequestParts<Arc<AppState>> for Owner {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| {
                AppError::Unauthorized("Missing or malformed Authorization header".to_string())
            })?;

        if !key.starts_with("dk_live_") {
            return Err(
                AppError::Unauthorized("Invalid API key format".to_string()).into(),
            );
        }

        let prefix = extract_key_prefix(key);
        let candidates = state.users.find_api_keys_by_prefix(&prefix).await?;

        for candidate in candidates {
            if verify_secret(key, &candidate.key_hash)? {
                state.users.touch_api_key(candidate.id).await?;

                let user = state
                    .users
                    .find_user(candidate.user_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Unauthorized("API key owner no longer exists".to_string())
                    })?;

                let plan = PlanTier::parse(&user.plan).ok_or_else(|| {
                    AppError::Internal(format!("Unknown plan '{}' for user {}", user.plan, user.id))
                })?;

                return Ok(Owner {
                    user_id: user.id,
                    email: user.email,
                    plan,
                });
            }
        }

        Err(AppError::Unauthorized("Invalid API key".to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_expected_shape() {
        let key = generate_api_key();
        assert!(key.starts_with("dk_live_"));
        assert_eq!(key.len(), 48); // "dk_live_" (8) + 40 hex chars
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let key = generate_api_key();
        let hash = hash_secret(&key).expect("hash");

        assert_ne!(hash, key);
        assert!(verify_secret(&key, &hash).expect("verify"));
        assert!(!verify_secret("wrong_key", &hash).expect("verify wrong"));
    }

    #[test]
    fn password_hash_is_never_the_plaintext() {
        let hash = hash_secret("abcd1234").expect("hash");
        assert_ne!(hash, "abcd1234");
        assert!(verify_secret("abcd1234", &hash).expect("verify"));
    }

    #[test]
    fn prefix_is_sixteen_chars() {
        let key = "dk_live_abc123def456";
        let prefix = extract_key_prefix(key);
        assert_eq!(prefix, "dk_live_abc123de");
        assert_eq!(prefix.len(), 16);
        assert_eq!(extract_key_prefix("short"), "short");
    }
}
