use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use ring::hmac;
use serde_json::json;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{BatasError, Result};

/// Seconds a minted service token stays valid.
const TOKEN_TTL_SECS: i64 = 300;
/// Re-mint this far ahead of expiry so an in-flight request never carries a
/// token that lapses mid-call.
const REFRESH_LEEWAY_SECS: i64 = 60;

const TOKEN_ISSUER: &str = "batas-gateway";
const TOKEN_AUDIENCE: &str = "batas-kb";

/// Capability for obtaining the current bearer token. Kept narrow so tests
/// can swap it without a real signing key.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn current_token(&self) -> Result<String>;
}

/// Select the provider for a configured secret: a three-part JWT is passed
/// through unchanged, anything else becomes an HS256 signing key, and no
/// secret means unauthenticated requests.
pub fn provider_for_secret(secret: Option<&str>) -> Arc<dyn TokenProvider> {
    match secret {
        Some(secret) if looks_like_jwt(secret) => {
            Arc::new(StaticTokenProvider::new(secret.to_string()))
        }
        Some(secret) => Arc::new(MintingTokenProvider::new(secret)),
        None => Arc::new(StaticTokenProvider::new(String::new())),
    }
}

fn looks_like_jwt(secret: &str) -> bool {
    let parts: Vec<&str> = secret.split('.').collect();
    parts.len() == 3 && parts.iter().all(|part| !part.is_empty())
}

/// Passes a pre-issued token (or nothing) through unchanged.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn current_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

struct MintedToken {
    token: String,
    expires_at: i64,
}

/// Mints short-lived HS256 service tokens from a shared secret. The current
/// token is cached and re-minted ahead of expiry; minting is cheap enough
/// that the cache exists to keep tokens stable across a burst of requests,
/// not to save CPU.
pub struct MintingTokenProvider {
    key: hmac::Key,
    cached: Mutex<Option<MintedToken>>,
}

impl MintingTokenProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            cached: Mutex::new(None),
        }
    }

    fn mint(&self) -> Result<MintedToken> {
        let now = Utc::now().timestamp();
        let expires_at = now + TOKEN_TTL_SECS;

        let header = json!({ "alg": "HS256", "typ": "JWT" });
        let claims = json!({
            "iss": TOKEN_ISSUER,
            "aud": TOKEN_AUDIENCE,
            "iat": now,
            "exp": expires_at,
            "jti": Uuid::new_v4().to_string(),
        });

        let header_b64 = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&header)
                .map_err(|e| BatasError::Token(format!("Failed to encode header: {e}")))?,
        );
        let claims_b64 = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| BatasError::Token(format!("Failed to encode claims: {e}")))?,
        );

        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = hmac::sign(&self.key, signing_input.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(signature.as_ref());

        Ok(MintedToken {
            token: format!("{signing_input}.{signature_b64}"),
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for MintingTokenProvider {
    async fn current_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().unwrap();
        let now = Utc::now().timestamp();

        if let Some(ref minted) = *cached {
            if now < minted.expires_at - REFRESH_LEEWAY_SECS {
                return Ok(minted.token.clone());
            }
        }

        let minted = self.mint()?;
        let token = minted.token.clone();
        *cached = Some(minted);
        Ok(token)
    }
}
