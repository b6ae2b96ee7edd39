//! Google ID token verification with JWKS.
//!
//! Verifies the RS256 ID tokens issued by Google Sign-In (and Firebase Auth
//! with the Google provider) against the provider's published keys, which
//! are fetched on demand and cached.

use async_trait::async_trait;
use chrono::Utc;
use domain::models::FederatedIdentity;
use domain::services::{IdentityError, IdentityVerifier};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::IdentityConfig;

/// Cache TTL in seconds (1 hour)
const CACHE_TTL_SECS: i64 = 3600;

/// Minimum seconds between refetches triggered by an unknown `kid`.
const MISS_REFETCH_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    /// RSA modulus (base64url encoded)
    n: String,
    /// RSA exponent (base64url encoded)
    e: String,
}

/// Claims read from a Google ID token.
#[derive(Debug, Clone, Deserialize)]
struct GoogleIdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleIdClaims> for FederatedIdentity {
    fn from(claims: GoogleIdClaims) -> Self {
        FederatedIdentity {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified.unwrap_or(false),
            display_name: claims.name,
            photo_url: claims.picture,
        }
    }
}

struct CachedJwks {
    keys: Jwks,
    fetched_at: i64,
}

/// What to do for a `kid` given the current cache.
#[derive(Debug)]
enum KeyLookup {
    Found(Jwk),
    /// Unknown kid, but the set was fetched too recently to try again.
    Unknown,
    Refetch,
}

fn lookup_cached(cache: Option<&CachedJwks>, kid: &str, now: i64) -> KeyLookup {
    let Some(cached) = cache else {
        return KeyLookup::Refetch;
    };
    let age = now - cached.fetched_at;
    if age >= CACHE_TTL_SECS {
        return KeyLookup::Refetch;
    }
    match cached.keys.keys.iter().find(|k| k.kid == kid) {
        Some(jwk) => KeyLookup::Found(jwk.clone()),
        None if age < MISS_REFETCH_SECS => KeyLookup::Unknown,
        None => KeyLookup::Refetch,
    }
}

fn unknown_key(kid: &str) -> IdentityError {
    IdentityError::InvalidToken(format!("unknown signing key: {}", kid))
}

pub struct GoogleIdentityVerifier {
    http_client: Client,
    cache: RwLock<Option<CachedJwks>>,
    jwks_url: String,
    client_id: String,
    issuers: Vec<String>,
}

impl GoogleIdentityVerifier {
    pub fn new(config: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http_client,
            cache: RwLock::new(None),
            jwks_url: config.jwks_url.clone(),
            client_id: config.client_id.clone(),
            issuers: config.issuers.clone(),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.set_issuer(self.issuers.as_slice());
        validation.set_audience(&[&self.client_id]);
        validation
    }

    /// Gets a JWK by kid, refetching the key set when stale or when the kid
    /// is unknown (keys rotate). Unknown kids refetch at most once per
    /// [`MISS_REFETCH_SECS`].
    async fn get_jwk(&self, kid: &str) -> Result<Jwk, IdentityError> {
        match lookup_cached(self.cache.read().await.as_ref(), kid, Utc::now().timestamp()) {
            KeyLookup::Found(jwk) => return Ok(jwk),
            KeyLookup::Unknown => return Err(unknown_key(kid)),
            KeyLookup::Refetch => {}
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed the set while we waited.
        match lookup_cached(cache.as_ref(), kid, Utc::now().timestamp()) {
            KeyLookup::Found(jwk) => return Ok(jwk),
            KeyLookup::Unknown => return Err(unknown_key(kid)),
            KeyLookup::Refetch => {}
        }

        let jwks = self.fetch_jwks().await?;
        let jwk = jwks.keys.iter().find(|k| k.kid == kid).cloned();
        *cache = Some(CachedJwks {
            keys: jwks,
            fetched_at: Utc::now().timestamp(),
        });

        jwk.ok_or_else(|| unknown_key(kid))
    }

    async fn fetch_jwks(&self) -> Result<Jwks, IdentityError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| IdentityError::KeysUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::KeysUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::KeysUnavailable(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, IdentityError> {
        let header = decode_header(id_token)
            .map_err(|_| IdentityError::InvalidToken("malformed token".to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("missing kid".to_string()))?;

        let jwk = self.get_jwk(&kid).await?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| IdentityError::KeysUnavailable(format!("invalid key {}: {}", kid, e)))?;

        let data = decode::<GoogleIdClaims>(id_token, &key, &self.validation())
            .map_err(|e| IdentityError::InvalidToken(describe(e.kind())))?;

        if data.claims.sub.is_empty() {
            return Err(IdentityError::InvalidToken("missing subject".to_string()));
        }
        Ok(data.claims.into())
    }
}

fn describe(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::ExpiredSignature => "token expired".to_string(),
        ErrorKind::InvalidSignature => "invalid signature".to_string(),
        ErrorKind::InvalidIssuer => "invalid issuer".to_string(),
        ErrorKind::InvalidAudience => "invalid audience".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IdentityConfig {
        IdentityConfig {
            client_id: "clinic.apps.googleusercontent.com".to_string(),
            issuers: vec!["https://accounts.google.com".to_string()],
            jwks_url: "http://127.0.0.1:9/certs".to_string(),
            admin_emails: vec![],
        }
    }

    #[test]
    fn test_claims_into_identity() {
        let claims: GoogleIdClaims = serde_json::from_value(serde_json::json!({
            "sub": "1100",
            "email": "dra@clinic.co",
            "email_verified": true,
            "name": "Dra. Pérez",
            "picture": "https://lh3.googleusercontent.com/a/x"
        }))
        .unwrap();
        let identity = FederatedIdentity::from(claims);
        assert_eq!(identity.uid, "1100");
        assert!(identity.email_verified);
        assert_eq!(identity.display_name.as_deref(), Some("Dra. Pérez"));
    }

    #[test]
    fn test_unverified_email_defaults_to_false() {
        let claims: GoogleIdClaims =
            serde_json::from_value(serde_json::json!({"sub": "1"})).unwrap();
        assert!(!FederatedIdentity::from(claims).email_verified);
    }

    #[tokio::test]
    async fn test_malformed_token_rejected_without_fetch() {
        let verifier = GoogleIdentityVerifier::new(&config()).unwrap();
        let err = verifier.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_hs256_token_rejected_without_fetch() {
        let jwt = shared::jwt::JwtConfig::with_secret("s", 60);
        let token = jwt.issue_session("uid", None).unwrap().token;
        let verifier = GoogleIdentityVerifier::new(&config()).unwrap();
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken(_)));
    }

    fn cached(kids: &[&str], fetched_at: i64) -> CachedJwks {
        CachedJwks {
            keys: Jwks {
                keys: kids
                    .iter()
                    .map(|kid| Jwk {
                        kid: kid.to_string(),
                        n: "n".to_string(),
                        e: "AQAB".to_string(),
                    })
                    .collect(),
            },
            fetched_at,
        }
    }

    #[test]
    fn test_unknown_kid_refetch_is_throttled() {
        let now = 10_000;
        let fresh = cached(&["k1"], now - 5);
        assert!(matches!(lookup_cached(Some(&fresh), "k1", now), KeyLookup::Found(_)));
        assert!(matches!(lookup_cached(Some(&fresh), "k9", now), KeyLookup::Unknown));

        let older = cached(&["k1"], now - MISS_REFETCH_SECS);
        assert!(matches!(lookup_cached(Some(&older), "k9", now), KeyLookup::Refetch));
        assert!(matches!(lookup_cached(Some(&older), "k1", now), KeyLookup::Found(_)));

        let stale = cached(&["k1"], now - CACHE_TTL_SECS);
        assert!(matches!(lookup_cached(Some(&stale), "k1", now), KeyLookup::Refetch));
        assert!(matches!(lookup_cached(None, "k1", now), KeyLookup::Refetch));
    }

    #[tokio::test]
    async fn test_unknown_kid_with_fresh_keys_skips_fetch() {
        let verifier = GoogleIdentityVerifier::new(&config()).unwrap();
        *verifier.cache.write().await = Some(cached(&["k1"], Utc::now().timestamp()));

        // The JWKS URL is unreachable, so a fetch would yield KeysUnavailable.
        let err = verifier.get_jwk("rotated-away").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken(_)));
    }
}
