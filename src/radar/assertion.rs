//! Signed assertion builder for the OAuth2 JWT-bearer grant.
//!
//! Each token request carries a short-lived ES256-signed claim set with the
//! client identifier as both issuer and subject and the OAuth issuer URL as
//! audience.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;

use super::error::RadarError;

/// Assertion lifetime. The token endpoint only needs it to be valid for the
/// duration of the exchange.
const ASSERTION_TTL_SECS: u64 = 60;

#[derive(Debug, Serialize)]
pub struct Claims {
    jti: String,
    iss: String,
    sub: String,
    aud: String,
    iat: u64,
    exp: u64,
}

impl Claims {
    fn new(client_id: &str, audience: &str, now: u64) -> Self {
        Self {
            jti: Uuid::new_v4().to_string(),
            iss: client_id.to_string(),
            sub: client_id.to_string(),
            aud: audience.to_string(),
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        }
    }
}

/// Seam for assertion signing so the client can be tested without key
/// material.
pub trait AssertionSigner: Send + Sync {
    fn sign(&self) -> Result<String, RadarError>;
}

/// Production signer: ES256 (ECDSA P-256 / SHA-256) over an unencrypted
/// PEM-encoded EC private key.
pub struct Es256Signer {
    key: EncodingKey,
    client_id: String,
    audience: String,
}

impl std::fmt::Debug for Es256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Es256Signer")
            .field("client_id", &self.client_id)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl Es256Signer {
    pub fn from_pem_file(
        path: &Path,
        client_id: &str,
        audience: &str,
    ) -> Result<Self, RadarError> {
        let pem = std::fs::read(path).map_err(|source| RadarError::KeyRead {
            path: path.display().to_string(),
            source,
        })?;
        let key = EncodingKey::from_ec_pem(&pem).map_err(|source| RadarError::KeyParse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            key,
            client_id: client_id.to_string(),
            audience: audience.to_string(),
        })
    }
}

impl AssertionSigner for Es256Signer {
    fn sign(&self) -> Result<String, RadarError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let claims = Claims::new(&self.client_id, &self.audience, now);
        jsonwebtoken::encode(&Header::new(Algorithm::ES256), &claims, &self.key)
            .map_err(RadarError::Sign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_shape() {
        let claims = Claims::new("client-1", "https://oauth2.example", 1_000);
        assert_eq!(claims.iss, "client-1");
        assert_eq!(claims.sub, claims.iss);
        assert_eq!(claims.aud, "https://oauth2.example");
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 1_060);
    }

    #[test]
    fn test_claims_unique_request_id() {
        let a = Claims::new("c", "a", 0);
        let b = Claims::new("c", "a", 0);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_from_pem_file_missing_key() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("key.pem");
        let err = Es256Signer::from_pem_file(&missing, "c", "a").unwrap_err();
        assert!(matches!(err, RadarError::KeyRead { .. }));
    }

    #[test]
    fn test_from_pem_file_garbage_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("key.pem");
        std::fs::write(&path, "not a pem").unwrap();
        let err = Es256Signer::from_pem_file(&path, "c", "a").unwrap_err();
        assert!(matches!(err, RadarError::KeyParse { .. }));
    }
}
