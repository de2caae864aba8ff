/// Bearer token issuance and validation
///
/// Tokens are HS256-signed JWTs carrying a username claim and a short
/// expiry. The signing secret is injected from configuration at startup and
/// immutable afterwards; there is no rotation mechanism.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated username, exposed to handlers as the request identity.
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_minutes: i64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_minutes: config.token_ttl_minutes,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            username: username.to_string(),
            exp: (Utc::now() + Duration::minutes(self.ttl_minutes)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // A token is rejected strictly after its expiry, no leeway.
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    fn issuer(secret: &str, ttl_minutes: i64) -> TokenIssuer {
        TokenIssuer::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            token_ttl_minutes: ttl_minutes,
        })
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let issuer = issuer("test-secret", 10);
        let token = issuer.issue("alice").unwrap();
        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer("test-secret", -1);
        let token = issuer.issue("alice").unwrap();
        let err = issuer.validate(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer("secret-a", 10).issue("alice").unwrap();
        assert!(issuer("secret-b", 10).validate(&token).is_err());
    }
}
