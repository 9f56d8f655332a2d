//! Bearer access tokens (HS256 JWT)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, UserSummary};
use crate::{Error, Result};

/// Token payload; also the authenticated principal seen by handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens with a shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        }
    }

    /// Issue a token for `user`
    pub fn issue(&self, user: &UserSummary) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::Unauthorized(format!("Invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            email: "dj@zylo.fm".to_string(),
            role,
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = TokenIssuer::new("a-very-long-test-secret", 1);
        let u = user(Role::Dj);

        let token = issuer.issue(&u).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.email, u.email);
        assert_eq!(claims.role, Role::Dj);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new("a-very-long-test-secret", 1)
            .issue(&user(Role::Admin))
            .unwrap();

        let other = TokenIssuer::new("another-long-test-secret", 1);
        assert!(matches!(other.verify(&token), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative lifetime puts exp well beyond the default leeway
        let issuer = TokenIssuer::new("a-very-long-test-secret", -2);
        let token = issuer.issue(&user(Role::Listener)).unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = TokenIssuer::new("a-very-long-test-secret", 1);
        assert!(issuer.verify("not.a.token").is_err());
    }
}
