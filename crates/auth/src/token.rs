//! HS256 token signing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use medstock_core::OperatorId;

use crate::Role;
use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// Shared-secret HS256 signer/validator.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl Hs256Jwt {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign claims as-is.
    pub fn sign(&self, claims: &JwtClaims) -> Result<String, TokenValidationError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))
    }

    /// Issue a token valid from `now` for the configured lifetime.
    pub fn issue(
        &self,
        sub: OperatorId,
        login: &str,
        roles: Vec<Role>,
        now: DateTime<Utc>,
    ) -> Result<(String, JwtClaims), TokenValidationError> {
        let claims = JwtClaims {
            sub,
            login: login.to_string(),
            roles,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        // Expiry lives in our own claim names; check it with `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates_until_expiry() {
        let jwt = Hs256Jwt::new("secret", Duration::minutes(30));
        let now = Utc::now();
        let (token, issued) = jwt.issue(OperatorId::new(3), "ana", vec![Role::OPERATOR], now).unwrap();

        let claims = jwt.validate(&token, now + Duration::minutes(1)).unwrap();
        assert_eq!(claims, issued);

        let err = jwt.validate(&token, now + Duration::minutes(31)).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let now = Utc::now();
        let (token, _) = Hs256Jwt::new("one", Duration::minutes(5))
            .issue(OperatorId::new(1), "a", vec![Role::ADMIN], now)
            .unwrap();
        let err = Hs256Jwt::new("two", Duration::minutes(5))
            .validate(&token, now)
            .unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }
}
