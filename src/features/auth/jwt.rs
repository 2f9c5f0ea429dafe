use super::model::{AuthenticatedUser, Claims};
use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Issues and validates HS256 access tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    token_ttl: u64,
    refresh_window: u64,
    leeway: u64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            token_ttl: config.token_ttl.as_secs(),
            refresh_window: config.refresh_window.as_secs(),
            leeway: config.jwt_leeway.as_secs(),
        }
    }

    fn now() -> u64 {
        Utc::now().timestamp().max(0) as u64
    }

    fn sign(&self, user: &AuthenticatedUser, orig_iat: u64) -> Result<IssuedToken, AppError> {
        let iat = Self::now();
        let claims = Claims {
            sub: user.user_id.to_string(),
            username: user.username.clone(),
            officer_id: user.officer_id,
            iss: self.issuer.clone(),
            iat,
            exp: iat + self.token_ttl,
            orig_iat,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in: self.token_ttl,
        })
    }

    /// Issue a token starting a new refresh chain
    pub fn issue(&self, user: &AuthenticatedUser) -> Result<IssuedToken, AppError> {
        self.sign(user, Self::now())
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = self.leeway;
        validation
    }

    fn decode_claims(&self, token: &str, validation: &Validation) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Auth(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.decode_claims(token, &self.validation())?;
        claims
            .to_user()
            .ok_or_else(|| AppError::Auth("Malformed subject claim".to_string()))
    }

    /// Exchange a still-valid token for a new one. The chain cannot be extended
    /// past `refresh_window` from the original login.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, AppError> {
        let claims = self.decode_claims(token, &self.validation())?;

        if claims.orig_iat + self.refresh_window < Self::now() {
            return Err(AppError::Auth("Refresh has expired".to_string()));
        }

        let user = claims
            .to_user()
            .ok_or_else(|| AppError::Auth("Malformed subject claim".to_string()))?;
        self.sign(&user, claims.orig_iat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(refresh_window: u64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "a-test-secret-that-is-long-enough-for-hs256".to_string(),
            issuer: "incident-reports".to_string(),
            token_ttl: Duration::from_secs(300),
            refresh_window: Duration::from_secs(refresh_window),
            jwt_leeway: Duration::from_secs(0),
        }
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: 42,
            username: "jdoe".to_string(),
            officer_id: Some(7),
        }
    }

    #[test]
    fn test_issue_then_validate() {
        let service = JwtService::new(&config(3600));
        let issued = service.issue(&user()).unwrap();
        assert_eq!(issued.expires_in, 300);
        assert_eq!(service.validate_token(&issued.token).unwrap(), user());
    }

    #[test]
    fn test_rejects_other_secret_and_issuer() {
        let service = JwtService::new(&config(3600));
        let issued = service.issue(&user()).unwrap();

        let mut other = config(3600);
        other.jwt_secret = "another-secret-that-is-also-quite-long".to_string();
        assert!(JwtService::new(&other).validate_token(&issued.token).is_err());

        let mut other = config(3600);
        other.issuer = "someone-else".to_string();
        assert!(JwtService::new(&other).validate_token(&issued.token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let service = JwtService::new(&config(3600));
        assert!(matches!(
            service.validate_token("not-a-token"),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn test_refresh_keeps_identity() {
        let service = JwtService::new(&config(3600));
        let issued = service.issue(&user()).unwrap();
        let refreshed = service.refresh(&issued.token).unwrap();
        assert_eq!(service.validate_token(&refreshed.token).unwrap(), user());
    }

    #[test]
    fn test_refresh_window_is_enforced() {
        let service = JwtService::new(&config(0));
        let user = user();
        let stale = service.sign(&user, JwtService::now() - 10).unwrap();
        assert!(service.refresh(&stale.token).is_err());
    }
}
