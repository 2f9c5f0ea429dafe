#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use crate::core::config::AuthConfig;
#[cfg(test)]
use crate::features::auth::{model::AuthenticatedUser, JwtService};

#[cfg(test)]
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "router-test-secret-that-is-long-enough".to_string(),
        issuer: "incident-reports-test".to_string(),
        token_ttl: Duration::from_secs(300),
        refresh_window: Duration::from_secs(3600),
        jwt_leeway: Duration::from_secs(0),
    }
}

#[cfg(test)]
pub fn test_officer_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: 1,
        username: "jdoe".to_string(),
        officer_id: Some(1),
    }
}

/// `Authorization` header value for [`test_officer_user`]
#[cfg(test)]
pub fn bearer_header(jwt: &JwtService) -> String {
    let issued = jwt
        .issue(&test_officer_user())
        .expect("test token must sign");
    format!("Bearer {}", issued.token)
}
