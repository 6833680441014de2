//! Authentication: JWT validation for NATS requests and HTTP bearer headers
//!
//! Tokens are issued by the CRM's identity provider. The worker only needs
//! the caller id, which becomes `createdBy` / `changedBy` / `uploadedBy` on
//! everything the import writes.

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Request;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    #[serde(default)]
    pub email: String,
    /// Issued at (unix timestamp)
    pub iat: usize,
    /// Expiration (unix timestamp)
    pub exp: usize,
}

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub user_id: Uuid,
    pub email: String,
}

impl TryFrom<Claims> for AuthInfo {
    type Error = anyhow::Error;

    fn try_from(claims: Claims) -> Result<Self> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|e| anyhow!("Invalid user_id in token: {}", e))?;
        Ok(Self {
            user_id,
            email: claims.email,
        })
    }
}

/// Generate a JWT access token (CLI `token` command, tests)
pub fn generate_token(user_id: Uuid, email: &str, ttl_hours: u32, secret: &str) -> Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let exp = now + ttl_hours as usize * 60 * 60;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a JWT token and return claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("Invalid token: {}", e))?;

    Ok(token_data.claims)
}

/// Extract authentication info from a NATS request
pub fn extract_auth<T>(request: &Request<T>, jwt_secret: &str) -> Result<AuthInfo> {
    match request.token {
        Some(ref token) => validate_token(token, jwt_secret)?.try_into(),
        None => Err(anyhow!("No authentication provided, JWT token is required")),
    }
}

/// Extract authentication info from an HTTP `Authorization: Bearer <jwt>` header
pub fn extract_bearer(authorization: Option<&str>, jwt_secret: &str) -> Result<AuthInfo> {
    let header = authorization.ok_or_else(|| anyhow!("Missing Authorization header"))?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("Authorization header is not a bearer token"))?;

    validate_token(token, jwt_secret)?.try_into()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) const TEST_SECRET: &str = "test-secret-key-for-jwt-at-least-32-bytes-long";

    fn make_request_with_token(token: Option<String>) -> Request<serde_json::Value> {
        Request {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            token,
            payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "agent@example.com", 8, TEST_SECRET).unwrap();

        let claims = validate_token(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "agent@example.com");
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
    }

    #[test]
    fn test_validate_token_wrong_secret() {
        let token = generate_token(Uuid::new_v4(), "agent@example.com", 8, TEST_SECRET).unwrap();
        assert!(validate_token(&token, "wrong-secret-wrong-secret-wrong-secret").is_err());
    }

    #[test]
    fn test_validate_token_malformed() {
        assert!(validate_token("not.a.valid.token", TEST_SECRET).is_err());
    }

    #[test]
    fn test_extract_auth_with_valid_token() {
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "agent@example.com", 1, TEST_SECRET).unwrap();

        let auth = extract_auth(&make_request_with_token(Some(token)), TEST_SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.email, "agent@example.com");
    }

    #[test]
    fn test_extract_auth_no_token_fails() {
        assert!(extract_auth(&make_request_with_token(None), TEST_SECRET).is_err());
    }

    #[test]
    fn test_extract_auth_invalid_token_fails() {
        let request = make_request_with_token(Some("bad-token".to_string()));
        assert!(extract_auth(&request, TEST_SECRET).is_err());
    }

    #[test]
    fn test_extract_bearer() {
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "agent@example.com", 1, TEST_SECRET).unwrap();
        let header = format!("Bearer {}", token);

        let auth = extract_bearer(Some(&header), TEST_SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);

        assert!(extract_bearer(None, TEST_SECRET).is_err());
        assert!(extract_bearer(Some("Basic abc"), TEST_SECRET).is_err());
        assert!(extract_bearer(Some("Bearer "), TEST_SECRET).is_err());
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: String::new(),
            iat: 0,
            exp: 0,
        };
        assert!(AuthInfo::try_from(claims).is_err());
    }
}
