//! JWT validation and token extraction helpers

use axum::http::HeaderValue;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::claims::IdentityClaims;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Validate a session token from the identity provider
pub(crate) fn validate_jwt_token(
    token: &str,
    config: &AuthConfig,
) -> Result<IdentityClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);

    if let Some(aud) = &config.audience {
        validation.set_audience(&[aud]);
    } else {
        validation.validate_aud = false;
    }

    if let Some(iss) = &config.issuer {
        validation.set_issuer(&[iss]);
    }

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_ref());

    let token_data = decode::<IdentityClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        AuthError::InvalidToken
    })?;

    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
pub(crate) fn extract_bearer_token(header: &HeaderValue) -> Result<String, AuthError> {
    let header_str = header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorizationFormat)?;

    if let Some(token) = header_str.strip_prefix("Bearer ") {
        Ok(token.to_string())
    } else {
        Err(AuthError::InvalidAuthorizationFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-key".to_string(),
            issuer: None,
            audience: None,
        }
    }

    fn encode_claims(claims: &IdentityClaims, secret: &str) -> String {
        let header = jsonwebtoken::Header::new(Algorithm::HS256);
        let key = jsonwebtoken::EncodingKey::from_secret(secret.as_ref());
        jsonwebtoken::encode(&header, claims, &key).expect("Failed to encode JWT")
    }

    fn test_claims() -> IdentityClaims {
        IdentityClaims {
            sub: "idp_2x8Qw".to_string(),
            email: Some("test@test.com".to_string()),
            iat: chrono::Utc::now().timestamp() as u64,
            exp: (chrono::Utc::now().timestamp() + 3600) as u64,
            aud: None,
        }
    }

    #[test]
    fn test_extract_bearer_token() {
        // Valid bearer token
        let header = HeaderValue::from_static("Bearer abc123");
        let result = extract_bearer_token(&header);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "abc123");

        // Invalid format
        let header = HeaderValue::from_static("abc123");
        let result = extract_bearer_token(&header);
        assert!(result.is_err());

        // Basic auth (wrong type)
        let header = HeaderValue::from_static("Basic abc123");
        let result = extract_bearer_token(&header);
        assert!(result.is_err());
    }

    #[test]
    fn test_jwt_rejects_garbage_token() {
        let result = validate_jwt_token("invalid_token", &test_config());
        assert!(result.is_err());
    }

    #[test]
    fn test_jwt_roundtrip_no_issuer_no_audience() {
        let config = test_config();
        let claims = test_claims();
        let token = encode_claims(&claims, &config.jwt_secret);

        let result = validate_jwt_token(&token, &config);
        assert!(result.is_ok(), "JWT validation failed: {:?}", result.err());

        let decoded = result.unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.email, claims.email);
    }

    #[test]
    fn test_jwt_rejects_wrong_secret() {
        let config = test_config();
        let token = encode_claims(&test_claims(), "a-different-secret");

        assert!(validate_jwt_token(&token, &config).is_err());
    }

    #[test]
    fn test_jwt_rejects_expired_token() {
        let config = test_config();
        let mut claims = test_claims();
        claims.iat = (chrono::Utc::now().timestamp() - 7200) as u64;
        claims.exp = (chrono::Utc::now().timestamp() - 3600) as u64;
        let token = encode_claims(&claims, &config.jwt_secret);

        assert!(validate_jwt_token(&token, &config).is_err());
    }

    #[test]
    fn test_jwt_enforces_issuer_when_configured() {
        let config = AuthConfig {
            jwt_secret: "test-secret-key".to_string(),
            issuer: Some("https://id.postdeck.io".to_string()),
            audience: None,
        };

        // Token without iss claim fails issuer validation
        let token = encode_claims(&test_claims(), &config.jwt_secret);
        assert!(validate_jwt_token(&token, &config).is_err());
    }
}
