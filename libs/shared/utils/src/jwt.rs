use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid claims encoding")]
    InvalidClaims,

    #[error("Token expired")]
    Expired,
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, AuthError> {
    if jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::MalformedToken);
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        AuthError::MalformedToken
    })?;

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| AuthError::InvalidSignature)?;
    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(AuthError::InvalidSignature);
    }

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| AuthError::InvalidClaims)?;
    let claims_json =
        String::from_utf8(claims_bytes).map_err(|_| AuthError::InvalidClaims)?;

    let claims: JwtClaims = serde_json::from_str(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        AuthError::InvalidClaims
    })?;

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err(AuthError::Expired);
        }
    }

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        facility_ids: claims.facility_ids,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sign(header_b64: &str, claims_b64: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    fn make_token(claims: serde_json::Value, secret: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&json!({"alg": "HS256", "typ": "JWT"})).unwrap(),
        );
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let signature = sign(&header, &body, secret);
        format!("{}.{}.{}", header, body, signature)
    }

    #[test]
    fn test_valid_token_yields_user() {
        let token = make_token(
            json!({"sub": "user-1", "role": "doctor", "exp": 4102444800u64}),
            "secret",
        );

        let user = validate_token(&token, "secret").unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.role.as_deref(), Some("doctor"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = make_token(json!({"sub": "user-1"}), "secret");
        assert!(matches!(
            validate_token(&token, "other"),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = make_token(json!({"sub": "user-1", "exp": 1u64}), "secret");
        assert!(matches!(
            validate_token(&token, "secret"),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(matches!(
            validate_token("not-a-jwt", "secret"),
            Err(AuthError::MalformedToken)
        ));
    }
}
