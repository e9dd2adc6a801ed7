use crate::domain_model::Claims;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClaimsError {
    #[error("token is not a JWT")]
    Malformed,
    #[error("token payload is invalid: {0}")]
    InvalidPayload(String),
}

/// Read the payload of an access token without checking its signature.
///
/// The backend is the only party that verifies tokens; the console just needs
/// the expiry and the identity fields to drive navigation.
pub fn decode_claims(token: &str) -> Result<Claims, ClaimsError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.insecure_disable_signature_validation();
    v.validate_exp = false;
    v.validate_aud = false;
    v.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &v).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) => ClaimsError::Malformed,
            _ => ClaimsError::InvalidPayload(e.to_string()),
        }
    })?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    fn sign(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"backend-only-secret"),
        )
        .unwrap()
    }

    #[test]
    fn reads_claims_regardless_of_signing_key() {
        let token = sign(json!({
            "sub": "42",
            "exp": 1_900_000_000i64,
            "iat": 1_800_000_000i64,
            "email": "advisor@example.com",
            "role": "admin",
        }));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("42"));
        assert_eq!(claims.email.as_deref(), Some("advisor@example.com"));
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn expired_tokens_still_decode() {
        let token = sign(json!({ "sub": "7", "exp": 1 }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, Some(1));
    }

    #[test]
    fn missing_claims_are_absent() {
        let token = sign(json!({ "sub": "7" }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, None);
        assert!(claims.expires_at().is_none());
    }

    #[test]
    fn opaque_tokens_are_rejected() {
        assert!(decode_claims("T1").is_err());
        assert!(decode_claims("").is_err());
    }
}
