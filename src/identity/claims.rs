use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::{IdentityError, Principal};

/// Claims embedded in an ID token issued by the identity service.
/// Roles ride along as a custom claim so verification alone yields a
/// complete principal.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl From<IdTokenClaims> for Principal {
    fn from(claims: IdTokenClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
            display_name: claims.name,
            roles: claims.roles,
        }
    }
}

/// Validate an ID token signature and expiry, returning its claims.
pub fn decode_id_token(token: &str, secret: &str) -> Result<IdTokenClaims, IdentityError> {
    if secret.is_empty() {
        return Err(IdentityError::InvalidToken(
            "verification secret not configured".to_string(),
        ));
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<IdTokenClaims>(token, &decoding_key, &validation)
        .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn issue(claims: &IdTokenClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode token")
    }

    fn claims_for(uid: &str, offset: Duration) -> IdTokenClaims {
        let now = Utc::now();
        IdTokenClaims {
            sub: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
            email_verified: true,
            name: Some("Test User".to_string()),
            roles: vec!["premium".to_string()],
            exp: (now + offset).timestamp(),
            iat: now.timestamp(),
        }
    }

    #[test]
    fn decodes_a_valid_token_into_claims() {
        let token = issue(&claims_for("u1", Duration::hours(1)), "secret");
        let claims = decode_id_token(&token, "secret").expect("valid token");
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.roles, vec!["premium"]);

        let principal = Principal::from(claims);
        assert_eq!(principal.uid, "u1");
        assert_eq!(principal.display_name.as_deref(), Some("Test User"));
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let token = issue(&claims_for("u1", Duration::hours(1)), "other");
        assert!(matches!(
            decode_id_token(&token, "secret"),
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_an_expired_token() {
        let token = issue(&claims_for("u1", Duration::hours(-2)), "secret");
        assert!(matches!(
            decode_id_token(&token, "secret"),
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_everything_when_no_secret_is_configured() {
        let token = issue(&claims_for("u1", Duration::hours(1)), "secret");
        assert!(matches!(
            decode_id_token(&token, ""),
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn roles_claim_defaults_to_empty() {
        let now = Utc::now();
        let token = jsonwebtoken::encode(
            &Header::default(),
            &serde_json::json!({
                "sub": "u2",
                "exp": (now + Duration::hours(1)).timestamp(),
                "iat": now.timestamp(),
            }),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let claims = decode_id_token(&token, "secret").expect("valid token");
        assert!(claims.roles.is_empty());
        assert!(!claims.email_verified);
    }
}
