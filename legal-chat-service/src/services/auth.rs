use crate::config::AuthConfig;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Claims carried by identity-provider access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default)]
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Verifies HS256 bearer tokens signed with the identity provider's secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key,
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use secrecy::Secret;

    fn config(audience: Option<&str>) -> AuthConfig {
        AuthConfig {
            jwt_secret: Secret::new("unit-test-secret".to_string()),
            audience: audience.map(str::to_string),
        }
    }

    fn token(secret: &str, exp_offset: Duration, aud: Option<&str>) -> String {
        let mut claims = serde_json::json!({
            "sub": "user-1",
            "email": "user@example.nl",
            "exp": (Utc::now() + exp_offset).timestamp(),
        });
        if let Some(aud) = aud {
            claims["aud"] = serde_json::json!(aud);
        }
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let verifier = TokenVerifier::new(&config(None));
        let claims = verifier
            .verify(&token("unit-test-secret", Duration::hours(1), Some("authenticated")))
            .unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "user@example.nl");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let verifier = TokenVerifier::new(&config(None));
        assert!(verifier
            .verify(&token("other-secret", Duration::hours(1), None))
            .is_err());
        assert!(verifier
            .verify(&token("unit-test-secret", Duration::hours(-2), None))
            .is_err());
    }

    #[test]
    fn enforces_configured_audience() {
        let verifier = TokenVerifier::new(&config(Some("authenticated")));
        assert!(verifier
            .verify(&token("unit-test-secret", Duration::hours(1), Some("anon")))
            .is_err());
        assert!(verifier
            .verify(&token("unit-test-secret", Duration::hours(1), Some("authenticated")))
            .is_ok());
    }
}
