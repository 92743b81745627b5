use anyhow::Context;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, encode, get_current_timestamp};
use serde::{Deserialize, Serialize};

use crate::{auth::Identity, config::JwtConfig, entity::user::Role, id};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub jti: String,
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
    pub role: Role,
    pub email: String,
    pub name: String,
}

/// Issues and verifies the bearer tokens carried by every authenticated request.
pub struct JwtService {
    config: JwtConfig,
    encode_secret: EncodingKey,
    decode_secret: DecodingKey,
    header: Header,
    validation: Validation,
}

impl JwtService {
    pub fn new(jwt_config: JwtConfig) -> Self {
        let mut validation = Validation::new(jwt_config.algorithm());
        validation.set_audience(&[jwt_config.audience()]);
        validation.set_issuer(&[jwt_config.issuer()]);
        validation.set_required_spec_claims(&["jti", "sub", "aud", "iss", "iat", "exp"]);

        let secret_bytes = jwt_config.secret().as_bytes();

        JwtService {
            encode_secret: EncodingKey::from_secret(secret_bytes),
            decode_secret: DecodingKey::from_secret(secret_bytes),
            header: Header::new(jwt_config.algorithm()),
            validation,
            config: jwt_config,
        }
    }

    pub fn encode(&self, identity: &Identity) -> anyhow::Result<String> {
        let current_timestamp = get_current_timestamp();

        let claims = Claims {
            jti: id::next(),
            sub: identity.id.to_string(),
            aud: self.config.audience().to_string(),
            iss: self.config.issuer().to_string(),
            iat: current_timestamp,
            exp: current_timestamp + self.config.expiration().as_secs(),
            role: identity.role,
            email: identity.email.clone(),
            name: identity.name.clone(),
        };

        Ok(encode(&self.header, &claims, &self.encode_secret)?)
    }

    /// Verifies signature, audience, issuer and expiry, then recovers the identity.
    pub fn decode(&self, token: &str) -> anyhow::Result<Identity> {
        let claims =
            jsonwebtoken::decode::<Claims>(token, &self.decode_secret, &self.validation)?.claims;

        let id = claims
            .sub
            .parse::<i32>()
            .with_context(|| format!("token subject is not a user id: {}", claims.sub))?;

        Ok(Identity {
            id,
            role: claims.role,
            email: claims.email,
            name: claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: 42,
            role: Role::Vendor,
            email: "v@example.com".to_string(),
            name: "Vendor".to_string(),
        }
    }

    #[test]
    fn token_round_trips_identity() {
        let jwt = JwtService::new(JwtConfig::with_secret("unit-test-secret"));
        let token = jwt.encode(&identity()).unwrap();
        assert_eq!(jwt.decode(&token).unwrap(), identity());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new(JwtConfig::with_secret("one"));
        let verifier = JwtService::new(JwtConfig::with_secret("two"));
        let token = issuer.encode(&identity()).unwrap();
        assert!(verifier.decode(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let jwt = JwtService::new(JwtConfig::default());
        assert!(jwt.decode("not.a.token").is_err());
    }
}
