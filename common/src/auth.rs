use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{
    config::JwtConfig,
    error::{self, AddCode},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: ObjectId,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    Admin(Identity),
    None,
}

impl Auth {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Auth::Admin(identity) => Some(identity),
            Auth::None => None,
        }
    }

    pub fn require_admin(&self) -> error::Result<&Identity> {
        self.identity()
            .ok_or_else(|| anyhow::anyhow!("Unauthorized").code(401))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    role: String,
    iat: i64,
    exp: i64,
}

impl Auth {
    /// Returns `Auth::None` for expired tokens and tokens with a bad signature.
    pub fn from_token(token: &str, config: &JwtConfig) -> error::Result<Self> {
        let key = DecodingKey::from_secret(config.secret.as_bytes());
        let claims = match decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256)) {
            Ok(data) => data.claims,
            Err(err) => {
                log::warn!("Rejected token: {}", err);
                return Ok(Auth::None);
            }
        };

        let id = claims
            .sub
            .parse()
            .map_err(|_| anyhow::anyhow!("Malformed token subject").code(401))?;

        Ok(Auth::Admin(Identity {
            id,
            username: claims.username,
            role: claims.role,
        }))
    }

    pub fn to_token(&self, config: &JwtConfig) -> error::Result<String> {
        let Auth::Admin(identity) = self else {
            return Err(anyhow::anyhow!("Cannot create token for Auth::None").code(500));
        };

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.id.to_hex(),
            username: identity.username.clone(),
            role: identity.role.clone(),
            iat: now,
            exp: now + config.expires_in.num_seconds(),
        };

        let key = EncodingKey::from_secret(config.secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|_| anyhow::anyhow!("Failed to encode token").code(500))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "secret".to_string(),
            expires_in: Duration::days(7),
        }
    }

    fn admin() -> Auth {
        Auth::Admin(Identity {
            id: ObjectId::new(),
            username: "admin".to_string(),
            role: "admin".to_string(),
        })
    }

    #[test]
    fn token_roundtrip_keeps_identity() {
        let auth = admin();
        let token = auth.to_token(&config()).unwrap();
        assert_eq!(Auth::from_token(&token, &config()).unwrap(), auth);
    }

    #[test]
    fn foreign_signature_is_anonymous() {
        let token = admin().to_token(&config()).unwrap();
        let other = JwtConfig {
            secret: "other".to_string(),
            ..config()
        };
        assert_eq!(Auth::from_token(&token, &other).unwrap(), Auth::None);
    }

    #[test]
    fn expired_token_is_anonymous() {
        let expired = JwtConfig {
            expires_in: Duration::hours(-2),
            ..config()
        };
        let token = admin().to_token(&expired).unwrap();
        assert_eq!(Auth::from_token(&token, &config()).unwrap(), Auth::None);
    }

    #[test]
    fn anonymous_is_rejected_by_gate() {
        assert_eq!(Auth::None.require_admin().unwrap_err().code, 401);
        assert!(admin().require_admin().is_ok());
    }
}
