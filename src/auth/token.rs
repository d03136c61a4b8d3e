//! HS256 access tokens carrying the caller's identity and role.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::user_model::{Principal, Role, User};
use crate::utils::parse_object_id;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// User ID as a hex string.
    pub id: String,
    pub username: String,
    pub age: i32,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        TokenIssuer {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            id: user.id.to_hex(),
            username: user.username.clone(),
            age: user.age,
            role: user.role,
            iat: now,
            exp: now + self.lifetime_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("JWT encode: {e}")))
    }

    pub fn verify(&self, token: &str) -> AppResult<Principal> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<AccessTokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected access token");
                unauthorized()
            })?;

        let id = parse_object_id(&claims.id).map_err(|_| unauthorized())?;
        Ok(Principal {
            id,
            username: claims.username,
            age: claims.age,
            role: claims.role,
        })
    }
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("You are not authorized to perform this action".to_string())
}
