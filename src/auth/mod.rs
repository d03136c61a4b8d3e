use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, AppResult};
use crate::models::user_model::{Principal, Role};
use crate::state::AppState;

pub mod password;
pub mod token;

/// Verified caller, extracted from an `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    /// Role gate declared by each handler.
    pub fn require(&self, role: Role) -> AppResult<&Principal> {
        if self.0.role == role {
            Ok(&self.0)
        } else {
            tracing::debug!(
                user = %self.0.username,
                role = self.0.role.as_str(),
                required = role.as_str(),
                "role check failed"
            );
            Err(AppError::Forbidden(
                "You are not allowed to perform this action".to_string(),
            ))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        state.tokens.verify(token).map(AuthUser)
    }
}
