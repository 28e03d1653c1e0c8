use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";

/// Token claims issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Authenticated principal. The order core trusts it as given.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn has_role(&self, roles: &[&str]) -> bool {
        roles.contains(&self.role.as_str())
    }

    /// Admins and staff act on any order; customers only on their own.
    pub fn is_back_office(&self) -> bool {
        self.has_role(&[ROLE_ADMIN, ROLE_STAFF])
    }
}

pub fn ensure_role(user: &AuthUser, roles: &[&str]) -> Result<(), AppError> {
    if !user.has_role(roles) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &[ROLE_ADMIN])
}

pub fn decode_principal(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        let state = AppState::from_ref(state);
        decode_principal(token, &state.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    fn token_for(sub: &str, role: &str, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode token")
    }

    #[test]
    fn decodes_principal_from_valid_token() {
        let user_id = Uuid::new_v4();
        let token = token_for(&user_id.to_string(), "staff", "s3cret");

        let user = decode_principal(&token, "s3cret").expect("principal");
        assert_eq!(user.user_id, user_id);
        assert!(user.is_back_office());
        assert!(ensure_admin(&user).is_err());
    }

    #[test]
    fn rejects_wrong_secret_and_bad_subject() {
        let token = token_for(&Uuid::new_v4().to_string(), "user", "s3cret");
        assert!(matches!(
            decode_principal(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));

        let token = token_for("not-a-uuid", "user", "s3cret");
        assert!(matches!(
            decode_principal(&token, "s3cret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn customers_are_not_back_office() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: "customer".into(),
        };
        assert!(!user.is_back_office());
        assert!(matches!(
            ensure_role(&user, &[ROLE_ADMIN, ROLE_STAFF]),
            Err(AppError::Forbidden)
        ));
    }
}
