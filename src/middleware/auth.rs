use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    error::AppError,
    models::auth::{AuthenticatedUser, Claims},
};

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

/// `Ok(None)` when no Authorization header is present; a present but bad
/// token is always rejected.
fn authenticate(parts: &Parts) -> Result<Option<AuthenticatedUser>, AppError> {
    let Some(auth_header) = parts.headers.get("Authorization") else {
        return Ok(None);
    };
    let auth_header = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Cabeçalho Authorization inválido"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized("Cabeçalho Authorization inválido"))?;

    let secret = parts
        .extensions
        .get::<JwtSecret>()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("JWT secret not configured")))?;

    decode_access_token(token, &secret.0)
        .map(Some)
        .map_err(|_| AppError::Unauthorized("Token inválido ou expirado"))
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts)?.ok_or(AppError::Unauthorized("Autenticação necessária"))
    }
}

/// Lets handlers take `Option<AuthenticatedUser>` for endpoints that also
/// answer anonymous callers.
impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        authenticate(parts)
    }
}

pub fn decode_access_token(token: &str, secret: &str) -> Result<AuthenticatedUser, anyhow::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation)?;
    let claims = data.claims;

    Ok(AuthenticatedUser {
        user_id: claims.sub.parse()?,
        login: claims.login,
        authorities: claims.auth,
    })
}

/// Mints an access token. Login flows live outside this service; this is
/// what they (and the tests) use to produce a token the extractor accepts.
pub fn issue_access_token(
    user: &AuthenticatedUser,
    secret: &str,
    ttl_seconds: u64,
) -> anyhow::Result<String> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user.user_id.to_string(),
        login: user.login.clone(),
        auth: user.authorities.clone(),
        iat: now,
        exp: now + ttl_seconds as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: 42,
            login: "admin".into(),
            authorities: vec!["ROLE_ADMIN".into()],
        }
    }

    #[test]
    fn issued_token_decodes_back() {
        let token = issue_access_token(&caller(), "segredo", 60).unwrap();
        let decoded = decode_access_token(&token, "segredo").unwrap();
        assert_eq!(decoded, caller());
        assert!(decoded.is_admin());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_access_token(&caller(), "segredo", 60).unwrap();
        assert!(decode_access_token(&token, "outro").is_err());
    }
}
