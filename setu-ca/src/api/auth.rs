//! Request authentication for setu-ca
//!
//! Login lives with the external identity provider. Each request carries
//! `Authorization: Bearer <token>`; the token's SHA-256 is looked up in
//! `users`. Missing, malformed and unknown tokens all yield the same 401.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use setu_common::db::{users, User};
use setu_common::identity::parse_bearer;

use crate::{error::ApiError, AppState};

/// The authenticated user making the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer)
            .ok_or(ApiError::Unauthorized)?;

        match users::find_by_token(&state.db, token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                debug!(path = %parts.uri.path(), "Rejected unknown bearer token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
