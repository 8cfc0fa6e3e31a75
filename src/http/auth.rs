//! Account and session handlers, plus the authenticated-caller extractor.

use super::extract::ApiJson;
use crate::{
  app::AppState,
  error::Error,
  identity::IdentityProvider,
  models::{
    request::auth_request::{LoginRequest, SignupRequest},
    response::auth_response::AuthResponse,
    user::user_identity::UserIdentity,
  },
  util::bearer_token,
};
use async_trait::async_trait;
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{StatusCode, request::Parts},
  response::IntoResponse,
};

/// The caller behind the request's bearer token.
pub struct CurrentUser {
  pub user: UserIdentity,
  pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
  type Rejection = Error;

  async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(Error::Unauthorized)?;
    let user = state
      .identity
      .resolve_caller(token)
      .await?
      .ok_or(Error::Unauthorized)?;
    Ok(CurrentUser {
      user,
      token: token.to_string(),
    })
  }
}

pub async fn signup(
  State(state): State<AppState>,
  ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, Error> {
  let (user, token) = state
    .identity
    .signup(&req.email, &req.password, req.display_name.as_deref())
    .await?;
  Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
  State(state): State<AppState>,
  ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, Error> {
  let (user, token) = state.identity.login(&req.email, &req.password).await?;
  Ok(Json(AuthResponse { token, user }))
}

pub async fn logout(
  State(state): State<AppState>,
  caller: CurrentUser,
) -> Result<StatusCode, Error> {
  state.identity.logout(&caller.token).await?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn me(caller: CurrentUser) -> Json<UserIdentity> {
  Json(caller.user)
}

pub async fn delete_account(
  State(state): State<AppState>,
  caller: CurrentUser,
) -> Result<StatusCode, Error> {
  state.identity.delete_account(caller.user.id).await?;
  Ok(StatusCode::NO_CONTENT)
}
