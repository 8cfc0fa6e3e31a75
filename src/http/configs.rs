//! SMTP configuration CRUD, scoped to the caller.

use super::{auth::CurrentUser, extract::ApiJson, parse_id};
use crate::{
  app::AppState,
  error::Error,
  models::smtp_config::{
    api_smtp_config::ApiSmtpConfig,
    smtp_config_input::{SmtpConfigInput, ValidSmtpConfig, describe},
  },
  store::CredentialStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};

fn validated(input: SmtpConfigInput) -> Result<ValidSmtpConfig, Error> {
  input
    .validate()
    .map_err(|errors| Error::InvalidRequest(describe(&errors)))
}

pub async fn list_configs(
  State(state): State<AppState>,
  caller: CurrentUser,
) -> Result<Json<Vec<ApiSmtpConfig>>, Error> {
  let rows = state.store.list_configurations(caller.user.id).await?;
  Ok(Json(rows.into_iter().map(ApiSmtpConfig::from).collect()))
}

pub async fn get_config(
  State(state): State<AppState>,
  caller: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<ApiSmtpConfig>, Error> {
  let id = parse_id(&id, Error::ConfigurationNotFound)?;
  let config = state
    .store
    .get_configuration(id, caller.user.id)
    .await?
    .ok_or(Error::ConfigurationNotFound)?;
  Ok(Json(config.into()))
}

pub async fn create_config(
  State(state): State<AppState>,
  caller: CurrentUser,
  ApiJson(input): ApiJson<SmtpConfigInput>,
) -> Result<impl IntoResponse, Error> {
  let input = validated(input)?;
  let created = state
    .store
    .create_configuration(caller.user.id, input)
    .await?;
  Ok((StatusCode::CREATED, Json(ApiSmtpConfig::from(created))))
}

pub async fn update_config(
  State(state): State<AppState>,
  caller: CurrentUser,
  Path(id): Path<String>,
  ApiJson(input): ApiJson<SmtpConfigInput>,
) -> Result<Json<ApiSmtpConfig>, Error> {
  let id = parse_id(&id, Error::ConfigurationNotFound)?;
  let input = validated(input)?;
  let updated = state
    .store
    .update_configuration(id, caller.user.id, input)
    .await?;
  Ok(Json(updated.into()))
}

pub async fn set_default_config(
  State(state): State<AppState>,
  caller: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<ApiSmtpConfig>, Error> {
  let id = parse_id(&id, Error::ConfigurationNotFound)?;
  let updated = state
    .store
    .set_default_configuration(id, caller.user.id)
    .await?;
  Ok(Json(updated.into()))
}

pub async fn delete_config(
  State(state): State<AppState>,
  caller: CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, Error> {
  let id = parse_id(&id, Error::ConfigurationNotFound)?;
  state.store.delete_configuration(id, caller.user.id).await?;
  Ok(StatusCode::NO_CONTENT)
}
