//! Crate-wide error type and its HTTP mapping.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::response::api_response::ApiResponse;

/// Errors surfaced by services and HTTP handlers.
#[derive(Debug, Error)]
pub enum Error {
  /// No token, or the token does not resolve to a user.
  #[error("Unauthorized")]
  Unauthorized,

  /// Login with an unknown email or a wrong password.
  #[error("Invalid email or password")]
  InvalidCredentials,

  /// Missing or malformed input.
  #[error("{0}")]
  InvalidRequest(String),

  /// SMTP configuration missing or owned by someone else.
  #[error("SMTP configuration not found")]
  ConfigurationNotFound,

  /// Send record missing or owned by someone else.
  #[error("Record not found")]
  RecordNotFound,

  #[error("{0}")]
  Conflict(String),

  /// The mail server could not be reached or refused the message.
  #[error("{0}")]
  DeliveryFailed(String),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
      Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
      Self::ConfigurationNotFound | Self::RecordNotFound => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      // The request itself was handled; the outcome is in the body.
      Self::DeliveryFailed(_) => StatusCode::OK,
      Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Text shown to the caller. Internal details never leave the process.
  pub fn public_message(&self) -> String {
    match self {
      Self::Internal(_) | Self::Database(_) => "Internal server error".to_string(),
      other => other.to_string(),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    if matches!(self, Self::Internal(_) | Self::Database(_)) {
      error!("request failed: {self}");
    }
    let status = self.status();
    (status, Json(ApiResponse::failure(self.public_message()))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn delivery_failure_is_reported_with_ok_status() {
    let err = Error::DeliveryFailed("535 Authentication failed".into());
    assert_eq!(err.status(), StatusCode::OK);
    assert_eq!(err.public_message(), "535 Authentication failed");
  }

  #[test]
  fn database_errors_are_not_leaked() {
    let err = Error::from(sqlx::Error::PoolClosed);
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.public_message(), "Internal server error");
  }

  #[test]
  fn lookup_errors_map_to_not_found() {
    assert_eq!(Error::ConfigurationNotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(Error::RecordNotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(Error::Unauthorized.status(), StatusCode::UNAUTHORIZED);
  }
}
