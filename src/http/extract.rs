//! Body and query extractors that fail with the crate's JSON error shape.

use crate::error::Error;
use async_trait::async_trait;
use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Query, Request},
  http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// `Json<T>` whose rejection is a 400 `InvalidRequest`.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = Error;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    match Json::<T>::from_request(req, state).await {
      Ok(Json(value)) => Ok(ApiJson(value)),
      Err(rejection) => {
        debug!("request body rejected: {rejection}");
        Err(Error::InvalidRequest(rejection.body_text()))
      }
    }
  }
}

/// `Query<T>` whose rejection is a 400 `InvalidRequest`.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = Error;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Query(value) = Query::<T>::from_request_parts(parts, state)
      .await
      .map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    Ok(ApiQuery(value))
  }
}
