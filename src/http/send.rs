//! Handler for `POST /send`.

use crate::{
  app::AppState,
  dispatch::SENT_MESSAGE,
  models::{request::dispatch_request::SendPayload, response::api_response::ApiResponse},
  util::bearer_token,
};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::HeaderMap,
  response::{IntoResponse, Response},
};
use tracing::debug;

pub async fn send_message(
  State(state): State<AppState>,
  headers: HeaderMap,
  payload: Result<Json<SendPayload>, JsonRejection>,
) -> Response {
  // An unreadable body still has to pass the auth check first, so it is
  // handed to the pipeline as an empty request.
  let payload = match payload {
    Ok(Json(p)) => p,
    Err(rejection) => {
      debug!("send body rejected: {rejection}");
      SendPayload::default()
    }
  };

  match state
    .dispatcher
    .dispatch(payload, bearer_token(&headers))
    .await
  {
    Ok(_) => Json(ApiResponse::ok(SENT_MESSAGE)).into_response(),
    Err(e) => e.into_response(),
  }
}
