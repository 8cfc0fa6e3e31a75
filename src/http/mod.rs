//! HTTP router and handlers.

use crate::{app::AppState, error::Error};
use axum::{
  Router,
  extract::{Request, State},
  http::{
    HeaderValue, Method, StatusCode,
    header::{
      ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    },
  },
  middleware::{self, Next},
  response::{IntoResponse, Response},
  routing::{delete, get, post},
};
use uuid::Uuid;

pub mod auth;
pub mod configs;
pub mod extract;
pub mod history;
pub mod send;

pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Answer preflights and stamp permissive CORS headers on every response.
async fn cors(req: Request, next: Next) -> Response {
  let mut res = if req.method() == Method::OPTIONS {
    StatusCode::OK.into_response()
  } else {
    next.run(req).await
  };
  let headers = res.headers_mut();
  headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
  headers.insert(
    ACCESS_CONTROL_ALLOW_HEADERS,
    HeaderValue::from_static(ALLOW_HEADERS),
  );
  headers.insert(
    ACCESS_CONTROL_ALLOW_METHODS,
    HeaderValue::from_static(ALLOW_METHODS),
  );
  res
}

async fn healthz(State(state): State<AppState>) -> Result<&'static str, Error> {
  sqlx::query("SELECT 1").execute(&state.db).await?;
  Ok("ok")
}

async fn not_found() -> Response {
  (
    StatusCode::NOT_FOUND,
    axum::Json(crate::models::response::api_response::ApiResponse::failure("Not found")),
  )
    .into_response()
}

/// Parse a path id; malformed ids are reported like missing ones.
pub(crate) fn parse_id(raw: &str, missing: Error) -> Result<Uuid, Error> {
  Uuid::parse_str(raw).map_err(|_| missing)
}

/// Assemble the HTTP router with all routes.
pub fn build_router(state: AppState) -> Router {
  Router::new()
    .route("/healthz", get(healthz))
    .route("/auth/signup", post(auth::signup))
    .route("/auth/login", post(auth::login))
    .route("/auth/logout", post(auth::logout))
    .route("/auth/me", get(auth::me))
    .route("/auth/account", delete(auth::delete_account))
    .route(
      "/smtp-configs",
      get(configs::list_configs).post(configs::create_config),
    )
    .route(
      "/smtp-configs/:id",
      get(configs::get_config)
        .put(configs::update_config)
        .delete(configs::delete_config),
    )
    .route("/smtp-configs/:id/default", post(configs::set_default_config))
    .route("/history", get(history::list_history))
    .route(
      "/history/:id",
      get(history::get_history_entry).delete(history::delete_history_entry),
    )
    .route("/send", post(send::send_message))
    .fallback(not_found)
    .layer(middleware::from_fn(cors))
    .with_state(state)
}
