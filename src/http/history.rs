//! Send history listing and deletion.

use super::{auth::CurrentUser, extract::ApiQuery, parse_id};
use crate::{app::AppState, error::Error, models::history::api_send_record::SendRecord};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
  pub page: Option<u32>,
  pub limit: Option<u32>,
}

/// `(limit, offset)` for a page request.
pub fn compute_page(p: &HistoryParams) -> (u32, u32) {
  let page = p.page.unwrap_or(1).max(1);
  let limit = p.limit.unwrap_or(50).clamp(1, 200);
  let offset = (page - 1).saturating_mul(limit);
  (limit, offset)
}

pub async fn list_history(
  State(state): State<AppState>,
  caller: CurrentUser,
  ApiQuery(params): ApiQuery<HistoryParams>,
) -> Result<Json<Vec<SendRecord>>, Error> {
  let (limit, offset) = compute_page(&params);
  let rows = state
    .store
    .list_send_records(caller.user.id, limit, offset)
    .await?;
  Ok(Json(rows))
}

pub async fn get_history_entry(
  State(state): State<AppState>,
  caller: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<SendRecord>, Error> {
  let id = parse_id(&id, Error::RecordNotFound)?;
  Ok(Json(state.store.get_send_record(id, caller.user.id).await?))
}

pub async fn delete_history_entry(
  State(state): State<AppState>,
  caller: CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, Error> {
  let id = parse_id(&id, Error::RecordNotFound)?;
  state.store.delete_send_record(id, caller.user.id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn paging_defaults_and_clamps() {
    assert_eq!(compute_page(&HistoryParams::default()), (50, 0));
    let p = HistoryParams {
      page: Some(3),
      limit: Some(1000),
    };
    assert_eq!(compute_page(&p), (200, 400));
    let p = HistoryParams {
      page: Some(0),
      limit: Some(0),
    };
    assert_eq!(compute_page(&p), (1, 0));
  }
}
