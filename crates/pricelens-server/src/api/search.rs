use std::time::Instant;

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use pricelens_search::{KeywordSearchResponse, SearchResponse};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_pipeline_error, ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImageSearchRequest {
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct KeywordSearchRequest {
    pub keyword: Option<String>,
}

fn bad_body(request_id: &RequestId, rejection: &JsonRejection) -> ApiError {
    ApiError::new(request_id.0.clone(), "bad_request", rejection.body_text())
}

pub(super) async fn search_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ImageSearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let started = Instant::now();
    let Json(body) = payload.map_err(|e| bad_body(&req_id, &e))?;
    let Some(image_url) = body.image_url.filter(|u| !u.trim().is_empty()) else {
        let err = ApiError::new(req_id.0, "bad_request", "imageUrl is required");
        return Err(err);
    };

    tracing::info!(request_id = %req_id.0, image_url = %image_url, "image search requested");
    state
        .pipeline
        .search_image(&image_url)
        .await
        .map(Json)
        .map_err(|e| map_pipeline_error(req_id.0, &e, started))
}

pub(super) async fn search_keyword(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<KeywordSearchRequest>, JsonRejection>,
) -> Result<Json<KeywordSearchResponse>, ApiError> {
    let started = Instant::now();
    let Json(body) = payload.map_err(|e| bad_body(&req_id, &e))?;
    let keyword = body.keyword.unwrap_or_default();

    tracing::info!(request_id = %req_id.0, keyword = %keyword, "keyword search requested");
    state
        .pipeline
        .search_keyword(&keyword)
        .await
        .map(Json)
        .map_err(|e| map_pipeline_error(req_id.0, &e, started))
}
