use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::VersionResponse,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::documents::AppState;

/// `GET /api/docs/{id}/versions` — 문서의 버전 이력 전체를 기록 순서대로,
/// 편집자 이름/이메일과 함께 반환합니다.
pub async fn list_document_versions(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    // 문서 존재 확인 — 없는 id면 404
    db::get_document(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let versions: Vec<VersionResponse> = db::list_versions(&state.pool, &id)
        .await?
        .into_iter()
        .map(VersionResponse::from)
        .collect();

    Ok(Json(json!({ "versions": versions })))
}
