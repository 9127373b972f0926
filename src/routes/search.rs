//! # 검색 / Q&A 라우트 핸들러
//!
//! 세 가지 읽기 경로를 제공합니다:
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET  | /api/docs/search/text?q=키워드     | 키워드 검색 (제목/본문 부분 일치, 태그 정확 일치) |
//! | GET  | /api/docs/search/semantic?q=질의  | 시맨틱 검색 (Gemini가 관련도 판단) |
//! | POST | /api/docs/qa                      | 코퍼스 기반 자연어 Q&A |
//!
//! 시맨틱 검색과 Q&A는 전체 코퍼스가 아니라 최근 문서
//! `semantic_window`건(기본 200)만 모델에 전달합니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::DocumentResponse,
    routes::documents::{populate_all, AppState},
    services::gemini::SemanticRanking,
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// 시맨틱 검색이 반환하는 랭킹 최대 건수.
const SEMANTIC_RESULT_LIMIT: usize = 5;

/// `?q=` 쿼리 파라미터. 두 검색 엔드포인트가 공유합니다.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QaRequest {
    pub question: Option<String>,
}

/// `GET /api/docs/search/text?q=` — 키워드 검색.
///
/// 빈 검색어는 거르지 않습니다 — 전체 문서가 매칭됩니다 (db::search 참조).
pub async fn text_search(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let term = query.q.unwrap_or_default();
    let documents = db::lexical_search(&state.pool, &term).await?;
    Ok(Json(populate_all(&state.pool, documents).await?))
}

/// `GET /api/docs/search/semantic?q=` — Gemini에 관련도 판단을 위임합니다.
///
/// 응답은 두 갈래 중 하나입니다:
/// - 파싱 성공: `{ "items": [{"title": ..., "reason": ...}, ...] }`
/// - 파싱 실패/비활성: `{ "items": null, "raw": "<모델 원문>" }`
pub async fn semantic_search(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let q = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("q query param required".to_string()))?;

    let documents = db::recent_documents(&state.pool, state.semantic_window).await?;
    let result = state
        .gemini
        .semantic_search(&q, &documents, SEMANTIC_RESULT_LIMIT)
        .await;

    let body = match result {
        SemanticRanking::Ranked(items) => json!({ "items": items }),
        SemanticRanking::Unparsed(raw) => json!({ "items": null, "raw": raw }),
    };

    Ok(Json(body))
}

/// `POST /api/docs/qa` — 최근 문서 창을 근거로 질문에 답합니다.
pub async fn qa(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(req): Json<QaRequest>,
) -> Result<Json<Value>, AppError> {
    let question = req
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("question required".to_string()))?;

    let documents = db::recent_documents(&state.pool, state.semantic_window).await?;
    let answer = state.gemini.answer_question(&question, &documents).await;

    Ok(Json(json!({ "answer": answer })))
}
