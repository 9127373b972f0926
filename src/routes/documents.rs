//! # 문서(Document) 라우트 핸들러
//!
//! 문서의 CRUD(생성/조회/수정/삭제)를 처리하는 HTTP 핸들러 함수들입니다.
//!
//! ## 엔드포인트
//! - `POST   /api/docs`      → 새 문서 생성 (AI 요약/태그 포함)
//! - `GET    /api/docs`      → 문서 목록 조회 (?tag= / ?mine=true 필터)
//! - `GET    /api/docs/{id}` → 단일 문서 조회
//! - `PUT    /api/docs/{id}` → 문서 수정 (부분 업데이트 + 버전 추가)
//! - `DELETE /api/docs/{id}` → 문서 삭제 (버전 이력 포함)
//!
//! ## Axum 핸들러 패턴
//! Axum 핸들러는 **Extractor(추출기)**를 매개변수로 받습니다:
//! - `State(state)`: 앱 전역 상태 (DB 풀, Gemini 클라이언트 등)
//! - `auth_user: AuthUser`: Bearer 토큰을 검증해 호출자 신원을 추출 —
//!   이 매개변수가 있는 핸들러는 인증 없이는 실행되지 않습니다 (401)
//! - `Path(id)`: URL 경로 파라미터
//! - `Json(body)`: 요청 본문을 JSON으로 파싱하여 구조체로 변환
//!
//! 반환 타입이 `Result<T, AppError>`이면 Axum이 자동으로
//! `Ok(T)` → JSON 응답, `Err(AppError)` → 에러 JSON 응답으로 변환합니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services,
    services::gemini::GeminiClient,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 프로세스 시작 시 한 번 만들어지며, Gemini 클라이언트도 이때 한 번만
/// 생성되어 주입됩니다 (요청마다 재초기화하지 않음).
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// JWT 토큰 서명용 비밀키
    pub jwt_secret: String,
    /// Gemini API 클라이언트 (키가 없으면 비활성 모드)
    pub gemini: GeminiClient,
    /// 시맨틱 검색/Q&A 코퍼스 창 크기
    pub semantic_window: i64,
}

/// `GET /api/docs`의 쿼리 파라미터.
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    /// 이 태그를 가진 문서만
    pub tag: Option<String>,
    /// "true"면 내가 만든 문서만
    pub mine: Option<String>,
}

/// `POST /api/docs` — 새 문서를 생성합니다.
///
/// 요약/태그 생성(또는 비활성 플레이스홀더)과 첫 버전 스냅샷까지 마친 뒤,
/// 소유자/편집자 정보가 채워진 문서를 반환합니다.
pub async fn create_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let id =
        services::documents::create_document(&state.pool, &state.gemini, &auth_user, req).await?;
    let document = populated_document(&state.pool, &id).await?;
    Ok(Json(document))
}

/// `GET /api/docs` — 문서 목록을 조회합니다. 최근 수정된 문서가 먼저 옵니다.
pub async fn list_documents(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    // mine=true일 때만 소유자 필터 적용 (원 요청 문자열 그대로 비교)
    let owner_id = (query.mine.as_deref() == Some("true")).then_some(auth_user.user_id.as_str());

    let documents = db::list_documents(&state.pool, query.tag.as_deref(), owner_id).await?;
    Ok(Json(populate_all(&state.pool, documents).await?))
}

/// `GET /api/docs/{id}` — 단일 문서를 조회합니다.
pub async fn get_document(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = populated_document(&state.pool, &id).await?;
    Ok(Json(document))
}

/// `PUT /api/docs/{id}` — 문서를 수정합니다.
///
/// 소유자 또는 admin만 가능합니다 (아니면 403).
/// 수정 규칙(부분 업데이트, 재생성 판정, 버전 추가)은 services::documents 참조.
pub async fn update_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    services::documents::update_document(&state.pool, &state.gemini, &auth_user, &id, req).await?;
    let document = populated_document(&state.pool, &id).await?;
    Ok(Json(document))
}

/// `DELETE /api/docs/{id}` — 문서와 버전 이력을 함께 삭제합니다.
pub async fn delete_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    services::documents::delete_document(&state.pool, &auth_user, &id).await?;
    Ok(Json(json!({ "message": "Document deleted" })))
}

/// 문서 하나를 소유자/버전/편집자 정보가 채워진 응답으로 조립합니다.
pub(crate) async fn populated_document(
    pool: &SqlitePool,
    id: &str,
) -> Result<DocumentResponse, AppError> {
    let doc = db::get_document_with_owner(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let versions = db::list_versions(pool, id)
        .await?
        .into_iter()
        .map(VersionResponse::from)
        .collect();
    Ok(DocumentResponse::new(doc, versions))
}

/// 문서 목록 전체를 채워진 응답으로 변환합니다.
pub(crate) async fn populate_all(
    pool: &SqlitePool,
    documents: Vec<DocumentWithOwner>,
) -> Result<Vec<DocumentResponse>, AppError> {
    let mut out = Vec::with_capacity(documents.len());
    for doc in documents {
        let versions = db::list_versions(pool, &doc.id)
            .await?
            .into_iter()
            .map(VersionResponse::from)
            .collect();
        out.push(DocumentResponse::new(doc, versions));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::create_access_token;
    use crate::routes;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt; // oneshot

    const JWT_SECRET: &str = "test-secret";

    /// main.rs의 라우터 구성을 그대로 본떠 테스트 앱을 만듭니다.
    fn test_app(pool: SqlitePool) -> Router {
        let state = AppState {
            pool,
            jwt_secret: JWT_SECRET.to_string(),
            gemini: GeminiClient::new(None, "gemini-1.5-flash".to_string(), 6).unwrap(),
            semantic_window: 200,
        };

        let api_routes = Router::new()
            .route("/auth/signup", post(routes::auth::signup))
            .route("/auth/login", post(routes::auth::login))
            .route("/docs", get(list_documents).post(create_document))
            .route("/docs/search/text", get(routes::search::text_search))
            .route("/docs/search/semantic", get(routes::search::semantic_search))
            .route("/docs/qa", post(routes::search::qa))
            .route(
                "/docs/{id}",
                get(get_document).put(update_document).delete(delete_document),
            )
            .route(
                "/docs/{id}/versions",
                get(routes::versions::list_document_versions),
            )
            .with_state(state);

        Router::new().nest("/api", api_routes)
    }

    async fn seed_user(pool: &SqlitePool, id: &str, role: &str) -> String {
        db::users::create_user(
            pool,
            id,
            &format!("user-{id}"),
            &format!("{id}@test.com"),
            "hash",
            role,
        )
        .await
        .unwrap();
        create_access_token(id, role, JWT_SECRET).unwrap()
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_requires_authentication(pool: SqlitePool) {
        let app = test_app(pool);
        let response = app
            .oneshot(request(
                "POST",
                "/api/docs",
                None,
                Some(serde_json::json!({"title": "A", "content": "B"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No token provided");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_without_content_is_bad_request(pool: SqlitePool) {
        let token = seed_user(&pool, "u1", "user").await;
        let app = test_app(pool);

        let response = app
            .oneshot(request(
                "POST",
                "/api/docs",
                Some(&token),
                Some(serde_json::json!({"title": "A"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "title and content required");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_returns_populated_document(pool: SqlitePool) {
        let token = seed_user(&pool, "u1", "user").await;
        let app = test_app(pool);

        let response = app
            .oneshot(request(
                "POST",
                "/api/docs",
                Some(&token),
                Some(serde_json::json!({"title": "A", "content": "B"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["title"], "A");
        assert_eq!(json["summary"], "Auto-summary disabled (no API key)");
        assert_eq!(json["tags"], serde_json::json!(["ai-disabled"]));
        assert_eq!(json["created_by"]["name"], "user-u1");
        assert_eq!(json["versions"].as_array().unwrap().len(), 1);
        assert_eq!(json["versions"][0]["edited_by"]["name"], "user-u1");
        // 비밀번호 해시는 어떤 투영에도 노출되지 않습니다
        assert!(json["created_by"].get("password_hash").is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn get_of_unknown_id_is_not_found(pool: SqlitePool) {
        let token = seed_user(&pool, "u1", "user").await;
        let app = test_app(pool);

        let response = app
            .oneshot(request("GET", "/api/docs/missing", Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Document not found");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_by_non_owner_is_forbidden(pool: SqlitePool) {
        let owner_token = seed_user(&pool, "u1", "user").await;
        let other_token = seed_user(&pool, "u2", "user").await;
        let app = test_app(pool);

        let created = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/docs",
                Some(&owner_token),
                Some(serde_json::json!({"title": "A", "content": "B"})),
            ))
            .await
            .unwrap();
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/api/docs/{id}"),
                Some(&other_token),
                Some(serde_json::json!({"title": "hijacked"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Not allowed");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn semantic_search_requires_query_param(pool: SqlitePool) {
        let token = seed_user(&pool, "u1", "user").await;
        let app = test_app(pool);

        let response = app
            .oneshot(request("GET", "/api/docs/search/semantic", Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "q query param required");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn disabled_semantic_search_uses_raw_fallback_shape(pool: SqlitePool) {
        let token = seed_user(&pool, "u1", "user").await;
        let app = test_app(pool);

        let response = app
            .oneshot(request(
                "GET",
                "/api/docs/search/semantic?q=rust",
                Some(&token),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["items"].is_null());
        assert_eq!(json["raw"], "Semantic search disabled (no API key)");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn qa_requires_question(pool: SqlitePool) {
        let token = seed_user(&pool, "u1", "user").await;
        let app = test_app(pool);

        let response = app
            .oneshot(request(
                "POST",
                "/api/docs/qa",
                Some(&token),
                Some(serde_json::json!({})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "question required");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn text_search_matches_exact_tag(pool: SqlitePool) {
        let token = seed_user(&pool, "u1", "user").await;
        let app = test_app(pool.clone());

        let created = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/docs",
                Some(&token),
                Some(serde_json::json!({"title": "A", "content": "B"})),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::OK);

        // 비활성 모드 태그("ai-disabled")로 정확 일치 검색
        let response = app
            .oneshot(request(
                "GET",
                "/api/docs/search/text?q=ai-disabled",
                Some(&token),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["title"], "A");
    }
}
