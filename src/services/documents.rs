//! # 문서 생성/수정/삭제 워크플로
//!
//! 문서 쓰기 작업의 전 과정을 조율하는 모듈입니다. 한 번의 저장은
//! 다음 단계를 순서대로 거칩니다:
//!
//! 1. **검증**: 필수 필드 / 소유권 확인 (실패 시 여기서 거부 — 아무것도 변하지 않음)
//! 2. **AI 보강**: 요약과 태그 생성. 둘은 독립적이므로 `tokio::join!`으로
//!    동시에 실행되며, 비활성 모드여도 (플레이스홀더로) 반드시 완료됩니다.
//! 3. **스냅샷 + 저장**: 문서의 저장 직후 상태를 그대로 복사한 버전을
//!    문서 쓰기와 **같은 트랜잭션**으로 기록합니다. 문서와 스냅샷은 함께
//!    커밋되거나 함께 사라집니다 — 반쯤 만들어진 문서는 존재하지 않습니다.
//!
//! 같은 문서에 대한 동시 수정은 직렬화를 보장하지 않습니다.
//! 각 저장은 내부적으로 원자적이지만, 두 수정이 겹치면 커밋 순서대로
//! 덮어씁니다 (last-write-wins).

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::middleware::auth::{can_modify, AuthUser};
use crate::models::{CreateDocumentRequest, UpdateDocumentRequest};
use crate::services::gemini::GeminiClient;

/// 새 문서를 만들고 첫 버전 스냅샷과 함께 원자적으로 저장합니다.
///
/// # 반환값
/// 생성된 문서의 id. 호출 측은 이 id로 소유자/버전이 채워진 응답을 다시
/// 조회합니다.
///
/// # 에러
/// - `BadRequest`: title 또는 content가 없거나 공백뿐인 경우
pub async fn create_document(
    pool: &SqlitePool,
    gemini: &GeminiClient,
    user: &AuthUser,
    req: CreateDocumentRequest,
) -> Result<String, AppError> {
    // 1단계: 검증
    let title = req.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let content = req.content.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let (Some(title), Some(content)) = (title, content) else {
        return Err(AppError::BadRequest("title and content required".to_string()));
    };

    // 2단계: AI 보강 — 요약과 태그는 독립적이므로 동시에 실행합니다.
    // 비활성/실패 모드에서도 플레이스홀더 값으로 항상 완료됩니다.
    let (summary, tags) = tokio::join!(gemini.summarize(content), gemini.generate_tags(content));
    let tags = Json(tags);

    // 3단계: 문서 + 첫 버전을 한 트랜잭션으로 기록
    let id = uuid::Uuid::now_v7().to_string();
    let mut tx = pool.begin().await?;
    db::insert_document(&mut tx, &id, title, content, &summary, &tags, &user.user_id).await?;
    db::insert_version(&mut tx, &id, title, content, &summary, &tags, &user.user_id).await?;
    tx.commit().await?;

    tracing::info!("document {} created by {}", id, display_name(user));

    Ok(id)
}

/// 로그용 표시 이름. 프로필 조회가 실패했으면 사용자 id로 대신합니다.
fn display_name(user: &AuthUser) -> &str {
    user.profile
        .as_ref()
        .map_or(user.user_id.as_str(), |p| p.name.as_str())
}

/// 기존 문서를 수정하고 새 버전 스냅샷을 추가합니다.
///
/// - title/content는 요청에 포함된(비어있지 않은) 경우에만 바뀝니다 (부분 수정).
/// - 요약/태그 재생성 조건: 호출자가 요청했거나(`regenerate`), content가
///   실제로 **바뀐** 경우. 둘 다 아니면 기존 요약/태그를 그대로 유지합니다.
/// - 어느 쪽이든 수정 후 상태의 스냅샷이 항상 새로 추가됩니다.
///
/// # 에러
/// - `NotFound`: 문서가 없는 경우
/// - `Forbidden`: 소유자도 admin도 아닌 경우 (문서와 버전 모두 변하지 않음)
pub async fn update_document(
    pool: &SqlitePool,
    gemini: &GeminiClient,
    user: &AuthUser,
    id: &str,
    req: UpdateDocumentRequest,
) -> Result<(), AppError> {
    let mut doc = db::get_document(pool, id).await?.ok_or(AppError::NotFound)?;

    if !can_modify(user, &doc.created_by) {
        return Err(AppError::Forbidden("Not allowed".to_string()));
    }

    // 부분 수정: 포함된 필드만 교체
    if let Some(title) = req.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        doc.title = title.to_string();
    }
    let content_changed = match req.content.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(content) if content != doc.content => {
            doc.content = content.to_string();
            true
        }
        // 같은 내용을 다시 보낸 것은 변경이 아님 — 요약/태그를 유지합니다
        _ => false,
    };

    let regen_summary =
        content_changed || req.regenerate.is_some_and(|r| r.wants_summary());
    let regen_tags = content_changed || req.regenerate.is_some_and(|r| r.wants_tags());

    // 요청된 쪽만 재생성. 둘 다면 동시에 실행합니다.
    match (regen_summary, regen_tags) {
        (true, true) => {
            let (summary, tags) =
                tokio::join!(gemini.summarize(&doc.content), gemini.generate_tags(&doc.content));
            doc.summary = summary;
            doc.tags = Json(tags);
        }
        (true, false) => doc.summary = gemini.summarize(&doc.content).await,
        (false, true) => doc.tags = Json(gemini.generate_tags(&doc.content).await),
        (false, false) => {}
    }

    // 수정 후 상태와 그 스냅샷을 한 트랜잭션으로 기록
    let mut tx = pool.begin().await?;
    db::update_document(&mut tx, &doc).await?;
    db::insert_version(
        &mut tx,
        &doc.id,
        &doc.title,
        &doc.content,
        &doc.summary,
        &doc.tags,
        &user.user_id,
    )
    .await?;
    tx.commit().await?;

    tracing::info!("document {} updated by {}", doc.id, display_name(user));

    Ok(())
}

/// 문서와 그 버전 이력 전체를 함께 삭제합니다. soft-delete 없음.
///
/// # 에러
/// - `NotFound`: 문서가 없는 경우
/// - `Forbidden`: 소유자도 admin도 아닌 경우
pub async fn delete_document(
    pool: &SqlitePool,
    user: &AuthUser,
    id: &str,
) -> Result<(), AppError> {
    let doc = db::get_document(pool, id).await?.ok_or(AppError::NotFound)?;

    if !can_modify(user, &doc.created_by) {
        return Err(AppError::Forbidden("Not allowed".to_string()));
    }

    let mut tx = pool.begin().await?;
    db::delete_versions(&mut tx, id).await?;
    db::delete_document(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!("document {} deleted by {}", id, display_name(user));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Regenerate, RegenerateTarget};
    use crate::services::gemini::{self, GeminiClient};
    use assert_matches::assert_matches;

    fn disabled_gemini() -> GeminiClient {
        GeminiClient::new(None, "gemini-1.5-flash".to_string(), 6).unwrap()
    }

    fn auth_user(id: &str, role: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            role: role.to_string(),
            profile: None,
        }
    }

    async fn seed_user(pool: &SqlitePool, id: &str, role: &str) {
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
    }

    fn create_request(title: &str, content: &str) -> CreateDocumentRequest {
        CreateDocumentRequest {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        }
    }

    /// 재생성 판정을 수작업 값과 구분하기 위해 요약/태그를 직접 덮어씁니다.
    async fn set_manual_enrichment(pool: &SqlitePool, id: &str) {
        sqlx::query("UPDATE documents SET summary = 'manual summary', tags = '[\"manual\"]' WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_stores_document_with_exactly_one_version(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        let user = auth_user("u1", "user");

        let id = create_document(&pool, &disabled_gemini(), &user, create_request("A", "B"))
            .await
            .unwrap();

        let doc = db::get_document(&pool, &id).await.unwrap().unwrap();
        assert_eq!(doc.title, "A");
        assert_eq!(doc.content, "B");
        assert_eq!(doc.summary, gemini::SUMMARY_DISABLED);
        assert_eq!(doc.tags.0, vec![gemini::TAG_DISABLED]);

        let versions = db::list_versions(&pool, &id).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].title, doc.title);
        assert_eq!(versions[0].content, doc.content);
        assert_eq!(versions[0].summary, doc.summary);
        assert_eq!(versions[0].tags.0, doc.tags.0);
        assert_eq!(versions[0].edited_by, "u1");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_rejects_missing_fields(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        let user = auth_user("u1", "user");

        let req = CreateDocumentRequest {
            title: Some("A".to_string()),
            content: None,
        };
        let result = create_document(&pool, &disabled_gemini(), &user, req).await;
        assert_matches!(result, Err(AppError::BadRequest(_)));

        let req = CreateDocumentRequest {
            title: Some("  ".to_string()),
            content: Some("B".to_string()),
        };
        let result = create_document(&pool, &disabled_gemini(), &user, req).await;
        assert_matches!(result, Err(AppError::BadRequest(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_appends_snapshot_of_post_update_state(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        let user = auth_user("u1", "user");
        let gemini = disabled_gemini();

        let id = create_document(&pool, &gemini, &user, create_request("A", "B"))
            .await
            .unwrap();

        let req = UpdateDocumentRequest {
            title: None,
            content: Some("C".to_string()),
            regenerate: Some(Regenerate::Flag(false)),
        };
        update_document(&pool, &gemini, &user, &id, req).await.unwrap();

        let doc = db::get_document(&pool, &id).await.unwrap().unwrap();
        assert_eq!(doc.title, "A"); // 부분 수정: title은 그대로
        assert_eq!(doc.content, "C");

        let versions = db::list_versions(&pool, &id).await.unwrap();
        assert_eq!(versions.len(), 2);
        let last = versions.last().unwrap();
        assert_eq!(last.title, doc.title);
        assert_eq!(last.content, doc.content);
        assert_eq!(last.summary, doc.summary);
        assert_eq!(last.tags.0, doc.tags.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn content_change_forces_regeneration_even_without_request(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        let user = auth_user("u1", "user");
        let gemini = disabled_gemini();

        let id = create_document(&pool, &gemini, &user, create_request("A", "B"))
            .await
            .unwrap();
        set_manual_enrichment(&pool, &id).await;

        let req = UpdateDocumentRequest {
            title: None,
            content: Some("C".to_string()),
            regenerate: Some(Regenerate::Flag(false)),
        };
        update_document(&pool, &gemini, &user, &id, req).await.unwrap();

        // content가 바뀌었으므로 regenerate=false여도 둘 다 재생성됩니다
        let doc = db::get_document(&pool, &id).await.unwrap().unwrap();
        assert_eq!(doc.summary, gemini::SUMMARY_DISABLED);
        assert_eq!(doc.tags.0, vec![gemini::TAG_DISABLED]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unchanged_update_keeps_summary_and_tags_but_appends_version(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        let user = auth_user("u1", "user");
        let gemini = disabled_gemini();

        let id = create_document(&pool, &gemini, &user, create_request("A", "B"))
            .await
            .unwrap();
        set_manual_enrichment(&pool, &id).await;

        // 같은 title/content를 다시 보내고 재생성은 요청하지 않음
        let req = UpdateDocumentRequest {
            title: Some("A".to_string()),
            content: Some("B".to_string()),
            regenerate: Some(Regenerate::Flag(false)),
        };
        update_document(&pool, &gemini, &user, &id, req).await.unwrap();

        let doc = db::get_document(&pool, &id).await.unwrap().unwrap();
        assert_eq!(doc.summary, "manual summary");
        assert_eq!(doc.tags.0, vec!["manual"]);

        // 스냅샷은 그래도 추가됩니다 (변하지 않은 값 그대로)
        let versions = db::list_versions(&pool, &id).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].summary, "manual summary");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn regenerate_target_limits_what_is_refreshed(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        let user = auth_user("u1", "user");
        let gemini = disabled_gemini();

        let id = create_document(&pool, &gemini, &user, create_request("A", "B"))
            .await
            .unwrap();
        set_manual_enrichment(&pool, &id).await;

        let req = UpdateDocumentRequest {
            title: None,
            content: None,
            regenerate: Some(Regenerate::Target(RegenerateTarget::Summary)),
        };
        update_document(&pool, &gemini, &user, &id, req).await.unwrap();

        let doc = db::get_document(&pool, &id).await.unwrap().unwrap();
        assert_eq!(doc.summary, gemini::SUMMARY_DISABLED); // 요약만 재생성
        assert_eq!(doc.tags.0, vec!["manual"]); // 태그는 유지
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn non_owner_update_is_forbidden_and_mutates_nothing(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        seed_user(&pool, "u2", "user").await;
        let owner = auth_user("u1", "user");
        let other = auth_user("u2", "user");
        let gemini = disabled_gemini();

        let id = create_document(&pool, &gemini, &owner, create_request("A", "B"))
            .await
            .unwrap();

        let req = UpdateDocumentRequest {
            title: Some("hijacked".to_string()),
            content: None,
            regenerate: None,
        };
        let result = update_document(&pool, &gemini, &other, &id, req).await;
        assert_matches!(result, Err(AppError::Forbidden(_)));

        let doc = db::get_document(&pool, &id).await.unwrap().unwrap();
        assert_eq!(doc.title, "A");
        assert_eq!(db::list_versions(&pool, &id).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn admin_may_update_any_document(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        seed_user(&pool, "admin1", "admin").await;
        let owner = auth_user("u1", "user");
        let admin = auth_user("admin1", "admin");
        let gemini = disabled_gemini();

        let id = create_document(&pool, &gemini, &owner, create_request("A", "B"))
            .await
            .unwrap();

        let req = UpdateDocumentRequest {
            title: Some("moderated".to_string()),
            content: None,
            regenerate: None,
        };
        update_document(&pool, &gemini, &admin, &id, req).await.unwrap();

        let doc = db::get_document(&pool, &id).await.unwrap().unwrap();
        assert_eq!(doc.title, "moderated");

        let versions = db::list_versions(&pool, &id).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].edited_by, "admin1");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_removes_document_and_all_versions(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        let user = auth_user("u1", "user");
        let gemini = disabled_gemini();

        let id = create_document(&pool, &gemini, &user, create_request("A", "B"))
            .await
            .unwrap();

        delete_document(&pool, &user, &id).await.unwrap();

        assert!(db::get_document(&pool, &id).await.unwrap().is_none());
        assert!(db::list_versions(&pool, &id).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn non_owner_delete_is_forbidden(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        seed_user(&pool, "u2", "user").await;
        let owner = auth_user("u1", "user");
        let other = auth_user("u2", "user");
        let gemini = disabled_gemini();

        let id = create_document(&pool, &gemini, &owner, create_request("A", "B"))
            .await
            .unwrap();

        let result = delete_document(&pool, &other, &id).await;
        assert_matches!(result, Err(AppError::Forbidden(_)));
        assert!(db::get_document(&pool, &id).await.unwrap().is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_of_missing_document_is_not_found(pool: SqlitePool) {
        seed_user(&pool, "u1", "user").await;
        let user = auth_user("u1", "user");

        let result = delete_document(&pool, &user, "no-such-id").await;
        assert_matches!(result, Err(AppError::NotFound));
    }
}
