use crate::error::AppError;
use crate::models::VersionWithEditor;
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};

/// 문서의 현재 필드 값을 그대로 복사한 버전 스냅샷을 추가합니다.
/// 문서 쓰기와 같은 트랜잭션 안에서 호출되어야 합니다.
/// edited_at은 스키마 기본값(쓰기 시점의 UTC)으로 채워집니다.
pub async fn insert_version(
    conn: &mut SqliteConnection,
    document_id: &str,
    title: &str,
    content: &str,
    summary: &str,
    tags: &Json<Vec<String>>,
    edited_by: &str,
) -> Result<(), AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO document_versions (id, document_id, title, content, summary, tags, edited_by)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(document_id)
    .bind(title)
    .bind(content)
    .bind(summary)
    .bind(tags)
    .bind(edited_by)
    .execute(conn)
    .await?;

    Ok(())
}

/// 문서의 버전 이력 전체를 편집자 정보와 함께, 기록된 순서대로 반환합니다.
/// rowid 순서가 곧 추가 순서이므로 버전 순서가 됩니다.
pub async fn list_versions(
    pool: &SqlitePool,
    document_id: &str,
) -> Result<Vec<VersionWithEditor>, AppError> {
    let versions = sqlx::query_as::<_, VersionWithEditor>(
        r#"
        SELECT v.id, v.document_id, v.title, v.content, v.summary, v.tags,
               v.edited_at, v.edited_by,
               u.name AS editor_name, u.email AS editor_email
        FROM document_versions v
        JOIN users u ON u.id = v.edited_by
        WHERE v.document_id = ?
        ORDER BY v.rowid
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    Ok(versions)
}

/// 문서의 버전을 모두 삭제합니다. 문서 삭제와 같은 트랜잭션 안에서만 호출됩니다.
pub async fn delete_versions(conn: &mut SqliteConnection, document_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM document_versions WHERE document_id = ?")
        .bind(document_id)
        .execute(conn)
        .await?;

    Ok(())
}
