//! # 문서 데이터베이스 쿼리 모듈
//!
//! `documents` 테이블에 대한 CRUD 쿼리 함수들이 정의되어 있습니다.
//!
//! 읽기 쿼리는 `users` 테이블과 조인하여 소유자의 이름/이메일을 함께
//! 가져옵니다 (응답에 비밀번호 해시나 외래키만 노출하지 않기 위해).
//! 쓰기 쿼리는 `&mut SqliteConnection`을 받습니다 — 호출자(services/)가
//! 트랜잭션 안에서 문서와 버전 스냅샷을 원자적으로 함께 기록합니다.

use crate::error::AppError;
use crate::models::{Document, DocumentWithOwner};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};

/// 문서 목록을 조회합니다. 최근 수정된 문서가 먼저 옵니다.
///
/// # 매개변수
/// - `tag`: 지정하면 해당 태그를 정확히 포함하는 문서만
/// - `owner_id`: 지정하면 해당 사용자가 만든 문서만 (mine=true 필터)
///
/// ## SQL 설명
/// `json_each(d.tags)`: JSON 배열 TEXT를 행으로 펼치는 SQLite 내장 함수.
/// `?1 IS NULL OR ...` 패턴으로 선택적 필터를 한 쿼리에 담습니다.
pub async fn list_documents(
    pool: &SqlitePool,
    tag: Option<&str>,
    owner_id: Option<&str>,
) -> Result<Vec<DocumentWithOwner>, AppError> {
    let documents = sqlx::query_as::<_, DocumentWithOwner>(
        r#"
        SELECT d.id, d.title, d.content, d.summary, d.tags, d.created_by,
               d.created_at, d.updated_at,
               u.name AS owner_name, u.email AS owner_email
        FROM documents d
        JOIN users u ON u.id = d.created_by
        WHERE (?1 IS NULL OR EXISTS (
                  SELECT 1 FROM json_each(d.tags) WHERE json_each.value = ?1))
          AND (?2 IS NULL OR d.created_by = ?2)
        ORDER BY d.updated_at DESC
        "#,
    )
    .bind(tag)
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(documents)
}

/// ID로 단일 문서를 소유자 정보와 함께 조회합니다.
pub async fn get_document_with_owner(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<DocumentWithOwner>, AppError> {
    let document = sqlx::query_as::<_, DocumentWithOwner>(
        r#"
        SELECT d.id, d.title, d.content, d.summary, d.tags, d.created_by,
               d.created_at, d.updated_at,
               u.name AS owner_name, u.email AS owner_email
        FROM documents d
        JOIN users u ON u.id = d.created_by
        WHERE d.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(document)
}

/// ID로 단일 문서 행을 조회합니다 (조인 없음 — 수정/삭제 전 소유권 확인용).
pub async fn get_document(pool: &SqlitePool, id: &str) -> Result<Option<Document>, AppError> {
    let document = sqlx::query_as::<_, Document>(
        r#"
        SELECT id, title, content, summary, tags, created_by, created_at, updated_at
        FROM documents
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(document)
}

/// 시맨틱 검색/Q&A 코퍼스로 쓸 최근 문서 창(window)을 가져옵니다.
pub async fn recent_documents(pool: &SqlitePool, limit: i64) -> Result<Vec<Document>, AppError> {
    let documents = sqlx::query_as::<_, Document>(
        r#"
        SELECT id, title, content, summary, tags, created_by, created_at, updated_at
        FROM documents
        ORDER BY updated_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(documents)
}

/// 새 문서 행을 삽입합니다. 트랜잭션 안에서 호출되어야 합니다
/// (첫 버전 스냅샷과 같은 트랜잭션으로 커밋).
pub async fn insert_document(
    conn: &mut SqliteConnection,
    id: &str,
    title: &str,
    content: &str,
    summary: &str,
    tags: &Json<Vec<String>>,
    created_by: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO documents (id, title, content, summary, tags, created_by)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(summary)
    .bind(tags)
    .bind(created_by)
    .execute(conn)
    .await?;

    Ok(())
}

/// 문서의 현재 상태를 덮어쓰고 updated_at을 갱신합니다.
/// 트랜잭션 안에서 호출되어야 합니다 (버전 스냅샷과 함께 커밋).
/// 같은 id에 대한 동시 수정은 커밋 순서대로 덮어씁니다 (last-write-wins).
pub async fn update_document(conn: &mut SqliteConnection, doc: &Document) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE documents
        SET title = ?, content = ?, summary = ?, tags = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(&doc.title)
    .bind(&doc.content)
    .bind(&doc.summary)
    .bind(&doc.tags)
    .bind(&doc.id)
    .execute(conn)
    .await?;

    Ok(())
}

/// 문서 행을 삭제합니다. 버전 삭제와 같은 트랜잭션 안에서 호출되어야 합니다.
pub async fn delete_document(conn: &mut SqliteConnection, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
