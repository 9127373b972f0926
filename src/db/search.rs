//! # 키워드(lexical) 검색 모듈
//!
//! 제목/본문의 부분 문자열 매칭과 태그의 정확 일치 매칭으로
//! 문서를 찾는 검색 쿼리를 구현합니다.
//!
//! ## 동작 방식
//! - 제목 또는 본문에 검색어가 **부분 문자열**로 포함되면 매칭 (`LIKE`)
//! - 태그 배열에 검색어와 **정확히 일치**하는 태그가 있으면 매칭 (`json_each`)
//! - SQLite의 `LIKE`는 ASCII 범위에서 대소문자를 구분하지 않습니다
//!
//! 빈 검색어는 `LIKE '%%'`가 되어 모든 문서가 매칭됩니다.
//! 의미 있는 결과를 원하면 호출 측에서 빈 입력을 걸러야 합니다.

use crate::error::AppError;
use crate::models::DocumentWithOwner;
use sqlx::SqlitePool;

/// 검색어로 문서를 찾아 소유자 정보와 함께 반환합니다.
///
/// # 매개변수
/// - `term`: 검색어. 제목/본문은 부분 일치, 태그는 정확 일치로 비교합니다.
pub async fn lexical_search(
    pool: &SqlitePool,
    term: &str,
) -> Result<Vec<DocumentWithOwner>, AppError> {
    let documents = sqlx::query_as::<_, DocumentWithOwner>(
        r#"
        SELECT d.id, d.title, d.content, d.summary, d.tags, d.created_by,
               d.created_at, d.updated_at,
               u.name AS owner_name, u.email AS owner_email
        FROM documents d
        JOIN users u ON u.id = d.created_by
        WHERE d.title LIKE '%' || ?1 || '%'
           OR d.content LIKE '%' || ?1 || '%'
           OR EXISTS (SELECT 1 FROM json_each(d.tags) WHERE json_each.value = ?1)
        ORDER BY d.updated_at DESC
        "#,
    )
    .bind(term)
    .fetch_all(pool)
    .await?;

    Ok(documents)
}
