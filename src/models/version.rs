use serde::Serialize;
use sqlx::types::Json;

use crate::models::UserSummary;

/// 문서 저장 시점의 불변 스냅샷 한 건을 users 테이블과 조인해
/// 편집자 정보까지 붙인 조회 전용 행.
/// 스냅샷은 생성 시 1건, 이후 성공한 수정마다 1건씩 추가되며
/// 절대 변경되지 않습니다.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VersionWithEditor {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Json<Vec<String>>,
    pub edited_at: String,
    pub edited_by: String,
    pub editor_name: String,
    pub editor_email: String,
}

/// API 응답용 버전 — 편집자를 이름/이메일 요약으로 풀어서 내보냅니다.
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub edited_at: String,
    pub edited_by: UserSummary,
}

impl From<VersionWithEditor> for VersionResponse {
    fn from(v: VersionWithEditor) -> Self {
        Self {
            id: v.id,
            title: v.title,
            content: v.content,
            summary: v.summary,
            tags: v.tags.0,
            edited_at: v.edited_at,
            edited_by: UserSummary {
                id: v.edited_by,
                name: v.editor_name,
                email: v.editor_email,
            },
        }
    }
}
