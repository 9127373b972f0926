use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::models::{UserSummary, VersionResponse};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    /// tags 컬럼은 JSON 배열 TEXT로 저장됩니다. Json<T>가 변환을 담당합니다.
    pub tags: Json<Vec<String>>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// users 테이블과 조인해 소유자 이름/이메일을 붙인 조회 전용 행.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentWithOwner {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Json<Vec<String>>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    // Option인 이유: 필드 누락을 422(역직렬화 실패)가 아니라
    // 400 "title and content required"로 직접 응답하기 위해서입니다.
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub regenerate: Option<Regenerate>,
}

/// 수정 시 요약/태그 재생성 요청.
///
/// 클라이언트는 불리언(`true`/`false`) 또는 대상 문자열
/// (`"summary"` / `"tags"` / `"both"`)을 보낼 수 있습니다.
/// None = 미요청 (단, content가 바뀌면 요청과 무관하게 둘 다 재생성됩니다).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Regenerate {
    Flag(bool),
    Target(RegenerateTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegenerateTarget {
    Summary,
    Tags,
    Both,
}

impl Regenerate {
    pub fn wants_summary(self) -> bool {
        matches!(
            self,
            Regenerate::Flag(true)
                | Regenerate::Target(RegenerateTarget::Summary)
                | Regenerate::Target(RegenerateTarget::Both)
        )
    }

    pub fn wants_tags(self) -> bool {
        matches!(
            self,
            Regenerate::Flag(true)
                | Regenerate::Target(RegenerateTarget::Tags)
                | Regenerate::Target(RegenerateTarget::Both)
        )
    }
}

/// API 응답용 문서 — 소유자/편집자가 이름·이메일 요약으로 풀려 있고
/// 버전 이력 전체가 함께 실립니다.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub created_by: UserSummary,
    pub versions: Vec<VersionResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentResponse {
    pub fn new(doc: DocumentWithOwner, versions: Vec<VersionResponse>) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            content: doc.content,
            summary: doc.summary,
            tags: doc.tags.0,
            created_by: UserSummary {
                id: doc.created_by,
                name: doc.owner_name,
                email: doc.owner_email,
            },
            versions,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}
