//! # Gemini API 클라이언트
//!
//! 외부 텍스트 생성 모델(Gemini)에 대한 얇은 어댑터입니다.
//! 문서 요약, 태그 추출, 시맨틱 검색 랭킹, 코퍼스 기반 Q&A를 제공합니다.
//!
//! ## 실패 정책 (중요)
//! 이 모듈의 공개 함수는 **절대 호출자에게 에러를 반환하지 않습니다.**
//! - API 키 미설정 → 고정된 "비활성" 플레이스홀더 반환
//! - 호출 실패 → 동일 입력으로 정확히 1회 재시도 → 그래도 실패하면
//!   "에러" 플레이스홀더 반환 (비활성 플레이스홀더와 구분되는 문자열)
//! - 시맨틱 검색만 예외적으로 두 갈래 결과를 노출합니다:
//!   구조화된 랭킹(파싱 성공) 또는 원문 그대로(파싱 실패) —
//!   모델의 JSON 출력이 항상 올바르다는 보장이 없기 때문입니다.
//!
//! 클라이언트는 프로세스 시작 시 한 번 생성되어 AppState로 주입되며,
//! 호출별 상태가 없어 동시에 호출해도 안전합니다.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::Document;

/// Gemini generateContent REST API의 기본 URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// 일시적 호출 실패 시 재시도 횟수. 재귀가 아니라 카운터 있는 루프로 구현됩니다.
const MAX_RETRIES: u32 = 1;

/// 아웃바운드 호출 타임아웃. 재시도 중에는 호출한 요청이 블로킹됩니다.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// 고정 플레이스홀더 문자열들. 비활성 모드와 에러 모드는 서로 다른 문자열을
// 사용해 호출 결과만 보고도 어느 쪽인지 구분할 수 있습니다.
pub const SUMMARY_DISABLED: &str = "Auto-summary disabled (no API key)";
pub const SUMMARY_ERROR: &str = "Error generating summary";
pub const TAG_DISABLED: &str = "ai-disabled";
pub const TAG_ERROR: &str = "ai-error";
pub const SEMANTIC_DISABLED: &str = "Semantic search disabled (no API key)";
pub const QA_DISABLED: &str = "Q&A disabled (no API key)";
pub const QA_ERROR: &str = "Error generating answer";

/// 시맨틱 검색 컨텍스트에 넣는 문서 본문 발췌 길이 (문자 수).
const CONTEXT_EXCERPT_CHARS: usize = 800;

/// Gemini 호출에서 발생할 수 있는 에러. 모듈 내부에서만 쓰이고,
/// 공개 함수 경계에서 전부 플레이스홀더 값으로 흡수됩니다.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("no API key configured")]
    NoApiKey,

    #[error("Gemini request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// 시맨틱 검색 결과의 두 갈래.
///
/// 모델이 올바른 JSON을 반환하면 `Ranked`, 아니면 원문을 그대로 실은
/// `Unparsed`입니다. 한쪽을 다른 쪽으로 뭉개지 않고 둘 다 노출합니다.
#[derive(Debug, Clone)]
pub enum SemanticRanking {
    Ranked(Vec<RankedDoc>),
    Unparsed(String),
}

/// 랭킹 한 건: 문서 제목과 관련성 판단 이유.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedDoc {
    pub title: String,
    pub reason: String,
}

/// Gemini API 클라이언트. Clone해도 내부 reqwest 커넥션 풀을 공유합니다.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    /// `None`이면 비활성(degraded) 모드 — 모든 호출이 플레이스홀더를 반환합니다.
    api_key: Option<String>,
    model: String,
    max_tags: usize,
}

// ── Gemini generateContent 요청/응답 와이어 타입 ──

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    // 안전 필터 등으로 content 없이 오는 후보는 빈 텍스트로 취급합니다
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// 클라이언트를 생성합니다. `api_key`가 `None`이면 비활성 모드입니다.
    pub fn new(
        api_key: Option<String>,
        model: String,
        max_tags: usize,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key,
            model,
            max_tags,
        })
    }

    /// API 키가 설정되어 있는지 (= AI 기능이 활성인지) 반환합니다.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// 프롬프트 하나를 모델에 보내고 응답 텍스트를 반환합니다.
    ///
    /// 호출 실패 시 동일 입력으로 최대 `MAX_RETRIES`회 재시도합니다.
    /// 명시적 카운터를 쓰는 유한 루프이므로 호출 횟수 상한이 보장됩니다.
    /// 모델이 후보를 반환하지 않으면 빈 문자열을 반환합니다 (에러 아님).
    async fn run_model(&self, prompt: &str) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::NoApiKey)?;

        let mut attempt = 0;
        loop {
            match self.generate(api_key, prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    tracing::warn!("Gemini call failed, retrying ({attempt}/{MAX_RETRIES}): {err}");
                }
                Err(err) => {
                    tracing::error!("Gemini call failed after retry: {err}");
                    return Err(err);
                }
            }
        }
    }

    /// generateContent 엔드포인트를 1회 호출합니다.
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            GEMINI_API_BASE, self.model
        );

        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        // 첫 번째 후보의 모든 part 텍스트를 이어붙입니다. 후보가 없으면 빈 문자열.
        let text = response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }

    /// 문서 본문을 2~4문장으로 요약합니다. 절대 실패하지 않습니다.
    pub async fn summarize(&self, content: &str) -> String {
        if self.api_key.is_none() {
            return SUMMARY_DISABLED.to_string();
        }

        let prompt =
            format!("Summarize the following document into 2-4 concise sentences:\n\n{content}");

        match self.run_model(&prompt).await {
            Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            _ => SUMMARY_ERROR.to_string(),
        }
    }

    /// 문서 본문에서 태그를 추출합니다. 결과는 항상 비어있지 않습니다.
    ///
    /// 모델의 자유 형식 출력을 쉼표/줄바꿈으로 나누고, 공백을 제거하고,
    /// 빈 토큰을 버린 뒤 `max_tags`개로 자릅니다.
    pub async fn generate_tags(&self, content: &str) -> Vec<String> {
        if self.api_key.is_none() {
            return vec![TAG_DISABLED.to_string()];
        }

        let prompt = format!(
            "Extract up to {} short single-word or phrase tags for this document. \
             Return them comma-separated:\n\n{content}",
            self.max_tags
        );

        let raw = match self.run_model(&prompt).await {
            Ok(raw) => raw,
            Err(_) => return vec![TAG_ERROR.to_string()],
        };

        let tags = parse_tags(&raw, self.max_tags);
        if tags.is_empty() {
            // 호출은 성공했지만 쓸 만한 토큰이 하나도 없는 경우
            vec![TAG_ERROR.to_string()]
        } else {
            tags
        }
    }

    /// 쿼리와 후보 문서들을 모델에 보내 관련도 랭킹을 위임합니다.
    ///
    /// 반환값은 [`SemanticRanking`]의 두 갈래 중 하나입니다.
    /// 비활성 모드에서는 고정 안내 문구가 `Unparsed` 갈래로 나갑니다.
    pub async fn semantic_search(
        &self,
        query: &str,
        docs: &[Document],
        limit: usize,
    ) -> SemanticRanking {
        if self.api_key.is_none() {
            return SemanticRanking::Unparsed(SEMANTIC_DISABLED.to_string());
        }

        let context = docs
            .iter()
            .map(|d| {
                format!(
                    "Title: {}\nContent excerpt: {}",
                    d.title,
                    excerpt(&d.content, CONTEXT_EXCERPT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let prompt = format!(
            "You are a search assistant. Given the query: \"{query}\", return the top {limit} \
             relevant docs from this context. \
             Format as JSON: [{{\"title\":\"...\",\"reason\":\"...\"}}]\n\nCONTEXT:\n{context}"
        );

        let raw = match self.run_model(&prompt).await {
            Ok(raw) => raw,
            // 재시도까지 실패: 구조화된 결과가 없으므로 빈 원문 폴백
            Err(_) => return SemanticRanking::Unparsed(String::new()),
        };

        match parse_ranking(&raw, limit) {
            Some(items) => SemanticRanking::Ranked(items),
            None => SemanticRanking::Unparsed(raw),
        }
    }

    /// 제공된 코퍼스만으로 질문에 답합니다.
    ///
    /// "문서에 없으면 모른다고 답하라"는 지시는 프롬프트에 담겨 모델에
    /// 전달될 뿐, 별도로 검증되지는 않습니다 (best-effort).
    pub async fn answer_question(&self, question: &str, docs: &[Document]) -> String {
        if self.api_key.is_none() {
            return QA_DISABLED.to_string();
        }

        let context = docs
            .iter()
            .map(|d| format!("Title: {}\nContent: {}", d.title, d.content))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let prompt = format!(
            "Answer the user's question using ONLY these docs. If not found, say \
             \"I don't know based on the provided documents.\"\n\n\
             DOCUMENTS:\n{context}\n\nQUESTION: {question}\n\nAnswer:"
        );

        match self.run_model(&prompt).await {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            _ => QA_ERROR.to_string(),
        }
    }
}

/// 모델의 자유 형식 출력에서 태그 목록을 뽑아냅니다.
fn parse_tags(raw: &str, max_tags: usize) -> Vec<String> {
    raw.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .take(max_tags)
        .map(str::to_string)
        .collect()
}

/// 모델 출력이 올바른 JSON 랭킹 배열이면 파싱하고, 아니면 None.
fn parse_ranking(raw: &str, limit: usize) -> Option<Vec<RankedDoc>> {
    let mut items: Vec<RankedDoc> = serde_json::from_str(raw.trim()).ok()?;
    items.truncate(limit);
    Some(items)
}

/// 본문 앞부분을 문자(char) 단위로 안전하게 잘라냅니다.
/// 바이트 슬라이싱은 멀티바이트 문자 경계에서 패닉하므로 쓰지 않습니다.
fn excerpt(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}
