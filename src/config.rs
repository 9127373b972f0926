//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: JWT 토큰 서명에 사용할 비밀키 (필수)
//! - `GEMINI_API_KEY`: Gemini API 키. 없으면 AI 기능이 비활성(degraded) 모드로 동작
//! - `GEMINI_MODEL`: 사용할 모델 이름 (기본값: gemini-1.5-flash)
//! - `MAX_TAGS`: 문서당 AI 태그 최대 개수 (기본값: 6)
//! - `SEMANTIC_WINDOW`: 시맨틱 검색/Q&A에 제공할 최근 문서 수 (기본값: 200)
//! - `HOST` / `PORT`: 서버 바인딩 주소

// std::env: Rust 표준 라이브러리의 환경변수 모듈
use std::env;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 프로세스가 살아있는 동안 애플리케이션 전체에서 공유됩니다.
/// (숨겨진 재초기화 없음 — Gemini 클라이언트도 이 값으로 한 번만 생성됩니다)
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 경로 (예: "sqlite:data/knowledge-hub.db")
    pub database_url: String,
    /// JWT 토큰 서명/검증에 사용하는 비밀키
    pub jwt_secret: String,
    /// Gemini API 키. `None`이면 요약/태그는 플레이스홀더 값으로 대체됩니다.
    pub gemini_api_key: Option<String>,
    /// Gemini 모델 이름
    pub gemini_model: String,
    /// AI가 생성하는 태그의 최대 개수
    pub max_tags: usize,
    /// 시맨틱 검색/Q&A 코퍼스로 전달할 최근 문서 개수의 상한
    pub semantic_window: i64,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 5000)
    pub port: u16,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 반환값
    /// - `Ok(Config)`: 필수 환경변수가 모두 있으면 설정 객체 반환
    /// - `Err(VarError)`: 필수 환경변수(DATABASE_URL, JWT_SECRET)가 없으면 에러
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// `GEMINI_API_KEY`는 의도적으로 선택 사항입니다 — 키가 없어도 서버는
    /// 뜨고, AI 기능만 비활성 모드로 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            // env::var("KEY"): 환경변수를 읽습니다. 없으면 `?`가 에러를 전파합니다.
            database_url: env::var("DATABASE_URL")?, // 필수
            jwt_secret: env::var("JWT_SECRET")?,     // 필수

            // .ok(): Result<String, VarError> → Option<String> 변환.
            // 키가 없는 것은 에러가 아니라 "AI 비활성 모드"입니다.
            // 빈 문자열로 설정된 경우도 키 없음으로 취급합니다.
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),

            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),

            max_tags: env::var("MAX_TAGS")
                .unwrap_or_else(|_| "6".to_string())
                .parse()
                .unwrap_or(6),

            semantic_window: env::var("SEMANTIC_WINDOW")
                .unwrap_or_else(|_| "200".to_string())
                .parse()
                .unwrap_or(200),

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
        })
    }
}
