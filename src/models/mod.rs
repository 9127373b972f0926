//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! 각 하위 모듈은 특정 도메인의 데이터 타입을 담당합니다:
//! - `document`: 문서(Document)의 현재 상태와 요청/응답 구조체
//! - `version`: 문서 저장 시점의 불변 스냅샷(Version)
//! - `user`: 사용자(User)와 인증 요청/응답 구조체
//!
//! `pub use X::*;`는 하위 모듈의 모든 공개 항목을
//! 이 모듈에서 바로 접근할 수 있게 재공개(re-export)합니다.
//! 예: `crate::models::document::Document` 대신 `crate::models::Document`로 접근 가능

pub mod document;
pub mod user;
pub mod version;

pub use document::*;
pub use user::*;
pub use version::*;
