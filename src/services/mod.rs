//! # 서비스(비즈니스 로직) 계층
//!
//! 라우트 핸들러와 데이터베이스 계층 사이의 도메인 로직을 담당합니다.
//!
//! 각 하위 모듈:
//! - `gemini`: Gemini API 클라이언트 — 요약/태그 생성, 시맨틱 검색, Q&A.
//!   키가 없거나 호출이 실패해도 절대 에러를 전파하지 않습니다.
//! - `documents`: 문서 생성/수정/삭제 워크플로 — 검증, AI 보강,
//!   버전 스냅샷, 원자적 저장을 순서대로 조율합니다.

pub mod documents;
pub mod gemini;
