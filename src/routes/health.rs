//! # 헬스체크(Health Check) 핸들러
//!
//! 서버가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET /` → "Knowledge Hub API is running"
//!
//! 주로 다음 용도로 사용됩니다:
//! - 로드밸런서의 서버 상태 확인
//! - 컨테이너 오케스트레이터의 헬스체크
//! - 모니터링 시스템의 가동 시간 추적

/// `GET /` — 서버 상태를 확인합니다.
///
/// Extractor 없이 작동하는 가장 단순한 형태의 핸들러입니다.
/// 고정된 텍스트만 반환하므로 실패하지 않습니다.
pub async fn health_check() -> &'static str {
    "Knowledge Hub API is running"
}
