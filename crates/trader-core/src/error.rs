//! 트레이딩 시스템의 에러 타입.
//!
//! 이 모듈은 트레이딩 라이브러리 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 트레이딩 에러.
#[derive(Debug, Error)]
pub enum TraderError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 주문 에러
    #[error("주문 에러: {0}")]
    Order(String),

    /// 포지션 에러
    #[error("포지션 에러: {0}")]
    Position(String),

    /// 리스크 관리 에러
    #[error("리스크 에러: {0}")]
    Risk(String),

    /// 시세/환율 데이터 에러
    #[error("시장 데이터 에러: {0}")]
    MarketData(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 트레이딩 작업을 위한 Result 타입.
pub type TraderResult<T> = Result<T, TraderError>;

impl TraderError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 시세가 아직 도착하지 않은 경우만 재시도 대상입니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TraderError::MarketData(_))
    }

    /// 주문 진행을 막아야 하는 에러인지 확인합니다.
    pub fn blocks_order(&self) -> bool {
        matches!(
            self,
            TraderError::Order(_) | TraderError::Risk(_) | TraderError::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for TraderError {
    fn from(err: serde_json::Error) -> Self {
        TraderError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for TraderError {
    fn from(err: config::ConfigError) -> Self {
        TraderError::Config(err.to_string())
    }
}
