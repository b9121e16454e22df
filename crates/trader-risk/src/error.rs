//! 리스크 엔진 에러.
//!
//! 리스크 계산은 순수 함수이므로 일시적 실패가 없습니다. 여기의 모든
//! 에러는 해당 호출에 대해 최종적이며 재시도해도 결과가 바뀌지 않습니다.
//! 한도 초과는 에러가 아니라 [`RiskDecision::Reject`](crate::RiskDecision)로 표현됩니다.

use crate::config::ConfigValidationError;
use thiserror::Error;
use trader_core::TraderError;

/// 리스크 계산 에러.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// 필수 필드 누락 또는 기본 검증 실패 (리스크 계산 전에 거부)
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// 손절이 없어 손실 한도를 정할 수 없는 노출
    #[error("Unbounded exposure on {symbol}: no stop-loss limits the loss")]
    UnboundedExposure { symbol: String },

    /// 현재 가격 또는 환율 누락
    #[error("Missing market data: {0}")]
    MissingMarketData(String),

    /// 잘못된 리스크 설정
    #[error(transparent)]
    Config(#[from] ConfigValidationError),
}

/// 리스크 작업을 위한 Result 타입.
pub type RiskResult<T> = Result<T, RiskError>;

impl RiskError {
    /// 리스크 에러는 모두 최종적입니다.
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RiskError::InvalidOrder(reason.into())
    }
}

impl From<RiskError> for TraderError {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::InvalidOrder(reason) => TraderError::Order(reason),
            RiskError::MissingMarketData(reason) => TraderError::MarketData(reason),
            RiskError::Config(err) => TraderError::Config(err.to_string()),
            other => TraderError::Risk(other.to_string()),
        }
    }
}
