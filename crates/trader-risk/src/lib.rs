//! 리스크 노출 엔진.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 포지션/대기 주문/가상 주문의 최악 손실(최대 리스크) 계산
//! - 헤지 및 부분 중첩 주문에 대한 브레이크포인트 탐색
//! - 계좌 잔고 대비 허용 리스크 기반 주문 게이트
//! - 다중 레그 주문 배치 검사
//! - 게이트를 통과하는 최대 주문 수량 계산
//!
//! 흐름: [`RiskGate`] → [`RiskAggregator`] → (단일 주문 | [`RiskWalker`]
//! → [`next_breakpoint`] → [`ExposureOrder::value_at`]).
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_risk::{MarketSnapshot, RiskConfig, RiskManager};
//!
//! let manager = RiskManager::new(RiskConfig::default(), balance);
//! let market = MarketSnapshot::new("USD").with_quote(symbol, bid, ask);
//!
//! // 주문 검증
//! let decision = manager.validate_order(&request, &positions, &pending, &market)?;
//! if decision.is_allowed() {
//!     // 주문 진행
//! }
//! ```

pub mod aggregator;
pub mod breakpoint;
pub mod config;
pub mod error;
pub mod gate;
pub mod manager;
pub mod market;
pub mod order;
pub mod position_sizing;
pub mod walker;

// 주요 타입 재내보내기
pub use aggregator::{ExposureReport, RiskAggregator, RiskMethod, SymbolExposure};
pub use breakpoint::{next_breakpoint, Breakpoint, BreakpointKind, LegState};
pub use config::{ConfigValidationError, RealizedPnlPolicy, RiskConfig, SymbolRiskConfig};
pub use error::{RiskError, RiskResult};
pub use gate::{BatchCommit, CommitMode, RejectReason, RiskBatch, RiskDecision, RiskGate};
pub use manager::RiskManager;
pub use market::{MarketSnapshot, MarketView, Quote};
pub use order::{ExposureOrder, OrderSource, PriceDirection};
pub use position_sizing::PositionSizer;
pub use walker::{worst_case_loss, RiskBound, RiskWalker, WalkOutcome, WalkStats};

use rust_decimal::Decimal;

/// 기본 설정으로 주문 집합의 최대 리스크(계좌 통화)를 계산합니다.
pub fn compute_max_risk<M>(orders: &[ExposureOrder], market: &M) -> RiskResult<Decimal>
where
    M: MarketView + ?Sized,
{
    RiskAggregator::default().compute_max_risk(orders, market)
}

/// 기본 설정으로 제안 주문을 허용 비율에 대해 검사합니다.
pub fn try_reserve_risk<M>(
    existing: &[ExposureOrder],
    proposed: Option<&ExposureOrder>,
    allowed_risk_fraction: Decimal,
    balance: Decimal,
    market: &M,
) -> RiskResult<RiskDecision>
where
    M: MarketView + ?Sized,
{
    RiskGate::default().try_reserve_risk(existing, proposed, allowed_risk_fraction, balance, market)
}
