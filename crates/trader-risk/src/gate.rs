//! 주문 전 리스크 게이트.
//!
//! 기존 주문에 제안 주문을 더한 작업 집합의 최대 리스크를 계산하고
//! 허용 리스크(잔고 × 비율)와 비교합니다. 여러 레그로 이루어진 전략은
//! [`RiskBatch`]로 레그를 모은 뒤 커밋 시점에 한 번만 검사합니다.

use crate::aggregator::{ExposureReport, RiskAggregator};
use crate::config::RiskConfig;
use crate::error::{RiskError, RiskResult};
use crate::market::MarketView;
use crate::order::ExposureOrder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};
use trader_core::Symbol;

/// 주문이 거부된 이유.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// 전체 최대 리스크가 허용 리스크를 초과
    ExceedsAllowableRisk {
        max_risk: Decimal,
        allowed_risk: Decimal,
    },
    /// 심볼 단독 한도 초과
    SymbolLimitExceeded {
        symbol: String,
        symbol_risk: Decimal,
        allowed_risk: Decimal,
    },
    /// 손절이 없어 손실 한도를 정할 수 없음
    UnboundedExposure { symbol: String },
    /// 설정에서 비활성화된 심볼
    SymbolDisabled { symbol: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ExceedsAllowableRisk {
                max_risk,
                allowed_risk,
            } => write!(
                f,
                "Max risk {} exceeds allowed risk {}",
                max_risk, allowed_risk
            ),
            RejectReason::SymbolLimitExceeded {
                symbol,
                symbol_risk,
                allowed_risk,
            } => write!(
                f,
                "Risk {} on {} exceeds symbol limit {}",
                symbol_risk, symbol, allowed_risk
            ),
            RejectReason::UnboundedExposure { symbol } => {
                write!(f, "Exposure on {} is not limited by a stop-loss", symbol)
            }
            RejectReason::SymbolDisabled { symbol } => {
                write!(f, "Trading disabled for symbol: {}", symbol)
            }
        }
    }
}

/// 게이트 판정 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskDecision {
    /// 허용 (계좌 통화 기준 최대 리스크와 허용 리스크)
    Allow {
        max_risk: Decimal,
        allowed_risk: Decimal,
    },
    /// 거부
    Reject(RejectReason),
}

impl RiskDecision {
    /// 주문이 허용되었는지 여부.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RiskDecision::Allow { .. })
    }

    /// 거부 사유.
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            RiskDecision::Reject(reason) => Some(reason),
            RiskDecision::Allow { .. } => None,
        }
    }
}

/// 주문 배치 커밋 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// 최종 상태를 게이트로 검사
    Verify,
    /// 검사 없이 레그를 반환 (명시적 우회)
    Unchecked,
}

/// 배치 커밋 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommit {
    /// 배치에 기록된 레그
    pub legs: Vec<ExposureOrder>,
    /// `Verify` 모드의 판정 (`Unchecked`이면 `None`)
    pub decision: Option<RiskDecision>,
}

impl BatchCommit {
    /// 레그를 제출해도 되는지 여부. `Unchecked` 커밋은 항상 true입니다.
    pub fn is_allowed(&self) -> bool {
        self.decision.as_ref().map_or(true, RiskDecision::is_allowed)
    }
}

/// 주문 전 리스크 게이트.
#[derive(Debug, Clone, Default)]
pub struct RiskGate {
    config: RiskConfig,
    aggregator: RiskAggregator,
}

impl RiskGate {
    /// 주어진 설정으로 게이트를 생성합니다.
    pub fn new(config: RiskConfig) -> Self {
        let aggregator = RiskAggregator::from_config(&config);
        Self { config, aggregator }
    }

    /// 설정 참조.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// 내부 집계기 참조.
    pub fn aggregator(&self) -> &RiskAggregator {
        &self.aggregator
    }

    // ==================== Single Order ====================

    /// 설정된 `max_risk_pct`를 허용 비율로 사용해 제안 주문을 검사합니다.
    pub fn try_reserve<M>(
        &self,
        existing: &[ExposureOrder],
        proposed: Option<&ExposureOrder>,
        balance: Decimal,
        market: &M,
    ) -> RiskResult<RiskDecision>
    where
        M: MarketView + ?Sized,
    {
        self.try_reserve_risk(
            existing,
            proposed,
            self.config.max_risk_fraction(),
            balance,
            market,
        )
    }

    /// 기존 주문에 제안 주문을 더했을 때의 최대 리스크를 허용 리스크와 비교합니다.
    ///
    /// 제안 주문이 불변식을 어기면 리스크 계산 전에 [`RiskError::InvalidOrder`]를
    /// 반환합니다. 한도 초과와 손실 무한 노출은 에러가 아니라
    /// [`RiskDecision::Reject`]입니다.
    pub fn try_reserve_risk<M>(
        &self,
        existing: &[ExposureOrder],
        proposed: Option<&ExposureOrder>,
        allowed_risk_fraction: Decimal,
        balance: Decimal,
        market: &M,
    ) -> RiskResult<RiskDecision>
    where
        M: MarketView + ?Sized,
    {
        if let Some(order) = proposed {
            order.validate()?;
        }

        let new_legs: Vec<&ExposureOrder> = proposed.into_iter().collect();
        let mut working = existing.to_vec();
        working.extend(proposed.cloned());

        self.check(&working, &new_legs, allowed_risk_fraction, balance, market)
    }

    // ==================== Batch ====================

    /// 여러 레그를 모아 커밋 시점에 한 번만 검사하는 배치를 시작합니다.
    pub fn begin_batch(&self) -> RiskBatch<'_> {
        RiskBatch {
            gate: self,
            legs: Vec::new(),
            committed: false,
        }
    }

    // ==================== Internal ====================

    fn check<M>(
        &self,
        working: &[ExposureOrder],
        new_legs: &[&ExposureOrder],
        allowed_risk_fraction: Decimal,
        balance: Decimal,
        market: &M,
    ) -> RiskResult<RiskDecision>
    where
        M: MarketView + ?Sized,
    {
        let touched: BTreeSet<&Symbol> = new_legs.iter().map(|leg| &leg.symbol).collect();

        for symbol in &touched {
            let name = symbol.to_string();
            if !self.config.is_symbol_enabled(&name) {
                return Ok(reject(RejectReason::SymbolDisabled { symbol: name }));
            }
        }

        let report = match self.aggregator.exposure_report(working, market, balance) {
            Ok(report) => report,
            Err(RiskError::UnboundedExposure { symbol }) => {
                return Ok(reject(RejectReason::UnboundedExposure { symbol }));
            }
            Err(err) => return Err(err),
        };

        let tolerance = self.config.risk_tolerance;
        let balance = balance.max(Decimal::ZERO);
        let allowed_risk = balance * allowed_risk_fraction;
        let max_risk = report.total_risk.amount;

        if max_risk > allowed_risk + tolerance {
            return Ok(reject(RejectReason::ExceedsAllowableRisk {
                max_risk,
                allowed_risk,
            }));
        }

        if let Some(reason) = self.symbol_limit_breach(&report, &touched, balance) {
            return Ok(reject(reason));
        }

        debug!(
            %max_risk,
            %allowed_risk,
            orders = working.len(),
            new_legs = new_legs.len(),
            "Risk reserved"
        );
        Ok(RiskDecision::Allow {
            max_risk,
            allowed_risk,
        })
    }

    fn symbol_limit_breach(
        &self,
        report: &ExposureReport,
        touched: &BTreeSet<&Symbol>,
        balance: Decimal,
    ) -> Option<RejectReason> {
        touched.iter().find_map(|symbol| {
            let name = symbol.to_string();
            let fraction = self.config.symbol_risk_fraction(&name)?;
            let exposure = report.symbol(symbol)?;
            let allowed_risk = balance * fraction;

            (exposure.account_risk > allowed_risk + self.config.risk_tolerance).then(|| {
                RejectReason::SymbolLimitExceeded {
                    symbol: name,
                    symbol_risk: exposure.account_risk,
                    allowed_risk,
                }
            })
        })
    }
}

fn reject(reason: RejectReason) -> RiskDecision {
    warn!(reason = %reason, "Order rejected by risk gate");
    RiskDecision::Reject(reason)
}

/// 다중 레그 주문 배치.
///
/// 레그를 추가하는 동안에는 리스크 검사를 하지 않고, [`commit`](Self::commit)에서
/// 최종 상태를 한 번 검사합니다. 커밋하지 않고 버려진 배치는 경고를 남깁니다.
#[derive(Debug)]
#[must_use = "a risk batch must be committed"]
pub struct RiskBatch<'g> {
    gate: &'g RiskGate,
    legs: Vec<ExposureOrder>,
    committed: bool,
}

impl<'g> RiskBatch<'g> {
    /// 레그를 추가합니다. 주문 불변식만 검사하고 리스크 검사는 커밋까지 미룹니다.
    pub fn add_leg(&mut self, leg: ExposureOrder) -> RiskResult<&mut Self> {
        leg.validate()?;
        self.legs.push(leg);
        Ok(self)
    }

    /// 지금까지 추가된 레그.
    pub fn legs(&self) -> &[ExposureOrder] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// 배치를 종료합니다.
    ///
    /// `Verify`는 기존 주문과 모든 레그를 합친 최종 상태를 설정된 허용 비율로
    /// 검사하고, `Unchecked`는 검사 없이 레그를 반환합니다.
    pub fn commit<M>(
        mut self,
        existing: &[ExposureOrder],
        market: &M,
        balance: Decimal,
        mode: CommitMode,
    ) -> RiskResult<BatchCommit>
    where
        M: MarketView + ?Sized,
    {
        self.committed = true;
        let legs = std::mem::take(&mut self.legs);

        let decision = match mode {
            CommitMode::Unchecked => {
                debug!(legs = legs.len(), "Risk batch committed without check");
                None
            }
            CommitMode::Verify => {
                let mut working = existing.to_vec();
                working.extend(legs.iter().cloned());
                let new_legs: Vec<&ExposureOrder> = legs.iter().collect();

                Some(self.gate.check(
                    &working,
                    &new_legs,
                    self.gate.config.max_risk_fraction(),
                    balance,
                    market,
                )?)
            }
        };

        Ok(BatchCommit { legs, decision })
    }
}

impl Drop for RiskBatch<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.legs.is_empty() {
            warn!(legs = self.legs.len(), "Risk batch dropped without commit");
        }
    }
}
