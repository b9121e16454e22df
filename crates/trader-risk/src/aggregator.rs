//! 심볼별 리스크 집계.
//!
//! 주문을 심볼별로 나누어 각 심볼의 최악 손실을 구하고, 계좌 통화로
//! 환산해 합산합니다. 심볼 간 가격은 서로 독립이라고 가정하므로 합산이
//! 곧 전체 최악 손실입니다.
//!
//! - 주문이 하나뿐인 심볼: `|entry - stop_loss| * volume` (빠른 경로)
//! - 그 외: [`RiskWalker`]로 브레이크포인트 탐색

use crate::config::{RealizedPnlPolicy, RiskConfig};
use crate::error::{RiskError, RiskResult};
use crate::market::MarketView;
use crate::order::ExposureOrder;
use crate::walker::{RiskBound, RiskWalker};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use trader_core::{percentage_of, Money, Percentage, Symbol};

/// 심볼 리스크를 계산한 방법.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskMethod {
    /// 단일 주문의 손절 거리
    FastPath,
    /// 브레이크포인트 탐색
    Walker,
}

/// 심볼 하나의 리스크 내역.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolExposure {
    pub symbol: Symbol,
    /// 이 심볼의 주문 수
    pub order_count: usize,
    pub method: RiskMethod,
    /// 최악 손실 (호가 통화)
    pub quote_risk: Decimal,
    /// 호가 통화 → 계좌 통화 환산 비율
    pub conversion_rate: Decimal,
    /// 최악 손실 (계좌 통화)
    pub account_risk: Decimal,
}

/// 리스크 보고용 전체 내역.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureReport {
    /// 심볼별 내역 (심볼 순 정렬)
    pub symbols: Vec<SymbolExposure>,
    /// 전체 최악 손실 (계좌 통화)
    pub total_risk: Money,
    /// 계좌 잔고
    pub balance: Decimal,
    /// 잔고 대비 리스크 비율 (%), 잔고가 0이면 0
    pub risk_pct: Percentage,
}

impl ExposureReport {
    /// 특정 심볼의 내역을 조회합니다.
    pub fn symbol(&self, symbol: &Symbol) -> Option<&SymbolExposure> {
        self.symbols.iter().find(|s| &s.symbol == symbol)
    }
}

/// 주문 집합의 최대 리스크 계산기.
#[derive(Debug, Clone, Default)]
pub struct RiskAggregator {
    policy: RealizedPnlPolicy,
}

impl RiskAggregator {
    /// 주어진 실현 손익 정책으로 생성합니다.
    pub fn new(policy: RealizedPnlPolicy) -> Self {
        Self { policy }
    }

    /// 설정에서 생성합니다.
    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.realized_pnl_policy)
    }

    /// 실현 손익 정책.
    pub fn policy(&self) -> RealizedPnlPolicy {
        self.policy
    }

    /// 모든 심볼의 최악 손실 합 (계좌 통화).
    ///
    /// 손실 한도가 없는 심볼이 있으면 [`RiskError::UnboundedExposure`]를 반환합니다.
    pub fn compute_max_risk<M>(&self, orders: &[ExposureOrder], market: &M) -> RiskResult<Decimal>
    where
        M: MarketView + ?Sized,
    {
        Ok(self
            .symbol_exposures(orders, market)?
            .iter()
            .map(|s| s.account_risk)
            .sum())
    }

    /// 심볼별 리스크 내역을 계산합니다.
    pub fn symbol_exposures<M>(
        &self,
        orders: &[ExposureOrder],
        market: &M,
    ) -> RiskResult<Vec<SymbolExposure>>
    where
        M: MarketView + ?Sized,
    {
        partition_by_symbol(orders)
            .into_iter()
            .map(|(symbol, group)| self.symbol_exposure(symbol, &group, market))
            .collect()
    }

    /// 보고용 내역: 심볼별 리스크, 합계, 잔고 대비 비율.
    pub fn exposure_report<M>(
        &self,
        orders: &[ExposureOrder],
        market: &M,
        balance: Decimal,
    ) -> RiskResult<ExposureReport>
    where
        M: MarketView + ?Sized,
    {
        let symbols = self.symbol_exposures(orders, market)?;
        let total: Decimal = symbols.iter().map(|s| s.account_risk).sum();

        Ok(ExposureReport {
            symbols,
            total_risk: Money::new(total, market.account_currency()),
            balance,
            risk_pct: percentage_of(total, balance),
        })
    }

    fn symbol_exposure<M>(
        &self,
        symbol: Symbol,
        group: &[ExposureOrder],
        market: &M,
    ) -> RiskResult<SymbolExposure>
    where
        M: MarketView + ?Sized,
    {
        let span = tracing::debug_span!("symbol_exposure", symbol = %symbol, orders = group.len());
        let _guard = span.enter();

        let (quote_risk, method) = match group {
            [single] => {
                let risk = single.stop_loss_risk().ok_or_else(|| unbounded(&symbol))?;
                (risk, RiskMethod::FastPath)
            }
            _ => {
                let price = market.current_price(&symbol)?;
                let outcome = RiskWalker::new(group, self.policy).run(price);
                debug!(
                    market_price = %price,
                    breakpoints = outcome.stats.breakpoints_evaluated,
                    nodes = outcome.stats.nodes_explored,
                    memo_hits = outcome.stats.memo_hits,
                    max_depth = outcome.stats.max_depth,
                    "Walked breakpoints"
                );
                match outcome.worst_case {
                    RiskBound::Bounded(risk) => (risk, RiskMethod::Walker),
                    RiskBound::Unbounded => return Err(unbounded(&symbol)),
                }
            }
        };

        let conversion_rate = market.quote_to_account_rate(&symbol)?;
        let account_risk = quote_risk * conversion_rate;
        debug!(%quote_risk, %account_risk, ?method, "Symbol risk computed");

        Ok(SymbolExposure {
            symbol,
            order_count: group.len(),
            method,
            quote_risk,
            conversion_rate,
            account_risk,
        })
    }
}

fn unbounded(symbol: &Symbol) -> RiskError {
    warn!(symbol = %symbol, "Exposure is not limited by any stop-loss");
    RiskError::UnboundedExposure {
        symbol: symbol.to_string(),
    }
}

/// 심볼별로 주문을 나눕니다. 각 그룹은 원래 순서를 유지하는 작업 복사본입니다.
fn partition_by_symbol(orders: &[ExposureOrder]) -> BTreeMap<Symbol, Vec<ExposureOrder>> {
    let mut groups: BTreeMap<Symbol, Vec<ExposureOrder>> = BTreeMap::new();
    for order in orders {
        groups
            .entry(order.symbol.clone())
            .or_default()
            .push(order.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketSnapshot;
    use rust_decimal_macros::dec;

    fn eurusd() -> Symbol {
        Symbol::forex("EUR", "USD")
    }

    fn usdjpy() -> Symbol {
        Symbol::forex("USD", "JPY")
    }

    fn market() -> MarketSnapshot {
        MarketSnapshot::new("USD")
            .with_quote(eurusd(), dec!(99.9), dec!(100.1))
            .with_price(usdjpy(), dec!(150))
            .with_rate("JPY", dec!(0.01))
    }

    #[test]
    fn test_single_order_law() {
        let aggregator = RiskAggregator::default();
        let order = ExposureOrder::long(eurusd(), dec!(100), dec!(10)).with_stop_loss(dec!(95));

        let risk = aggregator.compute_max_risk(&[order], &market()).unwrap();
        assert_eq!(risk, dec!(50));
    }

    #[test]
    fn test_single_order_does_not_need_price() {
        let aggregator = RiskAggregator::default();
        let symbol = Symbol::crypto("SOL", "USD");
        let order = ExposureOrder::short(symbol, dec!(20), dec!(3)).with_stop_loss(dec!(22));

        let risk = aggregator
            .compute_max_risk(&[order], &MarketSnapshot::new("USD"))
            .unwrap();
        assert_eq!(risk, dec!(6));
    }

    #[test]
    fn test_conversion_to_account_currency() {
        let aggregator = RiskAggregator::default();
        let order = ExposureOrder::long(usdjpy(), dec!(150), dec!(100)).with_stop_loss(dec!(148));

        let report = aggregator
            .exposure_report(&[order], &market(), dec!(1000))
            .unwrap();
        let jpy = report.symbol(&usdjpy()).unwrap();

        assert_eq!(jpy.quote_risk, dec!(200));
        assert_eq!(jpy.conversion_rate, dec!(0.01));
        assert_eq!(jpy.account_risk, dec!(2));
        assert_eq!(report.total_risk, Money::new(dec!(2), "USD"));
        assert_eq!(report.risk_pct, dec!(0.2));
    }

    #[test]
    fn test_single_order_without_stop_is_unbounded() {
        let aggregator = RiskAggregator::default();
        let order = ExposureOrder::long(eurusd(), dec!(100), dec!(1)).with_take_profit(dec!(110));

        let err = aggregator.compute_max_risk(&[order], &market()).unwrap_err();
        assert_eq!(
            err,
            RiskError::UnboundedExposure {
                symbol: "EUR/USD".to_string()
            }
        );
    }

    #[test]
    fn test_symbol_independence() {
        let aggregator = RiskAggregator::default();
        let eur_orders = vec![
            ExposureOrder::long(eurusd(), dec!(100), dec!(1)).with_stop_loss(dec!(95)),
            ExposureOrder::short(eurusd(), dec!(101), dec!(1)).with_stop_loss(dec!(103)),
        ];
        let jpy_orders = vec![
            ExposureOrder::long(usdjpy(), dec!(150), dec!(10)).with_stop_loss(dec!(149)),
        ];
        let all: Vec<ExposureOrder> = eur_orders.iter().chain(&jpy_orders).cloned().collect();

        let market = market();
        let combined = aggregator.compute_max_risk(&all, &market).unwrap();
        let separate = aggregator.compute_max_risk(&eur_orders, &market).unwrap()
            + aggregator.compute_max_risk(&jpy_orders, &market).unwrap();

        assert_eq!(combined, separate);
    }

    #[test]
    fn test_walker_path_uses_mid_price() {
        let aggregator = RiskAggregator::default();
        let orders = vec![
            ExposureOrder::long(eurusd(), dec!(100), dec!(1)).with_stop_loss(dec!(95)),
            ExposureOrder::long(eurusd(), dec!(100), dec!(1)).with_stop_loss(dec!(97)),
        ];

        let report = aggregator.exposure_report(&orders, &market(), dec!(1000)).unwrap();
        let eur = report.symbol(&eurusd()).unwrap();

        assert_eq!(eur.method, RiskMethod::Walker);
        assert_eq!(eur.quote_risk, dec!(8));
    }

    #[test]
    fn test_missing_quote_for_walker() {
        let aggregator = RiskAggregator::default();
        let symbol = Symbol::crypto("DOGE", "USD");
        let orders = vec![
            ExposureOrder::long(symbol.clone(), dec!(1), dec!(1)).with_stop_loss(dec!(0.9)),
            ExposureOrder::long(symbol, dec!(1), dec!(1)).with_stop_loss(dec!(0.8)),
        ];

        let err = aggregator.compute_max_risk(&orders, &market()).unwrap_err();
        assert!(matches!(err, RiskError::MissingMarketData(_)));
    }

    #[test]
    fn test_zero_balance_report() {
        let aggregator = RiskAggregator::default();
        let order = ExposureOrder::long(eurusd(), dec!(100), dec!(1)).with_stop_loss(dec!(99));

        let report = aggregator.exposure_report(&[order], &market(), Decimal::ZERO).unwrap();
        assert_eq!(report.risk_pct, Decimal::ZERO);
        assert_eq!(report.total_risk.amount, dec!(1));
    }

    #[test]
    fn test_empty_order_set() {
        let aggregator = RiskAggregator::default();
        assert_eq!(aggregator.compute_max_risk(&[], &market()).unwrap(), Decimal::ZERO);
    }
}
