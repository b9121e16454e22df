//! 리스크 매니저 구현.
//!
//! 모든 리스크 관리 작업을 위한 통합 인터페이스 제공:
//! - 포지션/대기 주문을 리스크 평가용 주문으로 변환
//! - 신규 주문 요청의 리스크 게이트 검사
//! - 현재 리스크 보고
//! - 최대 주문 수량 계산

use crate::aggregator::ExposureReport;
use crate::config::RiskConfig;
use crate::error::RiskResult;
use crate::gate::{RiskBatch, RiskDecision, RiskGate};
use crate::market::MarketView;
use crate::order::ExposureOrder;
use crate::position_sizing::PositionSizer;
use rust_decimal::Decimal;
use tracing::info;
use trader_core::{Order, OrderRequest, Position, Price, Quantity};

/// 주문 검증 및 리스크 관리를 위한 리스크 매니저.
#[derive(Debug, Clone)]
pub struct RiskManager {
    /// 리스크 게이트 (설정 포함)
    gate: RiskGate,
    /// 포지션 크기 계산기
    position_sizer: PositionSizer,
    /// 계좌 잔고
    balance: Decimal,
}

impl RiskManager {
    /// 설정과 시작 잔고로 새 리스크 매니저 생성.
    pub fn new(config: RiskConfig, starting_balance: Decimal) -> Self {
        let position_sizer = PositionSizer::new(config.clone());
        let gate = RiskGate::new(config);

        Self {
            gate,
            position_sizer,
            balance: starting_balance,
        }
    }

    /// 기본 설정으로 생성.
    pub fn with_balance(starting_balance: Decimal) -> Self {
        Self::new(RiskConfig::default(), starting_balance)
    }

    /// 계좌 잔고 업데이트.
    pub fn update_balance(&mut self, balance: Decimal) {
        info!(old = %self.balance, new = %balance, "Account balance updated");
        self.balance = balance;
    }

    /// 현재 잔고 조회.
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// 설정 참조 조회.
    pub fn config(&self) -> &RiskConfig {
        self.gate.config()
    }

    /// 리스크 게이트 참조 조회.
    pub fn gate(&self) -> &RiskGate {
        &self.gate
    }

    // ==================== Order Collection ====================

    /// 열린 포지션과 대기 주문을 리스크 평가용 주문으로 변환.
    ///
    /// 닫힌 포지션과 종료된 주문은 제외합니다.
    pub fn collect_orders(
        &self,
        positions: &[Position],
        pending: &[Order],
    ) -> RiskResult<Vec<ExposureOrder>> {
        let from_positions = positions
            .iter()
            .filter(|p| p.is_open())
            .map(ExposureOrder::from_position);
        let from_pending = pending
            .iter()
            .filter(|o| o.is_working())
            .map(ExposureOrder::from_pending);

        from_positions.chain(from_pending).collect()
    }

    // ==================== Order Validation ====================

    /// 신규 주문 요청을 리스크 게이트로 검증.
    ///
    /// # Arguments
    /// * `request` - 검증할 주문 요청
    /// * `positions` - 현재 포지션
    /// * `pending` - 체결 대기 주문
    /// * `market` - 현재 시장 데이터
    pub fn validate_order<M>(
        &self,
        request: &OrderRequest,
        positions: &[Position],
        pending: &[Order],
        market: &M,
    ) -> RiskResult<RiskDecision>
    where
        M: MarketView + ?Sized,
    {
        let existing = self.collect_orders(positions, pending)?;
        let proposed = self.proposed_order(request, market)?;

        self.gate
            .try_reserve(&existing, Some(&proposed), self.balance, market)
    }

    /// 현재 포지션과 대기 주문의 리스크 보고.
    pub fn current_risk<M>(
        &self,
        positions: &[Position],
        pending: &[Order],
        market: &M,
    ) -> RiskResult<ExposureReport>
    where
        M: MarketView + ?Sized,
    {
        let existing = self.collect_orders(positions, pending)?;
        self.gate
            .aggregator()
            .exposure_report(&existing, market, self.balance)
    }

    // ==================== Position Sizing ====================

    /// 주문 요청의 가격과 손절로 게이트를 통과하는 최대 수량 계산.
    /// 요청의 수량은 무시됩니다.
    pub fn max_affordable_volume<M>(
        &self,
        request: &OrderRequest,
        positions: &[Position],
        pending: &[Order],
        market: &M,
    ) -> RiskResult<Quantity>
    where
        M: MarketView + ?Sized,
    {
        let existing = self.collect_orders(positions, pending)?;
        let template = self.proposed_order(request, market)?;

        self.position_sizer
            .max_affordable_volume(&existing, &template, self.balance, market)
    }

    /// 손절 거리 기반 고정 비율 포지션 크기.
    pub fn calculate_position_size(
        &self,
        entry_price: Price,
        stop_loss: Price,
        conversion_rate: Decimal,
    ) -> Quantity {
        self.position_sizer
            .calculate_fixed_fractional(self.balance, entry_price, stop_loss, conversion_rate)
    }

    // ==================== Batch ====================

    /// 다중 레그 주문 배치 시작.
    pub fn begin_batch(&self) -> RiskBatch<'_> {
        self.gate.begin_batch()
    }

    fn proposed_order<M>(&self, request: &OrderRequest, market: &M) -> RiskResult<ExposureOrder>
    where
        M: MarketView + ?Sized,
    {
        let market_price = if request.order_type.is_pending_type() {
            None
        } else {
            Some(market.current_price(&request.symbol)?)
        };
        ExposureOrder::from_request(request, market_price)
    }
}

impl Default for RiskManager {
    fn default() -> Self {
        Self::with_balance(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::RiskMethod;
    use crate::error::RiskError;
    use crate::gate::{CommitMode, RejectReason};
    use crate::market::MarketSnapshot;
    use rust_decimal_macros::dec;
    use trader_core::{OrderStatusType, Side, Symbol};

    fn btc() -> Symbol {
        Symbol::crypto("BTC", "USDT")
    }

    fn market() -> MarketSnapshot {
        MarketSnapshot::new("USDT").with_quote(btc(), dec!(49990), dec!(50010))
    }

    fn open_position() -> Position {
        // 손절까지 0.01 × 1000 = 10
        Position::new(btc(), Side::Buy, dec!(0.01), dec!(50000)).with_stop_loss(dec!(49000))
    }

    #[test]
    fn test_risk_manager_creation() {
        let manager = RiskManager::new(RiskConfig::default(), dec!(10000));

        assert_eq!(manager.balance(), dec!(10000));
        assert_eq!(manager.config().max_risk_pct, 2.0);
    }

    #[test]
    fn test_collect_orders_skips_closed_and_final() {
        let manager = RiskManager::with_balance(dec!(1000));

        let mut closed = open_position();
        closed.close(dec!(50500));
        let working = Order::from_request(
            OrderRequest::limit_buy(btc(), dec!(0.01), dec!(48000)).with_stop_loss(dec!(47000)),
        );
        let cancelled = working.clone().with_status(OrderStatusType::Cancelled);

        let orders = manager
            .collect_orders(&[open_position(), closed], &[working, cancelled])
            .unwrap();

        assert_eq!(orders.len(), 2);
        assert!(orders[0].active);
        assert!(!orders[1].active);
        assert_eq!(orders[1].entry_price, dec!(48000));
    }

    #[test]
    fn test_validate_market_order_within_limits() {
        let manager = RiskManager::with_balance(dec!(1000));
        let request = OrderRequest::market_buy(btc(), dec!(0.005)).with_stop_loss(dec!(48000));

        let decision = manager
            .validate_order(&request, &[open_position()], &[], &market())
            .unwrap();

        // 49000에서 10 + 5, 48000까지 내려가면 10 + 10 = 20
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_validate_order_exceeds_limit() {
        let manager = RiskManager::with_balance(dec!(1000));
        let request = OrderRequest::market_buy(btc(), dec!(0.01)).with_stop_loss(dec!(48000));

        let decision = manager
            .validate_order(&request, &[open_position()], &[], &market())
            .unwrap();

        assert!(matches!(
            decision.reject_reason(),
            Some(RejectReason::ExceedsAllowableRisk { .. })
        ));
    }

    #[test]
    fn test_validate_order_without_stop_loss() {
        let manager = RiskManager::with_balance(dec!(1000));
        let request = OrderRequest::limit_sell(btc(), dec!(0.01), dec!(51000));

        let decision = manager
            .validate_order(&request, &[], &[], &market())
            .unwrap();

        assert_eq!(
            decision,
            RiskDecision::Reject(RejectReason::UnboundedExposure {
                symbol: "BTC/USDT".to_string()
            })
        );
    }

    #[test]
    fn test_validate_order_with_bad_stop_loss() {
        let manager = RiskManager::with_balance(dec!(1000));
        let request = OrderRequest::market_sell(btc(), dec!(0.01)).with_stop_loss(dec!(49000));

        let err = manager
            .validate_order(&request, &[], &[], &market())
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidOrder(_)));
    }

    #[test]
    fn test_current_risk_report() {
        let manager = RiskManager::with_balance(dec!(1000));
        let report = manager
            .current_risk(&[open_position()], &[], &market())
            .unwrap();

        assert_eq!(report.total_risk.amount, dec!(10));
        assert_eq!(report.total_risk.currency, "USDT");
        assert_eq!(report.risk_pct, dec!(1));
        assert_eq!(report.symbols[0].method, RiskMethod::FastPath);
    }

    #[test]
    fn test_max_affordable_volume() {
        let manager = RiskManager::with_balance(dec!(1000));
        let request = OrderRequest::limit_buy(btc(), dec!(1), dec!(40000)).with_stop_loss(dec!(39000));

        let volume = manager
            .max_affordable_volume(&request, &[], &[], &market())
            .unwrap();
        assert_eq!(volume, dec!(0.02));
    }

    #[test]
    fn test_calculate_position_size() {
        let manager = RiskManager::with_balance(dec!(10000));
        let size = manager.calculate_position_size(dec!(100), dec!(98), dec!(1));
        assert_eq!(size, dec!(100));
    }

    #[test]
    fn test_update_balance_changes_allowed_risk() {
        let mut manager = RiskManager::with_balance(dec!(100));
        let request = OrderRequest::market_buy(btc(), dec!(0.01)).with_stop_loss(dec!(49000));

        assert!(!manager
            .validate_order(&request, &[], &[], &market())
            .unwrap()
            .is_allowed());

        manager.update_balance(dec!(1000));
        assert!(manager
            .validate_order(&request, &[], &[], &market())
            .unwrap()
            .is_allowed());
    }

    #[test]
    fn test_batch_through_manager() {
        let manager = RiskManager::with_balance(dec!(1000));
        let existing = manager.collect_orders(&[open_position()], &[]).unwrap();

        let mut batch = manager.begin_batch();
        batch
            .add_leg(
                ExposureOrder::short(btc(), dec!(50000), dec!(0.01)).with_stop_loss(dec!(50500)),
            )
            .unwrap();
        let commit = batch
            .commit(&existing, &market(), manager.balance(), CommitMode::Verify)
            .unwrap();

        assert!(commit.is_allowed());
    }
}
