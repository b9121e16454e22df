//! 포지션 크기 계산.
//!
//! 제공 기능:
//! - 손절 거리 기반 고정 비율 포지션 크기
//! - 리스크 게이트를 통과하는 최대 주문 수량 탐색

use crate::config::RiskConfig;
use crate::error::{RiskError, RiskResult};
use crate::gate::RiskGate;
use crate::market::MarketView;
use crate::order::ExposureOrder;
use rust_decimal::Decimal;
use tracing::debug;
use trader_core::{floor_to_step, safe_ratio, Price, Quantity};

/// 포지션 크기 계산기.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    gate: RiskGate,
}

impl PositionSizer {
    /// 주어진 설정으로 새 포지션 사이저를 생성.
    pub fn new(config: RiskConfig) -> Self {
        Self {
            gate: RiskGate::new(config),
        }
    }

    fn config(&self) -> &RiskConfig {
        self.gate.config()
    }

    /// 고정 비율 포지션 크기.
    ///
    /// 손절 도달 시 손실이 `balance × max_risk_pct`가 되는 수량을 계산합니다.
    /// 다른 주문과의 상호작용은 고려하지 않습니다.
    ///
    /// # 인자
    /// * `balance` - 계좌 잔고 (계좌 통화)
    /// * `entry_price` / `stop_loss` - 진입 가격과 손절 가격
    /// * `conversion_rate` - 호가 통화 → 계좌 통화 환산 비율
    pub fn calculate_fixed_fractional(
        &self,
        balance: Decimal,
        entry_price: Price,
        stop_loss: Price,
        conversion_rate: Decimal,
    ) -> Quantity {
        let risk_amount = balance.max(Decimal::ZERO) * self.config().max_risk_fraction();
        let unit_risk = (entry_price - stop_loss).abs() * conversion_rate;
        floor_to_step(safe_ratio(risk_amount, unit_risk), self.config().volume_step)
    }

    /// 기존 주문과 함께 게이트를 통과하는 `template` 주문의 최대 수량.
    ///
    /// 고정 비율 크기에서 출발해, 게이트가 허용하는 동안 상한을 두 배씩 늘린 뒤
    /// `volume_step` 단위까지 이분 탐색합니다. 헤지로 리스크가 줄어드는 경우
    /// 고정 비율 크기보다 큰 값이 나올 수 있습니다. 허용되는 수량이 없으면 0입니다.
    ///
    /// 리스크가 새 주문 수량에 대해 단조 증가한다고 가정합니다.
    pub fn max_affordable_volume<M>(
        &self,
        existing: &[ExposureOrder],
        template: &ExposureOrder,
        balance: Decimal,
        market: &M,
    ) -> RiskResult<Quantity>
    where
        M: MarketView + ?Sized,
    {
        let step = self.config().volume_step;
        let stop_loss = template
            .stop_loss
            .ok_or_else(|| RiskError::UnboundedExposure {
                symbol: template.symbol.to_string(),
            })?;
        template.with_volume(step).validate()?;

        let rate = market.quote_to_account_rate(&template.symbol)?;
        let seed = self
            .calculate_fixed_fractional(balance, template.entry_price, stop_loss, rate)
            .max(step);

        let mut search = VolumeSearch {
            gate: &self.gate,
            existing,
            template,
            balance,
            market,
            remaining: self.config().max_volume_search_steps,
        };

        // 허용되는 lo와 허용되지 않는 hi를 찾습니다.
        let (mut lo, mut hi) = if search.allows(seed)? {
            let mut lo = seed;
            loop {
                let candidate = lo * Decimal::TWO;
                if search.exhausted() {
                    debug!(symbol = %template.symbol, volume = %lo, "Volume search budget exhausted");
                    return Ok(lo);
                }
                if search.allows(candidate)? {
                    lo = candidate;
                } else {
                    break (lo, candidate);
                }
            }
        } else {
            (Decimal::ZERO, seed)
        };

        while hi - lo > step && !search.exhausted() {
            let mut mid = floor_to_step((lo + hi) / Decimal::TWO, step);
            if mid <= lo {
                mid = lo + step;
            }
            if search.allows(mid)? {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        debug!(
            symbol = %template.symbol,
            %seed,
            volume = %lo,
            evaluations = self.config().max_volume_search_steps - search.remaining,
            "Max affordable volume"
        );
        Ok(lo)
    }
}

/// 게이트 호출 횟수를 제한하는 수량 탐색 상태.
struct VolumeSearch<'a, M: ?Sized> {
    gate: &'a RiskGate,
    existing: &'a [ExposureOrder],
    template: &'a ExposureOrder,
    balance: Decimal,
    market: &'a M,
    remaining: u32,
}

impl<M> VolumeSearch<'_, M>
where
    M: MarketView + ?Sized,
{
    fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    fn allows(&mut self, volume: Quantity) -> RiskResult<bool> {
        self.remaining = self.remaining.saturating_sub(1);
        let candidate = self.template.with_volume(volume);
        let decision = self
            .gate
            .try_reserve(self.existing, Some(&candidate), self.balance, self.market)?;
        Ok(decision.is_allowed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketSnapshot;
    use rust_decimal_macros::dec;
    use trader_core::Symbol;

    fn eurusd() -> Symbol {
        Symbol::forex("EUR", "USD")
    }

    fn market() -> MarketSnapshot {
        MarketSnapshot::new("USD")
            .with_price(eurusd(), dec!(100))
            .with_price(Symbol::forex("USD", "JPY"), dec!(150))
            .with_rate("JPY", dec!(0.01))
    }

    fn template() -> ExposureOrder {
        ExposureOrder::long(eurusd(), dec!(100), dec!(1)).with_stop_loss(dec!(95))
    }

    #[test]
    fn test_calculate_fixed_fractional() {
        let sizer = PositionSizer::default();

        // 1000의 2% = 20, 단위 손실 5 → 4
        let size = sizer.calculate_fixed_fractional(dec!(1000), dec!(100), dec!(95), dec!(1));
        assert_eq!(size, dec!(4));

        // 단위 손실 3 → 6.666... → 6.66
        let size = sizer.calculate_fixed_fractional(dec!(1000), dec!(100), dec!(97), dec!(1));
        assert_eq!(size, dec!(6.66));
    }

    #[test]
    fn test_fixed_fractional_zero_distance() {
        let sizer = PositionSizer::default();
        let size = sizer.calculate_fixed_fractional(dec!(1000), dec!(100), dec!(100), dec!(1));
        assert_eq!(size, Decimal::ZERO);
    }

    #[test]
    fn test_max_affordable_volume_standalone() {
        let sizer = PositionSizer::default();
        let volume = sizer
            .max_affordable_volume(&[], &template(), dec!(1000), &market())
            .unwrap();
        assert_eq!(volume, dec!(4));
    }

    #[test]
    fn test_max_affordable_volume_with_existing_risk() {
        let sizer = PositionSizer::default();
        let existing = vec![
            ExposureOrder::long(Symbol::crypto("BTC", "USD"), dec!(100), dec!(1))
                .with_stop_loss(dec!(90)),
        ];

        let volume = sizer
            .max_affordable_volume(&existing, &template(), dec!(1000), &market())
            .unwrap();
        assert_eq!(volume, dec!(2));
    }

    #[test]
    fn test_max_affordable_volume_converts_currency() {
        let sizer = PositionSizer::default();
        let template = ExposureOrder::long(Symbol::forex("USD", "JPY"), dec!(150), dec!(1))
            .with_stop_loss(dec!(148));

        // 단위 손실 2 JPY = 0.02 USD → 20 / 0.02 = 1000
        let volume = sizer
            .max_affordable_volume(&[], &template, dec!(1000), &market())
            .unwrap();
        assert_eq!(volume, dec!(1000));
    }

    #[test]
    fn test_nothing_affordable() {
        let sizer = PositionSizer::default();
        let existing = vec![
            ExposureOrder::long(Symbol::crypto("BTC", "USD"), dec!(100), dec!(1))
                .with_stop_loss(dec!(80)),
        ];

        let volume = sizer
            .max_affordable_volume(&existing, &template(), dec!(1000), &market())
            .unwrap();
        assert_eq!(volume, Decimal::ZERO);
    }

    #[test]
    fn test_hedge_result_is_maximal() {
        let sizer = PositionSizer::default();
        let existing =
            vec![ExposureOrder::short(eurusd(), dec!(100), dec!(1)).with_stop_loss(dec!(104))];
        let gate = RiskGate::default();

        let volume = sizer
            .max_affordable_volume(&existing, &template(), dec!(1000), &market())
            .unwrap();
        assert!(volume > Decimal::ZERO);
        assert_eq!(volume % dec!(0.01), Decimal::ZERO);

        let at = gate
            .try_reserve(&existing, Some(&template().with_volume(volume)), dec!(1000), &market())
            .unwrap();
        let above = gate
            .try_reserve(
                &existing,
                Some(&template().with_volume(volume + dec!(0.01))),
                dec!(1000),
                &market(),
            )
            .unwrap();
        assert!(at.is_allowed());
        assert!(!above.is_allowed());
    }

    #[test]
    fn test_template_without_stop_is_unbounded() {
        let sizer = PositionSizer::default();
        let template = ExposureOrder::long(eurusd(), dec!(100), dec!(1));

        let err = sizer
            .max_affordable_volume(&[], &template, dec!(1000), &market())
            .unwrap_err();
        assert!(matches!(err, RiskError::UnboundedExposure { .. }));
    }
}
