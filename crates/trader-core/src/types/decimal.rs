//! 정밀한 금융 계산을 위한 Decimal 유틸리티.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 주문 수량을 위한 타입.
pub type Quantity = Decimal;

/// 퍼센트 타입 (1 = 1%).
pub type Percentage = Decimal;

/// 0으로 나누는 경우 0을 반환하는 나눗셈.
///
/// 잔고가 0인 계좌의 리스크 비율처럼 분모가 0일 수 있는 계산에서
/// NaN/무한대 대신 정의된 값을 돌려줍니다.
pub fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// `whole` 대비 `part`의 백분율 (분모가 0이면 0).
pub fn percentage_of(part: Decimal, whole: Decimal) -> Percentage {
    safe_ratio(part, whole) * Decimal::ONE_HUNDRED
}

/// `value`를 `step`의 배수로 내림합니다. `step`이 0 이하이면 그대로 반환합니다.
pub fn floor_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    (value / step).floor() * step
}

/// 통화가 포함된 금액.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// 금액
    pub amount: Decimal,
    /// 통화
    pub currency: String,
}

impl Money {
    /// 새 금액을 생성합니다.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().to_uppercase(),
        }
    }

    /// 해당 통화의 0 금액.
    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_safe_ratio_zero_denominator() {
        assert_eq!(safe_ratio(dec!(25), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_ratio(dec!(25), dec!(1000)), dec!(0.025));
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(dec!(25), dec!(1000)), dec!(2.5));
        assert_eq!(percentage_of(dec!(25), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_floor_to_step() {
        assert_eq!(floor_to_step(dec!(1.237), dec!(0.01)), dec!(1.23));
        assert_eq!(floor_to_step(dec!(1.237), Decimal::ZERO), dec!(1.237));
    }

    #[test]
    fn test_money() {
        let m = Money::new(dec!(1000.50), "usd");
        assert_eq!(m.to_string(), "1000.50 USD");
        assert_eq!(Money::zero("eur").amount, Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn test_floor_to_step_is_aligned(millis in 0i64..10_000_000, step_cents in 1i64..1_000) {
            let value = Decimal::new(millis, 3);
            let step = Decimal::new(step_cents, 2);
            let floored = floor_to_step(value, step);

            prop_assert!(floored <= value);
            prop_assert!(value - floored < step);
            prop_assert_eq!(floored % step, Decimal::ZERO);
        }
    }
}
