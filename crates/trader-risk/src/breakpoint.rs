//! 브레이크포인트 탐색.
//!
//! 브레이크포인트는 주문의 손익 함수가 꺾이는 가격입니다: 손절, 익절,
//! 또는 대기 주문의 트리거 가격. 저장되지 않고 현재 작업 상태에서 매번
//! 다시 계산됩니다.

use crate::order::{ExposureOrder, PriceDirection};
use rust_decimal::Decimal;
use trader_core::Price;

/// 워크 도중 주문 하나의 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegState {
    /// 트리거 대기 중 (손익 0)
    Pending,
    /// 체결됨 (손익 선형)
    Active,
    /// 손절/익절로 청산됨 (작업 집합에서 제외)
    Closed,
}

impl LegState {
    /// 주문의 초기 상태.
    pub fn initial(order: &ExposureOrder) -> Self {
        if order.active {
            LegState::Active
        } else {
            LegState::Pending
        }
    }
}

/// 브레이크포인트 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakpointKind {
    StopLoss,
    TakeProfit,
    /// 대기 주문의 체결 가격
    Trigger,
}

/// 특정 주문이 만드는 다음 꺾임점.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    /// 작업 집합 내 주문 인덱스
    pub order_index: usize,
    /// 꺾임 가격
    pub price: Price,
    pub kind: BreakpointKind,
}

/// `price`에서 `direction` 방향으로 가장 가까운 브레이크포인트를 찾습니다.
///
/// 청산된 주문은 건너뜁니다. 거리가 같으면 인덱스가 작은 주문이 선택됩니다.
pub fn next_breakpoint(
    orders: &[ExposureOrder],
    states: &[LegState],
    price: Price,
    direction: PriceDirection,
) -> Option<Breakpoint> {
    let mut nearest: Option<(Decimal, Breakpoint)> = None;

    for (index, (order, state)) in orders.iter().zip(states).enumerate() {
        let active = match state {
            LegState::Closed => continue,
            LegState::Active => true,
            LegState::Pending => false,
        };

        let Some((distance, kind)) = order.next_event(price, direction, active) else {
            continue;
        };

        if nearest.as_ref().map_or(true, |(best, _)| distance < *best) {
            let level = match direction {
                PriceDirection::Up => price + distance,
                PriceDirection::Down => price - distance,
            };
            nearest = Some((
                distance,
                Breakpoint {
                    order_index: index,
                    price: level,
                    kind,
                },
            ));
        }
    }

    nearest.map(|(_, breakpoint)| breakpoint)
}
