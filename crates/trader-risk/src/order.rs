//! 리스크 계산용으로 정규화된 주문.
//!
//! 열린 포지션, 대기 주문, 가상의 신규 주문은 모두 [`ExposureOrder`] 하나로
//! 변환되어 같은 방식으로 평가됩니다. 변환은 소스별 어댑터
//! ([`ExposureOrder::from_position`], [`ExposureOrder::from_pending`],
//! [`ExposureOrder::from_request`])가 담당하며, 어댑터는 주문 불변식을 검증합니다.

use crate::breakpoint::BreakpointKind;
use crate::error::{RiskError, RiskResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{Order, OrderRequest, Position, Price, Quantity, Side, Symbol};
use uuid::Uuid;

/// 가격 탐색 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceDirection {
    /// 가격 상승
    Up,
    /// 가격 하락
    Down,
}

impl PriceDirection {
    /// 양방향을 고정된 순서로 반환합니다.
    pub const BOTH: [PriceDirection; 2] = [PriceDirection::Up, PriceDirection::Down];

    /// `level`이 `price`에서 이 방향에 있는지 확인합니다 (같은 가격은 양방향 모두 포함).
    pub fn contains(&self, price: Price, level: Price) -> bool {
        match self {
            PriceDirection::Up => level >= price,
            PriceDirection::Down => level <= price,
        }
    }
}

/// 정규화된 주문이 어디서 왔는지 나타내는 태그.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderSource {
    /// 체결된 포지션
    Position { id: Uuid },
    /// 체결 대기 주문
    Pending { id: Uuid },
    /// 아직 제출되지 않은 가상 주문
    Hypothetical,
}

/// 포지션/대기 주문/가상 주문의 리스크 평가용 정규화 뷰.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureOrder {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 방향 (롱 = Buy, 숏 = Sell)
    pub direction: Side,
    /// 체결 가격 (포지션) 또는 트리거 가격 (대기 주문)
    pub entry_price: Price,
    /// 손절 가격
    pub stop_loss: Option<Price>,
    /// 익절 가격
    pub take_profit: Option<Price>,
    /// 수량
    pub volume: Quantity,
    /// 체결 여부 (false = 트리거 대기 중)
    pub active: bool,
    /// 변환 출처
    pub source: OrderSource,
}

impl ExposureOrder {
    /// 활성 상태의 가상 주문을 생성합니다. 불변식은 [`validate`](Self::validate)로 검사합니다.
    pub fn new(symbol: Symbol, direction: Side, entry_price: Price, volume: Quantity) -> Self {
        Self {
            symbol,
            direction,
            entry_price,
            stop_loss: None,
            take_profit: None,
            volume,
            active: true,
            source: OrderSource::Hypothetical,
        }
    }

    /// 롱 주문 생성 단축 함수.
    pub fn long(symbol: Symbol, entry_price: Price, volume: Quantity) -> Self {
        Self::new(symbol, Side::Buy, entry_price, volume)
    }

    /// 숏 주문 생성 단축 함수.
    pub fn short(symbol: Symbol, entry_price: Price, volume: Quantity) -> Self {
        Self::new(symbol, Side::Sell, entry_price, volume)
    }

    /// 손절 가격을 설정합니다.
    pub fn with_stop_loss(mut self, stop_loss: Price) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    /// 익절 가격을 설정합니다.
    pub fn with_take_profit(mut self, take_profit: Price) -> Self {
        self.take_profit = Some(take_profit);
        self
    }

    /// 트리거 대기 상태로 바꿉니다.
    pub fn pending(mut self) -> Self {
        self.active = false;
        self
    }

    /// 수량을 바꾼 복사본.
    pub fn with_volume(&self, volume: Quantity) -> Self {
        let mut order = self.clone();
        order.volume = volume;
        order
    }

    // ==================== Adapters ====================

    /// 열린 포지션을 활성 주문으로 변환합니다.
    pub fn from_position(position: &Position) -> RiskResult<Self> {
        let order = Self {
            symbol: position.symbol.clone(),
            direction: position.side,
            entry_price: position.entry_price,
            stop_loss: position.stop_loss,
            take_profit: position.take_profit,
            volume: position.quantity,
            active: true,
            source: OrderSource::Position { id: position.id },
        };
        order.validate()?;
        Ok(order)
    }

    /// 체결 대기 주문을 비활성 주문으로 변환합니다. 남은 수량만 반영합니다.
    pub fn from_pending(pending: &Order) -> RiskResult<Self> {
        let trigger = pending.trigger_price().ok_or_else(|| {
            RiskError::invalid(format!(
                "pending {} order {} has no trigger price",
                pending.order_type, pending.id
            ))
        })?;
        let order = Self {
            symbol: pending.symbol.clone(),
            direction: pending.side,
            entry_price: trigger,
            stop_loss: pending.stop_loss,
            take_profit: pending.take_profit,
            volume: pending.remaining_quantity(),
            active: false,
            source: OrderSource::Pending { id: pending.id },
        };
        order.validate()?;
        Ok(order)
    }

    /// 아직 제출되지 않은 주문 요청을 가상 주문으로 변환합니다.
    ///
    /// 시장가 주문은 `market_price`에 즉시 체결된 활성 주문이 되고,
    /// 지정가/역지정가 주문은 트리거 가격의 대기 주문이 됩니다.
    pub fn from_request(request: &OrderRequest, market_price: Option<Price>) -> RiskResult<Self> {
        let (entry_price, active) = if request.order_type.is_pending_type() {
            let trigger = request.trigger_price().ok_or_else(|| {
                RiskError::invalid(format!(
                    "{} order for {} has no trigger price",
                    request.order_type, request.symbol
                ))
            })?;
            (trigger, false)
        } else {
            let price = market_price.ok_or_else(|| {
                RiskError::invalid(format!(
                    "market order for {} has no entry price",
                    request.symbol
                ))
            })?;
            (price, true)
        };

        let order = Self {
            symbol: request.symbol.clone(),
            direction: request.side,
            entry_price,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
            volume: request.quantity,
            active,
            source: OrderSource::Hypothetical,
        };
        order.validate()?;
        Ok(order)
    }

    /// 주문 불변식을 검사합니다.
    ///
    /// - 수량과 진입 가격은 양수
    /// - 손절은 진입가의 손실 방향, 익절은 이익 방향
    pub fn validate(&self) -> RiskResult<()> {
        if self.volume <= Decimal::ZERO {
            return Err(RiskError::invalid(format!(
                "volume must be positive for {} (got {})",
                self.symbol, self.volume
            )));
        }

        if self.entry_price <= Decimal::ZERO {
            return Err(RiskError::invalid(format!(
                "entry price must be positive for {} (got {})",
                self.symbol, self.entry_price
            )));
        }

        let sign = self.direction.sign();
        if let Some(sl) = self.stop_loss {
            if sign * (sl - self.entry_price) >= Decimal::ZERO {
                return Err(RiskError::invalid(format!(
                    "stop-loss {} is not on the losing side of {} entry {}",
                    sl, self.direction, self.entry_price
                )));
            }
        }
        if let Some(tp) = self.take_profit {
            if sign * (tp - self.entry_price) <= Decimal::ZERO {
                return Err(RiskError::invalid(format!(
                    "take-profit {} is not on the winning side of {} entry {}",
                    tp, self.direction, self.entry_price
                )));
            }
        }

        Ok(())
    }

    // ==================== Valuation ====================

    /// 체결 상태일 때 가격에 대한 손익 기울기 (방향 × 수량).
    pub fn slope(&self) -> Decimal {
        self.direction.sign() * self.volume
    }

    /// 손절 도달 시 손실 크기 `|entry - sl| * volume` (호가 통화).
    pub fn stop_loss_risk(&self) -> Option<Decimal> {
        self.stop_loss
            .map(|sl| (self.entry_price - sl).abs() * self.volume)
    }

    /// 주문이 `price`에서 평가될 때의 손익 (호가 통화).
    ///
    /// 대기 주문은 트리거 전이므로 0입니다. `clip_to_sl`/`clip_to_tp`가 켜져 있으면
    /// 손절/익절 가격을 넘어선 구간의 손익을 해당 가격의 손익으로 고정합니다.
    /// 손절/익절 가격 자체에서는 고정 여부와 관계없이 값이 같습니다.
    pub fn value_at(&self, price: Price, clip_to_sl: bool, clip_to_tp: bool) -> Decimal {
        if !self.active {
            return Decimal::ZERO;
        }
        self.payoff(price, clip_to_sl, clip_to_tp)
    }

    /// 체결되었다고 가정한 손익. 워커가 자체 상태로 활성 여부를 관리할 때 사용합니다.
    pub(crate) fn payoff(&self, price: Price, clip_to_sl: bool, clip_to_tp: bool) -> Decimal {
        let sign = self.direction.sign();
        let mut exit = price;

        if clip_to_sl {
            if let Some(sl) = self.stop_loss {
                if sign * (price - sl) < Decimal::ZERO {
                    exit = sl;
                }
            }
        }
        if clip_to_tp {
            if let Some(tp) = self.take_profit {
                if sign * (price - tp) > Decimal::ZERO {
                    exit = tp;
                }
            }
        }

        sign * (exit - self.entry_price) * self.volume
    }

    /// `price`가 이미 지나친 손절 또는 익절 가격.
    ///
    /// 가격이 정확히 손절/익절 위에 있으면 아직 지나치지 않은 것으로 봅니다.
    pub fn crossed_exit(&self, price: Price) -> Option<Price> {
        let sign = self.direction.sign();
        self.stop_loss
            .filter(|sl| sign * (price - *sl) < Decimal::ZERO)
            .or_else(|| {
                self.take_profit
                    .filter(|tp| sign * (price - *tp) > Decimal::ZERO)
            })
    }

    /// `price`에서 `direction` 방향으로 가장 가까운 이벤트까지의 거리.
    ///
    /// 활성 주문은 손절/익절, 대기 주문은 트리거 가격이 이벤트입니다.
    /// 해당 방향에 이벤트가 없으면 `None` (+무한대)입니다.
    pub fn distance_to_next_event(&self, price: Price, direction: PriceDirection) -> Option<Decimal> {
        self.next_event(price, direction, self.active)
            .map(|(distance, _)| distance)
    }

    /// 주어진 체결 상태에서 다음 이벤트의 거리와 종류.
    pub(crate) fn next_event(
        &self,
        price: Price,
        direction: PriceDirection,
        active: bool,
    ) -> Option<(Decimal, BreakpointKind)> {
        let levels: [Option<(Price, BreakpointKind)>; 2] = if active {
            [
                self.stop_loss.map(|l| (l, BreakpointKind::StopLoss)),
                self.take_profit.map(|l| (l, BreakpointKind::TakeProfit)),
            ]
        } else {
            [Some((self.entry_price, BreakpointKind::Trigger)), None]
        };

        levels
            .into_iter()
            .flatten()
            .filter(|(level, _)| direction.contains(price, *level))
            .map(|(level, kind)| ((level - price).abs(), kind))
            .min_by(|a, b| a.0.cmp(&b.0))
    }
}
