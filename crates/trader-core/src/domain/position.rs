//! 포지션 추적.
//!
//! 이 모듈은 체결되어 열려 있는 포지션 타입 `Position`을 정의합니다.
//! 손절/익절 가격은 리스크 엔진이 최악 손실을 계산할 때 사용됩니다.

use crate::domain::Side;
use crate::types::{Price, Quantity, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 심볼의 보유량을 나타내는 트레이딩 포지션.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// 내부 포지션 ID
    pub id: Uuid,
    /// 거래 심볼
    pub symbol: Symbol,
    /// 포지션 방향 (롱 = Buy, 숏 = Sell)
    pub side: Side,
    /// 현재 보유 수량
    pub quantity: Quantity,
    /// 평균 진입 가격
    pub entry_price: Price,
    /// 현재 시장 가격
    pub current_price: Price,
    /// 손절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Price>,
    /// 익절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Price>,
    /// 미실현 손익 (호가 통화)
    pub unrealized_pnl: Decimal,
    /// 포지션 오픈 타임스탬프
    pub opened_at: DateTime<Utc>,
    /// 포지션 종료 타임스탬프 (오픈 상태면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// 새 포지션을 생성합니다.
    pub fn new(symbol: Symbol, side: Side, quantity: Quantity, entry_price: Price) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            side,
            quantity,
            entry_price,
            current_price: entry_price,
            stop_loss: None,
            take_profit: None,
            unrealized_pnl: Decimal::ZERO,
            opened_at: Utc::now(),
            closed_at: None,
        }
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

    /// 현재 가격을 업데이트하고 미실현 손익을 재계산합니다.
    pub fn update_price(&mut self, current_price: Price) {
        self.current_price = current_price;
        self.unrealized_pnl = self.side.sign() * (current_price - self.entry_price) * self.quantity;
    }

    /// 포지션이 오픈 상태인지 확인합니다.
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none() && self.quantity > Decimal::ZERO
    }

    /// 전체 포지션을 종료하고 실현 손익을 반환합니다.
    pub fn close(&mut self, price: Price) -> Decimal {
        self.update_price(price);
        let realized = self.unrealized_pnl;
        self.quantity = Decimal::ZERO;
        self.unrealized_pnl = Decimal::ZERO;
        self.closed_at = Some(Utc::now());
        realized
    }
}
