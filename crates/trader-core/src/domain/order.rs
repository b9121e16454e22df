//! 주문 타입 및 관리.
//!
//! 이 모듈은 트레이딩 시스템의 주문 관련 타입을 정의합니다:
//! - `Side` - 주문 방향 (매수/매도)
//! - `OrderType` - 주문 유형 (시장가, 지정가, 역지정가)
//! - `OrderStatusType` - 주문 상태
//! - `OrderRequest` - 새 주문 요청 (손절/익절 가격 포함)
//! - `Order` - 제출된 주문 엔티티

use crate::types::{Price, Quantity, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 주문 방향 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수 (롱)
    Buy,
    /// 매도 (숏)
    Sell,
}

impl Side {
    /// 손익 계산에 쓰이는 부호 (롱 +1, 숏 -1).
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 주문 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// 시장가 주문 - 현재 시장 가격으로 즉시 체결
    Market,
    /// 지정가 주문 - 지정 가격 도달 시 체결
    Limit,
    /// 역지정가 주문 - 스톱 가격 돌파 시 체결
    Stop,
}

impl OrderType {
    /// 즉시 체결되지 않고 대기하는 주문 유형인지 확인합니다.
    pub fn is_pending_type(&self) -> bool {
        !matches!(self, OrderType::Market)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Stop => write!(f, "STOP"),
        }
    }
}

/// 주문 상태 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// 주문 생성됨 (아직 제출되지 않음)
    Pending,
    /// 브로커에 제출됨 (대기 중)
    Open,
    /// 부분 체결됨
    PartiallyFilled,
    /// 전량 체결됨
    Filled,
    /// 취소됨
    Cancelled,
    /// 거부됨
    Rejected,
}

impl OrderStatusType {
    /// 아직 체결을 기다리는 상태인지 확인합니다.
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            OrderStatusType::Pending | OrderStatusType::Open | OrderStatusType::PartiallyFilled
        )
    }
}

/// 새 주문 생성을 위한 주문 요청.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 주문 방향
    pub side: Side,
    /// 주문 유형
    pub order_type: OrderType,
    /// 거래 수량
    pub quantity: Quantity,
    /// 지정가 (지정가 주문에 필수)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// 스톱 가격 (역지정가 주문에 필수)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Price>,
    /// 체결 후 부착할 손절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Price>,
    /// 체결 후 부착할 익절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Price>,
    /// 클라이언트 주문 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    fn base(symbol: Symbol, side: Side, order_type: OrderType, quantity: Quantity) -> Self {
        Self {
            symbol,
            side,
            order_type,
            quantity,
            price: None,
            stop_price: None,
            stop_loss: None,
            take_profit: None,
            client_order_id: None,
        }
    }

    /// 시장가 매수 주문을 생성합니다.
    pub fn market_buy(symbol: Symbol, quantity: Quantity) -> Self {
        Self::base(symbol, Side::Buy, OrderType::Market, quantity)
    }

    /// 시장가 매도 주문을 생성합니다.
    pub fn market_sell(symbol: Symbol, quantity: Quantity) -> Self {
        Self::base(symbol, Side::Sell, OrderType::Market, quantity)
    }

    /// 지정가 매수 주문을 생성합니다.
    pub fn limit_buy(symbol: Symbol, quantity: Quantity, price: Price) -> Self {
        let mut request = Self::base(symbol, Side::Buy, OrderType::Limit, quantity);
        request.price = Some(price);
        request
    }

    /// 지정가 매도 주문을 생성합니다.
    pub fn limit_sell(symbol: Symbol, quantity: Quantity, price: Price) -> Self {
        let mut request = Self::base(symbol, Side::Sell, OrderType::Limit, quantity);
        request.price = Some(price);
        request
    }

    /// 역지정가 매수 주문을 생성합니다.
    pub fn stop_buy(symbol: Symbol, quantity: Quantity, stop_price: Price) -> Self {
        let mut request = Self::base(symbol, Side::Buy, OrderType::Stop, quantity);
        request.stop_price = Some(stop_price);
        request
    }

    /// 역지정가 매도 주문을 생성합니다.
    pub fn stop_sell(symbol: Symbol, quantity: Quantity, stop_price: Price) -> Self {
        let mut request = Self::base(symbol, Side::Sell, OrderType::Stop, quantity);
        request.stop_price = Some(stop_price);
        request
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

    /// 대기 주문이 체결되는 가격 (시장가 주문은 None).
    pub fn trigger_price(&self) -> Option<Price> {
        match self.order_type {
            OrderType::Market => None,
            OrderType::Limit => self.price,
            OrderType::Stop => self.stop_price,
        }
    }
}

/// 제출된 주문을 나타내는 주문 엔티티.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// 내부 주문 ID
    pub id: Uuid,
    /// 거래 심볼
    pub symbol: Symbol,
    /// 주문 방향
    pub side: Side,
    /// 주문 유형
    pub order_type: OrderType,
    /// 원래 수량
    pub quantity: Quantity,
    /// 지정가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// 스톱 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Price>,
    /// 손절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Price>,
    /// 익절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Price>,
    /// 현재 상태
    pub status: OrderStatusType,
    /// 체결된 수량
    pub filled_quantity: Quantity,
    /// 클라이언트 주문 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    /// 생성 타임스탬프
    pub created_at: DateTime<Utc>,
    /// 마지막 업데이트 타임스탬프
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 요청으로부터 새 주문을 생성합니다.
    pub fn from_request(request: OrderRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            symbol: request.symbol,
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            stop_price: request.stop_price,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
            status: OrderStatusType::Pending,
            filled_quantity: Decimal::ZERO,
            client_order_id: request.client_order_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// 브로커 접수 후 상태를 변경합니다.
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = status;
        self.updated_at = Utc::now();
        self
    }

    /// 남은 체결 수량을 반환합니다.
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// 주문이 아직 체결 대기 중인지 확인합니다.
    pub fn is_working(&self) -> bool {
        self.status.is_working()
    }

    /// 대기 주문이 체결되는 가격.
    pub fn trigger_price(&self) -> Option<Price> {
        match self.order_type {
            OrderType::Market => None,
            OrderType::Limit => self.price,
            OrderType::Stop => self.stop_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_with_bracket() {
        let symbol = Symbol::forex("EUR", "USD");
        let order = OrderRequest::limit_buy(symbol, dec!(10000), dec!(1.0850))
            .with_stop_loss(dec!(1.0800))
            .with_take_profit(dec!(1.0950));

        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.trigger_price(), Some(dec!(1.0850)));
        assert_eq!(order.stop_loss, Some(dec!(1.0800)));
        assert_eq!(order.take_profit, Some(dec!(1.0950)));
    }

    #[test]
    fn test_trigger_price_by_type() {
        let symbol = Symbol::crypto("BTC", "USDT");
        assert_eq!(OrderRequest::market_buy(symbol.clone(), dec!(1)).trigger_price(), None);
        assert_eq!(
            OrderRequest::stop_sell(symbol, dec!(1), dec!(48000)).trigger_price(),
            Some(dec!(48000))
        );
    }

    #[test]
    fn test_order_from_request() {
        let symbol = Symbol::crypto("ETH", "USDT");
        let request = OrderRequest::stop_buy(symbol, dec!(2), dec!(2100)).with_stop_loss(dec!(2000));
        let order = Order::from_request(request).with_status(OrderStatusType::Open);

        assert!(order.is_working());
        assert_eq!(order.trigger_price(), Some(dec!(2100)));
        assert_eq!(order.remaining_quantity(), dec!(2));
        assert_eq!(order.stop_loss, Some(dec!(2000)));
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Buy.sign(), dec!(1));
        assert_eq!(Side::Sell.sign(), dec!(-1));
    }
}
