//! 심볼 및 시장 유형 정의.
//!
//! 이 모듈은 트레이딩 심볼 관련 타입을 정의합니다:
//! - `MarketType` - 시장 유형 (암호화폐, 주식, 외환, 선물)
//! - `Symbol` - 거래 가능한 상품을 나타내는 심볼
//!
//! 리스크 계산은 심볼 단위로 주문을 묶고, 호가 통화(`quote`)로
//! 계좌 통화 환산 비율을 찾습니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 시장 유형 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    /// 암호화폐 현물 시장
    Crypto,
    /// 주식 시장
    Stock,
    /// 외환 시장
    Forex,
    /// 선물/CFD 시장
    Futures,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketType::Crypto => write!(f, "crypto"),
            MarketType::Stock => write!(f, "stock"),
            MarketType::Forex => write!(f, "forex"),
            MarketType::Futures => write!(f, "futures"),
        }
    }
}

/// 거래 가능한 상품을 나타내는 트레이딩 심볼.
///
/// 심볼은 기준 자산, 호가 자산, 시장 유형으로 구성됩니다.
/// 예: 외환의 EUR/USD, 암호화폐의 BTC/USDT.
///
/// 손익은 항상 호가 자산 단위로 계산되므로 `quote`가 곧
/// 심볼의 호가 통화입니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 기준 자산 (예: BTC, EUR)
    pub base: String,
    /// 호가 자산 (예: USDT, USD, JPY)
    pub quote: String,
    /// 시장 유형
    pub market_type: MarketType,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>, market_type: MarketType) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
            market_type,
        }
    }

    /// 암호화폐 심볼을 생성합니다.
    pub fn crypto(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self::new(base, quote, MarketType::Crypto)
    }

    /// 주식 심볼을 생성합니다.
    pub fn stock(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self::new(base, quote, MarketType::Stock)
    }

    /// 외환 심볼을 생성합니다.
    pub fn forex(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self::new(base, quote, MarketType::Forex)
    }

    /// "BASE/QUOTE" 형식 문자열에서 심볼을 파싱합니다.
    pub fn parse(s: &str, market_type: MarketType) -> Option<Self> {
        let (base, quote) = s.split_once('/')?;
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return None;
        }
        Some(Self::new(base, quote, market_type))
    }

    /// 손익이 표시되는 호가 통화.
    pub fn quote_currency(&self) -> &str {
        &self.quote
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::forex("eur", "usd");
        assert_eq!(symbol.base, "EUR");
        assert_eq!(symbol.quote_currency(), "USD");
        assert_eq!(symbol.market_type, MarketType::Forex);
        assert_eq!(symbol.to_string(), "EUR/USD");
    }

    #[test]
    fn test_symbol_parse() {
        let symbol = Symbol::parse("ETH/USDT", MarketType::Crypto).unwrap();
        assert_eq!(symbol, Symbol::crypto("ETH", "USDT"));

        assert!(Symbol::parse("ETHUSDT", MarketType::Crypto).is_none());
        assert!(Symbol::parse("/USDT", MarketType::Crypto).is_none());
        assert!(Symbol::parse("A/B/C", MarketType::Crypto).is_none());
    }

    #[test]
    fn test_symbol_ordering_is_stable() {
        let mut symbols = vec![Symbol::forex("USD", "JPY"), Symbol::forex("EUR", "USD")];
        symbols.sort();
        assert_eq!(symbols[0].base, "EUR");
    }
}
