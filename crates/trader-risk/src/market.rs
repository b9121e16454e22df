//! 리스크 계산에 필요한 시장 데이터 인터페이스.
//!
//! 시세 수집 계층은 이 크레이트 밖에 있습니다. 엔진은 [`MarketView`]를 통해
//! 심볼별 현재 가격과 호가 통화 → 계좌 통화 환산 비율만 조회합니다.

use crate::error::{RiskError, RiskResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trader_core::{Price, Symbol};

/// 심볼의 현재 매수/매도 호가.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// 매수 호가
    pub bid: Price,
    /// 매도 호가
    pub ask: Price,
}

impl Quote {
    /// 새 호가를 생성합니다.
    pub fn new(bid: Price, ask: Price) -> Self {
        Self { bid, ask }
    }

    /// 중간 가격.
    pub fn mid(&self) -> Price {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// 리스크 엔진이 소비하는 시장 데이터 스냅샷.
pub trait MarketView {
    /// 잔고와 리스크 한도가 표시되는 계좌 통화.
    fn account_currency(&self) -> &str;

    /// 심볼의 현재 호가.
    fn quote(&self, symbol: &Symbol) -> Option<Quote>;

    /// 통화 1단위를 계좌 통화로 환산하는 비율.
    fn conversion_rate(&self, currency: &str) -> Option<Decimal>;

    /// 워크 시작점으로 쓰는 현재 가격 (호가 중간값).
    fn current_price(&self, symbol: &Symbol) -> RiskResult<Price> {
        self.quote(symbol)
            .map(|q| q.mid())
            .ok_or_else(|| RiskError::MissingMarketData(format!("no quote for {}", symbol)))
    }

    /// 심볼의 호가 통화 → 계좌 통화 환산 비율.
    /// 호가 통화가 계좌 통화와 같으면 1입니다.
    fn quote_to_account_rate(&self, symbol: &Symbol) -> RiskResult<Decimal> {
        let quote_currency = symbol.quote_currency();
        if quote_currency.eq_ignore_ascii_case(self.account_currency()) {
            return Ok(Decimal::ONE);
        }
        self.conversion_rate(quote_currency).ok_or_else(|| {
            RiskError::MissingMarketData(format!(
                "no {} -> {} conversion rate for {}",
                quote_currency,
                self.account_currency(),
                symbol
            ))
        })
    }
}

/// 메모리 내 시장 데이터 스냅샷.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    account_currency: String,
    quotes: HashMap<Symbol, Quote>,
    rates: HashMap<String, Decimal>,
}

impl MarketSnapshot {
    /// 주어진 계좌 통화로 빈 스냅샷을 생성합니다.
    pub fn new(account_currency: impl Into<String>) -> Self {
        Self {
            account_currency: account_currency.into().to_uppercase(),
            quotes: HashMap::new(),
            rates: HashMap::new(),
        }
    }

    /// 호가를 추가합니다.
    pub fn with_quote(mut self, symbol: Symbol, bid: Price, ask: Price) -> Self {
        self.set_quote(symbol, Quote::new(bid, ask));
        self
    }

    /// 매수/매도 호가가 같은 가격을 추가합니다.
    pub fn with_price(self, symbol: Symbol, price: Price) -> Self {
        self.with_quote(symbol, price, price)
    }

    /// 환산 비율을 추가합니다.
    pub fn with_rate(mut self, currency: impl Into<String>, rate: Decimal) -> Self {
        self.set_rate(currency, rate);
        self
    }

    /// 호가를 갱신합니다.
    pub fn set_quote(&mut self, symbol: Symbol, quote: Quote) {
        self.quotes.insert(symbol, quote);
    }

    /// 환산 비율을 갱신합니다.
    pub fn set_rate(&mut self, currency: impl Into<String>, rate: Decimal) {
        self.rates.insert(currency.into().to_uppercase(), rate);
    }
}

impl MarketView for MarketSnapshot {
    fn account_currency(&self) -> &str {
        &self.account_currency
    }

    fn quote(&self, symbol: &Symbol) -> Option<Quote> {
        self.quotes.get(symbol).copied()
    }

    fn conversion_rate(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(&currency.to_uppercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_current_price_is_mid() {
        let symbol = Symbol::forex("EUR", "USD");
        let market = MarketSnapshot::new("USD").with_quote(symbol.clone(), dec!(1.0998), dec!(1.1002));

        assert_eq!(market.current_price(&symbol).unwrap(), dec!(1.1000));
    }

    #[test]
    fn test_missing_quote() {
        let market = MarketSnapshot::new("USD");
        let err = market.current_price(&Symbol::forex("EUR", "USD")).unwrap_err();
        assert!(matches!(err, RiskError::MissingMarketData(_)));
    }

    #[test]
    fn test_quote_to_account_rate() {
        let market = MarketSnapshot::new("usd").with_rate("JPY", dec!(0.0067));

        assert_eq!(
            market.quote_to_account_rate(&Symbol::forex("EUR", "USD")).unwrap(),
            dec!(1)
        );
        assert_eq!(
            market.quote_to_account_rate(&Symbol::forex("USD", "JPY")).unwrap(),
            dec!(0.0067)
        );
        assert!(market
            .quote_to_account_rate(&Symbol::forex("EUR", "GBP"))
            .is_err());
    }
}
