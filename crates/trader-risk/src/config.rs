//! 리스크 관리 설정.
//!
//! 허용 리스크 한도, 실현 손익 처리 정책, 최대 허용 수량 탐색을 위한
//! 설정 구조체를 정의합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 설정 파일에서 리스크 설정이 위치하는 섹션 이름.
pub const CONFIG_SECTION: &str = "risk";

/// 워크 도중 손절/익절로 청산된 주문의 손익을 다루는 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealizedPnlPolicy {
    /// 청산된 주문의 확정 손익을 이후 경로 평가에 상수로 누적
    #[default]
    CarryForward,
    /// 청산된 주문을 작업 집합에서 제거하고 손익도 버림
    Discard,
}

/// 전역 리스크 관리 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// 계좌 잔고 대비 허용 최대 리스크 비율 (기본값: 2%)
    #[serde(default = "default_max_risk_pct")]
    pub max_risk_pct: f64,

    /// 부동소수점 잡음을 흡수하기 위한 한도 비교 허용 오차 (계좌 통화)
    #[serde(default = "default_risk_tolerance")]
    pub risk_tolerance: Decimal,

    /// 청산된 주문의 실현 손익 처리 정책
    #[serde(default)]
    pub realized_pnl_policy: RealizedPnlPolicy,

    /// 최대 허용 수량 탐색의 수량 단위 (기본값: 0.01)
    #[serde(default = "default_volume_step")]
    pub volume_step: Decimal,

    /// 최대 허용 수량 탐색의 최대 반복 횟수 (기본값: 64)
    #[serde(default = "default_max_volume_search_steps")]
    pub max_volume_search_steps: u32,

    /// 심볼별 리스크 설정 (전역 설정을 재정의함)
    #[serde(default)]
    pub symbol_configs: HashMap<String, SymbolRiskConfig>,
}

/// 심볼별 리스크 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRiskConfig {
    /// 이 심볼 단독의 최대 리스크 비율 (전역 한도와 별도로 검사)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_risk_pct: Option<f64>,

    /// 이 심볼의 거래 활성화 여부 (기본값: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// 기본값 함수들
fn default_max_risk_pct() -> f64 {
    2.0
}

fn default_risk_tolerance() -> Decimal {
    Decimal::new(1, 8)
}

fn default_volume_step() -> Decimal {
    Decimal::new(1, 2)
}

fn default_max_volume_search_steps() -> u32 {
    64
}

fn default_true() -> bool {
    true
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_risk_pct: default_max_risk_pct(),
            risk_tolerance: default_risk_tolerance(),
            realized_pnl_policy: RealizedPnlPolicy::default(),
            volume_step: default_volume_step(),
            max_volume_search_steps: default_max_volume_search_steps(),
            symbol_configs: HashMap::new(),
        }
    }
}

impl Default for SymbolRiskConfig {
    fn default() -> Self {
        Self {
            max_risk_pct: None,
            enabled: true,
        }
    }
}

/// 정밀도를 위해 정수 연산으로 퍼센트를 비율로 변환.
/// 예시: pct_to_fraction(2.0) = 0.02
pub(crate) fn pct_to_fraction(pct: f64) -> Decimal {
    // 퍼센트의 소수점 4자리까지 지원
    let scaled_pct = (pct * 10000.0).round() as i64;
    Decimal::from(scaled_pct) / Decimal::from(1_000_000)
}

impl RiskConfig {
    /// 기본값으로 새 RiskConfig를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 보수적인 리스크 설정을 생성합니다 (낮은 한도).
    pub fn conservative() -> Self {
        Self {
            max_risk_pct: 1.0,
            ..Self::default()
        }
    }

    /// 공격적인 리스크 설정을 생성합니다 (높은 한도).
    pub fn aggressive() -> Self {
        Self {
            max_risk_pct: 5.0,
            ..Self::default()
        }
    }

    /// 설정 파일의 `[risk]` 섹션을 로드합니다 (`TRADER__RISK__*` 환경 변수 적용).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigValidationError> {
        let config: Self = trader_core::load_section(path, CONFIG_SECTION)
            .map_err(|e| ConfigValidationError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열의 `[risk]` 섹션을 로드합니다.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigValidationError> {
        let config: Self = trader_core::section_from_toml_str(toml, CONFIG_SECTION)
            .map_err(|e| ConfigValidationError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 전역 허용 리스크 비율 (0.02 = 2%).
    pub fn max_risk_fraction(&self) -> Decimal {
        pct_to_fraction(self.max_risk_pct)
    }

    /// 심볼 단독 한도가 설정되어 있으면 그 비율을 반환합니다.
    pub fn symbol_risk_fraction(&self, symbol: &str) -> Option<Decimal> {
        self.symbol_configs
            .get(symbol)
            .and_then(|c| c.max_risk_pct)
            .map(pct_to_fraction)
    }

    /// 심볼에 대해 거래가 활성화되어 있는지 확인합니다.
    pub fn is_symbol_enabled(&self, symbol: &str) -> bool {
        self.symbol_configs
            .get(symbol)
            .map(|c| c.enabled)
            .unwrap_or(true)
    }

    /// 심볼별 설정을 추가하거나 업데이트합니다.
    pub fn set_symbol_config(&mut self, symbol: impl Into<String>, config: SymbolRiskConfig) {
        self.symbol_configs.insert(symbol.into(), config);
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.max_risk_pct > 0.0 && self.max_risk_pct <= 100.0) {
            return Err(ConfigValidationError::InvalidValue(
                "max_risk_pct must be between 0 and 100".into(),
            ));
        }

        if self.risk_tolerance < Decimal::ZERO {
            return Err(ConfigValidationError::InvalidValue(
                "risk_tolerance must not be negative".into(),
            ));
        }

        if self.volume_step <= Decimal::ZERO {
            return Err(ConfigValidationError::InvalidValue(
                "volume_step must be greater than 0".into(),
            ));
        }

        if self.max_volume_search_steps == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "max_volume_search_steps must be greater than 0".into(),
            ));
        }

        for (symbol, symbol_config) in &self.symbol_configs {
            if let Some(pct) = symbol_config.max_risk_pct {
                if !(pct > 0.0 && pct <= 100.0) {
                    return Err(ConfigValidationError::InvalidValue(format!(
                        "max_risk_pct for {} must be between 0 and 100",
                        symbol
                    )));
                }
            }
        }

        Ok(())
    }
}

/// 설정 검증 오류.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Failed to load configuration: {0}")]
    Load(String),
}
