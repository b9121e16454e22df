//! 설정 관리.
//!
//! `config` 크레이트로 TOML 파일(또는 문자열)을 읽고, `TRADER__` 접두사
//! 환경 변수로 값을 덮어씁니다. 각 크레이트는 자신의 섹션만
//! [`load_section`]으로 꺼내 씁니다.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 환경 변수 오버라이드 접두사 (예: `TRADER__ACCOUNT__CURRENCY=EUR`).
pub const ENV_PREFIX: &str = "TRADER";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 계좌 설정
    #[serde(default)]
    pub account: AccountConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨 필터 (예: "info", "trader_risk=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// 파일명과 줄 번호 포함 여부
    #[serde(default = "default_true")]
    pub with_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            with_file: true,
        }
    }
}

/// 계좌 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    /// 잔고와 리스크 한도가 표시되는 계좌 통화
    #[serde(default = "default_account_currency")]
    pub currency: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            currency: default_account_currency(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_account_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// 이름 있는 섹션을 역직렬화합니다. 섹션이 없으면 기본값을 사용합니다.
fn extract_section<T>(config: &config::Config, section: &str) -> Result<T, config::ConfigError>
where
    T: DeserializeOwned + Default,
{
    match config.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => Ok(T::default()),
        Err(err) => Err(err),
    }
}

/// 파일과 환경 변수에서 섹션 하나를 로드합니다.
pub fn load_section<T, P>(path: P, section: &str) -> Result<T, config::ConfigError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let config = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .add_source(environment())
        .build()?;
    extract_section(&config, section)
}

/// TOML 문자열에서 섹션 하나를 로드합니다 (환경 변수 미적용).
pub fn section_from_toml_str<T>(toml: &str, section: &str) -> Result<T, config::ConfigError>
where
    T: DeserializeOwned + Default,
{
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;
    extract_section(&config, section)
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()?;
        config.try_deserialize()
    }

    /// TOML 문자열에서 설정을 로드합니다.
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        config.try_deserialize()
    }
}
