//! # Trader Core
//!
//! 리스크 엔진이 사용하는 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 트레이딩 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 주문 및 주문 요청 타입
//! - 포지션 추적
//! - 심볼 및 시장 유형 정의
//! - 가격/수량 타입과 안전한 비율 계산
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
