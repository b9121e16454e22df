//! 트레이딩 운영을 위한 도메인 모델.

mod order;
mod position;

pub use order::*;
pub use position::*;
