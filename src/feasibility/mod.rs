//! 대지 개발 사업성 계산 모듈 모음.
//! 입력값 → 결과 계산, 게이지/위험도 지표, 입력 문자열 해석으로 구성한다.

pub mod calculator;
pub mod indicators;
pub mod input;

pub use calculator::*;
pub use indicators::*;
pub use input::*;
