//! tracing 구독자 초기화.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 필터 환경 변수가 없을 때의 기본 수준
pub const DEFAULT_FILTER: &str = "info";

/// `RUST_LOG`를 따르는 로그 필터를 만든다. 비었거나 잘못되었으면 `fallback`.
pub fn filter_from_env(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// 표준 오류로 로그를 내보낸다. 이미 초기화되었으면 조용히 넘어간다.
///
/// CLI 출력(표준 출력)과 섞이지 않도록 stderr를 쓴다.
pub fn init(fallback: &str) {
    let result = tracing_subscriber::registry()
        .with(filter_from_env(fallback))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init("warn");
        init("debug");
        tracing::info!("still logging");
    }
}
