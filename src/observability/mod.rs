//! 可观测性：tracing 订阅器初始化
//!
//! 默认级别取自 [log] level，RUST_LOG 优先；pretty 为 true 时使用多行可读格式。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("debug"))
}

pub fn init(level: &str, pretty: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    if pretty {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let filter = env_filter("not a [valid directive");
        assert!(!filter.to_string().is_empty());
    }
}
