use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RUST_LOG 優先，否則使用預設過濾條件
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_cli_logger(verbose: bool) {
    let filter = if verbose {
        env_filter("vocab_sync=debug,info")
    } else {
        env_filter("vocab_sync=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// 非互動環境（例如被其他程式呼叫）使用 JSON 輸出
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter("vocab_sync=info"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .json()
                .flatten_event(true),
        )
        .init();
}
