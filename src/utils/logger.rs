use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("keiba_etl=debug,info")
        } else {
            EnvFilter::new("keiba_etl=info")
        }
    })
}

/// `--verbose` 至少提升到 debug，設定檔已是 trace 時維持不變
fn effective_level(verbose: bool, level: &str) -> &str {
    match level {
        "error" | "warn" | "info" if verbose => "debug",
        _ => level,
    }
}

/// `level` 來自設定檔時優先於預設值，但仍會被 RUST_LOG 覆蓋
pub fn init_cli_logger_with_level(verbose: bool, level: Option<&str>) {
    let filter = match level {
        Some(level) if std::env::var("RUST_LOG").is_err() => {
            EnvFilter::new(format!("keiba_etl={}", effective_level(verbose, level)))
        }
        _ => default_filter(verbose),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_cli_logger(verbose: bool) {
    init_cli_logger_with_level(verbose, None);
}

pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(default_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
