use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stdout subscriber for hosts that do not bring their own.
/// Returns `false` if a global subscriber was already set.
pub fn init_tracing(log_level: &str) -> bool {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .is_ok()
}

/// `RUST_LOG` when set, `info` otherwise.
pub fn log_level_from_env() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}
