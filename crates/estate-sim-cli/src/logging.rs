use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Send diagnostics to stderr so stdout stays machine readable.
///
/// `RUST_LOG` wins when set; otherwise both crates log at `level`.
pub fn init(level: &str) {
    let default_filter = format!("estate_sim_core={level},esim={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init();
}
