/// Initialize structured logging with tracing.
/// This should be called once at application startup.
pub fn init_logging() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json(), // JSON output for structured logging
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // A subscriber was already installed (e.g. by the test harness).
        tracing::debug!("Global tracing subscriber already set");
        return;
    }

    tracing::info!("Structured logging initialized");
}
