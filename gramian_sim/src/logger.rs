// gramian_sim/src/logger.rs

//! Logging setup shared by the `gramian-sim` binary and anything embedding the driver.

use tracing::Level;

/// Initialize the tracing subscriber with the default INFO level.
///
/// The level is overridable through `RUST_LOG`, e.g.
/// `RUST_LOG=gramian_core=debug gramian-sim dynamic` logs every frame Gramian.
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a custom default level (still overridable
/// through `RUST_LOG`). Calling it a second time is a no-op.
pub fn init_logger_with_level(default_level: Level) {
    use tracing_subscriber::fmt::time::SystemTime;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_timer(SystemTime)
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}
