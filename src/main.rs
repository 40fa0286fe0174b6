//! instinct - session observation and instinct mining for coding-assistant hooks

use instinct::cli;

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout is reserved for the hook
    // pass-through channel. INFO by default so the analysis process
    // reports its progress (use RUST_LOG to adjust).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    cli::run()
}
