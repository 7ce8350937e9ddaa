use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,reel_saver=debug";

/// Initialize logging to stderr, honouring `RUST_LOG` when set.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
