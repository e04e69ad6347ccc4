use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "FOCUS_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "focus=debug,info"
    } else {
        "warn"
    }
}

/// Install the stderr subscriber. User-facing progress goes to stdout, so
/// diagnostics stay out of the way unless asked for.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
