//! Log output on stderr, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Initialize the logger. `RUST_LOG` wins when set; otherwise only warnings
/// are shown, or everything down to debug with `verbose`.
pub fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
