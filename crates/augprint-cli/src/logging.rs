use tracing::metadata::Level;
use tracing_subscriber::filter::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` wins over the flag-derived
/// level when it parses.
pub fn setup_logging(verbose: bool, debug: bool) {
    let level = if debug {
        Level::DEBUG
    } else if verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let default_filter = || EnvFilter::builder().with_default_directive(level.into()).parse_lossy("");
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.is_empty() => match EnvFilter::try_new(&directive) {
            Ok(filter) => filter,
            Err(err) => {
                eprintln!("invalid log filter: {err}");
                default_filter()
            }
        },
        _ => default_filter(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
