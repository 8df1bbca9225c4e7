//! Logging initialisation via tracing-subscriber.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins when it is set and valid; otherwise `level` is used as the
/// filter directive (a bare level such as `"debug"` or a full directive such
/// as `"ifcgraph_graph=debug,info"`).
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to set subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_parse() {
        for level in ["error", "warn", "info", "debug", "trace", "ifcgraph_graph=debug,info"] {
            assert!(EnvFilter::try_new(level).is_ok(), "{level}");
        }
    }

    #[test]
    fn test_second_init_fails() {
        // Whichever test gets here first owns the global subscriber.
        let _ = init("info");
        assert!(init("info").is_err());
    }
}
