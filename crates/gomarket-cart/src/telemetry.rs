//! Tracing setup for hosts embedding the cart.

use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor configuration says otherwise.
pub const DEFAULT_FILTER: &str = "info,gomarket=debug,sqlx=warn";

/// Installs a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (usually [`crate::config::LoggingSettings::filter`]).
///
/// Returns `false` if a global subscriber was already installed, which
/// leaves the existing one in place.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_tracing(DEFAULT_FILTER);
        assert!(!init_tracing("debug"));
    }

    #[test]
    fn test_default_matches_config() {
        assert_eq!(
            crate::config::LoggingSettings::default().filter,
            DEFAULT_FILTER
        );
    }
}
