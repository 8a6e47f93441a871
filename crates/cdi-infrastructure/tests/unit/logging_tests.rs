//! Unit tests for logging setup

#[cfg(test)]
mod tests {
    use cdi_domain::Error;
    use cdi_infrastructure::logging::{LoggingConfig, init_logging, parse_log_level};
    use tracing::Level;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace").expect("valid"), Level::TRACE);
        assert_eq!(parse_log_level("DEBUG").expect("valid"), Level::DEBUG);
        assert_eq!(parse_log_level("warning").expect("valid"), Level::WARN);
        assert!(matches!(
            parse_log_level("verbose"),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_invalid_level_fails_before_installing() {
        let config = LoggingConfig {
            level: "verbose".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_second_initialization_fails() {
        let config = LoggingConfig::default();
        // Only this test installs a subscriber in this binary
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(Error::Configuration { .. })
        ));
    }
}
