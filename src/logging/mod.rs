//! Logging helpers
//!
//! Builds `tracing` filter directives from [`LoggingConfig`](crate::config::LoggingConfig).
//! Per-attempt log lines themselves are written by
//! [`TracingSink`](crate::ping::TracingSink).

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
///
/// # Examples
///
/// ```
/// use keepalive::config::LoggingConfig;
/// use keepalive::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config
///     .component_levels
///     .insert("ping".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "info,keepalive::ping=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    for (component, level) in &config.component_levels {
        filter_str.push_str(&format!(",keepalive::{}={}", component, level));
    }

    filter_str
}
