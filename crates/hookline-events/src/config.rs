//! Events manager configuration.
//!
//! # Environment Variables
//!
//! - `HOOKLINE_ENABLE_PRIORITIES`: order listeners by priority (`true`/`1`)
//! - `HOOKLINE_COLLECT_RESPONSES`: keep listener responses (`true`/`1`)
//! - `HOOKLINE_DEFAULT_PRIORITY`: priority used by `attach` (integer)

/// Environment variable enabling priority mode.
pub const ENABLE_PRIORITIES_ENV: &str = "HOOKLINE_ENABLE_PRIORITIES";

/// Environment variable enabling response collection.
pub const COLLECT_RESPONSES_ENV: &str = "HOOKLINE_COLLECT_RESPONSES";

/// Environment variable overriding the default priority.
pub const DEFAULT_PRIORITY_ENV: &str = "HOOKLINE_DEFAULT_PRIORITY";

/// Priority given to listeners attached without one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Configuration for an [`EventsManager`](crate::EventsManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Order buckets by priority instead of insertion.
    pub enable_priorities: bool,
    /// Record listener responses for each fire.
    pub collect_responses: bool,
    /// Priority used by `attach`.
    pub default_priority: i32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            enable_priorities: false,
            collect_responses: false,
            default_priority: DEFAULT_PRIORITY,
        }
    }
}

impl ManagerConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from `HOOKLINE_*` environment variables.
    ///
    /// Missing or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            enable_priorities: lookup(ENABLE_PRIORITIES_ENV)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.enable_priorities),
            collect_responses: lookup(COLLECT_RESPONSES_ENV)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.collect_responses),
            default_priority: lookup(DEFAULT_PRIORITY_ENV)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.default_priority),
        }
    }

    /// Enables or disables priority ordering.
    pub fn with_priorities(mut self, enabled: bool) -> Self {
        self.enable_priorities = enabled;
        self
    }

    /// Enables or disables response collection.
    pub fn with_collect_responses(mut self, enabled: bool) -> Self {
        self.collect_responses = enabled;
        self
    }

    /// Sets the priority used by `attach`.
    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = priority;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
