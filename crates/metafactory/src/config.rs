//! Runtime configuration.
//!
//! A [`RuntimeConfig`] travels inside every [`Lookup`](crate::runtime::Lookup)
//! rather than living in a global, so two lookups in one process can resolve
//! under different rules.

use tracing::warn;

/// Environment variable for [`RuntimeConfig::access_override`].
pub const ACCESS_OVERRIDE_ENV: &str = "METAFACTORY_ACCESS_OVERRIDE";

/// Environment variable for [`RuntimeConfig::strict_boolean_prefix`].
pub const STRICT_BOOLEAN_PREFIX_ENV: &str = "METAFACTORY_STRICT_BOOLEAN_PREFIX";

/// Resolution and binding rules.
///
/// # Example
///
/// ```
/// use metafactory::RuntimeConfig;
///
/// let config = RuntimeConfig::new().with_access_override(false);
/// assert!(!config.access_override);
/// assert!(config.strict_boolean_prefix);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Let resolution, synthesis and reflective calls reach methods the
    /// lookup cannot access directly.
    pub access_override: bool,
    /// Accept `is<Name>` readers only when they return a boolean.
    pub strict_boolean_prefix: bool,
}

impl RuntimeConfig {
    /// The default rules: override allowed, strict `is` prefix.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            access_override: true,
            strict_boolean_prefix: true,
        }
    }

    /// Sets [`access_override`](Self::access_override).
    #[must_use]
    pub const fn with_access_override(mut self, enabled: bool) -> Self {
        self.access_override = enabled;
        self
    }

    /// Sets [`strict_boolean_prefix`](Self::strict_boolean_prefix).
    #[must_use]
    pub const fn with_strict_boolean_prefix(mut self, enabled: bool) -> Self {
        self.strict_boolean_prefix = enabled;
        self
    }

    /// Defaults overridden by `METAFACTORY_ACCESS_OVERRIDE` and
    /// `METAFACTORY_STRICT_BOOLEAN_PREFIX`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a caller-supplied source.
    #[must_use]
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();
        if let Some(raw) = get(ACCESS_OVERRIDE_ENV) {
            config.access_override = parse_flag(ACCESS_OVERRIDE_ENV, &raw, config.access_override);
        }
        if let Some(raw) = get(STRICT_BOOLEAN_PREFIX_ENV) {
            config.strict_boolean_prefix = parse_flag(
                STRICT_BOOLEAN_PREFIX_ENV,
                &raw,
                config.strict_boolean_prefix,
            );
        }
        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(key: &str, raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(
                key,
                value = raw,
                "unrecognised boolean, keeping default {default}"
            );
            default
        }
    }
}
