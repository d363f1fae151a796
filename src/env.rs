//! Environment variable names used by this crate for convenient
//! configuration of the hook from microservices.
//!
//! These are purely helpers; the conversion engine itself never reads the
//! environment.

use crate::error::ConfigError;

/// Tag namespace that supplies field names and options, e.g. `fluent`.
pub const FLUENT_HOOK_TAG_NAME_ENV: &str = "FLUENT_HOOK_TAG_NAME";

/// `true`/`false`: pass values implementing `Marshaler` through untouched.
pub const FLUENT_HOOK_USE_ESCAPE_HATCH_ENV: &str = "FLUENT_HOOK_USE_ESCAPE_HATCH";

/// Maximum nesting depth the converter descends into.
pub const FLUENT_HOOK_MAX_DEPTH_ENV: &str = "FLUENT_HOOK_MAX_DEPTH";

/// Optional logical service name attached to every record.
pub const FLUENT_HOOK_SERVICE_NAME_ENV: &str = "FLUENT_HOOK_SERVICE_NAME";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional environment variable, treating an empty value as unset.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

pub(crate) fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_boolean_spellings() {
        assert_eq!(parse_bool("K", "TRUE"), Ok(true));
        assert_eq!(parse_bool("K", "on"), Ok(true));
        assert_eq!(parse_bool("K", "0"), Ok(false));
        assert!(matches!(parse_bool("K", "maybe"), Err(ConfigError::InvalidBool { .. })));
    }

    #[test]
    fn rejects_non_numeric_depth() {
        assert_eq!(parse_usize("K", " 12 "), Ok(12));
        assert!(matches!(parse_usize("K", "-1"), Err(ConfigError::InvalidInteger { .. })));
    }
}
