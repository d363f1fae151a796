use crate::env::{
    env_opt, parse_bool, parse_usize, FLUENT_HOOK_MAX_DEPTH_ENV, FLUENT_HOOK_TAG_NAME_ENV,
    FLUENT_HOOK_USE_ESCAPE_HATCH_ENV,
};
use crate::error::ConfigError;

/// Tag namespace used when none is configured.
pub const DEFAULT_TAG_NAME: &str = "fluent";

/// Nesting depth after which values are replaced by `Null`.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Settings for a single [`convert`](crate::convert::convert) call.
///
/// **Fields**
/// - `tag_name`: which struct tag namespace supplies output names and
///   options (`fluent:"name,omitempty"`).
/// - `use_escape_hatch`: when `true`, values whose type implements
///   [`Marshaler`](crate::marshal::Marshaler) are passed through as-is.
/// - `max_depth`: recursion bound; deeper values convert to `Null`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionConfig {
    pub tag_name: String,
    pub use_escape_hatch: bool,
    pub max_depth: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tag_name: DEFAULT_TAG_NAME.to_string(),
            use_escape_hatch: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConversionConfig {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Self::default()
        }
    }

    pub fn with_tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    pub fn with_escape_hatch(mut self, enabled: bool) -> Self {
        self.use_escape_hatch = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Check that the tag name can appear as a key in a struct tag and that
    /// the depth bound allows at least one level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tag_name.is_empty() {
            return Err(ConfigError::EmptyTagName);
        }
        let bad = self
            .tag_name
            .chars()
            .any(|c| c == ' ' || c == ':' || c == '"' || c.is_control());
        if bad {
            return Err(ConfigError::InvalidTagName(self.tag_name.clone()));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        Ok(())
    }

    /// Build a config from `FLUENT_HOOK_*` environment variables, falling
    /// back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(tag_name) = env_opt(FLUENT_HOOK_TAG_NAME_ENV) {
            config.tag_name = tag_name;
        }
        if let Some(raw) = env_opt(FLUENT_HOOK_USE_ESCAPE_HATCH_ENV) {
            config.use_escape_hatch = parse_bool(FLUENT_HOOK_USE_ESCAPE_HATCH_ENV, &raw)?;
        }
        if let Some(raw) = env_opt(FLUENT_HOOK_MAX_DEPTH_ENV) {
            config.max_depth = parse_usize(FLUENT_HOOK_MAX_DEPTH_ENV, &raw)?;
        }
        config.validate()?;
        Ok(config)
    }
}
