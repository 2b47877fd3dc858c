use serde::Deserialize;
use snafu::prelude::*;

use crate::scope::ScopeKind;
use crate::wiring::WiringMode;

/// Container-wide settings read by every part of the container.
///
/// Setters validate their input, so an invalid default is rejected at
/// configuration time rather than on the first bean creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerConfig {
    default_scope: ScopeKind,
    default_wiring_mode: WiringMode,
    detect_duplicated_bean_names: bool,
    default_init_methods: bool,
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self {
            default_scope: ScopeKind::Singleton,
            default_wiring_mode: WiringMode::Strict,
            detect_duplicated_bean_names: false,
            default_init_methods: true,
        }
    }

    /// Loads a configuration from a TOML document. Missing keys keep their
    /// default values.
    ///
    /// ```toml
    /// default_scope = "prototype"
    /// default_wiring_mode = "optional"
    /// detect_duplicated_bean_names = true
    /// default_init_methods = false
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or names a placeholder
    /// as a default.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let raw: RawContainerConfig =
            toml::from_str(source).map_err(|source| ConfigError::Parse { source })?;

        let mut config = Self::new();
        if let Some(scope) = raw.default_scope {
            config.set_default_scope(scope)?;
        }
        if let Some(mode) = raw.default_wiring_mode {
            config.set_default_wiring_mode(mode)?;
        }
        if let Some(detect) = raw.detect_duplicated_bean_names {
            config.set_detect_duplicated_bean_names(detect);
        }
        if let Some(init) = raw.default_init_methods {
            config.set_default_init_methods(init);
        }
        Ok(config)
    }

    pub fn default_scope(&self) -> ScopeKind {
        self.default_scope
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefaultScope`] if `scope` is the
    /// placeholder [`ScopeKind::Default`].
    pub fn set_default_scope(&mut self, scope: ScopeKind) -> Result<(), ConfigError> {
        ensure!(!scope.is_placeholder(), InvalidDefaultScopeSnafu { scope });
        self.default_scope = scope;
        Ok(())
    }

    pub fn default_wiring_mode(&self) -> WiringMode {
        self.default_wiring_mode
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefaultWiringMode`] if `mode` is the
    /// placeholder [`WiringMode::Default`].
    pub fn set_default_wiring_mode(&mut self, mode: WiringMode) -> Result<(), ConfigError> {
        ensure!(!mode.is_placeholder(), InvalidDefaultWiringModeSnafu { mode });
        self.default_wiring_mode = mode;
        Ok(())
    }

    /// Substitutes a placeholder wiring mode with the default one.
    pub fn resolve_wiring_mode(&self, mode: WiringMode) -> WiringMode {
        mode.resolve(self.default_wiring_mode)
    }

    /// Substitutes a placeholder scope with the default one.
    pub fn resolve_scope(&self, scope: ScopeKind) -> ScopeKind {
        scope.resolve(self.default_scope)
    }

    pub fn detect_duplicated_bean_names(&self) -> bool {
        self.detect_duplicated_bean_names
    }

    pub fn set_detect_duplicated_bean_names(&mut self, detect: bool) {
        self.detect_duplicated_bean_names = detect;
    }

    pub fn default_init_methods(&self) -> bool {
        self.default_init_methods
    }

    pub fn set_default_init_methods(&mut self, enabled: bool) {
        self.default_init_methods = enabled;
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawContainerConfig {
    default_scope: Option<ScopeKind>,
    default_wiring_mode: Option<WiringMode>,
    detect_duplicated_bean_names: Option<bool>,
    default_init_methods: Option<bool>,
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ConfigError {
    #[snafu(display("invalid default scope {scope}: a concrete scope is required"))]
    #[non_exhaustive]
    InvalidDefaultScope { scope: ScopeKind },
    #[snafu(display("invalid default wiring mode {mode}: a concrete mode is required"))]
    #[non_exhaustive]
    InvalidDefaultWiringMode { mode: WiringMode },
    #[snafu(display("could not parse the container configuration"))]
    #[non_exhaustive]
    Parse { source: toml::de::Error },
}
