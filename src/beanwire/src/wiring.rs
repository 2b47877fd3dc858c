use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Deserialize;

/// How strictly the dependency points of a bean must be satisfied.
///
/// [`WiringMode::Default`] is a placeholder for the container's configured
/// default mode and is always substituted before any injection happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WiringMode {
    #[default]
    Default,
    /// No automatic wiring is attempted.
    None,
    /// Every dependency point must resolve, or the creation fails.
    Strict,
    /// Unresolved dependency points are left empty.
    Optional,
}

impl WiringMode {
    pub fn is_placeholder(self) -> bool {
        self == Self::Default
    }

    /// Substitutes the placeholder with `default`.
    pub fn resolve(self, default: WiringMode) -> WiringMode {
        if self.is_placeholder() {
            default
        } else {
            self
        }
    }

    pub fn to_str(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::None => "None",
            Self::Strict => "Strict",
            Self::Optional => "Optional",
        }
    }
}

impl Display for WiringMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_str())
    }
}
