use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Deserialize;

/// A policy that specifies how long a bean instance lives and whether the
/// container caches it.
///
/// The cached kinds form a chain of nested lifetimes, where each variant has
/// at most one longer-lived predecessor and at most one shorter-lived
/// successor:
///
/// - [`ScopeKind::Singleton`] lives as long as the container,
/// - [`ScopeKind::Session`] lives as long as a session context,
/// - [`ScopeKind::Request`] lives as long as a request context.
///
/// [`ScopeKind::Prototype`] is outside of that chain: a new instance is
/// created on every request and nothing is retained. [`ScopeKind::Default`]
/// is a placeholder which stands for the container's configured default and
/// is never a scope an instance actually lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    #[default]
    Default,
    Singleton,
    Prototype,
    Session,
    Request,
}

impl ScopeKind {
    /// Returns true if `self` only stands for another scope.
    pub fn is_placeholder(self) -> bool {
        self == Self::Default
    }

    /// Returns true if instances of this scope are stored and shared.
    pub fn is_cached(self) -> bool {
        self.rank().is_some()
    }

    /// Substitutes the placeholder with `default`.
    pub fn resolve(self, default: ScopeKind) -> ScopeKind {
        if self.is_placeholder() {
            default
        } else {
            self
        }
    }

    /// Returns true if `self` is a cached scope living at least as long as
    /// `other`.
    pub fn outlive(self, other: ScopeKind) -> bool {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => a >= b,
            _ => false,
        }
    }

    /// Returns the shortest cached scope which strictly outlives `self`.
    pub fn super_scope(self) -> Option<Self> {
        match self {
            Self::Session => Some(Self::Singleton),
            Self::Request => Some(Self::Session),
            _ => None,
        }
    }

    /// Returns the longest cached scope which is strictly within `self`.
    pub fn sub_scope(self) -> Option<Self> {
        match self {
            Self::Singleton => Some(Self::Session),
            Self::Session => Some(Self::Request),
            _ => None,
        }
    }

    pub fn to_str(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Singleton => "Singleton",
            Self::Prototype => "Prototype",
            Self::Session => "Session",
            Self::Request => "Request",
        }
    }

    fn rank(self) -> Option<u8> {
        match self {
            Self::Singleton => Some(3),
            Self::Session => Some(2),
            Self::Request => Some(1),
            Self::Default | Self::Prototype => None,
        }
    }
}

impl Display for ScopeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_kind_outlive_follows_the_cached_chain() {
        assert!(ScopeKind::Singleton.outlive(ScopeKind::Session));
        assert!(ScopeKind::Session.outlive(ScopeKind::Request));
        assert!(ScopeKind::Request.outlive(ScopeKind::Request));
        assert!(!ScopeKind::Request.outlive(ScopeKind::Singleton));
        assert!(!ScopeKind::Prototype.outlive(ScopeKind::Request));
        assert!(!ScopeKind::Singleton.outlive(ScopeKind::Prototype));
    }

    #[test]
    fn scope_kind_walks_sub_and_super_scopes() {
        assert_eq!(ScopeKind::Singleton.sub_scope(), Some(ScopeKind::Session));
        assert_eq!(ScopeKind::Session.sub_scope(), Some(ScopeKind::Request));
        assert_eq!(ScopeKind::Request.sub_scope(), None);
        assert_eq!(ScopeKind::Request.super_scope(), Some(ScopeKind::Session));
        assert_eq!(ScopeKind::Singleton.super_scope(), None);
        assert_eq!(ScopeKind::Prototype.sub_scope(), None);
    }

    #[test]
    fn scope_kind_resolve_only_replaces_placeholder() {
        assert_eq!(
            ScopeKind::Default.resolve(ScopeKind::Prototype),
            ScopeKind::Prototype
        );
        assert_eq!(
            ScopeKind::Session.resolve(ScopeKind::Prototype),
            ScopeKind::Session
        );
        assert!(!ScopeKind::Prototype.is_cached());
        assert!(!ScopeKind::Default.is_cached());
    }
}
