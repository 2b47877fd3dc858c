use std::any;

use crate::wiring::WiringMode;

/// Describes one injection target on a bean.
///
/// A point is resolved either by an explicit reference to another bean's
/// name, or by convention from its own name and declared type. See
/// [`DependencyPoint::candidates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPoint {
    name: String,
    reference: Option<String>,
    type_name: Option<&'static str>,
    mode: WiringMode,
}

impl DependencyPoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: None,
            type_name: None,
            mode: WiringMode::Default,
        }
    }

    /// Creates a point whose declared type is `T`.
    pub fn of<T: ?Sized>(name: impl Into<String>) -> Self {
        Self {
            type_name: Some(any::type_name::<T>()),
            ..Self::new(name)
        }
    }

    /// Wires the point to the bean named `reference`, bypassing the naming
    /// convention.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Overrides the bean's wiring mode for this point only.
    /// [`WiringMode::Default`] inherits the bean's mode.
    pub fn with_mode(mut self, mode: WiringMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn type_name(&self) -> Option<&'static str> {
        self.type_name
    }

    pub fn mode(&self) -> WiringMode {
        self.mode
    }

    /// Returns the bean names this point may be wired to, in order of
    /// preference.
    ///
    /// An explicit reference is the only candidate. Otherwise the candidates
    /// are the point's name, the declared type's short name with its first
    /// letter lower-cased, and the declared type's full name.
    pub fn candidates(&self) -> Vec<String> {
        if let Some(reference) = &self.reference {
            return vec![reference.clone()];
        }

        let mut candidates = vec![self.name.clone()];
        if let Some(type_name) = self.type_name {
            for candidate in [short_bean_name(type_name), type_name.to_string()] {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }
}

/// `app::service::UserService<T>` becomes `userService`.
fn short_bean_name(type_name: &str) -> String {
    let path = type_name.split('<').next().unwrap_or(type_name);
    let short = path.rsplit("::").next().unwrap_or(path);

    let mut chars = short.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UserService;

    #[test]
    fn candidates_prefer_explicit_reference() {
        let point = DependencyPoint::of::<UserService>("users").with_reference("primaryUsers");
        assert_eq!(point.candidates(), vec!["primaryUsers".to_string()]);
    }

    #[test]
    fn candidates_follow_naming_convention() {
        let point = DependencyPoint::of::<UserService>("users");
        let candidates = point.candidates();
        assert_eq!(candidates[0], "users");
        assert_eq!(candidates[1], "userService");
        assert!(candidates[2].ends_with("::UserService"));
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn candidates_are_not_duplicated() {
        let point = DependencyPoint::of::<UserService>("userService");
        assert_eq!(point.candidates().len(), 2);

        let point = DependencyPoint::new("plain");
        assert_eq!(point.candidates(), vec!["plain".to_string()]);
    }

    #[test]
    fn short_bean_name_strips_path_and_generics() {
        assert_eq!(short_bean_name("a::b::Repository<a::User>"), "repository");
        assert_eq!(short_bean_name("Cache"), "cache");
        assert_eq!(short_bean_name(""), "");
    }
}
