use std::any;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, OnceLock};

use crate::bean::{Bean, BeanRef, InjectError};
use crate::util::any::{AsAny, DowncastArc};

/// A dependency point filled at most once by the container.
///
/// The slot stays empty when the owning bean is wired optionally and no
/// matching bean exists, or when wiring is disabled for the bean.
pub struct Inject<T: Bean> {
    slot: OnceLock<Arc<T>>,
}

impl<T: Bean> Inject<T> {
    pub fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Returns the injected bean, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.get().cloned()
    }

    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Fills the slot with a type-erased bean.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a `T` or if the slot is already
    /// filled.
    pub fn inject(&self, value: BeanRef) -> Result<(), InjectError> {
        let found = (*value).type_name();
        let value = value
            .downcast_arc::<T>()
            .map_err(|_| InjectError::TypeMismatch {
                expected: any::type_name::<T>(),
                found,
            })?;
        self.slot
            .set(value)
            .map_err(|_| InjectError::AlreadyInjected)
    }
}

impl<T: Bean> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Bean> Debug for Inject<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Inject")
            .field("target", &any::type_name::<T>())
            .field("is_set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Target(i32);

    impl Bean for Target {}

    struct Other;

    impl Bean for Other {}

    #[test]
    fn inject_succeeds_once() {
        let slot: Inject<Target> = Inject::new();
        assert!(slot.get().is_none());

        slot.inject(Arc::new(Target(7))).unwrap();
        assert_eq!(slot.get().map(|t| t.0), Some(7));

        assert!(matches!(
            slot.inject(Arc::new(Target(8))),
            Err(InjectError::AlreadyInjected)
        ));
        assert_eq!(slot.get().map(|t| t.0), Some(7));
    }

    #[test]
    fn inject_fails_when_type_mismatches() {
        let slot: Inject<Target> = Inject::new();
        assert!(matches!(
            slot.inject(Arc::new(Other)),
            Err(InjectError::TypeMismatch { found, .. }) if found.ends_with("Other")
        ));
        assert!(!slot.is_set());
    }
}
