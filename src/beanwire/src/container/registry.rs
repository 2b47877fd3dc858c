use std::collections::HashMap;
use std::sync::Arc;

use snafu::prelude::*;

use crate::bean::BeanDefinition;

/// Maps bean names to their definitions.
///
/// The registry has no locking of its own: the container guards it with a
/// read-write lock, so definitions are handed out as [`Arc`]s and never
/// observed half-registered.
#[derive(Debug)]
pub struct BeanRegistry {
    definitions: HashMap<String, Arc<BeanDefinition>>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Registers `definition` under its name and returns the definition it
    /// replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if `detect_duplicates` is set
    /// and the name is already taken.
    pub fn register(
        &mut self,
        definition: BeanDefinition,
        detect_duplicates: bool,
    ) -> Result<Option<Arc<BeanDefinition>>, RegistryError> {
        let name = definition.name().to_string();
        if detect_duplicates && self.definitions.contains_key(&name) {
            return Err(RegistryError::DuplicateName { name });
        }
        Ok(self.definitions.insert(name, Arc::new(definition)))
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no bean is registered under
    /// `name`.
    pub fn lookup(&self, name: &str) -> Result<Arc<BeanDefinition>, RegistryError> {
        self.definitions
            .get(name)
            .cloned()
            .context(NotFoundSnafu { name })
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no bean is registered under
    /// `name`.
    pub fn unregister(&mut self, name: &str) -> Result<Arc<BeanDefinition>, RegistryError> {
        self.definitions
            .remove(name)
            .context(NotFoundSnafu { name })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum RegistryError {
    #[snafu(display("a bean named {name} is already registered"))]
    #[non_exhaustive]
    DuplicateName { name: String },
    #[snafu(display("no bean named {name} is registered"))]
    #[non_exhaustive]
    NotFound { name: String },
}
