use std::any;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bean::{self, Bean, BeanDefinition, BeanRef, DependencyPoint};
use crate::config::{ConfigError, ContainerConfig};
use crate::container::context::ScopeContext;
use crate::container::registry::RegistryError;
use crate::container::trace::Trace;
use crate::container::wiring::WiringResolver;
use crate::container::ResolveError;
use crate::scope::ScopeKind;
use crate::wiring::WiringMode;

/// A handle to one context of a bean container.
///
/// Handles are cheap to clone and share the same registry, configuration and
/// instances. The handle returned by [`Container::new`] owns the singleton
/// scope; [`Container::sub_container`] opens a context of the next
/// shorter-lived scope. The instances of a context are destroyed when its
/// last handle is dropped, or explicitly by [`Container::shutdown`].
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use beanwire::prelude::*;
///
/// #[derive(Default, Bean)]
/// struct Repository;
///
/// #[derive(Default, Bean)]
/// struct Service {
///     repository: Inject<Repository>,
/// }
///
/// let container = Container::new();
/// container.register_bean(BeanDefinition::of::<Repository>("repository")).unwrap();
/// container.register_bean(BeanDefinition::of::<Service>("service")).unwrap();
///
/// let service: Arc<Service> = container.get_as("service").unwrap();
/// assert!(service.repository.is_set());
/// ```
#[derive(Clone)]
pub struct Container {
    context: Arc<ScopeContext>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::new())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            context: Arc::new(ScopeContext::new(config)),
        }
    }

    /// Opens a context of the next shorter-lived scope, sharing this
    /// container's registry and configuration. Returns `None` if this
    /// context already holds the shortest-lived scope.
    pub fn sub_container(&self) -> Option<Self> {
        ScopeContext::sub_context(&self.context).map(|context| Self {
            context: Arc::new(context),
        })
    }

    pub fn current_scope(&self) -> ScopeKind {
        self.context.scope()
    }

    /// Registers a bean definition.
    ///
    /// A definition replacing an existing one evicts and destroys the
    /// singleton instance built from the old definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if duplicated bean names are
    /// detected and the name is already registered.
    pub fn register_bean(&self, definition: BeanDefinition) -> Result<(), RegistryError> {
        let detect = self.config().detect_duplicated_bean_names();
        let name = definition.name().to_string();
        let replaced = self
            .context
            .shared()
            .registry
            .write()
            .register(definition, detect)?;

        if replaced.is_some() {
            debug!("Replaced definition of bean '{}'", name);
            self.context.root().evict(&name);
        } else {
            debug!("Registered bean '{}'", name);
        }
        Ok(())
    }

    /// Registers an already built instance as a singleton bean.
    ///
    /// # Errors
    ///
    /// See [`Container::register_bean`].
    pub fn register_instance<T: Bean>(
        &self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> Result<(), RegistryError> {
        self.register_bean(BeanDefinition::instance(name, instance))
    }

    /// Removes a bean definition and destroys its live singleton instance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no bean is registered under
    /// `name`.
    pub fn unregister_bean(&self, name: &str) -> Result<(), RegistryError> {
        self.context.shared().registry.write().unregister(name)?;
        debug!("Unregistered bean '{}'", name);
        self.context.root().evict(name);
        Ok(())
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        self.context.shared().registry.read().contains(name)
    }

    pub fn bean_names(&self) -> Vec<String> {
        self.context.shared().registry.read().names()
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no bean is registered under
    /// `name`.
    pub fn definition(&self, name: &str) -> Result<Arc<BeanDefinition>, RegistryError> {
        self.context.shared().registry.read().lookup(name)
    }

    /// Returns the instance of the bean named `name`, creating it if its
    /// scope holds no instance yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the bean isn't registered, if its scope isn't
    /// active in this context, or if its creation fails.
    pub fn get(&self, name: &str) -> Result<BeanRef, ResolveError> {
        self.context.get_bean(name, None)
    }

    /// Like [`Container::get`], but also converts the bean to its concrete
    /// type.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::TypeMismatch`] if the bean is not a `T`, and
    /// any error returned by [`Container::get`].
    pub fn get_as<T: Bean>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        let instance = self.get(name)?;
        let found = bean::type_name_of(instance.as_ref());
        bean::downcast::<T>(instance).map_err(|_| ResolveError::TypeMismatch {
            name: name.to_string(),
            expected: any::type_name::<T>(),
            found,
        })
    }

    /// Returns true if this context stores a live instance of the bean
    /// named `name`.
    pub fn contains_instance(&self, name: &str) -> bool {
        self.context.store().get(name).is_some()
    }

    /// Fills the dependency points of an object built outside the container.
    /// The object itself is not registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a point can't be resolved under `mode`, or if
    /// injecting a resolved bean fails.
    pub fn wire(
        &self,
        instance: &BeanRef,
        points: &[DependencyPoint],
        mode: WiringMode,
    ) -> Result<(), ResolveError> {
        let mode = self.config().resolve_wiring_mode(mode);
        let name = bean::type_name_of(instance.as_ref());
        let frame = Trace::new(name, None);
        WiringResolver::new(&self.context, mode).wire(name, points, instance, &frame)
    }

    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> ContainerConfig {
        self.context.shared().config()
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefaultScope`] if `scope` is the
    /// placeholder [`ScopeKind::Default`].
    pub fn set_default_scope(&self, scope: ScopeKind) -> Result<(), ConfigError> {
        self.context.shared().config.write().set_default_scope(scope)?;
        info!("Default scope set to {}", scope);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefaultWiringMode`] if `mode` is the
    /// placeholder [`WiringMode::Default`].
    pub fn set_default_wiring_mode(&self, mode: WiringMode) -> Result<(), ConfigError> {
        self.context
            .shared()
            .config
            .write()
            .set_default_wiring_mode(mode)?;
        info!("Default wiring mode set to {}", mode);
        Ok(())
    }

    pub fn set_detect_duplicated_bean_names(&self, detect: bool) {
        self.context
            .shared()
            .config
            .write()
            .set_detect_duplicated_bean_names(detect);
    }

    pub fn set_default_init_methods(&self, enabled: bool) {
        self.context
            .shared()
            .config
            .write()
            .set_default_init_methods(enabled);
    }

    /// Destroys every instance stored in this context. Definitions stay
    /// registered, so beans are created again on the next request.
    pub fn shutdown(&self) {
        info!("Shutting down {} context", self.current_scope());
        self.context.destroy_all();
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    use crate::bean::{ClosureFactory, Inject, InjectError, MockBeanFactory};

    use super::*;

    #[derive(Default)]
    struct Clock {
        stopped: AtomicU32,
    }

    impl Bean for Clock {}

    #[derive(Default)]
    struct Scheduler {
        clock: Inject<Clock>,
    }

    impl Bean for Scheduler {
        fn inject(&self, point: &str, value: BeanRef) -> Result<(), InjectError> {
            match point {
                "clock" => self.clock.inject(value),
                _ => Err(InjectError::unknown_point(point)),
            }
        }
    }

    fn clock(scope: ScopeKind) -> BeanDefinition {
        BeanDefinition::new(
            "clock",
            ClosureFactory::new(|| Ok::<_, Infallible>(Clock::default())),
        )
        .with_scope(scope)
    }

    #[test]
    fn container_get_succeeds() {
        let container = Container::new();
        container.register_bean(clock(ScopeKind::Singleton)).unwrap();

        let a = container.get("clock").unwrap();
        let b = container.get("clock").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(container.contains_instance("clock"));

        thread::spawn({
            let container = container.clone();
            move || {
                let c = container.get("clock").unwrap();
                assert!(Arc::ptr_eq(&a, &c));
            }
        })
        .join()
        .unwrap();
    }

    #[test]
    fn container_get_as_fails_when_type_differs() {
        let container = Container::new();
        container.register_bean(clock(ScopeKind::Singleton)).unwrap();

        assert!(container.get_as::<Clock>("clock").is_ok());
        assert!(matches!(
            container.get_as::<Scheduler>("clock"),
            Err(ResolveError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn container_invokes_factory_once_for_singletons() {
        let container = Container::new();
        let mut factory = MockBeanFactory::new();
        factory
            .expect_allocate()
            .times(1)
            .returning(|| Ok(Arc::new(Clock::default()) as BeanRef));
        factory.expect_type_name().return_const("Clock");
        container
            .register_bean(BeanDefinition::new("clock", factory))
            .unwrap();

        for _ in 0..3 {
            container.get("clock").unwrap();
        }
    }

    #[test]
    fn container_unregister_bean_destroys_singleton() {
        let container = Container::new();
        let clock = Arc::new(Clock::default());
        container
            .register_bean(
                BeanDefinition::instance("clock", Arc::clone(&clock)).with_destroy(
                    |clock: &Clock| {
                        clock.stopped.fetch_add(1, Ordering::SeqCst);
                    },
                ),
            )
            .unwrap();

        container.get("clock").unwrap();
        container.unregister_bean("clock").unwrap();
        assert_eq!(clock.stopped.load(Ordering::SeqCst), 1);
        assert!(!container.contains_bean("clock"));
        assert!(matches!(
            container.get("clock"),
            Err(ResolveError::NotFound { .. })
        ));
        assert!(matches!(
            container.unregister_bean("clock"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn container_wire_fills_external_objects() {
        let container = Container::new();
        container.register_bean(clock(ScopeKind::Singleton)).unwrap();

        let scheduler = Arc::new(Scheduler::default());
        let instance = Arc::clone(&scheduler) as BeanRef;
        container
            .wire(
                &instance,
                &[DependencyPoint::of::<Clock>("clock")],
                WiringMode::Default,
            )
            .unwrap();
        assert!(scheduler.clock.is_set());
        assert!(!container.contains_bean(bean::type_name_of(instance.as_ref())));
    }

    #[test]
    fn container_sub_container_walks_scope_chain() {
        let container = Container::new();
        let session = container.sub_container().unwrap();
        let request = session.sub_container().unwrap();

        assert_eq!(container.current_scope(), ScopeKind::Singleton);
        assert_eq!(session.current_scope(), ScopeKind::Session);
        assert_eq!(request.current_scope(), ScopeKind::Request);
        assert!(request.sub_container().is_none());
    }

    #[test]
    fn container_setters_validate_input() {
        let container = Container::new();
        assert!(container.set_default_scope(ScopeKind::Default).is_err());
        assert!(container.set_default_wiring_mode(WiringMode::Default).is_err());

        container.set_default_scope(ScopeKind::Prototype).unwrap();
        container.set_default_wiring_mode(WiringMode::Optional).unwrap();
        container.set_detect_duplicated_bean_names(true);
        container.set_default_init_methods(false);

        let config = container.config();
        assert_eq!(config.default_scope(), ScopeKind::Prototype);
        assert_eq!(config.default_wiring_mode(), WiringMode::Optional);
        assert!(config.detect_duplicated_bean_names());
        assert!(!config.default_init_methods());
    }
}
