use std::any;
use std::convert::Infallible;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::bean::{
    Bean, BeanFactory, BoxError, ClosureFactory, DependencyPoint, Injectable, InstanceFactory,
};
use crate::scope::ScopeKind;
use crate::util::any::AsAny;
use crate::wiring::WiringMode;

/// The return type of a lifecycle hook. Hooks may return either `()` or
/// `Result<(), E>`.
pub trait HookResult {
    fn into_hook_result(self) -> Result<(), BoxError>;
}

impl HookResult for () {
    fn into_hook_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> HookResult for Result<(), E> {
    fn into_hook_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

pub(crate) type Hook = Box<dyn Fn(&dyn Bean) -> Result<(), BoxError> + Send + Sync>;

/// Describes how to create, wire and manage one named bean.
///
/// A definition is immutable once registered in a container.
pub struct BeanDefinition {
    name: String,
    scope: ScopeKind,
    wiring: WiringMode,
    points: Vec<DependencyPoint>,
    factory: Box<dyn BeanFactory>,
    init_hooks: Vec<Hook>,
    destroy_hooks: Vec<Hook>,
    init_methods: Option<bool>,
}

impl BeanDefinition {
    /// Creates a definition with the default scope and wiring mode and no
    /// dependency point.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: BeanFactory,
    {
        Self {
            name: name.into(),
            scope: ScopeKind::Default,
            wiring: WiringMode::Default,
            points: Vec::new(),
            factory: Box::new(factory),
            init_hooks: Vec::new(),
            destroy_hooks: Vec::new(),
            init_methods: None,
        }
    }

    /// Creates a definition whose instances are built by `T::default()` and
    /// whose dependency points are declared by `T`.
    pub fn of<T>(name: impl Into<String>) -> Self
    where
        T: Injectable + Default,
    {
        let factory = ClosureFactory::new(|| Ok::<_, Infallible>(T::default()));
        Self::new(name, factory).with_points(T::dependency_points())
    }

    /// Creates a singleton definition handing out an existing instance.
    pub fn instance<T>(name: impl Into<String>, instance: Arc<T>) -> Self
    where
        T: Bean,
    {
        Self::new(name, InstanceFactory::new(instance)).with_scope(ScopeKind::Singleton)
    }

    pub fn with_scope(mut self, scope: ScopeKind) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_wiring(mut self, wiring: WiringMode) -> Self {
        self.wiring = wiring;
        self
    }

    pub fn with_point(mut self, point: DependencyPoint) -> Self {
        self.points.push(point);
        self
    }

    pub fn with_points(mut self, points: impl IntoIterator<Item = DependencyPoint>) -> Self {
        self.points.extend(points);
        self
    }

    /// Enables or disables init hooks for this bean regardless of the
    /// container's default.
    pub fn with_init_methods(mut self, enabled: bool) -> Self {
        self.init_methods = Some(enabled);
        self
    }

    /// Appends an init hook. Hooks run in the order they are added, once all
    /// dependency points are filled.
    pub fn with_init<T, F, R>(mut self, hook: F) -> Self
    where
        T: Bean,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HookResult,
    {
        self.init_hooks.push(erase_hook(hook));
        self
    }

    /// Appends a destroy hook, run when the instance's scope ends.
    pub fn with_destroy<T, F, R>(mut self, hook: F) -> Self
    where
        T: Bean,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HookResult,
    {
        self.destroy_hooks.push(erase_hook(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared scope, which may be the placeholder
    /// [`ScopeKind::Default`].
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    /// Returns the declared wiring mode, which may be the placeholder
    /// [`WiringMode::Default`].
    pub fn wiring(&self) -> WiringMode {
        self.wiring
    }

    pub fn points(&self) -> &[DependencyPoint] {
        &self.points
    }

    pub fn type_name(&self) -> &'static str {
        self.factory.type_name()
    }

    pub fn init_methods(&self) -> Option<bool> {
        self.init_methods
    }

    pub(crate) fn factory(&self) -> &dyn BeanFactory {
        self.factory.as_ref()
    }

    pub(crate) fn init_hooks(&self) -> &[Hook] {
        &self.init_hooks
    }

    pub(crate) fn destroy_hooks(&self) -> &[Hook] {
        &self.destroy_hooks
    }
}

impl Debug for BeanDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("type_name", &self.type_name())
            .field("scope", &self.scope)
            .field("wiring", &self.wiring)
            .field("points", &self.points)
            .field("init_hooks", &self.init_hooks.len())
            .field("destroy_hooks", &self.destroy_hooks.len())
            .field("init_methods", &self.init_methods)
            .finish()
    }
}

fn erase_hook<T, F, R>(hook: F) -> Hook
where
    T: Bean,
    F: Fn(&T) -> R + Send + Sync + 'static,
    R: HookResult,
{
    Box::new(move |bean: &dyn Bean| match bean.as_any().downcast_ref::<T>() {
        Some(bean) => hook(bean).into_hook_result(),
        None => Err(format!(
            "hook expects {} but the bean is {}",
            any::type_name::<T>(),
            bean.type_name()
        )
        .into()),
    })
}
