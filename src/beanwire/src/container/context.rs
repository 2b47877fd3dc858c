use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::bean::{BeanDefinition, BeanRef};
use crate::config::ContainerConfig;
use crate::container::lifecycle::{self, LifecycleManager};
use crate::container::registry::BeanRegistry;
use crate::container::store::{Claim, ScopeStore, WaitGraph, WaitResponse};
use crate::container::trace::Trace;
use crate::container::wiring::DependencySource;
use crate::container::ResolveError;
use crate::scope::ScopeKind;

/// State shared by a root context and all of its sub-contexts.
pub(crate) struct Shared {
    pub registry: RwLock<BeanRegistry>,
    pub config: RwLock<ContainerConfig>,
    pub waits: WaitGraph,
}

impl Shared {
    pub fn config(&self) -> ContainerConfig {
        *self.config.read()
    }

    fn lookup(&self, name: &str) -> Result<Arc<BeanDefinition>, ResolveError> {
        self.registry
            .read()
            .lookup(name)
            .map_err(|_| ResolveError::NotFound {
                name: name.to_string(),
            })
    }
}

/// One level of the scope hierarchy.
///
/// The root context stores singletons. Each sub-context stores the instances
/// of the next shorter-lived scope and forwards requests for longer-lived
/// beans to its parent, so a bean is always wired from the context which
/// owns it. Dropping a context destroys every instance it stores.
pub(crate) struct ScopeContext {
    shared: Arc<Shared>,
    parent: Option<Arc<ScopeContext>>,
    scope: ScopeKind,
    store: ScopeStore,
    transient: ScopeStore,
}

impl ScopeContext {
    pub fn new(config: ContainerConfig) -> Self {
        let shared = Shared {
            registry: RwLock::new(BeanRegistry::new()),
            config: RwLock::new(config),
            waits: WaitGraph::new(),
        };
        Self::with_parent(Arc::new(shared), None, ScopeKind::Singleton)
    }

    /// Creates a sub-context of `parent`, or returns `None` if the scope
    /// chain ends at `parent`.
    pub fn sub_context(parent: &Arc<Self>) -> Option<Self> {
        let scope = parent.scope.sub_scope()?;
        Some(Self::with_parent(
            Arc::clone(&parent.shared),
            Some(Arc::clone(parent)),
            scope,
        ))
    }

    fn with_parent(shared: Arc<Shared>, parent: Option<Arc<Self>>, scope: ScopeKind) -> Self {
        Self {
            shared,
            parent,
            scope,
            store: ScopeStore::new(scope),
            transient: ScopeStore::new(ScopeKind::Prototype),
        }
    }

    pub fn shared(&self) -> &Shared {
        &self.shared
    }

    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    pub fn store(&self) -> &ScopeStore {
        &self.store
    }

    pub fn root(&self) -> &ScopeContext {
        let mut context = self;
        while let Some(parent) = &context.parent {
            context = parent;
        }
        context
    }

    /// Returns the instance of the bean named `name` visible from this
    /// context, creating it if needed. `previous` is the frame of the bean
    /// being wired when the request comes from a dependency point.
    ///
    /// A creation racing with a replacement of the bean's definition is
    /// discarded, and the bean is looked up again.
    pub fn get_bean(
        self: &Arc<Self>,
        name: &str,
        previous: Option<&Trace<'_>>,
    ) -> Result<BeanRef, ResolveError> {
        loop {
            let definition = self.shared.lookup(name)?;
            match self.get_defined(&definition, previous) {
                Err(ResolveError::DefinitionReplaced { name: replaced }) if replaced == name => {
                    debug!("Definition of bean '{}' changed, resolving it again", name);
                }
                res => return res,
            }
        }
    }

    fn get_defined(
        self: &Arc<Self>,
        definition: &Arc<BeanDefinition>,
        previous: Option<&Trace<'_>>,
    ) -> Result<BeanRef, ResolveError> {
        let config = self.shared.config();
        let scope = config.resolve_scope(definition.scope());
        let name = definition.name();

        if scope == ScopeKind::Prototype {
            if previous.is_some_and(|frame| frame.contains(name)) {
                return Err(ResolveError::CyclicPrototype {
                    name: name.to_string(),
                });
            }
            trace!("Creating new instance of prototype bean '{}'", name);
            return self.create(&self.transient, definition, config, previous);
        }

        if scope == self.scope {
            return self.get_shared(definition, config, previous);
        }

        match &self.parent {
            Some(parent) if scope.outlive(self.scope) => parent.get_defined(definition, previous),
            _ => Err(ResolveError::ScopeNotActive {
                name: name.to_string(),
                scope,
                current: self.scope,
            }),
        }
    }

    fn get_shared(
        self: &Arc<Self>,
        definition: &Arc<BeanDefinition>,
        config: ContainerConfig,
        previous: Option<&Trace<'_>>,
    ) -> Result<BeanRef, ResolveError> {
        let name = definition.name();
        match self.store.claim(definition, &self.shared.waits)? {
            Claim::Ready(instance) => Ok(instance),
            Claim::InProgress(instance) => {
                if let Some(frame) = previous {
                    if let Some(depth) = frame.find(name) {
                        frame.close_cycle(depth);
                    }
                    debug!(
                        "Handing instance of bean '{}' still being created to bean '{}'",
                        name,
                        frame.name()
                    );
                }
                Ok(instance)
            }
            Claim::Wait(receiver) => {
                trace!("Waiting for bean '{}' created by another thread", name);
                let response = receiver.recv();
                self.shared.waits.release(thread::current().id());
                match response {
                    Ok(WaitResponse::Constructed(instance)) => Ok(instance),
                    Ok(WaitResponse::Error(err)) => Err(err),
                    Err(_) => Err(ResolveError::CreationAborted {
                        name: name.to_string(),
                    }),
                }
            }
            Claim::Owned => {
                debug!(
                    "Creating shared instance of {} bean '{}'",
                    self.scope, name
                );
                self.create(&self.store, definition, config, previous)
            }
        }
    }

    fn create(
        self: &Arc<Self>,
        store: &ScopeStore,
        definition: &Arc<BeanDefinition>,
        config: ContainerConfig,
        previous: Option<&Trace<'_>>,
    ) -> Result<BeanRef, ResolveError> {
        let frame = Trace::new(definition.name(), previous);
        LifecycleManager::new(self, store, definition, config).create(&frame)
    }

    /// Evicts and destroys the instance stored under `name`, if any.
    pub fn evict(&self, name: &str) -> bool {
        match self.store.remove(name) {
            Some(bean) => {
                lifecycle::destroy(bean);
                true
            }
            None => false,
        }
    }

    /// Destroys every instance stored in this context.
    pub fn destroy_all(&self) {
        let beans = self.store.drain();
        if !beans.is_empty() {
            debug!("Destroying {} {} beans", beans.len(), self.scope);
        }
        for bean in beans {
            lifecycle::destroy(bean);
        }
    }
}

impl DependencySource for Arc<ScopeContext> {
    fn contains(&self, name: &str) -> bool {
        self.shared.registry.read().contains(name)
    }

    fn resolve(&self, name: &str, frame: &Trace<'_>) -> Result<BeanRef, ResolveError> {
        self.get_bean(name, Some(frame))
    }
}

impl Drop for ScopeContext {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use crate::bean::{Bean, ClosureFactory};

    use super::*;

    struct Service;

    impl Bean for Service {}

    fn register(context: &ScopeContext, name: &str, scope: ScopeKind) {
        let definition =
            BeanDefinition::new(name, ClosureFactory::new(|| Ok::<_, Infallible>(Service)))
                .with_scope(scope);
        context
            .shared()
            .registry
            .write()
            .register(definition, false)
            .unwrap();
    }

    #[test]
    fn scope_context_forms_a_chain_of_scopes() {
        let root = Arc::new(ScopeContext::new(ContainerConfig::new()));
        let session = Arc::new(ScopeContext::sub_context(&root).unwrap());
        let request = Arc::new(ScopeContext::sub_context(&session).unwrap());

        assert_eq!(root.scope(), ScopeKind::Singleton);
        assert_eq!(session.scope(), ScopeKind::Session);
        assert_eq!(request.scope(), ScopeKind::Request);
        assert!(ScopeContext::sub_context(&request).is_none());
        assert_eq!(request.root().scope(), ScopeKind::Singleton);
    }

    #[test]
    fn scope_context_get_bean_stores_instances_where_they_live() {
        let root = Arc::new(ScopeContext::new(ContainerConfig::new()));
        register(&root, "singleton", ScopeKind::Singleton);
        register(&root, "session", ScopeKind::Session);
        let session = Arc::new(ScopeContext::sub_context(&root).unwrap());

        let a = session.get_bean("singleton", None).unwrap();
        let b = root.get_bean("singleton", None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(root.store().get("singleton").is_some());
        assert!(session.store().get("singleton").is_none());

        session.get_bean("session", None).unwrap();
        assert!(session.store().get("session").is_some());
        assert!(matches!(
            root.get_bean("session", None),
            Err(ResolveError::ScopeNotActive {
                scope: ScopeKind::Session,
                current: ScopeKind::Singleton,
                ..
            })
        ));
    }

    #[test]
    fn scope_context_evict_removes_initialized_instances() {
        let root = Arc::new(ScopeContext::new(ContainerConfig::new()));
        register(&root, "service", ScopeKind::Singleton);

        assert!(!root.evict("service"));
        let a = root.get_bean("service", None).unwrap();
        assert!(root.evict("service"));
        let b = root.get_bean("service", None).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn scope_context_get_bean_fails_when_name_not_found() {
        let root = Arc::new(ScopeContext::new(ContainerConfig::new()));
        assert!(matches!(
            root.get_bean("missing", None),
            Err(ResolveError::NotFound { .. })
        ));
    }
}
