use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::bean::{BeanDefinition, BeanRef};
use crate::config::ContainerConfig;
use crate::container::context::ScopeContext;
use crate::container::store::{LiveBean, ScopeStore};
use crate::container::trace::{Provisional, Trace};
use crate::container::wiring::WiringResolver;
use crate::container::ResolveError;

/// The lifecycle state of a bean instance.
///
/// States only move forward: an instance is allocated and stored
/// (`Creating`), has its dependency points filled (`Wired`), has run its init
/// hooks (`Initialized`) and is eventually disposed of (`Destroyed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BeanState {
    Uncreated,
    Creating,
    Wired,
    Initialized,
    Destroyed,
}

impl BeanState {
    pub fn can_advance_to(self, next: BeanState) -> bool {
        matches!(
            (self, next),
            (BeanState::Uncreated, BeanState::Creating)
                | (BeanState::Creating, BeanState::Wired)
                | (BeanState::Wired, BeanState::Initialized)
                | (BeanState::Initialized, BeanState::Destroyed)
        )
    }
}

/// Drives one instance of a bean from allocation to initialization.
pub(crate) struct LifecycleManager<'a> {
    context: &'a Arc<ScopeContext>,
    store: &'a ScopeStore,
    definition: &'a Arc<BeanDefinition>,
    config: ContainerConfig,
}

impl<'a> LifecycleManager<'a> {
    pub fn new(
        context: &'a Arc<ScopeContext>,
        store: &'a ScopeStore,
        definition: &'a Arc<BeanDefinition>,
        config: ContainerConfig,
    ) -> Self {
        Self {
            context,
            store,
            definition,
            config,
        }
    }

    /// Creates, stores, wires and initializes an instance.
    ///
    /// The caller must have claimed the bean's name in `store`. On failure
    /// the claim is released, the waiting threads receive the same error, and
    /// every instance wired against the failed one is evicted. The same
    /// happens when the definition is replaced or unregistered before the
    /// instance is published, in which case the instance is also destroyed.
    pub fn create(&self, frame: &Trace<'_>) -> Result<BeanRef, ResolveError> {
        let name = self.definition.name();
        let guard = CreationGuard::new(self, frame);

        let res = self.build(frame).and_then(|instance| self.publish(instance));
        guard.disarm();

        match res {
            Ok(instance) => {
                let own = self
                    .store
                    .scope()
                    .is_cached()
                    .then(|| Provisional::new(Arc::clone(self.context), name));
                frame.complete(own);
                Ok(instance)
            }
            Err(err) => {
                debug!("Failed to create bean '{}': {}", name, err);
                self.fail(frame, &err);
                Err(err)
            }
        }
    }

    fn build(&self, frame: &Trace<'_>) -> Result<BeanRef, ResolveError> {
        let name = self.definition.name();
        let mut state = BeanState::Uncreated;

        trace!(
            "Allocating instance of bean '{}' in scope {} at depth {}",
            name,
            self.store.scope(),
            frame.depth()
        );
        let instance = self
            .definition
            .factory()
            .allocate()
            .map_err(|source| ResolveError::Allocation {
                name: name.to_string(),
                source: Arc::from(source),
            })?;
        self.store.put(self.definition, Arc::clone(&instance))?;
        state = advance(state, BeanState::Creating);

        let mode = self.config.resolve_wiring_mode(self.definition.wiring());
        WiringResolver::new(self.context, mode).wire(
            name,
            self.definition.points(),
            &instance,
            frame,
        )?;
        self.store.advance(name, BeanState::Wired);
        state = advance(state, BeanState::Wired);

        let init_methods = self
            .definition
            .init_methods()
            .unwrap_or(self.config.default_init_methods());
        if init_methods {
            for (index, hook) in self.definition.init_hooks().iter().enumerate() {
                hook(instance.as_ref()).map_err(|source| ResolveError::Initialization {
                    name: name.to_string(),
                    hook: index,
                    source: Arc::from(source),
                })?;
            }
        }
        let state = advance(state, BeanState::Initialized);

        debug!("Created bean '{}' ({:?})", name, state);
        Ok(instance)
    }

    /// Publishes a cached instance, unless its definition is no longer the
    /// registered one. The registry stays locked until the instance is
    /// published, so a concurrent replacement either sees the published
    /// instance and evicts it, or is seen here.
    fn publish(&self, instance: BeanRef) -> Result<BeanRef, ResolveError> {
        if !self.store.scope().is_cached() {
            return Ok(instance);
        }

        let name = self.definition.name();
        let shared = self.context.shared();
        let registry = shared.registry.read();
        let current = registry
            .lookup(name)
            .is_ok_and(|registered| Arc::ptr_eq(&registered, self.definition));
        if !current {
            drop(registry);
            destroy(LiveBean::new(name, instance, Arc::clone(self.definition)));
            return Err(ResolveError::DefinitionReplaced {
                name: name.to_string(),
            });
        }

        self.store.publish(name, &instance, &shared.waits);
        Ok(instance)
    }

    /// Releases the claim on the bean and evicts every instance wired against
    /// it.
    fn fail(&self, frame: &Trace<'_>, err: &ResolveError) {
        let name = self.definition.name();
        drop(
            self.store
                .abandon(name, err, &self.context.shared().waits),
        );

        for dependent in frame.fail() {
            debug!(
                "Evicting bean '{}' wired against failed bean '{}'",
                dependent.name(),
                name
            );
            dependent.evict();
        }
    }
}

fn advance(state: BeanState, next: BeanState) -> BeanState {
    debug_assert!(state.can_advance_to(next));
    next
}

/// Releases a claimed name if creation unwinds before it completes.
struct CreationGuard<'a> {
    manager: &'a LifecycleManager<'a>,
    frame: &'a Trace<'a>,
    armed: bool,
}

impl<'a> CreationGuard<'a> {
    fn new(manager: &'a LifecycleManager<'a>, frame: &'a Trace<'a>) -> Self {
        Self {
            manager,
            frame,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let name = self.manager.definition.name();
            error!("Creation of bean '{}' was aborted", name);
            let err = ResolveError::CreationAborted {
                name: name.to_string(),
            };
            self.manager.fail(self.frame, &err);
        }
    }
}

/// Runs the destroy hooks of an evicted instance and returns its final
/// state. Hook failures are logged and do not stop the remaining hooks.
pub(crate) fn destroy(bean: LiveBean) -> BeanState {
    let LiveBean {
        name,
        instance,
        definition,
        state,
    } = bean;

    debug!("Destroying bean '{}'", name);
    for (index, hook) in definition.destroy_hooks().iter().enumerate() {
        if let Err(err) = hook(instance.as_ref()) {
            warn!("Destroy hook #{} of bean '{}' failed: {}", index, name, err);
        }
    }
    advance(state, BeanState::Destroyed)
}
