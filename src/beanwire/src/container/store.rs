use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use oneshot::{Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};

use crate::bean::{BeanDefinition, BeanRef};
use crate::container::lifecycle::BeanState;
use crate::container::ResolveError;
use crate::scope::ScopeKind;

/// Live instances of one scope kind, keyed by bean name.
///
/// Each entry carries the lifecycle state of its instance and the thread
/// driving its creation. An entry exists from the moment a creation claims
/// the name until the instance is destroyed, which is what serializes
/// concurrent creations of the same bean. A store of a scope that is not
/// cached, i.e. [`ScopeKind::Prototype`], never retains anything.
pub struct ScopeStore {
    scope: ScopeKind,
    slots: Mutex<HashMap<String, Slot>>,
}

impl ScopeStore {
    pub fn new(scope: ScopeKind) -> Self {
        Self {
            scope,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    fn retains(&self) -> bool {
        self.scope.is_cached()
    }

    /// Returns the fully initialized instance stored under `name`.
    pub fn get(&self, name: &str) -> Option<BeanRef> {
        if !self.retains() {
            return None;
        }
        self.slots
            .lock()
            .get(name)
            .filter(|slot| slot.state == BeanState::Initialized)
            .and_then(|slot| slot.instance.clone())
    }

    pub fn state(&self, name: &str) -> Option<BeanState> {
        self.slots.lock().get(name).map(|slot| slot.state)
    }

    /// Decides how the current thread obtains the bean described by
    /// `definition`: reuse an initialized instance, observe an instance being
    /// wired on its own resolution chain, wait for another thread, or create
    /// it. In the last case the name stays reserved for the current thread
    /// until [`ScopeStore::publish`] or [`ScopeStore::abandon`].
    pub(crate) fn claim(
        &self,
        definition: &Arc<BeanDefinition>,
        waits: &WaitGraph,
    ) -> Result<Claim, ResolveError> {
        if !self.retains() {
            return Ok(Claim::Owned);
        }

        let name = definition.name();
        let current = thread::current().id();
        let mut slots = self.slots.lock();

        let Some(slot) = slots.get_mut(name) else {
            slots.insert(
                name.to_string(),
                Slot::new(Arc::clone(definition), current),
            );
            return Ok(Claim::Owned);
        };

        if slot.state == BeanState::Initialized {
            if let Some(instance) = &slot.instance {
                return Ok(Claim::Ready(Arc::clone(instance)));
            }
        }

        if slot.owner == current || !waits.try_wait(current, slot.owner) {
            // Either the current thread re-enters its own creation, or waiting
            // would close a cycle of threads waiting on each other.
            return match &slot.instance {
                Some(instance) => Ok(Claim::InProgress(Arc::clone(instance))),
                None => Err(ResolveError::CyclicDependency {
                    name: name.to_string(),
                }),
            };
        }

        let (sender, receiver) = oneshot::channel();
        slot.waiters.push(Waiter {
            thread: current,
            sender,
        });
        Ok(Claim::Wait(receiver))
    }

    /// Stores a raw instance before it is wired.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::AlreadyPresent`] if an instance is already
    /// stored under the same name.
    pub fn put(
        &self,
        definition: &Arc<BeanDefinition>,
        instance: BeanRef,
    ) -> Result<(), ResolveError> {
        if !self.retains() {
            return Ok(());
        }

        let name = definition.name();
        let mut slots = self.slots.lock();
        let slot = slots.entry(name.to_string()).or_insert_with(|| {
            Slot::new(Arc::clone(definition), thread::current().id())
        });

        if slot.instance.is_some() {
            return Err(ResolveError::AlreadyPresent {
                name: name.to_string(),
                scope: self.scope,
            });
        }
        slot.instance = Some(instance);
        slot.state = BeanState::Creating;
        Ok(())
    }

    /// Moves the instance under `name` forward in its lifecycle.
    pub(crate) fn advance(&self, name: &str, state: BeanState) {
        if let Some(slot) = self.slots.lock().get_mut(name) {
            debug_assert!(slot.state.can_advance_to(state));
            slot.state = state;
        }
    }

    /// Marks `instance`, stored under `name`, as initialized and hands it to
    /// every thread waiting for it.
    pub(crate) fn publish(&self, name: &str, instance: &BeanRef, waits: &WaitGraph) {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.get_mut(name) else {
            return;
        };
        debug_assert!(slot.state.can_advance_to(BeanState::Initialized));
        slot.state = BeanState::Initialized;

        let waiters = std::mem::take(&mut slot.waiters);
        let response = WaitResponse::Constructed(Arc::clone(instance));
        Self::notify(slots, waits, waiters, response);
    }

    /// Releases a failed creation: evicts the partially built instance under
    /// `name` and hands `err` to every thread waiting for it.
    pub(crate) fn abandon(
        &self,
        name: &str,
        err: &ResolveError,
        waits: &WaitGraph,
    ) -> Option<BeanRef> {
        let mut slots = self.slots.lock();
        match slots.get(name) {
            Some(slot) if slot.state != BeanState::Initialized => {}
            _ => return None,
        }
        let slot = slots.remove(name)?;
        Self::notify(slots, waits, slot.waiters, WaitResponse::Error(err.clone()));
        slot.instance
    }

    /// Evicts the initialized instance under `name` for disposal. Instances
    /// still being created are left alone.
    pub(crate) fn remove(&self, name: &str) -> Option<LiveBean> {
        let mut slots = self.slots.lock();
        match slots.get(name) {
            Some(slot) if slot.state == BeanState::Initialized => {}
            _ => return None,
        }
        slots
            .remove(name)
            .and_then(|slot| LiveBean::from_slot(name.to_string(), slot))
    }

    /// Evicts every initialized instance for disposal.
    pub(crate) fn drain(&self) -> Vec<LiveBean> {
        let mut slots = self.slots.lock();
        let names: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.state == BeanState::Initialized)
            .map(|(name, _)| name.clone())
            .collect();

        names
            .into_iter()
            .filter_map(|name| {
                let slot = slots.remove(&name)?;
                LiveBean::from_slot(name, slot)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hands `response` to `waiters`. Their edges in `waits` are removed
    /// while the store is still locked, so that the notifying thread never
    /// sees itself waited for by a thread it has already released.
    fn notify(
        slots: MutexGuard<'_, HashMap<String, Slot>>,
        waits: &WaitGraph,
        waiters: Vec<Waiter>,
        response: WaitResponse,
    ) {
        for waiter in &waiters {
            waits.release(waiter.thread);
        }
        drop(slots);
        for waiter in waiters {
            let _ = waiter.sender.send(response.clone());
        }
    }
}

struct Slot {
    state: BeanState,
    instance: Option<BeanRef>,
    definition: Arc<BeanDefinition>,
    owner: ThreadId,
    waiters: Vec<Waiter>,
}

struct Waiter {
    thread: ThreadId,
    sender: Sender<WaitResponse>,
}

impl Slot {
    fn new(definition: Arc<BeanDefinition>, owner: ThreadId) -> Self {
        Self {
            state: BeanState::Uncreated,
            instance: None,
            definition,
            owner,
            waiters: Vec::new(),
        }
    }
}

/// An initialized instance evicted from its store, together with the
/// definition it was built from.
pub(crate) struct LiveBean {
    pub name: String,
    pub instance: BeanRef,
    pub definition: Arc<BeanDefinition>,
    pub state: BeanState,
}

impl LiveBean {
    pub fn new(name: impl Into<String>, instance: BeanRef, definition: Arc<BeanDefinition>) -> Self {
        Self {
            name: name.into(),
            instance,
            definition,
            state: BeanState::Initialized,
        }
    }

    fn from_slot(name: String, slot: Slot) -> Option<Self> {
        let instance = slot.instance?;
        Some(Self {
            state: slot.state,
            ..Self::new(name, instance, slot.definition)
        })
    }
}

pub(crate) enum Claim {
    Ready(BeanRef),
    InProgress(BeanRef),
    Wait(Receiver<WaitResponse>),
    Owned,
}

#[derive(Clone)]
pub(crate) enum WaitResponse {
    Constructed(BeanRef),
    Error(ResolveError),
}

/// Records which thread each blocked thread is waiting for, across every
/// store of a container.
pub(crate) struct WaitGraph {
    edges: Mutex<HashMap<ThreadId, ThreadId>>,
}

impl WaitGraph {
    pub fn new() -> Self {
        Self {
            edges: Mutex::new(HashMap::new()),
        }
    }

    /// Records that `waiter` waits for `owner`, unless `owner` is already
    /// waiting for `waiter` directly or transitively.
    pub fn try_wait(&self, waiter: ThreadId, owner: ThreadId) -> bool {
        let mut edges = self.edges.lock();

        let mut current = owner;
        for _ in 0..=edges.len() {
            if current == waiter {
                return false;
            }
            match edges.get(&current) {
                Some(next) => current = *next,
                None => break,
            }
        }

        edges.insert(waiter, owner);
        true
    }

    pub fn release(&self, waiter: ThreadId) {
        self.edges.lock().remove(&waiter);
    }
}
