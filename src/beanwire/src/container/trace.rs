use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::container::context::ScopeContext;

/// One frame of the chain of beans the current thread is creating, linked
/// from the most recently requested bean back to the first one.
///
/// When a frame hands out an instance that is still being wired further up
/// the chain, every frame in between becomes provisional: its instance holds
/// a reference to a bean whose creation may still fail. Provisional frames
/// hand themselves to their parent on success, so that the frame closing the
/// cycle can evict them all if it fails.
pub(crate) struct Trace<'a> {
    name: &'a str,
    depth: usize,
    anchor: Cell<usize>,
    dependents: RefCell<Vec<Provisional>>,
    previous: Option<&'a Trace<'a>>,
}

impl<'a> Trace<'a> {
    pub fn new(name: &'a str, previous: Option<&'a Trace<'a>>) -> Self {
        let depth = previous.map_or(0, |previous| previous.depth + 1);
        Self {
            name,
            depth,
            anchor: Cell::new(depth),
            dependents: RefCell::new(Vec::new()),
            previous,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn iter(&self) -> TraceIter<'_> {
        TraceIter {
            current: Some(self),
        }
    }

    /// Returns the depth of the frame creating `name`, if any.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.iter()
            .find(|frame| frame.name == name)
            .map(|frame| frame.depth)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Marks every frame deeper than `depth` as dependent on the frame at
    /// `depth`.
    pub fn close_cycle(&self, depth: usize) {
        for frame in self.iter().take_while(|frame| frame.depth > depth) {
            if frame.anchor.get() > depth {
                frame.anchor.set(depth);
            }
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.anchor.get() < self.depth
    }

    /// Completes this frame. A provisional frame passes itself and its own
    /// dependents on to its parent, and the parent inherits the anchor.
    pub fn complete(&self, own: Option<Provisional>) {
        let dependents = self.dependents.take();
        if !self.is_provisional() {
            return;
        }
        let Some(previous) = self.previous else {
            return;
        };

        if previous.anchor.get() > self.anchor.get() {
            previous.anchor.set(self.anchor.get());
        }
        let mut inherited = previous.dependents.borrow_mut();
        inherited.extend(dependents);
        inherited.extend(own);
    }

    /// Fails this frame and returns the instances that must be evicted with
    /// it.
    pub fn fail(&self) -> Vec<Provisional> {
        self.dependents.take()
    }
}

pub(crate) struct TraceIter<'a> {
    current: Option<&'a Trace<'a>>,
}

impl<'a> Iterator for TraceIter<'a> {
    type Item = &'a Trace<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = current.previous;
        Some(current)
    }
}

/// A stored instance that was wired against a bean still being created.
pub(crate) struct Provisional {
    context: Arc<ScopeContext>,
    name: String,
}

impl Provisional {
    pub fn new(context: Arc<ScopeContext>, name: impl Into<String>) -> Self {
        Self {
            context,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evict(self) {
        self.context.evict(&self.name);
    }
}
