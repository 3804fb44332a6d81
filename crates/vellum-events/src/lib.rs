//! Synchronous event dispatch with per-dispatcher re-entrancy guards.
//!
//! All notification in the engine is synchronous and single-threaded: a
//! mutation settles its owner, then dispatch runs every listener before the
//! mutating call returns. The guard exists to break synchronous feedback
//! cycles (a listener whose own mutation would re-trigger the same
//! dispatcher), not for thread safety.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

/// Handle returned by [`EventDispatcher::subscribe`]; pass it back to
/// [`EventDispatcher::unsubscribe`] to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Listener<E> = Rc<dyn Fn(&E)>;

struct DispatcherCore<E> {
    listeners: RefCell<Vec<(u64, Listener<E>)>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
}

/// Explicit listener list with an owned "currently dispatching" flag.
///
/// A dispatch that arrives while this dispatcher is already mid-dispatch is
/// dropped (and traced); this is the engine's only re-entrancy discipline.
/// Clones share the listener list.
pub struct EventDispatcher<E> {
    core: Rc<DispatcherCore<E>>,
}

impl<E> Clone for EventDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<E> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            core: Rc::new(DispatcherCore {
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                dispatching: Cell::new(false),
            }),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        let id = self.core.next_id.get();
        self.core.next_id.set(id + 1);
        self.core
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription(id)
    }

    pub fn unsubscribe(&self, sub: Subscription) {
        self.core
            .listeners
            .borrow_mut()
            .retain(|(id, _)| *id != sub.0);
    }

    pub fn listener_count(&self) -> usize {
        self.core.listeners.borrow().len()
    }

    /// Invoke every listener registered at the start of the call.
    ///
    /// Listeners may subscribe/unsubscribe during dispatch (the list is
    /// snapshotted first); a re-entrant dispatch on this same dispatcher is
    /// suppressed.
    pub fn dispatch(&self, event: &E) {
        if self.core.dispatching.replace(true) {
            trace!(target: "events.dispatch", "reentrant dispatch suppressed");
            return;
        }
        let snapshot: Vec<Listener<E>> = self
            .core
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
        self.core.dispatching.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn dispatch_reaches_all_listeners() {
        let d: EventDispatcher<u32> = EventDispatcher::new();
        let hits = Rc::new(Cell::new(0u32));
        let h1 = Rc::clone(&hits);
        let h2 = Rc::clone(&hits);
        d.subscribe(move |v| h1.set(h1.get() + v));
        d.subscribe(move |v| h2.set(h2.get() + v));
        d.dispatch(&3);
        assert_eq!(hits.get(), 6);
    }

    #[test]
    fn unsubscribe_removes_listener() {
        let d: EventDispatcher<()> = EventDispatcher::new();
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let sub = d.subscribe(move |()| h.set(h.get() + 1));
        d.dispatch(&());
        d.unsubscribe(sub);
        d.dispatch(&());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn reentrant_dispatch_is_suppressed() {
        let d: EventDispatcher<u32> = EventDispatcher::new();
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let inner = d.clone();
        d.subscribe(move |_| {
            h.set(h.get() + 1);
            if h.get() < 5 {
                // Would loop forever without the guard.
                inner.dispatch(&0);
            }
        });
        d.dispatch(&0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn subscribing_during_dispatch_takes_effect_next_time() {
        let d: EventDispatcher<()> = EventDispatcher::new();
        let hits = Rc::new(Cell::new(0u32));
        let outer = d.clone();
        let h = Rc::clone(&hits);
        d.subscribe(move |()| {
            let h2 = Rc::clone(&h);
            outer.subscribe(move |()| h2.set(h2.get() + 1));
        });
        d.dispatch(&());
        assert_eq!(hits.get(), 0);
        d.dispatch(&());
        assert_eq!(hits.get(), 1);
    }
}
