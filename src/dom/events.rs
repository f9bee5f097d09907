use std::rc::Rc;

use kuchiki::NodeRef;

/// Callback stored in the listener registry. Identity is the allocation, so the
/// same `Listener` clone must be handed back to remove it.
pub type Listener = Rc<dyn Fn(&mut Event)>;

pub const DOM_CONTENT_LOADED: &str = "DOMContentLoaded";
pub const DOM_NODE_INSERTED: &str = "DOMNodeInserted";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self { capture: true }
    }
}

#[derive(Debug)]
pub struct Event {
    event_type: String,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub(crate) fn outcome(&self) -> DispatchOutcome {
        DispatchOutcome {
            default_prevented: self.default_prevented,
            propagation_stopped: self.propagation_stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

/// Anything listeners can be attached to. Targets that cannot carry listeners
/// keep the default methods, which do nothing.
pub trait EventTarget {
    fn add_event_listener(&self, _event_type: &str, _listener: Listener, _options: ListenerOptions) {
    }

    fn remove_event_listener(
        &self,
        _event_type: &str,
        _listener: &Listener,
        _options: ListenerOptions,
    ) {
    }
}

struct ListenerEntry {
    node: NodeRef,
    event_type: String,
    listener: Listener,
    options: ListenerOptions,
}

impl ListenerEntry {
    fn matches(
        &self,
        node: &NodeRef,
        event_type: &str,
        listener: &Listener,
        options: ListenerOptions,
    ) -> bool {
        self.node == *node
            && self.event_type == event_type
            && same_listener(&self.listener, listener)
            && self.options.capture == options.capture
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    entries: Vec<ListenerEntry>,
}

impl ListenerRegistry {
    pub(crate) fn add(
        &mut self,
        node: &NodeRef,
        event_type: &str,
        listener: Listener,
        options: ListenerOptions,
    ) {
        if self
            .entries
            .iter()
            .any(|entry| entry.matches(node, event_type, &listener, options))
        {
            return;
        }
        self.entries.push(ListenerEntry {
            node: node.clone(),
            event_type: event_type.to_string(),
            listener,
            options,
        });
    }

    pub(crate) fn remove(
        &mut self,
        node: &NodeRef,
        event_type: &str,
        listener: &Listener,
        options: ListenerOptions,
    ) {
        self.entries
            .retain(|entry| !entry.matches(node, event_type, listener, options));
    }

    /// Snapshot of the listeners for one node and phase, in registration order.
    pub(crate) fn snapshot(&self, node: &NodeRef, event_type: &str, capture: bool) -> Vec<Listener> {
        self.entries
            .iter()
            .filter(|entry| {
                entry.node == *node
                    && entry.event_type == event_type
                    && entry.options.capture == capture
            })
            .map(|entry| Rc::clone(&entry.listener))
            .collect()
    }

    pub(crate) fn count(&self, node: &NodeRef, event_type: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.node == *node && entry.event_type == event_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn node() -> NodeRef {
        NodeRef::new_text("target")
    }

    #[test]
    fn same_listener_is_registered_once() {
        let target = node();
        let mut registry = ListenerRegistry::default();
        let listener: Listener = Rc::new(|_| {});
        registry.add(&target, "click", Rc::clone(&listener), ListenerOptions::default());
        registry.add(&target, "click", Rc::clone(&listener), ListenerOptions::default());
        assert_eq!(registry.count(&target, "click"), 1);

        registry.add(&target, "click", Rc::clone(&listener), ListenerOptions::capture());
        assert_eq!(registry.count(&target, "click"), 2);
    }

    #[test]
    fn remove_only_drops_matching_options() {
        let target = node();
        let mut registry = ListenerRegistry::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let listener: Listener = Rc::new(move |_| counter.set(counter.get() + 1));

        registry.add(&target, "click", Rc::clone(&listener), ListenerOptions::capture());
        registry.remove(&target, "click", &listener, ListenerOptions::default());
        assert_eq!(registry.count(&target, "click"), 1);

        for listener in registry.snapshot(&target, "click", true) {
            listener(&mut Event::new("click"));
        }
        assert_eq!(hits.get(), 1);

        registry.remove(&target, "click", &listener, ListenerOptions::capture());
        assert_eq!(registry.count(&target, "click"), 0);
    }
}
