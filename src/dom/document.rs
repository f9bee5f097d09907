use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use html5ever::{LocalName, Namespace, QualName};
use kuchiki::traits::*;
use kuchiki::{parse_html, Attribute, ExpandedName, NodeRef};
use tracing::{debug, info};
use url::Url;

use super::element::Element;
use super::events::{
    DispatchOutcome, Event, EventTarget, Listener, ListenerOptions, ListenerRegistry,
    DOM_CONTENT_LOADED, DOM_NODE_INSERTED,
};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const DEFAULT_CLIENT_HEIGHT: f64 = 800.0;

type Task = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

pub(crate) struct DocumentInner {
    root: NodeRef,
    location: RefCell<Url>,
    ready_state: Cell<ReadyState>,
    listeners: RefCell<ListenerRegistry>,
    tasks: RefCell<VecDeque<Task>>,
    opened_tabs: RefCell<Vec<Url>>,
    client_height: Cell<f64>,
}

/// Non-owning handle used by callbacks stored inside the document itself.
#[derive(Clone)]
pub struct WeakDocument(Weak<DocumentInner>);

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.0.upgrade().map(|inner| Document { inner })
    }
}

/// Single-threaded page: the parsed tree plus everything a content script can
/// observe about it (location, readiness, listeners, pending tasks, opened tabs).
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    /// Parse `html` as a page that is still loading.
    pub fn parse(location: Url, html: &str) -> Self {
        Self::with_state(location, html, ReadyState::Loading)
    }

    /// Parse `html` as a page whose load already completed.
    pub fn loaded(location: Url, html: &str) -> Self {
        Self::with_state(location, html, ReadyState::Complete)
    }

    fn with_state(location: Url, html: &str, ready_state: ReadyState) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                root: parse_html().one(html),
                location: RefCell::new(location),
                ready_state: Cell::new(ready_state),
                listeners: RefCell::new(ListenerRegistry::default()),
                tasks: RefCell::new(VecDeque::new()),
                opened_tabs: RefCell::new(Vec::new()),
                client_height: Cell::new(DEFAULT_CLIENT_HEIGHT),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument(Rc::downgrade(&self.inner))
    }

    pub fn location(&self) -> Url {
        self.inner.location.borrow().clone()
    }

    pub fn set_location(&self, location: Url) {
        *self.inner.location.borrow_mut() = location;
    }

    pub fn ready_state(&self) -> ReadyState {
        self.inner.ready_state.get()
    }

    /// Move to `Interactive`, fire `DOMContentLoaded` and run what it queued.
    pub fn finish_parsing(&self) {
        if self.ready_state() != ReadyState::Loading {
            return;
        }
        self.inner.ready_state.set(ReadyState::Interactive);
        let mut event = Event::new(DOM_CONTENT_LOADED);
        self.dispatch(&self.inner.root, &mut event);
        self.run_tasks();
    }

    pub fn finish_loading(&self) {
        self.finish_parsing();
        self.inner.ready_state.set(ReadyState::Complete);
        self.run_tasks();
    }

    /// Defer `task` to the next tick.
    pub fn queue_task(&self, task: impl FnOnce() + 'static) {
        self.inner.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run queued tasks until the queue is empty. Returns how many ran.
    pub fn run_tasks(&self) -> usize {
        let mut executed = 0usize;
        loop {
            let next = self.inner.tasks.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    executed += 1;
                }
                None => break,
            }
        }
        executed
    }

    pub fn client_height(&self) -> f64 {
        self.inner.client_height.get()
    }

    pub fn set_client_height(&self, height: f64) {
        self.inner.client_height.set(height);
    }

    pub fn opened_tabs(&self) -> Vec<Url> {
        self.inner.opened_tabs.borrow().clone()
    }

    pub fn document_element(&self) -> Option<Element> {
        self.inner
            .root
            .children()
            .find(|node| node.as_element().is_some())
            .map(|node| self.wrap(node))
    }

    pub fn head(&self) -> Option<Element> {
        self.query_selector("head")
    }

    pub fn body(&self) -> Option<Element> {
        self.query_selector("body")
    }

    pub fn create_element(&self, tag_name: &str) -> Element {
        let name = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(tag_name.to_ascii_lowercase()),
        );
        let node = NodeRef::new_element(name, Vec::<(ExpandedName, Attribute)>::new());
        self.wrap(node)
    }

    pub fn query_selector_all(&self, selectors: &str) -> Vec<Element> {
        match self.inner.root.select(selectors) {
            Ok(matches) => matches
                .map(|found| self.wrap(found.as_node().clone()))
                .collect(),
            Err(()) => {
                debug!(target: "webgeo::dom", %selectors, "invalid selector");
                Vec::new()
            }
        }
    }

    pub fn query_selector(&self, selectors: &str) -> Option<Element> {
        self.query_selector_all(selectors).into_iter().next()
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner.listeners.borrow().count(&self.inner.root, event_type)
    }

    pub(crate) fn wrap(&self, node: NodeRef) -> Element {
        Element::new(node, self.downgrade())
    }

    pub(crate) fn add_listener(
        &self,
        node: &NodeRef,
        event_type: &str,
        listener: Listener,
        options: ListenerOptions,
    ) {
        self.inner
            .listeners
            .borrow_mut()
            .add(node, event_type, listener, options);
    }

    pub(crate) fn remove_listener(
        &self,
        node: &NodeRef,
        event_type: &str,
        listener: &Listener,
        options: ListenerOptions,
    ) {
        self.inner
            .listeners
            .borrow_mut()
            .remove(node, event_type, listener, options);
    }

    pub(crate) fn count_listeners(&self, node: &NodeRef, event_type: &str) -> usize {
        self.inner.listeners.borrow().count(node, event_type)
    }

    /// Dispatch `event` at `target`: capture listeners from the root down, then
    /// bubble listeners from the target up. Listener lists are snapshotted per
    /// node so callbacks are free to touch the registry and the tree.
    pub(crate) fn dispatch(&self, target: &NodeRef, event: &mut Event) -> DispatchOutcome {
        let chain: Vec<NodeRef> = target.inclusive_ancestors().collect();

        for node in chain.iter().rev() {
            let listeners = self
                .inner
                .listeners
                .borrow()
                .snapshot(node, event.event_type(), true);
            for listener in listeners {
                listener(event);
            }
            if event.propagation_stopped() {
                return event.outcome();
            }
        }

        for node in chain.iter() {
            let listeners = self
                .inner
                .listeners
                .borrow()
                .snapshot(node, event.event_type(), false);
            for listener in listeners {
                listener(event);
            }
            if event.propagation_stopped() {
                break;
            }
        }

        event.outcome()
    }

    pub(crate) fn notify_inserted(&self, node: &NodeRef) {
        let mut event = Event::new(DOM_NODE_INSERTED);
        self.dispatch(node, &mut event);
    }

    /// Default action of an activated `<a href>`.
    pub(crate) fn follow_link(&self, href: &str, target: Option<&str>) {
        let resolved = match self.location().join(href) {
            Ok(url) => url,
            Err(err) => {
                debug!(target: "webgeo::dom", %href, error = %err, "ignoring unresolvable link");
                return;
            }
        };

        if target == Some("_blank") {
            info!(target: "webgeo::dom", url = %resolved, "opening new tab");
            self.inner.opened_tabs.borrow_mut().push(resolved);
        } else {
            self.set_location(resolved);
        }
    }
}

impl EventTarget for Document {
    fn add_event_listener(&self, event_type: &str, listener: Listener, options: ListenerOptions) {
        self.add_listener(&self.inner.root, event_type, listener, options);
    }

    fn remove_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
        self.remove_listener(&self.inner.root, event_type, listener, options);
    }
}
