use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::dom::{Document, ListenerOptions, ReadyState, WeakDocument, DOM_CONTENT_LOADED};

use super::listener::{register_listener, UnregisterHandle};

type Waiter = Box<dyn FnOnce()>;

struct ReadyInner {
    document: WeakDocument,
    fired: Cell<bool>,
    waiters: RefCell<Vec<Waiter>>,
    registration: RefCell<Option<UnregisterHandle>>,
}

/// Resolves once, when the document stops loading. Clones share the same
/// state; the underlying `DOMContentLoaded` listener is registered at most
/// once and removed as soon as it fires.
#[derive(Clone)]
pub struct ReadySignal {
    inner: Rc<ReadyInner>,
}

impl ReadySignal {
    pub fn new(document: &Document) -> Self {
        let signal = Self {
            inner: Rc::new(ReadyInner {
                document: document.downgrade(),
                fired: Cell::new(false),
                waiters: RefCell::new(Vec::new()),
                registration: RefCell::new(None),
            }),
        };

        if document.ready_state() != ReadyState::Loading {
            let pending = signal.clone();
            document.queue_task(move || pending.resolve());
        } else {
            let weak = Rc::downgrade(&signal.inner);
            let registration = register_listener(
                document,
                DOM_CONTENT_LOADED,
                move |_| {
                    if let Some(inner) = weak.upgrade() {
                        ReadySignal { inner }.resolve();
                    }
                },
                ListenerOptions::default(),
            );
            *signal.inner.registration.borrow_mut() = Some(registration);
        }

        signal
    }

    pub fn is_ready(&self) -> bool {
        self.inner.fired.get()
    }

    /// Run `callback` once the document is ready. After resolution callbacks
    /// are deferred to the next tick rather than run inline.
    pub fn then(&self, callback: impl FnOnce() + 'static) {
        if !self.inner.fired.get() {
            self.inner.waiters.borrow_mut().push(Box::new(callback));
            return;
        }
        if let Some(document) = self.inner.document.upgrade() {
            document.queue_task(callback);
        }
    }

    fn resolve(&self) {
        if self.inner.fired.replace(true) {
            return;
        }
        let registration = self.inner.registration.borrow_mut().take();
        if let Some(registration) = registration {
            registration.unregister();
        }
        let waiters = std::mem::take(&mut *self.inner.waiters.borrow_mut());
        for waiter in waiters {
            waiter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn url() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn waits_for_content_loaded_and_unregisters() {
        let document = Document::parse(url(), "<p></p>");
        let signal = ReadySignal::new(&document);
        let hits = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let counter = Rc::clone(&hits);
            signal.then(move || counter.set(counter.get() + 1));
        }
        assert_eq!(document.listener_count(DOM_CONTENT_LOADED), 1);
        assert!(!signal.is_ready());

        document.finish_parsing();

        assert!(signal.is_ready());
        assert_eq!(hits.get(), 3);
        assert_eq!(document.listener_count(DOM_CONTENT_LOADED), 0);
    }

    #[test]
    fn already_loaded_document_resolves_on_next_tick() {
        let document = Document::loaded(url(), "<p></p>");
        let signal = ReadySignal::new(&document);
        let hit = Rc::new(Cell::new(false));
        let flag = Rc::clone(&hit);
        signal.then(move || flag.set(true));

        assert!(!hit.get());
        assert_eq!(document.listener_count(DOM_CONTENT_LOADED), 0);
        document.run_tasks();
        assert!(hit.get());
    }

    #[test]
    fn late_listeners_are_deferred() {
        let document = Document::loaded(url(), "");
        let signal = ReadySignal::new(&document);
        document.run_tasks();
        assert!(signal.is_ready());

        let hit = Rc::new(Cell::new(false));
        let flag = Rc::clone(&hit);
        signal.clone().then(move || flag.set(true));
        assert!(!hit.get());
        assert_eq!(document.run_tasks(), 1);
        assert!(hit.get());
    }
}
