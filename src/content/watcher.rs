use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::dom::{Document, Element, ListenerOptions, DOM_NODE_INSERTED};

use super::listener::{register_listener, Outcome, UnregisterHandle};

struct BusyGuard<'a>(&'a Cell<bool>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Call `callback` now and after every insertion under the document element.
/// Insertions caused while `callback` runs are dropped, not queued.
pub fn watch_insertions(document: &Document, callback: impl FnMut() + 'static) -> UnregisterHandle {
    let busy = Rc::new(Cell::new(false));
    let callback = RefCell::new(callback);
    let on_inserted: Rc<dyn Fn()> = Rc::new(move || {
        if busy.replace(true) {
            trace!(target: "webgeo::watcher", "dropping re-entrant insertion");
            return;
        }
        let _guard = BusyGuard(&busy);
        (&mut *callback.borrow_mut())();
    });

    let registration = match document.document_element() {
        Some(root) => {
            let on_inserted = Rc::clone(&on_inserted);
            register_listener(
                &root,
                DOM_NODE_INSERTED,
                move |_| on_inserted(),
                ListenerOptions::default(),
            )
        }
        None => UnregisterHandle::noop(),
    };

    on_inserted();
    registration
}

/// Elements a watcher already passed to its callback.
#[derive(Debug, Default)]
pub(crate) struct HandledElements {
    elements: HashSet<Element>,
}

impl HandledElements {
    /// Returns `false` when the element was already marked.
    pub(crate) fn mark(&mut self, element: &Element) -> bool {
        self.elements.insert(element.clone())
    }

    pub(crate) fn evict(&mut self, element: &Element) {
        self.elements.remove(element);
    }
}

/// Hand every element produced by `provider` to `callback` exactly once.
/// An element answered with [`Outcome::NotHandled`] is offered again on the
/// next insertion; a failure is logged and not retried.
pub fn watch_insertions_unique<P, C>(
    document: &Document,
    provider: P,
    mut callback: C,
) -> UnregisterHandle
where
    P: Fn() -> Vec<Element> + 'static,
    C: FnMut(&Element) -> Outcome + 'static,
{
    let mut handled = HandledElements::default();
    watch_insertions(document, move || {
        for element in provider() {
            if !handled.mark(&element) {
                continue;
            }
            match callback(&element) {
                Outcome::Handled => {}
                Outcome::NotHandled => handled.evict(&element),
                Outcome::Failed(err) => {
                    warn!(target: "webgeo::watcher", ?element, error = %err, "element handler failed");
                }
            }
        }
    })
}
