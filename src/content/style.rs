use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{Document, Element, WeakDocument};

use super::ready::ReadySignal;

struct StyleInner {
    document: WeakDocument,
    ready: ReadySignal,
    element: RefCell<Option<Element>>,
    content: RefCell<String>,
}

/// Accumulated stylesheet backed by one lazily created `<style>` element that
/// joins `<head>` once the document is ready.
#[derive(Clone)]
pub struct StyleSheet {
    inner: Rc<StyleInner>,
}

impl StyleSheet {
    pub fn new(document: &Document, ready: &ReadySignal) -> Self {
        Self {
            inner: Rc::new(StyleInner {
                document: document.downgrade(),
                ready: ready.clone(),
                element: RefCell::new(None),
                content: RefCell::new(String::new()),
            }),
        }
    }

    pub fn add(&self, css: &str) {
        let Some(document) = self.inner.document.upgrade() else {
            return;
        };

        let existing = self.inner.element.borrow().clone();
        let element = match existing {
            Some(element) => {
                self.inner.content.borrow_mut().push('\n');
                element
            }
            None => {
                let element = document.create_element("style");
                *self.inner.element.borrow_mut() = Some(element.clone());
                let pending = element.clone();
                let weak = self.inner.document.clone();
                self.inner.ready.then(move || {
                    if let Some(head) = weak.upgrade().and_then(|document| document.head()) {
                        head.append_child(&pending);
                    }
                });
                element
            }
        };

        let text = {
            let mut content = self.inner.content.borrow_mut();
            content.push_str(css);
            content.clone()
        };
        element.set_text_content(&text);
    }

    pub fn text(&self) -> String {
        self.inner.content.borrow().clone()
    }

    pub fn element(&self) -> Option<Element> {
        self.inner.element.borrow().clone()
    }
}
