use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use kuchiki::traits::*;
use kuchiki::NodeRef;
use tracing::debug;

use super::document::{Document, WeakDocument};
use super::events::{DispatchOutcome, Event, EventTarget, Listener, ListenerOptions};

/// Handle to an element node. Equality and hashing follow node identity, so two
/// handles obtained from separate queries compare equal when they name the
/// same node.
#[derive(Clone)]
pub struct Element {
    node: NodeRef,
    document: WeakDocument,
}

impl Element {
    pub(crate) fn new(node: NodeRef, document: WeakDocument) -> Self {
        Self { node, document }
    }

    /// Owning document, if it is still alive.
    pub fn document(&self) -> Option<Document> {
        self.document.upgrade()
    }

    fn wrap(&self, node: NodeRef) -> Element {
        Element::new(node, self.document.clone())
    }

    pub fn tag_name(&self) -> String {
        self.node
            .as_element()
            .map(|data| data.name.local.to_string())
            .unwrap_or_default()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        let data = self.node.as_element()?;
        let attributes = data.attributes.borrow();
        attributes.get(name).map(str::to_string)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        if let Some(data) = self.node.as_element() {
            data.attributes
                .borrow_mut()
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    pub fn id(&self) -> Option<String> {
        self.attribute("id")
    }

    pub fn set_id(&self, id: &str) {
        self.set_attribute("id", id);
    }

    pub fn class_name(&self) -> String {
        self.attribute("class").unwrap_or_default()
    }

    pub fn set_class_name(&self, value: &str) {
        self.set_attribute("class", value);
    }

    pub fn class_list(&self) -> Vec<String> {
        self.class_name()
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn add_class(&self, class: &str) {
        let mut classes = self.class_list();
        if classes.iter().any(|existing| existing == class) {
            return;
        }
        classes.push(class.to_string());
        self.set_class_name(&classes.join(" "));
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().iter().any(|existing| existing == class)
    }

    pub fn text_content(&self) -> String {
        self.node.text_contents()
    }

    /// Replace every child with a single text node.
    pub fn set_text_content(&self, text: &str) {
        for child in self.node.children().collect::<Vec<_>>() {
            child.detach();
        }
        if text.is_empty() {
            return;
        }
        let text_node = NodeRef::new_text(text);
        self.node.append(text_node.clone());
        self.notify_inserted(&text_node);
    }

    pub fn parent_element(&self) -> Option<Element> {
        self.node
            .parent()
            .filter(|parent| parent.as_element().is_some())
            .map(|parent| self.wrap(parent))
    }

    pub fn children(&self) -> Vec<Element> {
        self.node
            .children()
            .filter(|child| child.as_element().is_some())
            .map(|child| self.wrap(child))
            .collect()
    }

    pub fn child(&self, index: usize) -> Option<Element> {
        self.children().into_iter().nth(index)
    }

    pub fn query_selector_all(&self, selectors: &str) -> Vec<Element> {
        match self.node.descendants().select(selectors) {
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

    pub fn is_connected(&self) -> bool {
        self.node
            .inclusive_ancestors()
            .last()
            .map(|root| root.as_document().is_some())
            .unwrap_or(false)
    }

    pub fn append_child(&self, child: &Element) {
        if self.would_cycle(child) {
            return;
        }
        self.node.append(child.node.clone());
        self.notify_inserted(&child.node);
    }

    /// Insert `child` before `reference`, or at the end when `reference` is
    /// `None`. A reference that is not a child of this element appends.
    pub fn insert_before(&self, child: &Element, reference: Option<&Element>) {
        if self.would_cycle(child) {
            return;
        }
        match reference {
            Some(reference) if reference.node == child.node => {}
            Some(reference) if reference.node.parent().as_ref() == Some(&self.node) => {
                reference.node.insert_before(child.node.clone());
                self.notify_inserted(&child.node);
            }
            _ => self.append_child(child),
        }
    }

    /// Insert `sibling` right after this element. Returns `false` when this
    /// element has no parent.
    pub fn after(&self, sibling: &Element) -> bool {
        if self.node.parent().is_none() || sibling.node == self.node {
            return false;
        }
        self.node.insert_after(sibling.node.clone());
        self.notify_inserted(&sibling.node);
        true
    }

    /// Insert `sibling` right before this element. Returns `false` when this
    /// element has no parent.
    pub fn before(&self, sibling: &Element) -> bool {
        if self.node.parent().is_none() || sibling.node == self.node {
            return false;
        }
        self.node.insert_before(sibling.node.clone());
        self.notify_inserted(&sibling.node);
        true
    }

    pub fn remove(&self) {
        self.node.detach();
    }

    pub fn dispatch_event(&self, event: &mut Event) -> DispatchOutcome {
        match self.document() {
            Some(document) => document.dispatch(&self.node, event),
            None => event.outcome(),
        }
    }

    /// Fire a `click` and, unless a listener prevented it, run the default
    /// action of links.
    pub fn click(&self) -> DispatchOutcome {
        let mut event = Event::new("click");
        let outcome = self.dispatch_event(&mut event);
        if outcome.default_prevented || self.tag_name() != "a" {
            return outcome;
        }
        if let (Some(document), Some(href)) = (self.document(), self.attribute("href")) {
            document.follow_link(&href, self.attribute("target").as_deref());
        }
        outcome
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.document()
            .map(|document| document.count_listeners(&self.node, event_type))
            .unwrap_or(0)
    }

    fn would_cycle(&self, child: &Element) -> bool {
        let cycle = self
            .node
            .inclusive_ancestors()
            .any(|ancestor| ancestor == child.node);
        if cycle {
            debug!(target: "webgeo::dom", tag = %child.tag_name(), "refusing to insert an ancestor");
        }
        cycle
    }

    fn notify_inserted(&self, node: &NodeRef) {
        if let Some(document) = self.document() {
            document.notify_inserted(node);
        }
    }
}

impl EventTarget for Element {
    fn add_event_listener(&self, event_type: &str, listener: Listener, options: ListenerOptions) {
        if let Some(document) = self.document() {
            document.add_listener(&self.node, event_type, listener, options);
        }
    }

    fn remove_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
        if let Some(document) = self.document() {
            document.remove_listener(&self.node, event_type, listener, options);
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.node.0), state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tag = f.debug_struct("Element");
        tag.field("tag", &self.tag_name());
        if let Some(id) = self.id() {
            tag.field("id", &id);
        }
        let class = self.class_name();
        if !class.is_empty() {
            tag.field("class", &class);
        }
        tag.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;
    use url::Url;

    fn page(html: &str) -> Document {
        Document::loaded(Url::parse("https://example.com/").unwrap(), html)
    }

    #[test]
    fn handles_from_separate_queries_are_equal() {
        let document = page("<div id=\"a\"></div>");
        let first = document.query_selector("#a").unwrap();
        let second = document.query_selector("div").unwrap();
        assert_eq!(first, second);

        let mut set = HashSet::new();
        set.insert(first);
        assert!(set.contains(&second));
    }

    #[test]
    fn class_list_is_deduplicated() {
        let document = page("");
        let element = document.create_element("a");
        element.add_class("nav-link");
        element.add_class("webgeo");
        element.add_class("nav-link");
        assert_eq!(element.class_name(), "nav-link webgeo");
        assert!(element.has_class("webgeo"));
    }

    #[test]
    fn insert_before_places_child_ahead_of_reference() {
        let document = page("<ul><li id=\"one\"></li></ul>");
        let list = document.query_selector("ul").unwrap();
        let first = document.query_selector("#one").unwrap();
        let item = document.create_element("li");
        item.set_id("zero");

        list.insert_before(&item, Some(&first));

        let ids: Vec<_> = list.children().iter().filter_map(Element::id).collect();
        assert_eq!(ids, vec!["zero", "one"]);
    }

    #[test]
    fn insertion_bubbles_to_document_element() {
        let document = page("<div id=\"host\"></div>");
        let html = document.document_element().unwrap();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let listener: Listener = Rc::new(move |_| counter.set(counter.get() + 1));
        html.add_event_listener(
            crate::dom::DOM_NODE_INSERTED,
            listener,
            ListenerOptions::default(),
        );

        let host = document.query_selector("#host").unwrap();
        host.append_child(&document.create_element("span"));
        assert_eq!(seen.get(), 1);

        // Detached subtrees never reach the document element.
        let detached = document.create_element("div");
        detached.append_child(&document.create_element("span"));
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn prevented_click_does_not_follow_link() {
        let document = page("");
        let link = document.create_element("a");
        link.set_attribute("href", "https://viewer.example/");
        link.set_attribute("target", "_blank");
        let listener: Listener = Rc::new(|event| event.prevent_default());
        link.add_event_listener("click", Rc::clone(&listener), ListenerOptions::default());

        assert!(link.click().default_prevented);
        assert!(document.opened_tabs().is_empty());

        link.remove_event_listener("click", &listener, ListenerOptions::default());
        link.click();
        assert_eq!(document.opened_tabs().len(), 1);
    }

    #[test]
    fn text_content_replaces_children() {
        let document = page("<p id=\"p\"><b>old</b> text</p>");
        let paragraph = document.query_selector("#p").unwrap();
        paragraph.set_text_content("48.85, 2.35");
        assert_eq!(paragraph.text_content(), "48.85, 2.35");
        assert!(paragraph.children().is_empty());
    }

    #[test]
    fn handles_outliving_their_document_are_inert() {
        let document = page("<div id=\"host\"></div>");
        let host = document.query_selector("#host").unwrap();
        let link = document.create_element("a");
        link.set_attribute("href", "https://viewer.example/");
        link.set_attribute("target", "_blank");
        drop(document);
        assert!(link.document().is_none());

        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        let registration = crate::content::register_listener(
            &link,
            "click",
            move |_| counter.set(counter.get() + 1),
            ListenerOptions::default(),
        );
        assert_eq!(link.listener_count("click"), 0);
        registration.unregister();

        let outcome = link.click();
        assert!(!outcome.default_prevented);
        assert_eq!(clicks.get(), 0);

        host.append_child(&link);
        assert_eq!(link.parent_element(), Some(host));
        assert_eq!(link.listener_count("click"), 0);
    }

    #[test]
    fn refuses_to_insert_an_ancestor() {
        let document = page("<div id=\"outer\"><div id=\"inner\"></div></div>");
        let outer = document.query_selector("#outer").unwrap();
        let inner = document.query_selector("#inner").unwrap();
        inner.append_child(&outer);
        assert_eq!(inner.parent_element(), Some(outer));
    }
}
