use thiserror::Error;
use url::Url;

use crate::dom::{Document, Element};

#[derive(Debug, Error)]
pub enum DomError {
    #[error("both a previous and a next sibling were given")]
    ConflictingSiblings,
    #[error("sibling <{0}> has no parent to insert next to")]
    DetachedSibling(String),
}

type OnCreated = Box<dyn FnOnce(&Element)>;

/// Optional facets applied by [`build_element`]. Every facet left unset is
/// skipped.
#[derive(Default)]
pub struct ElementOptions {
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
    parent: Option<Element>,
    classes: Vec<String>,
    id: Option<String>,
    prev_sibling: Option<Element>,
    next_sibling: Option<Element>,
    on_created: Option<OnCreated>,
}

impl ElementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn parent(mut self, parent: &Element) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Insert the new element right after `sibling`.
    pub fn after(mut self, sibling: &Element) -> Self {
        self.prev_sibling = Some(sibling.clone());
        self
    }

    /// Insert the new element right before `sibling`.
    pub fn before(mut self, sibling: &Element) -> Self {
        self.next_sibling = Some(sibling.clone());
        self
    }

    pub fn on_created(mut self, callback: impl FnOnce(&Element) + 'static) -> Self {
        self.on_created = Some(Box::new(callback));
        self
    }
}

/// Create `<tag>` and apply `options` in a fixed order: attributes, text,
/// children, parent, classes, id, sibling insertion, then `on_created`.
pub fn build_element(
    document: &Document,
    tag: &str,
    options: ElementOptions,
) -> Result<Element, DomError> {
    if options.prev_sibling.is_some() && options.next_sibling.is_some() {
        return Err(DomError::ConflictingSiblings);
    }
    if let Some(sibling) = options.prev_sibling.as_ref().or(options.next_sibling.as_ref()) {
        if sibling.parent_element().is_none() {
            return Err(DomError::DetachedSibling(sibling.tag_name()));
        }
    }

    let element = document.create_element(tag);
    for (name, value) in &options.attributes {
        element.set_attribute(name, value);
    }
    if let Some(text) = &options.text {
        element.set_text_content(text);
    }
    for child in &options.children {
        element.append_child(child);
    }
    if let Some(parent) = &options.parent {
        parent.append_child(&element);
    }
    for class in &options.classes {
        element.add_class(class);
    }
    if let Some(id) = &options.id {
        element.set_id(id);
    }
    if let Some(prev_sibling) = &options.prev_sibling {
        prev_sibling.after(&element);
    }
    if let Some(next_sibling) = &options.next_sibling {
        next_sibling.before(&element);
    }
    if let Some(on_created) = options.on_created {
        on_created(&element);
    }
    Ok(element)
}

/// Open `url` in a new tab through an off-document `<a target="_blank">`.
pub fn open_link_in_new_tab(document: &Document, url: &Url) -> Result<(), DomError> {
    let link = build_element(
        document,
        "a",
        ElementOptions::new()
            .attribute("href", url.as_str())
            .attribute("target", "_blank"),
    )?;
    link.click();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn page(html: &str) -> Document {
        Document::loaded(Url::parse("https://example.com/").unwrap(), html)
    }

    #[test]
    fn applies_every_facet() {
        let document = page("<div id=\"host\"></div>");
        let host = document.query_selector("#host").unwrap();
        let created = Rc::new(Cell::new(false));
        let flag = Rc::clone(&created);

        let icon = build_element(
            &document,
            "img",
            ElementOptions::new()
                .attribute("src", "earth-16.png")
                .attribute("width", "16"),
        )
        .unwrap();
        let link = build_element(
            &document,
            "a",
            ElementOptions::new()
                .attribute("href", "#")
                .child(icon.clone())
                .child(build_element(&document, "span", ElementOptions::new().text("WebGeo")).unwrap())
                .parent(&host)
                .classes(["nav-link", "webgeo"])
                .id("webgeo-link")
                .on_created(move |element| flag.set(element.is_connected())),
        )
        .unwrap();

        assert!(created.get());
        assert_eq!(link.parent_element(), Some(host));
        assert_eq!(link.attribute("href").as_deref(), Some("#"));
        assert_eq!(link.class_name(), "nav-link webgeo");
        assert_eq!(link.id().as_deref(), Some("webgeo-link"));
        assert_eq!(link.children().len(), 2);
        assert_eq!(link.child(0), Some(icon));
        assert_eq!(link.text_content(), "WebGeo");
    }

    #[test]
    fn inserts_relative_to_siblings() {
        let document = page("<ul><li id=\"a\"></li><li id=\"b\"></li></ul>");
        let a = document.query_selector("#a").unwrap();
        let b = document.query_selector("#b").unwrap();

        build_element(&document, "li", ElementOptions::new().id("after-a").after(&a)).unwrap();
        build_element(&document, "li", ElementOptions::new().id("before-a").before(&a)).unwrap();
        build_element(&document, "li", ElementOptions::new().id("after-b").after(&b)).unwrap();

        let list = document.query_selector("ul").unwrap();
        let ids: Vec<_> = list.children().iter().filter_map(Element::id).collect();
        assert_eq!(ids, vec!["before-a", "a", "after-a", "b", "after-b"]);
    }

    #[test]
    fn rejects_conflicting_siblings() {
        let document = page("<ul><li id=\"a\"></li><li id=\"b\"></li></ul>");
        let a = document.query_selector("#a").unwrap();
        let b = document.query_selector("#b").unwrap();

        let result = build_element(&document, "li", ElementOptions::new().after(&a).before(&b));
        assert!(matches!(result, Err(DomError::ConflictingSiblings)));
        assert_eq!(document.query_selector_all("li").len(), 2);
    }

    #[test]
    fn rejects_detached_sibling() {
        let document = page("");
        let loose = document.create_element("span");
        let result = build_element(&document, "a", ElementOptions::new().before(&loose));
        assert!(matches!(result, Err(DomError::DetachedSibling(tag)) if tag == "span"));
    }

    #[test]
    fn opens_links_in_a_new_tab_without_touching_the_page() {
        let document = page("<div></div>");
        let before = document.query_selector_all("a").len();
        let url = Url::parse("https://webgiss.github.io/webgeo/#map=12/48.85/2.35").unwrap();

        open_link_in_new_tab(&document, &url).unwrap();

        assert_eq!(document.opened_tabs(), vec![url]);
        assert_eq!(document.query_selector_all("a").len(), before);
        assert_eq!(document.location().as_str(), "https://example.com/");
    }
}
