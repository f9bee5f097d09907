use tracing::warn;
use url::Url;

use super::{PageContext, Site};
use crate::content::{
    build_element, watch_insertions_unique, DomError, ElementOptions, Outcome, UnregisterHandle,
};
use crate::dom::{Document, Element};
use crate::viewport::{Fragment, ViewportError};

const NAVIGATION: &str = "nav.secondary";
const ICON: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAYAAAAf8/9hAAAABHNCSVQICAgIfAhkiAAAAAlwSFlzAAADdgAAA3YBfdWCzAAAABl0RVh0U29mdHdhcmUAd3d3Lmlua3NjYXBlLm9yZ5vuPBoAAAJuSURBVDiNlZLLS1RRHMc/9555+B5v1JhK6PigRZrGWFlSUSlRumjjJgPBgnYt2kW7/oHAXEjkItoUlBsLe0guWhiiaeAYWDI+0GEcBx0nnevce+5tMTY+kqDv6nDO9/v9ffl9j8Ie+KEauA1cBkq3rmeAAQWejsDETr7y51ABbg88wuG9g/euiqcZMipTj/oUxN7C0mOpmEvdCbgXgGTaYEvcj9Z6kZIeELl7g6Ug4zDbASuvPulwNQBJAeCDLrTWVspeguoGYLP8Ha7mTpwNrzGLRjDDRxDJQtBaQQ/4hD6phaBf8UM1Du84VT9VRC7J0kHcDb0Un17A5Xakh899yyD5pBvVzAK5BhMVUjUjNaIIHnD4fr2dfx7jykNKbvRxqDKBcKi70ucVGESiy4j5+lRKW1et+OCmCjSS34Je84yDZ8bY+GUSDetEwzqxtQSmNFPbVhRy64a3HT0tKNCk+CHOiXgOag7SGQPFSnMsVUdq09ieBYTbhLUCXMHG7YWO58UdgI1tAyAMz67YAnCGCiG0XyU2gK0C82xO71/bv5DSzKnAR2Jv/t8g1gfwQamDKjtVo7AdmRjnOsmpHSO5WERy+BquuQt/i2UMJiqkZS4fF4uwVGyte21j6pTZ8YWj1yfxeCVa+SrZdUOsOMcRPy6x/ettCLbBxmjXV3guADQYcCW+nzUPZpSpvmyy8lJkp1PlQGWU8GICR6g2NTnYhr3aO6BAewgsARABqcELV2BWW/8c8a9QrOpuE0uRSNtgfcZAHRqG4E3JxmiXAu2jYLAjVxon4ZiEWwo0yUx8lguccWaweG9BzxhM7uT/BkHD6xG17TgoAAAAAElFTkSuQmCC";

/// Return the `map=<zoom>/<lat>/<lon>` token of the page fragment as is.
pub fn position(location: &Url) -> Result<Fragment, ViewportError> {
    location
        .fragment()
        .ok_or(ViewportError::Missing("location fragment"))?
        .split('&')
        .find(|token| token.starts_with("map="))
        .map(|token| Fragment::Verbatim(token.to_string()))
        .ok_or(ViewportError::Missing("map= token"))
}

fn read_view(document: &Document) -> Result<Fragment, ViewportError> {
    position(&document.location())
}

pub(super) fn install(context: &PageContext) -> UnregisterHandle {
    let Some(document) = context.document() else {
        return UnregisterHandle::noop();
    };
    let nav_item = match build_nav_item(context, &document) {
        Ok(item) => item,
        Err(err) => {
            warn!(
                target: "webgeo::site",
                site = %Site::OpenStreetMap,
                error = %err,
                "could not build the navigation item"
            );
            return UnregisterHandle::noop();
        }
    };

    let provider_context = context.clone();
    let registration = watch_insertions_unique(
        &document,
        move || provider_context.query_all(NAVIGATION),
        move |navigation| place(&nav_item, navigation),
    );

    context
        .styles()
        .add(".webgeo-icon { vertical-align: sub; margin-right: 3px; margin-top: 5px; }");
    registration
}

/// The `<li>` is built once and moved in front of the first entry of every
/// secondary navigation that shows up.
fn build_nav_item(context: &PageContext, document: &Document) -> Result<Element, DomError> {
    let icon = build_element(
        document,
        "img",
        ElementOptions::new()
            .attribute("src", ICON)
            .attribute("width", "16")
            .attribute("height", "16")
            .class("webgeo-icon"),
    )?;
    let label = build_element(document, "span", ElementOptions::new().text("WebGeo"))?;
    let control_context = context.clone();
    let link = build_element(
        document,
        "a",
        ElementOptions::new()
            .attribute("href", "#")
            .child(icon)
            .child(label)
            .class("nav-link")
            .on_created(move |link| {
                control_context.arm_control(Site::OpenStreetMap, link, read_view)
            }),
    )?;
    build_element(document, "li", ElementOptions::new().child(link))
}

fn place(nav_item: &Element, navigation: &Element) -> Outcome {
    let Some(list) = navigation.child(0) else {
        return Outcome::NotHandled;
    };
    let Some(first_item) = list.child(0) else {
        return Outcome::NotHandled;
    };
    if first_item != *nav_item {
        let class_name = format!("{} webgeo", first_item.class_name());
        nav_item.set_class_name(class_name.trim_start());
        list.insert_before(nav_item, Some(&first_item));
    }
    Outcome::Handled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_map_token() {
        let url = Url::parse("https://www.openstreetmap.org/#map=15/48.8500/2.3500&layers=C").unwrap();
        assert_eq!(position(&url).unwrap().to_string(), "map=15/48.8500/2.3500");

        let url = Url::parse("https://www.openstreetmap.org/#layers=C&map=3/1/2").unwrap();
        assert_eq!(position(&url).unwrap().to_string(), "map=3/1/2");
    }

    #[test]
    fn requires_a_map_token() {
        let url = Url::parse("https://www.openstreetmap.org/").unwrap();
        assert_eq!(position(&url), Err(ViewportError::Missing("location fragment")));

        let url = Url::parse("https://www.openstreetmap.org/#layers=C").unwrap();
        assert_eq!(position(&url), Err(ViewportError::Missing("map= token")));
    }
}
