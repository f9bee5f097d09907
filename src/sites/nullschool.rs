use tracing::warn;
use url::Url;

use super::{PageContext, Site};
use crate::content::{
    build_element, watch_insertions_unique, DomError, ElementOptions, Outcome, UnregisterHandle,
};
use crate::dom::{Document, Element};
use crate::viewport::{parse_number, Fragment, ViewportError, ViewportState};

const TITLE: &str = "h1";
const ZOOM: f64 = 12.0;

/// Read the `loc=<lon>,<lat>` token of the `/`-separated hash. The page has no
/// usable zoom, so a fixed one is used.
pub fn position(location: &Url) -> Result<Fragment, ViewportError> {
    let loc = location
        .fragment()
        .and_then(|hash| hash.split('/').find_map(|token| token.strip_prefix("loc=")))
        .ok_or(ViewportError::Missing("loc= token"))?;
    let mut coordinates = loc.split(',');
    let (Some(lon), Some(lat)) = (coordinates.next(), coordinates.next()) else {
        return Err(ViewportError::Missing("latitude in loc= token"));
    };

    Ok(Fragment::Map(ViewportState::new(
        parse_number("latitude", lat)?,
        parse_number("longitude", lon)?,
        ZOOM,
    )))
}

fn read_view(document: &Document) -> Result<Fragment, ViewportError> {
    position(&document.location())
}

pub(super) fn install(context: &PageContext) -> UnregisterHandle {
    let Some(document) = context.document() else {
        return UnregisterHandle::noop();
    };
    let title = match build_title(context, &document) {
        Ok(title) => title,
        Err(err) => {
            warn!(
                target: "webgeo::site",
                site = %Site::Nullschool,
                error = %err,
                "could not build the title control"
            );
            return UnregisterHandle::noop();
        }
    };

    let provider_context = context.clone();
    let own_title = title.clone();
    let registration = watch_insertions_unique(
        &document,
        move || {
            provider_context
                .query_all(TITLE)
                .into_iter()
                .filter(|heading| *heading != own_title)
                .collect()
        },
        move |heading| match heading.parent_element() {
            Some(parent) => {
                parent.append_child(&title);
                Outcome::Handled
            }
            None => Outcome::NotHandled,
        },
    );

    context.styles().add(".webgeo-icon { margin-right: 0.5em; }");
    registration
}

/// One `<h1>` shared by every menu; it moves to whichever one shows up last.
fn build_title(context: &PageContext, document: &Document) -> Result<Element, DomError> {
    let icon = build_element(
        document,
        "img",
        ElementOptions::new()
            .attribute("src", &context.config().asset("earth-16.png"))
            .attribute("width", "16")
            .attribute("height", "16")
            .class("webgeo-icon"),
    )?;
    let label = build_element(document, "span", ElementOptions::new().text("WebGeo"))?;
    let button = build_element(
        document,
        "button",
        ElementOptions::new()
            .attribute("data-name", "webgeo")
            .attribute("aria-controls", "menu")
            .attribute("aria-labelledby", "webgeo webgeo-tt")
            .attribute("data-tooltip", "webgeo-tt")
            .attribute("title", "Go to webgeo")
            .attribute("aria-expanded", "true")
            .classes(["card", "no-touch-tt"])
            .child(icon)
            .child(label),
    )?;
    let control_context = context.clone();
    let link = build_element(
        document,
        "a",
        ElementOptions::new()
            .attribute("href", "#")
            .class("nav-link")
            .child(button)
            .on_created(move |link| {
                control_context.arm_control(Site::Nullschool, link, read_view)
            }),
    )?;
    build_element(document, "h1", ElementOptions::new().child(link))
}
