use url::Url;

use super::{PageContext, Site};
use crate::content::{
    build_element, watch_insertions_unique, ElementOptions, Outcome, UnregisterHandle,
};
use crate::dom::{Document, Element};
use crate::viewport::{
    parse_leading_integer, parse_number, Fragment, ViewportError, ViewportState,
};

const CONTROLS: &str = ".top-right.subcontrol-container";
const PITCH_CONTROL: &str = "[aria-label=\"Pitch Control\"]";

/// Read `cp=<lat>~<lon>` and `lvl=<zoom>` from the query string.
pub fn position(location: &Url) -> Result<Fragment, ViewportError> {
    let mut center = None;
    let mut level = None;
    for (key, value) in location.query_pairs() {
        match key.as_ref() {
            "cp" => center = Some(value.into_owned()),
            "lvl" => level = Some(value.into_owned()),
            _ => {}
        }
    }

    let center = center.ok_or(ViewportError::Missing("cp parameter"))?;
    let mut coordinates = center.split('~');
    let (Some(lat), Some(lon)) = (coordinates.next(), coordinates.next()) else {
        return Err(ViewportError::Missing("longitude in cp parameter"));
    };
    let level = level.ok_or(ViewportError::Missing("lvl parameter"))?;

    Ok(Fragment::Map(ViewportState::new(
        parse_number("latitude", lat)?,
        parse_number("longitude", lon)?,
        parse_leading_integer("lvl", &level)?,
    )))
}

fn read_view(document: &Document) -> Result<Fragment, ViewportError> {
    position(&document.location())
}

pub(super) fn install(context: &PageContext) -> UnregisterHandle {
    let Some(document) = context.document() else {
        return UnregisterHandle::noop();
    };
    let provider_context = context.clone();
    let inject_context = context.clone();
    watch_insertions_unique(
        &document,
        move || provider_context.query_all(CONTROLS),
        move |container| Outcome::from(inject(&inject_context, container)),
    )
}

fn inject(context: &PageContext, container: &Element) -> anyhow::Result<Outcome> {
    // The container is created empty and filled later; wait for its controls.
    if container.query_selector(PITCH_CONTROL).is_none() {
        return Ok(Outcome::NotHandled);
    }
    let Some(document) = context.document() else {
        return Ok(Outcome::NotHandled);
    };

    let icon = build_element(
        &document,
        "img",
        ElementOptions::new()
            .attribute("src", &context.config().asset("earth-32.png"))
            .attribute("width", "32px")
            .attribute("height", "32px"),
    )?;
    let control_context = context.clone();
    let link = build_element(
        &document,
        "a",
        ElementOptions::new()
            .attribute("href", "#")
            .child(icon)
            .on_created(move |link| control_context.arm_control(Site::Bing, link, read_view)),
    )?;
    build_element(
        &document,
        "div",
        ElementOptions::new()
            .classes(["azure-maps-control-container", "light"])
            .parent(container)
            .child(link),
    )?;
    Ok(Outcome::Handled)
}
