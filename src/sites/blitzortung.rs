use url::Url;

use super::{PageContext, Site};
use crate::content::{
    build_element, watch_insertions_unique, ElementOptions, Outcome, UnregisterHandle,
};
use crate::dom::{Document, Element};
use crate::viewport::{parse_number, Fragment, ViewportError, ViewportState};

const MENU_BUTTON: &str = "#MenuButtonDiv";

/// The hash is `<zoom>/<lat>/<lon>`; the viewer sits one zoom level deeper.
pub fn position(location: &Url) -> Result<Fragment, ViewportError> {
    let hash = location
        .fragment()
        .ok_or(ViewportError::Missing("location fragment"))?;
    let mut parts = hash.split('/');
    let (Some(zoom), Some(lat), Some(lon)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ViewportError::Missing("zoom/lat/lon in location fragment"));
    };

    Ok(Fragment::Map(ViewportState::new(
        parse_number("latitude", lat)?,
        parse_number("longitude", lon)?,
        parse_number("zoom", zoom)? + 1.0,
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
        move || provider_context.query_all(MENU_BUTTON),
        move |menu_button| Outcome::from(inject(&inject_context, menu_button)),
    )
}

fn inject(context: &PageContext, menu_button: &Element) -> anyhow::Result<Outcome> {
    let Some(parent) = menu_button.parent_element() else {
        return Ok(Outcome::NotHandled);
    };
    let Some(document) = context.document() else {
        return Ok(Outcome::NotHandled);
    };

    let style = format!(
        "right: 88px;background-image: url('{}'); background-repeat: round; border-radius: 50px",
        context.config().asset("earth-32.png")
    );
    let control_context = context.clone();
    build_element(
        &document,
        "a",
        ElementOptions::new()
            .attribute("href", "#")
            .attribute("style", &style)
            .parent(&parent)
            .class("MenuButtonDiv")
            .on_created(move |link| {
                control_context.arm_control(Site::Blitzortung, link, read_view)
            }),
    )?;
    Ok(Outcome::Handled)
}
