use std::f64::consts::PI;

use url::Url;

use super::{PageContext, Site};
use crate::content::{
    build_element, watch_insertions_unique, ElementOptions, Outcome, UnregisterHandle,
};
use crate::dom::{Document, Element};
use crate::viewport::{parse_leading_integer, parse_number, Fragment, ViewportError};

const PANEL: &str = "[data-ogsr-up]";
/// Ground resolution in metres per pixel at zoom 0 on the equator.
const EQUATOR_METERS_PER_PIXEL: f64 = 156543.03392;

/// Read the `@lat,lon,<n>z` / `@lat,lon,<n>m` path segment. Metre-based
/// segments are converted to a zoom level for a view `client_height` pixels
/// tall.
pub fn position(location: &Url, client_height: f64) -> Result<Fragment, ViewportError> {
    let segment = location
        .path_segments()
        .and_then(|mut segments| segments.find(|segment| segment.starts_with('@')))
        .ok_or(ViewportError::Missing("@ position segment"))?;

    let Some(scaled) = segment.strip_suffix('m') else {
        return Ok(Fragment::Google(segment.to_string()));
    };

    let mut parts = scaled.split(',');
    let (Some(at_lat), Some(lon), Some(distance)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ViewportError::Missing("distance in position segment"));
    };
    let lat = parse_number("latitude", at_lat.trim_start_matches('@'))?;
    let meters = parse_leading_integer("distance", distance)?;

    let zoom = (EQUATOR_METERS_PER_PIXEL * (lat * PI / 180.0).cos() * client_height / meters).log2();
    if !zoom.is_finite() {
        return Err(ViewportError::NotFinite("zoom"));
    }
    Ok(Fragment::Google(format!("{at_lat},{lon},{zoom}z")))
}

fn read_view(document: &Document) -> Result<Fragment, ViewportError> {
    position(&document.location(), document.client_height())
}

pub(super) fn install(context: &PageContext) -> UnregisterHandle {
    let Some(document) = context.document() else {
        return UnregisterHandle::noop();
    };

    let provider_context = context.clone();
    let inject_context = context.clone();
    let registration = watch_insertions_unique(
        &document,
        move || provider_context.query_all(PANEL),
        move |panel| Outcome::from(inject(&inject_context, panel)),
    );

    context.styles().add(".webgeo { padding: 0px !important; }");
    context.styles().add(".webgeo:hover { text-decoration: none; }");
    registration
}

fn inject(context: &PageContext, panel: &Element) -> anyhow::Result<Outcome> {
    let Some(document) = context.document() else {
        return Ok(Outcome::NotHandled);
    };
    let Some(first_link) = panel.child(0).and_then(|row| row.child(0)) else {
        return Ok(Outcome::NotHandled);
    };

    let icon = build_element(
        &document,
        "img",
        ElementOptions::new()
            .attribute("src", &context.config().asset("earth-32.png"))
            .attribute("width", "32")
            .attribute("height", "32"),
    )?;
    let control_context = context.clone();
    build_element(
        &document,
        "a",
        ElementOptions::new()
            .attribute("href", "#")
            .classes(first_link.class_list())
            .class("webgeo")
            .child(icon)
            .before(&first_link)
            .on_created(move |link| control_context.arm_control(Site::Google, link, read_view)),
    )?;
    Ok(Outcome::Handled)
}
