use super::{PageContext, Site};
use crate::content::{
    build_element, watch_insertions_unique, ElementOptions, Outcome, UnregisterHandle,
};
use crate::dom::{Document, Element, Event};
use crate::viewport::{parse_number, Fragment, ViewportError, ViewportState};

const COORDINATES: &str = "#reverse-geocoding-coords";
const SCALE: &str = "#numeric-scale";
const LINK_ID: &str = "reverse-geocoding-link-to-webgeo";
const ZOOM_PREFIX: &str = "Zoom : ";
const DEFAULT_ZOOM: f64 = 18.0;

/// Build the position from the `lat, lon` text of the reverse geocoding panel
/// and the scale tooltip. A tooltip without a `Zoom : N` line gives zoom 18.
pub fn position(coordinates: &str, scale_title: Option<&str>) -> Result<Fragment, ViewportError> {
    let mut parts = coordinates
        .split(',')
        .map(|part| part.split_whitespace().collect::<String>());
    let (Some(lat), Some(lon)) = (parts.next(), parts.next()) else {
        return Err(ViewportError::Missing("longitude in coordinates"));
    };

    let zoom = scale_title.and_then(zoom_from_title).unwrap_or(DEFAULT_ZOOM);
    Ok(Fragment::Map(ViewportState::new(
        parse_number("latitude", &lat)?,
        parse_number("longitude", &lon)?,
        zoom,
    )))
}

fn zoom_from_title(title: &str) -> Option<f64> {
    title
        .lines()
        .find_map(|line| line.strip_prefix(ZOOM_PREFIX))
        .and_then(|zoom| zoom.trim().parse::<f64>().ok())
        .filter(|zoom| zoom.is_finite())
}

/// The scale element only fills its tooltip on hover, so hover it first.
fn read_view(document: &Document) -> Result<Fragment, ViewportError> {
    let coordinates = document
        .query_selector(COORDINATES)
        .ok_or(ViewportError::Missing("coordinates panel"))?
        .text_content();

    let title = document.query_selector(SCALE).and_then(|scale| {
        scale.dispatch_event(&mut Event::new("mouseover"));
        scale.attribute("title")
    });
    position(&coordinates, title.as_deref())
}

pub(super) fn install(context: &PageContext) -> UnregisterHandle {
    let Some(document) = context.document() else {
        return UnregisterHandle::noop();
    };

    let provider_context = context.clone();
    let inject_context = context.clone();
    let registration = watch_insertions_unique(
        &document,
        move || provider_context.query_all(COORDINATES),
        move |coordinates| Outcome::from(inject(&inject_context, coordinates)),
    );

    context
        .styles()
        .add(".webgeo-icon { vertical-align: sub; margin-right: 3px; margin-top: 4px; }");
    registration
}

fn inject(context: &PageContext, coordinates: &Element) -> anyhow::Result<Outcome> {
    let Some(parent) = coordinates.parent_element() else {
        return Ok(Outcome::NotHandled);
    };
    let Some(document) = context.document() else {
        return Ok(Outcome::NotHandled);
    };

    let icon = build_element(
        &document,
        "img",
        ElementOptions::new()
            .attribute("src", &context.config().asset("earth-16.png"))
            .attribute("width", "16")
            .attribute("height", "16")
            .class("webgeo-icon"),
    )?;
    let label = build_element(&document, "span", ElementOptions::new().text("Link to WebGeo"))?;
    let control_context = context.clone();
    let link = build_element(
        &document,
        "a",
        ElementOptions::new()
            .attribute("href", "#")
            .child(icon)
            .child(label)
            .class("nav-link")
            .on_created(move |link| {
                control_context.arm_control(Site::Geoportail, link, read_view)
            }),
    )?;
    build_element(
        &document,
        "div",
        ElementOptions::new().id(LINK_ID).parent(&parent).child(link),
    )?;
    Ok(Outcome::Handled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_zoom_from_the_tooltip() {
        let fragment = position("48.85, 2.35", Some("Échelle : 1 : 5000\nZoom : 15\nRésolution : 4 m")).unwrap();
        assert_eq!(fragment.to_string(), "map=15/48.85/2.35");
    }

    #[test]
    fn defaults_to_zoom_18() {
        assert_eq!(
            position("48.85,2.35", None).unwrap().to_string(),
            "map=18/48.85/2.35"
        );
        assert_eq!(
            position(" 48.85 , 2.35 ", Some("Échelle : 1 : 5000")).unwrap().to_string(),
            "map=18/48.85/2.35"
        );
        assert_eq!(
            position("48.85,2.35", Some("Zoom : ?")).unwrap().to_string(),
            "map=18/48.85/2.35"
        );
    }

    #[test]
    fn rejects_incomplete_coordinates() {
        assert_eq!(
            position("48.85", None),
            Err(ViewportError::Missing("longitude in coordinates"))
        );
        assert!(position("north, east", None).is_err());
    }
}
