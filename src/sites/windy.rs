use url::Url;

use super::{PageContext, Site};
use crate::content::{
    build_element, watch_insertions_unique, ElementOptions, Outcome, UnregisterHandle,
};
use crate::dom::{Document, Element};
use crate::viewport::{parse_number, Fragment, ViewportError, ViewportState};

const OVERLAY: &str = "#overlay";
const TOGGLE_OVERLAYS: &str = "[data-do=toggleOverlays]";

/// The query is a `,`-separated list such as `rain,2024-05-01-12:00,48.85,2.35,8`.
/// Tokens holding a `:` are dropped; the last three left are lat, lon, zoom.
pub fn position(location: &Url) -> Result<Fragment, ViewportError> {
    let query = location
        .query()
        .ok_or(ViewportError::Missing("query string"))?;
    let params: Vec<&str> = query.split(',').filter(|param| !param.contains(':')).collect();
    let [lat, lon, zoom] = params
        .get(params.len().saturating_sub(3)..)
        .and_then(|tail| <[&str; 3]>::try_from(tail).ok())
        .ok_or(ViewportError::Missing("lat,lon,zoom in query string"))?;

    Ok(Fragment::Map(ViewportState::new(
        parse_number("latitude", lat)?,
        parse_number("longitude", lon)?,
        parse_number("zoom", zoom)?,
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
    let registration = watch_insertions_unique(
        &document,
        move || provider_context.query_all(OVERLAY),
        move |overlay| Outcome::from(inject(&inject_context, overlay)),
    );

    context.styles().add(
        "#rhpane #overlay a .iconfont.webgeo-icon { width: 24px; height: 24px; margin-right: 0px; margin-left: 1px; margin-top: 0px; margin-bottom: 1px; background-color: #fff; padding: 4px; }",
    );
    registration
}

fn inject(context: &PageContext, overlay: &Element) -> anyhow::Result<Outcome> {
    let Some(toggle) = overlay.query_selector(TOGGLE_OVERLAYS) else {
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
            .classes(["webgeo-icon", "iconfont", "notap"]),
    )?;
    let label = build_element(
        &document,
        "span",
        ElementOptions::new()
            .text("WebGeo")
            .classes(["menu-text", "notap"]),
    )?;
    let control_context = context.clone();
    build_element(
        &document,
        "a",
        ElementOptions::new()
            .attribute("href", "#")
            .child(icon)
            .child(label)
            .before(&toggle)
            .on_created(move |link| control_context.arm_control(Site::Windy, link, read_view)),
    )?;
    Ok(Outcome::Handled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_last_three_plain_tokens() {
        let url = Url::parse("https://www.windy.com/?48.85,2.35,8").unwrap();
        assert_eq!(position(&url).unwrap().to_string(), "map=8/48.85/2.35");

        let url = Url::parse("https://www.windy.com/?rain,2024-05-01-12:00,-33.86,151.2,5").unwrap();
        assert_eq!(
            position(&url),
            Ok(Fragment::Map(ViewportState::new(-33.86, 151.2, 5.0)))
        );
    }

    #[test]
    fn needs_three_tokens() {
        let url = Url::parse("https://www.windy.com/").unwrap();
        assert_eq!(position(&url), Err(ViewportError::Missing("query string")));

        let url = Url::parse("https://www.windy.com/?2.35,8").unwrap();
        assert_eq!(
            position(&url),
            Err(ViewportError::Missing("lat,lon,zoom in query string"))
        );

        let url = Url::parse("https://www.windy.com/?wind,48.85,2.35").unwrap();
        assert!(position(&url).is_err());
    }
}
