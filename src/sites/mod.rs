//! One adapter per supported map site. Each adapter finds a stable anchor in
//! the host page, injects a WebGeo control next to it and, on click, turns the
//! site's view state into a viewer link.

mod bing;
mod blitzortung;
mod geoportail;
mod google;
mod nullschool;
mod openstreetmap;
mod windy;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;
use url::Url;

use crate::config::ViewerConfig;
use crate::content::{
    open_link_in_new_tab, register_click_listener, Outcome, StyleSheet, UnregisterHandle,
};
use crate::dom::{Document, Element, ListenerOptions, WeakDocument};
use crate::viewport::{Fragment, ViewportError};

pub use bing::position as bing_position;
pub use blitzortung::position as blitzortung_position;
pub use geoportail::position as geoportail_position;
pub use google::position as google_position;
pub use nullschool::position as nullschool_position;
pub use openstreetmap::position as openstreetmap_position;
pub use windy::position as windy_position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Google,
    OpenStreetMap,
    Bing,
    Geoportail,
    Blitzortung,
    Nullschool,
    Windy,
}

impl Site {
    pub const ALL: [Site; 7] = [
        Site::Google,
        Site::OpenStreetMap,
        Site::Bing,
        Site::Geoportail,
        Site::Blitzortung,
        Site::Nullschool,
        Site::Windy,
    ];

    /// Pick the adapter for a page, if any.
    pub fn classify(location: &Url) -> Option<Site> {
        if location
            .host_str()
            .is_some_and(|host| host.contains("google"))
        {
            return Some(Site::Google);
        }
        if location.scheme() != "https" || location.port().is_some() {
            return None;
        }
        match location.host_str()? {
            "www.openstreetmap.org" | "openstreetmap.org" => Some(Site::OpenStreetMap),
            "www.bing.com" | "bing.com" => Some(Site::Bing),
            "www.geoportail.gouv.fr" | "geoportail.gouv.fr" => Some(Site::Geoportail),
            "map.blitzortung.org" => Some(Site::Blitzortung),
            "earth.nullschool.net" | "classic.nullschool.net" => Some(Site::Nullschool),
            "www.windy.com" | "windy.com" => Some(Site::Windy),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Site::Google => "google",
            Site::OpenStreetMap => "openstreetmap",
            Site::Bing => "bing",
            Site::Geoportail => "geoportail",
            Site::Blitzortung => "blitzortung",
            Site::Nullschool => "nullschool",
            Site::Windy => "windy",
        }
    }

    /// Arm the adapter: start watching for its anchor and add its styles.
    pub fn install(self, context: &PageContext) -> UnregisterHandle {
        match self {
            Site::Google => google::install(context),
            Site::OpenStreetMap => openstreetmap::install(context),
            Site::Bing => bing::install(context),
            Site::Geoportail => geoportail::install(context),
            Site::Blitzortung => blitzortung::install(context),
            Site::Nullschool => nullschool::install(context),
            Site::Windy => windy::install(context),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reads the current view from the page when the injected control is clicked.
type ClickHandler = fn(&Document) -> Result<Fragment, ViewportError>;

/// Everything an adapter needs from the page it runs in. Cheap to clone; the
/// document is held weakly so callbacks stored in the page do not keep it
/// alive.
#[derive(Clone)]
pub struct PageContext {
    document: WeakDocument,
    styles: StyleSheet,
    config: Rc<ViewerConfig>,
    controls: Rc<RefCell<Vec<Element>>>,
}

impl PageContext {
    pub fn new(document: &Document, styles: StyleSheet, config: ViewerConfig) -> Self {
        Self {
            document: document.downgrade(),
            styles,
            config: Rc::new(config),
            controls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn document(&self) -> Option<Document> {
        self.document.upgrade()
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Controls injected so far, in injection order.
    pub fn controls(&self) -> Vec<Element> {
        self.controls.borrow().clone()
    }

    pub(crate) fn query_all(&self, selectors: &str) -> Vec<Element> {
        self.document()
            .map(|document| document.query_selector_all(selectors))
            .unwrap_or_default()
    }

    /// Make `control` open the viewer at the position `handler` reads.
    pub(crate) fn arm_control(&self, site: Site, control: &Element, handler: ClickHandler) {
        let context = self.clone();
        register_click_listener(
            control,
            move || context.follow(site, handler),
            ListenerOptions::default(),
        );
        self.controls.borrow_mut().push(control.clone());
    }

    fn follow(&self, site: Site, handler: ClickHandler) -> Outcome {
        let Some(document) = self.document() else {
            return Outcome::NotHandled;
        };
        match handler(&document) {
            Ok(fragment) => {
                let link = self.config.link(&fragment);
                debug!(target: "webgeo::site", %site, %link, "opening viewer");
                Outcome::from(open_link_in_new_tab(&document, &link).map(|()| Outcome::Handled))
            }
            Err(err) => {
                debug!(target: "webgeo::site", %site, error = %err, "no viewport to share");
                Outcome::NotHandled
            }
        }
    }
}
