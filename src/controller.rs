use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::content::{ReadySignal, StyleSheet, UnregisterHandle};
use crate::dom::{Document, Element};
use crate::sites::{PageContext, Site};

/// Per-page state of the content script: the ready signal, the page
/// stylesheet and the active adapter, if the page belongs to a supported site.
pub struct PageController {
    site: Option<Site>,
    ready: ReadySignal,
    context: PageContext,
    registration: Option<UnregisterHandle>,
}

impl PageController {
    /// Classify the page and arm the matching adapter. Pages of unsupported
    /// sites get a controller with no adapter and no effect on the DOM.
    pub fn install(document: &Document, config: ViewerConfig) -> Self {
        info!(target: "webgeo", "content script loaded");

        let ready = ReadySignal::new(document);
        let styles = StyleSheet::new(document, &ready);
        let context = PageContext::new(document, styles, config);

        let location = document.location();
        let site = Site::classify(&location);
        let registration = match site {
            Some(site) => {
                info!(target: "webgeo", %site, %location, "site detected");
                Some(site.install(&context))
            }
            None => {
                debug!(target: "webgeo", %location, "no adapter for page");
                None
            }
        };

        info!(target: "webgeo", "content script executed");
        Self {
            site,
            ready,
            context,
            registration,
        }
    }

    pub fn site(&self) -> Option<Site> {
        self.site
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn ready(&self) -> &ReadySignal {
        &self.ready
    }

    pub fn styles(&self) -> &StyleSheet {
        self.context.styles()
    }

    /// Controls injected so far, in injection order.
    pub fn controls(&self) -> Vec<Element> {
        self.context.controls()
    }

    /// Stop watching for anchors. Controls already injected stay armed.
    pub fn uninstall(self) {
        if let Some(registration) = self.registration {
            registration.unregister();
        }
    }
}
