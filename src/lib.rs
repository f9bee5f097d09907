//! Adds a "open in WebGeo" control to map sites and turns the site's current
//! view into a link to the WebGeo viewer.

pub mod config;
pub mod content;
pub mod controller;
pub mod dom;
pub mod sites;
pub mod viewport;

pub use config::{ConfigError, ViewerConfig};
pub use controller::PageController;
pub use dom::Document;
pub use sites::{PageContext, Site};
pub use viewport::{Fragment, ViewportError, ViewportState};
