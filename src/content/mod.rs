//! Building blocks shared by every site adapter: readiness, style injection,
//! listener registration, insertion watching and element construction.

mod element;
mod listener;
mod ready;
mod style;
mod watcher;

pub use element::{build_element, open_link_in_new_tab, DomError, ElementOptions};
pub use listener::{register_click_listener, register_listener, Outcome, UnregisterHandle};
pub use ready::ReadySignal;
pub use style::StyleSheet;
pub use watcher::{watch_insertions, watch_insertions_unique};
