//! In-process page model the content script runs against: a `kuchiki` tree
//! plus the browser-side state a script can observe.

mod document;
mod element;
mod events;

pub use document::{Document, ReadyState, WeakDocument};
pub use element::Element;
pub use events::{
    DispatchOutcome, Event, EventTarget, Listener, ListenerOptions, DOM_CONTENT_LOADED,
    DOM_NODE_INSERTED,
};
