use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::dom::{Event, EventTarget, Listener, ListenerOptions};

/// What a content-script callback did with the element or event it was given.
#[derive(Debug)]
pub enum Outcome {
    Handled,
    /// Nothing was done; watchers retry the element on a later insertion.
    NotHandled,
    Failed(anyhow::Error),
}

impl From<bool> for Outcome {
    fn from(handled: bool) -> Self {
        if handled {
            Outcome::Handled
        } else {
            Outcome::NotHandled
        }
    }
}

impl<E> From<Result<Outcome, E>> for Outcome
where
    E: Into<anyhow::Error>,
{
    fn from(result: Result<Outcome, E>) -> Self {
        result.unwrap_or_else(|err| Outcome::Failed(err.into()))
    }
}

/// Releases one registration when [`UnregisterHandle::unregister`] is called.
/// Dropping the handle keeps the registration alive.
pub struct UnregisterHandle {
    release: Option<Box<dyn FnOnce()>>,
}

impl UnregisterHandle {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn noop() -> Self {
        Self { release: None }
    }

    pub fn unregister(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for UnregisterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnregisterHandle")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

pub fn register_listener<T>(
    target: &T,
    event_type: &str,
    callback: impl Fn(&mut Event) + 'static,
    options: ListenerOptions,
) -> UnregisterHandle
where
    T: EventTarget + Clone + 'static,
{
    let listener: Listener = Rc::new(callback);
    target.add_event_listener(event_type, Rc::clone(&listener), options);

    let target = target.clone();
    let event_type = event_type.to_string();
    UnregisterHandle::new(move || {
        target.remove_event_listener(&event_type, &listener, options);
    })
}

/// Click listener that always prevents the default action, then reports
/// whether `callback` consumed the click.
pub fn register_click_listener<T>(
    target: &T,
    callback: impl Fn() -> Outcome + 'static,
    options: ListenerOptions,
) -> UnregisterHandle
where
    T: EventTarget + Clone + 'static,
{
    register_listener(
        target,
        "click",
        move |event| {
            event.prevent_default();
            match callback() {
                Outcome::Handled => trace!(target: "webgeo", "click consumed"),
                Outcome::NotHandled => trace!(target: "webgeo", "click not consumed"),
                Outcome::Failed(err) => {
                    warn!(target: "webgeo", error = %err, "click handler failed")
                }
            }
        },
        options,
    )
}
