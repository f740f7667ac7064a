//! Listener registration on host dispatch targets
//!
//! An [`EventHub`] owns one dispatch target and tracks which event types its
//! owner is subscribed to. It guarantees exactly one native attach per
//! transition into the registered state and exactly one detach per
//! transition out of it, and implements one-shot ("once") subscriptions
//! that clear themselves after their first delivery.

use std::collections::HashMap;
use tracing::{trace, warn};

/// A host object that events can be attached to, such as an in-flight fetch.
pub trait DispatchTarget {
    /// Native attach of the hub's single listener for `event_type`.
    fn attach(&mut self, event_type: &str);
    /// Native detach of the hub's single listener for `event_type`.
    fn detach(&mut self, event_type: &str);
}

/// An event delivered by a host dispatch target.
pub trait HostEvent {
    fn event_type(&self) -> &str;
}

/// The single subscriber an [`EventHub`] delivers to.
pub trait EventHandler<E> {
    fn handle_event(&mut self, event_type: &str, event: E);
}

impl<E, F> EventHandler<E> for F
where
    F: FnMut(&str, E),
{
    fn handle_event(&mut self, event_type: &str, event: E) {
        self(event_type, event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registration {
    once: bool,
}

/// Registration state for one dispatch target.
#[derive(Debug)]
pub struct EventHub<T: DispatchTarget> {
    target: T,
    registrations: HashMap<String, Registration>,
}

impl<T: DispatchTarget> EventHub<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            registrations: HashMap::new(),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    pub fn is_registered(&self, event_type: &str) -> bool {
        self.registrations.contains_key(event_type)
    }

    /// Start listening for `event_type`.
    ///
    /// A second call for an already registered type is a no-op: the target is
    /// not re-attached and the original `once` flag is kept.
    pub fn register(&mut self, event_type: &str, once: bool) {
        if self.registrations.contains_key(event_type) {
            trace!("Already registered for '{}', ignoring", event_type);
            return;
        }
        self.registrations
            .insert(event_type.to_string(), Registration { once });
        self.target.attach(event_type);
        trace!("Registered for '{}' (once={})", event_type, once);
    }

    /// Stop listening for `event_type`.
    ///
    /// Unregistering a type that is not registered is a programming error.
    pub fn unregister(&mut self, event_type: &str) {
        let removed = self.registrations.remove(event_type);
        debug_assert!(
            removed.is_some(),
            "unregister of '{event_type}' without a registration"
        );
        match removed {
            Some(_) => {
                self.target.detach(event_type);
                trace!("Unregistered from '{}'", event_type);
            }
            None => warn!("Ignoring unregister of '{}': not registered", event_type),
        }
    }

    /// Deliver `event` to `handler` if its type is registered.
    ///
    /// A `once` registration is cleared and detached after this delivery.
    /// Returns whether the handler was invoked.
    pub fn dispatch<E, H>(&mut self, event: E, handler: &mut H) -> bool
    where
        E: HostEvent,
        H: EventHandler<E> + ?Sized,
    {
        let event_type = event.event_type().to_string();
        let Some(registration) = self.registrations.get(&event_type).copied() else {
            debug_assert!(false, "dispatch of '{event_type}' without a registration");
            warn!("Dropping '{}' event: not registered", event_type);
            return false;
        };

        handler.handle_event(&event_type, event);

        if registration.once {
            self.registrations.remove(&event_type);
            self.target.detach(&event_type);
            trace!("Cleared once registration for '{}'", event_type);
        }
        true
    }
}
