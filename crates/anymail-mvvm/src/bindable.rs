//! Bindable property host.
//!
//! A view-model embeds a [`PropertyChanged`] and routes every setter through
//! [`PropertyChanged::set`]. Assigning a different value raises exactly one
//! notification naming the property; assigning an equal value does nothing.
//!
//! ```
//! use anymail_mvvm::{Bindable, PropertyChanged};
//!
//! #[derive(Default)]
//! struct Form {
//!     changed: PropertyChanged,
//!     host: String,
//! }
//!
//! impl Form {
//!     fn set_host(&mut self, value: String) {
//!         self.changed.set(&mut self.host, value, "Host");
//!     }
//! }
//!
//! impl Bindable for Form {
//!     fn property_changed(&self) -> &PropertyChanged {
//!         &self.changed
//!     }
//! }
//!
//! let mut form = Form::default();
//! form.property_changed().subscribe(|args| println!("{} changed", args.property_name()));
//! form.set_host("smtp.example.com".into());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::weak_event::SubscriptionToken;

/// Arguments of a property-changed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyChangedEventArgs {
    property_name: &'static str,
}

impl PropertyChangedEventArgs {
    /// Creates arguments naming `property_name`.
    #[must_use]
    pub const fn new(property_name: &'static str) -> Self {
        Self { property_name }
    }

    /// Name of the property that changed.
    #[must_use]
    pub const fn property_name(&self) -> &'static str {
        self.property_name
    }
}

/// Property-changed subscriber.
pub type PropertyChangedHandler = Arc<dyn Fn(&PropertyChangedEventArgs) + Send + Sync>;

/// Property-changed notification channel.
#[derive(Default)]
pub struct PropertyChanged {
    handlers: Mutex<Vec<(SubscriptionToken, PropertyChangedHandler)>>,
    next_token: AtomicU64,
}

impl PropertyChanged {
    /// Creates a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler`; it stays registered until unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(&PropertyChangedEventArgs) + Send + Sync + 'static,
    {
        let token = SubscriptionToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.lock_handlers().push((token, Arc::new(handler)));
        token
    }

    /// Removes the subscription identified by `token`.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut handlers = self.lock_handlers();
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        before != handlers.len()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.lock_handlers().len()
    }

    /// Notifies every subscriber that `property_name` changed.
    ///
    /// Returns the number of subscribers notified.
    pub fn raise(&self, property_name: &'static str) -> usize {
        let handlers: Vec<PropertyChangedHandler> = self
            .lock_handlers()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        tracing::trace!(property = property_name, subscribers = handlers.len(), "Property changed");

        let args = PropertyChangedEventArgs::new(property_name);
        for handler in &handlers {
            handler(&args);
        }
        handlers.len()
    }

    /// Assigns `value` to `field` and raises a notification if it differs.
    ///
    /// Returns whether the field changed.
    pub fn set<V: PartialEq>(&self, field: &mut V, value: V, property_name: &'static str) -> bool {
        if *field == value {
            return false;
        }
        *field = value;
        self.raise(property_name);
        true
    }

    fn lock_handlers(&self) -> MutexGuard<'_, Vec<(SubscriptionToken, PropertyChangedHandler)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for PropertyChanged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChanged")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

/// An object exposing a property-changed channel to a binding layer.
pub trait Bindable {
    /// The object's property-changed channel.
    fn property_changed(&self) -> &PropertyChanged;

    /// Raises a notification for a property whose value is derived rather
    /// than stored.
    fn on_property_changed(&self, property_name: &'static str) {
        self.property_changed().raise(property_name);
    }
}
