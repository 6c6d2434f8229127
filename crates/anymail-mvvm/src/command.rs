//! Command objects.
//!
//! A [`DelegateCommand`] pairs an action with an availability predicate and
//! publishes a can-execute-changed notification through a
//! [`WeakEventManager`]. UI layers subscribe to the notification and re-query
//! [`DelegateCommand::can_execute`] when it fires.
//!
//! ## Parameter types
//!
//! The generic UI invocation path may have no parameter to pass, so the
//! parameter type must be able to say "absent" without borrowing a valid value
//! for it. [`CommandParameter`] is implemented for [`Option`] and `()` only:
//!
//! ```
//! use anymail_mvvm::DelegateCommand;
//!
//! let command = DelegateCommand::<Option<i32>>::with_can_execute(
//!     |_customer| {},
//!     |customer| customer.is_some_and(|id| id > 0),
//! );
//! assert!(!command.can_execute(&None));
//! assert!(command.can_execute(&Some(42)));
//! ```
//!
//! A bare value type is rejected when the command is declared:
//!
//! ```compile_fail
//! use anymail_mvvm::DelegateCommand;
//!
//! let command = DelegateCommand::<i32>::new(|_customer| {});
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::weak_event::{
    self, EventHandler, HandlerList, SubscriptionToken, WeakEventManager,
};

/// Boxed future returned by command actions.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type ExecuteFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;
type CanExecuteFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(1);

mod sealed {
    pub trait Sealed {}

    impl<V> Sealed for Option<V> {}
    impl Sealed for () {}
}

/// A parameter type that can represent "no value".
///
/// Sealed: only [`Option`] and `()` qualify.
pub trait CommandParameter: sealed::Sealed + Send + 'static {
    /// The value passed when the invoker has no parameter.
    fn absent() -> Self;

    /// Returns true if this is the absent value.
    fn is_absent(&self) -> bool;
}

impl<V: Send + 'static> CommandParameter for Option<V> {
    fn absent() -> Self {
        None
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl CommandParameter for () {
    fn absent() -> Self {}

    fn is_absent(&self) -> bool {
        true
    }
}

/// Identity of a command, passed as the sender of its notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl CommandId {
    fn next() -> Self {
        Self(NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An execute / can-execute pair with a can-execute-changed notification.
///
/// Subscribers are held weakly: whoever subscribes must keep its
/// [`EventHandler`] alive for as long as it wants to be notified.
pub struct DelegateCommand<T: CommandParameter> {
    id: CommandId,
    name: String,
    execute: ExecuteFn<T>,
    can_execute: Option<CanExecuteFn<T>>,
    handlers: Mutex<Option<HandlerList<CommandId>>>,
    events: WeakEventManager,
}

impl<T: CommandParameter> DelegateCommand<T> {
    /// Creates a command that is always available.
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self::from_parts(None, Self::wrap_sync(action), None, None)
    }

    /// Creates a command whose availability is decided by `predicate`.
    pub fn with_can_execute<F, P>(action: F, predicate: P) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::from_parts(None, Self::wrap_sync(action), Some(Arc::new(predicate)), None)
    }

    /// Creates an always-available command from an awaitable handler.
    pub fn from_async_handler<F, Fut>(action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::from_parts(None, Self::wrap_async(action), None, None)
    }

    /// Creates a command from an awaitable handler and an availability
    /// predicate.
    pub fn from_async_handler_with_can_execute<F, Fut, P>(action: F, predicate: P) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::from_parts(None, Self::wrap_async(action), Some(Arc::new(predicate)), None)
    }

    /// Starts building a command step by step.
    #[must_use]
    pub fn builder() -> CommandBuilder<T> {
        CommandBuilder::new()
    }

    fn from_parts(
        name: Option<String>,
        execute: ExecuteFn<T>,
        can_execute: Option<CanExecuteFn<T>>,
        events: Option<WeakEventManager>,
    ) -> Self {
        let id = CommandId::next();
        Self {
            id,
            name: name.unwrap_or_else(|| format!("command{id}")),
            execute,
            can_execute,
            handlers: Mutex::new(None),
            events: events.unwrap_or_default(),
        }
    }

    fn wrap_sync<F>(action: F) -> ExecuteFn<T>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Arc::new(move |parameter: T| -> BoxFuture<'static, ()> {
            action(parameter);
            Box::pin(std::future::ready(()))
        })
    }

    fn wrap_async<F, Fut>(action: F) -> ExecuteFn<T>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Arc::new(move |parameter: T| -> BoxFuture<'static, ()> { Box::pin(action(parameter)) })
    }

    /// Sets the name used in log output.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Routes can-execute-changed notifications through `events`.
    #[must_use]
    pub fn with_event_manager(mut self, events: WeakEventManager) -> Self {
        self.events = events;
        self
    }

    /// Returns the command's identity.
    #[must_use]
    pub const fn id(&self) -> CommandId {
        self.id
    }

    /// Returns the command's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the command may run with `parameter`.
    ///
    /// Commands built without a predicate are always available.
    pub fn can_execute(&self, parameter: &T) -> bool {
        self.can_execute
            .as_ref()
            .is_none_or(|predicate| predicate(parameter))
    }

    /// Runs the action and waits for it to finish, including any
    /// asynchronous work it started.
    ///
    /// The predicate is not consulted; see [`Self::try_execute`].
    pub async fn execute(&self, parameter: T) {
        tracing::debug!(command = %self.name, absent = parameter.is_absent(), "Executing command");
        (self.execute)(parameter).await;
    }

    /// Runs the action only if [`Self::can_execute`] allows it.
    ///
    /// Returns whether the action ran.
    pub async fn try_execute(&self, parameter: T) -> bool {
        if !self.can_execute(&parameter) {
            tracing::debug!(command = %self.name, "Command not available");
            return false;
        }
        self.execute(parameter).await;
        true
    }

    /// Notifies every live subscriber that availability may have changed.
    ///
    /// Returns the number of subscribers notified. With a queued dispatcher
    /// the notifications are delivered later, on the UI loop.
    pub fn raise_can_execute_changed(&self) -> usize {
        let live = weak_event::take_live(&mut self.lock_handlers());
        let notified = self.events.deliver(&self.id, live);
        tracing::trace!(command = %self.name, notified, "Raised can-execute-changed");
        notified
    }

    /// Subscribes `handler` to can-execute-changed without keeping it alive.
    pub fn subscribe_can_execute_changed(
        &self,
        handler: &EventHandler<CommandId>,
    ) -> SubscriptionToken {
        weak_event::add_handler(&mut self.lock_handlers(), handler)
    }

    /// Cancels the subscription identified by `token`.
    pub fn unsubscribe_can_execute_changed(&self, token: SubscriptionToken) -> bool {
        weak_event::unsubscribe(&mut self.lock_handlers(), token)
    }

    /// Removes every subscription of `handler`, along with dead ones.
    pub fn remove_can_execute_changed(&self, handler: &EventHandler<CommandId>) -> usize {
        weak_event::remove_handler(&mut self.lock_handlers(), handler)
    }

    /// Number of live can-execute-changed subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_handlers()
            .as_ref()
            .map_or(0, HandlerList::live_count)
    }

    fn lock_handlers(&self) -> MutexGuard<'_, Option<HandlerList<CommandId>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: CommandParameter> fmt::Debug for DelegateCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateCommand")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_predicate", &self.can_execute.is_some())
            .finish_non_exhaustive()
    }
}

/// Step-by-step construction of a [`DelegateCommand`].
///
/// [`CommandBuilder::build`] fails when no action was supplied.
pub struct CommandBuilder<T: CommandParameter> {
    name: Option<String>,
    execute: Option<ExecuteFn<T>>,
    can_execute: Option<CanExecuteFn<T>>,
    events: Option<WeakEventManager>,
}

impl<T: CommandParameter> CommandBuilder<T> {
    fn new() -> Self {
        Self {
            name: None,
            execute: None,
            can_execute: None,
            events: None,
        }
    }

    /// Sets the name used in log output and errors.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a synchronous action.
    #[must_use]
    pub fn execute<F>(mut self, action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.execute = Some(DelegateCommand::wrap_sync(action));
        self
    }

    /// Sets an awaitable action.
    #[must_use]
    pub fn execute_async<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.execute = Some(DelegateCommand::wrap_async(action));
        self
    }

    /// Sets the availability predicate.
    #[must_use]
    pub fn can_execute<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.can_execute = Some(Arc::new(predicate));
        self
    }

    /// Sets the event manager used for can-execute-changed.
    #[must_use]
    pub fn event_manager(mut self, events: WeakEventManager) -> Self {
        self.events = Some(events);
        self
    }

    /// Builds the command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAction`] if no action was set.
    pub fn build(self) -> Result<DelegateCommand<T>> {
        let Some(execute) = self.execute else {
            return Err(Error::MissingAction(
                self.name.unwrap_or_else(|| "unnamed".to_string()),
            ));
        };
        Ok(DelegateCommand::from_parts(
            self.name,
            execute,
            self.can_execute,
            self.events,
        ))
    }
}

impl<T: CommandParameter> fmt::Debug for CommandBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuilder")
            .field("name", &self.name)
            .field("has_action", &self.execute.is_some())
            .field("has_predicate", &self.can_execute.is_some())
            .finish_non_exhaustive()
    }
}
