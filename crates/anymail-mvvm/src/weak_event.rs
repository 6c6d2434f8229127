//! Weak-reference event subscription.
//!
//! A publisher stores its subscribers in a [`HandlerList`], which only keeps
//! [`Weak`] references. Whoever subscribes owns the [`EventHandler`] `Arc` and
//! decides how long it lives; dropping it is enough to stop receiving
//! notifications. Dead entries are pruned as a side effect of dispatching, or
//! eagerly by [`remove_handler`].
//!
//! ```text
//!  subscriber ──owns──▶ Arc<handler> ◀──weak── HandlerList ◀── publisher
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use crate::dispatch::{Dispatcher, ImmediateDispatcher};

/// Initial capacity of a lazily created handler list.
const DEFAULT_LIST_CAPACITY: usize = 2;

/// Arguments of a notification that carries no payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventArgs;

/// Shared event handler invoked with the sender and empty arguments.
pub type EventHandler<S> = Arc<dyn Fn(&S, &EventArgs) + Send + Sync>;

type WeakHandler<S> = Weak<dyn Fn(&S, &EventArgs) + Send + Sync>;

/// Identifies one subscription inside a [`HandlerList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }
}

/// Registration-ordered list of weakly held handlers.
pub struct HandlerList<S> {
    entries: Vec<(SubscriptionToken, WeakHandler<S>)>,
    next_token: u64,
}

impl<S> HandlerList<S> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` handlers.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            next_token: 0,
        }
    }

    /// Number of stored entries, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose handler is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    /// Returns true if `token` is still registered.
    #[must_use]
    pub fn contains(&self, token: SubscriptionToken) -> bool {
        self.entries.iter().any(|(t, _)| *t == token)
    }

    fn push(&mut self, handler: &EventHandler<S>) -> SubscriptionToken {
        let token = SubscriptionToken::new(self.next_token);
        self.next_token += 1;
        self.entries.push((token, Arc::downgrade(handler)));
        token
    }

    fn remove(&mut self, handler: &EventHandler<S>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, weak)| match weak.upgrade() {
            Some(live) => !Arc::ptr_eq(&live, handler),
            None => false,
        });
        before - self.entries.len()
    }

    fn remove_token(&mut self, token: SubscriptionToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| *t != token);
        before != self.entries.len()
    }

    /// Upgrades every entry, dropping the dead ones, and returns the live
    /// handlers in registration order.
    fn prune_and_collect(&mut self) -> Vec<EventHandler<S>> {
        let mut live = Vec::with_capacity(self.entries.len());
        self.entries.retain(|(_, weak)| {
            if let Some(handler) = weak.upgrade() {
                live.push(handler);
                true
            } else {
                false
            }
        });
        live
    }
}

impl<S> Default for HandlerList<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for HandlerList<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerList")
            .field("len", &self.len())
            .field("live", &self.live_count())
            .finish()
    }
}

/// Adds `handler` to `handlers` without keeping it alive.
///
/// The list is created on first use.
pub fn add_handler<S>(
    handlers: &mut Option<HandlerList<S>>,
    handler: &EventHandler<S>,
) -> SubscriptionToken {
    handlers
        .get_or_insert_with(|| HandlerList::with_capacity(DEFAULT_LIST_CAPACITY))
        .push(handler)
}

/// Removes every entry that resolves to `handler`, together with any entry
/// whose handler has already been dropped.
///
/// Returns the number of entries removed.
pub fn remove_handler<S>(
    handlers: &mut Option<HandlerList<S>>,
    handler: &EventHandler<S>,
) -> usize {
    handlers.as_mut().map_or(0, |list| list.remove(handler))
}

/// Removes the subscription identified by `token`.
pub fn unsubscribe<S>(handlers: &mut Option<HandlerList<S>>, token: SubscriptionToken) -> bool {
    handlers
        .as_mut()
        .is_some_and(|list| list.remove_token(token))
}

/// Prunes dead entries and returns the live handlers in registration order.
///
/// Callers holding `handlers` behind a lock take the live set with this,
/// release the lock, then hand it to [`WeakEventManager::deliver`].
pub fn take_live<S>(handlers: &mut Option<HandlerList<S>>) -> Vec<EventHandler<S>> {
    handlers
        .as_mut()
        .map(HandlerList::prune_and_collect)
        .unwrap_or_default()
}

/// Delivers notifications to weakly held handlers through a [`Dispatcher`].
#[derive(Clone)]
pub struct WeakEventManager {
    dispatcher: Arc<dyn Dispatcher>,
}

impl WeakEventManager {
    /// Creates a manager that routes every handler call through `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Creates a manager that calls handlers inline.
    #[must_use]
    pub fn immediate() -> Self {
        Self::new(Arc::new(ImmediateDispatcher))
    }

    /// Notifies every live handler in `handlers`, pruning dead entries.
    ///
    /// Returns the number of handlers notified.
    pub fn dispatch<S>(&self, sender: &S, handlers: &mut Option<HandlerList<S>>) -> usize
    where
        S: Clone + Send + 'static,
    {
        let live = take_live(handlers);
        self.deliver(sender, live)
    }

    /// Hands each handler in `live` to the dispatcher, in order.
    ///
    /// Posted jobs hold the handler weakly, so a subscriber dropped before a
    /// queued job runs is not called.
    pub fn deliver<S>(&self, sender: &S, live: Vec<EventHandler<S>>) -> usize
    where
        S: Clone + Send + 'static,
    {
        let count = live.len();
        for handler in live {
            let weak: WeakHandler<S> = Arc::downgrade(&handler);
            drop(handler);
            let sender = sender.clone();
            self.dispatcher.post(Box::new(move || {
                if let Some(handler) = weak.upgrade() {
                    handler(&sender, &EventArgs);
                }
            }));
        }
        count
    }
}

impl Default for WeakEventManager {
    fn default() -> Self {
        Self::immediate()
    }
}

impl fmt::Debug for WeakEventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEventManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use proptest::prelude::*;

    use super::*;
    use crate::dispatch::QueuedDispatcher;

    fn recorder(log: &Arc<Mutex<Vec<u32>>>, id: u32) -> EventHandler<&'static str> {
        let log = Arc::clone(log);
        Arc::new(move |_sender: &&'static str, _args: &EventArgs| {
            log.lock().unwrap().push(id);
        })
    }

    #[test]
    fn test_add_creates_list_lazily() {
        let mut handlers: Option<HandlerList<&'static str>> = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder(&log, 1);

        add_handler(&mut handlers, &handler);

        let list = handlers.as_ref().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.live_count(), 1);
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let mut handlers = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recorder(&log, 1);
        let second = recorder(&log, 2);
        let third = recorder(&log, 3);
        add_handler(&mut handlers, &first);
        add_handler(&mut handlers, &second);
        add_handler(&mut handlers, &third);

        let notified = WeakEventManager::immediate().dispatch(&"sender", &mut handlers);

        assert_eq!(notified, 3);
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_dispatch_skips_and_prunes_dropped_handlers() {
        let mut handlers = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        let kept = recorder(&log, 1);
        let dropped = recorder(&log, 2);
        add_handler(&mut handlers, &kept);
        add_handler(&mut handlers, &dropped);
        drop(dropped);

        let notified = WeakEventManager::immediate().dispatch(&"sender", &mut handlers);

        assert_eq!(notified, 1);
        assert_eq!(*log.lock().unwrap(), vec![1]);
        assert_eq!(handlers.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_handler_receives_sender() {
        let mut handlers = None;
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let handler: EventHandler<&'static str> =
            Arc::new(move |sender: &&'static str, _args: &EventArgs| {
                *sink.lock().unwrap() = Some(*sender);
            });
        add_handler(&mut handlers, &handler);

        WeakEventManager::immediate().dispatch(&"send-command", &mut handlers);

        assert_eq!(*seen.lock().unwrap(), Some("send-command"));
    }

    #[test]
    fn test_remove_handler_also_drops_dead_entries() {
        let mut handlers = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        let target = recorder(&log, 1);
        let other = recorder(&log, 2);
        let dead = recorder(&log, 3);
        add_handler(&mut handlers, &target);
        add_handler(&mut handlers, &other);
        add_handler(&mut handlers, &dead);
        drop(dead);

        let removed = remove_handler(&mut handlers, &target);

        assert_eq!(removed, 2);
        assert_eq!(handlers.as_ref().unwrap().len(), 1);
        WeakEventManager::immediate().dispatch(&"sender", &mut handlers);
        assert_eq!(*log.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_remove_on_missing_list_is_noop() {
        let mut handlers: Option<HandlerList<&'static str>> = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        assert_eq!(remove_handler(&mut handlers, &recorder(&log, 1)), 0);
        assert!(handlers.is_none());
    }

    #[test]
    fn test_unsubscribe_by_token() {
        let mut handlers = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recorder(&log, 1);
        let second = recorder(&log, 2);
        let token = add_handler(&mut handlers, &first);
        add_handler(&mut handlers, &second);

        assert!(handlers.as_ref().unwrap().contains(token));
        assert!(unsubscribe(&mut handlers, token));
        assert!(!handlers.as_ref().unwrap().contains(token));
        assert!(!unsubscribe(&mut handlers, token));
        WeakEventManager::immediate().dispatch(&"sender", &mut handlers);

        assert_eq!(*log.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_same_handler_added_twice_fires_twice() {
        let mut handlers = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder(&log, 7);
        add_handler(&mut handlers, &handler);
        add_handler(&mut handlers, &handler);

        WeakEventManager::immediate().dispatch(&"sender", &mut handlers);
        assert_eq!(*log.lock().unwrap(), vec![7, 7]);

        assert_eq!(remove_handler(&mut handlers, &handler), 2);
    }

    #[test]
    fn test_queued_manager_defers_delivery() {
        let (dispatcher, mut queue) = QueuedDispatcher::new();
        let manager = WeakEventManager::new(Arc::new(dispatcher));
        let mut handlers = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder(&log, 1);
        add_handler(&mut handlers, &handler);

        assert_eq!(manager.dispatch(&"sender", &mut handlers), 1);
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_queued_job_skips_handler_dropped_before_it_runs() {
        let (dispatcher, mut queue) = QueuedDispatcher::new();
        let manager = WeakEventManager::new(Arc::new(dispatcher));
        let mut handlers = None;
        let log = Arc::new(Mutex::new(Vec::new()));
        let kept = recorder(&log, 1);
        let dropped = recorder(&log, 2);
        add_handler(&mut handlers, &kept);
        add_handler(&mut handlers, &dropped);

        assert_eq!(manager.dispatch(&"sender", &mut handlers), 2);
        let released = Arc::downgrade(&dropped);
        drop(dropped);
        assert!(released.upgrade().is_none());

        assert_eq!(queue.run_pending(), 2);
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_dispatch_on_missing_list() {
        let mut handlers: Option<HandlerList<&'static str>> = None;
        assert_eq!(
            WeakEventManager::immediate().dispatch(&"sender", &mut handlers),
            0
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Drop(usize),
        Remove(usize),
        Dispatch,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Add),
            (0usize..16).prop_map(Op::Drop),
            (0usize..16).prop_map(Op::Remove),
            Just(Op::Dispatch),
        ]
    }

    proptest! {
        #[test]
        fn prop_dispatch_leaves_only_live_entries(ops in prop::collection::vec(op(), 1..64)) {
            let mut handlers: Option<HandlerList<&'static str>> = None;
            let log = Arc::new(Mutex::new(Vec::new()));
            let manager = WeakEventManager::immediate();
            let mut owned: Vec<Option<EventHandler<&'static str>>> = Vec::new();

            for op in ops {
                match op {
                    Op::Add => {
                        #[allow(clippy::cast_possible_truncation)]
                        let handler = recorder(&log, owned.len() as u32);
                        add_handler(&mut handlers, &handler);
                        owned.push(Some(handler));
                    }
                    Op::Drop(i) => {
                        if let Some(slot) = owned.get_mut(i) {
                            *slot = None;
                        }
                    }
                    Op::Remove(i) => {
                        if let Some(Some(handler)) = owned.get(i) {
                            remove_handler(&mut handlers, handler);
                        }
                    }
                    Op::Dispatch => {
                        log.lock().unwrap().clear();
                        manager.dispatch(&"sender", &mut handlers);

                        if let Some(list) = handlers.as_ref() {
                            prop_assert_eq!(list.len(), list.live_count());
                        }

                        let fired = log.lock().unwrap().clone();
                        let mut sorted = fired.clone();
                        sorted.sort_unstable();
                        prop_assert_eq!(fired, sorted);
                    }
                }
            }
        }
    }
}
