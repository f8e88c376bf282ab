//! Publish/subscribe primitive backing every live value in the crate.
//!
//! An [`Observable`] holds the latest immutable snapshot of a value and a set
//! of listeners. Subscribing delivers the current snapshot right away and every
//! later one as it is published. Delivery is synchronous on the publishing
//! thread.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{
    AtomicBool,
    AtomicU64,
    Ordering,
};
use std::sync::{
    Arc,
    Weak,
};

use arc_swap::ArcSwap;
use parking_lot::{
    Mutex,
    ReentrantMutex,
};

/// Callback invoked with each published snapshot.
type Callback<T> = dyn Fn(&T) + Send + Sync;

/// A registered callback together with the newest version it has seen.
struct Listener<T> {
    callback: Box<Callback<T>>,
    /// Version of the last snapshot handed to `callback`; 0 means none yet.
    last_seen: AtomicU64,
    /// Cleared when the subscription is cancelled.
    active: AtomicBool,
}

impl<T> Listener<T> {
    /// Invokes the callback unless the listener was cancelled or already saw
    /// `version` or a newer one.
    fn deliver(&self, version: u64, value: &T) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        if self.last_seen.fetch_max(version, Ordering::AcqRel) < version {
            (self.callback)(value);
        }
    }
}

/// Latest snapshot paired with its version.
struct Snapshot<T> {
    version: u64,
    value: Arc<T>,
}

/// Shared state of one subject.
struct Subject<T> {
    current: ArcSwap<Snapshot<T>>,
    listeners: Mutex<BTreeMap<u64, Arc<Listener<T>>>>,
    next_listener_id: AtomicU64,
    /// Serializes publication so listeners observe snapshots in order.
    /// Reentrant so a callback may publish or subscribe on the same thread.
    publish: ReentrantMutex<()>,
}

impl<T> Subject<T> {
    fn remove(&self, id: u64) {
        self.listeners.lock().remove(&id);
    }
}

/// A value that notifies subscribers whenever it is replaced.
///
/// Cloning is cheap and yields another handle to the same subject.
pub struct Observable<T> {
    subject: Arc<Subject<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self { subject: Arc::clone(&self.subject) }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("version", &self.subject.current.load().version)
            .field("listeners", &self.subject.listeners.lock().len())
            .finish()
    }
}

impl<T: Send + Sync + 'static> Observable<T> {
    /// Creates a subject holding `value` with no listeners.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            subject: Arc::new(Subject {
                current: ArcSwap::from_pointee(Snapshot { version: 1, value: Arc::new(value) }),
                listeners: Mutex::new(BTreeMap::new()),
                next_listener_id: AtomicU64::new(0),
                publish: ReentrantMutex::new(()),
            }),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.subject.current.load().value)
    }

    /// Replaces the value and notifies every listener before returning.
    pub fn set(&self, value: T) {
        let _publishing = self.subject.publish.lock();

        let version = self.subject.current.load().version + 1;
        let value = Arc::new(value);
        self.subject.current.store(Arc::new(Snapshot { version, value: Arc::clone(&value) }));

        let listeners: Vec<Arc<Listener<T>>> =
            self.subject.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener.deliver(version, &value);
        }
    }

    /// Replaces the value only if it differs from the current one.
    ///
    /// Returns `true` when a new value was published.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        let _publishing = self.subject.publish.lock();
        if *self.get() == value {
            return false;
        }
        self.set(value);
        true
    }

    /// Registers `callback`, invoking it at once with the current snapshot and
    /// then with every later one until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let _publishing = self.subject.publish.lock();

        let listener = Arc::new(Listener {
            callback: Box::new(callback),
            last_seen: AtomicU64::new(0),
            active: AtomicBool::new(true),
        });
        let id = self.subject.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.subject.listeners.lock().insert(id, Arc::clone(&listener));

        let snapshot = self.subject.current.load_full();
        listener.deliver(snapshot.version, &snapshot.value);

        let subject: Weak<Subject<T>> = Arc::downgrade(&self.subject);
        let listener: Weak<Listener<T>> = Arc::downgrade(&listener);
        Subscription::new(move || {
            // A publish already in progress may still hold the listener.
            if let Some(listener) = listener.upgrade() {
                listener.active.store(false, Ordering::Release);
            }
            if let Some(subject) = subject.upgrade() {
                subject.remove(id);
            }
        })
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subject.listeners.lock().len()
    }

    /// Number of `Observable` handles sharing this subject.
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.subject)
    }
}

/// Handle to a scoped subscription.
///
/// Dropping it (or calling [`Subscription::unsubscribe`]) stops further
/// notifications.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// Cancels the subscription now instead of at drop.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}
