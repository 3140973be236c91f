//! Single-update-path store
//!
//! A [`Store`] owns one state value. Every mutation goes through
//! [`Store::dispatch`]: the action passes through the middleware chain in
//! registration order, then the state's [`Reduce`] implementation applies it
//! under the write lock. Listeners run after the lock is released, so both
//! middleware and listeners may dispatch re-entrantly.
//!
//! ```ignore
//! let store = Store::builder(TranslationState::default())
//!     .middleware(translations)
//!     .build();
//!
//! let _sub = store.subscribe(|store| {
//!     let lang = store.select(|s| s.current_lang().cloned());
//!     tracing::info!(?lang, "state changed");
//! });
//!
//! store.dispatch(TranslationAction::switch_lang("en"));
//! ```

use crate::listeners::{ListenerHost, ListenerId, ListenerRegistry, Subscription};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Shared dirty flag, raised after every state change
pub type DirtyFlag = Arc<AtomicBool>;

/// State that knows how to apply actions of type `A`
pub trait Reduce<A> {
    /// Apply an action. Returns `true` if the state changed.
    fn reduce(&mut self, action: &A) -> bool;
}

/// Intercepts actions before they reach the reducer.
///
/// Returning `Some(action)` forwards the (possibly replaced) action to the
/// next middleware and finally to the reducer. Returning `None` consumes it.
pub trait Middleware<S, A>: Send + Sync + 'static {
    fn handle(&self, store: &Store<S, A>, action: A) -> Option<A>;
}

/// Listener callback type
pub type Listener<S, A> = dyn Fn(&Store<S, A>) + Send + Sync;

struct StoreInner<S, A> {
    state: RwLock<S>,
    middleware: Vec<Arc<dyn Middleware<S, A>>>,
    listeners: Mutex<ListenerRegistry<Listener<S, A>>>,
    dirty_flag: DirtyFlag,
    revision: AtomicU64,
}

impl<S, A> ListenerHost for StoreInner<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().remove(id);
    }
}

/// Cheaply cloneable handle to a shared store
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Reduce<A> + Send + Sync + 'static,
    A: 'static,
{
    /// Create a store without middleware
    pub fn new(initial: S) -> Self {
        Self::builder(initial).build()
    }

    /// Create a builder for a store
    pub fn builder(initial: S) -> StoreBuilder<S, A> {
        StoreBuilder::new(initial)
    }

    /// Dispatch an action through the middleware chain and into the reducer
    pub fn dispatch(&self, action: A) {
        let mut action = action;
        for middleware in &self.inner.middleware {
            match middleware.handle(self, action) {
                Some(next) => action = next,
                None => return,
            }
        }
        self.apply(&action);
    }

    fn apply(&self, action: &A) {
        let changed = self.inner.state.write().reduce(action);
        if !changed {
            return;
        }

        let revision = self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.dirty_flag.store(true, Ordering::SeqCst);

        let listeners = self.inner.listeners.lock().snapshot();
        tracing::trace!(revision, listeners = listeners.len(), "store changed");
        for listener in listeners {
            listener(self);
        }
    }

    /// Read a value out of the current state
    pub fn select<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.inner.state.read())
    }

    /// Borrow the current state.
    ///
    /// Do not dispatch while holding the guard; the reducer needs the write
    /// lock.
    pub fn state(&self) -> RwLockReadGuard<'_, S> {
        self.inner.state.read()
    }

    /// Clone the current state
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.read().clone()
    }

    /// Register a listener called after every state change
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Store<S, A>) + Send + Sync + 'static,
    {
        let id = self.inner.listeners.lock().register(Arc::new(listener));
        let host: Weak<dyn ListenerHost> = Arc::downgrade(&self.inner) as Weak<dyn ListenerHost>;
        Subscription::new(id, host)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Number of state changes applied so far
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }

    /// Get the dirty flag
    pub fn dirty_flag(&self) -> &DirtyFlag {
        &self.inner.dirty_flag
    }

    /// Request a rebuild by setting the dirty flag
    pub fn request_rebuild(&self) {
        self.inner.dirty_flag.store(true, Ordering::SeqCst);
    }

    /// Clear the dirty flag, returning whether it was set
    pub fn take_dirty(&self) -> bool {
        self.inner.dirty_flag.swap(false, Ordering::SeqCst)
    }
}

impl<S, A> fmt::Debug for Store<S, A>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.read())
            .field("middleware", &self.inner.middleware.len())
            .field("revision", &self.inner.revision.load(Ordering::SeqCst))
            .finish()
    }
}

/// Builder for creating stores
pub struct StoreBuilder<S, A> {
    initial: S,
    middleware: Vec<Arc<dyn Middleware<S, A>>>,
    dirty_flag: Option<DirtyFlag>,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Reduce<A> + Send + Sync + 'static,
    A: 'static,
{
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            middleware: Vec::new(),
            dirty_flag: None,
        }
    }

    /// Append a middleware; middleware run in the order they are added
    pub fn middleware<M: Middleware<S, A>>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append a middleware that is also held elsewhere
    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware<S, A>>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Share an existing dirty flag (e.g. one owned by the host's frame loop)
    pub fn dirty_flag(mut self, flag: DirtyFlag) -> Self {
        self.dirty_flag = Some(flag);
        self
    }

    /// Build the store
    pub fn build(self) -> Store<S, A> {
        Store {
            inner: Arc::new(StoreInner {
                state: RwLock::new(self.initial),
                middleware: self.middleware,
                listeners: Mutex::new(ListenerRegistry::new()),
                dirty_flag: self
                    .dirty_flag
                    .unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
                revision: AtomicU64::new(0),
            }),
        }
    }
}

impl<S, A, T> Middleware<S, A> for Arc<T>
where
    T: Middleware<S, A> + ?Sized,
{
    fn handle(&self, store: &Store<S, A>, action: A) -> Option<A> {
        (**self).handle(store, action)
    }
}
