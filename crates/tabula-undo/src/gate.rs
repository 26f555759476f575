#![forbid(unsafe_code)]

//! Notification gating.
//!
//! Two independent channels:
//!
//! - **Datastore listeners** are held back for the duration of a replay by a
//!   [`ListenerSuppression`] guard. The guard re-enables them on drop, so an
//!   early return or error still releases them exactly once.
//! - **Availability listeners** hear about [`UndoState`] changes through an
//!   [`AvailabilityNotifier`]. A notification fires only when the
//!   `(has_undo, has_redo)` pair differs from the one last fired.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tabula_core::Datastore;

/// Suppresses a datastore's listeners for as long as it is alive.
///
/// ```rust,ignore
/// {
///     let mut store = ListenerSuppression::new(&mut store);
///     cmd.apply(&mut *store);
/// } // listeners re-enabled, queued events delivered
/// ```
pub struct ListenerSuppression<'a, D: Datastore + ?Sized> {
    store: &'a mut D,
}

impl<'a, D: Datastore + ?Sized> ListenerSuppression<'a, D> {
    pub fn new(store: &'a mut D) -> Self {
        store.disable_listeners();
        Self { store }
    }
}

impl<D: Datastore + ?Sized> Deref for ListenerSuppression<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.store
    }
}

impl<D: Datastore + ?Sized> DerefMut for ListenerSuppression<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.store
    }
}

impl<D: Datastore + ?Sized> Drop for ListenerSuppression<'_, D> {
    fn drop(&mut self) {
        self.store.enable_listeners();
    }
}

/// Whether undo and redo are currently possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UndoState {
    pub has_undo: bool,
    pub has_redo: bool,
}

impl UndoState {
    #[must_use]
    pub fn new(has_undo: bool, has_redo: bool) -> Self {
        Self { has_undo, has_redo }
    }
}

/// Handle returned by [`AvailabilityNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback receiving the new availability state.
pub type AvailabilityListener = Box<dyn FnMut(UndoState) + Send>;

/// Availability listeners plus the last state they were told about.
#[derive(Default)]
pub struct AvailabilityNotifier {
    listeners: Vec<(SubscriptionId, AvailabilityListener)>,
    next_id: u64,
    last_fired: UndoState,
}

impl fmt::Debug for AvailabilityNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailabilityNotifier")
            .field("listeners", &self.listeners.len())
            .field("last_fired", &self.last_fired)
            .finish()
    }
}

impl AvailabilityNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It is not invoked for the current state.
    pub fn subscribe(&mut self, listener: impl FnMut(UndoState) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn last_fired(&self) -> UndoState {
        self.last_fired
    }

    /// Tell listeners about `state` if it differs from the last one fired.
    /// Returns whether anything fired.
    pub fn notify(&mut self, state: UndoState) -> bool {
        if state == self.last_fired {
            return false;
        }
        self.last_fired = state;
        tracing::trace!(
            target: "tabula.undo",
            has_undo = state.has_undo,
            has_redo = state.has_redo,
            listeners = self.listeners.len(),
            "undo state changed"
        );
        for (_, listener) in &mut self.listeners {
            listener(state);
        }
        true
    }
}
