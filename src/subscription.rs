use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    geometry::DualDimensionState,
    source::{DimensionError, DimensionSource, ListenerId},
};

/// Counts the states a subscription has applied. Two equal revisions from the
/// same subscription refer to the same state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Called after a subscription applies a change, with the new state and its
/// revision. No subscription lock is held during the call.
pub type DimensionObserver = Arc<dyn Fn(&DualDimensionState, Revision) + Send + Sync>;

struct Shared {
    state: DualDimensionState,
    revision: Revision,
    is_active: bool,
}

/// Keeps a live copy of both surface sizes while active.
///
/// Each activation reads both surfaces once and registers exactly one change
/// listener. Deactivation, explicit or on drop, removes that listener.
pub struct DimensionSubscription<S: DimensionSource + ?Sized> {
    source: Arc<S>,
    shared: Arc<Mutex<Shared>>,
    listener: Option<ListenerId>,
    observer: Option<DimensionObserver>,
}

impl<S: DimensionSource + ?Sized> DimensionSubscription<S> {
    /// Creates an active subscription.
    ///
    /// # Errors
    ///
    /// Fails if either surface cannot be read or the listener cannot be
    /// registered. Nothing stays registered on failure.
    pub fn new(source: Arc<S>) -> Result<Self, DimensionError> {
        Self::create(source, None)
    }

    /// Like [`Self::new`], and calls `observer` after each applied change.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn with_observer(
        source: Arc<S>,
        observer: DimensionObserver,
    ) -> Result<Self, DimensionError> {
        Self::create(source, Some(observer))
    }

    fn create(source: Arc<S>, observer: Option<DimensionObserver>) -> Result<Self, DimensionError> {
        let mut subscription = Self {
            source,
            shared: Arc::new(Mutex::new(Shared {
                state: DualDimensionState::default(),
                revision: Revision::default(),
                is_active: false,
            })),
            listener: None,
            observer,
        };

        subscription.activate()?;
        Ok(subscription)
    }

    /// Reads both surfaces afresh and starts listening for changes.
    ///
    /// Does nothing if the subscription is already active.
    ///
    /// # Errors
    ///
    /// Fails if either surface cannot be read or the listener cannot be
    /// registered. The subscription stays inactive and keeps its last state.
    pub fn activate(&mut self) -> Result<(), DimensionError> {
        if self.listener.is_some() {
            return Ok(());
        }

        let state = self.source.dimensions()?;

        let handler = {
            let shared = self.shared.clone();
            let observer = self.observer.clone();
            Arc::new(move |dimensions: &DualDimensionState| {
                let revision = {
                    let mut shared = shared.lock();
                    if !shared.is_active {
                        return;
                    }
                    shared.state = *dimensions;
                    shared.revision = shared.revision.next();
                    shared.revision
                };

                if let Some(observer) = &observer {
                    observer(dimensions, revision);
                }
            })
        };

        let (previous_state, previous_revision) = {
            let mut shared = self.shared.lock();
            let previous = (shared.state, shared.revision);
            shared.state = state;
            shared.revision = shared.revision.next();
            shared.is_active = true;
            previous
        };

        match self.source.add_change_listener(handler) {
            Ok(id) => {
                self.listener = Some(id);
                Ok(())
            }
            Err(e) => {
                let mut shared = self.shared.lock();
                shared.state = previous_state;
                shared.revision = previous_revision;
                shared.is_active = false;
                Err(e)
            }
        }
    }

    /// Stops listening for changes. The last state remains readable.
    ///
    /// Deactivating an inactive subscription does nothing.
    pub fn deactivate(&mut self) {
        let Some(id) = self.listener.take() else {
            return;
        };

        self.shared.lock().is_active = false;

        if !self.source.remove_change_listener(id) {
            tracing::warn!("subscription: listener {:?} was already removed", id);
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    #[must_use]
    pub fn current(&self) -> DualDimensionState {
        self.shared.lock().state
    }

    #[must_use]
    pub fn revision(&self) -> Revision {
        self.shared.lock().revision
    }

    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }
}

impl<S: DimensionSource + ?Sized> Drop for DimensionSubscription<S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl<S: DimensionSource + ?Sized> std::fmt::Debug for DimensionSubscription<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("DimensionSubscription")
            .field("state", &shared.state)
            .field("revision", &shared.revision)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}
