//! Side effects that run when the dimensions change.
//!
//! A [`DimensionsChange`] runs its effect on every change after the first
//! observation. The first observation happens on activation and only records
//! that the dispatcher has seen a state.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    geometry::DualDimensionState,
    source::{DimensionError, DimensionSource},
    subscription::{DimensionSubscription, Revision},
};

/// Undoes the work of one effect run.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// A side effect, optionally returning its [`Cleanup`]. Returning `None`
/// means there is nothing to clean up.
///
/// Effects are identified by pointer: replacing an effect with a clone of the
/// same `Arc` is not a change.
pub type DimensionEffect = Arc<dyn Fn(&DualDimensionState) -> Option<Cleanup> + Send + Sync>;

struct Dispatch {
    effect: DimensionEffect,
    cleanup: Option<Cleanup>,
    has_observed_initial: bool,
    last_revision: Revision,
    /// Identifies the latest run. Bumped by every run and by deactivation.
    run: u64,
}

impl Dispatch {
    /// Starts a run, handing back its id and the cleanup it must call first.
    fn begin(&mut self) -> (u64, Option<Cleanup>) {
        self.run += 1;
        (self.run, self.cleanup.take())
    }

    fn observe(dispatch: &Mutex<Dispatch>, state: &DualDimensionState, revision: Revision) {
        let (effect, run, previous) = {
            let mut dispatch = dispatch.lock();

            if !dispatch.has_observed_initial {
                dispatch.has_observed_initial = true;
                dispatch.last_revision = revision;
                return;
            }

            if dispatch.last_revision == revision {
                return;
            }

            dispatch.last_revision = revision;
            let (run, previous) = dispatch.begin();
            (dispatch.effect.clone(), run, previous)
        };

        Self::run(dispatch, &effect, run, previous, state);
    }

    /// Runs `effect` after `previous`.
    ///
    /// The effect may itself cause another run, or a deactivation. Its cleanup
    /// is kept only if `run` is still the latest run, and is called right away
    /// otherwise.
    fn run(
        dispatch: &Mutex<Dispatch>,
        effect: &DimensionEffect,
        run: u64,
        previous: Option<Cleanup>,
        state: &DualDimensionState,
    ) {
        if let Some(cleanup) = previous {
            cleanup();
        }

        let cleanup = effect(state);

        let stale = {
            let mut dispatch = dispatch.lock();
            if dispatch.run == run {
                dispatch.cleanup = cleanup;
                None
            } else {
                cleanup
            }
        };

        if let Some(cleanup) = stale {
            tracing::debug!("dimensions change: run {} was superseded, cleaning up", run);
            cleanup();
        }
    }
}

/// Runs an effect whenever the dimensions change, skipping the first
/// observation.
///
/// Before each run the cleanup of the previous run is called. The last cleanup
/// is called once when the dispatcher is deactivated or dropped.
pub struct DimensionsChange<S: DimensionSource + ?Sized> {
    subscription: DimensionSubscription<S>,
    dispatch: Arc<Mutex<Dispatch>>,
}

impl<S: DimensionSource + ?Sized> DimensionsChange<S> {
    /// Creates an active dispatcher. `effect` is not called until the
    /// dimensions change.
    ///
    /// # Errors
    ///
    /// Fails if the underlying subscription cannot be activated.
    pub fn new(source: Arc<S>, effect: DimensionEffect) -> Result<Self, DimensionError> {
        let dispatch = Arc::new(Mutex::new(Dispatch {
            effect,
            cleanup: None,
            has_observed_initial: false,
            last_revision: Revision::default(),
            run: 0,
        }));

        let observer = {
            let dispatch = dispatch.clone();
            Arc::new(move |state: &DualDimensionState, revision: Revision| {
                Dispatch::observe(&dispatch, state, revision);
            })
        };

        let subscription = DimensionSubscription::with_observer(source, observer)?;
        Dispatch::observe(&dispatch, &subscription.current(), subscription.revision());

        Ok(Self {
            subscription,
            dispatch,
        })
    }

    /// Replaces the effect.
    ///
    /// If `effect` is a different effect and the dispatcher has already made
    /// its first observation, the previous cleanup runs and then `effect` runs
    /// against the current state. Returns `false` if `effect` is the current
    /// effect, in which case nothing happens.
    pub fn set_effect(&mut self, effect: DimensionEffect) -> bool {
        let (run, previous) = {
            let mut dispatch = self.dispatch.lock();

            if same_effect(&dispatch.effect, &effect) {
                return false;
            }

            dispatch.effect = effect.clone();

            if !(dispatch.has_observed_initial && self.subscription.is_active()) {
                return true;
            }

            dispatch.begin()
        };

        Dispatch::run(
            &self.dispatch,
            &effect,
            run,
            previous,
            &self.subscription.current(),
        );
        true
    }

    /// Activates the underlying subscription again. The fresh read counts as a
    /// new first observation and does not run the effect.
    ///
    /// Does nothing if already active.
    ///
    /// # Errors
    ///
    /// Fails if the underlying subscription cannot be activated.
    pub fn activate(&mut self) -> Result<(), DimensionError> {
        if self.subscription.is_active() {
            return Ok(());
        }

        self.subscription.activate()?;
        Dispatch::observe(
            &self.dispatch,
            &self.subscription.current(),
            self.subscription.revision(),
        );
        Ok(())
    }

    /// Stops listening and calls the outstanding cleanup, if any.
    ///
    /// Deactivating an inactive dispatcher does nothing.
    pub fn deactivate(&mut self) {
        if !self.subscription.is_active() {
            return;
        }

        self.subscription.deactivate();

        let cleanup = {
            let mut dispatch = self.dispatch.lock();
            dispatch.has_observed_initial = false;
            dispatch.run += 1;
            dispatch.cleanup.take()
        };

        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    #[must_use]
    pub fn current(&self) -> DualDimensionState {
        self.subscription.current()
    }
}

impl<S: DimensionSource + ?Sized> Drop for DimensionsChange<S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl<S: DimensionSource + ?Sized> std::fmt::Debug for DimensionsChange<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dispatch = self.dispatch.lock();
        f.debug_struct("DimensionsChange")
            .field("subscription", &self.subscription)
            .field("has_observed_initial", &dispatch.has_observed_initial)
            .field("has_cleanup", &dispatch.cleanup.is_some())
            .finish()
    }
}

fn same_effect(a: &DimensionEffect, b: &DimensionEffect) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
