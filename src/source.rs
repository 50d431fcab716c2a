//! Where surface sizes come from.
//!
//! [`DimensionSource`] abstracts the host's display API. [`Dimensions`] is a
//! source the host feeds by hand, e.g. from its resize and rotation events.

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::SlotMap;

use crate::{
    geometry::{DimensionSnapshot, DualDimensionState, Surface},
    limits::MAX_CHANGE_LISTENERS,
};

slotmap::new_key_type! {
    /// Identifies one change listener registered with a [`DimensionSource`].
    pub struct ListenerId;
}

/// Receives both surfaces every time either of them changes.
pub type ChangeHandler = Arc<dyn Fn(&DualDimensionState) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DimensionError {
    #[error("The {0} surface has not been measured.")]
    Unavailable(Surface),

    #[error("The {surface} surface reported a malformed size (height: {height}, width: {width}).")]
    Malformed {
        surface: Surface,
        height: f64,
        width: f64,
    },

    #[error("The maximum number of change listeners is registered. Remove one before adding another.")]
    TooManyListeners,
}

pub trait DimensionSource: Send + Sync {
    /// Reads the current size of `surface`.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError::Unavailable`] if the surface cannot be
    /// measured.
    fn get(&self, surface: Surface) -> Result<DimensionSnapshot, DimensionError>;

    /// Registers `handler` to be called with both surfaces on every change.
    ///
    /// Changes must be delivered to every handler in the order they happened,
    /// including changes reported from inside a handler.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError::TooManyListeners`] if the source cannot accept
    /// another listener.
    fn add_change_listener(&self, handler: ChangeHandler) -> Result<ListenerId, DimensionError>;

    /// Removes a listener. Returns `false` if `id` is not registered, which
    /// includes ids that were already removed.
    fn remove_change_listener(&self, id: ListenerId) -> bool;

    /// Reads and validates both surfaces.
    ///
    /// # Errors
    ///
    /// Returns an error if either surface is unavailable or malformed.
    fn dimensions(&self) -> Result<DualDimensionState, DimensionError> {
        Ok(DualDimensionState {
            window: read_surface(self, Surface::Window)?,
            screen: read_surface(self, Surface::Screen)?,
        })
    }
}

impl<S: DimensionSource + ?Sized> DimensionSource for Arc<S> {
    fn get(&self, surface: Surface) -> Result<DimensionSnapshot, DimensionError> {
        (**self).get(surface)
    }

    fn add_change_listener(&self, handler: ChangeHandler) -> Result<ListenerId, DimensionError> {
        (**self).add_change_listener(handler)
    }

    fn remove_change_listener(&self, id: ListenerId) -> bool {
        (**self).remove_change_listener(id)
    }
}

/// Reads one surface from `source` and rejects malformed sizes.
///
/// # Errors
///
/// Propagates the source's error, or returns [`DimensionError::Malformed`].
pub fn read_surface<S: DimensionSource + ?Sized>(
    source: &S,
    surface: Surface,
) -> Result<DimensionSnapshot, DimensionError> {
    source.get(surface)?.validate(surface)
}

/// Initial measurements and limits for a [`Dimensions`] source.
#[derive(Clone, Debug)]
pub struct DimensionsAttributes {
    pub window: Option<DimensionSnapshot>,
    pub screen: Option<DimensionSnapshot>,
    pub max_listeners: usize,
}

impl DimensionsAttributes {
    #[must_use]
    pub fn with_window(mut self, window: DimensionSnapshot) -> Self {
        self.window = Some(window);
        self
    }

    #[must_use]
    pub fn with_screen(mut self, screen: DimensionSnapshot) -> Self {
        self.screen = Some(screen);
        self
    }

    #[must_use]
    pub fn with_max_listeners(mut self, max_listeners: usize) -> Self {
        self.max_listeners = max_listeners;
        self
    }
}

impl Default for DimensionsAttributes {
    fn default() -> Self {
        Self {
            window: None,
            screen: None,
            max_listeners: MAX_CHANGE_LISTENERS,
        }
    }
}

/// A [`DimensionSource`] that is told its sizes by the host.
///
/// Listeners are called synchronously on the thread that reports the change,
/// after every internal lock has been released.
pub struct Dimensions {
    inner: Mutex<Inner>,
}

struct Inner {
    window: Option<DimensionSnapshot>,
    screen: Option<DimensionSnapshot>,
    listeners: SlotMap<ListenerId, ChangeHandler>,
    max_listeners: usize,
    is_notifying: bool,
    has_pending_change: bool,
}

impl Inner {
    fn state(&self) -> Option<DualDimensionState> {
        Some(DualDimensionState {
            window: self.window?,
            screen: self.screen?,
        })
    }
}

impl Dimensions {
    /// # Errors
    ///
    /// Returns [`DimensionError::Malformed`] if an initial measurement is not a
    /// valid size.
    pub fn new(attributes: DimensionsAttributes) -> Result<Self, DimensionError> {
        let window = attributes
            .window
            .map(|window| window.validate(Surface::Window))
            .transpose()?;
        let screen = attributes
            .screen
            .map(|screen| screen.validate(Surface::Screen))
            .transpose()?;

        Ok(Self {
            inner: Mutex::new(Inner {
                window,
                screen,
                listeners: SlotMap::with_key(),
                max_listeners: attributes.max_listeners,
                is_notifying: false,
                has_pending_change: false,
            }),
        })
    }

    /// Creates a source with both surfaces already measured.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError::Malformed`] if either size is invalid.
    pub fn with_sizes(
        window: DimensionSnapshot,
        screen: DimensionSnapshot,
    ) -> Result<Self, DimensionError> {
        Self::new(
            DimensionsAttributes::default()
                .with_window(window)
                .with_screen(screen),
        )
    }

    /// Replaces both surfaces and notifies every listener once.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError::Malformed`] if either size is invalid, in
    /// which case nothing is replaced.
    #[tracing::instrument(skip(self))]
    pub fn set(
        &self,
        window: DimensionSnapshot,
        screen: DimensionSnapshot,
    ) -> Result<(), DimensionError> {
        let state = DualDimensionState::new(window, screen).validate()?;
        self.apply(|inner| {
            inner.window = Some(state.window);
            inner.screen = Some(state.screen);
        });
        Ok(())
    }

    /// Replaces the window size.
    ///
    /// Listeners are notified with both surfaces only if the screen has been
    /// measured as well.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError::Malformed`] if `window` is invalid.
    #[tracing::instrument(skip(self))]
    pub fn set_window(&self, window: DimensionSnapshot) -> Result<(), DimensionError> {
        let window = window.validate(Surface::Window)?;
        self.apply(|inner| inner.window = Some(window));
        Ok(())
    }

    /// Replaces the screen size.
    ///
    /// Listeners are notified with both surfaces only if the window has been
    /// measured as well.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError::Malformed`] if `screen` is invalid.
    #[tracing::instrument(skip(self))]
    pub fn set_screen(&self, screen: DimensionSnapshot) -> Result<(), DimensionError> {
        let screen = screen.validate(Surface::Screen)?;
        self.apply(|inner| inner.screen = Some(screen));
        Ok(())
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Applies `update` and notifies listeners.
    ///
    /// A change reported while listeners are being notified is queued, and
    /// the notifying call delivers it once every listener has seen the
    /// current one. Listeners therefore always see changes in order, and the
    /// last state each of them sees is the latest.
    fn apply(&self, update: impl FnOnce(&mut Inner)) {
        {
            let mut inner = self.inner.lock();
            update(&mut *inner);

            if inner.state().is_none() {
                tracing::debug!("dimensions: change withheld until both surfaces are measured");
                return;
            }

            if inner.is_notifying {
                tracing::debug!("dimensions: change queued behind the current notification");
                inner.has_pending_change = true;
                return;
            }

            inner.is_notifying = true;
        }

        let _notifying = NotifyingGuard(&self.inner);

        loop {
            let (state, handlers) = {
                let mut inner = self.inner.lock();
                let Some(state) = inner.state() else {
                    return;
                };

                inner.has_pending_change = false;
                let handlers: Vec<ChangeHandler> = inner.listeners.values().cloned().collect();
                (state, handlers)
            };

            tracing::debug!(
                "dimensions: changed to {:?}, notifying {} listeners",
                state,
                handlers.len()
            );

            for handler in handlers {
                handler(&state);
            }

            if !self.inner.lock().has_pending_change {
                return;
            }
        }
    }
}

/// Clears `is_notifying` when notification ends, including by unwinding out
/// of a listener.
struct NotifyingGuard<'a>(&'a Mutex<Inner>);

impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().is_notifying = false;
    }
}

impl DimensionSource for Dimensions {
    fn get(&self, surface: Surface) -> Result<DimensionSnapshot, DimensionError> {
        let inner = self.inner.lock();
        match surface {
            Surface::Window => inner.window,
            Surface::Screen => inner.screen,
        }
        .ok_or(DimensionError::Unavailable(surface))
    }

    fn add_change_listener(&self, handler: ChangeHandler) -> Result<ListenerId, DimensionError> {
        let mut inner = self.inner.lock();

        if inner.listeners.len() >= inner.max_listeners {
            return Err(DimensionError::TooManyListeners);
        }

        let id = inner.listeners.insert(handler);
        tracing::debug!("dimensions: registered listener {:?}", id);
        Ok(id)
    }

    fn remove_change_listener(&self, id: ListenerId) -> bool {
        let removed = self.inner.lock().listeners.remove(id).is_some();
        if removed {
            tracing::debug!("dimensions: removed listener {:?}", id);
        }
        removed
    }
}

impl std::fmt::Debug for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Dimensions")
            .field("window", &inner.window)
            .field("screen", &inner.screen)
            .field("listeners", &inner.listeners.len())
            .field("max_listeners", &inner.max_listeners)
            .finish()
    }
}

impl Drop for Dimensions {
    fn drop(&mut self) {
        let listeners = self.inner.get_mut().listeners.len();
        if listeners > 0 {
            tracing::warn!(
                "dimensions: dropped with {} listeners still registered",
                listeners
            );
        }
    }
}
