//! Measured surface sizes: [`Surface`], [`DimensionSnapshot`], and the
//! combined [`DualDimensionState`] tracked by subscriptions.

use crate::source::DimensionError;

/// One of the two measured areas of the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The area visible to the application.
    Window,
    /// The full physical display.
    Screen,
}

impl Surface {
    pub const ALL: [Self; 2] = [Self::Window, Self::Screen];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Screen => "screen",
        }
    }
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The edges of a snapshot independent of rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedEdges {
    pub long_edge: f64,
    pub short_edge: f64,
}

/// The size of a surface at one point in time, in device-independent units.
///
/// Snapshots are never patched. A new measurement replaces the old snapshot
/// wholesale.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DimensionSnapshot {
    pub height: f64,
    pub width: f64,
}

impl DimensionSnapshot {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(height: f64, width: f64) -> Self {
        Self { height, width }
    }

    /// Checks that both edges are finite and non-negative.
    ///
    /// Zero-sized surfaces are valid; they scale to zero.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError::Malformed`] naming `surface` if either edge is
    /// NaN, infinite, or negative.
    pub fn validate(self, surface: Surface) -> Result<Self, DimensionError> {
        let is_valid = |edge: f64| edge.is_finite() && edge >= 0.0;

        if is_valid(self.height) && is_valid(self.width) {
            Ok(self)
        } else {
            Err(DimensionError::Malformed {
                surface,
                height: self.height,
                width: self.width,
            })
        }
    }

    /// Returns the (long, short) edge pair regardless of the current rotation.
    #[must_use]
    pub fn normalized(&self) -> NormalizedEdges {
        NormalizedEdges {
            long_edge: self.height.max(self.width),
            short_edge: self.height.min(self.width),
        }
    }
}

/// The latest snapshots of both surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DualDimensionState {
    pub window: DimensionSnapshot,
    pub screen: DimensionSnapshot,
}

impl DualDimensionState {
    #[must_use]
    pub const fn new(window: DimensionSnapshot, screen: DimensionSnapshot) -> Self {
        Self { window, screen }
    }

    #[must_use]
    pub fn get(&self, surface: Surface) -> DimensionSnapshot {
        match surface {
            Surface::Window => self.window,
            Surface::Screen => self.screen,
        }
    }

    /// # Errors
    ///
    /// Returns the first [`DimensionError::Malformed`] found, window first.
    pub fn validate(self) -> Result<Self, DimensionError> {
        Ok(Self {
            window: self.window.validate(Surface::Window)?,
            screen: self.screen.validate(Surface::Screen)?,
        })
    }
}
