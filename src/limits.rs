//! Static limits and constants.

/// The value a percentage is divided by before it scales a reference length.
pub const PERCENT_BASE: f64 = 100.0;

/// The aspect ratio assumed by the font size calculation, applied to the
/// shorter edge of a surface regardless of its actual aspect ratio.
pub const FONT_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// The default maximum number of change listeners a [`Dimensions`] source
/// accepts at once.
///
/// [`Dimensions`]: crate::Dimensions
pub const MAX_CHANGE_LISTENERS: usize = 64;
