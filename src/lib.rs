//! Responsive sizing for graphical applications.
//!
//! Converts percentages into absolute heights, widths, and font sizes relative
//! to the current window or screen, and keeps those values current as the
//! display is resized or rotated.
//!
//! Sizes come from a [`DimensionSource`]. Hosts without their own can feed a
//! [`Dimensions`] source from their resize events.

pub mod effect;
pub mod geometry;
pub mod limits;
pub mod responsive;
pub mod scale;
pub mod source;
pub mod subscription;

pub use effect::{Cleanup, DimensionEffect, DimensionsChange};
pub use geometry::{DimensionSnapshot, DualDimensionState, NormalizedEdges, Surface};
pub use responsive::{
    responsive_font_size, responsive_height, responsive_screen_font_size,
    responsive_screen_height, responsive_screen_width, responsive_width, use_dimensions_change,
    use_responsive_font_size, use_responsive_height, use_responsive_screen_font_size,
    use_responsive_screen_height, use_responsive_screen_width, use_responsive_width,
};
pub use scale::{font_calculation, percentage_calculation, Metric};
pub use source::{
    ChangeHandler, DimensionError, DimensionSource, Dimensions, DimensionsAttributes, ListenerId,
};
pub use subscription::{DimensionObserver, DimensionSubscription, Revision};
