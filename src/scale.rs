//! Conversion of percentages into absolute sizes.
//!
//! Percentages are not clamped. Values below 0 or above 100 extrapolate
//! linearly.

use crate::{
    geometry::DimensionSnapshot,
    limits::{FONT_ASPECT_RATIO, PERCENT_BASE},
};

/// Returns `percent` percent of `reference`.
#[must_use]
pub fn percentage_calculation(reference: f64, percent: f64) -> f64 {
    reference * (percent / PERCENT_BASE)
}

/// Scales a synthetic diagonal by `percent`.
///
/// The diagonal is that of a 16:9 surface whose short edge is the shorter of
/// `height` and `width`. The actual aspect ratio of the surface is ignored.
#[must_use]
pub fn font_calculation(height: f64, width: f64, percent: f64) -> f64 {
    let short_edge = if height > width { width } else { height };
    let aspect_ratio_height = FONT_ASPECT_RATIO * short_edge;
    let diagonal = (aspect_ratio_height.powi(2) + short_edge.powi(2)).sqrt();

    percentage_calculation(diagonal, percent)
}

/// The kind of size a percentage is converted into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Scales against the longer edge.
    Height,
    /// Scales against the shorter edge.
    Width,
    /// Scales against the synthetic diagonal of [`font_calculation`].
    FontSize,
}

impl Metric {
    #[must_use]
    pub fn calculate(self, snapshot: DimensionSnapshot, percent: f64) -> f64 {
        match self {
            Self::Height => percentage_calculation(snapshot.normalized().long_edge, percent),
            Self::Width => percentage_calculation(snapshot.normalized().short_edge, percent),
            Self::FontSize => {
                let DimensionSnapshot {
                    mut height,
                    mut width,
                } = snapshot;

                // swap rather than clamp so both edges reach the font calculation
                if height < width {
                    std::mem::swap(&mut height, &mut width);
                }
                font_calculation(height, width, percent)
            }
        }
    }
}
