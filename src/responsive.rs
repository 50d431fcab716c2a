//! Percentage-to-size conversions against the window and the screen.
//!
//! The `responsive_*` functions read the source once per call. The
//! `use_responsive_*` functions read the latest state of a live
//! [`DimensionSubscription`], which follows every change pushed by its source.

use std::sync::Arc;

use crate::{
    effect::{DimensionEffect, DimensionsChange},
    geometry::Surface,
    scale::Metric,
    source::{read_surface, DimensionError, DimensionSource},
    subscription::DimensionSubscription,
};

fn snapshot<S: DimensionSource + ?Sized>(
    source: &S,
    surface: Surface,
    metric: Metric,
    percent: f64,
) -> Result<f64, DimensionError> {
    Ok(metric.calculate(read_surface(source, surface)?, percent))
}

fn live<S: DimensionSource + ?Sized>(
    subscription: &DimensionSubscription<S>,
    surface: Surface,
    metric: Metric,
    percent: f64,
) -> f64 {
    metric.calculate(subscription.current().get(surface), percent)
}

/// `percent` percent of the window's longer edge.
///
/// # Errors
///
/// Fails if the window cannot be read or reports a malformed size.
pub fn responsive_height<S: DimensionSource + ?Sized>(
    source: &S,
    percent: f64,
) -> Result<f64, DimensionError> {
    snapshot(source, Surface::Window, Metric::Height, percent)
}

/// `percent` percent of the window's shorter edge.
///
/// # Errors
///
/// Fails if the window cannot be read or reports a malformed size.
pub fn responsive_width<S: DimensionSource + ?Sized>(
    source: &S,
    percent: f64,
) -> Result<f64, DimensionError> {
    snapshot(source, Surface::Window, Metric::Width, percent)
}

/// A font size of `percent` percent of the window's 16:9 diagonal.
///
/// # Errors
///
/// Fails if the window cannot be read or reports a malformed size.
pub fn responsive_font_size<S: DimensionSource + ?Sized>(
    source: &S,
    percent: f64,
) -> Result<f64, DimensionError> {
    snapshot(source, Surface::Window, Metric::FontSize, percent)
}

/// `percent` percent of the screen's longer edge.
///
/// # Errors
///
/// Fails if the screen cannot be read or reports a malformed size.
pub fn responsive_screen_height<S: DimensionSource + ?Sized>(
    source: &S,
    percent: f64,
) -> Result<f64, DimensionError> {
    snapshot(source, Surface::Screen, Metric::Height, percent)
}

/// `percent` percent of the screen's shorter edge.
///
/// # Errors
///
/// Fails if the screen cannot be read or reports a malformed size.
pub fn responsive_screen_width<S: DimensionSource + ?Sized>(
    source: &S,
    percent: f64,
) -> Result<f64, DimensionError> {
    snapshot(source, Surface::Screen, Metric::Width, percent)
}

/// A font size of `percent` percent of the screen's 16:9 diagonal.
///
/// # Errors
///
/// Fails if the screen cannot be read or reports a malformed size.
pub fn responsive_screen_font_size<S: DimensionSource + ?Sized>(
    source: &S,
    percent: f64,
) -> Result<f64, DimensionError> {
    snapshot(source, Surface::Screen, Metric::FontSize, percent)
}

/// Like [`responsive_height`], from the subscription's latest state.
#[must_use]
pub fn use_responsive_height<S: DimensionSource + ?Sized>(
    subscription: &DimensionSubscription<S>,
    percent: f64,
) -> f64 {
    live(subscription, Surface::Window, Metric::Height, percent)
}

/// Like [`responsive_width`], from the subscription's latest state.
#[must_use]
pub fn use_responsive_width<S: DimensionSource + ?Sized>(
    subscription: &DimensionSubscription<S>,
    percent: f64,
) -> f64 {
    live(subscription, Surface::Window, Metric::Width, percent)
}

/// Like [`responsive_font_size`], from the subscription's latest state.
#[must_use]
pub fn use_responsive_font_size<S: DimensionSource + ?Sized>(
    subscription: &DimensionSubscription<S>,
    percent: f64,
) -> f64 {
    live(subscription, Surface::Window, Metric::FontSize, percent)
}

/// Like [`responsive_screen_height`], from the subscription's latest state.
#[must_use]
pub fn use_responsive_screen_height<S: DimensionSource + ?Sized>(
    subscription: &DimensionSubscription<S>,
    percent: f64,
) -> f64 {
    live(subscription, Surface::Screen, Metric::Height, percent)
}

/// Like [`responsive_screen_width`], from the subscription's latest state.
#[must_use]
pub fn use_responsive_screen_width<S: DimensionSource + ?Sized>(
    subscription: &DimensionSubscription<S>,
    percent: f64,
) -> f64 {
    live(subscription, Surface::Screen, Metric::Width, percent)
}

/// Like [`responsive_screen_font_size`], from the subscription's latest state.
#[must_use]
pub fn use_responsive_screen_font_size<S: DimensionSource + ?Sized>(
    subscription: &DimensionSubscription<S>,
    percent: f64,
) -> f64 {
    live(subscription, Surface::Screen, Metric::FontSize, percent)
}

/// Runs `effect` on every dimension change after activation. Keep the
/// returned dispatcher alive for as long as the effect should run.
///
/// # Errors
///
/// Fails if either surface cannot be read or the listener cannot be
/// registered.
pub fn use_dimensions_change<S: DimensionSource + ?Sized>(
    source: Arc<S>,
    effect: DimensionEffect,
) -> Result<DimensionsChange<S>, DimensionError> {
    DimensionsChange::new(source, effect)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        effect::Cleanup,
        geometry::{DimensionSnapshot, DualDimensionState},
        scale::font_calculation,
        source::{Dimensions, DimensionsAttributes},
    };

    fn source(window: DimensionSnapshot, screen: DimensionSnapshot) -> Arc<Dimensions> {
        Arc::new(Dimensions::with_sizes(window, screen).unwrap())
    }

    #[test]
    fn portrait_window() {
        let source = source(
            DimensionSnapshot::new(800.0, 400.0),
            DimensionSnapshot::new(900.0, 400.0),
        );

        assert_eq!(responsive_height(&*source, 50.0), Ok(400.0));
        assert_eq!(responsive_width(&*source, 50.0), Ok(200.0));

        let font = responsive_font_size(&*source, 10.0).unwrap();
        assert!((font - 81.59).abs() < 0.01);
        assert_eq!(font, font_calculation(800.0, 400.0, 10.0));
    }

    #[test]
    fn landscape_window() {
        let source = source(
            DimensionSnapshot::new(400.0, 800.0),
            DimensionSnapshot::new(900.0, 400.0),
        );

        assert_eq!(responsive_height(&*source, 50.0), Ok(400.0));
        assert_eq!(responsive_width(&*source, 50.0), Ok(200.0));
        assert_eq!(
            responsive_font_size(&*source, 10.0),
            Ok(font_calculation(800.0, 400.0, 10.0))
        );
    }

    #[test]
    fn screen_functions_read_screen() {
        let source = source(
            DimensionSnapshot::new(800.0, 400.0),
            DimensionSnapshot::new(300.0, 600.0),
        );

        assert_eq!(responsive_screen_height(&*source, 50.0), Ok(300.0));
        assert_eq!(responsive_screen_width(&*source, 50.0), Ok(150.0));
        assert_eq!(
            responsive_screen_font_size(&*source, 5.0),
            Ok(font_calculation(600.0, 300.0, 5.0))
        );
    }

    #[test]
    fn percentages_are_not_clamped() {
        let source = source(
            DimensionSnapshot::new(800.0, 400.0),
            DimensionSnapshot::new(800.0, 400.0),
        );

        assert_eq!(responsive_height(&*source, 150.0), Ok(1200.0));
        assert_eq!(responsive_width(&*source, -10.0), Ok(-40.0));
    }

    #[test]
    fn unmeasured_surface() {
        let source = Dimensions::new(
            DimensionsAttributes::default().with_window(DimensionSnapshot::new(800.0, 400.0)),
        )
        .unwrap();

        assert_eq!(responsive_height(&source, 50.0), Ok(400.0));
        assert_eq!(
            responsive_screen_height(&source, 50.0),
            Err(DimensionError::Unavailable(Surface::Screen))
        );
    }

    #[test]
    fn live_screen_height_follows_resize() {
        let source = source(
            DimensionSnapshot::new(800.0, 400.0),
            DimensionSnapshot::new(600.0, 300.0),
        );
        let subscription = DimensionSubscription::new(source.clone()).unwrap();

        assert_eq!(use_responsive_screen_height(&subscription, 50.0), 300.0);

        source
            .set_screen(DimensionSnapshot::new(1000.0, 500.0))
            .unwrap();

        assert_eq!(use_responsive_screen_height(&subscription, 50.0), 500.0);
        assert_eq!(use_responsive_screen_width(&subscription, 50.0), 250.0);
        assert_eq!(
            use_responsive_screen_font_size(&subscription, 10.0),
            font_calculation(1000.0, 500.0, 10.0)
        );
    }

    #[test]
    fn live_window_follows_rotation() {
        let source = source(
            DimensionSnapshot::new(800.0, 400.0),
            DimensionSnapshot::new(800.0, 400.0),
        );
        let subscription = DimensionSubscription::new(source.clone()).unwrap();
        let font = use_responsive_font_size(&subscription, 10.0);

        source
            .set(
                DimensionSnapshot::new(400.0, 800.0),
                DimensionSnapshot::new(400.0, 800.0),
            )
            .unwrap();

        assert_eq!(use_responsive_height(&subscription, 50.0), 400.0);
        assert_eq!(use_responsive_width(&subscription, 50.0), 200.0);
        assert_eq!(use_responsive_font_size(&subscription, 10.0), font);

        source
            .set_window(DimensionSnapshot::new(1200.0, 600.0))
            .unwrap();
        assert_eq!(use_responsive_height(&subscription, 50.0), 600.0);
        assert_eq!(use_responsive_width(&subscription, 50.0), 300.0);
    }

    #[test]
    fn live_matches_snapshot() {
        let source = source(
            DimensionSnapshot::new(640.0, 360.0),
            DimensionSnapshot::new(1280.0, 720.0),
        );
        let subscription = DimensionSubscription::new(source.clone()).unwrap();

        for percent in [0.0, 12.5, 50.0, 100.0] {
            assert_eq!(
                Ok(use_responsive_height(&subscription, percent)),
                responsive_height(&*source, percent)
            );
            assert_eq!(
                Ok(use_responsive_screen_width(&subscription, percent)),
                responsive_screen_width(&*source, percent)
            );
        }
    }

    #[test]
    fn dimensions_change() {
        let source = source(
            DimensionSnapshot::new(800.0, 400.0),
            DimensionSnapshot::new(600.0, 300.0),
        );
        let runs = Arc::new(AtomicUsize::new(0));
        let cleanups = Arc::new(AtomicUsize::new(0));

        let effect: DimensionEffect = {
            let runs = runs.clone();
            let cleanups = cleanups.clone();
            Arc::new(move |state: &DualDimensionState| {
                assert_eq!(state.screen, DimensionSnapshot::new(1000.0, 500.0));
                runs.fetch_add(1, Ordering::SeqCst);

                let cleanups = cleanups.clone();
                Some(Box::new(move || {
                    cleanups.fetch_add(1, Ordering::SeqCst);
                }) as Cleanup)
            })
        };

        let change = use_dimensions_change(source.clone(), effect).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        source
            .set_screen(DimensionSnapshot::new(1000.0, 500.0))
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        drop(change);
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(source.listener_count(), 0);

        source
            .set_screen(DimensionSnapshot::new(600.0, 300.0))
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
