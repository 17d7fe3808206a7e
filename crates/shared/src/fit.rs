//! Viewport-fitting control logic.
//!
//! Map containers are routinely measured at (0,0) on the first layout pass
//! (hidden tab, transitioning panel). Instead of nesting timer callbacks,
//! the fitter is an explicit state machine: the driver measures the
//! container, feeds the measurement in, and performs whatever delay the
//! machine asks for. Cancellation is dropping the machine and starting a
//! fresh one for the new geometry.

use geojson::GeoJson;

use crate::bounds::{bounds_of, Bounds};
use crate::mercator::{fit_zoom, FIT_PADDING_PX, MAX_FIT_ZOOM, POINT_ZOOM};

/// How many times a (0,0) container is re-measured before giving up.
pub const MAX_SIZE_RETRIES: u32 = 5;

/// Backoff delays between size re-measurements, in milliseconds.
pub const RETRY_DELAYS_MS: [u32; MAX_SIZE_RETRIES as usize] = [100, 200, 300, 300, 300];

/// Delay before the single settle re-measurement after a fit is applied.
pub const SETTLE_DELAY_MS: u32 = 300;

/// The view a map should show for some geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapView {
    /// No valid coordinate anywhere: render a placeholder.
    Empty,
    /// Center on a point at the fixed point zoom.
    Center { lat: f64, lng: f64, zoom: f64 },
    /// Bounds fit: centroid of the bounds at the fitted zoom.
    Fit { lat: f64, lng: f64, zoom: f64 },
}

impl MapView {
    pub fn center(&self) -> Option<(f64, f64)> {
        match *self {
            MapView::Empty => None,
            MapView::Center { lat, lng, .. } | MapView::Fit { lat, lng, .. } => Some((lat, lng)),
        }
    }

    pub fn zoom(&self) -> Option<f64> {
        match *self {
            MapView::Empty => None,
            MapView::Center { zoom, .. } | MapView::Fit { zoom, .. } => Some(zoom),
        }
    }
}

fn centered(bounds: &Bounds) -> MapView {
    let (lat, lng) = bounds.center();
    MapView::Center {
        lat,
        lng,
        zoom: POINT_ZOOM,
    }
}

/// View for `geometry` in a viewport of known size. Degenerate bounds get
/// point-centering; anything invalid degrades to [`MapView::Empty`].
pub fn resolve_view(geometry: &GeoJson, width: f64, height: f64) -> MapView {
    let Some(bounds) = bounds_of(geometry) else {
        return MapView::Empty;
    };
    if bounds.is_degenerate() {
        return centered(&bounds);
    }
    if width <= 0.0 || height <= 0.0 {
        // Size never materialized: centroid-centering fallback
        return centered(&bounds);
    }
    let (lat, lng) = bounds.center();
    MapView::Fit {
        lat,
        lng,
        zoom: fit_zoom(&bounds, width, height, FIT_PADDING_PX, MAX_FIT_ZOOM),
    }
}

/// What the driver must do after feeding a measurement in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitAction {
    /// Container not measurable yet: wait, re-measure, call again.
    RetryAfter { delay_ms: u32 },
    /// Show this view now, then re-measure once after `settle_ms` and call
    /// again to catch a resize during the first fit.
    Apply { view: MapView, settle_ms: u32 },
    /// Final view; further calls return the same answer.
    Done { view: MapView },
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Measuring { attempts: u32 },
    Settling { size: (f64, f64), view: MapView },
    Finished { view: MapView },
}

/// One fit attempt for one geometry. Owns no timers: delays are requested
/// from the driver, so teardown is simply dropping the machine.
#[derive(Debug)]
pub struct FitMachine {
    geometry: GeoJson,
    phase: Phase,
}

fn size_usable(size: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match size {
        Some((w, h)) if w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite() => Some((w, h)),
        _ => None,
    }
}

impl FitMachine {
    pub fn new(geometry: GeoJson) -> Self {
        FitMachine {
            geometry,
            phase: Phase::Measuring { attempts: 0 },
        }
    }

    /// Feed in the container's measured size (`None` when the element is not
    /// in the DOM yet) and get the next step.
    pub fn on_measure(&mut self, size: Option<(f64, f64)>) -> FitAction {
        match self.phase.clone() {
            Phase::Measuring { attempts } => match size_usable(size) {
                Some((w, h)) => {
                    let view = resolve_view(&self.geometry, w, h);
                    self.phase = Phase::Settling {
                        size: (w, h),
                        view,
                    };
                    FitAction::Apply {
                        view,
                        settle_ms: SETTLE_DELAY_MS,
                    }
                }
                None => {
                    if attempts < MAX_SIZE_RETRIES {
                        let delay_ms = RETRY_DELAYS_MS[attempts as usize];
                        self.phase = Phase::Measuring {
                            attempts: attempts + 1,
                        };
                        FitAction::RetryAfter { delay_ms }
                    } else {
                        // Retry budget exhausted: centroid fallback
                        let view = resolve_view(&self.geometry, 0.0, 0.0);
                        self.phase = Phase::Finished { view };
                        FitAction::Done { view }
                    }
                }
            },
            Phase::Settling {
                size: fitted_size,
                view,
            } => {
                let final_view = match size_usable(size) {
                    Some(new_size) if new_size != fitted_size => {
                        resolve_view(&self.geometry, new_size.0, new_size.1)
                    }
                    _ => view,
                };
                self.phase = Phase::Finished { view: final_view };
                FitAction::Done { view: final_view }
            }
            Phase::Finished { view } => FitAction::Done { view },
        }
    }
}
