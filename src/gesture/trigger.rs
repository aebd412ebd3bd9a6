//! Drag threshold gating for gestures.
//!
//! [`TriggerGate`] sits between a recognizer and the real handler. Depending on its
//! [`TriggerEdge`], a gesture either may only begin once some point has moved past the threshold,
//! or is cancelled as soon as the moving point gets past it.

use std::cell::RefCell;
use std::rc::Rc;

use meridian_config::{Config, Gestures, TriggerEdge};
use tracing::debug;

use super::{DeviceId, GestureContext, GestureHandler, GesturePoint, SequenceId};

/// Source of the default drag threshold, in logical pixels.
///
/// Read every time a threshold is checked, so changes apply to gestures in progress.
pub trait DragThreshold {
    fn drag_threshold(&self) -> f64;
}

impl DragThreshold for f64 {
    fn drag_threshold(&self) -> f64 {
        *self
    }
}

impl<F: Fn() -> f64> DragThreshold for F {
    fn drag_threshold(&self) -> f64 {
        self()
    }
}

impl DragThreshold for Rc<RefCell<Config>> {
    fn drag_threshold(&self) -> f64 {
        self.borrow().gestures.drag_threshold.0
    }
}

#[derive(Debug)]
pub struct TriggerGate<H, T = f64> {
    inner: H,
    edge: TriggerEdge,
    /// Configured per-axis distance. Zero or below means the default drag threshold.
    distance: (f64, f64),
    default_threshold: T,
}

impl<H: GestureHandler, T: DragThreshold> TriggerGate<H, T> {
    pub fn new(inner: H, edge: TriggerEdge, default_threshold: T) -> Self {
        Self {
            inner,
            edge,
            distance: (-1., -1.),
            default_threshold,
        }
    }

    pub fn from_config(inner: H, config: &Gestures, default_threshold: T) -> Self {
        let mut gate = Self::new(inner, config.trigger_edge, default_threshold);
        gate.set_threshold_distance(
            config.threshold_distance.x.0,
            config.threshold_distance.y.0,
        );
        gate
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }

    pub fn edge(&self) -> TriggerEdge {
        self.edge
    }

    pub fn set_edge(&mut self, edge: TriggerEdge) {
        self.edge = edge;
    }

    /// Values of zero or below use the default drag threshold for that axis.
    pub fn set_threshold_distance(&mut self, x: f64, y: f64) {
        self.distance = (x, y);
    }

    /// The threshold in effect right now, per axis.
    pub fn threshold_distance(&self) -> (f64, f64) {
        let resolve = |value: f64| {
            if value > 0. {
                value
            } else {
                self.default_threshold.drag_threshold()
            }
        };

        (resolve(self.distance.0), resolve(self.distance.1))
    }

    fn is_inside_threshold(&self, point: &GesturePoint) -> bool {
        let (x, y) = self.threshold_distance();
        let moved = point.motion_coords() - point.press_coords();
        moved.x.abs() < x && moved.y.abs() < y
    }
}

impl<H: GestureHandler, T: DragThreshold> GestureHandler for TriggerGate<H, T> {
    fn prepare(&mut self, ctx: &mut GestureContext<'_>, point: usize) -> bool {
        if self.edge == TriggerEdge::Before
            && ctx.points().iter().all(|p| self.is_inside_threshold(p))
        {
            return false;
        }

        self.inner.prepare(ctx, point)
    }

    fn begin(&mut self, ctx: &mut GestureContext<'_>, point: usize) -> bool {
        self.inner.begin(ctx, point)
    }

    fn progress(&mut self, ctx: &mut GestureContext<'_>, point: usize) -> bool {
        if self.edge == TriggerEdge::After {
            if let Some(moving) = ctx.point(point) {
                if !self.is_inside_threshold(moving) {
                    debug!("point {point} moved past the drag threshold");
                    return false;
                }
            }
        }

        self.inner.progress(ctx, point)
    }

    fn end(&mut self, ctx: &GestureContext<'_>, point: Option<usize>) {
        self.inner.end(ctx, point);
    }

    fn cancel(&mut self, ctx: &GestureContext<'_>) {
        self.inner.cancel(ctx);
    }

    fn grab(&mut self, device: DeviceId, sequence: Option<SequenceId>) {
        self.inner.grab(device, sequence);
    }

    fn ungrab(&mut self, device: DeviceId, sequence: Option<SequenceId>) {
        self.inner.ungrab(device, sequence);
    }
}
