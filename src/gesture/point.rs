use smithay::utils::{Logical, Point};

use super::event::{DeviceId, GestureEvent, SequenceId};

/// More points than this while a gesture is running means something is wrong with the device.
pub const MAX_GESTURE_POINTS: usize = 10;

/// Time deltas smaller than this don't produce a velocity.
pub const FLOAT_EPSILON: f64 = 1e-15;

/// One pointer or touch point taking part in a gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct GesturePoint {
    device: DeviceId,
    sequence: Option<SequenceId>,
    last_event: GestureEvent,

    press: Point<f64, Logical>,
    last_motion: Point<f64, Logical>,
    last_motion_time: i64,
    last_delta: Point<f64, Logical>,
    last_delta_time: i64,
    release: Point<f64, Logical>,

    /// Whether the recognizer holds a grab for this point.
    pub(super) grabbed: bool,
}

impl GesturePoint {
    pub(super) fn new(event: &GestureEvent) -> Self {
        Self {
            device: event.device,
            sequence: event.point_sequence(),
            last_event: *event,
            press: event.pos,
            last_motion: event.pos,
            last_motion_time: event.time,
            last_delta: Point::from((0., 0.)),
            last_delta_time: 0,
            release: event.pos,
            grabbed: false,
        }
    }

    pub(super) fn matches(&self, device: DeviceId, sequence: Option<SequenceId>) -> bool {
        self.device == device && self.sequence == sequence
    }

    pub(super) fn update_motion(&mut self, event: &GestureEvent) {
        self.last_event = *event;

        self.last_delta = event.pos - self.last_motion;
        self.last_motion = event.pos;

        self.last_delta_time = event.time.saturating_sub(self.last_motion_time);
        self.last_motion_time = event.time;
    }

    /// The release continues the last motion: if the point sat still before it was lifted, the
    /// time since the last motion counts towards the last delta.
    pub(super) fn update_release(&mut self, event: &GestureEvent) {
        self.last_event = *event;
        self.release = event.pos;
        self.last_delta_time = self
            .last_delta_time
            .saturating_add(event.time.saturating_sub(self.last_motion_time));
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// `None` for pointer points.
    pub fn sequence(&self) -> Option<SequenceId> {
        self.sequence
    }

    pub fn last_event(&self) -> &GestureEvent {
        &self.last_event
    }

    pub fn press_coords(&self) -> Point<f64, Logical> {
        self.press
    }

    pub fn motion_coords(&self) -> Point<f64, Logical> {
        self.last_motion
    }

    pub fn last_motion_time(&self) -> i64 {
        self.last_motion_time
    }

    /// Where the point was lifted. Same as the press position until then.
    pub fn release_coords(&self) -> Point<f64, Logical> {
        self.release
    }

    /// The last motion delta and its length.
    pub fn motion_delta(&self) -> (Point<f64, Logical>, f64) {
        let delta = self.last_delta;
        (delta, delta.x.hypot(delta.y))
    }

    /// Velocity over the last motion delta in logical pixels per millisecond, and the speed.
    ///
    /// Zero unless time moved forward between the samples.
    pub fn velocity(&self) -> (Point<f64, Logical>, f64) {
        let dt = self.last_delta_time as f64;
        if dt < FLOAT_EPSILON {
            return (Point::from((0., 0.)), 0.);
        }

        let (delta, distance) = self.motion_delta();
        (Point::from((delta.x / dt, delta.y / dt)), distance / dt)
    }
}
