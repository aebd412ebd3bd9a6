//! Raw input events fed to a gesture recognizer.

use smithay::utils::{Logical, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

/// One touch sequence, from touch down to touch up, on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEventKind {
    ButtonPress,
    Motion,
    ButtonRelease,
    TouchBegin,
    TouchUpdate,
    TouchEnd,
    TouchCancel,
}

impl GestureEventKind {
    pub fn is_touch(self) -> bool {
        matches!(
            self,
            Self::TouchBegin | Self::TouchUpdate | Self::TouchEnd | Self::TouchCancel
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureEventKind,
    pub device: DeviceId,
    /// Always `None` for pointer events.
    pub sequence: Option<SequenceId>,
    pub pos: Point<f64, Logical>,
    /// Timestamp in milliseconds.
    pub time: i64,
}

impl GestureEvent {
    fn pointer(
        kind: GestureEventKind,
        device: DeviceId,
        pos: impl Into<Point<f64, Logical>>,
        time: i64,
    ) -> Self {
        Self {
            kind,
            device,
            sequence: None,
            pos: pos.into(),
            time,
        }
    }

    fn touch(
        kind: GestureEventKind,
        device: DeviceId,
        sequence: SequenceId,
        pos: impl Into<Point<f64, Logical>>,
        time: i64,
    ) -> Self {
        Self {
            kind,
            device,
            sequence: Some(sequence),
            pos: pos.into(),
            time,
        }
    }

    pub fn press(device: DeviceId, pos: impl Into<Point<f64, Logical>>, time: i64) -> Self {
        Self::pointer(GestureEventKind::ButtonPress, device, pos, time)
    }

    pub fn motion(device: DeviceId, pos: impl Into<Point<f64, Logical>>, time: i64) -> Self {
        Self::pointer(GestureEventKind::Motion, device, pos, time)
    }

    pub fn release(device: DeviceId, pos: impl Into<Point<f64, Logical>>, time: i64) -> Self {
        Self::pointer(GestureEventKind::ButtonRelease, device, pos, time)
    }

    pub fn touch_begin(
        device: DeviceId,
        sequence: SequenceId,
        pos: impl Into<Point<f64, Logical>>,
        time: i64,
    ) -> Self {
        Self::touch(GestureEventKind::TouchBegin, device, sequence, pos, time)
    }

    pub fn touch_update(
        device: DeviceId,
        sequence: SequenceId,
        pos: impl Into<Point<f64, Logical>>,
        time: i64,
    ) -> Self {
        Self::touch(GestureEventKind::TouchUpdate, device, sequence, pos, time)
    }

    pub fn touch_end(
        device: DeviceId,
        sequence: SequenceId,
        pos: impl Into<Point<f64, Logical>>,
        time: i64,
    ) -> Self {
        Self::touch(GestureEventKind::TouchEnd, device, sequence, pos, time)
    }

    pub fn touch_cancel(
        device: DeviceId,
        sequence: SequenceId,
        pos: impl Into<Point<f64, Logical>>,
        time: i64,
    ) -> Self {
        Self::touch(GestureEventKind::TouchCancel, device, sequence, pos, time)
    }

    /// Sequence identifying the point this event belongs to. Pointer events carry none.
    pub fn point_sequence(&self) -> Option<SequenceId> {
        if self.kind.is_touch() {
            self.sequence
        } else {
            None
        }
    }
}

/// Whether an event was used up by the recognizer or should continue to other handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Consumed,
    Propagate,
}
