//! Multi-point gesture recognition.
//!
//! A [`GestureRecognizer`] tracks the pointer and touch points pressed on one target and turns
//! them into begin, progress, end and cancel callbacks on a [`GestureHandler`]. A gesture is
//! recognized once the requested number of points is down and the handler agrees to start it.
//!
//! Points are referred to by their index in the point list. Removing a point shifts the indices
//! of the points after it, so an index is only meaningful until the next release.

use tracing::{debug, trace, warn};

pub mod event;
pub mod point;
pub mod trigger;


pub use self::event::{DeviceId, EventFlow, GestureEvent, GestureEventKind, SequenceId};
pub use self::point::{GesturePoint, FLOAT_EPSILON, MAX_GESTURE_POINTS};
pub use self::trigger::{DragThreshold, TriggerGate};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// Waiting for enough points, or for the handler to agree to begin.
    #[default]
    Waiting,
    Recognized,
    /// Ended while points were still down. Waits for every point to be released.
    Ended,
    /// Cancelled while points were still down. Waits for every point to be released.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Cancel,
    End,
}

/// What a handler sees of the recognizer during a callback.
///
/// Handlers can't call back into the recognizer while it is dispatching. They ask for the
/// gesture to be cancelled or ended through the context instead, and the recognizer does so
/// right after the callback returns.
#[derive(Debug)]
pub struct GestureContext<'a> {
    points: &'a [GesturePoint],
    state: GestureState,
    request: Option<Request>,
}

impl<'a> GestureContext<'a> {
    fn new(points: &'a [GesturePoint], state: GestureState) -> Self {
        Self {
            points,
            state,
            request: None,
        }
    }

    pub fn points(&self) -> &'a [GesturePoint] {
        self.points
    }

    pub fn point(&self, idx: usize) -> Option<&'a GesturePoint> {
        self.points.get(idx)
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Cancels the gesture once the callback returns. Wins over [`end()`](Self::end).
    pub fn cancel(&mut self) {
        self.request = Some(Request::Cancel);
    }

    /// Ends the gesture once the callback returns.
    pub fn end(&mut self) {
        if self.request.is_none() {
            self.request = Some(Request::End);
        }
    }
}

/// Callbacks of a gesture recognizer.
///
/// Every method has a default that accepts the gesture, so handlers implement only what they
/// care about.
#[allow(unused_variables)]
pub trait GestureHandler {
    /// Checked before a gesture begins. Returning `false` keeps the recognizer waiting; it
    /// asks again on the next event.
    fn prepare(&mut self, ctx: &mut GestureContext<'_>, point: usize) -> bool {
        true
    }

    /// The gesture begins. Returning `false` cancels it.
    fn begin(&mut self, ctx: &mut GestureContext<'_>, point: usize) -> bool {
        true
    }

    /// A point of a recognized gesture moved. Returning `false` cancels the gesture.
    fn progress(&mut self, ctx: &mut GestureContext<'_>, point: usize) -> bool {
        true
    }

    /// The gesture ended. `point` is the released point, or `None` if the gesture was ended
    /// explicitly.
    fn end(&mut self, ctx: &GestureContext<'_>, point: Option<usize>) {}

    fn cancel(&mut self, ctx: &GestureContext<'_>) {}

    /// Events of this device and sequence should be routed to the recognizer from now on.
    fn grab(&mut self, device: DeviceId, sequence: Option<SequenceId>) {}

    /// Releases a grab taken with [`grab()`](Self::grab).
    fn ungrab(&mut self, device: DeviceId, sequence: Option<SequenceId>) {}
}

#[derive(Debug)]
pub struct GestureRecognizer<H> {
    handler: H,
    points: Vec<GesturePoint>,
    state: GestureState,
    /// Number of points needed to begin.
    n_touch_points: usize,
    enabled: bool,
    /// Attached to the whole stage rather than to one target, which needs no grabs.
    on_stage: bool,
}

impl<H: GestureHandler> GestureRecognizer<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            points: Vec::new(),
            state: GestureState::Waiting,
            n_touch_points: 1,
            enabled: true,
            on_stage: false,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn points(&self) -> &[GesturePoint] {
        &self.points
    }

    pub fn point(&self, idx: usize) -> Option<&GesturePoint> {
        self.points.get(idx)
    }

    pub fn n_current_points(&self) -> usize {
        self.points.len()
    }

    pub fn n_touch_points(&self) -> usize {
        self.n_touch_points
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_on_stage(&self) -> bool {
        self.on_stage
    }

    /// Sets how many points must be down for the gesture to begin, between 1 and
    /// [`MAX_GESTURE_POINTS`].
    ///
    /// Takes effect right away: a running gesture that now has too few points is cancelled, and a
    /// waiting one that now has enough tries to begin.
    pub fn set_n_touch_points(&mut self, n: usize) {
        if !(1..=MAX_GESTURE_POINTS).contains(&n) {
            warn!("ignoring invalid number of gesture points: {n}");
            return;
        }

        if self.n_touch_points == n {
            return;
        }
        self.n_touch_points = n;

        match self.state {
            GestureState::Recognized if self.points.len() < n => self.cancel(),
            GestureState::Waiting if !self.points.is_empty() && self.points.len() >= n => {
                self.begin_gesture(self.points.len() - 1);
            }
            _ => (),
        }
    }

    /// A disabled recognizer drops its points and lets every event through.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }

        if !enabled {
            self.reset();
        }
        self.enabled = enabled;
    }

    /// Recognizers attached to the stage see every event anyway, so they never grab.
    pub fn set_on_stage(&mut self, on_stage: bool) {
        self.on_stage = on_stage;
    }

    pub fn handle_event(&mut self, event: &GestureEvent) -> EventFlow {
        let _span = tracy_client::span!("GestureRecognizer::handle_event");

        if !self.enabled {
            return EventFlow::Propagate;
        }

        trace!(
            "{:?} from {:?}/{:?} in {:?}",
            event.kind,
            event.device,
            event.sequence,
            self.state
        );

        match event.kind {
            GestureEventKind::ButtonPress | GestureEventKind::TouchBegin => self.on_press(event),
            GestureEventKind::Motion | GestureEventKind::TouchUpdate => self.on_motion(event),
            GestureEventKind::ButtonRelease | GestureEventKind::TouchEnd => self.on_release(event),
            GestureEventKind::TouchCancel => {
                self.reset();
                EventFlow::Propagate
            }
        }
    }

    /// Cancels a recognized gesture. Does nothing otherwise.
    ///
    /// The points stay registered until they are released.
    pub fn cancel(&mut self) {
        if self.state != GestureState::Recognized {
            return;
        }

        debug!("cancelling gesture with {} points", self.points.len());
        self.state = GestureState::Cancelled;
        let ctx = GestureContext::new(&self.points, self.state);
        self.handler.cancel(&ctx);
    }

    /// Ends a recognized gesture without waiting for the points to be released. Does nothing
    /// otherwise.
    pub fn end(&mut self) {
        self.finish(None);
    }

    /// Cancels a recognized gesture and forgets every point, releasing their grabs.
    pub fn reset(&mut self) {
        self.cancel();

        for point in self.points.drain(..) {
            if point.grabbed {
                self.handler.ungrab(point.device(), point.sequence());
            }
        }

        self.state = GestureState::Waiting;
    }

    /// Drops the point of a touch sequence that was taken away from the recognizer, cancelling
    /// a recognized gesture.
    pub fn cancel_sequence(&mut self, device: DeviceId, sequence: Option<SequenceId>) {
        let Some(idx) = self.points.iter().position(|p| p.matches(device, sequence)) else {
            return;
        };

        self.cancel();
        self.unregister_point(idx);
    }

    fn on_press(&mut self, event: &GestureEvent) -> EventFlow {
        // No new gesture until every point of the ended one is up.
        if self.state == GestureState::Ended {
            return EventFlow::Propagate;
        }

        let idx = self.register_point(event);

        if self.state == GestureState::Recognized && self.points.len() > MAX_GESTURE_POINTS {
            warn!("{} points down, cancelling gesture", self.points.len());
            self.cancel();
            return EventFlow::Propagate;
        }

        if self.state == GestureState::Waiting && self.points.len() >= self.n_touch_points {
            return if self.begin_gesture(idx) {
                EventFlow::Consumed
            } else {
                EventFlow::Propagate
            };
        }

        self.flow()
    }

    fn on_motion(&mut self, event: &GestureEvent) -> EventFlow {
        let Some(idx) = self.find_point(event) else {
            return EventFlow::Propagate;
        };

        self.points[idx].update_motion(event);

        match self.state {
            GestureState::Ended => EventFlow::Consumed,
            GestureState::Cancelled => EventFlow::Propagate,
            GestureState::Waiting => {
                if self.points.len() < self.n_touch_points || !self.begin_gesture(idx) {
                    return EventFlow::Propagate;
                }

                self.emit_progress(idx)
            }
            GestureState::Recognized => self.emit_progress(idx),
        }
    }

    fn on_release(&mut self, event: &GestureEvent) -> EventFlow {
        let Some(idx) = self.find_point(event) else {
            return EventFlow::Propagate;
        };

        // The release that ends a gesture is consumed like the press that started it.
        let flow = self.flow();

        self.points[idx].update_release(event);

        if self.state == GestureState::Recognized && self.points.len() - 1 < self.n_touch_points {
            self.finish(Some(idx));
        }

        self.unregister_point(idx);
        flow
    }

    /// Asks the handler to prepare and begin the gesture. Returns whether it is now recognized.
    fn begin_gesture(&mut self, idx: usize) -> bool {
        let (prepared, request) = self.dispatch(|handler, ctx| handler.prepare(ctx, idx));
        if !prepared || request == Some(Request::Cancel) {
            trace!("gesture not prepared");
            return false;
        }

        self.state = GestureState::Recognized;
        debug!("gesture recognized with {} points", self.points.len());

        let (began, request) = self.dispatch(|handler, ctx| handler.begin(ctx, idx));
        if !began {
            self.cancel();
            return false;
        }

        self.apply(request);
        self.state == GestureState::Recognized
    }

    fn emit_progress(&mut self, idx: usize) -> EventFlow {
        let (keep_going, request) = self.dispatch(|handler, ctx| handler.progress(ctx, idx));
        if !keep_going {
            self.cancel();
        }

        self.apply(request);
        self.flow()
    }

    fn finish(&mut self, point: Option<usize>) {
        if self.state != GestureState::Recognized {
            return;
        }

        debug!("gesture ended");
        self.state = GestureState::Ended;
        let ctx = GestureContext::new(&self.points, self.state);
        self.handler.end(&ctx, point);
    }

    fn dispatch<R>(
        &mut self,
        f: impl FnOnce(&mut H, &mut GestureContext<'_>) -> R,
    ) -> (R, Option<Request>) {
        let mut ctx = GestureContext::new(&self.points, self.state);
        let rv = f(&mut self.handler, &mut ctx);
        (rv, ctx.request)
    }

    fn apply(&mut self, request: Option<Request>) {
        match request {
            Some(Request::Cancel) => self.cancel(),
            Some(Request::End) => self.finish(None),
            None => (),
        }
    }

    fn flow(&self) -> EventFlow {
        if self.state == GestureState::Recognized {
            EventFlow::Consumed
        } else {
            EventFlow::Propagate
        }
    }

    fn find_point(&self, event: &GestureEvent) -> Option<usize> {
        let sequence = event.point_sequence();
        self.points
            .iter()
            .position(|p| p.matches(event.device, sequence))
    }

    fn register_point(&mut self, event: &GestureEvent) -> usize {
        let mut point = GesturePoint::new(event);

        if !self.on_stage {
            self.handler.grab(point.device(), point.sequence());
            point.grabbed = true;
        }

        self.points.push(point);
        self.points.len() - 1
    }

    fn unregister_point(&mut self, idx: usize) {
        let point = self.points.remove(idx);
        if point.grabbed {
            self.handler.ungrab(point.device(), point.sequence());
        }

        if self.points.is_empty() {
            self.state = GestureState::Waiting;
        }
    }
}
