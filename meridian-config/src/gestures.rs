use crate::{Bounded, FloatOrInt};

/// Drag threshold used when a gesture doesn't configure its own distance, in logical pixels.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 8.;

#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq)]
pub struct Gestures {
    #[knuffel(child, unwrap(argument), default = FloatOrInt(DEFAULT_DRAG_THRESHOLD))]
    pub drag_threshold: FloatOrInt<0, 65535>,
    #[knuffel(child, unwrap(argument), default)]
    pub n_touch_points: Bounded<1, 10>,
    #[knuffel(child, unwrap(argument), default)]
    pub trigger_edge: TriggerEdge,
    #[knuffel(child, default)]
    pub threshold_distance: ThresholdDistance,
}

impl Default for Gestures {
    fn default() -> Self {
        Self {
            drag_threshold: FloatOrInt(DEFAULT_DRAG_THRESHOLD),
            n_touch_points: Bounded::default(),
            trigger_edge: TriggerEdge::default(),
            threshold_distance: ThresholdDistance::default(),
        }
    }
}

/// When the drag threshold is checked.
#[derive(knuffel::DecodeScalar, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    /// No threshold.
    #[default]
    None,
    /// The gesture begins only after the threshold has been exceeded.
    Before,
    /// The gesture is cancelled once the threshold is exceeded.
    After,
}

/// Per-axis threshold distance. Values of zero or below fall back to the drag threshold.
#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq)]
pub struct ThresholdDistance {
    #[knuffel(property, default = FloatOrInt(-1.))]
    pub x: FloatOrInt<-1, 65535>,
    #[knuffel(property, default = FloatOrInt(-1.))]
    pub y: FloatOrInt<-1, 65535>,
}

impl Default for ThresholdDistance {
    fn default() -> Self {
        Self {
            x: FloatOrInt(-1.),
            y: FloatOrInt(-1.),
        }
    }
}
