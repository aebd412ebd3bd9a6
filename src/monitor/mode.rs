//! Monitor mode value types.

use std::fmt;

use smithay::utils::{Size, Transform};

use super::types::{CrtcMode, CrtcModeFlags, CrtcModeId, OutputId, RefreshRateMode};

/// Refresh rates closer than this are the same rate.
pub const MAXIMUM_REFRESH_RATE_DIFF: f32 = 0.001;

/// Two sizes whose area ratio is within this of 1.0 are "similar".
///
/// 15% keeps 4K modes together with other 4K modes and FHD with FHD, but not with each other.
const SIMILAR_SIZE_EPSILON: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorModeSpec {
    pub width: i32,
    pub height: i32,
    pub refresh_rate: f32,
    pub refresh_rate_mode: RefreshRateMode,
    pub flags: CrtcModeFlags,
}

impl MonitorModeSpec {
    /// Builds the spec of a mode of `width`×`height` running with the timings of `crtc_mode`.
    ///
    /// The size is swapped for panels mounted sideways, and only the flags that distinguish
    /// monitor modes are kept.
    pub fn new(panel_orientation: Transform, width: i32, height: i32, crtc_mode: &CrtcMode) -> Self {
        let size = panel_orientation.transform_size(Size::<i32, smithay::utils::Physical>::from((
            width, height,
        )));

        Self {
            width: size.w,
            height: size.h,
            refresh_rate: crtc_mode.info.refresh_rate,
            refresh_rate_mode: crtc_mode.info.refresh_rate_mode,
            flags: crtc_mode.info.flags & CrtcModeFlags::HANDLED,
        }
    }

    pub fn equals(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (self.refresh_rate - other.refresh_rate).abs() < MAXIMUM_REFRESH_RATE_DIFF
            && self.refresh_rate_mode == other.refresh_rate_mode
            && self.flags == other.flags
    }

    pub fn has_similar_size(&self, other: &Self) -> bool {
        if other.width == 0 || other.height == 0 {
            return self.width == other.width && self.height == other.height;
        }

        let ratio = (self.width as f32 / other.width as f32)
            * (self.height as f32 / other.height as f32);
        (ratio - 1.).abs() < SIMILAR_SIZE_EPSILON
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    pub fn is_interlaced(&self) -> bool {
        self.flags.contains(CrtcModeFlags::INTERLACE)
    }

    /// Stable identifier, e.g. `1920x1080@60.000`, `1920x1080i@60.000` or
    /// `2560x1440@143.998+vrr`.
    pub fn generate_id(&self) -> String {
        format!(
            "{}x{}{}@{:.3}{}",
            self.width,
            self.height,
            if self.is_interlaced() { "i" } else { "" },
            self.refresh_rate,
            if self.refresh_rate_mode == RefreshRateMode::Variable {
                "+vrr"
            } else {
                ""
            },
        )
    }
}

/// The CRTC mode an output runs with in some monitor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorCrtcMode {
    pub output: OutputId,
    /// `None` when the output is disabled in this mode.
    pub crtc_mode: Option<CrtcModeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorMode {
    pub id: String,
    pub spec: MonitorModeSpec,
    /// One entry per monitor output, in monitor output order.
    pub crtc_modes: Vec<MonitorCrtcMode>,
    /// Whether this is a composite mode driving every tile.
    pub is_tiled: bool,
}

impl MonitorMode {
    pub fn new(spec: MonitorModeSpec, crtc_modes: Vec<MonitorCrtcMode>, is_tiled: bool) -> Self {
        Self {
            id: spec.generate_id(),
            spec,
            crtc_modes,
            is_tiled,
        }
    }

    pub fn resolution(&self) -> Size<i32, smithay::utils::Physical> {
        Size::from((self.spec.width, self.spec.height))
    }

    pub fn crtc_mode_for(&self, output: OutputId) -> Option<CrtcModeId> {
        self.crtc_modes
            .iter()
            .find(|m| m.output == output)
            .and_then(|m| m.crtc_mode)
    }
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A mode request in the `<width>x<height>[@<refresh rate>]` format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedMode {
    pub width: i32,
    pub height: i32,
    pub refresh_rate: f32,
}

/// Parses `<width>x<height>[@<refresh rate>]`, using `fallback_refresh_rate` when the rate is
/// omitted.
///
/// Zero sizes, a zero refresh rate and trailing garbage are rejected.
pub fn parse_monitor_mode(s: &str, fallback_refresh_rate: f32) -> Option<ParsedMode> {
    let (size, refresh) = match s.split_once('@') {
        Some((size, refresh)) => (size, Some(refresh)),
        None => (s, None),
    };

    let (width, height) = size.split_once('x')?;
    let width = parse_dimension(width)?;
    let height = parse_dimension(height)?;

    let refresh_rate = match refresh {
        Some(refresh) => {
            let rate: f32 = refresh.parse().ok()?;
            if !rate.is_finite() || rate.abs() < f32::EPSILON {
                return None;
            }
            rate
        }
        None => fallback_refresh_rate,
    };

    Some(ParsedMode {
        width,
        height,
        refresh_rate,
    })
}

fn parse_dimension(s: &str) -> Option<i32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    s.parse().ok().filter(|v| *v > 0)
}
