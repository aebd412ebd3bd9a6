//! Default and supported UI scale factors.
//!
//! The default scale makes the UI as big as it would be, unscaled, on a display with a target
//! DPI. 135 lines up with the sizes other systems pick by default for phones, tablets and laptops.
//! People sit further away from big stationary displays, so those get a lower target of 110. The
//! largest mainstream laptops are around 17" and HiDPI desktop monitors start around 23", which
//! puts the boundary at 20".
//!
//! Scale math is done in `f32`, matching what is sent to clients.

use meridian_config::Scaling;
use smithay::utils::{Physical, Size};
use tracing::trace;

use super::catalog::MINIMUM_LOGICAL_AREA;

pub const MINIMUM_SCALE_FACTOR: f32 = 1.;
pub const MAXIMUM_SCALE_FACTOR: f32 = 4.;
pub const SCALE_FACTORS_PER_INTEGER: u32 = 4;
pub const SCALE_FACTORS_STEPS: f32 = 1. / SCALE_FACTORS_PER_INTEGER as f32;

const UI_SCALE_MOBILE_TARGET_DPI: f32 = 135.;
const UI_SCALE_LARGE_TARGET_DPI: f32 = 110.;
const UI_SCALE_LARGE_MIN_SIZE_INCHES: f32 = 20.;

const MM_PER_INCH: f32 = 25.4;

/// Physical sizes that are really an aspect ratio written into the EDID.
const ASPECT_AS_SIZE: [(i32, i32); 6] = [
    (1600, 900),
    (1600, 1000),
    (160, 90),
    (160, 100),
    (16, 9),
    (16, 10),
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScalesConstraint {
    #[default]
    None,
    /// Only integer scales.
    NoFractional,
}

/// Picks scale factors for monitor modes.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ScaleSelector {
    pub constraint: ScalesConstraint,
    /// Overrides every computed default scale.
    pub global_scaling_factor: Option<u32>,
}

impl ScaleSelector {
    pub fn new(constraint: ScalesConstraint) -> Self {
        Self {
            constraint,
            global_scaling_factor: None,
        }
    }

    pub fn from_config(config: &Scaling) -> Self {
        Self {
            constraint: if config.integer_scales_only {
                ScalesConstraint::NoFractional
            } else {
                ScalesConstraint::None
            },
            global_scaling_factor: config.global_scaling_factor.map(|factor| factor.0),
        }
    }

    /// Default scale for a mode, honoring the global scaling factor if one is set.
    pub fn calculate_mode_scale(
        &self,
        size_mm: Size<i32, Physical>,
        resolution: Size<i32, Physical>,
    ) -> f32 {
        if let Some(factor) = self.global_scaling_factor {
            return factor as f32;
        }

        calculate_scale(size_mm, resolution, self.constraint)
    }

    pub fn supported_scales(&self, resolution: Size<i32, Physical>) -> Vec<f32> {
        calculate_supported_scales(resolution, self.constraint)
    }
}

/// Whether the physical size is actually an aspect ratio, which some EDIDs contain instead.
pub fn has_aspect_as_size(size_mm: Size<i32, Physical>) -> bool {
    ASPECT_AS_SIZE.contains(&(size_mm.w, size_mm.h))
}

/// The supported scale closest to what makes `resolution` on a display of `size_mm` look like the
/// target DPI.
///
/// Returns 1 when the physical size is unknown.
pub fn calculate_scale(
    size_mm: Size<i32, Physical>,
    resolution: Size<i32, Physical>,
    constraint: ScalesConstraint,
) -> f32 {
    if has_aspect_as_size(size_mm) {
        return 1.;
    }

    if size_mm.w <= 0 || size_mm.h <= 0 {
        return 1.;
    }

    let diag_inches = hypot(size_mm.w, size_mm.h) / MM_PER_INCH;
    let target_dpi = if diag_inches < UI_SCALE_LARGE_MIN_SIZE_INCHES {
        UI_SCALE_MOBILE_TARGET_DPI
    } else {
        UI_SCALE_LARGE_TARGET_DPI
    };

    let physical_dpi = hypot(resolution.w, resolution.h) / diag_inches;
    let mut perfect_scale = physical_dpi / target_dpi;

    // Bias integer-only picks downwards.
    if constraint == ScalesConstraint::NoFractional {
        perfect_scale -= SCALE_FACTORS_STEPS / 2.;
    }

    let scales = calculate_supported_scales(resolution, constraint);
    let mut best_scale = scales[0];
    let mut best_error = (best_scale - perfect_scale).abs();
    for &scale in &scales[1..] {
        let error = (scale - perfect_scale).abs();
        if error < best_error {
            best_scale = scale;
            best_error = error;
        }
    }

    trace!(
        "{diag_inches:.1}\" at {}x{}: physical DPI {physical_dpi:.1}, \
         perfect scale {perfect_scale:.3}, picked {best_scale}",
        resolution.w,
        resolution.h,
    );

    best_scale
}

fn hypot(a: i32, b: i32) -> f32 {
    let (a, b) = (i64::from(a), i64::from(b));
    ((a * a + b * b) as f32).sqrt()
}

fn is_logical_size_large_enough(width: i32, height: i32) -> bool {
    i64::from(width) * i64::from(height) >= MINIMUM_LOGICAL_AREA
}

/// Whether `scale` is in range and leaves a usable logical size.
pub fn is_scale_valid_for_size(width: f32, height: f32, scale: f32) -> bool {
    if !(MINIMUM_SCALE_FACTOR..=MAXIMUM_SCALE_FACTOR).contains(&scale) {
        return false;
    }

    is_logical_size_large_enough((width / scale).floor() as i32, (height / scale).floor() as i32)
}

/// The scale closest to `scale` that gives an integer logical size.
///
/// Walks logical widths outwards from `width / scale` until one also gives an integer logical
/// height, and stops as soon as the candidates leave `scale ± threshold` or the supported range.
/// Returns 0 if nothing was found by then.
pub fn closest_scale_factor_for_resolution(
    width: f32,
    height: f32,
    scale: f32,
    threshold: f32,
) -> f32 {
    if width % scale == 0. && height % scale == 0. {
        return scale;
    }

    let base_scaled_w = (width / scale).floor() as i32;
    let mut best_scale = 0.;
    let mut i = 0;

    loop {
        let mut found_one = false;

        for offset in [-i, i] {
            let scaled_w = (base_scaled_w + offset) as f32;
            let current_scale = width / scaled_w;
            let scaled_h = height / current_scale;

            if current_scale >= scale + threshold
                || current_scale <= scale - threshold
                || current_scale < MINIMUM_SCALE_FACTOR
                || current_scale > MAXIMUM_SCALE_FACTOR
            {
                return best_scale;
            }

            if scaled_h.floor() == scaled_h {
                found_one = true;

                if (current_scale - scale).abs() < (best_scale - scale).abs() {
                    best_scale = current_scale;
                }
            }
        }

        if found_one {
            return best_scale;
        }

        i += 1;
    }
}

/// All scales a mode can use, in increasing order. Never empty.
///
/// Without constraints, every quarter step is snapped to a nearby scale that gives an integer
/// logical size; steps that can't be snapped are left out.
pub fn calculate_supported_scales(
    resolution: Size<i32, Physical>,
    constraint: ScalesConstraint,
) -> Vec<f32> {
    let _span = tracy_client::span!("calculate_supported_scales");

    let width = resolution.w as f32;
    let height = resolution.h as f32;
    let min = MINIMUM_SCALE_FACTOR.floor() as u32;
    let max = MAXIMUM_SCALE_FACTOR.ceil() as u32;

    let mut scales = Vec::new();
    for i in min..=max {
        match constraint {
            ScalesConstraint::NoFractional => {
                let scale = i as f32;
                if is_scale_valid_for_size(width, height, scale) {
                    scales.push(scale);
                }
            }
            ScalesConstraint::None => {
                // The outermost bands only extend inwards, so they get the full step.
                let max_bound = if i == min || i == max {
                    SCALE_FACTORS_STEPS
                } else {
                    SCALE_FACTORS_STEPS / 2.
                };

                for j in 0..SCALE_FACTORS_PER_INTEGER {
                    let scale_value = i as f32 + j as f32 * SCALE_FACTORS_STEPS;
                    if !is_scale_valid_for_size(width, height, scale_value) {
                        continue;
                    }

                    let scale =
                        closest_scale_factor_for_resolution(width, height, scale_value, max_bound);
                    if scale > 0. {
                        scales.push(scale);
                    }
                }
            }
        }
    }

    if scales.is_empty() {
        scales.push(1.);
    }

    scales
}
