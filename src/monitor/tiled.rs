//! Mode derivation for monitors driven through several tiled outputs.
//!
//! Large panels are sometimes split into tiles, each fed over its own connector. Such a panel can
//! run "tiled", with every connector driving its tile at the tile size, or "untiled", with a
//! single connector driving the whole panel at a lower resolution and the others turned off.
//!
//! Hardware is not consistent about what it reports as preferred in this setup. Some panels
//! prefer the tiled mode on every tile; others prefer some bogus mode on the origin tile and an
//! untiled mode on another one, and nothing says the origin tile is the one that runs untiled. To
//! cope with both, the preferred mode is picked by a fixed chain of fallbacks:
//!
//! 1. a composite mode where every tile runs its own preferred CRTC mode;
//! 2. the composite mode with the highest refresh rate;
//! 3. an untiled mode that the main output prefers;
//! 4. the mode with the most pixels, then the highest refresh rate.
//!
//! A preference for an untiled mode is therefore ignored whenever a tiled mode exists. Users of
//! such panels tend to set up the tiled mode manually anyway.

use anyhow::{ensure, Context as _};
use smithay::utils::Transform;
use tracing::{debug, warn};

use super::catalog::ModeCatalog;
use super::mode::{MonitorCrtcMode, MonitorMode, MonitorModeSpec};
use super::types::{CrtcMode, Output, OutputId};

/// Builds and reconciles the modes of a tile group.
///
/// Outputs are referenced by their index in the monitor's output list.
#[derive(Debug, Clone, Copy)]
pub struct TiledModeReconciler<'a> {
    outputs: &'a [Output],
    /// The (0, 0) tile.
    origin: usize,
    /// The tile that drives the panel in untiled modes.
    main: usize,
}

impl<'a> TiledModeReconciler<'a> {
    /// Fails if the outputs don't share one tile group or if there's no (0, 0) tile.
    pub fn new(outputs: &'a [Output]) -> anyhow::Result<Self> {
        let first = outputs.first().context("tile group has no outputs")?;
        let group_id = first
            .tile_group_id()
            .with_context(|| format!("{} is not part of a tile group", first.name()))?;
        ensure!(
            outputs.iter().all(|o| o.tile_group_id() == Some(group_id)),
            "outputs belong to different tile groups"
        );

        let origin = find_origin_output(outputs)
            .with_context(|| format!("tile group {group_id} has no (0, 0) tile"))?;
        let main = find_untiled_output(outputs, origin);

        Ok(Self {
            outputs,
            origin,
            main,
        })
    }

    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn main(&self) -> usize {
        self.main
    }

    fn origin_output(&self) -> &'a Output {
        &self.outputs[self.origin]
    }

    fn main_output(&self) -> &'a Output {
        &self.outputs[self.main]
    }

    /// Size of the whole panel: tile widths along the top row by tile heights along the left
    /// column.
    pub fn tiled_size(&self) -> (i32, i32) {
        let mut width = 0u32;
        let mut height = 0u32;

        for output in self.outputs {
            let tile = output.tile_info();
            if tile.loc_v_tile == 0 {
                width += tile.tile_w;
            }
            if tile.loc_h_tile == 0 {
                height += tile.tile_h;
            }
        }

        (saturating_i32(width), saturating_i32(height))
    }

    pub fn generate_modes(&self) -> ModeCatalog {
        let _span = tracy_client::span!("TiledModeReconciler::generate_modes");

        let mut catalog = ModeCatalog::new();
        let connector = self.origin_output().name();

        self.generate_tiled_modes(&mut catalog);
        if !catalog.has_preferred_mode() {
            warn!("tiled monitor on {connector} didn't have any tiled modes");
        }

        self.generate_untiled_modes(&mut catalog);
        if !catalog.has_preferred_mode() {
            warn!("tiled monitor on {connector} didn't have a valid preferred mode");
            let best = catalog.best_mode().map(|mode| mode.id.clone());
            catalog.set_preferred_mode(best);
        }

        catalog.derive_current_mode(self.outputs, self.main_output().id);
        catalog
    }

    fn generate_tiled_modes(&self, catalog: &mut ModeCatalog) {
        let origin = self.origin_output();
        let mut best: Option<MonitorModeSpec> = None;
        let mut best_id = None;

        for reference in &origin.info.modes {
            if !origin.is_crtc_mode_tiled(reference) {
                continue;
            }

            let Some((mode, is_preferred)) = self.create_tiled_mode(reference) else {
                continue;
            };

            let id = mode.id.clone();
            let spec = mode.spec;
            if !catalog.add_mode(mode, false) {
                continue;
            }

            if is_preferred {
                if !catalog.has_preferred_mode() {
                    catalog.set_preferred_mode(Some(id));
                }
                continue;
            }

            let better = best.map_or(true, |best| {
                spec.refresh_rate > best.refresh_rate
                    || (spec.refresh_rate == best.refresh_rate
                        && spec.refresh_rate_mode > best.refresh_rate_mode)
            });
            if better {
                best = Some(spec);
                best_id = Some(id);
            }
        }

        if !catalog.has_preferred_mode() {
            if let Some(id) = best_id {
                debug!("{}: using fastest tiled mode {id} as preferred", origin.name());
                catalog.set_preferred_mode(Some(id));
            }
        }
    }

    /// Combines `reference`, a tile-sized mode of the origin tile, with a matching tile-sized CRTC
    /// mode on every other tile.
    ///
    /// Returns `None` if some tile has no match. The flag tells whether every tile runs its own
    /// preferred CRTC mode.
    fn create_tiled_mode(&self, reference: &CrtcMode) -> Option<(MonitorMode, bool)> {
        let (width, height) = self.tiled_size();
        let spec = MonitorModeSpec::new(
            self.main_output().info.panel_orientation,
            width,
            height,
            reference,
        );

        let mut is_preferred = true;
        let mut crtc_modes = Vec::with_capacity(self.outputs.len());
        for (idx, output) in self.outputs.iter().enumerate() {
            let crtc_mode = if idx == self.origin {
                Some(reference)
            } else {
                find_tiled_crtc_mode(output, reference)
            };
            let Some(crtc_mode) = crtc_mode else {
                warn!("no tiled mode found on {}", output.name());
                return None;
            };

            is_preferred &= output.info.preferred_mode == Some(crtc_mode.id);
            crtc_modes.push(MonitorCrtcMode {
                output: output.id,
                crtc_mode: Some(crtc_mode.id),
            });
        }

        Some((MonitorMode::new(spec, crtc_modes, true), is_preferred))
    }

    fn generate_untiled_modes(&self, catalog: &mut ModeCatalog) {
        let main = self.main_output();

        for crtc_mode in &main.info.modes {
            if main.is_crtc_mode_tiled(crtc_mode) {
                continue;
            }

            let spec = MonitorModeSpec::new(
                main.info.panel_orientation,
                crtc_mode.info.width,
                crtc_mode.info.height,
                crtc_mode,
            );
            let crtc_modes = self
                .outputs
                .iter()
                .map(|output| MonitorCrtcMode {
                    output: output.id,
                    crtc_mode: (output.id == main.id).then_some(crtc_mode.id),
                })
                .collect();
            let mode = MonitorMode::new(spec, crtc_modes, false);

            let id = mode.id.clone();
            if !catalog.add_mode(mode, false) {
                continue;
            }

            if !catalog.has_preferred_mode() && main.info.preferred_mode == Some(crtc_mode.id) {
                catalog.set_preferred_mode(Some(id));
            }
        }
    }

    /// Position of `output`'s tile inside a tiled mode, in CRTC coordinates.
    ///
    /// `None` if `output` isn't part of this tile group.
    pub fn tile_coordinate(
        &self,
        output: OutputId,
        crtc_transform: Transform,
    ) -> Option<(i32, i32)> {
        let idx = self.outputs.iter().position(|o| o.id == output)?;
        Some(tile_coordinate(self.outputs, idx, crtc_transform))
    }
}

/// Position of the tile of `outputs[output]` inside a tiled mode, in CRTC coordinates.
///
/// Sums the sizes of the tiles that come before it along each axis, where "before" depends on how
/// the CRTC is rotated.
pub(super) fn tile_coordinate(
    outputs: &[Output],
    output: usize,
    crtc_transform: Transform,
) -> (i32, i32) {
    let tile = outputs[output].tile_info();
    let mut x = 0u32;
    let mut y = 0u32;

    for other in outputs {
        let other = other.tile_info();
        let same_row = other.loc_v_tile == tile.loc_v_tile;
        let same_column = other.loc_h_tile == tile.loc_h_tile;

        match crtc_transform {
            Transform::Normal | Transform::Flipped => {
                if same_row && other.loc_h_tile < tile.loc_h_tile {
                    x += other.tile_w;
                }
                if same_column && other.loc_v_tile < tile.loc_v_tile {
                    y += other.tile_h;
                }
            }
            Transform::_180 | Transform::Flipped180 => {
                if same_row && other.loc_h_tile > tile.loc_h_tile {
                    x += other.tile_w;
                }
                if same_column && other.loc_v_tile > tile.loc_v_tile {
                    y += other.tile_h;
                }
            }
            Transform::_270 | Transform::Flipped270 => {
                if same_row && other.loc_h_tile > tile.loc_h_tile {
                    y += other.tile_w;
                }
                if same_column && other.loc_v_tile > tile.loc_v_tile {
                    x += other.tile_h;
                }
            }
            Transform::_90 | Transform::Flipped90 => {
                if same_row && other.loc_h_tile < tile.loc_h_tile {
                    y += other.tile_w;
                }
                if same_column && other.loc_v_tile < tile.loc_v_tile {
                    x += other.tile_h;
                }
            }
        }
    }

    (saturating_i32(x), saturating_i32(y))
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// The CRTC mode `output` should run when the origin tile runs `reference`.
///
/// An output's preferred mode wins if it is tile-sized. Otherwise the first tile-sized mode with
/// exactly the same timings is used.
fn find_tiled_crtc_mode<'o>(output: &'o Output, reference: &CrtcMode) -> Option<&'o CrtcMode> {
    if let Some(preferred) = output.preferred_mode() {
        if output.is_crtc_mode_tiled(preferred) {
            return Some(preferred);
        }
    }

    output.info.modes.iter().find(|mode| {
        output.is_crtc_mode_tiled(mode)
            && mode.info.refresh_rate == reference.info.refresh_rate
            && mode.info.refresh_rate_mode == reference.info.refresh_rate_mode
            && mode.info.flags == reference.info.flags
    })
}

pub(super) fn count_untiled_crtc_modes(output: &Output) -> usize {
    output
        .info
        .modes
        .iter()
        .filter(|mode| !output.is_crtc_mode_tiled(mode))
        .count()
}

pub(super) fn find_origin_output(outputs: &[Output]) -> Option<usize> {
    outputs.iter().position(|output| {
        let tile = output.tile_info();
        tile.loc_h_tile == 0 && tile.loc_v_tile == 0
    })
}

/// The tile with the most untiled CRTC modes, which is assumed to drive the panel when it runs
/// untiled. Ties go to the origin tile.
pub(super) fn find_untiled_output(outputs: &[Output], origin: usize) -> usize {
    let mut best = origin;
    let mut best_count = count_untiled_crtc_modes(&outputs[origin]);

    for (idx, output) in outputs.iter().enumerate() {
        if idx == origin {
            continue;
        }

        let count = count_untiled_crtc_modes(output);
        if count > best_count {
            best = idx;
            best_count = count;
        }
    }

    best
}
