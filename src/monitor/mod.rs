//! Monitors and their modes.
//!
//! A monitor is what the user sees as one screen. Usually that's a single output, but large
//! panels can be split into tiles driven through several outputs that share a tile group.
//!
//! The mode table of a monitor is derived from the CRTC modes its outputs report; see
//! [`catalog`] for single outputs and [`tiled`] for tile groups. Default scale factors for those
//! modes come from [`scale`].

use std::collections::HashMap;
use std::fmt;

use smithay::utils::{Physical, Size, Transform};
use tracing::{debug, warn};

use self::catalog::ModeCatalog;
use self::mode::{parse_monitor_mode, MonitorMode, MonitorModeSpec};
use self::scale::{has_aspect_as_size, ScaleSelector};
use self::tiled::TiledModeReconciler;
use self::types::{CrtcModeFlags, Output, OutputId, RefreshRateMode};

pub mod catalog;
pub mod mode;
pub mod scale;
pub mod tiled;
pub mod types;

#[cfg(test)]
mod tests;

/// Substituted for identity fields the hardware didn't report.
pub const UNKNOWN: &str = "unknown";

/// Diagonals that are conventionally written with one decimal.
const KNOWN_DIAGONALS: [f64; 3] = [12.1, 13.3, 15.6];

/// Identity of a monitor, used to recognize it across hotplugs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorSpec {
    pub connector: String,
    pub vendor: String,
    pub product: String,
    pub serial: String,
}

impl MonitorSpec {
    fn from_output(output: &Output) -> Self {
        let or_unknown = |field: &Option<String>| field.as_deref().unwrap_or(UNKNOWN).to_owned();

        Self {
            connector: output.name().to_owned(),
            vendor: or_unknown(&output.info.vendor),
            product: or_unknown(&output.info.product),
            serial: or_unknown(&output.info.serial),
        }
    }

    /// Whether any of vendor, product or serial is missing.
    pub fn is_unknown(&self) -> bool {
        self.vendor == UNKNOWN || self.product == UNKNOWN || self.serial == UNKNOWN
    }
}

impl fmt::Display for MonitorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.vendor, self.product, self.serial, self.connector
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKind {
    Normal,
    Tiled {
        tile_group_id: u32,
        /// Index of the (0, 0) tile.
        origin: usize,
        /// Index of the output driving untiled modes.
        main: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Monitor {
    /// For tiled monitors, every output of the tile group.
    outputs: Vec<Output>,
    kind: MonitorKind,
    catalog: ModeCatalog,
    spec: MonitorSpec,
    display_name: String,
}

impl Monitor {
    pub fn new_normal(output: Output) -> Self {
        let catalog = ModeCatalog::generate_untiled_modes(&output);
        let spec = MonitorSpec::from_output(&output);
        let display_name = make_display_name(&output);

        debug!(
            "{}: new monitor {display_name:?} with {} modes",
            output.name(),
            catalog.len()
        );

        Self {
            outputs: vec![output],
            kind: MonitorKind::Normal,
            catalog,
            spec,
            display_name,
        }
    }

    /// Builds a monitor out of every output of one tile group.
    ///
    /// Fails if the outputs don't form a tile group with a (0, 0) tile.
    pub fn new_tiled(outputs: Vec<Output>) -> anyhow::Result<Self> {
        let reconciler = TiledModeReconciler::new(&outputs)?;
        let catalog = reconciler.generate_modes();
        let (origin, main) = (reconciler.origin(), reconciler.main());

        let tile_group_id = outputs[origin].tile_info().group_id;
        let spec = MonitorSpec::from_output(&outputs[main]);
        let display_name = make_display_name(&outputs[main]);

        debug!(
            "{}: new tiled monitor {display_name:?} over {} tiles with {} modes",
            outputs[origin].name(),
            outputs.len(),
            catalog.len()
        );

        Ok(Self {
            outputs,
            kind: MonitorKind::Tiled {
                tile_group_id,
                origin,
                main,
            },
            catalog,
            spec,
            display_name,
        })
    }

    /// Groups outputs into monitors, keeping the order in which outputs first appear.
    ///
    /// A tile group that can't form a tiled monitor is split into one monitor per output.
    pub fn from_outputs(outputs: Vec<Output>) -> Vec<Self> {
        let _span = tracy_client::span!("Monitor::from_outputs");

        enum Group {
            Normal(Output),
            Tiled(Vec<Output>),
        }

        let mut groups = Vec::new();
        let mut tile_groups = HashMap::new();
        for output in outputs {
            match output.tile_group_id() {
                Some(id) => {
                    if let Some(&idx) = tile_groups.get(&id) {
                        if let Group::Tiled(tiles) = &mut groups[idx] {
                            tiles.push(output);
                        }
                    } else {
                        tile_groups.insert(id, groups.len());
                        groups.push(Group::Tiled(vec![output]));
                    }
                }
                None => groups.push(Group::Normal(output)),
            }
        }

        let mut monitors = Vec::with_capacity(groups.len());
        for group in groups {
            match group {
                Group::Normal(output) => monitors.push(Self::new_normal(output)),
                Group::Tiled(tiles) => match Self::new_tiled(tiles.clone()) {
                    Ok(monitor) => monitors.push(monitor),
                    Err(err) => {
                        warn!("error creating tiled monitor, using tiles separately: {err:?}");
                        monitors.extend(tiles.into_iter().map(Self::new_normal));
                    }
                },
            }
        }

        monitors
    }

    /// Picks up new descriptors for this monitor's outputs and rebuilds the mode table.
    ///
    /// Returns `false`, leaving the monitor untouched, if any of its outputs is gone.
    pub fn update_outputs(&mut self, outputs: &[Output]) -> bool {
        let mut updated = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            let Some(new) = outputs.iter().find(|o| o.id == output.id) else {
                debug!("{}: output is gone", output.name());
                return false;
            };
            updated.push(new.clone());
        }

        let new = match self.kind {
            MonitorKind::Normal => {
                let output = updated.swap_remove(0);
                Self::new_normal(output)
            }
            MonitorKind::Tiled { .. } => match Self::new_tiled(updated) {
                Ok(monitor) => monitor,
                Err(err) => {
                    warn!("error updating tiled monitor: {err:?}");
                    return false;
                }
            },
        };

        *self = new;
        true
    }

    /// Re-derives the current mode from the live CRTC configuration of the outputs.
    pub fn update_current_mode(&mut self, outputs: &[Output]) {
        for output in &mut self.outputs {
            if let Some(new) = outputs.iter().find(|o| o.id == output.id) {
                output.crtc = new.crtc;
            }
        }

        let main = self.main_output().id;
        self.catalog.derive_current_mode(&self.outputs, main);
    }

    /// Marks a mode as current. Returns `false` if the monitor has no such mode.
    pub fn set_current_mode(&mut self, id: Option<&str>) -> bool {
        self.catalog.set_current_mode(id)
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn kind(&self) -> MonitorKind {
        self.kind
    }

    pub fn is_tiled(&self) -> bool {
        matches!(self.kind, MonitorKind::Tiled { .. })
    }

    /// The output that drives the monitor on its own, and that the monitor's properties come from.
    pub fn main_output(&self) -> &Output {
        match self.kind {
            MonitorKind::Normal => &self.outputs[0],
            MonitorKind::Tiled { main, .. } => &self.outputs[main],
        }
    }

    pub fn connector(&self) -> &str {
        &self.spec.connector
    }

    pub fn spec(&self) -> &MonitorSpec {
        &self.spec
    }

    /// Human-readable name, e.g. `Dell 27"`.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    pub fn modes(&self) -> &[MonitorMode] {
        self.catalog.modes()
    }

    pub fn mode_from_id(&self, id: &str) -> Option<&MonitorMode> {
        self.catalog.mode_from_id(id)
    }

    pub fn mode_from_spec(&self, spec: &MonitorModeSpec) -> Option<&MonitorMode> {
        self.catalog.mode_from_spec(spec)
    }

    pub fn preferred_mode(&self) -> Option<&MonitorMode> {
        self.catalog.preferred_mode()
    }

    pub fn current_mode(&self) -> Option<&MonitorMode> {
        self.catalog.current_mode()
    }

    pub fn is_builtin(&self) -> bool {
        self.main_output().info.is_builtin
    }

    pub fn is_active(&self) -> bool {
        self.main_output().is_active()
    }

    pub fn physical_size(&self) -> Size<i32, Physical> {
        let info = &self.main_output().info;
        Size::from((info.width_mm, info.height_mm))
    }

    pub fn has_aspect_as_size(&self) -> bool {
        has_aspect_as_size(self.physical_size())
    }

    /// Whether both monitors are the same physical device.
    ///
    /// Monitors that don't report a full identity are only the same if they are on the same
    /// connector.
    pub fn is_same_as(&self, other: &Monitor) -> bool {
        match (self.spec.is_unknown(), other.spec.is_unknown()) {
            (true, true) => self.spec.connector == other.spec.connector,
            (false, false) => {
                self.spec.vendor == other.spec.vendor
                    && self.spec.product == other.spec.product
                    && self.spec.serial == other.spec.serial
            }
            _ => false,
        }
    }

    /// Where `output`'s CRTC goes when the monitor runs `mode`.
    ///
    /// Only tiles of a tiled mode are offset; everything else is at the origin.
    pub fn calculate_crtc_pos(
        &self,
        mode: &MonitorMode,
        output: OutputId,
        crtc_transform: Transform,
    ) -> (i32, i32) {
        if !mode.is_tiled {
            return (0, 0);
        }

        match self.outputs.iter().position(|o| o.id == output) {
            Some(idx) => tiled::tile_coordinate(&self.outputs, idx, crtc_transform),
            None => (0, 0),
        }
    }

    pub fn calculate_mode_scale(&self, mode: &MonitorMode, selector: &ScaleSelector) -> f32 {
        selector.calculate_mode_scale(self.physical_size(), mode.resolution())
    }

    pub fn supported_scales(&self, mode: &MonitorMode, selector: &ScaleSelector) -> Vec<f32> {
        selector.supported_scales(mode.resolution())
    }

    /// The mode requested for this monitor in the config, or the preferred mode.
    ///
    /// A request without a refresh rate picks the fastest mode of that size. Requests that don't
    /// parse or don't match any mode fall back to the preferred mode with a warning.
    pub fn resolve_configured_mode(
        &self,
        config: Option<&meridian_config::Output>,
    ) -> Option<&MonitorMode> {
        let Some(requested) = config.and_then(|c| c.mode.as_deref()) else {
            return self.preferred_mode();
        };

        // A zero refresh rate is never produced by an explicit request.
        let Some(parsed) = parse_monitor_mode(requested, 0.) else {
            warn!(
                "{}: invalid mode {requested:?}, using the preferred mode",
                self.connector()
            );
            return self.preferred_mode();
        };

        let found = if parsed.refresh_rate == 0. {
            self.modes()
                .iter()
                .filter(|m| m.spec.width == parsed.width && m.spec.height == parsed.height)
                .max_by(|a, b| a.spec.refresh_rate.total_cmp(&b.spec.refresh_rate))
        } else {
            let spec = MonitorModeSpec {
                width: parsed.width,
                height: parsed.height,
                refresh_rate: parsed.refresh_rate,
                refresh_rate_mode: RefreshRateMode::Fixed,
                flags: CrtcModeFlags::empty(),
            };
            self.mode_from_spec(&spec)
        };

        if found.is_none() {
            warn!(
                "{}: configured mode {requested} not found, using the preferred mode",
                self.connector()
            );
            return self.preferred_mode();
        }

        found
    }
}

fn diagonal_to_str(diagonal: f64) -> String {
    for known in KNOWN_DIAGONALS {
        if (known - diagonal).abs() < 0.1 {
            return format!("{known:.1}\"");
        }
    }

    format!("{}\"", (diagonal + 0.5) as i32)
}

fn make_display_name(output: &Output) -> String {
    let info = &output.info;

    if info.is_builtin {
        return String::from("Built-in display");
    }

    let mut inches = None;
    let mut product = None;
    if info.width_mm > 0 && info.height_mm > 0 {
        if has_aspect_as_size(Size::from((info.width_mm, info.height_mm))) {
            product = info.product.as_deref();
        } else {
            let w = f64::from(info.width_mm);
            let h = f64::from(info.height_mm);
            inches = Some(diagonal_to_str(w.hypot(h) / 25.4));
        }
    }

    let vendor = match (&info.vendor, &inches) {
        (Some(vendor), _) => vendor.as_str(),
        (None, Some(_)) => "Unknown",
        (None, None) => "Unknown Display",
    };

    match (inches, product) {
        (Some(inches), _) => format!("{vendor} {inches}"),
        (None, Some(product)) => format!("{vendor} {product}"),
        (None, None) => vendor.to_owned(),
    }
}
