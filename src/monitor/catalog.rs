//! The mode table of one monitor.

use tracing::{trace, warn};

use super::mode::{MonitorCrtcMode, MonitorMode, MonitorModeSpec};
use super::types::{Output, OutputId};

/// Logical sizes smaller than this are not worth offering.
pub const MINIMUM_LOGICAL_AREA: i64 = 800 * 480;

/// Modes derived for one monitor, in generation order, plus its preferred and current mode.
///
/// The catalog is rebuilt from scratch whenever outputs change; it is never patched in place.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ModeCatalog {
    modes: Vec<MonitorMode>,
    preferred: Option<String>,
    current: Option<String>,
}

impl ModeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the modes of a monitor driven by a single output.
    pub fn generate_untiled_modes(output: &Output) -> Self {
        let _span = tracy_client::span!("ModeCatalog::generate_untiled_modes");

        let mut catalog = Self::new();
        let preferred = output.preferred_mode();
        let preferred_flags = preferred.map(|m| m.info.flags);

        for crtc_mode in &output.info.modes {
            let spec = MonitorModeSpec::new(
                output.info.panel_orientation,
                crtc_mode.info.width,
                crtc_mode.info.height,
                crtc_mode,
            );
            let mode = MonitorMode::new(
                spec,
                vec![MonitorCrtcMode {
                    output: output.id,
                    crtc_mode: Some(crtc_mode.id),
                }],
                false,
            );

            // Only the configurable flags end up in the spec, so several CRTC modes can map to
            // the same monitor mode. Prefer the one with the preferred mode's flags, but never
            // replace the preferred mode itself.
            let replace = Some(crtc_mode.info.flags) == preferred_flags
                && catalog.preferred.as_deref() != Some(mode.id.as_str());

            let id = mode.id.clone();
            if !catalog.add_mode(mode, replace) {
                trace!("{}: skipping duplicate mode {id}", output.name());
                continue;
            }

            if preferred.is_some_and(|p| p.id == crtc_mode.id) {
                catalog.preferred = Some(id);
            }
        }

        if catalog.preferred.is_none() {
            warn!("{}: output reported no usable preferred mode", output.name());
        }

        catalog.derive_current_mode(std::slice::from_ref(output), output.id);
        catalog
    }

    /// Inserts a mode, or replaces the mode with the same id if `replace` is set.
    ///
    /// Returns `false` if a mode with this id already exists and wasn't replaced. A replaced mode
    /// moves to the end of the iteration order.
    pub fn add_mode(&mut self, mode: MonitorMode, replace: bool) -> bool {
        if let Some(idx) = self.position(&mode.id) {
            if !replace {
                return false;
            }

            self.modes.remove(idx);
        }

        self.modes.push(mode);
        true
    }

    /// Finds the mode matching what the outputs' CRTCs are configured with right now.
    ///
    /// Leaves the current mode unset if no mode matches. A main output that is lit while no mode
    /// matches, or the other way around, means the hardware state is inconsistent; that is logged
    /// and otherwise tolerated.
    pub fn derive_current_mode(&mut self, outputs: &[Output], main_output: OutputId) {
        self.current = self
            .modes
            .iter()
            .find(|mode| is_mode_assigned(mode, outputs))
            .map(|mode| mode.id.clone());

        let Some(main_output) = outputs.iter().find(|o| o.id == main_output) else {
            return;
        };

        if self.current.is_some() != main_output.is_active() {
            warn!(
                "{}: current mode is unknown, live CRTC configuration matches no mode",
                main_output.name()
            );
        }
    }

    pub fn modes(&self) -> &[MonitorMode] {
        &self.modes
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn mode_from_id(&self, id: &str) -> Option<&MonitorMode> {
        self.modes.iter().find(|mode| mode.id == id)
    }

    pub fn mode_from_spec(&self, spec: &MonitorModeSpec) -> Option<&MonitorMode> {
        self.modes.iter().find(|mode| spec.equals(&mode.spec))
    }

    pub fn preferred_mode(&self) -> Option<&MonitorMode> {
        self.preferred.as_deref().and_then(|id| self.mode_from_id(id))
    }

    pub fn current_mode(&self) -> Option<&MonitorMode> {
        self.current.as_deref().and_then(|id| self.mode_from_id(id))
    }

    pub fn has_preferred_mode(&self) -> bool {
        self.preferred.is_some()
    }

    pub(super) fn set_preferred_mode(&mut self, id: Option<String>) {
        debug_assert!(id.as_deref().map_or(true, |id| self.mode_from_id(id).is_some()));
        self.preferred = id;
    }

    /// Marks a mode as current. Returns `false` if the catalog has no such mode.
    pub fn set_current_mode(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.mode_from_id(id).is_none() => false,
            id => {
                self.current = id.map(String::from);
                true
            }
        }
    }

    /// The mode with the largest area, then the highest refresh rate, then variable over fixed
    /// refresh rate.
    pub fn best_mode(&self) -> Option<&MonitorMode> {
        let mut best: Option<&MonitorMode> = None;

        for mode in &self.modes {
            let Some(current) = best else {
                best = Some(mode);
                continue;
            };

            let a = &mode.spec;
            let b = &current.spec;
            let better = a.area() > b.area()
                || (a.area() == b.area() && a.refresh_rate > b.refresh_rate)
                || (a.area() == b.area()
                    && a.refresh_rate == b.refresh_rate
                    && a.refresh_rate_mode > b.refresh_rate_mode);
            if better {
                best = Some(mode);
            }
        }

        best
    }

    /// Whether a mode should be offered to the user.
    ///
    /// Tiny modes are hidden, unless they have the same size as the preferred mode.
    pub fn should_be_advertised(&self, mode: &MonitorMode) -> bool {
        if let Some(preferred) = self.preferred_mode() {
            if mode.spec.width == preferred.spec.width && mode.spec.height == preferred.spec.height
            {
                return true;
            }
        }

        mode.spec.area() >= MINIMUM_LOGICAL_AREA
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.modes.iter().position(|mode| mode.id == id)
    }
}

/// Whether every output is configured exactly as `mode` asks.
///
/// An output that `mode` disables must have no CRTC at all.
pub(super) fn is_mode_assigned(mode: &MonitorMode, outputs: &[Output]) -> bool {
    outputs.iter().all(|output| match mode.crtc_mode_for(output.id) {
        Some(crtc_mode) => output.is_driving(crtc_mode),
        None => !output.is_active(),
    })
}
