//! Hardware descriptors consumed by mode derivation.
//!
//! These mirror what a DRM backend reports for each connector: the list of CRTC modes, which one
//! the sink prefers, optional tile-group membership, and the CRTC configuration that is live right
//! now.

use bitflags::bitflags;
use smithay::utils::Transform;

// =============================================================================
// CRTC Modes
// =============================================================================

bitflags! {
    /// DRM mode flags, with the same bit values as `DRM_MODE_FLAG_*`.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CrtcModeFlags: u32 {
        const PHSYNC = 1 << 0;
        const NHSYNC = 1 << 1;
        const PVSYNC = 1 << 2;
        const NVSYNC = 1 << 3;
        const INTERLACE = 1 << 4;
        const DBLSCAN = 1 << 5;
        const CSYNC = 1 << 6;
        const PCSYNC = 1 << 7;
        const NCSYNC = 1 << 8;
        const HSKEW = 1 << 9;
        const DBLCLK = 1 << 12;
        const CLKDIV2 = 1 << 13;
    }
}

impl CrtcModeFlags {
    /// Flags that distinguish monitor modes. Everything else is a timing detail.
    pub const HANDLED: Self = Self::INTERLACE;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RefreshRateMode {
    #[default]
    Fixed,
    Variable,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrtcModeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrtcModeInfo {
    pub width: i32,
    pub height: i32,
    pub refresh_rate: f32,
    pub refresh_rate_mode: RefreshRateMode,
    pub flags: CrtcModeFlags,
}

/// A CRTC mode as reported by an output. Compared by id, not by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrtcMode {
    pub id: CrtcModeId,
    pub info: CrtcModeInfo,
}

// =============================================================================
// Outputs
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub u64);

/// Position of an output inside a tile group.
///
/// A `group_id` of zero means the output isn't part of a tile group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileInfo {
    pub group_id: u32,
    pub flags: u32,
    pub max_h_tiles: u32,
    pub max_v_tiles: u32,
    pub loc_h_tile: u32,
    pub loc_v_tile: u32,
    pub tile_w: u32,
    pub tile_h: u32,
}

/// The live configuration of the CRTC driving an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrtcConfig {
    pub mode: CrtcModeId,
    pub transform: Transform,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputInfo {
    /// Connector name, e.g. `DP-1`.
    pub name: String,
    pub vendor: Option<String>,
    pub product: Option<String>,
    pub serial: Option<String>,
    pub width_mm: i32,
    pub height_mm: i32,
    pub modes: Vec<CrtcMode>,
    pub preferred_mode: Option<CrtcModeId>,
    pub tile_info: Option<TileInfo>,
    /// Fixed rotation of the panel relative to its natural orientation.
    pub panel_orientation: Transform,
    pub is_builtin: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub id: OutputId,
    pub info: OutputInfo,
    /// `None` when no CRTC is assigned, i.e. the output is off.
    pub crtc: Option<CrtcConfig>,
}

impl Output {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn mode(&self, id: CrtcModeId) -> Option<&CrtcMode> {
        self.info.modes.iter().find(|m| m.id == id)
    }

    pub fn preferred_mode(&self) -> Option<&CrtcMode> {
        self.info.preferred_mode.and_then(|id| self.mode(id))
    }

    pub fn tile_group_id(&self) -> Option<u32> {
        self.info
            .tile_info
            .map(|tile| tile.group_id)
            .filter(|id| *id != 0)
    }

    pub fn tile_info(&self) -> TileInfo {
        self.info.tile_info.unwrap_or_default()
    }

    /// Whether a CRTC mode covers exactly one tile of this output.
    pub fn is_crtc_mode_tiled(&self, mode: &CrtcMode) -> bool {
        let tile = self.tile_info();
        i64::from(mode.info.width) == i64::from(tile.tile_w)
            && i64::from(mode.info.height) == i64::from(tile.tile_h)
    }

    pub fn is_active(&self) -> bool {
        self.crtc.is_some()
    }

    /// Whether the output's CRTC is currently configured with this CRTC mode.
    pub fn is_driving(&self, mode: CrtcModeId) -> bool {
        self.crtc.is_some_and(|crtc| crtc.mode == mode)
    }
}
