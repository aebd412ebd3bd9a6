//! Command-line front-end.
//!
//! The inspection commands read hardware descriptors and input events from JSON files, run them
//! through the library and print what comes out.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use meridian_config::Config;
use serde::Deserialize;
use smithay::utils::Transform;
use tracing::{debug, warn};

use crate::gesture::{
    DeviceId, GestureContext, GestureEvent, GestureEventKind, GestureHandler, GestureRecognizer,
    SequenceId, TriggerGate,
};
use crate::monitor::scale::ScaleSelector;
use crate::monitor::types::{
    CrtcConfig, CrtcMode, CrtcModeFlags, CrtcModeId, CrtcModeInfo, Output, OutputId, OutputInfo,
    RefreshRateMode, TileInfo,
};
use crate::monitor::Monitor;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (default: `$XDG_CONFIG_HOME/meridian/config.kdl`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the monitors described by an outputs file together with their modes
    Modes {
        /// JSON file with an array of outputs
        outputs: PathBuf,
    },
    /// Show the default and supported scales of each monitor
    Scales {
        /// JSON file with an array of outputs
        outputs: PathBuf,
        /// Mode id to compute scales for, instead of the configured or preferred mode
        #[arg(long)]
        mode: Option<String>,
    },
    /// Replay input events through a gesture recognizer and print its callbacks
    Gestures {
        /// JSON file with an array of events
        events: PathBuf,
    },
    /// Validate the config file
    Validate,
}

// =============================================================================
// Descriptor files
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformDesc {
    Normal,
    #[serde(rename = "90")]
    _90,
    #[serde(rename = "180")]
    _180,
    #[serde(rename = "270")]
    _270,
    Flipped,
    #[serde(rename = "flipped-90")]
    Flipped90,
    #[serde(rename = "flipped-180")]
    Flipped180,
    #[serde(rename = "flipped-270")]
    Flipped270,
}

impl From<TransformDesc> for Transform {
    fn from(value: TransformDesc) -> Self {
        match value {
            TransformDesc::Normal => Transform::Normal,
            TransformDesc::_90 => Transform::_90,
            TransformDesc::_180 => Transform::_180,
            TransformDesc::_270 => Transform::_270,
            TransformDesc::Flipped => Transform::Flipped,
            TransformDesc::Flipped90 => Transform::Flipped90,
            TransformDesc::Flipped180 => Transform::Flipped180,
            TransformDesc::Flipped270 => Transform::Flipped270,
        }
    }
}

fn normal() -> TransformDesc {
    TransformDesc::Normal
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrtcModeDesc {
    pub id: u64,
    pub width: i32,
    pub height: i32,
    pub refresh_rate: f32,
    #[serde(default)]
    pub vrr: bool,
    #[serde(default)]
    pub interlaced: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileDesc {
    pub group_id: u32,
    #[serde(default)]
    pub flags: u32,
    pub max_h_tiles: u32,
    pub max_v_tiles: u32,
    pub loc_h_tile: u32,
    pub loc_v_tile: u32,
    pub tile_w: u32,
    pub tile_h: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrtcDesc {
    pub mode: u64,
    #[serde(default = "normal")]
    pub transform: TransformDesc,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDesc {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub width_mm: i32,
    #[serde(default)]
    pub height_mm: i32,
    #[serde(default)]
    pub builtin: bool,
    #[serde(default = "normal")]
    pub panel_orientation: TransformDesc,
    pub modes: Vec<CrtcModeDesc>,
    #[serde(default)]
    pub preferred_mode: Option<u64>,
    #[serde(default)]
    pub tile: Option<TileDesc>,
    #[serde(default)]
    pub crtc: Option<CrtcDesc>,
}

impl From<OutputDesc> for Output {
    fn from(desc: OutputDesc) -> Self {
        let modes = desc
            .modes
            .into_iter()
            .map(|mode| CrtcMode {
                id: CrtcModeId(mode.id),
                info: CrtcModeInfo {
                    width: mode.width,
                    height: mode.height,
                    refresh_rate: mode.refresh_rate,
                    refresh_rate_mode: if mode.vrr {
                        RefreshRateMode::Variable
                    } else {
                        RefreshRateMode::Fixed
                    },
                    flags: if mode.interlaced {
                        CrtcModeFlags::INTERLACE
                    } else {
                        CrtcModeFlags::empty()
                    },
                },
            })
            .collect();

        let tile_info = desc.tile.map(|tile| TileInfo {
            group_id: tile.group_id,
            flags: tile.flags,
            max_h_tiles: tile.max_h_tiles,
            max_v_tiles: tile.max_v_tiles,
            loc_h_tile: tile.loc_h_tile,
            loc_v_tile: tile.loc_v_tile,
            tile_w: tile.tile_w,
            tile_h: tile.tile_h,
        });

        Output {
            id: OutputId(desc.id),
            info: OutputInfo {
                name: desc.name,
                vendor: desc.vendor,
                product: desc.product,
                serial: desc.serial,
                width_mm: desc.width_mm,
                height_mm: desc.height_mm,
                modes,
                preferred_mode: desc.preferred_mode.map(CrtcModeId),
                tile_info,
                panel_orientation: desc.panel_orientation.into(),
                is_builtin: desc.builtin,
            },
            crtc: desc.crtc.map(|crtc| CrtcConfig {
                mode: CrtcModeId(crtc.mode),
                transform: crtc.transform.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKindDesc {
    Press,
    Motion,
    Release,
    TouchBegin,
    TouchUpdate,
    TouchEnd,
    TouchCancel,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventDesc {
    pub kind: EventKindDesc,
    #[serde(default)]
    pub device: u32,
    #[serde(default)]
    pub sequence: Option<u32>,
    pub x: f64,
    pub y: f64,
    pub time: i64,
}

impl TryFrom<EventDesc> for GestureEvent {
    type Error = anyhow::Error;

    fn try_from(desc: EventDesc) -> anyhow::Result<Self> {
        let kind = match desc.kind {
            EventKindDesc::Press => GestureEventKind::ButtonPress,
            EventKindDesc::Motion => GestureEventKind::Motion,
            EventKindDesc::Release => GestureEventKind::ButtonRelease,
            EventKindDesc::TouchBegin => GestureEventKind::TouchBegin,
            EventKindDesc::TouchUpdate => GestureEventKind::TouchUpdate,
            EventKindDesc::TouchEnd => GestureEventKind::TouchEnd,
            EventKindDesc::TouchCancel => GestureEventKind::TouchCancel,
        };

        let sequence = desc.sequence.map(SequenceId);
        if kind.is_touch() && sequence.is_none() {
            bail!("{:?} event at time {} has no sequence", desc.kind, desc.time);
        }

        Ok(GestureEvent {
            kind,
            device: DeviceId(desc.device),
            sequence,
            pos: (desc.x, desc.y).into(),
            time: desc.time,
        })
    }
}

pub fn parse_outputs(text: &str) -> anyhow::Result<Vec<Output>> {
    let descs: Vec<OutputDesc> = serde_json::from_str(text).context("error parsing outputs")?;
    Ok(descs.into_iter().map(Output::from).collect())
}

pub fn parse_events(text: &str) -> anyhow::Result<Vec<GestureEvent>> {
    let descs: Vec<EventDesc> = serde_json::from_str(text).context("error parsing events")?;
    descs.into_iter().map(GestureEvent::try_from).collect()
}

fn read_outputs(path: &Path) -> anyhow::Result<Vec<Output>> {
    let text = fs::read_to_string(path).with_context(|| format!("error reading {path:?}"))?;
    let outputs = parse_outputs(&text).with_context(|| format!("error loading {path:?}"))?;
    debug!("loaded {} outputs from {path:?}", outputs.len());
    Ok(outputs)
}

fn read_events(path: &Path) -> anyhow::Result<Vec<GestureEvent>> {
    let text = fs::read_to_string(path).with_context(|| format!("error reading {path:?}"))?;
    let events = parse_events(&text).with_context(|| format!("error loading {path:?}"))?;
    debug!("loaded {} events from {path:?}", events.len());
    Ok(events)
}

// =============================================================================
// Reports
// =============================================================================

pub fn describe_monitors(config: &Config, monitors: &[Monitor]) -> String {
    let mut buf = String::new();

    for monitor in monitors {
        let connectors: Vec<_> = monitor.outputs().iter().map(|o| o.name()).collect();
        let _ = write!(buf, "{} ({})", monitor.display_name(), connectors.join(", "));
        if monitor.is_tiled() {
            buf.push_str(" tiled");
        }
        if config
            .output(monitor.connector())
            .is_some_and(|output| output.off)
        {
            buf.push_str(" off");
        }
        buf.push('\n');

        for mode in monitor.modes() {
            if !monitor.catalog().should_be_advertised(mode) {
                continue;
            }

            let _ = write!(buf, "  {}", mode.id);
            if monitor.preferred_mode().is_some_and(|m| m.id == mode.id) {
                buf.push_str(" (preferred)");
            }
            if monitor.current_mode().is_some_and(|m| m.id == mode.id) {
                buf.push_str(" (current)");
            }
            buf.push('\n');
        }
    }

    buf
}

pub fn describe_scales(
    config: &Config,
    monitors: &[Monitor],
    mode: Option<&str>,
) -> anyhow::Result<String> {
    let selector = ScaleSelector::from_config(&config.scaling);
    let mut buf = String::new();

    for monitor in monitors {
        let mode = match mode {
            Some(id) => monitor
                .mode_from_id(id)
                .with_context(|| format!("{} has no mode {id}", monitor.connector()))?,
            None => match monitor.resolve_configured_mode(config.output(monitor.connector())) {
                Some(mode) => mode,
                None => {
                    warn!("{} has no modes", monitor.connector());
                    continue;
                }
            },
        };

        let scale = monitor.calculate_mode_scale(mode, &selector);
        let supported: Vec<_> = monitor
            .supported_scales(mode, &selector)
            .iter()
            .map(|s| s.to_string())
            .collect();

        let _ = writeln!(buf, "{} {}: {scale}", monitor.connector(), mode.id);
        let _ = writeln!(buf, "  supported: {}", supported.join(" "));
    }

    Ok(buf)
}

/// Prints every callback of the recognizer.
#[derive(Debug, Default)]
pub struct ReplayHandler {
    pub log: Vec<String>,
}

impl GestureHandler for ReplayHandler {
    fn begin(&mut self, ctx: &mut GestureContext<'_>, point: usize) -> bool {
        if let Some(p) = ctx.point(point) {
            let pos = p.press_coords();
            self.log.push(format!(
                "begin with {} points at ({}, {})",
                ctx.n_points(),
                pos.x,
                pos.y
            ));
        }
        true
    }

    fn progress(&mut self, ctx: &mut GestureContext<'_>, point: usize) -> bool {
        if let Some(p) = ctx.point(point) {
            let moved = p.motion_coords() - p.press_coords();
            self.log
                .push(format!("progress {point} by ({}, {})", moved.x, moved.y));
        }
        true
    }

    fn end(&mut self, _ctx: &GestureContext<'_>, point: Option<usize>) {
        match point {
            Some(point) => self.log.push(format!("end on release of {point}")),
            None => self.log.push(String::from("end")),
        }
    }

    fn cancel(&mut self, _ctx: &GestureContext<'_>) {
        self.log.push(String::from("cancel"));
    }

    fn grab(&mut self, device: DeviceId, sequence: Option<SequenceId>) {
        self.log.push(format!("grab {}", describe_point(device, sequence)));
    }

    fn ungrab(&mut self, device: DeviceId, sequence: Option<SequenceId>) {
        self.log
            .push(format!("ungrab {}", describe_point(device, sequence)));
    }
}

fn describe_point(device: DeviceId, sequence: Option<SequenceId>) -> String {
    match sequence {
        Some(sequence) => format!("device {} sequence {}", device.0, sequence.0),
        None => format!("device {}", device.0),
    }
}

/// Runs events through a recognizer set up from the gestures config and returns the callbacks
/// in order.
pub fn replay_events(config: &Config, events: &[GestureEvent]) -> Vec<String> {
    let gestures = &config.gestures;
    let gate = TriggerGate::from_config(
        ReplayHandler::default(),
        gestures,
        gestures.drag_threshold.0,
    );

    let mut recognizer = GestureRecognizer::new(gate);
    recognizer.set_n_touch_points(gestures.n_touch_points.0 as usize);

    for event in events {
        recognizer.handle_event(event);
    }

    recognizer.into_handler().into_inner().log
}

// =============================================================================
// Commands
// =============================================================================

pub fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Modes { outputs } => {
            let monitors = Monitor::from_outputs(read_outputs(&outputs)?);
            print!("{}", describe_monitors(config, &monitors));
        }
        Commands::Scales { outputs, mode } => {
            let monitors = Monitor::from_outputs(read_outputs(&outputs)?);
            print!("{}", describe_scales(config, &monitors, mode.as_deref())?);
        }
        Commands::Gestures { events } => {
            let events = read_events(&events)?;
            for line in replay_events(config, &events) {
                println!("{line}");
            }
        }
        // The config has been loaded by the time we get here.
        Commands::Validate => println!("config is valid"),
    }

    Ok(())
}
