use std::collections::HashSet;

use insta::assert_snapshot;
use proptest::prelude::*;
use smithay::utils::Transform;

use super::catalog::ModeCatalog;
use super::mode::MonitorCrtcMode;
use super::scale::{ScaleSelector, ScalesConstraint};
use super::types::*;
use super::*;

fn mode(id: u64, width: i32, height: i32, refresh_rate: f32) -> CrtcMode {
    CrtcMode {
        id: CrtcModeId(id),
        info: CrtcModeInfo {
            width,
            height,
            refresh_rate,
            refresh_rate_mode: RefreshRateMode::Fixed,
            flags: CrtcModeFlags::empty(),
        },
    }
}

fn with_flags(mut mode: CrtcMode, flags: CrtcModeFlags) -> CrtcMode {
    mode.info.flags = flags;
    mode
}

fn output(id: u64, modes: Vec<CrtcMode>, preferred: Option<u64>) -> Output {
    Output {
        id: OutputId(id),
        info: OutputInfo {
            name: format!("DP-{id}"),
            vendor: None,
            product: None,
            serial: None,
            width_mm: 0,
            height_mm: 0,
            modes,
            preferred_mode: preferred.map(CrtcModeId),
            tile_info: None,
            panel_orientation: Transform::Normal,
            is_builtin: false,
        },
        crtc: None,
    }
}

fn tile(mut output: Output, loc: (u32, u32), size: (u32, u32)) -> Output {
    output.info.tile_info = Some(TileInfo {
        group_id: 1,
        flags: 0,
        max_h_tiles: 2,
        max_v_tiles: 2,
        loc_h_tile: loc.0,
        loc_v_tile: loc.1,
        tile_w: size.0,
        tile_h: size.1,
    });
    output
}

fn driving(mut output: Output, mode: u64) -> Output {
    output.crtc = Some(CrtcConfig {
        mode: CrtcModeId(mode),
        transform: Transform::Normal,
    });
    output
}

fn describe(catalog: &ModeCatalog) -> String {
    let is = |mode: Option<&MonitorMode>, id: &str| mode.is_some_and(|m| m.id == id);

    catalog
        .modes()
        .iter()
        .map(|mode| {
            let mut line = mode.id.clone();
            if is(catalog.preferred_mode(), &mode.id) {
                line.push_str(" (preferred)");
            }
            if is(catalog.current_mode(), &mode.id) {
                line.push_str(" (current)");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn laptop_panel() -> Output {
    output(
        1,
        vec![
            mode(1, 1920, 1080, 60.),
            mode(2, 1920, 1080, 75.),
            mode(3, 1280, 720, 60.),
        ],
        Some(1),
    )
}

/// Two side-by-side halves of a 3840x1080 panel.
fn side_by_side_tiles() -> Vec<Output> {
    vec![
        tile(
            output(1, vec![mode(1, 1920, 1080, 60.)], Some(1)),
            (0, 0),
            (1920, 1080),
        ),
        tile(
            output(2, vec![mode(11, 1920, 1080, 60.)], Some(11)),
            (1, 0),
            (1920, 1080),
        ),
    ]
}

// =============================================================================
// Untiled monitors
// =============================================================================

#[test]
fn untiled_modes() {
    let catalog = ModeCatalog::generate_untiled_modes(&laptop_panel());

    assert_eq!(catalog.len(), 3);
    assert_eq!(
        catalog.preferred_mode().map(|m| m.id.as_str()),
        Some("1920x1080@60.000")
    );
    assert_snapshot!(describe(&catalog), @r"
    1920x1080@60.000 (preferred)
    1920x1080@75.000
    1280x720@60.000
    ");
}

#[test]
fn duplicate_mode_prefers_preferred_flags() {
    // Same monitor mode, only the sync polarity differs. The preferred one comes second and
    // replaces the first.
    let output = output(
        1,
        vec![
            with_flags(mode(1, 1920, 1080, 60.), CrtcModeFlags::NHSYNC),
            with_flags(mode(2, 1920, 1080, 60.), CrtcModeFlags::PHSYNC),
        ],
        Some(2),
    );
    let catalog = ModeCatalog::generate_untiled_modes(&output);

    assert_eq!(catalog.len(), 1);
    let preferred = catalog.preferred_mode().unwrap();
    assert_eq!(preferred.crtc_modes[0].crtc_mode, Some(CrtcModeId(2)));
}

#[test]
fn duplicate_mode_never_replaces_preferred() {
    let output = output(
        1,
        vec![
            with_flags(mode(1, 1920, 1080, 60.), CrtcModeFlags::PHSYNC),
            with_flags(mode(2, 1920, 1080, 60.), CrtcModeFlags::PHSYNC),
            with_flags(mode(3, 1920, 1080, 60.), CrtcModeFlags::NHSYNC),
        ],
        Some(1),
    );
    let catalog = ModeCatalog::generate_untiled_modes(&output);

    assert_eq!(catalog.len(), 1);
    let preferred = catalog.preferred_mode().unwrap();
    assert_eq!(preferred.crtc_modes[0].crtc_mode, Some(CrtcModeId(1)));
}

#[test]
fn add_mode_collision_policy() {
    let output = laptop_panel();
    let mut catalog = ModeCatalog::generate_untiled_modes(&output);
    let first = catalog.modes()[0].clone();

    assert!(!catalog.add_mode(first.clone(), false));
    assert_eq!(catalog.len(), 3);

    // A replaced mode moves to the end.
    assert!(catalog.add_mode(first, true));
    assert_snapshot!(describe(&catalog), @r"
    1920x1080@75.000
    1280x720@60.000
    1920x1080@60.000 (preferred)
    ");
}

#[test]
fn missing_preferred_mode() {
    let mut output = laptop_panel();
    output.info.preferred_mode = None;
    let catalog = ModeCatalog::generate_untiled_modes(&output);
    assert_eq!(catalog.len(), 3);
    assert!(catalog.preferred_mode().is_none());

    output.info.preferred_mode = Some(CrtcModeId(42));
    let catalog = ModeCatalog::generate_untiled_modes(&output);
    assert!(catalog.preferred_mode().is_none());
}

#[test]
fn rotated_panel_swaps_mode_size() {
    let mut output = output(1, vec![mode(1, 800, 1280, 60.)], Some(1));
    output.info.panel_orientation = Transform::_90;
    let catalog = ModeCatalog::generate_untiled_modes(&output);
    assert_snapshot!(describe(&catalog), @"1280x800@60.000 (preferred)");
}

#[test]
fn untiled_current_mode() {
    let catalog = ModeCatalog::generate_untiled_modes(&driving(laptop_panel(), 2));
    assert_eq!(
        catalog.current_mode().map(|m| m.id.as_str()),
        Some("1920x1080@75.000")
    );

    let catalog = ModeCatalog::generate_untiled_modes(&laptop_panel());
    assert!(catalog.current_mode().is_none());

    // Lit with a mode the output doesn't report.
    let catalog = ModeCatalog::generate_untiled_modes(&driving(laptop_panel(), 42));
    assert!(catalog.current_mode().is_none());
}

#[test]
fn set_current_mode() {
    let mut catalog = ModeCatalog::generate_untiled_modes(&laptop_panel());

    assert!(catalog.set_current_mode(Some("1280x720@60.000")));
    assert_eq!(
        catalog.current_mode().map(|m| m.id.as_str()),
        Some("1280x720@60.000")
    );

    assert!(!catalog.set_current_mode(Some("640x480@60.000")));
    assert_eq!(
        catalog.current_mode().map(|m| m.id.as_str()),
        Some("1280x720@60.000")
    );

    assert!(catalog.set_current_mode(None));
    assert!(catalog.current_mode().is_none());
}

#[test]
fn zero_size_mode() {
    let monitor = Monitor::new_normal(output(1, vec![mode(1, 0, 0, 60.)], Some(1)));
    let mode = monitor.preferred_mode().unwrap();
    assert_eq!(mode.id, "0x0@60.000");

    let selector = ScaleSelector::default();
    assert_eq!(monitor.supported_scales(mode, &selector), vec![1.]);
    assert_eq!(monitor.calculate_mode_scale(mode, &selector), 1.);
    assert!(monitor.catalog().should_be_advertised(mode));
}

#[test]
fn advertised_modes() {
    let monitor = Monitor::new_normal(output(
        1,
        vec![
            mode(1, 1920, 1080, 60.),
            mode(2, 640, 480, 60.),
            mode(3, 800, 480, 60.),
        ],
        Some(1),
    ));

    let advertised: Vec<_> = monitor
        .modes()
        .iter()
        .filter(|m| monitor.catalog().should_be_advertised(m))
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(advertised, ["1920x1080@60.000", "800x480@60.000"]);
}

#[test]
fn best_mode_prefers_area_then_rate() {
    let mut vrr = mode(4, 3840, 2160, 30.);
    vrr.info.refresh_rate_mode = RefreshRateMode::Variable;
    let output = output(
        1,
        vec![
            mode(1, 1920, 1080, 144.),
            mode(2, 3840, 2160, 24.),
            mode(3, 3840, 2160, 30.),
            vrr,
        ],
        None,
    );
    let catalog = ModeCatalog::generate_untiled_modes(&output);
    assert_eq!(
        catalog.best_mode().map(|m| m.id.as_str()),
        Some("3840x2160@30.000+vrr")
    );
}

// =============================================================================
// Tiled monitors
// =============================================================================

#[test]
fn side_by_side_composite() {
    let outputs = side_by_side_tiles();
    let reconciler = TiledModeReconciler::new(&outputs).unwrap();
    assert_eq!(reconciler.tiled_size(), (3840, 1080));

    let catalog = reconciler.generate_modes();
    assert_eq!(catalog.len(), 1);

    let mode = catalog.preferred_mode().unwrap();
    assert_eq!((mode.spec.width, mode.spec.height), (3840, 1080));
    assert!(mode.is_tiled);
    assert_eq!(
        mode.crtc_modes,
        [
            MonitorCrtcMode {
                output: OutputId(1),
                crtc_mode: Some(CrtcModeId(1)),
            },
            MonitorCrtcMode {
                output: OutputId(2),
                crtc_mode: Some(CrtcModeId(11)),
            },
        ]
    );
}

#[test]
fn fully_preferred_tiled_mode_wins() {
    let outputs = vec![
        tile(
            output(
                1,
                vec![mode(1, 1920, 1080, 60.), mode(2, 1920, 1080, 30.)],
                Some(2),
            ),
            (0, 0),
            (1920, 1080),
        ),
        tile(
            output(
                2,
                vec![mode(11, 1920, 1080, 60.), mode(12, 1920, 1080, 30.)],
                Some(12),
            ),
            (1, 0),
            (1920, 1080),
        ),
    ];
    let monitor = Monitor::new_tiled(outputs).unwrap();

    assert_snapshot!(describe(monitor.catalog()), @r"
    3840x1080@60.000
    3840x1080@30.000 (preferred)
    ");
}

#[test]
fn fastest_tiled_mode_beats_untiled_preference() {
    // The origin tile prefers an untiled mode, which is ignored while a tiled mode exists.
    let outputs = vec![
        tile(
            output(
                1,
                vec![
                    mode(1, 1920, 2160, 60.),
                    mode(2, 1920, 2160, 30.),
                    mode(3, 1920, 1080, 60.),
                ],
                Some(3),
            ),
            (0, 0),
            (1920, 2160),
        ),
        tile(
            output(
                2,
                vec![mode(11, 1920, 2160, 60.), mode(12, 1920, 2160, 30.)],
                Some(11),
            ),
            (1, 0),
            (1920, 2160),
        ),
    ];
    let monitor = Monitor::new_tiled(outputs).unwrap();

    assert_snapshot!(describe(monitor.catalog()), @r"
    3840x2160@60.000 (preferred)
    3840x2160@30.000
    1920x1080@60.000
    ");
}

#[test]
fn untiled_preferred_mode_without_tiled_modes() {
    // The second tile has no tile-sized mode, so there are no tiled modes at all. It also has
    // the most untiled modes, so it drives the panel.
    let outputs = vec![
        tile(
            output(
                1,
                vec![mode(1, 1920, 2160, 60.), mode(2, 1920, 1080, 60.)],
                Some(2),
            ),
            (0, 0),
            (1920, 2160),
        ),
        tile(
            output(
                2,
                vec![mode(11, 3840, 2160, 30.), mode(12, 1920, 1080, 60.)],
                Some(11),
            ),
            (1, 0),
            (1920, 2160),
        ),
    ];
    let monitor = Monitor::new_tiled(outputs).unwrap();

    assert_eq!(
        monitor.kind(),
        MonitorKind::Tiled {
            tile_group_id: 1,
            origin: 0,
            main: 1,
        }
    );
    assert_snapshot!(describe(monitor.catalog()), @r"
    3840x2160@30.000 (preferred)
    1920x1080@60.000
    ");

    let preferred = monitor.preferred_mode().unwrap();
    assert!(!preferred.is_tiled);
    assert_eq!(
        preferred.crtc_modes,
        [
            MonitorCrtcMode {
                output: OutputId(1),
                crtc_mode: None,
            },
            MonitorCrtcMode {
                output: OutputId(2),
                crtc_mode: Some(CrtcModeId(11)),
            },
        ]
    );
}

#[test]
fn largest_mode_as_last_resort() {
    let outputs = vec![
        tile(
            output(
                1,
                vec![mode(1, 1920, 2160, 60.), mode(2, 1920, 1080, 60.)],
                Some(2),
            ),
            (0, 0),
            (1920, 2160),
        ),
        tile(
            output(
                2,
                vec![
                    mode(11, 1920, 1080, 60.),
                    mode(12, 3840, 2160, 30.),
                    mode(13, 3840, 2160, 24.),
                ],
                None,
            ),
            (1, 0),
            (1920, 2160),
        ),
    ];
    let monitor = Monitor::new_tiled(outputs).unwrap();

    assert_snapshot!(describe(monitor.catalog()), @r"
    1920x1080@60.000
    3840x2160@30.000 (preferred)
    3840x2160@24.000
    ");
}

#[test]
fn tiled_current_mode() {
    let outputs: Vec<_> = side_by_side_tiles()
        .into_iter()
        .zip([1, 11])
        .map(|(output, mode)| driving(output, mode))
        .collect();
    let monitor = Monitor::new_tiled(outputs).unwrap();
    assert_snapshot!(describe(monitor.catalog()), @"3840x1080@60.000 (preferred) (current)");

    // Only one tile lit doesn't match the composite mode.
    let mut outputs = side_by_side_tiles();
    outputs[0] = driving(outputs[0].clone(), 1);
    let monitor = Monitor::new_tiled(outputs).unwrap();
    assert!(monitor.current_mode().is_none());
}

#[test]
fn untiled_current_mode_of_tiled_monitor() {
    let outputs = vec![
        tile(
            output(
                1,
                vec![mode(1, 1920, 2160, 60.), mode(2, 1920, 1080, 60.)],
                Some(1),
            ),
            (0, 0),
            (1920, 2160),
        ),
        tile(
            output(2, vec![mode(11, 1920, 2160, 60.)], Some(11)),
            (1, 0),
            (1920, 2160),
        ),
    ];
    let mut monitor = Monitor::new_tiled(outputs.clone()).unwrap();
    assert!(monitor.current_mode().is_none());

    let lit = vec![driving(outputs[0].clone(), 2), outputs[1].clone()];
    monitor.update_current_mode(&lit);
    assert_eq!(
        monitor.current_mode().map(|m| m.id.as_str()),
        Some("1920x1080@60.000")
    );

    let both_lit = vec![driving(outputs[0].clone(), 2), driving(outputs[1].clone(), 11)];
    monitor.update_current_mode(&both_lit);
    assert!(monitor.current_mode().is_none());
}

#[test]
fn tiled_monitor_needs_origin() {
    let outputs = vec![tile(
        output(2, vec![mode(11, 1920, 1080, 60.)], Some(11)),
        (1, 0),
        (1920, 1080),
    )];
    let err = Monitor::new_tiled(outputs).unwrap_err();
    assert_snapshot!(err.to_string(), @"tile group 1 has no (0, 0) tile");

    let err = Monitor::new_tiled(vec![laptop_panel()]).unwrap_err();
    assert_snapshot!(err.to_string(), @"DP-1 is not part of a tile group");
}

fn quad_tiles() -> Vec<Output> {
    [(0, 0), (1, 0), (0, 1), (1, 1)]
        .into_iter()
        .enumerate()
        .map(|(idx, loc)| {
            let id = idx as u64 + 1;
            tile(
                output(id, vec![mode(id * 10, 1920, 1080, 60.)], Some(id * 10)),
                loc,
                (1920, 1080),
            )
        })
        .collect()
}

#[test]
fn quad_tile_crtc_positions() {
    let monitor = Monitor::new_tiled(quad_tiles()).unwrap();
    let mode = monitor.preferred_mode().unwrap();
    assert_eq!(mode.id, "3840x2160@60.000");
    assert_eq!(mode.crtc_modes.len(), 4);

    let positions = |transform| {
        (1..=4)
            .map(|id| monitor.calculate_crtc_pos(mode, OutputId(id), transform))
            .collect::<Vec<_>>()
    };

    assert_eq!(
        positions(Transform::Normal),
        [(0, 0), (1920, 0), (0, 1080), (1920, 1080)]
    );
    assert_eq!(
        positions(Transform::_180),
        [(1920, 1080), (0, 1080), (1920, 0), (0, 0)]
    );
    assert_eq!(
        positions(Transform::_90),
        [(0, 0), (0, 1920), (1080, 0), (1080, 1920)]
    );
    assert_eq!(
        positions(Transform::_270),
        [(1080, 1920), (1080, 0), (0, 1920), (0, 0)]
    );
}

#[test]
fn tile_coordinate_of_unknown_output() {
    let outputs = quad_tiles();
    let reconciler = TiledModeReconciler::new(&outputs).unwrap();

    assert_eq!(
        reconciler.tile_coordinate(OutputId(4), Transform::Normal),
        Some((1920, 1080))
    );
    assert_eq!(
        reconciler.tile_coordinate(OutputId(5), Transform::Normal),
        None
    );
}

#[test]
fn untiled_modes_are_not_offset() {
    let monitor = Monitor::new_normal(laptop_panel());
    let mode = monitor.preferred_mode().unwrap();
    assert_eq!(
        monitor.calculate_crtc_pos(mode, OutputId(1), Transform::_90),
        (0, 0)
    );
}

// =============================================================================
// Monitor
// =============================================================================

#[test]
fn group_outputs_into_monitors() {
    let tiles = side_by_side_tiles();
    let mut a = output(10, vec![mode(1, 1920, 1080, 60.)], Some(1));
    a.info.name = String::from("eDP-1");
    let b = output(20, vec![mode(1, 2560, 1440, 60.)], Some(1));

    let monitors = Monitor::from_outputs(vec![a, tiles[0].clone(), b, tiles[1].clone()]);
    let connectors: Vec<_> = monitors
        .iter()
        .map(|m| (m.connector(), m.is_tiled()))
        .collect();
    assert_eq!(
        connectors,
        [("eDP-1", false), ("DP-1", true), ("DP-20", false)]
    );
}

#[test]
fn broken_tile_group_is_split() {
    let mut tiles = side_by_side_tiles();
    tiles[0].info.tile_info.as_mut().unwrap().loc_h_tile = 2;

    let monitors = Monitor::from_outputs(tiles);
    assert_eq!(monitors.len(), 2);
    assert!(monitors.iter().all(|m| !m.is_tiled()));
}

#[test]
fn update_outputs() {
    let mut monitor = Monitor::new_normal(laptop_panel());

    let mut updated = laptop_panel();
    updated.info.modes.pop();
    assert!(monitor.update_outputs(&[updated]));
    assert_eq!(monitor.modes().len(), 2);

    assert!(!monitor.update_outputs(&[output(2, vec![], None)]));
    assert_eq!(monitor.modes().len(), 2);
}

#[test]
fn display_names() {
    let named = |vendor: Option<&str>, product: Option<&str>, size: (i32, i32)| {
        let mut output = laptop_panel();
        output.info.vendor = vendor.map(String::from);
        output.info.product = product.map(String::from);
        output.info.width_mm = size.0;
        output.info.height_mm = size.1;
        Monitor::new_normal(output).display_name().to_owned()
    };

    let mut builtin = laptop_panel();
    builtin.info.is_builtin = true;
    builtin.info.vendor = Some(String::from("BOE"));

    let names = [
        Monitor::new_normal(builtin).display_name().to_owned(),
        named(Some("Dell"), Some("U2720Q"), (600, 340)),
        named(Some("Lenovo"), None, (294, 165)),
        named(Some("Lenovo"), None, (344, 194)),
        named(None, None, (600, 340)),
        named(Some("Dell"), Some("U2414H"), (160, 90)),
        named(Some("Dell"), Some("U2414H"), (0, 0)),
        named(None, None, (0, 0)),
    ];
    assert_snapshot!(names.join("\n"), @r#"
    Built-in display
    Dell 27"
    Lenovo 13.3"
    Lenovo 15.6"
    Unknown 27"
    Dell U2414H
    Dell
    Unknown Display
    "#);
}

#[test]
fn monitor_identity() {
    let identified = |id: u64, serial: Option<&str>| {
        let mut output = laptop_panel();
        output.id = OutputId(id);
        output.info.name = format!("DP-{id}");
        output.info.vendor = Some(String::from("DEL"));
        output.info.product = Some(String::from("U2720Q"));
        output.info.serial = serial.map(String::from);
        Monitor::new_normal(output)
    };

    let a = identified(1, Some("ABC123"));
    let same_on_other_port = identified(2, Some("ABC123"));
    let other = identified(1, Some("XYZ789"));
    let unknown = identified(1, None);
    let unknown_same_port = identified(1, None);
    let unknown_other_port = identified(2, None);

    assert_eq!(unknown.spec().serial, "unknown");
    assert!(a.is_same_as(&same_on_other_port));
    assert!(!a.is_same_as(&other));
    assert!(!a.is_same_as(&unknown));
    assert!(unknown.is_same_as(&unknown_same_port));
    assert!(!unknown.is_same_as(&unknown_other_port));
}

#[test]
fn configured_modes() {
    let monitor = Monitor::new_normal(laptop_panel());
    let resolve = |mode: Option<&str>| {
        let config = meridian_config::Output {
            name: String::from("DP-1"),
            off: false,
            mode: mode.map(String::from),
        };
        monitor
            .resolve_configured_mode(Some(&config))
            .map(|m| m.id.clone())
    };

    let preferred = Some(String::from("1920x1080@60.000"));
    assert_eq!(
        monitor.resolve_configured_mode(None).map(|m| m.id.clone()),
        preferred
    );
    assert_eq!(resolve(None), preferred);
    assert_eq!(resolve(Some("1920x1080@75")), Some(String::from("1920x1080@75.000")));
    assert_eq!(resolve(Some("1920x1080")), Some(String::from("1920x1080@75.000")));
    assert_eq!(resolve(Some("1280x720")), Some(String::from("1280x720@60.000")));
    assert_eq!(resolve(Some("1280x720@144")), preferred);
    assert_eq!(resolve(Some("fullhd")), preferred);
}

#[test]
fn laptop_default_scale() {
    let mut output = laptop_panel();
    output.info.width_mm = 310;
    output.info.height_mm = 174;
    let monitor = Monitor::new_normal(output);
    let mode = monitor.preferred_mode().unwrap();

    let selector = ScaleSelector::new(ScalesConstraint::None);
    assert_eq!(monitor.calculate_mode_scale(mode, &selector), 1.25);

    let selector = ScaleSelector::new(ScalesConstraint::NoFractional);
    assert_eq!(monitor.calculate_mode_scale(mode, &selector), 1.);
    assert_eq!(monitor.supported_scales(mode, &selector), vec![1., 2.]);
}

proptest! {
    #[test]
    fn generated_mode_ids_are_unique(
        modes in prop::collection::vec(
            (1i32..5000, 1i32..5000, 1u32..240_000, any::<bool>()),
            1..24,
        ),
        preferred in any::<prop::sample::Index>(),
    ) {
        let crtc_modes: Vec<_> = modes
            .iter()
            .enumerate()
            .map(|(idx, &(w, h, rate, interlaced))| {
                let flags = if interlaced {
                    CrtcModeFlags::INTERLACE | CrtcModeFlags::PHSYNC
                } else {
                    CrtcModeFlags::NHSYNC
                };
                with_flags(mode(idx as u64, w, h, rate as f32 / 1000.), flags)
            })
            .collect();
        let preferred = preferred.index(crtc_modes.len()) as u64;
        let catalog = ModeCatalog::generate_untiled_modes(&output(1, crtc_modes, Some(preferred)));

        let mut ids = HashSet::new();
        for mode in catalog.modes() {
            prop_assert!(ids.insert(mode.id.clone()));
            prop_assert_eq!(&mode.id, &mode.spec.generate_id());
        }

        let preferred_mode = catalog.preferred_mode();
        prop_assert!(preferred_mode.is_some());
        prop_assert_eq!(
            preferred_mode.and_then(|m| m.crtc_modes[0].crtc_mode),
            Some(CrtcModeId(preferred))
        );
    }

    #[test]
    fn tiled_modes_assign_every_tile(columns in 1u32..5, rows in 1u32..4) {
        let mut outputs = Vec::new();
        for v in 0..rows {
            for h in 0..columns {
                let id = u64::from(v * columns + h) + 1;
                outputs.push(tile(
                    output(
                        id,
                        vec![mode(id * 10, 1280, 720, 60.), mode(id * 10 + 1, 1280, 720, 30.)],
                        Some(id * 10),
                    ),
                    (h, v),
                    (1280, 720),
                ));
            }
        }

        let n_outputs = outputs.len();
        let monitor = Monitor::new_tiled(outputs).unwrap();
        prop_assert_eq!(monitor.modes().len(), 2);
        for mode in monitor.modes() {
            prop_assert!(mode.is_tiled);
            prop_assert_eq!(mode.crtc_modes.len(), n_outputs);
            prop_assert_eq!(mode.spec.width, 1280 * columns as i32);
            prop_assert_eq!(mode.spec.height, 720 * rows as i32);
        }
    }
}
