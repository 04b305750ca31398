use insta::assert_snapshot;

use super::*;

const ALL: Anchor = Anchor::all();

fn frame_done(requests: Vec<ClientRequest>) -> Vec<SurfaceId> {
    requests
        .into_iter()
        .filter_map(|r| match r {
            ClientRequest::FrameDone { surface, time } => {
                assert_eq!(time, FRAME_TIME);
                Some(surface)
            }
            _ => None,
        })
        .collect()
}

/// A fullscreen view above a normal view, a wallpaper and a panel.
fn fullscreen_fixture(backend: &mut TestBackend) -> (Fixture, ViewId) {
    let mut f = Fixture::new();
    let (_, below) = f.add_view(400, 300);
    backend.name(below, "below");
    let (_, wallpaper) = f.add_layer("wallpaper", layer_state(Layer::Background, ALL, 0, (0, 0)));
    let (_, panel) = f.add_layer(
        "panel",
        layer_state(Layer::Top, Anchor::TOP | Anchor::LEFT | Anchor::RIGHT, 30, (0, 30)),
    );
    let (game, game_root) = f.add_view(400, 300);
    f.scene.set_fullscreen(game, true, None);
    f.settle();

    backend.name(wallpaper, "wallpaper");
    backend.name(panel, "panel");
    backend.name(game_root, "game");
    (f, game)
}

#[test]
fn paints_bottom_to_top() {
    let mut f = Fixture::new();
    let mut backend = TestBackend::default();

    let (app, app_root) = f.add_view(400, 300);
    f.scene.set_decorated(app, true);
    let (_, wallpaper) = f.add_layer("wallpaper", layer_state(Layer::Background, ALL, 0, (0, 0)));
    let (_, panel) = f.add_layer(
        "panel",
        layer_state(Layer::Top, Anchor::TOP | Anchor::LEFT | Anchor::RIGHT, 30, (0, 30)),
    );
    let (_, notification) = f.add_layer(
        "notification",
        layer_state(Layer::Overlay, Anchor::TOP, 0, (300, 100)),
    );

    let icon = surface(32, 32);
    let icon_id = icon.id();
    f.scene.set_cursor_position(f.seat, Point::new(500., 500.));
    f.scene.set_drag_icon(f.seat, Some(DragIcon::new(icon, Point::new(0, 0))));

    backend.name(app_root, "app");
    backend.name(wallpaper, "wallpaper");
    backend.name(panel, "panel");
    backend.name(notification, "notification");
    backend.name(icon_id, "icon");

    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert_snapshot!(backend.log(), @r"
    begin 1000x800
    clear 0,0 1000x800 [0.0, 0.0, 0.0, 1.0]
    surface wallpaper
    decoration 296,234 408x320
    surface app
    surface panel
    surface icon
    surface notification
    cursors
    end
    commit 0,0 1000x800
    ");

    // Nothing changed since: commit without painting.
    let mut backend = TestBackend::default();
    assert_eq!(f.render(&mut backend), RenderResult::NoDamage);
    assert_snapshot!(backend.log(), @"commit -");
}

#[test]
fn repaints_only_damage() {
    let mut f = Fixture::new();
    let (app, app_root) = f.add_view(400, 300);
    let (other, other_root) = f.add_view(100, 100);
    f.scene.move_view(other, Point::new(0, 0));
    f.flush();

    let mut backend = TestBackend::default();
    backend.name(app_root, "app");
    backend.name(other_root, "other");

    f.scene.move_view(app, Point::new(310, 250));
    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert_snapshot!(backend.log(), @r"
    begin 1000x800
    clear 300,250 400x300 + 310,250 400x300 [0.0, 0.0, 0.0, 1.0]
    surface app
    cursors
    end
    commit 300,250 400x300 + 310,250 400x300
    ");

    let element = backend
        .ops
        .iter()
        .find_map(|op| match op {
            BackendOp::Surface(element) => Some(element.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        element,
        SurfaceElement {
            surface: app_root,
            dst: prect(310, 250, 400, 300),
            rotation: 0.,
            alpha: 1.,
            transform: Transform::Normal,
        }
    );
}

#[test]
fn views_carry_rotation_and_alpha() {
    let mut f = Fixture::new();
    let (app, app_root) = f.add_view(400, 300);
    f.scene.rotate_view(app, 0.25);
    f.scene.set_view_alpha(app, 0.5);

    let mut backend = TestBackend::default();
    f.render(&mut backend);

    let element = backend
        .ops
        .iter()
        .find_map(|op| match op {
            BackendOp::Surface(element) => Some(element.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(element.surface, app_root);
    assert_eq!(element.dst, prect(300, 250, 400, 300));
    approx::assert_abs_diff_eq!(element.rotation, 0.25);
    approx::assert_abs_diff_eq!(element.alpha, 0.5);
}

#[test]
fn rotated_output_commits_native_damage() {
    let mut f = Fixture::new();
    f.scene.set_output_transform(f.output, Transform::_90);
    assert_eq!(f.output().size(), Size::new(800, 1000));

    let mut backend = TestBackend::default();
    f.render(&mut backend);
    assert_snapshot!(backend.log(), @r"
    begin 800x1000
    clear 0,0 800x1000 [0.0, 0.0, 0.0, 1.0]
    cursors
    end
    commit 0,0 1000x800
    ");
}

#[test]
fn fullscreen_view_is_scanned_out() {
    let mut backend = TestBackend::scanning_out();
    let (mut f, _) = fullscreen_fixture(&mut backend);

    assert_eq!(f.render(&mut backend), RenderResult::ScannedOut);
    assert_snapshot!(backend.log(), @"scanout game");
    assert!(f.damage().is_empty());
}

#[test]
fn overlay_blocks_scanout() {
    let mut backend = TestBackend::scanning_out();
    let (mut f, _) = fullscreen_fixture(&mut backend);
    assert_eq!(f.render(&mut backend), RenderResult::ScannedOut);

    let (_, osd) = f.add_layer("osd", layer_state(Layer::Overlay, Anchor::TOP, 0, (200, 50)));
    backend.name(osd, "osd");
    backend.ops.clear();

    // Leaving scan-out repaints the whole output.
    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert_snapshot!(backend.log(), @r"
    begin 1000x800
    clear 0,0 1000x800 [0.0, 0.0, 0.0, 1.0]
    surface game
    surface osd
    cursors
    end
    commit 0,0 1000x800
    ");
}

#[test]
fn revealed_panel_blocks_scanout() {
    let mut backend = TestBackend::scanning_out();
    let (mut f, _) = fullscreen_fixture(&mut backend);

    f.scene.set_force_shell_reveal(f.output, true);
    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert_eq!(backend.drawn(), ["game", "panel"]);
}

#[test]
fn software_cursor_blocks_scanout() {
    let mut backend = TestBackend {
        software_cursor: true,
        ..TestBackend::scanning_out()
    };
    let (mut f, _) = fullscreen_fixture(&mut backend);

    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert!(!backend.ops.iter().any(|op| matches!(op, BackendOp::Scanout(_))));
    assert!(backend.ops.contains(&BackendOp::Cursors));
}

#[test]
fn drag_icon_blocks_scanout() {
    let mut backend = TestBackend::scanning_out();
    let (mut f, _) = fullscreen_fixture(&mut backend);

    let icon = surface(32, 32);
    backend.name(icon.id(), "icon");
    f.scene.set_drag_icon(f.seat, Some(DragIcon::new(icon, Point::new(0, 0))));

    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert_eq!(backend.drawn(), ["game", "icon"]);
}

#[test]
fn popup_blocks_scanout() {
    let mut backend = TestBackend::scanning_out();
    let (mut f, game) = fullscreen_fixture(&mut backend);
    let root = f.view(game).surface().unwrap().id();

    let popup = Surface::with_role(
        SurfaceId::next(),
        SurfaceRole::Popup,
        Point::new(10, 10),
        SurfaceState::with_size(Size::new(100, 100)),
    );
    backend.name(popup.id(), "menu");
    f.scene.add_child_surface(root, popup);

    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert_eq!(backend.drawn(), ["game", "menu"]);
}

#[test]
fn fullscreen_hides_shell_until_revealed() {
    let mut backend = TestBackend::default();
    let (mut f, _) = fullscreen_fixture(&mut backend);

    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert_eq!(backend.drawn(), ["game"]);

    backend.ops.clear();
    f.scene.set_force_shell_reveal(f.output, true);
    f.render(&mut backend);
    assert_eq!(backend.drawn(), ["game", "panel"]);
}

#[test]
fn failed_commit_keeps_damage() {
    let mut f = Fixture::new();
    f.add_view(400, 300);
    f.flush();
    f.scene.damage_whole_output(f.output);

    let mut backend = TestBackend {
        fail_commit: true,
        ..TestBackend::default()
    };
    assert_eq!(f.render(&mut backend), RenderResult::Dropped);
    assert_eq!(f.damage(), vec![prect(0, 0, 1000, 800)]);
    assert!(!f.output().damage().frame_scheduled());

    let mut backend = TestBackend::default();
    assert_eq!(f.render(&mut backend), RenderResult::Submitted);
    assert!(f.damage().is_empty());
}

#[test]
fn disabled_output_is_skipped() {
    let mut f = Fixture::new();
    f.scene.set_output_enabled(f.output, false);

    let mut backend = TestBackend::default();
    assert_eq!(f.render(&mut backend), RenderResult::Skipped);
    assert!(backend.ops.is_empty());
}

#[test]
fn damage_debugging_tints_the_whole_output() {
    let mut config = Config::default();
    config.debug.damage_tracking = true;
    let mut f = Fixture::with_config(config);
    let (app, app_root) = f.add_view(400, 300);
    f.flush();

    let mut backend = TestBackend::default();
    backend.name(app_root, "app");
    f.scene.move_view(app, Point::new(0, 0));
    f.render(&mut backend);
    assert_snapshot!(backend.log(), @r"
    begin 1000x800
    clear 0,0 1000x800 [1.0, 1.0, 0.0, 1.0]
    clear 300,250 400x300 + 0,0 400x300 [0.0, 0.0, 0.0, 1.0]
    surface app
    cursors
    end
    commit 0,0 1000x800
    ");
}

#[test]
fn frame_done_goes_to_visible_surfaces() {
    let mut f = Fixture::new();
    let (_, visible) = f.add_view(400, 300);
    let (hidden, _) = f.add_view(100, 100);
    f.scene.move_view(hidden, Point::new(1500, 0));
    let (_, panel) = f.add_layer(
        "panel",
        layer_state(Layer::Top, Anchor::TOP | Anchor::LEFT | Anchor::RIGHT, 30, (0, 30)),
    );
    f.scene.take_client_requests();

    f.render(&mut TestBackend::default());
    assert_eq!(frame_done(f.scene.take_client_requests()), vec![visible, panel]);

    // Sent even when there is nothing to paint.
    f.render(&mut TestBackend::default());
    assert_eq!(frame_done(f.scene.take_client_requests()), vec![visible, panel]);
}

#[test]
fn frame_done_skips_views_under_fullscreen() {
    let mut f = Fixture::new();
    let (_, below) = f.add_view(400, 300);
    let (game, game_root) = f.add_view(400, 300);
    f.scene.set_fullscreen(game, true, None);
    f.settle();

    f.render(&mut TestBackend::default());
    let done = frame_done(f.scene.take_client_requests());
    assert_eq!(done, vec![game_root]);
    assert!(!done.contains(&below));
}

#[test]
fn frame_done_skips_unmapped_layer_surfaces() {
    let mut f = Fixture::new();
    let (panel, panel_root) = f.add_layer(
        "panel",
        layer_state(Layer::Top, Anchor::TOP | Anchor::LEFT | Anchor::RIGHT, 30, (0, 30)),
    );
    f.scene.unmap_layer_surface(panel);
    f.scene.take_client_requests();

    f.render(&mut TestBackend::default());
    assert!(!frame_done(f.scene.take_client_requests()).contains(&panel_root));

    f.scene.map_layer_surface(panel);
    f.scene.take_client_requests();
    f.render(&mut TestBackend::default());
    assert_eq!(frame_done(f.scene.take_client_requests()), vec![panel_root]);
}
