use super::*;

const ALL: Anchor = Anchor::all();

#[test]
fn view_surface_hit_in_local_coordinates() {
    let mut f = Fixture::new();
    let (view, root) = f.add_view(400, 300);
    assert_eq!(f.view(view).geometry(), rect(300, 250, 400, 300));

    let hit = f.scene.contents_under(Point::new(310., 270.));
    assert_eq!(hit.output, Some(f.output));
    assert_eq!(hit.view, Some(view));
    assert_eq!(hit.surface, Some((root, Point::new(10., 20.))));
    assert_eq!(hit.layer, None);

    let miss = f.scene.contents_under(Point::new(10., 10.));
    assert!(miss.is_empty());
    assert_eq!(miss.output, Some(f.output));

    let outside = f.scene.contents_under(Point::new(-10., 10.));
    assert_eq!(outside, PointContents::default());
}

#[test]
fn exclusive_overlay_beats_view() {
    let mut f = Fixture::new();
    let (view, _) = f.add_view(400, 300);

    let state = layer_state(Layer::Overlay, Anchor::TOP | Anchor::LEFT | Anchor::RIGHT, 100, (0, 300));
    let (overlay, overlay_surface) = f.add_layer("notifications", state);

    let hit = f.scene.contents_under(Point::new(500., 270.));
    assert_eq!(hit.layer, Some(overlay));
    assert_eq!(hit.view, None);
    assert_eq!(hit.surface, Some((overlay_surface, Point::new(500., 270.))));

    let hit = f.scene.contents_under(Point::new(500., 400.));
    assert_eq!(hit.view, Some(view));
}

#[test]
fn topmost_view_wins() {
    let mut f = Fixture::new();
    let (below, _) = f.add_view(400, 300);
    let (above, _) = f.add_view(400, 300);

    assert_eq!(f.scene.stacking_order(), &[above, below]);
    assert_eq!(f.scene.view_under_point(Point::new(500., 400.)), Some(above));

    f.scene.raise_view(below);
    assert_eq!(f.scene.view_under_point(Point::new(500., 400.)), Some(below));
}

#[test]
fn layers_below_views_are_hit_last() {
    let mut f = Fixture::new();
    let (wallpaper, _) = f.add_layer("wallpaper", layer_state(Layer::Background, ALL, 0, (0, 0)));
    let (dock, _) = f.add_layer("dock", layer_state(Layer::Bottom, Anchor::BOTTOM, 0, (200, 50)));
    let (view, _) = f.add_view(400, 300);

    assert_eq!(f.scene.contents_under(Point::new(500., 400.)).view, Some(view));
    assert_eq!(f.scene.contents_under(Point::new(500., 790.)).layer, Some(dock));
    assert_eq!(f.scene.contents_under(Point::new(10., 10.)).layer, Some(wallpaper));
}

#[test]
fn within_a_layer_exclusive_surfaces_come_first() {
    let mut f = Fixture::new();
    let (old, _) = f.add_layer("old", layer_state(Layer::Top, ALL, 0, (0, 0)));
    let (new, _) = f.add_layer("new", layer_state(Layer::Top, ALL, 0, (0, 0)));

    // Oldest first among surfaces without an exclusive zone.
    assert_eq!(f.scene.contents_under(Point::new(500., 400.)).layer, Some(old));
    assert_ne!(old, new);

    let panel_state = layer_state(Layer::Top, Anchor::TOP | Anchor::LEFT | Anchor::RIGHT, 30, (0, 30));
    let (panel_a, _) = f.add_layer("panel-a", panel_state.clone());
    let (panel_b, _) = f.add_layer("panel-b", panel_state);

    // The newer panel claims the top edge, the older one goes below it.
    assert_eq!(f.scene.contents_under(Point::new(500., 10.)).layer, Some(panel_b));
    assert_eq!(f.scene.contents_under(Point::new(500., 40.)).layer, Some(panel_a));
}

#[test]
fn fullscreen_view_hides_everything_below() {
    let mut f = Fixture::new();
    f.add_layer("wallpaper", layer_state(Layer::Background, ALL, 0, (0, 0)));
    let (panel, _) = f.add_layer(
        "panel",
        layer_state(Layer::Top, Anchor::TOP | Anchor::LEFT | Anchor::RIGHT, 30, (0, 30)),
    );

    let (below, _) = f.add_view(400, 300);
    f.scene.move_view(below, Point::new(0, 0));
    assert_eq!(f.scene.contents_under(Point::new(100., 100.)).view, Some(below));

    let toplevel = XdgToplevel::with_size_limits(Size::new(0, 0), Size::new(500, 400));
    let (game, _) = f.map(Toplevel::Xdg(toplevel), 400, 300);
    f.scene.set_fullscreen(game, true, None);
    f.settle();
    assert_eq!(f.view(game).geometry(), rect(500, 400, 500, 400));

    let hit = f.scene.contents_under(Point::new(600., 500.));
    assert_eq!(hit.view, Some(game));

    // Nothing below shows through.
    let hit = f.scene.contents_under(Point::new(100., 10.));
    assert!(hit.is_empty());
    assert_eq!(hit.output, Some(f.output));
    let hit = f.scene.contents_under(Point::new(100., 100.));
    assert!(hit.is_empty());
    assert_eq!(hit.view, None);

    f.scene.set_force_shell_reveal(f.output, true);
    let hit = f.scene.contents_under(Point::new(100., 10.));
    assert_eq!(hit.layer, Some(panel));
}

#[test]
fn decoration_is_hit_around_the_view() {
    let mut f = Fixture::new();
    let (view, _) = f.add_view(400, 300);
    f.scene.set_decorated(view, true);

    let hit = f.scene.contents_under(Point::new(500., 245.));
    assert_eq!(hit.view, Some(view));
    assert_eq!(hit.surface, None);
    assert_eq!(hit.decoration, DecoPart::TITLEBAR);

    let hit = f.scene.contents_under(Point::new(298., 400.));
    assert_eq!(hit.decoration, DecoPart::LEFT_BORDER);

    let hit = f.scene.contents_under(Point::new(500., 400.));
    assert!(hit.decoration.is_empty());
    assert!(hit.surface.is_some());
}

#[test]
fn popups_extend_views() {
    let mut f = Fixture::new();
    let (view, root) = f.add_view(400, 300);

    let popup = Surface::with_role(
        SurfaceId::next(),
        SurfaceRole::Popup,
        Point::new(350, 250),
        SurfaceState::with_size(Size::new(100, 100)),
    );
    let popup_id = popup.id();
    f.scene.add_child_surface(root, popup);

    // Past the bottom right corner of the view.
    let hit = f.scene.contents_under(Point::new(720., 580.));
    assert_eq!(hit.view, Some(view));
    assert_eq!(hit.surface, Some((popup_id, Point::new(70., 80.))));
}

#[test]
fn fullscreen_view_has_no_decoration() {
    let mut f = Fixture::new();
    let toplevel = XdgToplevel::with_size_limits(Size::new(0, 0), Size::new(500, 400));
    let (game, _) = f.map(Toplevel::Xdg(toplevel), 400, 300);
    f.scene.set_decorated(game, true);
    f.scene.set_fullscreen(game, true, None);
    f.settle();
    assert_eq!(f.view(game).geometry(), rect(500, 400, 500, 400));
    assert!(!f.view(game).shows_decoration());

    // Where the titlebar would be.
    let hit = f.scene.contents_under(Point::new(600., 397.));
    assert_eq!(hit.view, None);
    assert!(hit.decoration.is_empty());

    f.scene.set_fullscreen(game, false, None);
    f.settle();
    assert!(f.view(game).shows_decoration());
}
