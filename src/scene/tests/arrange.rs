use super::*;

fn top_panel(height: i32) -> LayerSurfaceState {
    layer_state(
        Layer::Top,
        Anchor::TOP | Anchor::LEFT | Anchor::RIGHT,
        height,
        (0, height),
    )
}

#[test]
fn top_panel_reserves_space() {
    let mut f = Fixture::new();
    let (panel, _) = f.add_layer("panel", top_panel(40));

    assert_eq!(f.output().usable_area(), rect(0, 40, 1000, 760));
    assert_eq!(f.scene.layer_surface(panel).unwrap().geometry(), rect(0, 0, 1000, 40));

    let events = f.scene.take_events();
    assert!(events.contains(&SceneEvent::UsableAreaChanged {
        output: f.output,
        area: rect(0, 40, 1000, 760),
    }));
}

#[test]
fn maximized_view_fills_usable_area() {
    let mut f = Fixture::new();
    f.add_layer("panel", top_panel(40));

    let (view, _) = f.add_view(400, 300);
    f.scene.maximize_view(view, true);
    f.settle();

    assert_eq!(f.view(view).geometry(), rect(0, 40, 1000, 760));
}

#[test]
fn maximized_views_follow_usable_area() {
    let mut f = Fixture::new();
    f.scene.set_output_position(f.output, Point::new(200, 100));

    let (view, _) = f.add_view(400, 300);
    f.scene.maximize_view(view, true);
    f.settle();
    assert_eq!(f.view(view).geometry(), rect(200, 100, 1000, 800));

    f.add_layer("panel", top_panel(40));
    f.settle();
    assert_eq!(f.view(view).geometry(), rect(200, 140, 1000, 760));
}

#[test]
fn exclusive_zones_add_up_most_recent_first() {
    let mut f = Fixture::new();
    let (first, _) = f.add_layer("first", top_panel(40));
    let (second, _) = f.add_layer("second", top_panel(20));

    assert_eq!(f.output().usable_area(), rect(0, 60, 1000, 740));

    // The most recent surface claims its edge first.
    let geometry = |id| f.scene.layer_surface(id).unwrap().geometry();
    assert_eq!(geometry(second), rect(0, 0, 1000, 20));
    assert_eq!(geometry(first), rect(0, 20, 1000, 40));
}

#[test]
fn ignoring_exclusive_zones_uses_the_whole_output() {
    let mut f = Fixture::new();
    f.add_layer("panel", top_panel(40));

    let all = Anchor::TOP | Anchor::BOTTOM | Anchor::LEFT | Anchor::RIGHT;
    let (lock, _) = f.add_layer("lock", layer_state(Layer::Overlay, all, -1, (0, 0)));
    let (wallpaper, _) = f.add_layer("wallpaper", layer_state(Layer::Background, all, 0, (0, 0)));

    let geometry = |id| f.scene.layer_surface(id).unwrap().geometry();
    assert_eq!(geometry(lock), rect(0, 0, 1000, 800));
    assert_eq!(geometry(wallpaper), rect(0, 40, 1000, 760));
}

#[test]
fn surfaces_without_room_are_closed_once() {
    let mut f = Fixture::new();

    let mut state = layer_state(Layer::Top, Anchor::LEFT | Anchor::RIGHT, 0, (0, 50));
    state.margin.left = 600;
    state.margin.right = 600;
    let id = f
        .scene
        .add_layer_surface("wide", Some(f.output), state, surface(1, 1))
        .unwrap();
    f.scene.map_layer_surface(id);
    f.scene.unmap_layer_surface(id);

    let closes = f
        .scene
        .take_client_requests()
        .into_iter()
        .filter(|r| *r == ClientRequest::CloseLayerSurface(id))
        .count();
    assert_eq!(closes, 1);
}

#[test]
fn arrangement_configures_new_sizes_only() {
    let mut f = Fixture::new();
    let (panel, _) = f.add_layer("panel", top_panel(40));

    let configures = |requests: Vec<ClientRequest>| {
        requests
            .into_iter()
            .filter(|r| matches!(r, ClientRequest::ConfigureLayerSurface { .. }))
            .collect::<Vec<_>>()
    };
    assert_eq!(
        configures(f.scene.take_client_requests()),
        vec![ClientRequest::ConfigureLayerSurface {
            layer: panel,
            size: Size::new(1000, 40),
        }]
    );

    // Same size again: nothing to tell the client.
    f.scene.set_output_position(f.output, Point::new(0, 0));
    f.scene.toggle_outputs_blank();
    assert!(!f.output().is_enabled());
    f.scene.toggle_outputs_blank();
    assert!(configures(f.scene.take_client_requests()).is_empty());

    f.scene.set_output_mode(f.output, Size::new(1200, 800));
    assert_eq!(
        configures(f.scene.take_client_requests()),
        vec![ClientRequest::ConfigureLayerSurface {
            layer: panel,
            size: Size::new(1200, 40),
        }]
    );
}

#[test]
fn keyboard_interactive_surface_takes_focus() {
    let mut f = Fixture::new();
    let (view, _) = f.add_view(400, 300);
    assert_eq!(f.scene.seat(f.seat).unwrap().focused_view(), Some(view));
    f.scene.take_events();

    let mut state = layer_state(Layer::Overlay, Anchor::BOTTOM, 0, (300, 200));
    state.keyboard_interactive = true;
    let (dialog, _) = f.add_layer("dialog", state);

    let seat = f.scene.seat(f.seat).unwrap();
    assert_eq!(seat.focused_layer(), Some(dialog));
    assert_eq!(seat.focused_view(), None);
    assert!(!f.view(view).is_activated());
    assert!(f.scene.take_events().contains(&SceneEvent::KeyboardFocusLayer {
        seat: f.seat,
        layer: Some(dialog),
    }));

    f.scene.unmap_layer_surface(dialog);

    let seat = f.scene.seat(f.seat).unwrap();
    assert_eq!(seat.focused_layer(), None);
    assert_eq!(seat.focused_view(), Some(view));
    assert!(f.view(view).is_activated());
}

#[test]
fn overlay_focus_wins_over_top() {
    let mut f = Fixture::new();

    let mut top = layer_state(Layer::Top, Anchor::BOTTOM, 0, (300, 200));
    top.keyboard_interactive = true;
    let (_, _) = f.add_layer("launcher", top);

    let mut overlay = layer_state(Layer::Overlay, Anchor::TOP, 0, (300, 200));
    overlay.keyboard_interactive = true;
    let (prompt, _) = f.add_layer("prompt", overlay);

    assert_eq!(f.scene.seat(f.seat).unwrap().focused_layer(), Some(prompt));
}

#[test]
fn osk_is_raised_above_focused_layer() {
    let mut f = Fixture::new();

    let mut prompt = layer_state(Layer::Overlay, Anchor::TOP, 0, (300, 200));
    prompt.keyboard_interactive = true;
    f.add_layer("prompt", prompt);

    let osk_state = layer_state(
        Layer::Top,
        Anchor::BOTTOM | Anchor::LEFT | Anchor::RIGHT,
        0,
        (0, 300),
    );
    let (osk, _) = f.add_layer("osk", osk_state);

    let osk_surface = f.scene.layer_surface(osk).unwrap();
    assert_eq!(osk_surface.layer(), Layer::Overlay);
    assert_eq!(osk_surface.state().layer, Layer::Top);
    assert!(f.output().layer_surfaces(Layer::Overlay).contains(&osk));
    assert!(!f.output().layer_surfaces(Layer::Top).contains(&osk));
}

#[test]
fn destroyed_layer_gives_space_back() {
    let mut f = Fixture::new();
    let (panel, _) = f.add_layer("panel", top_panel(40));
    f.scene.destroy_layer_surface(panel);

    assert_eq!(f.output().usable_area(), rect(0, 0, 1000, 800));
    assert!(f.scene.layer_surface(panel).is_none());
    assert!(f.output().layer_surfaces(Layer::Top).is_empty());
}

#[test]
fn outputless_layer_surface_goes_under_cursor() {
    let mut f = Fixture::new();
    let second = f.scene.add_output(output_info("HDMI-A-1", 800, 600));
    assert_eq!(f.scene.output(second).unwrap().loc(), Point::new(1000, 0));

    f.scene.set_cursor_position(f.seat, Point::new(1200., 100.));
    let id = f
        .scene
        .add_layer_surface("panel", None, top_panel(30), surface(1, 1))
        .unwrap();
    assert_eq!(f.scene.layer_surface(id).unwrap().output(), second);
}

#[test]
fn removing_output_closes_its_layer_surfaces() {
    let mut f = Fixture::new();
    let (panel, _) = f.add_layer("panel", top_panel(40));
    f.scene.take_client_requests();

    f.scene.remove_output(f.output);

    assert!(f.scene.layer_surface(panel).is_none());
    assert!(f
        .scene
        .take_client_requests()
        .contains(&ClientRequest::CloseLayerSurface(panel)));
}
