//! View lifecycle and window management requests.
//!
//! Geometry changes go through [`Scene::configure_view_geometry`]. Protocols that acknowledge
//! configures get the new size first and the position once they commit a matching buffer, so
//! that a view resized from its left or top edge does not jump. Everything else is applied right
//! away.

use smithay::utils::{Logical, Point, Rectangle, Size};

use super::view::PendingMoveResize;
use super::{
    ClientRequest, Direction, OutputId, Scene, SceneEvent, Surface, SurfaceState, TileDirection,
    View, ViewId, ViewState,
};
use crate::window::{Toplevel, ToplevelSurface};

// =============================================================================
// Lifecycle
// =============================================================================

impl Scene {
    /// Creates an unmapped view for a new toplevel.
    pub fn add_view(&mut self, toplevel: Toplevel) -> ViewId {
        let id = ViewId::next();
        debug!("new {} view {id}", toplevel.protocol_name());
        self.views.insert(id, View::new(id, toplevel));
        id
    }

    /// Maps a view with its root surface and puts it on top.
    pub fn map_view(&mut self, id: ViewId, surface: Surface) {
        let _span = tracy_client::span!("Scene::map_view");

        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if view.is_mapped() {
            warn!("{id} is already mapped");
            return;
        }

        let size = view.toplevel.window_geometry(surface.size()).size;
        view.geometry.size = size;
        view.surface = Some(surface);

        self.stacking.insert(0, id);
        self.damage_whole_view(id);
        self.emit(SceneEvent::ViewMapped(id));

        self.auto_maximize(id);

        let seats: Vec<_> = self.seats.iter().map(|s| s.id()).collect();
        for seat in seats {
            self.focus_view(seat, Some(id));
        }

        if self.views.get(&id).is_some_and(|v| v.state == ViewState::Normal) {
            self.center_view(id);
        }
        self.update_view_scale(id);
        self.refocus_pointers();
    }

    /// Takes a view off screen. The view stays known until it is destroyed.
    pub fn unmap_view(&mut self, id: ViewId) {
        let _span = tracy_client::span!("Scene::unmap_view");

        if !self.views.get(&id).is_some_and(|v| v.is_mapped()) {
            return;
        }

        self.emit(SceneEvent::ViewUnmapped(id));
        self.damage_whole_view(id);
        self.stacking.retain(|v| *v != id);
        self.reparent_children(id);

        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        view.surface = None;
        view.pending_move_resize = None;
        view.geometry.size = Size::new(0, 0);
        if view.state == ViewState::Fullscreen {
            view.state = ViewState::Normal;
        }
        let fullscreen_output = view.fullscreen_output.take();

        if let Some(output) = fullscreen_output {
            if let Some(out) = self.output_mut(output) {
                out.fullscreen_view = None;
            }
            self.damage_whole_output(output);
        }

        self.drop_seat_focus(id);
        self.refocus_pointers();
    }

    /// Forgets a view entirely.
    pub fn destroy_view(&mut self, id: ViewId) {
        if !self.views.contains_key(&id) {
            return;
        }

        // Children go to the grandparent, so detach only afterwards.
        self.reparent_children(id);
        // Detaching from a parent cannot create a cycle.
        let _ = self.set_parent(id, None);
        self.unmap_view(id);

        // A view can be fullscreened before it was ever mapped.
        let fullscreen_output = self
            .views
            .get_mut(&id)
            .and_then(|view| view.fullscreen_output.take());
        if let Some(output) = fullscreen_output {
            if let Some(out) = self.output_mut(output) {
                if out.fullscreen_view == Some(id) {
                    out.fullscreen_view = None;
                }
            }
            self.damage_whole_output(output);
        }

        for seat in &mut self.seats {
            seat.focus_history.retain(|v| *v != id);
        }
        for view in self.views.values_mut() {
            if let Toplevel::Xwayland(x) = &mut view.toplevel {
                if x.native_parent() == Some(id) {
                    x.set_parent(None);
                }
            }
        }

        self.views.remove(&id);
        debug!("destroyed {id}");
        self.emit(SceneEvent::ViewDestroyed(id));
    }

    /// Hands the children of a view over to the view's own parent.
    fn reparent_children(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let children = std::mem::take(&mut view.children);
        let grandparent = view.parent;

        for child in &children {
            if let Some(child) = self.views.get_mut(child) {
                child.parent = grandparent;
            }
        }
        if let Some(gp) = grandparent.and_then(|p| self.views.get_mut(&p)) {
            for child in children.into_iter().rev() {
                gp.children.insert(0, child);
            }
        }
    }

    /// Moves keyboard focus off a view that went away.
    fn drop_seat_focus(&mut self, id: ViewId) {
        let mut refocus = Vec::new();
        for seat in &mut self.seats {
            seat.focus_history.retain(|v| *v != id);
            if seat.focused_view == Some(id) {
                seat.focused_view = None;
                refocus.push(seat.id());
            }
        }

        let next = self.stacking.first().copied();
        for seat in refocus {
            self.focus_view(seat, next);
        }
    }

    /// Commits the root surface of a view.
    pub fn commit_view(&mut self, id: ViewId, state: SurfaceState) {
        let Some(root) = self.views.get(&id).and_then(|v| v.surface.as_ref()).map(|s| s.id()) else {
            return;
        };
        self.commit_surface(root, state);
    }

    /// Follows up on a commit of a view's root surface.
    pub(super) fn handle_view_root_commit(&mut self, id: ViewId) {
        self.damage_view_from_commit(id);

        let Some(view) = self.views.get(&id) else {
            return;
        };
        let Some(surface) = &view.surface else {
            return;
        };
        let size = view.toplevel.window_geometry(surface.size()).size;
        self.update_size(id, size);

        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if let Some(pending) = view.pending_move_resize {
            let acked = view.toplevel.acked_serial();
            if pending.serial >= acked {
                let mut loc = view.geometry.loc;
                if pending.update_x {
                    loc.x = pending.target.loc.x + pending.target.size.w - size.w;
                }
                if pending.update_y {
                    loc.y = pending.target.loc.y + pending.target.size.h - size.h;
                }
                if pending.serial == acked {
                    view.pending_move_resize = None;
                }
                self.update_position(id, loc);
            }
        }

        self.update_view_scale(id);
    }

    /// Records that the client acknowledged a configure.
    pub fn ack_configure(&mut self, id: ViewId, serial: u32) {
        if let Some(view) = self.views.get_mut(&id) {
            view.toplevel.ack_configure(serial);
        }
    }

    /// Sets the parent of an X11 window in its own window tree.
    pub fn set_native_parent(&mut self, id: ViewId, parent: Option<ViewId>) {
        if let Some(Toplevel::Xwayland(x)) = self.views.get_mut(&id).map(|v| &mut v.toplevel) {
            x.set_parent(parent);
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

impl Scene {
    fn update_position(&mut self, id: ViewId, loc: Point<i32, Logical>) {
        if self.views.get(&id).map_or(true, |v| v.geometry.loc == loc) {
            return;
        }

        self.damage_whole_view(id);
        if let Some(view) = self.views.get_mut(&id) {
            view.geometry.loc = loc;
        }
        self.damage_whole_view(id);
    }

    fn update_size(&mut self, id: ViewId, size: Size<i32, Logical>) {
        if self.views.get(&id).map_or(true, |v| v.geometry.size == size) {
            return;
        }

        self.damage_whole_view(id);
        if let Some(view) = self.views.get_mut(&id) {
            view.geometry.size = size;
        }
        self.damage_whole_view(id);
    }

    /// Asks a view to take the given box.
    pub(super) fn configure_view_geometry(&mut self, id: ViewId, rect: Rectangle<i32, Logical>) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };

        let update_x = rect.loc.x != view.geometry.loc.x;
        let update_y = rect.loc.y != view.geometry.loc.y;

        let constrained = view.toplevel.constrain_size(rect.size);
        let mut loc = rect.loc;
        // Keep the right and bottom edges where they were asked to be.
        if update_x {
            loc.x += rect.size.w - constrained.w;
        }
        if update_y {
            loc.y += rect.size.h - constrained.h;
        }

        let states = view.toplevel_states();
        if constrained == view.geometry.size && view.pending_move_resize.is_none() {
            self.send_configure(id);
            self.update_position(id, loc);
            return;
        }

        let serial = view.toplevel.configure(constrained, states);
        view.configured_states = states;
        trace!("configuring {id} to {constrained:?}, serial {serial:?}");
        self.send(ClientRequest::ConfigureView {
            view: id,
            serial,
            size: constrained,
            states,
        });

        match serial {
            Some(serial) => {
                if let Some(view) = self.views.get_mut(&id) {
                    view.pending_move_resize = Some(PendingMoveResize {
                        serial,
                        update_x,
                        update_y,
                        target: Rectangle::new(loc, constrained),
                    });
                }
            }
            // The new size arrives with the next commit.
            None => self.update_position(id, loc),
        }
    }

    /// Sends a configure if the states changed since the last one, keeping the size.
    fn send_configure(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let states = view.toplevel_states();
        if states == view.configured_states {
            return;
        }

        let size = view.geometry.size;
        let serial = view.toplevel.configure(size, states);
        view.configured_states = states;
        self.send(ClientRequest::ConfigureView {
            view: id,
            serial,
            size,
            states,
        });
    }

    pub fn move_view(&mut self, id: ViewId, loc: Point<i32, Logical>) {
        self.update_position(id, loc);
    }

    /// Resizes a view, keeping its position. Ignored for fullscreen views.
    pub fn resize_view(&mut self, id: ViewId, size: Size<i32, Logical>) {
        let Some(view) = self.views.get(&id) else {
            return;
        };
        if view.is_fullscreen() {
            return;
        }
        let rect = Rectangle::new(view.geometry.loc, size);
        self.configure_view_geometry(id, rect);
    }

    /// Moves and resizes a view at once. Ignored for fullscreen views.
    pub fn move_resize_view(&mut self, id: ViewId, rect: Rectangle<i32, Logical>) {
        if self.views.get(&id).map_or(true, |v| v.is_fullscreen()) {
            return;
        }
        self.configure_view_geometry(id, rect);
    }

    pub fn rotate_view(&mut self, id: ViewId, rotation: f32) {
        if self.views.get(&id).map_or(true, |v| v.rotation == rotation) {
            return;
        }

        self.damage_whole_view(id);
        if let Some(view) = self.views.get_mut(&id) {
            view.rotation = rotation;
        }
        self.damage_whole_view(id);
    }

    pub fn set_view_alpha(&mut self, id: ViewId, alpha: f32) {
        let alpha = alpha.clamp(0., 1.);
        if self.views.get(&id).map_or(true, |v| v.alpha == alpha) {
            return;
        }

        if let Some(view) = self.views.get_mut(&id) {
            view.alpha = alpha;
        }
        self.damage_whole_view(id);
    }

    /// Recomputes the scale-to-fit factor of a view.
    pub(super) fn update_view_scale(&mut self, id: ViewId) {
        let scale_to_fit = self.config.borrow().scale_to_fit;
        let Some(view) = self.views.get(&id) else {
            return;
        };

        let size = view.geometry.size;
        let usable = self
            .view_output(id)
            .and_then(|o| self.output(o))
            .map(|o| o.usable_area());

        let scale = match usable {
            Some(usable) if scale_to_fit && !view.is_fullscreen() && size.w > 0 && size.h > 0 => {
                let sx = f64::from(usable.size.w) / f64::from(size.w);
                let sy = f64::from(usable.size.h) / f64::from(size.h);
                sx.min(sy).min(1.)
            }
            _ => 1.,
        };

        if view.scale == scale {
            return;
        }

        self.damage_whole_view(id);
        if let Some(view) = self.views.get_mut(&id) {
            view.scale = scale;
        }
        self.damage_whole_view(id);
    }

    /// Usable area of an output in layout coordinates.
    fn usable_area_in_layout(&self, output: OutputId) -> Option<Rectangle<i32, Logical>> {
        let output = self.output(output)?;
        let mut area = output.usable_area();
        area.loc += output.loc();
        Some(area)
    }
}

// =============================================================================
// Window management
// =============================================================================

impl Scene {
    fn want_auto_maximize(&self, id: ViewId) -> bool {
        if !self.config.borrow().auto_maximize {
            return false;
        }
        self.views
            .get(&id)
            .is_some_and(|v| v.toplevel.want_auto_maximize(v.parent.is_some()))
    }

    /// Maximizes a view if the compositor auto-maximizes it.
    pub(super) fn auto_maximize(&mut self, id: ViewId) {
        if self.want_auto_maximize(id) {
            self.maximize_view(id, true);
        }
    }

    pub fn maximize_view(&mut self, id: ViewId, maximize: bool) {
        let _span = tracy_client::span!("Scene::maximize_view");

        let Some(view) = self.views.get(&id) else {
            return;
        };
        if view.is_maximized() == maximize || view.is_fullscreen() {
            return;
        }
        if !maximize && self.want_auto_maximize(id) {
            return;
        }

        let Some(view) = self.views.get_mut(&id) else {
            return;
        };

        if maximize {
            match view.state {
                ViewState::Normal => {
                    view.saved.geometry = view.geometry;
                    view.saved.rotation = view.rotation;
                    view.saved.state = ViewState::Normal;
                }
                state => view.saved.state = state,
            }
            view.state = ViewState::Maximized;
            self.arrange_maximized(id);
            return;
        }

        match view.saved.state {
            ViewState::Tiled(direction) => {
                view.state = ViewState::Tiled(direction);
                view.saved.state = ViewState::Normal;
                self.arrange_tiled(id, direction);
            }
            _ => {
                view.state = ViewState::Normal;
                let saved = view.saved;
                self.configure_view_geometry(id, saved.geometry);
                self.rotate_view(id, saved.rotation);
            }
        }
    }

    /// Fits a maximized view to the usable area of its output.
    pub(super) fn arrange_maximized(&mut self, id: ViewId) {
        if self.views.get(&id).map_or(true, |v| v.is_fullscreen()) {
            return;
        }
        let Some(area) = self.view_output(id).and_then(|o| self.usable_area_in_layout(o)) else {
            return;
        };

        self.configure_view_geometry(id, area);
        self.rotate_view(id, 0.);
    }

    fn arrange_tiled(&mut self, id: ViewId, direction: TileDirection) {
        if self.views.get(&id).map_or(true, |v| v.is_fullscreen()) {
            return;
        }
        let Some(area) = self.view_output(id).and_then(|o| self.usable_area_in_layout(o)) else {
            return;
        };

        let x = match direction {
            TileDirection::Left => area.loc.x,
            TileDirection::Right => area.loc.x + area.size.w / 2,
        };
        let rect = Rectangle::new(
            Point::new(x, area.loc.y),
            Size::new(area.size.w / 2, area.size.h),
        );
        self.configure_view_geometry(id, rect);
        self.rotate_view(id, 0.);
    }

    /// Makes a view cover an output, or restores it.
    ///
    /// Without an explicit output the view goes fullscreen on the output it is on. A view
    /// already fullscreen on the target output is un-fullscreened first.
    pub fn set_fullscreen(&mut self, id: ViewId, fullscreen: bool, output: Option<OutputId>) {
        let _span = tracy_client::span!("Scene::set_fullscreen");

        let Some(view) = self.views.get(&id) else {
            return;
        };
        if view.is_fullscreen() == fullscreen {
            return;
        }

        if fullscreen {
            let output = output
                .filter(|o| self.output(*o).is_some())
                .or_else(|| self.view_output(id));
            let Some(output) = output else {
                return;
            };
            self.enter_fullscreen(id, output);
        } else {
            self.leave_fullscreen(id);
        }
    }

    fn enter_fullscreen(&mut self, id: ViewId, output: OutputId) {
        let Some(out) = self.output(output) else {
            return;
        };
        let geometry = out.geometry();
        let previous = out.fullscreen_view.filter(|v| *v != id);

        if let Some(previous) = previous {
            self.leave_fullscreen(previous);
        }

        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        match view.state {
            ViewState::Normal => {
                view.saved.geometry = view.geometry;
                view.saved.rotation = view.rotation;
                view.saved.state = ViewState::Normal;
            }
            state => view.saved.state = state,
        }
        view.state = ViewState::Fullscreen;
        view.fullscreen_output = Some(output);

        if let Some(out) = self.output_mut(output) {
            out.fullscreen_view = Some(id);
            out.force_shell_reveal = false;
        }

        debug!("{id} is now fullscreen on {output}");
        self.configure_view_geometry(id, geometry);
        self.rotate_view(id, 0.);
        self.update_view_scale(id);
        self.damage_whole_output(output);
    }

    fn leave_fullscreen(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let Some(output) = view.fullscreen_output.take() else {
            return;
        };
        let saved = view.saved;
        view.state = saved.state;

        if let Some(out) = self.output_mut(output) {
            if out.fullscreen_view == Some(id) {
                out.fullscreen_view = None;
            }
        }
        self.damage_whole_output(output);

        match saved.state {
            ViewState::Maximized => self.arrange_maximized(id),
            ViewState::Tiled(direction) => self.arrange_tiled(id, direction),
            ViewState::Normal | ViewState::Fullscreen => {
                if let Some(view) = self.views.get_mut(&id) {
                    view.state = ViewState::Normal;
                }
                self.configure_view_geometry(id, saved.geometry);
                self.rotate_view(id, saved.rotation);
            }
        }
        if let Some(view) = self.views.get_mut(&id) {
            if view.state != ViewState::Maximized {
                view.saved.state = ViewState::Normal;
            }
        }

        self.update_view_scale(id);
        self.auto_maximize(id);
    }

    /// Puts a view on one half of its output's usable area.
    pub fn tile_view(&mut self, id: ViewId, direction: TileDirection) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if view.is_fullscreen() {
            return;
        }

        if view.state == ViewState::Normal {
            view.saved.geometry = view.geometry;
            view.saved.rotation = view.rotation;
            view.saved.state = ViewState::Normal;
        }
        view.state = ViewState::Tiled(direction);
        self.arrange_tiled(id, direction);
    }

    /// Restores a tiled view to the box it had before tiling.
    pub fn untile_view(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if !matches!(view.state, ViewState::Tiled(_)) {
            return;
        }

        view.state = ViewState::Normal;
        let saved = view.saved;
        self.configure_view_geometry(id, saved.geometry);
        self.rotate_view(id, saved.rotation);
    }

    /// Centers a view in the usable area of the output under the active cursor.
    pub fn center_view(&mut self, id: ViewId) -> bool {
        let under_cursor = self
            .last_active_seat
            .and_then(|s| self.seat(s))
            .and_then(|seat| self.output_under(seat.cursor()))
            .map(|(output, _)| output);
        let Some(output) = under_cursor.or_else(|| self.view_output(id)) else {
            return false;
        };

        self.center_view_on(id, output)
    }

    fn center_view_on(&mut self, id: ViewId, output: OutputId) -> bool {
        let Some(area) = self.usable_area_in_layout(output) else {
            return false;
        };
        let Some(view) = self.views.get(&id) else {
            return false;
        };

        let size = view.geometry.size;
        let surface_size = view.surface.as_ref().map_or(size, |s| s.size());
        let geom = view.toplevel.window_geometry(surface_size);

        let x = f64::from(area.size.w - size.w) / 2. + f64::from(area.loc.x - geom.loc.x);
        let y = f64::from(area.size.h - size.h) / 2. + f64::from(area.loc.y - geom.loc.y);
        trace!("centering {id} at {x}, {y}");
        self.move_view(id, Point::new(x as i32, y as i32));
        true
    }

    /// Moves a view to the neighbouring output in `direction`.
    ///
    /// Maximized and tiled views are fitted to the new output, others are centered on it.
    /// Fullscreen views stay where they are.
    pub fn move_view_to_output_in(&mut self, id: ViewId, direction: Direction) -> bool {
        let Some(view) = self.views.get(&id) else {
            return false;
        };
        if view.is_fullscreen() {
            return false;
        }
        let state = view.state;

        let Some(current) = self.view_output(id) else {
            return false;
        };
        let Some(target) = self.output_in_direction(current, direction) else {
            return false;
        };
        let (Some(from), Some(to)) = (self.output(current), self.output(target)) else {
            return false;
        };
        let shift = to.loc() - from.loc();
        let Some(area) = self.usable_area_in_layout(target) else {
            return false;
        };
        debug!("moving {id} from {current} to {target}");

        match state {
            ViewState::Maximized | ViewState::Tiled(_) => {
                if let Some(view) = self.views.get_mut(&id) {
                    view.saved.geometry.loc += shift;
                }
                self.move_view(id, area.loc);
                match state {
                    ViewState::Tiled(direction) => self.arrange_tiled(id, direction),
                    _ => self.arrange_maximized(id),
                }
            }
            _ => {
                self.move_view(id, area.loc);
                self.center_view_on(id, target);
            }
        }

        self.update_view_scale(id);
        true
    }

    /// Turns server-side decorations on or off.
    pub fn set_decorated(&mut self, id: ViewId, decorated: bool) {
        if self.views.get(&id).map_or(true, |v| v.decorated == decorated) {
            return;
        }

        let (border_width, titlebar_height) = {
            let config = self.config.borrow();
            (config.decorations.border_width, config.decorations.titlebar_height)
        };

        self.damage_whole_view(id);
        if let Some(view) = self.views.get_mut(&id) {
            view.decorated = decorated;
            if decorated {
                view.border_width = border_width;
                view.titlebar_height = titlebar_height;
            } else {
                view.border_width = 0;
                view.titlebar_height = 0;
            }
        }
        self.damage_whole_view(id);
    }

    pub fn set_title(&mut self, id: ViewId, title: Option<&str>) {
        if let Some(view) = self.views.get_mut(&id) {
            view.title = title.map(str::to_owned);
        }
    }

    pub fn set_app_id(&mut self, id: ViewId, app_id: Option<&str>) {
        if let Some(view) = self.views.get_mut(&id) {
            view.app_id = app_id.map(str::to_owned);
        }
    }

    /// Asks the client to close a view, dismissing its popups first.
    pub fn close_view(&mut self, id: ViewId) {
        let Some(view) = self.views.get(&id) else {
            return;
        };

        let popups = if view.toplevel.has_popups() {
            view.surface.as_ref().map(|s| s.popups()).unwrap_or_default()
        } else {
            Vec::new()
        };
        for popup in popups {
            self.send(ClientRequest::ClosePopup(popup));
        }
        self.send(ClientRequest::CloseView(id));
    }

    /// Activates or deactivates a view without touching seat focus.
    pub fn activate_view(&mut self, id: ViewId, activate: bool) {
        self.set_view_activated(id, activate);
    }

    pub(super) fn set_view_activated(&mut self, id: ViewId, activate: bool) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        view.activated = activate;
        let fullscreen_output = view.fullscreen_output;

        self.send_configure(id);

        if activate {
            if let Some(out) = fullscreen_output.and_then(|o| self.output_mut(o)) {
                out.force_shell_reveal = false;
            }
        }
    }
}
