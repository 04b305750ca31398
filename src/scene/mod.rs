//! The scene: outputs, views, layer surfaces, seats and the stacking order.
//!
//! [`Scene`] is the single owner of everything on screen. Everything else refers to scene
//! objects by id, and learns about changes through [`Scene::take_events`] and
//! [`Scene::take_client_requests`]. All methods run on the event loop thread.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use pocketwm_config::Config;

mod arrange;
mod damage;
mod frame_callbacks;
mod layer;
mod output;
mod render;
mod seat;
mod stacking;
mod surface;
mod types;
mod view;
mod view_ops;

#[cfg(test)]
mod tests;

pub use self::arrange::solve_layer_geometry;
pub use self::damage::OutputDamage;
pub use self::layer::{Anchor, Layer, LayerSurface, LayerSurfaceState, Margins};
pub use self::output::{Output, OutputInfo};
pub use self::render::{OutputBackend, SurfaceElement};
pub use self::seat::{DragIcon, Seat};
pub use self::surface::{Surface, SurfaceRole, SurfaceState};
pub use self::types::*;
pub use self::view::{SavedState, TileDirection, View, ViewState};

/// Who a surface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceOwner {
    View(ViewId),
    Layer(LayerSurfaceId),
    DragIcon(SeatId),
}

pub struct Scene {
    config: Rc<RefCell<Config>>,
    /// Outputs in layout order.
    outputs: Vec<Output>,
    views: HashMap<ViewId, View>,
    /// Mapped views, topmost first.
    stacking: Vec<ViewId>,
    layer_surfaces: HashMap<LayerSurfaceId, LayerSurface>,
    seats: Vec<Seat>,
    last_active_seat: Option<SeatId>,
    events: Vec<SceneEvent>,
    client_requests: Vec<ClientRequest>,
}

impl Scene {
    pub fn new(config: Rc<RefCell<Config>>) -> Self {
        Self {
            config,
            outputs: Vec::new(),
            views: HashMap::new(),
            stacking: Vec::new(),
            layer_surfaces: HashMap::new(),
            seats: Vec::new(),
            last_active_seat: None,
            events: Vec::new(),
            client_requests: Vec::new(),
        }
    }

    pub fn config(&self) -> &Rc<RefCell<Config>> {
        &self.config
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> + '_ {
        self.outputs.iter()
    }

    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id() == id)
    }

    fn output_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.outputs.iter_mut().find(|o| o.id() == id)
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    /// Mapped views, topmost first.
    pub fn stacking_order(&self) -> &[ViewId] {
        &self.stacking
    }

    pub fn layer_surface(&self, id: LayerSurfaceId) -> Option<&LayerSurface> {
        self.layer_surfaces.get(&id)
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id() == id)
    }

    fn seat_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id() == id)
    }

    /// Drains the notifications queued since the last call.
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drains the client messages queued since the last call.
    pub fn take_client_requests(&mut self) -> Vec<ClientRequest> {
        std::mem::take(&mut self.client_requests)
    }

    fn emit(&mut self, event: SceneEvent) {
        trace!("scene event: {event:?}");
        self.events.push(event);
    }

    fn send(&mut self, request: ClientRequest) {
        self.client_requests.push(request);
    }

    // =========================================================================
    // Surfaces
    // =========================================================================

    fn surface_owner(&self, surface: SurfaceId) -> Option<SurfaceOwner> {
        let view = self.views.values().find(|view| {
            view.surface
                .as_ref()
                .is_some_and(|root| root.contains(surface))
        });
        if let Some(view) = view {
            return Some(SurfaceOwner::View(view.id()));
        }

        let layer = self
            .layer_surfaces
            .values()
            .find(|layer| layer.surface.contains(surface));
        if let Some(layer) = layer {
            return Some(SurfaceOwner::Layer(layer.id()));
        }

        self.seats
            .iter()
            .find(|seat| {
                seat.drag_icon()
                    .is_some_and(|icon| icon.surface.contains(surface))
            })
            .map(|seat| SurfaceOwner::DragIcon(seat.id()))
    }

    fn owner_tree(&self, owner: SurfaceOwner) -> Option<&Surface> {
        match owner {
            SurfaceOwner::View(id) => self.views.get(&id)?.surface.as_ref(),
            SurfaceOwner::Layer(id) => Some(&self.layer_surfaces.get(&id)?.surface),
            SurfaceOwner::DragIcon(id) => Some(&self.seat(id)?.drag_icon()?.surface),
        }
    }

    fn owner_tree_mut(&mut self, owner: SurfaceOwner) -> Option<&mut Surface> {
        match owner {
            SurfaceOwner::View(id) => self.views.get_mut(&id)?.surface.as_mut(),
            SurfaceOwner::Layer(id) => Some(&mut self.layer_surfaces.get_mut(&id)?.surface),
            SurfaceOwner::DragIcon(id) => Some(&mut self.seat_mut(id)?.drag_icon_mut()?.surface),
        }
    }

    /// Applies a client commit to any surface known to the scene.
    ///
    /// Commits to surfaces the scene does not know (not yet mapped, or already destroyed) are
    /// ignored.
    pub fn commit_surface(&mut self, surface: SurfaceId, state: SurfaceState) {
        let _span = tracy_client::span!("Scene::commit_surface");

        let Some(owner) = self.surface_owner(surface) else {
            trace!("ignoring commit to unknown {surface}");
            return;
        };
        let Some(tree) = self.owner_tree(owner) else {
            return;
        };
        let is_root = tree.id() == surface;
        let size_changed = tree
            .find(surface)
            .is_some_and(|target| target.size() != state.size);

        match owner {
            SurfaceOwner::Layer(layer) if is_root => {
                self.handle_layer_root_commit(layer, state);
            }
            _ => {
                // Damage the old footprint before it is forgotten.
                if size_changed {
                    self.damage_owner_whole(owner);
                }
                if let Some(target) = self.owner_tree_mut(owner).and_then(|t| t.find_mut(surface)) {
                    target.commit(state);
                }

                match owner {
                    SurfaceOwner::View(view) if is_root => self.handle_view_root_commit(view),
                    _ if size_changed => self.damage_owner_whole(owner),
                    SurfaceOwner::View(view) => self.damage_view_from_commit(view),
                    SurfaceOwner::Layer(layer) => self.damage_layer_from_commit(layer),
                    SurfaceOwner::DragIcon(seat) => self.damage_drag_icon(seat),
                }
            }
        }
    }

    /// Adds a sub-surface or popup under `parent`, which must already be in the scene.
    pub fn add_child_surface(&mut self, parent: SurfaceId, child: Surface) {
        let Some(owner) = self.surface_owner(parent) else {
            debug!("ignoring child {} of unknown {parent}", child.id());
            return;
        };
        let Some(tree) = self.owner_tree_mut(owner) else {
            return;
        };
        if tree.add_child(parent, child).is_err() {
            return;
        }
        self.damage_owner_whole(owner);
    }

    /// Removes a sub-surface or popup along with its own children.
    pub fn remove_child_surface(&mut self, surface: SurfaceId) {
        let Some(owner) = self.surface_owner(surface) else {
            return;
        };

        // Damage while the surface is still part of the tree.
        self.damage_owner_whole(owner);
        if let Some(tree) = self.owner_tree_mut(owner) {
            if tree.id() == surface {
                warn!("refusing to remove root {surface} as a child surface");
                return;
            }
            tree.remove_child(surface);
        }
    }

    fn damage_owner_whole(&mut self, owner: SurfaceOwner) {
        match owner {
            SurfaceOwner::View(id) => self.damage_whole_view(id),
            SurfaceOwner::Layer(id) => self.damage_whole_layer(id),
            SurfaceOwner::DragIcon(id) => self.damage_drag_icon(id),
        }
    }
}
