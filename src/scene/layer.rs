//! Layer shell surfaces: panels, docks, backgrounds and the on-screen keyboard.

use bitflags::bitflags;
use smithay::utils::{Logical, Rectangle, Size};

use super::{ClientRequest, LayerSurfaceId, OutputId, Scene, SceneEvent, Surface, SurfaceState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background = 0,
    Bottom = 1,
    Top = 2,
    Overlay = 3,
}

impl Layer {
    /// Layers from the topmost down, the order in which exclusive zones are claimed.
    pub const TOP_DOWN: [Layer; 4] = [Layer::Overlay, Layer::Top, Layer::Bottom, Layer::Background];
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Anchor: u32 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// Double-buffered layer surface state set by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSurfaceState {
    pub layer: Layer,
    pub anchor: Anchor,
    /// Positive values reserve space, 0 does not, -1 ignores reservations of others.
    pub exclusive_zone: i32,
    pub margin: Margins,
    /// Zero on an axis stretches the surface between its anchors.
    pub desired_size: Size<i32, Logical>,
    pub keyboard_interactive: bool,
}

impl LayerSurfaceState {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            anchor: Anchor::empty(),
            exclusive_zone: 0,
            margin: Margins::default(),
            desired_size: Size::new(0, 0),
            keyboard_interactive: false,
        }
    }
}

#[derive(Debug)]
pub struct LayerSurface {
    id: LayerSurfaceId,
    namespace: String,
    output: OutputId,
    /// Layer list the surface is in, which differs from the requested one for a raised
    /// on-screen keyboard.
    pub(super) layer: Layer,
    pub(super) current: LayerSurfaceState,
    /// State set by the client, applied on the next root commit.
    pub(super) pending: LayerSurfaceState,
    pub(super) geometry: Rectangle<i32, Logical>,
    pub(super) surface: Surface,
    pub(super) mapped: bool,
    pub(super) closed: bool,
    pub(super) configured_size: Option<Size<i32, Logical>>,
}

impl LayerSurface {
    pub fn id(&self) -> LayerSurfaceId {
        self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn output(&self) -> OutputId {
        self.output
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn state(&self) -> &LayerSurfaceState {
        &self.current
    }

    /// Box relative to the output.
    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        self.geometry
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn is_exclusive(&self) -> bool {
        self.current.exclusive_zone > 0
    }
}

impl Scene {
    /// Creates a layer surface.
    ///
    /// Without an output the surface goes to the output under the last active cursor, or the
    /// one nearest to the center of the layout. Returns `None` when there is no output at all;
    /// the caller must close the surface then.
    pub fn add_layer_surface(
        &mut self,
        namespace: &str,
        output: Option<OutputId>,
        state: LayerSurfaceState,
        surface: Surface,
    ) -> Option<LayerSurfaceId> {
        let _span = tracy_client::span!("Scene::add_layer_surface");

        let output = output
            .filter(|id| self.output(*id).is_some())
            .or_else(|| {
                let seat = self.last_active_seat.and_then(|id| self.seat(id))?;
                self.output_under(seat.cursor()).map(|(id, _)| id)
            })
            .or_else(|| self.center_output());
        let Some(output) = output else {
            debug!("no output for layer surface {namespace:?}, closing");
            return None;
        };

        let id = LayerSurfaceId::next();
        let layer = state.layer;
        self.layer_surfaces.insert(
            id,
            LayerSurface {
                id,
                namespace: namespace.to_owned(),
                output,
                layer,
                current: state.clone(),
                pending: state,
                geometry: Rectangle::from_size(Size::new(0, 0)),
                surface,
                mapped: false,
                closed: false,
                configured_size: None,
            },
        );
        if let Some(out) = self.output_mut(output) {
            out.insert_layer_surface(layer, id);
        }

        debug!("new layer surface {id} {namespace:?} on {output}, layer {layer:?}");
        self.arrange_layers(output);
        Some(id)
    }

    /// Stores client state to apply on the next commit of the root surface.
    pub fn set_layer_surface_state(&mut self, id: LayerSurfaceId, state: LayerSurfaceState) {
        if let Some(layer) = self.layer_surfaces.get_mut(&id) {
            layer.pending = state;
        }
    }

    pub(super) fn handle_layer_root_commit(&mut self, id: LayerSurfaceId, state: SurfaceState) {
        let Some(layer) = self.layer_surfaces.get_mut(&id) else {
            return;
        };

        let old_geometry = layer.geometry;
        let old_size = layer.surface.size();
        let output = layer.output;
        let requested_layer = layer.pending.layer;
        let layer_changed = requested_layer != layer.current.layer;
        let was_mapped = layer.mapped;

        // The old footprint, while the tree still has its old sizes.
        let old_damage = if was_mapped {
            self.layer_boxes(id, false)
        } else {
            Vec::new()
        };

        let Some(layer) = self.layer_surfaces.get_mut(&id) else {
            return;
        };
        layer.surface.commit(state);
        layer.current = layer.pending.clone();

        if layer_changed {
            self.move_to_layer(id, requested_layer);
        }
        self.arrange_layers(output);

        let Some(layer) = self.layer_surfaces.get(&id) else {
            return;
        };
        let size_changed = layer.surface.size() != old_size;
        let geometry_changed = layer.geometry != old_geometry || size_changed || layer_changed;

        if size_changed {
            self.refocus_pointers();
        }

        if !layer.mapped {
            if let Some(layer) = self.layer_surfaces.get_mut(&id) {
                layer.surface.clear_damage();
            }
            return;
        }
        if geometry_changed {
            self.add_damage(old_damage);
            self.damage_whole_layer(id);
        } else {
            self.damage_layer_from_commit(id);
        }
    }

    pub fn map_layer_surface(&mut self, id: LayerSurfaceId) {
        let Some(layer) = self.layer_surfaces.get_mut(&id) else {
            return;
        };
        if layer.mapped {
            return;
        }
        layer.mapped = true;
        let output = layer.output;

        self.arrange_layers(output);
        self.damage_whole_layer(id);
    }

    pub fn unmap_layer_surface(&mut self, id: LayerSurfaceId) {
        let Some(layer) = self.layer_surfaces.get(&id) else {
            return;
        };
        if !layer.mapped {
            return;
        }
        let output = layer.output;

        self.damage_whole_layer(id);
        if let Some(layer) = self.layer_surfaces.get_mut(&id) {
            layer.mapped = false;
        }
        self.arrange_layers(output);
    }

    /// Destroys a layer surface, removing it from every registry.
    pub fn destroy_layer_surface(&mut self, id: LayerSurfaceId) {
        let Some(layer) = self.layer_surfaces.get(&id) else {
            return;
        };
        let output = layer.output;

        if layer.mapped {
            self.damage_whole_layer(id);
        }

        if let Some(out) = self.output_mut(output) {
            out.remove_layer_surface(id);
        }
        self.layer_surfaces.remove(&id);

        let seats: Vec<_> = self
            .seats
            .iter()
            .filter(|seat| seat.focused_layer() == Some(id))
            .map(|seat| seat.id())
            .collect();
        for seat in seats {
            self.set_focus_layer(seat, None);
        }

        self.arrange_layers(output);
    }

    /// Moves a layer surface to another layer list, as the most recent entry.
    pub(super) fn move_to_layer(&mut self, id: LayerSurfaceId, target: Layer) {
        let Some(layer) = self.layer_surfaces.get_mut(&id) else {
            return;
        };
        if layer.layer == target {
            return;
        }
        layer.layer = target;
        let output = layer.output;

        if let Some(out) = self.output_mut(output) {
            out.remove_layer_surface(id);
            out.insert_layer_surface(target, id);
        }
    }

    /// Asks the client to close a layer surface, once.
    pub(super) fn close_layer_surface(&mut self, id: LayerSurfaceId) {
        let Some(layer) = self.layer_surfaces.get_mut(&id) else {
            return;
        };
        if layer.closed {
            return;
        }
        layer.closed = true;
        self.send(ClientRequest::CloseLayerSurface(id));
    }

    pub(super) fn refocus_pointers(&mut self) {
        let seats: Vec<_> = self.seats.iter().map(|s| s.id()).collect();
        for seat in seats {
            self.emit(SceneEvent::PointerRefocus(seat));
        }
    }
}
