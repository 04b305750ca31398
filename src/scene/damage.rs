//! Damage tracking.
//!
//! Every output accumulates damage in its buffer space between frames. Mutations damage the
//! whole footprint of what they touch, before and after the change. Client commits damage only
//! what the client reported, projected through view scale, output scale and rotation.

use smithay::utils::{Logical, Physical, Point, Rectangle};

use super::{LayerSurfaceId, Output, OutputId, Scene, SceneEvent, SeatId, Surface, View, ViewId};
use crate::utils::region::Region;
use crate::utils::{
    rotate_child_position, rotated_bounds, rotated_bounds_about, scale_box, to_physical_box,
};
use crate::window::ToplevelSurface;

/// Damage accumulated on an output since its last frame.
#[derive(Debug, Default)]
pub struct OutputDamage {
    region: Region<Physical>,
    /// A frame must be committed even without damage.
    forced_swap: bool,
    frame_scheduled: bool,
}

impl OutputDamage {
    pub fn region(&self) -> &Region<Physical> {
        &self.region
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    pub fn forced_swap(&self) -> bool {
        self.forced_swap
    }

    pub fn frame_scheduled(&self) -> bool {
        self.frame_scheduled
    }

    pub(super) fn add(&mut self, rect: Rectangle<i32, Physical>) {
        self.region.add(rect);
    }

    pub(super) fn force_swap(&mut self) {
        self.forced_swap = true;
    }

    /// Keeps the damage for the next frame, letting new damage schedule it.
    pub(super) fn frame_dropped(&mut self) {
        self.frame_scheduled = false;
    }

    /// Forgets everything after a successful frame.
    pub(super) fn reset(&mut self) {
        self.region.clear();
        self.forced_swap = false;
        self.frame_scheduled = false;
    }
}

/// A surface placed on an output.
pub(super) struct PlacedSurface<'a> {
    pub surface: &'a Surface,
    /// Output-local box before view scale and rotation are applied.
    pub bbox: Rectangle<i32, Logical>,
}

impl Scene {
    /// Calls `f` for every surface of a mapped view, bottom to top.
    pub(super) fn for_each_view_surface<'a>(
        &self,
        output: &Output,
        view: &'a View,
        f: &mut dyn FnMut(PlacedSurface<'a>),
    ) {
        let Some(root) = view.surface.as_ref() else {
            return;
        };

        let origin = (view.geometry.loc - output.loc()).to_f64();
        let root_size = root.size().to_f64();
        let rotation = view.rotation;

        visit_tree(root, &mut |surface, offset| {
            let pos = rotate_child_position(
                offset.to_f64(),
                surface.size().to_f64(),
                root_size,
                rotation,
            );
            let loc = (origin + pos).to_i32_round();
            f(PlacedSurface {
                surface,
                bbox: Rectangle::new(loc, surface.size()),
            });
        });
    }

    /// Whether a view surface box shows up on `output` at all.
    pub(super) fn view_box_visible(output: &Output, view: &View, bbox: Rectangle<i32, Logical>) -> bool {
        let shown = rotated_bounds(scale_box(bbox, view.scale), view.rotation);
        let output_box = Rectangle::from_size(output.size());
        shown.overlaps(output_box)
    }

    /// Box of a view surface in the output buffer, before rotation.
    pub(super) fn view_box_in_buffer(
        output: &Output,
        view: &View,
        bbox: Rectangle<i32, Logical>,
    ) -> Rectangle<i32, Physical> {
        to_physical_box(scale_box(bbox, view.scale), output.scale())
    }

    /// Whether damage of `view` should reach `output`.
    ///
    /// A fullscreen view hides everything else on its output, except for its own X11 child
    /// windows.
    pub(super) fn view_accepts_damage(&self, output: &Output, view: &View) -> bool {
        if !view.is_mapped() {
            return false;
        }

        let Some(fullscreen) = output.fullscreen_view() else {
            return true;
        };
        if fullscreen == view.id() {
            return true;
        }

        match self.views.get(&fullscreen) {
            Some(fs) if fs.toplevel.is_xwayland() && view.toplevel.is_xwayland() => {
                self.is_native_descendant(view.id(), fullscreen)
            }
            _ => false,
        }
    }

    /// Whether `view` is below `ancestor` in the protocol's own window tree.
    pub(super) fn is_native_descendant(&self, view: ViewId, ancestor: ViewId) -> bool {
        let mut current = view;
        // The native tree is not checked for cycles, so bound the walk.
        for _ in 0..self.views.len() {
            let Some(parent) = self
                .views
                .get(&current)
                .and_then(|v| v.toplevel().native_parent())
            else {
                return false;
            };
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    pub(super) fn add_damage(&mut self, damage: Vec<(OutputId, Rectangle<i32, Physical>)>) {
        for (output, rect) in damage {
            let Some(out) = self.output_mut(output) else {
                continue;
            };

            let buffer = Rectangle::from_size(out.buffer_size());
            let Some(rect) = rect.intersection(buffer) else {
                continue;
            };

            out.damage.add(rect);
            self.schedule_frame(output);
        }
    }

    fn schedule_frame(&mut self, output: OutputId) {
        let Some(out) = self.output_mut(output) else {
            return;
        };
        if out.damage.frame_scheduled {
            return;
        }
        out.damage.frame_scheduled = true;
        self.emit(SceneEvent::FrameScheduled(output));
    }

    pub fn damage_whole_output(&mut self, output: OutputId) {
        let Some(out) = self.output_mut(output) else {
            return;
        };
        let buffer = Rectangle::from_size(out.buffer_size());
        out.damage.add(buffer);
        out.damage.force_swap();
        self.schedule_frame(output);
    }

    /// Damages everything a view covers on every output, including its decoration.
    pub fn damage_whole_view(&mut self, id: ViewId) {
        let _span = tracy_client::span!("Scene::damage_whole_view");

        let Some(view) = self.views.get(&id) else {
            return;
        };

        let mut damage = Vec::new();
        for output in self.outputs.iter().filter(|o| o.is_enabled()) {
            if !self.view_accepts_damage(output, view) {
                continue;
            }

            if view.shows_decoration() {
                let deco = Rectangle::new(view.deco_box().loc - output.loc(), view.deco_box().size);
                let rect = rotated_bounds(Self::view_box_in_buffer(output, view, deco), view.rotation);
                damage.push((output.id(), rect));
            }

            self.for_each_view_surface(output, view, &mut |placed| {
                if !placed.surface.has_buffer() || !Self::view_box_visible(output, view, placed.bbox) {
                    return;
                }
                let rect = Self::view_box_in_buffer(output, view, placed.bbox);
                damage.push((output.id(), rotated_bounds(rect, view.rotation)));
            });
        }

        self.add_damage(damage);
    }

    /// Damages what the surfaces of a view reported in their last commits.
    pub fn damage_view_from_commit(&mut self, id: ViewId) {
        let _span = tracy_client::span!("Scene::damage_view_from_commit");

        let Some(view) = self.views.get(&id) else {
            return;
        };

        let mut damage = Vec::new();
        for output in self.outputs.iter().filter(|o| o.is_enabled()) {
            if !self.view_accepts_damage(output, view) {
                continue;
            }

            self.for_each_view_surface(output, view, &mut |placed| {
                if placed.surface.damage().is_empty()
                    || !Self::view_box_visible(output, view, placed.bbox)
                {
                    return;
                }

                let surface_box = Self::view_box_in_buffer(output, view, placed.bbox);
                let shown = surface_box.to_f64();
                let pivot = shown.loc + shown.size.downscale(2.).to_point();

                let region = surface_damage(placed.surface, view.scale, output.scale());
                for rect in region.translate(surface_box.loc).rects() {
                    let rect = rotated_bounds_about(*rect, view.rotation, pivot);
                    damage.push((output.id(), rect));
                }
            });
        }

        self.add_damage(damage);
        if let Some(root) = self.views.get_mut(&id).and_then(|v| v.surface.as_mut()) {
            root.clear_damage();
        }
    }

    /// Layer surface boxes in the output buffer.
    pub(super) fn layer_boxes(&self, id: LayerSurfaceId, only_damaged: bool) -> Vec<(OutputId, Rectangle<i32, Physical>)> {
        let Some(layer) = self.layer_surfaces.get(&id) else {
            return Vec::new();
        };
        let Some(output) = self.output(layer.output()) else {
            return Vec::new();
        };
        if !output.is_enabled() {
            return Vec::new();
        }

        let mut damage = Vec::new();
        visit_tree(&layer.surface, &mut |surface, offset| {
            let bbox = Rectangle::new(layer.geometry().loc + offset, surface.size());
            let surface_box = to_physical_box(bbox, output.scale());

            if !only_damaged {
                damage.push((output.id(), surface_box));
                return;
            }

            let region = surface_damage(surface, 1., output.scale());
            for rect in region.translate(surface_box.loc).rects() {
                damage.push((output.id(), *rect));
            }
        });
        damage
    }

    pub fn damage_whole_layer(&mut self, id: LayerSurfaceId) {
        let damage = self.layer_boxes(id, false);
        self.add_damage(damage);
    }

    pub fn damage_layer_from_commit(&mut self, id: LayerSurfaceId) {
        let damage = self.layer_boxes(id, true);
        self.add_damage(damage);
        if let Some(layer) = self.layer_surfaces.get_mut(&id) {
            layer.surface.clear_damage();
        }
    }

    /// Damages a seat's drag icon on every output it covers.
    pub(super) fn damage_drag_icon(&mut self, seat: SeatId) {
        let Some(seat) = self.seat(seat) else {
            return;
        };
        let Some(icon) = seat.drag_icon() else {
            return;
        };
        let origin = seat.drag_icon_position();

        let mut damage = Vec::new();
        for output in self.outputs.iter().filter(|o| o.is_enabled()) {
            visit_tree(&icon.surface, &mut |surface, offset| {
                let bbox = Rectangle::new(origin - output.loc() + offset, surface.size());
                damage.push((output.id(), to_physical_box(bbox, output.scale())));
            });
        }
        self.add_damage(damage);
    }
}

fn visit_tree<'a>(root: &'a Surface, f: &mut dyn FnMut(&'a Surface, Point<i32, Logical>)) {
    fn inner<'a>(
        surface: &'a Surface,
        offset: Point<i32, Logical>,
        f: &mut dyn FnMut(&'a Surface, Point<i32, Logical>),
    ) {
        f(surface, offset);
        for child in surface.children() {
            inner(child, offset + child.loc(), f);
        }
    }
    inner(root, Point::new(0, 0), f);
}

/// Damage of a single surface in buffer space, relative to the surface's own buffer box.
///
/// When the output scale rounds up past the client's buffer scale, filtering samples
/// neighbouring pixels, so the damage is grown to cover them.
fn surface_damage(surface: &Surface, view_scale: f64, output_scale: f64) -> Region<Physical> {
    let mut region = Region::new();
    for rect in surface.damage() {
        let rect = to_physical_box(scale_box(*rect, view_scale), output_scale);
        region.add(rect);
    }

    let bleed = output_scale.ceil() as i32 - surface.buffer_scale();
    if bleed > 0 {
        region = region.expand(bleed);
    }
    region
}

#[cfg(test)]
mod tests {
    use smithay::utils::Size;

    use super::*;
    use crate::scene::SurfaceState;

    #[test]
    fn surface_damage_is_scaled_and_expanded() {
        let mut state = SurfaceState::with_size(Size::new(100, 100));
        state.damage = vec![Rectangle::new(Point::new(10, 10), Size::new(5, 5))];
        let surface = Surface::new(crate::scene::SurfaceId::next(), state);

        let region = surface_damage(&surface, 1., 2.);
        assert_eq!(
            region.rects(),
            &[Rectangle::new(Point::new(19, 19), Size::new(12, 12))]
        );

        let region = surface_damage(&surface, 1., 1.);
        assert_eq!(
            region.rects(),
            &[Rectangle::new(Point::new(10, 10), Size::new(5, 5))]
        );
    }
}
