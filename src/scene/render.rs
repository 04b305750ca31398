//! Composing output frames.
//!
//! A frame either hands the fullscreen view's buffer to the output directly, or repaints the
//! damaged part of the output buffer bottom to top and commits it. The actual drawing is done by
//! an [`OutputBackend`], the scene only decides what goes where.

use std::time::Duration;

use smithay::utils::{Logical, Physical, Point, Rectangle, Size, Transform};

use super::{Layer, LayerSurface, Output, OutputId, RenderResult, Scene, Surface, SurfaceId, View, ViewId};
use crate::utils::region::Region;
use crate::utils::{rotated_bounds, to_physical_box};

const CLEAR_COLOR: [f32; 4] = [0., 0., 0., 1.];
const DAMAGE_DEBUG_COLOR: [f32; 4] = [1., 1., 0., 1.];
const DECORATION_COLOR: [f32; 3] = [0.2, 0.2, 0.2];

/// A client surface to draw into the output buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceElement {
    pub surface: SurfaceId,
    /// Destination in the output buffer, before rotation.
    pub dst: Rectangle<i32, Physical>,
    /// Clockwise rotation around the center of `dst`, in radians.
    pub rotation: f32,
    pub alpha: f32,
    /// Transform the client applied to its buffer.
    pub transform: Transform,
}

/// The renderer and display of outputs.
///
/// Drawing calls only happen between [`begin`](Self::begin) and [`end`](Self::end), in output
/// buffer coordinates. Each drawing call gets the damaged rectangles it may touch, already
/// clipped to the bounds of what it draws.
pub trait OutputBackend {
    /// Whether a cursor drawn by the compositor, rather than a hardware plane, is on the output.
    fn software_cursor_visible(&self, output: OutputId) -> bool;

    /// Tries to show the buffer of `surface` on the output without compositing.
    fn scanout(&mut self, output: OutputId, surface: SurfaceId) -> bool;

    fn begin(&mut self, output: OutputId, size: Size<i32, Physical>);

    fn clear(&mut self, rects: &[Rectangle<i32, Physical>], color: [f32; 4]);

    fn draw_surface(&mut self, element: &SurfaceElement, damage: &[Rectangle<i32, Physical>]);

    fn draw_decoration(
        &mut self,
        dst: Rectangle<i32, Physical>,
        rotation: f32,
        color: [f32; 4],
        damage: &[Rectangle<i32, Physical>],
    );

    fn render_software_cursors(&mut self, output: OutputId, damage: &Region<Physical>);

    fn end(&mut self);

    /// Presents the frame. `damage` is in the output's native orientation.
    fn commit(&mut self, output: OutputId, damage: &Region<Physical>) -> anyhow::Result<()>;
}

/// Painting state for one composited frame.
struct Frame<'a> {
    output: &'a Output,
    damage: &'a Region<Physical>,
    backend: &'a mut dyn OutputBackend,
}

impl Frame<'_> {
    fn draw_surface(&mut self, element: SurfaceElement) {
        let bounds = rotated_bounds(element.dst, element.rotation);
        let damage = self.damage.intersect(bounds);
        if damage.is_empty() {
            return;
        }
        self.backend.draw_surface(&element, damage.rects());
    }

    /// Draws a surface tree that is neither scaled nor rotated.
    fn draw_tree(&mut self, root: &Surface, origin: Point<i32, Logical>) {
        root.for_each(&mut |surface, offset| {
            if !surface.has_buffer() {
                return;
            }
            let bbox = Rectangle::new(origin + offset, surface.size());
            self.draw_surface(SurfaceElement {
                surface: surface.id(),
                dst: to_physical_box(bbox, self.output.scale()),
                rotation: 0.,
                alpha: 1.,
                transform: surface.buffer_transform(),
            });
        });
    }
}

impl Scene {
    /// Produces a frame for an output on its refresh.
    ///
    /// Every surface on screen gets a frame-done with `now`, whatever the outcome.
    pub fn render_output(
        &mut self,
        id: OutputId,
        backend: &mut dyn OutputBackend,
        now: Duration,
    ) -> RenderResult {
        let _span = tracy_client::span!("Scene::render_output");

        let Some(output) = self.output(id) else {
            return RenderResult::Skipped;
        };
        if !output.is_enabled() {
            return RenderResult::Skipped;
        }

        let fullscreen = output
            .fullscreen_view
            .filter(|view| self.views.get(view).is_some_and(|v| v.surface.is_some()));

        if let Some(view) = fullscreen {
            self.center_fullscreen_view(id, view);
        }

        let scanned_out = fullscreen.is_some_and(|view| self.try_scanout(id, view, backend));
        self.update_scanout_state(id, scanned_out);

        let result = if scanned_out {
            if let Some(output) = self.output_mut(id) {
                output.damage.reset();
            }
            RenderResult::ScannedOut
        } else {
            self.composite(id, fullscreen, backend)
        };

        self.send_frame_callbacks(id, now);
        result
    }

    fn center_fullscreen_view(&mut self, output: OutputId, id: ViewId) {
        let (Some(output), Some(view)) = (self.output(output), self.views.get(&id)) else {
            return;
        };

        let geo = output.geometry();
        let view_geo = view.geometry();
        let x = (f64::from(geo.size.w - view_geo.size.w) / 2.) as i32 + geo.loc.x;
        let y = (f64::from(geo.size.h - view_geo.size.h) / 2.) as i32 + geo.loc.y;

        if view_geo.loc.x != x || view_geo.loc.y != y {
            self.move_view(id, (x, y).into());
        }
    }

    fn try_scanout(&self, output: OutputId, id: ViewId, backend: &mut dyn OutputBackend) -> bool {
        let Some(out) = self.output(output) else {
            return false;
        };
        let Some(view) = self.views.get(&id) else {
            return false;
        };
        let Some(root) = view.surface.as_ref() else {
            return false;
        };

        let drag_icon_shown = self
            .seats
            .iter()
            .any(|seat| seat.drag_icon().is_some_and(|icon| icon.is_mapped()));
        if drag_icon_shown {
            return false;
        }

        if self.any_layer_mapped(out, Layer::Overlay) {
            return false;
        }
        if out.force_shell_reveal && self.any_layer_mapped(out, Layer::Top) {
            return false;
        }

        if backend.software_cursor_visible(output) {
            return false;
        }

        let mut on_screen = 0;
        self.for_each_view_surface(out, view, &mut |placed| {
            if placed.surface.has_buffer() && Self::view_box_visible(out, view, placed.bbox) {
                on_screen += 1;
            }
        });
        if on_screen != 1 || !root.has_buffer() {
            return false;
        }

        if !self.native_children(id).is_empty() {
            return false;
        }

        if f64::from(root.buffer_scale()) != out.scale() || root.buffer_transform() != out.transform() {
            return false;
        }

        backend.scanout(output, root.id())
    }

    fn any_layer_mapped(&self, output: &Output, layer: Layer) -> bool {
        output
            .layer_surfaces(layer)
            .iter()
            .filter_map(|id| self.layer_surfaces.get(id))
            .any(|l| l.is_mapped())
    }

    fn update_scanout_state(&mut self, id: OutputId, scanned_out: bool) {
        let Some(output) = self.output_mut(id) else {
            return;
        };
        if output.scanned_out == scanned_out {
            return;
        }
        output.scanned_out = scanned_out;

        if scanned_out {
            debug!("scanning out fullscreen view on {}", output.name());
        } else {
            debug!("stopped scanning out fullscreen view on {}", output.name());
            // The buffer being composited into is stale.
            self.damage_whole_output(id);
        }
    }

    /// Mapped views below `id` in the X11 window tree, bottom to top.
    pub(super) fn native_children(&self, id: ViewId) -> Vec<ViewId> {
        self.stacking
            .iter()
            .rev()
            .copied()
            .filter(|view| self.is_native_descendant(*view, id))
            .collect()
    }

    fn composite(
        &mut self,
        id: OutputId,
        fullscreen: Option<ViewId>,
        backend: &mut dyn OutputBackend,
    ) -> RenderResult {
        let _span = tracy_client::span!("Scene::composite");

        let debug_damage = self.config.borrow().debug.damage_tracking;
        let Some(output) = self.output(id) else {
            return RenderResult::Skipped;
        };

        let buffer_size = output.buffer_size();
        // Damage from before a mode or transform change may lie outside the buffer.
        let damage = output.damage.region().intersect(Rectangle::from_size(buffer_size));

        if damage.is_empty() && !output.damage.forced_swap() {
            trace!("no damage on {}", output.name());
            return match backend.commit(id, &Region::new()) {
                Ok(()) => RenderResult::NoDamage,
                Err(err) => {
                    warn!("error committing frame on {}: {err:?}", output.name());
                    RenderResult::Dropped
                }
            };
        }

        backend.begin(id, buffer_size);

        if !damage.is_empty() {
            if debug_damage {
                backend.clear(&[Rectangle::from_size(buffer_size)], DAMAGE_DEBUG_COLOR);
            }
            backend.clear(damage.rects(), CLEAR_COLOR);

            let mut frame = Frame {
                output,
                damage: &damage,
                backend: &mut *backend,
            };
            self.paint(&mut frame, fullscreen);
        }

        backend.render_software_cursors(id, &damage);
        backend.end();

        let mut frame_damage = damage.transform(output.transform().invert(), buffer_size);
        if debug_damage {
            let native_size = output.transform().invert().transform_size(buffer_size);
            frame_damage = Region::from_rect(Rectangle::from_size(native_size));
        }

        match backend.commit(id, &frame_damage) {
            Ok(()) => {
                if let Some(output) = self.output_mut(id) {
                    output.damage.reset();
                }
                RenderResult::Submitted
            }
            Err(err) => {
                warn!("error committing frame on {}: {err:?}", output.name());
                if let Some(output) = self.output_mut(id) {
                    output.damage.frame_dropped();
                }
                RenderResult::Dropped
            }
        }
    }

    /// Paints everything on the output, bottom to top.
    fn paint(&self, frame: &mut Frame<'_>, fullscreen: Option<ViewId>) {
        let output = frame.output;

        match fullscreen.and_then(|id| self.views.get(&id)) {
            Some(view) => {
                self.paint_view(frame, view, false);
                for child in self.native_children(view.id()) {
                    if let Some(child) = self.views.get(&child) {
                        self.paint_view(frame, child, true);
                    }
                }

                if output.force_shell_reveal {
                    self.paint_layer(frame, Layer::Top);
                }
            }
            None => {
                self.paint_layer(frame, Layer::Background);
                self.paint_layer(frame, Layer::Bottom);

                for id in self.stacking.iter().rev() {
                    let Some(view) = self.views.get(id) else {
                        continue;
                    };
                    // Fullscreen on another output.
                    if view.fullscreen_output.is_some_and(|o| o != output.id()) {
                        continue;
                    }
                    self.paint_view(frame, view, true);
                }

                self.paint_layer(frame, Layer::Top);
            }
        }

        self.paint_drag_icons(frame);
        self.paint_layer(frame, Layer::Overlay);
    }

    fn paint_view(&self, frame: &mut Frame<'_>, view: &View, with_decoration: bool) {
        let output = frame.output;

        if with_decoration && view.shows_decoration() {
            let deco = view.deco_box();
            let deco = Rectangle::new(deco.loc - output.loc(), deco.size);
            let dst = Self::view_box_in_buffer(output, view, deco);

            let damage = frame.damage.intersect(rotated_bounds(dst, view.rotation));
            if !damage.is_empty() {
                let [r, g, b] = DECORATION_COLOR;
                frame
                    .backend
                    .draw_decoration(dst, view.rotation, [r, g, b, view.alpha], damage.rects());
            }
        }

        self.for_each_view_surface(output, view, &mut |placed| {
            if !placed.surface.has_buffer() || !Self::view_box_visible(output, view, placed.bbox) {
                return;
            }
            frame.draw_surface(SurfaceElement {
                surface: placed.surface.id(),
                dst: Self::view_box_in_buffer(output, view, placed.bbox),
                rotation: view.rotation,
                alpha: view.alpha,
                transform: placed.surface.buffer_transform(),
            });
        });
    }

    /// Paints one layer so that the hit-test order reads top to bottom: surfaces without an
    /// exclusive zone newest first, then exclusive ones oldest first.
    fn paint_layer(&self, frame: &mut Frame<'_>, layer: Layer) {
        let surfaces: Vec<&LayerSurface> = frame
            .output
            .layer_surfaces(layer)
            .iter()
            .filter_map(|id| self.layer_surfaces.get(id))
            .filter(|l| l.is_mapped())
            .collect();

        let others = surfaces.iter().rev().filter(|l| !l.is_exclusive());
        let exclusive = surfaces.iter().filter(|l| l.is_exclusive());

        for l in others.chain(exclusive) {
            frame.draw_tree(&l.surface, l.geometry().loc);
        }
    }

    fn paint_drag_icons(&self, frame: &mut Frame<'_>) {
        for seat in &self.seats {
            let Some(icon) = seat.drag_icon() else {
                continue;
            };
            if !icon.is_mapped() {
                continue;
            }
            let origin = seat.drag_icon_position() - frame.output.loc();
            frame.draw_tree(&icon.surface, origin);
        }
    }
}
