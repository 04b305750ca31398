//! Frame-done notifications for surfaces on screen.

use std::time::Duration;

use smithay::utils::{Logical, Point, Rectangle};

use super::{ClientRequest, Layer, OutputId, Scene, Surface, SurfaceId};
use crate::utils::to_physical_box;

impl Scene {
    /// Calls `f` for every surface that shows up on the output this frame.
    ///
    /// With a fullscreen view only its tree and X11 children count, otherwise every mapped view
    /// does. Drag icons and all layers count either way.
    pub fn for_each_visible_surface(&self, id: OutputId, f: &mut dyn FnMut(SurfaceId)) {
        let Some(output) = self.output(id) else {
            return;
        };
        let output_box = Rectangle::from_size(output.buffer_size());

        let views: Vec<_> = match output.fullscreen_view {
            Some(fullscreen) => {
                let mut views = vec![fullscreen];
                views.extend(self.native_children(fullscreen));
                views
            }
            None => self.stacking.iter().rev().copied().collect(),
        };

        for view in views.iter().filter_map(|id| self.views.get(id)) {
            self.for_each_view_surface(output, view, &mut |placed| {
                if placed.surface.has_buffer() && Self::view_box_visible(output, view, placed.bbox) {
                    f(placed.surface.id());
                }
            });
        }

        let mut visit_tree = |root: &Surface, origin: Point<i32, Logical>| {
            root.for_each(&mut |surface, offset| {
                let bbox = Rectangle::new(origin + offset, surface.size());
                let bbox = to_physical_box(bbox, output.scale());
                if surface.has_buffer() && bbox.overlaps(output_box) {
                    f(surface.id());
                }
            });
        };

        for seat in &self.seats {
            if let Some(icon) = seat.drag_icon().filter(|icon| icon.is_mapped()) {
                visit_tree(icon.surface(), seat.drag_icon_position() - output.loc());
            }
        }

        for layer in Layer::TOP_DOWN.into_iter().rev() {
            for l in output
                .layer_surfaces(layer)
                .iter()
                .filter_map(|id| self.layer_surfaces.get(id))
                .filter(|l| l.is_mapped())
            {
                visit_tree(l.surface(), l.geometry().loc);
            }
        }
    }

    /// Tells clients on the output that now is a good time to draw their next frame.
    pub(super) fn send_frame_callbacks(&mut self, output: OutputId, now: Duration) {
        let _span = tracy_client::span!("Scene::send_frame_callbacks");

        let mut surfaces = Vec::new();
        self.for_each_visible_surface(output, &mut |surface| surfaces.push(surface));

        for surface in surfaces {
            self.send(ClientRequest::FrameDone { surface, time: now });
        }
    }
}
