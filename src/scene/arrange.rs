//! Layer surface arrangement.
//!
//! Surfaces reserving space (a positive exclusive zone) are placed first, top layer down, and
//! each one shrinks the usable area of its output. Maximized views are then fitted to what is
//! left, and the remaining surfaces are placed against the final usable area.

use smithay::utils::{Logical, Point, Rectangle};

use super::{Anchor, ClientRequest, Layer, LayerSurfaceId, LayerSurfaceState, OutputId, Scene, SceneEvent, ViewState};

/// Places a layer surface inside `bounds` according to its anchors, margins and desired size.
///
/// On each axis, a surface anchored to both edges with a desired size of zero is stretched
/// between them, one anchored to a single edge is aligned to it, and any other is centered.
/// The result may have a negative size when margins exceed the bounds.
pub fn solve_layer_geometry(
    state: &LayerSurfaceState,
    bounds: Rectangle<i32, Logical>,
) -> Rectangle<i32, Logical> {
    let anchor = state.anchor;
    let margin = state.margin;
    let mut rect = Rectangle::new(Point::new(0, 0), state.desired_size);

    let both_horiz = Anchor::LEFT | Anchor::RIGHT;
    if anchor.contains(both_horiz) && rect.size.w == 0 {
        rect.loc.x = bounds.loc.x;
        rect.size.w = bounds.size.w;
    } else if anchor.contains(Anchor::LEFT) {
        rect.loc.x = bounds.loc.x;
    } else if anchor.contains(Anchor::RIGHT) {
        rect.loc.x = bounds.loc.x + (bounds.size.w - rect.size.w);
    } else {
        rect.loc.x = bounds.loc.x + (bounds.size.w / 2 - rect.size.w / 2);
    }

    let both_vert = Anchor::TOP | Anchor::BOTTOM;
    if anchor.contains(both_vert) && rect.size.h == 0 {
        rect.loc.y = bounds.loc.y;
        rect.size.h = bounds.size.h;
    } else if anchor.contains(Anchor::TOP) {
        rect.loc.y = bounds.loc.y;
    } else if anchor.contains(Anchor::BOTTOM) {
        rect.loc.y = bounds.loc.y + (bounds.size.h - rect.size.h);
    } else {
        rect.loc.y = bounds.loc.y + (bounds.size.h / 2 - rect.size.h / 2);
    }

    if anchor.contains(both_horiz) {
        rect.loc.x += margin.left;
        rect.size.w -= margin.left + margin.right;
    } else if anchor.contains(Anchor::LEFT) {
        rect.loc.x += margin.left;
    } else if anchor.contains(Anchor::RIGHT) {
        rect.loc.x -= margin.right;
    }

    if anchor.contains(both_vert) {
        rect.loc.y += margin.top;
        rect.size.h -= margin.top + margin.bottom;
    } else if anchor.contains(Anchor::TOP) {
        rect.loc.y += margin.top;
    } else if anchor.contains(Anchor::BOTTOM) {
        rect.loc.y -= margin.bottom;
    }

    rect
}

/// Shrinks `usable` by the space a surface reserves along the edge it is attached to.
fn apply_exclusive(usable: &mut Rectangle<i32, Logical>, state: &LayerSurfaceState) {
    let exclusive = state.exclusive_zone;
    if exclusive <= 0 {
        return;
    }

    let anchor = state.anchor;
    let margin = state.margin;

    let top = Anchor::LEFT | Anchor::RIGHT | Anchor::TOP;
    if anchor.contains(top) && exclusive + margin.top > 0 {
        usable.loc.y += exclusive + margin.top;
        usable.size.h -= exclusive + margin.top;
    }

    let bottom = Anchor::LEFT | Anchor::RIGHT | Anchor::BOTTOM;
    if anchor.contains(bottom) && exclusive + margin.bottom > 0 {
        usable.size.h -= exclusive + margin.bottom;
    }

    let left = Anchor::LEFT | Anchor::TOP | Anchor::BOTTOM;
    if anchor.contains(left) && exclusive + margin.left > 0 {
        usable.loc.x += exclusive + margin.left;
        usable.size.w -= exclusive + margin.left;
    }

    let right = Anchor::RIGHT | Anchor::TOP | Anchor::BOTTOM;
    if anchor.contains(right) && exclusive + margin.right > 0 {
        usable.size.w -= exclusive + margin.right;
    }
}

impl Scene {
    /// Re-places every layer surface of an output and recomputes its usable area.
    pub(super) fn arrange_layers(&mut self, output: OutputId) {
        let _span = tracy_client::span!("Scene::arrange_layers");

        let Some(out) = self.output(output) else {
            return;
        };
        let full_area = Rectangle::from_size(out.size());
        let old_usable = out.usable_area();

        self.arrange_osk(output);

        let mut usable = full_area;
        let mut moved = false;
        for layer in Layer::TOP_DOWN {
            moved |= self.arrange_layer(output, layer, full_area, &mut usable, true);
        }

        if let Some(out) = self.output_mut(output) {
            out.usable_area = usable;
        }
        if usable != old_usable {
            trace!("usable area of {output} is now {usable:?}");
            self.emit(SceneEvent::UsableAreaChanged {
                output,
                area: usable,
            });
        }

        self.reflow_views(output);

        for layer in Layer::TOP_DOWN {
            moved |= self.arrange_layer(output, layer, full_area, &mut usable, false);
        }

        self.update_layer_focus(output);

        if moved {
            self.refocus_pointers();
        }
    }

    /// Places the exclusive or the non-exclusive surfaces of one layer, most recent first.
    ///
    /// Returns whether a surface moved without changing size.
    fn arrange_layer(
        &mut self,
        output: OutputId,
        layer: Layer,
        full_area: Rectangle<i32, Logical>,
        usable: &mut Rectangle<i32, Logical>,
        exclusive: bool,
    ) -> bool {
        let Some(out) = self.output(output) else {
            return false;
        };
        let ids: Vec<LayerSurfaceId> = out.layer_surfaces(layer).iter().rev().copied().collect();

        let mut moved = false;
        for id in ids {
            let Some(surface) = self.layer_surfaces.get_mut(&id) else {
                continue;
            };
            let state = &surface.current;
            if exclusive != (state.exclusive_zone > 0) {
                continue;
            }

            let bounds = if state.exclusive_zone == -1 {
                full_area
            } else {
                *usable
            };
            let geometry = solve_layer_geometry(state, bounds);
            if geometry.size.w < 0 || geometry.size.h < 0 {
                debug!(
                    "closing layer surface {id} {:?}: no room left ({geometry:?})",
                    surface.namespace()
                );
                self.close_layer_surface(id);
                continue;
            }

            let old = surface.geometry;
            surface.geometry = geometry;
            if surface.mapped {
                apply_exclusive(usable, &surface.current);
            }
            if old.loc != geometry.loc && old.size == geometry.size {
                moved = true;
            }

            if surface.configured_size != Some(geometry.size) {
                surface.configured_size = Some(geometry.size);
                self.send(ClientRequest::ConfigureLayerSurface {
                    layer: id,
                    size: geometry.size,
                });
            }
        }

        moved
    }

    /// Raises the on-screen keyboard above whatever layer surface has keyboard focus.
    fn arrange_osk(&mut self, output: OutputId) {
        let namespace = self.config.borrow().osk_namespace().to_owned();
        let Some(out) = self.output(output) else {
            return;
        };

        let osk = out
            .layers
            .iter()
            .flatten()
            .filter_map(|id| self.layer_surfaces.get(id))
            .find(|l| l.namespace() == namespace);
        let Some(osk) = osk else {
            return;
        };
        let id = osk.id();
        let requested = osk.current.layer;

        let force_overlay = self
            .seats
            .iter()
            .filter_map(|seat| seat.focused_layer())
            .filter_map(|l| self.layer_surfaces.get(&l))
            .any(|l| l.current.layer >= requested);

        let target = if force_overlay {
            Layer::Overlay
        } else {
            requested
        };
        if osk.layer() != target {
            debug!("moving on-screen keyboard {id} to {target:?}");
            self.move_to_layer(id, target);
        }
    }

    /// Fits the views of an output to its new usable area.
    fn reflow_views(&mut self, output: OutputId) {
        let views: Vec<_> = self
            .stacking
            .iter()
            .copied()
            .filter(|id| self.view_output(*id) == Some(output))
            .collect();

        for id in views {
            let Some(view) = self.views.get(&id) else {
                continue;
            };
            if view.state() == ViewState::Maximized && !view.is_fullscreen() {
                self.arrange_maximized(id);
            }
            self.update_view_scale(id);
        }
    }

    /// Gives keyboard focus to the topmost keyboard-interactive surface above the views.
    fn update_layer_focus(&mut self, output: OutputId) {
        let Some(out) = self.output(output) else {
            return;
        };

        let topmost = [Layer::Overlay, Layer::Top].into_iter().find_map(|layer| {
            out.layer_surfaces(layer)
                .iter()
                .rev()
                .copied()
                .find(|id| {
                    self.layer_surfaces
                        .get(id)
                        .is_some_and(|l| l.mapped && l.current.keyboard_interactive)
                })
        });

        let seats: Vec<_> = self
            .seats
            .iter()
            .map(|seat| (seat.id(), seat.focused_layer()))
            .collect();

        for (seat, focused) in seats {
            match topmost {
                Some(layer) => self.set_focus_layer(seat, Some(layer)),
                None => {
                    // Leave focus on other outputs alone.
                    let here = focused.is_some_and(|l| {
                        self.layer_surfaces
                            .get(&l)
                            .map_or(true, |l| l.output() == output)
                    });
                    if here {
                        self.set_focus_layer(seat, None);
                    }
                }
            }
        }
    }
}
