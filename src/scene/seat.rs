//! Seat state the scene needs: cursor position, keyboard focus and drag icons.

use smithay::utils::{Logical, Point};

use super::{LayerSurfaceId, Scene, SceneEvent, SeatId, Surface, ViewId};

/// Icon following the cursor during drag-and-drop.
#[derive(Debug)]
pub struct DragIcon {
    pub(super) surface: Surface,
    /// Offset of the icon surface from the cursor hotspot.
    pub(super) offset: Point<i32, Logical>,
}

impl DragIcon {
    pub fn new(surface: Surface, offset: Point<i32, Logical>) -> Self {
        Self { surface, offset }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn is_mapped(&self) -> bool {
        self.surface.has_buffer()
    }
}

#[derive(Debug)]
pub struct Seat {
    id: SeatId,
    name: String,
    cursor: Point<f64, Logical>,
    /// View with keyboard focus, unset while a layer surface has it.
    pub(super) focused_view: Option<ViewId>,
    pub(super) focused_layer: Option<LayerSurfaceId>,
    /// Views this seat focused, most recent first.
    pub(super) focus_history: Vec<ViewId>,
    pub(super) drag_icon: Option<DragIcon>,
}

impl Seat {
    fn new(name: String) -> Self {
        Self {
            id: SeatId::next(),
            name,
            cursor: Point::new(0., 0.),
            focused_view: None,
            focused_layer: None,
            focus_history: Vec::new(),
            drag_icon: None,
        }
    }

    pub fn id(&self) -> SeatId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cursor(&self) -> Point<f64, Logical> {
        self.cursor
    }

    pub fn focused_view(&self) -> Option<ViewId> {
        self.focused_view
    }

    pub fn focused_layer(&self) -> Option<LayerSurfaceId> {
        self.focused_layer
    }

    pub fn drag_icon(&self) -> Option<&DragIcon> {
        self.drag_icon.as_ref()
    }

    pub(super) fn drag_icon_mut(&mut self) -> Option<&mut DragIcon> {
        self.drag_icon.as_mut()
    }

    /// Layout position of the drag icon's root surface.
    pub fn drag_icon_position(&self) -> Point<i32, Logical> {
        let offset = self.drag_icon.as_ref().map(|icon| icon.offset);
        self.cursor.to_i32_round() + offset.unwrap_or_default()
    }
}

impl Scene {
    pub fn add_seat(&mut self, name: &str) -> SeatId {
        let seat = Seat::new(name.to_owned());
        let id = seat.id();
        debug!("adding seat {name}");
        self.seats.push(seat);
        if self.last_active_seat.is_none() {
            self.last_active_seat = Some(id);
        }
        id
    }

    pub fn remove_seat(&mut self, id: SeatId) {
        self.set_drag_icon(id, None);

        let focused = self.seat(id).and_then(|seat| seat.focused_view);
        self.seats.retain(|seat| seat.id() != id);
        if self.last_active_seat == Some(id) {
            self.last_active_seat = self.seats.first().map(|seat| seat.id());
        }

        if let Some(view) = focused {
            if !self.view_has_focus(view) {
                self.set_view_activated(view, false);
            }
        }
    }

    pub fn last_active_seat(&self) -> Option<SeatId> {
        self.last_active_seat
    }

    /// Records a cursor move, which also makes the seat the last active one.
    pub fn set_cursor_position(&mut self, id: SeatId, pos: Point<f64, Logical>) {
        let Some(seat) = self.seat_mut(id) else {
            return;
        };
        let has_icon = seat.drag_icon.is_some();

        if has_icon {
            self.damage_drag_icon(id);
        }
        if let Some(seat) = self.seat_mut(id) {
            seat.cursor = pos;
        }
        if has_icon {
            self.damage_drag_icon(id);
        }

        self.last_active_seat = Some(id);
    }

    /// Starts or ends showing a drag icon for a seat.
    pub fn set_drag_icon(&mut self, id: SeatId, icon: Option<DragIcon>) {
        if self.seat(id).is_none() {
            return;
        }

        self.damage_drag_icon(id);
        if let Some(seat) = self.seat_mut(id) {
            seat.drag_icon = icon;
        }
        self.damage_drag_icon(id);
    }

    /// Whether any seat has keyboard focus on `view`.
    pub(super) fn view_has_focus(&self, view: ViewId) -> bool {
        self.seats.iter().any(|seat| seat.focused_view == Some(view))
    }

    /// Gives keyboard focus to a layer surface, or takes it away.
    ///
    /// Losing layer focus hands the keyboard back to the most recently focused view.
    pub(super) fn set_focus_layer(&mut self, id: SeatId, layer: Option<LayerSurfaceId>) {
        let Some(seat) = self.seat(id) else {
            return;
        };

        let Some(layer) = layer else {
            if seat.focused_layer.is_none() {
                return;
            }
            let next = seat.focus_history.first().copied();
            if let Some(seat) = self.seat_mut(id) {
                seat.focused_layer = None;
            }
            self.emit(SceneEvent::KeyboardFocusLayer {
                seat: id,
                layer: None,
            });
            self.focus_view(id, next);
            return;
        };

        if seat.focused_layer == Some(layer) {
            return;
        }

        if let Some(prev) = seat.focused_view {
            if let Some(seat) = self.seat_mut(id) {
                seat.focused_view = None;
            }
            if !self.view_has_focus(prev) {
                self.set_view_activated(prev, false);
            }
        }

        let above_shell = self
            .layer_surfaces
            .get(&layer)
            .is_some_and(|l| l.current.layer >= super::Layer::Top);
        if let Some(seat) = self.seat_mut(id) {
            seat.focused_layer = above_shell.then_some(layer);
        }
        self.emit(SceneEvent::KeyboardFocusLayer {
            seat: id,
            layer: Some(layer),
        });
    }
}
