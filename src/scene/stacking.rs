//! Stacking order, view parent trees and keyboard focus.

use super::{CycleError, Scene, SceneEvent, SeatId, ViewId};

impl Scene {
    /// Brings a view to the top together with its whole family.
    ///
    /// Every ancestor is moved to the top of its own parent's child stack, then the root
    /// ancestor is raised with all its descendants.
    pub fn raise_view(&mut self, id: ViewId) {
        let _span = tracy_client::span!("Scene::raise_view");

        let Some(view) = self.views.get(&id) else {
            return;
        };
        if !view.is_mapped() {
            return;
        }

        let mut current = id;
        // The parent tree is acyclic, so this walk ends.
        while let Some(parent) = self.views.get(&current).and_then(|v| v.parent) {
            if let Some(parent_view) = self.views.get_mut(&parent) {
                parent_view.children.retain(|c| *c != current);
                parent_view.children.insert(0, current);
            }
            current = parent;
        }

        self.raise_view_stack(current);
    }

    fn raise_view_stack(&mut self, id: ViewId) {
        let Some(view) = self.views.get(&id) else {
            return;
        };
        if !view.is_mapped() {
            return;
        }
        let children = view.children.clone();

        self.stacking.retain(|v| *v != id);
        self.stacking.insert(0, id);
        self.damage_whole_view(id);

        // Raise the bottom child first so that the topmost one ends up on top.
        for child in children.into_iter().rev() {
            self.raise_view_stack(child);
        }
    }

    /// Sets or clears the parent of a view.
    ///
    /// The view becomes the topmost child of its new parent. Fails if `parent` is the view
    /// itself or one of its descendants.
    pub fn set_parent(&mut self, id: ViewId, parent: Option<ViewId>) -> Result<(), CycleError> {
        if !self.views.contains_key(&id) {
            return Ok(());
        }

        if let Some(parent) = parent {
            if self.is_ancestor(id, parent) {
                warn!("refusing to make {parent} the parent of {id}: it would create a cycle");
                return Err(CycleError { view: id, parent });
            }
        }

        let parent = parent.filter(|p| self.views.contains_key(p));

        let old_parent = self.views.get(&id).and_then(|v| v.parent);
        if let Some(old) = old_parent.and_then(|p| self.views.get_mut(&p)) {
            old.children.retain(|c| *c != id);
        }

        if let Some(view) = self.views.get_mut(&id) {
            view.parent = parent;
        }
        if let Some(new) = parent.and_then(|p| self.views.get_mut(&p)) {
            new.children.insert(0, id);
        }

        Ok(())
    }

    /// Whether `ancestor` is `id` or one of its parents.
    pub(super) fn is_ancestor(&self, ancestor: ViewId, id: ViewId) -> bool {
        let mut node = Some(id);
        while let Some(n) = node {
            if n == ancestor {
                return true;
            }
            node = self.views.get(&n).and_then(|v| v.parent);
        }
        false
    }

    /// Gives a view keyboard focus on a seat, raising it. `None` clears view focus.
    ///
    /// Fullscreen views on other outputs the focused view overlaps are un-fullscreened. While
    /// the seat's keyboard is held by a layer surface, the view is raised and remembered but not
    /// activated.
    pub fn focus_view(&mut self, seat: SeatId, view: Option<ViewId>) {
        let _span = tracy_client::span!("Scene::focus_view");

        let Some(prev) = self.seat(seat).map(|s| s.focused_view) else {
            return;
        };

        if let Some(id) = view {
            if !self.views.get(&id).is_some_and(|v| v.is_mapped()) {
                return;
            }

            self.raise_view(id);

            let geometry = self.views.get(&id).map(|v| v.geometry());
            let covered: Vec<_> = self
                .outputs
                .iter()
                .filter(|o| o.is_enabled())
                .filter(|o| geometry.is_some_and(|geo| o.geometry().overlaps(geo)))
                .filter_map(|o| o.fullscreen_view)
                .filter(|fs| *fs != id)
                .collect();
            for fs in covered {
                self.set_fullscreen(fs, false, None);
            }
        }

        if view.is_some() && view == prev {
            return;
        }

        if let Some(s) = self.seat_mut(seat) {
            s.focused_view = None;
        }
        if let Some(prev) = prev {
            if !self.view_has_focus(prev) {
                self.set_view_activated(prev, false);
            }
        }

        let Some(id) = view else {
            self.emit(SceneEvent::KeyboardFocusView { seat, view: None });
            return;
        };

        let Some(s) = self.seat_mut(seat) else {
            return;
        };
        s.focus_history.retain(|v| *v != id);
        s.focus_history.insert(0, id);
        if s.focused_layer.is_some() {
            return;
        }
        s.focused_view = Some(id);

        self.set_view_activated(id, true);
        self.emit(SceneEvent::KeyboardFocusView {
            seat,
            view: Some(id),
        });
    }
}
