//! Surface trees as seen by the scene.
//!
//! A [`Surface`] mirrors the committed state of a client surface together with its
//! sub-surfaces and popups. Only what the scene needs for placement, hit testing and damage is
//! kept.

use smithay::utils::{Logical, Point, Rectangle, Size, Transform};

use super::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    /// The main surface of a view, layer surface or drag icon.
    Root,
    Subsurface,
    Popup,
}

/// State carried by a client commit.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceState {
    /// Size in surface-local coordinates, zero when no buffer is attached.
    pub size: Size<i32, Logical>,
    pub buffer_scale: i32,
    pub buffer_transform: Transform,
    /// Damage in surface-local coordinates.
    pub damage: Vec<Rectangle<i32, Logical>>,
    /// `None` accepts input on the whole surface.
    pub input_region: Option<Vec<Rectangle<i32, Logical>>>,
}

impl SurfaceState {
    pub fn with_size(size: Size<i32, Logical>) -> Self {
        Self {
            size,
            buffer_scale: 1,
            buffer_transform: Transform::Normal,
            damage: Vec::new(),
            input_region: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Surface {
    id: SurfaceId,
    role: SurfaceRole,
    /// Offset from the parent surface.
    loc: Point<i32, Logical>,
    state: SurfaceState,
    /// Children in stacking order, topmost last.
    children: Vec<Surface>,
}

impl Surface {
    pub fn new(id: SurfaceId, state: SurfaceState) -> Self {
        Self::with_role(id, SurfaceRole::Root, Point::new(0, 0), state)
    }

    pub fn with_role(
        id: SurfaceId,
        role: SurfaceRole,
        loc: Point<i32, Logical>,
        state: SurfaceState,
    ) -> Self {
        Self {
            id,
            role,
            loc,
            state,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    pub fn loc(&self) -> Point<i32, Logical> {
        self.loc
    }

    pub fn set_loc(&mut self, loc: Point<i32, Logical>) {
        self.loc = loc;
    }

    pub fn size(&self) -> Size<i32, Logical> {
        self.state.size
    }

    pub fn buffer_scale(&self) -> i32 {
        self.state.buffer_scale
    }

    pub fn buffer_transform(&self) -> Transform {
        self.state.buffer_transform
    }

    pub fn damage(&self) -> &[Rectangle<i32, Logical>] {
        &self.state.damage
    }

    pub fn children(&self) -> &[Surface] {
        &self.children
    }

    pub fn has_buffer(&self) -> bool {
        self.state.size.w > 0 && self.state.size.h > 0
    }

    /// Applies a commit, merging its damage with damage not yet consumed.
    pub fn commit(&mut self, mut state: SurfaceState) {
        let mut damage = std::mem::take(&mut self.state.damage);
        damage.append(&mut state.damage);
        state.damage = damage;
        self.state = state;
    }

    fn accepts_input(&self, pos: Point<f64, Logical>) -> bool {
        if !self.has_buffer() {
            return false;
        }

        let bounds = Rectangle::new(Point::new(0, 0), self.state.size).to_f64();
        if !bounds.contains(pos) {
            return false;
        }

        match &self.state.input_region {
            None => true,
            Some(rects) => rects.iter().any(|r| r.to_f64().contains(pos)),
        }
    }

    /// Finds the topmost surface accepting input at `pos`, relative to this surface.
    ///
    /// Popups are tested before sub-surfaces, then this surface itself.
    pub fn surface_under(&self, pos: Point<f64, Logical>) -> Option<(SurfaceId, Point<f64, Logical>)> {
        let child_under = |role| {
            self.children
                .iter()
                .rev()
                .filter(|child| child.role == role)
                .find_map(|child| child.surface_under(pos - child.loc.to_f64()))
        };

        child_under(SurfaceRole::Popup)
            .or_else(|| child_under(SurfaceRole::Subsurface))
            .or_else(|| self.accepts_input(pos).then_some((self.id, pos)))
    }

    /// Calls `f` for this surface and every descendant, bottom to top, with each surface's
    /// offset from this surface.
    pub fn for_each(&self, f: &mut dyn FnMut(&Surface, Point<i32, Logical>)) {
        self.for_each_inner(Point::new(0, 0), f);
    }

    fn for_each_inner(&self, offset: Point<i32, Logical>, f: &mut dyn FnMut(&Surface, Point<i32, Logical>)) {
        f(self, offset);
        for child in &self.children {
            child.for_each_inner(offset + child.loc, f);
        }
    }

    pub fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Surface)) {
        f(self);
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: SurfaceId) -> Option<&Surface> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Adds `child` on top of the children of the surface `parent`.
    ///
    /// Returns the child back if `parent` is not part of this tree.
    pub fn add_child(&mut self, parent: SurfaceId, child: Surface) -> Result<(), Surface> {
        match self.find_mut(parent) {
            Some(surface) => {
                surface.children.push(child);
                Ok(())
            }
            None => Err(child),
        }
    }

    /// Removes a descendant and its own subtree.
    pub fn remove_child(&mut self, id: SurfaceId) -> Option<Surface> {
        if let Some(idx) = self.children.iter().position(|child| child.id == id) {
            return Some(self.children.remove(idx));
        }
        self.children.iter_mut().find_map(|child| child.remove_child(id))
    }

    pub fn popups(&self) -> Vec<SurfaceId> {
        let mut popups = Vec::new();
        self.for_each(&mut |surface, _| {
            if surface.role == SurfaceRole::Popup {
                popups.push(surface.id);
            }
        });
        popups
    }

    pub fn clear_damage(&mut self) {
        self.for_each_mut(&mut |surface| surface.state.damage.clear());
    }
}
