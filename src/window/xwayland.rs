use smithay::utils::{Logical, Point, Rectangle, Size};

use super::ToplevelSurface;
use crate::scene::{ToplevelStates, ViewId};

/// State of an X11 window the scene cares about.
#[derive(Debug, Default)]
pub struct XwaylandSurface {
    /// WM_NORMAL_HINTS min and max size, zero when unset.
    pub min_size: Size<i32, Logical>,
    pub max_size: Size<i32, Logical>,
    parent: Option<ViewId>,
}

impl XwaylandSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_parent(&mut self, parent: Option<ViewId>) {
        self.parent = parent;
    }

    fn is_fixed_size(&self) -> bool {
        self.min_size.w > 0
            && self.min_size.h > 0
            && self.min_size == self.max_size
    }
}

impl ToplevelSurface for XwaylandSurface {
    fn constrain_size(&self, size: Size<i32, Logical>) -> Size<i32, Logical> {
        let mut size = size;
        if self.min_size.w > 0 {
            size.w = size.w.max(self.min_size.w);
        }
        if self.min_size.h > 0 {
            size.h = size.h.max(self.min_size.h);
        }
        if self.max_size.w > 0 {
            size.w = size.w.min(self.max_size.w);
        }
        if self.max_size.h > 0 {
            size.h = size.h.min(self.max_size.h);
        }
        size
    }

    fn configure(&mut self, _size: Size<i32, Logical>, _states: ToplevelStates) -> Option<u32> {
        // X11 configures are applied by the server right away.
        None
    }

    fn ack_configure(&mut self, _serial: u32) {}

    fn acked_serial(&self) -> u32 {
        0
    }

    fn window_geometry(&self, surface_size: Size<i32, Logical>) -> Rectangle<i32, Logical> {
        Rectangle::new(Point::new(0, 0), surface_size)
    }

    fn want_auto_maximize(&self, has_parent: bool) -> bool {
        !has_parent && self.parent.is_none() && !self.is_fixed_size()
    }

    fn native_parent(&self) -> Option<ViewId> {
        self.parent
    }

    fn has_popups(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_size_windows_are_not_auto_maximized() {
        let mut x = XwaylandSurface::new();
        assert!(x.want_auto_maximize(false));
        assert!(!x.want_auto_maximize(true));

        x.min_size = Size::new(300, 200);
        x.max_size = Size::new(300, 200);
        assert!(!x.want_auto_maximize(false));
        assert_eq!(x.constrain_size(Size::new(1000, 10)), Size::new(300, 200));
    }
}
