use smithay::utils::{Logical, Point, Rectangle, Size};

use super::ToplevelSurface;
use crate::scene::ToplevelStates;

/// State of an xdg toplevel the scene cares about.
#[derive(Debug, Default)]
pub struct XdgToplevel {
    pub min_size: Size<i32, Logical>,
    pub max_size: Size<i32, Logical>,
    geometry: Option<Rectangle<i32, Logical>>,
    last_serial: u32,
    acked_serial: u32,
}

impl XdgToplevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size_limits(min_size: Size<i32, Logical>, max_size: Size<i32, Logical>) -> Self {
        Self {
            min_size,
            max_size,
            ..Self::default()
        }
    }

    pub fn set_geometry(&mut self, geometry: Rectangle<i32, Logical>) {
        self.geometry = Some(geometry);
    }
}

impl ToplevelSurface for XdgToplevel {
    fn constrain_size(&self, size: Size<i32, Logical>) -> Size<i32, Logical> {
        let mut size = size;

        // Zero means unset for both limits.
        if self.min_size.w > 0 && size.w < self.min_size.w {
            size.w = self.min_size.w;
        }
        if self.min_size.h > 0 && size.h < self.min_size.h {
            size.h = self.min_size.h;
        }
        if self.max_size.w > 0 && size.w > self.max_size.w {
            size.w = self.max_size.w;
        }
        if self.max_size.h > 0 && size.h > self.max_size.h {
            size.h = self.max_size.h;
        }

        size
    }

    fn configure(&mut self, _size: Size<i32, Logical>, _states: ToplevelStates) -> Option<u32> {
        self.last_serial = self.last_serial.wrapping_add(1).max(1);
        Some(self.last_serial)
    }

    fn ack_configure(&mut self, serial: u32) {
        if serial > self.last_serial {
            warn!("client acked unknown configure serial {serial}");
            return;
        }
        self.acked_serial = serial;
    }

    fn acked_serial(&self) -> u32 {
        self.acked_serial
    }

    fn window_geometry(&self, surface_size: Size<i32, Logical>) -> Rectangle<i32, Logical> {
        self.geometry
            .unwrap_or_else(|| Rectangle::new(Point::new(0, 0), surface_size))
    }

    fn want_auto_maximize(&self, has_parent: bool) -> bool {
        // Dialogs keep their own size.
        !has_parent
    }

    fn has_popups(&self) -> bool {
        true
    }
}
