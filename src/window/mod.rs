//! Window protocol variants backing a view.
//!
//! The scene never talks to a protocol directly. It calls the [`ToplevelSurface`] capabilities
//! on [`Toplevel`], which is a closed set of the protocols a view can come from, and turns the
//! results into client requests.

use smithay::utils::{Logical, Rectangle, Size};

use crate::scene::{ToplevelStates, ViewId};

mod xdg;
mod xwayland;

pub use self::xdg::XdgToplevel;
pub use self::xwayland::XwaylandSurface;

/// Capabilities every window protocol provides to the scene.
pub trait ToplevelSurface {
    /// Clamps a requested size to what the client accepts.
    fn constrain_size(&self, size: Size<i32, Logical>) -> Size<i32, Logical>;

    /// Records a configure for the client.
    ///
    /// Returns the serial of the configure when the client is expected to acknowledge it before
    /// its geometry can be trusted.
    fn configure(&mut self, size: Size<i32, Logical>, states: ToplevelStates) -> Option<u32>;

    /// Records that the client acknowledged the configure with `serial`.
    fn ack_configure(&mut self, serial: u32);

    /// Last acknowledged configure serial, 0 if none.
    fn acked_serial(&self) -> u32;

    /// The window geometry within a root surface of `surface_size`.
    fn window_geometry(&self, surface_size: Size<i32, Logical>) -> Rectangle<i32, Logical>;

    /// Whether the view wants to be maximized when the compositor auto-maximizes.
    fn want_auto_maximize(&self, has_parent: bool) -> bool;

    /// The parent in the protocol's own window tree, if any.
    fn native_parent(&self) -> Option<ViewId> {
        None
    }

    /// Whether popups of this window live inside its surface tree.
    fn has_popups(&self) -> bool;
}

/// A view's window protocol.
#[derive(Debug)]
pub enum Toplevel {
    Xdg(XdgToplevel),
    XdgV6(XdgToplevel),
    Xwayland(XwaylandSurface),
}

impl Toplevel {
    pub fn is_xwayland(&self) -> bool {
        matches!(self, Self::Xwayland(_))
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Toplevel::Xdg(_) => "xdg-shell",
            Toplevel::XdgV6(_) => "xdg-shell-v6",
            Toplevel::Xwayland(_) => "xwayland",
        }
    }

    pub fn set_window_geometry(&mut self, geometry: Rectangle<i32, Logical>) {
        match self {
            Toplevel::Xdg(xdg) | Toplevel::XdgV6(xdg) => xdg.set_geometry(geometry),
            // X11 windows have no client-side geometry offset.
            Toplevel::Xwayland(_) => (),
        }
    }

    fn inner(&self) -> &dyn ToplevelSurface {
        match self {
            Toplevel::Xdg(xdg) | Toplevel::XdgV6(xdg) => xdg,
            Toplevel::Xwayland(x) => x,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ToplevelSurface {
        match self {
            Toplevel::Xdg(xdg) | Toplevel::XdgV6(xdg) => xdg,
            Toplevel::Xwayland(x) => x,
        }
    }
}

impl ToplevelSurface for Toplevel {
    fn constrain_size(&self, size: Size<i32, Logical>) -> Size<i32, Logical> {
        self.inner().constrain_size(size)
    }

    fn configure(&mut self, size: Size<i32, Logical>, states: ToplevelStates) -> Option<u32> {
        match self {
            // zxdg_toplevel_v6 has no tiled states.
            Toplevel::XdgV6(xdg) => xdg.configure(size, states - ToplevelStates::TILED),
            _ => self.inner_mut().configure(size, states),
        }
    }

    fn ack_configure(&mut self, serial: u32) {
        self.inner_mut().ack_configure(serial)
    }

    fn acked_serial(&self) -> u32 {
        self.inner().acked_serial()
    }

    fn window_geometry(&self, surface_size: Size<i32, Logical>) -> Rectangle<i32, Logical> {
        self.inner().window_geometry(surface_size)
    }

    fn want_auto_maximize(&self, has_parent: bool) -> bool {
        self.inner().want_auto_maximize(has_parent)
    }

    fn native_parent(&self) -> Option<ViewId> {
        self.inner().native_parent()
    }

    fn has_popups(&self) -> bool {
        self.inner().has_popups()
    }
}
