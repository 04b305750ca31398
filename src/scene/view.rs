use smithay::utils::{Logical, Point, Rectangle, Size};

use super::{DecoPart, OutputId, Surface, ToplevelStates, ViewId};
use crate::window::Toplevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Normal,
    Maximized,
    Tiled(TileDirection),
    Fullscreen,
}

/// What a view goes back to when it leaves maximized, tiled or fullscreen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedState {
    pub geometry: Rectangle<i32, Logical>,
    pub rotation: f32,
    pub state: ViewState,
}

/// A move-resize waiting for the client to commit the configured size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PendingMoveResize {
    pub serial: u32,
    pub update_x: bool,
    pub update_y: bool,
    /// Requested box, with the position already adjusted for the constrained size.
    pub target: Rectangle<i32, Logical>,
}

#[derive(Debug)]
pub struct View {
    id: ViewId,
    pub(super) toplevel: Toplevel,
    /// Root surface tree, present while mapped.
    pub(super) surface: Option<Surface>,
    /// Layout position of the root surface and size of the window geometry.
    pub(super) geometry: Rectangle<i32, Logical>,
    /// Radians, clockwise.
    pub(super) rotation: f32,
    /// Scale-to-fit factor.
    pub(super) scale: f64,
    pub(super) alpha: f32,
    pub(super) decorated: bool,
    pub(super) border_width: i32,
    pub(super) titlebar_height: i32,
    pub(super) state: ViewState,
    pub(super) saved: SavedState,
    pub(super) fullscreen_output: Option<OutputId>,
    pub(super) parent: Option<ViewId>,
    /// Child views, topmost first.
    pub(super) children: Vec<ViewId>,
    pub(super) title: Option<String>,
    pub(super) app_id: Option<String>,
    pub(super) activated: bool,
    /// States sent with the last configure.
    pub(super) configured_states: ToplevelStates,
    pub(super) pending_move_resize: Option<PendingMoveResize>,
}

impl View {
    pub(super) fn new(id: ViewId, toplevel: Toplevel) -> Self {
        let geometry = Rectangle::from_size(Size::new(0, 0));
        Self {
            id,
            toplevel,
            surface: None,
            geometry,
            rotation: 0.,
            scale: 1.,
            alpha: 1.,
            decorated: false,
            border_width: 0,
            titlebar_height: 0,
            state: ViewState::Normal,
            saved: SavedState {
                geometry,
                rotation: 0.,
                state: ViewState::Normal,
            },
            fullscreen_output: None,
            parent: None,
            children: Vec::new(),
            title: None,
            app_id: None,
            activated: false,
            configured_states: ToplevelStates::empty(),
            pending_move_resize: None,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn toplevel(&self) -> &Toplevel {
        &self.toplevel
    }

    pub fn is_mapped(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        self.geometry
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn saved(&self) -> SavedState {
        self.saved
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen_output.is_some()
    }

    pub fn is_maximized(&self) -> bool {
        self.state == ViewState::Maximized
    }

    pub fn fullscreen_output(&self) -> Option<OutputId> {
        self.fullscreen_output
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    /// Child views, topmost first.
    pub fn children(&self) -> &[ViewId] {
        &self.children
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    /// Whether the decoration is on screen. Fullscreen views are drawn without one.
    pub fn shows_decoration(&self) -> bool {
        self.decorated && !self.is_fullscreen()
    }

    pub fn border_width(&self) -> i32 {
        self.border_width
    }

    pub fn titlebar_height(&self) -> i32 {
        self.titlebar_height
    }

    /// Box including the server-side decoration.
    pub fn deco_box(&self) -> Rectangle<i32, Logical> {
        let mut rect = self.geometry;
        if !self.decorated {
            return rect;
        }

        let bw = self.border_width;
        let th = self.titlebar_height;
        rect.loc.x -= bw;
        rect.loc.y -= bw + th;
        rect.size.w += bw * 2;
        rect.size.h += bw * 2 + th;
        rect
    }

    /// Decoration parts at a point relative to the root surface.
    pub fn deco_part(&self, pos: Point<f64, Logical>) -> DecoPart {
        if !self.shows_decoration() {
            return DecoPart::empty();
        }
        let Some(surface) = &self.surface else {
            return DecoPart::empty();
        };

        let sw = f64::from(surface.size().w);
        let sh = f64::from(surface.size().h);
        let bw = f64::from(self.border_width);
        let th = f64::from(self.titlebar_height);
        let (sx, sy) = (pos.x, pos.y);

        if sx > 0. && sx < sw && sy < 0. && sy > -th {
            return DecoPart::TITLEBAR;
        }

        let mut parts = DecoPart::empty();
        if sy >= -(th + bw) && sy <= sh + bw {
            if sx < 0. && sx > -bw {
                parts |= DecoPart::LEFT_BORDER;
            } else if sx > sw && sx < sw + bw {
                parts |= DecoPart::RIGHT_BORDER;
            }
        }

        if sx >= -bw && sx <= sw + bw {
            if sy > sh && sy <= sh + bw {
                parts |= DecoPart::BOTTOM_BORDER;
            } else if sy >= -(th + bw) && sy < 0. {
                parts |= DecoPart::TOP_BORDER;
            }
        }

        parts
    }

    /// States to send with the next configure.
    pub fn toplevel_states(&self) -> ToplevelStates {
        let mut states = ToplevelStates::empty();
        if self.activated {
            states |= ToplevelStates::ACTIVATED;
        }
        match self.state {
            ViewState::Normal => (),
            ViewState::Maximized => states |= ToplevelStates::MAXIMIZED,
            ViewState::Tiled(TileDirection::Left) => {
                states |= ToplevelStates::MAXIMIZED | ToplevelStates::TILED_LEFT
            }
            ViewState::Tiled(TileDirection::Right) => {
                states |= ToplevelStates::MAXIMIZED | ToplevelStates::TILED_RIGHT
            }
            ViewState::Fullscreen => states |= ToplevelStates::FULLSCREEN,
        }
        states
    }
}
