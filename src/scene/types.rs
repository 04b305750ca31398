//! Plain data types shared across the scene.

use std::fmt;
use std::time::Duration;

use bitflags::bitflags;
use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::utils::id::IdCounter;

// =============================================================================
// Ids
// =============================================================================

macro_rules! scene_id {
    ($name:ident, $counter:ident, $prefix:literal) => {
        static $counter: IdCounter = IdCounter::new();

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub fn next() -> Self {
                Self($counter.next())
            }

            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

scene_id!(OutputId, OUTPUT_ID_COUNTER, "output#");
scene_id!(ViewId, VIEW_ID_COUNTER, "view#");
scene_id!(LayerSurfaceId, LAYER_SURFACE_ID_COUNTER, "layer#");
scene_id!(SurfaceId, SURFACE_ID_COUNTER, "surface#");
scene_id!(SeatId, SEAT_ID_COUNTER, "seat#");

// =============================================================================
// PointContents
// =============================================================================

bitflags! {
    /// Parts of a server-side decoration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DecoPart: u32 {
        const TOP_BORDER = 1 << 0;
        const BOTTOM_BORDER = 1 << 1;
        const LEFT_BORDER = 1 << 2;
        const RIGHT_BORDER = 1 << 3;
        const TITLEBAR = 1 << 4;
    }
}

/// What is under a point in the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PointContents {
    /// Output under the point.
    pub output: Option<OutputId>,
    /// Surface under the point, and the point in its local coordinates.
    pub surface: Option<(SurfaceId, Point<f64, Logical>)>,
    /// View owning the surface or decoration under the point.
    pub view: Option<ViewId>,
    /// Layer surface owning the surface under the point.
    pub layer: Option<LayerSurfaceId>,
    /// Decoration parts under the point, empty unless a decoration was hit.
    pub decoration: DecoPart,
}

impl Default for PointContents {
    fn default() -> Self {
        Self {
            output: None,
            surface: None,
            view: None,
            layer: None,
            decoration: DecoPart::empty(),
        }
    }
}

impl PointContents {
    /// Whether nothing at all was hit.
    pub fn is_empty(&self) -> bool {
        self.surface.is_none() && self.view.is_none() && self.layer.is_none()
    }
}

// =============================================================================
// Events
// =============================================================================

/// Notifications for collaborators that observe the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    ViewMapped(ViewId),
    ViewUnmapped(ViewId),
    ViewDestroyed(ViewId),
    /// The keyboard of a seat must focus this layer surface, or stop focusing layers.
    KeyboardFocusLayer {
        seat: SeatId,
        layer: Option<LayerSurfaceId>,
    },
    /// A view got keyboard focus on a seat.
    KeyboardFocusView { seat: SeatId, view: Option<ViewId> },
    /// Content moved under the pointer of a seat without pointer motion.
    PointerRefocus(SeatId),
    UsableAreaChanged {
        output: OutputId,
        area: Rectangle<i32, Logical>,
    },
    /// An output received damage and needs a frame.
    FrameScheduled(OutputId),
}

bitflags! {
    /// States sent to a toplevel with a configure.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToplevelStates: u32 {
        const ACTIVATED = 1 << 0;
        const MAXIMIZED = 1 << 1;
        const FULLSCREEN = 1 << 2;
        const TILED_LEFT = 1 << 3;
        const TILED_RIGHT = 1 << 4;
        const TILED = Self::TILED_LEFT.bits() | Self::TILED_RIGHT.bits();
    }
}

/// Messages the scene wants delivered to clients.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    ConfigureView {
        view: ViewId,
        serial: Option<u32>,
        size: Size<i32, Logical>,
        states: ToplevelStates,
    },
    CloseView(ViewId),
    ClosePopup(SurfaceId),
    ConfigureLayerSurface {
        layer: LayerSurfaceId,
        size: Size<i32, Logical>,
    },
    CloseLayerSurface(LayerSurfaceId),
    FrameDone { surface: SurfaceId, time: Duration },
}

// =============================================================================
// Misc
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderResult {
    /// The output is disabled.
    Skipped,
    /// A client buffer was handed to the output directly.
    ScannedOut,
    /// Nothing was damaged, the frame was committed without painting.
    NoDamage,
    /// A composited frame was committed.
    Submitted,
    /// The backend refused the frame.
    Dropped,
}

/// Reparenting would create a cycle in the view tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleError {
    pub view: ViewId,
    pub parent: ViewId,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot make {} the parent of {}: it is the view itself or one of its descendants",
            self.parent, self.view
        )
    }
}

impl std::error::Error for CycleError {}
