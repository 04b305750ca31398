//! Geometry helpers shared by the scene.
//!
//! Three coordinate spaces are in use and conversions between them are always spelled out:
//! layout space (global), output space (relative to an output's layout origin) and
//! surface-local space (relative to a view or layer surface origin, after its rotation and
//! scale).

use smithay::utils::{Logical, Physical, Point, Rectangle, Size};

pub mod id;
pub mod region;

pub fn center(rect: Rectangle<i32, Logical>) -> Point<i32, Logical> {
    rect.loc + rect.size.downscale(2).to_point()
}

pub fn center_f64(rect: Rectangle<f64, Logical>) -> Point<f64, Logical> {
    rect.loc + rect.size.downscale(2.0).to_point()
}

/// Returns the point inside `rect` closest to `pos`.
pub fn closest_point(rect: Rectangle<i32, Logical>, pos: Point<f64, Logical>) -> Point<f64, Logical> {
    let max_x = rect.loc.x + (rect.size.w - 1).max(0);
    let max_y = rect.loc.y + (rect.size.h - 1).max(0);

    Point::new(
        pos.x.clamp(f64::from(rect.loc.x), f64::from(max_x)),
        pos.y.clamp(f64::from(rect.loc.y), f64::from(max_y)),
    )
}

/// Rotates a child's offset about the center of its parent.
///
/// `pos` is the child's offset inside the unrotated parent. The result is the offset at which
/// the child must be placed so that it lands where the rotated parent shows it.
pub fn rotate_child_position(
    pos: Point<f64, Logical>,
    child_size: Size<f64, Logical>,
    parent_size: Size<f64, Logical>,
    rotation: f32,
) -> Point<f64, Logical> {
    if rotation == 0. {
        return pos;
    }

    // Coordinates relative to the center of the parent.
    let cx = pos.x - parent_size.w / 2. + child_size.w / 2.;
    let cy = pos.y - parent_size.h / 2. + child_size.h / 2.;

    let (sin, cos) = f64::from(rotation).sin_cos();
    let rx = cos * cx - sin * cy;
    let ry = cos * cy + sin * cx;

    Point::new(
        rx + parent_size.w / 2. - child_size.w / 2.,
        ry + parent_size.h / 2. - child_size.h / 2.,
    )
}

fn scale_length(length: i32, offset: i32, scale: f64) -> i32 {
    (f64::from(offset + length) * scale).round() as i32 - (f64::from(offset) * scale).round() as i32
}

/// Scales a box, rounding its edges rather than its size.
///
/// Rounding both edges keeps boxes that touch before scaling touching afterwards.
pub fn scale_box<Kind>(rect: Rectangle<i32, Kind>, scale: f64) -> Rectangle<i32, Kind> {
    let w = scale_length(rect.size.w, rect.loc.x, scale);
    let h = scale_length(rect.size.h, rect.loc.y, scale);
    let x = (f64::from(rect.loc.x) * scale).round() as i32;
    let y = (f64::from(rect.loc.y) * scale).round() as i32;
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

/// Scales an output-space box into the output's buffer.
pub fn to_physical_box(rect: Rectangle<i32, Logical>, scale: f64) -> Rectangle<i32, Physical> {
    let rect = scale_box(rect, scale);
    Rectangle::new(
        Point::new(rect.loc.x, rect.loc.y),
        Size::new(rect.size.w, rect.size.h),
    )
}

/// Axis-aligned bounds of `rect` rotated about its own center.
pub fn rotated_bounds<Kind>(rect: Rectangle<i32, Kind>, rotation: f32) -> Rectangle<i32, Kind> {
    if rotation == 0. {
        return rect;
    }

    let x = f64::from(rect.loc.x);
    let y = f64::from(rect.loc.y);
    let w = f64::from(rect.size.w);
    let h = f64::from(rect.size.h);

    let ox = x + w / 2.;
    let oy = y + h / 2.;

    let (sin, cos) = f64::from(rotation).sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());

    let x1 = ox + (x - ox) * cos + (y - oy) * sin;
    let x2 = ox + (x + w - ox) * cos + (y + h - oy) * sin;
    let y1 = oy + (x - ox) * sin + (y - oy) * cos;
    let y2 = oy + (x + w - ox) * sin + (y + h - oy) * cos;

    Rectangle::new(
        Point::new(x1.min(x2).floor() as i32, y1.min(y2).floor() as i32),
        Size::new(
            (x1.max(x2) - x1.min(x2)).ceil() as i32,
            (y1.max(y2) - y1.min(y2)).ceil() as i32,
        ),
    )
}

/// Axis-aligned bounds of `rect` rotated about `pivot`.
pub fn rotated_bounds_about<Kind>(
    rect: Rectangle<i32, Kind>,
    rotation: f32,
    pivot: Point<f64, Kind>,
) -> Rectangle<i32, Kind> {
    if rotation == 0. {
        return rect;
    }

    let (sin, cos) = f64::from(rotation).sin_cos();
    let x1 = f64::from(rect.loc.x) - pivot.x;
    let y1 = f64::from(rect.loc.y) - pivot.y;
    let x2 = x1 + f64::from(rect.size.w);
    let y2 = y1 + f64::from(rect.size.h);

    let corners = [(x1, y1), (x2, y1), (x2, y2), (x1, y2)].map(|(x, y)| {
        (x * cos - y * sin, x * sin + y * cos)
    });
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in corners {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    let loc = Point::new((min_x + pivot.x).floor() as i32, (min_y + pivot.y).floor() as i32);
    let end = Point::new((max_x + pivot.x).ceil() as i32, (max_y + pivot.y).ceil() as i32);
    Rectangle::new(loc, Size::new(end.x - loc.x, end.y - loc.y))
}

/// Grows a box by `amount` on every side.
pub fn expand_box<Kind>(rect: Rectangle<i32, Kind>, amount: i32) -> Rectangle<i32, Kind> {
    Rectangle::new(
        Point::new(rect.loc.x - amount, rect.loc.y - amount),
        Size::new(rect.size.w + amount * 2, rect.size.h + amount * 2),
    )
}

pub fn is_empty_box<Kind>(rect: &Rectangle<i32, Kind>) -> bool {
    rect.size.w <= 0 || rect.size.h <= 0
}
