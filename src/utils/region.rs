//! Sets of integer rectangles used for damage.

use std::fmt;

use smithay::utils::{Point, Rectangle, Size, Transform};

use super::{expand_box, is_empty_box};

/// Past this many rectangles a region collapses into its bounding box.
const MAX_RECTS: usize = 16;

/// A union of rectangles.
///
/// Rectangles fully covered by another one are dropped on insertion, overlapping ones are kept
/// as is. Consumers only ever iterate the rectangles, so exact coverage is not needed.
pub struct Region<Kind> {
    rects: Vec<Rectangle<i32, Kind>>,
}

impl<Kind> Region<Kind> {
    pub fn new() -> Self {
        Self { rects: Vec::new() }
    }

    pub fn from_rect(rect: Rectangle<i32, Kind>) -> Self {
        let mut region = Self::new();
        region.add(rect);
        region
    }

    pub fn add(&mut self, rect: Rectangle<i32, Kind>) {
        if is_empty_box(&rect) {
            return;
        }

        if self.rects.iter().any(|r| r.contains_rect(rect)) {
            return;
        }

        self.rects.retain(|r| !rect.contains_rect(*r));
        self.rects.push(rect);

        if self.rects.len() > MAX_RECTS {
            let bbox = self.rects.iter().copied().reduce(Rectangle::merge);
            self.rects.clear();
            self.rects.extend(bbox);
        }
    }

    pub fn union(&mut self, other: &Region<Kind>) {
        for rect in &other.rects {
            self.add(*rect);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn rects(&self) -> &[Rectangle<i32, Kind>] {
        &self.rects
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Returns whether some single rectangle of the region covers `rect`.
    pub fn covers(&self, rect: Rectangle<i32, Kind>) -> bool {
        self.rects.iter().any(|r| r.contains_rect(rect))
    }

    pub fn overlaps(&self, rect: Rectangle<i32, Kind>) -> bool {
        self.rects.iter().any(|r| r.overlaps(rect))
    }

    pub fn intersect(&self, rect: Rectangle<i32, Kind>) -> Self {
        let mut region = Self::new();
        for r in &self.rects {
            if let Some(intersection) = r.intersection(rect) {
                region.add(intersection);
            }
        }
        region
    }

    pub fn translate(&self, offset: Point<i32, Kind>) -> Self {
        let mut region = Self::new();
        for r in &self.rects {
            region.add(Rectangle::new(r.loc + offset, r.size));
        }
        region
    }

    pub fn expand(&self, amount: i32) -> Self {
        let mut region = Self::new();
        for r in &self.rects {
            region.add(expand_box(*r, amount));
        }
        region
    }

    /// Applies `transform` to every rectangle inside an area of `size`.
    pub fn transform(&self, transform: Transform, size: Size<i32, Kind>) -> Self {
        let mut region = Self::new();
        for r in &self.rects {
            region.add(transform.transform_rect_in(*r, &size));
        }
        region
    }
}

impl<Kind> Default for Region<Kind> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Kind> Clone for Region<Kind> {
    fn clone(&self) -> Self {
        Self {
            rects: self.rects.clone(),
        }
    }
}

impl<Kind> fmt::Debug for Region<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rects.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use smithay::utils::Physical;

    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Physical> {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn add_drops_covered_rects() {
        let mut region = Region::new();
        region.add(rect(10, 10, 10, 10));
        region.add(rect(12, 12, 2, 2));
        assert_eq!(region.rects(), &[rect(10, 10, 10, 10)]);

        region.add(rect(0, 0, 100, 100));
        assert_eq!(region.rects(), &[rect(0, 0, 100, 100)]);

        region.add(rect(5, 5, 0, 10));
        assert_eq!(region.rects().len(), 1);
    }

    #[test]
    fn many_rects_collapse_into_bounds() {
        let mut region = Region::new();
        for i in 0..MAX_RECTS as i32 {
            region.add(rect(i * 10, i * 5, 8, 8));
        }
        assert_eq!(region.rects().len(), MAX_RECTS);

        region.add(rect(-4, 300, 2, 2));
        let last = MAX_RECTS as i32 - 1;
        assert_eq!(region.rects(), &[rect(-4, 0, last * 10 + 12, 302)]);

        // Further damage inside the bounds is already covered.
        region.add(rect(20, 20, 30, 30));
        assert_eq!(region.rects().len(), 1);
    }

    #[test]
    fn intersect_clips_to_rect() {
        let mut region = Region::new();
        region.add(rect(-10, -10, 20, 20));
        region.add(rect(90, 90, 20, 20));
        region.add(rect(200, 200, 5, 5));

        let clipped = region.intersect(rect(0, 0, 100, 100));
        assert_eq!(clipped.rects(), &[rect(0, 0, 10, 10), rect(90, 90, 10, 10)]);
    }

    #[test]
    fn expand_and_translate() {
        let region = Region::from_rect(rect(10, 10, 10, 10));
        let region = region.expand(1).translate(Point::new(5, -5));
        assert_eq!(region.rects(), &[rect(14, 4, 12, 12)]);
    }

    #[test]
    fn transform_flips_inside_area() {
        let region = Region::from_rect(rect(0, 0, 10, 20));
        let flipped = region.transform(Transform::_180, Size::new(100, 50));
        assert_eq!(flipped.rects(), &[rect(90, 30, 10, 20)]);
    }
}
