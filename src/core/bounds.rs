use serde::{Deserialize, Serialize};

/// A rectangle in pixel coordinates.
///
/// `right` and `bottom` are exclusive, like an image crop box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    /// Creates new bounds from the four edges, normalizing their order
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Creates bounds from a top-left position and size
    pub fn from_size(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self::new(left, top, left + width as i32, top + height as i32)
    }

    /// Gets the width of the bounds
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    /// Gets the height of the bounds
    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Returns a copy moved by the given offset
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    /// Gets the intersection of two bounds
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);

        if left >= right || top >= bottom {
            return None;
        }

        Some(Bounds {
            left,
            top,
            right,
            bottom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_normalized() {
        let b = Bounds::new(10, 20, 0, 5);
        assert_eq!(b, Bounds::new(0, 5, 10, 20));
        assert_eq!(b.width(), 10);
        assert_eq!(b.height(), 15);
    }

    #[test]
    fn test_bounds_contains() {
        let b = Bounds::from_size(0, 0, 10, 10);
        assert!(b.contains(0, 0));
        assert!(b.contains(9, 9));
        assert!(!b.contains(10, 5));
    }

    #[test]
    fn test_bounds_intersection() {
        let a = Bounds::from_size(0, 0, 10, 10);
        let b = Bounds::from_size(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Bounds::new(5, 5, 10, 10)));

        let c = Bounds::from_size(20, 20, 5, 5);
        assert_eq!(a.intersection(&c), None);
        assert_eq!(a.translated(20, 20).intersection(&c), Some(c));
    }
}
