//! Rectangles in default user space.

use crate::object::{Array, Object};

/// A rectangle backed by a 4-element COS array:
/// `[ llx lly urx ury ]`.
///
/// The view writes through to the underlying array.
#[derive(Debug, Clone, PartialEq)]
pub struct PdRectangle {
    array: Array,
}

impl PdRectangle {
    /// Create a rectangle from its corner coordinates.
    pub fn new(lower_left_x: f64, lower_left_y: f64, upper_right_x: f64, upper_right_y: f64) -> Self {
        let array: Array = [
            Object::Real(lower_left_x),
            Object::Real(lower_left_y),
            Object::Real(upper_right_x),
            Object::Real(upper_right_y),
        ]
        .into_iter()
        .collect();
        Self { array }
    }

    /// Wrap an existing COS array.
    pub fn from_array(array: Array) -> Self {
        Self { array }
    }

    /// The backing COS array.
    pub fn cos_array(&self) -> Array {
        self.array.clone()
    }

    fn component(&self, index: usize) -> f64 {
        self.array
            .get(index)
            .and_then(|o| o.as_number())
            .unwrap_or(0.0)
    }

    /// Lower left x coordinate.
    pub fn lower_left_x(&self) -> f64 {
        self.component(0)
    }

    /// Lower left y coordinate.
    pub fn lower_left_y(&self) -> f64 {
        self.component(1)
    }

    /// Upper right x coordinate.
    pub fn upper_right_x(&self) -> f64 {
        self.component(2)
    }

    /// Upper right y coordinate.
    pub fn upper_right_y(&self) -> f64 {
        self.component(3)
    }

    /// Set the lower left x coordinate.
    pub fn set_lower_left_x(&self, value: f64) {
        self.array.set(0, Object::Real(value));
    }

    /// Set the lower left y coordinate.
    pub fn set_lower_left_y(&self, value: f64) {
        self.array.set(1, Object::Real(value));
    }

    /// Set the upper right x coordinate.
    pub fn set_upper_right_x(&self, value: f64) {
        self.array.set(2, Object::Real(value));
    }

    /// Set the upper right y coordinate.
    pub fn set_upper_right_y(&self, value: f64) {
        self.array.set(3, Object::Real(value));
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.upper_right_x() - self.lower_left_x()
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.upper_right_y() - self.lower_left_y()
    }
}
