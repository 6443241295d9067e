//! Reading-order comparison for extracted text positions.
//!
//! Text extraction yields glyph positions in page coordinates. Sorting
//! them into reading order has to account for the page's `/Rotate`
//! entry: on a rotated page, "top to bottom, left to right" runs along
//! different axes. Positions are compared in rotated coordinates, top
//! line first, then left to right within a line.
//!
//! | rotation | primary key | secondary key |
//! |----------|-------------|---------------|
//! | 0        | `y`         | `x`           |
//! | 90       | `x`         | `y`           |
//! | 180      | `-y`        | `-x`          |
//! | 270      | `-y`        | `-x`          |
//!
//! Unrecognized rotation values compare as rotation 0.

use std::cmp::Ordering;

/// A glyph position in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPosition {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
}

impl TextPosition {
    /// Create a new position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Compare two positions under a page rotation (degrees, one of 0, 90,
/// 180, 270; see [`PdPage::find_rotation`] for where the value comes
/// from).
///
/// [`PdPage::find_rotation`]: crate::pd::page::PdPage::find_rotation
pub fn compare_positions(rotation: i64, first: &TextPosition, second: &TextPosition) -> Ordering {
    let ((x1, y1), (x2, y2)) = match rotation {
        90 => ((first.y, first.x), (second.y, second.x)),
        180 => ((-first.x, -first.y), (-second.x, -second.y)),
        270 => ((-first.y, -first.x), (-second.y, -second.x)),
        _ => ((first.x, first.y), (second.x, second.y)),
    };
    safe_float_cmp(y1, y2).then_with(|| safe_float_cmp(x1, x2))
}

/// Sort positions into reading order for a page rotation.
pub fn sort_positions(rotation: i64, positions: &mut [TextPosition]) {
    positions.sort_by(|a, b| compare_positions(rotation, a, b));
}

/// Compare two floats without panicking on NaN.
///
/// NaN values compare equal to each other and greater than every number,
/// so sorts never panic and NaN positions sink to the end.
fn safe_float_cmp(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
