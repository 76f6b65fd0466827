/*!
A glyph outline decoder for CFF fonts.

This crate parses the binary container structures of a bare CFF table
(INDEX, DICT, charset, standard strings) and executes Type 2 charstring
programs into point-list outlines. The number-encoding and charstring
handling code descends from the [`ttf-parser`](https://github.com/harfbuzz/ttf-parser)
family of parsers, reduced to the CFF core and reworked to produce
point sequences instead of driving a path-building callback.

The caller is expected to have isolated the CFF table bytes already;
no sfnt table-directory handling happens here.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use crate::util::TryNumFrom;

pub mod cff;

mod argstack;
mod util;

#[cfg(test)]
pub(crate) mod writer;

/// A type-safe wrapper for glyph ID.
#[repr(transparent)]
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Default, Debug, Hash)]
pub struct GlyphId(pub u16);

/// A single outline point in font design units.
///
/// Two consecutive off-curve points followed by an on-curve point form
/// one cubic segment; everything else is a line. The last point of every
/// contour carries the `end_of_contour` flag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Point {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// `false` for a cubic control point.
    pub on_curve: bool,
    /// Marks the final point of a closed contour.
    pub end_of_contour: bool,
}

/// A decoded glyph outline.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Outline {
    /// Outline points in drawing order.
    ///
    /// Empty for blank glyphs such as `space`.
    pub points: Vec<Point>,
    /// The tight bounding box of all emitted points.
    ///
    /// Zero when `points` is empty.
    pub bounds: Rect,
}

/// A rectangle.
///
/// Doesn't guarantee that `x_min` <= `x_max` and/or `y_min` <= `y_max`.
#[repr(C)]
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl Rect {
    #[inline]
    fn zero() -> Self {
        Self {
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
        }
    }

    /// Returns rect's width.
    #[inline]
    pub fn width(&self) -> i16 {
        self.x_max - self.x_min
    }

    /// Returns rect's height.
    #[inline]
    pub fn height(&self) -> i16 {
        self.y_max - self.y_min
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RectF {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

impl RectF {
    #[inline]
    fn new() -> Self {
        Self {
            x_min: f32::MAX,
            y_min: f32::MAX,
            x_max: f32::MIN,
            y_max: f32::MIN,
        }
    }

    #[inline]
    fn is_default(&self) -> bool {
        self.x_min == f32::MAX
            && self.y_min == f32::MAX
            && self.x_max == f32::MIN
            && self.y_max == f32::MIN
    }

    #[inline]
    fn extend_by(&mut self, x: f32, y: f32) {
        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
    }

    #[inline]
    fn to_rect(self) -> Option<Rect> {
        Some(Rect {
            x_min: i16::try_num_from(self.x_min)?,
            y_min: i16::try_num_from(self.y_min)?,
            x_max: i16::try_num_from(self.x_max)?,
            y_max: i16::try_num_from(self.y_max)?,
        })
    }
}

/// Accumulates outline points while a charstring program runs.
///
/// A contour stays open until `close` marks its last point.
pub(crate) struct Builder {
    points: Vec<Point>,
    bbox: RectF,
    contour_start: usize,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self {
            points: Vec::new(),
            bbox: RectF::new(),
            contour_start: 0,
        }
    }

    #[inline]
    fn push(&mut self, x: f32, y: f32, on_curve: bool) {
        self.bbox.extend_by(x, y);
        self.points.push(Point {
            x: x.round() as i32,
            y: y.round() as i32,
            on_curve,
            end_of_contour: false,
        });
    }

    #[inline]
    pub(crate) fn move_to(&mut self, x: f32, y: f32) {
        self.push(x, y, true);
    }

    #[inline]
    pub(crate) fn line_to(&mut self, x: f32, y: f32) {
        self.push(x, y, true);
    }

    #[inline]
    pub(crate) fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.push(x1, y1, false);
        self.push(x2, y2, false);
        self.push(x, y, true);
    }

    #[inline]
    pub(crate) fn close(&mut self) {
        if self.points.len() > self.contour_start {
            if let Some(last) = self.points.last_mut() {
                last.end_of_contour = true;
            }
            self.contour_start = self.points.len();
        }
    }

    pub(crate) fn finish(self) -> Result<Outline, cff::DecodeError> {
        if self.points.is_empty() {
            return Ok(Outline {
                points: Vec::new(),
                bounds: Rect::zero(),
            });
        }

        debug_assert!(self.bbox.is_default() == self.points.is_empty());

        let bounds = self.bbox.to_rect().ok_or(cff::DecodeError::BboxOverflow)?;
        Ok(Outline {
            points: self.points,
            bounds,
        })
    }
}
